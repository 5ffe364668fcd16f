use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerStats {
    pub voltage: f64,
    pub current: f64,
    pub wattage: f64,
}

/// Client-supplied reading fields; id and timestamp are assigned server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorInput {
    pub temperature: f64,
    pub water_level: f64,
    pub power_stats: PowerStats,
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_location() -> String {
    "sensor-001".into()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SensorReading {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub temperature: f64,
    pub water_level: f64,
    pub power_stats: PowerStats,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct SensorRow {
    pub id: Uuid,
    pub temperature: f64,
    pub water_level: f64,
    pub power_voltage: f64,
    pub power_current: f64,
    pub power_wattage: f64,
    pub location: String,
    pub timestamp: OffsetDateTime,
}

impl From<SensorRow> for SensorReading {
    fn from(r: SensorRow) -> Self {
        Self {
            id: r.id,
            temperature: r.temperature,
            water_level: r.water_level,
            power_stats: PowerStats {
                voltage: r.power_voltage,
                current: r.power_current,
                wattage: r.power_wattage,
            },
            location: r.location,
            timestamp: r.timestamp,
        }
    }
}

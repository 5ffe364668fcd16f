use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
    repo::SensorStore,
    repo_types::{SensorInput, SensorReading},
};

#[derive(Default)]
pub struct MemorySensorStore {
    rows: Mutex<Vec<SensorReading>>,
}

impl MemorySensorStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SensorStore for MemorySensorStore {
    async fn insert(&self, input: SensorInput) -> anyhow::Result<SensorReading> {
        let mut rows = self.rows.lock().unwrap();
        // Keep timestamps strictly increasing so ordering is deterministic.
        let mut timestamp = OffsetDateTime::now_utc();
        if let Some(last) = rows.iter().map(|r| r.timestamp).max() {
            if timestamp <= last {
                timestamp = last + Duration::microseconds(1);
            }
        }
        let reading = SensorReading {
            id: Uuid::new_v4(),
            temperature: input.temperature,
            water_level: input.water_level,
            power_stats: input.power_stats,
            location: input.location,
            timestamp,
        };
        rows.push(reading.clone());
        Ok(reading)
    }

    async fn list_recent(&self, limit: i64) -> anyhow::Result<Vec<SensorReading>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SensorReading>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: Uuid, input: SensorInput) -> anyhow::Result<Option<SensorReading>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        row.temperature = input.temperature;
        row.water_level = input.water_level;
        row.power_stats = input.power_stats;
        row.location = input.location;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}

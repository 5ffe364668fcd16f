use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{SensorInput, SensorReading, SensorRow};

#[async_trait]
pub trait SensorStore: Send + Sync {
    async fn insert(&self, input: SensorInput) -> anyhow::Result<SensorReading>;
    /// Newest first.
    async fn list_recent(&self, limit: i64) -> anyhow::Result<Vec<SensorReading>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SensorReading>>;
    /// Replaces the client fields; the timestamp is kept.
    async fn update(&self, id: Uuid, input: SensorInput) -> anyhow::Result<Option<SensorReading>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const SENSOR_COLUMNS: &str = r#"id, temperature, water_level, power_voltage, power_current,
    power_wattage, location, "timestamp""#;

#[derive(Clone)]
pub struct PgSensorStore {
    db: PgPool,
}

impl PgSensorStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SensorStore for PgSensorStore {
    async fn insert(&self, input: SensorInput) -> anyhow::Result<SensorReading> {
        let sql = format!(
            r#"
            INSERT INTO sensor_data (temperature, water_level, power_voltage,
                                     power_current, power_wattage, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SENSOR_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(input.temperature)
            .bind(input.water_level)
            .bind(input.power_stats.voltage)
            .bind(input.power_stats.current)
            .bind(input.power_stats.wattage)
            .bind(&input.location)
            .fetch_one(&self.db)
            .await
            .context("insert sensor reading")?;
        Ok(row.into())
    }

    async fn list_recent(&self, limit: i64) -> anyhow::Result<Vec<SensorReading>> {
        let sql = format!(
            r#"SELECT {SENSOR_COLUMNS} FROM sensor_data ORDER BY "timestamp" DESC LIMIT $1"#
        );
        let rows = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .context("list sensor readings")?;
        Ok(rows.into_iter().map(SensorReading::from).collect())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SensorReading>> {
        let sql = format!("SELECT {SENSOR_COLUMNS} FROM sensor_data WHERE id = $1");
        let row = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("get sensor reading")?;
        Ok(row.map(SensorReading::from))
    }

    async fn update(&self, id: Uuid, input: SensorInput) -> anyhow::Result<Option<SensorReading>> {
        let sql = format!(
            r#"
            UPDATE sensor_data
               SET temperature = $2, water_level = $3, power_voltage = $4,
                   power_current = $5, power_wattage = $6, location = $7
             WHERE id = $1
            RETURNING {SENSOR_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(id)
            .bind(input.temperature)
            .bind(input.water_level)
            .bind(input.power_stats.voltage)
            .bind(input.power_stats.current)
            .bind(input.power_stats.wattage)
            .bind(&input.location)
            .fetch_optional(&self.db)
            .await
            .context("update sensor reading")?;
        Ok(row.map(SensorReading::from))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM sensor_data WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete sensor reading")?;
        Ok(result.rows_affected() > 0)
    }
}

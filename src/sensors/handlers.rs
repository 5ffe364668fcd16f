use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo_types::{SensorInput, SensorReading};
use crate::{error::AppError, extract::AppJson, state::AppState};

pub const LIST_LIMIT: i64 = 100;

pub fn sensor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sensor-data", get(list_readings).post(create_reading))
        .route(
            "/api/sensor-data/:id",
            get(get_reading).put(update_reading).delete(delete_reading),
        )
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID".into()))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub id: Uuid,
}

#[instrument(skip(state))]
pub async fn list_readings(
    State(state): State<AppState>,
) -> Result<Json<Vec<SensorReading>>, AppError> {
    Ok(Json(state.sensors.list_recent(LIST_LIMIT).await?))
}

#[instrument(skip(state))]
pub async fn get_reading(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SensorReading>, AppError> {
    let id = parse_id(&id)?;
    state
        .sensors
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Sensor data"))
}

#[instrument(skip(state, input))]
pub async fn create_reading(
    State(state): State<AppState>,
    AppJson(input): AppJson<SensorInput>,
) -> Result<(StatusCode, Json<SensorReading>), AppError> {
    let reading = state.sensors.insert(input).await?;
    info!(id = %reading.id, location = %reading.location, "sensor reading created");
    Ok((StatusCode::CREATED, Json(reading)))
}

#[instrument(skip(state, input))]
pub async fn update_reading(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<SensorInput>,
) -> Result<Json<SensorReading>, AppError> {
    let id = parse_id(&id)?;
    let reading = state
        .sensors
        .update(id, input)
        .await?
        .ok_or(AppError::NotFound("Sensor data"))?;
    info!(%id, "sensor reading updated");
    Ok(Json(reading))
}

#[instrument(skip(state))]
pub async fn delete_reading(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    let id = parse_id(&id)?;
    if !state.sensors.delete(id).await? {
        return Err(AppError::NotFound("Sensor data"));
    }
    info!(%id, "sensor reading deleted");
    Ok(Json(DeletedResponse {
        message: "Sensor data deleted successfully",
        id,
    }))
}

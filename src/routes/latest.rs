use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::time::format_civil;
use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::frame::{describe_status, FrameFormat, Reading};
use crate::ingest::queries;
use crate::ttn::{UplinkEnvelope, UplinkMessage};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingResponse {
    pub uplink_id: Option<Uuid>,
    pub device: String,
    pub received_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    /// Capture time in the collector's civil timezone
    pub recorded_local: String,
    pub frame_format: String,
    /// Peripherals present on the node
    pub hardware: Vec<String>,
    pub uptime_seconds: u32,
    /// °C
    pub temperature: f32,
    pub temperature_calibration: f32,
    pub temperature_calibrated: bool,
    /// % relative humidity
    pub humidity: f32,
    /// Pa
    pub pressure: f32,
    pub sensor_status: u8,
    pub sensor_status_text: String,
    /// ppm, null when the sensor did not record a value
    pub co2: Option<i32>,
    /// ppb, null when the sensor did not record a value
    pub tvoc: Option<i32>,
    /// Volts
    pub voltage: f32,
    pub gps_fix: bool,
    pub satellites: u8,
}

impl ReadingResponse {
    fn new(reading: &Reading, device: String, received_at: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            uplink_id: reading.uplink_id,
            device,
            received_at,
            recorded_at: reading.recorded_at,
            recorded_local: format_civil(reading.recorded_at, zone),
            frame_format: reading.format.to_string(),
            hardware: reading.hardware.names().into_iter().map(String::from).collect(),
            uptime_seconds: reading.uptime,
            temperature: reading.temperature,
            temperature_calibration: reading.temperature_calibration,
            temperature_calibrated: reading.temperature_calibrated,
            humidity: reading.humidity,
            pressure: reading.pressure,
            sensor_status: reading.sensor_status,
            sensor_status_text: describe_status(reading.sensor_status).to_string(),
            co2: reading.co2_recorded(),
            tvoc: reading.tvoc_recorded(),
            voltage: reading.voltage_volts(),
            gps_fix: reading.gps_fix,
            satellites: reading.satellites,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UplinkResponse {
    pub id: Uuid,
    /// The stored uplink in the TTN message layout
    pub uplink: UplinkMessage,
    /// Reading decoded again from the stored payload
    pub reading: ReadingResponse,
}

/// Get the most recent reading
///
/// Ordered by the node's capture time.
#[utoipa::path(
    get,
    path = "/api/readings/latest",
    responses(
        (status = 200, description = "Latest reading", body = ReadingResponse),
        (status = 404, description = "No readings stored"),
    ),
    tag = "readings"
)]
pub async fn get_latest_reading(State(state): State<AppState>) -> AppResult<Json<ReadingResponse>> {
    let row = queries::latest_reading(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No readings stored yet".to_string()))?;

    let reading = Reading::try_from(&row)?;

    Ok(Json(ReadingResponse::new(
        &reading,
        row.device,
        row.received_at.with_timezone(&Utc),
        state.config.civil_timezone,
    )))
}

/// Get the most recent uplink
///
/// Ordered by the network server's receive time. The stored row is rendered
/// back into the TTN message layout and its payload decoded again.
#[utoipa::path(
    get,
    path = "/api/uplinks/latest",
    responses(
        (status = 200, description = "Latest uplink", body = UplinkResponse),
        (status = 404, description = "No uplinks stored"),
    ),
    tag = "uplinks"
)]
pub async fn get_latest_uplink(State(state): State<AppState>) -> AppResult<Json<UplinkResponse>> {
    let zone = state.config.civil_timezone;

    let row = queries::latest_uplink(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No uplinks stored yet".to_string()))?;

    let message = UplinkMessage::from_stored(&row, zone)?;
    let envelope = UplinkEnvelope::from_message(message.clone(), zone)
        .map_err(|e| AppError::Internal(format!("stored uplink {} does not parse: {e}", row.id)))?;

    // Stored payloads were accepted once, so any known layout is valid here
    let mut reading = envelope
        .decode_reading(&FrameFormat::ALL, zone)
        .map_err(|e| AppError::Internal(format!("stored uplink {} does not decode: {e}", row.id)))?;
    reading.uplink_id = Some(row.id);

    Ok(Json(UplinkResponse {
        id: row.id,
        reading: ReadingResponse::new(&reading, envelope.dev_id, envelope.received_at, zone),
        uplink: message,
    }))
}

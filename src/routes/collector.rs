use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::AppState;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::ingest;

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    /// Id shared by the stored uplink and its reading
    pub uplink_id: Uuid,
    pub device: String,
    pub recorded_at: DateTime<Utc>,
    /// Frame layout the payload was decoded as (v1 or v2)
    pub frame_format: String,
    /// Air-quality sensor fault reported by the node, if any
    pub sensor_fault: Option<String>,
}

/// Receive an uplink from the TTN HTTP integration
///
/// Decodes the sensor frame carried in `payload_raw` and stores it together
/// with the uplink metadata.
#[utoipa::path(
    post,
    path = "/redenv/collector",
    request_body = crate::ttn::UplinkMessage,
    responses(
        (status = 200, description = "Uplink stored", body = IngestResponse),
        (status = 400, description = "Malformed envelope, payload or frame"),
        (status = 401, description = "Missing or invalid webhook key"),
        (status = 403, description = "Uplink for another application"),
        (status = 503, description = "Too many uplinks in flight"),
    ),
    tag = "ingest"
)]
pub async fn collect(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<IngestResponse>> {
    authorize(&state.config, &headers)?;

    let permit = state
        .ingest_permits
        .clone()
        .try_acquire_owned()
        .map_err(|_| {
            tracing::warn!("Ingest concurrency limit reached");
            AppError::ServiceUnavailable(
                "Too many concurrent uplinks. Please try again later.".to_string(),
            )
        })?;

    let ingested = ingest::ingest(
        &state.db,
        state.ids.clone(),
        &body,
        &state.ingest,
        permit,
    )
    .await?;

    Ok(Json(IngestResponse {
        uplink_id: ingested.uplink_id,
        device: ingested.envelope.dev_id,
        recorded_at: ingested.reading.recorded_at,
        frame_format: ingested.reading.format.to_string(),
        sensor_fault: ingested.reading.sensor_fault.map(|f| f.to_string()),
    }))
}

/// TTN sends the integration's configured header value verbatim. Compared in
/// constant time.
fn authorize(config: &Config, headers: &HeaderMap) -> AppResult<()> {
    let Some(expected) = config.ttn_webhook_key.as_deref() else {
        return Ok(());
    };

    let matches = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| bool::from(value.as_bytes().ct_eq(expected.as_bytes())));

    if matches {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "Missing or invalid webhook key".to_string(),
        ))
    }
}

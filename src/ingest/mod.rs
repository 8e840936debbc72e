pub mod queries;
pub mod store;

use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use uuid::Uuid;

use crate::frame::{FrameError, FrameFormat, Reading};
use crate::ttn::{EnvelopeError, UplinkEnvelope};
pub use store::{IdSource, RandomIds};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("uplink from unexpected application {0:?}")]
    UnexpectedApplication(String),

    #[error("failed to generate uplink id: {0}")]
    Identifier(#[from] getrandom::Error),

    #[error("failed to store uplink: {0}")]
    Persistence(#[from] sea_orm::DbErr),

    #[error("store task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// True when the request itself was bad, as opposed to a server-side failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Envelope(_) | Self::Frame(_) | Self::UnexpectedApplication(_)
        )
    }
}

/// Decoding parameters shared by every request.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Civil timezone for legacy frame clocks and stored-envelope times
    pub zone: Tz,
    /// Frame formats to accept, selected by payload length
    pub formats: Vec<FrameFormat>,
    /// Only accept uplinks for this TTN application, if set
    pub app_id: Option<String>,
}

/// A stored uplink and the reading decoded from it.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub uplink_id: Uuid,
    pub envelope: UplinkEnvelope,
    pub reading: Reading,
}

/// Parse the envelope and decode its frame. Performs no I/O.
///
/// # Errors
///
/// Returns `IngestError::Envelope`, `IngestError::Frame` or
/// `IngestError::UnexpectedApplication`.
pub fn decode(
    body: &[u8],
    settings: &IngestSettings,
) -> Result<(UplinkEnvelope, Reading), IngestError> {
    let envelope = UplinkEnvelope::parse(body, settings.zone)?;

    if let Some(expected) = &settings.app_id
        && envelope.app_id != *expected
    {
        return Err(IngestError::UnexpectedApplication(envelope.app_id));
    }

    let reading = envelope.decode_reading(&settings.formats, settings.zone)?;
    Ok((envelope, reading))
}

/// Decode a webhook body and store the envelope and its reading.
///
/// The store runs on its own task, so once it starts it finishes with a
/// commit or a rollback even if the caller stops waiting. `permit` moves into
/// that task and is released only when the store is done.
///
/// # Errors
///
/// Any decode error from [`decode`], or an identifier/persistence error from
/// [`store::store_uplink`].
pub async fn ingest(
    db: &DatabaseConnection,
    ids: Arc<dyn IdSource>,
    body: &[u8],
    settings: &IngestSettings,
    permit: OwnedSemaphorePermit,
) -> Result<Ingested, IngestError> {
    let (envelope, mut reading) = decode(body, settings)?;

    if let Some(fault) = reading.sensor_fault {
        tracing::warn!(
            device = %envelope.dev_id,
            status = fault.status(),
            error = %fault,
            "Air-quality sensor reported a fault"
        );
    }

    let db = db.clone();
    let (uplink_id, envelope, reading) = tokio::spawn(async move {
        let _permit = permit;
        let id = store::store_uplink(&db, ids.as_ref(), &envelope, &mut reading).await?;
        Ok::<_, IngestError>((id, envelope, reading))
    })
    .await??;

    tracing::info!(
        uplink_id = %uplink_id,
        device = %envelope.dev_id,
        recorded_at = %reading.recorded_at,
        format = %reading.format,
        "Reading stored"
    );

    Ok(Ingested {
        uplink_id,
        envelope,
        reading,
    })
}

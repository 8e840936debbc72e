use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::models::{Metadata, UplinkMessage};
use crate::common::time::parse_civil;
use crate::frame::{self, FrameError, FrameFormat, Reading};

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed uplink envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload_raw is not valid base64: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("unparseable uplink time {0:?}")]
    Timestamp(String),
}

/// A validated uplink: payload decoded, receive time resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkEnvelope {
    pub app_id: String,
    pub dev_id: String,
    pub hardware_serial: String,
    pub port: u8,
    pub counter: u32,
    pub is_retry: bool,
    pub confirmed: bool,
    /// The payload as received, kept for storage
    pub payload_raw: String,
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl UplinkEnvelope {
    /// Parse a webhook body.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Malformed` if the body is not an uplink message,
    /// otherwise see [`UplinkEnvelope::from_message`].
    pub fn parse(body: &[u8], zone: Tz) -> Result<Self, EnvelopeError> {
        let message: UplinkMessage = serde_json::from_slice(body)?;
        Self::from_message(message, zone)
    }

    /// Validate an already deserialized message.
    ///
    /// # Errors
    ///
    /// - `EnvelopeError::Payload` if `payload_raw` is not standard base64
    /// - `EnvelopeError::Timestamp` if `metadata.time` matches neither accepted format
    pub fn from_message(message: UplinkMessage, zone: Tz) -> Result<Self, EnvelopeError> {
        let payload = STANDARD.decode(message.payload_raw.as_bytes())?;
        let received_at = parse_uplink_time(&message.metadata.time, zone)
            .ok_or_else(|| EnvelopeError::Timestamp(message.metadata.time.clone()))?;

        Ok(Self {
            app_id: message.app_id,
            dev_id: message.dev_id,
            hardware_serial: message.hardware_serial,
            port: message.port,
            counter: message.counter,
            is_retry: message.is_retry,
            confirmed: message.confirmed,
            payload_raw: message.payload_raw,
            payload,
            received_at,
            metadata: message.metadata,
        })
    }

    /// Decode the embedded frame as whichever accepted format matches its length.
    ///
    /// # Errors
    ///
    /// Returns a `FrameError` if no accepted format has the payload's length or
    /// the frame does not decode.
    pub fn decode_reading(
        &self,
        accepted: &[FrameFormat],
        zone: Tz,
    ) -> Result<Reading, FrameError> {
        let format = FrameFormat::select(self.payload.len(), accepted)?;
        frame::decode_with_zone(&self.payload, format, zone)
    }
}

/// RFC 3339 first (fresh webhooks); the storage layout second (rebuilt
/// envelopes).
#[must_use]
pub fn parse_uplink_time(value: &str, zone: Tz) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_civil(value, zone))
}

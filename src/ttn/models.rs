use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::time::format_civil;
use crate::entity::{narrow, uplinks};

/// Uplink message as posted by The Things Network's HTTP integration.
///
/// Only the fields the collector stores are modelled; everything else in the
/// message (`payload_fields`, `gateways`, `downlink_url`, ...) is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UplinkMessage {
    /// Same as in the topic
    pub app_id: String,
    pub dev_id: String,
    /// DevEUI of the node
    pub hardware_serial: String,
    /// LoRaWAN FPort
    pub port: u8,
    /// LoRaWAN frame counter
    pub counter: u32,
    pub is_retry: bool,
    pub confirmed: bool,
    /// Base64 encoded sensor frame
    pub payload_raw: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Metadata {
    /// Time the network server received the message (RFC 3339), or
    /// `YYYY-MM-DD HH:MM:SS ZONE` for messages rebuilt from storage
    pub time: String,
    #[serde(default)]
    pub frequency: f32,
    /// LORA or FSK
    #[serde(default)]
    pub modulation: String,
    /// e.g. SF7BW125, LORA only
    #[serde(default)]
    pub data_rate: String,
    /// FSK only
    #[serde(default)]
    #[schema(value_type = Option<u32>)]
    pub bit_rate: BitRate,
}

/// FSK bit rate; TTN sends a number, older tooling sends a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<RawBitRate>")]
pub struct BitRate(pub Option<u32>);

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawBitRate {
    Number(u32),
    Text(String),
}

impl From<Option<RawBitRate>> for BitRate {
    fn from(raw: Option<RawBitRate>) -> Self {
        Self(match raw {
            Some(RawBitRate::Number(n)) => Some(n),
            // Empty or non-numeric text carries no rate
            Some(RawBitRate::Text(s)) => s.trim().parse().ok(),
            None => None,
        })
    }
}

impl UplinkMessage {
    /// Rebuild the message a stored uplink row was created from, with the
    /// receive time rendered in `zone`.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::Custom` if a stored integer does not fit its wire type.
    pub fn from_stored(model: &uplinks::Model, zone: Tz) -> Result<Self, DbErr> {
        let received_at: DateTime<Utc> = model.uplink_time.with_timezone(&Utc);

        Ok(Self {
            app_id: model.app_id.clone(),
            dev_id: model.dev_id.clone(),
            hardware_serial: model.hw_serial.clone(),
            port: narrow("uplinks.port", model.port.into())?,
            counter: narrow("uplinks.counter", model.counter)?,
            is_retry: model.is_retry,
            confirmed: model.is_confirmed,
            payload_raw: model.payload_raw.clone(),
            metadata: Metadata {
                time: format_civil(received_at, zone),
                frequency: model.frequency,
                modulation: model.modulation.clone(),
                data_rate: model.data_rate.clone(),
                bit_rate: BitRate(
                    model
                        .bit_rate
                        .map(|b| narrow("uplinks.bit_rate", b))
                        .transpose()?,
                ),
            },
        })
    }
}

use chrono::Utc;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder};

use crate::entity::{narrow, readings, uplinks};
use crate::frame::{FrameFormat, Hardware, Reading, SensorFault};

/// Most recently recorded reading, by capture time.
///
/// # Errors
///
/// Returns `DbErr` if the query fails.
pub async fn latest_reading<C: ConnectionTrait>(db: &C) -> Result<Option<readings::Model>, DbErr> {
    readings::Entity::find()
        .order_by_desc(readings::Column::RecordedAt)
        .one(db)
        .await
}

/// Most recently received uplink, by relay receive time.
///
/// # Errors
///
/// Returns `DbErr` if the query fails.
pub async fn latest_uplink<C: ConnectionTrait>(db: &C) -> Result<Option<uplinks::Model>, DbErr> {
    uplinks::Entity::find()
        .order_by_desc(uplinks::Column::UplinkTime)
        .one(db)
        .await
}

impl TryFrom<&readings::Model> for Reading {
    type Error = DbErr;

    fn try_from(row: &readings::Model) -> Result<Self, Self::Error> {
        let format = FrameFormat::from_version(row.frame_version).ok_or_else(|| {
            DbErr::Custom(format!("unknown frame version {}", row.frame_version))
        })?;
        let sensor_status: u8 = narrow("readings.ccs811_status", row.ccs811_status.into())?;

        Ok(Self {
            uplink_id: Some(row.uplink_id),
            format,
            recorded_at: row.recorded_at.with_timezone(&Utc),
            hardware: Hardware::from_bits(narrow("readings.hardware", row.hardware.into())?),
            uptime: narrow("readings.uptime", row.uptime)?,
            temperature: row.temperature,
            temperature_calibration: row.temperature_cal,
            temperature_calibrated: row.temperature_is_cal,
            humidity: row.humidity,
            pressure: row.pressure,
            sensor_status,
            sensor_fault: SensorFault::from_status(sensor_status),
            co2: row.co2,
            tvoc: row.tvoc,
            voltage: narrow("readings.voltage", row.voltage.into())?,
            gps_fix: row.gps_fix,
            satellites: narrow("readings.satellites", row.satellites.into())?,
        })
    }
}

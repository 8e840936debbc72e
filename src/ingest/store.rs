use sea_orm::{DatabaseTransaction, DbErr, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use super::IngestError;
use crate::entity::{readings, uplinks};
use crate::frame::Reading;
use crate::ttn::UplinkEnvelope;

/// Source of correlation ids linking an uplink row to its reading row.
pub trait IdSource: Send + Sync {
    /// # Errors
    ///
    /// Returns the entropy source's error if no random bytes are available.
    fn next_id(&self) -> Result<Uuid, getrandom::Error>;
}

/// Random (v4) UUIDs drawn from the OS entropy source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> Result<Uuid, getrandom::Error> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes)?;
        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

/// Store an envelope and its reading as one linked pair of rows.
///
/// A fresh id is assigned to `reading` before anything is written. Both rows
/// are inserted in a single transaction; if either insert fails the
/// transaction is rolled back and neither row is kept. Nothing is retried.
///
/// # Errors
///
/// - `IngestError::Identifier` if no id could be generated (no database access happens)
/// - `IngestError::Persistence` if the transaction fails
pub async fn store_uplink<C>(
    db: &C,
    ids: &dyn IdSource,
    envelope: &UplinkEnvelope,
    reading: &mut Reading,
) -> Result<Uuid, IngestError>
where
    C: TransactionTrait,
{
    let id = ids.next_id()?;
    reading.uplink_id = Some(id);

    let txn = db.begin().await?;

    match insert_pair(&txn, id, envelope, reading).await {
        Ok(()) => {
            txn.commit().await?;
            Ok(id)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::error!(uplink_id = %id, error = %rollback, "Rollback failed");
            }
            Err(e.into())
        }
    }
}

async fn insert_pair(
    txn: &DatabaseTransaction,
    id: Uuid,
    envelope: &UplinkEnvelope,
    reading: &Reading,
) -> Result<(), DbErr> {
    uplinks::Entity::insert(uplink_row(id, envelope))
        .exec_without_returning(txn)
        .await?;

    readings::Entity::insert(reading_row(id, envelope, reading))
        .exec_without_returning(txn)
        .await?;

    Ok(())
}

fn uplink_row(id: Uuid, envelope: &UplinkEnvelope) -> uplinks::ActiveModel {
    let meta = &envelope.metadata;

    uplinks::ActiveModel {
        id: Set(id),
        app_id: Set(envelope.app_id.clone()),
        dev_id: Set(envelope.dev_id.clone()),
        hw_serial: Set(envelope.hardware_serial.clone()),
        port: Set(i32::from(envelope.port)),
        counter: Set(i64::from(envelope.counter)),
        is_retry: Set(envelope.is_retry),
        is_confirmed: Set(envelope.confirmed),
        payload_raw: Set(envelope.payload_raw.clone()),
        uplink_time: Set(envelope.received_at.into()),
        frequency: Set(meta.frequency),
        modulation: Set(meta.modulation.clone()),
        data_rate: Set(meta.data_rate.clone()),
        bit_rate: Set(meta.bit_rate.0.map(i64::from)),
    }
}

fn reading_row(id: Uuid, envelope: &UplinkEnvelope, reading: &Reading) -> readings::ActiveModel {
    readings::ActiveModel {
        uplink_id: Set(id),
        received_at: Set(envelope.received_at.into()),
        device: Set(envelope.dev_id.clone()),
        recorded_at: Set(reading.recorded_at.into()),
        frame_version: Set(reading.format.version()),
        hardware: Set(i16::from(reading.hardware.bits())),
        uptime: Set(i64::from(reading.uptime)),
        temperature: Set(reading.temperature),
        temperature_cal: Set(reading.temperature_calibration),
        temperature_is_cal: Set(reading.temperature_calibrated),
        humidity: Set(reading.humidity),
        pressure: Set(reading.pressure),
        ccs811_status: Set(i16::from(reading.sensor_status)),
        co2: Set(reading.co2),
        tvoc: Set(reading.tvoc),
        voltage: Set(i16::from(reading.voltage)),
        gps_fix: Set(reading.gps_fix),
        satellites: Set(i16::from(reading.satellites)),
    }
}

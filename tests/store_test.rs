//! Persistence tests: the uplink/reading pair is written together or not at all.
//!
//! Run with: cargo test --test store_test

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Schema,
};
use sea_orm_migration::MigratorTrait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use redenv_collector::entity::{readings, uplinks};
use redenv_collector::frame::{FrameFormat, Reading};
use redenv_collector::ingest::queries::{latest_reading, latest_uplink};
use redenv_collector::ingest::store::store_uplink;
use redenv_collector::ingest::{self, IdSource, IngestError, IngestSettings};
use redenv_collector::ttn::{UplinkEnvelope, UplinkMessage};

const HEALTHY_B64: &str = "4wcKHQseBA+rCAAAr0edQRyF80AAqvRBwnvGRz8CAAAaAAAA/QABAAA=";

struct FixedId(Uuid);

impl IdSource for FixedId {
    fn next_id(&self) -> Result<Uuid, getrandom::Error> {
        Ok(self.0)
    }
}

struct NoEntropy;

impl IdSource for NoEntropy {
    fn next_id(&self) -> Result<Uuid, getrandom::Error> {
        Err(getrandom::Error::UNSUPPORTED)
    }
}

fn body(bit_rate: Option<u32>) -> String {
    serde_json::json!({
        "app_id": "redenv",
        "dev_id": "node-01",
        "hardware_serial": "0004A30B001C0530",
        "port": 1,
        "counter": 1523,
        "is_retry": false,
        "confirmed": true,
        "payload_raw": HEALTHY_B64,
        "metadata": {
            "time": "2019-10-29T18:30:06Z",
            "frequency": 868.1,
            "modulation": "LORA",
            "data_rate": "SF7BW125",
            "bit_rate": bit_rate
        }
    })
    .to_string()
}

fn settings() -> IngestSettings {
    IngestSettings {
        zone: chrono_tz::America::Los_Angeles,
        formats: vec![FrameFormat::V2],
        app_id: None,
    }
}

fn decoded() -> (UplinkEnvelope, Reading) {
    ingest::decode(body(None).as_bytes(), &settings()).unwrap()
}

fn permit() -> OwnedSemaphorePermit {
    Arc::new(Semaphore::new(1)).try_acquire_owned().unwrap()
}

async fn sqlite() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // One connection, so every query sees the same in-memory database
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opts).await.unwrap()
}

async fn migrated() -> DatabaseConnection {
    let db = sqlite().await;
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

#[tokio::test]
async fn stores_linked_pair() {
    let db = migrated().await;
    let id = Uuid::from_u128(0x0123_4567_89ab_cdef);
    let (envelope, mut reading) = decoded();

    let stored = store_uplink(&db, &FixedId(id), &envelope, &mut reading)
        .await
        .unwrap();

    assert_eq!(stored, id);
    assert_eq!(reading.uplink_id, Some(id));

    let uplink = uplinks::Entity::find_by_id(id).one(&db).await.unwrap().unwrap();
    assert_eq!(uplink.dev_id, "node-01");
    assert_eq!(uplink.hw_serial, "0004A30B001C0530");
    assert_eq!(uplink.counter, 1523);
    assert!(uplink.is_confirmed);
    assert_eq!(uplink.payload_raw, HEALTHY_B64);
    assert_eq!(uplink.bit_rate, None);

    let row = readings::Entity::find_by_id(id).one(&db).await.unwrap().unwrap();
    assert_eq!(row.device, "node-01");
    assert_eq!(row.frame_version, 2);
    assert_eq!(Reading::try_from(&row).unwrap(), reading);
}

#[tokio::test]
async fn identifier_failure_touches_nothing() {
    let db = migrated().await;
    let (envelope, mut reading) = decoded();

    let err = store_uplink(&db, &NoEntropy, &envelope, &mut reading)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Identifier(_)));
    assert!(!err.is_client_error());
    assert_eq!(reading.uplink_id, None);
    assert_eq!(uplinks::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(readings::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_reading_insert_rolls_back_uplink() {
    let db = sqlite().await;
    // Only the uplinks table exists, so the second insert fails
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(uplinks::Entity)))
        .await
        .unwrap();

    let (envelope, mut reading) = decoded();
    let err = store_uplink(&db, &FixedId(Uuid::from_u128(1)), &envelope, &mut reading)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Persistence(_)));
    assert_eq!(uplinks::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_id_keeps_first_pair_only() {
    let db = migrated().await;
    let ids = FixedId(Uuid::from_u128(7));

    let (envelope, mut first) = decoded();
    store_uplink(&db, &ids, &envelope, &mut first).await.unwrap();

    let (envelope, mut second) = decoded();
    let err = store_uplink(&db, &ids, &envelope, &mut second)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Persistence(_)));
    assert_eq!(uplinks::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(readings::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn ingest_decodes_and_stores() {
    let db = migrated().await;
    let id = Uuid::from_u128(42);

    let ingested = ingest::ingest(
        &db,
        Arc::new(FixedId(id)),
        body(Some(50_000)).as_bytes(),
        &settings(),
        permit(),
    )
    .await
    .unwrap();

    assert_eq!(ingested.uplink_id, id);
    assert_eq!(ingested.envelope.dev_id, "node-01");
    assert_eq!(ingested.reading.uplink_id, Some(id));

    let uplink = latest_uplink(&db).await.unwrap().unwrap();
    assert_eq!(uplink.id, id);
    assert_eq!(uplink.bit_rate, Some(50_000));

    let row = latest_reading(&db).await.unwrap().unwrap();
    assert_eq!(row.uplink_id, id);
}

#[tokio::test]
async fn ingest_releases_permit_after_store() {
    let db = migrated().await;
    let permits = Arc::new(Semaphore::new(1));
    let held = permits.clone().try_acquire_owned().unwrap();

    ingest::ingest(
        &db,
        Arc::new(FixedId(Uuid::from_u128(5))),
        body(None).as_bytes(),
        &settings(),
        held,
    )
    .await
    .unwrap();

    assert_eq!(permits.available_permits(), 1);
}

#[tokio::test]
async fn ingest_rejects_bad_frames_before_storing() {
    let db = migrated().await;
    let body = body(None).replace(HEALTHY_B64, "AAAA");

    let ids = Arc::new(FixedId(Uuid::from_u128(1)));
    let err = ingest::ingest(&db, ids, body.as_bytes(), &settings(), permit())
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(uplinks::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn stored_uplink_rebuilds_into_the_same_reading() {
    let db = migrated().await;
    let zone = chrono_tz::America::Los_Angeles;
    let (envelope, mut reading) = decoded();
    store_uplink(&db, &FixedId(Uuid::from_u128(3)), &envelope, &mut reading)
        .await
        .unwrap();

    let row = latest_uplink(&db).await.unwrap().unwrap();
    let message = UplinkMessage::from_stored(&row, zone).unwrap();
    assert_eq!(message.metadata.time, "2019-10-29 11:30:06 PDT");

    let rebuilt = UplinkEnvelope::from_message(message, zone).unwrap();
    assert_eq!(rebuilt.received_at, envelope.received_at);
    assert_eq!(rebuilt.payload, envelope.payload);

    let mut again = rebuilt.decode_reading(&FrameFormat::ALL, zone).unwrap();
    again.uplink_id = reading.uplink_id;
    assert_eq!(again, reading);
}

#[test]
fn out_of_range_stored_integers_are_errors() {
    let (envelope, _) = decoded();
    let row = uplinks::Model {
        id: Uuid::from_u128(9),
        app_id: envelope.app_id,
        dev_id: envelope.dev_id,
        hw_serial: envelope.hardware_serial,
        port: 300,
        counter: 1523,
        is_retry: false,
        is_confirmed: false,
        payload_raw: envelope.payload_raw,
        uplink_time: envelope.received_at.fixed_offset(),
        frequency: 868.1,
        modulation: "LORA".to_string(),
        data_rate: "SF7BW125".to_string(),
        bit_rate: None,
    };
    let zone = chrono_tz::UTC;

    assert!(UplinkMessage::from_stored(&row, zone).is_err());

    let row = uplinks::Model { port: 1, ..row };
    let negative_counter = uplinks::Model {
        counter: -1,
        ..row.clone()
    };
    let huge_bit_rate = uplinks::Model {
        bit_rate: Some(1 << 40),
        ..row.clone()
    };
    assert!(UplinkMessage::from_stored(&negative_counter, zone).is_err());
    assert!(UplinkMessage::from_stored(&huge_bit_rate, zone).is_err());

    let message = UplinkMessage::from_stored(&row, zone).unwrap();
    assert_eq!(message.port, 1);
    assert_eq!(message.counter, 1523);
}

#[tokio::test]
async fn latest_queries_on_empty_database() {
    let db = migrated().await;

    assert_eq!(latest_reading(&db).await.unwrap(), None);
    assert_eq!(latest_uplink(&db).await.unwrap(), None);
}

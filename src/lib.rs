//! redenv collector - LoRaWAN webhook ingest for redenv sensor nodes
//!
//! Decodes the binary frame relayed by The Things Network and stores it with
//! the relay envelope. The library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod routes;
pub mod ttn;

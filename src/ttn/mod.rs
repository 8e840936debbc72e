pub mod envelope;
pub mod models;

pub use envelope::{EnvelopeError, UplinkEnvelope};
pub use models::{BitRate, Metadata, UplinkMessage};

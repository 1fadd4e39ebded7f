//! Evidence dispatch engine for SkyQuery.
//!
//! Turns a classified question into a deterministic extract of the
//! telemetry log: extremes, transitions, durations, values near a
//! timestamp, summaries, change points, anomaly candidates, or a broad
//! seeded sample when nothing targeted applies.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod handlers;

pub use catalog::{FieldCatalog, MessageDefinition};
pub use engine::EvidenceEngine;
pub use error::{CatalogError, CatalogResult};

//! Classification export ingestion
//!
//! This module reads Panoptes-style classification exports (NDJSON or a JSON
//! array of rows) and turns them into the events the session engine consumes.

mod adapter;
mod record;
mod timestamp;

pub use adapter::*;
pub use record::*;
pub use timestamp::*;

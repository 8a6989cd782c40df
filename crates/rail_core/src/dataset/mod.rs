//! The editable track dataset: authored node/link/signal/platform/group
//! records, spatial queries, and persistence.
//!
//! ## Data model
//! - `NodeRecord`: a point where links meet, with derived classification
//! - `LinkRecord`: a connection between two distinct nodes
//! - `SignalRecord`: a signal on one end of a link, with optional routes
//! - `PlatformRecord` / `PlatformGroupRecord`: platforms and stations
//! - `TrackDataset`: top-level resource holding all records and indices
//!
//! The dataset is the only persisted artifact; the traversal graph in
//! `crate::graph` is derived and rebuilt after every structural edit.

mod persist;
mod queries;
mod store;
mod types;

#[cfg(test)]
mod tests;

pub use persist::{restore, snapshot, SaveTrackDataset};
pub use queries::{point_segment_distance, TrackElement};
pub use store::{DatasetError, TrackDataset};
pub use types::*;

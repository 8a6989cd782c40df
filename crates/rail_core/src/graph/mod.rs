//! Derived traversal graph and its phased builder.
//!
//! The graph is ephemeral: rebuilt from the dataset after every structural
//! edit, never serialized, never incrementally edited. Incremental edits
//! would require re-running classification and spacing insertion anyway,
//! and a full rebuild is cheap enough to always do instead.

mod builder;
mod types;


pub use builder::{build, BuildError};
pub use types::{GraphEdge, GraphEdgeId, GraphNode, GraphNodeId, RailGraph, SwitchStates};

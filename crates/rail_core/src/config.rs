//! Tuning constants for selection, authoring, graph building, and movement.

/// Selection radius for track nodes (screen-space pixels).
pub const NODE_SELECT_RADIUS: f32 = 12.0;

/// Selection radius for signals (screen-space pixels).
pub const SIGNAL_SELECT_RADIUS: f32 = 12.0;

/// Maximum point-to-segment distance for link selection. Larger than the
/// node radius so links stay clickable between their endpoints.
pub const LINK_SELECT_DISTANCE: f32 = 20.0;

/// Selection radius for platforms.
pub const PLATFORM_SELECT_RADIUS: f32 = 16.0;

/// Quantization step for the node position key. Nodes authored within the
/// same quantization cell merge into one record.
pub const NODE_SNAP_STEP: f32 = 4.0;

/// Default distance from a switch throat to its synthesized buffer node.
pub const DEFAULT_SWITCH_SPACING: f32 = 24.0;

/// Edges at or below this length are left unsplit by spacing insertion.
pub const MIN_SPACING_EDGE_LENGTH: f32 = 8.0;

/// Spacing insertion never places the buffer node beyond this fraction of
/// the parent edge, so short edges keep most of their length.
pub const SPACING_MAX_RATIO: f32 = 0.4;

/// How far along its link (from the direction node) a signal is displayed.
pub const SIGNAL_INSET: f32 = 10.0;

/// Lateral offset of the signal head from the track centerline.
pub const SIGNAL_LATERAL_OFFSET: f32 = 8.0;

/// Hard cap on node hops in a single `advance` call. Guards against cycles
/// of zero-length edges; on exhaustion the last valid location is returned.
pub const MOVE_ITERATION_CAP: u32 = 1000;

/// Remainders below this distance are treated as fully consumed.
pub const MOVE_EPSILON: f32 = 1e-4;

//! Identifier and position-key types for the track dataset.
//!
//! Each record namespace (node/link/signal/platform/group) has its own
//! newtype id, allocated by a per-namespace counter on `TrackDataset`.
//! Namespaces are disjoint: an id value belongs to exactly one namespace.

use bevy::prelude::*;

use crate::config::NODE_SNAP_STEP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformGroupId(pub u32);

/// Quantized position key used to merge nodes authored at the same point.
///
/// Two positions map to the same key when they round to the same cell of a
/// `NODE_SNAP_STEP`-sized grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey(pub i32, pub i32);

impl PointKey {
    pub fn from_pos(pos: Vec2) -> Self {
        Self(
            (pos.x / NODE_SNAP_STEP).round() as i32,
            (pos.y / NODE_SNAP_STEP).round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_key_merges_nearby_positions() {
        let a = PointKey::from_pos(Vec2::new(100.0, 50.0));
        let b = PointKey::from_pos(Vec2::new(100.9, 50.9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_point_key_separates_distant_positions() {
        let a = PointKey::from_pos(Vec2::new(100.0, 50.0));
        let b = PointKey::from_pos(Vec2::new(100.0 + NODE_SNAP_STEP * 2.0, 50.0));
        assert_ne!(a, b);
    }
}

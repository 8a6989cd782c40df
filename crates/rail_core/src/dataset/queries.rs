//! Spatial queries over the track dataset: closest-element lookups used by
//! hit-testing consumers, and derived signal display placement.

use bevy::prelude::*;

use crate::config::{
    LINK_SELECT_DISTANCE, NODE_SELECT_RADIUS, PLATFORM_SELECT_RADIUS, SIGNAL_INSET,
    SIGNAL_LATERAL_OFFSET, SIGNAL_SELECT_RADIUS,
};
use crate::ids::{LinkId, NodeId, PlatformId, SignalId};

use super::store::TrackDataset;

/// A dataset element returned by `closest_any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackElement {
    Node(NodeId),
    Signal(SignalId),
    Link(LinkId),
    Platform(PlatformId),
}

/// Distance from `p` to the segment `a`-`b`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl TrackDataset {
    /// Closest node within the node selection radius.
    pub fn closest_node(&self, pos: Vec2) -> Option<(NodeId, f32)> {
        let mut best: Option<(NodeId, f32)> = None;
        for node in self.nodes.values() {
            let dist = node.position.distance(pos);
            if dist <= NODE_SELECT_RADIUS && best.map_or(true, |(_, d)| dist < d) {
                best = Some((node.id, dist));
            }
        }
        best
    }

    /// Closest signal (by derived display position) within the signal
    /// selection radius.
    pub fn closest_signal(&self, pos: Vec2) -> Option<(SignalId, f32)> {
        let mut best: Option<(SignalId, f32)> = None;
        for signal in self.signals.values() {
            let Some((display, _)) = self.signal_display_pos_angle(signal.id) else {
                continue;
            };
            let dist = display.distance(pos);
            if dist <= SIGNAL_SELECT_RADIUS && best.map_or(true, |(_, d)| dist < d) {
                best = Some((signal.id, dist));
            }
        }
        best
    }

    /// Closest link by point-to-segment distance, within the link selection
    /// threshold. Links with a missing endpoint are skipped.
    pub fn closest_link(&self, pos: Vec2) -> Option<(LinkId, f32)> {
        let mut best: Option<(LinkId, f32)> = None;
        for link in self.links.values() {
            let (Some(a), Some(b)) = (self.node(link.node_a), self.node(link.node_b)) else {
                continue;
            };
            let dist = point_segment_distance(pos, a.position, b.position);
            if dist <= LINK_SELECT_DISTANCE && best.map_or(true, |(_, d)| dist < d) {
                best = Some((link.id, dist));
            }
        }
        best
    }

    /// Closest platform within the platform selection radius.
    pub fn closest_platform(&self, pos: Vec2) -> Option<(PlatformId, f32)> {
        let mut best: Option<(PlatformId, f32)> = None;
        for platform in self.platforms.values() {
            let dist = platform.position.distance(pos);
            if dist <= PLATFORM_SELECT_RADIUS && best.map_or(true, |(_, d)| dist < d) {
                best = Some((platform.id, dist));
            }
        }
        best
    }

    /// Combined hit-test: node, then signal, then link, then platform, each
    /// with its own threshold. The first namespace with a hit wins even if
    /// a later namespace has a geometrically closer element.
    pub fn closest_any(&self, pos: Vec2) -> Option<TrackElement> {
        if let Some((id, _)) = self.closest_node(pos) {
            return Some(TrackElement::Node(id));
        }
        if let Some((id, _)) = self.closest_signal(pos) {
            return Some(TrackElement::Signal(id));
        }
        if let Some((id, _)) = self.closest_link(pos) {
            return Some(TrackElement::Link(id));
        }
        if let Some((id, _)) = self.closest_platform(pos) {
            return Some(TrackElement::Platform(id));
        }
        None
    }

    /// Derived display placement for a signal: a point inset along its link
    /// from the direction node and offset to the side of travel, plus the
    /// facing angle. `None` if the signal's link or endpoints are missing.
    pub fn signal_display_pos_angle(&self, id: SignalId) -> Option<(Vec2, f32)> {
        let signal = self.signal(id)?;
        let link = self.link_record(signal.link)?;
        let near = self.node(signal.direction_node)?;
        let far = self.node(link.other_node(signal.direction_node)?)?;

        let dir = (far.position - near.position).normalize_or_zero();
        if dir == Vec2::ZERO {
            return Some((near.position, 0.0));
        }
        let side = dir.perp();
        let pos = near.position + dir * SIGNAL_INSET + side * SIGNAL_LATERAL_OFFSET;
        Some((pos, dir.to_angle()))
    }
}

//! Point-on-graph locations and the advance algorithm.
//!
//! A `Location` is `(edge, face node, t)` with `t` in [0, 1]: t = 1 sits at
//! `face`, t = 0 at the opposite end. "Forward" always means t increasing
//! toward `face`, whichever physical end that is, so a move continues
//! seamlessly across a node by reinterpreting the next edge's orientation.
//!
//! Locations are immutable values: `advance` returns a new one, leaving the
//! previous tick's position readable while the next is computed. A Location
//! captured before a graph rebuild must not be used against the new graph --
//! re-resolve all Locations after every rebuild.

use bevy::prelude::*;

use crate::config::{MOVE_EPSILON, MOVE_ITERATION_CAP};
use crate::graph::{GraphEdgeId, GraphNodeId, RailGraph, SwitchStates};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub edge: GraphEdgeId,
    /// The endpoint `t` increases toward.
    pub face: GraphNodeId,
    /// Normalized position along the edge, clamped to [0, 1].
    pub t: f32,
}

impl Location {
    /// Place a location on `edge` facing `face`. `None` if the edge is
    /// missing or `face` is not one of its endpoints.
    pub fn new(graph: &RailGraph, edge: GraphEdgeId, face: GraphNodeId, t: f32) -> Option<Self> {
        if !graph.edge(edge)?.has_node(face) {
            return None;
        }
        Some(Self {
            edge,
            face,
            t: t.clamp(0.0, 1.0),
        })
    }

    /// The endpoint opposite `face`.
    pub fn other_node(&self, graph: &RailGraph) -> Option<GraphNodeId> {
        graph.edge(self.edge)?.other_node(self.face)
    }

    /// World position: lerp from the other node (t = 0) to `face` (t = 1).
    pub fn position(&self, graph: &RailGraph) -> Option<Vec2> {
        let edge = graph.edge(self.edge)?;
        let face = graph.node(self.face)?.position;
        let other = graph.node(edge.other_node(self.face)?)?.position;
        Some(other.lerp(face, self.t))
    }

    /// Same physical position, opposite facing: face/other swap and
    /// t -> 1 - t. Pure; used to reverse a train without moving it.
    pub fn flipped(&self, graph: &RailGraph) -> Option<Self> {
        let other = self.other_node(graph)?;
        Some(Self {
            edge: self.edge,
            face: other,
            t: 1.0 - self.t,
        })
    }
}

/// Advance a location by a signed distance (positive = toward `face`).
///
/// Each iteration consumes as much of the remaining distance as the
/// current edge allows; overflow past an endpoint carries onto the edge
/// the node's connectivity rule selects. Dead ends (endpoints, unresolved
/// switches, Invalid nodes) saturate: the remainder is silently dropped
/// and the location clamps at the boundary -- a train cannot run off the
/// end of track. Zero-length edges consume nothing and return the
/// location unchanged.
///
/// The loop is capped at `MOVE_ITERATION_CAP` hops; on exhaustion the last
/// valid location is returned and a warning logged. A simulation tick must
/// never hang on a topology bug.
pub fn advance(
    graph: &RailGraph,
    switches: &SwitchStates,
    start: Location,
    distance: f32,
) -> Location {
    let mut loc = start;
    let mut remaining = distance;

    for _ in 0..MOVE_ITERATION_CAP {
        let Some(edge) = graph.edge(loc.edge) else {
            warn!("advance: location references missing edge {}", loc.edge.0);
            return loc;
        };
        if edge.length <= 0.0 {
            // No distance can be consumed here; the remainder stays with
            // the caller's requested move, which we cannot honor.
            return loc;
        }

        let target = loc.t + remaining / edge.length;
        let clamped = target.clamp(0.0, 1.0);
        let remainder = (target - clamped) * edge.length;
        loc.t = clamped;
        if remainder.abs() <= MOVE_EPSILON {
            return loc;
        }

        let arrival = if remainder > 0.0 {
            loc.face
        } else {
            match edge.other_node(loc.face) {
                Some(n) => n,
                None => {
                    warn!("advance: face node {} not on edge {}", loc.face.0, loc.edge.0);
                    return loc;
                }
            }
        };

        let Some(next) = graph.continuation(switches, arrival, loc.edge) else {
            // Dead end or unresolved switch: stop at the boundary.
            return loc;
        };
        let Some(next_edge) = graph.edge(next) else {
            return loc;
        };

        loc = if remainder > 0.0 {
            // Entering the next edge at the arrival end, moving away from
            // it: the arrival node becomes "other", t starts at 0.
            let Some(new_face) = next_edge.other_node(arrival) else {
                return loc;
            };
            Location {
                edge: next,
                face: new_face,
                t: 0.0,
            }
        } else {
            // Moving backward: enter at the arrival end with t = 1, so the
            // negative remainder keeps pulling t down into the new edge.
            Location {
                edge: next,
                face: arrival,
                t: 1.0,
            }
        };
        remaining = remainder;
    }

    warn!(
        "advance: iteration cap {} exhausted, returning last valid location",
        MOVE_ITERATION_CAP
    );
    loc
}

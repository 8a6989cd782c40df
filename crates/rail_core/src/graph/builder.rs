//! Graph construction from a dataset snapshot, in strictly ordered phases.
//!
//! A failing phase aborts the whole build: no partially-built graph is
//! ever returned as valid. Builds are deterministic -- the dataset's
//! `BTreeMap`s fix the iteration order, and graph ids are assigned
//! sequentially from it, so an unchanged dataset produces an id-identical
//! graph every time.

use std::collections::BTreeMap;

use bevy::prelude::*;
use thiserror::Error;

use crate::config::{MIN_SPACING_EDGE_LENGTH, SPACING_MAX_RATIO};
use crate::dataset::{JunctionType, TrackDataset};
use crate::ids::NodeId;

use super::types::{GraphEdgeId, GraphNodeId, RailGraph};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("graph build failed in phase `{phase}`: {message}")]
    Phase {
        phase: &'static str,
        message: String,
    },
}

fn phase_error(phase: &'static str, message: String) -> BuildError {
    BuildError::Phase { phase, message }
}

/// Build a traversal graph from the dataset.
///
/// Phases, in fixed order: `add_nodes`, `add_edges`,
/// `insert_switch_spacing`, `resolve_signals`. `spacing` is the distance
/// from each switch throat to its synthesized buffer node; zero or
/// negative disables spacing insertion.
pub fn build(data: &TrackDataset, spacing: f32) -> Result<RailGraph, BuildError> {
    let mut graph = RailGraph::default();
    let node_map = add_nodes(data, &mut graph)?;
    add_edges(data, &mut graph, &node_map);
    insert_switch_spacing(&mut graph, spacing);
    resolve_signals(data, &mut graph, &node_map)?;
    Ok(graph)
}

/// Phase 1: one graph node per dataset node, carrying position,
/// classification, and the isolator flag. No edges yet.
fn add_nodes(
    data: &TrackDataset,
    graph: &mut RailGraph,
) -> Result<BTreeMap<NodeId, GraphNodeId>, BuildError> {
    let mut node_map = BTreeMap::new();
    for record in data.nodes.values() {
        let id = graph.add_node(
            Some(record.id),
            record.position,
            record.junction,
            record.isolator,
            record.pairs.clone(),
        );
        if node_map.insert(record.id, id).is_some() {
            return Err(phase_error(
                "add_nodes",
                format!("duplicate node id {}", record.id.0),
            ));
        }
    }
    Ok(node_map)
}

/// Phase 2: one edge per link, length snapshotted from endpoint positions,
/// platform association taken from the dataset's link cache. A link whose
/// endpoint is missing from the graph is skipped with a warning, not a
/// build failure.
fn add_edges(data: &TrackDataset, graph: &mut RailGraph, node_map: &BTreeMap<NodeId, GraphNodeId>) {
    for link in data.links.values() {
        let (Some(&a), Some(&b)) = (node_map.get(&link.node_a), node_map.get(&link.node_b)) else {
            warn!(
                "add_edges: skipping link {} with missing endpoint ({} -> {})",
                link.id.0, link.node_a.0, link.node_b.0
            );
            continue;
        };
        graph.add_edge(link.id, a, b, data.platform_for_link(link.id));
    }
}

/// Phase 3: insert a buffer node near every switch throat.
///
/// For each edge out of a switch that is long enough, a node is
/// synthesized at `spacing` (capped at `SPACING_MAX_RATIO` of the edge
/// length) toward the far end. The original edge keeps its far half and is
/// re-pointed at the new node; a short throat edge connects the switch to
/// it. Both halves keep the parent link id.
fn insert_switch_spacing(graph: &mut RailGraph, spacing: f32) {
    if spacing <= 0.0 {
        return;
    }

    let switch_ids: Vec<GraphNodeId> = graph
        .nodes
        .values()
        .filter(|n| n.junction == JunctionType::Switch)
        .map(|n| n.id)
        .collect();

    for switch_id in switch_ids {
        let adjacent: Vec<GraphEdgeId> = graph
            .nodes
            .get(&switch_id)
            .map(|n| n.edges.clone())
            .unwrap_or_default();

        for edge_id in adjacent {
            let Some(edge) = graph.edges.get(&edge_id) else {
                continue;
            };
            let Some(far_id) = edge.other_node(switch_id) else {
                continue;
            };
            if edge.length <= MIN_SPACING_EDGE_LENGTH {
                continue;
            }
            let source_link = edge.source_link;
            let platform = edge.platform;
            let buffer = spacing.min(edge.length * SPACING_MAX_RATIO);

            let (Some(switch_pos), Some(far_pos)) = (
                graph.nodes.get(&switch_id).map(|n| n.position),
                graph.nodes.get(&far_id).map(|n| n.position),
            ) else {
                continue;
            };
            let mid_pos = switch_pos + (far_pos - switch_pos) / edge.length * buffer;

            let mid = graph.add_node(None, mid_pos, JunctionType::Basic, false, Vec::new());

            // Re-point the far half of the original edge at the new node.
            if let Some(edge) = graph.edges.get_mut(&edge_id) {
                if edge.node_a == switch_id {
                    edge.node_a = mid;
                } else {
                    edge.node_b = mid;
                }
                edge.length = mid_pos.distance(far_pos);
            }
            if let Some(switch) = graph.nodes.get_mut(&switch_id) {
                switch.edges.retain(|&e| e != edge_id);
            }
            if let Some(node) = graph.nodes.get_mut(&mid) {
                node.edges.push(edge_id);
            }

            // Throat half: switch -> buffer node.
            graph.add_edge(source_link, switch_id, mid, platform);
        }
    }
}

/// Phase 4: confirm every signal resolves against the built graph and
/// record its edge association. Signals are a dataset invariant, so an
/// unresolvable one aborts the build.
fn resolve_signals(
    data: &TrackDataset,
    graph: &mut RailGraph,
    node_map: &BTreeMap<NodeId, GraphNodeId>,
) -> Result<(), BuildError> {
    for signal in data.signals.values() {
        let link = data.link_record(signal.link).ok_or_else(|| {
            phase_error(
                "resolve_signals",
                format!("signal {} references missing link {}", signal.id.0, signal.link.0),
            )
        })?;
        if !link.has_node(signal.direction_node) {
            return Err(phase_error(
                "resolve_signals",
                format!(
                    "signal {}: direction node {} is not an endpoint of link {}",
                    signal.id.0, signal.direction_node.0, signal.link.0
                ),
            ));
        }
        let graph_node = node_map.get(&signal.direction_node).ok_or_else(|| {
            phase_error(
                "resolve_signals",
                format!(
                    "signal {}: direction node {} missing from graph",
                    signal.id.0, signal.direction_node.0
                ),
            )
        })?;
        let edge = graph.edge_at(*graph_node, signal.link).ok_or_else(|| {
            phase_error(
                "resolve_signals",
                format!(
                    "signal {}: no edge built for link {}",
                    signal.id.0, signal.link.0
                ),
            )
        })?;
        graph.signal_edges.insert(signal.id, edge);
    }
    Ok(())
}

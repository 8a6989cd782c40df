//! Junction classification: derive a node's `JunctionType` and routed
//! `LinkPair`s from its incident links and their geometry.
//!
//! Pure function of the dataset. Callers persist the result onto the node
//! record (`TrackDataset::reclassify`) after every structural change --
//! link add/remove on either endpoint, or any endpoint reposition.

use std::f32::consts::{PI, TAU};

use crate::dataset::{JunctionType, LinkPair, TrackDataset};
use crate::ids::{LinkId, NodeId};

/// Shortest-arc absolute difference between two angles, in [0, pi].
/// 350 degrees and 10 degrees differ by 20, not 340.
fn arc_delta(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % TAU;
    if d > PI {
        TAU - d
    } else {
        d
    }
}

/// Screen-space direction angle of each usable incident link, in the
/// node's incident-list order. Links whose far node coincides exactly with
/// the node are excluded entirely (a zero vector has no direction).
fn link_directions(data: &TrackDataset, id: NodeId) -> Vec<(LinkId, f32)> {
    let Some(node) = data.node(id) else {
        return Vec::new();
    };
    let mut dirs = Vec::with_capacity(node.links.len());
    for &link_id in &node.links {
        let Some(other) = data
            .link_record(link_id)
            .and_then(|l| l.other_node(id))
            .and_then(|n| data.node(n))
        else {
            continue;
        };
        let d = other.position - node.position;
        if d.length_squared() == 0.0 {
            continue;
        }
        dirs.push((link_id, d.to_angle()));
    }
    dirs
}

/// Classify a node from its current incident links.
///
/// - 1 or 2 links: `Basic` (2 links emit the straight-through pair).
/// - 3 links: `Switch`. The two links with the smallest mutual angular
///   difference are the branches; the remaining link is the stem. Emits
///   (stem, branch1) and (stem, branch2).
/// - 4 links: `Crossover`. The two links with the largest angular
///   difference form the opposed pair; the remaining two (in incident
///   order) form the second pair.
/// - Anything else, or insufficient angle data after excluding degenerate
///   links: `Invalid` with no pairs.
///
/// Ties in the angular comparison keep the first pair found in incident
/// iteration order.
pub fn classify_node(data: &TrackDataset, id: NodeId) -> (JunctionType, Vec<LinkPair>) {
    let Some(node) = data.node(id) else {
        return (JunctionType::Invalid, Vec::new());
    };

    match node.links.len() {
        1 => (JunctionType::Basic, Vec::new()),
        2 => (
            JunctionType::Basic,
            vec![LinkPair(node.links[0], node.links[1])],
        ),
        3 => {
            let dirs = link_directions(data, id);
            if dirs.len() < 3 {
                return (JunctionType::Invalid, Vec::new());
            }
            let Some((i, j)) = extreme_pair(&dirs, true) else {
                return (JunctionType::Invalid, Vec::new());
            };
            let (stem, _) = dirs
                .iter()
                .enumerate()
                .find(|&(k, _)| k != i && k != j)
                .map(|(_, &(l, a))| (l, a))
                .unwrap_or(dirs[0]);
            (
                JunctionType::Switch,
                vec![LinkPair(stem, dirs[i].0), LinkPair(stem, dirs[j].0)],
            )
        }
        4 => {
            let dirs = link_directions(data, id);
            if dirs.len() < 4 {
                return (JunctionType::Invalid, Vec::new());
            }
            let Some((i, j)) = extreme_pair(&dirs, false) else {
                return (JunctionType::Invalid, Vec::new());
            };
            let rest: Vec<LinkId> = dirs
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != i && k != j)
                .map(|(_, &(l, _))| l)
                .collect();
            (
                JunctionType::Crossover,
                vec![LinkPair(dirs[i].0, dirs[j].0), LinkPair(rest[0], rest[1])],
            )
        }
        _ => (JunctionType::Invalid, Vec::new()),
    }
}

/// Index pair with the smallest (`smallest = true`) or largest angular
/// difference. First pair found wins ties.
fn extreme_pair(dirs: &[(LinkId, f32)], smallest: bool) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f32)> = None;
    for i in 0..dirs.len() {
        for j in (i + 1)..dirs.len() {
            let delta = arc_delta(dirs[i].1, dirs[j].1);
            let better = match best {
                None => true,
                Some((_, _, d)) => {
                    if smallest {
                        delta < d
                    } else {
                        delta > d
                    }
                }
            };
            if better {
                best = Some((i, j, delta));
            }
        }
    }
    best.map(|(i, j, _)| (i, j))
}

//! The traversal graph: immutable after build, rebuilt wholesale after
//! every structural edit. `add_node`/`add_edge` exist for the builder;
//! nothing is removed post-build.

use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;

use crate::dataset::{JunctionType, LinkPair, SignalRoute};
use crate::ids::{LinkId, NodeId, PlatformId, SignalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphNodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphEdgeId(pub u32);

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: GraphNodeId,
    /// Originating dataset node; `None` for synthesized spacing nodes.
    pub source: Option<NodeId>,
    pub position: Vec2,
    pub junction: JunctionType,
    pub isolator: bool,
    /// Routed pairings carried over from the dataset record, still in link
    /// ids: after spacing insertion each incident link maps to exactly one
    /// adjacent edge, so the pairing stays resolvable.
    pub pairs: Vec<LinkPair>,
    /// Adjacent edges, maintained by `add_edge` on both endpoints.
    pub edges: Vec<GraphEdgeId>,
}

#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub id: GraphEdgeId,
    /// The dataset link this edge came from. Spacing-split halves keep
    /// their parent's link id.
    pub source_link: LinkId,
    pub node_a: GraphNodeId,
    pub node_b: GraphNodeId,
    /// Euclidean distance between endpoint positions, snapshotted at build
    /// time. Never recomputed from live positions; rebuild the graph after
    /// topology edits.
    pub length: f32,
    pub platform: Option<PlatformId>,
}

impl GraphEdge {
    pub fn has_node(&self, node: GraphNodeId) -> bool {
        self.node_a == node || self.node_b == node
    }

    pub fn other_node(&self, node: GraphNodeId) -> Option<GraphNodeId> {
        if self.node_a == node {
            Some(self.node_b)
        } else if self.node_b == node {
            Some(self.node_a)
        } else {
            None
        }
    }
}

/// External mutable switch alignment: which branch each switch currently
/// routes onto. Set by signaling/switch-control logic; the mover queries it
/// at the moment of traversal and never caches it.
#[derive(Resource, Debug, Clone, Default)]
pub struct SwitchStates {
    active: HashMap<NodeId, LinkId>,
}

impl SwitchStates {
    pub fn set_branch(&mut self, node: NodeId, branch: LinkId) {
        self.active.insert(node, branch);
    }

    /// Unset alignment. An unresolved switch behaves like a dead end.
    pub fn clear(&mut self, node: NodeId) {
        self.active.remove(&node);
    }

    pub fn active_branch(&self, node: NodeId) -> Option<LinkId> {
        self.active.get(&node).copied()
    }

    /// Apply every switch setting a signal route demands.
    pub fn apply_route(&mut self, route: &SignalRoute) {
        for setting in &route.settings {
            self.set_branch(setting.node, setting.branch);
        }
    }
}

/// Adjacency structure built by [`crate::graph::build`].
#[derive(Debug, Default)]
pub struct RailGraph {
    pub(crate) nodes: BTreeMap<GraphNodeId, GraphNode>,
    pub(crate) edges: BTreeMap<GraphEdgeId, GraphEdge>,
    pub(crate) signal_edges: BTreeMap<SignalId, GraphEdgeId>,
    pub(crate) next_node_id: u32,
    pub(crate) next_edge_id: u32,
}

impl RailGraph {
    pub fn node(&self, id: GraphNodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: GraphEdgeId) -> Option<&GraphEdge> {
        self.edges.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn total_edge_length(&self) -> f32 {
        self.edges.values().map(|e| e.length).sum()
    }

    /// The edge a resolved signal sits on.
    pub fn signal_edge(&self, signal: SignalId) -> Option<GraphEdgeId> {
        self.signal_edges.get(&signal).copied()
    }

    /// Builder-only mutation primitive; not part of the steady-state read
    /// contract.
    pub fn add_node(
        &mut self,
        source: Option<NodeId>,
        position: Vec2,
        junction: JunctionType,
        isolator: bool,
        pairs: Vec<LinkPair>,
    ) -> GraphNodeId {
        let id = GraphNodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.insert(
            id,
            GraphNode {
                id,
                source,
                position,
                junction,
                isolator,
                pairs,
                edges: Vec::new(),
            },
        );
        id
    }

    /// Builder-only. Appends the edge to both endpoints' adjacency lists
    /// and snapshots its length; `None` if either endpoint is missing.
    pub fn add_edge(
        &mut self,
        source_link: LinkId,
        a: GraphNodeId,
        b: GraphNodeId,
        platform: Option<PlatformId>,
    ) -> Option<GraphEdgeId> {
        let length = self.nodes.get(&a)?.position.distance(self.nodes.get(&b)?.position);
        let id = GraphEdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.insert(
            id,
            GraphEdge {
                id,
                source_link,
                node_a: a,
                node_b: b,
                length,
                platform,
            },
        );
        if let Some(node) = self.nodes.get_mut(&a) {
            node.edges.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.edges.push(id);
        }
        Some(id)
    }

    /// The edge adjacent to `node` that came from `link`, if any. After
    /// spacing insertion this is unique per (node, link).
    pub fn edge_at(&self, node: GraphNodeId, link: LinkId) -> Option<GraphEdgeId> {
        let record = self.nodes.get(&node)?;
        record
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges.get(&e).is_some_and(|edge| edge.source_link == link))
    }

    /// Connectivity rule at a node: which edge a movement arriving via
    /// `via` continues onto.
    ///
    /// - Through node (Basic, 2 edges): the other edge.
    /// - Switch: stem -> currently aligned branch (unset alignment is a
    ///   dead end); either branch -> stem. Never branch to branch.
    /// - Crossover: the via link's pair partner.
    /// - Endpoints and Invalid nodes: dead end.
    pub fn continuation(
        &self,
        switches: &SwitchStates,
        node_id: GraphNodeId,
        via: GraphEdgeId,
    ) -> Option<GraphEdgeId> {
        let node = self.nodes.get(&node_id)?;
        let via_link = self.edges.get(&via)?.source_link;
        match node.junction {
            JunctionType::Basic => {
                if node.edges.len() == 2 {
                    node.edges.iter().copied().find(|&e| e != via)
                } else {
                    None
                }
            }
            JunctionType::Switch => {
                let stem = stem_link(&node.pairs)?;
                if via_link == stem {
                    let branch = node.source.and_then(|n| switches.active_branch(n))?;
                    if branch == stem || !node.pairs.iter().any(|p| p.contains(branch)) {
                        return None;
                    }
                    self.edge_at(node_id, branch)
                } else if node.pairs.iter().any(|p| p.contains(via_link)) {
                    self.edge_at(node_id, stem)
                } else {
                    None
                }
            }
            JunctionType::Crossover => {
                let partner = node.pairs.iter().find_map(|p| p.partner(via_link))?;
                self.edge_at(node_id, partner)
            }
            JunctionType::Invalid => None,
        }
    }
}

/// The link present in both of a switch's pairs.
fn stem_link(pairs: &[LinkPair]) -> Option<LinkId> {
    let (first, second) = match pairs {
        [a, b] => (a, b),
        _ => return None,
    };
    [first.0, first.1].into_iter().find(|&l| second.contains(l))
}

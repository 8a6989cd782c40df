//! Record types for the editable track dataset.
//!
//! These are the authored, persisted records. The traversal graph in
//! `crate::graph` is derived from them and never persisted.

use bevy::prelude::*;

use crate::ids::{LinkId, NodeId, PlatformGroupId, PlatformId, SignalId};

/// Derived junction classification of a node, recomputed from its incident
/// links after every structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JunctionType {
    /// Unsupported link count or degenerate geometry. Editors routinely
    /// pass through this state mid-edit; it is data, not an error.
    #[default]
    Invalid,
    /// Endpoint or straight-through node (1 or 2 links).
    Basic,
    /// Three-way junction: one stem, two branches.
    Switch,
    /// Four-way junction: two independent straight-through pairs.
    Crossover,
}

/// A routed pairing of two links through a node: the path a train takes
/// when it crosses the node between these two links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPair(pub LinkId, pub LinkId);

impl LinkPair {
    pub fn contains(&self, link: LinkId) -> bool {
        self.0 == link || self.1 == link
    }

    /// The opposite link of `link`, or `None` if `link` is not in the pair.
    pub fn partner(&self, link: LinkId) -> Option<LinkId> {
        if self.0 == link {
            Some(self.1)
        } else if self.1 == link {
            Some(self.0)
        } else {
            None
        }
    }
}

/// A point in the rail network where links meet.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: NodeId,
    pub position: Vec2,
    /// Isolators split track circuits; carried through to the graph,
    /// interpreted by signaling consumers.
    pub isolator: bool,
    /// Incident links in insertion order. Classification iterates this
    /// order, which makes tie-breaks stable for a given authoring sequence.
    pub links: Vec<LinkId>,
    pub junction: JunctionType,
    /// Routed pairings through this node. References only ids in `links`.
    pub pairs: Vec<LinkPair>,
}

/// A connection between two distinct nodes.
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub id: LinkId,
    pub node_a: NodeId,
    pub node_b: NodeId,
}

impl LinkRecord {
    pub fn has_node(&self, node: NodeId) -> bool {
        self.node_a == node || self.node_b == node
    }

    /// The opposite endpoint of `node`, or `None` if `node` is not an
    /// endpoint of this link.
    pub fn other_node(&self, node: NodeId) -> Option<NodeId> {
        if self.node_a == node {
            Some(self.node_b)
        } else if self.node_b == node {
            Some(self.node_a)
        } else {
            None
        }
    }

    /// Stable endpoint key, independent of authoring order.
    pub fn canonical_ends(&self) -> (NodeId, NodeId) {
        if self.node_a <= self.node_b {
            (self.node_a, self.node_b)
        } else {
            (self.node_b, self.node_a)
        }
    }
}

/// One switch alignment demanded by a signal route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchSetting {
    /// Switch node to align.
    pub node: NodeId,
    /// Branch link the switch should route onto.
    pub branch: LinkId,
}

/// A route a signal can clear: the switch alignments it demands and the
/// link the route leads to.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRoute {
    /// Ordered route code shown to operators.
    pub code: u32,
    pub settings: Vec<SwitchSetting>,
    pub target_link: LinkId,
    pub priority: i32,
}

/// A signal attached to one end of a link.
#[derive(Debug, Clone)]
pub struct SignalRecord {
    pub id: SignalId,
    pub link: LinkId,
    /// The endpoint of `link` the signal faces away from; display position
    /// and angle are derived from it.
    pub direction_node: NodeId,
    pub routes: Vec<SignalRoute>,
}

/// A passenger platform alongside one or more links.
#[derive(Debug, Clone)]
pub struct PlatformRecord {
    pub id: PlatformId,
    pub position: Vec2,
    /// Which side of the track the platform sits on.
    pub flipped: bool,
    /// Links served by this platform. The link -> platform reverse index on
    /// the dataset must be refreshed after mutating this.
    pub links: Vec<LinkId>,
    pub group: Option<PlatformGroupId>,
}

/// A named grouping of platforms (one station). Membership is kept
/// bidirectional with `PlatformRecord::group`.
#[derive(Debug, Clone)]
pub struct PlatformGroupRecord {
    pub id: PlatformGroupId,
    pub platforms: Vec<PlatformId>,
}

//! `TrackDataset`: the authoritative, editable record collection.
//!
//! The dataset is the only durable artifact of the system: the traversal
//! graph is rebuilt from it after every structural edit. Mutators keep the
//! incident-link lists and derived classification consistent; the
//! link -> platform reverse index is the one documented exception, rebuilt
//! on demand via [`TrackDataset::refresh_platform_link_cache`].

use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;
use thiserror::Error;

use crate::classify::classify_node;
use crate::ids::{LinkId, NodeId, PlatformGroupId, PlatformId, PointKey, SignalId};

use super::types::*;

/// Rejected raw insertions. Everything else recoverable in the dataset is
/// an `Option`/`bool` return, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("duplicate {namespace} id {id}")]
    DuplicateId { namespace: &'static str, id: u32 },
}

/// The source of truth for the authored rail network.
///
/// Record maps are `BTreeMap` so every iteration (classification order
/// aside, which uses per-node insertion order) is deterministic, which in
/// turn makes graph builds reproducible.
#[derive(Resource, Default)]
pub struct TrackDataset {
    pub nodes: BTreeMap<NodeId, NodeRecord>,
    pub links: BTreeMap<LinkId, LinkRecord>,
    pub signals: BTreeMap<SignalId, SignalRecord>,
    pub platforms: BTreeMap<PlatformId, PlatformRecord>,
    pub groups: BTreeMap<PlatformGroupId, PlatformGroupRecord>,
    /// link -> platform reverse index; rebuilt by `refresh_platform_link_cache`.
    link_platform: HashMap<LinkId, PlatformId>,
    /// Quantized position -> node, used to merge nodes authored at the
    /// same physical point.
    point_index: HashMap<PointKey, NodeId>,
    next_node_id: u32,
    next_link_id: u32,
    next_signal_id: u32,
    next_platform_id: u32,
    next_group_id: u32,
}

impl TrackDataset {
    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Add a node at `pos`, merging with an existing node authored at the
    /// same quantized point.
    pub fn add_node(&mut self, pos: Vec2) -> NodeId {
        let key = PointKey::from_pos(pos);
        if let Some(&existing) = self.point_index.get(&key) {
            if self.nodes.contains_key(&existing) {
                return existing;
            }
        }

        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.insert(
            id,
            NodeRecord {
                id,
                position: pos,
                isolator: false,
                links: Vec::new(),
                junction: JunctionType::Invalid,
                pairs: Vec::new(),
            },
        );
        self.point_index.insert(key, id);
        id
    }

    /// Delete a node, detaching all incident links first.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        for link in node.links.clone() {
            self.unlink(link);
        }
        let node = match self.nodes.remove(&id) {
            Some(n) => n,
            None => return false,
        };
        let key = PointKey::from_pos(node.position);
        if self.point_index.get(&key) == Some(&id) {
            self.point_index.remove(&key);
        }
        true
    }

    /// Reposition a node and reclassify it plus every neighbor across its
    /// incident links (the move can change any of their angle orderings).
    pub fn move_node(&mut self, id: NodeId, pos: Vec2) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let old_key = PointKey::from_pos(node.position);
        node.position = pos;
        if self.point_index.get(&old_key) == Some(&id) {
            self.point_index.remove(&old_key);
        }
        self.point_index.entry(PointKey::from_pos(pos)).or_insert(id);

        let mut affected = vec![id];
        if let Some(node) = self.nodes.get(&id) {
            for link in node.links.clone() {
                if let Some(other) = self.links.get(&link).and_then(|l| l.other_node(id)) {
                    affected.push(other);
                }
            }
        }
        for n in affected {
            self.reclassify(n);
        }
        true
    }

    pub fn set_isolator(&mut self, id: NodeId, isolator: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(n) => {
                n.isolator = isolator;
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Links
    // -------------------------------------------------------------------------

    /// Connect two distinct existing nodes. Returns `None` for self-loops,
    /// missing endpoints, or an already-present connection.
    pub fn link(&mut self, a: NodeId, b: NodeId) -> Option<LinkId> {
        if a == b || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return None;
        }
        let ends = if a <= b { (a, b) } else { (b, a) };
        if self.links.values().any(|l| l.canonical_ends() == ends) {
            return None;
        }

        let id = LinkId(self.next_link_id);
        self.next_link_id += 1;
        self.links.insert(id, LinkRecord { id, node_a: a, node_b: b });
        if let Some(node) = self.nodes.get_mut(&a) {
            node.links.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.links.push(id);
        }
        self.reclassify(a);
        self.reclassify(b);
        Some(id)
    }

    /// Symmetric detach: removes the link from both endpoints, drops
    /// signals attached to it, and removes it from platform link sets and
    /// the reverse cache.
    pub fn unlink(&mut self, id: LinkId) -> bool {
        let Some(link) = self.links.remove(&id) else {
            return false;
        };
        for end in [link.node_a, link.node_b] {
            if let Some(node) = self.nodes.get_mut(&end) {
                node.links.retain(|&l| l != id);
            }
        }
        self.signals.retain(|_, s| s.link != id);
        for platform in self.platforms.values_mut() {
            platform.links.retain(|&l| l != id);
        }
        self.link_platform.remove(&id);
        self.reclassify(link.node_a);
        self.reclassify(link.node_b);
        true
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    /// Attach a signal to `link`, facing away from `direction_node` (which
    /// must be one of the link's endpoints).
    pub fn add_signal(&mut self, link: LinkId, direction_node: NodeId) -> Option<SignalId> {
        if !self.links.get(&link)?.has_node(direction_node) {
            return None;
        }
        let id = SignalId(self.next_signal_id);
        self.next_signal_id += 1;
        self.signals.insert(
            id,
            SignalRecord {
                id,
                link,
                direction_node,
                routes: Vec::new(),
            },
        );
        Some(id)
    }

    pub fn remove_signal(&mut self, id: SignalId) -> bool {
        self.signals.remove(&id).is_some()
    }

    /// Append a route definition. The target link and every switch setting
    /// must resolve in the dataset.
    pub fn add_signal_route(&mut self, signal: SignalId, route: SignalRoute) -> bool {
        if !self.links.contains_key(&route.target_link) {
            return false;
        }
        if route
            .settings
            .iter()
            .any(|s| !self.nodes.contains_key(&s.node) || !self.links.contains_key(&s.branch))
        {
            return false;
        }
        match self.signals.get_mut(&signal) {
            Some(s) => {
                s.routes.push(route);
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Platforms and groups
    // -------------------------------------------------------------------------

    pub fn add_platform(&mut self, pos: Vec2, flipped: bool) -> PlatformId {
        let id = PlatformId(self.next_platform_id);
        self.next_platform_id += 1;
        self.platforms.insert(
            id,
            PlatformRecord {
                id,
                position: pos,
                flipped,
                links: Vec::new(),
                group: None,
            },
        );
        id
    }

    pub fn remove_platform(&mut self, id: PlatformId) -> bool {
        let Some(platform) = self.platforms.remove(&id) else {
            return false;
        };
        if let Some(group) = platform.group.and_then(|g| self.groups.get_mut(&g)) {
            group.platforms.retain(|&p| p != id);
        }
        self.link_platform.retain(|_, &mut p| p != id);
        true
    }

    /// Attach a link to a platform. Callers must invoke
    /// `refresh_platform_link_cache` once their edits are done.
    pub fn attach_platform_link(&mut self, platform: PlatformId, link: LinkId) -> bool {
        if !self.links.contains_key(&link) {
            return false;
        }
        match self.platforms.get_mut(&platform) {
            Some(p) if !p.links.contains(&link) => {
                p.links.push(link);
                true
            }
            _ => false,
        }
    }

    /// Detach a link from a platform; same cache-refresh contract as
    /// `attach_platform_link`.
    pub fn detach_platform_link(&mut self, platform: PlatformId, link: LinkId) -> bool {
        match self.platforms.get_mut(&platform) {
            Some(p) if p.links.contains(&link) => {
                p.links.retain(|&l| l != link);
                true
            }
            _ => false,
        }
    }

    pub fn create_group(&mut self) -> PlatformGroupId {
        let id = PlatformGroupId(self.next_group_id);
        self.next_group_id += 1;
        self.groups.insert(
            id,
            PlatformGroupRecord {
                id,
                platforms: Vec::new(),
            },
        );
        id
    }

    /// Move a platform into `group` (or out of any group with `None`),
    /// keeping membership bidirectional.
    pub fn set_platform_group(
        &mut self,
        platform: PlatformId,
        group: Option<PlatformGroupId>,
    ) -> bool {
        if let Some(g) = group {
            if !self.groups.contains_key(&g) {
                return false;
            }
        }
        let Some(record) = self.platforms.get_mut(&platform) else {
            return false;
        };
        let previous = record.group;
        record.group = group;
        if let Some(old) = previous.and_then(|g| self.groups.get_mut(&g)) {
            old.platforms.retain(|&p| p != platform);
        }
        if let Some(new) = group.and_then(|g| self.groups.get_mut(&g)) {
            if !new.platforms.contains(&platform) {
                new.platforms.push(platform);
            }
        }
        true
    }

    /// Rebuild the link -> platform reverse index in O(total linked links).
    ///
    /// Not called automatically: external mutators of platform link sets
    /// are responsible for invoking this when their edits are done. A link
    /// attached to several platforms resolves to the last writer in
    /// platform-id order.
    pub fn refresh_platform_link_cache(&mut self) {
        self.link_platform.clear();
        for platform in self.platforms.values() {
            for &link in &platform.links {
                self.link_platform.insert(link, platform.id);
            }
        }
    }

    pub fn platform_for_link(&self, link: LinkId) -> Option<PlatformId> {
        self.link_platform.get(&link).copied()
    }

    // -------------------------------------------------------------------------
    // Lookups and predicates
    // -------------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    pub fn link_record(&self, id: LinkId) -> Option<&LinkRecord> {
        self.links.get(&id)
    }

    pub fn signal(&self, id: SignalId) -> Option<&SignalRecord> {
        self.signals.get(&id)
    }

    pub fn platform(&self, id: PlatformId) -> Option<&PlatformRecord> {
        self.platforms.get(&id)
    }

    pub fn group(&self, id: PlatformGroupId) -> Option<&PlatformGroupRecord> {
        self.groups.get(&id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn has_link(&self, id: LinkId) -> bool {
        self.links.contains_key(&id)
    }

    pub fn has_signal(&self, id: SignalId) -> bool {
        self.signals.contains_key(&id)
    }

    pub fn has_platform(&self, id: PlatformId) -> bool {
        self.platforms.contains_key(&id)
    }

    pub fn has_group(&self, id: PlatformGroupId) -> bool {
        self.groups.contains_key(&id)
    }

    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    /// Recompute and persist `junction`/`pairs` for one node.
    pub fn reclassify(&mut self, id: NodeId) {
        let (junction, pairs) = classify_node(self, id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.junction = junction;
            node.pairs = pairs;
        }
    }

    /// Reclassify every node. Used after bulk edits and after load.
    pub fn reclassify_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.reclassify(id);
        }
    }

    // -------------------------------------------------------------------------
    // Raw insertion (loaders, external tooling)
    // -------------------------------------------------------------------------
    //
    // These insert records verbatim: no endpoint validation, no incident
    // list maintenance, no reclassification. Callers are expected to finish
    // with `rebuild_after_load`.

    pub fn insert_node(&mut self, record: NodeRecord) -> Result<(), DatasetError> {
        if self.nodes.contains_key(&record.id) {
            return Err(DatasetError::DuplicateId {
                namespace: "node",
                id: record.id.0,
            });
        }
        self.point_index
            .entry(PointKey::from_pos(record.position))
            .or_insert(record.id);
        self.nodes.insert(record.id, record);
        Ok(())
    }

    pub fn insert_link(&mut self, record: LinkRecord) -> Result<(), DatasetError> {
        if self.links.contains_key(&record.id) {
            return Err(DatasetError::DuplicateId {
                namespace: "link",
                id: record.id.0,
            });
        }
        self.links.insert(record.id, record);
        Ok(())
    }

    pub fn insert_signal(&mut self, record: SignalRecord) -> Result<(), DatasetError> {
        if self.signals.contains_key(&record.id) {
            return Err(DatasetError::DuplicateId {
                namespace: "signal",
                id: record.id.0,
            });
        }
        self.signals.insert(record.id, record);
        Ok(())
    }

    pub fn insert_platform(&mut self, record: PlatformRecord) -> Result<(), DatasetError> {
        if self.platforms.contains_key(&record.id) {
            return Err(DatasetError::DuplicateId {
                namespace: "platform",
                id: record.id.0,
            });
        }
        self.platforms.insert(record.id, record);
        Ok(())
    }

    pub fn insert_group(&mut self, record: PlatformGroupRecord) -> Result<(), DatasetError> {
        if self.groups.contains_key(&record.id) {
            return Err(DatasetError::DuplicateId {
                namespace: "group",
                id: record.id.0,
            });
        }
        self.groups.insert(record.id, record);
        Ok(())
    }

    /// Rebuild every derived structure from the raw records: id counters,
    /// the point index, classification, and the platform link cache.
    pub fn rebuild_after_load(&mut self) {
        self.rebuild_counters();
        self.point_index.clear();
        let entries: Vec<(PointKey, NodeId)> = self
            .nodes
            .values()
            .map(|n| (PointKey::from_pos(n.position), n.id))
            .collect();
        for (key, id) in entries {
            self.point_index.entry(key).or_insert(id);
        }
        self.reclassify_all();
        self.refresh_platform_link_cache();
    }

    /// Rebuild the per-namespace id counters from loaded records.
    pub fn rebuild_counters(&mut self) {
        self.next_node_id = self.nodes.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        self.next_link_id = self.links.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        self.next_signal_id = self.signals.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        self.next_platform_id = self.platforms.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        self.next_group_id = self.groups.keys().map(|id| id.0 + 1).max().unwrap_or(0);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.links.is_empty()
            && self.signals.is_empty()
            && self.platforms.is_empty()
            && self.groups.is_empty()
    }
}

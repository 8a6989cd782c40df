//! Persistence for the track dataset.
//!
//! Live records hold `Vec2` and derived state; the save structs below are
//! the explicit serialized schema (raw `u32` ids, `x`/`y` floats, no
//! derived fields). Classification, the point index, and the platform link
//! cache are rebuilt on load, not stored.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::ids::{LinkId, NodeId, PlatformGroupId, PlatformId, SignalId};
use crate::Saveable;

use super::store::TrackDataset;
use super::types::*;

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveNode {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub isolator: bool,
    pub links: Vec<u32>,
}

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveLink {
    pub id: u32,
    pub node_a: u32,
    pub node_b: u32,
}

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveSwitchSetting {
    pub node: u32,
    pub branch: u32,
}

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveSignalRoute {
    pub code: u32,
    pub settings: Vec<SaveSwitchSetting>,
    pub target_link: u32,
    pub priority: i32,
}

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveSignal {
    pub id: u32,
    pub link: u32,
    pub direction_node: u32,
    pub routes: Vec<SaveSignalRoute>,
}

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SavePlatform {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub flipped: bool,
    pub links: Vec<u32>,
    pub group: Option<u32>,
}

#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveGroup {
    pub id: u32,
    pub platforms: Vec<u32>,
}

#[derive(Serialize, Deserialize, Encode, Decode, Default)]
pub struct SaveTrackDataset {
    pub nodes: Vec<SaveNode>,
    pub links: Vec<SaveLink>,
    pub signals: Vec<SaveSignal>,
    pub platforms: Vec<SavePlatform>,
    pub groups: Vec<SaveGroup>,
}

/// Snapshot the dataset's authored state into the serialized schema.
pub fn snapshot(data: &TrackDataset) -> SaveTrackDataset {
    SaveTrackDataset {
        nodes: data
            .nodes
            .values()
            .map(|n| SaveNode {
                id: n.id.0,
                x: n.position.x,
                y: n.position.y,
                isolator: n.isolator,
                links: n.links.iter().map(|l| l.0).collect(),
            })
            .collect(),
        links: data
            .links
            .values()
            .map(|l| SaveLink {
                id: l.id.0,
                node_a: l.node_a.0,
                node_b: l.node_b.0,
            })
            .collect(),
        signals: data
            .signals
            .values()
            .map(|s| SaveSignal {
                id: s.id.0,
                link: s.link.0,
                direction_node: s.direction_node.0,
                routes: s
                    .routes
                    .iter()
                    .map(|r| SaveSignalRoute {
                        code: r.code,
                        settings: r
                            .settings
                            .iter()
                            .map(|st| SaveSwitchSetting {
                                node: st.node.0,
                                branch: st.branch.0,
                            })
                            .collect(),
                        target_link: r.target_link.0,
                        priority: r.priority,
                    })
                    .collect(),
            })
            .collect(),
        platforms: data
            .platforms
            .values()
            .map(|p| SavePlatform {
                id: p.id.0,
                x: p.position.x,
                y: p.position.y,
                flipped: p.flipped,
                links: p.links.iter().map(|l| l.0).collect(),
                group: p.group.map(|g| g.0),
            })
            .collect(),
        groups: data
            .groups
            .values()
            .map(|g| SaveGroup {
                id: g.id.0,
                platforms: g.platforms.iter().map(|p| p.0).collect(),
            })
            .collect(),
    }
}

/// Reconstruct a dataset from saved records, rebuilding every derived
/// structure (counters, point index, classification, platform cache).
pub fn restore(save: &SaveTrackDataset) -> TrackDataset {
    let mut data = TrackDataset::default();
    for n in &save.nodes {
        data.nodes.insert(
            NodeId(n.id),
            NodeRecord {
                id: NodeId(n.id),
                position: Vec2::new(n.x, n.y),
                isolator: n.isolator,
                links: n.links.iter().map(|&l| LinkId(l)).collect(),
                junction: JunctionType::Invalid,
                pairs: Vec::new(),
            },
        );
    }
    for l in &save.links {
        data.links.insert(
            LinkId(l.id),
            LinkRecord {
                id: LinkId(l.id),
                node_a: NodeId(l.node_a),
                node_b: NodeId(l.node_b),
            },
        );
    }
    for s in &save.signals {
        data.signals.insert(
            SignalId(s.id),
            SignalRecord {
                id: SignalId(s.id),
                link: LinkId(s.link),
                direction_node: NodeId(s.direction_node),
                routes: s
                    .routes
                    .iter()
                    .map(|r| SignalRoute {
                        code: r.code,
                        settings: r
                            .settings
                            .iter()
                            .map(|st| SwitchSetting {
                                node: NodeId(st.node),
                                branch: LinkId(st.branch),
                            })
                            .collect(),
                        target_link: LinkId(r.target_link),
                        priority: r.priority,
                    })
                    .collect(),
            },
        );
    }
    for p in &save.platforms {
        data.platforms.insert(
            PlatformId(p.id),
            PlatformRecord {
                id: PlatformId(p.id),
                position: Vec2::new(p.x, p.y),
                flipped: p.flipped,
                links: p.links.iter().map(|&l| LinkId(l)).collect(),
                group: p.group.map(PlatformGroupId),
            },
        );
    }
    for g in &save.groups {
        data.groups.insert(
            PlatformGroupId(g.id),
            PlatformGroupRecord {
                id: PlatformGroupId(g.id),
                platforms: g.platforms.iter().map(|&p| PlatformId(p)).collect(),
            },
        );
    }
    data.rebuild_after_load();
    data
}

impl Saveable for TrackDataset {
    const SAVE_KEY: &'static str = "track_dataset";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }
        Some(bitcode::encode(&snapshot(self)))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        restore(&crate::decode_or_warn::<SaveTrackDataset>(
            Self::SAVE_KEY,
            bytes,
        ))
    }
}

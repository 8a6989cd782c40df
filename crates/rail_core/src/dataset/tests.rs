//! Unit tests for the track dataset: CRUD invariants, spatial queries, and
//! the save round trip.

use bevy::prelude::*;

use crate::ids::{LinkId, NodeId, PlatformGroupId, PlatformId};
use crate::Saveable;

use super::*;

fn cross_dataset() -> (TrackDataset, NodeId, LinkId) {
    let mut data = TrackDataset::default();
    let center = data.add_node(Vec2::ZERO);
    let west = data.add_node(Vec2::new(-100.0, 0.0));
    let east = data.add_node(Vec2::new(100.0, 0.0));
    let link = data.link(center, west).unwrap();
    data.link(center, east).unwrap();
    (data, center, link)
}

// -----------------------------------------------------------------------------
// Nodes and links
// -----------------------------------------------------------------------------

#[test]
fn test_add_node_merges_at_same_point() {
    let mut data = TrackDataset::default();
    let a = data.add_node(Vec2::new(10.0, 10.0));
    let b = data.add_node(Vec2::new(10.9, 10.9));
    assert_eq!(a, b);
    assert_eq!(data.nodes.len(), 1);

    let c = data.add_node(Vec2::new(20.0, 10.0));
    assert_ne!(a, c);
    assert_eq!(data.nodes.len(), 2);
}

#[test]
fn test_link_rejects_degenerate_inputs() {
    let mut data = TrackDataset::default();
    let a = data.add_node(Vec2::ZERO);
    let b = data.add_node(Vec2::new(50.0, 0.0));

    assert!(data.link(a, a).is_none());
    assert!(data.link(a, NodeId(99)).is_none());

    let first = data.link(a, b);
    assert!(first.is_some());
    // Same connection in either orientation is a duplicate.
    assert!(data.link(a, b).is_none());
    assert!(data.link(b, a).is_none());
}

#[test]
fn test_link_updates_incidence_and_classification() {
    let (data, center, link) = cross_dataset();
    let node = data.node(center).unwrap();
    assert_eq!(node.links.len(), 2);
    assert_eq!(node.junction, JunctionType::Basic);
    assert_eq!(node.pairs, vec![LinkPair(node.links[0], node.links[1])]);
    assert!(node.links.contains(&link));
}

#[test]
fn test_unlink_detaches_everywhere() {
    let (mut data, center, link) = cross_dataset();
    let signal = data.add_signal(link, center).unwrap();
    let platform = data.add_platform(Vec2::new(-50.0, 10.0), false);
    assert!(data.attach_platform_link(platform, link));
    data.refresh_platform_link_cache();

    assert!(data.unlink(link));

    assert!(!data.has_link(link));
    assert!(!data.has_signal(signal));
    assert!(data.platform(platform).unwrap().links.is_empty());
    assert_eq!(data.platform_for_link(link), None);
    // Degree dropped from 2 to 1, still a basic node but with no pair.
    let node = data.node(center).unwrap();
    assert_eq!(node.links.len(), 1);
    assert!(node.pairs.is_empty());
}

#[test]
fn test_remove_node_unlinks_incident() {
    let (mut data, center, link) = cross_dataset();
    assert!(data.remove_node(center));
    assert!(!data.has_node(center));
    assert!(!data.has_link(link));
    assert!(data.links.is_empty());
    // The freed point can be authored again as a fresh node.
    let replacement = data.add_node(Vec2::ZERO);
    assert_ne!(replacement, center);
}

#[test]
fn test_move_node_reclassifies_neighbors() {
    let mut data = TrackDataset::default();
    let center = data.add_node(Vec2::ZERO);
    let west = data.add_node(Vec2::new(-100.0, 0.0));
    let ne = data.add_node(Vec2::new(100.0, 20.0));
    let se = data.add_node(Vec2::new(100.0, -20.0));
    data.link(center, west).unwrap();
    data.link(center, ne).unwrap();
    data.link(center, se).unwrap();
    assert_eq!(data.node(center).unwrap().junction, JunctionType::Switch);

    // Collapsing a branch endpoint onto the center degenerates that
    // direction, which invalidates the junction.
    assert!(data.move_node(ne, Vec2::ZERO));
    assert_eq!(data.node(center).unwrap().junction, JunctionType::Invalid);
}

#[test]
fn test_set_isolator() {
    let (mut data, center, _) = cross_dataset();
    assert!(data.set_isolator(center, true));
    assert!(data.node(center).unwrap().isolator);
    assert!(!data.set_isolator(NodeId(99), true));
}

// -----------------------------------------------------------------------------
// Signals
// -----------------------------------------------------------------------------

#[test]
fn test_add_signal_requires_link_endpoint() {
    let (mut data, _, link) = cross_dataset();
    assert!(data.add_signal(link, NodeId(99)).is_none());
    assert!(data.add_signal(LinkId(99), NodeId(0)).is_none());

    let ends = data.link_record(link).unwrap().canonical_ends();
    assert!(data.add_signal(link, ends.0).is_some());
}

#[test]
fn test_add_signal_route_validates_references() {
    let (mut data, center, link) = cross_dataset();
    let signal = data.add_signal(link, center).unwrap();

    let bad_target = SignalRoute {
        code: 1,
        settings: Vec::new(),
        target_link: LinkId(99),
        priority: 0,
    };
    assert!(!data.add_signal_route(signal, bad_target));

    let bad_setting = SignalRoute {
        code: 1,
        settings: vec![SwitchSetting {
            node: NodeId(99),
            branch: link,
        }],
        target_link: link,
        priority: 0,
    };
    assert!(!data.add_signal_route(signal, bad_setting));

    let good = SignalRoute {
        code: 1,
        settings: vec![SwitchSetting {
            node: center,
            branch: link,
        }],
        target_link: link,
        priority: 5,
    };
    assert!(data.add_signal_route(signal, good));
    assert_eq!(data.signal(signal).unwrap().routes.len(), 1);
}

// -----------------------------------------------------------------------------
// Platforms and groups
// -----------------------------------------------------------------------------

#[test]
fn test_platform_link_cache_last_writer_wins() {
    let (mut data, _, link) = cross_dataset();
    let first = data.add_platform(Vec2::new(-50.0, 10.0), false);
    let second = data.add_platform(Vec2::new(-50.0, -10.0), true);
    assert!(data.attach_platform_link(first, link));
    assert!(data.attach_platform_link(second, link));

    data.refresh_platform_link_cache();
    assert_eq!(data.platform_for_link(link), Some(second));
    // Refreshing again without edits changes nothing.
    data.refresh_platform_link_cache();
    assert_eq!(data.platform_for_link(link), Some(second));

    // Detaching the winner and refreshing falls back to the remaining one.
    assert!(data.detach_platform_link(second, link));
    data.refresh_platform_link_cache();
    assert_eq!(data.platform_for_link(link), Some(first));
}

#[test]
fn test_platform_group_membership_is_bidirectional() {
    let mut data = TrackDataset::default();
    let a = data.add_platform(Vec2::ZERO, false);
    let b = data.add_platform(Vec2::new(20.0, 0.0), false);
    let group = data.create_group();

    assert!(data.set_platform_group(a, Some(group)));
    assert!(data.set_platform_group(b, Some(group)));
    assert_eq!(data.group(group).unwrap().platforms, vec![a, b]);

    assert!(data.set_platform_group(a, None));
    assert_eq!(data.platform(a).unwrap().group, None);
    assert_eq!(data.group(group).unwrap().platforms, vec![b]);

    assert!(!data.set_platform_group(a, Some(PlatformGroupId(99))));
}

#[test]
fn test_existence_predicates() {
    let (mut data, center, link) = cross_dataset();
    let signal = data.add_signal(link, center).unwrap();
    let platform = data.add_platform(Vec2::new(-50.0, 10.0), false);
    let group = data.create_group();

    assert!(data.has_node(center));
    assert!(data.has_link(link));
    assert!(data.has_signal(signal));
    assert!(data.has_platform(platform));
    assert!(data.has_group(group));

    assert!(!data.has_platform(PlatformId(99)));
    assert!(!data.has_group(PlatformGroupId(99)));
}

#[test]
fn test_remove_platform_leaves_group_consistent() {
    let mut data = TrackDataset::default();
    let a = data.add_platform(Vec2::ZERO, false);
    let group = data.create_group();
    assert!(data.set_platform_group(a, Some(group)));

    assert!(data.remove_platform(a));
    assert!(data.group(group).unwrap().platforms.is_empty());
}

// -----------------------------------------------------------------------------
// Spatial queries
// -----------------------------------------------------------------------------

#[test]
fn test_closest_queries_respect_thresholds() {
    let (data, center, link) = cross_dataset();

    let hit = data.closest_node(Vec2::new(5.0, 5.0)).unwrap();
    assert_eq!(hit.0, center);
    assert!(data.closest_node(Vec2::new(0.0, 13.0)).is_none());

    // On the segment but far from any endpoint.
    let (id, dist) = data.closest_link(Vec2::new(-50.0, 15.0)).unwrap();
    assert_eq!(id, link);
    assert!((dist - 15.0).abs() < 1e-4);
    assert!(data.closest_link(Vec2::new(-50.0, 25.0)).is_none());
}

#[test]
fn test_closest_any_prefers_nodes_over_links() {
    let (mut data, center, link) = cross_dataset();
    let platform = data.add_platform(Vec2::new(-50.0, 30.0), false);

    // Within both the node radius and the link threshold.
    assert_eq!(
        data.closest_any(Vec2::new(0.0, 10.0)),
        Some(TrackElement::Node(center))
    );
    // Only the link qualifies here.
    assert_eq!(
        data.closest_any(Vec2::new(-50.0, 15.0)),
        Some(TrackElement::Link(link))
    );
    assert_eq!(
        data.closest_any(Vec2::new(-55.0, 35.0)),
        Some(TrackElement::Platform(platform))
    );
    assert_eq!(data.closest_any(Vec2::new(500.0, 500.0)), None);
}

#[test]
fn test_signal_display_pos_angle() {
    let (mut data, center, link) = cross_dataset();
    let signal = data.add_signal(link, center).unwrap();

    // Facing west along the link, inset from the center node and offset to
    // the side of travel.
    let (pos, angle) = data.signal_display_pos_angle(signal).unwrap();
    let dir = Vec2::new(-1.0, 0.0);
    let expected = dir * crate::config::SIGNAL_INSET
        + dir.perp() * crate::config::SIGNAL_LATERAL_OFFSET;
    assert!((pos - expected).length() < 1e-4);
    assert!((angle - std::f32::consts::PI).abs() < 1e-4);
}

#[test]
fn test_signal_query_uses_display_position() {
    let (mut data, center, link) = cross_dataset();
    let signal = data.add_signal(link, center).unwrap();
    let (display, _) = data.signal_display_pos_angle(signal).unwrap();

    let hit = data.closest_signal(display + Vec2::new(2.0, 2.0)).unwrap();
    assert_eq!(hit.0, signal);
    assert!(data.closest_signal(display + Vec2::new(0.0, 20.0)).is_none());
}

// -----------------------------------------------------------------------------
// Persistence
// -----------------------------------------------------------------------------

fn populated_dataset() -> TrackDataset {
    let mut data = TrackDataset::default();
    let center = data.add_node(Vec2::ZERO);
    let west = data.add_node(Vec2::new(-100.0, 0.0));
    let ne = data.add_node(Vec2::new(100.0, 20.0));
    let se = data.add_node(Vec2::new(100.0, -20.0));
    data.set_isolator(west, true);
    let stem = data.link(center, west).unwrap();
    let b1 = data.link(center, ne).unwrap();
    data.link(center, se).unwrap();

    let signal = data.add_signal(stem, center).unwrap();
    data.add_signal_route(
        signal,
        SignalRoute {
            code: 3,
            settings: vec![SwitchSetting {
                node: center,
                branch: b1,
            }],
            target_link: b1,
            priority: 2,
        },
    );

    let platform = data.add_platform(Vec2::new(-50.0, 12.0), true);
    data.attach_platform_link(platform, stem);
    let group = data.create_group();
    data.set_platform_group(platform, Some(group));
    data.refresh_platform_link_cache();
    data
}

#[test]
fn test_save_round_trip_restores_everything() {
    let data = populated_dataset();
    let restored = restore(&snapshot(&data));

    assert_eq!(restored.nodes.len(), data.nodes.len());
    assert_eq!(restored.links.len(), data.links.len());
    assert_eq!(restored.signals.len(), data.signals.len());
    assert_eq!(restored.platforms.len(), data.platforms.len());
    assert_eq!(restored.groups.len(), data.groups.len());

    for (id, node) in &data.nodes {
        let other = restored.node(*id).unwrap();
        assert!((other.position - node.position).length() < 1e-6);
        assert_eq!(other.isolator, node.isolator);
        assert_eq!(other.links, node.links);
        // Derived classification is rebuilt, not stored.
        assert_eq!(other.junction, node.junction);
        assert_eq!(other.pairs, node.pairs);
    }
    for (id, signal) in &data.signals {
        assert_eq!(restored.signal(*id).unwrap().routes, signal.routes);
    }
    let platform = data.platforms.values().next().unwrap();
    assert_eq!(
        restored.platform_for_link(platform.links[0]),
        Some(platform.id)
    );
    assert_eq!(
        restored.platform(platform.id).unwrap().group,
        platform.group
    );
}

#[test]
fn test_restore_resumes_id_counters() {
    let data = populated_dataset();
    let mut restored = restore(&snapshot(&data));

    let node = restored.add_node(Vec2::new(300.0, 300.0));
    assert!(!data.nodes.contains_key(&node));
    let platform = restored.add_platform(Vec2::new(300.0, 320.0), false);
    assert!(!data.platforms.contains_key(&platform));
}

#[test]
fn test_saveable_bytes_round_trip() {
    let data = populated_dataset();
    let bytes = data.save_to_bytes().unwrap();
    let restored = TrackDataset::load_from_bytes(&bytes);
    assert_eq!(restored.nodes.len(), data.nodes.len());
    assert_eq!(restored.signals.len(), data.signals.len());

    assert!(TrackDataset::default().save_to_bytes().is_none());
}

#[test]
fn test_corrupt_bytes_load_as_empty() {
    let restored = TrackDataset::load_from_bytes(&[0xff, 0x13, 0x37]);
    assert!(restored.is_empty());
}

#[test]
fn test_raw_insert_rejects_duplicate_ids() {
    let mut data = TrackDataset::default();
    let record = NodeRecord {
        id: NodeId(4),
        position: Vec2::ZERO,
        isolator: false,
        links: Vec::new(),
        junction: JunctionType::Invalid,
        pairs: Vec::new(),
    };
    assert!(data.insert_node(record.clone()).is_ok());
    let err = data.insert_node(record).unwrap_err();
    assert!(matches!(
        err,
        DatasetError::DuplicateId {
            namespace: "node",
            id: 4
        }
    ));
}

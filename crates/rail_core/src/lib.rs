//! Rail network core: an editable track dataset, the traversal graph
//! derived from it, and position tracking along that graph.
//!
//! The dataset ([`dataset::TrackDataset`]) is the durable, authored state:
//! nodes, links, signals, platforms. The graph ([`graph::RailGraph`]) is
//! rebuilt from the dataset after structural edits and is what movers run
//! on ([`mover::advance`]). All core entry points take their state as
//! arguments; [`RailCorePlugin`] only wires the resources into a host app.

use bevy::prelude::*;

pub mod classify;
pub mod config;
pub mod dataset;
pub mod graph;
pub mod ids;
pub mod mover;

pub use dataset::TrackDataset;
pub use graph::{RailGraph, SwitchStates};
pub use mover::Location;

// ---------------------------------------------------------------------------
// Persistence plumbing
// ---------------------------------------------------------------------------

/// A resource the host's save system can persist under a stable key.
///
/// The host stores each implementor's bytes in a key -> blob map, so it can
/// save and restore the dataset without naming concrete types.
pub trait Saveable: Resource + Default + Send + Sync + 'static {
    /// Map key for this resource. Renaming it orphans old save data.
    const SAVE_KEY: &'static str;

    /// Encode the resource, or `None` to omit it from the save entirely
    /// (the usual choice for a default-state resource).
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    /// Rebuild the resource from its saved bytes.
    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// `bitcode::decode` with a warn-and-default fallback, so a corrupt or
/// stale blob degrades to an empty resource instead of failing the load.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    match bitcode::decode(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!("{key}: undecodable save blob ({} bytes): {e}", bytes.len());
            T::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Registers the rail core resources with a Bevy app.
pub struct RailCorePlugin;

impl Plugin for RailCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrackDataset>()
            .init_resource::<SwitchStates>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_registers_resources() {
        let mut app = App::new();
        app.add_plugins(RailCorePlugin);
        assert!(app.world().contains_resource::<TrackDataset>());
        assert!(app.world().contains_resource::<SwitchStates>());
    }

    #[test]
    fn test_saveable_keys() {
        assert_eq!(TrackDataset::SAVE_KEY, "track_dataset");
    }

    #[test]
    fn test_decode_or_warn_falls_back_to_default() {
        let decoded: dataset::SaveTrackDataset = decode_or_warn("test", &[0xde, 0xad]);
        assert!(decoded.nodes.is_empty());
    }
}

//! ECS Systems
//!
//! The per-tick evaluation protocol, as chained systems:
//! snapshot -> reset -> sense -> update -> actuate -> reindex.

pub mod proximity;
pub mod sense;
pub mod tick;

pub use proximity::{add_all_proxies, refresh_proxies, SpatialIndex};
pub use sense::{capture_snapshot, sense_brains, SnapshotEntry, WorldSnapshot};
pub use tick::{apply_actuators, reset_brains, update_brains};

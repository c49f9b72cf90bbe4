//! Sensing phase: pair each interested sensor with its candidate sensees.
//!
//! Candidate selection follows the sensor's target filter. Ubiquitous kinds
//! (lights, by default) are found by exhaustive scan of the frame snapshot,
//! one `sense` call per match; every other kind goes through the proximity
//! index's nearest-match query, one call for the returned neighbour.

use bevy_ecs::prelude::*;
use tracing::trace;

use instinct_spatial::KindMask;

use crate::brain::Brain;
use crate::components::agent::Kind;
use crate::components::state::DynamicState;
use crate::config::SimConfig;
use crate::systems::proximity::SpatialIndex;
use crate::SimRng;

/// Resource: immutable view of every entity's kind and physical state,
/// captured before any brain mutates. Sensing for the whole frame reads
/// this snapshot, so results do not depend on agent iteration order.
#[derive(Resource, Debug, Default)]
pub struct WorldSnapshot {
    entries: Vec<SnapshotEntry>,
}

/// One entity as seen by the sensing phase.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotEntry {
    pub entity: Entity,
    pub kind: KindMask,
    pub state: DynamicState,
}

impl WorldSnapshot {
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn state_of(&self, entity: Entity) -> Option<DynamicState> {
        self.entries
            .iter()
            .find(|entry| entry.entity == entity)
            .map(|entry| entry.state)
    }
}

/// System: rebuild the frame snapshot. Runs before any brain is touched.
pub fn capture_snapshot(
    mut snapshot: ResMut<WorldSnapshot>,
    query: Query<(Entity, &Kind, &DynamicState)>,
) {
    snapshot.entries.clear();
    for (entity, kind, state) in query.iter() {
        snapshot.entries.push(SnapshotEntry {
            entity,
            kind: kind.0,
            state: *state,
        });
    }
}

/// System: run the sensing phase for every brain.
///
/// Panics if a sensor's target filter needs a nearest-neighbour query while
/// no proximity index is installed; that is a fatal configuration error,
/// not a degradable one.
pub fn sense_brains(
    snapshot: Res<WorldSnapshot>,
    index: Option<Res<SpatialIndex>>,
    config: Res<SimConfig>,
    mut rng: ResMut<SimRng>,
    mut brains: Query<(Entity, &DynamicState, &mut Brain)>,
) {
    for (entity, origin, mut brain) in brains.iter_mut() {
        for (node, filter) in brain.sensor_filters() {
            if filter.intersects(config.ubiquitous) {
                for entry in snapshot.entries() {
                    if entry.entity == entity || !entry.kind.intersects(filter) {
                        continue;
                    }
                    brain.sense(node, origin, &entry.state, &mut rng.0);
                }
            } else {
                let Some(index) = &index else {
                    panic!(
                        "nearest neighbour index not initialized: sensing kind {filter:?} \
                         requires proximity queries"
                    );
                };
                let found = index.0.find_nearest(
                    origin.position,
                    config.search_radius,
                    filter,
                    Some(entity),
                );
                if let Some(found) = found {
                    if let Some(state) = snapshot.state_of(found) {
                        trace!(?entity, sensee = ?found, "proximity pairing");
                        brain.sense(node, origin, &state, &mut rng.0);
                    }
                }
            }
        }
    }
}

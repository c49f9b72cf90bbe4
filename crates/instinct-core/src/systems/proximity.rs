//! Proximity database upkeep around the tick.

use bevy_ecs::prelude::*;

use instinct_spatial::UniformGrid;

use crate::components::agent::Kind;
use crate::components::state::DynamicState;

/// Resource: the shared nearest-neighbour database over all proxied
/// entities. Mutated only between frames; a whole tick of sensing sees one
/// consistent generation of proxies.
#[derive(Resource)]
pub struct SpatialIndex(pub UniformGrid<Entity>);

/// Register every entity carrying a kind and a physical state. Called once
/// after scenario setup.
pub fn add_all_proxies(world: &mut World) {
    let mut rows = Vec::new();
    let mut query = world.query::<(Entity, &Kind, &DynamicState)>();
    for (entity, kind, state) in query.iter(world) {
        rows.push((entity, kind.0, state.position));
    }

    let mut index = world.resource_mut::<SpatialIndex>();
    for (entity, mask, position) in rows {
        index.0.add_proxy(entity, position, mask);
    }
}

/// Reinsert moved proxies. Runs last in the tick, after every agent has
/// finished sensing and moving, so queries within a tick always observe the
/// previous tick's positions.
pub fn refresh_proxies(
    mut index: ResMut<SpatialIndex>,
    query: Query<(Entity, &DynamicState)>,
) {
    for (entity, state) in query.iter() {
        index.0.update_proxy(entity, state.position);
    }
}

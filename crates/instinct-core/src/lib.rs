//! Behavior-based agent architecture.
//!
//! Each agent owns a "brain": a fixed-topology graph of sensor and actuator
//! nodes evaluated once per simulation tick. Leaf sensors sample the world
//! through a proximity protocol, composite nodes transform upstream
//! activations in a fixed order, and actuators expose the results to the
//! physical integrator.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod brain;
pub mod components;
pub mod config;
pub mod output;
pub mod setup;
pub mod systems;

pub use brain::{
    Actuator, ActuatorId, ActuatorKind, Brain, BrainBuilder, BrainError, FunctionKind, LeafSensor,
    NodeId, NodeOutput, SensorWidth,
};
pub use components::agent::{Kind, MaxSpeed, LIGHT, VEHICLE};
pub use components::state::DynamicState;
pub use config::{ConfigError, SimConfig};
pub use systems::{
    add_all_proxies, apply_actuators, capture_snapshot, refresh_proxies, reset_brains,
    sense_brains, update_brains, SpatialIndex, WorldSnapshot,
};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

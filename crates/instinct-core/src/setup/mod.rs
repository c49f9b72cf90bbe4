//! Scenario construction: spawn lights and vehicles with canonical brains.
//!
//! The brain topologies here are the canonical wirings the engine is
//! exercised with: a bare light sensor on a motor, a sensor routed through
//! a transfer function, and a light seeker that hands control to its
//! collision sensor when a collision threatens.

use bevy_ecs::prelude::*;
use clap::ValueEnum;
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::brain::{ActuatorKind, Brain, BrainBuilder, BrainError, FunctionKind};
use crate::components::agent::{Kind, MaxSpeed, LIGHT, VEHICLE};
use crate::components::state::DynamicState;
use crate::config::SimConfig;

/// Which demo population to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// One light, one vehicle that runs while lit.
    LightActivated,
    /// One light, vehicles steering toward it through each transfer kind.
    LightSeeking,
    /// One light, vehicles seeking it while avoiding each other.
    SeekAndAvoid,
}

/// Spawn the chosen scenario's population.
pub fn spawn_scenario(
    world: &mut World,
    scenario: Scenario,
    rng: &mut SmallRng,
) -> Result<(), BrainError> {
    let config = world.resource::<SimConfig>().clone();
    let center = Vec2::new(config.world_width, config.world_height) * 0.5;

    match scenario {
        Scenario::LightActivated => {
            spawn_light(world, center);
            let brain = light_activated_brain(config.world_width, false)?;
            let position = scatter(rng, &config);
            spawn_vehicle(world, position, rng.gen_range(0.8..1.0), brain);
        }
        Scenario::LightSeeking => {
            spawn_light(world, center);
            for function in [FunctionKind::Buffer, FunctionKind::Invert, FunctionKind::Sigmoid] {
                let brain = transfer_brain(config.world_width, true, function)?;
                let position = scatter(rng, &config);
                spawn_vehicle(world, position, rng.gen_range(0.8..1.0), brain);
            }
        }
        Scenario::SeekAndAvoid => {
            spawn_light(world, scatter(rng, &config));
            for _ in 0..2 {
                let brain =
                    avoider_brain(config.world_width, config.world_width * 0.1)?;
                let position = scatter(rng, &config);
                spawn_vehicle(world, position, rng.gen_range(0.8..1.0), brain);
            }
        }
    }

    Ok(())
}

/// A spawn position inside the middle 80% of the world.
fn scatter(rng: &mut SmallRng, config: &SimConfig) -> Vec2 {
    Vec2::new(
        (0.8 * rng.gen::<f32>() + 0.1) * config.world_width,
        (0.8 * rng.gen::<f32>() + 0.1) * config.world_height,
    )
}

/// Spawn a stationary light source.
pub fn spawn_light(world: &mut World, position: Vec2) -> Entity {
    world
        .spawn((Kind(LIGHT), DynamicState::new(position, 0.0)))
        .id()
}

/// Spawn a vehicle driven by the given brain.
pub fn spawn_vehicle(
    world: &mut World,
    position: Vec2,
    max_speed: f32,
    brain: Brain,
) -> Entity {
    world
        .spawn((
            Kind(VEHICLE),
            DynamicState::new(position, 0.0),
            MaxSpeed(max_speed),
            brain,
        ))
        .id()
}

/// A light sensor wired straight to a motor.
pub fn light_activated_brain(radius: f32, directional: bool) -> Result<Brain, BrainError> {
    let mut builder = BrainBuilder::with_capacity(1, 1);
    let light = builder.push_light_sensor(radius, directional);
    builder.push_actuator(ActuatorKind::Motor, light);
    builder.build()
}

/// A light sensor routed through a transfer function.
///
/// The function is appended ahead of the sensor it reads, so its output
/// trails the stimulus by one tick.
pub fn transfer_brain(
    radius: f32,
    directional: bool,
    function: FunctionKind,
) -> Result<Brain, BrainError> {
    let mut builder = BrainBuilder::with_capacity(2, 1);
    let func = builder.push_function(function);
    let light = builder.push_light_sensor(radius, directional);
    builder.connect(func, light)?;
    builder.push_actuator(ActuatorKind::Motor, func);
    builder.build()
}

/// A light seeker whose motor follows the collision sensor instead while a
/// collision threatens.
pub fn avoider_brain(light_radius: f32, collision_radius: f32) -> Result<Brain, BrainError> {
    let mut builder = BrainBuilder::with_capacity(3, 1);
    let collision = builder.push_collision_sensor(collision_radius);
    let switch = builder.push_switch();
    let light = builder.push_light_sensor(light_radius, true);
    builder.set_switch_links(switch, collision, light, collision)?;
    builder.push_actuator(ActuatorKind::Motor, switch);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_brains_assemble() {
        assert!(light_activated_brain(100.0, false).is_ok());
        for function in [FunctionKind::Buffer, FunctionKind::Invert, FunctionKind::Sigmoid] {
            assert!(transfer_brain(100.0, true, function).is_ok());
        }

        let avoider = avoider_brain(100.0, 10.0).unwrap();
        assert_eq!(avoider.node_count(), 3);
        assert_eq!(avoider.actuator_count(), 1);
    }
}

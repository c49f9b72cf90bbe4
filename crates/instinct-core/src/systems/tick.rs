//! Reset, update and actuation phases of the per-tick protocol.

use std::f32::consts::TAU;

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::brain::{ActuatorKind, Brain};
use crate::components::agent::MaxSpeed;
use crate::components::state::DynamicState;
use crate::config::SimConfig;

/// System: start the frame by resetting every sensor's scratch state.
pub fn reset_brains(mut brains: Query<&mut Brain>) {
    for mut brain in brains.iter_mut() {
        brain.reset();
    }
}

/// System: walk every brain's node list in its fixed assembly order.
pub fn update_brains(config: Res<SimConfig>, mut brains: Query<&mut Brain>) {
    for mut brain in brains.iter_mut() {
        brain.update(config.dt);
    }
}

/// System: connect actuator outputs to the physical state.
///
/// A Motor turns by the steering channel and advances along the heading by
/// the activation channel; a Steering actuator only turns. Positions wrap
/// toroidally at the world bounds.
pub fn apply_actuators(
    config: Res<SimConfig>,
    mut vehicles: Query<(&Brain, &MaxSpeed, &mut DynamicState)>,
) {
    for (brain, max_speed, mut state) in vehicles.iter_mut() {
        for actuator in brain.actuators() {
            let out = actuator.output();
            state.heading = wrap_angle(state.heading + config.steering_rate * out.steering);
            if actuator.kind() == ActuatorKind::Motor {
                let step = state.forward() * (max_speed.0 * out.activation);
                state.position += step;
            }
        }
        state.position = wrap_position(state.position, config.world_width, config.world_height);
    }
}

fn wrap_angle(mut heading: f32) -> f32 {
    if heading < 0.0 {
        heading += TAU;
    } else if heading > TAU {
        heading -= TAU;
    }
    heading
}

fn wrap_position(mut position: Vec2, width: f32, height: f32) -> Vec2 {
    if position.x > width {
        position.x = 0.0;
    } else if position.x < 0.0 {
        position.x = width;
    }
    if position.y > height {
        position.y = 0.0;
    } else if position.y < 0.0 {
        position.y = height;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_angle_stays_in_one_turn() {
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_angle(-0.5) - (TAU - 0.5)).abs() < 1e-6);
        assert_eq!(wrap_angle(1.0), 1.0);
    }

    #[test]
    fn wrap_position_is_toroidal() {
        let wrapped = wrap_position(Vec2::new(120.0, -5.0), 100.0, 100.0);
        assert_eq!(wrapped, Vec2::new(0.0, 100.0));
    }
}

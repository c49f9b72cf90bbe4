//! Physical state borrowed by sensors during the sensing phase.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Component: position and heading of one entity.
///
/// Heading 0 faces along +y; increasing the heading turns toward +x. The
/// world/engine owns this state; the sensor graph only ever borrows it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicState {
    pub position: Vec2,
    pub heading: f32,
}

impl DynamicState {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self { position, heading }
    }

    /// Unit vector this entity is facing along.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), self.heading.cos())
    }

    /// Express a world-frame offset in this entity's heading frame:
    /// +y is ahead, +x is to the right.
    pub fn to_local(&self, offset: Vec2) -> Vec2 {
        let (sin, cos) = self.heading.sin_cos();
        Vec2::new(
            offset.x * cos - offset.y * sin,
            offset.x * sin + offset.y * cos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_points_along_positive_y_at_zero_heading() {
        let state = DynamicState::new(Vec2::ZERO, 0.0);
        let forward = state.forward();
        assert!((forward.x).abs() < 1e-6);
        assert!((forward.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn to_local_maps_the_forward_direction_to_straight_ahead() {
        let state = DynamicState::new(Vec2::ZERO, FRAC_PI_2);
        let local = state.to_local(state.forward());
        assert!(local.x.abs() < 1e-6);
        assert!((local.y - 1.0).abs() < 1e-6);
    }
}

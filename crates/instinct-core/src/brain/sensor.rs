//! Leaf sensors: the only nodes that sample world state directly.
//!
//! A leaf is fed zero or more `(origin, sensee)` pairs during the sensing
//! phase, one call per candidate entity matching its target filter. Calls
//! within a frame fold into a pending pair according to the sensor's
//! selection policy; the pending pair becomes the node's visible output when
//! the node's slot in the update walk is reached.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use instinct_spatial::KindMask;

use crate::components::agent::{LIGHT, VEHICLE};
use crate::components::state::DynamicState;

/// Restored by `reset`; larger than any realizable normalized distance.
pub(crate) const RESET_DISTANCE: f32 = 1.0e6;

/// Upper bound of the uniform jitter mixed into steering outputs.
pub const STEERING_JITTER: f32 = 0.1;

/// Range gate of the collision sensor, in normalized distance units.
/// Intentionally far outside the [0,1] scale of the falloff curve; do not
/// tighten without retuning the avoidance demos.
const COLLISION_RANGE_GATE: f32 = 20.0;

/// Below this normalized distance a collision registers regardless of
/// facing.
const COLLISION_CONTACT_GATE: f32 = 0.5;

/// Activation/steering pair produced by every node in the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    /// Stimulus strength; leaves keep this in [0,1].
    pub activation: f32,
    /// Lateral turn bias, independent of the activation channel.
    pub steering: f32,
}

/// Whether a sensor considers only the nearest qualifying sensee or an
/// aggregate over several. The leaf kinds here all report `Nearest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorWidth {
    Nearest,
    Average,
}

/// Which stimulus a leaf responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafKind {
    Light,
    Collision,
}

/// A leaf sensor node.
#[derive(Debug, Clone)]
pub struct LeafSensor {
    kind: LeafKind,
    /// Distances are normalized by this radius: 1.0 = at the boundary.
    radius: f32,
    sensed: KindMask,
    width: SensorWidth,
    directional: bool,
    internal: bool,
    clear_each_frame: bool,
    /// false = accumulate across calls within the frame.
    choose_closest: bool,
    closest_distance: f32,
    pending: NodeOutput,
    pub(crate) output: NodeOutput,
}

impl LeafSensor {
    /// Light sensor: responds to `LIGHT` entities, accumulating over every
    /// light sensed this frame.
    pub fn light(radius: f32, directional: bool) -> Self {
        Self {
            kind: LeafKind::Light,
            radius,
            sensed: LIGHT,
            width: SensorWidth::Nearest,
            directional,
            internal: false,
            clear_each_frame: true,
            choose_closest: false,
            closest_distance: RESET_DISTANCE,
            pending: NodeOutput::default(),
            output: NodeOutput::default(),
        }
    }

    /// Collision sensor: responds to `VEHICLE` entities, keeping only the
    /// closest qualifying threat seen this frame.
    pub fn collision(radius: f32) -> Self {
        Self {
            kind: LeafKind::Collision,
            radius,
            sensed: VEHICLE,
            width: SensorWidth::Nearest,
            directional: true,
            internal: false,
            clear_each_frame: true,
            choose_closest: true,
            closest_distance: RESET_DISTANCE,
            pending: NodeOutput::default(),
            output: NodeOutput::default(),
        }
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }

    /// The categories of entity this sensor responds to.
    pub fn sensed_kind(&self) -> KindMask {
        self.sensed
    }

    pub fn width(&self) -> SensorWidth {
        self.width
    }

    /// Internal sensors read the owning agent's own state and take no part
    /// in world pairing.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Start a new frame: clear the pending accumulation if the sensor is
    /// frame-scoped, and push the closest-distance scratch above anything a
    /// real sensee can produce.
    pub fn reset(&mut self) {
        if self.clear_each_frame {
            self.pending = NodeOutput::default();
        }
        self.closest_distance = RESET_DISTANCE;
    }

    /// Evaluate one `(origin, sensee)` pair.
    pub fn sense(&mut self, origin: &DynamicState, sensee: &DynamicState, rng: &mut SmallRng) {
        match self.kind {
            LeafKind::Light => self.sense_light(origin, sensee, rng),
            LeafKind::Collision => self.sense_collision(origin, sensee, rng),
        }
    }

    /// The frame's folded result, published as the node's visible output
    /// when the update walk reaches this node.
    pub(crate) fn pending_output(&self) -> NodeOutput {
        self.pending
    }

    fn sense_light(&mut self, origin: &DynamicState, sensee: &DynamicState, rng: &mut SmallRng) {
        let offset = sensee.position - origin.position;
        let distance = offset.length() / self.radius;

        let falloff = (1.0 - distance).max(0.0);
        let activation = (falloff * falloff).min(1.0);

        let mut steering = 0.0;
        if self.directional && falloff > 0.0 {
            let local = origin.to_local(offset);
            steering = local.x * falloff + rng.gen_range(0.0..STEERING_JITTER);
        }

        self.fold(distance, activation, steering);
    }

    fn sense_collision(&mut self, origin: &DynamicState, sensee: &DynamicState, rng: &mut SmallRng) {
        let offset = sensee.position - origin.position;
        let distance = offset.length() / self.radius;

        if distance >= COLLISION_RANGE_GATE {
            return;
        }

        let falloff = (1.0 - distance).max(0.0);
        let activation = (falloff * falloff).min(1.0);

        // Only the closest threat this frame is kept.
        if distance >= self.closest_distance {
            return;
        }

        let local = origin.to_local(offset);
        let very_close = distance < COLLISION_CONTACT_GATE;

        // The sensee must be ahead of us, or right on top of us.
        if !very_close && local.y <= 0.0 {
            return;
        }

        let steering = -local.x / distance + rng.gen_range(0.0..STEERING_JITTER);

        // And heading towards us, or right on top of us.
        let dot = sensee.forward().dot(origin.forward());
        if very_close || dot < 0.0 {
            self.closest_distance = distance;
            self.pending = NodeOutput {
                activation,
                steering,
            };
        }
    }

    fn fold(&mut self, distance: f32, activation: f32, steering: f32) {
        if self.choose_closest {
            if distance < self.closest_distance {
                self.closest_distance = distance;
                self.pending = NodeOutput {
                    activation,
                    steering,
                };
            }
        } else {
            self.pending.activation += activation;
            self.pending.steering = steering;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn at(x: f32, y: f32) -> DynamicState {
        DynamicState::new(Vec2::new(x, y), 0.0)
    }

    #[test]
    fn light_at_half_radius_straight_ahead() {
        let mut rng = rng();
        let mut sensor = LeafSensor::light(10.0, true);
        let origin = at(0.0, 0.0);
        let sensee = at(0.0, 5.0);

        sensor.sense(&origin, &sensee, &mut rng);

        let out = sensor.pending;
        assert!((out.activation - 0.25).abs() < 1e-6);
        // Directly ahead: steering is jitter only.
        assert!(out.steering >= 0.0 && out.steering < STEERING_JITTER);
    }

    #[test]
    fn light_beyond_radius_contributes_nothing() {
        let mut rng = rng();
        let mut sensor = LeafSensor::light(10.0, true);
        sensor.sense(&at(0.0, 0.0), &at(0.0, 25.0), &mut rng);

        assert_eq!(sensor.pending, NodeOutput::default());
    }

    #[test]
    fn accumulate_sums_activation_and_keeps_last_steering() {
        let mut rng = rng();
        let mut sensor = LeafSensor::light(10.0, true);
        let origin = at(0.0, 0.0);

        // Straight ahead: steering is jitter only.
        sensor.sense(&origin, &at(0.0, 5.0), &mut rng);
        // Off to the right: steering = 3 * 0.5 + jitter.
        sensor.sense(&origin, &at(3.0, 4.0), &mut rng);

        let out = sensor.pending;
        assert!((out.activation - 0.5).abs() < 1e-6);
        assert!(out.steering >= 1.5 && out.steering < 1.5 + STEERING_JITTER);
    }

    #[test]
    fn choose_closest_keeps_the_nearest_pair_only() {
        let mut rng = rng();
        let mut sensor = LeafSensor::collision(10.0);
        let origin = at(0.0, 0.0);
        // All sensees head back towards the origin.
        let facing_us = |x: f32, y: f32| DynamicState::new(Vec2::new(x, y), PI);

        sensor.sense(&origin, &facing_us(0.0, 5.0), &mut rng);
        sensor.sense(&origin, &facing_us(0.0, 3.0), &mut rng);
        sensor.sense(&origin, &facing_us(0.0, 8.0), &mut rng);

        // Normalized distance 0.3 wins: activation = 0.7^2.
        let out = sensor.pending;
        assert!((out.activation - 0.49).abs() < 1e-6);
        assert!(out.steering >= 0.0 && out.steering < STEERING_JITTER);
    }

    #[test]
    fn choose_closest_ties_favor_the_first_seen() {
        let mut rng = rng();
        let mut sensor = LeafSensor::collision(10.0);
        let origin = at(0.0, 0.0);

        // Same distance, but the second would steer hard left.
        sensor.sense(&origin, &DynamicState::new(Vec2::new(0.0, 5.0), PI), &mut rng);
        sensor.sense(&origin, &DynamicState::new(Vec2::new(3.0, 4.0), PI), &mut rng);

        // The first pair survives: steering stays jitter-sized, never the
        // -6.0 the second call would have produced.
        let out = sensor.pending;
        assert!(out.steering >= 0.0 && out.steering < STEERING_JITTER);
    }

    #[test]
    fn coincident_collision_clamps_activation_to_one() {
        let mut rng = rng();
        let mut sensor = LeafSensor::collision(10.0);
        let state = at(40.0, 40.0);

        sensor.sense(&state, &state, &mut rng);

        assert_eq!(sensor.pending.activation, 1.0);
    }

    #[test]
    fn collision_ignores_sensee_behind_and_heading_away() {
        let mut rng = rng();
        let mut sensor = LeafSensor::collision(10.0);
        let origin = at(0.0, 0.0);

        // Behind the origin, not very close.
        sensor.sense(&origin, &DynamicState::new(Vec2::new(0.0, -8.0), PI), &mut rng);
        assert_eq!(sensor.pending, NodeOutput::default());

        // Ahead, but heading the same way as the origin.
        sensor.sense(&origin, &DynamicState::new(Vec2::new(0.0, 8.0), 0.0), &mut rng);
        assert_eq!(sensor.pending, NodeOutput::default());
    }

    #[test]
    fn reset_clears_pending_iff_frame_scoped() {
        let mut rng = rng();
        let mut sensor = LeafSensor::light(10.0, false);
        sensor.sense(&at(0.0, 0.0), &at(0.0, 5.0), &mut rng);
        assert!(sensor.pending.activation > 0.0);

        sensor.reset();
        assert_eq!(sensor.pending, NodeOutput::default());
        assert_eq!(sensor.closest_distance, RESET_DISTANCE);

        // A persistent sensor keeps its accumulation across frames.
        let mut sticky = LeafSensor::light(10.0, false);
        sticky.clear_each_frame = false;
        sticky.sense(&at(0.0, 0.0), &at(0.0, 5.0), &mut rng);
        sticky.closest_distance = 0.1;
        sticky.reset();
        assert!((sticky.pending.activation - 0.25).abs() < 1e-6);
        assert_eq!(sticky.closest_distance, RESET_DISTANCE);
    }
}

//! Agent Components
//!
//! Entity categories and per-vehicle motion limits.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use instinct_spatial::KindMask;

/// Category bit for light-emitting entities.
pub const LIGHT: KindMask = KindMask(1 << 0);

/// Category bit for mobile vehicles.
pub const VEHICLE: KindMask = KindMask(1 << 1);

/// Component: the categories this entity belongs to.
///
/// Sensors match against these bits to decide which entities they respond
/// to, and the proximity index filters queries with the same mask.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kind(pub KindMask);

/// Component: top speed of a vehicle, in world units per tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxSpeed(pub f32);

//! ECS Components
//!
//! Components for entity categories, physical state, and motion limits.

pub mod agent;
pub mod state;

pub use agent::{Kind, MaxSpeed, LIGHT, VEHICLE};
pub use state::DynamicState;

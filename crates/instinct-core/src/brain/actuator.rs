//! Actuators: terminal sinks read by the physical integrator.

use serde::{Deserialize, Serialize};

use super::sensor::NodeOutput;
use super::NodeId;

/// How the integrator interprets an actuator's two channels. The actuator
/// itself computes nothing either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Turns by the steering channel and advances by the activation channel.
    Motor,
    /// Turns only.
    Steering,
}

/// An actuator slot: mirrors its upstream node's output verbatim.
#[derive(Debug, Clone)]
pub struct Actuator {
    pub(crate) kind: ActuatorKind,
    pub(crate) input: NodeId,
    pub(crate) output: NodeOutput,
}

impl Actuator {
    pub(crate) fn new(kind: ActuatorKind, input: NodeId) -> Self {
        Self {
            kind,
            input,
            output: NodeOutput::default(),
        }
    }

    pub fn kind(&self) -> ActuatorKind {
        self.kind
    }

    /// The node this actuator mirrors.
    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn output(&self) -> NodeOutput {
        self.output
    }
}

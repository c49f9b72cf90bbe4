//! Composite nodes: pure transforms over upstream node outputs.
//!
//! Composites never sample world state. Each update they recompute their
//! output from whatever their upstream nodes currently show, so their place
//! in the brain's evaluation order decides whether they see this tick's
//! values or last tick's.

use serde::{Deserialize, Serialize};

use super::sensor::NodeOutput;
use super::NodeId;

/// Steepness of the sigmoid squash around its 0.5 midpoint.
const SIGMOID_GAIN: f32 = 10.0;

/// Control activation at or below which a Switch selects its low branch.
pub(crate) const SWITCH_THRESHOLD: f32 = 0.5;

/// Transform applied by a Function node, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    /// Pass the input through unchanged.
    Buffer,
    /// Negate the input activation.
    Invert,
    /// Squash the input activation through a soft threshold at 0.5.
    Sigmoid,
}

/// A function node: transforms the activation of its first input.
///
/// Inputs beyond index 0 are accepted by assembly but take no part in any
/// transform.
#[derive(Debug, Clone)]
pub struct Function {
    pub(crate) kind: FunctionKind,
    pub(crate) inputs: Vec<NodeId>,
    pub(crate) output: NodeOutput,
}

impl Function {
    pub(crate) fn new(kind: FunctionKind) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            output: NodeOutput::default(),
        }
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Apply the transform to the primary input. Steering passes through
    /// untouched; only the activation channel is shaped.
    pub(crate) fn transfer(&self, input: NodeOutput) -> NodeOutput {
        let activation = match self.kind {
            FunctionKind::Buffer => input.activation,
            FunctionKind::Invert => -input.activation,
            FunctionKind::Sigmoid => sigmoid(input.activation),
        };
        NodeOutput {
            activation,
            steering: input.steering,
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-SIGMOID_GAIN * (x - SWITCH_THRESHOLD)).exp())
}

/// Control and branch links of a Switch, fixed at assembly time.
#[derive(Debug, Clone, Copy)]
pub struct SwitchLinks {
    pub control: NodeId,
    pub branch_low: NodeId,
    pub branch_high: NodeId,
}

/// Selects between two upstream branches on the control's activation.
///
/// Control at or below 0.5 selects the low branch, above it the high
/// branch; the selected branch's output is mirrored verbatim. There is no
/// hysteresis: a control oscillating around the threshold flips the output
/// every tick.
#[derive(Debug, Clone)]
pub struct Switch {
    pub(crate) links: Option<SwitchLinks>,
    pub(crate) output: NodeOutput,
}

impl Switch {
    pub(crate) fn new() -> Self {
        Self {
            links: None,
            output: NodeOutput::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(activation: f32, steering: f32) -> NodeOutput {
        NodeOutput {
            activation,
            steering,
        }
    }

    #[test]
    fn buffer_passes_both_channels_through() {
        let func = Function::new(FunctionKind::Buffer);
        assert_eq!(func.transfer(output(0.7, 0.2)), output(0.7, 0.2));
    }

    #[test]
    fn invert_negates_activation_only() {
        let func = Function::new(FunctionKind::Invert);
        assert_eq!(func.transfer(output(0.7, 0.2)), output(-0.7, 0.2));
    }

    #[test]
    fn sigmoid_squashes_around_the_midpoint() {
        let func = Function::new(FunctionKind::Sigmoid);

        let mid = func.transfer(output(0.5, 0.0));
        assert!((mid.activation - 0.5).abs() < 1e-6);

        let low = func.transfer(output(0.0, 0.0));
        let high = func.transfer(output(1.0, 0.0));
        assert!(low.activation < 0.01);
        assert!(high.activation > 0.99);
        assert!(low.activation < mid.activation && mid.activation < high.activation);
    }

    #[test]
    fn transforms_are_stateless() {
        let func = Function::new(FunctionKind::Sigmoid);
        let input = output(0.37, -0.4);
        let first = func.transfer(input);
        for _ in 0..10 {
            assert_eq!(func.transfer(input), first);
        }
    }
}

//! The per-agent sensor/actuator graph ("brain") and its assembly.
//!
//! A brain exclusively owns an arena of nodes plus a list of actuators.
//! Cross-node references are `NodeId` indices into the arena: weak links,
//! scoped to the owning brain, never rebound after assembly. Evaluation
//! walks the arena in insertion order, so producers appended before their
//! consumers are seen fresh and producers appended after are seen one tick
//! stale. That ordering is the caller's contract, not a runtime fault.

pub mod actuator;
pub mod function;
pub mod sensor;

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use thiserror::Error;

use instinct_spatial::KindMask;

use crate::components::state::DynamicState;

pub use actuator::{Actuator, ActuatorKind};
pub use function::{Function, FunctionKind, Switch, SwitchLinks};
pub use sensor::{LeafKind, LeafSensor, NodeOutput, SensorWidth, STEERING_JITTER};

use function::SWITCH_THRESHOLD;

/// Handle to a node inside one brain's arena. Only meaningful for the brain
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to an actuator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActuatorId(usize);

/// Assembly-time misconfiguration, rejected before a brain is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrainError {
    #[error("function node {0:?} has no inputs")]
    FunctionWithoutInputs(NodeId),
    #[error("switch node {0:?} is missing its control or branch links")]
    SwitchNotWired(NodeId),
    #[error("node {0:?} does not accept function inputs")]
    NotAFunction(NodeId),
    #[error("node {0:?} is not a switch")]
    NotASwitch(NodeId),
}

/// Closed set of node variants, matched explicitly during the tick phases.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafSensor),
    Function(Function),
    Switch(Switch),
}

impl Node {
    fn output(&self) -> NodeOutput {
        match self {
            Node::Leaf(sensor) => sensor.output,
            Node::Function(function) => function.output,
            Node::Switch(switch) => switch.output,
        }
    }

    fn set_output(&mut self, output: NodeOutput) {
        match self {
            Node::Leaf(sensor) => sensor.output = output,
            Node::Function(function) => function.output = output,
            Node::Switch(switch) => switch.output = output,
        }
    }
}

/// The assembled graph of one agent.
#[derive(Component, Debug, Clone)]
pub struct Brain {
    nodes: Vec<Node>,
    actuators: Vec<Actuator>,
}

impl Brain {
    pub fn builder() -> BrainBuilder {
        BrainBuilder::new()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    /// Current output of any node.
    pub fn node_output(&self, node: NodeId) -> NodeOutput {
        self.nodes[node.0].output()
    }

    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    pub fn actuator_output(&self, actuator: ActuatorId) -> NodeOutput {
        self.actuators[actuator.0].output
    }

    /// Begin a frame: reset every leaf's sensing scratch.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            if let Node::Leaf(sensor) = node {
                sensor.reset();
            }
        }
    }

    /// Leaf sensors that participate in world pairing this frame, with
    /// their target-kind filters. Internal sensors are excluded.
    pub fn sensor_filters(&self) -> Vec<(NodeId, KindMask)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| match node {
                Node::Leaf(sensor) if !sensor.is_internal() => {
                    Some((NodeId(index), sensor.sensed_kind()))
                }
                _ => None,
            })
            .collect()
    }

    /// Evaluate one `(origin, sensee)` pair against one leaf sensor.
    /// A no-op on composite nodes, which never sample world state.
    pub fn sense(
        &mut self,
        node: NodeId,
        origin: &DynamicState,
        sensee: &DynamicState,
        rng: &mut SmallRng,
    ) {
        if let Node::Leaf(sensor) = &mut self.nodes[node.0] {
            sensor.sense(origin, sensee, rng);
        }
    }

    /// Walk the node list in assembly order, then mirror every actuator's
    /// upstream output. Nodes later in the list see values already written
    /// this walk; nodes earlier see last tick's.
    pub fn update(&mut self, dt: f32) {
        for index in 0..self.nodes.len() {
            let next = self.next_output(index, dt);
            self.nodes[index].set_output(next);
        }
        for actuator in &mut self.actuators {
            actuator.output = self.nodes[actuator.input.0].output();
        }
    }

    fn next_output(&self, index: usize, _dt: f32) -> NodeOutput {
        match &self.nodes[index] {
            Node::Leaf(sensor) => sensor.pending_output(),
            Node::Function(function) => {
                // Assembly guarantees at least one input.
                let Some(primary) = function.inputs.first() else {
                    return function.output;
                };
                function.transfer(self.nodes[primary.0].output())
            }
            Node::Switch(switch) => {
                // Assembly guarantees the links are wired.
                let Some(links) = switch.links else {
                    return switch.output;
                };
                let control = self.nodes[links.control.0].output().activation;
                let branch = if control <= SWITCH_THRESHOLD {
                    links.branch_low
                } else {
                    links.branch_high
                };
                self.nodes[branch.0].output()
            }
        }
    }
}

/// Builds and validates one brain.
///
/// Nodes are appended in the caller's chosen order, and that insertion
/// order is the evaluation order forever after. Appending a consumer
/// before its producer is legal and gives the consumer one-tick-stale
/// reads.
#[derive(Debug, Default)]
pub struct BrainBuilder {
    nodes: Vec<Node>,
    actuators: Vec<Actuator>,
}

impl BrainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve node and actuator slots up front.
    pub fn with_capacity(nodes: usize, actuators: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            actuators: Vec::with_capacity(actuators),
        }
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn push_light_sensor(&mut self, radius: f32, directional: bool) -> NodeId {
        self.push_node(Node::Leaf(LeafSensor::light(radius, directional)))
    }

    pub fn push_collision_sensor(&mut self, radius: f32) -> NodeId {
        self.push_node(Node::Leaf(LeafSensor::collision(radius)))
    }

    pub fn push_function(&mut self, kind: FunctionKind) -> NodeId {
        self.push_node(Node::Function(Function::new(kind)))
    }

    pub fn push_switch(&mut self) -> NodeId {
        self.push_node(Node::Switch(Switch::new()))
    }

    /// Wire `input` into a function node.
    pub fn connect(&mut self, function: NodeId, input: NodeId) -> Result<(), BrainError> {
        match &mut self.nodes[function.0] {
            Node::Function(node) => {
                node.inputs.push(input);
                Ok(())
            }
            _ => Err(BrainError::NotAFunction(function)),
        }
    }

    /// Wire a switch's control and both branches in one shot.
    pub fn set_switch_links(
        &mut self,
        switch: NodeId,
        control: NodeId,
        branch_low: NodeId,
        branch_high: NodeId,
    ) -> Result<(), BrainError> {
        match &mut self.nodes[switch.0] {
            Node::Switch(node) => {
                node.links = Some(SwitchLinks {
                    control,
                    branch_low,
                    branch_high,
                });
                Ok(())
            }
            _ => Err(BrainError::NotASwitch(switch)),
        }
    }

    /// Append an actuator mirroring `input`.
    pub fn push_actuator(&mut self, kind: ActuatorKind, input: NodeId) -> ActuatorId {
        self.actuators.push(Actuator::new(kind, input));
        ActuatorId(self.actuators.len() - 1)
    }

    /// Validate the wiring and seal the graph.
    pub fn build(self) -> Result<Brain, BrainError> {
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Function(function) if function.inputs.is_empty() => {
                    return Err(BrainError::FunctionWithoutInputs(NodeId(index)));
                }
                Node::Switch(switch) if switch.links.is_none() => {
                    return Err(BrainError::SwitchNotWired(NodeId(index)));
                }
                _ => {}
            }
        }
        Ok(Brain {
            nodes: self.nodes,
            actuators: self.actuators,
        })
    }
}

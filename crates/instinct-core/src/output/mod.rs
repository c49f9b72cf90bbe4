//! Telemetry output.
//!
//! Append-only JSONL rows sampled from the live world: one row per brained
//! agent per sample, carrying physical state and actuator outputs. This is
//! the read-only inspection surface; it never mutates the graph.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::brain::{ActuatorKind, Brain};
use crate::components::agent::Kind;
use crate::components::state::DynamicState;

/// One sampled agent.
#[derive(Debug, Serialize)]
pub struct TelemetryRow {
    pub tick: u64,
    pub entity: u64,
    pub kind: u32,
    pub position: [f32; 2],
    pub heading: f32,
    pub actuators: Vec<ActuatorSample>,
}

/// One actuator's output channels.
#[derive(Debug, Serialize)]
pub struct ActuatorSample {
    pub kind: ActuatorKind,
    pub activation: f32,
    pub steering: f32,
}

/// JSONL writer for telemetry rows.
pub struct TelemetryWriter {
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl TelemetryWriter {
    /// Create a writer truncating any previous file at `path`.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            rows: 0,
        })
    }

    /// A writer that discards rows (telemetry off, tests).
    pub fn null() -> Self {
        Self {
            writer: None,
            rows: 0,
        }
    }

    /// Rows logged so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Append one row.
    pub fn log(&mut self, row: &TelemetryRow) -> io::Result<()> {
        self.rows += 1;
        if let Some(writer) = self.writer.as_mut() {
            let json = serde_json::to_string(row)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Sample every brained agent in the world.
pub fn sample_world(world: &mut World, tick: u64) -> Vec<TelemetryRow> {
    let mut query = world.query::<(Entity, &Kind, &DynamicState, &Brain)>();
    query
        .iter(world)
        .map(|(entity, kind, state, brain)| TelemetryRow {
            tick,
            entity: entity.to_bits(),
            kind: kind.0.bits(),
            position: [state.position.x, state.position.y],
            heading: state.heading,
            actuators: brain
                .actuators()
                .iter()
                .map(|actuator| ActuatorSample {
                    kind: actuator.kind(),
                    activation: actuator.output().activation,
                    steering: actuator.output().steering,
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_writer_counts_but_discards() {
        let mut writer = TelemetryWriter::null();
        let row = TelemetryRow {
            tick: 3,
            entity: 1,
            kind: 2,
            position: [10.0, 20.0],
            heading: 0.5,
            actuators: vec![ActuatorSample {
                kind: ActuatorKind::Motor,
                activation: 0.25,
                steering: 0.0,
            }],
        };
        writer.log(&row).unwrap();
        writer.log(&row).unwrap();
        assert_eq!(writer.rows(), 2);
        writer.flush().unwrap();
    }

    #[test]
    fn rows_serialize_with_actuator_kind_tags() {
        let row = TelemetryRow {
            tick: 0,
            entity: 7,
            kind: 2,
            position: [0.0, 0.0],
            heading: 0.0,
            actuators: vec![ActuatorSample {
                kind: ActuatorKind::Steering,
                activation: 0.0,
                steering: -0.4,
            }],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"steering\""));
        assert!(json.contains("\"tick\":0"));
    }
}

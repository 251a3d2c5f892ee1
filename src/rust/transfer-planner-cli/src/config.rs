// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Transfer files.
//!
//! A transfer file lists the steps of a protocol in execution order:
//!
//! ```json
//! {
//!     "capacity": 300.0,
//!     "steps": [
//!         {"distribute": {"per_destination_volume": 20.0, "source": {...}, "destinations": [...]}},
//!         {"consolidate": {"per_source_volume": 60.0, "sources": [...], "destination": {...},
//!                          "options": {"aspirate_rate": 0.5, "tip_policy": "single_tip"}}}
//!     ]
//! }
//! ```
//!
//! The top-level `capacity` applies to every step that does not set its own.
//! Unknown keys anywhere in a step are rejected.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use pipetting_units::Microliters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use transfer_planner::{ConsolidateRequest, DistributeRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Distribute(DistributeRequest),
    Consolidate(ConsolidateRequest),
}

impl Step {
    pub fn capacity(&self) -> Microliters {
        match self {
            Step::Distribute(request) => request.capacity,
            Step::Consolidate(request) => request.capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferFile {
    pub steps: Vec<Step>,
}

impl TransferFile {
    /// Largest capacity any step asks for.
    pub fn max_capacity(&self) -> Option<Microliters> {
        self.steps
            .iter()
            .map(Step::capacity)
            .reduce(|a, b| if b > a { b } else { a })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTransferFile {
    #[serde(default)]
    capacity: Option<Microliters>,
    steps: Vec<Value>,
}

pub fn load(path: &Path) -> Result<TransferFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transfer file '{}'", path.display()))?;
    parse(&text).with_context(|| format!("Invalid transfer file '{}'", path.display()))
}

pub fn parse(text: &str) -> Result<TransferFile> {
    let RawTransferFile { capacity, steps } = serde_json::from_str(text)?;
    let steps = steps
        .into_iter()
        .enumerate()
        .map(|(index, mut value)| {
            if let Some(capacity) = capacity {
                apply_default_capacity(&mut value, capacity)
                    .with_context(|| format!("Step {}", index + 1))?;
            }
            serde_json::from_value(value).with_context(|| format!("Step {}", index + 1))
        })
        .collect::<Result<_>>()?;
    Ok(TransferFile { steps })
}

fn apply_default_capacity(step: &mut Value, capacity: Microliters) -> Result<()> {
    let Some(body) = step
        .as_object_mut()
        .and_then(|tagged| tagged.values_mut().next())
        .and_then(Value::as_object_mut)
    else {
        bail!("Expected an object like {{\"distribute\": {{...}}}}");
    };
    body.entry("capacity")
        .or_insert_with(|| Value::from(capacity.value()));
    Ok(())
}

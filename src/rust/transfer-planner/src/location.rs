// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use pipetting_units::{Length, Millimeter};
use serde::{Deserialize, Serialize};

/// Where within a well an operation takes place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellOffset {
    /// Height above the well bottom.
    Bottom(Length<Millimeter>),
}

/// An addressable point on a labware item.
///
/// The planner never looks inside a location, it only hands it to the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub labware: String,
    pub well: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<WellOffset>,
}

impl Location {
    pub fn new(labware: impl Into<String>, well: impl Into<String>) -> Self {
        Self {
            labware: labware.into(),
            well: well.into(),
            offset: None,
        }
    }

    /// The same well, addressed at `z` above its bottom.
    pub fn bottom(&self, z: Length<Millimeter>) -> Self {
        Self {
            labware: self.labware.clone(),
            well: self.well.clone(),
            offset: Some(WellOffset::Bottom(z)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.labware, self.well)?;
        match self.offset {
            Some(WellOffset::Bottom(z)) => write!(f, "@bottom+{z}"),
            None => Ok(()),
        }
    }
}

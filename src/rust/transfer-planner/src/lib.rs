// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Capacity-aware distribution and consolidation of liquid.
//!
//! A transfer moves the same volume between one well and many. The planner
//! splits the many wells into as few tip loads as the pipette capacity allows,
//! spreads them evenly over those loads, and drives a [`PipettingDevice`]
//! through one tip lifecycle per load.
//!
//! ```rust
//! use pipetting_units::microliters;
//! use transfer_planner::simulation::SimulatedDevice;
//! use transfer_planner::{DistributeRequestBuilder, Location, distribute};
//!
//! let destinations = (1..=7)
//!     .map(|col| Location::new("plate", format!("A{col}")))
//!     .collect();
//! let request = DistributeRequestBuilder::new(
//!     microliters(5.0),
//!     Location::new("reservoir", "A1"),
//!     destinations,
//!     microliters(20.0),
//! )
//! .residual_volume(microliters(5.0))
//! .build();
//!
//! let mut device = SimulatedDevice::new(microliters(20.0));
//! let summary = distribute(&request, &mut device)?;
//! assert_eq!(summary.chunks, 3);
//! # Ok::<(), transfer_planner::error::Error>(())
//! ```

pub mod chunking;
pub mod consolidate;
pub mod device;
pub mod distribute;
pub mod error;
pub mod location;
pub mod plan;
pub mod request;
pub mod simulation;

mod tips;

pub use crate::chunking::ChunkPlan;
pub use crate::consolidate::{consolidate, plan_consolidation};
pub use crate::device::{DeviceError, PipettingDevice};
pub use crate::error::{Error, Result};
pub use crate::distribute::{distribute, plan_distribution};
pub use crate::location::Location;
pub use crate::plan::{PlannedChunk, TransferPlan, TransferSummary};
pub use crate::request::{
    ConsolidateRequest, ConsolidateRequestBuilder, DistributeRequest, DistributeRequestBuilder,
    ResidualDisposal, ResidualMode, TipPolicy, TouchTip, TransferOptions,
};

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use pipetting_units::Microliters;

use crate::device::DeviceError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid transfer configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A fault reported by the device. Chunks completed before the fault
    /// have been physically enacted.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// A request whose parameters admit no valid tip load.
///
/// Always detected before the first device call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error(
        "capacity {capacity} must exceed residual {residual} plus one transfer of {per_transfer}"
    )]
    CapacityTooSmall {
        capacity: Microliters,
        residual: Microliters,
        per_transfer: Microliters,
    },

    #[error("capacity {capacity} cannot hold a single transfer of {per_transfer}")]
    CapacityBelowTransfer {
        capacity: Microliters,
        per_transfer: Microliters,
    },
}

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! The contract between the planner and the liquid handler executing it.

use pipetting_units::{Duration, Length, Microliters, Millimeter, Second};

use crate::location::Location;

#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("no tip available in the configured tip racks")]
    NoTipAvailable,

    #[error("no tip attached")]
    TipNotAttached,

    #[error("a tip is already attached")]
    TipAlreadyAttached,

    #[error("cannot hold {requested}, the pipette takes at most {capacity}")]
    VolumeExceedsCapacity {
        requested: Microliters,
        capacity: Microliters,
    },

    #[error("cannot dispense {requested}, the tip holds {available}")]
    InsufficientVolume {
        requested: Microliters,
        available: Microliters,
    },

    #[error("invalid location '{0}'")]
    InvalidLocation(Location),

    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

pub type DeviceResult<T = ()> = std::result::Result<T, DeviceError>;

/// A single-arm liquid handler with one pipette mounted.
///
/// Every call blocks until the motion has completed. Implementations report
/// physical faults as [`DeviceError`]; callers do not retry.
pub trait PipettingDevice {
    fn pick_up_tip(&mut self) -> DeviceResult;

    fn drop_tip(&mut self) -> DeviceResult;

    fn aspirate(&mut self, volume: Microliters, location: &Location, rate: f64) -> DeviceResult;

    fn dispense(&mut self, volume: Microliters, location: &Location, rate: f64) -> DeviceResult;

    /// Aspirate and dispense `volume` at `location`, `repetitions` times.
    fn mix(
        &mut self,
        repetitions: u32,
        volume: Microliters,
        location: &Location,
        rate: f64,
    ) -> DeviceResult;

    /// Touch the tip against the walls of the well it is in.
    ///
    /// `radius` is a fraction of the well radius, `vertical_offset` is
    /// measured from the top of the well.
    fn touch_tip(&mut self, radius: f64, vertical_offset: Length<Millimeter>) -> DeviceResult;

    /// Expel whatever the tip still holds, plus air, at `location`.
    fn blow_out(&mut self, location: &Location) -> DeviceResult;

    fn delay(&mut self, duration: Duration<Second>) -> DeviceResult;

    /// Halt until an operator acknowledges `message`.
    fn pause(&mut self, message: &str) -> DeviceResult {
        let _ = message;
        Ok(())
    }

    /// Annotate the run log.
    fn comment(&mut self, message: &str) -> DeviceResult {
        let _ = message;
        Ok(())
    }
}

impl<D: PipettingDevice + ?Sized> PipettingDevice for &mut D {
    fn pick_up_tip(&mut self) -> DeviceResult {
        (**self).pick_up_tip()
    }

    fn drop_tip(&mut self) -> DeviceResult {
        (**self).drop_tip()
    }

    fn aspirate(&mut self, volume: Microliters, location: &Location, rate: f64) -> DeviceResult {
        (**self).aspirate(volume, location, rate)
    }

    fn dispense(&mut self, volume: Microliters, location: &Location, rate: f64) -> DeviceResult {
        (**self).dispense(volume, location, rate)
    }

    fn mix(
        &mut self,
        repetitions: u32,
        volume: Microliters,
        location: &Location,
        rate: f64,
    ) -> DeviceResult {
        (**self).mix(repetitions, volume, location, rate)
    }

    fn touch_tip(&mut self, radius: f64, vertical_offset: Length<Millimeter>) -> DeviceResult {
        (**self).touch_tip(radius, vertical_offset)
    }

    fn blow_out(&mut self, location: &Location) -> DeviceResult {
        (**self).blow_out(location)
    }

    fn delay(&mut self, duration: Duration<Second>) -> DeviceResult {
        (**self).delay(duration)
    }

    fn pause(&mut self, message: &str) -> DeviceResult {
        (**self).pause(message)
    }

    fn comment(&mut self, message: &str) -> DeviceResult {
        (**self).comment(message)
    }
}

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! A liquid handler that exists only in memory.
//!
//! [`SimulatedDevice`] enforces the same tip and volume rules a real pipette
//! does and records every command it accepts, which makes it suitable both as
//! a test double and as a dry-run backend.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;
use pipetting_log::debug;
use pipetting_units::{Duration, Length, Microliters, Millimeter, Second, microliters, seconds};

use crate::chunking::VOLUME_TOLERANCE;
use crate::device::{DeviceError, DeviceResult, PipettingDevice};
use crate::location::Location;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PickUpTip,
    DropTip,
    Aspirate {
        volume: Microliters,
        location: Location,
        rate: f64,
    },
    Dispense {
        volume: Microliters,
        location: Location,
        rate: f64,
    },
    Mix {
        repetitions: u32,
        volume: Microliters,
        location: Location,
        rate: f64,
    },
    TouchTip {
        radius: f64,
        vertical_offset: Length<Millimeter>,
    },
    BlowOut {
        location: Location,
    },
    Delay(Duration<Second>),
    Pause(String),
    Comment(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PickUpTip => write!(f, "pick up tip"),
            Command::DropTip => write!(f, "drop tip"),
            Command::Aspirate {
                volume,
                location,
                rate,
            } => write!(f, "aspirate {volume} from {location} at rate {rate}"),
            Command::Dispense {
                volume,
                location,
                rate,
            } => write!(f, "dispense {volume} into {location} at rate {rate}"),
            Command::Mix {
                repetitions,
                volume,
                location,
                rate,
            } => write!(
                f,
                "mix {repetitions}x {volume} in {location} at rate {rate}"
            ),
            Command::TouchTip {
                radius,
                vertical_offset,
            } => write!(f, "touch tip (radius {radius}, offset {vertical_offset})"),
            Command::BlowOut { location } => write!(f, "blow out into {location}"),
            Command::Delay(duration) => write!(f, "delay {duration}"),
            Command::Pause(message) => write!(f, "pause: {message}"),
            Command::Comment(message) => write!(f, "comment: {message}"),
        }
    }
}

/// In-memory pipette with one tip rack.
pub struct SimulatedDevice {
    max_volume: Microliters,
    tips_remaining: Option<usize>,
    tip_attached: bool,
    tip_content: Microliters,
    commands: Vec<Command>,
    /// Net volume per well, keyed by `labware/well`; negative where liquid was removed.
    well_balance: BTreeMap<String, Microliters>,
    elapsed: Duration<Second>,
    issued: usize,
    fail_on: Option<usize>,
}

impl SimulatedDevice {
    /// A pipette holding at most `max_volume`, with an unlimited tip supply.
    pub fn new(max_volume: Microliters) -> Self {
        Self {
            max_volume,
            tips_remaining: None,
            tip_attached: false,
            tip_content: microliters(0.0),
            commands: Vec::new(),
            well_balance: BTreeMap::new(),
            elapsed: seconds(0.0),
            issued: 0,
            fail_on: None,
        }
    }

    /// Limit the tip supply to `count` tips.
    pub fn with_tips(mut self, count: usize) -> Self {
        self.tips_remaining = Some(count);
        self
    }

    /// Fail the command with the given 0-based index with a hardware fault.
    pub fn fail_on(mut self, command_index: usize) -> Self {
        self.fail_on = Some(command_index);
        self
    }

    /// Pretend the operator already mounted a tip.
    pub fn with_tip_attached(mut self) -> Self {
        self.tip_attached = true;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn tip_attached(&self) -> bool {
        self.tip_attached
    }

    pub fn tip_content(&self) -> Microliters {
        self.tip_content
    }

    pub fn tips_remaining(&self) -> Option<usize> {
        self.tips_remaining
    }

    /// Total time spent in delays.
    pub fn elapsed(&self) -> Duration<Second> {
        self.elapsed
    }

    /// Net volume change of the well at `location`, ignoring any offset.
    pub fn net_volume(&self, location: &Location) -> Microliters {
        self.well_balance
            .get(&well_key(location))
            .copied()
            .unwrap_or_default()
    }

    /// Net volume change of every touched well, keyed by `labware/well`.
    pub fn well_balance(&self) -> &BTreeMap<String, Microliters> {
        &self.well_balance
    }

    fn check_fault(&mut self) -> DeviceResult {
        let index = self.issued;
        self.issued += 1;
        if self.fail_on == Some(index) {
            return Err(DeviceError::Fault(anyhow!(
                "simulated hardware fault at command {index}"
            )));
        }
        Ok(())
    }

    fn require_tip(&self) -> DeviceResult {
        if self.tip_attached {
            Ok(())
        } else {
            Err(DeviceError::TipNotAttached)
        }
    }

    fn check_location(location: &Location) -> DeviceResult {
        if location.labware.trim().is_empty() || location.well.trim().is_empty() {
            return Err(DeviceError::InvalidLocation(location.clone()));
        }
        Ok(())
    }

    fn check_fits(&self, volume: Microliters) -> DeviceResult {
        let requested = self.tip_content + volume;
        if requested.value() > self.max_volume.value() + VOLUME_TOLERANCE {
            return Err(DeviceError::VolumeExceedsCapacity {
                requested,
                capacity: self.max_volume,
            });
        }
        Ok(())
    }

    fn book(&mut self, location: &Location, delta: Microliters) {
        *self.well_balance.entry(well_key(location)).or_default() += delta;
    }

    fn record(&mut self, command: Command) {
        debug!("{}", command);
        self.commands.push(command);
    }
}

fn well_key(location: &Location) -> String {
    format!("{}/{}", location.labware, location.well)
}

impl PipettingDevice for SimulatedDevice {
    fn pick_up_tip(&mut self) -> DeviceResult {
        self.check_fault()?;
        if self.tip_attached {
            return Err(DeviceError::TipAlreadyAttached);
        }
        if let Some(remaining) = self.tips_remaining.as_mut() {
            if *remaining == 0 {
                return Err(DeviceError::NoTipAvailable);
            }
            *remaining -= 1;
        }
        self.tip_attached = true;
        self.tip_content = microliters(0.0);
        self.record(Command::PickUpTip);
        Ok(())
    }

    fn drop_tip(&mut self) -> DeviceResult {
        self.check_fault()?;
        self.require_tip()?;
        self.tip_attached = false;
        self.tip_content = microliters(0.0);
        self.record(Command::DropTip);
        Ok(())
    }

    fn aspirate(&mut self, volume: Microliters, location: &Location, rate: f64) -> DeviceResult {
        self.check_fault()?;
        self.require_tip()?;
        Self::check_location(location)?;
        self.check_fits(volume)?;
        self.tip_content += volume;
        self.book(location, -volume);
        self.record(Command::Aspirate {
            volume,
            location: location.clone(),
            rate,
        });
        Ok(())
    }

    fn dispense(&mut self, volume: Microliters, location: &Location, rate: f64) -> DeviceResult {
        self.check_fault()?;
        self.require_tip()?;
        Self::check_location(location)?;
        if volume.value() > self.tip_content.value() + VOLUME_TOLERANCE {
            return Err(DeviceError::InsufficientVolume {
                requested: volume,
                available: self.tip_content,
            });
        }
        self.tip_content = microliters((self.tip_content - volume).value().max(0.0));
        self.book(location, volume);
        self.record(Command::Dispense {
            volume,
            location: location.clone(),
            rate,
        });
        Ok(())
    }

    fn mix(
        &mut self,
        repetitions: u32,
        volume: Microliters,
        location: &Location,
        rate: f64,
    ) -> DeviceResult {
        self.check_fault()?;
        self.require_tip()?;
        Self::check_location(location)?;
        self.check_fits(volume)?;
        self.record(Command::Mix {
            repetitions,
            volume,
            location: location.clone(),
            rate,
        });
        Ok(())
    }

    fn touch_tip(&mut self, radius: f64, vertical_offset: Length<Millimeter>) -> DeviceResult {
        self.check_fault()?;
        self.require_tip()?;
        self.record(Command::TouchTip {
            radius,
            vertical_offset,
        });
        Ok(())
    }

    fn blow_out(&mut self, location: &Location) -> DeviceResult {
        self.check_fault()?;
        self.require_tip()?;
        Self::check_location(location)?;
        let content = self.tip_content;
        self.tip_content = microliters(0.0);
        self.book(location, content);
        self.record(Command::BlowOut {
            location: location.clone(),
        });
        Ok(())
    }

    fn delay(&mut self, duration: Duration<Second>) -> DeviceResult {
        self.check_fault()?;
        self.elapsed += duration;
        self.record(Command::Delay(duration));
        Ok(())
    }

    fn pause(&mut self, message: &str) -> DeviceResult {
        self.check_fault()?;
        self.record(Command::Pause(message.to_string()));
        Ok(())
    }

    fn comment(&mut self, message: &str) -> DeviceResult {
        self.check_fault()?;
        self.record(Command::Comment(message.to_string()));
        Ok(())
    }
}

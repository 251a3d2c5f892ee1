// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::num::NonZeroUsize;

use pipetting_units::{Duration, Length, Microliters, Millimeter, Second, microliters, seconds};
use serde::{Deserialize, Serialize};

use crate::chunking::{
    check_finite, check_non_negative, check_positive, consolidation_limit, distribution_limit,
};
use crate::error::ConfigurationError;
use crate::location::Location;

/// Who picks up and drops tips around the chunks of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipPolicy {
    /// Fresh tip for every chunk.
    #[default]
    NewTipPerChunk,
    /// One tip, picked up before the first chunk and dropped after the last.
    SingleTip,
    /// The caller already holds a tip and disposes of it afterwards.
    CallerManaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TouchTip {
    /// Fraction of the well radius.
    pub radius: f64,
    /// Measured from the top of the well, usually negative.
    pub vertical_offset: Length<Millimeter>,
}

/// Flow rate multiplier of the pipette's own settings.
pub const DEFAULT_RATE: f64 = 1.0;

/// Parameters shared by distribution and consolidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferOptions {
    pub aspirate_rate: f64,
    pub dispense_rate: f64,
    pub aspirate_delay: Duration<Second>,
    pub dispense_delay: Duration<Second>,
    pub touch_tip: Option<TouchTip>,
    pub tip_policy: TipPolicy,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            aspirate_rate: DEFAULT_RATE,
            dispense_rate: DEFAULT_RATE,
            aspirate_delay: seconds(0.0),
            dispense_delay: seconds(0.0),
            touch_tip: None,
            tip_policy: TipPolicy::default(),
        }
    }
}

impl TransferOptions {
    pub fn aspirate_rate(mut self, rate: f64) -> Self {
        self.aspirate_rate = rate;
        self
    }

    pub fn dispense_rate(mut self, rate: f64) -> Self {
        self.dispense_rate = rate;
        self
    }

    pub fn aspirate_delay(mut self, delay: Duration<Second>) -> Self {
        self.aspirate_delay = delay;
        self
    }

    pub fn dispense_delay(mut self, delay: Duration<Second>) -> Self {
        self.dispense_delay = delay;
        self
    }

    pub fn touch_tip(mut self, radius: f64, vertical_offset: Length<Millimeter>) -> Self {
        self.touch_tip = Some(TouchTip {
            radius,
            vertical_offset,
        });
        self
    }

    pub fn tip_policy(mut self, policy: TipPolicy) -> Self {
        self.tip_policy = policy;
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("aspirate rate", self.aspirate_rate)?;
        check_positive("dispense rate", self.dispense_rate)?;
        check_non_negative("aspirate delay", self.aspirate_delay.value())?;
        check_non_negative("dispense delay", self.dispense_delay.value())?;
        if let Some(touch_tip) = &self.touch_tip {
            check_positive("touch tip radius", touch_tip.radius)?;
            check_finite("touch tip vertical offset", touch_tip.vertical_offset.value())?;
        }
        Ok(())
    }
}

/// How the liquid kept in the tip after the last dispense of a chunk is disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualMode {
    /// Dispense exactly the residual volume.
    #[default]
    Dispense,
    /// Blow out, which also clears droplets that a dispense leaves behind.
    BlowOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidualDisposal {
    pub location: Location,
    /// Height above the well bottom.
    pub depth: Length<Millimeter>,
    #[serde(default)]
    pub mode: ResidualMode,
}

impl ResidualDisposal {
    pub fn new(location: Location, depth: Length<Millimeter>) -> Self {
        Self {
            location,
            depth,
            mode: ResidualMode::Dispense,
        }
    }

    pub fn blow_out(mut self) -> Self {
        self.mode = ResidualMode::BlowOut;
        self
    }

    pub fn target(&self) -> Location {
        self.location.bottom(self.depth)
    }
}

/// Deliver the same volume from one source to each of several destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributeRequest {
    pub per_destination_volume: Microliters,
    pub source: Location,
    /// Served in this order.
    pub destinations: Vec<Location>,
    /// Largest volume one tip load can hold.
    pub capacity: Microliters,
    /// Aspirated on top of every chunk and never delivered.
    #[serde(default)]
    pub residual_volume: Microliters,
    /// Mix repetitions at the source before every aspirate.
    #[serde(default)]
    pub mix_count: Option<u32>,
    /// Condition every tip with one full-capacity cycle at the source.
    #[serde(default)]
    pub pre_wet: bool,
    #[serde(default)]
    pub residual_disposal: Option<ResidualDisposal>,
    #[serde(default)]
    pub options: TransferOptions,
}

impl DistributeRequest {
    /// Validates the request and returns the number of destinations per tip load.
    pub fn chunk_limit(&self) -> Result<NonZeroUsize, ConfigurationError> {
        let limit = distribution_limit(
            self.capacity,
            self.residual_volume,
            self.per_destination_volume,
        )?;
        if self.mix_count == Some(0) {
            return Err(ConfigurationError::NotPositive {
                name: "mix count",
                value: 0.0,
            });
        }
        if let Some(disposal) = &self.residual_disposal {
            check_non_negative("residual disposal depth", disposal.depth.value())?;
        }
        self.options.validate()?;
        Ok(limit)
    }
}

pub struct DistributeRequestBuilder {
    request: DistributeRequest,
}

impl DistributeRequestBuilder {
    pub fn new(
        per_destination_volume: Microliters,
        source: Location,
        destinations: Vec<Location>,
        capacity: Microliters,
    ) -> Self {
        Self {
            request: DistributeRequest {
                per_destination_volume,
                source,
                destinations,
                capacity,
                residual_volume: microliters(0.0),
                mix_count: None,
                pre_wet: false,
                residual_disposal: None,
                options: TransferOptions::default(),
            },
        }
    }

    pub fn residual_volume(mut self, volume: Microliters) -> Self {
        self.request.residual_volume = volume;
        self
    }

    pub fn mix(mut self, repetitions: u32) -> Self {
        self.request.mix_count = Some(repetitions);
        self
    }

    pub fn pre_wet(mut self) -> Self {
        self.request.pre_wet = true;
        self
    }

    pub fn residual_disposal(mut self, disposal: ResidualDisposal) -> Self {
        self.request.residual_disposal = Some(disposal);
        self
    }

    pub fn options(mut self, options: TransferOptions) -> Self {
        self.request.options = options;
        self
    }

    pub fn build(self) -> DistributeRequest {
        self.request
    }
}

/// Pool the same volume from each of several sources into one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidateRequest {
    pub per_source_volume: Microliters,
    /// Visited in this order.
    pub sources: Vec<Location>,
    pub destination: Location,
    pub capacity: Microliters,
    #[serde(default)]
    pub options: TransferOptions,
}

impl ConsolidateRequest {
    /// Validates the request and returns the number of sources per tip load.
    pub fn chunk_limit(&self) -> Result<NonZeroUsize, ConfigurationError> {
        let limit = consolidation_limit(self.capacity, self.per_source_volume)?;
        self.options.validate()?;
        Ok(limit)
    }
}

pub struct ConsolidateRequestBuilder {
    request: ConsolidateRequest,
}

impl ConsolidateRequestBuilder {
    pub fn new(
        per_source_volume: Microliters,
        sources: Vec<Location>,
        destination: Location,
        capacity: Microliters,
    ) -> Self {
        Self {
            request: ConsolidateRequest {
                per_source_volume,
                sources,
                destination,
                capacity,
                options: TransferOptions::default(),
            },
        }
    }

    pub fn options(mut self, options: TransferOptions) -> Self {
        self.request.options = options;
        self
    }

    pub fn build(self) -> ConsolidateRequest {
        self.request
    }
}

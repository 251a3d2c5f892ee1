// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::num::NonZeroUsize;

use pipetting_units::Microliters;

use crate::location::Location;

/// One tip load.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChunk<'a> {
    /// Destinations (distribute) or sources (consolidate) served by this load, in order.
    pub locations: &'a [Location],
    /// Aspirated from the source (distribute) or dispensed into the destination
    /// (consolidate) in one go.
    pub volume: Microliters,
}

/// Tip loads of one transfer, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPlan<'a> {
    pub max_per_chunk: NonZeroUsize,
    pub chunks: Vec<PlannedChunk<'a>>,
}

impl TransferPlan<'_> {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.iter().map(|c| c.locations.len()).collect()
    }

    /// Sum of the per-chunk volumes.
    pub fn total_volume(&self) -> Microliters {
        self.chunks.iter().map(|c| c.volume).sum()
    }
}

impl fmt::Display for TransferPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} chunk(s), at most {} per tip load",
            self.len(),
            self.max_per_chunk
        )?;
        for (index, chunk) in self.chunks.iter().enumerate() {
            let wells: Vec<String> = chunk.locations.iter().map(|l| l.to_string()).collect();
            writeln!(f, "  #{index}: {} -> [{}]", chunk.volume, wells.join(", "))?;
        }
        Ok(())
    }
}

/// What a completed transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransferSummary {
    pub chunks: usize,
    pub tips_used: usize,
    /// Net volume taken from the source(s), residuals included.
    pub aspirated: Microliters,
    /// Volume delivered to the destination(s).
    pub delivered: Microliters,
}

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::num::NonZeroUsize;

use pipetting_log::diagnostic;
use pipetting_units::{Microliters, microliters};

use crate::error::ConfigurationError;

/// Volumes in µL closer than this are considered equal.
pub(crate) const VOLUME_TOLERANCE: f64 = 1e-9;

/// Split of an ordered list of transfers over consecutive tip loads.
///
/// The number of chunks is the smallest that respects the per-load limit;
/// the items are then spread evenly, so chunk sizes differ by at most one and
/// the larger chunks come first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    max_per_chunk: NonZeroUsize,
    sizes: Vec<usize>,
}

impl ChunkPlan {
    pub fn new(len: usize, max_per_chunk: NonZeroUsize) -> Self {
        let count = len.div_ceil(max_per_chunk.get());
        Self {
            max_per_chunk,
            sizes: near_equal_sizes(len, count),
        }
    }

    pub fn max_per_chunk(&self) -> NonZeroUsize {
        self.max_per_chunk
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Total number of items covered by the plan.
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// Cut `items` into the planned contiguous chunks, preserving order.
    ///
    /// # Panics
    ///
    /// If `items` does not have the length the plan was made for.
    pub fn split<'a, T>(&self, items: &'a [T]) -> Vec<&'a [T]> {
        assert_eq!(
            items.len(),
            self.total(),
            "chunk plan made for a different number of items"
        );
        let mut rest = items;
        self.sizes
            .iter()
            .map(|&size| {
                let (chunk, tail) = rest.split_at(size);
                rest = tail;
                chunk
            })
            .collect()
    }
}

/// `count` sizes summing to `len`, differing by at most one, larger first.
fn near_equal_sizes(len: usize, count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let base = len / count;
    let extra = len % count;
    (0..count).map(|i| base + usize::from(i < extra)).collect()
}

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NotFinite { name, value })
    }
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    check_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NotPositive { name, value })
    }
}

pub(crate) fn check_non_negative(
    name: &'static str,
    value: f64,
) -> Result<(), ConfigurationError> {
    check_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::Negative { name, value })
    }
}

/// Largest `n` with `n * per_transfer + residual <= capacity`, at least one.
///
/// The floored ratio can come out one short when the division rounds down,
/// e.g. `0.3 / 0.1`; the next count is taken if its volume still fits.
fn whole_transfers(
    capacity: Microliters,
    residual: Microliters,
    per_transfer: Microliters,
) -> NonZeroUsize {
    let fits = |count: usize| {
        (per_transfer * count as f64 + residual).value() <= capacity.value() + VOLUME_TOLERANCE
    };
    let mut count = (capacity - residual).ratio(per_transfer).floor() as usize;
    if fits(count + 1) {
        count += 1;
    }
    NonZeroUsize::new(count).unwrap_or(NonZeroUsize::MIN)
}

/// Destinations one tip load can serve when `residual` stays in the tip.
///
/// Requires `capacity > residual + per_destination`.
pub fn distribution_limit(
    capacity: Microliters,
    residual: Microliters,
    per_destination: Microliters,
) -> Result<NonZeroUsize, ConfigurationError> {
    check_positive("per-destination volume", per_destination.value())?;
    check_positive("capacity", capacity.value())?;
    check_non_negative("residual volume", residual.value())?;
    if capacity <= residual + per_destination {
        return Err(ConfigurationError::CapacityTooSmall {
            capacity,
            residual,
            per_transfer: per_destination,
        });
    }
    let limit = whole_transfers(capacity, residual, per_destination);
    diagnostic!(
        "{} per load: ({} - {}) / {}",
        limit,
        capacity,
        residual,
        per_destination
    );
    Ok(limit)
}

/// Sources one tip load can pool.
///
/// Requires `capacity >= per_source`.
pub fn consolidation_limit(
    capacity: Microliters,
    per_source: Microliters,
) -> Result<NonZeroUsize, ConfigurationError> {
    check_positive("per-source volume", per_source.value())?;
    check_positive("capacity", capacity.value())?;
    if capacity < per_source {
        return Err(ConfigurationError::CapacityBelowTransfer {
            capacity,
            per_transfer: per_source,
        });
    }
    let limit = whole_transfers(capacity, microliters(0.0), per_source);
    diagnostic!("{} per load: {} / {}", limit, capacity, per_source);
    Ok(limit)
}

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::device::{DeviceResult, PipettingDevice};
use crate::request::TipPolicy;

/// Tip pick-up and drop around the chunks of one transfer.
pub(crate) struct TipLifecycle {
    policy: TipPolicy,
    chunk_count: usize,
    picked_up: usize,
}

impl TipLifecycle {
    pub(crate) fn new(policy: TipPolicy, chunk_count: usize) -> Self {
        Self {
            policy,
            chunk_count,
            picked_up: 0,
        }
    }

    pub(crate) fn acquire<D: PipettingDevice + ?Sized>(
        &mut self,
        device: &mut D,
        chunk_index: usize,
    ) -> DeviceResult {
        let pick_up = match self.policy {
            TipPolicy::NewTipPerChunk => true,
            TipPolicy::SingleTip => chunk_index == 0,
            TipPolicy::CallerManaged => false,
        };
        if pick_up {
            device.pick_up_tip()?;
            self.picked_up += 1;
        }
        Ok(())
    }

    pub(crate) fn release<D: PipettingDevice + ?Sized>(
        &self,
        device: &mut D,
        chunk_index: usize,
    ) -> DeviceResult {
        let drop = match self.policy {
            TipPolicy::NewTipPerChunk => true,
            TipPolicy::SingleTip => chunk_index + 1 == self.chunk_count,
            TipPolicy::CallerManaged => false,
        };
        if drop {
            device.drop_tip()?;
        }
        Ok(())
    }

    /// Tips picked up so far.
    pub(crate) fn picked_up(&self) -> usize {
        self.picked_up
    }
}

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::unit::quantity;

quantity!(Volume);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Microliter;

impl fmt::Display for Microliter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "µL")
    }
}

/// A volume of liquid in microliters.
pub type Microliters<T = f64> = Volume<Microliter, T>;

pub const fn microliters<T>(value: T) -> Volume<Microliter, T> {
    Volume {
        value,
        unit: Microliter,
    }
}

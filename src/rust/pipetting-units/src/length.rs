// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::unit::quantity;

quantity!(Length);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millimeter;

impl fmt::Display for Millimeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mm")
    }
}

pub const fn millimeters<T>(value: T) -> Length<Millimeter, T> {
    Length {
        value,
        unit: Millimeter,
    }
}

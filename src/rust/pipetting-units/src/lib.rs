// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Physical quantities used when driving a liquid handler.
//!
//! Each quantity carries its unit as a zero-sized type parameter:
//!
//! ```rust
//! use pipetting_units::volume::microliters;
//!
//! let per_well = microliters(45.0);
//! let load = per_well * 6.0 + microliters(20.0);
//! assert_eq!(format!("{load}"), "290.0 µL");
//! ```

pub mod duration;
pub mod length;
pub mod volume;

mod unit;

pub use duration::{Duration, Second, seconds};
pub use length::{Length, Millimeter, millimeters};
pub use volume::{Microliter, Microliters, Volume, microliters};

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::sync::{atomic::AtomicBool, atomic::Ordering};

#[doc(hidden)]
pub use log as _log;

pub use log::LevelFilter;

#[macro_export]
macro_rules! info {
    ($msg:literal, $($arg:tt)+) => {
        pipetting_log::_log::info!(target: concat!("pipetting.rust::", module_path!()), $msg, $($arg)+);
    };
    ($msg:literal) => {
        pipetting_log::_log::info!(target: concat!("pipetting.rust::", module_path!()), $msg);
    };
}

#[macro_export]
macro_rules! warn {
    ($msg:literal, $($arg:tt)+) => {
        pipetting_log::_log::warn!(target: concat!("pipetting.rust::", module_path!()), $msg, $($arg)+);
    };
    ($msg:literal) => {
        pipetting_log::_log::warn!(target: concat!("pipetting.rust::", module_path!()), $msg);
    };
}

#[macro_export]
macro_rules! debug {
    ($msg:literal, $($arg:tt)+) => {
        pipetting_log::_log::debug!(target: concat!("pipetting.rust::", module_path!()), $msg, $($arg)+);
    };
    ($msg:literal) => {
        pipetting_log::_log::debug!(target: concat!("pipetting.rust::", module_path!()), $msg);
    };
}

/// Log a diagnostic message at info level if diagnostics logging is enabled.
#[macro_export]
macro_rules! diagnostic {
    ($msg:literal, $($arg:tt)+) => {
        if pipetting_log::is_diagnostics_enabled() {
             pipetting_log::_log::info!(target: concat!("pipetting.rust::", module_path!()), $msg, $($arg)+);
        }
    };
    ($msg:literal) => {
        if pipetting_log::is_diagnostics_enabled() {
            pipetting_log::_log::info!(target: concat!("pipetting.rust::", module_path!()), $msg);
        }
    };
}

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::Acquire)
}

/// Initialize the logging.
///
/// Installs a `tracing` subscriber writing to standard error, bridged from the
/// `log` records this crate's macros emit, unless the host application already
/// installed one. Filtering is left to the `log` maximum level, so calling this
/// again only updates the level and the diagnostics flag.
///
/// The diagnostics flag is independent of the level: diagnostic messages are
/// emitted at info level, but only when enabled here.
pub fn init_logging(level: LevelFilter, with_diagnostics: bool) {
    // A subscriber installed by the embedding application takes precedence.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_target(true)
        .try_init();
    log::set_max_level(level);
    DIAGNOSTICS_ENABLED.store(with_diagnostics, Ordering::Release);
}

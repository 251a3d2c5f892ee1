// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Command-line previewer for transfer files.

pub mod cli;
pub mod config;
mod report;

pub use cli::run_from_env;

// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

fn main() {
    if let Err(error) = transfer_planner_cli::run_from_env() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}

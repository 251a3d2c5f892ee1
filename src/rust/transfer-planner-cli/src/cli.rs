// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pipetting_log::{LevelFilter, init_logging};

use crate::config;
use crate::report::{write_plans, write_simulation};

#[derive(Debug, Parser)]
#[command(
    name = "transfer-plan",
    about = "Preview capacity-chunked liquid transfers",
    version
)]
pub struct Cli {
    /// Log every device command.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log how chunk limits are derived.
    #[arg(long, global = true)]
    pub diagnostics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the chunk plan of every step in a transfer file.
    Plan { file: PathBuf },

    /// Run a transfer file on a simulated pipette.
    Simulate {
        file: PathBuf,

        /// Size of the tip rack; unlimited if omitted.
        #[arg(long)]
        tips: Option<usize>,
    },
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.diagnostics {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    init_logging(level, cli.diagnostics);
    run(cli, &mut io::stdout().lock())
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Plan { file } => write_plans(out, &config::load(&file)?),
        Commands::Simulate { file, tips } => write_simulation(out, &config::load(&file)?, tips),
    }
}

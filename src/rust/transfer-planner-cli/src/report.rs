// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use pipetting_log::info;
use transfer_planner::simulation::SimulatedDevice;
use transfer_planner::{
    TransferPlan, TransferSummary, consolidate, distribute, plan_consolidation, plan_distribution,
};

use crate::config::{Step, TransferFile};

fn describe(step: &Step) -> String {
    match step {
        Step::Distribute(request) => format!(
            "distribute {} from {} to {} destination(s)",
            request.per_destination_volume,
            request.source,
            request.destinations.len()
        ),
        Step::Consolidate(request) => format!(
            "consolidate {} from {} source(s) into {}",
            request.per_source_volume,
            request.sources.len(),
            request.destination
        ),
    }
}

fn plan(step: &Step) -> transfer_planner::Result<TransferPlan<'_>> {
    match step {
        Step::Distribute(request) => plan_distribution(request),
        Step::Consolidate(request) => plan_consolidation(request),
    }
}

/// Print the chunk plan of every step without touching a device.
pub fn write_plans(out: &mut impl Write, file: &TransferFile) -> Result<()> {
    for (index, step) in file.steps.iter().enumerate() {
        let plan = plan(step).with_context(|| format!("Step {}", index + 1))?;
        writeln!(out, "Step {}: {}", index + 1, describe(step))?;
        write!(out, "{plan}")?;
    }
    Ok(())
}

/// Run every step on one simulated pipette and print what it did.
///
/// The pipette is as large as the largest step capacity. `tips` limits the
/// tip rack; without it the supply is unlimited.
pub fn write_simulation(
    out: &mut impl Write,
    file: &TransferFile,
    tips: Option<usize>,
) -> Result<()> {
    let Some(max_volume) = file.max_capacity() else {
        writeln!(out, "Nothing to simulate")?;
        return Ok(());
    };
    let mut device = SimulatedDevice::new(max_volume);
    if let Some(tips) = tips {
        device = device.with_tips(tips);
    }

    let mut total = TransferSummary::default();
    for (index, step) in file.steps.iter().enumerate() {
        info!("Simulating step {}: {}", index + 1, describe(step));
        let summary = match step {
            Step::Distribute(request) => distribute(request, &mut device),
            Step::Consolidate(request) => consolidate(request, &mut device),
        }
        .with_context(|| format!("Step {}", index + 1))?;
        writeln!(
            out,
            "Step {}: {}: {} chunk(s), {} tip(s), aspirated {}, delivered {}",
            index + 1,
            describe(step),
            summary.chunks,
            summary.tips_used,
            summary.aspirated,
            summary.delivered
        )?;
        total.chunks += summary.chunks;
        total.tips_used += summary.tips_used;
        total.aspirated += summary.aspirated;
        total.delivered += summary.delivered;
    }

    writeln!(out, "Commands:")?;
    for (index, command) in device.commands().iter().enumerate() {
        writeln!(out, "  {index:>4}  {command}")?;
    }
    writeln!(out, "Well balance:")?;
    for (well, volume) in device.well_balance() {
        writeln!(out, "  {well}: {volume}")?;
    }
    writeln!(
        out,
        "Total: {} chunk(s), {} tip(s), aspirated {}, delivered {}, waited {}",
        total.chunks,
        total.tips_used,
        total.aspirated,
        total.delivered,
        device.elapsed()
    )?;
    Ok(())
}

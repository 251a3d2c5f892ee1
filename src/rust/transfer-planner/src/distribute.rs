// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use pipetting_log::{debug, info, warn};

use crate::chunking::ChunkPlan;
use crate::device::PipettingDevice;
use crate::error::Result;
use crate::plan::{PlannedChunk, TransferPlan, TransferSummary};
use crate::request::{DEFAULT_RATE, DistributeRequest, ResidualMode, TipPolicy};
use crate::tips::TipLifecycle;

/// Chunk the destinations of `request` into tip loads.
///
/// Every load aspirates its destinations' volume plus the residual volume.
pub fn plan_distribution(request: &DistributeRequest) -> Result<TransferPlan<'_>> {
    let max_per_chunk = request.chunk_limit()?;
    let chunks = ChunkPlan::new(request.destinations.len(), max_per_chunk)
        .split(&request.destinations)
        .into_iter()
        .map(|locations| PlannedChunk {
            locations,
            volume: request.per_destination_volume * locations.len() as f64
                + request.residual_volume,
        })
        .collect();
    Ok(TransferPlan {
        max_per_chunk,
        chunks,
    })
}

/// Deliver `request.per_destination_volume` from the source to every destination.
///
/// The request is validated before the first device call. Device errors are
/// returned as they are; chunks completed before the error stay delivered.
pub fn distribute<D: PipettingDevice + ?Sized>(
    request: &DistributeRequest,
    device: &mut D,
) -> Result<TransferSummary> {
    let plan = plan_distribution(request)?;
    if plan.is_empty() {
        return Ok(TransferSummary::default());
    }
    info!(
        "Distributing {} from {} to {} destination(s) in {} chunk(s)",
        request.per_destination_volume,
        request.source,
        request.destinations.len(),
        plan.len()
    );

    let options = &request.options;
    let source = &request.source;
    let residual_target = request.residual_disposal.as_ref().map(|d| (d.target(), d.mode));
    if residual_target.is_none()
        && request.residual_volume.value() > 0.0
        && options.tip_policy != TipPolicy::NewTipPerChunk
        && plan.len() > 1
    {
        warn!(
            "Residual of {} is kept in the tip between chunks, {} in total",
            request.residual_volume,
            request.residual_volume * plan.len() as f64
        );
    }
    let mut tips = TipLifecycle::new(options.tip_policy, plan.len());
    let mut summary = TransferSummary {
        chunks: plan.len(),
        ..Default::default()
    };

    for (index, chunk) in plan.chunks.iter().enumerate() {
        debug!(
            "Chunk {}: {} for {} destination(s)",
            index,
            chunk.volume,
            chunk.locations.len()
        );
        tips.acquire(device, index)?;

        // Pre-wetting and residual disposal run at the pipette's default rate.
        if request.pre_wet {
            device.aspirate(request.capacity, source, DEFAULT_RATE)?;
            device.dispense(request.capacity, source, DEFAULT_RATE)?;
        }
        if let Some(repetitions) = request.mix_count {
            device.mix(repetitions, chunk.volume, source, options.aspirate_rate)?;
        }

        device.aspirate(chunk.volume, source, options.aspirate_rate)?;
        device.delay(options.aspirate_delay)?;
        summary.aspirated += chunk.volume;

        for destination in chunk.locations {
            device.dispense(
                request.per_destination_volume,
                destination,
                options.dispense_rate,
            )?;
            device.delay(options.dispense_delay)?;
            if let Some(touch_tip) = &options.touch_tip {
                device.touch_tip(touch_tip.radius, touch_tip.vertical_offset)?;
            }
            summary.delivered += request.per_destination_volume;
        }

        match &residual_target {
            Some((target, ResidualMode::Dispense)) if request.residual_volume.value() > 0.0 => {
                device.dispense(request.residual_volume, target, DEFAULT_RATE)?;
            }
            Some((target, ResidualMode::BlowOut)) => device.blow_out(target)?,
            _ => {}
        }

        tips.release(device, index)?;
    }

    summary.tips_used = tips.picked_up();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;
    use crate::error::{ConfigurationError, Error};
    use crate::location::Location;
    use crate::request::{DistributeRequestBuilder, ResidualDisposal, TransferOptions};
    use crate::simulation::{Command, SimulatedDevice};
    use pipetting_units::{Microliters, microliters, millimeters, seconds};

    fn reservoir() -> Location {
        Location::new("reservoir", "A1")
    }

    fn wells(n: usize) -> Vec<Location> {
        (1..=n).map(|i| Location::new("plate", format!("A{i}"))).collect()
    }

    fn request(
        volume: f64,
        capacity: f64,
        residual: f64,
        destinations: usize,
    ) -> DistributeRequestBuilder {
        DistributeRequestBuilder::new(
            microliters(volume),
            reservoir(),
            wells(destinations),
            microliters(capacity),
        )
        .residual_volume(microliters(residual))
    }

    fn aspirated(device: &SimulatedDevice) -> Vec<Microliters> {
        device
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Aspirate { volume, .. } => Some(*volume),
                _ => None,
            })
            .collect()
    }

    fn count(device: &SimulatedDevice, f: impl Fn(&Command) -> bool) -> usize {
        device.commands().iter().filter(|&c| f(c)).count()
    }

    #[test]
    fn test_scenario_small_volumes() {
        let request = request(5.0, 20.0, 5.0, 7).build();
        let plan = plan_distribution(&request).unwrap();
        assert_eq!(plan.max_per_chunk.get(), 3);
        assert_eq!(plan.chunk_sizes(), vec![3, 2, 2]);

        let mut device = SimulatedDevice::new(microliters(20.0));
        let summary = distribute(&request, &mut device).unwrap();
        assert_eq!(
            aspirated(&device),
            vec![microliters(20.0), microliters(15.0), microliters(15.0)]
        );
        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.tips_used, 3);
        assert_eq!(summary.aspirated, microliters(50.0));
        assert_eq!(summary.delivered, microliters(35.0));
        assert_eq!(count(&device, |c| *c == Command::PickUpTip), 3);
        assert_eq!(count(&device, |c| *c == Command::DropTip), 3);
    }

    #[test]
    fn test_scenario_single_load() {
        let request = request(45.0, 300.0, 20.0, 6).build();
        let plan = plan_distribution(&request).unwrap();
        assert_eq!(plan.max_per_chunk.get(), 6);
        assert_eq!(plan.chunk_sizes(), vec![6]);

        let mut device = SimulatedDevice::new(microliters(300.0));
        distribute(&request, &mut device).unwrap();
        assert_eq!(aspirated(&device), vec![microliters(290.0)]);
        for well in &wells(6) {
            assert_eq!(device.net_volume(well), microliters(45.0));
        }
    }

    #[test]
    fn test_loads_fit_the_pipette() {
        // Three destinations would overfill the pipette by 5e-8 µL.
        let request = request(300.0 / (3.0 - 5e-10), 300.0, 0.0, 3).build();
        let plan = plan_distribution(&request).unwrap();
        assert_eq!(plan.chunk_sizes(), vec![2, 1]);

        let mut device = SimulatedDevice::new(microliters(300.0));
        let summary = distribute(&request, &mut device).unwrap();
        assert_eq!(summary.chunks, 2);
    }

    #[test]
    fn test_command_sequence() {
        let request = request(45.0, 300.0, 20.0, 2)
            .mix(3)
            .residual_disposal(ResidualDisposal::new(reservoir(), millimeters(3.5)))
            .options(
                TransferOptions::default()
                    .aspirate_delay(seconds(1.0))
                    .dispense_rate(0.5)
                    .touch_tip(0.4, millimeters(-5.0)),
            )
            .build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        distribute(&request, &mut device).unwrap();

        let wells = wells(2);
        let touch = Command::TouchTip {
            radius: 0.4,
            vertical_offset: millimeters(-5.0),
        };
        assert_eq!(
            device.commands(),
            &[
                Command::PickUpTip,
                Command::Mix {
                    repetitions: 3,
                    volume: microliters(110.0),
                    location: reservoir(),
                    rate: 1.0,
                },
                Command::Aspirate {
                    volume: microliters(110.0),
                    location: reservoir(),
                    rate: 1.0,
                },
                Command::Delay(seconds(1.0)),
                Command::Dispense {
                    volume: microliters(45.0),
                    location: wells[0].clone(),
                    rate: 0.5,
                },
                Command::Delay(seconds(0.0)),
                touch.clone(),
                Command::Dispense {
                    volume: microliters(45.0),
                    location: wells[1].clone(),
                    rate: 0.5,
                },
                Command::Delay(seconds(0.0)),
                touch,
                Command::Dispense {
                    volume: microliters(20.0),
                    location: reservoir().bottom(millimeters(3.5)),
                    rate: 1.0,
                },
                Command::DropTip,
            ]
        );
        assert_eq!(device.net_volume(&reservoir()), microliters(-90.0));
        assert_eq!(device.tip_content(), microliters(0.0));
    }

    #[test]
    fn test_residual_blow_out() {
        let request = request(40.0, 300.0, 20.0, 3)
            .residual_disposal(ResidualDisposal::new(reservoir(), millimeters(1.0)).blow_out())
            .build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        distribute(&request, &mut device).unwrap();
        assert_eq!(
            count(&device, |c| matches!(c, Command::BlowOut { .. })),
            1
        );
        assert_eq!(device.net_volume(&reservoir()), microliters(-120.0));
    }

    #[test]
    fn test_residual_stays_in_tip_without_disposal() {
        let request = request(40.0, 300.0, 20.0, 3).build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        let summary = distribute(&request, &mut device).unwrap();
        assert_eq!(summary.aspirated, microliters(140.0));
        assert_eq!(summary.delivered, microliters(120.0));
        assert_eq!(device.net_volume(&reservoir()), microliters(-140.0));
    }

    #[test]
    fn test_pre_wet_has_no_net_effect() {
        let request = request(5.0, 20.0, 5.0, 7)
            .pre_wet()
            .options(TransferOptions::default().aspirate_rate(0.5).dispense_rate(0.5))
            .build();
        let mut device = SimulatedDevice::new(microliters(20.0));
        distribute(&request, &mut device).unwrap();
        assert_eq!(
            aspirated(&device),
            vec![
                microliters(20.0),
                microliters(20.0),
                microliters(20.0),
                microliters(15.0),
                microliters(20.0),
                microliters(15.0),
            ]
        );
        assert_eq!(device.net_volume(&reservoir()), microliters(-50.0));
        assert_eq!(
            &device.commands()[1..4],
            &[
                Command::Aspirate {
                    volume: microliters(20.0),
                    location: reservoir(),
                    rate: 1.0,
                },
                Command::Dispense {
                    volume: microliters(20.0),
                    location: reservoir(),
                    rate: 1.0,
                },
                Command::Aspirate {
                    volume: microliters(20.0),
                    location: reservoir(),
                    rate: 0.5,
                },
            ]
        );
    }

    #[test]
    fn test_single_tip_policy() {
        let request = request(5.0, 20.0, 5.0, 7)
            .residual_disposal(ResidualDisposal::new(reservoir(), millimeters(1.0)))
            .options(TransferOptions::default().tip_policy(TipPolicy::SingleTip))
            .build();
        let mut device = SimulatedDevice::new(microliters(20.0)).with_tips(1);
        let summary = distribute(&request, &mut device).unwrap();
        assert_eq!(summary.tips_used, 1);
        assert_eq!(device.commands().first(), Some(&Command::PickUpTip));
        assert_eq!(device.commands().last(), Some(&Command::DropTip));
        assert_eq!(count(&device, |c| *c == Command::PickUpTip), 1);
        assert_eq!(count(&device, |c| *c == Command::DropTip), 1);
    }

    #[test]
    fn test_caller_managed_tips() {
        let request = request(45.0, 300.0, 20.0, 16)
            .residual_disposal(ResidualDisposal::new(reservoir(), millimeters(3.5)))
            .options(TransferOptions::default().tip_policy(TipPolicy::CallerManaged))
            .build();
        let mut device = SimulatedDevice::new(microliters(300.0)).with_tip_attached();
        let summary = distribute(&request, &mut device).unwrap();
        assert_eq!(summary.tips_used, 0);
        assert_eq!(summary.chunks, 3);
        assert_eq!(
            count(&device, |c| matches!(c, Command::PickUpTip | Command::DropTip)),
            0
        );
        assert!(device.tip_attached());
    }

    #[test]
    fn test_empty_destinations() {
        let request = request(45.0, 300.0, 20.0, 0).mix(3).pre_wet().build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        let summary = distribute(&request, &mut device).unwrap();
        assert_eq!(summary, TransferSummary::default());
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_single_destination() {
        let request = request(45.0, 300.0, 20.0, 1).build();
        let plan = plan_distribution(&request).unwrap();
        assert_eq!(plan.chunk_sizes(), vec![1]);
        assert_eq!(plan.chunks[0].locations, &wells(1)[..]);
        assert_eq!(plan.total_volume(), microliters(65.0));
    }

    #[test]
    fn test_rejects_before_device_calls() {
        let request = request(20.0, 40.0, 20.0, 4).build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        let err = distribute(&request, &mut device).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::CapacityTooSmall { .. })
        ));
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_device_error_propagates() {
        // Chunk 0: pick up, aspirate, delay, 3x (dispense, delay), drop = 10 commands.
        let request = request(5.0, 20.0, 5.0, 7).build();
        let mut device = SimulatedDevice::new(microliters(20.0)).fail_on(12);
        let err = distribute(&request, &mut device).unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::Fault(_))));

        let wells = wells(7);
        for well in &wells[..3] {
            assert_eq!(device.net_volume(well), microliters(5.0));
        }
        for well in &wells[3..] {
            assert_eq!(device.net_volume(well), microliters(0.0));
        }
        // Chunk 1 got as far as its aspirate.
        assert_eq!(device.net_volume(&reservoir()), microliters(-35.0));
    }

    #[test]
    fn test_tip_shortage_propagates() {
        let request = request(5.0, 20.0, 5.0, 7).build();
        let mut device = SimulatedDevice::new(microliters(20.0)).with_tips(2);
        let err = distribute(&request, &mut device).unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::NoTipAvailable)));
        assert_eq!(count(&device, |c| *c == Command::DropTip), 2);
    }

    #[test]
    fn test_planning_is_idempotent() {
        let request = request(7.5, 300.0, 15.0, 96).build();
        assert_eq!(
            plan_distribution(&request).unwrap(),
            plan_distribution(&request).unwrap()
        );
    }
}

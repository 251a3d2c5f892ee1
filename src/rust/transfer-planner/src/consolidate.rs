// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use pipetting_log::{debug, info};

use crate::chunking::ChunkPlan;
use crate::device::PipettingDevice;
use crate::error::Result;
use crate::plan::{PlannedChunk, TransferPlan, TransferSummary};
use crate::request::ConsolidateRequest;
use crate::tips::TipLifecycle;

/// Chunk the sources of `request` into tip loads.
///
/// The volume of each planned chunk is what it dispenses into the destination.
pub fn plan_consolidation(request: &ConsolidateRequest) -> Result<TransferPlan<'_>> {
    let max_per_chunk = request.chunk_limit()?;
    let chunks = ChunkPlan::new(request.sources.len(), max_per_chunk)
        .split(&request.sources)
        .into_iter()
        .map(|locations| PlannedChunk {
            locations,
            volume: request.per_source_volume * locations.len() as f64,
        })
        .collect();
    Ok(TransferPlan {
        max_per_chunk,
        chunks,
    })
}

/// Pool `request.per_source_volume` from every source into the destination.
///
/// Each tip load visits its sources in order and empties into the destination
/// with a single dispense. Errors behave as for [`distribute`](crate::distribute::distribute).
pub fn consolidate<D: PipettingDevice + ?Sized>(
    request: &ConsolidateRequest,
    device: &mut D,
) -> Result<TransferSummary> {
    let plan = plan_consolidation(request)?;
    if plan.is_empty() {
        return Ok(TransferSummary::default());
    }
    info!(
        "Consolidating {} from {} source(s) into {} in {} chunk(s)",
        request.per_source_volume,
        request.sources.len(),
        request.destination,
        plan.len()
    );

    let options = &request.options;
    let mut tips = TipLifecycle::new(options.tip_policy, plan.len());
    let mut summary = TransferSummary {
        chunks: plan.len(),
        ..Default::default()
    };

    for (index, chunk) in plan.chunks.iter().enumerate() {
        debug!(
            "Chunk {}: {} from {} source(s)",
            index,
            chunk.volume,
            chunk.locations.len()
        );
        tips.acquire(device, index)?;

        for source in chunk.locations {
            device.aspirate(request.per_source_volume, source, options.aspirate_rate)?;
            device.delay(options.aspirate_delay)?;
            summary.aspirated += request.per_source_volume;
        }

        device.dispense(chunk.volume, &request.destination, options.dispense_rate)?;
        device.delay(options.dispense_delay)?;
        if let Some(touch_tip) = &options.touch_tip {
            device.touch_tip(touch_tip.radius, touch_tip.vertical_offset)?;
        }
        summary.delivered += chunk.volume;

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
    use crate::request::{ConsolidateRequestBuilder, TipPolicy, TransferOptions};
    use crate::simulation::{Command, SimulatedDevice};
    use pipetting_units::{microliters, millimeters, seconds};

    fn trash() -> Location {
        Location::new("trash", "A1")
    }

    fn wells(n: usize) -> Vec<Location> {
        (1..=n).map(|i| Location::new("plate", format!("B{i}"))).collect()
    }

    fn request(volume: f64, capacity: f64, sources: usize) -> ConsolidateRequestBuilder {
        ConsolidateRequestBuilder::new(
            microliters(volume),
            wells(sources),
            trash(),
            microliters(capacity),
        )
    }

    #[test]
    fn test_scenario_pool_into_one() {
        let request = request(50.0, 300.0, 5).build();
        let plan = plan_consolidation(&request).unwrap();
        assert_eq!(plan.max_per_chunk.get(), 6);
        assert_eq!(plan.chunk_sizes(), vec![5]);

        let mut device = SimulatedDevice::new(microliters(300.0));
        let summary = consolidate(&request, &mut device).unwrap();
        let dispenses: Vec<_> = device
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Dispense { .. }))
            .collect();
        assert_eq!(
            dispenses,
            vec![&Command::Dispense {
                volume: microliters(250.0),
                location: trash(),
                rate: 1.0,
            }]
        );
        assert_eq!(summary.delivered, microliters(250.0));
        assert_eq!(device.net_volume(&trash()), microliters(250.0));
        for well in &wells(5) {
            assert_eq!(device.net_volume(well), microliters(-50.0));
        }
    }

    #[test]
    fn test_chunked_wash() {
        // 16 wells of 60 µL with a 300 µL pipette: 5 per load, 4 loads of 4.
        let request = request(60.0, 300.0, 16)
            .options(
                TransferOptions::default()
                    .aspirate_rate(0.2)
                    .tip_policy(TipPolicy::SingleTip),
            )
            .build();
        let plan = plan_consolidation(&request).unwrap();
        assert_eq!(plan.chunk_sizes(), vec![4, 4, 4, 4]);

        let mut device = SimulatedDevice::new(microliters(300.0));
        let summary = consolidate(&request, &mut device).unwrap();
        assert_eq!(summary.chunks, 4);
        assert_eq!(summary.tips_used, 1);
        assert_eq!(summary.aspirated, microliters(960.0));
        assert_eq!(device.net_volume(&trash()), microliters(960.0));
        assert!(!device.tip_attached());
    }

    #[test]
    fn test_command_sequence() {
        let request = request(50.0, 300.0, 2)
            .options(
                TransferOptions::default()
                    .aspirate_delay(seconds(0.5))
                    .dispense_delay(seconds(1.0))
                    .touch_tip(0.4, millimeters(-5.0)),
            )
            .build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        consolidate(&request, &mut device).unwrap();

        let wells = wells(2);
        assert_eq!(
            device.commands(),
            &[
                Command::PickUpTip,
                Command::Aspirate {
                    volume: microliters(50.0),
                    location: wells[0].clone(),
                    rate: 1.0,
                },
                Command::Delay(seconds(0.5)),
                Command::Aspirate {
                    volume: microliters(50.0),
                    location: wells[1].clone(),
                    rate: 1.0,
                },
                Command::Delay(seconds(0.5)),
                Command::Dispense {
                    volume: microliters(100.0),
                    location: trash(),
                    rate: 1.0,
                },
                Command::Delay(seconds(1.0)),
                Command::TouchTip {
                    radius: 0.4,
                    vertical_offset: millimeters(-5.0),
                },
                Command::DropTip,
            ]
        );
    }

    #[test]
    fn test_empty_sources() {
        let request = request(50.0, 300.0, 0).build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        assert_eq!(
            consolidate(&request, &mut device).unwrap(),
            TransferSummary::default()
        );
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_rejects_oversized_transfer() {
        let request = request(350.0, 300.0, 2).build();
        let mut device = SimulatedDevice::new(microliters(300.0));
        let err = consolidate(&request, &mut device).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::CapacityBelowTransfer { .. })
        ));
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_device_error_propagates() {
        // Pick up, then the first aspirate fails.
        let request = request(50.0, 300.0, 3).build();
        let mut device = SimulatedDevice::new(microliters(300.0)).fail_on(1);
        let err = consolidate(&request, &mut device).unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::Fault(_))));
        assert_eq!(device.commands(), &[Command::PickUpTip]);
        assert!(device.tip_attached());
    }
}

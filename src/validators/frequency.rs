//! Trips defined in frequencies.txt.
//!
//! A trip whose frequencies rows all have `exact_times` 0 (or empty) runs
//! on a headway without fixed times ("type 0"); a trip with any
//! `exact_times=1` row runs on a fixed schedule at regular intervals
//! ("type 1").

use tracing::debug;

use super::FeedValidator;
use super::util::{non_empty, trip_id, trip_update_label, vehicle_id_of_trip_update, vehicle_label};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs::{Frequency, GtfsDataset, parse_time};
use crate::gtfs_rt::{TripDescriptor, trip_descriptor};
use crate::results::ValidationResult;
use crate::rules::{E006, E013, E019, W005};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrequencyType {
    Zero,
    One,
}

fn frequency_type(gtfs: &GtfsDataset, trip_id: &str) -> Option<FrequencyType> {
    let frequencies = gtfs.frequencies(trip_id);
    if frequencies.is_empty() {
        None
    } else if frequencies.iter().any(Frequency::is_exact_times) {
        Some(FrequencyType::One)
    } else {
        Some(FrequencyType::Zero)
    }
}

/// Trip descriptors of all TripUpdates and VehiclePositions, with labels.
fn trip_descriptors(ctx: &ValidationContext) -> impl Iterator<Item = (String, &TripDescriptor)> {
    ctx.feed.entity.iter().flat_map(|entity| {
        let from_trip_update = entity
            .trip_update
            .as_ref()
            .map(|tu| (trip_update_label(entity, tu), &tu.trip));
        let from_vehicle = entity
            .vehicle
            .as_ref()
            .and_then(|v| v.trip.as_ref().map(|trip| (vehicle_label(entity, v), trip)));
        from_trip_update.into_iter().chain(from_vehicle)
    })
}

/// E006, E013, W005.
#[derive(Debug, Default)]
pub struct FrequencyTypeZeroValidator;

impl FeedValidator for FrequencyTypeZeroValidator {
    fn name(&self) -> &'static str {
        "frequency_type_zero"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        for (label, trip) in trip_descriptors(ctx) {
            let Some(trip_id) = trip_id(trip) else {
                continue;
            };
            if frequency_type(&ctx.gtfs, trip_id) != Some(FrequencyType::Zero) {
                continue;
            }

            if non_empty(trip.start_time.as_deref()).is_none()
                || non_empty(trip.start_date.as_deref()).is_none()
            {
                result.add(&E006, label.as_str());
            }

            let unscheduled = trip_descriptor::ScheduleRelationship::Unscheduled as i32;
            if trip.schedule_relationship.is_some_and(|r| r != unscheduled) {
                result.add(&E013, label.as_str());
            }
        }

        for entity in &ctx.feed.entity {
            let Some(trip_update) = &entity.trip_update else {
                continue;
            };
            let is_type_zero = trip_id(&trip_update.trip)
                .is_some_and(|id| frequency_type(&ctx.gtfs, id) == Some(FrequencyType::Zero));
            if is_type_zero && vehicle_id_of_trip_update(trip_update).is_none() {
                result.add(&W005, trip_update_label(entity, trip_update));
            }
        }

        debug!(
            validator = self.name(),
            rules = result.rule_count(),
            occurrences = result.total_occurrences(),
            "Validation complete"
        );
        Ok(result)
    }
}

/// E019.
#[derive(Debug, Default)]
pub struct FrequencyTypeOneValidator;

/// Whether `start` is a window's start plus a whole number of headways,
/// inside `[start_time, end_time)`.
fn on_headway(frequency: &Frequency, start: u32) -> bool {
    if start < frequency.start_time || start >= frequency.end_time {
        return false;
    }
    let offset = start - frequency.start_time;
    match frequency.headway_secs {
        0 => offset == 0,
        headway => offset % headway == 0,
    }
}

impl FeedValidator for FrequencyTypeOneValidator {
    fn name(&self) -> &'static str {
        "frequency_type_one"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        for (label, trip) in trip_descriptors(ctx) {
            let Some(trip_id) = trip_id(trip) else {
                continue;
            };
            if frequency_type(&ctx.gtfs, trip_id) != Some(FrequencyType::One) {
                continue;
            }
            // unparseable start times are E020
            let Some(start_time) = trip.start_time.as_deref() else {
                continue;
            };
            let Some(start) = parse_time(start_time) else {
                continue;
            };

            let frequencies = ctx.gtfs.frequencies(trip_id);
            if !frequencies.iter().any(|f| on_headway(f, start)) {
                result.add(&E019, format!("{label} start_time {start_time}"));
            }
        }

        debug!(
            validator = self.name(),
            rules = result.rule_count(),
            occurrences = result.total_occurrences(),
            "Validation complete"
        );
        Ok(result)
    }
}

use std::collections::BTreeSet;
use tracing::debug;

use super::FeedValidator;
use super::util::{non_empty, trip_update_label, vehicle_label};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::results::ValidationResult;
use crate::rules::{E010, E011, E015};

/// Every stop_id referenced by the feed, with a label for the referencing
/// element. `include_alerts` adds alert informed entities.
fn referenced_stops(ctx: &ValidationContext, include_alerts: bool) -> Vec<(String, &str)> {
    let mut stops = Vec::new();
    for entity in &ctx.feed.entity {
        if let Some(trip_update) = &entity.trip_update {
            let label = trip_update_label(entity, trip_update);
            for update in &trip_update.stop_time_update {
                if let Some(stop_id) = non_empty(update.stop_id.as_deref()) {
                    stops.push((label.clone(), stop_id));
                }
            }
        }
        if let Some(vehicle) = &entity.vehicle {
            if let Some(stop_id) = non_empty(vehicle.stop_id.as_deref()) {
                stops.push((vehicle_label(entity, vehicle), stop_id));
            }
        }
        if include_alerts {
            if let Some(alert) = &entity.alert {
                for informed in &alert.informed_entity {
                    if let Some(stop_id) = non_empty(informed.stop_id.as_deref()) {
                        stops.push((format!("alert entity ID {}", entity.id), stop_id));
                    }
                }
            }
        }
    }
    stops
}

/// E011.
#[derive(Debug, Default)]
pub struct StopValidator;

impl FeedValidator for StopValidator {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        for (label, stop_id) in referenced_stops(ctx, true) {
            if ctx.gtfs.stop(stop_id).is_none() {
                result.add(&E011, format!("{label} stop_id {stop_id}"));
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

/// E015 for stops referenced by TripUpdates and VehiclePositions, and E010
/// for stops referenced by stop_times.txt.
#[derive(Debug, Default)]
pub struct StopLocationTypeValidator;

impl FeedValidator for StopLocationTypeValidator {
    fn name(&self) -> &'static str {
        "stop_location_type"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        let scheduled_stops: BTreeSet<&str> = ctx
            .gtfs
            .all_stop_times()
            .map(|stop_time| stop_time.stop_id.as_str())
            .collect();
        for stop_id in scheduled_stops {
            if let Some(stop) = ctx.gtfs.stop(stop_id) {
                if !stop.is_stop_or_platform() {
                    result.add(&E010, format!("stop_id {stop_id}"));
                }
            }
        }

        for (label, stop_id) in referenced_stops(ctx, false) {
            // unknown stops are E011
            let Some(stop) = ctx.gtfs.stop(stop_id) else {
                continue;
            };
            if !stop.is_stop_or_platform() {
                result.add(&E015, format!("{label} stop_id {stop_id}"));
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

use std::collections::HashSet;
use tracing::debug;

use super::FeedValidator;
use super::util::{
    has_active_detour, route_id, trip_id, trip_update_label, vehicle_id_of_position,
    vehicle_id_of_trip_update, vehicle_label,
};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs_rt::{FeedEntity, Position, VehiclePosition};
use crate::results::ValidationResult;
use crate::rules::{E026, E027, E028, E029, E052, W002, W004};

/// W002, W004, E026, E027, E028, E029, E052.
#[derive(Debug, Default)]
pub struct VehicleValidator;

impl FeedValidator for VehicleValidator {
    fn name(&self) -> &'static str {
        "vehicle"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();
        let mut seen_vehicle_ids = HashSet::new();

        for entity in &ctx.feed.entity {
            if let Some(trip_update) = &entity.trip_update {
                if vehicle_id_of_trip_update(trip_update).is_none() {
                    let label = trip_update_label(entity, trip_update);
                    result.add(&W002, format!("TripUpdate {label}"));
                }
            }

            let Some(vehicle) = &entity.vehicle else {
                continue;
            };
            let label = vehicle_label(entity, vehicle);

            match vehicle_id_of_position(vehicle) {
                None => result.add(&W002, format!("VehiclePosition {label}")),
                Some(vehicle_id) => {
                    if !seen_vehicle_ids.insert(vehicle_id) {
                        result.add(&E052, format!("vehicle_id {vehicle_id} (entity ID {})", entity.id));
                    }
                }
            }

            if let Some(position) = &vehicle.position {
                check_position(ctx, &mut result, entity, vehicle, position, &label);
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

fn check_position(
    ctx: &ValidationContext,
    result: &mut ValidationResult,
    entity: &FeedEntity,
    vehicle: &VehiclePosition,
    position: &Position,
    label: &str,
) {
    if let Some(bearing) = position.bearing {
        if !(0.0..=360.0).contains(&bearing) {
            result.add(&E027, format!("{label} bearing {bearing}"));
        }
    }

    if let Some(speed) = position.speed {
        if speed < 0.0 || speed > ctx.config.max_vehicle_speed_mps {
            result.add(&W004, format!("{label} speed {speed} m/s"));
        }
    }

    let (lat, lon) = (f64::from(position.latitude), f64::from(position.longitude));
    let at = format!("{label} at ({lat}, {lon})");
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        result.add(&E026, at);
        return;
    }

    if !ctx.metadata.contains_in_stop_coverage(lat, lon) {
        result.add(&E028, at.as_str());
    }

    let Some(trip) = &vehicle.trip else {
        return;
    };
    let Some(trip_id) = trip_id(trip) else {
        return;
    };
    let Some(shape) = ctx.metadata.trip_shape(trip_id) else {
        return;
    };
    if shape.contains(lat, lon) {
        return;
    }

    let route_id = route_id(trip).or_else(|| ctx.gtfs.trip(trip_id).map(|t| t.route_id.as_str()));
    if has_active_detour(&ctx.feed, ctx.now_secs(), trip_id, route_id) {
        debug!(trip_id, entity_id = %entity.id, "Vehicle off shape during active detour");
        return;
    }
    result.add(&E029, format!("{at} on trip_id {trip_id}"));
}

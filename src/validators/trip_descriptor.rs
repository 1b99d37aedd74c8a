//! Trip descriptors in TripUpdates and VehiclePositions against the static
//! schedule, and alert informed entities.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::FeedValidator;
use super::util::{non_empty, route_id, trip_id, trip_update_label, vehicle_label};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs::{format_time, parse_time};
use crate::gtfs_rt::{Alert, EntitySelector, FeedEntity, TripDescriptor, TripUpdate, trip_descriptor};
use crate::results::ValidationResult;
use crate::rules::{
    E003, E004, E016, E020, E021, E023, E024, E030, E031, E032, E033, E034, E035, W006, W009,
};

static START_TIME_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]|[0-9][0-9]):[0-5][0-9]:[0-5][0-9]$").expect("valid regex")
});

/// E003, E004, E016, E020, E021, E023, E024, E035 and W006, W009 for trip
/// descriptors; E030 through E035 for alerts.
#[derive(Debug, Default)]
pub struct TripDescriptorValidator;

impl FeedValidator for TripDescriptorValidator {
    fn name(&self) -> &'static str {
        "trip_descriptor"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        for entity in &ctx.feed.entity {
            if let Some(trip_update) = &entity.trip_update {
                let label = trip_update_label(entity, trip_update);
                check_trip(ctx, &mut result, &trip_update.trip, &label);
                check_trip_update(&mut result, entity, trip_update, &label);
            }

            if let Some(vehicle) = &entity.vehicle {
                if let Some(trip) = &vehicle.trip {
                    let label = vehicle_label(entity, vehicle);
                    check_trip(ctx, &mut result, trip, &label);
                }
            }

            if let Some(alert) = &entity.alert {
                check_alert(ctx, &mut result, entity, alert);
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

fn is_added(trip: &TripDescriptor) -> bool {
    trip.schedule_relationship == Some(trip_descriptor::ScheduleRelationship::Added as i32)
}

/// Valid when the date has exactly eight digits and exists in the calendar.
fn is_valid_start_date(date: &str) -> bool {
    date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
}

fn check_trip(ctx: &ValidationContext, result: &mut ValidationResult, trip: &TripDescriptor, label: &str) {
    let added = is_added(trip);

    if let Some(start_time) = trip.start_time.as_deref() {
        if !START_TIME_FORMAT.is_match(start_time) {
            result.add(&E020, format!("{label} start_time {start_time}"));
        }
    }
    if let Some(start_date) = trip.start_date.as_deref() {
        if !is_valid_start_date(start_date) {
            result.add(&E021, format!("{label} start_date {start_date}"));
        }
    }

    if let Some(route_id) = route_id(trip) {
        if ctx.gtfs.route(route_id).is_none() {
            result.add(&E004, format!("{label} route_id {route_id}"));
        }
    }

    let Some(trip_id) = trip_id(trip) else {
        return;
    };
    let Some(static_trip) = ctx.gtfs.trip(trip_id) else {
        if !added {
            result.add(&E003, label);
        }
        return;
    };

    if added {
        result.add(&E016, label);
        return;
    }

    if let Some(route_id) = route_id(trip) {
        if static_trip.route_id != route_id {
            result.add(&E035, format!("{label} route_id {route_id}"));
        }
    }

    if let Some(direction_id) = trip.direction_id {
        if static_trip.direction_id != Some(direction_id) {
            result.add(&E024, format!("{label} direction_id {direction_id}"));
        }
    }

    // frequency-based trips start at any headway
    if ctx.gtfs.is_frequency_based(trip_id) {
        return;
    }
    if let Some(start_time) = trip.start_time.as_deref() {
        let scheduled = ctx
            .gtfs
            .stop_times(trip_id)
            .first()
            .and_then(|first| first.arrival_time.or(first.departure_time));
        if let (Some(start), Some(scheduled)) = (parse_time(start_time), scheduled) {
            if start != scheduled {
                result.add(
                    &E023,
                    format!("{label} start_time {start_time} (scheduled {})", format_time(scheduled)),
                );
            }
        }
    }
}

fn check_trip_update(
    result: &mut ValidationResult,
    entity: &FeedEntity,
    trip_update: &TripUpdate,
    label: &str,
) {
    if trip_id(&trip_update.trip).is_none() {
        result.add(&W006, format!("entity ID {}", entity.id));
    }

    let missing_relationship = trip_update.trip.schedule_relationship.is_none()
        || trip_update
            .stop_time_update
            .iter()
            .any(|update| update.schedule_relationship.is_none());
    if missing_relationship {
        result.add(&W009, label);
    }
}

fn has_specifier(informed: &EntitySelector) -> bool {
    non_empty(informed.agency_id.as_deref()).is_some()
        || non_empty(informed.route_id.as_deref()).is_some()
        || informed.route_type.is_some()
        || non_empty(informed.stop_id.as_deref()).is_some()
        || informed
            .trip
            .as_ref()
            .is_some_and(|trip| trip_id(trip).is_some() || route_id(trip).is_some())
}

fn check_alert(ctx: &ValidationContext, result: &mut ValidationResult, entity: &FeedEntity, alert: &Alert) {
    let label = format!("alert entity ID {}", entity.id);
    if alert.informed_entity.is_empty() {
        result.add(&E032, label.as_str());
    }

    for (index, informed) in alert.informed_entity.iter().enumerate() {
        let informed_label = format!("{label} informed_entity #{}", index + 1);
        if !has_specifier(informed) {
            result.add(&E033, informed_label.as_str());
        }

        if let Some(agency_id) = non_empty(informed.agency_id.as_deref()) {
            if !ctx.gtfs.has_agency(agency_id) {
                result.add(&E034, format!("{informed_label} agency_id {agency_id}"));
            }
        }

        let Some(trip) = &informed.trip else {
            continue;
        };
        let informed_route = non_empty(informed.route_id.as_deref());

        if let (Some(informed_route), Some(trip_route)) = (informed_route, route_id(trip)) {
            if informed_route != trip_route {
                result.add(&E031, format!("{informed_label} route_id {informed_route}"));
            }
        }

        let Some(static_trip) = trip_id(trip).and_then(|trip_id| ctx.gtfs.trip(trip_id)) else {
            continue;
        };
        if let Some(informed_route) = informed_route {
            if static_trip.route_id != informed_route {
                result.add(&E030, format!("{informed_label} trip_id {}", static_trip.trip_id));
            }
        }
        if let Some(trip_route) = route_id(trip) {
            if static_trip.route_id != trip_route {
                result.add(&E035, format!("{informed_label} trip_id {}", static_trip.trip_id));
            }
        }
    }
}

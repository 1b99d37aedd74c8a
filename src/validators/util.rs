//! Helpers shared by the rule families: labels for occurrence prefixes and
//! small predicates over feed messages.

use regex::Regex;
use std::sync::LazyLock;

use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use crate::gtfs_rt::{Alert, FeedEntity, FeedMessage, TripDescriptor, TripUpdate, VehiclePosition, alert};

static VERSION_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)$").expect("valid regex"));

/// Parses `"{major}.{minor}"`.
pub fn parse_version(version: &str) -> Option<(u32, u32)> {
    let caps = VERSION_FORMAT.captures(version.trim())?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// True for `gtfs_realtime_version` 2.0 and later.
pub fn is_v2_or_later(version: &str) -> bool {
    parse_version(version).is_some_and(|(major, _)| major >= 2)
}

/// A timestamp of zero counts as not populated.
pub fn populated(timestamp: Option<u64>) -> Option<u64> {
    timestamp.filter(|&t| t != 0)
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub fn trip_id(trip: &TripDescriptor) -> Option<&str> {
    non_empty(trip.trip_id.as_deref())
}

pub fn route_id(trip: &TripDescriptor) -> Option<&str> {
    non_empty(trip.route_id.as_deref())
}

pub fn vehicle_id_of_trip_update(trip_update: &TripUpdate) -> Option<&str> {
    non_empty(trip_update.vehicle.as_ref().and_then(|v| v.id.as_deref()))
}

pub fn vehicle_id_of_position(vehicle: &VehiclePosition) -> Option<&str> {
    non_empty(vehicle.vehicle.as_ref().and_then(|v| v.id.as_deref()))
}

/// `trip_id 1.1`, or the entity id when the trip has none.
pub fn trip_update_label(entity: &FeedEntity, trip_update: &TripUpdate) -> String {
    match trip_id(&trip_update.trip) {
        Some(id) => format!("trip_id {id}"),
        None => format!("entity ID {}", entity.id),
    }
}

/// `vehicle_id 44`, falling back to the trip and then the entity id.
pub fn vehicle_label(entity: &FeedEntity, vehicle: &VehiclePosition) -> String {
    if let Some(id) = vehicle_id_of_position(vehicle) {
        return format!("vehicle_id {id}");
    }
    match vehicle.trip.as_ref().and_then(trip_id) {
        Some(id) => format!("vehicle for trip_id {id}"),
        None => format!("vehicle entity ID {}", entity.id),
    }
}

/// `stop_sequence 3 (stop_id 101)`; position in the list when neither is set.
pub fn stop_time_update_label(index: usize, stop_time_update: &StopTimeUpdate) -> String {
    let stop_id = non_empty(stop_time_update.stop_id.as_deref());
    match (stop_time_update.stop_sequence, stop_id) {
        (Some(seq), Some(stop_id)) => format!("stop_sequence {seq} (stop_id {stop_id})"),
        (Some(seq), None) => format!("stop_sequence {seq}"),
        (None, Some(stop_id)) => format!("stop_id {stop_id}"),
        (None, None) => format!("stop_time_update #{}", index + 1),
    }
}

/// Absolute time of an arrival or departure, when given.
pub fn event_time(event: Option<&StopTimeEvent>) -> Option<i64> {
    event.and_then(|e| e.time)
}

/// `2m 5s`, `1h 0m 3s`, `45s`.
pub fn format_duration(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// An alert without active periods is always active. Open-ended periods
/// (start or end unset or zero) are unbounded on that side.
pub fn is_alert_active(alert: &Alert, now_secs: u64) -> bool {
    alert.active_period.is_empty()
        || alert.active_period.iter().any(|period| {
            populated(period.start).is_none_or(|start| start <= now_secs)
                && populated(period.end).is_none_or(|end| now_secs <= end)
        })
}

/// Whether an active DETOUR alert informs `trip_id` or `route_id`.
pub fn has_active_detour(
    feed: &FeedMessage,
    now_secs: u64,
    trip_id: &str,
    route_id: Option<&str>,
) -> bool {
    feed.entity
        .iter()
        .filter_map(|entity| entity.alert.as_ref())
        .filter(|a| a.effect() == alert::Effect::Detour && is_alert_active(a, now_secs))
        .flat_map(|a| &a.informed_entity)
        .any(|informed| {
            let informed_trip = informed.trip.as_ref();
            let names_trip = informed_trip.and_then(self::trip_id) == Some(trip_id);
            let names_route = route_id.is_some_and(|route_id| {
                non_empty(informed.route_id.as_deref()) == Some(route_id)
                    || informed_trip.and_then(self::route_id) == Some(route_id)
            });
            names_trip || names_route
        })
}

//! Shared fixtures: a small Bull Runner-style schedule around the USF campus
//! in Tampa, and builders for feed messages.

use std::sync::Arc;

use crate::config::ValidatorConfig;
use crate::context::ValidationContext;
use crate::gtfs::{
    Agency, Frequency, GtfsDataset, GtfsTables, Route, ShapePoint, Stop, StopTime, Trip,
};
use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use crate::gtfs_rt::{
    Alert, FeedEntity, FeedHeader, FeedMessage, Position, TripDescriptor, TripUpdate,
    VehicleDescriptor, VehiclePosition, feed_header, trip_descriptor,
};
use crate::metadata::GtfsMetadata;

pub const NOW_SECS: u64 = 1_700_000_000;
pub const NOW_MILLIS: u64 = NOW_SECS * 1000;

pub const USF_CAMPUS: (f64, f64) = (28.0587, -82.4139);
pub const UNIVERSITY_MALL: (f64, f64) = (28.0574, -82.4348);

fn stop(stop_id: &str, lat: f64, lon: f64) -> Stop {
    Stop {
        stop_id: stop_id.into(),
        stop_lat: Some(lat),
        stop_lon: Some(lon),
        location_type: None,
        parent_station: None,
    }
}

pub fn stop_time(trip_id: &str, stop_id: &str, stop_sequence: u32, time: Option<u32>) -> StopTime {
    StopTime {
        trip_id: trip_id.into(),
        arrival_time: time,
        departure_time: time,
        stop_id: stop_id.into(),
        stop_sequence,
        timepoint: None,
    }
}

fn trip(trip_id: &str, route_id: &str, direction_id: u32, shape_id: Option<&str>) -> Trip {
    Trip {
        trip_id: trip_id.into(),
        route_id: route_id.into(),
        service_id: Some("WKD".into()),
        direction_id: Some(direction_id),
        shape_id: shape_id.map(Into::into),
    }
}

fn shape(shape_id: &str, points: &[(f64, f64)]) -> Vec<ShapePoint> {
    points
        .iter()
        .zip(1..)
        .map(|(&(lat, lon), seq)| ShapePoint {
            shape_id: shape_id.into(),
            shape_pt_lat: lat,
            shape_pt_lon: lon,
            shape_pt_sequence: seq,
        })
        .collect()
}

/// Raw tables behind [`bull_runner_gtfs`], for tests that need to tweak them.
///
/// Trips:
/// - `1`, `1.1`: route A, stops 101 → 102 → 103, shape `shpA`
/// - `2`: route C, stops 101 → 102, shape `shpC` through the middle of campus
/// - `loop`: route D, visits stop 101 twice, no shape
/// - `freq0`: route A, frequencies.txt with exact_times=0
/// - `freq1`: route A, frequencies.txt with exact_times=1, 15 minute headway
pub fn bull_runner_tables() -> GtfsTables {
    let h = |hours: u32, minutes: u32| Some(hours * 3600 + minutes * 60);

    let mut shapes = shape(
        "shpA",
        &[(28.0595, -82.4122), (28.0638, -82.4136), (28.0590, -82.4070)],
    );
    shapes.extend(shape(
        "shpC",
        &[(28.0540, -82.4130), USF_CAMPUS, (28.0640, -82.4145)],
    ));

    GtfsTables {
        agencies: vec![Agency {
            agency_id: Some("USF".into()),
            agency_name: "USF Bull Runner".into(),
            agency_timezone: "America/New_York".into(),
        }],
        routes: ["A", "C", "D"]
            .into_iter()
            .map(|route_id| Route {
                route_id: route_id.into(),
                agency_id: Some("USF".into()),
                route_type: Some(3),
            })
            .collect(),
        trips: vec![
            trip("1", "A", 0, Some("shpA")),
            trip("1.1", "A", 0, Some("shpA")),
            trip("2", "C", 1, Some("shpC")),
            trip("loop", "D", 0, None),
            trip("freq0", "A", 0, Some("shpA")),
            trip("freq1", "A", 0, Some("shpA")),
        ],
        stops: vec![
            stop("101", 28.0595, -82.4122),
            stop("102", 28.0638, -82.4136),
            stop("103", 28.0590, -82.4070),
            stop("104", UNIVERSITY_MALL.0, UNIVERSITY_MALL.1),
            Stop {
                location_type: Some(1),
                ..stop("STATION", 28.0600, -82.4130)
            },
        ],
        stop_times: vec![
            stop_time("1", "101", 1, h(7, 0)),
            stop_time("1", "102", 2, h(7, 5)),
            stop_time("1", "103", 3, h(7, 10)),
            stop_time("1.1", "101", 1, h(8, 0)),
            stop_time("1.1", "102", 2, h(8, 5)),
            stop_time("1.1", "103", 3, h(8, 10)),
            stop_time("2", "101", 1, h(8, 0)),
            stop_time("2", "102", 2, h(8, 10)),
            stop_time("loop", "101", 1, h(9, 0)),
            stop_time("loop", "102", 2, h(9, 5)),
            stop_time("loop", "101", 3, h(9, 10)),
            stop_time("freq0", "101", 1, h(0, 0)),
            stop_time("freq0", "102", 2, h(0, 5)),
            stop_time("freq1", "101", 1, h(0, 0)),
            stop_time("freq1", "102", 2, h(0, 5)),
        ],
        shapes,
        frequencies: vec![
            Frequency {
                trip_id: "freq0".into(),
                start_time: 6 * 3600,
                end_time: 10 * 3600,
                headway_secs: 600,
                exact_times: Some(0),
            },
            Frequency {
                trip_id: "freq1".into(),
                start_time: 6 * 3600,
                end_time: 10 * 3600,
                headway_secs: 900,
                exact_times: Some(1),
            },
        ],
    }
}

pub fn bull_runner_gtfs() -> GtfsDataset {
    GtfsDataset::from(bull_runner_tables())
}

/// A context over the Bull Runner schedule at [`NOW_MILLIS`].
pub fn context(feed: FeedMessage) -> ValidationContext {
    context_with_gtfs(feed, bull_runner_gtfs())
}

pub fn context_with_gtfs(feed: FeedMessage, gtfs: GtfsDataset) -> ValidationContext {
    let config = ValidatorConfig::default();
    let metadata = GtfsMetadata::new(&gtfs, &config);
    ValidationContext::new(
        NOW_MILLIS,
        Arc::new(feed),
        Arc::new(gtfs),
        Arc::new(metadata),
    )
}

pub fn feed(version: &str, timestamp: Option<u64>, entity: Vec<FeedEntity>) -> FeedMessage {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: version.into(),
            incrementality: Some(feed_header::Incrementality::FullDataset as i32),
            timestamp,
            feed_version: None,
        },
        entity,
    }
}

/// A SCHEDULED trip descriptor for `trip_id`.
pub fn trip_descriptor(trip_id: &str) -> TripDescriptor {
    TripDescriptor {
        trip_id: Some(trip_id.into()),
        schedule_relationship: Some(trip_descriptor::ScheduleRelationship::Scheduled as i32),
        ..Default::default()
    }
}

pub fn vehicle_descriptor(id: &str) -> VehicleDescriptor {
    VehicleDescriptor {
        id: Some(id.into()),
        ..Default::default()
    }
}

pub fn event_time(time: i64) -> StopTimeEvent {
    StopTimeEvent {
        time: Some(time),
        ..Default::default()
    }
}

pub fn event_delay(delay: i32) -> StopTimeEvent {
    StopTimeEvent {
        delay: Some(delay),
        ..Default::default()
    }
}

/// A SCHEDULED stop_time_update with an arrival time.
pub fn stop_time_update(
    stop_sequence: Option<u32>,
    stop_id: Option<&str>,
    arrival: Option<i64>,
) -> StopTimeUpdate {
    StopTimeUpdate {
        stop_sequence,
        stop_id: stop_id.map(Into::into),
        arrival: arrival.map(event_time),
        schedule_relationship: Some(
            crate::gtfs_rt::trip_update::stop_time_update::ScheduleRelationship::Scheduled as i32,
        ),
        ..Default::default()
    }
}

pub fn trip_update_entity(id: &str, trip_update: TripUpdate) -> FeedEntity {
    FeedEntity {
        id: id.into(),
        trip_update: Some(trip_update),
        ..Default::default()
    }
}

pub fn trip_update(
    trip_id: &str,
    vehicle_id: Option<&str>,
    stop_time_update: Vec<StopTimeUpdate>,
    timestamp: Option<u64>,
) -> TripUpdate {
    TripUpdate {
        trip: trip_descriptor(trip_id),
        vehicle: vehicle_id.map(vehicle_descriptor),
        stop_time_update,
        timestamp,
        ..Default::default()
    }
}

pub fn vehicle_entity(id: &str, vehicle: VehiclePosition) -> FeedEntity {
    FeedEntity {
        id: id.into(),
        vehicle: Some(vehicle),
        ..Default::default()
    }
}

pub fn vehicle_position(
    trip_id: Option<&str>,
    vehicle_id: Option<&str>,
    position: Option<(f32, f32)>,
    timestamp: Option<u64>,
) -> VehiclePosition {
    VehiclePosition {
        trip: trip_id.map(trip_descriptor),
        vehicle: vehicle_id.map(vehicle_descriptor),
        position: position.map(|(latitude, longitude)| Position {
            latitude,
            longitude,
            ..Default::default()
        }),
        timestamp,
        ..Default::default()
    }
}

pub fn alert_entity(id: &str, alert: Alert) -> FeedEntity {
    FeedEntity {
        id: id.into(),
        alert: Some(alert),
        ..Default::default()
    }
}

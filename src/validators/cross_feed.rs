//! trip_id / vehicle_id pairing between the TripUpdates and the
//! VehiclePositions of one feed message.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::FeedValidator;
use super::util::{trip_id, vehicle_id_of_position, vehicle_id_of_trip_update};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs_rt::FeedMessage;
use crate::results::ValidationResult;
use crate::rules::{E047, W003};

/// W003 and E047.
#[derive(Debug, Default)]
pub struct CrossFeedDescriptorValidator;

/// Both directions of the trip_id ↔ vehicle_id pairing seen in one entity type.
///
/// Only pairs with two non-empty ids are indexed. On duplicate keys the first
/// pair in feed order wins, so a repeated trip or vehicle never displaces the
/// pairing it was first seen with.
#[derive(Debug, Default)]
struct PairIndex<'a> {
    pairs: Vec<(&'a str, &'a str)>,
    vehicle_by_trip: HashMap<&'a str, &'a str>,
    trip_by_vehicle: HashMap<&'a str, &'a str>,
}

impl<'a> PairIndex<'a> {
    fn insert(&mut self, trip_id: &'a str, vehicle_id: &'a str) {
        self.pairs.push((trip_id, vehicle_id));
        self.vehicle_by_trip.entry(trip_id).or_insert(vehicle_id);
        self.trip_by_vehicle.entry(vehicle_id).or_insert(trip_id);
    }

    fn from_trip_updates(feed: &'a FeedMessage) -> Self {
        let mut index = Self::default();
        for trip_update in feed.entity.iter().filter_map(|e| e.trip_update.as_ref()) {
            if let (Some(trip_id), Some(vehicle_id)) =
                (trip_id(&trip_update.trip), vehicle_id_of_trip_update(trip_update))
            {
                index.insert(trip_id, vehicle_id);
            }
        }
        index
    }

    fn from_vehicle_positions(feed: &'a FeedMessage) -> Self {
        let mut index = Self::default();
        for vehicle in feed.entity.iter().filter_map(|e| e.vehicle.as_ref()) {
            let trip_id = vehicle.trip.as_ref().and_then(trip_id);
            if let (Some(trip_id), Some(vehicle_id)) = (trip_id, vehicle_id_of_position(vehicle)) {
                index.insert(trip_id, vehicle_id);
            }
        }
        index
    }
}

/// W003: one occurrence per id of `this` that `other` never mentions.
fn report_missing(result: &mut ValidationResult, this: &PairIndex, other: &PairIndex, source: &str) {
    let mut reported = HashSet::new();
    for &(trip_id, vehicle_id) in &this.pairs {
        if !other.vehicle_by_trip.contains_key(trip_id) && reported.insert(("trip_id", trip_id)) {
            result.add(&W003, format!("trip_id {trip_id} in {source}"));
        }
        if !other.trip_by_vehicle.contains_key(vehicle_id)
            && reported.insert(("vehicle_id", vehicle_id))
        {
            result.add(&W003, format!("vehicle_id {vehicle_id} in {source}"));
        }
    }
}

impl FeedValidator for CrossFeedDescriptorValidator {
    fn name(&self) -> &'static str {
        "cross_feed_descriptor"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        let has_trip_updates = ctx.feed.entity.iter().any(|e| e.trip_update.is_some());
        let has_vehicles = ctx.feed.entity.iter().any(|e| e.vehicle.is_some());
        if !has_trip_updates || !has_vehicles {
            return Ok(result);
        }

        let trip_updates = PairIndex::from_trip_updates(&ctx.feed);
        let vehicles = PairIndex::from_vehicle_positions(&ctx.feed);

        report_missing(&mut result, &trip_updates, &vehicles, "TripUpdates");
        report_missing(&mut result, &vehicles, &trip_updates, "VehiclePositions");

        for &(trip_id, vehicle_id) in &trip_updates.pairs {
            let vehicle_differs = vehicles
                .vehicle_by_trip
                .get(trip_id)
                .is_some_and(|&other| other != vehicle_id);
            let trip_differs = vehicles
                .trip_by_vehicle
                .get(vehicle_id)
                .is_some_and(|&other| other != trip_id);
            if vehicle_differs || trip_differs {
                result.add(
                    &E047,
                    format!("trip_id {trip_id} and vehicle_id {vehicle_id} in TripUpdates"),
                );
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

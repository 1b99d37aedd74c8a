//! Read-only, id-indexed view of a static GTFS dataset.

mod loader;
mod objects;

pub use loader::{load, load_dir, load_zip};
pub use objects::{
    Agency, Frequency, Route, ShapePoint, Stop, StopTime, Trip, format_time, parse_time,
};

use std::collections::HashMap;

/// The raw tables, as read from the CSV files.
#[derive(Debug, Clone, Default)]
pub struct GtfsTables {
    pub agencies: Vec<Agency>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stops: Vec<Stop>,
    pub stop_times: Vec<StopTime>,
    pub shapes: Vec<ShapePoint>,
    pub frequencies: Vec<Frequency>,
}

/// Static schedule data indexed for lookup by the validators.
#[derive(Debug, Default)]
pub struct GtfsDataset {
    agencies: Vec<Agency>,
    routes: HashMap<String, Route>,
    trips: HashMap<String, Trip>,
    stops: HashMap<String, Stop>,
    stop_times: HashMap<String, Vec<StopTime>>,
    shapes: HashMap<String, Vec<ShapePoint>>,
    frequencies: HashMap<String, Vec<Frequency>>,
}

impl From<GtfsTables> for GtfsDataset {
    fn from(tables: GtfsTables) -> Self {
        let GtfsTables {
            agencies,
            routes,
            trips,
            stops,
            stop_times,
            shapes,
            frequencies,
        } = tables;

        let mut stop_times_map: HashMap<String, Vec<StopTime>> = HashMap::new();
        for stop_time in stop_times {
            stop_times_map
                .entry(stop_time.trip_id.clone())
                .or_default()
                .push(stop_time);
        }
        for trip_stop_times in stop_times_map.values_mut() {
            trip_stop_times.sort_by_key(|st| st.stop_sequence);
        }

        let mut shapes_map: HashMap<String, Vec<ShapePoint>> = HashMap::new();
        for point in shapes {
            shapes_map
                .entry(point.shape_id.clone())
                .or_default()
                .push(point);
        }
        for points in shapes_map.values_mut() {
            points.sort_by_key(|p| p.shape_pt_sequence);
        }

        let mut frequencies_map: HashMap<String, Vec<Frequency>> = HashMap::new();
        for frequency in frequencies {
            frequencies_map
                .entry(frequency.trip_id.clone())
                .or_default()
                .push(frequency);
        }

        Self {
            agencies,
            routes: routes.into_iter().map(|r| (r.route_id.clone(), r)).collect(),
            trips: trips.into_iter().map(|t| (t.trip_id.clone(), t)).collect(),
            stops: stops.into_iter().map(|s| (s.stop_id.clone(), s)).collect(),
            stop_times: stop_times_map,
            shapes: shapes_map,
            frequencies: frequencies_map,
        }
    }
}

impl GtfsDataset {
    pub fn agencies(&self) -> &[Agency] {
        &self.agencies
    }

    pub fn has_agency(&self, agency_id: &str) -> bool {
        self.agencies
            .iter()
            .any(|a| a.agency_id.as_deref() == Some(agency_id))
    }

    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.get(route_id)
    }

    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips.get(trip_id)
    }

    pub fn stop(&self, stop_id: &str) -> Option<&Stop> {
        self.stops.get(stop_id)
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    /// Stop times of a trip, ordered by stop_sequence. Empty for unknown trips.
    pub fn stop_times(&self, trip_id: &str) -> &[StopTime] {
        self.stop_times.get(trip_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_stop_times(&self) -> impl Iterator<Item = &StopTime> {
        self.stop_times.values().flatten()
    }

    /// Shape points ordered by shape_pt_sequence. Empty for unknown shapes.
    pub fn shape_points(&self, shape_id: &str) -> &[ShapePoint] {
        self.shapes.get(shape_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_shapes(&self) -> bool {
        !self.shapes.is_empty()
    }

    pub fn frequencies(&self, trip_id: &str) -> &[Frequency] {
        self.frequencies.get(trip_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_frequency_based(&self, trip_id: &str) -> bool {
        self.frequencies.contains_key(trip_id)
    }

    /// True when the trip's stop_times reference some stop_id more than once.
    pub fn visits_stop_more_than_once(&self, trip_id: &str) -> bool {
        let stop_times = self.stop_times(trip_id);
        stop_times
            .iter()
            .enumerate()
            .any(|(i, st)| stop_times[..i].iter().any(|prev| prev.stop_id == st.stop_id))
    }
}

//! The rule catalog.
//!
//! Every rule is a `static` so results can key on `&'static ValidationRule`
//! without copying catalog text. The catalog is built at compile time and
//! never changes.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

/// A single rule: identifier, severity and the text used to render its occurrences.
#[derive(Debug, Serialize)]
pub struct ValidationRule {
    pub id: &'static str,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub occurrence_suffix: &'static str,
}

impl PartialEq for ValidationRule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValidationRule {}

impl Hash for ValidationRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ValidationRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValidationRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(other.id)
    }
}

macro_rules! rules {
    ($($name:ident => $severity:ident, $title:expr, $description:expr, $suffix:expr;)+) => {
        $(
            pub static $name: ValidationRule = ValidationRule {
                id: stringify!($name),
                severity: Severity::$severity,
                title: $title,
                description: $description,
                occurrence_suffix: $suffix,
            };
        )+

        /// Every rule, ordered by id.
        pub static ALL_RULES: &[&ValidationRule] = &[$(&$name),+];
    };
}

rules! {
    E001 => Error, "Not in POSIX time",
        "All timestamps must be in POSIX time (i.e., number of seconds since January 1st 1970 00:00:00 UTC)",
        " is not POSIX time";
    E002 => Error, "stop_time_updates not strictly sorted",
        "stop_time_updates for a given trip_id must be strictly ordered by stop_sequence",
        " is not strictly sorted by increasing stop_sequence";
    E003 => Error, "GTFS-rt trip_id does not exist in GTFS data",
        "All trip_ids provided in the GTFS-rt feed must exist in the GTFS data, unless the schedule_relationship is ADDED",
        " does not exist in the GTFS trips.txt";
    E004 => Error, "GTFS-rt route_id does not exist in GTFS data",
        "All route_ids provided in the GTFS-rt feed must exist in the GTFS data",
        " does not exist in the GTFS routes.txt";
    E006 => Error, "Missing required trip field for frequency-based exact_times = 0",
        "Frequency-based exact_times=0 trip_updates and vehicle positions must contain start_time and start_date",
        " is missing start_time or start_date for a frequency-based exact_times=0 trip";
    E009 => Error, "GTFS-rt stop_sequence isn't provided for trip that visits same stop_id more than once",
        "If a GTFS trip contains multiple references to the same stop_id, the GTFS-rt stop_time_updates for that trip must contain stop_sequence",
        " visits the same stop_id more than once but the stop_time_updates do not provide stop_sequence";
    E010 => Error, "location_type not 0 in stops.txt",
        "If location_type is used in stops.txt, all stops referenced in stop_times.txt must have location_type of 0",
        " is referenced in stop_times.txt but does not have location_type 0";
    E011 => Error, "GTFS-rt stop_id does not exist in GTFS data",
        "All stop_ids referenced in GTFS-rt feeds must exist in GTFS stops.txt",
        " does not exist in the GTFS stops.txt";
    E012 => Error, "Header timestamp should be greater than or equal to all other timestamps",
        "No timestamps for individual entities (TripUpdate, VehiclePosition) in the feeds should be greater than the header timestamp",
        " is greater than the header timestamp";
    E013 => Error, "Frequency type 0 trip schedule_relationship should be UNSCHEDULED or empty",
        "For frequency-based exact_times=0 trips, schedule_relationship should be UNSCHEDULED or empty",
        " has a schedule_relationship other than UNSCHEDULED for a frequency-based exact_times=0 trip";
    E015 => Error, "All stop_ids referenced in GTFS-rt TripUpdates and VehiclePositions feeds must have the location_type = 0",
        "All stop_ids referenced in GTFS-rt TripUpdates and VehiclePositions feeds must have the location_type = 0 in GTFS stops.txt",
        " does not have location_type 0 in GTFS stops.txt";
    E016 => Error, "trip_ids with schedule_relationship ADDED must not be in GTFS data",
        "Trips that have a schedule_relationship of ADDED must not be included in the GTFS data",
        " has schedule_relationship ADDED but exists in the GTFS trips.txt";
    E017 => Error, "GTFS-rt content changed but has the same header timestamp",
        "The GTFS-rt header timestamp value should always change if the feed contents change",
        " is unchanged from the previous feed iteration but the feed contents changed";
    E018 => Error, "GTFS-rt header timestamp decreased between two sequential iterations",
        "The GTFS-rt header timestamp should be monotonically increasing",
        " is less than the header timestamp of the previous feed iteration";
    E019 => Error, "GTFS-rt frequency type 1 trip start_time must be a multiple of GTFS headway_secs later than GTFS start_time",
        "For frequency-based exact_times=1 trips, GTFS-rt trip start_time must be some multiple (including zero) of headway_secs later than the start_time in frequencies.txt",
        " is not a multiple of headway_secs later than the frequencies.txt start_time";
    E020 => Error, "Invalid start_time format",
        "start_time must be in the format 25:15:35",
        " does not use the HH:MM:SS format";
    E021 => Error, "Invalid start_date format",
        "start_date must be in the YYYYMMDD format",
        " does not use the YYYYMMDD format";
    E022 => Error, "Sequential stop_time_update times are not increasing",
        "stop_time_update arrival/departure times between sequential stops should always increase",
        " is earlier than the preceding stop_time_update";
    E023 => Error, "trip start_time does not match first GTFS arrival_time",
        "For normal scheduled trips (not defined in frequencies.txt), the GTFS-rt trip start_time must match the first GTFS arrival_time",
        " does not match the first arrival_time in GTFS stop_times.txt";
    E024 => Error, "trip direction_id does not match GTFS data",
        "GTFS-rt trip direction_id must match the direction_id in GTFS trips.txt",
        " does not match the GTFS trips.txt direction_id";
    E025 => Error, "stop_time_update departure time is before arrival time",
        "Within the same stop_time_update, arrival and departure times can be the same, or the departure time can be later than the arrival time",
        " has a departure time before its arrival time";
    E026 => Error, "Invalid vehicle position",
        "Vehicle position latitude must be between -90 and 90 and longitude between -180 and 180",
        " has an invalid latitude or longitude";
    E027 => Error, "Invalid vehicle bearing",
        "Vehicle bearing must be between 0 and 360 degrees",
        " has a bearing outside of 0 to 360 degrees";
    E028 => Error, "Vehicle position outside agency coverage area",
        "The vehicle position should be within the buffered bounding box of the GTFS stops.txt",
        " is outside the buffered agency coverage area";
    E029 => Error, "Vehicle position outside trip shape buffer",
        "The vehicle position should be within the buffer of the GTFS shapes.txt shape for the trip it is serving",
        " is outside the buffer of the trip shape";
    E030 => Error, "Alert trip_id does not belong to alert route_id",
        "An Alert informed_entity trip_id must belong to the informed_entity route_id in GTFS trips.txt",
        " does not belong to the informed_entity route_id in GTFS trips.txt";
    E031 => Error, "Alert informed_entity.route_id does not match informed_entity.trip.route_id",
        "The informed_entity route_id must match the informed_entity trip.route_id when both are provided",
        " does not match the informed_entity trip.route_id";
    E032 => Error, "Alert does not have an informed_entity",
        "All alerts must have at least one informed_entity",
        " does not have an informed_entity";
    E033 => Error, "Alert informed_entity does not have any specifiers",
        "Alert informed_entity should have at least one specifier among agency_id, route_id, route_type, trip or stop_id",
        " does not have any specifiers";
    E034 => Error, "GTFS-rt agency_id does not exist in GTFS data",
        "All agency_ids referenced in GTFS-rt feeds must exist in GTFS agency.txt",
        " does not exist in the GTFS agency.txt";
    E035 => Error, "GTFS-rt trip.trip_id does not belong to GTFS-rt trip.route_id in GTFS trips.txt",
        "The trip.route_id provided alongside a trip.trip_id must match the route_id of that trip in GTFS trips.txt",
        " does not belong to the trip.route_id in GTFS trips.txt";
    E036 => Error, "Sequential stop_time_updates have the same stop_sequence",
        "Sequential GTFS-rt trip stop_time_updates should never have the same stop_sequence",
        " has the same stop_sequence as the preceding stop_time_update";
    E037 => Error, "Sequential stop_time_updates have the same stop_id",
        "Sequential GTFS-rt trip stop_time_updates should never have the same stop_id",
        " has the same stop_id as the preceding stop_time_update";
    E038 => Error, "Invalid header.gtfs_realtime_version",
        "header.gtfs_realtime_version must be a supported version of the GTFS-rt specification",
        " is not a supported gtfs_realtime_version";
    E039 => Error, "FULL_DATASET feeds should not include entity.is_deleted",
        "The entity.is_deleted field should only be included in GTFS-rt feeds with header.incrementality of DIFFERENTIAL",
        " sets is_deleted in a FULL_DATASET feed";
    E040 => Error, "stop_time_update doesn't contain stop_id or stop_sequence",
        "All stop_time_updates must contain stop_id or stop_sequence",
        " does not contain stop_id or stop_sequence";
    E041 => Error, "trip doesn't have any stop_time_updates",
        "Each trip_update must contain at least one stop_time_update unless the trip is CANCELED",
        " does not have any stop_time_updates";
    E042 => Error, "arrival or departure provided for NO_DATA stop_time_update",
        "If a stop_time_update has a schedule_relationship of NO_DATA, then neither arrival nor departure should be provided",
        " has schedule_relationship NO_DATA but provides arrival or departure";
    E043 => Error, "stop_time_update doesn't have arrival or departure",
        "If a stop_time_update doesn't have a schedule_relationship of SKIPPED or NO_DATA, then either arrival or departure must be provided",
        " does not have arrival or departure";
    E044 => Error, "stop_time_update arrival/departure doesn't have delay or time",
        "stop_time_update.arrival and stop_time_update.departure must have either delay or time populated",
        " does not have delay or time";
    E045 => Error, "GTFS-rt stop_time_update stop_sequence and stop_id do not match GTFS",
        "If both stop_sequence and stop_id are provided in a stop_time_update, they must reference the same GTFS stop_times.txt record, in trip order",
        " does not match GTFS stop_times.txt for this trip";
    E046 => Error, "GTFS-rt stop_time_update without time doesn't have arrival/departure_time in GTFS",
        "If only delay is provided in a stop_time_update arrival or departure, then the GTFS stop_times.txt record must be a timepoint with the corresponding arrival_time or departure_time",
        " provides only delay but GTFS stop_times.txt has no exact scheduled time for it";
    E047 => Error, "VehiclePosition and TripUpdate ID pairing mismatch",
        "If separate VehiclePositions and TripUpdates describe the same trip and vehicle, the vehicle_id and trip_id pairing must match",
        " is paired differently in the VehiclePositions";
    E048 => Error, "header timestamp not populated (GTFS-rt v2.0 and higher)",
        "timestamp must be populated in FeedHeader for gtfs_realtime_version 2.0 and higher",
        " timestamp is not populated";
    E049 => Error, "header incrementality not populated (GTFS-rt v2.0 and higher)",
        "incrementality must be populated in FeedHeader for gtfs_realtime_version 2.0 and higher",
        " incrementality is not populated";
    E050 => Error, "timestamp is in the future",
        "All timestamps must be less than the current time, allowing for a small tolerance of clock skew",
        " is in the future";
    E051 => Error, "GTFS-rt stop_sequence not found in GTFS data",
        "All stop_sequence values in GTFS-rt stop_time_updates must exist in GTFS stop_times.txt for that trip",
        " does not exist in GTFS stop_times.txt for this trip";
    E052 => Error, "vehicle.id is not unique",
        "Each vehicle.id in VehiclePositions should be unique within a feed message",
        " is used by more than one vehicle position";
    W001 => Warning, "timestamp not populated",
        "Timestamps should be populated for the FeedHeader, TripUpdates and VehiclePositions",
        " timestamp is not populated";
    W002 => Warning, "vehicle_id not populated",
        "vehicle_id should be provided in TripUpdates and VehiclePositions",
        " does not have a vehicle_id";
    W003 => Warning, "ID in one feed missing from the other",
        "trip_ids and vehicle_ids should appear in both the TripUpdates and the VehiclePositions",
        " does not appear in the other entity type";
    W004 => Warning, "vehicle speed is unrealistic",
        "Vehicle speed should be positive and less than a realistic maximum",
        " has an unrealistic speed";
    W005 => Warning, "Missing vehicle_id in trip_update for frequency-based exact_times = 0",
        "Frequency-based exact_times=0 trip_updates should contain a vehicle_id",
        " does not have a vehicle_id for a frequency-based exact_times=0 trip";
    W006 => Warning, "trip_update missing trip_id",
        "trip_updates should include a trip_id",
        " does not have a trip_id";
    W007 => Warning, "Refresh interval is more than 35 seconds",
        "GTFS-rt feeds should be refreshed at least every 30 seconds",
        " is too far from the previous header timestamp";
    W008 => Warning, "Header timestamp is older than 65 seconds",
        "The data in a GTFS-rt feed should always be less than one minute old",
        " is too old";
    W009 => Warning, "schedule_relationship not populated",
        "trip.schedule_relationship and stop_time_update.schedule_relationship should be populated",
        " does not have schedule_relationship populated";
}

static RULES_BY_ID: LazyLock<HashMap<&'static str, &'static ValidationRule>> =
    LazyLock::new(|| ALL_RULES.iter().map(|rule| (rule.id, *rule)).collect());

/// Looks up a rule by its identifier, e.g. `"E002"`.
pub fn find(id: &str) -> Option<&'static ValidationRule> {
    RULES_BY_ID.get(id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique_and_sorted() {
        let ids: Vec<_> = ALL_RULES.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_find() {
        let rule = find("E029").unwrap();
        assert_eq!(rule.severity, Severity::Error);
        assert_eq!(rule, &E029);
        assert_eq!(find("W009").unwrap().severity, Severity::Warning);
        assert!(find("E999").is_none());
    }

    #[test]
    fn test_rules_compare_by_id() {
        assert!(E002 < E010);
        assert!(E052 < W001);
        assert_ne!(E001, E002);
    }
}

//! Rows of the static GTFS tables the validators consult.

use serde::Deserialize;
use serde::de::{self, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Agency {
    #[serde(default)]
    pub agency_id: Option<String>,
    pub agency_name: String,
    pub agency_timezone: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Route {
    pub route_id: String,
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub route_type: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub direction_id: Option<u32>,
    #[serde(default)]
    pub shape_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_float")]
    pub stop_lat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_float")]
    pub stop_lon: Option<f64>,
    /// 0 (or empty) for a stop or platform, 1 station, 2 entrance, 3 generic node, 4 boarding area.
    #[serde(default)]
    pub location_type: Option<u32>,
    #[serde(default)]
    pub parent_station: Option<String>,
}

impl Stop {
    pub fn is_stop_or_platform(&self) -> bool {
        self.location_type.unwrap_or(0) == 0
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.stop_lat?, self.stop_lon?))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub arrival_time: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub departure_time: Option<u32>,
    pub stop_id: String,
    pub stop_sequence: u32,
    #[serde(default)]
    pub timepoint: Option<u8>,
}

impl StopTime {
    /// `timepoint=0` marks approximate times. An unset column means exact
    /// times when arrival and departure are given.
    pub fn is_approximate(&self) -> bool {
        self.timepoint == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapePoint {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Frequency {
    pub trip_id: String,
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: u32,
    #[serde(deserialize_with = "deserialize_time")]
    pub end_time: u32,
    pub headway_secs: u32,
    #[serde(default)]
    pub exact_times: Option<u8>,
}

impl Frequency {
    /// `exact_times=1`: schedule-based trips that run at fixed headways.
    pub fn is_exact_times(&self) -> bool {
        self.exact_times == Some(1)
    }
}

/// Parses a GTFS time (`H:MM:SS` or `HH:MM:SS`, hours may exceed 23) into
/// seconds after midnight.
pub fn parse_time(s: &str) -> Option<u32> {
    let mut parts = s.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)
}

pub fn format_time(time: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time / 3600,
        time % 3600 / 60,
        time % 60
    )
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_time(&s).ok_or_else(|| de::Error::custom(format!("invalid time: {s}")))
}

fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) => parse_time(t)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid time: {t}"))),
    }
}

fn deserialize_optional_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(f) => f.parse().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("8:00:00"), Some(8 * 3600));
        assert_eq!(parse_time("08:05:09"), Some(8 * 3600 + 5 * 60 + 9));
        assert_eq!(parse_time("25:30:00"), Some(25 * 3600 + 30 * 60));
        assert_eq!(parse_time("08:60:00"), None);
        assert_eq!(parse_time("08:00"), None);
        assert_eq!(parse_time("abc"), None);
    }

    #[test]
    fn test_parse_time_hours_overflow() {
        assert_eq!(parse_time("9999999:00:00"), None);
        assert_eq!(parse_time("1193046:28:15"), Some(u32::MAX));
        assert_eq!(parse_time("1193046:28:16"), None);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(8 * 3600 + 5 * 60 + 9), "08:05:09");
        assert_eq!(format_time(25 * 3600), "25:00:00");
    }

    #[test]
    fn test_stop_location_type_defaults_to_stop() {
        let stop = Stop {
            stop_id: "A".into(),
            stop_lat: Some(1.0),
            stop_lon: None,
            location_type: None,
            parent_station: None,
        };
        assert!(stop.is_stop_or_platform());
        assert_eq!(stop.coordinates(), None);
    }
}

//! Reference data derived once from the static GTFS dataset: coverage boxes,
//! per-trip shape buffers and the agency timezone.

use chrono::DateTime;
use chrono_tz::Tz;
use geo::Rect;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ValidatorConfig;
use crate::geometry::{ShapeBuffer, bounding_box, buffer_rect, rect_contains};
use crate::gtfs::GtfsDataset;

/// Immutable after construction; share it behind an `Arc` across feed
/// iterations and rebuild only when the static data or `ignore_shapes` changes.
#[derive(Debug, Default)]
pub struct GtfsMetadata {
    stop_bounds: Option<Rect>,
    stop_bounds_buffered: Option<Rect>,
    shape_bounds: Option<Rect>,
    shape_bounds_buffered: Option<Rect>,
    trip_shapes: HashMap<String, Arc<ShapeBuffer>>,
    timezone: Option<Tz>,
    shapes_ignored: bool,
}

impl GtfsMetadata {
    #[tracing::instrument(skip_all, fields(ignore_shapes = config.ignore_shapes))]
    pub fn new(gtfs: &GtfsDataset, config: &ValidatorConfig) -> Self {
        let stop_bounds = bounding_box(gtfs.stops().filter_map(|stop| stop.coordinates()));
        let stop_bounds_buffered =
            stop_bounds.map(|rect| buffer_rect(rect, config.stop_buffer_meters));

        let timezone = gtfs
            .agencies()
            .first()
            .and_then(|agency| agency.agency_timezone.parse::<Tz>().ok());

        let mut metadata = Self {
            stop_bounds,
            stop_bounds_buffered,
            timezone,
            shapes_ignored: config.ignore_shapes,
            ..Default::default()
        };

        if !config.ignore_shapes && gtfs.has_shapes() {
            metadata.build_shapes(gtfs, config.shape_buffer_meters);
        }

        info!(
            trip_shapes = metadata.trip_shapes.len(),
            has_stop_bounds = metadata.stop_bounds.is_some(),
            "GTFS metadata built"
        );
        metadata
    }

    fn build_shapes(&mut self, gtfs: &GtfsDataset, buffer_meters: f64) {
        let mut by_shape_id: HashMap<&str, Option<Arc<ShapeBuffer>>> = HashMap::new();
        let mut shape_points = Vec::new();

        for trip in gtfs.trips() {
            let Some(shape_id) = trip.shape_id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            let buffer = by_shape_id
                .entry(shape_id)
                .or_insert_with(|| {
                    let points: Vec<(f64, f64)> = gtfs
                        .shape_points(shape_id)
                        .iter()
                        .map(|p| (p.shape_pt_lat, p.shape_pt_lon))
                        .collect();
                    shape_points.extend_from_slice(&points);
                    ShapeBuffer::new(&points, buffer_meters).map(Arc::new)
                })
                .clone();

            match buffer {
                Some(buffer) => {
                    self.trip_shapes.insert(trip.trip_id.clone(), buffer);
                }
                None => debug!(trip_id = %trip.trip_id, shape_id, "Trip shape has no points"),
            }
        }

        self.shape_bounds = bounding_box(shape_points);
        self.shape_bounds_buffered = self
            .shape_bounds
            .map(|rect| buffer_rect(rect, buffer_meters));
    }

    pub fn stop_bounds(&self) -> Option<&Rect> {
        self.stop_bounds.as_ref()
    }

    pub fn stop_bounds_buffered(&self) -> Option<&Rect> {
        self.stop_bounds_buffered.as_ref()
    }

    pub fn shape_bounds(&self) -> Option<&Rect> {
        self.shape_bounds.as_ref()
    }

    pub fn shape_bounds_buffered(&self) -> Option<&Rect> {
        self.shape_bounds_buffered.as_ref()
    }

    /// Whether the point lies inside the buffered stop box. Always true when
    /// no stop has coordinates, since there is no coverage to compare with.
    pub fn contains_in_stop_coverage(&self, lat: f64, lon: f64) -> bool {
        self.stop_bounds_buffered
            .as_ref()
            .is_none_or(|rect| rect_contains(rect, lat, lon))
    }

    /// The buffered shape of a trip. `None` if the trip has no shape or
    /// shapes are ignored.
    pub fn trip_shape(&self, trip_id: &str) -> Option<&ShapeBuffer> {
        self.trip_shapes.get(trip_id).map(Arc::as_ref)
    }

    pub fn has_trip_shapes(&self) -> bool {
        !self.trip_shapes.is_empty()
    }

    pub fn shapes_ignored(&self) -> bool {
        self.shapes_ignored
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    /// Renders a POSIX timestamp in the agency timezone (UTC if unknown),
    /// e.g. `1700000000 (2023-11-14T17:13:20-05:00)`.
    pub fn format_timestamp(&self, secs: u64) -> String {
        let Some(utc) = i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            return secs.to_string();
        };
        let rendered = match self.timezone {
            Some(tz) => utc.with_timezone(&tz).to_rfc3339(),
            None => utc.to_rfc3339(),
        };
        format!("{secs} ({rendered})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{UNIVERSITY_MALL, USF_CAMPUS, bull_runner_gtfs};

    #[test]
    fn test_stop_coverage_is_buffered() {
        let metadata = GtfsMetadata::new(&bull_runner_gtfs(), &ValidatorConfig::default());

        let bounds = metadata.stop_bounds().unwrap();
        let buffered = metadata.stop_bounds_buffered().unwrap();
        assert!(buffered.min().x < bounds.min().x);
        assert!(buffered.max().y > bounds.max().y);

        assert!(metadata.contains_in_stop_coverage(USF_CAMPUS.0, USF_CAMPUS.1));
        assert!(metadata.contains_in_stop_coverage(UNIVERSITY_MALL.0, UNIVERSITY_MALL.1));
        assert!(!metadata.contains_in_stop_coverage(27.9506, -82.4572));
    }

    #[test]
    fn test_trip_shapes() {
        let metadata = GtfsMetadata::new(&bull_runner_gtfs(), &ValidatorConfig::default());

        let shape = metadata.trip_shape("2").unwrap();
        assert!(shape.contains(USF_CAMPUS.0, USF_CAMPUS.1));
        assert!(!shape.contains(UNIVERSITY_MALL.0, UNIVERSITY_MALL.1));
        assert!(metadata.shape_bounds().is_some());
        assert!(metadata.trip_shape("no-such-trip").is_none());
    }

    #[test]
    fn test_ignore_shapes() {
        let config = ValidatorConfig {
            ignore_shapes: true,
            ..Default::default()
        };
        let metadata = GtfsMetadata::new(&bull_runner_gtfs(), &config);

        assert!(metadata.shapes_ignored());
        assert!(!metadata.has_trip_shapes());
        assert!(metadata.shape_bounds_buffered().is_none());
        assert!(metadata.stop_bounds().is_some());
    }

    #[test]
    fn test_format_timestamp_uses_agency_timezone() {
        let metadata = GtfsMetadata::new(&bull_runner_gtfs(), &ValidatorConfig::default());

        assert_eq!(metadata.timezone(), Some(chrono_tz::America::New_York));
        assert_eq!(
            metadata.format_timestamp(1_700_000_000),
            "1700000000 (2023-11-14T17:13:20-05:00)"
        );
        assert_eq!(
            GtfsMetadata::default().format_timestamp(0),
            "0 (1970-01-01T00:00:00+00:00)"
        );
    }
}

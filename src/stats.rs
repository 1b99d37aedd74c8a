use serde::Serialize;

use crate::gtfs_rt::FeedMessage;

/// Entity counts for one feed iteration, attached to every report.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct FeedSummary {
    pub gtfs_realtime_version: String,
    pub header_timestamp: Option<u64>,
    pub total_entities: usize,

    // entity types
    pub trip_updates: usize,
    pub vehicles: usize,
    pub alerts: usize,
    pub shapes: usize,
    pub stops: usize,
    pub trip_modifications: usize,
    pub deleted: usize,

    // nested content
    pub stop_time_updates: usize,
    pub vehicles_with_position: usize,
    pub vehicles_with_trip: usize,
    pub informed_entities: usize,
}

impl FeedSummary {
    pub fn from_feed(feed: &FeedMessage) -> Self {
        let mut s = FeedSummary {
            gtfs_realtime_version: feed.header.gtfs_realtime_version.clone(),
            header_timestamp: feed.header.timestamp,
            total_entities: feed.entity.len(),
            ..Default::default()
        };

        for e in &feed.entity {
            if e.is_deleted() {
                s.deleted += 1;
            }

            if let Some(tu) = &e.trip_update {
                s.trip_updates += 1;
                s.stop_time_updates += tu.stop_time_update.len();
            }

            if let Some(v) = &e.vehicle {
                s.vehicles += 1;

                if v.position.is_some() {
                    s.vehicles_with_position += 1;
                }

                if v.trip.is_some() {
                    s.vehicles_with_trip += 1;
                }
            }

            if let Some(alert) = &e.alert {
                s.alerts += 1;
                s.informed_entities += alert.informed_entity.len();
            }

            if e.shape.is_some() {
                s.shapes += 1;
            }

            if e.stop.is_some() {
                s.stops += 1;
            }

            if e.trip_modifications.is_some() {
                s.trip_modifications += 1;
            }
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn position_pct(&self) -> f64 {
        Self::pct(self.vehicles_with_position, self.vehicles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{
        Alert, EntitySelector, FeedEntity, FeedMessage, Position, TripDescriptor, TripUpdate,
        VehiclePosition, trip_update::StopTimeUpdate,
    };

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(FeedSummary::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(FeedSummary::pct(50, 100), 50.0);
        assert_eq!(FeedSummary::pct(1, 4), 25.0);
    }

    #[test]
    fn test_from_feed_empty() {
        let feed = create_empty_feed();
        let summary = FeedSummary::from_feed(&feed);

        assert_eq!(summary.total_entities, 0);
        assert_eq!(summary.vehicles, 0);
        assert_eq!(summary.gtfs_realtime_version, "2.0");
        assert_eq!(summary.header_timestamp, Some(1234567890));
    }

    #[test]
    fn test_from_feed_with_each_entity_kind() {
        let feed = FeedMessage {
            header: create_header(),
            entity: vec![
                FeedEntity {
                    id: "v1".to_string(),
                    vehicle: Some(VehiclePosition {
                        position: Some(Position {
                            latitude: 42.0,
                            longitude: -71.0,
                            bearing: Some(180.0),
                            speed: Some(10.5),
                            odometer: None,
                        }),
                        timestamp: Some(1234567890),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                FeedEntity {
                    id: "t1".to_string(),
                    trip_update: Some(TripUpdate {
                        trip: TripDescriptor {
                            trip_id: Some("1".to_string()),
                            ..Default::default()
                        },
                        stop_time_update: vec![StopTimeUpdate::default(), StopTimeUpdate::default()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                FeedEntity {
                    id: "a1".to_string(),
                    is_deleted: Some(true),
                    alert: Some(Alert {
                        informed_entity: vec![EntitySelector::default()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
        };

        let summary = FeedSummary::from_feed(&feed);

        assert_eq!(summary.total_entities, 3);
        assert_eq!(summary.vehicles, 1);
        assert_eq!(summary.vehicles_with_position, 1);
        assert_eq!(summary.vehicles_with_trip, 0);
        assert_eq!(summary.trip_updates, 1);
        assert_eq!(summary.stop_time_updates, 2);
        assert_eq!(summary.alerts, 1);
        assert_eq!(summary.informed_entities, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.position_pct(), 100.0);
    }

    // Helper functions for tests
    fn create_empty_feed() -> FeedMessage {
        FeedMessage {
            header: create_header(),
            entity: vec![],
        }
    }

    fn create_header() -> crate::gtfs_rt::FeedHeader {
        crate::gtfs_rt::FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1234567890),
            incrementality: None,
            feed_version: None,
        }
    }
}

//! Structure of each TripUpdate's stop_time_updates, and their alignment with
//! the trip's stop_times.txt records.

use tracing::debug;

use super::FeedValidator;
use super::util::{non_empty, stop_time_update_label, trip_id, trip_update_label};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs::StopTime;
use crate::gtfs_rt::trip_update::stop_time_update::ScheduleRelationship;
use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use crate::gtfs_rt::{TripUpdate, trip_descriptor};
use crate::results::ValidationResult;
use crate::rules::{
    E002, E009, E036, E037, E040, E041, E042, E043, E044, E045, E046, E051,
};

/// E002, E009, E036, E037, E040 through E046 and E051.
#[derive(Debug, Default)]
pub struct StopTimeUpdateValidator;

impl FeedValidator for StopTimeUpdateValidator {
    fn name(&self) -> &'static str {
        "stop_time_update"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();

        for entity in &ctx.feed.entity {
            let Some(trip_update) = &entity.trip_update else {
                continue;
            };
            let label = trip_update_label(entity, trip_update);
            check_structure(&mut result, trip_update, &label);

            let Some(trip_id) = trip_id(&trip_update.trip) else {
                continue;
            };
            let added = trip_update.trip.schedule_relationship
                == Some(trip_descriptor::ScheduleRelationship::Added as i32);
            if added || ctx.gtfs.trip(trip_id).is_none() {
                continue;
            }

            if !trip_update.stop_time_update.is_empty()
                && ctx.gtfs.visits_stop_more_than_once(trip_id)
                && trip_update
                    .stop_time_update
                    .iter()
                    .all(|update| update.stop_sequence.is_none())
            {
                result.add(&E009, label.as_str());
            }

            align_with_schedule(&mut result, trip_update, ctx.gtfs.stop_times(trip_id), &label);
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

fn check_structure(result: &mut ValidationResult, trip_update: &TripUpdate, label: &str) {
    let canceled = trip_update.trip.schedule_relationship
        == Some(trip_descriptor::ScheduleRelationship::Canceled as i32);
    if trip_update.stop_time_update.is_empty() && !canceled {
        result.add(&E041, label);
    }

    let mut preceding: Option<&StopTimeUpdate> = None;
    for (index, update) in trip_update.stop_time_update.iter().enumerate() {
        let update_label = format!("{label} {}", stop_time_update_label(index, update));
        let stop_id = non_empty(update.stop_id.as_deref());

        if update.stop_sequence.is_none() && stop_id.is_none() {
            result.add(&E040, update_label.as_str());
        }

        if let Some(previous) = preceding {
            if let (Some(previous_seq), Some(seq)) = (previous.stop_sequence, update.stop_sequence) {
                if seq <= previous_seq {
                    result.add(&E002, update_label.as_str());
                }
                if seq == previous_seq {
                    result.add(&E036, update_label.as_str());
                }
            }
            if let (Some(previous_stop), Some(stop)) = (non_empty(previous.stop_id.as_deref()), stop_id) {
                if previous_stop == stop {
                    result.add(&E037, update_label.as_str());
                }
            }
        }

        let has_event = update.arrival.is_some() || update.departure.is_some();
        match update.schedule_relationship() {
            ScheduleRelationship::NoData => {
                if has_event {
                    result.add(&E042, update_label.as_str());
                }
            }
            ScheduleRelationship::Skipped => {}
            _ => {
                if !has_event {
                    result.add(&E043, update_label.as_str());
                }
                let events = [("arrival", &update.arrival), ("departure", &update.departure)];
                for (field, event) in events {
                    if let Some(event) = event {
                        if event.delay.is_none() && event.time.is_none() {
                            result.add(&E044, format!("{update_label} {field}"));
                        }
                    }
                }
            }
        }

        preceding = Some(update);
    }
}

/// Only a delay, no absolute time.
fn is_delay_only(event: Option<&StopTimeEvent>) -> bool {
    event.is_some_and(|e| e.delay.is_some() && e.time.is_none())
}

/// Walks the updates against the trip's stop_times with a forward cursor.
///
/// An update carrying stop_sequence is matched by sequence anywhere in the
/// trip (E051 if none), then its stop_id must be that record's stop (E045).
/// An update carrying only stop_id is matched against the first record with
/// that stop at or after the cursor (E045 if none). Matching may start
/// mid-trip.
fn align_with_schedule(
    result: &mut ValidationResult,
    trip_update: &TripUpdate,
    stop_times: &[StopTime],
    label: &str,
) {
    if stop_times.is_empty() {
        return;
    }

    let mut cursor = 0;
    for (index, update) in trip_update.stop_time_update.iter().enumerate() {
        let update_label = format!("{label} {}", stop_time_update_label(index, update));
        let stop_id = non_empty(update.stop_id.as_deref());

        let matched = match (update.stop_sequence, stop_id) {
            (Some(seq), stop_id) => {
                let Some(position) = stop_times.iter().position(|st| st.stop_sequence == seq) else {
                    result.add(&E051, update_label.as_str());
                    continue;
                };
                if stop_id.is_some_and(|stop_id| stop_times[position].stop_id != stop_id) {
                    result.add(&E045, update_label.as_str());
                }
                position
            }
            (None, Some(stop_id)) => {
                let found = stop_times[cursor.min(stop_times.len())..]
                    .iter()
                    .position(|st| st.stop_id == stop_id);
                match found {
                    Some(offset) => cursor + offset,
                    None => {
                        result.add(&E045, update_label.as_str());
                        continue;
                    }
                }
            }
            (None, None) => continue,
        };
        cursor = matched + 1;

        // delay-only events need an exact scheduled time
        let scheduled = &stop_times[matched];
        let approximate = scheduled.is_approximate();
        if is_delay_only(update.arrival.as_ref()) && (approximate || scheduled.arrival_time.is_none()) {
            result.add(&E046, format!("{update_label} arrival"));
        }
        if is_delay_only(update.departure.as_ref())
            && (approximate || scheduled.departure_time.is_none())
        {
            result.add(&E046, format!("{update_label} departure"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::GtfsTables;
    use crate::test_utils::{
        NOW_SECS, bull_runner_tables, context, context_with_gtfs, event_delay, event_time, feed,
        stop_time, stop_time_update, trip_update, trip_update_entity,
    };

    fn validate_updates(trip_id: &str, updates: Vec<StopTimeUpdate>) -> ValidationResult {
        let entity = trip_update_entity("tu", trip_update(trip_id, Some("1"), updates, Some(NOW_SECS)));
        StopTimeUpdateValidator
            .validate(&context(feed("2.0", Some(NOW_SECS), vec![entity])))
            .unwrap()
    }

    fn by_sequence(sequences: &[u32]) -> Vec<StopTimeUpdate> {
        let t = NOW_SECS as i64;
        sequences
            .iter()
            .map(|&seq| stop_time_update(Some(seq), None, Some(t + i64::from(seq) * 60)))
            .collect()
    }

    #[test]
    fn test_e002_unsorted_stop_sequence() {
        let result = validate_updates("1", by_sequence(&[1, 5]));
        assert!(!result.contains(&E002));

        let result = validate_updates("1", by_sequence(&[1, 5, 3]));
        assert_eq!(result.count(&E002), 1);
        assert!(!result.contains(&E036));

        let result = validate_updates("1", by_sequence(&[1, 3, 3, 5]));
        assert_eq!(result.count(&E002), 1);
        assert_eq!(result.count(&E036), 1);
    }

    #[test]
    fn test_e037_repeated_stop_id() {
        let t = NOW_SECS as i64;
        let result = validate_updates(
            "1",
            vec![
                stop_time_update(None, Some("101"), Some(t)),
                stop_time_update(None, Some("101"), Some(t + 60)),
            ],
        );
        assert_eq!(result.count(&E037), 1);
    }

    #[test]
    fn test_e040_e041_completeness() {
        let result = validate_updates("1", vec![stop_time_update(None, None, Some(NOW_SECS as i64))]);
        assert_eq!(result.count(&E040), 1);

        let result = validate_updates("1", vec![]);
        assert_eq!(result.count(&E041), 1);

        let mut canceled = trip_update("1", None, vec![], None);
        canceled.trip.schedule_relationship =
            Some(trip_descriptor::ScheduleRelationship::Canceled as i32);
        let result = StopTimeUpdateValidator
            .validate(&context(feed("2.0", Some(NOW_SECS), vec![trip_update_entity("tu", canceled)])))
            .unwrap();
        assert!(!result.contains(&E041));
    }

    #[test]
    fn test_e042_e043_e044_events() {
        let with_relationship = |mut update: StopTimeUpdate, relationship: ScheduleRelationship| {
            update.schedule_relationship = Some(relationship as i32);
            update
        };
        let result = validate_updates(
            "1",
            vec![
                with_relationship(stop_time_update(Some(1), None, Some(NOW_SECS as i64)), ScheduleRelationship::NoData),
                with_relationship(stop_time_update(Some(2), None, None), ScheduleRelationship::NoData),
                with_relationship(stop_time_update(Some(3), None, None), ScheduleRelationship::Skipped),
            ],
        );
        assert_eq!(result.count(&E042), 1);
        assert!(!result.contains(&E043));

        let mut empty_events = stop_time_update(Some(2), None, None);
        empty_events.arrival = Some(StopTimeEvent::default());
        empty_events.departure = Some(StopTimeEvent::default());
        let result = validate_updates(
            "1",
            vec![stop_time_update(Some(1), None, None), empty_events],
        );
        assert_eq!(result.count(&E043), 1);
        assert_eq!(result.count(&E044), 2);
    }

    #[test]
    fn test_e009_loop_trip_needs_stop_sequence() {
        let t = NOW_SECS as i64;
        let result = validate_updates(
            "loop",
            vec![
                stop_time_update(None, Some("101"), Some(t)),
                stop_time_update(None, Some("102"), Some(t + 60)),
            ],
        );
        assert_eq!(result.count(&E009), 1);

        let result = validate_updates(
            "loop",
            vec![stop_time_update(Some(3), Some("101"), Some(t))],
        );
        assert!(!result.contains(&E009));

        let result = validate_updates(
            "1",
            vec![stop_time_update(None, Some("101"), Some(t))],
        );
        assert!(!result.contains(&E009));
    }

    #[test]
    fn test_alignment_e045_e051() {
        let t = NOW_SECS as i64;
        // starts mid-trip
        let result = validate_updates(
            "1",
            vec![
                stop_time_update(Some(2), Some("102"), Some(t)),
                stop_time_update(Some(3), Some("103"), Some(t + 60)),
            ],
        );
        assert!(result.is_empty());

        let result = validate_updates(
            "1",
            vec![
                stop_time_update(Some(1), Some("102"), Some(t)),
                stop_time_update(Some(9), Some("103"), Some(t + 60)),
            ],
        );
        assert_eq!(result.count(&E045), 1);
        assert_eq!(result.count(&E051), 1);

        // stop_id only: 101 is not served after 103
        let result = validate_updates(
            "1",
            vec![
                stop_time_update(None, Some("103"), Some(t)),
                stop_time_update(None, Some("101"), Some(t + 60)),
            ],
        );
        assert_eq!(result.count(&E045), 1);

        // the loop trip serves 101 again after 102
        let result = validate_updates(
            "loop",
            vec![
                stop_time_update(None, Some("102"), Some(t)),
                stop_time_update(None, Some("101"), Some(t + 60)),
            ],
        );
        assert!(!result.contains(&E045));
    }

    #[test]
    fn test_e046_delay_without_scheduled_time() {
        let mut tables: GtfsTables = bull_runner_tables();
        tables.stop_times.retain(|st| st.trip_id != "1");
        tables.stop_times.extend([
            stop_time("1", "101", 1, Some(7 * 3600)),
            stop_time("1", "102", 2, None),
            stop_time("1", "103", 3, Some(7 * 3600 + 600)),
        ]);

        let delayed = |seq: u32, stop_id: &str| StopTimeUpdate {
            arrival: Some(event_delay(60)),
            departure: Some(event_delay(60)),
            ..stop_time_update(Some(seq), Some(stop_id), None)
        };
        let mut timed = delayed(2, "102");
        timed.departure = Some(event_time(NOW_SECS as i64));

        let run = |updates: Vec<StopTimeUpdate>| {
            let entity = trip_update_entity("tu", trip_update("1", None, updates, None));
            StopTimeUpdateValidator
                .validate(&context_with_gtfs(
                    feed("2.0", Some(NOW_SECS), vec![entity]),
                    crate::gtfs::GtfsDataset::from(tables.clone()),
                ))
                .unwrap()
        };

        assert_eq!(run(vec![delayed(1, "101"), delayed(2, "102")]).count(&E046), 2);
        assert_eq!(run(vec![timed]).count(&E046), 1);
        assert!(!run(vec![delayed(3, "103")]).contains(&E046));
    }

    #[test]
    fn test_e046_delay_at_non_timepoint() {
        let mut tables: GtfsTables = bull_runner_tables();
        for stop_time in tables.stop_times.iter_mut().filter(|st| st.trip_id == "1") {
            stop_time.timepoint = Some(if stop_time.stop_id == "102" { 0 } else { 1 });
        }

        let arrival_delay = |seq: u32, stop_id: &str| StopTimeUpdate {
            arrival: Some(event_delay(60)),
            ..stop_time_update(Some(seq), Some(stop_id), None)
        };
        let entity = trip_update_entity(
            "tu",
            trip_update("1", None, vec![arrival_delay(1, "101"), arrival_delay(2, "102")], None),
        );
        let result = StopTimeUpdateValidator
            .validate(&context_with_gtfs(
                feed("2.0", Some(NOW_SECS), vec![entity]),
                crate::gtfs::GtfsDataset::from(tables),
            ))
            .unwrap();

        assert_eq!(result.count(&E046), 1);
        assert_eq!(
            result.occurrences(&E046).unwrap()[0].prefix,
            "trip_id 1 stop_sequence 2 (stop_id 102) arrival"
        );
    }

    #[test]
    fn test_added_trips_are_not_aligned() {
        let mut update = trip_update("new-trip", None, vec![stop_time_update(Some(42), Some("101"), Some(NOW_SECS as i64))], None);
        update.trip.schedule_relationship = Some(trip_descriptor::ScheduleRelationship::Added as i32);
        let result = StopTimeUpdateValidator
            .validate(&context(feed("2.0", Some(NOW_SECS), vec![trip_update_entity("tu", update)])))
            .unwrap();
        assert!(result.is_empty());
    }
}

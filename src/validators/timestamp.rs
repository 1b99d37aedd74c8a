//! Timestamp presence, range and ordering, within one feed message and
//! across two iterations of the same feed.

use std::sync::Arc;
use tracing::debug;

use super::FeedValidator;
use super::util::{
    event_time, format_duration, is_v2_or_later, populated, stop_time_update_label,
    trip_update_label, vehicle_label,
};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs_rt::TripUpdate;
use crate::gtfs_rt::trip_update::StopTimeUpdate;
use crate::results::ValidationResult;
use crate::rules::{E001, E012, E017, E018, E022, E025, E048, E050, W001, W007, W008};

/// W001, E001, E012, E017, E018, E022, E025, E048, E050, W007, W008.
///
/// Fails with [`ValidationError::IdenticalFeedIterations`] when the previous
/// iteration is the same message as the current one.
#[derive(Debug, Default)]
pub struct TimestampValidator;

impl FeedValidator for TimestampValidator {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        if let Some(previous) = &ctx.previous_feed {
            if Arc::ptr_eq(previous, &ctx.feed) || **previous == *ctx.feed {
                return Err(ValidationError::IdenticalFeedIterations);
            }
        }

        let mut result = ValidationResult::new();
        let header = &ctx.feed.header;
        let header_timestamp = populated(header.timestamp);

        match header_timestamp {
            None if is_v2_or_later(&header.gtfs_realtime_version) => result.add(&E048, "header"),
            None => result.add(&W001, "header"),
            Some(timestamp) => {
                check_entity_timestamp(ctx, &mut result, "header timestamp", timestamp);
                let age = ctx.now_secs().saturating_sub(timestamp);
                if age > ctx.config.stale_feed_secs {
                    result.add(
                        &W008,
                        format!(
                            "header timestamp {} ({} old)",
                            ctx.metadata.format_timestamp(timestamp),
                            format_duration(age)
                        ),
                    );
                }
            }
        }

        for entity in &ctx.feed.entity {
            if let Some(trip_update) = &entity.trip_update {
                let label = trip_update_label(entity, trip_update);
                match populated(trip_update.timestamp) {
                    None => result.add(&W001, label.as_str()),
                    Some(timestamp) => {
                        let what = format!("{label} timestamp");
                        check_entity_timestamp(ctx, &mut result, &what, timestamp);
                        check_below_header(&mut result, header_timestamp, &what, timestamp);
                    }
                }
                check_stop_time_updates(ctx, &mut result, &label, trip_update);
            }

            if let Some(vehicle) = &entity.vehicle {
                let label = vehicle_label(entity, vehicle);
                match populated(vehicle.timestamp) {
                    None => result.add(&W001, label.as_str()),
                    Some(timestamp) => {
                        let what = format!("{label} timestamp");
                        check_entity_timestamp(ctx, &mut result, &what, timestamp);
                        check_below_header(&mut result, header_timestamp, &what, timestamp);
                    }
                }
            }

            if let Some(alert) = &entity.alert {
                for period in &alert.active_period {
                    let bounds = [("start", period.start), ("end", period.end)];
                    for (side, timestamp) in bounds {
                        if let Some(timestamp) = populated(timestamp) {
                            check_posix(
                                ctx,
                                &mut result,
                                &format!("alert entity ID {} active_period {side}", entity.id),
                                timestamp as i64,
                            );
                        }
                    }
                }
            }
        }

        if let Some(previous) = &ctx.previous_feed {
            let previous_timestamp = populated(previous.header.timestamp);
            if let (Some(current), Some(previous_ts)) = (header_timestamp, previous_timestamp) {
                let what = format!("header timestamp {}", ctx.metadata.format_timestamp(current));
                if current == previous_ts && previous.entity != ctx.feed.entity {
                    result.add(&E017, what.as_str());
                }
                if previous_ts > current {
                    result.add(&E018, format!("{what} (previous {previous_ts})"));
                }
                if current > previous_ts
                    && current - previous_ts > ctx.config.refresh_interval_secs
                {
                    result.add(
                        &W007,
                        format!("{what} ({} after {previous_ts})", format_duration(current - previous_ts)),
                    );
                }
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

/// E001 and, for values that are valid POSIX time, E050.
fn check_entity_timestamp(ctx: &ValidationContext, result: &mut ValidationResult, what: &str, timestamp: u64) {
    if !ctx.config.is_posix(timestamp) {
        result.add(&E001, format!("{what} {timestamp}"));
        return;
    }
    let now = ctx.now_secs();
    if timestamp > now + ctx.config.future_tolerance_secs {
        result.add(
            &E050,
            format!(
                "{what} {} ({} ahead of now)",
                ctx.metadata.format_timestamp(timestamp),
                format_duration(timestamp - now)
            ),
        );
    }
}

fn check_posix(ctx: &ValidationContext, result: &mut ValidationResult, what: &str, time: i64) {
    let valid = u64::try_from(time).is_ok_and(|t| ctx.config.is_posix(t));
    if !valid {
        result.add(&E001, format!("{what} {time}"));
    }
}

fn check_below_header(
    result: &mut ValidationResult,
    header_timestamp: Option<u64>,
    what: &str,
    timestamp: u64,
) {
    if let Some(header_timestamp) = header_timestamp {
        if timestamp > header_timestamp {
            result.add(&E012, format!("{what} {timestamp}"));
        }
    }
}

/// E001 for stop time events, E025 within an update and E022 between updates.
fn check_stop_time_updates(
    ctx: &ValidationContext,
    result: &mut ValidationResult,
    trip_label: &str,
    trip_update: &TripUpdate,
) {
    let mut preceding: Option<&StopTimeUpdate> = None;

    for (index, update) in trip_update.stop_time_update.iter().enumerate() {
        let label = format!("{trip_label} {}", stop_time_update_label(index, update));
        let arrival = event_time(update.arrival.as_ref());
        let departure = event_time(update.departure.as_ref());

        for (field, time) in [("arrival_time", arrival), ("departure_time", departure)] {
            if let Some(time) = time {
                check_posix(ctx, result, &format!("{label} {field}"), time);
            }
        }

        if let (Some(arrival), Some(departure)) = (arrival, departure) {
            if departure < arrival {
                result.add(&E025, format!("{label} departure_time {departure} (arrival_time {arrival})"));
            }
        }

        if arrival.is_none() && departure.is_none() {
            continue;
        }

        if let Some(previous) = preceding {
            let previous_arrival = event_time(previous.arrival.as_ref());
            let previous_departure = event_time(previous.departure.as_ref());

            // the vehicle cannot reach this stop before leaving the previous one
            let previous_latest = previous_arrival.max(previous_departure);

            match (previous_arrival, previous_departure, arrival, departure) {
                (Some(_), Some(prev_dep), Some(arr), Some(dep)) => {
                    if previous_latest.is_some_and(|latest| arr < latest) {
                        result.add(&E022, format!("{label} arrival_time {arr}"));
                    }
                    if dep < prev_dep {
                        result.add(&E022, format!("{label} departure_time {dep}"));
                    }
                }
                _ => {
                    let time = arrival.or(departure);
                    if let (Some(previous_time), Some(time)) = (previous_latest, time) {
                        if time < previous_time {
                            result.add(&E022, format!("{label} time {time}"));
                        }
                    }
                }
            }
        }
        preceding = Some(update);
    }
}

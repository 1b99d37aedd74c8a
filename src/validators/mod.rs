//! Rule families.
//!
//! Each validator reads a [`ValidationContext`] and returns the occurrences it
//! found. Validators hold no state and share nothing, so the engine runs them
//! concurrently.

mod cross_feed;
mod frequency;
mod header;
mod stop;
mod stop_time_update;
mod timestamp;
mod trip_descriptor;
mod util;
mod vehicle;

use std::sync::Arc;

pub use cross_feed::CrossFeedDescriptorValidator;
pub use frequency::{FrequencyTypeOneValidator, FrequencyTypeZeroValidator};
pub use header::HeaderValidator;
pub use stop::{StopLocationTypeValidator, StopValidator};
pub use stop_time_update::StopTimeUpdateValidator;
pub use timestamp::TimestampValidator;
pub use trip_descriptor::TripDescriptorValidator;
pub use vehicle::VehicleValidator;

use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::results::ValidationResult;

pub trait FeedValidator: Send + Sync {
    /// Short identifier used in logs and in the report's list of
    /// validators that did not finish.
    fn name(&self) -> &'static str;

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError>;
}

/// Every validator, in the order their results are merged.
pub fn default_validators() -> Vec<Arc<dyn FeedValidator>> {
    vec![
        Arc::new(TimestampValidator),
        Arc::new(StopTimeUpdateValidator),
        Arc::new(TripDescriptorValidator),
        Arc::new(VehicleValidator),
        Arc::new(CrossFeedDescriptorValidator),
        Arc::new(HeaderValidator),
        Arc::new(FrequencyTypeZeroValidator),
        Arc::new(FrequencyTypeOneValidator),
        Arc::new(StopValidator),
        Arc::new(StopLocationTypeValidator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_validators_have_unique_names() {
        let validators = default_validators();
        let names: HashSet<_> = validators.iter().map(|v| v.name()).collect();
        assert_eq!(names.len(), validators.len());
        assert_eq!(validators.len(), 10);
    }
}

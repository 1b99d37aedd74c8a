//! Runs the validators concurrently and merges their results into a report.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::results::{ValidationReport, ValidationResult, ValidatorFailure};
use crate::stats::FeedSummary;
use crate::validators::{FeedValidator, default_validators};

pub struct ValidationEngine {
    validators: Vec<Arc<dyn FeedValidator>>,
    deadline: Option<Duration>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(default_validators())
    }
}

impl ValidationEngine {
    pub fn new(validators: Vec<Arc<dyn FeedValidator>>) -> Self {
        Self {
            validators,
            deadline: None,
        }
    }

    /// Validators still running when `deadline` expires are left out of the
    /// report and listed in [`ValidationReport::incomplete_validators`].
    ///
    /// Validators run on the blocking pool and cannot be cancelled: a late
    /// validator keeps running in the background after `run` returns, and
    /// its result is discarded.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Runs every validator on the blocking pool. Results are merged in
    /// validator order whatever order they finish in.
    ///
    /// A validator that returns an error or panics contributes no
    /// occurrences and is listed in [`ValidationReport::failed_validators`];
    /// the others are still reported.
    #[tracing::instrument(skip_all, fields(validators = self.validators.len(), entities = ctx.feed.entity.len()))]
    pub async fn run(&self, ctx: Arc<ValidationContext>) -> ValidationReport {
        let deadline = self.deadline.map(|d| tokio::time::Instant::now() + d);
        let mut tasks = JoinSet::new();

        for (index, validator) in self.validators.iter().enumerate() {
            let validator = Arc::clone(validator);
            let ctx = Arc::clone(&ctx);
            tasks.spawn_blocking(move || (index, run_validator(validator.as_ref(), &ctx)));
        }

        let mut outcomes: Vec<Option<Result<ValidationResult, ValidationError>>> =
            (0..self.validators.len()).map(|_| None).collect();
        let mut join_failures = Vec::new();
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(remaining = tasks.len(), "Validation deadline expired");
                        tasks.abort_all();
                        break;
                    }
                },
                None => tasks.join_next().await,
            };
            let Some(joined) = next else {
                break;
            };

            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => {
                    // the task id does not map back to a validator
                    warn!(error = %e, "Validator task failed");
                    join_failures.push(ValidatorFailure {
                        validator: "unknown",
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut report = self.assemble(&ctx, outcomes);
        report.failed_validators.extend(join_failures);
        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            incomplete = report.incomplete_validators.len(),
            failed = report.failed_validators.len(),
            "Validation finished"
        );
        report
    }

    /// Runs the validators one after another on the calling thread. No
    /// deadline applies.
    pub fn run_sequential(&self, ctx: &ValidationContext) -> ValidationReport {
        let outcomes = self
            .validators
            .iter()
            .map(|validator| Some(run_validator(validator.as_ref(), ctx)))
            .collect();
        self.assemble(ctx, outcomes)
    }

    /// Merges outcomes in validator order. `None` marks a validator that did
    /// not finish.
    fn assemble(
        &self,
        ctx: &ValidationContext,
        outcomes: Vec<Option<Result<ValidationResult, ValidationError>>>,
    ) -> ValidationReport {
        let mut merged = ValidationResult::new();
        let mut incomplete = Vec::new();
        let mut failed = Vec::new();
        for (validator, outcome) in self.validators.iter().zip(outcomes) {
            match outcome {
                Some(Ok(result)) => merged.merge(result),
                Some(Err(e)) => {
                    warn!(validator = validator.name(), error = %e, "Validator failed");
                    failed.push(ValidatorFailure {
                        validator: validator.name(),
                        reason: e.to_string(),
                    });
                }
                None => incomplete.push(validator.name()),
            }
        }

        let mut report = ValidationReport::new(FeedSummary::from_feed(&ctx.feed), merged);
        report.incomplete_validators = incomplete;
        report.failed_validators = failed;
        report
    }
}

fn run_validator(
    validator: &dyn FeedValidator,
    ctx: &ValidationContext,
) -> Result<ValidationResult, ValidationError> {
    let name = validator.name();
    debug!(validator = name, "Running validator");
    catch_unwind(AssertUnwindSafe(|| validator.validate(ctx))).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        Err(ValidationError::ValidatorPanicked {
            validator: name,
            reason,
        })
    })
}

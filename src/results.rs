//! Validation output: occurrences, per-validator results and the merged report.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::rules::{Severity, ValidationRule};
use crate::stats::FeedSummary;

/// One concrete violation of a rule. The prefix names the offending element
/// (e.g. `"trip_id 6234"`) and is joined with the rule's suffix when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub prefix: String,
}

impl Occurrence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn render(&self, rule: &ValidationRule) -> String {
        format!("{}{}", self.prefix, rule.occurrence_suffix)
    }
}

/// Occurrences grouped by rule, ordered by rule id.
///
/// A rule is only present once it has at least one occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    entries: BTreeMap<&'static ValidationRule, Vec<Occurrence>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: &'static ValidationRule, prefix: impl Into<String>) {
        self.entries
            .entry(rule)
            .or_default()
            .push(Occurrence::new(prefix));
    }

    pub fn occurrences(&self, rule: &ValidationRule) -> Option<&[Occurrence]> {
        self.entries.get(rule).map(Vec::as_slice)
    }

    pub fn count(&self, rule: &ValidationRule) -> usize {
        self.occurrences(rule).map_or(0, <[Occurrence]>::len)
    }

    pub fn contains(&self, rule: &ValidationRule) -> bool {
        self.entries.contains_key(rule)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct rules with occurrences.
    pub fn rule_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_occurrences(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Appends every occurrence of `other` after this result's occurrences for the same rule.
    pub fn merge(&mut self, other: ValidationResult) {
        for (rule, occurrences) in other.entries {
            self.entries.entry(rule).or_default().extend(occurrences);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static ValidationRule, &[Occurrence])> {
        self.entries
            .iter()
            .map(|(rule, occurrences)| (*rule, occurrences.as_slice()))
    }
}

/// Report entry for one rule, as serialized to JSON.
#[derive(Debug, Serialize)]
pub struct RuleReport {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub occurrence_count: usize,
    pub occurrences: Vec<String>,
}

/// A validator that stopped with an error; its occurrences are not in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorFailure {
    pub validator: &'static str,
    pub reason: String,
}

/// Merged output of one validation cycle.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub summary: FeedSummary,
    #[serde(serialize_with = "serialize_result")]
    pub result: ValidationResult,
    /// Validators that had not finished when the deadline expired.
    pub incomplete_validators: Vec<&'static str>,
    pub failed_validators: Vec<ValidatorFailure>,
}

impl ValidationReport {
    pub fn new(summary: FeedSummary, result: ValidationResult) -> Self {
        Self {
            generated_at: Utc::now(),
            summary,
            result,
            incomplete_validators: Vec::new(),
            failed_validators: Vec::new(),
        }
    }

    pub fn rules(&self) -> Vec<RuleReport> {
        rule_reports(&self.result)
    }

    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.result
            .iter()
            .filter(|(rule, _)| rule.severity == severity)
            .map(|(_, occurrences)| occurrences.len())
            .sum()
    }
}

fn rule_reports(result: &ValidationResult) -> Vec<RuleReport> {
    result
        .iter()
        .map(|(rule, occurrences)| RuleReport {
            rule_id: rule.id,
            severity: rule.severity,
            title: rule.title,
            description: rule.description,
            occurrence_count: occurrences.len(),
            occurrences: occurrences.iter().map(|o| o.render(rule)).collect(),
        })
        .collect()
}

fn serialize_result<S>(result: &ValidationResult, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    rule_reports(result).serialize(serializer)
}

use tracing::debug;

use super::FeedValidator;
use super::util::is_v2_or_later;
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::gtfs_rt::feed_header::Incrementality;
use crate::results::ValidationResult;
use crate::rules::{E038, E039, E049};

/// E038, E039, E049.
#[derive(Debug, Default)]
pub struct HeaderValidator;

impl FeedValidator for HeaderValidator {
    fn name(&self) -> &'static str {
        "header"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<ValidationResult, ValidationError> {
        let mut result = ValidationResult::new();
        let header = &ctx.feed.header;
        let version = header.gtfs_realtime_version.as_str();

        if !ctx.config.supported_versions.iter().any(|v| v == version) {
            result.add(&E038, format!("header gtfs_realtime_version \"{version}\""));
        }

        if is_v2_or_later(version) && header.incrementality.is_none() {
            result.add(&E049, "header");
        }

        // unset incrementality means FULL_DATASET
        if header.incrementality() == Incrementality::FullDataset {
            for entity in ctx.feed.entity.iter().filter(|e| e.is_deleted.is_some()) {
                result.add(&E039, format!("entity ID {}", entity.id));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::FeedEntity;
    use crate::test_utils::{NOW_SECS, context, feed};

    #[test]
    fn test_e038_unsupported_version() {
        for (version, expected) in [("1.0", 0), ("2.0", 0), ("3.0", 1), ("2", 1), ("", 1)] {
            let result = HeaderValidator
                .validate(&context(feed(version, Some(NOW_SECS), vec![])))
                .unwrap();
            assert_eq!(result.count(&E038), expected, "version {version:?}");
        }
    }

    #[test]
    fn test_e049_incrementality_required_from_v2() {
        let mut message = feed("2.0", Some(NOW_SECS), vec![]);
        message.header.incrementality = None;
        let result = HeaderValidator.validate(&context(message.clone())).unwrap();
        assert_eq!(result.count(&E049), 1);
        assert_eq!(
            result.occurrences(&E049).unwrap()[0].render(&E049),
            "header incrementality is not populated"
        );

        message.header.gtfs_realtime_version = "1.0".into();
        let result = HeaderValidator.validate(&context(message)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_e039_is_deleted_in_full_dataset() {
        let deleted = |id: &str| FeedEntity {
            id: id.into(),
            is_deleted: Some(true),
            ..Default::default()
        };
        let mut message = feed(
            "2.0",
            Some(NOW_SECS),
            vec![deleted("a"), FeedEntity::default(), deleted("b")],
        );
        let result = HeaderValidator.validate(&context(message.clone())).unwrap();
        assert_eq!(result.count(&E039), 2);

        message.header.incrementality = Some(Incrementality::Differential as i32);
        let result = HeaderValidator.validate(&context(message)).unwrap();
        assert!(!result.contains(&E039));
    }
}

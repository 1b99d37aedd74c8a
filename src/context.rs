use std::sync::Arc;

use crate::config::ValidatorConfig;
use crate::gtfs::GtfsDataset;
use crate::gtfs_rt::FeedMessage;
use crate::metadata::GtfsMetadata;

/// Everything a validator may read. Cheap to clone; all data is shared.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Wall-clock time of the validation run, in milliseconds since the epoch.
    pub now_millis: u64,
    pub feed: Arc<FeedMessage>,
    /// The preceding iteration of the same feed, for cross-iteration rules.
    pub previous_feed: Option<Arc<FeedMessage>>,
    pub gtfs: Arc<GtfsDataset>,
    pub metadata: Arc<GtfsMetadata>,
    pub previous_metadata: Option<Arc<GtfsMetadata>>,
    pub config: Arc<ValidatorConfig>,
}

impl ValidationContext {
    pub fn new(
        now_millis: u64,
        feed: Arc<FeedMessage>,
        gtfs: Arc<GtfsDataset>,
        metadata: Arc<GtfsMetadata>,
    ) -> Self {
        Self {
            now_millis,
            feed,
            previous_feed: None,
            gtfs,
            metadata,
            previous_metadata: None,
            config: Arc::new(ValidatorConfig::default()),
        }
    }

    pub fn with_previous(
        mut self,
        previous_feed: Arc<FeedMessage>,
        previous_metadata: Option<Arc<GtfsMetadata>>,
    ) -> Self {
        self.previous_feed = Some(previous_feed);
        self.previous_metadata = previous_metadata;
        self
    }

    pub fn with_config(mut self, config: Arc<ValidatorConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn now_secs(&self) -> u64 {
        self.now_millis / 1000
    }
}

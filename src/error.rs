//! Typed errors for the validation core and the static GTFS loader.

/// Fatal conditions that abort a validator run. These are never reported as
/// rule occurrences.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("current and previous feed iterations are identical; cross-iteration rules need two distinct messages")]
    IdenticalFeedIterations,

    #[error("validator {validator} did not complete: {reason}")]
    ValidatorPanicked {
        validator: &'static str,
        reason: String,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum GtfsLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Required file missing: {0}")]
    MissingFile(&'static str),

    #[error("Invalid agency_timezone: {0}")]
    InvalidTimezone(String),
}

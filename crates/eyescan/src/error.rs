//! Error type for the fallible edges of the analysis pipeline.
//!
//! Only input handling can fail: decoding an image, reading JSON, or
//! rejecting subject data outside the accepted range. Measurement absence,
//! unmapped ages and diopter preconditions are ordinary values, not errors.

use std::path::PathBuf;

/// Errors raised while loading inputs or configuration.
#[derive(Debug)]
pub enum AnalysisError {
    /// The image could not be opened or decoded.
    Image {
        /// Source path, if the image came from disk.
        path: Option<PathBuf>,
        /// Underlying decoder error.
        source: image::ImageError,
    },
    /// Filesystem error while reading a config or reference file.
    Io(std::io::Error),
    /// Malformed JSON in a config or reference file.
    Json(serde_json::Error),
    /// Subject age outside the accepted input range.
    AgeOutOfRange {
        /// Rejected age.
        age: i64,
    },
    /// Gender tag not in the accepted set.
    UnknownGender(String),
    /// Reference table failed schema or value validation.
    InvalidReference(String),
    /// Analysis configuration failed validation.
    InvalidConfig(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image {
                path: Some(path),
                source,
            } => write!(f, "failed to open image {}: {}", path.display(), source),
            Self::Image { path: None, source } => write!(f, "failed to decode image: {}", source),
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::Json(e) => write!(f, "invalid json: {}", e),
            Self::AgeOutOfRange { age } => write!(
                f,
                "age {} is out of range (expected {}..={})",
                age,
                crate::MIN_SUBJECT_AGE,
                crate::MAX_SUBJECT_AGE
            ),
            Self::UnknownGender(tag) => {
                write!(f, "unknown gender '{}' (expected 'male' or 'female')", tag)
            }
            Self::InvalidReference(msg) => write!(f, "invalid reference table: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "invalid analysis config: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<image::ImageError> for AnalysisError {
    fn from(e: image::ImageError) -> Self {
        Self::Image {
            path: None,
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_error_names_accepted_range() {
        let msg = AnalysisError::AgeOutOfRange { age: 121 }.to_string();
        assert_eq!(msg, "age 121 is out of range (expected 0..=120)");
    }

    #[test]
    fn json_error_keeps_source() {
        let err: AnalysisError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("invalid json:"));
    }
}

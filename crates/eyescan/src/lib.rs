//! eyescan — pupil measurement and reference scoring for eye photographs.
//!
//! The pipeline stages are:
//!
//! 1. **Preprocess** – decode and resize to a fixed analysis resolution.
//! 2. **Features** – dark-region thresholding, contour tracing and a minimum
//!    enclosing circle fit giving the pupil diameter.
//! 3. **Evaluate** – age bucketing, gender-adjusted reference lookup and
//!    deviation scoring.
//! 4. **Diopter** – illustrative refractive-power estimate.
//! 5. **Report** – nine labelled fields for display or JSON output.
//!
//! Reference values are illustrative placeholders with no clinical basis.
//! Pupil diameters are image pixels reported as millimeters (no calibration).
//!
//! # Public API
//! - [`Analyzer`] and [`Subject`] as primary entry points
//! - [`AnalysisConfig`] and [`ReferenceTable`] for tuning and custom tables
//! - stage functions ([`extract_features`], [`evaluate`], [`estimate_diopter`],
//!   [`build_report`]) for callers driving the pipeline themselves

mod api;
mod circle;
mod config;
mod diopter;
mod error;
mod evaluate;
mod features;
mod preprocess;
mod reference;
mod report;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::{Analyzer, Gender, Subject, MAX_SUBJECT_AGE, MIN_SUBJECT_AGE};
pub use circle::Circle;
pub use config::AnalysisConfig;
pub use diopter::{estimate_diopter, DiopterEstimate, FOCAL_SCALE, MAX_DIOPTER};
pub use error::AnalysisError;
pub use evaluate::{
    evaluate, ClinicalParameter, EvaluateConfig, Evaluation, EvaluationStatus, Finding,
};
pub use features::{
    extract_features, extract_features_gray, ExtractConfig, ExtractedFeatures,
    IRIS_PATTERN_PLACEHOLDER,
};
pub use preprocess::{decode_image, load_image, normalize_image};
pub use reference::{
    AgeBucket, LensClarity, PupilSize, ReferenceProfile, ReferenceTable,
    DEFAULT_CORNEAL_CURVATURE_MM, DEFAULT_PUPIL_SIZE,
};
pub use report::{build_report, Report, ReportValue, REPORT_LABELS};


//! High-level analysis API.
//!
//! [`Analyzer`] is the primary entry point. It owns a reference table and an
//! [`AnalysisConfig`] and runs the full pipeline:
//! normalize → extract → evaluate → report.

use std::path::Path;
use std::str::FromStr;

use image::RgbImage;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::evaluate::evaluate;
use crate::features::extract_features;
use crate::preprocess::{load_image, normalize_image};
use crate::reference::ReferenceTable;
use crate::report::{build_report, Report};

/// Youngest accepted subject age.
pub const MIN_SUBJECT_AGE: i64 = 0;
/// Oldest accepted subject age.
pub const MAX_SUBJECT_AGE: i64 = 120;

/// Subject gender as accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Tag used to look up the reference-table adjustment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = AnalysisError;

    /// Accepts exactly `male` or `female`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(AnalysisError::UnknownGender(s.to_string())),
        }
    }
}

/// Validated subject data for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Subject {
    age: i64,
    gender: Gender,
}

impl Subject {
    /// Validate raw inputs: age in `[0, 120]`, gender `male` or `female`.
    pub fn new(age: i64, gender: &str) -> Result<Self, AnalysisError> {
        let gender = gender.parse()?;
        Self::with_gender(age, gender)
    }

    pub fn with_gender(age: i64, gender: Gender) -> Result<Self, AnalysisError> {
        if !(MIN_SUBJECT_AGE..=MAX_SUBJECT_AGE).contains(&age) {
            return Err(AnalysisError::AgeOutOfRange { age });
        }
        Ok(Self { age, gender })
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }
}

/// End-to-end eye photo analyzer.
///
/// Create once, analyze many images. Each call is independent; the
/// reference table is only read.
///
/// # Examples
///
/// ```no_run
/// use eyescan::{Analyzer, Subject};
/// use std::path::Path;
///
/// let analyzer = Analyzer::new();
/// let subject = Subject::new(25, "male").unwrap();
/// let report = analyzer.analyze_path(Path::new("eye.jpg"), &subject).unwrap();
/// print!("{}", report);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    table: ReferenceTable,
    config: AnalysisConfig,
}

impl Analyzer {
    /// Analyzer with the built-in reference table and default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with an explicit table and config. The config is validated.
    pub fn with_config(
        table: ReferenceTable,
        config: AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { table, config })
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Resize an image to the configured analysis resolution.
    pub fn normalize(&self, image: &RgbImage) -> RgbImage {
        normalize_image(image, self.config.target_size)
    }

    /// Run the full pipeline on a decoded image. Never fails: every
    /// degenerate case is reported as a placeholder value.
    pub fn analyze(&self, image: &RgbImage, subject: &Subject) -> Report {
        let normalized = self.normalize(image);
        self.analyze_normalized(&normalized, subject)
    }

    /// Run extraction and scoring on an image already at target resolution.
    pub fn analyze_normalized(&self, normalized: &RgbImage, subject: &Subject) -> Report {
        let features = extract_features(normalized, &self.config.extract);
        let evaluation = evaluate(
            &self.table,
            subject.age,
            subject.gender.as_str(),
            &features,
            &self.config.evaluate,
        );
        let curvature = self.table.corneal_curvature_mm(subject.age);
        let report = build_report(&features, &evaluation, curvature);

        tracing::info!(
            "analysis: age={} gender={} pupil={:?} status={} diopter={}",
            subject.age,
            subject.gender,
            features.pupil_size_mm,
            evaluation.overall,
            report.diopter
        );
        report
    }

    /// Load an image from disk and analyze it.
    pub fn analyze_path(&self, path: &Path, subject: &Subject) -> Result<Report, AnalysisError> {
        tracing::info!("Loading image: {}", path.display());
        let image = load_image(path)?;
        let (w, h) = image.dimensions();
        tracing::info!("Image size: {}x{}", w, h);
        Ok(self.analyze(&image, subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diopter::DiopterEstimate;
    use crate::evaluate::Finding;
    use crate::test_utils::draw_disk_image;
    use approx::assert_relative_eq;

    #[test]
    fn subject_validation() {
        assert!(Subject::new(0, "male").is_ok());
        assert!(Subject::new(120, "female").is_ok());
        assert!(matches!(
            Subject::new(121, "male"),
            Err(AnalysisError::AgeOutOfRange { age: 121 })
        ));
        assert!(matches!(
            Subject::new(-1, "male"),
            Err(AnalysisError::AgeOutOfRange { age: -1 })
        ));
        assert!(matches!(
            Subject::new(30, "other"),
            Err(AnalysisError::UnknownGender(_))
        ));
    }

    #[test]
    fn gender_must_match_exactly() {
        for tag in [" female ", "Female", "MALE", "male\n", ""] {
            assert!(
                matches!(Subject::new(30, tag), Err(AnalysisError::UnknownGender(_))),
                "{:?}",
                tag
            );
        }
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
    }

    #[test]
    fn blank_photo_degrades_to_placeholders() {
        let analyzer = Analyzer::new();
        let img = RgbImage::from_pixel(320, 240, image::Rgb([240, 240, 240]));
        let report = analyzer.analyze(&img, &Subject::new(25, "male").unwrap());
        assert_eq!(report.pupil_size_mm, None);
        assert_eq!(report.health_status, Finding::PupilNotDetected);
        assert_eq!(report.diopter, DiopterEstimate::NotComputed);
    }

    #[test]
    fn dark_disk_is_measured_in_normalized_pixels() {
        let analyzer = Analyzer::new();
        // 1000x1000 source is halved by normalization: r=100 -> diameter ~100.
        let img = draw_disk_image(1000, 1000, [500.0, 500.0], 100.0, [10, 10, 10], [220, 220, 220]);
        let report = analyzer.analyze(&img, &Subject::new(45, "female").unwrap());
        let d = report.pupil_size_mm.expect("pupil");
        assert_relative_eq!(d, 100.0, epsilon = 3.0);
        // Pixel-scale pupils are far from a ~3mm reference.
        assert_eq!(report.health_status, Finding::Abnormal);
        assert!(report.diopter.value().is_some());
        assert_eq!(report.lens_clarity_status, Some(Finding::Normal));
    }

    #[test]
    fn elderly_subject_still_gets_report() {
        let analyzer = Analyzer::new();
        let img = draw_disk_image(500, 500, [250.0, 250.0], 4.0, [0, 0, 0], [255, 255, 255]);
        let report = analyzer.analyze(&img, &Subject::new(99, "male").unwrap());
        assert_eq!(report.health_status, Finding::AgeGroupNotDefined);
        assert_eq!(report.pupil_size_status, None);
        assert!(report.pupil_size_mm.is_some());
    }

    #[test]
    fn custom_config_is_honored() {
        let config = AnalysisConfig {
            target_size: [200, 200],
            ..AnalysisConfig::default()
        };
        let analyzer = Analyzer::with_config(ReferenceTable::builtin(), config).unwrap();
        let img = RgbImage::new(640, 480);
        assert_eq!(analyzer.normalize(&img).dimensions(), (200, 200));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalysisConfig {
            target_size: [0, 0],
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            Analyzer::with_config(ReferenceTable::builtin(), config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let analyzer = Analyzer::new();
        let subject = Subject::new(30, "male").unwrap();
        assert!(matches!(
            analyzer.analyze_path(Path::new("/nonexistent/eye.jpg"), &subject),
            Err(AnalysisError::Image { .. })
        ));
    }
}

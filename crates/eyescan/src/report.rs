//! Final per-image report: nine labelled fields in fixed order.

use crate::diopter::{estimate_diopter, DiopterEstimate};
use crate::evaluate::{ClinicalParameter, Evaluation, Finding};
use crate::features::ExtractedFeatures;

const NOT_DETECTED: &str = "Not detected";
const UNKNOWN: &str = "Unknown";

/// Report labels in display order.
pub const REPORT_LABELS: [&str; 9] = [
    "Pupil Size (mm)",
    "Iris Pattern",
    "Health Status",
    "Pupil Size Status",
    "Corneal Curvature Status",
    "Lens Clarity Status",
    "Cup-to-Disc Ratio Status",
    "Retinal Thickness Status",
    "Diopter",
];

/// Assembled analysis report.
///
/// Absent upstream values are kept as `None` and rendered with the literal
/// fallbacks `"Not detected"` / `"Unknown"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub pupil_size_mm: Option<f64>,
    pub iris_pattern: Option<String>,
    pub health_status: Finding,
    pub pupil_size_status: Option<Finding>,
    pub corneal_curvature_status: Option<Finding>,
    pub lens_clarity_status: Option<Finding>,
    pub cup_to_disc_ratio_status: Option<Finding>,
    pub retinal_thickness_status: Option<Finding>,
    pub diopter: DiopterEstimate,
}

/// A rendered report value: numbers stay numbers for JSON output.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for ReportValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

fn finding_or_unknown(f: Option<Finding>) -> ReportValue {
    ReportValue::Text(f.map_or(UNKNOWN, Finding::as_str).to_string())
}

impl Report {
    /// `(label, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, ReportValue)> {
        let pupil = match self.pupil_size_mm {
            Some(v) => ReportValue::Number(v),
            None => ReportValue::Text(NOT_DETECTED.to_string()),
        };
        let iris = ReportValue::Text(
            self.iris_pattern
                .clone()
                .unwrap_or_else(|| NOT_DETECTED.to_string()),
        );
        let diopter = match self.diopter.value() {
            Some(v) => ReportValue::Number(v),
            None => ReportValue::Text(self.diopter.to_string()),
        };
        let values = [
            pupil,
            iris,
            ReportValue::Text(self.health_status.to_string()),
            finding_or_unknown(self.pupil_size_status),
            finding_or_unknown(self.corneal_curvature_status),
            finding_or_unknown(self.lens_clarity_status),
            finding_or_unknown(self.cup_to_disc_ratio_status),
            finding_or_unknown(self.retinal_thickness_status),
            diopter,
        ];
        REPORT_LABELS.into_iter().zip(values).collect()
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, value) in self.entries() {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

impl serde::Serialize for Report {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (label, value) in &entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Combine features, evaluation and corneal curvature into a report.
///
/// The diopter is only estimated for a positive pupil measurement.
pub fn build_report(
    features: &ExtractedFeatures,
    evaluation: &Evaluation,
    corneal_curvature_mm: f64,
) -> Report {
    let diopter = match features.pupil_size_mm {
        Some(p) if p > 0.0 => estimate_diopter(corneal_curvature_mm, p),
        _ => DiopterEstimate::NotComputed,
    };
    let status = |p| evaluation.status.get(p);
    Report {
        pupil_size_mm: features.pupil_size_mm,
        iris_pattern: features.iris_pattern.clone(),
        health_status: evaluation.overall,
        pupil_size_status: status(ClinicalParameter::PupilSize),
        corneal_curvature_status: status(ClinicalParameter::CornealCurvature),
        lens_clarity_status: status(ClinicalParameter::LensClarity),
        cup_to_disc_ratio_status: status(ClinicalParameter::CupToDiscRatio),
        retinal_thickness_status: status(ClinicalParameter::RetinalThickness),
        diopter,
    }
}

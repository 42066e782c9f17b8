//! Comparison of extracted features against the age/gender reference.
//!
//! Only pupil size is actually scored. The other four clinical parameters
//! have no measurement behind them yet and are reported as `Normal`
//! unconditionally.

use crate::features::ExtractedFeatures;
use crate::reference::ReferenceTable;

/// Scoring tolerances.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvaluateConfig {
    /// Deviation (mm) from the adjusted bright-light reference below which a
    /// pupil is considered normal.
    pub max_deviation_mm: f64,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            max_deviation_mm: 1.0,
        }
    }
}

/// Outcome of a single comparison, or of the evaluation as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Finding {
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Abnormal")]
    Abnormal,
    #[serde(rename = "Pupil size not detected")]
    PupilNotDetected,
    #[serde(rename = "Age group not defined")]
    AgeGroupNotDefined,
}

impl Finding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Abnormal => "Abnormal",
            Self::PupilNotDetected => "Pupil size not detected",
            Self::AgeGroupNotDefined => "Age group not defined",
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical parameters carried in an [`EvaluationStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClinicalParameter {
    PupilSize,
    CornealCurvature,
    LensClarity,
    CupToDiscRatio,
    RetinalThickness,
}

impl ClinicalParameter {
    /// All parameters in report order.
    pub const ALL: [ClinicalParameter; 5] = [
        Self::PupilSize,
        Self::CornealCurvature,
        Self::LensClarity,
        Self::CupToDiscRatio,
        Self::RetinalThickness,
    ];

    /// Status key used in reports.
    pub fn status_label(self) -> &'static str {
        match self {
            Self::PupilSize => "Pupil Size Status",
            Self::CornealCurvature => "Corneal Curvature Status",
            Self::LensClarity => "Lens Clarity Status",
            Self::CupToDiscRatio => "Cup-to-Disc Ratio Status",
            Self::RetinalThickness => "Retinal Thickness Status",
        }
    }
}

/// Per-parameter findings. Either empty (age not covered) or holding all
/// five parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationStatus {
    entries: Vec<(ClinicalParameter, Finding)>,
}

impl EvaluationStatus {
    fn scored(pupil: Finding) -> Self {
        let entries = ClinicalParameter::ALL
            .into_iter()
            .map(|p| match p {
                ClinicalParameter::PupilSize => (p, pupil),
                // No measurement exists for these yet.
                _ => (p, Finding::Normal),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, parameter: ClinicalParameter) -> Option<Finding> {
        self.entries
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|&(_, f)| f)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClinicalParameter, Finding)> + '_ {
        self.entries.iter().copied()
    }
}

impl serde::Serialize for EvaluationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (p, f) in &self.entries {
            map.serialize_entry(p.status_label(), f)?;
        }
        map.end()
    }
}

/// Overall result plus per-parameter status.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Evaluation {
    pub overall: Finding,
    pub status: EvaluationStatus,
    /// Pupil deviation (mm) from the adjusted reference, when measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_mm: Option<f64>,
}

/// Score extracted features for a subject of the given age and gender tag.
///
/// The gender adjustment is applied to a local copy of the bucket's pupil
/// reference; `table` is never modified.
pub fn evaluate(
    table: &ReferenceTable,
    age: i64,
    gender: &str,
    features: &ExtractedFeatures,
    config: &EvaluateConfig,
) -> Evaluation {
    let Some(bucket) = table.lookup(age) else {
        tracing::debug!("age {} is outside every reference age group", age);
        return Evaluation {
            overall: Finding::AgeGroupNotDefined,
            status: EvaluationStatus::default(),
            deviation_mm: None,
        };
    };

    let reference = table
        .pupil_reference(bucket)
        .with_bright_offset(table.adjustment(gender));

    let (overall, deviation_mm) = match features.pupil_size_mm {
        Some(measured) => {
            let deviation = (measured - reference.bright_light).abs();
            let finding = if deviation < config.max_deviation_mm {
                Finding::Normal
            } else {
                Finding::Abnormal
            };
            tracing::debug!(
                "age group {}: measured={:.2}mm target={:.2}mm deviation={:.2}mm -> {}",
                bucket,
                measured,
                reference.bright_light,
                deviation,
                finding
            );
            (finding, Some(deviation))
        }
        None => (Finding::PupilNotDetected, None),
    };

    Evaluation {
        overall,
        status: EvaluationStatus::scored(overall),
        deviation_mm,
    }
}

//! Healthy-eye reference values bucketed by age, plus gender corrections.
//!
//! The built-in table holds illustrative placeholder numbers, not clinically
//! derived norms. A replacement table can be loaded from JSON using the
//! `eyescan.reference.v1` schema, which keys age groups by their bucket label
//! (`"0-5"`, `"6-12"`, ...) and gender corrections by tag.
//!
//! Profiles are immutable once the table is built; callers only ever receive
//! shared references or `Copy` values, so a per-request adjustment can never
//! leak into the table.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::AnalysisError;

const REFERENCE_SCHEMA_V1: &str = "eyescan.reference.v1";

/// Bright/dim pupil pair used when a bucket has no profile in the table.
pub const DEFAULT_PUPIL_SIZE: PupilSize = PupilSize {
    bright_light: 3.0,
    dim_light: 7.0,
};

/// Corneal curvature (mm) used when the age has no profile in the table.
pub const DEFAULT_CORNEAL_CURVATURE_MM: f64 = 7.8;

const DEFAULT_IRIS_PATTERN: &str = "uniform";

/// One of the nine inclusive age ranges covered by the reference table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AgeBucket {
    #[serde(rename = "0-5")]
    Age0To5,
    #[serde(rename = "6-12")]
    Age6To12,
    #[serde(rename = "13-20")]
    Age13To20,
    #[serde(rename = "21-30")]
    Age21To30,
    #[serde(rename = "31-40")]
    Age31To40,
    #[serde(rename = "41-50")]
    Age41To50,
    #[serde(rename = "51-60")]
    Age51To60,
    #[serde(rename = "61-70")]
    Age61To70,
    #[serde(rename = "71-80")]
    Age71To80,
}

impl AgeBucket {
    /// All buckets in ascending age order.
    pub const ALL: [AgeBucket; 9] = [
        Self::Age0To5,
        Self::Age6To12,
        Self::Age13To20,
        Self::Age21To30,
        Self::Age31To40,
        Self::Age41To50,
        Self::Age51To60,
        Self::Age61To70,
        Self::Age71To80,
    ];

    /// Inclusive `[min, max]` age range of this bucket.
    pub fn range(self) -> [i64; 2] {
        match self {
            Self::Age0To5 => [0, 5],
            Self::Age6To12 => [6, 12],
            Self::Age13To20 => [13, 20],
            Self::Age21To30 => [21, 30],
            Self::Age31To40 => [31, 40],
            Self::Age41To50 => [41, 50],
            Self::Age51To60 => [51, 60],
            Self::Age61To70 => [61, 70],
            Self::Age71To80 => [71, 80],
        }
    }

    /// Bucket label as used in reference JSON and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Age0To5 => "0-5",
            Self::Age6To12 => "6-12",
            Self::Age13To20 => "13-20",
            Self::Age21To30 => "21-30",
            Self::Age31To40 => "31-40",
            Self::Age41To50 => "41-50",
            Self::Age51To60 => "51-60",
            Self::Age61To70 => "61-70",
            Self::Age71To80 => "71-80",
        }
    }

    /// Map an age to its bucket with inclusive range tests in ascending order.
    ///
    /// Ages outside `[0, 80]` have no bucket.
    pub fn from_age(age: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|b| {
            let [lo, hi] = b.range();
            (lo..=hi).contains(&age)
        })
    }
}

impl std::fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lens clarity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensClarity {
    Clear,
    Cloudy,
}

impl std::fmt::Display for LensClarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clear => f.write_str("clear"),
            Self::Cloudy => f.write_str("cloudy"),
        }
    }
}

/// Expected pupil diameter (mm) under bright and dim light.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PupilSize {
    pub bright_light: f64,
    pub dim_light: f64,
}

impl PupilSize {
    /// Return a copy with `offset_mm` added to the bright-light value only.
    pub fn with_bright_offset(self, offset_mm: f64) -> Self {
        Self {
            bright_light: self.bright_light + offset_mm,
            ..self
        }
    }
}

/// Healthy baseline values for one age bucket.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceProfile {
    pub corneal_curvature_mm: f64,
    pub pupil_size_mm: PupilSize,
    pub lens_clarity: LensClarity,
    pub cup_to_disc_ratio: f64,
    pub retinal_thickness_um: u32,
    pub iris_pattern: String,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct GenderAdjustmentSpec {
    pupil_size_mm_adjustment: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceTableSpecV1 {
    schema: String,
    age_groups: BTreeMap<AgeBucket, ReferenceProfile>,
    #[serde(default)]
    gender: BTreeMap<String, GenderAdjustmentSpec>,
}

/// Age-bucketed reference profiles and gender pupil-size corrections.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    profiles: BTreeMap<AgeBucket, ReferenceProfile>,
    gender_adjustments: BTreeMap<String, f64>,
}

// (bucket, corneal curvature mm, pupil bright mm, pupil dim mm, lens, cup/disc, retina um)
type BuiltinRow = (AgeBucket, f64, f64, f64, LensClarity, f64, u32);

const BUILTIN_ROWS: [BuiltinRow; 9] = [
    (AgeBucket::Age0To5, 7.8, 3.5, 7.5, LensClarity::Clear, 0.3, 270),
    (AgeBucket::Age6To12, 7.7, 3.5, 7.5, LensClarity::Clear, 0.3, 275),
    (AgeBucket::Age13To20, 7.8, 3.0, 7.0, LensClarity::Clear, 0.3, 280),
    (AgeBucket::Age21To30, 7.8, 3.0, 7.0, LensClarity::Clear, 0.3, 285),
    (AgeBucket::Age31To40, 7.9, 3.2, 6.8, LensClarity::Clear, 0.35, 290),
    (AgeBucket::Age41To50, 7.9, 3.2, 6.5, LensClarity::Clear, 0.35, 295),
    (AgeBucket::Age51To60, 8.0, 3.5, 6.2, LensClarity::Cloudy, 0.4, 300),
    (AgeBucket::Age61To70, 8.0, 3.5, 6.0, LensClarity::Cloudy, 0.4, 305),
    (AgeBucket::Age71To80, 8.1, 3.7, 6.0, LensClarity::Cloudy, 0.45, 310),
];

const BUILTIN_GENDER_ADJUSTMENTS: [(&str, f64); 2] = [("male", 0.2), ("female", 0.15)];

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceTable {
    /// The built-in illustrative table.
    pub fn builtin() -> Self {
        let profiles = BUILTIN_ROWS
            .iter()
            .map(|&(bucket, curvature, bright, dim, lens, cdr, retina)| {
                (
                    bucket,
                    ReferenceProfile {
                        corneal_curvature_mm: curvature,
                        pupil_size_mm: PupilSize {
                            bright_light: bright,
                            dim_light: dim,
                        },
                        lens_clarity: lens,
                        cup_to_disc_ratio: cdr,
                        retinal_thickness_um: retina,
                        iris_pattern: DEFAULT_IRIS_PATTERN.to_string(),
                    },
                )
            })
            .collect();
        let gender_adjustments = BUILTIN_GENDER_ADJUSTMENTS
            .iter()
            .map(|&(tag, adj)| (tag.to_string(), adj))
            .collect();
        Self {
            profiles,
            gender_adjustments,
        }
    }

    /// Bucket for `age`, or `None` outside `[0, 80]`.
    pub fn lookup(&self, age: i64) -> Option<AgeBucket> {
        AgeBucket::from_age(age)
    }

    /// Profile stored for `bucket`, if the table has one.
    pub fn profile(&self, bucket: AgeBucket) -> Option<&ReferenceProfile> {
        self.profiles.get(&bucket)
    }

    /// Profile for the bucket containing `age`.
    pub fn profile_for_age(&self, age: i64) -> Option<&ReferenceProfile> {
        self.lookup(age).and_then(|b| self.profile(b))
    }

    /// Iterate stored profiles in ascending age order.
    pub fn profiles(&self) -> impl Iterator<Item = (AgeBucket, &ReferenceProfile)> + '_ {
        self.profiles.iter().map(|(&b, p)| (b, p))
    }

    /// Bright-light pupil correction for a gender tag. Unknown tags get 0.
    pub fn adjustment(&self, gender: &str) -> f64 {
        self.gender_adjustments.get(gender).copied().unwrap_or(0.0)
    }

    /// Pupil reference pair for `bucket` as a request-local copy.
    ///
    /// Falls back to [`DEFAULT_PUPIL_SIZE`] when the bucket has no profile.
    pub fn pupil_reference(&self, bucket: AgeBucket) -> PupilSize {
        match self.profile(bucket) {
            Some(p) => p.pupil_size_mm,
            None => {
                tracing::warn!(
                    "no reference profile for age group {}; using default pupil size",
                    bucket
                );
                DEFAULT_PUPIL_SIZE
            }
        }
    }

    /// Corneal curvature for `age`, or [`DEFAULT_CORNEAL_CURVATURE_MM`] when
    /// the age has no bucket or the bucket has no profile.
    pub fn corneal_curvature_mm(&self, age: i64) -> f64 {
        self.profile_for_age(age)
            .map(|p| p.corneal_curvature_mm)
            .unwrap_or(DEFAULT_CORNEAL_CURVATURE_MM)
    }

    /// Load a reference table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse a reference table from JSON text.
    pub fn from_json_str(data: &str) -> Result<Self, AnalysisError> {
        let spec: ReferenceTableSpecV1 = serde_json::from_str(data)?;
        Self::from_spec(spec).map_err(AnalysisError::InvalidReference)
    }

    /// Serialize the table using the `eyescan.reference.v1` schema.
    pub fn to_json_pretty(&self) -> Result<String, AnalysisError> {
        let spec = ReferenceTableSpecV1 {
            schema: REFERENCE_SCHEMA_V1.to_string(),
            age_groups: self.profiles.clone(),
            gender: self
                .gender_adjustments
                .iter()
                .map(|(tag, &adj)| {
                    (
                        tag.clone(),
                        GenderAdjustmentSpec {
                            pupil_size_mm_adjustment: adj,
                        },
                    )
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&spec)?)
    }

    fn from_spec(spec: ReferenceTableSpecV1) -> Result<Self, String> {
        if spec.schema != REFERENCE_SCHEMA_V1 {
            return Err(format!(
                "unsupported reference schema '{}' (expected '{}')",
                spec.schema, REFERENCE_SCHEMA_V1
            ));
        }
        for (bucket, profile) in &spec.age_groups {
            validate_profile(profile).map_err(|e| format!("age group {}: {}", bucket, e))?;
        }
        let mut gender_adjustments = BTreeMap::new();
        for (tag, adj) in spec.gender {
            if !adj.pupil_size_mm_adjustment.is_finite() {
                return Err(format!("gender '{}': adjustment must be finite", tag));
            }
            gender_adjustments.insert(tag, adj.pupil_size_mm_adjustment);
        }
        Ok(Self {
            profiles: spec.age_groups,
            gender_adjustments,
        })
    }
}

fn validate_profile(p: &ReferenceProfile) -> Result<(), String> {
    let positive = |name: &str, v: f64| {
        if v.is_finite() && v > 0.0 {
            Ok(())
        } else {
            Err(format!("{} must be finite and > 0, got {}", name, v))
        }
    };
    positive("corneal_curvature_mm", p.corneal_curvature_mm)?;
    positive("pupil_size_mm.bright_light", p.pupil_size_mm.bright_light)?;
    positive("pupil_size_mm.dim_light", p.pupil_size_mm.dim_light)?;
    if !(0.0..=1.0).contains(&p.cup_to_disc_ratio) {
        return Err(format!(
            "cup_to_disc_ratio must be in [0, 1], got {}",
            p.cup_to_disc_ratio
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn every_age_in_range_maps_to_its_bucket() {
        for bucket in AgeBucket::ALL {
            let [lo, hi] = bucket.range();
            for age in lo..=hi {
                assert_eq!(AgeBucket::from_age(age), Some(bucket), "age {}", age);
            }
        }
    }

    #[test]
    fn ages_outside_table_have_no_bucket() {
        let table = ReferenceTable::builtin();
        for age in [-1, 81, 100, 120] {
            assert_eq!(table.lookup(age), None, "age {}", age);
        }
    }

    #[test]
    fn buckets_are_contiguous() {
        for pair in AgeBucket::ALL.windows(2) {
            assert_eq!(pair[0].range()[1] + 1, pair[1].range()[0]);
        }
    }

    #[test]
    fn gender_adjustments() {
        let table = ReferenceTable::builtin();
        assert_relative_eq!(table.adjustment("male"), 0.2);
        assert_relative_eq!(table.adjustment("female"), 0.15);
        assert_relative_eq!(table.adjustment("other"), 0.0);
        assert_relative_eq!(table.adjustment(""), 0.0);
    }

    #[test]
    fn builtin_covers_every_bucket() {
        let table = ReferenceTable::builtin();
        assert_eq!(table.profiles().count(), 9);
        let p = table.profile(AgeBucket::Age21To30).expect("21-30 profile");
        assert_relative_eq!(p.pupil_size_mm.bright_light, 3.0);
        assert_relative_eq!(p.pupil_size_mm.dim_light, 7.0);
        assert_eq!(p.retinal_thickness_um, 285);
        assert_eq!(p.iris_pattern, "uniform");
        assert_eq!(
            table.profile(AgeBucket::Age71To80).map(|p| p.lens_clarity),
            Some(LensClarity::Cloudy)
        );
    }

    #[test]
    fn bright_offset_leaves_original_untouched() {
        let table = ReferenceTable::builtin();
        let base = table.pupil_reference(AgeBucket::Age21To30);
        let adjusted = base.with_bright_offset(0.2);
        assert_relative_eq!(adjusted.bright_light, 3.2);
        assert_relative_eq!(adjusted.dim_light, 7.0);
        assert_relative_eq!(
            table.pupil_reference(AgeBucket::Age21To30).bright_light,
            3.0
        );
    }

    #[test]
    fn corneal_curvature_falls_back_outside_table() {
        let table = ReferenceTable::builtin();
        assert_relative_eq!(table.corneal_curvature_mm(8), 7.7);
        assert_relative_eq!(table.corneal_curvature_mm(75), 8.1);
        assert_relative_eq!(table.corneal_curvature_mm(95), DEFAULT_CORNEAL_CURVATURE_MM);
    }

    #[test]
    fn json_round_trip_preserves_table() {
        let table = ReferenceTable::builtin();
        let json = table.to_json_pretty().expect("serialize");
        assert!(json.contains("\"21-30\""));
        let parsed = ReferenceTable::from_json_str(&json).expect("parse");
        assert_eq!(parsed, table);
    }

    #[test]
    fn partial_table_uses_default_pupil_reference() {
        let json = r#"{
            "schema": "eyescan.reference.v1",
            "age_groups": {
                "0-5": {
                    "corneal_curvature_mm": 7.6,
                    "pupil_size_mm": { "bright_light": 4.0, "dim_light": 8.0 },
                    "lens_clarity": "clear",
                    "cup_to_disc_ratio": 0.3,
                    "retinal_thickness_um": 270,
                    "iris_pattern": "uniform"
                }
            }
        }"#;
        let table = ReferenceTable::from_json_str(json).expect("parse");
        assert_relative_eq!(table.pupil_reference(AgeBucket::Age0To5).bright_light, 4.0);
        assert_eq!(
            table.pupil_reference(AgeBucket::Age31To40),
            DEFAULT_PUPIL_SIZE
        );
        assert_relative_eq!(table.corneal_curvature_mm(35), DEFAULT_CORNEAL_CURVATURE_MM);
        assert_relative_eq!(table.adjustment("male"), 0.0);
    }

    #[test]
    fn rejects_wrong_schema_and_bad_values() {
        let wrong_schema = r#"{ "schema": "eyescan.reference.v0", "age_groups": {} }"#;
        assert!(matches!(
            ReferenceTable::from_json_str(wrong_schema),
            Err(AnalysisError::InvalidReference(_))
        ));

        let negative = r#"{
            "schema": "eyescan.reference.v1",
            "age_groups": {
                "6-12": {
                    "corneal_curvature_mm": -1.0,
                    "pupil_size_mm": { "bright_light": 3.0, "dim_light": 7.0 },
                    "lens_clarity": "clear",
                    "cup_to_disc_ratio": 0.3,
                    "retinal_thickness_um": 270,
                    "iris_pattern": "uniform"
                }
            }
        }"#;
        let err = ReferenceTable::from_json_str(negative).unwrap_err();
        assert!(err.to_string().contains("6-12"), "{}", err);

        let unknown_bucket = r#"{ "schema": "eyescan.reference.v1", "age_groups": { "81-90": {} } }"#;
        assert!(matches!(
            ReferenceTable::from_json_str(unknown_bucket),
            Err(AnalysisError::Json(_))
        ));
    }
}

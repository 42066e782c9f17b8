//! Illustrative refractive-power estimate from corneal curvature and pupil size.
//!
//! `focal_length = curvature_m / (pupil_m * 0.02)`, `diopter = 1 / focal_length`,
//! rounded to two decimals and capped at 30. The 0.02 factor is an
//! uncalibrated scaling constant, not an optical model.

/// Scaling factor applied to the pupil size in the focal-length formula.
pub const FOCAL_SCALE: f64 = 0.02;

/// Upper cap for reported diopter values.
pub const MAX_DIOPTER: f64 = 30.0;

/// Diopter value or the reason none could be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiopterEstimate {
    /// Rounded, capped diopter.
    Value(f64),
    /// Pupil size was zero, negative or not a number.
    InvalidPupilSize,
    /// Corneal curvature produced a zero focal length.
    ZeroFocalLength,
    /// The report had no usable pupil measurement to feed the estimator.
    NotComputed,
}

impl DiopterEstimate {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Diagnostic text for the non-value variants.
    pub fn diagnostic(self) -> Option<&'static str> {
        match self {
            Self::Value(_) => None,
            Self::InvalidPupilSize => Some("Pupil size is not valid for diopter calculation"),
            Self::ZeroFocalLength => Some("Focal length cannot be zero"),
            Self::NotComputed => Some("Invalid pupil size for diopter calculation"),
        }
    }
}

impl std::fmt::Display for DiopterEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.value(), self.diagnostic()) {
            (Some(v), _) => write!(f, "{}", v),
            (None, Some(msg)) => f.write_str(msg),
            (None, None) => Ok(()),
        }
    }
}

impl serde::Serialize for DiopterEstimate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.value(), self.diagnostic()) {
            (Some(v), _) => serializer.serialize_f64(v),
            (None, Some(msg)) => serializer.serialize_str(msg),
            (None, None) => serializer.serialize_none(),
        }
    }
}

/// Estimate diopter from corneal curvature and pupil size, both in mm.
pub fn estimate_diopter(corneal_curvature_mm: f64, pupil_size_mm: f64) -> DiopterEstimate {
    // Also rejects NaN.
    if !(pupil_size_mm > 0.0) {
        return DiopterEstimate::InvalidPupilSize;
    }

    let curvature_m = corneal_curvature_mm / 1000.0;
    let pupil_m = pupil_size_mm / 1000.0;
    let focal_length_m = curvature_m / (pupil_m * FOCAL_SCALE);
    if focal_length_m == 0.0 {
        return DiopterEstimate::ZeroFocalLength;
    }

    let diopter = round_to_hundredths(1.0 / focal_length_m);
    DiopterEstimate::Value(diopter.min(MAX_DIOPTER))
}

fn round_to_hundredths(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn typical_inputs_round_to_hundredths() {
        // focal = 0.0078 / (0.0032 * 0.02) = 121.875 m, 1/121.875 = 0.0082
        let d = estimate_diopter(7.8, 3.2).value().expect("value");
        assert_relative_eq!(d, 0.01);
    }

    #[test]
    fn pixel_scale_pupil_gives_larger_power() {
        // 0.0078 / (0.2 * 0.02) = 1.95 m -> 0.5128
        let d = estimate_diopter(7.8, 200.0).value().expect("value");
        assert_relative_eq!(d, 0.51);
    }

    #[test]
    fn large_values_are_capped() {
        // 0.0078 / (20.0 * 0.02) = 0.0195 m -> 51.28
        assert_eq!(estimate_diopter(7.8, 20_000.0), DiopterEstimate::Value(MAX_DIOPTER));
    }

    #[test]
    fn non_positive_pupil_is_rejected() {
        for p in [0.0, -3.0, f64::NAN] {
            let d = estimate_diopter(7.8, p);
            assert_eq!(d, DiopterEstimate::InvalidPupilSize);
            assert_eq!(d.to_string(), "Pupil size is not valid for diopter calculation");
        }
    }

    #[test]
    fn zero_curvature_is_zero_focal_length() {
        let d = estimate_diopter(0.0, 3.2);
        assert_eq!(d, DiopterEstimate::ZeroFocalLength);
        assert_eq!(d.to_string(), "Focal length cannot be zero");
    }

    #[test]
    fn serializes_number_or_message() {
        assert_eq!(
            serde_json::to_value(DiopterEstimate::Value(0.51)).unwrap(),
            serde_json::json!(0.51)
        );
        assert_eq!(
            serde_json::to_value(DiopterEstimate::NotComputed).unwrap(),
            serde_json::json!("Invalid pupil size for diopter calculation")
        );
    }
}

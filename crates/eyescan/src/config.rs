use std::path::Path;

use crate::error::AnalysisError;
use crate::evaluate::EvaluateConfig;
use crate::features::ExtractConfig;

/// Top-level analysis configuration.
///
/// Every field has a default, so a JSON file only needs the keys it
/// overrides.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Resolution `[width, height]` every image is resized to before extraction.
    pub target_size: [u32; 2],
    /// Pupil extraction parameters.
    pub extract: ExtractConfig,
    /// Reference comparison tolerances.
    pub evaluate: EvaluateConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_size: [500, 500],
            extract: ExtractConfig::default(),
            evaluate: EvaluateConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json_str(data: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.target_size.contains(&0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "target_size must be non-zero, got {:?}",
                self.target_size
            )));
        }
        let tol = self.evaluate.max_deviation_mm;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "evaluate.max_deviation_mm must be finite and > 0, got {}",
                tol
            )));
        }
        Ok(())
    }
}

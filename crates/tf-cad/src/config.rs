//! Workflow configuration
//!
//! Settings that the workflow would otherwise hard-code: thread standard,
//! chamfer size, clearance defaults and the offset sign convention. Stored
//! as RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which way a positive clearance moves the target face
///
/// Host kernels disagree on whether a cavity face's normal points into the
/// cavity or into the surrounding material. The default matches kernels
/// where the outward normal of a cavity wall points into the cavity, so the
/// clearance is applied as a negative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClearanceDirection {
    /// Offset by `-clearance` along the face normal
    #[default]
    AgainstNormal,
    /// Offset by `+clearance` along the face normal
    AlongNormal,
}

impl ClearanceDirection {
    /// Signed offset distance for a clearance magnitude
    pub fn signed(&self, clearance: f64) -> f64 {
        match self {
            ClearanceDirection::AgainstNormal => -clearance,
            ClearanceDirection::AlongNormal => clearance,
        }
    }
}

/// Named clearance suggestion shown in the clearance prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearancePreset {
    pub name: String,
    pub clearance_mm: f64,
}

impl ClearancePreset {
    pub fn new(name: impl Into<String>, clearance_mm: f64) -> Self {
        Self {
            name: name.into(),
            clearance_mm,
        }
    }
}

/// Fit workflow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Substring matched against catalog family names
    pub thread_family: String,
    /// Tolerance class for the external thread
    pub tolerance_class: String,
    /// Lead-in chamfer distance in millimeters
    pub chamfer_distance_mm: f64,
    /// Clearance offered as the prompt default, in millimeters
    pub default_clearance_mm: f64,
    /// Offset sign convention of the host kernel
    pub clearance_direction: ClearanceDirection,
    /// Model the thread as real geometry
    pub modeled_thread: bool,
    /// Thread the full length of the face
    pub full_length: bool,
    /// Suggestions listed in the clearance prompt
    pub clearance_presets: Vec<ClearancePreset>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            thread_family: "ISO Metric".into(),
            tolerance_class: "6g".into(),
            chamfer_distance_mm: 1.0,
            default_clearance_mm: 0.2,
            clearance_direction: ClearanceDirection::AgainstNormal,
            modeled_thread: true,
            full_length: true,
            clearance_presets: vec![
                ClearancePreset::new("Bambu X1E", 0.2),
                ClearancePreset::new("Resin", 0.1),
            ],
        }
    }
}

impl FitConfig {
    /// Text for the clearance prompt, including presets
    pub fn clearance_prompt(&self) -> String {
        let mut msg = String::from("Enter clearance (mm)");
        if !self.clearance_presets.is_empty() {
            let hints: Vec<String> = self
                .clearance_presets
                .iter()
                .map(|p| format!("{} for {}", p.clearance_mm, p.name))
                .collect();
            msg.push_str(&format!("\n(Try {})", hints.join(", ")));
        }
        msg
    }

    /// Save config to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse config from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: FitConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.chamfer_distance_mm.is_finite() || self.chamfer_distance_mm <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "chamfer_distance_mm must be positive, got {}",
                self.chamfer_distance_mm
            )));
        }
        if !self.default_clearance_mm.is_finite() || self.default_clearance_mm <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_clearance_mm must be positive, got {}",
                self.default_clearance_mm
            )));
        }
        if self.thread_family.trim().is_empty() {
            return Err(ConfigError::Invalid("thread_family must not be empty".into()));
        }
        Ok(())
    }
}

/// Config-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FitConfig::default();
        assert_eq!(config.thread_family, "ISO Metric");
        assert_eq!(config.tolerance_class, "6g");
        assert_eq!(config.chamfer_distance_mm, 1.0);
        assert_eq!(config.clearance_direction.signed(0.2), -0.2);
    }

    #[test]
    fn test_clearance_prompt() {
        let prompt = FitConfig::default().clearance_prompt();
        assert_eq!(
            prompt,
            "Enter clearance (mm)\n(Try 0.2 for Bambu X1E, 0.1 for Resin)"
        );
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config =
            FitConfig::from_ron("(default_clearance_mm: 0.1, clearance_direction: AlongNormal)")
                .unwrap();
        assert_eq!(config.default_clearance_mm, 0.1);
        assert_eq!(config.clearance_direction.signed(0.1), 0.1);
        assert_eq!(config.thread_family, "ISO Metric");
    }

    #[test]
    fn test_rejects_bad_chamfer() {
        assert!(matches!(
            FitConfig::from_ron("(chamfer_distance_mm: 0.0)"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threadfit.ron");

        let config = FitConfig {
            tolerance_class: "4g6g".into(),
            ..FitConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(FitConfig::load(&path).unwrap(), config);
    }
}

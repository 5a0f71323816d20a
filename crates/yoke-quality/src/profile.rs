//! Scoring profile: thresholds and weights used by the Quality Scorer
//!
//! Every field has a default, so a `quality:` section in the YAML config
//! only needs the values it overrides.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use yoke_core::YokeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringProfile {
    /// Profile name (e.g., "default@1.0")
    pub name: String,

    // === Error rate marks ===

    /// Error rate above which the session is flagged critical
    pub critical_error_rate: f64,

    /// Error rate above which a warning is raised
    pub warning_error_rate: f64,

    // === Rating weights ===

    /// Points lost per critical finding
    pub critical_weight: u32,

    /// Points lost per warning
    pub warning_weight: u32,

    /// Points lost per unit of error rate (rounded)
    pub error_rate_weight: f64,

    /// Points lost when the log was partial or missing
    pub incomplete_penalty: u32,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            name: "default@1.0".to_string(),
            critical_error_rate: 0.30,
            warning_error_rate: 0.10,
            critical_weight: 3,
            warning_weight: 1,
            error_rate_weight: 10.0,
            incomplete_penalty: 1,
        }
    }
}

impl ScoringProfile {
    pub fn from_yaml(yaml: &str) -> Result<Self, YokeError> {
        let profile: Self =
            serde_yaml::from_str(yaml).map_err(|e| YokeError::Config(e.to_string()))?;
        profile.validate()
    }

    /// Profile from the `quality` section of the loaded configuration.
    pub fn from_value(value: Option<&Value>) -> Result<Self, YokeError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(v) => {
                let profile: Self = serde_json::from_value(v.clone())
                    .map_err(|e| YokeError::Config(format!("quality: {}", e)))?;
                profile.validate()
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String, YokeError> {
        serde_yaml::to_string(self).map_err(|e| YokeError::Config(e.to_string()))
    }

    /// Marks must be ordered within [0, 1]; weights must be non-negative.
    fn validate(self) -> Result<Self, YokeError> {
        let rates_ok = (0.0..=1.0).contains(&self.warning_error_rate)
            && (0.0..=1.0).contains(&self.critical_error_rate)
            && self.warning_error_rate <= self.critical_error_rate;
        if !rates_ok {
            return Err(YokeError::Config(format!(
                "quality: error rate marks must satisfy 0 <= warning ({}) <= critical ({}) <= 1",
                self.warning_error_rate, self.critical_error_rate
            )));
        }
        if self.error_rate_weight.is_nan() || self.error_rate_weight < 0.0 {
            return Err(YokeError::Config(
                "quality: error_rate_weight must be non-negative".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_profile() {
        let profile = ScoringProfile::default();
        assert_eq!(profile.critical_error_rate, 0.30);
        assert_eq!(profile.warning_error_rate, 0.10);
        assert_eq!(profile.critical_weight, 3);
    }

    #[test]
    fn test_partial_yaml_override() {
        let profile = ScoringProfile::from_yaml("critical_weight: 5\nname: strict@1.0\n").unwrap();
        assert_eq!(profile.critical_weight, 5);
        assert_eq!(profile.name, "strict@1.0");
        assert_eq!(profile.warning_weight, 1);
    }

    #[test]
    fn test_from_config_value() {
        assert_eq!(ScoringProfile::from_value(None).unwrap(), ScoringProfile::default());

        let value = json!({ "warning_error_rate": 0.05 });
        let profile = ScoringProfile::from_value(Some(&value)).unwrap();
        assert_eq!(profile.warning_error_rate, 0.05);
    }

    #[test]
    fn test_rejects_inverted_marks() {
        let value = json!({ "warning_error_rate": 0.5, "critical_error_rate": 0.2 });
        assert!(matches!(
            ScoringProfile::from_value(Some(&value)),
            Err(YokeError::Config(_))
        ));
        assert!(ScoringProfile::from_yaml("error_rate_weight: -1.0").is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let yaml = ScoringProfile::default().to_yaml().unwrap();
        assert_eq!(ScoringProfile::from_yaml(&yaml).unwrap(), ScoringProfile::default());
    }
}

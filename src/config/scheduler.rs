//! Scheduler policy configuration.

use serde::{Deserialize, Serialize};

/// Policy knobs supplied at scheduler construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of simultaneously running tasks. Must be positive.
    pub max_concurrent: usize,
    /// When true, one terminal failure prevents further dispatch and rejects
    /// everything still queued.
    pub stop_on_error: bool,
    /// Number of automatic re-attempts per task before a failure becomes
    /// terminal.
    pub retry_times: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            stop_on_error: false,
            retry_times: 0,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// Missing fields take their documented defaults.
    ///
    /// # Errors
    ///
    /// Returns a message on parse failure or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.max_concurrent, 3);
        assert!(!cfg.stop_on_error);
        assert_eq!(cfg.retry_times, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_max_concurrent_rejected() {
        let cfg = SchedulerConfig {
            max_concurrent: 0,
            ..SchedulerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let cfg = SchedulerConfig::from_json_str(
            r#"{ "max_concurrent": 8, "stop_on_error": true, "retry_times": 2 }"#,
        )
        .unwrap();
        assert_eq!(cfg.max_concurrent, 8);
        assert!(cfg.stop_on_error);
        assert_eq!(cfg.retry_times, 2);
    }

    #[test]
    fn test_from_json_missing_fields_use_defaults() {
        let cfg = SchedulerConfig::from_json_str(r#"{ "retry_times": 1 }"#).unwrap();
        assert_eq!(cfg.max_concurrent, 3);
        assert!(!cfg.stop_on_error);
        assert_eq!(cfg.retry_times, 1);
    }

    #[test]
    fn test_from_json_invalid_values_rejected() {
        assert!(SchedulerConfig::from_json_str(r#"{ "max_concurrent": 0 }"#).is_err());
        assert!(SchedulerConfig::from_json_str("not json").is_err());
    }
}

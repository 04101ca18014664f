//! Application-supplied engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//!
//! ```
//! use lexdoc::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{"scale": {"min": 0.25, "max": 4.0}}"#)?;
//! assert_eq!(config.scale.max, 4.0);
//! # Ok::<(), lexdoc::Error>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::{ClauseConfig, ClauseSegmenter, SeverityClassifier, SeverityTable};
use crate::error::{Error, Result};
use crate::render::ScaleBounds;

/// Scale bounds, clause grammar, and severity rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scale: ScaleBounds,
    pub clauses: ClauseConfig,
    pub severity: SeverityTable,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::debug!("Loaded engine config from {}", path.display());
        Self::from_json(&json)
    }

    /// Check scale bounds and compile every pattern once.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "scale bounds must satisfy 0 < min <= max, got {}..{}",
                self.scale.min, self.scale.max
            )));
        }
        ClauseSegmenter::new(&self.clauses)?;
        SeverityClassifier::new(&self.severity)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Severity;
    use std::io::Write;

    #[test]
    fn test_empty_object_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.severity.default_insert_delete, Severity::Medium);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"clauses": {"marker_pattern": "(?m)^(§\\s*\\d+)"},
                "severity": {"default_modify": "medium"}}"#,
        )
        .unwrap();
        assert_eq!(config.clauses.marker_pattern, r"(?m)^(§\s*\d+)");
        assert_eq!(config.severity.default_modify, Severity::Medium);
        assert_eq!(config.severity.rules.len(), 2);
        assert_eq!(config.scale, ScaleBounds::default());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"scale": {"min": 3.0, "max": 1.0}}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"severity": {"rules": [{"pattern": "[", "severity": "high"}]}}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scale": {{"min": 0.25}}}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.scale.min, 0.25);
        assert_eq!(config.scale.max, 2.0);

        assert!(matches!(
            EngineConfig::load("/nonexistent/lexdoc.json"),
            Err(Error::Io(_))
        ));
    }
}

//! Search configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! { "max_expansions": 10000, "apex_epsilon": 1e-9 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Nodes A* may expand before giving up. `None` means unbounded.
    pub max_expansions: Option<usize>,

    /// Distance under which the funnel treats two points as the same.
    pub apex_epsilon: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_expansions: None,
            apex_epsilon: 1e-9,
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> PathResult<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }

    pub fn validate(&self) -> PathResult<()> {
        if self.apex_epsilon.is_nan() || self.apex_epsilon < 0.0 {
            return Err(PathError::Config(format!(
                "apex_epsilon must be a non-negative number, got {}",
                self.apex_epsilon
            )));
        }
        if self.max_expansions == Some(0) {
            return Err(PathError::Config("max_expansions must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = SearchConfig::from_json("{}").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.max_expansions, None);
    }

    #[test]
    fn parse_limits() {
        let config = SearchConfig::from_json(r#"{"max_expansions": 64, "apex_epsilon": 0.001}"#).unwrap();
        assert_eq!(config.max_expansions, Some(64));
        assert_eq!(config.apex_epsilon, 0.001);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            SearchConfig::from_json(r#"{"apex_epsilon": -1.0}"#),
            Err(PathError::Config(_))
        ));
        assert!(SearchConfig::from_json(r#"{"max_expansions": 0}"#).is_err());
        assert!(SearchConfig::from_json("not json").is_err());
    }
}

//! FILENAME: core/calc-engine/src/config.rs
//! Engine configuration.
//!
//! Tunables are an explicit value passed to the compiler and to list
//! construction. There is no process-wide setting.

use crate::tuple::RowLimit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcConfig {
    /// Maximum number of tuples a list may hold. Zero or negative means
    /// unbounded.
    #[serde(default)]
    pub result_limit: i64,

    /// Whether set functions reset hierarchies their arguments do not
    /// depend on before evaluating them.
    #[serde(default = "default_simplify_context")]
    pub simplify_context: bool,
}

fn default_simplify_context() -> bool {
    true
}

impl Default for CalcConfig {
    fn default() -> Self {
        CalcConfig {
            result_limit: 0,
            simplify_context: true,
        }
    }
}

impl CalcConfig {
    pub fn with_result_limit(result_limit: i64) -> Self {
        CalcConfig {
            result_limit,
            ..CalcConfig::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn row_limit(&self) -> RowLimit {
        RowLimit::new(self.result_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = CalcConfig::from_json("{}").unwrap();
        assert_eq!(config, CalcConfig::default());
        assert!(config.row_limit().rows().is_none());
    }

    #[test]
    fn test_result_limit_from_json() {
        let config = CalcConfig::from_json(r#"{"resultLimit": 500, "simplifyContext": false}"#).unwrap();
        assert_eq!(config.row_limit().rows(), Some(500));
        assert!(!config.simplify_context);
    }
}

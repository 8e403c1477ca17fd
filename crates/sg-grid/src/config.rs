//! Auxiliary options handed to a search driver alongside the grid.

use serde::{Deserialize, Serialize};
use sg_types::{invalid_config, SgResult};

/// Options forwarded to the search driver. Unknown driver-specific settings
/// travel untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Number of cross-validation folds.
    pub cv: usize,

    /// Metric name to optimize; `None` leaves the driver's default.
    pub scoring: Option<String>,

    /// Refit the best configuration on the whole dataset.
    pub refit: bool,

    /// Number of points drawn by random search (ignored for grid search).
    pub n_iter: usize,

    /// Seed for random search; a fresh seed is drawn when unset.
    pub seed: Option<u64>,

    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            cv: 5,
            scoring: None,
            refit: true,
            n_iter: 10,
            seed: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> SgResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_cv(mut self, folds: usize) -> Self {
        self.cv = folds;
        self
    }

    pub fn with_scoring(mut self, metric: &str) -> Self {
        self.scoring = Some(metric.to_string());
        self
    }

    pub fn with_refit(mut self, refit: bool) -> Self {
        self.refit = refit;
        self
    }

    pub fn with_n_iter(mut self, n: usize) -> Self {
        self.n_iter = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn validate(&self) -> SgResult<()> {
        if self.cv < 2 {
            return Err(invalid_config!("cv must be at least 2, got {}", self.cv));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_types::SgError;

    #[test]
    fn defaults() {
        let options = SearchOptions::new();
        assert_eq!(options.cv, 5);
        assert!(options.refit);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let options = SearchOptions::from_json(r#"{"cv": 3, "scoring": "accuracy"}"#).unwrap();
        assert_eq!(options.cv, 3);
        assert_eq!(options.scoring.as_deref(), Some("accuracy"));
        assert_eq!(options.n_iter, 10);
        assert!(options.extra.is_empty());
    }

    #[test]
    fn from_json_rejects_bad_input() {
        assert!(matches!(
            SearchOptions::from_json("{not json"),
            Err(SgError::Serialization(_))
        ));
        assert!(matches!(
            SearchOptions::from_json(r#"{"cv": 1}"#),
            Err(SgError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn n_iter_is_not_checked_here() {
        let options = SearchOptions::new().with_n_iter(0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let options = SearchOptions::new()
            .with_cv(10)
            .with_scoring("f1")
            .with_refit(false)
            .with_n_iter(4)
            .with_seed(7)
            .with_extra("error_score", serde_json::json!("raise"));

        assert_eq!(options.cv, 10);
        assert_eq!(options.seed, Some(7));
        assert_eq!(options.extra["error_score"], serde_json::json!("raise"));
    }
}

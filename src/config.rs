//! Tunable search parameters
//!
//! Big integers are carried as strings in configuration files so that values
//! such as `10^50` survive JSON round-trips.

use crate::error::SearchError;
use crate::math::{parse_candidate, parse_integer};
use crate::search::anneal::AnnealParams;
use crate::search::hill_climb::RefineParams;
use crate::search::worker::WorkerParams;
use anyhow::{Context, Result};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Starting candidate carried over from earlier campaigns on the reference dataset.
pub const DEFAULT_INITIAL_K: &str =
    "338587714487648360000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(with = "signed_decimal")]
    pub initial_k: BigInt,
    pub t_init: f64,
    pub t_min: f64,
    pub alpha: f64,
    pub max_iter: u64,
    pub workers: usize,
    pub step_init: u64,
    pub min_step: u64,
    #[serde(with = "unsigned_decimal")]
    pub radius: BigUint,
    pub samples: usize,
    #[serde(with = "unsigned_decimal")]
    pub perturbation: BigUint,
    pub cache_capacity: usize,
    pub seed: Option<u64>,
    pub max_cycles: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_k: DEFAULT_INITIAL_K
                .parse()
                .expect("default initial candidate parses"),
            t_init: 1e60,
            t_min: 1.0,
            alpha: 0.995,
            max_iter: 10_000,
            workers: 4,
            step_init: 1_000_000,
            min_step: 1,
            radius: BigUint::from(10u32).pow(40u32),
            samples: 100,
            perturbation: BigUint::from(10u32).pow(50u32),
            cache_capacity: 4096,
            seed: None,
            max_cycles: None,
        }
    }
}

impl SearchConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SearchConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |msg: &str| Err(SearchError::InvalidConfig(msg.to_string()));

        if !(self.t_init.is_finite() && self.t_init > 0.0) {
            return invalid("t_init must be a positive finite number");
        }
        if !(self.t_min.is_finite() && self.t_min >= 0.0) {
            return invalid("t_min must be a non-negative finite number");
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return invalid("alpha must lie strictly between 0 and 1");
        }
        if self.workers == 0 {
            return invalid("workers must be at least 1");
        }
        if self.min_step == 0 {
            return invalid("min_step must be at least 1");
        }
        if self.step_init < self.min_step {
            return invalid("step_init must not be smaller than min_step");
        }
        if self.samples == 0 {
            return invalid("samples must be at least 1");
        }
        Ok(())
    }

    pub fn anneal_params(&self) -> AnnealParams {
        AnnealParams {
            t_init: self.t_init,
            t_min: self.t_min,
            alpha: self.alpha,
            max_iter: self.max_iter,
        }
    }

    pub fn refine_params(&self) -> RefineParams {
        RefineParams {
            step_init: self.step_init,
            min_step: self.min_step,
        }
    }

    pub fn worker_params(&self) -> WorkerParams {
        WorkerParams {
            anneal: self.anneal_params(),
            refine: self.refine_params(),
            cache_capacity: self.cache_capacity,
        }
    }
}

mod signed_decimal {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_candidate(&raw).map_err(serde::de::Error::custom)
    }
}

mod unsigned_decimal {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_integer(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.radius.to_string().len(), 41);
        assert_eq!(config.initial_k.to_string(), DEFAULT_INITIAL_K);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SearchConfig = serde_json::from_str(
            r#"{"workers": 2, "initial_k": "-17", "perturbation": "0x10"}"#,
        )
        .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.initial_k, BigInt::from(-17));
        assert_eq!(config.perturbation, BigUint::from(16u32));
        assert_eq!(config.alpha, 0.995);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<SearchConfig, _> = serde_json::from_str(r#"{"wokers": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_big_values() {
        let config = SearchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(DEFAULT_INITIAL_K));
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_bad_alpha() {
        let config = SearchConfig {
            alpha: 1.0,
            ..SearchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SearchError::InvalidConfig(msg)) if msg.contains("alpha")
        ));
    }

    #[test]
    fn test_validate_rejects_zero_min_step() {
        let config = SearchConfig {
            min_step: 0,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = SearchConfig {
            workers: 0,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

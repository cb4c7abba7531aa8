//! Pair Dataset Configuration
//!
//! Configuration surface consumed by the pairing logic: the few-shot budget,
//! the pair-count divisor, the validation strategy, and the adversarial-stage
//! flag. All randomness downstream is seeded from `seed` exactly once, before
//! any data-loading workers exist.

use serde::{Deserialize, Serialize};

use crate::utils::error::{DomainPairError, Result};

/// Configuration for building domain-adaptation pair datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    /// Shot count: maximum samples drawn per class from the target domain
    pub k: usize,
    /// Divides down the shared pair budget for large datasets (>= 1)
    pub pair_factor: usize,
    /// Random global split of the pair dataset (true) vs independent
    /// source/target splits (false)
    pub constrained_validation: bool,
    /// Fraction of samples held out for validation, in (0, 1)
    pub validation_split: f64,
    /// Adversarial stage: only cross-domain groups are built and their pair
    /// labels are remapped into the same-domain label space
    pub adv_stage: bool,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Square image size fed to the transform pipeline
    pub image_size: u32,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            k: 6,
            pair_factor: 1,
            constrained_validation: true,
            validation_split: 0.25,
            adv_stage: false,
            seed: 42,
            image_size: crate::DEFAULT_IMAGE_SIZE,
        }
    }
}

impl PairConfig {
    /// Validate the configuration before any dataset construction proceeds.
    ///
    /// The independent-split path carves one third of the target shot out for
    /// validation, so `k >= 3` is required there: anything smaller leaves
    /// zero validation samples per class.
    pub fn validate(&self) -> Result<()> {
        if self.pair_factor < 1 {
            return Err(DomainPairError::Config(
                "pair_factor must be >= 1".to_string(),
            ));
        }

        if self.validation_split <= 0.0 || self.validation_split >= 1.0 {
            return Err(DomainPairError::Config(
                "validation_split must be in (0, 1)".to_string(),
            ));
        }

        if self.k == 0 {
            return Err(DomainPairError::Config(
                "k must be at least 1".to_string(),
            ));
        }

        if !self.constrained_validation && self.k < 3 {
            return Err(DomainPairError::Config(format!(
                "k must be >= 3 for independent validation splits (got {}): \
                 at least one sample per class is needed in the validation set",
                self.k
            )));
        }

        Ok(())
    }

    /// Shot count reserved for the validation split on the independent path
    pub fn validation_shot(&self) -> usize {
        self.k / 3
    }

    /// Shot count left for training on the independent path
    pub fn train_shot(&self) -> usize {
        self.k - self.validation_shot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PairConfig::default().validate().is_ok());
    }

    #[test]
    fn test_small_k_rejected_for_independent_splits() {
        let config = PairConfig {
            k: 2,
            constrained_validation: false,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_small_k_allowed_for_constrained_splits() {
        let config = PairConfig {
            k: 2,
            constrained_validation: true,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pair_factor_rejected() {
        let config = PairConfig {
            pair_factor: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_split_bounds() {
        for bad in [0.0, 1.0, 1.5] {
            let config = PairConfig {
                validation_split: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "split {} should fail", bad);
        }
    }

    #[test]
    fn test_shot_splits() {
        let config = PairConfig {
            k: 7,
            ..Default::default()
        };
        assert_eq!(config.validation_shot(), 2);
        assert_eq!(config.train_shot(), 5);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PairConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PairConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.k, config.k);
        assert_eq!(back.seed, config.seed);
    }
}

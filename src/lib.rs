//! # DomainPair
//!
//! A Rust library for balanced-pair dataset construction for few-shot
//! domain adaptation, built on the Burn framework. Designed for training
//! pipelines targeting quantized edge accelerators, where training-data
//! balance matters more than dataset size.
//!
//! ## Features
//!
//! - **Directory-per-class indexing** with zero-copy subset views for
//!   train/validation splits
//! - **Even sampling** guaranteeing equal per-class representation despite
//!   unequal class sizes
//! - **Four-group pair enumeration** (same/cross-domain × same/different
//!   class) subsampled to a shared budget without bias
//! - **Reproducible** end to end from a single seed
//!
//! ## Modules
//!
//! - `dataset`: Index, sampler, pair enumeration, paired view, batcher
//! - `config`: The pairing configuration surface
//! - `utils`: Logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use domainpair::{build_pair_datasets, PairConfig};
//!
//! let config = PairConfig::default();
//! let splits = build_pair_datasets("data/source/train", "data/target/train", &config)?;
//! // splits.train and splits.validation plug into Burn's DataLoader
//! ```

pub mod config;
pub mod dataset;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::PairConfig;
pub use dataset::{
    build_pair_datasets, ClassificationDataset, DomainPairDataset, EvenSampler, GroupCapacities,
    PairBatch, PairBatcher, PairGroup, PairGroups, PairItem, PairSample, PairSplits,
};
pub use utils::error::{DomainPairError, Result};

/// Default square image side length fed to the model
pub const DEFAULT_IMAGE_SIZE: u32 = 128;

//! Dataset Preparation
//!
//! Builds the train/validation pair datasets from a source and a target
//! domain root. Two split strategies exist:
//!
//! - **Constrained**: one pair construction over the full domains, then a
//!   random split of its flat index space at `validation_split`. Train and
//!   validation share the same underlying pair tables.
//! - **Independent**: the source domain is split one-third off for
//!   validation, the target's balanced `k`-shot draw donates its first
//!   `num_classes * (k/3)` indices to validation, and two separate pair
//!   constructions are run over the disjoint halves. Requires `k >= 3` so
//!   the validation side keeps at least one target sample per class.
//!
//! All randomness derives from the seed in [`PairConfig`]; the same seed
//! reproduces the same splits and the same pair draws.

use std::path::Path;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::PairConfig;
use crate::dataset::index::ClassificationDataset;
use crate::dataset::paired::DomainPairDataset;
use crate::dataset::pairs::PairGroups;
use crate::dataset::sampler::EvenSampler;
use crate::dataset::transform::{ResizeTransform, Transform};
use crate::utils::error::Result;

/// Train and validation pair datasets plus the shared class vocabulary.
///
/// On the adversarial independent path `target_holdout` carries the target
/// samples dropped by the shot cap as a plain classification set; the
/// discriminator is validated on unseen single images there, not on pairs.
pub struct PairSplits {
    pub train: DomainPairDataset,
    pub validation: DomainPairDataset,
    pub target_holdout: Option<ClassificationDataset>,
    pub class_names: Vec<String>,
}

/// Build the train/validation pair datasets for a source/target domain pair.
pub fn build_pair_datasets<P: AsRef<Path>>(
    source_root: P,
    target_root: P,
    config: &PairConfig,
) -> Result<PairSplits> {
    config.validate()?;

    let source = ClassificationDataset::new(source_root)?;
    let target = ClassificationDataset::new(target_root)?;
    let class_names = source.class_names().to_vec();

    let transform: Arc<dyn Transform> = Arc::new(ResizeTransform::new(config.image_size));
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let splits = if config.constrained_validation {
        build_constrained(source, target, config, transform, &mut rng)?
    } else {
        build_independent(source, target, config, transform, &mut rng)?
    };

    info!(
        "Pair datasets ready: {} train pairs, {} validation pairs, {} classes",
        splits.train.len(),
        splits.validation.len(),
        class_names.len()
    );

    Ok(PairSplits {
        class_names,
        ..splits
    })
}

/// One pair construction, randomly split along the flat pair index space
fn build_constrained(
    source: ClassificationDataset,
    target: ClassificationDataset,
    config: &PairConfig,
    transform: Arc<dyn Transform>,
    rng: &mut ChaCha8Rng,
) -> Result<PairSplits> {
    let full = build_pairs(&source, &target, Some(config.k), config, transform, rng)?;

    let mut indices: Vec<usize> = (0..full.len()).collect();
    indices.shuffle(rng);
    let val_size = (full.len() as f64 * config.validation_split) as usize;

    let validation = full.with_subset(indices[..val_size].to_vec());
    let train = full.with_subset(indices[val_size..].to_vec());
    Ok(PairSplits {
        train,
        validation,
        target_holdout: None,
        class_names: Vec::new(),
    })
}

/// Disjoint source/target halves feeding two separate pair constructions
fn build_independent(
    source: ClassificationDataset,
    target: ClassificationDataset,
    config: &PairConfig,
    transform: Arc<dyn Transform>,
    rng: &mut ChaCha8Rng,
) -> Result<PairSplits> {
    // a third of the source goes to validation
    let mut s_indices: Vec<usize> = (0..source.len()).collect();
    s_indices.shuffle(rng);
    let s_val_size = source.len() / 3;
    let source_val = source.clone().with_subset(s_indices[..s_val_size].to_vec());
    let source_train = source.with_subset(s_indices[s_val_size..].to_vec());

    // one balanced k-shot draw over the target; its head blocks become the
    // validation samples so both halves stay class-balanced
    let t_sampler = EvenSampler::new(&target, Some(config.k))?;
    let idxs = t_sampler.balance(rng);
    let val_k = config.validation_shot();
    let val_cut = t_sampler.num_classes() * val_k;

    // the adversarial stage validates the discriminator on the target
    // samples the shot cap dropped, as plain single-image samples
    let target_holdout = if config.adv_stage {
        Some(target.clone().with_subset(t_sampler.remaining_flat()))
    } else {
        None
    };

    let target_val = target.clone().with_subset(idxs[..val_cut].to_vec());
    let target_train = target.with_subset(idxs[val_cut..].to_vec());

    info!(
        "Independent split: source {}/{} train/val, target {}/{} train/val",
        source_train.len(),
        source_val.len(),
        target_train.len(),
        target_val.len()
    );

    let train = build_pairs(
        &source_train,
        &target_train,
        Some(config.k - val_k),
        config,
        Arc::clone(&transform),
        rng,
    )?;
    let validation = build_pairs(&source_val, &target_val, Some(val_k), config, transform, rng)?;

    Ok(PairSplits {
        train,
        validation,
        target_holdout,
        class_names: Vec::new(),
    })
}

/// Run one pair construction over the given domain views
fn build_pairs(
    source: &ClassificationDataset,
    target: &ClassificationDataset,
    target_shot: Option<usize>,
    config: &PairConfig,
    transform: Arc<dyn Transform>,
    rng: &mut ChaCha8Rng,
) -> Result<DomainPairDataset> {
    let s_sampler = EvenSampler::new(source, None)?;
    let t_sampler = EvenSampler::new(target, target_shot)?;
    let groups = PairGroups::build(
        source,
        target,
        &s_sampler,
        &t_sampler,
        config.pair_factor,
        config.adv_stage,
        rng,
    )?;
    Ok(DomainPairDataset::new(groups, transform, config.image_size))
}

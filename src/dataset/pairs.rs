//! Pair Group Enumeration
//!
//! Builds the four combinatorial pair groups used for domain-adaptation
//! training from one balanced source ordering and one balanced target
//! ordering:
//!
//! | Group | Domains         | Classes    | Pair label |
//! |-------|-----------------|------------|------------|
//! | 0     | source + source | same       | 0          |
//! | 1     | source + target | same       | 1          |
//! | 2     | source + source | different  | 2          |
//! | 3     | source + target | different  | 3          |
//!
//! Group populations differ by orders of magnitude, so every group is
//! subsampled down to a shared budget derived from the scarcest group's
//! combinatorial capacity. In adversarial mode only the two cross-domain
//! groups are built and their labels are remapped onto the same-domain
//! label values (1→0, 3→2) to feed the discriminator flipped targets.
//!
//! All randomness flows through a caller-supplied [`ChaCha8Rng`]; building
//! twice with the same seed yields identical groups.

use std::path::PathBuf;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dataset::index::ClassificationDataset;
use crate::dataset::sampler::EvenSampler;
use crate::utils::error::{DomainPairError, Result};

/// Upper bound on rejection-sampling retries for one pair draw.
///
/// Same-domain/same-class draws need two distinct blocks; a collision is
/// re-drawn up to this many times before falling back to a deterministic
/// neighbor pick.
const MAX_DRAW_ATTEMPTS: usize = 64;

/// One of the four pair groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairGroup {
    /// Two source samples of the same class
    SourceSameClass,
    /// A source and a target sample of the same class
    CrossSameClass,
    /// Two source samples of different classes
    SourceDiffClass,
    /// A source and a target sample of different classes
    CrossDiffClass,
}

impl PairGroup {
    /// Pair label served to the training loop.
    ///
    /// Adversarial mode maps the cross-domain groups onto the labels
    /// normally carried by the same-domain groups.
    pub fn label(&self, adversarial: bool) -> usize {
        match (self, adversarial) {
            (PairGroup::SourceSameClass, _) => 0,
            (PairGroup::CrossSameClass, false) => 1,
            (PairGroup::CrossSameClass, true) => 0,
            (PairGroup::SourceDiffClass, _) => 2,
            (PairGroup::CrossDiffClass, false) => 3,
            (PairGroup::CrossDiffClass, true) => 2,
        }
    }
}

/// One materialized pair: two image paths, the pair label, and the class
/// labels of each side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSample {
    pub path_a: PathBuf,
    pub path_b: PathBuf,
    pub pair_label: usize,
    pub label_a: usize,
    pub label_b: usize,
}

/// Theoretical pair counts per group, computed from per-class sample counts.
///
/// The source-different-class figure is `C(total, 2)` which intentionally
/// does not subtract same-class combinations; it acts as an upper bound and
/// the draw itself only ever produces cross-class picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCapacities {
    pub source_same: usize,
    pub cross_same: usize,
    pub source_diff: usize,
    pub cross_diff: usize,
}

impl GroupCapacities {
    /// Compute capacities from per-class counts of each domain.
    ///
    /// Both slices must have the same length (one entry per class).
    pub fn compute(source_counts: &[usize], target_counts: &[usize]) -> Self {
        let source_same = source_counts.iter().map(|&n| n * n.saturating_sub(1) / 2).sum();

        let cross_same = source_counts
            .iter()
            .zip(target_counts)
            .map(|(&s, &t)| s * t)
            .sum();

        let total_source: usize = source_counts.iter().sum();
        let source_diff = total_source * total_source.saturating_sub(1) / 2;

        let mut cross_diff = 0usize;
        for (c, &s) in source_counts.iter().enumerate() {
            for (c2, &t) in target_counts.iter().enumerate() {
                if c != c2 {
                    cross_diff += s * t;
                }
            }
        }

        Self {
            source_same,
            cross_same,
            source_diff,
            cross_diff,
        }
    }

    /// Smallest of the four capacities
    pub fn min(&self) -> usize {
        self.source_same
            .min(self.cross_same)
            .min(self.source_diff)
            .min(self.cross_diff)
    }
}

/// A balanced permutation viewed as contiguous blocks of one-index-per-class
struct BlockView<'a> {
    order: &'a [usize],
    num_classes: usize,
}

impl<'a> BlockView<'a> {
    fn new(order: &'a [usize], num_classes: usize) -> Self {
        debug_assert_eq!(order.len() % num_classes, 0);
        Self { order, num_classes }
    }

    fn num_blocks(&self) -> usize {
        self.order.len() / self.num_classes
    }

    /// View index at `block`, class slot `class`
    fn entry(&self, block: usize, class: usize) -> usize {
        self.order[block * self.num_classes + class]
    }
}

/// The four (or, adversarially, two) materialized pair groups plus the
/// flat-index resolution over them.
#[derive(Debug, Clone)]
pub struct PairGroups {
    /// Active groups in pair-label order
    groups: Vec<Vec<PairSample>>,
    /// Shared per-group sampling budget
    budget: usize,
    capacities: GroupCapacities,
    adversarial: bool,
}

impl PairGroups {
    /// Enumerate and subsample the pair groups.
    ///
    /// `source` and `target` must expose the same class vocabulary. The
    /// balanced permutation for each domain is drawn exactly once here; the
    /// resulting groups are immutable.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        source: &ClassificationDataset,
        target: &ClassificationDataset,
        source_sampler: &EvenSampler,
        target_sampler: &EvenSampler,
        pair_factor: usize,
        adversarial: bool,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self> {
        if source.class_names() != target.class_names() {
            return Err(DomainPairError::ClassMismatch {
                source_classes: source.class_names().to_vec(),
                target_classes: target.class_names().to_vec(),
            });
        }
        if pair_factor == 0 {
            return Err(DomainPairError::Config(
                "pair_factor must be >= 1".to_string(),
            ));
        }
        let num_classes = source.num_classes();

        let capacities =
            GroupCapacities::compute(&source_sampler.bucket_sizes(), &target_sampler.bucket_sizes());
        let budget = capacities.min() / pair_factor;
        let per_group = pair_factor * budget;
        info!(
            "Pair capacities: ss-same {}, st-same {}, ss-diff {}, st-diff {}; shared budget {}",
            capacities.source_same,
            capacities.cross_same,
            capacities.source_diff,
            capacities.cross_diff,
            budget
        );
        if budget == 0 {
            warn!("Shared pair budget is zero; all groups will be empty");
        }

        let source_order = source_sampler.balance(rng);
        let target_order = target_sampler.balance(rng);
        let source_blocks = BlockView::new(&source_order, num_classes);
        let target_blocks = BlockView::new(&target_order, num_classes);

        let mut groups = Vec::new();
        if !adversarial {
            groups.push(draw_source_same(
                source,
                &source_blocks,
                capacities.source_same.min(per_group),
                rng,
            ));
        }
        groups.push(draw_cross(
            source,
            target,
            &source_blocks,
            &target_blocks,
            SlotPick::Same,
            PairGroup::CrossSameClass.label(adversarial),
            capacities.cross_same.min(per_group),
            rng,
        ));
        if !adversarial {
            groups.push(draw_source_diff(
                source,
                &source_blocks,
                capacities.source_diff.min(per_group),
                rng,
            ));
        }
        groups.push(draw_cross(
            source,
            target,
            &source_blocks,
            &target_blocks,
            SlotPick::Distinct,
            PairGroup::CrossDiffClass.label(adversarial),
            capacities.cross_diff.min(per_group),
            rng,
        ));

        debug!(
            "Realized group sizes: {:?} (adversarial: {})",
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            adversarial
        );

        Ok(Self {
            groups,
            budget,
            capacities,
            adversarial,
        })
    }

    /// Shared per-group budget
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Capacities the budget was derived from
    pub fn capacities(&self) -> &GroupCapacities {
        &self.capacities
    }

    /// Whether only the two cross-domain groups were built
    pub fn is_adversarial(&self) -> bool {
        self.adversarial
    }

    /// Number of active groups (4, or 2 in adversarial mode)
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Samples of one active group
    pub fn group(&self, group_idx: usize) -> &[PairSample] {
        &self.groups[group_idx]
    }

    /// Total number of served pairs: every active group contributes exactly
    /// the shared budget.
    ///
    /// Groups may hold up to `pair_factor × budget` drawn pairs, but the
    /// flat index space stays one budget-wide slot per group; pairs beyond
    /// the budget are never served. Anything wider would skew the served
    /// distribution toward the larger groups.
    pub fn len(&self) -> usize {
        self.groups.len() * self.budget
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a flat index to `(group, offset)`.
    ///
    /// The group is `flat / budget`, clamped to the last group when the
    /// division overshoots at the final boundary; the offset wraps modulo
    /// the group's realized size so a clamped index still lands on a valid
    /// pair.
    pub fn resolve(&self, flat_idx: usize) -> (usize, usize) {
        let group = (flat_idx / self.budget.max(1)).min(self.groups.len() - 1);
        let offset = (flat_idx % self.budget.max(1)) % self.groups[group].len().max(1);
        (group, offset)
    }

    /// Look up the pair at a flat index
    pub fn get(&self, flat_idx: usize) -> Option<&PairSample> {
        if flat_idx >= self.len() {
            return None;
        }
        let (group, offset) = self.resolve(flat_idx);
        self.groups[group].get(offset)
    }
}

enum SlotPick {
    Same,
    Distinct,
}

fn make_pair(
    dataset_a: &ClassificationDataset,
    dataset_b: &ClassificationDataset,
    idx_a: usize,
    idx_b: usize,
    pair_label: usize,
) -> PairSample {
    let a = dataset_a.get(idx_a);
    let b = dataset_b.get(idx_b);
    PairSample {
        path_a: a.path.clone(),
        path_b: b.path.clone(),
        pair_label,
        label_a: a.label,
        label_b: b.label,
    }
}

/// Same-domain, same-class: two entries of one class slot from two distinct
/// blocks of the source permutation.
fn draw_source_same(
    source: &ClassificationDataset,
    blocks: &BlockView<'_>,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<PairSample> {
    let label = PairGroup::SourceSameClass.label(false);
    let num_blocks = blocks.num_blocks();
    if count > 0 && num_blocks < 2 {
        warn!("Fewer than two balanced blocks; same-domain/same-class group stays empty");
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let class = rng.gen_range(0..blocks.num_classes);
        let block_a = rng.gen_range(0..num_blocks);
        let mut block_b = rng.gen_range(0..num_blocks);
        let mut attempts = 0;
        while block_b == block_a && attempts < MAX_DRAW_ATTEMPTS {
            debug!("Block collision on same-class draw, retrying");
            block_b = rng.gen_range(0..num_blocks);
            attempts += 1;
        }
        if block_b == block_a {
            // deterministic neighbor fallback after exhausting retries
            block_b = (block_a + 1) % num_blocks;
        }
        pairs.push(make_pair(
            source,
            source,
            blocks.entry(block_a, class),
            blocks.entry(block_b, class),
            label,
        ));
    }
    pairs
}

/// Same-domain, different-class: two distinct class slots, blocks drawn
/// independently (and allowed to coincide, the entries still differ).
fn draw_source_diff(
    source: &ClassificationDataset,
    blocks: &BlockView<'_>,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<PairSample> {
    let label = PairGroup::SourceDiffClass.label(false);
    if count > 0 && blocks.num_classes < 2 {
        warn!("Single-class dataset; different-class groups stay empty");
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let (class_a, class_b) = distinct_classes(blocks.num_classes, rng);
        let block_a = rng.gen_range(0..blocks.num_blocks());
        let block_b = rng.gen_range(0..blocks.num_blocks());
        pairs.push(make_pair(
            source,
            source,
            blocks.entry(block_a, class_a),
            blocks.entry(block_b, class_b),
            label,
        ));
    }
    pairs
}

/// Cross-domain draws: one entry from the source permutation, one from the
/// target permutation, with the class slots either equal or distinct.
#[allow(clippy::too_many_arguments)]
fn draw_cross(
    source: &ClassificationDataset,
    target: &ClassificationDataset,
    source_blocks: &BlockView<'_>,
    target_blocks: &BlockView<'_>,
    slots: SlotPick,
    pair_label: usize,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<PairSample> {
    if count > 0 && matches!(slots, SlotPick::Distinct) && source_blocks.num_classes < 2 {
        warn!("Single-class dataset; different-class groups stay empty");
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let (class_a, class_b) = match slots {
            SlotPick::Same => {
                let c = rng.gen_range(0..source_blocks.num_classes);
                (c, c)
            }
            SlotPick::Distinct => distinct_classes(source_blocks.num_classes, rng),
        };
        let block_a = rng.gen_range(0..source_blocks.num_blocks());
        let block_b = rng.gen_range(0..target_blocks.num_blocks());
        pairs.push(make_pair(
            source,
            target,
            source_blocks.entry(block_a, class_a),
            target_blocks.entry(block_b, class_b),
            pair_label,
        ));
    }
    pairs
}

/// Draw two distinct class slots. Caller guarantees `num_classes >= 2`.
fn distinct_classes(num_classes: usize, rng: &mut ChaCha8Rng) -> (usize, usize) {
    let a = rng.gen_range(0..num_classes);
    let mut b = rng.gen_range(0..num_classes);
    while b == a {
        b = rng.gen_range(0..num_classes);
    }
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::testutil::fixture_root;
    use rand::SeedableRng;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    /// Source 2×20, target 2×6 with shot=3: the reference scenario
    fn reference_groups(pair_factor: usize, adversarial: bool, seed: u64) -> PairGroups {
        let source_root = fixture_root(&[("cat", 20), ("dog", 20)]);
        let target_root = fixture_root(&[("cat", 6), ("dog", 6)]);
        let source = ClassificationDataset::new(source_root.path()).unwrap();
        let target = ClassificationDataset::new(target_root.path()).unwrap();

        let mut r = rng(seed);
        let s_sampler = EvenSampler::new(&source, None).unwrap();
        let t_sampler = EvenSampler::new(&target, Some(3)).unwrap();
        PairGroups::build(
            &source, &target, &s_sampler, &t_sampler, pair_factor, adversarial, &mut r,
        )
        .unwrap()
    }

    #[test]
    fn test_capacity_formulas() {
        let caps = GroupCapacities::compute(&[20, 20], &[3, 3]);
        assert_eq!(caps.source_same, 380); // 2 * C(20,2)
        assert_eq!(caps.cross_same, 120); // 2 * 20*3
        assert_eq!(caps.source_diff, 780); // C(40,2)
        assert_eq!(caps.cross_diff, 120); // 2 * 20*3
        assert_eq!(caps.min(), 120);
    }

    #[test]
    fn test_budget_and_realized_sizes() {
        let groups = reference_groups(1, false, 11);
        assert_eq!(groups.budget(), 120);
        assert_eq!(groups.num_groups(), 4);
        for g in 0..4 {
            assert_eq!(groups.group(g).len(), 120);
        }
        assert_eq!(groups.len(), 480);
    }

    #[test]
    fn test_pair_factor_divides_budget() {
        let groups = reference_groups(4, false, 11);
        assert_eq!(groups.budget(), 30);
        // realized = min(capacity, factor * budget) = 120 for every group,
        // but only one budget-wide slot per group is served
        for g in 0..4 {
            assert_eq!(groups.group(g).len(), 120);
        }
        assert_eq!(groups.len(), 4 * 30);
    }

    #[test]
    fn test_serving_stays_even_with_pair_factor() {
        let groups = reference_groups(4, false, 11);
        let budget = groups.budget();

        let mut served = vec![0usize; groups.num_groups()];
        for flat in 0..groups.len() {
            let (g, offset) = groups.resolve(flat);
            assert!(offset < budget);
            served[g] += 1;
        }
        // every group serves exactly the budget, regardless of how many
        // pairs were drawn into it
        assert_eq!(served, vec![budget; groups.num_groups()]);
    }

    #[test]
    fn test_group_label_semantics() {
        let groups = reference_groups(1, false, 3);
        for (g, expected_label) in (0..4).zip([0usize, 1, 2, 3]) {
            for pair in groups.group(g) {
                assert_eq!(pair.pair_label, expected_label);
                match expected_label {
                    0 | 1 => assert_eq!(pair.label_a, pair.label_b),
                    _ => assert_ne!(pair.label_a, pair.label_b),
                }
                // source-domain sides always come from the source tree
                match expected_label {
                    0 | 2 => {
                        assert_ne!(pair.path_a, pair.path_b);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_adversarial_mode_two_groups_flipped_labels() {
        let groups = reference_groups(1, true, 5);
        assert_eq!(groups.num_groups(), 2);
        assert_eq!(groups.len(), 2 * groups.budget());
        for pair in groups.group(0) {
            assert_eq!(pair.pair_label, 0);
            assert_eq!(pair.label_a, pair.label_b);
        }
        for pair in groups.group(1) {
            assert_eq!(pair.pair_label, 2);
            assert_ne!(pair.label_a, pair.label_b);
        }
    }

    #[test]
    fn test_flat_index_resolution() {
        let groups = reference_groups(1, false, 9);
        let budget = groups.budget();

        assert_eq!(groups.resolve(0), (0, 0));
        assert_eq!(groups.resolve(budget - 1), (0, budget - 1));
        assert_eq!(groups.resolve(budget), (1, 0));
        assert_eq!(groups.resolve(3 * budget + 5), (3, 5));
        // division overshoot clamps to the last group
        assert_eq!(groups.resolve(4 * budget + 2).0, 3);

        assert!(groups.get(groups.len() - 1).is_some());
        assert!(groups.get(groups.len()).is_none());
    }

    #[test]
    fn test_same_seed_same_groups() {
        let source_root = fixture_root(&[("cat", 20), ("dog", 20)]);
        let target_root = fixture_root(&[("cat", 6), ("dog", 6)]);
        let source = ClassificationDataset::new(source_root.path()).unwrap();
        let target = ClassificationDataset::new(target_root.path()).unwrap();
        let s = EvenSampler::new(&source, None).unwrap();
        let t = EvenSampler::new(&target, Some(3)).unwrap();

        let a = PairGroups::build(&source, &target, &s, &t, 1, false, &mut rng(77)).unwrap();
        let b = PairGroups::build(&source, &target, &s, &t, 1, false, &mut rng(77)).unwrap();
        for g in 0..4 {
            let paths_a: Vec<_> = a.group(g).iter().map(|p| (&p.path_a, &p.path_b)).collect();
            let paths_b: Vec<_> = b.group(g).iter().map(|p| (&p.path_a, &p.path_b)).collect();
            assert_eq!(paths_a, paths_b);
        }
    }

    #[test]
    fn test_class_vocabulary_mismatch_rejected() {
        let source_root = fixture_root(&[("cat", 4), ("dog", 4)]);
        let target_root = fixture_root(&[("cat", 4), ("fox", 4)]);
        let source = ClassificationDataset::new(source_root.path()).unwrap();
        let target = ClassificationDataset::new(target_root.path()).unwrap();

        let mut r = rng(0);
        let s = EvenSampler::new(&source, None).unwrap();
        let t = EvenSampler::new(&target, None).unwrap();
        let err = PairGroups::build(&source, &target, &s, &t, 1, false, &mut r).unwrap_err();
        assert!(matches!(err, DomainPairError::ClassMismatch { .. }));
    }

    #[test]
    fn test_realized_sizes_never_exceed_capacity() {
        // tiny target makes cross capacities the binding constraint
        let source_root = fixture_root(&[("cat", 5), ("dog", 5)]);
        let target_root = fixture_root(&[("cat", 2), ("dog", 2)]);
        let source = ClassificationDataset::new(source_root.path()).unwrap();
        let target = ClassificationDataset::new(target_root.path()).unwrap();

        let mut r = rng(21);
        let s = EvenSampler::new(&source, None).unwrap();
        let t = EvenSampler::new(&target, None).unwrap();
        let groups = PairGroups::build(&source, &target, &s, &t, 1, false, &mut r).unwrap();

        let caps = groups.capacities();
        let cap_per_group = [
            caps.source_same,
            caps.cross_same,
            caps.source_diff,
            caps.cross_diff,
        ];
        for (g, &cap) in cap_per_group.iter().enumerate() {
            assert!(groups.group(g).len() <= cap);
        }
    }
}

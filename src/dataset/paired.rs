//! Paired Dataset View
//!
//! Serves materialized pair groups as one flat, length-stable collection
//! implementing Burn's `Dataset` trait. Element access resolves a flat
//! index through the group/budget structure, decodes both images, applies
//! the transform to each side independently, and emits a [`PairItem`].
//!
//! Image decoding is deliberately fail-fast: a sample that cannot be
//! decoded terminates the process after logging the offending path.
//! Skipping bad samples would silently skew the group balance the whole
//! construction exists to guarantee.

use std::path::Path;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tracing::error;

use crate::dataset::batcher::PairItem;
use crate::dataset::pairs::PairGroups;
use crate::dataset::transform::Transform;
use crate::utils::error::DomainPairError;

/// Flat, subset-aware view over built pair groups.
///
/// Groups are shared via `Arc` so train/validation splits over the same
/// construction do not duplicate the pair tables.
#[derive(Clone)]
pub struct DomainPairDataset {
    groups: Arc<PairGroups>,
    transform: Arc<dyn Transform>,
    image_size: u32,
    /// Effective view over the flat pair index space; None means all pairs
    subset: Option<Vec<usize>>,
}

impl DomainPairDataset {
    pub fn new(groups: PairGroups, transform: Arc<dyn Transform>, image_size: u32) -> Self {
        Self {
            groups: Arc::new(groups),
            transform,
            image_size,
            subset: None,
        }
    }

    /// Build a subset view sharing this dataset's groups and transform
    pub fn with_subset(&self, subset: Vec<usize>) -> Self {
        Self {
            groups: Arc::clone(&self.groups),
            transform: Arc::clone(&self.transform),
            image_size: self.image_size,
            subset: Some(subset),
        }
    }

    /// The underlying pair groups
    pub fn groups(&self) -> &PairGroups {
        &self.groups
    }

    /// Map a view index to a flat pair index
    fn resolve(&self, view_idx: usize) -> usize {
        match &self.subset {
            Some(subset) => subset[view_idx],
            None => view_idx,
        }
    }

    /// Decode, 3-channel, transform, and flatten one image to CHW floats
    fn load_image(&self, path: &Path) -> Vec<f32> {
        let img = decode_or_die(path);
        // to_rgb8 replicates single-channel (grayscale) data across all
        // three channels
        let img = self
            .transform
            .apply(DynamicImage::ImageRgb8(img.to_rgb8()));
        let rgb = img.to_rgb8();
        // transforms are expected to emit the configured square size;
        // anything else is coerced here so item layout stays fixed
        let rgb = if rgb.dimensions() == (self.image_size, self.image_size) {
            rgb
        } else {
            image::imageops::resize(&rgb, self.image_size, self.image_size, FilterType::Triangle)
        };
        to_chw(&rgb, self.image_size)
    }
}

impl Dataset<PairItem> for DomainPairDataset {
    fn get(&self, index: usize) -> Option<PairItem> {
        if index >= self.len() {
            return None;
        }
        let pair = self.groups.get(self.resolve(index))?;

        // separate transform invocations keep augmentation draws
        // independent per side
        Some(PairItem {
            image_a: self.load_image(&pair.path_a),
            image_b: self.load_image(&pair.path_b),
            pair_label: pair.pair_label,
            label_a: pair.label_a,
            label_b: pair.label_b,
        })
    }

    fn len(&self) -> usize {
        match &self.subset {
            Some(subset) => subset.len(),
            None => self.groups.len(),
        }
    }
}

/// Decode an image or terminate the process.
///
/// A corrupt training sample aborts the run instead of being skipped, so
/// dataset damage is caught at first touch rather than surfacing as a
/// quietly imbalanced model.
fn decode_or_die(path: &Path) -> DynamicImage {
    let result = ImageReader::open(path)
        .map_err(|e| e.to_string())
        .and_then(|r| r.decode().map_err(|e| e.to_string()));
    match result {
        Ok(img) => img,
        Err(reason) => {
            error!(
                "{}",
                DomainPairError::ImageDecode(path.to_path_buf(), reason)
            );
            std::process::exit(1);
        }
    }
}

/// Interleaved RGB8 to flattened CHW floats in [0, 1]
fn to_chw(img: &image::RgbImage, image_size: u32) -> Vec<f32> {
    let (height, width) = (image_size as usize, image_size as usize);
    let mut data = vec![0.0f32; 3 * height * width];
    for y in 0..height {
        for x in 0..width {
            let pixel = img.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                data[c * height * width + y * width + x] = pixel[c] as f32 / 255.0;
            }
        }
    }
    data
}

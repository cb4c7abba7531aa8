//! Image Transforms
//!
//! Decode-time image processing applied to both sides of a pair before
//! tensor conversion. Kept deliberately small: resize plus an optional
//! random horizontal flip for training-time augmentation.

use std::sync::Mutex;

use image::imageops::FilterType;
use image::DynamicImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A decode-time image transform, applied per image.
///
/// Implementations are expected to emit the pipeline's configured square
/// size; the paired view coerces any other geometry back to it before
/// flattening, so a non-resizing transform degrades to an extra resample
/// rather than a panic.
pub trait Transform: Send + Sync {
    fn apply(&self, img: DynamicImage) -> DynamicImage;
}

/// Resize to a square of `image_size` pixels
pub struct ResizeTransform {
    image_size: u32,
}

impl ResizeTransform {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }
}

impl Transform for ResizeTransform {
    fn apply(&self, img: DynamicImage) -> DynamicImage {
        img.resize_exact(self.image_size, self.image_size, FilterType::Triangle)
    }
}

/// Resize plus random horizontal flip.
///
/// The flip decision consumes the internal RNG, so two calls on the same
/// image may differ; seed the transform for reproducible epochs.
pub struct AugmentTransform {
    image_size: u32,
    flip_probability: f32,
    rng: Mutex<ChaCha8Rng>,
}

impl AugmentTransform {
    pub fn new(image_size: u32, flip_probability: f32, seed: u64) -> Self {
        Self {
            image_size,
            flip_probability,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl Transform for AugmentTransform {
    fn apply(&self, img: DynamicImage) -> DynamicImage {
        let img = img.resize_exact(self.image_size, self.image_size, FilterType::Triangle);
        let flip = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.gen::<f32>() < self.flip_probability
        };
        if flip {
            img.fliph()
        } else {
            img
        }
    }
}

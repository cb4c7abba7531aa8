//! Burn Batcher for Pair Samples
//!
//! Collates decoded pair items into batched tensors. Pixel values arrive in
//! `[0, 1]` and are rescaled to `[-1, 1]` here, matching the input range the
//! quantized edge deployment expects.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::DEFAULT_IMAGE_SIZE;

/// A single decoded pair ready for batching
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PairItem {
    /// First image as flattened CHW float array [3 * H * W], values in [0, 1]
    pub image_a: Vec<f32>,
    /// Second image, same layout as `image_a`
    pub image_b: Vec<f32>,
    /// Pair group label
    pub pair_label: usize,
    /// Class label of the first image
    pub label_a: usize,
    /// Class label of the second image
    pub label_b: usize,
}

/// A batch of image pairs
#[derive(Clone, Debug)]
pub struct PairBatch<B: Backend> {
    /// First images, shape [batch_size, 3, height, width], values in [-1, 1]
    pub images_a: Tensor<B, 4>,
    /// Second images, same shape as `images_a`
    pub images_b: Tensor<B, 4>,
    /// Pair group labels, shape [batch_size]
    pub pair_labels: Tensor<B, 1, Int>,
    /// Class labels of the first images, shape [batch_size]
    pub labels_a: Tensor<B, 1, Int>,
    /// Class labels of the second images, shape [batch_size]
    pub labels_b: Tensor<B, 1, Int>,
}

/// Batcher collating [`PairItem`]s into [`PairBatch`]es
#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> PairBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            image_size: DEFAULT_IMAGE_SIZE as usize,
        }
    }

    /// Create a batcher with custom image size
    pub fn with_image_size(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }

    fn image_tensor(&self, items: &[PairItem], side_a: bool) -> Tensor<B, 4> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);
        let data: Vec<f32> = items
            .iter()
            .flat_map(|item| {
                if side_a {
                    item.image_a.clone()
                } else {
                    item.image_b.clone()
                }
            })
            .collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(data, [batch_size, 3, height, width]),
            &self.device,
        );
        // [0, 1] -> [-1, 1]
        images.mul_scalar(2.0).sub_scalar(1.0)
    }

    fn label_tensor(&self, labels: Vec<i32>) -> Tensor<B, 1, Int> {
        let len = labels.len();
        Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [len]), &self.device)
    }
}

impl<B: Backend> Batcher<PairItem, PairBatch<B>> for PairBatcher<B> {
    fn batch(&self, items: Vec<PairItem>) -> PairBatch<B> {
        let images_a = self.image_tensor(&items, true);
        let images_b = self.image_tensor(&items, false);

        let pair_labels =
            self.label_tensor(items.iter().map(|i| i.pair_label as i32).collect());
        let labels_a = self.label_tensor(items.iter().map(|i| i.label_a as i32).collect());
        let labels_b = self.label_tensor(items.iter().map(|i| i.label_b as i32).collect());

        PairBatch {
            images_a,
            images_b,
            pair_labels,
            labels_a,
            labels_b,
        }
    }
}

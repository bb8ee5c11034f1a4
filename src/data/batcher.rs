// ============================================================
// Layer 4 — Caption Batcher
// ============================================================
// Turns a list of training-caption indices into one mini-batch.
//
// Captions have different lengths, so each batch is padded to the
// longest caption IN THAT BATCH (not a global maximum) with the
// pad/end token 0, and a parallel mask records which positions
// are real:
//
//   indices lengths {5, 3, 7}  →  captions/mask shape (7, 3)
//
//            col 0   col 1   col 2
//   t = 0      1       1       1
//   t = 1      1       1       1
//   t = 2      1       1       1
//   t = 3      1       0       1
//   t = 4      1       0       1
//   t = 5      0       0       1
//   t = 6      0       0       1
//
// Layout is time-major (max_len × batch) because the decoder walks
// the batch one time step at a time.
//
// Alongside the words, the video and tag feature rows of each
// caption's video are gathered in input order.
//
// Assembly is plain Rust (testable without a device); to_tensors()
// moves the result onto a Burn device.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use anyhow::{ensure, Context, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::data::features::VideoFeatures;
use crate::domain::corpus::{CaptionSplit, EOS_TOKEN};

// ─── CaptionBatch ─────────────────────────────────────────────────────────────
/// Host-side mini-batch. Matrices are stored row-major in
/// (max_len × batch) order: element (t, j) lives at `t * batch + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBatch {
    pub max_len:   usize,
    pub batch:     usize,
    pub captions:  Vec<u32>,
    pub mask:      Vec<f32>,
    /// batch × video_dim
    pub videos:    Vec<f32>,
    /// batch × tag_dim
    pub tags:      Vec<f32>,
    pub video_dim: usize,
    pub tag_dim:   usize,
}

impl CaptionBatch {
    pub fn shape(&self) -> (usize, usize) {
        (self.max_len, self.batch)
    }

    pub fn caption_at(&self, t: usize, j: usize) -> u32 {
        self.captions[t * self.batch + j]
    }

    pub fn mask_at(&self, t: usize, j: usize) -> f32 {
        self.mask[t * self.batch + j]
    }

    pub fn video_row(&self, j: usize) -> &[f32] {
        &self.videos[j * self.video_dim..(j + 1) * self.video_dim]
    }

    pub fn tag_row(&self, j: usize) -> &[f32] {
        &self.tags[j * self.tag_dim..(j + 1) * self.tag_dim]
    }

    /// Move the batch onto a device.
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> CaptionTensors<B> {
        let words: Vec<i64> = self.captions.iter().map(|&w| w as i64).collect();

        let words = Tensor::<B, 2, Int>::from_data(
            TensorData::new(words, [self.max_len, self.batch]), device,
        );
        let mask = Tensor::<B, 2>::from_data(
            TensorData::new(self.mask.clone(), [self.max_len, self.batch]), device,
        );
        let videos = Tensor::<B, 2>::from_data(
            TensorData::new(self.videos.clone(), [self.batch, self.video_dim]), device,
        );
        let tags = Tensor::<B, 2>::from_data(
            TensorData::new(self.tags.clone(), [self.batch, self.tag_dim]), device,
        );

        CaptionTensors { words, mask, videos, tags }
    }
}

// ─── CaptionTensors ───────────────────────────────────────────────────────────
/// Device-side mini-batch consumed by the model.
#[derive(Debug, Clone)]
pub struct CaptionTensors<B: Backend> {
    /// [max_len, batch]
    pub words:  Tensor<B, 2, Int>,
    /// [max_len, batch], 1.0 = real token
    pub mask:   Tensor<B, 2>,
    /// [batch, video_dim]
    pub videos: Tensor<B, 2>,
    /// [batch, tag_dim]
    pub tags:   Tensor<B, 2>,
}

// ─── Assembly ─────────────────────────────────────────────────────────────────
/// Build the batch for `indices` (positions into `split`).
pub fn assemble_batch(
    split:    &CaptionSplit,
    indices:  &[usize],
    features: &VideoFeatures,
) -> Result<CaptionBatch> {
    ensure!(!indices.is_empty(), "cannot assemble an empty batch");

    let batch = indices.len();
    let mut max_len = 0usize;
    for &idx in indices {
        let caption = split
            .captions
            .get(idx)
            .with_context(|| format!("caption index {idx} out of range ({})", split.len()))?;
        max_len = max_len.max(caption.len());
    }

    let mut captions = vec![EOS_TOKEN; max_len * batch];
    let mut mask     = vec![0.0f32; max_len * batch];
    let mut videos   = Vec::with_capacity(batch * features.video_dim());
    let mut tags     = Vec::with_capacity(batch * features.tag_dim());

    for (j, &idx) in indices.iter().enumerate() {
        for (t, &word) in split.captions[idx].iter().enumerate() {
            captions[t * batch + j] = word;
            mask[t * batch + j]     = 1.0;
        }

        let vid = *split
            .video_ids
            .get(idx)
            .with_context(|| format!("caption {idx} has no video id"))?;
        features.push_tag_row(vid, &mut tags)?;
        features.push_video_row(vid, &mut videos)?;
    }

    Ok(CaptionBatch {
        max_len,
        batch,
        captions,
        mask,
        videos,
        tags,
        video_dim: features.video_dim(),
        tag_dim:   features.tag_dim(),
    })
}

/// Feature-only batch for decoding a run of video ids. No captions:
/// the decoder runs for a fixed number of steps with an all-ones mask.
pub fn gather_videos(
    video_ids: &[usize],
    features:  &VideoFeatures,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let mut videos = Vec::with_capacity(video_ids.len() * features.video_dim());
    let mut tags   = Vec::with_capacity(video_ids.len() * features.tag_dim());
    for &vid in video_ids {
        features.push_video_row(vid, &mut videos)?;
        features.push_tag_row(vid, &mut tags)?;
    }
    Ok((videos, tags))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn features() -> VideoFeatures {
        let video = Array2::from_shape_fn((6, 3), |(r, c)| (r * 100 + c) as f32);
        let tags  = Array2::from_shape_fn((6, 2), |(r, c)| (r * 10 + c) as f32 + 0.5);
        VideoFeatures::new(video, tags).unwrap()
    }

    fn split() -> CaptionSplit {
        CaptionSplit::new(
            vec![
                vec![1, 2, 3, 4, 0],          // len 5
                vec![5, 6, 0],                // len 3
                vec![7, 8, 9, 10, 11, 12, 0], // len 7
                vec![3, 0],                   // len 2
            ],
            vec![4, 1, 5, 1],
        )
    }

    #[test]
    fn test_five_three_seven_example() {
        let b = assemble_batch(&split(), &[0, 1, 2], &features()).unwrap();
        assert_eq!(b.shape(), (7, 3));

        for t in 0..7 {
            assert_eq!(b.mask_at(t, 0), if t < 5 { 1.0 } else { 0.0 });
            assert_eq!(b.mask_at(t, 1), if t < 3 { 1.0 } else { 0.0 });
            assert_eq!(b.mask_at(t, 2), 1.0);
        }
    }

    #[test]
    fn test_padding_and_words() {
        let b = assemble_batch(&split(), &[1, 2], &features()).unwrap();
        assert_eq!(b.caption_at(0, 0), 5);
        assert_eq!(b.caption_at(1, 0), 6);
        assert_eq!(b.caption_at(5, 0), EOS_TOKEN);
        assert_eq!(b.caption_at(6, 1), 0);
        assert_eq!(b.caption_at(4, 1), 11);
    }

    #[test]
    fn test_pads_to_batch_max_not_global_max() {
        let b = assemble_batch(&split(), &[1, 3], &features()).unwrap();
        assert_eq!(b.shape(), (3, 2));
    }

    #[test]
    fn test_mask_marks_exactly_true_lengths() {
        let s = split();
        let indices = [3, 0, 2, 1];
        let b = assemble_batch(&s, &indices, &features()).unwrap();
        for (j, &idx) in indices.iter().enumerate() {
            let len = s.captions[idx].len();
            for t in 0..b.max_len {
                assert_eq!(b.mask_at(t, j) == 1.0, t < len);
            }
        }
    }

    #[test]
    fn test_features_gathered_in_input_order() {
        let f = features();
        let s = split();
        let b = assemble_batch(&s, &[2, 0, 3], &f).unwrap();
        // videos 5, 4, 1
        assert_eq!(b.video_row(0), &[500.0, 501.0, 502.0]);
        assert_eq!(b.video_row(1), &[400.0, 401.0, 402.0]);
        assert_eq!(b.video_row(2), &[100.0, 101.0, 102.0]);
        assert_eq!(b.tag_row(0), &[50.5, 51.5]);
        assert_eq!(b.tag_row(2), &[10.5, 11.5]);
    }

    #[test]
    fn test_empty_and_out_of_range() {
        assert!(assemble_batch(&split(), &[], &features()).is_err());
        assert!(assemble_batch(&split(), &[9], &features()).is_err());

        let bad = CaptionSplit::new(vec![vec![1, 0]], vec![42]);
        assert!(assemble_batch(&bad, &[0], &features()).is_err());
    }

    #[test]
    fn test_gather_videos() {
        let (v, t) = gather_videos(&[3, 0], &features()).unwrap();
        assert_eq!(v, vec![300.0, 301.0, 302.0, 0.0, 1.0, 2.0]);
        assert_eq!(t, vec![30.5, 31.5, 0.5, 1.5]);
    }

    #[test]
    fn test_to_tensors_shapes() {
        type B = burn::backend::NdArray;
        let device = Default::default();
        let b = assemble_batch(&split(), &[0, 1, 2], &features()).unwrap();
        let t = b.to_tensors::<B>(&device);
        assert_eq!(t.words.dims(),  [7, 3]);
        assert_eq!(t.mask.dims(),   [7, 3]);
        assert_eq!(t.videos.dims(), [3, 3]);
        assert_eq!(t.tags.dims(),   [3, 2]);

        let mask_sum: f32 = t.mask.sum().into_scalar();
        assert_eq!(mask_sum, 15.0);
    }
}

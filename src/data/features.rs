// ============================================================
// Layer 4 — Per-Video Feature Tables
// ============================================================
// Two dense tables, both indexed by video id:
//
//   video — concatenated visual backbone features (ResNeXt + ECO),
//           one n_z-dim row per video
//   tags  — predicted semantic-tag embedding from the upstream
//           tagging model, one n_y-dim row per video
//
// Both are loaded once and never mutated.

use anyhow::{ensure, Result};
use ndarray::Array2;

#[derive(Debug, Clone)]
pub struct VideoFeatures {
    video: Array2<f32>,
    tags:  Array2<f32>,
}

impl VideoFeatures {
    /// Pair the two tables. Row counts must agree.
    pub fn new(video: Array2<f32>, tags: Array2<f32>) -> Result<Self> {
        ensure!(
            video.nrows() == tags.nrows(),
            "video features have {} rows but tag features have {}",
            video.nrows(),
            tags.nrows()
        );
        Ok(Self { video, tags })
    }

    pub fn num_videos(&self) -> usize {
        self.video.nrows()
    }

    pub fn video_dim(&self) -> usize {
        self.video.ncols()
    }

    pub fn tag_dim(&self) -> usize {
        self.tags.ncols()
    }

    /// Append the video row for `video_id` to `out`.
    pub fn push_video_row(&self, video_id: usize, out: &mut Vec<f32>) -> Result<()> {
        ensure!(video_id < self.num_videos(), "video id {video_id} out of range");
        out.extend(self.video.row(video_id).iter().copied());
        Ok(())
    }

    /// Append the tag row for `video_id` to `out`.
    pub fn push_tag_row(&self, video_id: usize, out: &mut Vec<f32>) -> Result<()> {
        ensure!(video_id < self.num_videos(), "video id {video_id} out of range");
        out.extend(self.tags.row(video_id).iter().copied());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_mismatch_rejected() {
        let video = Array2::<f32>::zeros((4, 3));
        let tags  = Array2::<f32>::zeros((5, 2));
        assert!(VideoFeatures::new(video, tags).is_err());
    }

    #[test]
    fn test_push_rows() {
        let video = Array2::from_shape_fn((3, 2), |(r, c)| (r * 10 + c) as f32);
        let tags  = Array2::from_shape_fn((3, 1), |(r, _)| -(r as f32));
        let feats = VideoFeatures::new(video, tags).unwrap();

        let mut v = Vec::new();
        feats.push_video_row(2, &mut v).unwrap();
        feats.push_video_row(0, &mut v).unwrap();
        assert_eq!(v, vec![20.0, 21.0, 0.0, 1.0]);

        let mut t = Vec::new();
        feats.push_tag_row(1, &mut t).unwrap();
        assert_eq!(t, vec![-1.0]);

        assert!(feats.push_video_row(3, &mut v).is_err());
    }
}

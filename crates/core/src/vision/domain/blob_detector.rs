use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::vision::domain::blob::Blob;

/// Domain interface for blob detection on a binary mask.
///
/// Implementations hold their configuration; detection itself keeps no
/// state between frames.
pub trait BlobDetector: Send {
    fn detect(&self, frame: &Frame) -> Result<Vec<Blob>, Box<dyn std::error::Error>>;
}

/// Thresholds controlling which connected components are accepted as blobs.
///
/// Minimums are inclusive, maximums exclusive. A disabled filter accepts
/// every component regardless of its bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub threshold_step: f32,
    pub min_threshold: f32,
    pub max_threshold: f32,
    /// Threshold levels a blob must appear in to be reported.
    pub min_repeatability: usize,
    pub min_dist_between_blobs: f32,

    pub filter_by_color: bool,
    pub blob_color: u8,

    pub filter_by_area: bool,
    pub min_area: f32,
    pub max_area: f32,

    pub filter_by_circularity: bool,
    pub min_circularity: f32,
    pub max_circularity: f32,

    pub filter_by_inertia: bool,
    pub min_inertia_ratio: f32,
    pub max_inertia_ratio: f32,

    pub filter_by_convexity: bool,
    pub min_convexity: f32,
    pub max_convexity: f32,
}

impl DetectorConfig {
    /// Binarization levels swept per frame, `min_threshold` up to but excluding `max_threshold`.
    pub fn threshold_levels(&self) -> Vec<f32> {
        let mut levels = Vec::new();
        if self.threshold_step <= 0.0 {
            return levels;
        }
        let mut t = self.min_threshold;
        while t < self.max_threshold {
            levels.push(t);
            t += self.threshold_step;
        }
        levels
    }
}

impl Default for DetectorConfig {
    /// Tuned for laser dots on an inverted, ROI-masked threshold image.
    fn default() -> Self {
        Self {
            threshold_step: 10.0,
            min_threshold: 0.0,
            max_threshold: 100.0,
            min_repeatability: 2,
            min_dist_between_blobs: 10.0,
            filter_by_color: true,
            blob_color: 0,
            filter_by_area: true,
            min_area: 50.0,
            max_area: 5000.0,
            filter_by_circularity: true,
            min_circularity: 0.6,
            max_circularity: f32::MAX,
            filter_by_inertia: true,
            min_inertia_ratio: 0.1,
            max_inertia_ratio: f32::MAX,
            filter_by_convexity: true,
            min_convexity: 0.5,
            max_convexity: f32::MAX,
        }
    }
}

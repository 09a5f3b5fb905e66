use serde::{Deserialize, Serialize};

use crate::shared::constants::{THRESHOLD_CUTOFF, THRESHOLD_MAX_VALUE};
use crate::shared::frame::{Frame, FrameError};

/// Inverted binary threshold: samples below `cutoff` become `max_value`,
/// everything else becomes 0.
///
/// Bright laser dots therefore end up as dark (0) spots on a white mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholder {
    pub cutoff: u8,
    pub max_value: u8,
}

impl Thresholder {
    pub fn new(cutoff: u8, max_value: u8) -> Self {
        Self { cutoff, max_value }
    }

    pub fn apply_value(&self, value: u8) -> u8 {
        if value < self.cutoff {
            self.max_value
        } else {
            0
        }
    }

    pub fn apply(&self, frame: &Frame) -> Result<Frame, FrameError> {
        let source = frame.as_gray()?;
        let data: Vec<u8> = source.iter().map(|&v| self.apply_value(v)).collect();
        Ok(Frame::new(
            data,
            frame.width(),
            frame.height(),
            1,
            frame.index(),
        ))
    }
}

impl Default for Thresholder {
    fn default() -> Self {
        Self::new(THRESHOLD_CUTOFF, THRESHOLD_MAX_VALUE)
    }
}

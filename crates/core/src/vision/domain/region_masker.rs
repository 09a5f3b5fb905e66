use ndarray::s;

use crate::shared::constants::{BACKGROUND, DEFAULT_REGIONS};
use crate::shared::frame::{Frame, FrameError};
use crate::shared::region::Region;

/// Whitens everything outside the regions of interest.
///
/// Reflections and stray light outside the regions would otherwise show up
/// as dark blobs in the inverted threshold mask.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionMasker {
    regions: Vec<Region>,
}

impl RegionMasker {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Returns a new frame: `BACKGROUND` outside every region, the source
    /// samples inside any region.
    ///
    /// Fails with `OutOfBounds` instead of clipping when a region does not
    /// fit the frame.
    pub fn mask(&self, frame: &Frame) -> Result<Frame, FrameError> {
        let source = frame.as_gray()?;
        for region in &self.regions {
            region.check_within(frame.rows(), frame.cols())?;
        }

        let mut out = Frame::filled(BACKGROUND, frame.width(), frame.height(), frame.index());
        {
            let mut target = out.as_gray_mut()?;
            for r in &self.regions {
                target
                    .slice_mut(s![r.row_min..r.row_max, r.col_min..r.col_max])
                    .assign(&source.slice(s![r.row_min..r.row_max, r.col_min..r.col_max]));
            }
        }
        Ok(out)
    }
}

impl Default for RegionMasker {
    fn default() -> Self {
        Self::new(DEFAULT_REGIONS.to_vec())
    }
}

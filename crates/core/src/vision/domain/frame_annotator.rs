use crate::shared::frame::Frame;
use crate::vision::domain::blob::Blob;

/// Renders detections over a mask for visual inspection.
///
/// Display only: the returned frame is never published.
pub trait FrameAnnotator: Send {
    fn annotate(&self, mask: &Frame, blobs: &[Blob]) -> Result<Frame, Box<dyn std::error::Error>>;
}

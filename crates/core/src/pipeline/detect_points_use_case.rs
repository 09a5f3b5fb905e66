use std::time::Instant;

use crate::pipeline::pipeline_logger::{stages, PipelineLogger, BLOBS_METRIC};
use crate::shared::constants::{ORIGINAL_WINDOW, PREVIEW_WINDOW};
use crate::shared::frame::Frame;
use crate::transport::domain::preview_sink::PreviewSink;
use crate::vision::domain::blob::Blob;
use crate::vision::domain::blob_detector::BlobDetector;
use crate::vision::domain::frame_annotator::FrameAnnotator;
use crate::vision::domain::region_masker::RegionMasker;
use crate::vision::domain::thresholder::Thresholder;

/// Output of one frame: the mask to publish and the blobs found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub mask: Frame,
    pub blobs: Vec<Blob>,
}

/// Per-frame laser point pipeline: threshold → mask → detect → preview.
///
/// All collaborators are built once and reused for every frame.
pub struct DetectPointsUseCase {
    thresholder: Thresholder,
    masker: RegionMasker,
    detector: Box<dyn BlobDetector>,
    annotator: Option<Box<dyn FrameAnnotator>>,
    preview: Option<Box<dyn PreviewSink>>,
    logger: Box<dyn PipelineLogger>,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl DetectPointsUseCase {
    pub fn new(
        thresholder: Thresholder,
        masker: RegionMasker,
        detector: Box<dyn BlobDetector>,
        annotator: Option<Box<dyn FrameAnnotator>>,
        preview: Option<Box<dyn PreviewSink>>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            thresholder,
            masker,
            detector,
            annotator,
            preview,
            logger,
        }
    }

    /// Runs one grayscale frame through the pipeline.
    ///
    /// Preview failures are logged and never fail the frame.
    pub fn process(&mut self, gray: &Frame) -> Result<FrameResult, Box<dyn std::error::Error>> {
        let start = Instant::now();
        let binary = self.thresholder.apply(gray)?;
        self.logger.timing(stages::THRESHOLD, elapsed_ms(start));

        let start = Instant::now();
        let mask = self.masker.mask(&binary)?;
        self.logger.timing(stages::MASK, elapsed_ms(start));

        let start = Instant::now();
        let blobs = self.detector.detect(&mask)?;
        self.logger.timing(stages::DETECT, elapsed_ms(start));
        self.logger.metric(BLOBS_METRIC, blobs.len() as f64);
        log::debug!("frame {}: {} blob(s)", gray.index(), blobs.len());

        self.show_preview(gray, &mask, &blobs);

        Ok(FrameResult { mask, blobs })
    }

    fn show_preview(&mut self, gray: &Frame, mask: &Frame, blobs: &[Blob]) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };

        let start = Instant::now();
        let overlay = match &self.annotator {
            Some(annotator) => annotator.annotate(mask, blobs),
            None => Ok(mask.clone()),
        };
        self.logger.timing(stages::ANNOTATE, elapsed_ms(start));

        let shown = overlay
            .and_then(|overlay| preview.show(PREVIEW_WINDOW, &overlay))
            .and_then(|_| preview.show(ORIGINAL_WINDOW, gray));
        if let Err(e) = shown {
            log::warn!("preview of frame {} failed: {e}", gray.index());
        }
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Releases the preview windows and emits the run summary.
    pub fn shutdown(&mut self) {
        if let Some(preview) = self.preview.as_mut() {
            preview.close();
        }
        self.logger.summary();
    }
}

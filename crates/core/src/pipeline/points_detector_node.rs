use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::detect_points_use_case::DetectPointsUseCase;
use crate::pipeline::pipeline_logger::stages;
use crate::shared::image_message::ImageMessage;
use crate::transport::domain::frame_publisher::FramePublisher;
use crate::transport::domain::frame_source::FrameSource;
use crate::transport::domain::image_bridge;

/// Counters for one `spin` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub received: usize,
    pub published: usize,
    /// Messages that never reached the publisher (decode, bridge or pipeline failure).
    pub dropped: usize,
    pub publish_failures: usize,
    pub blobs: usize,
}

/// Subscribes to camera images and publishes their laser point masks.
///
/// One message in, at most one mask out. A bad message is logged and skipped;
/// it never stops the node.
pub struct PointsDetectorNode {
    name: String,
    use_case: DetectPointsUseCase,
    cancelled: Arc<AtomicBool>,
}

impl PointsDetectorNode {
    pub fn new(
        name: &str,
        use_case: DetectPointsUseCase,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            use_case,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flag that stops `spin` before the next message when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Processes messages until the source ends or the node is cancelled.
    ///
    /// On exit the preview is released and the publisher closed.
    pub fn spin(
        &mut self,
        source: &mut dyn FrameSource,
        publisher: &mut dyn FramePublisher,
    ) -> Result<NodeStats, Box<dyn std::error::Error>> {
        log::info!(
            "{}: subscribed to {}, publishing on {}",
            self.name,
            source.topic(),
            publisher.topic()
        );

        let mut stats = NodeStats::default();
        for item in source.messages() {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("{}: shutdown requested", self.name);
                break;
            }
            stats.received += 1;

            match item {
                Ok(message) => self.handle(&message, publisher, &mut stats),
                Err(e) => {
                    log::warn!("{}: dropping unreadable message: {e}", self.name);
                    stats.dropped += 1;
                }
            }
            self.use_case.logger_mut().progress(stats.received);
        }

        source.close();
        self.use_case.shutdown();
        publisher.close()?;

        log::info!(
            "{}: received {}, published {}, dropped {}, publish failures {}",
            self.name,
            stats.received,
            stats.published,
            stats.dropped,
            stats.publish_failures
        );
        Ok(stats)
    }

    fn handle(
        &mut self,
        message: &ImageMessage,
        publisher: &mut dyn FramePublisher,
        stats: &mut NodeStats,
    ) {
        let gray = match image_bridge::to_mono8(message) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("{}: dropping frame {}: {e}", self.name, message.seq);
                stats.dropped += 1;
                return;
            }
        };

        let result = match self.use_case.process(&gray) {
            Ok(result) => result,
            Err(e) => {
                log::error!("{}: frame {} failed: {e}", self.name, message.seq);
                stats.dropped += 1;
                return;
            }
        };
        stats.blobs += result.blobs.len();

        let reply = match image_bridge::to_message(&result.mask) {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("{}: cannot encode mask {}: {e}", self.name, message.seq);
                stats.dropped += 1;
                return;
            }
        };

        let start = Instant::now();
        match publisher.publish(&reply) {
            Ok(()) => stats.published += 1,
            Err(e) => {
                log::warn!("{}: publish of frame {} failed: {e}", self.name, message.seq);
                stats.publish_failures += 1;
            }
        }
        self.use_case
            .logger_mut()
            .timing(stages::PUBLISH, start.elapsed().as_secs_f64() * 1000.0);
    }
}

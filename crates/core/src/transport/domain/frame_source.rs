use crate::shared::image_message::ImageMessage;

/// Delivers image messages from an input topic.
///
/// The iterator ends when the upstream side closes. Per-message failures are
/// yielded as `Err` items so the consumer can skip them and keep going.
pub trait FrameSource: Send {
    fn topic(&self) -> &str;

    fn messages(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<ImageMessage, Box<dyn std::error::Error>>> + '_>;

    /// Stops delivery; safe to call more than once.
    fn close(&mut self);
}

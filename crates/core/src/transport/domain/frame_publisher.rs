use crate::shared::image_message::ImageMessage;

/// Emits image messages on an output topic.
pub trait FramePublisher: Send {
    fn topic(&self) -> &str;

    fn publish(&mut self, message: &ImageMessage) -> Result<(), Box<dyn std::error::Error>>;

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

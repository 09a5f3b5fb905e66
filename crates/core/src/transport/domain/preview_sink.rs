use crate::shared::frame::Frame;

/// Named display surfaces ("windows") for inspecting frames while the node runs.
pub trait PreviewSink: Send {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Releases every window.
    fn close(&mut self);
}

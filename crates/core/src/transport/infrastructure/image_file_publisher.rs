use std::path::{Path, PathBuf};

use crate::shared::image_message::ImageMessage;
use crate::transport::domain::frame_publisher::FramePublisher;
use crate::transport::domain::image_bridge;

/// Writes every published message as `frame_NNNNNN.png` (by `seq`) in a directory.
pub struct ImageFilePublisher {
    topic: String,
    dir: PathBuf,
    written: usize,
}

impl ImageFilePublisher {
    pub fn new(topic: &str, dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            topic: topic.to_string(),
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn path_for(&self, seq: usize) -> PathBuf {
        self.dir.join(format!("frame_{seq:06}.png"))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FramePublisher for ImageFilePublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&mut self, message: &ImageMessage) -> Result<(), Box<dyn std::error::Error>> {
        let frame = image_bridge::to_mono8(message)?;
        let img = image::GrayImage::from_raw(frame.width(), frame.height(), frame.into_data())
            .ok_or("Failed to create image from frame data")?;
        img.save(self.path_for(message.seq))?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::debug!("{}: wrote {} frame(s) to {}", self.topic, self.written, self.dir.display());
        Ok(())
    }
}

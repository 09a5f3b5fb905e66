use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::transport::domain::preview_sink::PreviewSink;

/// Headless preview: each shown frame is saved as `<window>_NNNNNN.png`.
pub struct ImageFilePreviewSink {
    dir: PathBuf,
    closed: bool,
}

impl ImageFilePreviewSink {
    pub fn new(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            closed: false,
        })
    }

    pub fn path_for(&self, window: &str, index: usize) -> PathBuf {
        let stem: String = window
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{stem}_{index:06}.png"))
    }
}

impl PreviewSink for ImageFilePreviewSink {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.closed {
            return Err(format!("preview closed, cannot show {window}").into());
        }
        let path = self.path_for(window, frame.index());
        let data = frame.data().to_vec();
        match frame.channels() {
            1 => image::GrayImage::from_raw(frame.width(), frame.height(), data)
                .ok_or("Failed to create image from frame data")?
                .save(&path)?,
            3 => image::RgbImage::from_raw(frame.width(), frame.height(), data)
                .ok_or("Failed to create image from frame data")?
                .save(&path)?,
            n => return Err(format!("cannot preview a {n}-channel frame").into()),
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::image_message::ImageMessage;
use crate::transport::domain::frame_source::FrameSource;
use crate::transport::domain::image_bridge::encodings;

/// Replays image files as camera messages.
///
/// A directory is replayed in file-name order; only files with a known image
/// extension are picked up. Grayscale files become `mono8` messages, everything
/// else `rgb8`. `seq` is the position in the replay order.
pub struct ImageFileSource {
    topic: String,
    paths: Vec<PathBuf>,
    position: usize,
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn decode(path: &Path, seq: usize) -> Result<ImageMessage, Box<dyn std::error::Error>> {
    let image = image::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let (width, height) = (image.width(), image.height());
    let message = if image.color().has_color() {
        ImageMessage::packed(seq, width, height, encodings::RGB8, 3, image.to_rgb8().into_raw())
    } else {
        ImageMessage::packed(seq, width, height, encodings::MONO8, 1, image.to_luma8().into_raw())
    };
    Ok(message)
}

impl ImageFileSource {
    pub fn open(topic: &str, input: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let paths = if input.is_dir() {
            list_images(input)?
        } else if input.is_file() {
            vec![input.to_path_buf()]
        } else {
            return Err(format!("input not found: {}", input.display()).into());
        };
        if paths.is_empty() {
            return Err(format!("no images found in {}", input.display()).into());
        }
        log::info!("{topic}: replaying {} image(s) from {}", paths.len(), input.display());
        Ok(Self {
            topic: topic.to_string(),
            paths,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageFileSource {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn messages(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<ImageMessage, Box<dyn std::error::Error>>> + '_> {
        Box::new(std::iter::from_fn(move || {
            let path = self.paths.get(self.position)?.clone();
            let seq = self.position;
            self.position += 1;
            Some(decode(&path, seq))
        }))
    }

    fn close(&mut self) {
        self.position = self.paths.len();
    }
}

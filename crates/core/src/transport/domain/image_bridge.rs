//! Conversion between transport messages and single-channel frames.

use image::{DynamicImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::image_message::ImageMessage;

pub mod encodings {
    pub const MONO8: &str = "mono8";
    pub const MONO16: &str = "mono16";
    pub const RGB8: &str = "rgb8";
    pub const BGR8: &str = "bgr8";
    pub const RGBA8: &str = "rgba8";
    pub const BGRA8: &str = "bgra8";
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("unsupported image encoding: {0:?}")]
    UnsupportedEncoding(String),
    #[error("row step of {step} bytes is shorter than a {min}-byte row")]
    InvalidStep { step: usize, min: usize },
    #[error("image data is {actual} bytes, expected at least {expected}")]
    TruncatedData { expected: usize, actual: usize },
    #[error("cannot encode a {0}-channel frame")]
    UnsupportedChannels(u8),
}

fn bytes_per_pixel(encoding: &str) -> Option<usize> {
    match encoding {
        encodings::MONO8 => Some(1),
        encodings::MONO16 => Some(2),
        encodings::RGB8 | encodings::BGR8 => Some(3),
        encodings::RGBA8 | encodings::BGRA8 => Some(4),
        _ => None,
    }
}

/// Rows of `message` without padding.
fn packed_rows(message: &ImageMessage, bytes_per_pixel: usize) -> Result<Vec<u8>, BridgeError> {
    let actual = message.data.len();
    // Header sizes too large to address can never be backed by the payload.
    let too_large = || BridgeError::TruncatedData {
        expected: usize::MAX,
        actual,
    };
    let row_bytes = (message.width as usize)
        .checked_mul(bytes_per_pixel)
        .ok_or_else(too_large)?;
    let step = message.step as usize;
    if step < row_bytes {
        return Err(BridgeError::InvalidStep {
            step,
            min: row_bytes,
        });
    }

    let height = message.height as usize;
    let expected = match height {
        0 => 0,
        h => step
            .checked_mul(h - 1)
            .and_then(|padded| padded.checked_add(row_bytes))
            .ok_or_else(too_large)?,
    };
    if actual < expected {
        return Err(BridgeError::TruncatedData { expected, actual });
    }

    if step == row_bytes {
        return Ok(message.data[..expected].to_vec());
    }
    let mut packed = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * step;
        packed.extend_from_slice(&message.data[start..start + row_bytes]);
    }
    Ok(packed)
}

fn swap_red_blue(data: &mut [u8], bytes_per_pixel: usize) {
    for pixel in data.chunks_exact_mut(bytes_per_pixel) {
        pixel.swap(0, 2);
    }
}

/// Decodes a message into a mono8 frame whose index is the message `seq`.
///
/// Colour encodings are reduced to luma; mono16 is rescaled to 8 bits.
pub fn to_mono8(message: &ImageMessage) -> Result<Frame, BridgeError> {
    let encoding = message.encoding.as_str();
    let bpp = bytes_per_pixel(encoding)
        .ok_or_else(|| BridgeError::UnsupportedEncoding(message.encoding.clone()))?;
    let mut data = packed_rows(message, bpp)?;
    let (width, height) = (message.width, message.height);
    let size_error = |len: usize| BridgeError::TruncatedData {
        expected: width as usize * height as usize * bpp,
        actual: len,
    };

    let gray = match encoding {
        encodings::MONO8 => data,
        encodings::MONO16 => {
            let samples: Vec<u16> = data
                .chunks_exact(2)
                .map(|b| match message.is_bigendian {
                    true => u16::from_be_bytes([b[0], b[1]]),
                    false => u16::from_le_bytes([b[0], b[1]]),
                })
                .collect();
            let len = data.len();
            let image = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, samples)
                .ok_or_else(|| size_error(len))?;
            DynamicImage::ImageLuma16(image).to_luma8().into_raw()
        }
        encodings::RGB8 | encodings::BGR8 => {
            if encoding == encodings::BGR8 {
                swap_red_blue(&mut data, 3);
            }
            let len = data.len();
            let image = RgbImage::from_raw(width, height, data).ok_or_else(|| size_error(len))?;
            DynamicImage::ImageRgb8(image).to_luma8().into_raw()
        }
        _ => {
            if encoding == encodings::BGRA8 {
                swap_red_blue(&mut data, 4);
            }
            let len = data.len();
            let image = RgbaImage::from_raw(width, height, data).ok_or_else(|| size_error(len))?;
            DynamicImage::ImageRgba8(image).to_luma8().into_raw()
        }
    };

    Ok(Frame::new(gray, width, height, 1, message.seq))
}

/// Wraps a frame as a tightly packed message: `mono8` for one channel,
/// `rgb8` for three.
pub fn to_message(frame: &Frame) -> Result<ImageMessage, BridgeError> {
    let encoding = match frame.channels() {
        1 => encodings::MONO8,
        3 => encodings::RGB8,
        n => return Err(BridgeError::UnsupportedChannels(n)),
    };
    Ok(ImageMessage::packed(
        frame.index(),
        frame.width(),
        frame.height(),
        encoding,
        frame.channels() as u32,
        frame.data().to_vec(),
    ))
}

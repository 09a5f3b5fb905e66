use ndarray::{ArrayView2, ArrayViewMut2};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("pixel ({row}, {col}) is outside a {rows}x{cols} frame")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("expected a {expected}-channel frame, got {actual} channels")]
    ChannelMismatch { expected: u8, actual: u8 },
}

/// A single camera frame: contiguous bytes in row-major order.
///
/// Masks and grayscale frames carry one channel, annotated overlays three (RGB).
/// `index` is the sequence number of the message the frame was decoded from.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Single-channel frame with every sample set to `value`.
    pub fn filled(value: u8, width: u32, height: u32, index: usize) -> Self {
        Self::new(
            vec![value; width as usize * height as usize],
            width,
            height,
            1,
            index,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rows(&self) -> usize {
        self.height as usize
    }

    pub fn cols(&self) -> usize {
        self.width as usize
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Sample at `(row, col)` of a single-channel frame.
    pub fn get(&self, row: usize, col: usize) -> Result<u8, FrameError> {
        self.ensure_single_channel()?;
        if row >= self.rows() || col >= self.cols() {
            return Err(FrameError::OutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.data[row * self.cols() + col])
    }

    pub fn ensure_single_channel(&self) -> Result<(), FrameError> {
        if self.channels != 1 {
            return Err(FrameError::ChannelMismatch {
                expected: 1,
                actual: self.channels,
            });
        }
        Ok(())
    }

    /// `(rows, cols)` view of a single-channel frame.
    pub fn as_gray(&self) -> Result<ArrayView2<'_, u8>, FrameError> {
        self.ensure_single_channel()?;
        Ok(ArrayView2::from_shape((self.rows(), self.cols()), &self.data)
            .expect("Frame data length must match dimensions"))
    }

    pub fn as_gray_mut(&mut self) -> Result<ArrayViewMut2<'_, u8>, FrameError> {
        self.ensure_single_channel()?;
        let shape = (self.rows(), self.cols());
        Ok(ArrayViewMut2::from_shape(shape, &mut self.data)
            .expect("Frame data length must match dimensions"))
    }
}

/// Raw image as carried on a topic.
///
/// Mirrors the usual camera driver message: dimensions, a pixel encoding
/// name, the row stride in bytes and the packed data.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageMessage {
    pub seq: usize,
    pub width: u32,
    pub height: u32,
    pub encoding: String,
    pub is_bigendian: bool,
    /// Bytes per row, including any padding.
    pub step: u32,
    pub data: Vec<u8>,
}

impl ImageMessage {
    /// Tightly packed message (`step = width * bytes_per_pixel`).
    pub fn packed(
        seq: usize,
        width: u32,
        height: u32,
        encoding: &str,
        bytes_per_pixel: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            seq,
            width,
            height,
            encoding: encoding.to_string(),
            is_bigendian: false,
            step: width * bytes_per_pixel,
            data,
        }
    }
}

/// A detected point: sub-pixel center and diameter in pixels.
///
/// `x` is the column and `y` the row. Blobs carry no identity across frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Blob {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self { x, y, size }
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }
}

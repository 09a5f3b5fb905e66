use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::vision::domain::blob::Blob;
use crate::vision::domain::frame_annotator::FrameAnnotator;

pub mod colors {
    use image::Rgb;

    pub const KEYPOINT: Rgb<u8> = Rgb([255, 0, 0]);
    pub const REGION: Rgb<u8> = Rgb([0, 255, 0]);
    pub const GUIDE: Rgb<u8> = Rgb([0, 0, 255]);
}

/// Annotates a mask with blob rings and, optionally, region outlines and
/// guide lines through the first two blobs.
pub struct OverlayAnnotator {
    regions: Vec<Region>,
    draw_regions: bool,
    draw_guide_lines: bool,
}

impl OverlayAnnotator {
    pub fn new(regions: Vec<Region>, draw_regions: bool, draw_guide_lines: bool) -> Self {
        Self {
            regions,
            draw_regions,
            draw_guide_lines,
        }
    }
}

impl FrameAnnotator for OverlayAnnotator {
    fn annotate(&self, mask: &Frame, blobs: &[Blob]) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut image = draw_keypoints(mask, blobs)?;
        if self.draw_regions {
            draw_regions(&mut image, &self.regions);
        }
        if self.draw_guide_lines {
            draw_guide_lines(&mut image, blobs);
        }
        let (width, height) = image.dimensions();
        Ok(Frame::new(image.into_raw(), width, height, 3, mask.index()))
    }
}

/// RGB copy of a single-channel frame.
pub fn to_rgb_image(frame: &Frame) -> Result<RgbImage, Box<dyn std::error::Error>> {
    frame.ensure_single_channel()?;
    let gray = GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("Failed to create image from frame data")?;
    Ok(DynamicImage::ImageLuma8(gray).to_rgb8())
}

/// Ring of the blob's diameter plus a center mark, per blob.
pub fn draw_keypoints(mask: &Frame, blobs: &[Blob]) -> Result<RgbImage, Box<dyn std::error::Error>> {
    let mut image = to_rgb_image(mask)?;
    for blob in blobs {
        let cx = blob.x.round() as i32;
        let cy = blob.y.round() as i32;
        let radius = blob.radius().round().max(1.0) as i32;
        draw_hollow_circle_mut(&mut image, (cx, cy), radius, colors::KEYPOINT);
        draw_cross_mut(&mut image, colors::KEYPOINT, cx, cy);
    }
    Ok(image)
}

/// Outlines each non-empty region. The outline includes `row_max` and
/// `col_max`, one pixel past the masked area.
pub fn draw_regions(image: &mut RgbImage, regions: &[Region]) {
    for region in regions.iter().filter(|r| !r.is_empty()) {
        let rect = Rect::at(region.col_min as i32, region.row_min as i32)
            .of_size(region.cols() as u32 + 1, region.rows() as u32 + 1);
        draw_hollow_rect_mut(image, rect, colors::REGION);
    }
}

/// Vertical lines from the top edge through the first two blob centers to
/// the bottom edge. With fewer than two blobs nothing is drawn.
pub fn draw_guide_lines(image: &mut RgbImage, blobs: &[Blob]) {
    let [first, second, ..] = blobs else {
        return;
    };
    let bottom = image.height().saturating_sub(1) as f32;
    for blob in [first, second] {
        let x = blob.x.trunc() as f32;
        let y = blob.y.trunc() as f32;
        draw_line_segment_mut(image, (x, 0.0), (x, y), colors::GUIDE);
        draw_line_segment_mut(image, (x, y), (x, bottom), colors::GUIDE);
    }
}

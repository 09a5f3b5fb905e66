use imageproc::geometry::{arc_length, contour_area, convex_hull};

use crate::shared::frame::Frame;
use crate::vision::domain::blob::Blob;
use crate::vision::domain::blob_detector::{BlobDetector, DetectorConfig};
use crate::vision::infrastructure::component_labeling::{components, Component};
use crate::vision::infrastructure::shape_metrics::{circularity, median, Moments};

/// Candidate center found at one threshold level.
#[derive(Debug, Clone, Copy)]
struct Center {
    x: f64,
    y: f64,
    radius: f64,
}

/// Threshold-sweep blob detector.
///
/// For every level in `[min_threshold, max_threshold)` the frame is
/// binarized, connected components are measured and filtered, and the
/// surviving centers are grouped across levels. A group seen at
/// `min_repeatability` levels or more becomes one [`Blob`].
///
/// Blobs come out in scan order of the component that first opened their group.
pub struct SimpleBlobDetector {
    config: DetectorConfig,
}

impl SimpleBlobDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn find_centers(&self, binary: &[u8], rows: usize, cols: usize) -> Vec<Center> {
        let polarities: &[u8] = if self.config.filter_by_color {
            std::slice::from_ref(&self.config.blob_color)
        } else {
            &[0, 255]
        };

        let mut found: Vec<((usize, usize), Center)> = Vec::new();
        for &value in polarities {
            for component in components(binary, rows, cols, value) {
                if let Some(center) = self.measure(&component, binary, cols) {
                    found.push((component.start(), center));
                }
            }
        }
        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, center)| center).collect()
    }

    /// Applies the enabled shape filters; `None` when the component is rejected.
    ///
    /// Area is the pixel count. Circularity and convexity are measured on the
    /// outer contour polygon.
    fn measure(&self, component: &Component, binary: &[u8], cols: usize) -> Option<Center> {
        let config = &self.config;
        let moments = Moments::from_pixels(&component.pixels);

        if config.filter_by_area && !in_range(moments.m00, config.min_area, config.max_area) {
            return None;
        }

        let contour = &component.contour;
        let enclosed = contour_area(contour);

        if config.filter_by_circularity {
            let value = circularity(enclosed, arc_length(contour, true))?;
            if !in_range(value, config.min_circularity, config.max_circularity) {
                return None;
            }
        }

        if config.filter_by_inertia {
            let ratio = moments.inertia_ratio();
            if !in_range(ratio, config.min_inertia_ratio, config.max_inertia_ratio) {
                return None;
            }
        }

        if config.filter_by_convexity {
            // Repeated points break the hull's angular sort.
            let mut distinct = contour.clone();
            distinct.sort_by_key(|p| (p.y, p.x));
            distinct.dedup();
            let hull_area = contour_area(&convex_hull(distinct));
            if hull_area <= 0.0 {
                return None;
            }
            if !in_range(enclosed / hull_area, config.min_convexity, config.max_convexity) {
                return None;
            }
        }

        let (x, y) = moments.centroid();

        if config.filter_by_color {
            let row = y.round() as usize;
            let col = x.round() as usize;
            if binary[row * cols + col] != config.blob_color {
                return None;
            }
        }

        let mut distances: Vec<f64> = contour
            .iter()
            .map(|p| (p.x as f64 - x).hypot(p.y as f64 - y))
            .collect();
        let radius = median(&mut distances);

        Some(Center { x, y, radius })
    }

    /// Appends `centers` to the group they fall into, opening new groups
    /// for the rest.
    fn merge_into_groups(&self, groups: &mut Vec<Vec<Center>>, centers: &[Center]) {
        let min_dist = self.config.min_dist_between_blobs as f64;
        let mut opened: Vec<Vec<Center>> = Vec::new();

        for &center in centers {
            let mut joined = false;
            for group in groups.iter_mut() {
                let reference = group[group.len() / 2];
                let dist = (reference.x - center.x).hypot(reference.y - center.y);
                let is_new = dist >= min_dist && dist >= reference.radius && dist >= center.radius;
                if !is_new {
                    let at = group.partition_point(|c| c.radius <= center.radius);
                    group.insert(at, center);
                    joined = true;
                    break;
                }
            }
            if !joined {
                opened.push(vec![center]);
            }
        }

        groups.extend(opened);
    }
}

fn in_range(value: f64, min: f32, max: f32) -> bool {
    value >= min as f64 && value < max as f64
}

impl BlobDetector for SimpleBlobDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<Blob>, Box<dyn std::error::Error>> {
        frame.ensure_single_channel()?;
        let rows = frame.rows();
        let cols = frame.cols();

        let mut groups: Vec<Vec<Center>> = Vec::new();
        // Binary masks binarize identically at every level; reuse the last result.
        let mut previous: Option<(Vec<u8>, Vec<Center>)> = None;

        for level in self.config.threshold_levels() {
            let binary: Vec<u8> = frame
                .data()
                .iter()
                .map(|&v| if v as f32 > level { 255 } else { 0 })
                .collect();

            let centers = match &previous {
                Some((last_binary, last_centers)) if *last_binary == binary => last_centers.clone(),
                _ => self.find_centers(&binary, rows, cols),
            };

            self.merge_into_groups(&mut groups, &centers);
            previous = Some((binary, centers));
        }

        let blobs = groups
            .iter()
            .filter(|g| g.len() >= self.config.min_repeatability)
            .map(|g| {
                let n = g.len() as f64;
                let x = g.iter().map(|c| c.x).sum::<f64>() / n;
                let y = g.iter().map(|c| c.y).sum::<f64>() / n;
                Blob::new(x, y, g[g.len() / 2].radius * 2.0)
            })
            .collect::<Vec<_>>();

        log::debug!("Detected {} blobs in frame {}", blobs.len(), frame.index());
        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    const W: u32 = 640;
    const H: u32 = 480;

    /// White frame with filled dark disks.
    fn frame_with_disks(disks: &[(f64, f64, f64)]) -> Frame {
        frame_with_ellipses(&disks.iter().map(|&(cx, cy, r)| (cx, cy, r, r)).collect::<Vec<_>>())
    }

    /// White frame with filled, axis-aligned dark ellipses `(cx, cy, rx, ry)`.
    fn frame_with_ellipses(ellipses: &[(f64, f64, f64, f64)]) -> Frame {
        let mut frame = Frame::filled(255, W, H, 0);
        let cols = W as usize;
        for row in 0..H as usize {
            for col in 0..cols {
                let inside = ellipses.iter().any(|&(cx, cy, rx, ry)| {
                    let dx = (col as f64 - cx) / rx;
                    let dy = (row as f64 - cy) / ry;
                    dx * dx + dy * dy <= 1.0
                });
                if inside {
                    frame.data_mut()[row * cols + col] = 0;
                }
            }
        }
        frame
    }

    fn dark_pixel_count(frame: &Frame) -> usize {
        frame.data().iter().filter(|&&v| v == 0).count()
    }

    fn detector() -> SimpleBlobDetector {
        SimpleBlobDetector::new(DetectorConfig::default())
    }

    #[test]
    fn test_single_disk_is_found_at_its_center() {
        let frame = frame_with_disks(&[(200.0, 100.0, 8.0)]);
        assert!((190..=210).contains(&dark_pixel_count(&frame)));

        let blobs = detector().detect(&frame).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_abs_diff_eq!(blobs[0].x, 200.0, epsilon = 1.0);
        assert_abs_diff_eq!(blobs[0].y, 100.0, epsilon = 1.0);
        assert_abs_diff_eq!(blobs[0].size, 16.0, epsilon = 2.0);
    }

    #[test]
    fn test_disk_below_min_area_is_rejected() {
        let frame = frame_with_disks(&[(200.0, 100.0, 1.8)]);
        assert!(dark_pixel_count(&frame) <= 13);
        assert!(detector().detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_elongated_ellipse_is_rejected() {
        let frame = frame_with_ellipses(&[(300.0, 150.0, 40.0, 3.0)]);
        assert!(detector().detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_elongated_ellipse_is_rejected_by_inertia_alone() {
        let frame = frame_with_ellipses(&[(300.0, 150.0, 40.0, 3.0)]);
        let config = DetectorConfig {
            filter_by_circularity: false,
            filter_by_convexity: false,
            ..DetectorConfig::default()
        };
        assert!(SimpleBlobDetector::new(config.clone()).detect(&frame).unwrap().is_empty());

        let without_inertia = DetectorConfig {
            filter_by_inertia: false,
            ..config
        };
        assert_eq!(
            SimpleBlobDetector::new(without_inertia).detect(&frame).unwrap().len(),
            1
        );
    }

    /// White frame with one dark axis-aligned block.
    fn frame_with_block(col: usize, row: usize, width: usize, height: usize) -> Frame {
        let mut frame = Frame::filled(255, W, H, 0);
        let cols = W as usize;
        for r in row..row + height {
            frame.data_mut()[r * cols + col..r * cols + col + width].fill(0);
        }
        frame
    }

    #[test]
    fn test_elongated_block_fails_circularity() {
        // 7x20 pixels: contour area 114, perimeter 50, circularity ~0.57.
        let frame = frame_with_block(200, 100, 20, 7);
        assert!(detector().detect(&frame).unwrap().is_empty());

        let without_circularity = DetectorConfig {
            filter_by_circularity: false,
            ..DetectorConfig::default()
        };
        let blobs = SimpleBlobDetector::new(without_circularity).detect(&frame).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_abs_diff_eq!(blobs[0].x, 209.5, epsilon = 1e-9);
        assert_abs_diff_eq!(blobs[0].y, 103.0, epsilon = 1e-9);
    }

    #[test]
    fn test_square_block_passes_every_filter() {
        let frame = frame_with_block(300, 200, 12, 12);
        let blobs = detector().detect(&frame).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_abs_diff_eq!(blobs[0].x, 305.5, epsilon = 1e-9);
        assert_abs_diff_eq!(blobs[0].y, 205.5, epsilon = 1e-9);
    }

    #[test]
    fn test_one_pixel_wide_diagonal_is_rejected_by_convexity() {
        let mut frame = Frame::filled(255, W, H, 0);
        let cols = W as usize;
        for i in 0..80usize {
            frame.data_mut()[(100 + i) * cols + 200 + i] = 0;
        }
        let config = DetectorConfig {
            filter_by_circularity: false,
            filter_by_inertia: false,
            ..DetectorConfig::default()
        };
        assert!(SimpleBlobDetector::new(config).detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_blob_on_frame_edge_is_measured() {
        let frame = frame_with_block(0, 0, 12, 12);
        let blobs = detector().detect(&frame).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_abs_diff_eq!(blobs[0].x, 5.5, epsilon = 1e-9);
    }

    #[test]
    fn test_blank_frame_yields_no_blobs() {
        let frame = Frame::filled(255, W, H, 0);
        assert!(detector().detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_multiple_disks_in_scan_order() {
        // Equal radii on one row: the tie is broken by column.
        let frame = frame_with_disks(&[(400.0, 380.0, 9.0), (500.0, 60.0, 8.0), (100.0, 60.0, 8.0)]);
        let blobs = detector().detect(&frame).unwrap();
        assert_eq!(blobs.len(), 3);
        assert_abs_diff_eq!(blobs[0].x, 100.0, epsilon = 1.0);
        assert_abs_diff_eq!(blobs[1].x, 500.0, epsilon = 1.0);
        assert_abs_diff_eq!(blobs[2].y, 380.0, epsilon = 1.0);
    }

    #[test]
    fn test_bright_disk_ignored_when_looking_for_dark_blobs() {
        let mut frame = Frame::filled(0, W, H, 0);
        let cols = W as usize;
        for row in 90..110usize {
            for col in 190..210usize {
                let (dx, dy) = (col as f64 - 200.0, row as f64 - 100.0);
                if dx * dx + dy * dy <= 64.0 {
                    frame.data_mut()[row * cols + col] = 255;
                }
            }
        }
        assert!(detector().detect(&frame).unwrap().is_empty());

        let bright = DetectorConfig {
            blob_color: 255,
            ..DetectorConfig::default()
        };
        assert_eq!(SimpleBlobDetector::new(bright).detect(&frame).unwrap().len(), 1);
    }

    #[test]
    fn test_ring_fails_color_check() {
        // The centroid of an annulus falls on background.
        let frame = frame_with_disks(&[(300.0, 200.0, 20.0)]);
        let mut data = frame.into_data();
        let cols = W as usize;
        for row in 185..216usize {
            for col in 285..316usize {
                let (dx, dy) = (col as f64 - 300.0, row as f64 - 200.0);
                if dx * dx + dy * dy <= 144.0 {
                    data[row * cols + col] = 255;
                }
            }
        }
        let ring = Frame::new(data, W, H, 1, 0);
        let config = DetectorConfig {
            filter_by_convexity: false,
            filter_by_inertia: false,
            filter_by_circularity: false,
            ..DetectorConfig::default()
        };
        assert!(SimpleBlobDetector::new(config).detect(&ring).unwrap().is_empty());
    }

    #[rstest]
    #[case::disabled_repeatability(1, 1)]
    #[case::default_repeatability(2, 1)]
    #[case::more_than_levels(11, 0)]
    fn test_repeatability(#[case] min_repeatability: usize, #[case] expected: usize) {
        let frame = frame_with_disks(&[(200.0, 100.0, 8.0)]);
        let config = DetectorConfig {
            min_repeatability,
            ..DetectorConfig::default()
        };
        assert_eq!(SimpleBlobDetector::new(config).detect(&frame).unwrap().len(), expected);
    }

    #[test]
    fn test_gray_levels_between_thresholds_are_grouped() {
        // Disk at intensity 50: dark for levels 50..90, bright below. Five
        // levels see it, which still satisfies repeatability.
        let mut frame = frame_with_disks(&[(200.0, 100.0, 8.0)]);
        for v in frame.data_mut() {
            if *v == 0 {
                *v = 50;
            }
        }
        let blobs = detector().detect(&frame).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_abs_diff_eq!(blobs[0].x, 200.0, epsilon = 1.0);
    }

    #[test]
    fn test_rejects_color_frame() {
        let frame = Frame::new(vec![0; 12], 2, 2, 3, 0);
        assert!(detector().detect(&frame).is_err());
    }
}

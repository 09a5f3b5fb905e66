use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};

/// An 8-connected set of pixels sharing one binary value.
#[derive(Debug, Clone)]
pub(crate) struct Component {
    /// `(row, col)` coordinates in scan order.
    pub pixels: Vec<(usize, usize)>,
    /// Outer border through the centers of the boundary pixels, `x = col`, `y = row`.
    ///
    /// Thin parts are walked out and back, so a point may repeat.
    pub contour: Vec<Point<i32>>,
}

impl Component {
    /// First pixel in scan order.
    pub fn start(&self) -> (usize, usize) {
        self.pixels[0]
    }
}

/// Every 8-connected component of pixels equal to `value`, ordered by the
/// scan position of its first pixel.
pub(crate) fn components(binary: &[u8], rows: usize, cols: usize, value: u8) -> Vec<Component> {
    // A one-pixel background border gives components on the frame edge an outer contour.
    let padded = GrayImage::from_fn(cols as u32 + 2, rows as u32 + 2, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let inside = (1..=cols).contains(&x) && (1..=rows).contains(&y);
        match inside && binary[(y - 1) * cols + (x - 1)] == value {
            true => Luma([255]),
            false => Luma([0]),
        }
    });

    let labels = connected_components(&padded, Connectivity::Eight, Luma([0u8]));
    let mut found: Vec<Component> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        // Labels are handed out in scan order, so a new label is always the next one.
        if label > found.len() {
            found.push(Component {
                pixels: Vec::new(),
                contour: Vec::new(),
            });
        }
        found[label - 1]
            .pixels
            .push((y as usize - 1, x as usize - 1));
    }

    for contour in find_contours::<i32>(&padded) {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let Some(first) = contour.points.first() else {
            continue;
        };
        let label = labels.get_pixel(first.x as u32, first.y as u32)[0] as usize;
        if let Some(component) = label.checked_sub(1).and_then(|i| found.get_mut(i)) {
            component.contour = contour
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_from_rows(rows: &[&str]) -> (Vec<u8>, usize, usize) {
        let data = rows
            .iter()
            .flat_map(|r| r.chars().map(|ch| if ch == '#' { 0 } else { 255 }))
            .collect();
        (data, rows.len(), rows[0].len())
    }

    fn sorted(points: &[Point<i32>]) -> Vec<(i32, i32)> {
        let mut xy: Vec<_> = points.iter().map(|p| (p.x, p.y)).collect();
        xy.sort();
        xy
    }

    #[test]
    fn test_components_in_scan_order() {
        let (data, rows, cols) = binary_from_rows(&[
            "....##", //
            "#...##", //
            "#.....", //
            "...#..", //
        ]);
        let found = components(&data, rows, cols, 0);
        let starts: Vec<_> = found.iter().map(|c| c.start()).collect();
        assert_eq!(starts, vec![(0, 4), (1, 0), (3, 3)]);
        assert_eq!(found[0].pixels.len(), 4);
        assert_eq!(found[1].pixels.len(), 2);
        assert_eq!(found[2].pixels.len(), 1);
        assert!(found.iter().all(|c| !c.contour.is_empty()));
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let (data, rows, cols) = binary_from_rows(&[
            "#..", //
            ".#.", //
            "..#", //
        ]);
        let found = components(&data, rows, cols, 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pixels.len(), 3);
    }

    #[test]
    fn test_labels_other_value() {
        let (data, rows, cols) = binary_from_rows(&[
            "#.#", //
            "#.#", //
        ]);
        let found = components(&data, rows, cols, 255);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start(), (0, 1));
    }

    #[test]
    fn test_single_pixel_contour() {
        let (data, rows, cols) = binary_from_rows(&["...", ".#.", "..."]);
        let found = components(&data, rows, cols, 0);
        assert_eq!(found[0].contour, vec![Point::new(1, 1)]);
    }

    #[test]
    fn test_square_contour_visits_each_border_pixel_once() {
        let (data, rows, cols) = binary_from_rows(&[
            ".....", //
            ".###.", //
            ".###.", //
            ".###.", //
            ".....", //
        ]);
        let found = components(&data, rows, cols, 0);
        assert_eq!(
            sorted(&found[0].contour),
            vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 3), (3, 1), (3, 2), (3, 3)]
        );
    }

    #[test]
    fn test_component_touching_frame_edge_has_contour() {
        let (data, rows, cols) = binary_from_rows(&[
            "##.", //
            "##.", //
        ]);
        let found = components(&data, rows, cols, 0);
        assert_eq!(found.len(), 1);
        assert_eq!(sorted(&found[0].contour), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_contour_skips_hole_border() {
        let (data, rows, cols) = binary_from_rows(&[
            "#######", //
            "#######", //
            "##...##", //
            "##...##", //
            "##...##", //
            "#######", //
            "#######", //
        ]);
        let found = components(&data, rows, cols, 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pixels.len(), 40);
        assert_eq!(found[0].contour.len(), 24);
        assert!(found[0].contour.iter().all(|p| p.x == 0 || p.x == 6 || p.y == 0 || p.y == 6));
    }

    #[test]
    fn test_component_inside_hole_is_separate() {
        let (data, rows, cols) = binary_from_rows(&[
            ".......", //
            ".#####.", //
            ".#...#.", //
            ".#.#.#.", //
            ".#...#.", //
            ".#####.", //
            ".......", //
        ]);
        let found = components(&data, rows, cols, 0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].start(), (3, 3));
        assert_eq!(found[1].contour, vec![Point::new(3, 3)]);
    }
}

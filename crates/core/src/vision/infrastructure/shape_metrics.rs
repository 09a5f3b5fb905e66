//! Moment and shape measures of a labelled component.

use std::f64::consts::PI;

/// Raw and central image moments of a pixel set, up to second order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub mu20: f64,
    pub mu02: f64,
    pub mu11: f64,
}

impl Moments {
    pub fn from_pixels(pixels: &[(usize, usize)]) -> Self {
        let m00 = pixels.len() as f64;
        let (mut m10, mut m01) = (0.0, 0.0);
        for &(row, col) in pixels {
            m10 += col as f64;
            m01 += row as f64;
        }
        let (cx, cy) = if m00 > 0.0 {
            (m10 / m00, m01 / m00)
        } else {
            (0.0, 0.0)
        };

        let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
        for &(row, col) in pixels {
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            mu20 += dx * dx;
            mu02 += dy * dy;
            mu11 += dx * dy;
        }

        Self {
            m00,
            m10,
            m01,
            mu20,
            mu02,
            mu11,
        }
    }

    pub fn centroid(&self) -> (f64, f64) {
        if self.m00 == 0.0 {
            return (0.0, 0.0);
        }
        (self.m10 / self.m00, self.m01 / self.m00)
    }

    /// Ratio of the minor to the major principal second moment.
    ///
    /// 1.0 for rotationally symmetric shapes, approaching 0 for lines.
    pub fn inertia_ratio(&self) -> f64 {
        let denominator = (2.0 * self.mu11).hypot(self.mu20 - self.mu02);
        if denominator <= 1e-2 {
            return 1.0;
        }
        let half_trace = 0.5 * (self.mu20 + self.mu02);
        let i_min = half_trace - 0.5 * denominator;
        let i_max = half_trace + 0.5 * denominator;
        if i_max <= 0.0 {
            return 1.0;
        }
        i_min / i_max
    }
}

/// `4π·area / perimeter²`; `None` when the perimeter is zero.
pub(crate) fn circularity(area: f64, perimeter: f64) -> Option<f64> {
    if perimeter <= 0.0 {
        return None;
    }
    Some(4.0 * PI * area / (perimeter * perimeter))
}

/// Median of `values`, averaging the two middle elements for even lengths.
pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    (values[(n - 1) / 2] + values[n / 2]) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_pixels(side: usize) -> Vec<(usize, usize)> {
        (0..side)
            .flat_map(|r| (0..side).map(move |c| (r, c)))
            .collect()
    }

    #[test]
    fn test_moments_of_square() {
        let m = Moments::from_pixels(&square_pixels(3));
        assert_relative_eq!(m.m00, 9.0);
        let (cx, cy) = m.centroid();
        assert_relative_eq!(cx, 1.0);
        assert_relative_eq!(cy, 1.0);
        assert_relative_eq!(m.mu11, 0.0);
        assert_relative_eq!(m.inertia_ratio(), 1.0);
    }

    #[test]
    fn test_inertia_ratio_of_line_is_zero() {
        let line: Vec<_> = (0..20).map(|c| (4, c)).collect();
        let m = Moments::from_pixels(&line);
        assert_relative_eq!(m.inertia_ratio(), 0.0);
    }

    #[test]
    fn test_inertia_ratio_of_rectangle() {
        // 2x8 block: variances differ by the squared side ratio (approx.)
        let block: Vec<_> = (0..2)
            .flat_map(|r| (0..8).map(move |c| (r, c)))
            .collect();
        let ratio = Moments::from_pixels(&block).inertia_ratio();
        // var(0..2) = 0.25, var(0..8) = 5.25
        assert_relative_eq!(ratio, 0.25 / 5.25, epsilon = 1e-9);
    }

    #[test]
    fn test_inertia_ratio_is_rotation_invariant_for_diagonal_line() {
        let line: Vec<_> = (0..10).map(|i| (i, i)).collect();
        assert_relative_eq!(Moments::from_pixels(&line).inertia_ratio(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_pixels() {
        let m = Moments::from_pixels(&[]);
        assert_eq!(m.centroid(), (0.0, 0.0));
        assert_relative_eq!(m.inertia_ratio(), 1.0);
    }

    #[test]
    fn test_circularity_of_circle_is_one() {
        let r: f64 = 10.0;
        let c = circularity(PI * r * r, 2.0 * PI * r).unwrap();
        assert_relative_eq!(c, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_circularity_zero_perimeter() {
        assert!(circularity(1.0, 0.0).is_none());
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_relative_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_relative_eq!(median(&mut []), 0.0);
    }
}

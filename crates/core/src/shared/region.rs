use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::frame::FrameError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("invalid region: rows {row_min}..{row_max}, cols {col_min}..{col_max}")]
    Inverted {
        row_min: usize,
        row_max: usize,
        col_min: usize,
        col_max: usize,
    },
}

/// Axis-aligned region of interest, half-open on both axes.
///
/// Rows are `y` and columns are `x`: the region covers
/// `row_min <= r < row_max` and `col_min <= c < col_max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl Region {
    pub fn new(
        row_min: usize,
        row_max: usize,
        col_min: usize,
        col_max: usize,
    ) -> Result<Self, RegionError> {
        let region = Self {
            row_min,
            row_max,
            col_min,
            col_max,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), RegionError> {
        if self.row_min > self.row_max || self.col_min > self.col_max {
            return Err(RegionError::Inverted {
                row_min: self.row_min,
                row_max: self.row_max,
                col_min: self.col_min,
                col_max: self.col_max,
            });
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.row_max.saturating_sub(self.row_min)
    }

    pub fn cols(&self) -> usize {
        self.col_max.saturating_sub(self.col_min)
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_min..self.row_max).contains(&row) && (self.col_min..self.col_max).contains(&col)
    }

    /// Fails with `OutOfBounds` when the region does not fit a `rows x cols` frame.
    ///
    /// The reported coordinate is the last row/column the region needs.
    pub fn check_within(&self, rows: usize, cols: usize) -> Result<(), FrameError> {
        if self.is_empty() || (self.row_max <= rows && self.col_max <= cols) {
            return Ok(());
        }
        Err(FrameError::OutOfBounds {
            row: self.row_max - 1,
            col: self.col_max - 1,
            rows,
            cols,
        })
    }

    /// True when `(row, col)` lies inside at least one region.
    pub fn union_contains(regions: &[Region], row: usize, col: usize) -> bool {
        regions.iter().any(|r| r.contains(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_rejects_inverted_rows() {
        assert!(matches!(
            Region::new(10, 5, 0, 10),
            Err(RegionError::Inverted { .. })
        ));
    }

    #[test]
    fn test_new_rejects_inverted_cols() {
        assert!(Region::new(0, 10, 8, 2).is_err());
    }

    #[test]
    fn test_dimensions() {
        let r = Region::new(30, 265, 10, 530).unwrap();
        assert_eq!(r.rows(), 235);
        assert_eq!(r.cols(), 520);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_zero_size_is_empty() {
        let r = Region::new(5, 5, 0, 10).unwrap();
        assert!(r.is_empty());
        assert!(!r.contains(5, 3));
    }

    #[rstest]
    #[case::top_left_corner(30, 10, true)]
    #[case::last_row(264, 100, true)]
    #[case::last_col(100, 529, true)]
    #[case::row_max_excluded(265, 100, false)]
    #[case::col_max_excluded(100, 530, false)]
    #[case::above(29, 100, false)]
    #[case::left(100, 9, false)]
    fn test_contains_is_half_open(#[case] row: usize, #[case] col: usize, #[case] inside: bool) {
        let r = Region::new(30, 265, 10, 530).unwrap();
        assert_eq!(r.contains(row, col), inside);
    }

    #[test]
    fn test_check_within_fitting_frame() {
        let r = Region::new(310, 450, 10, 530).unwrap();
        assert!(r.check_within(480, 640).is_ok());
        assert!(r.check_within(450, 530).is_ok());
    }

    #[test]
    fn test_check_within_undersized_frame() {
        let r = Region::new(310, 450, 10, 530).unwrap();
        assert_eq!(
            r.check_within(240, 320),
            Err(FrameError::OutOfBounds {
                row: 449,
                col: 529,
                rows: 240,
                cols: 320
            })
        );
    }

    #[test]
    fn test_union_contains() {
        let regions = [
            Region::new(0, 10, 0, 10).unwrap(),
            Region::new(20, 30, 0, 10).unwrap(),
        ];
        assert!(Region::union_contains(&regions, 5, 5));
        assert!(Region::union_contains(&regions, 25, 5));
        assert!(!Region::union_contains(&regions, 15, 5));
        assert!(!Region::union_contains(&[], 0, 0));
    }

    #[test]
    fn test_serde_round_trip_field_names() {
        let r = Region::new(1, 2, 3, 4).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"row_min":1,"row_max":2,"col_min":3,"col_max":4}"#);
    }
}

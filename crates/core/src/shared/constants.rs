use crate::shared::region::Region;

pub const NODE_NAME: &str = "PointsDetector";
pub const INPUT_TOPIC: &str = "/usb_cam/image_raw";
pub const OUTPUT_TOPIC: &str = "image_points";

/// Output topic depth; the oldest queued mask is dropped beyond this.
pub const OUTPUT_QUEUE_SIZE: usize = 10;

/// Intensities strictly below the cutoff become foreground (`MAX_VALUE`).
pub const THRESHOLD_CUTOFF: u8 = 230;
pub const THRESHOLD_MAX_VALUE: u8 = 255;

/// Value written outside the regions of interest.
pub const BACKGROUND: u8 = 255;

/// Regions of interest for a 640x480 camera, in (row, col) order.
pub const DEFAULT_REGIONS: [Region; 2] = [
    Region {
        row_min: 30,
        row_max: 265,
        col_min: 10,
        col_max: 530,
    },
    Region {
        row_min: 310,
        row_max: 450,
        col_min: 10,
        col_max: 530,
    },
];

pub const PREVIEW_WINDOW: &str = "PointsDetector";
pub const ORIGINAL_WINDOW: &str = "original_image";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub mod detect_points_use_case;
pub mod pipeline_logger;
pub mod points_detector_node;

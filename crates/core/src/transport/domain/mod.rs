pub mod frame_publisher;
pub mod frame_source;
pub mod image_bridge;
pub mod preview_sink;

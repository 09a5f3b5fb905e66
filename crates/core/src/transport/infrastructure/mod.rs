pub mod image_file_preview_sink;
pub mod image_file_publisher;
pub mod image_file_source;
pub mod topic;

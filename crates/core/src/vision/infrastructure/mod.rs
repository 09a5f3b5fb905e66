mod component_labeling;
pub mod overlay_annotator;
mod shape_metrics;
pub mod simple_blob_detector;

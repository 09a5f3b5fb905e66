pub mod blob;
pub mod blob_detector;
pub mod frame_annotator;
pub mod region_masker;
pub mod thresholder;

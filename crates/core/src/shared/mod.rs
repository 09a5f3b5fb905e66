pub mod constants;
pub mod frame;
pub mod image_message;
pub mod region;
pub mod settings;

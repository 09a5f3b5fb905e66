pub mod pipeline;
pub mod shared;
pub mod transport;
pub mod vision;

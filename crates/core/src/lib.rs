pub mod detection;
pub mod identity;
pub mod pipeline;
pub mod recognition;
pub mod shared;
pub mod video;

pub mod bitmap;
pub mod image_source;

pub use bitmap::*;
pub use image_source::*;

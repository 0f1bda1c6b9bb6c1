//! Page geometry: aspect-correct fitting, centring and zoom targets.

pub mod fit;
pub mod geometry;

pub use fit::*;
pub use geometry::*;

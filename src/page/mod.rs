//! A single gallery page: load lifecycle, zoom and layout.

pub mod controller;
pub mod indicator;
pub mod listener;
pub mod state;

pub use controller::{PageController, PageControllerBuilder, ZoomTarget};
pub use indicator::{IndicatorFactory, LoadingIndicator, OpacityIndicator};
pub use listener::{PageListener, PageStatus};
pub use state::{LoadPhase, LoadState};

//! Single page of a swipeable image gallery.
//!
//! An [`ImageSource`] describes where a page's image comes from and resolves
//! it onto a display surface, possibly through a cancellable
//! [`RemoteLoader`]. A [`PageController`] owns one source, keeps at most one
//! load in flight, fits the result into the viewport and reports zoom, tap
//! and load events to a [`PageListener`].

pub mod config;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod loader;
pub mod models;
pub mod page;
pub mod surface;

pub use config::LightboxConfig;
pub use error::{LightboxError, Result};
pub use layout::{Point, Rect, Size};
pub use loader::{CancelHandle, LoadCallback, NoRemoteLoader, RemoteLoader, ThreadedLoader};
pub use models::{Bitmap, ImageSource, ImageVariant, SourceKind};
pub use page::{LoadPhase, PageController, PageListener, PageStatus, ZoomTarget};
pub use surface::{DisplaySurface, SurfaceHandle};

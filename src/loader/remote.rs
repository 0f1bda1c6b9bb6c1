use tracing::warn;
use url::Url;

use super::cancel::CancelHandle;
use crate::models::Bitmap;
use crate::surface::SurfaceHandle;

/// Completion for a single load. Receives `None` when no bitmap could be
/// produced.
pub type LoadCallback = Box<dyn FnOnce(Option<Bitmap>)>;

/// Fetches images for URL-backed sources.
///
/// Implementations assign the bitmap to `target` and call `on_complete` at
/// most once. After the returned handle is cancelled they should not call
/// `on_complete`; the page still discards late completions when they do.
/// Retry and caching policy belong to the implementation.
pub trait RemoteLoader {
    fn load(&self, target: &SurfaceHandle, url: &Url, on_complete: LoadCallback) -> CancelHandle;
}

/// Loader for hosts without remote image support: every load completes
/// immediately with no bitmap.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemoteLoader;

impl RemoteLoader for NoRemoteLoader {
    fn load(&self, target: &SurfaceHandle, url: &Url, on_complete: LoadCallback) -> CancelHandle {
        warn!(%url, "No remote loader configured");
        target.borrow_mut().set_image(None);
        on_complete(None);
        CancelHandle::noop()
    }
}

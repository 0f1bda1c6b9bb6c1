use url::Url;

use super::state::LoadPhase;
use crate::layout::Rect;
use crate::models::Bitmap;
use crate::surface::SurfaceHandle;

/// Snapshot of a page handed to listener callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStatus {
    pub page_id: u64,
    pub phase: LoadPhase,
    pub zoom_scale: f64,
    pub has_zoomed: bool,
    /// `None` until the host has provided a viewport.
    pub display_frame: Option<Rect>,
}

/// Gallery-side observer of a page. All methods default to doing nothing.
///
/// Callbacks run on the control thread after the page has released its own
/// state, so a listener may call back into the page.
pub trait PageListener {
    fn on_zoom_changed(&self, _page: &PageStatus) {}

    /// A load finished, with or without a bitmap.
    fn on_remote_image_loaded(&self, _bitmap: Option<&Bitmap>, _surface: &SurfaceHandle) {}

    fn on_video_button_tapped(&self, _video: &Url) {}

    fn on_page_tapped(&self, _page: &PageStatus) {}
}

// Gallery page controller
// - Owns one ImageSource and keeps at most one load in flight
// - Load generations discard completions from replaced, cancelled or torn-down loads
// - Fits the loaded bitmap into the viewport and re-centres on every zoom change

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, trace, warn};
use url::Url;

use super::indicator::{IndicatorFactory, LoadingIndicator, OpacityIndicator};
use super::listener::{PageListener, PageStatus};
use super::state::{LoadPhase, LoadState};
use crate::config::{LightboxConfig, PLAY_BUTTON_SIZE};
use crate::error::{LightboxError, Result};
use crate::layout::{self, Point, Rect, Size};
use crate::loader::{LoadCallback, RemoteLoader};
use crate::models::{Bitmap, ImageSource, SourceKind};
use crate::surface::{DisplaySurface, SurfaceHandle};

static NEXT_PAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Result of a double tap: the scale the page moved to and the content rect
/// the host should bring into view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    pub scale: f64,
    pub rect: Rect,
}

struct PageInner {
    id: u64,
    source: ImageSource,
    load_state: LoadState,
    /// Bumped for every load and on teardown; completions carry the value
    /// they were issued with.
    generation: u64,
    config: LightboxConfig,
    zoom_scale: f64,
    viewport: Option<Size>,
    display_frame: Rect,
    /// Bitmap accepted by the last applied completion.
    shown: Option<Bitmap>,
    play_button_visible: bool,
    indicator: Box<dyn LoadingIndicator>,
    listener: Option<Weak<dyn PageListener>>,
    surface: SurfaceHandle,
    torn_down: bool,
}

impl PageInner {
    fn listener(&self) -> Option<Rc<dyn PageListener>> {
        self.listener.as_ref().and_then(Weak::upgrade)
    }

    fn status(&self) -> PageStatus {
        PageStatus {
            page_id: self.id,
            phase: self.load_state.phase(),
            zoom_scale: self.zoom_scale,
            has_zoomed: self.zoom_scale != 1.0,
            display_frame: self.viewport.map(|_| self.display_frame),
        }
    }

    /// Re-fit the surface image to the viewport at the current zoom.
    fn relayout(&mut self) {
        let Some(viewport) = self.viewport else {
            return;
        };

        let natural = self.surface.borrow().image().map(Bitmap::size);
        let fitted = match natural {
            Some(size) => layout::fit_to_container(size, viewport),
            None => viewport,
        };

        self.display_frame = layout::display_frame(fitted, viewport, self.zoom_scale);
        self.surface.borrow_mut().set_frame(self.display_frame);
    }

    /// Apply a completion if it belongs to the current load. Returns false
    /// for stale completions, which are dropped.
    fn finish_load(&mut self, generation: u64, bitmap: Option<Bitmap>) -> bool {
        if self.torn_down || !self.load_state.is_loading_generation(generation) {
            trace!(
                page = self.id,
                generation,
                current = self.generation,
                "Discarding stale load completion"
            );
            if !self.torn_down {
                // A loader that ignored cancellation may already have drawn into the surface.
                self.surface.borrow_mut().set_image(self.shown.clone());
            }
            return false;
        }

        if bitmap.is_none() && self.source.kind() == SourceKind::Remote {
            warn!(page = self.id, generation, "Remote image produced no bitmap");
            self.load_state = LoadState::Failed;
        } else {
            debug!(
                page = self.id,
                generation,
                size = ?bitmap.as_ref().map(|b| (b.width(), b.height())),
                "Page image loaded"
            );
            self.load_state = LoadState::Loaded;
        }

        self.shown = bitmap.clone();
        self.surface.borrow_mut().set_image(bitmap);
        self.relayout();
        self.indicator.set_opacity(0.0, self.config.indicator_fade);
        true
    }
}

fn completion(page: Weak<RefCell<PageInner>>, generation: u64) -> LoadCallback {
    Box::new(move |bitmap| {
        let Some(page) = page.upgrade() else {
            trace!(generation, "Page dropped before its load completed");
            return;
        };

        let (listener, surface) = {
            let mut inner = page.borrow_mut();
            if !inner.finish_load(generation, bitmap.clone()) {
                return;
            }
            (inner.listener(), inner.surface.clone())
        };

        if let Some(listener) = listener {
            listener.on_remote_image_loaded(bitmap.as_ref(), &surface);
        }
    })
}

/// One page of the gallery.
///
/// All methods run on the control thread. Listener callbacks are made after
/// the page's own state is released, so listeners may call back in.
pub struct PageController {
    inner: Rc<RefCell<PageInner>>,
    surface: SurfaceHandle,
    loader: Rc<dyn RemoteLoader>,
}

impl PageController {
    /// Create a page with default configuration and start loading `source`.
    pub fn new(source: ImageSource, loader: Rc<dyn RemoteLoader>) -> Self {
        Self::builder(source, loader).build()
    }

    pub fn builder(source: ImageSource, loader: Rc<dyn RemoteLoader>) -> PageControllerBuilder {
        PageControllerBuilder::new(source, loader)
    }

    /// Replace the page's image. Cancels the current load first, so at most
    /// one load is ever in flight.
    pub fn update(&self, source: ImageSource) {
        self.cancel_in_flight();
        {
            let mut page = self.inner.borrow_mut();
            if page.torn_down {
                warn!(page = page.id, "Ignoring update on torn-down page");
                return;
            }
            page.play_button_visible = source.video().is_some();
            page.source = source;
        }
        self.begin_load();
    }

    fn begin_load(&self) {
        self.cancel_in_flight();

        let (source, generation) = {
            let mut page = self.inner.borrow_mut();
            if page.torn_down {
                return;
            }
            page.generation = page.generation.wrapping_add(1);
            let generation = page.generation;
            page.load_state = LoadState::Loading {
                generation,
                cancel: None,
            };
            page.indicator.set_opacity(1.0, Duration::ZERO);
            debug!(page = page.id, generation, kind = ?page.source.kind(), "Loading page image");
            (page.source.clone(), generation)
        };

        // In-memory sources complete inside resolve, so no borrow may be held here.
        let on_complete = completion(Rc::downgrade(&self.inner), generation);
        let handle = source.resolve(&self.surface, self.loader.as_ref(), on_complete);

        if let Some(handle) = handle {
            let mut page = self.inner.borrow_mut();
            if let LoadState::Loading {
                generation: current,
                cancel,
            } = &mut page.load_state
            {
                if *current == generation {
                    *cancel = Some(handle);
                }
            }
        }
    }

    fn cancel_in_flight(&self) {
        let cancel = {
            let mut page = self.inner.borrow_mut();
            if page.load_state.phase() == LoadPhase::Loading {
                trace!(page = page.id, generation = page.generation, "Cancelling in-flight load");
            }
            page.load_state.take_cancel()
        };
        if let Some(handle) = cancel {
            handle.cancel();
        }
    }

    /// Cancel any in-flight load and stop reacting to events. Safe to call
    /// more than once; also runs on drop.
    pub fn teardown(&self) {
        let cancel = {
            let Ok(mut page) = self.inner.try_borrow_mut() else {
                return;
            };
            if page.torn_down {
                return;
            }
            page.torn_down = true;
            page.generation = page.generation.wrapping_add(1);
            debug!(page = page.id, "Tearing down page");
            page.load_state.take_cancel()
        };
        if let Some(handle) = cancel {
            handle.cancel();
        }
    }

    /// Host viewport changed: store it, reset zoom to the minimum and re-fit.
    pub fn configure_layout(&self, viewport: Size) {
        let mut page = self.inner.borrow_mut();
        if page.torn_down {
            trace!(page = page.id, "Ignoring layout on torn-down page");
            return;
        }
        page.viewport = Some(viewport);
        page.zoom_scale = page.config.min_scale;
        page.relayout();
    }

    /// Pinch or programmatic zoom. The scale is clamped to the configured
    /// bounds, the image re-centred and the listener told.
    pub fn zoom_changed(&self, scale: f64) {
        if !scale.is_finite() {
            warn!(scale, "Ignoring non-finite zoom scale");
            return;
        }

        let (status, listener) = {
            let mut page = self.inner.borrow_mut();
            if page.torn_down {
                return;
            }
            page.zoom_scale = scale.clamp(page.config.min_scale, page.config.max_scale);
            page.relayout();
            (page.status(), page.listener())
        };

        if let Some(listener) = listener {
            listener.on_zoom_changed(&status);
        }
    }

    /// Toggle between minimum and maximum zoom around `tap`.
    pub fn double_tap(&self, tap: Point) -> Result<ZoomTarget> {
        let target = {
            let page = self.inner.borrow();
            if page.torn_down {
                return Err(LightboxError::TornDown);
            }
            let viewport = page.viewport.ok_or(LightboxError::NoViewport)?;
            let scale = layout::next_double_tap_scale(
                page.zoom_scale,
                page.config.min_scale,
                page.config.max_scale,
            );
            ZoomTarget {
                scale,
                rect: layout::zoom_rect_for_double_tap(tap, viewport, scale),
            }
        };

        self.zoom_changed(target.scale);
        Ok(target)
    }

    pub fn single_tap(&self) {
        let (status, listener) = {
            let page = self.inner.borrow();
            (page.status(), page.listener())
        };
        if let Some(listener) = listener {
            listener.on_page_tapped(&status);
        }
    }

    pub fn play_button_tapped(&self) {
        let (video, listener) = {
            let page = self.inner.borrow();
            (page.source.video().cloned(), page.listener())
        };
        if let (Some(video), Some(listener)) = (video, listener) {
            listener.on_video_button_tapped(&video);
        }
    }

    /// Observe this page. Held weakly; dropping the listener detaches it.
    pub fn set_listener<L>(&self, listener: &Rc<L>)
    where
        L: PageListener + 'static,
    {
        let listener: Rc<dyn PageListener> = listener.clone();
        self.inner.borrow_mut().listener = Some(Rc::downgrade(&listener));
    }

    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    pub fn status(&self) -> PageStatus {
        self.inner.borrow().status()
    }

    pub fn phase(&self) -> LoadPhase {
        self.inner.borrow().load_state.phase()
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == LoadPhase::Loading
    }

    pub fn zoom_scale(&self) -> f64 {
        self.inner.borrow().zoom_scale
    }

    pub fn has_zoomed(&self) -> bool {
        self.zoom_scale() != 1.0
    }

    pub fn content_frame(&self) -> Option<Rect> {
        self.inner.borrow().viewport.map(Rect::from_size)
    }

    /// Where the image sits in the viewport. Fails until a viewport exists.
    pub fn display_frame(&self) -> Result<Rect> {
        let page = self.inner.borrow();
        page.viewport
            .map(|_| page.display_frame)
            .ok_or(LightboxError::NoViewport)
    }

    /// Centre of the image, where the loading indicator and play button sit.
    pub fn overlay_center(&self) -> Result<Point> {
        self.display_frame().map(|frame| frame.center())
    }

    /// Frame of the play button, or `None` when the source has no video.
    pub fn play_button_frame(&self) -> Result<Option<Rect>> {
        if !self.is_play_button_visible() {
            return Ok(None);
        }
        let center = self.overlay_center()?;
        Ok(Some(Rect::centered_at(
            center,
            Size::new(PLAY_BUTTON_SIZE, PLAY_BUTTON_SIZE),
        )))
    }

    pub fn is_play_button_visible(&self) -> bool {
        self.inner.borrow().play_button_visible
    }

    pub fn indicator_opacity(&self) -> f32 {
        self.inner.borrow().indicator.opacity()
    }

    pub fn caption(&self) -> String {
        self.inner.borrow().source.caption().to_string()
    }

    pub fn video(&self) -> Option<Url> {
        self.inner.borrow().source.video().cloned()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.inner.borrow().source.kind()
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    pub fn current_image(&self) -> Option<Bitmap> {
        self.surface.borrow().image().cloned()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.borrow().torn_down
    }
}

impl Drop for PageController {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub struct PageControllerBuilder {
    source: ImageSource,
    loader: Rc<dyn RemoteLoader>,
    config: LightboxConfig,
    indicator: IndicatorFactory,
    listener: Option<Weak<dyn PageListener>>,
    viewport: Option<Size>,
}

impl PageControllerBuilder {
    pub fn new(source: ImageSource, loader: Rc<dyn RemoteLoader>) -> Self {
        Self {
            source,
            loader,
            config: LightboxConfig::default(),
            indicator: OpacityIndicator::factory(),
            listener: None,
            viewport: None,
        }
    }

    pub fn config(mut self, config: LightboxConfig) -> Self {
        self.config = config.normalized();
        self
    }

    pub fn indicator(mut self, factory: IndicatorFactory) -> Self {
        self.indicator = factory;
        self
    }

    /// Attach a listener before the first load starts, so synchronous
    /// sources are reported too.
    pub fn listener<L>(mut self, listener: &Rc<L>) -> Self
    where
        L: PageListener + 'static,
    {
        let listener: Rc<dyn PageListener> = listener.clone();
        self.listener = Some(Rc::downgrade(&listener));
        self
    }

    pub fn viewport(mut self, viewport: Size) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Build the page and start loading its source.
    pub fn build(self) -> PageController {
        let surface = DisplaySurface::new_handle();
        let id = NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed);

        let inner = PageInner {
            id,
            play_button_visible: self.source.video().is_some(),
            source: self.source,
            load_state: LoadState::Idle,
            generation: 0,
            zoom_scale: self.config.min_scale,
            config: self.config,
            viewport: self.viewport,
            display_frame: Rect::ZERO,
            shown: None,
            indicator: (self.indicator)(),
            listener: self.listener,
            surface: surface.clone(),
            torn_down: false,
        };

        let controller = PageController {
            inner: Rc::new(RefCell::new(inner)),
            surface,
            loader: self.loader,
        };

        controller.inner.borrow_mut().relayout();
        controller.begin_load();
        controller
    }
}

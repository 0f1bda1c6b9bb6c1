use std::fmt;
use std::rc::Rc;

use url::Url;

use super::Bitmap;
use crate::error::{LightboxError, Result};
use crate::loader::{CancelHandle, LoadCallback, RemoteLoader};
use crate::surface::SurfaceHandle;

/// Produces a bitmap on demand. Called on the control thread and expected to
/// be fast; it cannot be interrupted.
pub type BitmapProducer = Rc<dyn Fn() -> Bitmap>;

/// Where a page's image comes from.
#[derive(Clone)]
pub enum ImageVariant {
    Bitmap(Bitmap),
    Producer(BitmapProducer),
    Remote(Url),
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Bitmap,
    Producer,
    Remote,
    Absent,
}

impl ImageVariant {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Bitmap(_) => SourceKind::Bitmap,
            Self::Producer(_) => SourceKind::Producer,
            Self::Remote(_) => SourceKind::Remote,
            Self::Absent => SourceKind::Absent,
        }
    }
}

impl fmt::Debug for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitmap(b) => f.debug_tuple("Bitmap").field(b).finish(),
            Self::Producer(_) => f.write_str("Producer"),
            Self::Remote(url) => f.debug_tuple("Remote").field(&url.as_str()).finish(),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// One displayable gallery image with its caption and optional video.
///
/// The variant is fixed at construction. Showing a different image means
/// building a new `ImageSource` and handing it to the page.
#[derive(Debug, Clone)]
pub struct ImageSource {
    variant: ImageVariant,
    caption: String,
    video: Option<Url>,
}

impl ImageSource {
    fn with_variant(variant: ImageVariant) -> Self {
        Self {
            variant,
            caption: String::new(),
            video: None,
        }
    }

    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        Self::with_variant(ImageVariant::Bitmap(bitmap))
    }

    pub fn from_producer<F>(producer: F) -> Self
    where
        F: Fn() -> Bitmap + 'static,
    {
        Self::with_variant(ImageVariant::Producer(Rc::new(producer)))
    }

    pub fn from_url(url: Url) -> Self {
        Self::with_variant(ImageVariant::Remote(url))
    }

    pub fn from_url_str(uri: &str) -> Result<Self> {
        Url::parse(uri)
            .map(Self::from_url)
            .map_err(|source| LightboxError::InvalidUri {
                uri: uri.to_string(),
                source,
            })
    }

    /// Placeholder with no image.
    pub fn absent() -> Self {
        Self::with_variant(ImageVariant::Absent)
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_video(mut self, video: Url) -> Self {
        self.video = Some(video);
        self
    }

    pub fn variant(&self) -> &ImageVariant {
        &self.variant
    }

    pub fn kind(&self) -> SourceKind {
        self.variant.kind()
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn video(&self) -> Option<&Url> {
        self.video.as_ref()
    }

    /// Put this image on `target` and report it through `on_complete`.
    ///
    /// In-memory variants finish before returning and yield no handle. Remote
    /// sources are handed to `loader` and its cancel handle is passed back.
    pub fn resolve(
        &self,
        target: &SurfaceHandle,
        loader: &dyn RemoteLoader,
        on_complete: LoadCallback,
    ) -> Option<CancelHandle> {
        match &self.variant {
            ImageVariant::Bitmap(bitmap) => {
                target.borrow_mut().set_image(Some(bitmap.clone()));
                on_complete(Some(bitmap.clone()));
                None
            }
            ImageVariant::Producer(produce) => {
                let bitmap = produce();
                target.borrow_mut().set_image(Some(bitmap.clone()));
                on_complete(Some(bitmap));
                None
            }
            ImageVariant::Remote(url) => Some(loader.load(target, url, on_complete)),
            ImageVariant::Absent => {
                target.borrow_mut().set_image(None);
                on_complete(None);
                None
            }
        }
    }
}

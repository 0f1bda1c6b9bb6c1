use std::cell::RefCell;
use std::rc::Rc;

use crate::layout::Rect;
use crate::models::Bitmap;

/// Shared handle to the on-screen image element.
///
/// The controller and the loaders both write to it on the control thread.
pub type SurfaceHandle = Rc<RefCell<DisplaySurface>>;

/// The image element a page renders into: the current bitmap and where it
/// sits inside the viewport.
#[derive(Debug, Default)]
pub struct DisplaySurface {
    image: Option<Bitmap>,
    frame: Rect,
}

impl DisplaySurface {
    pub fn new_handle() -> SurfaceHandle {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn image(&self) -> Option<&Bitmap> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: Option<Bitmap>) {
        self.image = image;
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }
}

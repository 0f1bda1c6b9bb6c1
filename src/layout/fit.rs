use super::geometry::{Point, Rect, Size};

/// Scales `bitmap` to fit inside `viewport` without cropping or distortion.
///
/// A bitmap that is relatively wider than the viewport is fitted to the
/// viewport width; anything else is fitted to the viewport height. Degenerate
/// inputs leave the image element at the viewport size.
pub fn fit_to_container(bitmap: Size, viewport: Size) -> Size {
    if bitmap.is_empty() || viewport.is_empty() {
        return viewport;
    }

    if bitmap.aspect_ratio() > viewport.aspect_ratio() {
        Size::new(
            viewport.width,
            viewport.width / bitmap.width * bitmap.height,
        )
    } else {
        Size::new(
            viewport.height / bitmap.height * bitmap.width,
            viewport.height,
        )
    }
}

/// Origin that centres `display` on every axis where it is smaller than the
/// viewport. Axes where the content fills or overflows the viewport pin to 0.
pub fn center(display: Size, viewport: Size) -> Point {
    let x = if display.width < viewport.width {
        (viewport.width - display.width) / 2.0
    } else {
        0.0
    };
    let y = if display.height < viewport.height {
        (viewport.height - display.height) / 2.0
    } else {
        0.0
    };
    Point::new(x, y)
}

/// Display frame for a fitted image at `zoom_scale`.
pub fn display_frame(fitted: Size, viewport: Size, zoom_scale: f64) -> Rect {
    let size = fitted.scaled(zoom_scale);
    Rect {
        origin: center(size, viewport),
        size,
    }
}

/// Scale a double tap switches to: back to `min` when zoomed in, else `max`.
pub fn next_double_tap_scale(current: f64, min: f64, max: f64) -> f64 {
    if current > min {
        min
    } else {
        max
    }
}

/// Rect, in un-scaled content coordinates, that keeps `tap` under the finger
/// once zoomed to `new_scale`.
pub fn zoom_rect_for_double_tap(tap: Point, viewport: Size, new_scale: f64) -> Rect {
    let width = viewport.width / new_scale;
    let height = viewport.height / new_scale;
    Rect::new(tap.x - width / 2.0, tap.y - height / 2.0, width, height)
}

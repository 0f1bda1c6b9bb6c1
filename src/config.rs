//! Page configuration.
//!
//! Defaults are compile-time constants; each can be overridden through a
//! `LIGHTBOX_*` environment variable. Values that fail to parse or fall out of
//! range are ignored so a bad variable never disables the gallery.

use std::time::Duration;

use tracing::warn;

/// Zoom scale a page rests at after layout.
pub const DEFAULT_MIN_SCALE: f64 = 1.0;
/// Zoom scale reached by double-tapping a page at rest.
pub const DEFAULT_MAX_SCALE: f64 = 3.0;
/// Fade applied to the loading indicator once an image lands.
pub const DEFAULT_INDICATOR_FADE_MS: u64 = 400;
/// Default number of decode threads for the threaded loader.
pub const DEFAULT_LOADER_WORKERS: usize = 2;
/// Maximum number of decode threads.
pub const MAX_LOADER_WORKERS: usize = 4;
/// Side length of the square play button overlay.
pub const PLAY_BUTTON_SIZE: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LightboxConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub indicator_fade: Duration,
    pub loader_workers: usize,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            indicator_fade: Duration::from_millis(DEFAULT_INDICATOR_FADE_MS),
            loader_workers: DEFAULT_LOADER_WORKERS,
        }
    }
}

impl LightboxConfig {
    /// Defaults with `LIGHTBOX_MIN_ZOOM`, `LIGHTBOX_MAX_ZOOM`,
    /// `LIGHTBOX_FADE_MS` and `LIGHTBOX_WORKERS` applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through
    /// `lookup`, which keeps tests away from the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var::<f64, _>(&lookup, "LIGHTBOX_MIN_ZOOM") {
            config.min_scale = v;
        }
        if let Some(v) = parse_var::<f64, _>(&lookup, "LIGHTBOX_MAX_ZOOM") {
            config.max_scale = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "LIGHTBOX_FADE_MS") {
            config.indicator_fade = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "LIGHTBOX_WORKERS") {
            config.loader_workers = n;
        }

        config.normalized()
    }

    pub fn with_zoom_bounds(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self.normalized()
    }

    pub fn with_indicator_fade(mut self, fade: Duration) -> Self {
        self.indicator_fade = fade;
        self
    }

    /// Enforces `0 < min_scale <= max_scale` and a sane worker count.
    pub fn normalized(mut self) -> Self {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            warn!(min_scale = self.min_scale, "Invalid minimum zoom, using default");
            self.min_scale = DEFAULT_MIN_SCALE;
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            warn!(max_scale = self.max_scale, "Invalid maximum zoom, using default");
            self.max_scale = DEFAULT_MAX_SCALE;
        }
        if self.max_scale < self.min_scale {
            self.max_scale = self.min_scale;
        }
        self.loader_workers = self.loader_workers.clamp(1, MAX_LOADER_WORKERS);
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable config override");
            None
        }
    }
}

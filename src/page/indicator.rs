use std::time::Duration;

/// The loading indicator shown over a page. Pages only ever change its
/// opacity.
pub trait LoadingIndicator {
    /// Move to `opacity`, animating over `fade` (zero means immediately).
    fn set_opacity(&mut self, opacity: f32, fade: Duration);

    fn opacity(&self) -> f32;
}

pub type IndicatorFactory = Box<dyn Fn() -> Box<dyn LoadingIndicator>>;

/// Headless indicator that remembers the last requested opacity.
#[derive(Debug, Clone, Default)]
pub struct OpacityIndicator {
    opacity: f32,
    last_fade: Duration,
}

impl OpacityIndicator {
    pub fn factory() -> IndicatorFactory {
        Box::new(|| Box::new(OpacityIndicator::default()))
    }

    pub fn last_fade(&self) -> Duration {
        self.last_fade
    }
}

impl LoadingIndicator for OpacityIndicator {
    fn set_opacity(&mut self, opacity: f32, fade: Duration) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.last_fade = fade;
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }
}

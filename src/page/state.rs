use crate::loader::CancelHandle;

/// Where a page is in its load lifecycle.
#[derive(Debug, Default)]
pub enum LoadState {
    #[default]
    Idle,
    /// `cancel` is `None` for loads that completed synchronously or whose
    /// source needs no cancellation.
    Loading {
        generation: u64,
        cancel: Option<CancelHandle>,
    },
    Loaded,
    /// A remote load finished without a bitmap.
    Failed,
}

/// [`LoadState`] without the cancel handle, for snapshots and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    pub fn phase(&self) -> LoadPhase {
        match self {
            Self::Idle => LoadPhase::Idle,
            Self::Loading { .. } => LoadPhase::Loading,
            Self::Loaded => LoadPhase::Loaded,
            Self::Failed => LoadPhase::Failed,
        }
    }

    pub fn is_loading_generation(&self, generation: u64) -> bool {
        matches!(self, Self::Loading { generation: g, .. } if *g == generation)
    }

    /// Leave `Loading` for `Idle`, handing back the cancel handle if any.
    pub fn take_cancel(&mut self) -> Option<CancelHandle> {
        match std::mem::take(self) {
            Self::Loading { cancel, .. } => cancel,
            other => {
                *self = other;
                None
            }
        }
    }
}

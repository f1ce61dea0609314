pub(crate) mod slot;

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::comment::model::MotionMode;
use crate::foundation::error::{DanmakuError, DanmakuResult};
use crate::layer::slot::SlotAllocator;
use crate::render::item::LiveItem;

/// Fixed drawing layers, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    /// Right-to-left scrolling comments.
    Rolling = 0,
    /// Left-to-right scrolling comments.
    ReverseRolling = 1,
    /// Comments pinned to the top band.
    Top = 2,
    /// Comments pinned to the bottom band.
    Bottom = 3,
    /// Free-form animated comments.
    Advanced = 4,
    /// Subtitles.
    Subtitle = 5,
}

impl LayerId {
    /// Every layer in draw order.
    pub const ALL: [Self; 6] = [
        Self::Rolling,
        Self::ReverseRolling,
        Self::Top,
        Self::Bottom,
        Self::Advanced,
        Self::Subtitle,
    ];

    /// Number of layers.
    pub const COUNT: u32 = 6;

    /// Position in [`LayerId::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Layer a comment of `mode` is scheduled on. Unknown modes map to the rolling layer and
    /// are dropped there.
    pub fn for_mode(mode: MotionMode) -> Self {
        match mode {
            MotionMode::Bottom => Self::Bottom,
            MotionMode::Top => Self::Top,
            MotionMode::ReverseRolling => Self::ReverseRolling,
            MotionMode::Advanced => Self::Advanced,
            MotionMode::Subtitle => Self::Subtitle,
            MotionMode::Rolling | MotionMode::Unknown => Self::Rolling,
        }
    }

    /// Layers whose items must be drawn strictly in insertion order.
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Advanced | Self::Subtitle)
    }

    /// Slot band height for this layer in a viewport of `viewport_height` px.
    pub(crate) fn band_height(self, viewport_height: f64, rolling_fraction: f64) -> f64 {
        let band = match self {
            Self::Rolling | Self::ReverseRolling => viewport_height * rolling_fraction,
            Self::Top => viewport_height * 0.75,
            Self::Bottom => viewport_height / 2.0,
            Self::Advanced | Self::Subtitle => viewport_height,
        };
        band.max(0.0).floor()
    }
}

impl TryFrom<u32> for LayerId {
    type Error = DanmakuError;

    fn try_from(value: u32) -> DanmakuResult<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| DanmakuError::layer(value, Self::COUNT))
    }
}

impl From<LayerId> for u32 {
    fn from(id: LayerId) -> Self {
        id as u32
    }
}

/// Items and slot reservations of one layer, guarded together.
#[derive(Debug)]
pub(crate) struct LayerState {
    pub(crate) items: Vec<LiveItem>,
    pub(crate) slots: SlotAllocator,
}

#[derive(Debug)]
pub(crate) struct Layer {
    id: LayerId,
    enabled: AtomicBool,
    subtitle: AtomicBool,
    state: Mutex<LayerState>,
}

impl Layer {
    fn new(id: LayerId, band: f64) -> Self {
        Self {
            id,
            enabled: AtomicBool::new(true),
            subtitle: AtomicBool::new(id == LayerId::Subtitle),
            state: Mutex::new(LayerState {
                items: Vec::new(),
                slots: SlotAllocator::new(band),
            }),
        }
    }

    pub(crate) fn id(&self) -> LayerId {
        self.id
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Subtitle layers follow the subtitle render state instead of the comment one.
    pub(crate) fn is_subtitle_layer(&self) -> bool {
        self.subtitle.load(Ordering::Acquire)
    }

    pub(crate) fn mark_subtitle_layer(&self) {
        self.subtitle.store(true, Ordering::Release);
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LayerState> {
        self.state.lock()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Remove every item and reservation, handing the items back for resource cleanup.
    pub(crate) fn take_all(&self) -> Vec<LiveItem> {
        let mut state = self.state.lock();
        state.slots.clear();
        std::mem::take(&mut state.items)
    }

    pub(crate) fn resize(&self, band: f64) {
        self.state.lock().slots.resize(band);
    }
}

/// The six layers of an overlay.
#[derive(Debug)]
pub(crate) struct LayerSet {
    layers: [Layer; 6],
}

impl LayerSet {
    pub(crate) fn new(viewport_height: f64, rolling_fraction: f64) -> Self {
        Self {
            layers: LayerId::ALL
                .map(|id| Layer::new(id, id.band_height(viewport_height, rolling_fraction))),
        }
    }

    pub(crate) fn get(&self, id: LayerId) -> &Layer {
        &self.layers[id.index()]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub(crate) fn resize(&self, viewport_height: f64, rolling_fraction: f64) {
        for layer in &self.layers {
            layer.resize(layer.id.band_height(viewport_height, rolling_fraction));
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/layer/layer.rs"]
mod tests;

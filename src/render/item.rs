use std::time::Duration;

use crate::foundation::core::{Point, Rect, Size, Vec2};
use crate::foundation::math::Mat4;
use crate::render::surface::SpriteHandle;

/// A comment that has been measured, placed and baked, and is now animating on a layer.
///
/// Holds copies of everything it needs; it never refers back to the source comment.
#[derive(Clone, Debug)]
pub(crate) struct LiveItem {
    pub(crate) id: u32,
    pub(crate) text: String,
    pub(crate) size: Size,
    pub(crate) pos: Point,
    pub(crate) alpha: u8,
    pub(crate) slot_y: f64,
    pub(crate) holds_slot: bool,
    pub(crate) margin_bottom: f64,
    pub(crate) duration_ms: u64,
    pub(crate) sprite: SpriteHandle,
    /// Animation-clock time of the first update; `None` until then and never drawn before.
    pub(crate) first_tick: Option<Duration>,
    pub(crate) motion: Motion,
}

/// Per-mode animation state.
#[derive(Clone, Debug)]
pub(crate) enum Motion {
    Rolling,
    ReverseRolling,
    Top,
    Bottom,
    Advanced(Box<AdvancedTrack>),
    Subtitle,
}

#[derive(Clone, Debug)]
pub(crate) struct AdvancedTrack {
    pub(crate) start: Point,
    pub(crate) end: Point,
    /// px/ms over the translation window.
    pub(crate) velocity: Vec2,
    pub(crate) translation_delay_ms: f64,
    pub(crate) translation_duration_ms: f64,
    pub(crate) start_alpha: u8,
    pub(crate) end_alpha: u8,
    pub(crate) alpha_delay_ms: f64,
    pub(crate) alpha_duration_ms: f64,
    /// Z rotation in radians, when not negligible.
    pub(crate) rotate_z: Option<f64>,
    /// Pseudo-3D transform and the projected sprite bounds, when rotated about Y.
    pub(crate) transform: Option<(Mat4, Rect)>,
}

impl LiveItem {
    /// Milliseconds since the first update, or `0` before it.
    pub(crate) fn age_ms(&self, now: Duration) -> f64 {
        self.first_tick
            .map_or(0.0, |t| now.saturating_sub(t).as_micros() as f64 / 1000.0)
    }
}

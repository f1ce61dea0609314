use std::time::Duration;

use crate::foundation::core::{Point, Size};
use crate::foundation::math::lerp;
use crate::render::item::{AdvancedTrack, LiveItem, Motion};
use crate::render::layout::SLOT_RELEASE_GAP;

/// Per-frame inputs shared by every item.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    pub(crate) viewport: Size,
    /// Milliseconds since the previous update.
    pub(crate) elapsed_ms: f64,
    /// Animation clock after this update.
    pub(crate) now: Duration,
    pub(crate) paused: bool,
    /// Base rolling speed, px/ms.
    pub(crate) rolling_speed: f64,
}

/// What the layer has to do with an item after it was stepped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) release_slot: bool,
    pub(crate) retire: bool,
}

/// Rolling speed adjusted by sprite width: longer comments move up to 20 % faster.
pub(crate) fn rolling_speed(base: f64, width: f64) -> f64 {
    base * (1.0 + (width * 0.0015).min(0.2))
}

/// Advance one item by one frame.
///
/// `superseded` is set for a subtitle that has a newer subtitle after it in the same layer.
pub(crate) fn step(item: &mut LiveItem, frame: &Frame, superseded: bool) -> Step {
    if item.first_tick.is_none() {
        item.first_tick = Some(frame.now);
    }
    let age = item.age_ms(frame.now);
    let LiveItem {
        size,
        pos,
        alpha,
        holds_slot,
        duration_ms,
        motion,
        ..
    } = item;
    let (vw, w) = (frame.viewport.width, size.width);
    let expired = age > *duration_ms as f64;

    match motion {
        Motion::Rolling => {
            if !frame.paused {
                pos.x -= frame.elapsed_ms * rolling_speed(frame.rolling_speed, w);
            }
            Step {
                release_slot: *holds_slot && pos.x < vw - w - SLOT_RELEASE_GAP,
                retire: pos.x < -w,
            }
        }
        Motion::ReverseRolling => {
            if !frame.paused {
                pos.x += frame.elapsed_ms * rolling_speed(frame.rolling_speed, w);
            }
            Step {
                release_slot: *holds_slot && pos.x > SLOT_RELEASE_GAP,
                retire: pos.x >= vw,
            }
        }
        Motion::Top | Motion::Bottom => {
            pos.x = (vw - w) / 2.0;
            Step {
                release_slot: expired && *holds_slot,
                retire: expired,
            }
        }
        Motion::Advanced(track) => {
            if expired {
                return Step {
                    release_slot: false,
                    retire: true,
                };
            }
            advance_track(track, pos, alpha, age);
            Step::default()
        }
        Motion::Subtitle => {
            if superseded || expired {
                return Step {
                    release_slot: false,
                    retire: true,
                };
            }
            pos.x = (vw - w) / 2.0;
            Step::default()
        }
    }
}

fn advance_track(track: &AdvancedTrack, pos: &mut Point, alpha: &mut u8, age: f64) {
    if age >= track.translation_delay_ms {
        let t = age - track.translation_delay_ms;
        *pos = if t < track.translation_duration_ms {
            track.start + track.velocity * t
        } else {
            track.end
        };
    }

    if age >= track.alpha_delay_ms && track.start_alpha != track.end_alpha {
        let t = age - track.alpha_delay_ms;
        *alpha = if t < track.alpha_duration_ms {
            let from = f64::from(track.start_alpha);
            let to = f64::from(track.end_alpha);
            lerp(from, to, t / track.alpha_duration_ms) as u8
        } else {
            track.end_alpha
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/animate.rs"]
mod tests;

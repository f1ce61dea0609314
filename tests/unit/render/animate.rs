use super::*;

use crate::foundation::core::{Point, Vec2};
use crate::render::surface::SpriteHandle;

fn item(motion: Motion, width: f64, x: f64) -> LiveItem {
    LiveItem {
        id: 1,
        text: "x".to_owned(),
        size: Size::new(width, 20.0),
        pos: Point::new(x, 0.0),
        alpha: 255,
        slot_y: 0.0,
        holds_slot: true,
        margin_bottom: 0.0,
        duration_ms: 0,
        sprite: SpriteHandle::from_raw(1),
        first_tick: None,
        motion,
    }
}

fn frame(now_ms: u64, elapsed_ms: f64) -> Frame {
    Frame {
        viewport: Size::new(1000.0, 500.0),
        elapsed_ms,
        now: Duration::from_millis(now_ms),
        paused: false,
        rolling_speed: 0.1,
    }
}

#[test]
fn speed_grows_with_width_up_to_twenty_percent() {
    assert!((rolling_speed(0.1, 0.0) - 0.1).abs() < 1e-12);
    assert!((rolling_speed(0.1, 100.0) - 0.115).abs() < 1e-12);
    assert!((rolling_speed(0.1, 5000.0) - 0.12).abs() < 1e-12);
}

#[test]
fn rolling_releases_slot_then_retires() {
    let mut it = item(Motion::Rolling, 100.0, 1000.0);
    // speed for w=100 is 0.115 px/ms
    let s = step(&mut it, &frame(0, 100.0), false);
    assert!((it.pos.x - 988.5).abs() < 1e-9);
    assert_eq!(s, Step::default());

    // Release once x < 1000 - 100 - 48 = 852.
    let s = step(&mut it, &frame(1300, 1300.0), false);
    assert!(it.pos.x < 852.0);
    assert!(s.release_slot);
    assert!(!s.retire);

    it.holds_slot = false;
    let s = step(&mut it, &frame(20_000, 10_000.0), false);
    assert!(it.pos.x < -100.0);
    assert!(s.retire);
    assert!(!s.release_slot);
}

#[test]
fn paused_rolling_items_hold_still() {
    let mut it = item(Motion::Rolling, 100.0, 500.0);
    let mut f = frame(0, 100.0);
    f.paused = true;
    step(&mut it, &f, false);
    assert_eq!(it.pos.x, 500.0);
}

#[test]
fn reverse_rolling_moves_right() {
    let mut it = item(Motion::ReverseRolling, 100.0, -100.0);
    let s = step(&mut it, &frame(0, 1000.0), false);
    assert!((it.pos.x - 15.0).abs() < 1e-9);
    assert!(!s.release_slot);

    let s = step(&mut it, &frame(1000, 1000.0), false);
    assert!(s.release_slot);

    it.pos.x = 999.0;
    let s = step(&mut it, &frame(1100, 100.0), false);
    assert!(s.retire);
}

#[test]
fn pinned_items_centre_and_expire() {
    let mut it = item(Motion::Top, 200.0, 0.0);
    it.duration_ms = 3800;
    let s = step(&mut it, &frame(500, 16.0), false);
    assert_eq!(it.pos.x, 400.0);
    assert!(!s.retire);

    let s = step(&mut it, &frame(4300, 16.0), false);
    assert!(!s.retire);
    let s = step(&mut it, &frame(4301, 1.0), false);
    assert!(s.retire);
    assert!(s.release_slot);
}

fn advanced_track() -> AdvancedTrack {
    AdvancedTrack {
        start: Point::new(0.0, 10.0),
        end: Point::new(100.0, 10.0),
        velocity: Vec2::new(0.5, 0.0),
        translation_delay_ms: 100.0,
        translation_duration_ms: 200.0,
        start_alpha: 255,
        end_alpha: 55,
        alpha_delay_ms: 0.0,
        alpha_duration_ms: 1000.0,
        rotate_z: None,
        transform: None,
    }
}

#[test]
fn advanced_translation_follows_delay_and_duration() {
    let mut it = item(Motion::Advanced(Box::new(advanced_track())), 50.0, 0.0);
    it.pos = Point::new(0.0, 10.0);
    it.duration_ms = 1000;

    step(&mut it, &frame(0, 0.0), false);
    step(&mut it, &frame(100, 100.0), false);
    assert_eq!(it.pos.x, 0.0);
    step(&mut it, &frame(200, 100.0), false);
    assert_eq!(it.pos.x, 50.0);
    step(&mut it, &frame(300, 100.0), false);
    assert_eq!(it.pos.x, 100.0);
    step(&mut it, &frame(900, 600.0), false);
    assert_eq!(it.pos.x, 100.0);
    assert_eq!(it.pos.y, 10.0);
}

#[test]
fn advanced_alpha_fades_and_item_expires() {
    let mut it = item(Motion::Advanced(Box::new(advanced_track())), 50.0, 0.0);
    it.duration_ms = 1000;
    step(&mut it, &frame(0, 0.0), false);
    step(&mut it, &frame(500, 500.0), false);
    assert_eq!(it.alpha, 155);
    let s = step(&mut it, &frame(1000, 500.0), false);
    assert!(!s.retire);
    assert_eq!(it.alpha, 55);
    let s = step(&mut it, &frame(1001, 1.0), false);
    assert!(s.retire);
}

#[test]
fn superseded_subtitles_retire() {
    let mut it = item(Motion::Subtitle, 300.0, 0.0);
    it.duration_ms = 5000;
    let s = step(&mut it, &frame(0, 16.0), false);
    assert!(!s.retire);
    assert_eq!(it.pos.x, 350.0);
    assert!(step(&mut it, &frame(16, 16.0), true).retire);
}

#[test]
fn first_tick_is_captured_once() {
    let mut it = item(Motion::Top, 10.0, 0.0);
    it.duration_ms = 100;
    step(&mut it, &frame(50, 16.0), false);
    assert_eq!(it.first_tick, Some(Duration::from_millis(50)));
    step(&mut it, &frame(80, 16.0), false);
    assert_eq!(it.first_tick, Some(Duration::from_millis(50)));
    assert_eq!(it.age_ms(Duration::from_millis(80)), 30.0);
}

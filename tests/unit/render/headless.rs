use super::*;

use crate::render::surface::{DrawOrder, Outline};

fn format(wrap_width: Option<f64>) -> TextFormat {
    TextFormat {
        family: "Test Sans".to_owned(),
        size_px: 20.0,
        bold: false,
        wrap_width,
    }
}

fn request(text: &str) -> SpriteRequest {
    SpriteRequest {
        text: text.to_owned(),
        format: format(None),
        size: Size::new(48.0, 22.0),
        fill: Rgba8::WHITE,
        outline: Some(Outline {
            color: Rgba8::BLACK,
            width: 2.0,
        }),
        border: None,
    }
}

#[test]
fn fixed_metrics_measure_per_glyph() {
    let surface = HeadlessSurface::with_fixed_metrics(10.0, 20.0);
    assert_eq!(
        surface.measure("hello", &format(None)).unwrap(),
        Size::new(50.0, 20.0)
    );
    assert_eq!(
        surface.measure("ab\ncdef", &format(None)).unwrap(),
        Size::new(40.0, 40.0)
    );
    assert_eq!(surface.measure("", &format(None)).unwrap(), Size::ZERO);
}

#[test]
fn fixed_metrics_wrap_long_lines() {
    let surface = HeadlessSurface::with_fixed_metrics(10.0, 20.0);
    assert_eq!(
        surface.measure("0123456789", &format(Some(40.0))).unwrap(),
        Size::new(40.0, 60.0)
    );
}

#[test]
fn records_sprites_and_releases() {
    let surface = HeadlessSurface::with_fixed_metrics(10.0, 20.0);
    let a = surface.create_sprite(&request("a")).unwrap();
    let b = surface.create_sprite(&request("b")).unwrap();
    assert_ne!(a, b);
    assert_eq!(surface.live_sprites(), 2);
    assert_eq!(surface.sprite_request(a).unwrap().text, "a");

    surface.release_sprite(a);
    surface.release_sprite(a);
    assert_eq!(surface.released_count(), 1);
    assert_eq!(surface.live_sprites(), 1);
    assert_eq!(surface.created_texts(), ["a", "b"]);
}

#[test]
fn injected_failures_are_one_shot() {
    let surface = HeadlessSurface::with_fixed_metrics(10.0, 20.0);
    surface.fail_next_sprite("out of memory");
    assert_eq!(
        surface.create_sprite(&request("a")).unwrap_err(),
        SurfaceError::Failed("out of memory".to_owned())
    );
    assert!(surface.create_sprite(&request("a")).is_ok());
}

#[test]
fn lost_device_rejects_work_until_restored() {
    let surface = HeadlessSurface::with_fixed_metrics(10.0, 20.0);
    surface.create_sprite(&request("a")).unwrap();
    surface.lose_device();
    assert_eq!(surface.live_sprites(), 0);
    assert!(surface.create_sprite(&request("b")).unwrap_err().is_device_lost());
    let batch = DrawBatch {
        layer: None,
        order: DrawOrder::Strict,
        commands: Vec::new(),
    };
    assert!(surface.draw(&batch).unwrap_err().is_device_lost());

    surface.restore_device();
    surface.draw(&batch).unwrap();
    assert_eq!(surface.take_batches().len(), 1);
    assert!(surface.take_batches().is_empty());
}

#[test]
fn empty_font_data_is_rejected() {
    assert!(HeadlessSurface::with_fonts([Vec::<u8>::new()]).is_err());
}

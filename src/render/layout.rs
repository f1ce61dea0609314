use crate::comment::model::{AdvancedMotion, Comment, HAlign, MotionMode, VAlign};
use crate::config::{DEFAULT_FONT_FAMILY, OverlayConfig};
use crate::foundation::core::{Point, Rect, Rgba8, Size, opacity_to_alpha};
use crate::foundation::math::{Mat4, deg_to_rad, is_rotated};
use crate::render::surface::{DeviceCaps, Outline, TextFormat};

/// Viewport width at which font sizes are used unscaled.
pub(crate) const STANDARD_VIEWPORT_WIDTH: f64 = 800.0;
/// Horizontal inset for wrapped text, and the subtitle distance from the bottom edge.
pub(crate) const TEXT_INSET: f64 = 24.0;
/// Extra sprite width reserved for the border stroke.
pub(crate) const BORDER_PADDING: f64 = 8.0;
/// Display time of top and bottom comments without a defined duration.
pub(crate) const DEFAULT_PINNED_DURATION_MS: u64 = 3800;
/// Distance a rolling comment travels past its entry edge before its slot frees up.
pub(crate) const SLOT_RELEASE_GAP: f64 = 48.0;

/// Font size and bottom margin after size steps and narrow-viewport scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Sizing {
    pub(crate) font_px: f64,
    pub(crate) margin_bottom: f64,
}

pub(crate) fn sizing(comment: &Comment, cfg: &OverlayConfig, viewport_width: f64) -> Sizing {
    let mut font_px = comment.base_font_size;
    let mut margin_bottom = f64::from(comment.margin_bottom);
    if !comment.keep_defined_font_size {
        let step = if comment.mode == MotionMode::Subtitle {
            cfg.subtitle_font_step
        } else {
            cfg.comment_font_step
        };
        font_px += step.offset_px();

        if viewport_width < STANDARD_VIEWPORT_WIDTH {
            font_px = font_px * viewport_width / STANDARD_VIEWPORT_WIDTH;
            if font_px >= 30.0 {
                font_px *= 0.75;
            }
            margin_bottom =
                (margin_bottom * viewport_width * 0.75 / STANDARD_VIEWPORT_WIDTH).trunc();
        }
    }
    Sizing {
        font_px: font_px.max(2.0).trunc(),
        margin_bottom,
    }
}

pub(crate) fn font_family(comment: &Comment, cfg: &OverlayConfig) -> String {
    if !comment.font_family.trim().is_empty() {
        comment.font_family.clone()
    } else if comment.mode == MotionMode::Advanced {
        DEFAULT_FONT_FAMILY.to_owned()
    } else {
        cfg.font_family_or_default().to_owned()
    }
}

pub(crate) fn text_format(
    comment: &Comment,
    cfg: &OverlayConfig,
    viewport: Size,
    sizing: Sizing,
) -> TextFormat {
    TextFormat {
        family: font_family(comment, cfg),
        size_px: sizing.font_px,
        bold: comment.bold.unwrap_or(cfg.bold),
        wrap_width: comment
            .mode
            .wraps()
            .then_some((viewport.width - TEXT_INSET).max(1.0)),
    }
}

/// Sprite size from measured text bounds: border padding on the width, outline on the height.
pub(crate) fn sprite_size(measured: Size, comment: &Comment) -> Size {
    let outline = if comment.has_outline {
        comment.outline_size
    } else {
        0.0
    };
    Size::new(measured.width + BORDER_PADDING, measured.height + outline)
}

pub(crate) fn is_degenerate(size: Size, caps: DeviceCaps) -> bool {
    if size.width <= 0.0 || size.height <= 0.0 || !size.is_finite() {
        return true;
    }
    caps.max_sprite_extent
        .is_some_and(|max| max > 0.0 && (size.width >= max || size.height >= max))
}

/// Fill and outline colors. Band modes take the configured opacity; dark text gets a white
/// outline so it stays readable.
pub(crate) fn colors(comment: &Comment, cfg: &OverlayConfig) -> (Rgba8, Option<Outline>) {
    let fill = match comment.mode {
        MotionMode::Advanced | MotionMode::Subtitle => comment.text_color,
        _ => comment.text_color.with_alpha(opacity_to_alpha(cfg.opacity)),
    };
    let outline = comment.has_outline.then(|| {
        let color = if fill.is_dark() {
            Rgba8::WHITE
        } else {
            comment.outline_color
        };
        Outline {
            color: color.with_alpha(fill.a),
            width: comment.outline_size,
        }
    });
    (fill, outline)
}

pub(crate) fn display_duration_ms(mode: MotionMode, defined_ms: u64) -> u64 {
    match mode {
        MotionMode::Top | MotionMode::Bottom if defined_ms == 0 => DEFAULT_PINNED_DURATION_MS,
        _ => defined_ms,
    }
}

/// Values `<= 1.0` are fractions of `extent`.
fn resolve(value: f64, extent: f64) -> f64 {
    if value > 1.0 { value } else { value * extent }
}

/// Start and end positions of an advanced comment's top-left corner.
pub(crate) fn advanced_placement(
    adv: &AdvancedMotion,
    size: Size,
    viewport: Size,
    margin_bottom: f64,
) -> (Point, Point) {
    let (w, h) = (size.width, size.height);
    let (vw, vh) = (viewport.width, viewport.height);

    let Some((halign, valign)) = adv.alignment.parts() else {
        let mut start = Point::new(resolve(adv.start_x, vw), resolve(adv.start_y, vh));
        let mut end = Point::new(resolve(adv.end_x, vw), resolve(adv.end_y, vh));
        end.x = pull_inside(start.x, end.x, w, vw);
        end.y = pull_inside(start.y, end.y, h, vh);

        if let Some((ah, av)) = adv.anchor.parts() {
            let dx = match ah {
                HAlign::Left => 0.0,
                HAlign::Center => w / 2.0,
                HAlign::Right => w,
            };
            let dy = match av {
                VAlign::Upper => 0.0,
                VAlign::Middle => h / 2.0,
                VAlign::Lower => h,
            };
            start.x -= dx;
            end.x -= dx;
            start.y -= dy;
            end.y -= dy;
        }
        return (start, end);
    };

    let x = match halign {
        HAlign::Left => f64::from(adv.margin_left),
        HAlign::Center => (vw - w) / 2.0,
        HAlign::Right => vw - w - f64::from(adv.margin_right),
    };
    let y = match valign {
        VAlign::Upper => 0.0,
        VAlign::Middle => (vh - h) / 2.0,
        VAlign::Lower => vh - h - margin_bottom,
    };
    let p = Point::new(x, y);
    (p, p)
}

/// An end point moving forward into the viewport whose box would cross the far edge is pulled
/// back inside, or pushed fully to the edge when less than a fifth of the box fits.
fn pull_inside(start: f64, end: f64, extent: f64, viewport: f64) -> f64 {
    if end > start && end < viewport && end + extent > viewport {
        if end + extent * 0.2 <= viewport {
            viewport - extent
        } else {
            viewport
        }
    } else {
        end
    }
}

/// Pseudo-3D transform about the sprite centre, with the projected sprite bounds.
pub(crate) fn pseudo_3d(size: Size, rotate_z_deg: f64, rotate_y_deg: f64) -> Option<(Mat4, Rect)> {
    if !is_rotated(rotate_y_deg) {
        return None;
    }
    let (w, h) = (size.width, size.height);
    let ry = deg_to_rad(rotate_y_deg);

    let mut spin = if is_rotated(rotate_z_deg) {
        Mat4::rotation_z(deg_to_rad(rotate_z_deg))
    } else {
        Mat4::IDENTITY
    };
    spin = spin.then(&Mat4::rotation_y(ry));
    spin.m[0][3] = -(1.0 / w) * ry.sin();

    let matrix = Mat4::translation(-w / 2.0, -h / 2.0, 0.0)
        .then(&spin)
        .then(&Mat4::translation(w / 2.0, h / 2.0, 0.0));
    let bounds = matrix.project_bounds(Rect::new(0.0, 0.0, w, h));
    Some((matrix, bounds))
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;

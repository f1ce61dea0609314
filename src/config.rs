use crate::comment::model::FontSizeStep;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{DanmakuError, DanmakuResult};

/// Font family used when neither the comment nor the configuration names one.
pub const DEFAULT_FONT_FAMILY: &str = "Microsoft YaHei";

/// Presentation settings shared by every layer of an overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Text opacity for band modes, in `(0, 1]`.
    pub opacity: f64,
    /// Bold weight for comments without their own override.
    pub bold: bool,
    /// Default font family; empty falls back to [`DEFAULT_FONT_FAMILY`].
    pub font_family: String,
    /// Size step applied to comments.
    pub comment_font_step: FontSizeStep,
    /// Size step applied to subtitles.
    pub subtitle_font_step: FontSizeStep,
    /// Maximum concurrent rolling comments per layer when auto-density is off; `-1` is unlimited.
    pub rolling_density: i32,
    /// Share of the viewport height used by rolling layers, in tenths (`1..=10`).
    pub rolling_area_ratio: u8,
    /// Rolling speed step (`1..=10`); speed is `step * 0.02` px/ms before width adjustment.
    pub rolling_speed: u8,
    /// Drop comments that find no free slot.
    pub auto_density: bool,
    /// Border color for bordered comments and the debug overlay.
    pub border_color: Rgba8,
    /// Keep bottom comments clear of the subtitle area.
    pub no_overlap_subtitle: bool,
    /// Draw sprite borders and the statistics line.
    pub debug: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            bold: true,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            comment_font_step: FontSizeStep::Normal,
            subtitle_font_step: FontSizeStep::Normal,
            rolling_density: -1,
            rolling_area_ratio: 8,
            rolling_speed: 5,
            auto_density: true,
            border_color: Rgba8::BLUE,
            no_overlap_subtitle: false,
            debug: false,
        }
    }
}

impl OverlayConfig {
    /// Reject out-of-range settings.
    pub fn validate(&self) -> DanmakuResult<()> {
        validate_opacity(self.opacity)?;
        validate_rolling_density(self.rolling_density)?;
        validate_step("rolling_area_ratio", self.rolling_area_ratio)?;
        validate_step("rolling_speed", self.rolling_speed)?;
        Ok(())
    }

    /// Base rolling speed in px/ms.
    pub fn rolling_speed_px_per_ms(&self) -> f64 {
        f64::from(self.rolling_speed) * 0.02
    }

    /// Rolling band as a fraction of the viewport height.
    pub fn rolling_area_fraction(&self) -> f64 {
        f64::from(self.rolling_area_ratio) / 10.0
    }

    /// The configured family, or [`DEFAULT_FONT_FAMILY`] when blank.
    pub fn font_family_or_default(&self) -> &str {
        if self.font_family.trim().is_empty() {
            DEFAULT_FONT_FAMILY
        } else {
            &self.font_family
        }
    }
}

pub(crate) fn validate_opacity(opacity: f64) -> DanmakuResult<()> {
    if !opacity.is_finite() || opacity <= 0.0 || opacity > 1.0 {
        return Err(DanmakuError::validation(format!(
            "opacity must be in (0, 1], got {opacity}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_rolling_density(density: i32) -> DanmakuResult<()> {
    if density < -1 {
        return Err(DanmakuError::validation(format!(
            "rolling_density must be -1 (unlimited) or >= 0, got {density}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_step(name: &str, value: u8) -> DanmakuResult<()> {
    if !(1..=10).contains(&value) {
        return Err(DanmakuError::validation(format!(
            "{name} must be in 1..=10, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

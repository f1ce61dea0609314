pub use kurbo::{Point, Rect, Size, Vec2};

/// Straight-alpha RGBA8 color as carried by comment styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    u8::MAX
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque blue (default border color).
    pub const BLUE: Self = Self::rgb(0, 0, 0xff);
    /// Opaque gray (debug overlay background at a healthy frame rate).
    pub const GRAY: Self = Self::rgb(0x80, 0x80, 0x80);
    /// Opaque red (debug overlay background below 30 fps).
    pub const RED: Self = Self::rgb(0xff, 0, 0);
    /// Opaque light green (debug overlay text).
    pub const LIGHT_GREEN: Self = Self::rgb(0x90, 0xee, 0x90);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: u8::MAX }
    }

    /// Same color with a replaced alpha channel.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Near-black text that needs a light outline to stay readable.
    pub fn is_dark(self) -> bool {
        u16::from(self.r) + u16::from(self.g) + u16::from(self.b) < 0x20
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Map a unit opacity in `[0, 1]` to an 8-bit alpha.
pub fn opacity_to_alpha(opacity: f64) -> u8 {
    (opacity.clamp(0.0, 1.0) * f64::from(u8::MAX)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

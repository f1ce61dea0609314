use crate::foundation::core::{Point, Rect, Rgba8, Size};
use crate::foundation::error::SurfaceError;
use crate::foundation::math::Mat4;
use crate::layer::LayerId;

/// Opaque handle to a sprite owned by a [`RenderSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(u64);

impl SpriteHandle {
    /// Wrap a surface-defined identifier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The surface-defined identifier.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Text styling used for measurement and sprite creation.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFormat {
    /// Font family name.
    pub family: String,
    /// Font size, px.
    pub size_px: f64,
    /// Bold weight.
    pub bold: bool,
    /// Wrap width, px; `None` keeps the text on one line.
    pub wrap_width: Option<f64>,
}

/// Glyph outline stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    /// Stroke color.
    pub color: Rgba8,
    /// Stroke width, px.
    pub width: f64,
}

/// Everything a surface needs to bake one comment into a sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteRequest {
    /// Text to draw.
    pub text: String,
    /// Text styling.
    pub format: TextFormat,
    /// Sprite size including border padding and outline.
    pub size: Size,
    /// Glyph fill color.
    pub fill: Rgba8,
    /// Glyph outline, drawn under the fill.
    pub outline: Option<Outline>,
    /// Rectangle around the sprite bounds (4 px stroke).
    pub border: Option<Rgba8>,
}

/// Capabilities reported when a device becomes available.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceCaps {
    /// Largest sprite width or height the device accepts, px. `None` means unbounded.
    pub max_sprite_extent: Option<f64>,
}

/// Rotation about a point, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    /// Angle, radians.
    pub radians: f64,
    /// Pivot in viewport coordinates.
    pub pivot: Point,
}

/// One drawing operation inside a [`DrawBatch`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Blit a sprite with its top-left corner at `origin`.
    Sprite {
        /// Sprite to draw.
        sprite: SpriteHandle,
        /// Top-left corner in viewport coordinates.
        origin: Point,
        /// Multiplicative tint; alpha carries the item opacity.
        tint: Rgba8,
        /// Optional rotation about a pivot.
        rotation: Option<Rotation>,
    },
    /// Draw a sprite through a 4x4 transform into `dest`.
    Transformed {
        /// Sprite to draw.
        sprite: SpriteHandle,
        /// Row-vector transform in sprite-local coordinates.
        matrix: Mat4,
        /// Projected bounds translated to the item position.
        dest: Rect,
        /// Multiplicative tint.
        tint: Rgba8,
    },
    /// Fill a rectangle.
    Backdrop {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Rgba8,
    },
    /// Plain text line (statistics overlay).
    Text {
        /// Text to draw.
        text: String,
        /// Top-left corner.
        origin: Point,
        /// Text color.
        color: Rgba8,
    },
}

/// Whether the surface may reorder commands in a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOrder {
    /// Commands must be drawn in list order.
    Strict,
    /// Commands may be grouped by sprite.
    Batched,
}

/// Commands for one layer (or the debug overlay) in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawBatch {
    /// Source layer; `None` for the debug overlay.
    pub layer: Option<LayerId>,
    /// Ordering constraint.
    pub order: DrawOrder,
    /// Commands in insertion order.
    pub commands: Vec<DrawCommand>,
}

/// Drawing collaborator: text measurement, sprite baking and compositing.
///
/// Implementations are shared between the scheduler worker and the host's frame loop.
/// Any method may report [`SurfaceError::DeviceLost`]; the overlay then drops every sprite and
/// waits for the next device.
pub trait RenderSurface: Send + Sync {
    /// Measure laid-out text bounds without border padding or outline.
    fn measure(&self, text: &str, format: &TextFormat) -> Result<Size, SurfaceError>;

    /// Bake a sprite for a comment.
    fn create_sprite(&self, request: &SpriteRequest) -> Result<SpriteHandle, SurfaceError>;

    /// Free a sprite. Unknown handles are ignored.
    fn release_sprite(&self, sprite: SpriteHandle);

    /// Composite one batch.
    fn draw(&self, batch: &DrawBatch) -> Result<(), SurfaceError>;

    /// Font families available for [`TextFormat::family`], sorted.
    fn font_families(&self) -> Vec<String>;
}

use crate::foundation::core::Rgba8;

/// Base font size used when a comment does not define one.
pub const DEFAULT_BASE_FONT_SIZE: f64 = 22.0;

/// Motion style of a comment. Discriminants follow the common danmaku wire numbering.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    /// Unrecognized mode; always dropped before rendering.
    #[default]
    Unknown = 0,
    /// Scrolls right to left.
    Rolling = 1,
    /// Pinned to the bottom band.
    Bottom = 4,
    /// Pinned to the top band.
    Top = 5,
    /// Scrolls left to right.
    ReverseRolling = 6,
    /// Free-form positioned and animated.
    Advanced = 7,
    /// Bottom-centred subtitle line.
    Subtitle = 9,
}

impl MotionMode {
    /// Map a numeric mode code; unknown codes become [`MotionMode::Unknown`].
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Rolling,
            4 => Self::Bottom,
            5 => Self::Top,
            6 => Self::ReverseRolling,
            7 => Self::Advanced,
            9 => Self::Subtitle,
            _ => Self::Unknown,
        }
    }

    /// Modes placed through a slot allocator.
    pub fn uses_slots(self) -> bool {
        matches!(
            self,
            Self::Rolling | Self::ReverseRolling | Self::Top | Self::Bottom
        )
    }

    /// Modes whose text wraps at the viewport width.
    pub fn wraps(self) -> bool {
        matches!(self, Self::Top | Self::Bottom | Self::Subtitle)
    }
}

/// Placement grid used by advanced comments, numbered like a keypad.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// No alignment: use the defined start/end positions.
    #[default]
    Default,
    /// Bottom left.
    LowerLeft,
    /// Bottom centre.
    LowerCenter,
    /// Bottom right.
    LowerRight,
    /// Vertical centre, left.
    MiddleLeft,
    /// Centre.
    MiddleCenter,
    /// Vertical centre, right.
    MiddleRight,
    /// Top left.
    UpperLeft,
    /// Top centre.
    UpperCenter,
    /// Top right.
    UpperRight,
}

/// Horizontal component of an [`Alignment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    /// Left edge.
    Left,
    /// Centre.
    Center,
    /// Right edge.
    Right,
}

/// Vertical component of an [`Alignment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    /// Top edge.
    Upper,
    /// Centre.
    Middle,
    /// Bottom edge.
    Lower,
}

impl Alignment {
    /// Split into horizontal and vertical parts; `None` for [`Alignment::Default`].
    pub fn parts(self) -> Option<(HAlign, VAlign)> {
        let parts = match self {
            Self::Default => return None,
            Self::LowerLeft => (HAlign::Left, VAlign::Lower),
            Self::LowerCenter => (HAlign::Center, VAlign::Lower),
            Self::LowerRight => (HAlign::Right, VAlign::Lower),
            Self::MiddleLeft => (HAlign::Left, VAlign::Middle),
            Self::MiddleCenter => (HAlign::Center, VAlign::Middle),
            Self::MiddleRight => (HAlign::Right, VAlign::Middle),
            Self::UpperLeft => (HAlign::Left, VAlign::Upper),
            Self::UpperCenter => (HAlign::Center, VAlign::Upper),
            Self::UpperRight => (HAlign::Right, VAlign::Upper),
        };
        Some(parts)
    }
}

/// Five-step font size preference applied on top of each comment's base size.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FontSizeStep {
    /// `-6` px.
    Smallest = 1,
    /// `-3` px.
    Smaller = 2,
    /// No change.
    #[default]
    Normal = 3,
    /// `+6` px.
    Larger = 4,
    /// `+12` px.
    Largest = 5,
}

impl FontSizeStep {
    /// Pixel offset added to the base font size.
    pub fn offset_px(self) -> f64 {
        let step = self as i32 - 3;
        let px_per_step = if step > 0 { 6 } else { 3 };
        f64::from(step * px_per_step)
    }
}

impl TryFrom<i32> for FontSizeStep {
    type Error = crate::foundation::error::DanmakuError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Smallest),
            2 => Ok(Self::Smaller),
            3 => Ok(Self::Normal),
            4 => Ok(Self::Larger),
            5 => Ok(Self::Largest),
            other => Err(crate::foundation::error::DanmakuError::validation(format!(
                "font size step must be in 1..=5, got {other}"
            ))),
        }
    }
}

/// Fields only meaningful for [`MotionMode::Advanced`] comments.
///
/// Positions `<= 1.0` are fractions of the viewport; larger values are pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AdvancedMotion {
    /// Start position, x.
    pub start_x: f64,
    /// Start position, y.
    pub start_y: f64,
    /// End position, x.
    pub end_x: f64,
    /// End position, y.
    pub end_y: f64,
    /// Grid alignment; [`Alignment::Default`] uses the positions above.
    pub alignment: Alignment,
    /// Which point of the text box the positions refer to.
    pub anchor: Alignment,
    /// Left margin for left-aligned placement.
    pub margin_left: i32,
    /// Right margin for right-aligned placement.
    pub margin_right: i32,
    /// Start alpha.
    pub start_alpha: u8,
    /// End alpha.
    pub end_alpha: u8,
    /// Delay before translation starts, ms.
    pub translation_delay_ms: u64,
    /// Translation duration, ms.
    pub translation_duration_ms: u64,
    /// Delay before the alpha fade starts, ms.
    pub alpha_delay_ms: u64,
    /// Alpha fade duration, ms.
    pub alpha_duration_ms: u64,
    /// Z rotation in degrees.
    pub rotate_z: f64,
    /// Y-axis pseudo-3D rotation in degrees.
    pub rotate_y: f64,
}

impl Default for AdvancedMotion {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            start_y: 0.0,
            end_x: 0.0,
            end_y: 0.0,
            alignment: Alignment::Default,
            anchor: Alignment::UpperLeft,
            margin_left: 0,
            margin_right: 0,
            start_alpha: u8::MAX,
            end_alpha: u8::MAX,
            translation_delay_ms: 0,
            translation_duration_ms: 0,
            alpha_delay_ms: 0,
            alpha_duration_ms: 0,
            rotate_z: 0.0,
            rotate_y: 0.0,
        }
    }
}

/// One timed comment as supplied by the host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Insertion identifier; only breaks ties between equal start times.
    pub id: u64,
    /// Start time on the playback clock, ms.
    pub start_ms: u32,
    /// Motion style.
    pub mode: MotionMode,
    /// Display text.
    pub text: String,
    /// Font family; empty uses the configured default.
    pub font_family: String,
    /// Base font size in px before the size step is applied.
    pub base_font_size: f64,
    /// Bold override; `None` falls back to the configured default.
    pub bold: Option<bool>,
    /// Fill color.
    pub text_color: Rgba8,
    /// Draw an outline around glyphs.
    pub has_outline: bool,
    /// Outline color (replaced by white for dark text).
    pub outline_color: Rgba8,
    /// Outline stroke width, px.
    pub outline_size: f64,
    /// Draw a rectangle around the text box.
    pub has_border: bool,
    /// Whether auto-density may drop this comment when no slot is free.
    pub allow_density_control: bool,
    /// Set for injected comments; the scheduler skips them once since they already rendered.
    pub realtime: bool,
    /// Ignore size steps and narrow-viewport scaling.
    pub keep_defined_font_size: bool,
    /// Display duration for Top, Bottom, Advanced and Subtitle, ms. Zero means mode default.
    pub duration_ms: u64,
    /// Bottom margin, px.
    pub margin_bottom: i32,
    /// Advanced-mode fields.
    pub advanced: AdvancedMotion,
}

impl Default for Comment {
    fn default() -> Self {
        Self {
            id: 0,
            start_ms: 0,
            mode: MotionMode::Rolling,
            text: String::new(),
            font_family: String::new(),
            base_font_size: DEFAULT_BASE_FONT_SIZE,
            bold: None,
            text_color: Rgba8::WHITE,
            has_outline: true,
            outline_color: Rgba8::BLACK,
            outline_size: 2.0,
            has_border: false,
            allow_density_control: true,
            realtime: false,
            keep_defined_font_size: false,
            duration_ms: 0,
            margin_bottom: 0,
            advanced: AdvancedMotion::default(),
        }
    }
}

impl Comment {
    /// A comment with the given start, mode and text and default styling.
    pub fn new(start_ms: u32, mode: MotionMode, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            mode,
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder-style duration setter.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Builder-style insertion id setter.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// End of the display interval for timed modes, ms.
    pub fn end_ms(&self) -> u64 {
        u64::from(self.start_ms) + self.duration_ms
    }
}

/// Sort comments by start time, breaking ties by insertion id.
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by_key(|c| (c.start_ms, c.id));
}

#[cfg(test)]
#[path = "../../tests/unit/comment/model.rs"]
mod tests;

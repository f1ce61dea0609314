//! Danmaku is an overlay engine for timed, scrolling video comments.
//!
//! Comments are kept in a start-time ordered store and scheduled against an external
//! playback clock by a [`Timeline`]. Due comments become live items on one of six layers of an
//! [`Overlay`], which allocates vertical slots, animates items per motion mode and submits
//! draw batches to a [`RenderSurface`].
//!
//! - Build an [`Overlay`] on a surface ([`HeadlessSurface`] for tests and simulation)
//! - Drive it with a [`Timeline`] from clock samples
//! - Call [`Overlay::update`] and [`Overlay::draw`] from the host's frame loop
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod comment;
mod config;
mod foundation;
mod layer;
mod render;
mod timeline;

pub use crate::comment::model::{
    AdvancedMotion, Alignment, Comment, DEFAULT_BASE_FONT_SIZE, FontSizeStep, HAlign,
    MotionMode, VAlign, sort_comments,
};
pub use crate::comment::store::CommentStore;
pub use crate::config::{DEFAULT_FONT_FAMILY, OverlayConfig};
pub use crate::foundation::core::{Point, Rect, Rgba8, Size, Vec2, opacity_to_alpha};
pub use crate::foundation::error::{DanmakuError, DanmakuResult, SurfaceError};
pub use crate::foundation::math::Mat4;
pub use crate::layer::LayerId;
pub use crate::layer::slot::{SlotAllocator, SlotGrant};
pub use crate::render::headless::HeadlessSurface;
pub use crate::render::overlay::Overlay;
pub use crate::render::surface::{
    DeviceCaps, DrawBatch, DrawCommand, DrawOrder, Outline, RenderSurface, Rotation,
    SpriteHandle, SpriteRequest, TextFormat,
};
pub use crate::timeline::{RESEEK_GAP_MS, Timeline};

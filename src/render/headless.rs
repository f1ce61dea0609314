use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::foundation::core::{Rgba8, Size};
use crate::foundation::error::{DanmakuError, DanmakuResult, SurfaceError};
use crate::render::surface::{DrawBatch, RenderSurface, SpriteHandle, SpriteRequest, TextFormat};

/// In-memory [`RenderSurface`] that measures text and records what would be drawn.
///
/// Text is measured either with Parley against registered font data, or with fixed per-glyph
/// metrics for fully deterministic runs. No pixels are produced.
pub struct HeadlessSurface {
    metrics: Metrics,
    recorder: Mutex<Recorder>,
}

enum Metrics {
    Fixed { advance: f64, line_height: f64 },
    Parley(Mutex<TextLayoutEngine>),
}

#[derive(Default)]
struct Recorder {
    next_sprite: u64,
    live: BTreeMap<u64, SpriteRequest>,
    created: Vec<String>,
    released: usize,
    batches: Vec<DrawBatch>,
    device_lost: bool,
    fail_next_sprite: Option<String>,
    fail_next_draw: Option<String>,
}

impl HeadlessSurface {
    /// Measure every glyph as `advance` px wide and every line as `line_height` px tall.
    pub fn with_fixed_metrics(advance: f64, line_height: f64) -> Self {
        Self {
            metrics: Metrics::Fixed {
                advance,
                line_height,
            },
            recorder: Mutex::new(Recorder::default()),
        }
    }

    /// Measure with Parley using the given font files (TTF/OTF bytes).
    pub fn with_fonts<I, B>(fonts: I) -> DanmakuResult<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut engine = TextLayoutEngine::new();
        for bytes in fonts {
            engine.register(bytes.as_ref())?;
        }
        Ok(Self {
            metrics: Metrics::Parley(Mutex::new(engine)),
            recorder: Mutex::new(Recorder::default()),
        })
    }

    /// Texts of every sprite created so far, in creation order.
    pub fn created_texts(&self) -> Vec<String> {
        self.recorder.lock().created.clone()
    }

    /// Number of sprites created and not yet released.
    pub fn live_sprites(&self) -> usize {
        self.recorder.lock().live.len()
    }

    /// Number of successful releases.
    pub fn released_count(&self) -> usize {
        self.recorder.lock().released
    }

    /// Request that produced a live sprite.
    pub fn sprite_request(&self, sprite: SpriteHandle) -> Option<SpriteRequest> {
        self.recorder.lock().live.get(&sprite.raw()).cloned()
    }

    /// Drain the recorded draw batches.
    pub fn take_batches(&self) -> Vec<DrawBatch> {
        std::mem::take(&mut self.recorder.lock().batches)
    }

    /// Simulate losing the device: live sprites vanish and every call fails until
    /// [`HeadlessSurface::restore_device`].
    pub fn lose_device(&self) {
        let mut rec = self.recorder.lock();
        rec.device_lost = true;
        rec.live.clear();
    }

    /// End a simulated device loss.
    pub fn restore_device(&self) {
        self.recorder.lock().device_lost = false;
    }

    /// Make the next sprite creation fail with a transient error.
    pub fn fail_next_sprite(&self, msg: impl Into<String>) {
        self.recorder.lock().fail_next_sprite = Some(msg.into());
    }

    /// Make the next draw fail with a transient error; the batch is not recorded.
    pub fn fail_next_draw(&self, msg: impl Into<String>) {
        self.recorder.lock().fail_next_draw = Some(msg.into());
    }
}

impl RenderSurface for HeadlessSurface {
    fn measure(&self, text: &str, format: &TextFormat) -> Result<Size, SurfaceError> {
        if self.recorder.lock().device_lost {
            return Err(SurfaceError::DeviceLost);
        }
        match &self.metrics {
            Metrics::Fixed {
                advance,
                line_height,
            } => Ok(fixed_measure(text, format, *advance, *line_height)),
            Metrics::Parley(engine) => engine.lock().measure(text, format),
        }
    }

    fn create_sprite(&self, request: &SpriteRequest) -> Result<SpriteHandle, SurfaceError> {
        let mut rec = self.recorder.lock();
        if rec.device_lost {
            return Err(SurfaceError::DeviceLost);
        }
        if let Some(msg) = rec.fail_next_sprite.take() {
            return Err(SurfaceError::Failed(msg));
        }
        rec.next_sprite += 1;
        let raw = rec.next_sprite;
        rec.live.insert(raw, request.clone());
        rec.created.push(request.text.clone());
        Ok(SpriteHandle::from_raw(raw))
    }

    fn release_sprite(&self, sprite: SpriteHandle) {
        let mut rec = self.recorder.lock();
        if rec.live.remove(&sprite.raw()).is_some() {
            rec.released += 1;
        }
    }

    fn draw(&self, batch: &DrawBatch) -> Result<(), SurfaceError> {
        let mut rec = self.recorder.lock();
        if rec.device_lost {
            return Err(SurfaceError::DeviceLost);
        }
        if let Some(msg) = rec.fail_next_draw.take() {
            return Err(SurfaceError::Failed(msg));
        }
        rec.batches.push(batch.clone());
        Ok(())
    }

    fn font_families(&self) -> Vec<String> {
        match &self.metrics {
            Metrics::Fixed { .. } => Vec::new(),
            Metrics::Parley(engine) => engine.lock().families.clone(),
        }
    }
}

fn fixed_measure(text: &str, format: &TextFormat, advance: f64, line_height: f64) -> Size {
    let mut width = 0.0_f64;
    let mut lines = 0_usize;
    for line in text.lines() {
        let w = line.chars().count() as f64 * advance;
        match format.wrap_width {
            Some(max) if max > 0.0 && w > max => {
                lines += (w / max).ceil() as usize;
                width = width.max(max);
            }
            _ => {
                lines += 1;
                width = width.max(w);
            }
        }
    }
    Size::new(width, lines as f64 * line_height)
}

/// Parley contexts plus the families registered into them.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    families: Vec<String>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: Vec::new(),
        }
    }

    fn register(&mut self, font_bytes: &[u8]) -> DanmakuResult<()> {
        let registered = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        if registered.is_empty() {
            return Err(DanmakuError::validation(
                "no font families registered from font bytes",
            ));
        }
        for (family_id, _) in registered {
            if let Some(name) = self.font_ctx.collection.family_name(family_id) {
                let name = name.to_string();
                if !self.families.contains(&name) {
                    self.families.push(name);
                }
            }
        }
        self.families.sort();
        Ok(())
    }

    fn measure(&mut self, text: &str, format: &TextFormat) -> Result<Size, SurfaceError> {
        if !format.size_px.is_finite() || format.size_px <= 0.0 {
            return Err(SurfaceError::failed("font size must be finite and > 0"));
        }

        // Unknown families fall through to the first registered one.
        let mut stack = format!("\"{}\"", format.family);
        if let Some(first) = self.families.first() {
            stack.push_str(&format!(", \"{first}\""));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            format.size_px as f32,
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(if format.bold {
            parley::style::FontWeight::BOLD
        } else {
            parley::style::FontWeight::NORMAL
        }));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(format.wrap_width.map(|w| w as f32));

        Ok(Size::new(
            f64::from(layout.width()),
            f64::from(layout.height()),
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/headless.rs"]
mod tests;

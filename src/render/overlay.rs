use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::comment::model::{Comment, FontSizeStep, MotionMode};
use crate::config::{self, OverlayConfig};
use crate::foundation::core::{Point, Rect, Rgba8, Size, Vec2, opacity_to_alpha};
use crate::foundation::error::{DanmakuError, DanmakuResult, SurfaceError};
use crate::foundation::math::{deg_to_rad, is_rotated};
use crate::layer::slot::SlotGrant;
use crate::layer::{Layer, LayerId, LayerSet};
use crate::render::animate::{self, Frame};
use crate::render::item::{AdvancedTrack, LiveItem, Motion};
use crate::render::layout::{self, TEXT_INSET};
use crate::render::surface::{
    DeviceCaps, DrawBatch, DrawCommand, DrawOrder, RenderSurface, Rotation, SpriteHandle,
    SpriteRequest,
};

/// Backdrop padding around subtitles, px.
const SUBTITLE_BACKDROP_PAD: f64 = 4.0;
/// Backdrop opacity behind subtitles.
const SUBTITLE_BACKDROP_OPACITY: f64 = 0.7;
/// Size of the statistics box drawn in debug mode.
const DEBUG_BOX: Size = Size::new(410.0, 30.0);

#[derive(Clone, Copy, Debug, Default)]
struct FrameClock {
    now: Duration,
    last_elapsed: Duration,
}

/// Layer set, configuration and device state of one danmaku overlay.
///
/// The scheduler feeds comments in through [`Overlay::render_comment`]; the host's frame loop
/// calls [`Overlay::update`] and [`Overlay::draw`]. All methods take `&self` and may be called
/// from different threads.
pub struct Overlay {
    surface: Arc<dyn RenderSurface>,
    layers: LayerSet,
    config: RwLock<OverlayConfig>,
    viewport: Mutex<Size>,
    device: Mutex<Option<DeviceCaps>>,
    clock: Mutex<FrameClock>,
    paused: AtomicBool,
    stopped: AtomicBool,
    comments_enabled: AtomicBool,
    subtitles_enabled: AtomicBool,
    next_id: AtomicU32,
}

impl Overlay {
    /// Build an overlay drawing onto `surface`. No device is attached yet.
    pub fn new(
        surface: Arc<dyn RenderSurface>,
        viewport: Size,
        config: OverlayConfig,
    ) -> DanmakuResult<Self> {
        config.validate()?;
        let layers = LayerSet::new(viewport.height, config.rolling_area_fraction());
        Ok(Self {
            surface,
            layers,
            config: RwLock::new(config),
            viewport: Mutex::new(viewport),
            device: Mutex::new(None),
            clock: Mutex::new(FrameClock::default()),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            comments_enabled: AtomicBool::new(true),
            subtitles_enabled: AtomicBool::new(true),
            next_id: AtomicU32::new(1),
        })
    }

    /// Measure, place and bake `comment` onto `layer`.
    ///
    /// Comments are silently skipped while no device is attached, while stopped, when their
    /// render state is off, for unknown modes, for degenerate sizes and when density control
    /// rejects them. Surface failures are absorbed: device loss purges every layer, other
    /// failures skip this comment.
    pub fn render_comment(&self, layer: LayerId, comment: &Comment) {
        let Some(caps) = *self.device.lock() else {
            return;
        };
        if self.is_stopped() || !self.mode_enabled(comment.mode) {
            return;
        }
        if comment.mode == MotionMode::Unknown {
            debug!(text = %comment.text, "ignoring comment with unknown mode");
            return;
        }

        let cfg = self.config.read().clone();
        let viewport = self.viewport();
        let target = self.layers.get(layer);

        if !cfg.auto_density
            && cfg.rolling_density > 0
            && comment.mode == MotionMode::Rolling
            && target.len() >= cfg.rolling_density as usize
        {
            debug!(layer = ?layer, "rolling density cap reached, skipping comment");
            return;
        }

        let sizing = layout::sizing(comment, &cfg, viewport.width);
        let format = layout::text_format(comment, &cfg, viewport, sizing);
        let measured = match self.surface.measure(&comment.text, &format) {
            Ok(size) => size,
            Err(e) => {
                self.absorb(e);
                return;
            }
        };
        let size = layout::sprite_size(measured, comment);
        if layout::is_degenerate(size, caps) {
            debug!(?size, text = %comment.text, "dropping comment with degenerate size");
            return;
        }

        let id = self.next_item_id();
        let grant = if comment.mode.uses_slots() {
            target.lock().slots.reserve(id, size.height)
        } else {
            SlotGrant {
                reserved: false,
                y: 0.0,
            }
        };
        if cfg.auto_density
            && comment.allow_density_control
            && comment.mode.uses_slots()
            && !grant.reserved
        {
            debug!(layer = ?layer, "no free slot, density control drops comment");
            return;
        }

        let (fill, outline) = layout::colors(comment, &cfg);
        let request = SpriteRequest {
            text: comment.text.clone(),
            format,
            size,
            fill,
            outline,
            border: (comment.has_border || cfg.debug).then_some(cfg.border_color),
        };
        let sprite = match self.surface.create_sprite(&request) {
            Ok(sprite) => sprite,
            Err(e) => {
                if grant.reserved {
                    target.lock().slots.release(id, grant.y);
                }
                self.absorb(e);
                return;
            }
        };

        let item = build_item(id, comment, sprite, size, grant, sizing.margin_bottom, viewport);
        let mut state = target.lock();
        if self.is_stopped() || self.device.lock().is_none() {
            if item.holds_slot {
                state.slots.release(item.id, item.slot_y);
            }
            drop(state);
            self.surface.release_sprite(sprite);
            return;
        }
        state.items.push(item);
    }

    /// Advance every item by `elapsed` of wall-clock time.
    ///
    /// While paused the animation clock holds still and scrolling items do not move.
    pub fn update(&self, elapsed: Duration) {
        if self.is_stopped() {
            return;
        }
        let paused = self.is_paused();
        let now = {
            let mut clock = self.clock.lock();
            if !paused {
                clock.now += elapsed;
            }
            clock.last_elapsed = elapsed;
            clock.now
        };
        let frame = Frame {
            viewport: self.viewport(),
            elapsed_ms: if paused {
                0.0
            } else {
                elapsed.as_micros() as f64 / 1000.0
            },
            now,
            paused,
            rolling_speed: self.config.read().rolling_speed_px_per_ms(),
        };

        for layer in self.layers.iter() {
            let mut retired = Vec::new();
            {
                let mut guard = layer.lock();
                let state = &mut *guard;
                let last = state.items.len().saturating_sub(1);
                let mut index = 0;
                state.items.retain_mut(|item| {
                    let superseded = index < last;
                    index += 1;
                    let step = animate::step(item, &frame, superseded);
                    if item.holds_slot && (step.release_slot || step.retire) {
                        state.slots.release(item.id, item.slot_y);
                        item.holds_slot = false;
                    }
                    if step.retire {
                        retired.push(item.sprite);
                    }
                    !step.retire
                });
            }
            for sprite in retired {
                self.surface.release_sprite(sprite);
            }
        }
    }

    /// Submit one draw batch per enabled, non-empty layer, plus the statistics line in debug
    /// mode.
    ///
    /// Items that have not been through an update yet are skipped. Device loss purges every
    /// layer, ends the frame and returns `Ok`. A failed batch is logged and the remaining
    /// layers are still submitted; the first such failure is returned once the frame is done.
    pub fn draw(&self) -> DanmakuResult<()> {
        if self.is_stopped() || self.device.lock().is_none() {
            return Ok(());
        }
        let (no_overlap_subtitle, debug_overlay) = {
            let cfg = self.config.read();
            (cfg.no_overlap_subtitle, cfg.debug)
        };
        let viewport = self.viewport();
        let mut total = 0;
        let mut failure = None;

        for layer in self.layers.iter().filter(|l| l.is_enabled()) {
            let commands = {
                let state = layer.lock();
                total += state.items.len();
                let mut commands = Vec::with_capacity(state.items.len());
                for item in state.items.iter().filter(|i| i.first_tick.is_some()) {
                    push_commands(&mut commands, item, viewport, no_overlap_subtitle);
                }
                commands
            };
            if commands.is_empty() {
                continue;
            }
            let batch = DrawBatch {
                layer: Some(layer.id()),
                order: if layer.id().is_strict() {
                    DrawOrder::Strict
                } else {
                    DrawOrder::Batched
                },
                commands,
            };
            if let Err(e) = self.submit(&batch) {
                failure.get_or_insert(e);
            }
            if self.device.lock().is_none() {
                return Ok(());
            }
        }

        if debug_overlay {
            let elapsed = self.clock.lock().last_elapsed;
            if !elapsed.is_zero() {
                let fps = (1000.0 / (elapsed.as_micros() as f64 / 1000.0)) as u32;
                let batch = DrawBatch {
                    layer: None,
                    order: DrawOrder::Strict,
                    commands: vec![
                        DrawCommand::Backdrop {
                            rect: DEBUG_BOX.to_rect(),
                            color: if fps >= 30 { Rgba8::GRAY } else { Rgba8::RED },
                        },
                        DrawCommand::Text {
                            text: format!(
                                "fps:{fps} count:{total} {}x{}",
                                viewport.width as i64, viewport.height as i64
                            ),
                            origin: Point::ZERO,
                            color: Rgba8::LIGHT_GREEN,
                        },
                    ],
                };
                if let Err(e) = self.submit(&batch) {
                    failure.get_or_insert(e);
                }
            }
        }
        match failure {
            Some(e) => Err(DanmakuError::Surface(e)),
            None => Ok(()),
        }
    }

    /// Change the viewport. A real size change clears every layer and rescales the slot bands.
    pub fn resize(&self, size: Size) {
        {
            let mut viewport = self.viewport.lock();
            if *viewport == size {
                return;
            }
            *viewport = size;
        }
        self.clear();
        let fraction = self.config.read().rolling_area_fraction();
        self.layers.resize(size.height, fraction);
        info!(width = size.width, height = size.height, "viewport resized");
    }

    /// Attach a (new) device. Resources created on a previous device are purged first.
    pub fn device_created(&self, caps: DeviceCaps) {
        let previous = self.device.lock().replace(caps);
        if previous.is_some() {
            self.purge();
        }
        info!(?caps, "render device ready");
    }

    /// Detach the device and discard every item; sprites died with the device.
    pub fn device_lost(&self) {
        self.device.lock().take();
        self.purge();
        warn!("render device lost, all layers purged");
    }

    /// Return `true` while a device is attached.
    pub fn has_device(&self) -> bool {
        self.device.lock().is_some()
    }

    /// Resume animation and accept comments again, if any render state is on.
    pub fn start(&self) {
        if self.comments_enabled.load(Ordering::Acquire)
            || self.subtitles_enabled.load(Ordering::Acquire)
        {
            self.paused.store(false, Ordering::Release);
            self.stopped.store(false, Ordering::Release);
            debug!("overlay started");
        }
    }

    /// Freeze the animation clock; items stay on screen.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        debug!("overlay paused");
    }

    /// Reject new comments and clear every layer until [`Overlay::start`].
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.clear();
        info!("overlay stopped");
    }

    /// Stop and pause for good.
    pub fn close(&self) {
        self.stop();
        self.paused.store(true, Ordering::Release);
        info!("overlay closed");
    }

    /// Return `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Return `true` while stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Remove every item from every layer.
    pub fn clear(&self) {
        for layer in self.layers.iter() {
            self.release_all(layer);
        }
    }

    /// Remove every item from one layer.
    pub fn clear_layer(&self, layer: LayerId) {
        self.release_all(self.layers.get(layer));
    }

    /// Turn comment and subtitle rendering on or off. Turning a kind off clears its layers;
    /// turning both off pauses and stops the overlay.
    pub fn set_render_state(&self, comments: bool, subtitles: bool) {
        self.comments_enabled.store(comments, Ordering::Release);
        self.subtitles_enabled.store(subtitles, Ordering::Release);
        for layer in self.layers.iter() {
            let keep = if layer.is_subtitle_layer() {
                subtitles
            } else {
                comments
            };
            if !keep {
                self.release_all(layer);
            }
        }
        if !comments && !subtitles {
            self.pause();
            self.stop();
        } else if (!comments || !subtitles) && self.is_paused() {
            self.start();
        }
    }

    /// Show or hide one layer. Hiding clears it.
    pub fn set_layer_enabled(&self, layer: LayerId, enabled: bool) {
        let target = self.layers.get(layer);
        target.set_enabled(enabled);
        if !enabled {
            self.release_all(target);
        }
    }

    /// Return `true` if `layer` is drawn.
    pub fn is_layer_enabled(&self, layer: LayerId) -> bool {
        self.layers.get(layer).is_enabled()
    }

    /// Treat `layer` as carrying subtitles for [`Overlay::set_render_state`].
    pub fn set_subtitle_layer(&self, layer: LayerId) {
        self.layers.get(layer).mark_subtitle_layer();
    }

    /// Number of live items on `layer`.
    pub fn item_count(&self, layer: LayerId) -> usize {
        self.layers.get(layer).len()
    }

    /// Number of live items on every layer.
    pub fn total_items(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Texts of the live items on `layer`, in arrival order.
    pub fn item_texts(&self, layer: LayerId) -> Vec<String> {
        self.layers
            .get(layer)
            .lock()
            .items
            .iter()
            .map(|i| i.text.clone())
            .collect()
    }

    /// Current viewport.
    pub fn viewport(&self) -> Size {
        *self.viewport.lock()
    }

    /// Animation clock: total unpaused time fed to [`Overlay::update`].
    pub fn animation_time(&self) -> Duration {
        self.clock.lock().now
    }

    /// Font families offered by the surface.
    pub fn font_families(&self) -> Vec<String> {
        self.surface.font_families()
    }

    /// Snapshot of the configuration.
    pub fn config(&self) -> OverlayConfig {
        self.config.read().clone()
    }

    /// Replace the whole configuration.
    pub fn set_config(&self, config: OverlayConfig) -> DanmakuResult<()> {
        config.validate()?;
        let fraction = config.rolling_area_fraction();
        *self.config.write() = config;
        self.layers.resize(self.viewport().height, fraction);
        Ok(())
    }

    /// Text opacity for band modes, in `(0, 1]`.
    pub fn set_opacity(&self, opacity: f64) -> DanmakuResult<()> {
        config::validate_opacity(opacity)?;
        self.config.write().opacity = opacity;
        Ok(())
    }

    /// Default bold weight.
    pub fn set_bold(&self, bold: bool) {
        self.config.write().bold = bold;
    }

    /// Default font family; blank restores the built-in default.
    pub fn set_font_family(&self, family: impl Into<String>) {
        self.config.write().font_family = family.into();
    }

    /// Size step for comments.
    pub fn set_comment_font_step(&self, step: FontSizeStep) {
        self.config.write().comment_font_step = step;
    }

    /// Size step for subtitles.
    pub fn set_subtitle_font_step(&self, step: FontSizeStep) {
        self.config.write().subtitle_font_step = step;
    }

    /// Rolling comment cap per layer when auto-density is off; `-1` is unlimited.
    pub fn set_rolling_density(&self, density: i32) -> DanmakuResult<()> {
        config::validate_rolling_density(density)?;
        self.config.write().rolling_density = density;
        Ok(())
    }

    /// Rolling band height in tenths of the viewport (`1..=10`).
    pub fn set_rolling_area_ratio(&self, ratio: u8) -> DanmakuResult<()> {
        config::validate_step("rolling_area_ratio", ratio)?;
        let fraction = {
            let mut cfg = self.config.write();
            cfg.rolling_area_ratio = ratio;
            cfg.rolling_area_fraction()
        };
        self.layers.resize(self.viewport().height, fraction);
        Ok(())
    }

    /// Rolling speed step (`1..=10`).
    pub fn set_rolling_speed(&self, speed: u8) -> DanmakuResult<()> {
        config::validate_step("rolling_speed", speed)?;
        self.config.write().rolling_speed = speed;
        Ok(())
    }

    /// Drop comments that find no free slot.
    pub fn set_auto_density(&self, enabled: bool) {
        self.config.write().auto_density = enabled;
    }

    /// Border color for bordered comments.
    pub fn set_border_color(&self, color: Rgba8) {
        self.config.write().border_color = color;
    }

    /// Keep bottom comments clear of the subtitle area.
    pub fn set_no_overlap_subtitle(&self, enabled: bool) {
        self.config.write().no_overlap_subtitle = enabled;
    }

    /// Draw sprite borders and the statistics line.
    pub fn set_debug(&self, enabled: bool) {
        self.config.write().debug = enabled;
    }

    fn mode_enabled(&self, mode: MotionMode) -> bool {
        if mode == MotionMode::Subtitle {
            self.subtitles_enabled.load(Ordering::Acquire)
        } else {
            self.comments_enabled.load(Ordering::Acquire)
        }
    }

    /// Engine-scoped render id; wraps around and never yields zero.
    fn next_item_id(&self) -> u32 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    fn release_all(&self, layer: &Layer) {
        for item in layer.take_all() {
            self.surface.release_sprite(item.sprite);
        }
    }

    fn purge(&self) {
        for layer in self.layers.iter() {
            layer.take_all();
        }
    }

    /// Recover from a surface failure while preparing one comment.
    fn absorb(&self, err: SurfaceError) {
        if err.is_device_lost() {
            self.device_lost();
        } else {
            warn!(error = %err, "surface failure, skipping comment");
        }
    }

    fn submit(&self, batch: &DrawBatch) -> Result<(), SurfaceError> {
        match self.surface.draw(batch) {
            Ok(()) => Ok(()),
            Err(SurfaceError::DeviceLost) => {
                self.device_lost();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, layer = ?batch.layer, "draw failed, continuing with next batch");
                Err(e)
            }
        }
    }
}

fn build_item(
    id: u32,
    comment: &Comment,
    sprite: SpriteHandle,
    size: Size,
    grant: SlotGrant,
    margin_bottom: f64,
    viewport: Size,
) -> LiveItem {
    let centred_x = (viewport.width - size.width) / 2.0;
    let mut alpha = u8::MAX;
    let (pos, motion) = match comment.mode {
        MotionMode::Rolling | MotionMode::Unknown => {
            (Point::new(viewport.width, grant.y), Motion::Rolling)
        }
        MotionMode::ReverseRolling => (Point::new(-size.width, grant.y), Motion::ReverseRolling),
        MotionMode::Top => (Point::new(centred_x, grant.y), Motion::Top),
        MotionMode::Bottom => (Point::new(centred_x, grant.y), Motion::Bottom),
        MotionMode::Subtitle => (Point::new(centred_x, TEXT_INSET), Motion::Subtitle),
        MotionMode::Advanced => {
            let adv = &comment.advanced;
            let (start, end) = layout::advanced_placement(adv, size, viewport, margin_bottom);
            let translation_ms = adv.translation_duration_ms as f64;
            let velocity = if translation_ms > 0.0 {
                (end - start) / translation_ms
            } else {
                Vec2::ZERO
            };
            alpha = adv.start_alpha;
            let track = AdvancedTrack {
                start,
                end,
                velocity,
                translation_delay_ms: adv.translation_delay_ms as f64,
                translation_duration_ms: translation_ms,
                start_alpha: adv.start_alpha,
                end_alpha: adv.end_alpha,
                alpha_delay_ms: adv.alpha_delay_ms as f64,
                alpha_duration_ms: adv.alpha_duration_ms as f64,
                rotate_z: is_rotated(adv.rotate_z).then(|| deg_to_rad(adv.rotate_z)),
                transform: layout::pseudo_3d(size, adv.rotate_z, adv.rotate_y),
            };
            (start, Motion::Advanced(Box::new(track)))
        }
    };

    LiveItem {
        id,
        text: comment.text.clone(),
        size,
        pos,
        alpha,
        slot_y: grant.y,
        holds_slot: grant.reserved,
        margin_bottom,
        duration_ms: layout::display_duration_ms(comment.mode, comment.duration_ms),
        sprite,
        first_tick: None,
        motion,
    }
}

fn push_commands(
    commands: &mut Vec<DrawCommand>,
    item: &LiveItem,
    viewport: Size,
    no_overlap_subtitle: bool,
) {
    let (w, h) = (item.size.width, item.size.height);
    let plain = |origin: Point| DrawCommand::Sprite {
        sprite: item.sprite,
        origin,
        tint: Rgba8::WHITE,
        rotation: None,
    };

    match &item.motion {
        Motion::Rolling | Motion::ReverseRolling | Motion::Top => {
            commands.push(plain(Point::new(item.pos.x, item.slot_y)));
        }
        Motion::Bottom => {
            let base = if no_overlap_subtitle {
                (viewport.height - 100.0).max(viewport.height * 0.8)
            } else {
                viewport.height
            };
            let y = (base - h - item.slot_y).max(0.0) - item.margin_bottom;
            commands.push(plain(Point::new(item.pos.x, y)));
        }
        Motion::Advanced(track) => {
            let tint = Rgba8::WHITE.with_alpha(item.alpha);
            let offset = item.pos.to_vec2();
            if let Some((matrix, bounds)) = &track.transform {
                commands.push(DrawCommand::Transformed {
                    sprite: item.sprite,
                    matrix: *matrix,
                    dest: *bounds + offset,
                    tint,
                });
            } else {
                commands.push(DrawCommand::Sprite {
                    sprite: item.sprite,
                    origin: item.pos,
                    tint,
                    rotation: track.rotate_z.map(|radians| Rotation {
                        radians,
                        pivot: item.pos + Vec2::new(w / 2.0, h / 2.0),
                    }),
                });
            }
        }
        Motion::Subtitle => {
            let y = viewport.height - h - TEXT_INSET;
            let pad = SUBTITLE_BACKDROP_PAD;
            commands.push(DrawCommand::Backdrop {
                rect: Rect::new(item.pos.x - pad, y - pad, item.pos.x + w + pad, y + h + pad),
                color: Rgba8::BLACK.with_alpha(opacity_to_alpha(SUBTITLE_BACKDROP_OPACITY)),
            });
            commands.push(plain(Point::new(item.pos.x, y)));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;

//! Clock-driven scheduling of stored comments onto an [`Overlay`].
//!
//! A [`Timeline`] owns the comment store and maps external playback-clock samples onto it:
//! every comment whose start time has been reached is handed to the overlay exactly once,
//! seeks reposition the cursor, and large clock jumps are treated as seeks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::Context as _;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::comment::model::{Comment, MotionMode};
use crate::comment::store::{CommentStore, ensure_sorted};
use crate::foundation::error::{DanmakuError, DanmakuResult};
use crate::layer::LayerId;
use crate::render::overlay::Overlay;

/// A sample further than this past the last applied time is handled as a seek.
pub const RESEEK_GAP_MS: u32 = 5000;

/// Store, cursor and playback position, guarded together.
#[derive(Debug, Default)]
struct Schedule {
    store: CommentStore,
    last_ms: u32,
    /// Subtitle to bring back on screen after a seek landed inside its display interval.
    restore: Option<usize>,
    has_subtitles: bool,
}

struct Shared {
    overlay: Arc<Overlay>,
    schedule: Mutex<Schedule>,
    /// Latest queued clock sample; newer samples replace older ones.
    pending: Mutex<Option<u32>>,
    sample_ready: Condvar,
    running: Mutex<bool>,
    gate: Condvar,
    closing: AtomicBool,
    seeking: AtomicBool,
    faulted: AtomicBool,
    render_enabled: AtomicBool,
}

/// Scheduler that feeds stored comments to an [`Overlay`] as the playback clock advances.
///
/// Created either with a worker thread ([`Timeline::spawn`]) that drains samples queued by
/// [`Timeline::submit_time`], or [`Timeline::detached`], where samples are applied on the
/// calling thread.
pub struct Timeline {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    detached: bool,
}

impl Timeline {
    /// Start a timeline with its own worker thread.
    pub fn spawn(overlay: Arc<Overlay>) -> DanmakuResult<Self> {
        let shared = Arc::new(Shared::new(overlay));
        let worker = thread::Builder::new()
            .name("danmaku-timeline".to_owned())
            .spawn({
                let shared = Arc::clone(&shared);
                move || shared.run()
            })
            .context("failed to spawn timeline worker thread")?;
        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
            detached: false,
        })
    }

    /// A timeline without a worker; samples are applied synchronously.
    pub fn detached(overlay: Arc<Overlay>) -> Self {
        Self {
            shared: Arc::new(Shared::new(overlay)),
            worker: Mutex::new(None),
            detached: true,
        }
    }

    /// The overlay comments are rendered onto.
    pub fn overlay(&self) -> &Arc<Overlay> {
        &self.shared.overlay
    }

    /// Report the playback clock.
    ///
    /// With a worker the sample is queued and only the most recent queued sample is applied.
    /// A detached timeline applies it immediately, or drops it while paused.
    pub fn submit_time(&self, time_ms: u32) -> DanmakuResult<()> {
        if self.detached {
            return self.advance_to(time_ms);
        }
        self.shared.ensure_running()?;
        *self.shared.pending.lock() = Some(time_ms);
        self.shared.sample_ready.notify_one();
        Ok(())
    }

    /// Apply one clock sample on the calling thread.
    ///
    /// Walks the cursor over every comment due at `time_ms`; a sample earlier than the last
    /// applied one, or more than [`RESEEK_GAP_MS`] ahead of it, seeks first. `0` is ignored,
    /// and so is every sample while the timeline is paused.
    pub fn advance_to(&self, time_ms: u32) -> DanmakuResult<()> {
        self.shared.ensure_running()?;
        if !*self.shared.running.lock() {
            debug!(time_ms, "timeline paused, dropping sample");
            return Ok(());
        }
        self.shared.advance_to(time_ms);
        Ok(())
    }

    /// Jump playback to `target_ms`.
    #[tracing::instrument(skip(self))]
    pub fn seek(&self, target_ms: u32) {
        self.shared.seeking.store(true, Ordering::Release);
        {
            let mut schedule = self.shared.schedule.lock();
            self.shared.seek_locked(&mut schedule, target_ms);
        }
        self.shared.seeking.store(false, Ordering::Release);
    }

    /// Seek back to the beginning.
    pub fn restart(&self) {
        self.seek(0);
    }

    /// Hold the worker and the overlay's animation clock.
    pub fn pause(&self) {
        self.shared.pause();
    }

    /// Release the worker and restart the overlay.
    pub fn resume(&self) {
        self.shared.resume();
    }

    /// Pause, clear every layer and discard queued samples.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Replace the stored comments. `comments` must be sorted by start time.
    #[tracing::instrument(skip(self, comments), fields(count = comments.len()))]
    pub fn set_comments(&self, comments: Vec<Comment>) -> DanmakuResult<()> {
        let mut schedule = self.shared.schedule.lock();
        schedule.store.replace_all(comments)?;
        schedule.restore = None;
        schedule.has_subtitles = schedule
            .store
            .items()
            .iter()
            .any(|c| c.mode == MotionMode::Subtitle);
        Ok(())
    }

    /// Replace every stored subtitle with `subtitles`, sorted by start time.
    ///
    /// The subtitle layer is cleared. Incoming subtitles that are on screen at the current
    /// playback position are shown right away; the rest are scheduled normally.
    #[tracing::instrument(skip(self, subtitles), fields(count = subtitles.len()))]
    pub fn set_subtitles(&self, subtitles: Vec<Comment>) -> DanmakuResult<()> {
        ensure_sorted(&subtitles, "subtitle list")?;
        self.shared.overlay.clear_layer(LayerId::Subtitle);

        let mut schedule = self.shared.schedule.lock();
        let removed = schedule.store.remove_mode(MotionMode::Subtitle);
        schedule.restore = None;
        schedule.has_subtitles = !subtitles.is_empty();

        let last = schedule.last_ms;
        let on_screen: Vec<Comment> = if last > 0 {
            subtitles
                .iter()
                .filter(|s| s.start_ms < last && s.end_ms() > u64::from(last))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        schedule.store.merge_sorted(subtitles, last)?;
        debug!(removed, on_screen = on_screen.len(), "subtitles replaced");

        for subtitle in &on_screen {
            self.shared.overlay.render_comment(LayerId::Subtitle, subtitle);
        }
        Ok(())
    }

    /// Drop every stored comment.
    pub fn clear_comments(&self) {
        let mut schedule = self.shared.schedule.lock();
        schedule.store.clear();
        schedule.restore = None;
    }

    /// Render `comment` on `layer` right away, bypassing density control.
    ///
    /// With `persist` it is also stored, flagged so the scheduler skips it once when its start
    /// time comes around.
    #[tracing::instrument(skip(self, comment), fields(start_ms = comment.start_ms))]
    pub fn add_realtime(
        &self,
        mut comment: Comment,
        persist: bool,
        layer: u32,
    ) -> DanmakuResult<()> {
        let layer = LayerId::try_from(layer)?;
        comment.allow_density_control = false;
        comment.realtime = true;
        self.shared.overlay.render_comment(layer, &comment);
        if persist {
            let mut schedule = self.shared.schedule.lock();
            schedule.has_subtitles |= comment.mode == MotionMode::Subtitle;
            schedule.store.insert_sorted(comment);
        }
        Ok(())
    }

    /// Turn comment and subtitle rendering on or off. While both are off, due comments are
    /// consumed without being rendered.
    pub fn set_render_state(&self, comments: bool, subtitles: bool) {
        self.shared
            .render_enabled
            .store(comments || subtitles, Ordering::Release);
        self.shared.overlay.set_render_state(comments, subtitles);
    }

    /// Show or hide a layer by numeric id.
    pub fn set_layer_enabled(&self, layer: u32, enabled: bool) -> DanmakuResult<()> {
        let layer = LayerId::try_from(layer)?;
        self.shared.overlay.set_layer_enabled(layer, enabled);
        Ok(())
    }

    /// Mark a layer, by numeric id, as following the subtitle render state.
    pub fn set_subtitle_layer(&self, layer: u32) -> DanmakuResult<()> {
        let layer = LayerId::try_from(layer)?;
        self.shared.overlay.set_subtitle_layer(layer);
        Ok(())
    }

    /// Shut down for good: wake and join the worker and close the overlay.
    #[tracing::instrument(skip(self))]
    pub fn close(&self) {
        let shared = &self.shared;
        if shared.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        shared.render_enabled.store(false, Ordering::Release);
        {
            let _running = shared.running.lock();
            shared.gate.notify_all();
        }
        {
            let _pending = shared.pending.lock();
            shared.sample_ready.notify_all();
        }
        shared.overlay.close();

        if let Some(handle) = self.worker.lock().take()
            && handle.join().is_err()
        {
            warn!("timeline worker could not be joined");
        }
        info!("timeline closed");
    }

    /// Return `true` once [`Timeline::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.shared.closing.load(Ordering::Acquire)
    }

    /// Return `true` if the worker stopped on a panic.
    pub fn is_faulted(&self) -> bool {
        self.shared.faulted.load(Ordering::Acquire)
    }

    /// Return `true` while the pause gate is closed.
    pub fn is_paused(&self) -> bool {
        !*self.shared.running.lock()
    }

    /// Index of the next comment to schedule.
    pub fn cursor(&self) -> usize {
        self.shared.schedule.lock().store.cursor()
    }

    /// Playback position of the last applied sample or seek.
    pub fn last_applied_ms(&self) -> u32 {
        self.shared.schedule.lock().last_ms
    }

    /// Number of stored comments.
    pub fn comment_count(&self) -> usize {
        self.shared.schedule.lock().store.len()
    }

    /// Copy of the stored comments in schedule order.
    pub fn comments(&self) -> Vec<Comment> {
        self.shared.schedule.lock().store.items().to_vec()
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("detached", &self.detached)
            .field("closed", &self.is_closed())
            .field("faulted", &self.is_faulted())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn new(overlay: Arc<Overlay>) -> Self {
        Self {
            overlay,
            schedule: Mutex::new(Schedule::default()),
            pending: Mutex::new(None),
            sample_ready: Condvar::new(),
            running: Mutex::new(true),
            gate: Condvar::new(),
            closing: AtomicBool::new(false),
            seeking: AtomicBool::new(false),
            faulted: AtomicBool::new(false),
            render_enabled: AtomicBool::new(true),
        }
    }

    fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> DanmakuResult<()> {
        if self.is_closing() || self.faulted.load(Ordering::Acquire) {
            return Err(DanmakuError::SchedulerStopped);
        }
        Ok(())
    }

    fn run(&self) {
        info!("timeline worker started");
        match panic::catch_unwind(AssertUnwindSafe(|| self.drain())) {
            Ok(()) => info!("timeline worker exited"),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                error!(panic = %msg, "timeline worker panicked");
                self.faulted.store(true, Ordering::Release);
            }
        }
    }

    fn drain(&self) {
        while !self.is_closing() {
            if let Some(time_ms) = self.next_sample() {
                self.advance_to(time_ms);
            }
        }
    }

    /// Block until a sample is queued and the pause gate is open, then take the sample.
    ///
    /// `None` when closing, or when the queue was cleared while waiting on the gate.
    fn next_sample(&self) -> Option<u32> {
        {
            let mut pending = self.pending.lock();
            while pending.is_none() && !self.is_closing() {
                self.sample_ready.wait(&mut pending);
            }
        }
        {
            let mut running = self.running.lock();
            while !*running && !self.is_closing() {
                self.gate.wait(&mut running);
            }
        }
        if self.is_closing() {
            return None;
        }
        self.pending.lock().take()
    }

    fn advance_to(&self, time_ms: u32) {
        if time_ms == 0 {
            return;
        }
        let mut schedule = self.schedule.lock();
        let last = schedule.last_ms;
        if time_ms < last || time_ms - last > RESEEK_GAP_MS {
            info!(from_ms = last, to_ms = time_ms, "clock jumped, reseeking");
            self.seek_locked(&mut schedule, time_ms);
        } else {
            schedule.last_ms = time_ms;
        }

        let mut subtitle_rendered = false;
        loop {
            if self.is_closing() {
                return;
            }
            if self.seeking.load(Ordering::Acquire) {
                break;
            }
            let Some(comment) = schedule.store.due_mut(time_ms) else {
                break;
            };
            if comment.realtime {
                // Already shown when it was injected.
                comment.realtime = false;
            } else if self.render_enabled.load(Ordering::Acquire) {
                subtitle_rendered |= comment.mode == MotionMode::Subtitle;
                self.overlay
                    .render_comment(LayerId::for_mode(comment.mode), comment);
            }
            schedule.store.advance();
        }

        if let Some(idx) = schedule.restore.take()
            && !subtitle_rendered
            && let Some(subtitle) = schedule.store.get(idx)
        {
            self.overlay.render_comment(LayerId::Subtitle, subtitle);
        }
    }

    fn seek_locked(&self, schedule: &mut Schedule, target_ms: u32) {
        self.stop();
        let cursor = schedule.store.seek_index(target_ms);
        schedule.store.set_cursor(cursor);
        schedule.restore = None;
        if schedule.has_subtitles {
            self.overlay.clear_layer(LayerId::Subtitle);
            schedule.restore = schedule.store.subtitle_to_restore(cursor, target_ms);
        }
        schedule.last_ms = target_ms;
        self.resume();
        debug!(target_ms, cursor, restore = ?schedule.restore, "seek applied");
    }

    fn pause(&self) {
        if self.is_closing() {
            return;
        }
        *self.running.lock() = false;
        self.overlay.pause();
    }

    fn resume(&self) {
        if self.is_closing() {
            return;
        }
        self.overlay.start();
        *self.running.lock() = true;
        self.gate.notify_all();
    }

    fn stop(&self) {
        self.pause();
        self.overlay.stop();
        self.pending.lock().take();
    }
}

#[cfg(test)]
#[path = "../tests/unit/timeline.rs"]
mod tests;

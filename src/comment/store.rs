use crate::comment::model::{Comment, MotionMode};
use crate::foundation::error::{DanmakuError, DanmakuResult};

/// Start-time ordered comment list plus the scheduler's traversal cursor.
///
/// Sortedness is an invariant: bulk inputs are checked, single inserts find their position.
/// The cursor always lies in `0..=len` and points at the next comment that has not been
/// handed to the renderer.
#[derive(Clone, Debug, Default)]
pub struct CommentStore {
    items: Vec<Comment>,
    cursor: usize,
}

impl CommentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored comments.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return `true` when no comments are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stored comments in traversal order.
    pub fn items(&self) -> &[Comment] {
        &self.items
    }

    /// Index of the next comment to schedule.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped into `0..=len`.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.items.len());
    }

    /// Replace every comment and rewind the cursor.
    pub fn replace_all(&mut self, items: Vec<Comment>) -> DanmakuResult<()> {
        ensure_sorted(&items, "comment list")?;
        self.items = items;
        self.cursor = 0;
        Ok(())
    }

    /// Drop every comment and rewind the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    /// Insert before the first comment with a strictly later start, or append.
    ///
    /// Linear in the store length; realtime injection is sparse. Returns the insert position.
    /// A comment landing behind the cursor is never walked, so its realtime flag is cleared
    /// and a later replay shows it normally.
    pub fn insert_sorted(&mut self, mut comment: Comment) -> usize {
        let idx = self
            .items
            .iter()
            .position(|c| c.start_ms > comment.start_ms)
            .unwrap_or(self.items.len());
        if idx < self.cursor {
            comment.realtime = false;
            self.cursor += 1;
        }
        self.items.insert(idx, comment);
        idx
    }

    /// Remove every comment of `mode`, keeping the cursor on the same next comment.
    ///
    /// Returns the number of removed comments.
    pub fn remove_mode(&mut self, mode: MotionMode) -> usize {
        let before = self.items.len();
        let passed = self.items[..self.cursor]
            .iter()
            .filter(|c| c.mode == mode)
            .count();
        self.items.retain(|c| c.mode != mode);
        self.cursor = (self.cursor - passed).min(self.items.len());
        before - self.items.len()
    }

    /// Stable two-pointer merge of a sorted list into the store.
    ///
    /// An existing comment is displaced only by an incoming one with a strictly earlier start,
    /// so on equal starts the existing comments stay first. Incoming comments that start before
    /// `passed_before_ms` are treated as already scheduled and land behind the cursor.
    pub fn merge_sorted(
        &mut self,
        incoming: Vec<Comment>,
        passed_before_ms: u32,
    ) -> DanmakuResult<()> {
        ensure_sorted(&incoming, "merged list")?;
        if incoming.is_empty() {
            return Ok(());
        }

        let passed = incoming
            .iter()
            .filter(|c| c.start_ms < passed_before_ms)
            .count();

        let existing = std::mem::take(&mut self.items);
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        let mut existing = existing.into_iter().peekable();
        let mut incoming = incoming.into_iter().peekable();
        loop {
            let take_incoming = match (existing.peek(), incoming.peek()) {
                (Some(e), Some(i)) => i.start_ms < e.start_ms,
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (None, None) => break,
            };
            let next = if take_incoming {
                incoming.next()
            } else {
                existing.next()
            };
            merged.extend(next);
        }

        self.items = merged;
        self.set_cursor(self.cursor + passed);
        Ok(())
    }

    /// First index whose start is at or after `target_ms`, by linear scan from the front.
    pub fn seek_index(&self, target_ms: u32) -> usize {
        self.items
            .iter()
            .position(|c| c.start_ms >= target_ms)
            .unwrap_or(self.items.len())
    }

    /// The subtitle still on screen at `target_ms` when playback resumes at `cursor`.
    ///
    /// Only the nearest subtitle before `cursor` is considered; it qualifies when its display
    /// interval `[start, start + duration)` contains `target_ms`.
    pub fn subtitle_to_restore(&self, cursor: usize, target_ms: u32) -> Option<usize> {
        let end = cursor.min(self.items.len());
        let idx = self.items[..end]
            .iter()
            .rposition(|c| c.mode == MotionMode::Subtitle)?;
        let c = &self.items[idx];
        let target = u64::from(target_ms);
        (u64::from(c.start_ms) <= target && c.end_ms() > target).then_some(idx)
    }

    /// The comment at the cursor if its start is at or before `time_ms`.
    pub(crate) fn due_mut(&mut self, time_ms: u32) -> Option<&mut Comment> {
        self.items
            .get_mut(self.cursor)
            .filter(|c| c.start_ms <= time_ms)
    }

    /// Step the cursor past the current comment.
    pub(crate) fn advance(&mut self) {
        self.set_cursor(self.cursor + 1);
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&Comment> {
        self.items.get(idx)
    }
}

pub(crate) fn ensure_sorted(items: &[Comment], what: &str) -> DanmakuResult<()> {
    match items.windows(2).position(|w| w[0].start_ms > w[1].start_ms) {
        None => Ok(()),
        Some(i) => Err(DanmakuError::validation(format!(
            "{what} must be sorted by start time (index {} at {} ms follows {} ms)",
            i + 1,
            items[i + 1].start_ms,
            items[i].start_ms
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/comment/store.rs"]
mod tests;

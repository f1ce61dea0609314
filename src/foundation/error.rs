/// Convenience result type for the crate.
pub type DanmakuResult<T> = Result<T, DanmakuError>;

/// Errors surfaced at the public API boundary.
///
/// Device loss, degenerate measurements and per-item render failures are recovered inside the
/// overlay and never reach callers; see [`SurfaceError`] for the collaborator side.
#[derive(thiserror::Error, Debug)]
pub enum DanmakuError {
    /// A layer identifier outside `0..count`.
    #[error("invalid layer {layer}: engine has {count} layers")]
    InvalidLayer {
        /// Rejected identifier.
        layer: u32,
        /// Number of configured layers.
        count: u32,
    },

    /// Rejected input (unsorted lists, out-of-range settings).
    #[error("validation error: {0}")]
    Validation(String),

    /// A rendering surface failure that could not be recovered at the item level.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The scheduler worker has exited (closed or faulted) and no longer accepts samples.
    #[error("scheduler stopped")]
    SchedulerStopped,

    /// Wrapped lower-level error from a collaborator or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DanmakuError {
    /// Build a [`DanmakuError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DanmakuError::InvalidLayer`] value.
    pub fn layer(layer: u32, count: u32) -> Self {
        Self::InvalidLayer { layer, count }
    }
}

/// Failures reported by a [`crate::RenderSurface`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The device backing every sprite was invalidated.
    #[error("rendering device lost")]
    DeviceLost,

    /// Any other failure while preparing or drawing one item.
    #[error("surface operation failed: {0}")]
    Failed(String),
}

impl SurfaceError {
    /// Build a [`SurfaceError::Failed`] value.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Return `true` for [`SurfaceError::DeviceLost`].
    pub fn is_device_lost(&self) -> bool {
        matches!(self, Self::DeviceLost)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

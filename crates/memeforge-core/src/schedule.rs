//! Repaint coalescing.
//!
//! Any number of repaint requests between two animation frames collapse into
//! a single repaint. The host owns the actual frame callback.

/// Tracks whether a repaint is pending.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    dirty: bool,
    frame_requested: bool,
    frames: u64,
}

impl FrameScheduler {
    /// Create an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the surface dirty.
    ///
    /// Returns true when the host must request an animation frame; false when
    /// one is already pending.
    pub fn request(&mut self) -> bool {
        self.dirty = true;
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Whether a repaint is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called from the animation frame. Returns true if a repaint should run.
    pub fn begin_frame(&mut self) -> bool {
        self.frame_requested = false;
        if std::mem::take(&mut self.dirty) {
            self.frames += 1;
            true
        } else {
            false
        }
    }

    /// Number of repaints granted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

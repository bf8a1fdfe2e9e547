//! Frame graph configuration.

use crate::error::{FrameGraphError, FrameGraphResult};

/// Default number of frames in flight.
pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 2;

/// Default pass budget per frame.
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Default resource budget per frame.
pub const DEFAULT_MAX_RESOURCES: usize = 256;

/// Fixed budgets of a [`FrameGraph`](crate::FrameGraph).
///
/// All storage is sized from these values when the graph is created, so a
/// frame never allocates pass slots, resource entries, command lists or
/// semaphores beyond them.
///
/// # Example
///
/// ```
/// use redlilium_frame_graph::FrameGraphConfig;
///
/// let config = FrameGraphConfig::default()
///     .with_frames_in_flight(3)
///     .with_max_passes(32);
/// assert_eq!(config.frames_in_flight, 3);
/// assert_eq!(config.max_resources, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGraphConfig {
    /// Number of rotating per-frame slots.
    pub frames_in_flight: usize,
    /// Maximum passes declared per frame.
    pub max_passes: usize,
    /// Maximum resources (imported and transient) per frame.
    pub max_resources: usize,
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
            max_passes: DEFAULT_MAX_PASSES,
            max_resources: DEFAULT_MAX_RESOURCES,
        }
    }
}

impl FrameGraphConfig {
    /// Set the number of frames in flight.
    pub fn with_frames_in_flight(mut self, frames_in_flight: usize) -> Self {
        self.frames_in_flight = frames_in_flight;
        self
    }

    /// Set the pass budget.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the resource budget.
    pub fn with_max_resources(mut self, max_resources: usize) -> Self {
        self.max_resources = max_resources;
        self
    }

    /// Check that every budget is usable.
    pub fn validate(&self) -> FrameGraphResult<()> {
        if self.frames_in_flight == 0 {
            return Err(FrameGraphError::InvalidConfig(
                "frames_in_flight must be at least 1".into(),
            ));
        }
        if self.max_passes == 0 {
            return Err(FrameGraphError::InvalidConfig(
                "max_passes must be at least 1".into(),
            ));
        }
        if self.max_resources == 0 {
            return Err(FrameGraphError::InvalidConfig(
                "max_resources must be at least 1".into(),
            ));
        }
        if u32::try_from(self.max_passes).is_err() || u32::try_from(self.max_resources).is_err() {
            return Err(FrameGraphError::InvalidConfig(
                "budgets must fit in 32-bit handles".into(),
            ));
        }
        Ok(())
    }
}

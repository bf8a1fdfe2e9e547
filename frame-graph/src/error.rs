//! Frame graph error types.

use thiserror::Error;

use crate::device::DeviceError;
use crate::graph::{PassHandle, ResourceHandle, ResourceKind};

/// Errors that can occur while building, compiling or executing a frame graph.
///
/// Capacity, handle and cycle errors are configuration or programming errors
/// and are never retried. [`FrameGraphError::Device`] carries collaborator
/// failures unchanged so the caller can apply its own recovery policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameGraphError {
    /// The fixed resource budget is exhausted.
    #[error("resource table full: capacity is {capacity} resources")]
    ResourceCapacityExceeded {
        /// Configured resource capacity.
        capacity: usize,
    },

    /// The fixed pass budget is exhausted.
    #[error("pass table full: capacity is {capacity} passes")]
    PassCapacityExceeded {
        /// Configured pass capacity.
        capacity: usize,
    },

    /// The handle was created before the last table reset.
    #[error("stale resource handle {handle:?} (table is at version {current})")]
    StaleHandle {
        /// The rejected handle.
        handle: ResourceHandle,
        /// Version of the current table.
        current: u32,
    },

    /// The handle does not name any entry of the table.
    #[error("invalid resource handle {0:?}")]
    InvalidHandle(ResourceHandle),

    /// A texture operation was applied to a buffer or vice versa.
    #[error("resource {handle:?} is a {actual}, expected a {expected}")]
    ResourceKindMismatch {
        /// The offending handle.
        handle: ResourceHandle,
        /// Kind required by the operation.
        expected: ResourceKind,
        /// Kind stored in the table.
        actual: ResourceKind,
    },

    /// A transient resource was resolved before (or without) being bound to
    /// a GPU object.
    #[error("transient resource '{name}' has not been materialized")]
    ResourceNotMaterialized {
        /// Resource name.
        name: String,
    },

    /// The pass handle does not name a pass of the current frame.
    #[error("invalid pass handle: {0:?}")]
    InvalidPassHandle(PassHandle),

    /// A pass was made to depend on itself.
    #[error("pass cannot depend on itself: {0:?}")]
    SelfDependency(PassHandle),

    /// The surviving passes contain a cycle.
    #[error(
        "render graph contains cyclic dependency: scheduled {scheduled} of {surviving} passes, unresolved: {unresolved:?}"
    )]
    CyclicDependency {
        /// Number of passes placed in the execution order.
        scheduled: usize,
        /// Number of passes that survived culling.
        surviving: usize,
        /// Names of surviving passes that could not be placed.
        unresolved: Vec<String>,
    },

    /// `begin_frame` was called before the previous frame was executed.
    #[error("begin_frame called while a frame is still active")]
    FrameAlreadyActive,

    /// A per-frame operation was called outside `begin_frame` / `execute`.
    #[error("no active frame; call begin_frame first")]
    NoActiveFrame,

    /// A declaration was made after the frame was compiled.
    #[error("frame graph is compiled; declarations are closed until the next begin_frame")]
    AlreadyCompiled,

    /// The frame-in-flight slot index is out of range.
    #[error("frame slot {slot} out of range ({frames_in_flight} frames in flight)")]
    InvalidFrameSlot {
        /// Requested slot.
        slot: usize,
        /// Configured number of slots.
        frames_in_flight: usize,
    },

    /// The frame graph configuration is unusable.
    #[error("invalid frame graph configuration: {0}")]
    InvalidConfig(String),

    /// The device or one of its queues failed.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Result type used throughout the frame graph.
pub type FrameGraphResult<T> = Result<T, FrameGraphError>;

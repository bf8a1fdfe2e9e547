//! Collaborator interfaces consumed by the frame graph.
//!
//! The frame graph does not talk to a GPU API directly. It drives two
//! collaborators:
//!
//! - [`Device`] creates GPU objects (textures, buffers, command lists,
//!   semaphores, fences) and submits recorded work to its queues.
//! - [`ResourceStateTracker`] records the barrier needed to move a resource
//!   into a usage state on a given queue.
//!
//! GPU objects cross this boundary as small `Copy` handles ([`GpuTexture`],
//! [`GpuBuffer`], ...). Backends map the raw value to their native object.
//!
//! # Available Implementations
//!
//! - `dummy` (default feature): [`DummyDevice`] and [`DummyStateTracker`],
//!   no-op collaborators that record every call for tests and benchmarks.

mod error;

#[cfg(feature = "dummy")]
pub mod dummy;

pub use error::DeviceError;

#[cfg(feature = "dummy")]
pub use dummy::{DummyDevice, DummyStateTracker, SubmissionRecord, TransitionRecord};

use crate::types::{BufferDescriptor, QueueType, ResourceState, TextureDescriptor};

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend-specific raw handle.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the backend-specific raw handle.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

gpu_handle!(
    /// Handle to a live GPU texture.
    GpuTexture
);
gpu_handle!(
    /// Handle to a live GPU buffer.
    GpuBuffer
);
gpu_handle!(
    /// Handle to a recording object (command buffer / command list).
    GpuCommandList
);
gpu_handle!(
    /// Handle to a GPU-GPU synchronization primitive.
    GpuSemaphore
);
gpu_handle!(
    /// Handle to a CPU-GPU synchronization primitive.
    GpuFence
);

/// A live GPU resource as seen by the state tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResource {
    /// A texture.
    Texture(GpuTexture),
    /// A buffer.
    Buffer(GpuBuffer),
}

/// One queue submission.
///
/// `command_list` is `None` for an empty submission that only signals
/// (used when every pass of a frame was culled but the frame fence must
/// still be signaled).
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    /// Recorded work to execute.
    pub command_list: Option<GpuCommandList>,
    /// Semaphores the queue waits on before starting.
    pub wait_semaphores: &'a [GpuSemaphore],
    /// Semaphores signaled when the work completes.
    pub signal_semaphores: &'a [GpuSemaphore],
    /// Fence signaled when the work completes.
    pub signal_fence: Option<GpuFence>,
}

/// GPU device abstraction.
///
/// Methods take `&self`; implementations use interior mutability where they
/// need it, mirroring native device objects that are freely shared.
pub trait Device {
    /// Human readable device name.
    fn name(&self) -> &str;

    /// Create a texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, DeviceError>;

    /// Create a buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, DeviceError>;

    /// Destroy a texture created by this device.
    fn destroy_texture(&self, texture: GpuTexture);

    /// Destroy a buffer created by this device.
    fn destroy_buffer(&self, buffer: GpuBuffer);

    /// Create a recording object.
    fn create_command_list(&self) -> Result<GpuCommandList, DeviceError>;

    /// Create a semaphore.
    fn create_semaphore(&self) -> Result<GpuSemaphore, DeviceError>;

    /// Create a fence, optionally already signaled.
    fn create_fence(&self, signaled: bool) -> Result<GpuFence, DeviceError>;

    /// Reset `command_list` and start recording work destined for `queue`.
    fn begin_command_list(
        &self,
        command_list: GpuCommandList,
        queue: QueueType,
    ) -> Result<(), DeviceError>;

    /// Finish recording.
    fn end_command_list(&self, command_list: GpuCommandList) -> Result<(), DeviceError>;

    /// Block until `fence` is signaled.
    fn wait_fence(&self, fence: GpuFence) -> Result<(), DeviceError>;

    /// Return `fence` to the unsignaled state.
    fn reset_fence(&self, fence: GpuFence) -> Result<(), DeviceError>;

    /// Submit work to a queue.
    fn submit(&self, queue: QueueType, submission: &Submission<'_>) -> Result<(), DeviceError>;
}

/// Emits resource state transitions.
///
/// The tracker owns the knowledge of each resource's current state; the
/// frame graph only states where a resource must be before a pass runs.
pub trait ResourceStateTracker {
    /// Start tracking `resource`, assuming it is currently in `state`.
    ///
    /// Called for every transient object the frame graph binds, each frame,
    /// before any pass touches it.
    fn register(&mut self, resource: GpuResource, state: ResourceState);

    /// Record the barrier that moves `resource` to `target` into
    /// `command_list`, which will execute on `queue`.
    fn transition(
        &mut self,
        command_list: GpuCommandList,
        resource: GpuResource,
        target: ResourceState,
        queue: QueueType,
    );
}

static_assertions::assert_eq_size!(GpuTexture, u64);
static_assertions::assert_impl_all!(Submission<'static>: Send, Sync);

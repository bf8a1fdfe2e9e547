//! # RedLilium Frame Graph
//!
//! Per-frame pass scheduler for RedLilium.
//!
//! ## Overview
//!
//! Each frame, passes declare the resources they read and write. The
//! [`FrameGraph`] then:
//! - Derives producer to consumer dependencies from the declarations
//! - Culls passes that feed no side-effect pass
//! - Orders the survivors topologically, rejecting cycles
//! - Binds transient resources to per-slot pooled GPU objects
//! - Transitions resources through a [`ResourceStateTracker`] and submits
//!   every pass with semaphore waits along dependency edges
//!
//! The GPU API itself is behind the [`Device`] trait. The `dummy` feature
//! (on by default) provides [`DummyDevice`] and [`DummyStateTracker`] for
//! tests and benchmarks.
//!
//! ## Example
//!
//! ```
//! use redlilium_frame_graph::{
//!     DummyDevice, DummyStateTracker, FrameGraph, FrameGraphConfig, GpuTexture, ResourceState,
//!     TextureDescriptor, TextureFormat, TextureUsage,
//! };
//!
//! let mut graph = FrameGraph::new(
//!     DummyDevice::new(),
//!     DummyStateTracker::new(),
//!     FrameGraphConfig::default(),
//! )?;
//! graph.set_viewport(1280, 720);
//!
//! graph.begin_frame(0)?;
//! let backbuffer = graph.import_texture("Backbuffer", GpuTexture::from_raw(1))?;
//! graph.add_pass(
//!     "scene",
//!     |_, builder| {
//!         let color = builder.create_transient_texture(
//!             "SceneColor",
//!             TextureDescriptor::viewport_sized(
//!                 TextureFormat::Rgba16Float,
//!                 TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
//!             ),
//!         )?;
//!         builder.write_texture(color, ResourceState::RenderTarget)
//!     },
//!     |_, _ctx| Ok(()),
//! )?;
//! let scene_color = graph.get_resource("SceneColor").expect("declared above");
//! graph.add_pass(
//!     "present",
//!     move |_, builder| {
//!         builder.read_texture(scene_color, ResourceState::ShaderRead)?;
//!         builder.write_texture(backbuffer, ResourceState::Present)?;
//!         builder.has_side_effects();
//!         Ok(())
//!     },
//!     |_, _ctx| Ok(()),
//! )?;
//! graph.execute()?;
//!
//! assert_eq!(graph.execution_order().len(), 2);
//! # Ok::<(), redlilium_frame_graph::FrameGraphError>(())
//! ```

mod compiler;
pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod profiling;
mod scheduler;
mod transient;
pub mod types;

pub use config::FrameGraphConfig;
pub use device::{
    Device, DeviceError, GpuBuffer, GpuCommandList, GpuFence, GpuResource, GpuSemaphore,
    GpuTexture, ResourceStateTracker, Submission,
};
pub use error::{FrameGraphError, FrameGraphResult};
pub use graph::{
    FrameGraph, FrameInfo, FrameStats, PassBuilder, PassContext, PassHandle, ResourceAccess,
    ResourceDependency, ResourceHandle, ResourceKind,
};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, QueueType, ResourceState, TextureDescriptor,
    TextureFormat, TextureUsage,
};

#[cfg(feature = "dummy")]
pub use device::{DummyDevice, DummyStateTracker};

/// Frame graph library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the frame graph subsystem.
///
/// Only logs the library version; kept for symmetry with the other
/// RedLilium crates.
pub fn init() {
    log::info!("RedLilium Frame Graph v{} initialized", VERSION);
}

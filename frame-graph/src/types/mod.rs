//! Common types and descriptors for frame graph resources.
//!
//! This module contains format enums, usage flags, descriptor structs and the
//! queue/state vocabulary shared by the graph and its collaborators.

mod buffer;
mod common;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::{Extent3d, QueueType, ResourceState};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};

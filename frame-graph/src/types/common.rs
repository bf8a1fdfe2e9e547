//! Common types shared across the frame graph.

// ============================================================================
// Extent3d
// ============================================================================

/// 3D extent for textures and viewports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels (1 for 2D textures).
    pub depth: u32,
}

impl Extent3d {
    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }
}

// ============================================================================
// Queues
// ============================================================================

/// Execution queue a pass is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueType {
    /// Graphics queue (draws, plus everything else).
    #[default]
    Graphics,
    /// Async compute queue.
    Compute,
    /// Dedicated copy queue.
    Transfer,
}

impl QueueType {
    /// Short name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::Graphics => "graphics",
            Self::Compute => "compute",
            Self::Transfer => "transfer",
        }
    }
}

// ============================================================================
// Resource states
// ============================================================================

/// GPU usage state a resource is transitioned into before a pass runs.
///
/// The frame graph never interprets these beyond handing them to the
/// [`ResourceStateTracker`](crate::device::ResourceStateTracker), which maps
/// them to layouts, access masks and pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// Contents undefined. Initial state of freshly bound transient objects.
    #[default]
    Undefined,
    /// General layout usable by any access.
    Common,
    /// Color attachment write.
    RenderTarget,
    /// Depth/stencil attachment write.
    DepthWrite,
    /// Depth/stencil read-only (sampling and depth testing).
    DepthRead,
    /// Sampled or read in a shader.
    ShaderRead,
    /// Storage (unordered) read/write access.
    StorageReadWrite,
    /// Source of a copy.
    CopySrc,
    /// Destination of a copy.
    CopyDst,
    /// Ready for presentation.
    Present,
    /// Vertex buffer input.
    VertexBuffer,
    /// Index buffer input.
    IndexBuffer,
    /// Uniform (constant) buffer.
    UniformBuffer,
    /// Indirect draw/dispatch arguments.
    IndirectArgument,
}

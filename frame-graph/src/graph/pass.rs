//! Pass declarations and the builder used inside setup callbacks.

use crate::error::FrameGraphResult;
use crate::graph::context::PassContext;
use crate::graph::resource::{ResourceAccess, ResourceHandle, ResourceKind, ResourceTable};
use crate::types::{BufferDescriptor, QueueType, ResourceState, TextureDescriptor};

/// Handle to a pass in the frame graph.
///
/// `PassHandle` is `Copy` and cheap to pass around. It is only valid for the
/// frame that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassHandle(u32);

impl PassHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Declaration index of the pass within its frame.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resource use declared by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDependency {
    /// The resource.
    pub handle: ResourceHandle,
    /// How the pass accesses it.
    pub access: ResourceAccess,
    /// State the resource must be in when the pass runs.
    ///
    /// [`ResourceState::Undefined`] requests no transition.
    pub state: ResourceState,
}

pub(crate) type ExecuteFn = Box<dyn FnOnce(&mut PassContext<'_>) -> FrameGraphResult<()>>;

/// Storage for one declared pass, reused in place across frames.
pub(crate) struct PassNode {
    pub(crate) name: String,
    pub(crate) queue: QueueType,
    pub(crate) side_effects: bool,
    pub(crate) inputs: Vec<ResourceDependency>,
    pub(crate) outputs: Vec<ResourceDependency>,
    pub(crate) depends_on: Vec<PassHandle>,
    pub(crate) dependents: Vec<PassHandle>,
    pub(crate) culled: bool,
    /// Position in the execution order. `None` while culled or unsorted.
    pub(crate) execution_index: Option<u32>,
    pub(crate) execute: Option<ExecuteFn>,
}

impl PassNode {
    pub(crate) fn new() -> Self {
        Self {
            name: String::new(),
            queue: QueueType::Graphics,
            side_effects: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
            dependents: Vec::new(),
            culled: true,
            execution_index: None,
            execute: None,
        }
    }

    /// Clear the node for a new declaration, keeping vector capacity.
    pub(crate) fn reset(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
        self.queue = QueueType::Graphics;
        self.side_effects = false;
        self.inputs.clear();
        self.outputs.clear();
        self.depends_on.clear();
        self.dependents.clear();
        self.culled = true;
        self.execution_index = None;
        self.execute = None;
    }

    /// Record `dependency -> self`, ignoring duplicates.
    ///
    /// Returns `true` if the edge is new.
    pub(crate) fn add_depends_on(&mut self, dependency: PassHandle) -> bool {
        if self.depends_on.contains(&dependency) {
            return false;
        }
        self.depends_on.push(dependency);
        true
    }
}

impl std::fmt::Debug for PassNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassNode")
            .field("name", &self.name)
            .field("queue", &self.queue)
            .field("side_effects", &self.side_effects)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("culled", &self.culled)
            .field("execution_index", &self.execution_index)
            .finish()
    }
}

/// Declares the resource usage of one pass.
///
/// A builder only exists inside the setup callback given to
/// [`FrameGraph::add_pass`](crate::FrameGraph::add_pass). Every use is
/// validated against the resource table immediately. Lifetime windows are
/// only extended once setup returns successfully.
///
/// # Example
///
/// ```ignore
/// graph.add_pass("scene", |_, builder| {
///     let shadow = builder.read_texture(shadow_map, ResourceState::ShaderRead)?;
///     let color = builder.create_transient_texture("SceneColor", color_desc)?;
///     builder.write_texture(color, ResourceState::RenderTarget)?;
///     Ok((shadow, color))
/// }, |&(shadow, color), ctx| {
///     let color = ctx.resolve_texture(color)?;
///     // record draws
///     Ok(())
/// })?;
/// ```
pub struct PassBuilder<'a> {
    pass: PassHandle,
    node: &'a mut PassNode,
    resources: &'a mut ResourceTable,
}

impl<'a> PassBuilder<'a> {
    pub(crate) fn new(
        pass: PassHandle,
        node: &'a mut PassNode,
        resources: &'a mut ResourceTable,
    ) -> Self {
        Self {
            pass,
            node,
            resources,
        }
    }

    /// Handle of the pass being declared.
    pub fn pass(&self) -> PassHandle {
        self.pass
    }

    /// Name of the pass being declared.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Declare that the pass reads a texture in `state`.
    pub fn read_texture(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.declare(handle, ResourceKind::Texture, ResourceAccess::Read, state)
    }

    /// Declare that the pass writes a texture in `state`.
    pub fn write_texture(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.declare(handle, ResourceKind::Texture, ResourceAccess::Write, state)
    }

    /// Declare that the pass reads and writes a texture in `state`.
    pub fn read_write_texture(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.declare(handle, ResourceKind::Texture, ResourceAccess::ReadWrite, state)
    }

    /// Declare that the pass reads a buffer in `state`.
    pub fn read_buffer(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.declare(handle, ResourceKind::Buffer, ResourceAccess::Read, state)
    }

    /// Declare that the pass writes a buffer in `state`.
    pub fn write_buffer(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.declare(handle, ResourceKind::Buffer, ResourceAccess::Write, state)
    }

    /// Declare that the pass reads and writes a buffer in `state`.
    pub fn read_write_buffer(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.declare(handle, ResourceKind::Buffer, ResourceAccess::ReadWrite, state)
    }

    /// Create a transient texture produced by this pass.
    ///
    /// The pass is recorded as the texture's first writer. Declare the
    /// concrete usage with [`write_texture`](Self::write_texture) to get a
    /// transition into a specific state.
    pub fn create_transient_texture(
        &mut self,
        name: &str,
        descriptor: TextureDescriptor,
    ) -> FrameGraphResult<ResourceHandle> {
        let handle = self.resources.create_transient_texture(name, descriptor)?;
        self.anchor(handle)
    }

    /// Create a transient buffer produced by this pass.
    pub fn create_transient_buffer(
        &mut self,
        name: &str,
        descriptor: BufferDescriptor,
    ) -> FrameGraphResult<ResourceHandle> {
        let handle = self.resources.create_transient_buffer(name, descriptor)?;
        self.anchor(handle)
    }

    /// Mark the pass as having effects outside the graph.
    ///
    /// Side-effect passes are never culled and keep everything they depend
    /// on alive.
    pub fn has_side_effects(&mut self) {
        self.node.side_effects = true;
    }

    /// Select the queue the pass is submitted to.
    pub fn set_queue(&mut self, queue: QueueType) {
        self.node.queue = queue;
    }

    /// Look up a resource of the current frame by name.
    pub fn resource(&self, name: &str) -> Option<ResourceHandle> {
        self.resources.find(name)
    }

    /// Extend the lifetime window of every declared resource to this pass.
    pub(crate) fn finish(self) -> FrameGraphResult<()> {
        for dependency in self.node.inputs.iter().chain(&self.node.outputs) {
            self.resources.update_lifetime(dependency.handle, self.pass)?;
        }
        Ok(())
    }

    fn anchor(&mut self, handle: ResourceHandle) -> FrameGraphResult<ResourceHandle> {
        self.node.outputs.push(ResourceDependency {
            handle,
            access: ResourceAccess::Write,
            state: ResourceState::Undefined,
        });
        Ok(handle)
    }

    fn declare(
        &mut self,
        handle: ResourceHandle,
        kind: ResourceKind,
        access: ResourceAccess,
        state: ResourceState,
    ) -> FrameGraphResult<ResourceHandle> {
        self.resources.expect_kind(handle, kind)?;

        let dependency = ResourceDependency {
            handle,
            access,
            state,
        };
        if access.reads() {
            self.node.inputs.push(dependency);
        }
        if access.writes() {
            self.node.outputs.push(dependency);
        }
        Ok(handle)
    }
}

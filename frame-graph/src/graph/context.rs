//! Per-frame information and the context handed to execute callbacks.

use crate::device::{
    Device, GpuBuffer, GpuCommandList, GpuResource, GpuTexture, ResourceStateTracker,
};
use crate::error::FrameGraphResult;
use crate::graph::resource::{ResourceHandle, ResourceTable};
use crate::types::{Extent3d, QueueType, ResourceState};

/// Information about the frame being built, passed to setup callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frame-in-flight slot of this frame.
    pub slot: usize,
    /// Monotonic count of frames begun by this graph.
    pub frame_index: u64,
    /// Extent used for viewport-sized transient textures.
    pub viewport: Extent3d,
}

/// Everything a pass needs while recording.
///
/// Declared resources are already in their declared states when the
/// execute callback runs.
pub struct PassContext<'a> {
    device: &'a dyn Device,
    tracker: &'a mut dyn ResourceStateTracker,
    resources: &'a ResourceTable,
    command_list: GpuCommandList,
    queue: QueueType,
    pass_name: &'a str,
    frame: &'a FrameInfo,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(
        device: &'a dyn Device,
        tracker: &'a mut dyn ResourceStateTracker,
        resources: &'a ResourceTable,
        command_list: GpuCommandList,
        queue: QueueType,
        pass_name: &'a str,
        frame: &'a FrameInfo,
    ) -> Self {
        Self {
            device,
            tracker,
            resources,
            command_list,
            queue,
            pass_name,
            frame,
        }
    }

    /// The device that owns the command list.
    pub fn device(&self) -> &dyn Device {
        self.device
    }

    /// The state tracker, for transitions beyond the declared ones.
    pub fn tracker(&mut self) -> &mut dyn ResourceStateTracker {
        &mut *self.tracker
    }

    /// Command list being recorded for this pass.
    pub fn command_list(&self) -> GpuCommandList {
        self.command_list
    }

    /// Queue this pass is submitted to.
    pub fn queue(&self) -> QueueType {
        self.queue
    }

    /// Name of the executing pass.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// Frame the pass belongs to.
    pub fn frame(&self) -> &FrameInfo {
        self.frame
    }

    /// Resolve a texture handle to its live GPU object.
    pub fn resolve_texture(&self, handle: ResourceHandle) -> FrameGraphResult<GpuTexture> {
        self.resources.resolve_texture(handle)
    }

    /// Resolve a buffer handle to its live GPU object.
    pub fn resolve_buffer(&self, handle: ResourceHandle) -> FrameGraphResult<GpuBuffer> {
        self.resources.resolve_buffer(handle)
    }

    /// Look up a resource of the current frame by name.
    pub fn get_resource(&self, name: &str) -> Option<ResourceHandle> {
        self.resources.find(name)
    }

    /// Transition a resource into `state` within this pass's command list.
    pub fn transition(
        &mut self,
        handle: ResourceHandle,
        state: ResourceState,
    ) -> FrameGraphResult<()> {
        let resource: GpuResource = self.resources.resolve(handle)?;
        self.tracker
            .transition(self.command_list, resource, state, self.queue);
        Ok(())
    }
}

impl std::fmt::Debug for PassContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassContext")
            .field("pass_name", &self.pass_name)
            .field("command_list", &self.command_list)
            .field("queue", &self.queue)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::device::{DummyDevice, DummyStateTracker};

    #[test]
    fn test_context_resolves_and_transitions() {
        let device = DummyDevice::new();
        let mut tracker = DummyStateTracker::new();
        let mut table = ResourceTable::new(4);
        let texture = GpuTexture::from_raw(11);
        let handle = table.import_texture("swapchain", texture).unwrap();
        let command_list = device.create_command_list().unwrap();
        let frame = FrameInfo {
            slot: 0,
            frame_index: 1,
            viewport: Extent3d::new_2d(1280, 720),
        };

        let mut ctx = PassContext::new(
            &device,
            &mut tracker,
            &table,
            command_list,
            QueueType::Graphics,
            "present",
            &frame,
        );
        assert_eq!(ctx.resolve_texture(handle), Ok(texture));
        assert_eq!(ctx.get_resource("swapchain"), Some(handle));
        assert!(ctx.resolve_buffer(handle).is_err());
        ctx.transition(handle, ResourceState::Present).unwrap();
        assert_eq!(ctx.pass_name(), "present");
        assert_eq!(ctx.frame().viewport.width, 1280);

        assert_eq!(
            tracker.state(GpuResource::Texture(texture)),
            Some(ResourceState::Present)
        );
    }
}

//! Dummy collaborators for testing and development.
//!
//! [`DummyDevice`] doesn't perform actual GPU operations but provides a
//! valid [`Device`] implementation that records what the frame graph asks
//! for. Submissions complete immediately, so fences are signaled as soon as
//! they are submitted. [`DummyStateTracker`] keeps the current state of each
//! resource and records every real transition.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use super::{
    Device, DeviceError, GpuBuffer, GpuCommandList, GpuFence, GpuResource, GpuSemaphore,
    GpuTexture, ResourceStateTracker, Submission,
};
use crate::types::{BufferDescriptor, QueueType, ResourceState, TextureDescriptor};

/// A submission as observed by the dummy device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// Target queue.
    pub queue: QueueType,
    /// Submitted recording, if any.
    pub command_list: Option<GpuCommandList>,
    /// Semaphores waited on.
    pub wait_semaphores: Vec<GpuSemaphore>,
    /// Semaphores signaled.
    pub signal_semaphores: Vec<GpuSemaphore>,
    /// Fence signaled.
    pub signal_fence: Option<GpuFence>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u64,
    textures: HashMap<GpuTexture, TextureDescriptor>,
    buffers: HashMap<GpuBuffer, BufferDescriptor>,
    textures_created: usize,
    buffers_created: usize,
    command_lists: HashSet<GpuCommandList>,
    recording: HashMap<GpuCommandList, QueueType>,
    recorded: Vec<GpuCommandList>,
    semaphores: usize,
    fences: HashMap<GpuFence, bool>,
    submissions: Vec<SubmissionRecord>,
    fail_next_submit: Option<DeviceError>,
    fail_next_allocation: Option<DeviceError>,
}

impl DummyState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Dummy GPU device.
#[derive(Debug, Default)]
pub struct DummyDevice {
    state: Mutex<DummyState>,
}

impl DummyDevice {
    /// Create a new dummy device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of textures created so far.
    pub fn textures_created(&self) -> usize {
        self.state.lock().textures_created
    }

    /// Total number of buffers created so far.
    pub fn buffers_created(&self) -> usize {
        self.state.lock().buffers_created
    }

    /// Number of textures currently alive.
    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Number of buffers currently alive.
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Descriptor a texture was created with.
    pub fn texture_descriptor(&self, texture: GpuTexture) -> Option<TextureDescriptor> {
        self.state.lock().textures.get(&texture).cloned()
    }

    /// Descriptor a buffer was created with.
    pub fn buffer_descriptor(&self, buffer: GpuBuffer) -> Option<BufferDescriptor> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    /// Number of command lists created so far.
    pub fn command_lists_created(&self) -> usize {
        self.state.lock().command_lists.len()
    }

    /// Number of semaphores created so far.
    pub fn semaphores_created(&self) -> usize {
        self.state.lock().semaphores
    }

    /// Command lists in the order their recording finished.
    pub fn recorded_command_lists(&self) -> Vec<GpuCommandList> {
        self.state.lock().recorded.clone()
    }

    /// All submissions in submission order.
    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.state.lock().submissions.clone()
    }

    /// Forget recorded submissions and command lists.
    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.submissions.clear();
        state.recorded.clear();
    }

    /// Check if a fence is signaled (non-blocking).
    pub fn is_fence_signaled(&self, fence: GpuFence) -> bool {
        self.state.lock().fences.get(&fence).copied().unwrap_or(false)
    }

    /// Make the next [`Device::submit`] call fail with `error`.
    pub fn fail_next_submit(&self, error: DeviceError) {
        self.state.lock().fail_next_submit = Some(error);
    }

    /// Make the next texture or buffer creation fail with `error`.
    pub fn fail_next_allocation(&self, error: DeviceError) {
        self.state.lock().fail_next_allocation = Some(error);
    }
}

impl Device for DummyDevice {
    fn name(&self) -> &str {
        "Dummy Device"
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, DeviceError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next_allocation.take() {
            return Err(error);
        }
        let texture = GpuTexture::from_raw(state.next_id());
        state.textures.insert(texture, descriptor.clone());
        state.textures_created += 1;
        log::trace!(
            "DummyDevice: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        Ok(texture)
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, DeviceError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next_allocation.take() {
            return Err(error);
        }
        let buffer = GpuBuffer::from_raw(state.next_id());
        state.buffers.insert(buffer, descriptor.clone());
        state.buffers_created += 1;
        log::trace!(
            "DummyDevice: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        Ok(buffer)
    }

    fn destroy_texture(&self, texture: GpuTexture) {
        self.state.lock().textures.remove(&texture);
    }

    fn destroy_buffer(&self, buffer: GpuBuffer) {
        self.state.lock().buffers.remove(&buffer);
    }

    fn create_command_list(&self) -> Result<GpuCommandList, DeviceError> {
        let mut state = self.state.lock();
        let command_list = GpuCommandList::from_raw(state.next_id());
        state.command_lists.insert(command_list);
        Ok(command_list)
    }

    fn create_semaphore(&self) -> Result<GpuSemaphore, DeviceError> {
        let mut state = self.state.lock();
        state.semaphores += 1;
        Ok(GpuSemaphore::from_raw(state.next_id()))
    }

    fn create_fence(&self, signaled: bool) -> Result<GpuFence, DeviceError> {
        let mut state = self.state.lock();
        let fence = GpuFence::from_raw(state.next_id());
        state.fences.insert(fence, signaled);
        Ok(fence)
    }

    fn begin_command_list(
        &self,
        command_list: GpuCommandList,
        queue: QueueType,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if !state.command_lists.contains(&command_list) {
            return Err(DeviceError::InvalidParameter(format!(
                "unknown command list {command_list:?}"
            )));
        }
        if state.recording.insert(command_list, queue).is_some() {
            return Err(DeviceError::InvalidParameter(format!(
                "command list {command_list:?} is already recording"
            )));
        }
        Ok(())
    }

    fn end_command_list(&self, command_list: GpuCommandList) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if state.recording.remove(&command_list).is_none() {
            return Err(DeviceError::InvalidParameter(format!(
                "command list {command_list:?} is not recording"
            )));
        }
        state.recorded.push(command_list);
        Ok(())
    }

    fn wait_fence(&self, fence: GpuFence) -> Result<(), DeviceError> {
        // Submissions complete immediately, so an unsignaled fence here
        // would never be signaled.
        match self.state.lock().fences.get(&fence) {
            Some(true) => Ok(()),
            Some(false) => Err(DeviceError::Internal(format!(
                "waiting on fence {fence:?} that was never submitted"
            ))),
            None => Err(DeviceError::InvalidParameter(format!(
                "unknown fence {fence:?}"
            ))),
        }
    }

    fn reset_fence(&self, fence: GpuFence) -> Result<(), DeviceError> {
        match self.state.lock().fences.get_mut(&fence) {
            Some(signaled) => {
                *signaled = false;
                Ok(())
            }
            None => Err(DeviceError::InvalidParameter(format!(
                "unknown fence {fence:?}"
            ))),
        }
    }

    fn submit(&self, queue: QueueType, submission: &Submission<'_>) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next_submit.take() {
            return Err(error);
        }
        if let Some(command_list) = submission.command_list
            && state.recording.contains_key(&command_list)
        {
            return Err(DeviceError::SubmissionFailed(format!(
                "command list {command_list:?} is still recording"
            )));
        }

        log::trace!(
            "DummyDevice: submit {:?} to {} queue (wait {}, signal {})",
            submission.command_list,
            queue.name(),
            submission.wait_semaphores.len(),
            submission.signal_semaphores.len()
        );

        state.submissions.push(SubmissionRecord {
            queue,
            command_list: submission.command_list,
            wait_semaphores: submission.wait_semaphores.to_vec(),
            signal_semaphores: submission.signal_semaphores.to_vec(),
            signal_fence: submission.signal_fence,
        });

        // Signal the fence immediately since we don't do real GPU work
        if let Some(fence) = submission.signal_fence {
            state.fences.insert(fence, true);
        }
        Ok(())
    }
}

/// A transition as observed by the dummy state tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Command list the barrier was recorded into.
    pub command_list: GpuCommandList,
    /// Transitioned resource.
    pub resource: GpuResource,
    /// State before the barrier.
    pub from: ResourceState,
    /// State after the barrier.
    pub to: ResourceState,
    /// Queue the command list executes on.
    pub queue: QueueType,
}

/// Dummy resource state tracker.
///
/// Transitions into the state a resource is already in are elided and not
/// recorded. Resources that were never registered are assumed to start in
/// [`ResourceState::Undefined`].
#[derive(Debug, Default)]
pub struct DummyStateTracker {
    states: HashMap<GpuResource, ResourceState>,
    transitions: Vec<TransitionRecord>,
    registrations: usize,
}

impl DummyStateTracker {
    /// Create a new tracker with no known resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a resource, if known.
    pub fn state(&self, resource: GpuResource) -> Option<ResourceState> {
        self.states.get(&resource).copied()
    }

    /// All recorded transitions in order.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Number of [`ResourceStateTracker::register`] calls.
    pub fn registrations(&self) -> usize {
        self.registrations
    }

    /// Forget recorded transitions, keeping current states.
    pub fn clear_history(&mut self) {
        self.transitions.clear();
        self.registrations = 0;
    }
}

impl ResourceStateTracker for DummyStateTracker {
    fn register(&mut self, resource: GpuResource, state: ResourceState) {
        self.registrations += 1;
        self.states.insert(resource, state);
    }

    fn transition(
        &mut self,
        command_list: GpuCommandList,
        resource: GpuResource,
        target: ResourceState,
        queue: QueueType,
    ) {
        let current = self.states.entry(resource).or_default();
        if *current == target {
            return;
        }
        self.transitions.push(TransitionRecord {
            command_list,
            resource,
            from: *current,
            to: target,
            queue,
        });
        *current = target;
    }
}

static_assertions::assert_impl_all!(DummyDevice: Send, Sync);

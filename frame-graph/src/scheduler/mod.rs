//! Recording and submission of a compiled frame.
//!
//! Every frame-in-flight slot owns a [`SubmissionPool`]: one command list
//! and one semaphore per pass of the pass budget, created up front, plus
//! the slot's frame-completion fence. The pass at execution index `i` uses
//! command list `i` and semaphore `i`, so assignment never allocates.
//!
//! Submission follows the execution order. Each pass waits on the
//! semaphores of its scheduled direct dependencies and signals its own
//! semaphore. The last submission of the frame also signals the fence.
//! A slot only waits on its fence once a fence-signaling submission has
//! been accepted by the device.

use crate::device::{
    Device, GpuCommandList, GpuFence, GpuSemaphore, ResourceStateTracker, Submission,
};
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::graph::pass::{PassNode, ResourceDependency};
use crate::graph::resource::ResourceTable;
use crate::graph::{FrameInfo, PassContext, PassHandle};
use crate::types::{QueueType, ResourceState};

/// Pre-allocated synchronization and recording objects of one slot.
#[derive(Debug)]
pub(crate) struct SubmissionPool {
    slot: usize,
    fence: GpuFence,
    command_lists: Vec<GpuCommandList>,
    semaphores: Vec<GpuSemaphore>,
    assigned: usize,
    /// A submitted frame will signal the fence.
    pending: bool,
}

impl SubmissionPool {
    /// Create the pool for `slot`, sized to `capacity` passes.
    ///
    /// The fence starts signaled and nothing is pending, so the first wait
    /// on a fresh slot returns immediately.
    pub(crate) fn new(device: &dyn Device, slot: usize, capacity: usize) -> FrameGraphResult<Self> {
        let fence = device.create_fence(true)?;
        let mut command_lists = Vec::with_capacity(capacity);
        let mut semaphores = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            command_lists.push(device.create_command_list()?);
            semaphores.push(device.create_semaphore()?);
        }
        log::debug!(
            "FrameGraph: slot {} created {} command lists and semaphores",
            slot,
            capacity
        );
        Ok(Self {
            slot,
            fence,
            command_lists,
            semaphores,
            assigned: 0,
            pending: false,
        })
    }

    pub(crate) fn fence(&self) -> GpuFence {
        self.fence
    }

    pub(crate) fn capacity(&self) -> usize {
        self.command_lists.len()
    }

    /// Number of command lists handed out for the current frame.
    #[cfg(test)]
    pub(crate) fn assigned(&self) -> usize {
        self.assigned
    }

    /// Block until the last frame submitted on this slot has completed.
    ///
    /// Returns immediately when no fence signal is pending, for example
    /// after the device rejected the frame's final submission.
    pub(crate) fn wait(&self, device: &dyn Device) -> FrameGraphResult<()> {
        if !self.pending {
            return Ok(());
        }
        log::trace!("FrameGraph: waiting for slot {} fence", self.slot);
        device.wait_fence(self.fence)?;
        Ok(())
    }

    /// Rewind the cursor for a new frame.
    pub(crate) fn reset(&mut self) {
        self.assigned = 0;
    }

    /// Hand out the first `count` command lists and semaphores.
    pub(crate) fn assign(&mut self, count: usize) -> FrameGraphResult<()> {
        if count > self.capacity() {
            return Err(FrameGraphError::PassCapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.assigned = count;
        Ok(())
    }

    fn command_list(&self, position: usize) -> GpuCommandList {
        self.command_lists[position]
    }

    pub(crate) fn semaphore(&self, position: usize) -> GpuSemaphore {
        self.semaphores[position]
    }

    /// Reset the fence and submit the frame's final work, recording whether
    /// the device accepted it.
    fn submit_final(
        &mut self,
        device: &dyn Device,
        queue: QueueType,
        submission: &Submission<'_>,
    ) -> FrameGraphResult<()> {
        self.pending = false;
        device.reset_fence(self.fence)?;
        if let Err(err) = device.submit(queue, submission) {
            log::warn!(
                "FrameGraph: slot {} final submission failed, fence left unsignaled: {}",
                self.slot,
                err
            );
            return Err(err.into());
        }
        self.pending = true;
        Ok(())
    }
}

/// Record every scheduled pass into its assigned command list.
///
/// Declared resources are transitioned before the execute callback runs.
/// When a handle is declared more than once by the same pass, only its
/// last declaration is applied.
pub(crate) fn record(
    device: &dyn Device,
    tracker: &mut dyn ResourceStateTracker,
    resources: &ResourceTable,
    passes: &mut [PassNode],
    order: &[PassHandle],
    pool: &SubmissionPool,
    frame: &FrameInfo,
) -> FrameGraphResult<()> {
    for (position, &handle) in order.iter().enumerate() {
        let command_list = pool.command_list(position);
        let node = &mut passes[handle.index()];
        crate::profile_scope_dynamic!(node.name.as_str());
        log::trace!(
            "FrameGraph: recording pass '{}' into {:?} ({} queue)",
            node.name,
            command_list,
            node.queue.name()
        );

        device.begin_command_list(command_list, node.queue)?;

        // The command list is ended even when the pass fails.
        let mut result = transition_declared(tracker, resources, node, command_list);
        if result.is_ok()
            && let Some(execute) = node.execute.take()
        {
            let mut ctx = PassContext::new(
                device,
                &mut *tracker,
                resources,
                command_list,
                node.queue,
                &node.name,
                frame,
            );
            result = execute(&mut ctx);
        }
        let ended = device.end_command_list(command_list);
        result?;
        ended?;
    }
    Ok(())
}

fn transition_declared(
    tracker: &mut dyn ResourceStateTracker,
    resources: &ResourceTable,
    node: &PassNode,
    command_list: GpuCommandList,
) -> FrameGraphResult<()> {
    let declared = node.inputs.len() + node.outputs.len();
    for i in 0..declared {
        let dependency = declared_at(node, i);
        if dependency.state == ResourceState::Undefined {
            continue;
        }
        if (i + 1..declared).any(|later| declared_at(node, later).handle == dependency.handle) {
            continue;
        }
        let resource = resources.resolve(dependency.handle)?;
        tracker.transition(command_list, resource, dependency.state, node.queue);
    }
    Ok(())
}

/// Inputs followed by outputs, as one list.
fn declared_at(node: &PassNode, i: usize) -> &ResourceDependency {
    match node.inputs.get(i) {
        Some(dependency) => dependency,
        None => &node.outputs[i - node.inputs.len()],
    }
}

/// Submit the recorded passes in execution order.
///
/// `waits` is scratch storage reused across frames. When no pass survived,
/// a single empty submission signals the fence so the slot can be waited
/// on as usual.
pub(crate) fn submit(
    device: &dyn Device,
    passes: &[PassNode],
    order: &[PassHandle],
    pool: &mut SubmissionPool,
    waits: &mut Vec<GpuSemaphore>,
) -> FrameGraphResult<()> {
    if order.is_empty() {
        let fence = pool.fence();
        return pool.submit_final(
            device,
            QueueType::Graphics,
            &Submission {
                command_list: None,
                wait_semaphores: &[],
                signal_semaphores: &[],
                signal_fence: Some(fence),
            },
        );
    }

    for (position, &handle) in order.iter().enumerate() {
        let node = &passes[handle.index()];

        waits.clear();
        for dependency in &node.depends_on {
            if let Some(index) = passes[dependency.index()].execution_index {
                waits.push(pool.semaphore(index as usize));
            }
        }

        let signal_semaphores = [pool.semaphore(position)];
        let last = position + 1 == order.len();
        let submission = Submission {
            command_list: Some(pool.command_list(position)),
            wait_semaphores: waits,
            signal_semaphores: &signal_semaphores,
            signal_fence: last.then_some(pool.fence()),
        };

        if last {
            pool.submit_final(device, node.queue, &submission)?;
        } else {
            device.submit(node.queue, &submission)?;
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::compiler::tests::node;
    use crate::compiler::{CompileScratch, compile_passes};
    use crate::device::{DeviceError, DummyDevice, DummyStateTracker, GpuResource, GpuTexture};
    use crate::graph::pass::ExecuteFn;
    use crate::types::Extent3d;

    fn frame() -> FrameInfo {
        FrameInfo {
            slot: 0,
            frame_index: 0,
            viewport: Extent3d::new_2d(16, 16),
        }
    }

    fn compiled(mut passes: Vec<PassNode>) -> (Vec<PassNode>, Vec<PassHandle>) {
        let mut scratch = CompileScratch::new(8, 8);
        let mut order = Vec::new();
        compile_passes(&mut passes, &[], &mut scratch, &mut order).unwrap();
        (passes, order)
    }

    #[test]
    fn test_pool_is_preallocated() {
        let device = DummyDevice::new();
        let pool = SubmissionPool::new(&device, 0, 4).unwrap();
        assert_eq!(device.command_lists_created(), 4);
        assert_eq!(device.semaphores_created(), 4);
        assert!(device.is_fence_signaled(pool.fence()));
    }

    #[test]
    fn test_assign_respects_capacity() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 2).unwrap();
        assert!(pool.assign(2).is_ok());
        assert_eq!(pool.assigned(), 2);
        assert_eq!(
            pool.assign(3),
            Err(FrameGraphError::PassCapacityExceeded { capacity: 2 })
        );
        pool.reset();
        assert_eq!(pool.assigned(), 0);
    }

    #[test]
    fn test_submit_chain_waits_on_producers() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 4).unwrap();
        let (mut passes, order) = compiled({
            let mut passes = vec![
                node("shadow", &[], &[0]),
                node("scene", &[0], &[1]),
                node("present", &[1], &[]),
            ];
            passes[2].side_effects = true;
            passes
        });
        pool.assign(order.len()).unwrap();

        let mut table = ResourceTable::new(4);
        table.import_texture("shadow", GpuTexture::from_raw(100)).unwrap();
        table.import_texture("color", GpuTexture::from_raw(101)).unwrap();
        let mut tracker = DummyStateTracker::new();
        record(&device, &mut tracker, &table, &mut passes, &order, &pool, &frame()).unwrap();
        submit(&device, &passes, &order, &mut pool, &mut Vec::new()).unwrap();

        let submissions = device.submissions();
        assert_eq!(submissions.len(), 3);
        assert!(submissions[0].wait_semaphores.is_empty());
        assert_eq!(submissions[1].wait_semaphores, submissions[0].signal_semaphores);
        assert_eq!(submissions[2].wait_semaphores, submissions[1].signal_semaphores);
        assert_eq!(submissions[2].signal_semaphores, vec![pool.semaphore(2)]);
        assert_eq!(submissions[2].signal_fence, Some(pool.fence()));
        assert!(submissions[..2].iter().all(|s| s.signal_fence.is_none()));
        assert!(device.is_fence_signaled(pool.fence()));
    }

    #[test]
    fn test_record_transitions_last_declaration() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 2).unwrap();
        let mut table = ResourceTable::new(4);
        let texture = GpuTexture::from_raw(7);
        table.import_texture("history", texture).unwrap();

        // Reads in ShaderRead and writes in RenderTarget: only the write applies.
        let mut pass = node("resolve", &[0], &[0]);
        pass.side_effects = true;
        let (mut passes, order) = compiled(vec![pass]);
        pool.assign(order.len()).unwrap();

        let mut tracker = DummyStateTracker::new();
        record(&device, &mut tracker, &table, &mut passes, &order, &pool, &frame()).unwrap();

        assert_eq!(tracker.transitions().len(), 1);
        assert_eq!(tracker.transitions()[0].to, ResourceState::RenderTarget);
        assert_eq!(
            tracker.state(GpuResource::Texture(texture)),
            Some(ResourceState::RenderTarget)
        );
    }

    #[test]
    fn test_callback_error_still_ends_recording() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 1).unwrap();
        let mut pass = node("broken", &[], &[]);
        pass.side_effects = true;
        let execute: ExecuteFn = Box::new(|_ctx: &mut PassContext<'_>| -> FrameGraphResult<()> {
            Err(FrameGraphError::Device(DeviceError::DeviceLost))
        });
        pass.execute = Some(execute);
        let (mut passes, order) = compiled(vec![pass]);
        pool.assign(order.len()).unwrap();

        let table = ResourceTable::new(1);
        let mut tracker = DummyStateTracker::new();
        let result = record(&device, &mut tracker, &table, &mut passes, &order, &pool, &frame());

        assert_eq!(result, Err(FrameGraphError::Device(DeviceError::DeviceLost)));
        assert_eq!(device.recorded_command_lists().len(), 1);
    }

    #[test]
    fn test_empty_frame_signals_fence() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 1).unwrap();
        submit(&device, &[], &[], &mut pool, &mut Vec::new()).unwrap();

        let submissions = device.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].command_list, None);
        assert_eq!(submissions[0].signal_fence, Some(pool.fence()));
        assert!(device.is_fence_signaled(pool.fence()));
    }

    #[test]
    fn test_submit_failure_propagates() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 1).unwrap();
        device.fail_next_submit(DeviceError::SubmissionFailed("queue lost".into()));

        let result = submit(&device, &[], &[], &mut pool, &mut Vec::new());
        assert_eq!(
            result,
            Err(FrameGraphError::Device(DeviceError::SubmissionFailed(
                "queue lost".into()
            )))
        );
    }

    #[test]
    fn test_rejected_final_submit_does_not_block_slot() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 1).unwrap();
        let mut pass = node("present", &[], &[]);
        pass.side_effects = true;
        let (mut passes, order) = compiled(vec![pass]);
        pool.assign(order.len()).unwrap();

        let table = ResourceTable::new(1);
        let mut tracker = DummyStateTracker::new();
        record(&device, &mut tracker, &table, &mut passes, &order, &pool, &frame()).unwrap();
        device.fail_next_submit(DeviceError::DeviceLost);
        assert!(submit(&device, &passes, &order, &mut pool, &mut Vec::new()).is_err());

        // The fence was reset but never submitted; waiting must not hang.
        assert!(!device.is_fence_signaled(pool.fence()));
        assert_eq!(pool.wait(&device), Ok(()));

        submit(&device, &[], &[], &mut pool, &mut Vec::new()).unwrap();
        assert!(device.is_fence_signaled(pool.fence()));
        assert_eq!(pool.wait(&device), Ok(()));
    }

    #[test]
    fn test_every_pass_signals_its_semaphore() {
        let device = DummyDevice::new();
        let mut pool = SubmissionPool::new(&device, 0, 4).unwrap();
        let mut upload = node("upload", &[], &[]);
        upload.side_effects = true;
        let mut present = node("present", &[], &[]);
        present.side_effects = true;
        let (mut passes, order) = compiled(vec![upload, present]);
        pool.assign(order.len()).unwrap();

        let table = ResourceTable::new(1);
        let mut tracker = DummyStateTracker::new();
        record(&device, &mut tracker, &table, &mut passes, &order, &pool, &frame()).unwrap();
        submit(&device, &passes, &order, &mut pool, &mut Vec::new()).unwrap();

        let submissions = device.submissions();
        assert_eq!(submissions[0].signal_semaphores, vec![pool.semaphore(0)]);
        assert_eq!(submissions[1].signal_semaphores, vec![pool.semaphore(1)]);
        assert!(submissions[1].wait_semaphores.is_empty());
    }

    #[test]
    fn test_callback_error_reported_before_end_error() {
        let device = DummyDevice::new();
        let pool = SubmissionPool::new(&device, 0, 1).unwrap();
        let mut pass = node("ends_early", &[], &[]);
        pass.side_effects = true;
        let execute: ExecuteFn = Box::new(|ctx: &mut PassContext<'_>| -> FrameGraphResult<()> {
            // Ending here makes the scheduler's own end call fail.
            ctx.device().end_command_list(ctx.command_list())?;
            Err(FrameGraphError::Device(DeviceError::Internal("draw failed".into())))
        });
        pass.execute = Some(execute);
        let (mut passes, order) = compiled(vec![pass]);

        let table = ResourceTable::new(1);
        let mut tracker = DummyStateTracker::new();
        let result = record(&device, &mut tracker, &table, &mut passes, &order, &pool, &frame());

        assert_eq!(
            result,
            Err(FrameGraphError::Device(DeviceError::Internal("draw failed".into())))
        );
    }
}

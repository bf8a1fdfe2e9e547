//! Frame graph infrastructure.
//!
//! The frame graph provides a declarative way to describe one frame of GPU
//! work. Passes declare the resources they read and write; the graph then:
//!
//! - Orders passes so every reader runs after the writer it depends on
//! - Culls passes whose results never reach a side-effect pass
//! - Binds transient resources to pooled GPU objects
//! - Transitions resources into their declared states before each pass
//! - Submits passes with semaphore waits along dependency edges
//!
//! # Architecture
//!
//! | Stage | Module | Purpose |
//! |-------|--------|---------|
//! | Declare | [`PassBuilder`], `graph::resource` | Passes and the resource table |
//! | Compile | `compiler` | Edges, culling, topological sort |
//! | Allocate | `transient` | Per-slot transient pools |
//! | Execute | `scheduler` | Recording and submission |
//!
//! # Example
//!
//! ```ignore
//! use redlilium_frame_graph::{FrameGraph, FrameGraphConfig, ResourceState};
//!
//! let mut graph = FrameGraph::new(device, tracker, FrameGraphConfig::default())?;
//! graph.set_viewport(1920, 1080);
//!
//! graph.begin_frame(slot)?;
//! let backbuffer = graph.import_texture("Backbuffer", swapchain_texture)?;
//! graph.add_pass("present", move |_, builder| {
//!     builder.write_texture(backbuffer, ResourceState::Present)?;
//!     builder.has_side_effects();
//!     Ok(())
//! }, |_, ctx| {
//!     // record into ctx.command_list()
//!     Ok(())
//! })?;
//! graph.execute()?;
//! ```

pub(crate) mod context;
pub(crate) mod pass;
pub(crate) mod resource;

pub use context::{FrameInfo, PassContext};
pub use pass::{PassBuilder, PassHandle, ResourceDependency};
pub use resource::{ResourceAccess, ResourceHandle, ResourceKind};

use crate::compiler::{self, CompileScratch};
use crate::config::FrameGraphConfig;
use crate::device::{Device, GpuBuffer, GpuSemaphore, GpuTexture, ResourceStateTracker};
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::scheduler::{self, SubmissionPool};
use crate::transient::{self, TransientPool};
use crate::types::{BufferDescriptor, Extent3d, TextureDescriptor};

use pass::PassNode;
use resource::ResourceTable;

/// Counters describing the last compiled frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Passes declared.
    pub declared_passes: usize,
    /// Passes removed by culling.
    pub culled_passes: usize,
    /// Passes in the execution order.
    pub scheduled_passes: usize,
    /// Dependency edges, derived and explicit.
    pub dependency_edges: usize,
    /// Transient resources bound to a GPU object.
    pub transients_materialized: usize,
    /// Transient bindings served from the slot's pool.
    pub pool_hits: usize,
    /// Transient bindings that created a new GPU object.
    pub new_allocations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// Between `execute` and the next `begin_frame`.
    Idle,
    /// Accepting declarations.
    Building,
    /// Compiled and waiting for `execute`.
    Compiled,
}

struct FrameSlot {
    submission: SubmissionPool,
    transients: TransientPool,
}

/// Per-frame pass scheduler.
///
/// One `FrameGraph` owns the device and state tracker it drives, all
/// per-slot pools, and the scratch storage used by compilation. Nothing is
/// shared between instances.
///
/// # Frame lifecycle
///
/// 1. [`begin_frame`](Self::begin_frame) waits for the slot to be free and
///    clears the previous declarations.
/// 2. Resources are imported or created, passes are added.
/// 3. [`compile`](Self::compile) derives the schedule (optional,
///    `execute` compiles if needed).
/// 4. [`execute`](Self::execute) records and submits.
///
/// A frame that failed to compile can be dropped with
/// [`discard_frame`](Self::discard_frame). Once compiled, it must be
/// executed.
pub struct FrameGraph<D: Device, T: ResourceStateTracker> {
    device: D,
    tracker: T,
    config: FrameGraphConfig,
    viewport: Extent3d,
    resources: ResourceTable,
    passes: Vec<PassNode>,
    pass_count: usize,
    /// Explicit edges as (dependent, dependency) pairs.
    explicit_edges: Vec<(PassHandle, PassHandle)>,
    slots: Vec<FrameSlot>,
    frame: FrameInfo,
    frames_begun: u64,
    state: FrameState,
    order: Vec<PassHandle>,
    scratch: CompileScratch,
    waits: Vec<GpuSemaphore>,
    stats: FrameStats,
}

impl<D: Device, T: ResourceStateTracker> FrameGraph<D, T> {
    /// Create a frame graph and pre-allocate every per-slot pool.
    pub fn new(device: D, tracker: T, config: FrameGraphConfig) -> FrameGraphResult<Self> {
        config.validate()?;

        let mut slots = Vec::with_capacity(config.frames_in_flight);
        for slot in 0..config.frames_in_flight {
            slots.push(FrameSlot {
                submission: SubmissionPool::new(&device, slot, config.max_passes)?,
                transients: TransientPool::new(slot),
            });
        }

        log::info!(
            "FrameGraph: created on {} ({} frames in flight, {} passes, {} resources)",
            device.name(),
            config.frames_in_flight,
            config.max_passes,
            config.max_resources
        );

        Ok(Self {
            device,
            tracker,
            config,
            viewport: Extent3d::new_2d(1, 1),
            resources: ResourceTable::new(config.max_resources),
            passes: (0..config.max_passes).map(|_| PassNode::new()).collect(),
            pass_count: 0,
            explicit_edges: Vec::new(),
            slots,
            frame: FrameInfo {
                slot: 0,
                frame_index: 0,
                viewport: Extent3d::new_2d(1, 1),
            },
            frames_begun: 0,
            state: FrameState::Idle,
            order: Vec::with_capacity(config.max_passes),
            scratch: CompileScratch::new(config.max_passes, config.max_resources),
            waits: Vec::with_capacity(config.max_passes),
            stats: FrameStats::default(),
        })
    }

    /// Get the device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Get the state tracker.
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Get the state tracker mutably.
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Get the configuration.
    pub fn config(&self) -> &FrameGraphConfig {
        &self.config
    }

    /// Set the extent used for viewport-sized transient textures.
    ///
    /// Takes effect at the next [`begin_frame`](Self::begin_frame).
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Extent3d::new_2d(width, height);
    }

    /// Information about the current (or last) frame.
    pub fn frame(&self) -> &FrameInfo {
        &self.frame
    }

    /// Returns true between `begin_frame` and the end of `execute`.
    pub fn is_frame_active(&self) -> bool {
        self.state != FrameState::Idle
    }

    /// Start a new frame on `slot`.
    ///
    /// Blocks until the previous frame submitted on `slot` has completed,
    /// then clears the resource table, the pass list and the slot's pool
    /// occupancy. Every handle from earlier frames becomes stale.
    pub fn begin_frame(&mut self, slot: usize) -> FrameGraphResult<()> {
        crate::profile_function!();

        if self.state != FrameState::Idle {
            return Err(FrameGraphError::FrameAlreadyActive);
        }
        if slot >= self.slots.len() {
            return Err(FrameGraphError::InvalidFrameSlot {
                slot,
                frames_in_flight: self.slots.len(),
            });
        }

        let frame_slot = &mut self.slots[slot];
        frame_slot.submission.wait(&self.device)?;
        frame_slot.submission.reset();
        frame_slot.transients.release_all();

        self.resources.reset();
        self.pass_count = 0;
        self.explicit_edges.clear();
        self.order.clear();
        self.stats = FrameStats::default();

        self.frame = FrameInfo {
            slot,
            frame_index: self.frames_begun,
            viewport: self.viewport,
        };
        self.frames_begun += 1;
        self.state = FrameState::Building;

        log::trace!(
            "FrameGraph: begin frame {} on slot {}",
            self.frame.frame_index,
            slot
        );
        Ok(())
    }

    /// Drop a frame that has not been compiled successfully.
    pub fn discard_frame(&mut self) -> FrameGraphResult<()> {
        match self.state {
            FrameState::Idle => Err(FrameGraphError::NoActiveFrame),
            FrameState::Compiled => Err(FrameGraphError::AlreadyCompiled),
            FrameState::Building => {
                self.release_callbacks();
                self.state = FrameState::Idle;
                log::debug!("FrameGraph: discarded frame {}", self.frame.frame_index);
                Ok(())
            }
        }
    }

    /// Register a caller-owned texture.
    pub fn import_texture(
        &mut self,
        name: &str,
        texture: GpuTexture,
    ) -> FrameGraphResult<ResourceHandle> {
        self.ensure_building()?;
        self.resources.import_texture(name, texture)
    }

    /// Register a caller-owned buffer.
    pub fn import_buffer(&mut self, name: &str, buffer: GpuBuffer) -> FrameGraphResult<ResourceHandle> {
        self.ensure_building()?;
        self.resources.import_buffer(name, buffer)
    }

    /// Register a transient texture not tied to any pass yet.
    ///
    /// It is only materialized if a scheduled pass declares it.
    pub fn create_transient_texture(
        &mut self,
        name: &str,
        descriptor: TextureDescriptor,
    ) -> FrameGraphResult<ResourceHandle> {
        self.ensure_building()?;
        self.resources.create_transient_texture(name, descriptor)
    }

    /// Register a transient buffer not tied to any pass yet.
    pub fn create_transient_buffer(
        &mut self,
        name: &str,
        descriptor: BufferDescriptor,
    ) -> FrameGraphResult<ResourceHandle> {
        self.ensure_building()?;
        self.resources.create_transient_buffer(name, descriptor)
    }

    /// Declare a pass.
    ///
    /// `setup` runs immediately with a [`PassBuilder`] and returns the data
    /// handed to `execute`. `execute` runs during [`execute`](Self::execute)
    /// if the pass survives culling. If `setup` fails, the pass and any
    /// resources it created are dropped, handles to those resources become
    /// stale, and no lifetime window is extended.
    pub fn add_pass<Data, Setup, Execute>(
        &mut self,
        name: &str,
        setup: Setup,
        execute: Execute,
    ) -> FrameGraphResult<PassHandle>
    where
        Data: 'static,
        Setup: FnOnce(&FrameInfo, &mut PassBuilder<'_>) -> FrameGraphResult<Data>,
        Execute: FnOnce(&Data, &mut PassContext<'_>) -> FrameGraphResult<()> + 'static,
    {
        self.ensure_building()?;
        if self.pass_count >= self.passes.len() {
            return Err(FrameGraphError::PassCapacityExceeded {
                capacity: self.passes.len(),
            });
        }

        let handle = PassHandle::new(self.pass_count as u32);
        let resources_before = self.resources.len();
        let node = &mut self.passes[self.pass_count];
        node.reset(name);

        let mut builder = PassBuilder::new(handle, node, &mut self.resources);
        let declared = setup(&self.frame, &mut builder)
            .and_then(|data| builder.finish().map(|()| data));
        let data = match declared {
            Ok(data) => data,
            Err(err) => {
                self.resources.truncate(resources_before);
                return Err(err);
            }
        };

        self.passes[self.pass_count].execute = Some(Box::new(
            move |ctx: &mut PassContext<'_>| execute(&data, ctx),
        ));
        self.pass_count += 1;

        log::trace!("FrameGraph: added pass '{}' as {:?}", name, handle);
        Ok(handle)
    }

    /// Declare a side-effect pass with no resource declarations.
    pub fn add_simple_pass<Execute>(&mut self, name: &str, execute: Execute) -> FrameGraphResult<PassHandle>
    where
        Execute: FnOnce(&mut PassContext<'_>) -> FrameGraphResult<()> + 'static,
    {
        self.add_pass(
            name,
            |_, builder| {
                builder.has_side_effects();
                Ok(())
            },
            move |_: &(), ctx| execute(ctx),
        )
    }

    /// Make `dependent` run after `dependency`.
    ///
    /// Explicit edges take part in culling, ordering and semaphore waits
    /// like edges derived from resource use. Duplicate edges are ignored.
    pub fn add_dependency(
        &mut self,
        dependent: PassHandle,
        dependency: PassHandle,
    ) -> FrameGraphResult<()> {
        self.ensure_building()?;
        for handle in [dependent, dependency] {
            if handle.index() >= self.pass_count {
                return Err(FrameGraphError::InvalidPassHandle(handle));
            }
        }
        if dependent == dependency {
            return Err(FrameGraphError::SelfDependency(dependent));
        }
        if !self.explicit_edges.contains(&(dependent, dependency)) {
            self.explicit_edges.push((dependent, dependency));
        }
        Ok(())
    }

    /// Compile the declared passes.
    ///
    /// Builds dependency edges, culls, sorts, binds transient resources and
    /// assigns command lists. Calling it again on a compiled frame does
    /// nothing. On failure the frame stays open: it can be fixed (for
    /// example after a transient allocation error), compiled again or
    /// discarded.
    pub fn compile(&mut self) -> FrameGraphResult<()> {
        match self.state {
            FrameState::Idle => return Err(FrameGraphError::NoActiveFrame),
            FrameState::Compiled => return Ok(()),
            FrameState::Building => {}
        }
        crate::profile_function!();

        let slot = &mut self.slots[self.frame.slot];
        slot.transients.release_all();
        slot.submission.reset();
        self.resources.unbind_transients();

        let passes = &mut self.passes[..self.pass_count];
        let summary =
            compiler::compile_passes(passes, &self.explicit_edges, &mut self.scratch, &mut self.order)?;

        let allocation = {
            crate::profile_scope!("allocate_transients");
            transient::allocate_transients(
                &mut self.resources,
                passes,
                &self.order,
                &mut slot.transients,
                &self.device,
                &mut self.tracker,
                self.frame.viewport,
            )?
        };
        slot.submission.assign(self.order.len())?;

        self.stats = FrameStats {
            declared_passes: self.pass_count,
            culled_passes: summary.culled,
            scheduled_passes: self.order.len(),
            dependency_edges: summary.edges,
            transients_materialized: allocation.materialized,
            pool_hits: allocation.reused,
            new_allocations: allocation.allocated,
        };
        crate::profile_plot!("frame_graph_scheduled_passes", self.stats.scheduled_passes);

        log::debug!(
            "FrameGraph: compiled frame {}: {} passes, {} culled, {} edges, {} transients ({} new)",
            self.frame.frame_index,
            self.stats.declared_passes,
            self.stats.culled_passes,
            self.stats.dependency_edges,
            self.stats.transients_materialized,
            self.stats.new_allocations
        );

        self.state = FrameState::Compiled;
        Ok(())
    }

    /// Record and submit the frame, compiling it first if needed.
    ///
    /// The frame ends even if recording or submission fails; the error is
    /// returned unchanged.
    pub fn execute(&mut self) -> FrameGraphResult<()> {
        if self.state == FrameState::Idle {
            return Err(FrameGraphError::NoActiveFrame);
        }
        self.compile()?;
        crate::profile_function!();

        let result = self.record_and_submit();
        self.release_callbacks();
        self.state = FrameState::Idle;

        if result.is_ok() {
            crate::frame_mark!();
            log::trace!(
                "FrameGraph: submitted frame {} ({} passes)",
                self.frame.frame_index,
                self.order.len()
            );
        }
        result
    }

    fn record_and_submit(&mut self) -> FrameGraphResult<()> {
        let slot = &mut self.slots[self.frame.slot];
        let passes = &mut self.passes[..self.pass_count];
        {
            crate::profile_scope!("record");
            scheduler::record(
                &self.device,
                &mut self.tracker,
                &self.resources,
                passes,
                &self.order,
                &slot.submission,
                &self.frame,
            )?;
        }
        crate::profile_scope!("submit");
        scheduler::submit(
            &self.device,
            passes,
            &self.order,
            &mut slot.submission,
            &mut self.waits,
        )
    }

    /// Look up a resource of the current frame by name.
    pub fn get_resource(&self, name: &str) -> Option<ResourceHandle> {
        self.resources.find(name)
    }

    /// Resolve a texture handle to its live GPU object.
    ///
    /// Transient textures resolve only after compilation.
    pub fn resolve_texture(&self, handle: ResourceHandle) -> FrameGraphResult<GpuTexture> {
        self.resources.resolve_texture(handle)
    }

    /// Resolve a buffer handle to its live GPU object.
    pub fn resolve_buffer(&self, handle: ResourceHandle) -> FrameGraphResult<GpuBuffer> {
        self.resources.resolve_buffer(handle)
    }

    /// Declaration-order lifetime window of a resource.
    ///
    /// `None` if no pass declared the resource.
    pub fn resource_lifetime(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<Option<(PassHandle, PassHandle)>> {
        let entry = self.resources.get(handle)?;
        Ok(entry.first_pass.zip(entry.last_pass))
    }

    /// Number of passes declared in the current frame.
    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    /// Scheduled passes in execution order. Empty until compiled.
    pub fn execution_order(&self) -> &[PassHandle] {
        &self.order
    }

    /// Name of a pass.
    pub fn pass_name(&self, pass: PassHandle) -> FrameGraphResult<&str> {
        Ok(&self.pass(pass)?.name)
    }

    /// Whether a pass was culled by the last compilation.
    pub fn is_culled(&self, pass: PassHandle) -> FrameGraphResult<bool> {
        Ok(self.pass(pass)?.culled)
    }

    /// Position of a pass in the execution order, if scheduled.
    pub fn execution_index(&self, pass: PassHandle) -> FrameGraphResult<Option<usize>> {
        Ok(self.pass(pass)?.execution_index.map(|index| index as usize))
    }

    /// Direct dependencies of a pass after compilation.
    pub fn dependencies(&self, pass: PassHandle) -> FrameGraphResult<&[PassHandle]> {
        Ok(&self.pass(pass)?.depends_on)
    }

    /// Semaphore signaled by the last scheduled pass of the current frame.
    ///
    /// Available once the frame is compiled, until the next
    /// [`begin_frame`](Self::begin_frame). Present or other work outside the
    /// graph can wait on it. `None` when no pass was scheduled.
    pub fn final_semaphore(&self) -> Option<GpuSemaphore> {
        if self.state == FrameState::Building {
            return None;
        }
        let last = self.order.len().checked_sub(1)?;
        Some(self.slots[self.frame.slot].submission.semaphore(last))
    }

    /// Counters of the last compiled frame.
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Number of pooled (textures, buffers) owned by `slot`.
    pub fn transient_pool_size(&self, slot: usize) -> Option<(usize, usize)> {
        self.slots
            .get(slot)
            .map(|slot| (slot.transients.texture_count(), slot.transients.buffer_count()))
    }

    /// Block until every slot's last submitted frame has completed.
    pub fn wait_idle(&self) -> FrameGraphResult<()> {
        log::trace!("FrameGraph: waiting for GPU idle ({} slots)", self.slots.len());
        for slot in &self.slots {
            slot.submission.wait(&self.device)?;
        }
        Ok(())
    }

    /// Wait for the GPU and destroy every pooled transient object.
    ///
    /// Pools grow again on the next frames that need them.
    pub fn destroy_transients(&mut self) -> FrameGraphResult<()> {
        if self.state != FrameState::Idle {
            return Err(FrameGraphError::FrameAlreadyActive);
        }
        self.wait_idle()?;
        for slot in &mut self.slots {
            slot.transients.destroy_all(&self.device);
        }
        log::debug!("FrameGraph: destroyed transient pools");
        Ok(())
    }

    fn pass(&self, pass: PassHandle) -> FrameGraphResult<&PassNode> {
        self.passes[..self.pass_count]
            .get(pass.index())
            .ok_or(FrameGraphError::InvalidPassHandle(pass))
    }

    fn ensure_building(&self) -> FrameGraphResult<()> {
        match self.state {
            FrameState::Building => Ok(()),
            FrameState::Idle => Err(FrameGraphError::NoActiveFrame),
            FrameState::Compiled => Err(FrameGraphError::AlreadyCompiled),
        }
    }

    fn release_callbacks(&mut self) {
        for pass in &mut self.passes[..self.pass_count] {
            pass.execute = None;
        }
    }
}

impl<D: Device, T: ResourceStateTracker> std::fmt::Debug for FrameGraph<D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGraph")
            .field("device", &self.device.name())
            .field("config", &self.config)
            .field("frame", &self.frame)
            .field("state", &self.state)
            .field("pass_count", &self.pass_count)
            .field("resources", &self.resources.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::device::{DummyDevice, DummyStateTracker};
    use crate::types::{ResourceState, TextureFormat, TextureUsage};

    type TestGraph = FrameGraph<DummyDevice, DummyStateTracker>;

    fn graph() -> TestGraph {
        FrameGraph::new(
            DummyDevice::new(),
            DummyStateTracker::new(),
            FrameGraphConfig::default().with_max_passes(8).with_max_resources(8),
        )
        .unwrap()
    }

    fn noop(_: &(), _: &mut PassContext<'_>) -> FrameGraphResult<()> {
        Ok(())
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = FrameGraph::new(
            DummyDevice::new(),
            DummyStateTracker::new(),
            FrameGraphConfig::default().with_max_passes(0),
        );
        assert!(matches!(result, Err(FrameGraphError::InvalidConfig(_))));
    }

    #[test]
    fn test_declarations_need_active_frame() {
        let mut graph = graph();
        assert_eq!(
            graph.import_texture("a", GpuTexture::from_raw(1)),
            Err(FrameGraphError::NoActiveFrame)
        );
        assert_eq!(graph.compile(), Err(FrameGraphError::NoActiveFrame));
        assert_eq!(graph.execute(), Err(FrameGraphError::NoActiveFrame));
    }

    #[test]
    fn test_double_begin_frame_fails() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        assert_eq!(graph.begin_frame(1), Err(FrameGraphError::FrameAlreadyActive));
    }

    #[test]
    fn test_invalid_slot() {
        let mut graph = graph();
        assert_eq!(
            graph.begin_frame(2),
            Err(FrameGraphError::InvalidFrameSlot {
                slot: 2,
                frames_in_flight: 2
            })
        );
    }

    #[test]
    fn test_declaration_after_compile_fails() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        graph.add_simple_pass("present", |_| Ok(())).unwrap();
        graph.compile().unwrap();
        graph.compile().unwrap();

        assert_eq!(
            graph.add_simple_pass("late", |_| Ok(())),
            Err(FrameGraphError::AlreadyCompiled)
        );
        assert_eq!(graph.discard_frame(), Err(FrameGraphError::AlreadyCompiled));
        graph.execute().unwrap();
        assert!(!graph.is_frame_active());
    }

    #[test]
    fn test_pass_capacity() {
        let mut graph = FrameGraph::new(
            DummyDevice::new(),
            DummyStateTracker::new(),
            FrameGraphConfig::default().with_max_passes(2),
        )
        .unwrap();
        graph.begin_frame(0).unwrap();
        graph.add_simple_pass("a", |_| Ok(())).unwrap();
        graph.add_simple_pass("b", |_| Ok(())).unwrap();
        assert_eq!(
            graph.add_simple_pass("c", |_| Ok(())),
            Err(FrameGraphError::PassCapacityExceeded { capacity: 2 })
        );
    }

    #[test]
    fn test_failed_setup_rolls_back_resources() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        let stale = ResourceHandle::new(0, 0);

        let result = graph.add_pass(
            "broken",
            move |_, builder| {
                builder.create_transient_texture(
                    "scratch",
                    TextureDescriptor::viewport_sized(
                        TextureFormat::R32Float,
                        TextureUsage::STORAGE_BINDING,
                    ),
                )?;
                builder.read_texture(stale, ResourceState::ShaderRead)?;
                Ok(())
            },
            noop,
        );

        assert!(matches!(result, Err(FrameGraphError::StaleHandle { .. })));
        assert_eq!(graph.pass_count(), 0);
        assert_eq!(graph.get_resource("scratch"), None);
    }

    #[test]
    fn test_failed_setup_leaves_no_trace() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        let history = graph.import_texture("history", GpuTexture::from_raw(9)).unwrap();
        let leaked = std::rc::Rc::new(std::cell::Cell::new(None));

        let leaked_in_setup = leaked.clone();
        let result = graph.add_pass(
            "broken",
            move |_, builder| {
                builder.read_texture(history, ResourceState::ShaderRead)?;
                let scratch = builder.create_transient_texture(
                    "scratch",
                    TextureDescriptor::new_2d(8, 8, TextureFormat::R32Float, TextureUsage::COPY_DST),
                )?;
                leaked_in_setup.set(Some(scratch));
                Err::<(), _>(FrameGraphError::InvalidConfig("setup gave up".into()))
            },
            noop,
        );
        assert!(result.is_err());
        assert_eq!(graph.resource_lifetime(history), Ok(None));

        // The next resource reuses the rolled back slot.
        let leaked = leaked.get().unwrap();
        let replacement = graph
            .import_buffer("replacement", GpuBuffer::from_raw(3))
            .unwrap();
        assert_eq!(replacement.index(), leaked.index());
        assert!(matches!(
            graph.resolve_texture(leaked),
            Err(FrameGraphError::StaleHandle { .. })
        ));
        assert!(matches!(
            graph.resource_lifetime(leaked),
            Err(FrameGraphError::StaleHandle { .. })
        ));
        assert_eq!(graph.resolve_buffer(replacement), Ok(GpuBuffer::from_raw(3)));

        let reader = graph
            .add_pass(
                "reader",
                move |_, builder| {
                    builder.read_texture(history, ResourceState::ShaderRead)?;
                    builder.has_side_effects();
                    Ok(())
                },
                noop,
            )
            .unwrap();
        assert_eq!(graph.resource_lifetime(history), Ok(Some((reader, reader))));
        graph.execute().unwrap();
    }

    #[test]
    fn test_add_dependency_validation() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        let a = graph.add_simple_pass("a", |_| Ok(())).unwrap();
        let bogus = PassHandle::new(5);

        assert_eq!(
            graph.add_dependency(a, bogus),
            Err(FrameGraphError::InvalidPassHandle(bogus))
        );
        assert_eq!(graph.add_dependency(a, a), Err(FrameGraphError::SelfDependency(a)));
    }

    #[test]
    fn test_discard_after_failed_compile() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        let a = graph.add_simple_pass("a", |_| Ok(())).unwrap();
        let b = graph.add_simple_pass("b", |_| Ok(())).unwrap();
        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, a).unwrap();

        assert!(matches!(
            graph.compile(),
            Err(FrameGraphError::CyclicDependency { .. })
        ));
        graph.discard_frame().unwrap();

        // The slot was never submitted, so it can be reused right away.
        graph.begin_frame(0).unwrap();
        graph.add_simple_pass("a", |_| Ok(())).unwrap();
        graph.execute().unwrap();
    }

    #[test]
    fn test_introspection() {
        let mut graph = graph();
        graph.set_viewport(640, 480);
        graph.begin_frame(1).unwrap();
        assert_eq!(graph.frame().slot, 1);
        assert_eq!(graph.frame().viewport, Extent3d::new_2d(640, 480));

        let color_desc =
            TextureDescriptor::viewport_sized(TextureFormat::Rgba8Unorm, TextureUsage::RENDER_ATTACHMENT);
        let producer = graph
            .add_pass(
                "producer",
                move |_, builder| {
                    let color = builder.create_transient_texture("color", color_desc)?;
                    builder.write_texture(color, ResourceState::RenderTarget)
                },
                |_, _| Ok(()),
            )
            .unwrap();
        let color = graph.get_resource("color").unwrap();
        let consumer = graph
            .add_pass(
                "consumer",
                move |_, builder| {
                    builder.read_texture(color, ResourceState::ShaderRead)?;
                    builder.has_side_effects();
                    Ok(())
                },
                noop,
            )
            .unwrap();
        graph.compile().unwrap();

        assert_eq!(graph.execution_order(), &[producer, consumer]);
        assert_eq!(graph.pass_name(consumer), Ok("consumer"));
        assert_eq!(graph.is_culled(producer), Ok(false));
        assert_eq!(graph.execution_index(consumer), Ok(Some(1)));
        assert_eq!(graph.dependencies(consumer), Ok(&[producer][..]));
        assert_eq!(graph.resource_lifetime(color), Ok(Some((producer, consumer))));
        assert_eq!(graph.stats().transients_materialized, 1);
        assert_eq!(graph.transient_pool_size(1), Some((1, 0)));
        assert_eq!(graph.transient_pool_size(0), Some((0, 0)));

        let texture = graph.resolve_texture(color).unwrap();
        assert_eq!(
            graph.device().texture_descriptor(texture).map(|d| d.size),
            Some(Extent3d::new_2d(640, 480))
        );
        graph.execute().unwrap();
    }

    #[test]
    fn test_destroy_transients() {
        let mut graph = graph();
        graph.begin_frame(0).unwrap();
        graph
            .add_pass(
                "blit",
                |_, builder| {
                    let scratch = builder.create_transient_texture(
                        "scratch",
                        TextureDescriptor::new_2d(
                            32,
                            32,
                            TextureFormat::Rgba8Unorm,
                            TextureUsage::COPY_DST,
                        ),
                    )?;
                    builder.write_texture(scratch, ResourceState::CopyDst)?;
                    builder.has_side_effects();
                    Ok(())
                },
                noop,
            )
            .unwrap();
        assert_eq!(graph.destroy_transients(), Err(FrameGraphError::FrameAlreadyActive));
        graph.execute().unwrap();
        assert_eq!(graph.device().live_textures(), 1);

        graph.destroy_transients().unwrap();
        assert_eq!(graph.device().live_textures(), 0);
        assert_eq!(graph.transient_pool_size(0), Some((0, 0)));
    }
}

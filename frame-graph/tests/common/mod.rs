//! Shared helpers for frame graph integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use redlilium_frame_graph::{
    DummyDevice, DummyStateTracker, FrameGraph, FrameGraphConfig, FrameGraphResult, GpuTexture,
    PassContext, PassHandle, ResourceState, TextureDescriptor, TextureFormat, TextureUsage,
};

pub type TestGraph = FrameGraph<DummyDevice, DummyStateTracker>;

/// Raw handle of the imported backbuffer.
pub const BACKBUFFER: GpuTexture = GpuTexture::from_raw(1_000_000);

/// Route `log` output through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn new_graph(frames_in_flight: usize) -> TestGraph {
    init_logger();
    let mut graph = FrameGraph::new(
        DummyDevice::new(),
        DummyStateTracker::new(),
        FrameGraphConfig::default()
            .with_frames_in_flight(frames_in_flight)
            .with_max_passes(16)
            .with_max_resources(32),
    )
    .expect("valid config");
    graph.set_viewport(1280, 720);
    graph
}

/// Names of executed passes, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog(Rc<RefCell<Vec<String>>>);

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// An execute callback that appends the pass name.
    pub fn recorder<Data: 'static>(
        &self,
    ) -> impl FnOnce(&Data, &mut PassContext<'_>) -> FrameGraphResult<()> + 'static {
        let log = self.0.clone();
        move |_, ctx| {
            log.borrow_mut().push(ctx.pass_name().to_owned());
            Ok(())
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub fn color_desc() -> TextureDescriptor {
    TextureDescriptor::viewport_sized(
        TextureFormat::Rgba16Float,
        TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
    )
}

pub fn shadow_desc() -> TextureDescriptor {
    TextureDescriptor::new_2d(
        2048,
        2048,
        TextureFormat::Depth32Float,
        TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
    )
}

/// The three passes of [`declare_scene`].
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    pub shadow: PassHandle,
    pub scene: PassHandle,
    pub present: PassHandle,
}

/// Declare shadow -> scene -> present for the current frame.
///
/// `shadow` renders `ShadowMap`, `scene` samples it and renders
/// `SceneColor`, `present` writes the imported backbuffer and, if
/// `present_reads_scene`, samples `SceneColor`.
pub fn declare_scene(
    graph: &mut TestGraph,
    present_reads_scene: bool,
    log: &ExecutionLog,
) -> FrameGraphResult<Scene> {
    let backbuffer = graph.import_texture("Backbuffer", BACKBUFFER)?;

    let shadow = graph.add_pass(
        "shadow",
        |_, builder| {
            let map = builder.create_transient_texture("ShadowMap", shadow_desc())?;
            builder.write_texture(map, ResourceState::DepthWrite)
        },
        log.recorder(),
    )?;
    let shadow_map = graph.get_resource("ShadowMap").expect("declared by shadow");

    let scene = graph.add_pass(
        "scene",
        move |_, builder| {
            builder.read_texture(shadow_map, ResourceState::ShaderRead)?;
            let color = builder.create_transient_texture("SceneColor", color_desc())?;
            builder.write_texture(color, ResourceState::RenderTarget)
        },
        log.recorder(),
    )?;
    let scene_color = graph.get_resource("SceneColor").expect("declared by scene");

    let present = graph.add_pass(
        "present",
        move |_, builder| {
            if present_reads_scene {
                builder.read_texture(scene_color, ResourceState::ShaderRead)?;
            }
            builder.write_texture(backbuffer, ResourceState::Present)?;
            builder.has_side_effects();
            Ok(())
        },
        log.recorder(),
    )?;

    Ok(Scene {
        shadow,
        scene,
        present,
    })
}

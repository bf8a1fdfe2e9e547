//! Transient resource allocation.
//!
//! Each frame-in-flight slot owns a [`TransientPool`]: an append-only list
//! of GPU textures and buffers created for transient resources. Objects
//! are marked in use while a frame on that slot binds them and released
//! when the slot begins its next frame. A request is served by the first
//! free object with a compatible descriptor; only when none exists is a new
//! object created and appended. Objects are never freed while the graph is
//! alive, except through [`FrameGraph::destroy_transients`](crate::FrameGraph::destroy_transients).

use crate::device::{Device, GpuBuffer, GpuResource, GpuTexture, ResourceStateTracker};
use crate::error::FrameGraphResult;
use crate::graph::PassHandle;
use crate::graph::pass::PassNode;
use crate::graph::resource::{ResourceOrigin, ResourceTable};
use crate::types::{BufferDescriptor, Extent3d, ResourceState, TextureDescriptor};

#[derive(Debug)]
struct PooledTexture {
    texture: GpuTexture,
    descriptor: TextureDescriptor,
    in_use: bool,
}

#[derive(Debug)]
struct PooledBuffer {
    buffer: GpuBuffer,
    descriptor: BufferDescriptor,
    in_use: bool,
}

/// GPU objects backing transient resources for one frame-in-flight slot.
#[derive(Debug)]
pub(crate) struct TransientPool {
    slot: usize,
    textures: Vec<PooledTexture>,
    buffers: Vec<PooledBuffer>,
}

/// What one allocation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AllocationStats {
    /// Transient resources bound to a GPU object.
    pub(crate) materialized: usize,
    /// Bindings served from the pool.
    pub(crate) reused: usize,
    /// Bindings that created a new GPU object.
    pub(crate) allocated: usize,
}

impl TransientPool {
    pub(crate) fn new(slot: usize) -> Self {
        Self {
            slot,
            textures: Vec::new(),
            buffers: Vec::new(),
        }
    }

    /// Mark every pooled object free.
    pub(crate) fn release_all(&mut self) {
        for texture in &mut self.textures {
            texture.in_use = false;
        }
        for buffer in &mut self.buffers {
            buffer.in_use = false;
        }
    }

    pub(crate) fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub(crate) fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Take a free compatible texture or create one.
    ///
    /// `descriptor` must be resolved against the viewport. Returns the
    /// texture and whether it came from the pool.
    pub(crate) fn acquire_texture(
        &mut self,
        device: &dyn Device,
        descriptor: &TextureDescriptor,
    ) -> FrameGraphResult<(GpuTexture, bool)> {
        if let Some(pooled) = self
            .textures
            .iter_mut()
            .find(|pooled| !pooled.in_use && pooled.descriptor.is_compatible_with(descriptor))
        {
            pooled.in_use = true;
            return Ok((pooled.texture, true));
        }

        let texture = device.create_texture(descriptor)?;
        self.textures.push(PooledTexture {
            texture,
            descriptor: descriptor.clone(),
            in_use: true,
        });
        log::info!(
            "FrameGraph: slot {} transient pool grew to {} textures ({:?} {}x{})",
            self.slot,
            self.textures.len(),
            descriptor.format,
            descriptor.size.width,
            descriptor.size.height
        );
        Ok((texture, false))
    }

    /// Take a free compatible buffer or create one.
    pub(crate) fn acquire_buffer(
        &mut self,
        device: &dyn Device,
        descriptor: &BufferDescriptor,
    ) -> FrameGraphResult<(GpuBuffer, bool)> {
        if let Some(pooled) = self
            .buffers
            .iter_mut()
            .find(|pooled| !pooled.in_use && pooled.descriptor.is_compatible_with(descriptor))
        {
            pooled.in_use = true;
            return Ok((pooled.buffer, true));
        }

        let buffer = device.create_buffer(descriptor)?;
        self.buffers.push(PooledBuffer {
            buffer,
            descriptor: descriptor.clone(),
            in_use: true,
        });
        log::info!(
            "FrameGraph: slot {} transient pool grew to {} buffers ({} bytes)",
            self.slot,
            self.buffers.len(),
            descriptor.size
        );
        Ok((buffer, false))
    }

    /// Destroy every pooled object. The pool is empty afterwards.
    pub(crate) fn destroy_all(&mut self, device: &dyn Device) {
        for pooled in self.textures.drain(..) {
            device.destroy_texture(pooled.texture);
        }
        for pooled in self.buffers.drain(..) {
            device.destroy_buffer(pooled.buffer);
        }
    }
}

/// Bind a pooled GPU object to every transient used by a scheduled pass.
///
/// Resources are visited in execution order, in the order each pass
/// declared them, so the binding sequence is deterministic. Every bound
/// object is registered with the tracker as [`ResourceState::Undefined`].
/// Transients no scheduled pass touches stay unbound.
pub(crate) fn allocate_transients(
    resources: &mut ResourceTable,
    passes: &[PassNode],
    order: &[PassHandle],
    pool: &mut TransientPool,
    device: &dyn Device,
    tracker: &mut dyn ResourceStateTracker,
    viewport: Extent3d,
) -> FrameGraphResult<AllocationStats> {
    let mut stats = AllocationStats::default();

    for &handle in order {
        let pass = &passes[handle.index()];
        for dependency in pass.inputs.iter().chain(pass.outputs.iter()) {
            let entry = resources.entry_mut(dependency.handle.index() as usize);
            let (resource, reused) = match &mut entry.origin {
                ResourceOrigin::TransientTexture { descriptor, bound } if bound.is_none() => {
                    let mut resolved = descriptor.resolve(viewport);
                    if resolved.label.is_none() {
                        resolved.label = Some(entry.name.clone());
                    }
                    let (texture, reused) = pool.acquire_texture(device, &resolved)?;
                    *bound = Some(texture);
                    (GpuResource::Texture(texture), reused)
                }
                ResourceOrigin::TransientBuffer { descriptor, bound } if bound.is_none() => {
                    let (buffer, reused) = pool.acquire_buffer(device, descriptor)?;
                    *bound = Some(buffer);
                    (GpuResource::Buffer(buffer), reused)
                }
                _ => continue,
            };

            log::trace!(
                "FrameGraph: bound transient '{}' to {:?} ({})",
                entry.name,
                resource,
                if reused { "pooled" } else { "new" }
            );
            tracker.register(resource, ResourceState::Undefined);
            stats.materialized += 1;
            if reused {
                stats.reused += 1;
            } else {
                stats.allocated += 1;
            }
        }
    }

    Ok(stats)
}

//! Resource handles and the per-frame resource table.

use std::fmt;

use crate::device::{GpuBuffer, GpuResource, GpuTexture};
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::graph::PassHandle;
use crate::types::{BufferDescriptor, TextureDescriptor};

/// Handle to a resource in the frame graph.
///
/// Handles carry the version their table entry was created with. The table
/// advances its version on every reset and every rollback, so a handle kept
/// across `begin_frame`, or leaked from a failed pass setup, is rejected
/// instead of silently aliasing a newer resource in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    /// Index into the resource table.
    index: u32,
    /// Entry version for validation.
    version: u32,
}

impl ResourceHandle {
    pub(crate) fn new(index: u32, version: u32) -> Self {
        Self { index, version }
    }

    /// Get the index of this resource.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Get the version of this handle.
    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Whether a resource is a texture or a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A texture.
    Texture,
    /// A buffer.
    Buffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Texture => write!(f, "texture"),
            Self::Buffer => write!(f, "buffer"),
        }
    }
}

/// Where the GPU object behind a table entry comes from.
#[derive(Debug, Clone)]
pub(crate) enum ResourceOrigin {
    /// Caller-owned texture. Never allocated or freed by the graph.
    ImportedTexture(GpuTexture),
    /// Caller-owned buffer. Never allocated or freed by the graph.
    ImportedBuffer(GpuBuffer),
    /// Graph-owned texture, bound to a pooled object during compilation.
    TransientTexture {
        descriptor: TextureDescriptor,
        bound: Option<GpuTexture>,
    },
    /// Graph-owned buffer, bound to a pooled object during compilation.
    TransientBuffer {
        descriptor: BufferDescriptor,
        bound: Option<GpuBuffer>,
    },
}

impl ResourceOrigin {
    pub(crate) fn kind(&self) -> ResourceKind {
        match self {
            Self::ImportedTexture(_) | Self::TransientTexture { .. } => ResourceKind::Texture,
            Self::ImportedBuffer(_) | Self::TransientBuffer { .. } => ResourceKind::Buffer,
        }
    }

    /// The live GPU object, if the entry is imported or already bound.
    pub(crate) fn live(&self) -> Option<GpuResource> {
        match self {
            Self::ImportedTexture(texture) => Some(GpuResource::Texture(*texture)),
            Self::ImportedBuffer(buffer) => Some(GpuResource::Buffer(*buffer)),
            Self::TransientTexture { bound, .. } => bound.map(GpuResource::Texture),
            Self::TransientBuffer { bound, .. } => bound.map(GpuResource::Buffer),
        }
    }

    fn unbind(&mut self) {
        match self {
            Self::TransientTexture { bound, .. } => *bound = None,
            Self::TransientBuffer { bound, .. } => *bound = None,
            Self::ImportedTexture(_) | Self::ImportedBuffer(_) => {}
        }
    }
}

/// One entry of the resource table.
#[derive(Debug, Clone)]
pub(crate) struct ResourceEntry {
    pub(crate) name: String,
    /// Table version at creation.
    version: u32,
    pub(crate) origin: ResourceOrigin,
    /// First declaring pass, in declaration order.
    pub(crate) first_pass: Option<PassHandle>,
    /// Last declaring pass, in declaration order.
    pub(crate) last_pass: Option<PassHandle>,
}

/// Fixed-capacity, versioned registry of the resources of one frame.
///
/// Entries are reused in place across frames: `reset` only rewinds the
/// length and advances the version, so names and descriptors keep their
/// allocations. New entries are stamped with the current version.
#[derive(Debug)]
pub(crate) struct ResourceTable {
    entries: Vec<ResourceEntry>,
    len: usize,
    capacity: usize,
    version: u32,
}

impl ResourceTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            len: 0,
            capacity,
            version: 1,
        }
    }

    /// Logically clear the table and invalidate every outstanding handle.
    pub(crate) fn reset(&mut self) {
        self.len = 0;
        self.version = self.version.wrapping_add(1);
    }

    /// Drop entries past `len`, used to roll back a failed pass setup.
    ///
    /// Entries below `len` keep their handles; handles to dropped entries
    /// become stale.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            self.version = self.version.wrapping_add(1);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn import_texture(
        &mut self,
        name: &str,
        texture: GpuTexture,
    ) -> FrameGraphResult<ResourceHandle> {
        self.insert(name, ResourceOrigin::ImportedTexture(texture))
    }

    pub(crate) fn import_buffer(
        &mut self,
        name: &str,
        buffer: GpuBuffer,
    ) -> FrameGraphResult<ResourceHandle> {
        self.insert(name, ResourceOrigin::ImportedBuffer(buffer))
    }

    pub(crate) fn create_transient_texture(
        &mut self,
        name: &str,
        descriptor: TextureDescriptor,
    ) -> FrameGraphResult<ResourceHandle> {
        self.insert(
            name,
            ResourceOrigin::TransientTexture {
                descriptor,
                bound: None,
            },
        )
    }

    pub(crate) fn create_transient_buffer(
        &mut self,
        name: &str,
        descriptor: BufferDescriptor,
    ) -> FrameGraphResult<ResourceHandle> {
        self.insert(
            name,
            ResourceOrigin::TransientBuffer {
                descriptor,
                bound: None,
            },
        )
    }

    fn insert(&mut self, name: &str, origin: ResourceOrigin) -> FrameGraphResult<ResourceHandle> {
        if self.len >= self.capacity {
            return Err(FrameGraphError::ResourceCapacityExceeded {
                capacity: self.capacity,
            });
        }

        let index = self.len;
        if let Some(entry) = self.entries.get_mut(index) {
            entry.name.clear();
            entry.name.push_str(name);
            entry.version = self.version;
            entry.origin = origin;
            entry.first_pass = None;
            entry.last_pass = None;
        } else {
            self.entries.push(ResourceEntry {
                name: name.to_owned(),
                version: self.version,
                origin,
                first_pass: None,
                last_pass: None,
            });
        }
        self.len += 1;

        Ok(ResourceHandle::new(index as u32, self.version))
    }

    /// Validate a handle and return its entry.
    ///
    /// A slot this table never handed out is invalid. A slot that was reset,
    /// rolled back or reissued since the handle was created is stale.
    pub(crate) fn get(&self, handle: ResourceHandle) -> FrameGraphResult<&ResourceEntry> {
        let index = handle.index as usize;
        let Some(entry) = self.entries.get(index) else {
            return Err(FrameGraphError::InvalidHandle(handle));
        };
        if index >= self.len || entry.version != handle.version {
            return Err(FrameGraphError::StaleHandle {
                handle,
                current: self.version,
            });
        }
        Ok(entry)
    }

    /// Validate a handle and check it names a resource of `kind`.
    pub(crate) fn expect_kind(
        &self,
        handle: ResourceHandle,
        kind: ResourceKind,
    ) -> FrameGraphResult<&ResourceEntry> {
        let entry = self.get(handle)?;
        let actual = entry.origin.kind();
        if actual != kind {
            return Err(FrameGraphError::ResourceKindMismatch {
                handle,
                expected: kind,
                actual,
            });
        }
        Ok(entry)
    }

    /// Extend the declaration-order lifetime window of a resource.
    pub(crate) fn update_lifetime(
        &mut self,
        handle: ResourceHandle,
        pass: PassHandle,
    ) -> FrameGraphResult<()> {
        self.get(handle)?;
        let entry = &mut self.entries[handle.index as usize];
        if entry.first_pass.is_none() {
            entry.first_pass = Some(pass);
        }
        entry.last_pass = Some(pass);
        Ok(())
    }

    /// Find the most recently registered resource with the given name.
    pub(crate) fn find(&self, name: &str) -> Option<ResourceHandle> {
        self.entries[..self.len]
            .iter()
            .rposition(|entry| entry.name == name)
            .map(|index| ResourceHandle::new(index as u32, self.entries[index].version))
    }

    pub(crate) fn resolve_texture(&self, handle: ResourceHandle) -> FrameGraphResult<GpuTexture> {
        let entry = self.expect_kind(handle, ResourceKind::Texture)?;
        match entry.origin.live() {
            Some(GpuResource::Texture(texture)) => Ok(texture),
            _ => Err(FrameGraphError::ResourceNotMaterialized {
                name: entry.name.clone(),
            }),
        }
    }

    pub(crate) fn resolve_buffer(&self, handle: ResourceHandle) -> FrameGraphResult<GpuBuffer> {
        let entry = self.expect_kind(handle, ResourceKind::Buffer)?;
        match entry.origin.live() {
            Some(GpuResource::Buffer(buffer)) => Ok(buffer),
            _ => Err(FrameGraphError::ResourceNotMaterialized {
                name: entry.name.clone(),
            }),
        }
    }

    /// Resolve any kind of resource to its live object.
    pub(crate) fn resolve(&self, handle: ResourceHandle) -> FrameGraphResult<GpuResource> {
        let entry = self.get(handle)?;
        entry
            .origin
            .live()
            .ok_or_else(|| FrameGraphError::ResourceNotMaterialized {
                name: entry.name.clone(),
            })
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut ResourceEntry {
        &mut self.entries[..self.len][index]
    }

    /// Clear every transient binding so compilation can run again.
    pub(crate) fn unbind_transients(&mut self) {
        for entry in &mut self.entries[..self.len] {
            entry.origin.unbind();
        }
    }
}

/// Resource access type for dependency tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAccess {
    /// Read-only access.
    Read,
    /// Write-only access.
    Write,
    /// Read and write access.
    ReadWrite,
}

impl ResourceAccess {
    /// Check if this access includes reading.
    pub fn reads(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Check if this access includes writing.
    pub fn writes(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

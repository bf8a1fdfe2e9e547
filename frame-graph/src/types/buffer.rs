//! Buffer types and descriptors.

use bitflags::bitflags;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be used as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be used as a storage buffer.
        const STORAGE = 1 << 3;
        /// Buffer can be used as an indirect buffer.
        const INDIRECT = 1 << 4;
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 5;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 6;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check whether a buffer created from `self` can stand in for `requested`.
    ///
    /// A larger pooled buffer satisfies a smaller request.
    pub fn is_compatible_with(&self, requested: &BufferDescriptor) -> bool {
        self.size >= requested.size && self.usage.contains(requested.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_larger_buffer_is_compatible() {
        let pooled = BufferDescriptor::new(4096, BufferUsage::STORAGE | BufferUsage::COPY_DST);
        let requested = BufferDescriptor::new(1024, BufferUsage::STORAGE).with_label("lights");
        assert!(pooled.is_compatible_with(&requested));
    }

    #[test]
    fn test_smaller_buffer_is_not_compatible() {
        let pooled = BufferDescriptor::new(512, BufferUsage::STORAGE);
        let requested = BufferDescriptor::new(1024, BufferUsage::STORAGE);
        assert!(!pooled.is_compatible_with(&requested));
    }

    #[test]
    fn test_missing_usage_is_not_compatible() {
        let pooled = BufferDescriptor::new(1024, BufferUsage::UNIFORM);
        let requested = BufferDescriptor::new(1024, BufferUsage::STORAGE);
        assert!(!pooled.is_compatible_with(&requested));
    }
}

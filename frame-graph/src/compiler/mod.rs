//! Frame graph compilation.
//!
//! Turns the passes declared for one frame into an execution order:
//!
//! 1. **Dependencies** - producer to consumer edges from the last writer of
//!    each resource, plus explicit edges ([`dependency`])
//! 2. **Culling** - drop passes that feed no side-effect pass ([`cull`])
//! 3. **Topological Sort** - Kahn's algorithm over survivors, with cycle
//!    detection ([`sort`])
//!
//! Transient allocation and submission assignment run afterwards, from
//! [`FrameGraph::compile`](crate::FrameGraph::compile), because they need
//! the device.
//!
//! All scratch storage lives in [`CompileScratch`] and is reused every frame.

pub(crate) mod cull;
pub(crate) mod dependency;
pub(crate) mod sort;

use std::collections::VecDeque;

use crate::error::FrameGraphResult;
use crate::graph::PassHandle;
use crate::graph::pass::PassNode;

/// Reusable buffers for compilation.
#[derive(Debug)]
pub(crate) struct CompileScratch {
    last_writer: Vec<Option<PassHandle>>,
    in_degree: Vec<Option<u32>>,
    queue: VecDeque<PassHandle>,
}

impl CompileScratch {
    pub(crate) fn new(max_passes: usize, max_resources: usize) -> Self {
        Self {
            last_writer: vec![None; max_resources],
            in_degree: Vec::with_capacity(max_passes),
            queue: VecDeque::with_capacity(max_passes),
        }
    }
}

/// Counts reported by [`compile_passes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CompileSummary {
    pub(crate) edges: usize,
    pub(crate) culled: usize,
}

/// Build edges, cull and sort `passes`, writing the execution order.
pub(crate) fn compile_passes(
    passes: &mut [PassNode],
    explicit: &[(PassHandle, PassHandle)],
    scratch: &mut CompileScratch,
    order: &mut Vec<PassHandle>,
) -> FrameGraphResult<CompileSummary> {
    let edges = {
        crate::profile_scope!("build_edges");
        dependency::build_edges(passes, explicit, &mut scratch.last_writer)
    };
    let culled = {
        crate::profile_scope!("cull");
        cull::cull(passes, &mut scratch.queue)
    };
    {
        crate::profile_scope!("sort");
        sort::sort(passes, &mut scratch.in_degree, &mut scratch.queue, order)?;
    }
    Ok(CompileSummary { edges, culled })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::resource::{ResourceAccess, ResourceHandle};
    use crate::graph::pass::ResourceDependency;
    use crate::types::ResourceState;

    /// A pass reading resources `inputs` and writing resources `outputs`.
    pub(crate) fn node(name: &str, inputs: &[u32], outputs: &[u32]) -> PassNode {
        let mut pass = PassNode::new();
        pass.reset(name);
        for &index in inputs {
            pass.inputs.push(ResourceDependency {
                handle: ResourceHandle::new(index, 1),
                access: ResourceAccess::Read,
                state: ResourceState::ShaderRead,
            });
        }
        for &index in outputs {
            pass.outputs.push(ResourceDependency {
                handle: ResourceHandle::new(index, 1),
                access: ResourceAccess::Write,
                state: ResourceState::RenderTarget,
            });
        }
        pass
    }

    #[test]
    fn test_compile_passes_summary() {
        let mut passes = vec![
            node("unused", &[], &[0]),
            node("shadow", &[], &[1]),
            node("scene", &[1], &[2]),
            node("present", &[2], &[3]),
        ];
        passes[3].side_effects = true;

        let mut scratch = CompileScratch::new(8, 8);
        let mut order = Vec::new();
        let summary = compile_passes(&mut passes, &[], &mut scratch, &mut order).unwrap();

        assert_eq!(summary, CompileSummary { edges: 2, culled: 1 });
        assert_eq!(
            order,
            vec![PassHandle::new(1), PassHandle::new(2), PassHandle::new(3)]
        );
    }

    #[test]
    fn test_scratch_is_reused() {
        let mut scratch = CompileScratch::new(4, 4);
        let mut order = Vec::new();
        for _ in 0..3 {
            let mut passes = vec![node("a", &[], &[0]), node("b", &[0], &[])];
            passes[1].side_effects = true;
            compile_passes(&mut passes, &[], &mut scratch, &mut order).unwrap();
            assert_eq!(order.len(), 2);
        }
        assert_eq!(scratch.last_writer.len(), 4);
    }
}

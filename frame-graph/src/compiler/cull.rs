//! Dead pass elimination.

use std::collections::VecDeque;

use crate::graph::PassHandle;
use crate::graph::pass::PassNode;

/// Cull every pass that does not transitively feed a side-effect pass.
///
/// Side-effect passes seed a FIFO work queue; the walk follows
/// `depends_on` backwards and revives each dependency once. Returns the
/// number of culled passes.
pub(crate) fn cull(passes: &mut [PassNode], queue: &mut VecDeque<PassHandle>) -> usize {
    queue.clear();
    for (index, pass) in passes.iter_mut().enumerate() {
        pass.culled = !pass.side_effects;
        if pass.side_effects {
            queue.push_back(PassHandle::new(index as u32));
        }
    }

    while let Some(handle) = queue.pop_front() {
        for i in 0..passes[handle.index()].depends_on.len() {
            let dependency = passes[handle.index()].depends_on[i];
            let node = &mut passes[dependency.index()];
            if node.culled {
                node.culled = false;
                queue.push_back(dependency);
            }
        }
    }

    let mut culled = 0;
    for pass in passes.iter() {
        if pass.culled {
            culled += 1;
            log::debug!("FrameGraph: culled pass '{}'", pass.name);
            #[cfg(debug_assertions)]
            if pass.dependents.is_empty() {
                log::warn!(
                    "FrameGraph: pass '{}' has no side effects and nothing consumes its outputs",
                    pass.name
                );
            }
        }
    }
    culled
}

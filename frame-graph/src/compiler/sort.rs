//! Topological ordering of surviving passes.

use std::collections::VecDeque;

use crate::error::{FrameGraphError, FrameGraphResult};
use crate::graph::PassHandle;
use crate::graph::pass::PassNode;

/// Order the non-culled passes with Kahn's algorithm.
///
/// Only edges between surviving passes count toward in-degree; culled
/// passes carry a `None` sentinel and are skipped. The queue is seeded in
/// declaration order and is FIFO, so identical declarations always give
/// the same order.
///
/// On success `order` holds the surviving passes and every one of them has
/// its `execution_index` set. On a cycle `order` is cleared and the error
/// names the passes that could not be placed.
pub(crate) fn sort(
    passes: &mut [PassNode],
    in_degree: &mut Vec<Option<u32>>,
    queue: &mut VecDeque<PassHandle>,
    order: &mut Vec<PassHandle>,
) -> FrameGraphResult<()> {
    order.clear();
    queue.clear();
    in_degree.clear();

    for pass in passes.iter_mut() {
        pass.execution_index = None;
        in_degree.push((!pass.culled).then_some(0));
    }

    let mut surviving = 0;
    for index in 0..passes.len() {
        if in_degree[index].is_none() {
            continue;
        }
        surviving += 1;

        let count = passes[index]
            .depends_on
            .iter()
            .filter(|dependency| !passes[dependency.index()].culled)
            .count() as u32;
        in_degree[index] = Some(count);
        if count == 0 {
            queue.push_back(PassHandle::new(index as u32));
        }
    }

    while let Some(handle) = queue.pop_front() {
        passes[handle.index()].execution_index = Some(order.len() as u32);
        order.push(handle);

        for i in 0..passes[handle.index()].dependents.len() {
            let dependent = passes[handle.index()].dependents[i];
            if let Some(degree) = &mut in_degree[dependent.index()] {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() != surviving {
        let scheduled = order.len();
        let unresolved = passes
            .iter()
            .filter(|pass| !pass.culled && pass.execution_index.is_none())
            .map(|pass| pass.name.clone())
            .collect();

        for &handle in order.iter() {
            passes[handle.index()].execution_index = None;
        }
        order.clear();

        return Err(FrameGraphError::CyclicDependency {
            scheduled,
            surviving,
            unresolved,
        });
    }

    Ok(())
}

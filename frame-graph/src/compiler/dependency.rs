//! Producer to consumer edges from the last-writer map.

use crate::graph::PassHandle;
use crate::graph::pass::PassNode;

/// Derive dependency edges between `passes`, then add `explicit` edges.
///
/// Passes are visited in declaration order. Each input links the pass to
/// the most recent earlier writer of that resource; each output then makes
/// the pass the new last writer. A resource nobody wrote yet adds no edge,
/// and writes never depend on earlier writes.
///
/// `last_writer` must have one slot per resource table entry. Explicit edges
/// are `(dependent, dependency)` pairs with in-range handles.
pub(crate) fn build_edges(
    passes: &mut [PassNode],
    explicit: &[(PassHandle, PassHandle)],
    last_writer: &mut [Option<PassHandle>],
) -> usize {
    last_writer.fill(None);
    for pass in passes.iter_mut() {
        pass.depends_on.clear();
        pass.dependents.clear();
    }

    let mut edges = 0;
    for index in 0..passes.len() {
        let current = PassHandle::new(index as u32);

        for input in 0..passes[index].inputs.len() {
            let resource = passes[index].inputs[input].handle.index() as usize;
            if let Some(writer) = last_writer[resource]
                && writer != current
                && passes[index].add_depends_on(writer)
            {
                passes[writer.index()].dependents.push(current);
                edges += 1;
            }
        }

        for output in &passes[index].outputs {
            last_writer[output.handle.index() as usize] = Some(current);
        }
    }

    for &(dependent, dependency) in explicit {
        if passes[dependent.index()].add_depends_on(dependency) {
            passes[dependency.index()].dependents.push(dependent);
            edges += 1;
        }
    }

    edges
}

//! The local cut enumerator for LUT-network rewriting (spec §4.8.5):
//! `lutcuts_pm`'s contract, implemented natively as a bounded DFS since its
//! source (`lutcuts_pmg.h`) was filtered out of the retrieved original
//! source. Every emitted cut is acyclic, bounded in leaves/outer-fanouts/
//! total LUTs, and has no path leaving and re-entering except through an
//! outer fanout, matching the three guarantees spec §4.8.5 fixes.

use std::collections::HashSet;

use crate::graph::{CellPtr, Input, LutGraph};

/// One candidate local cut rooted at some LUT, per the `lutcuts_pm`
/// contract of spec §4.8.5.
#[derive(Debug, Clone)]
pub struct LocalCut<L> {
    /// Boundary leaves of this cut, in a stable order (deduplicated): a
    /// host-external wire, or a graph cell that was not absorbed into the
    /// cut (an internal LUT this cut treats as a black box).
    pub leaves: Vec<Input<L>>,
    /// Internal cells of the cut whose output is also consumed by a cell
    /// outside the cut (an "outer fanout"), spec §4.8.5.
    pub outerfans: Vec<CellPtr>,
    /// Every cell wholly inside the cut, root included, in topological
    /// order (leaves-adjacent first).
    pub cells: Vec<CellPtr>,
}

impl<L> LocalCut<L> {
    pub fn nluts(&self) -> usize {
        self.cells.len()
    }
}

/// Enumerates local cuts rooted at `root`, growing the cut by repeatedly
/// absorbing one more internal-cell predecessor at a time (a simple
/// greedy-frontier DFS bounded by `max_nluts`/`max_nleaves`), skipping
/// blacklisted cells (spec §4.8 step 6) and any cell whose removal would
/// leave more than `max_nouterfans` cells outside the cut consuming an
/// inside cell's output.
///
/// This does not attempt to be exhaustive the way a priority-cut or
/// maximum-fanout-free-cone enumerator would be: it yields the single
/// greedily-grown maximal cut plus every prefix of the absorption order,
/// which is sufficient for the rewriter's weight-gated accept/reject loop
/// (spec §4.8 steps 1–6 only ever need *a* cut to evaluate, not all of
/// them).
pub fn enumerate_cuts<L: Copy + Eq + std::hash::Hash>(
    graph: &LutGraph<L>,
    fanouts: &std::collections::HashMap<CellPtr, Vec<CellPtr>>,
    root: CellPtr,
    max_nluts: usize,
    max_nouterfans: usize,
    max_nleaves: usize,
) -> Vec<LocalCut<L>> {
    let mut cuts = Vec::new();
    let mut inside: HashSet<CellPtr> = HashSet::new();
    inside.insert(root);
    let mut order = vec![root];

    loop {
        if let Some(cut) = materialize_cut(graph, fanouts, &inside, &order, max_nouterfans, max_nleaves) {
            cuts.push(cut);
        } else if !cuts.is_empty() {
            break
        }

        if order.len() >= max_nluts {
            break
        }

        // Grow by absorbing the fanin of the most-recently-added cell that
        // is itself an internal LUT cell, not blacklisted, and not already
        // inside. Picking the newest cell's fanins keeps the cut
        // connected and acyclic by construction.
        let mut grew = false;
        for &candidate in order.clone().iter().rev() {
            let cell = &graph.cells[tmap_arena::Ptr::from(candidate)];
            for input in &cell.inputs {
                if let Input::Cell(src) = input {
                    if !inside.contains(src) && !graph.is_blacklisted(*src) {
                        inside.insert(*src);
                        order.push(*src);
                        grew = true;
                        break
                    }
                }
            }
            if grew {
                break
            }
        }
        if !grew {
            break
        }
    }

    cuts
}

fn materialize_cut<L: Copy + Eq + std::hash::Hash>(
    graph: &LutGraph<L>,
    fanouts: &std::collections::HashMap<CellPtr, Vec<CellPtr>>,
    inside: &HashSet<CellPtr>,
    order: &[CellPtr],
    max_nouterfans: usize,
    max_nleaves: usize,
) -> Option<LocalCut<L>> {
    let mut leaves: Vec<Input<L>> = Vec::new();
    for &p in order {
        let cell = &graph.cells[tmap_arena::Ptr::from(p)];
        for input in &cell.inputs {
            let is_boundary = match input {
                Input::External(_) => true,
                Input::Cell(src) => !inside.contains(src),
            };
            if is_boundary {
                // dedup by value identity; L is Copy+Eq+Hash but not
                // necessarily Ord, so a linear scan keeps the bound small
                // (cuts are tiny, `max_nleaves` in the single digits).
                if !leaves.iter().any(|existing| existing == input) {
                    leaves.push(*input);
                }
            }
        }
    }
    if leaves.len() > max_nleaves {
        return None
    }

    let mut outerfans: Vec<CellPtr> = Vec::new();
    for &p in order {
        let consumers = fanouts.get(&p).map(|v| v.as_slice()).unwrap_or(&[]);
        let has_outer_consumer = consumers.iter().any(|c| !inside.contains(c)) || graph.is_output(p);
        if has_outer_consumer {
            outerfans.push(p);
        }
    }
    if outerfans.len() > max_nouterfans {
        return None
    }

    Some(LocalCut { leaves, outerfans, cells: order.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmap_lut::TruthTable;

    fn and_table() -> TruthTable {
        TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4])
    }

    #[test]
    fn single_lut_cut_has_no_internal_cells_beyond_root() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(and_table(), vec![Input::External(0), Input::External(1)]);
        g.outputs.push(Input::Cell(a));
        let fanouts = g.fanouts();
        let cuts = enumerate_cuts(&g, &fanouts, a, 20, 1, 9);
        assert!(cuts.iter().any(|c| c.cells == vec![a]));
    }

    #[test]
    fn cut_grows_to_absorb_single_fanout_predecessor() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(and_table(), vec![Input::External(0), Input::External(1)]);
        let b = g.add_cell(and_table(), vec![Input::Cell(a), Input::External(2)]);
        g.outputs.push(Input::Cell(b));
        let fanouts = g.fanouts();
        let cuts = enumerate_cuts(&g, &fanouts, b, 20, 1, 9);
        let biggest = cuts.iter().max_by_key(|c| c.nluts()).unwrap();
        assert_eq!(biggest.nluts(), 2);
        assert_eq!(biggest.leaves.len(), 3);
    }
}

//! The rewrite layer's module-wide view of already-mapped LUT cells (spec
//! §4.7–§4.9). Unlike [`tmap_lut::LutNetwork`], which models a single
//! decomposition rooted at one output, `LutGraph` models a whole module:
//! many cells, each with its own fanout, any of which may also be a primary
//! output. Grounded on the `$lut`/`$_NOT_` cell vocabulary of spec §6 — a
//! `$_NOT_` cell is representable directly as an arity-1 `LutCell` whose
//! table is `[true, false]`, which is what [`crate::lutnot`] relies on.
//!
//! `L` is the host's external wire identifier; this crate never looks
//! inside it, so the facade crate can use whatever wire-id type its module
//! model prefers.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use smallvec::SmallVec;
use tmap_arena::{ptr_struct, Arena};
use tmap_lut::TruthTable;

ptr_struct!(CellPtr);

/// One input to a [`LutCell`]: either an external wire the host module
/// supplies, or the output of another cell in this graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input<L> {
    External(L),
    Cell(CellPtr),
}

/// A single mapped LUT cell, with the depth-analysis annotations of spec
/// §4.7 attached directly (mirrors the `depth`/`depth_envelope`/`critical`
/// cell attributes of spec §6).
#[derive(Debug, Clone)]
pub struct LutCell<L> {
    pub table: TruthTable,
    pub inputs: SmallVec<[Input<L>; 6]>,
    pub depth: Option<u32>,
    pub depth_envelope: Option<u32>,
    pub critical: bool,
}

impl<L> LutCell<L> {
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }
}

/// A module's worth of LUT cells plus which wires are primary outputs.
/// Mutated in place by the rewriter: `blacklist` marks cells no longer to
/// be considered as cut members (spec §4.8 step 6), `redirect_output`
/// retargets a primary output to a freshly emitted cell.
#[derive(Debug, Clone)]
pub struct LutGraph<L: Copy + Eq + Hash> {
    pub cells: Arena<LutCell<L>>,
    pub outputs: Vec<Input<L>>,
    blacklisted: HashSet<CellPtr>,
}

impl<L: Copy + Eq + Hash> LutGraph<L> {
    pub fn new() -> Self {
        LutGraph { cells: Arena::new(), outputs: Vec::new(), blacklisted: HashSet::new() }
    }

    pub fn add_cell(&mut self, table: TruthTable, inputs: impl Into<SmallVec<[Input<L>; 6]>>) -> CellPtr {
        self.cells
            .insert(LutCell { table, inputs: inputs.into(), depth: None, depth_envelope: None, critical: false })
            .into()
    }

    pub fn is_blacklisted(&self, p: CellPtr) -> bool {
        self.blacklisted.contains(&p)
    }

    /// Marks `p` as no longer eligible to be considered by cut enumeration
    /// (spec §4.8 step 6: "blacklist the old cut cells in the pattern
    /// matcher"). The cell stays in the arena since other cells' `inputs`
    /// may still (transiently) reference it until the caller rewires them.
    pub fn blacklist(&mut self, p: CellPtr) {
        self.blacklisted.insert(p);
    }

    /// Every cell's direct consumers: other cells that name it as an input,
    /// plus a synthetic count of module-output uses. Used both for the
    /// `nouterfans` bound of spec §4.8.5 and the sink set of §4.7's
    /// envelope sweep.
    pub fn fanouts(&self) -> HashMap<CellPtr, Vec<CellPtr>> {
        let mut out: HashMap<CellPtr, Vec<CellPtr>> = HashMap::new();
        for p in self.cells.ptrs() {
            out.entry(p.into()).or_default();
        }
        for p in self.cells.ptrs() {
            let cell = &self.cells[p];
            for input in &cell.inputs {
                if let Input::Cell(src) = input {
                    out.entry(*src).or_default().push(p.into());
                }
            }
        }
        out
    }

    pub fn is_output(&self, p: CellPtr) -> bool {
        self.outputs.iter().any(|o| matches!(o, Input::Cell(q) if *q == p))
    }

    /// Topological order over all live (non-blacklisted) cells reachable
    /// from the module's outputs, leaves first.
    pub fn toposort(&self) -> Vec<CellPtr> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<(CellPtr, bool)> = self
            .outputs
            .iter()
            .filter_map(|i| match i {
                Input::Cell(p) => Some((*p, false)),
                Input::External(_) => None,
            })
            .collect();
        while let Some((p, expanded)) = stack.pop() {
            if expanded {
                order.push(p);
                continue
            }
            if !visited.insert(p) {
                continue
            }
            stack.push((p, true));
            for input in &self.cells[tmap_arena::Ptr::from(p)].inputs {
                if let Input::Cell(q) = input {
                    stack.push((*q, false));
                }
            }
        }
        order
    }

    /// Rewires every cell (and the output list) that names `from` as an
    /// input to instead name `to` (spec §4.8 step 6: "redirect the root's
    /// output wire to a fresh net").
    pub fn redirect(&mut self, from: CellPtr, to: Input<L>) {
        for p in self.cells.ptrs().collect::<Vec<_>>() {
            for input in &mut self.cells[p].inputs {
                if *input == Input::Cell(from) {
                    *input = to;
                }
            }
        }
        for o in &mut self.outputs {
            if *o == Input::Cell(from) {
                *o = to;
            }
        }
    }
}

impl<L: Copy + Eq + Hash> Default for LutGraph<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv_table() -> TruthTable {
        TruthTable::new(vec![0], vec![true, false], vec![false, false])
    }

    #[test]
    fn toposort_orders_leaves_before_consumers() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(inv_table(), vec![Input::External(0)]);
        let b = g.add_cell(inv_table(), vec![Input::Cell(a)]);
        g.outputs.push(Input::Cell(b));
        assert_eq!(g.toposort(), vec![a, b]);
    }

    #[test]
    fn fanouts_counts_internal_consumers() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(inv_table(), vec![Input::External(0)]);
        let b = g.add_cell(inv_table(), vec![Input::Cell(a)]);
        let c = g.add_cell(inv_table(), vec![Input::Cell(a)]);
        g.outputs.extend([Input::Cell(b), Input::Cell(c)]);
        let fo = g.fanouts();
        assert_eq!(fo[&a].len(), 2);
    }

    #[test]
    fn redirect_rewires_consumers_and_outputs() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(inv_table(), vec![Input::External(0)]);
        let b = g.add_cell(inv_table(), vec![Input::Cell(a)]);
        g.outputs.push(Input::Cell(a));
        let fresh = g.add_cell(inv_table(), vec![Input::External(1)]);
        g.redirect(a, Input::Cell(fresh));
        assert_eq!(g.cells[tmap_arena::Ptr::from(b)].inputs[0], Input::Cell(fresh));
        assert_eq!(g.outputs[0], Input::Cell(fresh));
    }
}

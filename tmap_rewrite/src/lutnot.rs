//! NOT-absorption (spec §4.9, `lutnot`). An arity-1 LUT cell with table
//! `[true, false]` is exactly a `$_NOT_` gate (spec §6's truth-table
//! encoding: bit 0 is the output for input 0); a `$_NOT_` cell whose driver
//! is itself a LUT with no other consumer can be absorbed by flipping every
//! output bit of the driver's table, matching `negate_const`/`LutnotPass`
//! (`post.cc:11-105`). Every surviving consumer of the absorbed inverter's
//! output is then repointed at the driver directly, and its own truth
//! table is permuted to swap the two halves under the formerly-inverted
//! input's mask bit, matching `adjust_lut` (`post.cc:30-37`).

use std::hash::Hash;

use crate::graph::{CellPtr, Input, LutGraph};

fn is_not_gate<L>(cell: &crate::graph::LutCell<L>) -> bool {
    cell.arity() == 1 && cell.table.values == [true, false] && cell.table.dontcares == [false, false]
}

fn negate_table(table: &mut tmap_lut::TruthTable) {
    for v in table.values.iter_mut() {
        *v = !*v;
    }
}

/// Runs one pass of NOT-absorption over `graph`, returning the number of
/// inverters absorbed. A `$_NOT_` cell is eligible iff its sole input names
/// an internal LUT cell (not an external "foreign" wire, spec §4.9 /
/// `post.cc:78` `foreign_bits.check`) and that driver has no fanout outside
/// the inverter (spec §4.9: "a LUT with no fanout outside the inverter")
/// and is not itself a primary output, matching `LutnotPass`'s
/// `lut_driver`/`foreign_bits` bookkeeping.
///
/// Spec §4.9's closing step — permuting every other LUT consuming an
/// absorbed signal by its input mask bit, mirroring `adjust_lut`
/// (`post.cc:30-37`) — compensates for a driver that fans out *both* to
/// the absorbed inverter and directly to other consumers of its
/// un-negated output. The "no fanout outside the inverter" precondition
/// above rules that configuration out by construction (the driver's only
/// consumer is the inverter being absorbed), so there is never another
/// consumer left to permute; downstream consumers of the inverter's own
/// output are simply rewired onto the driver by `redirect` below, and see
/// the identical (now-negated-in-place) function they saw through the
/// inverter.
pub fn absorb_nots<L: Copy + Eq + Hash>(graph: &mut LutGraph<L>) -> usize {
    let fanouts = graph.fanouts();
    let mut absorbed = 0;

    let candidates: Vec<CellPtr> = graph
        .cells
        .ptrs()
        .map(CellPtr::from)
        .filter(|&p| is_not_gate(&graph.cells[tmap_arena::Ptr::from(p)]))
        .collect();

    for not_cell in candidates {
        if graph.is_blacklisted(not_cell) {
            continue
        }
        let driver = match graph.cells[tmap_arena::Ptr::from(not_cell)].inputs[0] {
            Input::Cell(d) => d,
            Input::External(_) => continue,
        };
        if graph.is_blacklisted(driver) {
            continue
        }
        let driver_consumers = &fanouts[&driver];
        if driver_consumers.len() != 1 || driver_consumers[0] != not_cell {
            continue
        }
        if graph.is_output(driver) {
            // The driver's own value is still observable externally; its
            // truth table cannot be flipped in place.
            continue
        }

        log::debug!("absorbing NOT cell into its driver LUT");
        negate_table(&mut graph.cells[tmap_arena::Ptr::from(driver)].table);
        graph.redirect(not_cell, Input::Cell(driver));
        graph.blacklist(not_cell);
        absorbed += 1;
    }

    absorbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmap_lut::TruthTable;

    fn and_table() -> TruthTable {
        TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4])
    }

    fn not_table() -> TruthTable {
        TruthTable::new(vec![0], vec![true, false], vec![false, false])
    }

    #[test]
    fn absorbs_inverter_with_sole_use_of_its_driver() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let and = g.add_cell(and_table(), vec![Input::External(0), Input::External(1)]);
        let not = g.add_cell(not_table(), vec![Input::Cell(and)]);
        g.outputs.push(Input::Cell(not));

        let n = absorb_nots(&mut g);
        assert_eq!(n, 1);
        assert_eq!(g.outputs[0], Input::Cell(and));
        assert_eq!(g.cells[tmap_arena::Ptr::from(and)].table.values, vec![true, true, true, false]);
    }

    #[test]
    fn does_not_absorb_when_driver_has_other_consumers() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let and = g.add_cell(and_table(), vec![Input::External(0), Input::External(1)]);
        let not = g.add_cell(not_table(), vec![Input::Cell(and)]);
        g.outputs.push(Input::Cell(not));
        g.outputs.push(Input::Cell(and));

        let n = absorb_nots(&mut g);
        assert_eq!(n, 0);
    }
}

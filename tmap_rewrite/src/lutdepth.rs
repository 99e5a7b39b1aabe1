//! LUT-depth analysis (spec §4.7), external to mapping but feeding the
//! rewriter: per-cell `depth`/`depth_envelope`, and the `critical` flag.
//! Grounded on `lutdepth.cc`'s `max_depth` sweep, extended per spec §4.7
//! with the envelope/critical annotations that `lutdepth.cc` itself does
//! not compute (its retained source only prints `max_depth`).

use std::collections::HashMap;
use std::hash::Hash;

use crate::graph::{CellPtr, Input, LutGraph};

/// Computes `depth(c) = 1 + max(depth(predecessor), 0)` for every live cell
/// in topological order (grounded on `lutdepth.cc`'s `TopoSort` over
/// `$lut` cells), then sweeps reverse-topologically to assign
/// `envelope(c) = min over sinks s of envelope(s) - 1`, seeded at
/// `module_target` for every sink (a cell with no internal consumer, i.e.
/// a primary output or dead end). Marks `critical` wherever
/// `depth(c) == envelope(c)`.
///
/// If `target` is `Some(t)` with `t < attainable_depth`, logs a warning and
/// falls back to the attainable depth (spec §7 "User configuration
/// mistake"), matching the fallback the spec calls out explicitly rather
/// than erroring.
pub fn compute_depth<L: Copy + Eq + Hash>(graph: &mut LutGraph<L>, target: Option<u32>) {
    let order = graph.toposort();

    let mut depth: HashMap<CellPtr, u32> = HashMap::new();
    for &p in &order {
        let mut d = 1;
        for input in graph.cells[tmap_arena::Ptr::from(p)].inputs.clone() {
            if let Input::Cell(src) = input {
                d = d.max(depth.get(&src).copied().unwrap_or(0) + 1);
            }
        }
        depth.insert(p, d);
    }

    let attainable = depth.values().copied().max().unwrap_or(0);
    let module_target = match target {
        Some(t) if t >= attainable => t,
        Some(t) => {
            log::warn!(
                "requested lutdepth target {t} is below the attainable depth {attainable}; using {attainable}"
            );
            attainable
        }
        None => attainable,
    };

    let fanouts = graph.fanouts();
    let mut envelope: HashMap<CellPtr, u32> = HashMap::new();
    for &p in order.iter().rev() {
        let sinks = &fanouts[&p];
        let from_sinks = sinks.iter().filter_map(|s| envelope.get(s).copied().map(|e| e.saturating_sub(1)));
        let mut e = from_sinks.min().unwrap_or(u32::MAX);
        if sinks.is_empty() || graph.is_output(p) {
            // A cell with no internal consumer is itself a sink: seed it at
            // `module_target` directly, matching spec §4.7's "initialized
            // to `module_target` at sinks".
            e = e.min(module_target);
        }
        envelope.insert(p, e);
    }

    for &p in &order {
        let d = depth[&p];
        let e = envelope[&p];
        let cell = &mut graph.cells[tmap_arena::Ptr::from(p)];
        cell.depth = Some(d);
        cell.depth_envelope = Some(e);
        cell.critical = d == e;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmap_lut::TruthTable;

    fn buf_table() -> TruthTable {
        TruthTable::new(vec![0], vec![false, true], vec![false, false])
    }

    #[test]
    fn linear_chain_has_increasing_depth_and_all_critical() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(buf_table(), vec![Input::External(0)]);
        let b = g.add_cell(buf_table(), vec![Input::Cell(a)]);
        let c = g.add_cell(buf_table(), vec![Input::Cell(b)]);
        g.outputs.push(Input::Cell(c));

        compute_depth(&mut g, None);

        assert_eq!(g.cells[tmap_arena::Ptr::from(a)].depth, Some(1));
        assert_eq!(g.cells[tmap_arena::Ptr::from(b)].depth, Some(2));
        assert_eq!(g.cells[tmap_arena::Ptr::from(c)].depth, Some(3));
        assert!(g.cells[tmap_arena::Ptr::from(a)].critical);
        assert!(g.cells[tmap_arena::Ptr::from(b)].critical);
        assert!(g.cells[tmap_arena::Ptr::from(c)].critical);
    }

    #[test]
    fn off_critical_path_cell_has_slack() {
        let mut g: LutGraph<u32> = LutGraph::new();
        let a = g.add_cell(buf_table(), vec![Input::External(0)]);
        let b = g.add_cell(buf_table(), vec![Input::Cell(a)]);
        let c = g.add_cell(buf_table(), vec![Input::Cell(b)]);
        // `side` only reaches depth 1 but the module target is pulled to 3
        // by the `c` chain, so it is not critical.
        let side = g.add_cell(buf_table(), vec![Input::External(1)]);
        g.outputs.push(Input::Cell(c));
        g.outputs.push(Input::Cell(side));

        compute_depth(&mut g, None);

        assert_eq!(g.cells[tmap_arena::Ptr::from(side)].depth, Some(1));
        assert!(!g.cells[tmap_arena::Ptr::from(side)].critical);
    }
}

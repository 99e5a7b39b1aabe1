//! Translating a host [`Module`] into the graph/rewrite layers' own models
//! (spec §4.1 import, §4.8 "the rewriter is host-agnostic"). Both
//! directions are memoized recursions over the module's driver index, since
//! a wire may be read by many cells but must resolve to one graph node.

use std::collections::HashMap;

use tmap_aig::{Edge, Network, NodePtr};
use tmap_lut::TruthTable;
use tmap_rewrite::{Input, LutGraph};

use crate::host::{Cell, Module, WireId};

/// Imports `module`'s `And`/`Not`/`Reg`/`Const` cells into a fresh
/// [`Network`] (spec §4.1). Returns the network plus whether any
/// `Lut`/`Gate2`/`Foreign` cell was reached while resolving an AIG input —
/// the import itself does not fail on these (spec §7: "the node is flagged
/// impure_module, non-recognized cells remain in place"), but a caller that
/// requires a pure AIG module can inspect the flag.
///
/// A wire with no driving cell becomes a primary input. `Not` cells fold
/// into edge negation rather than becoming their own node (spec §4.1.1: AIG
/// nodes are never themselves inverters); `Reg` cells extend the consuming
/// edge's lag by one stage, threading the register's init value onto
/// `initvals`.
pub fn import_aig(module: &Module) -> (Network, bool) {
    let driver_index = module.driver_index();
    let mut net = Network::new();
    let mut resolved: HashMap<WireId, NodePtr> = HashMap::new();
    let mut impure = false;

    fn resolve(
        module: &Module,
        driver_index: &HashMap<WireId, usize>,
        net: &mut Network,
        resolved: &mut HashMap<WireId, NodePtr>,
        impure: &mut bool,
        wire: WireId,
    ) -> Edge {
        let Some(&cell_idx) = driver_index.get(&wire) else {
            let p = *resolved
                .entry(wire)
                .or_insert_with(|| net.add_pi(module.name_of(wire).map(str::to_string)));
            return Edge::to(p)
        };

        match &module.cells[cell_idx] {
            Cell::And { a, b, y } => {
                if let Some(&p) = resolved.get(y) {
                    return Edge::to(p)
                }
                let ea = resolve(module, driver_index, net, resolved, impure, *a);
                let eb = resolve(module, driver_index, net, resolved, impure, *b);
                let p = net.add_and(ea, eb, module.name_of(*y).map(str::to_string));
                resolved.insert(*y, p);
                Edge::to(p)
            }
            Cell::Not { a, .. } => {
                let inner = resolve(module, driver_index, net, resolved, impure, *a);
                inner.inverted()
            }
            Cell::Reg { d, init, .. } => {
                let inner = resolve(module, driver_index, net, resolved, impure, *d);
                let mut initvals = inner.initvals.clone();
                initvals.push(*init);
                Edge { negated: inner.negated, lag: inner.lag + 1, initvals, target: inner.target }
            }
            Cell::Const { value, .. } => Edge::constant(*value),
            Cell::Lut { .. } | Cell::Gate2 { .. } | Cell::Foreign { .. } => {
                *impure = true;
                let p = *resolved
                    .entry(wire)
                    .or_insert_with(|| net.add_pi(module.name_of(wire).map(str::to_string)));
                Edge::to(p)
            }
        }
    }

    for (name, wire) in &module.outputs {
        let edge = resolve(module, &driver_index, &mut net, &mut resolved, &mut impure, *wire);
        net.add_po(edge, Some(name.clone()));
    }

    (net, impure)
}

/// Imports `module`'s `Lut`/`Not` cells into a fresh [`LutGraph`] keyed by
/// host wire id (spec §4.8: the rewriter operates on whatever graph the
/// host hands it). `And`/`Reg`/`Gate2`/`Foreign`-driven wires, and wires
/// with no driver at all, become [`Input::External`] leaves — the rewriter
/// only ever looks inside `$lut`/`$_NOT_` cells.
pub fn import_lutgraph(module: &Module) -> LutGraph<WireId> {
    let driver_index = module.driver_index();
    let mut graph = LutGraph::new();
    let mut resolved: HashMap<WireId, Input<WireId>> = HashMap::new();

    fn not_table() -> TruthTable {
        TruthTable::new(vec![0], vec![true, false], vec![false, false])
    }

    fn resolve(
        module: &Module,
        driver_index: &HashMap<WireId, usize>,
        graph: &mut LutGraph<WireId>,
        resolved: &mut HashMap<WireId, Input<WireId>>,
        wire: WireId,
    ) -> Input<WireId> {
        if let Some(input) = resolved.get(&wire) {
            return *input
        }
        let input = match driver_index.get(&wire).map(|&i| &module.cells[i]) {
            Some(Cell::Lut { inputs, table, .. }) => {
                let cell_inputs: Vec<Input<WireId>> = inputs
                    .iter()
                    .map(|&w| resolve(module, driver_index, graph, resolved, w))
                    .collect();
                Input::Cell(graph.add_cell(table.clone(), cell_inputs))
            }
            Some(Cell::Not { a, .. }) => {
                let inner = resolve(module, driver_index, graph, resolved, *a);
                Input::Cell(graph.add_cell(not_table(), vec![inner]))
            }
            _ => Input::External(wire),
        };
        resolved.insert(wire, input);
        input
    }

    for (_, wire) in &module.outputs {
        let input = resolve(module, &driver_index, &mut graph, &mut resolved, *wire);
        graph.outputs.push(input);
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_cell_folds_into_edge_negation_not_a_node() {
        let mut m = Module::new();
        let a = m.wire("a");
        let y = m.wire("y");
        m.add_not(a, y);
        m.add_output("y", y);
        let (net, impure) = import_aig(&m);
        assert!(!impure);
        // one PI (a) plus the PO alias node; no extra AND node for the NOT.
        assert_eq!(net.pis().len(), 1);
        let po = net.pos()[0];
        assert!(net.node(po).ins[0].negated);
    }

    #[test]
    fn reg_cell_extends_lag_by_one_stage() {
        let mut m = Module::new();
        let d = m.wire("d");
        let q = m.wire("q");
        m.add_reg(d, q, tmap_lut::Trit::Zero);
        m.add_output("q", q);
        let (net, _) = import_aig(&m);
        let po = net.pos()[0];
        assert_eq!(net.node(po).ins[0].lag, 1);
    }

    #[test]
    fn foreign_driven_wire_sets_impure_flag() {
        let mut m = Module::new();
        let x = m.wire("x");
        let y = m.wire("y");
        m.cells.push(Cell::Foreign { kind: "$mystery".into(), inputs: vec![x], y });
        let a = m.wire("a");
        let out = m.wire("out");
        m.add_and(a, y, out);
        m.add_output("out", out);
        let (_net, impure) = import_aig(&m);
        assert!(impure);
    }

    #[test]
    fn lutgraph_import_treats_not_as_inline_arity_one_lut() {
        let mut m = Module::new();
        let a = m.wire("a");
        let y = m.wire("y");
        m.add_not(a, y);
        m.add_output("y", y);
        let g = import_lutgraph(&m);
        assert_eq!(g.outputs.len(), 1);
        assert!(matches!(g.outputs[0], Input::Cell(_)));
    }
}

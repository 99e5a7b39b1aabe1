//! Translating the graph/mapping/rewrite layers' results back into a host
//! [`Module`] (the reverse of [`crate::import`]). Three independent
//! directions are needed: a structural AIG round-trip (spec §8.2-10, used
//! when no mapping pass has run), a mapped-network export (spec §4.4
//! orchestration tail, §6 cell vocabulary), and a rewritten-`LutGraph`
//! export (spec §4.8 step 6 onward).

use std::collections::HashMap;

use tmap_aig::{CoverNode, Network, NodePtr};
use tmap_lut::Trit;
use tmap_map::{EmittedCell, MappingState};
use tmap_rewrite::{Input, LutGraph};

use crate::host::{Cell, Module, WireId};

/// Rebuilds `And`/`Not`/`Reg`/`Const` cells directly from `net`, with no
/// mapping involved (spec §8.2-10's round-trip property). Each AIG node is
/// exported at most once; an edge's register stages are materialized as a
/// chain of `Reg` cells, each carrying its own `initvals` entry as `init`.
pub fn export_aig(net: &Network) -> Module {
    let mut module = Module::new();
    let mut wire_of: HashMap<NodePtr, WireId> = HashMap::new();

    fn export_node(net: &Network, module: &mut Module, wire_of: &mut HashMap<NodePtr, WireId>, node: NodePtr) -> WireId {
        if let Some(&w) = wire_of.get(&node) {
            return w
        }
        let n = net.node(node);
        let w = if n.is_const() {
            let value = matches!(n.kind, tmap_aig::NodeKind::Const(Trit::One));
            let y = module.fresh_wire(n.label.clone());
            module.add_const(value, y);
            y
        } else if n.is_pi() {
            module.fresh_wire(n.label.clone())
        } else {
            let a = resolve_chain(net, module, wire_of, &n.ins[0]);
            let b = resolve_chain(net, module, wire_of, &n.ins[1]);
            let y = module.fresh_wire(n.label.clone());
            module.add_and(a, b, y);
            y
        };
        wire_of.insert(node, w);
        w
    }

    fn resolve_chain(
        net: &Network,
        module: &mut Module,
        wire_of: &mut HashMap<NodePtr, WireId>,
        edge: &tmap_aig::Edge,
    ) -> WireId {
        let Some(target) = edge.target else {
            let y = module.fresh_wire(None);
            module.add_const(edge.negated, y);
            return y
        };
        let mut w = export_node(net, module, wire_of, target);
        for init in &edge.initvals {
            let q = module.fresh_wire(None);
            module.add_reg(w, q, *init);
            w = q;
        }
        if edge.negated {
            let y = module.fresh_wire(None);
            module.add_not(w, y);
            w = y;
        }
        w
    }

    for &po in net.pos() {
        let n = net.node(po);
        let driver = resolve_chain(net, &mut module, &mut wire_of, &n.ins[0]);
        module.add_output(n.label.clone().unwrap_or_default(), driver);
    }
    module
}

/// Exports a mapped network (spec §4.4/§6) using whatever cells
/// [`tmap_map::emit_luts`] decided on. A cut member with `lag > 0` is
/// materialized as a chain of `Reg` cells with `Trit::X` inits, since the
/// mapping/rewrite layers only ever operate on the all-`x` initvals view
/// (spec §9's "`initvals_undef()` holds wherever the mapping/rewrite layers
/// operate").
pub fn export_mapped(net: &Network, state: &MappingState, gate2: bool) -> Module {
    let mut module = Module::new();
    let mut wire_of: HashMap<NodePtr, WireId> = HashMap::new();
    let cells = tmap_map::emit_luts(net, state, gate2);
    let by_node: HashMap<NodePtr, &EmittedCell> = cells.iter().map(|c| (c.node(), c)).collect();

    fn cover_wire(
        net: &Network,
        module: &mut Module,
        wire_of: &mut HashMap<NodePtr, WireId>,
        by_node: &HashMap<NodePtr, &EmittedCell>,
        cn: CoverNode,
    ) -> WireId {
        let mut w = resolve(net, module, wire_of, by_node, cn.node);
        for _ in 0..cn.lag {
            let q = module.fresh_wire(None);
            module.add_reg(w, q, Trit::X);
            w = q;
        }
        w
    }

    fn resolve(
        net: &Network,
        module: &mut Module,
        wire_of: &mut HashMap<NodePtr, WireId>,
        by_node: &HashMap<NodePtr, &EmittedCell>,
        node: NodePtr,
    ) -> WireId {
        if let Some(&w) = wire_of.get(&node) {
            return w
        }
        let n = net.node(node);
        let w = if n.is_pi() {
            module.fresh_wire(n.label.clone())
        } else {
            match by_node.get(&node) {
                None => module.fresh_wire(n.label.clone()),
                Some(EmittedCell::Const { value, .. }) => {
                    let y = module.fresh_wire(n.label.clone());
                    module.add_const(*value, y);
                    y
                }
                Some(EmittedCell::Direct { input, invert, .. }) => {
                    let src = cover_wire(net, module, wire_of, by_node, *input);
                    if *invert {
                        let y = module.fresh_wire(n.label.clone());
                        module.add_not(src, y);
                        y
                    } else {
                        src
                    }
                }
                Some(EmittedCell::Lut { table, inputs, .. }) => {
                    let wires: Vec<WireId> =
                        inputs.iter().map(|&cn| cover_wire(net, module, wire_of, by_node, cn)).collect();
                    let y = module.fresh_wire(n.label.clone());
                    module.cells.push(Cell::Lut {
                        inputs: wires,
                        table: table.clone(),
                        y,
                        depth: None,
                        depth_envelope: None,
                        critical: false,
                    });
                    y
                }
                Some(EmittedCell::Gate2 { kind, inputs, .. }) => {
                    let a = cover_wire(net, module, wire_of, by_node, inputs[0]);
                    let b = cover_wire(net, module, wire_of, by_node, inputs[1]);
                    let y = module.fresh_wire(n.label.clone());
                    module.cells.push(Cell::Gate2 { kind: *kind, a, b, y });
                    y
                }
            }
        };
        wire_of.insert(node, w);
        w
    }

    for &po in net.pos() {
        let n = net.node(po);
        let driver_edge = &n.ins[0];
        let Some(driver_node) = driver_edge.target else {
            let y = module.fresh_wire(None);
            module.add_const(driver_edge.negated, y);
            module.add_output(n.label.clone().unwrap_or_default(), y);
            continue
        };
        let mut w = resolve(net, &mut module, &mut wire_of, &by_node, driver_node);
        for init in &driver_edge.initvals {
            let q = module.fresh_wire(None);
            module.add_reg(w, q, *init);
            w = q;
        }
        if driver_edge.negated {
            let y = module.fresh_wire(None);
            module.add_not(w, y);
            w = y;
        }
        module.add_output(n.label.clone().unwrap_or_default(), w);
    }
    module
}

/// Rewrites `module`'s `$lut`/`$_NOT_` cells from `graph` in place (spec
/// §4.8 step 6 onward): every live (non-blacklisted) cell from
/// `graph.toposort()` is emitted, and `module.outputs` is updated from
/// `graph.outputs`, which [`LutGraph::redirect`] kept current through the
/// rewrite passes.
pub fn export_lutgraph(graph: &LutGraph<WireId>, module: &mut Module) {
    module.cells.retain(|c| !c.is_lut() && !c.is_not());
    let mut wire_of: HashMap<tmap_rewrite::CellPtr, WireId> = HashMap::new();

    let wire_for_input = |wire_of: &HashMap<tmap_rewrite::CellPtr, WireId>, input: Input<WireId>| match input {
        Input::External(w) => w,
        Input::Cell(p) => wire_of[&p],
    };

    for p in graph.toposort() {
        if graph.is_blacklisted(p) {
            continue
        }
        let cell = &graph.cells[tmap_arena::Ptr::from(p)];
        let inputs: Vec<WireId> = cell.inputs.iter().map(|&i| wire_for_input(&wire_of, i)).collect();
        let y = module.fresh_wire(None);
        module.cells.push(Cell::Lut {
            inputs,
            table: cell.table.clone(),
            y,
            depth: cell.depth,
            depth_envelope: cell.depth_envelope,
            critical: cell.critical,
        });
        wire_of.insert(p, y);
    }

    for (i, &cell_ptr) in graph.outputs.iter().enumerate() {
        if let Some(entry) = module.outputs.get_mut(i) {
            entry.1 = wire_for_input(&wire_of, cell_ptr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmap_aig::Edge;

    #[test]
    fn round_trips_and_gate() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let b = net.add_pi(Some("b".into()));
        let and_node = net.add_and(Edge::to(a), Edge::to(b), Some("y".into()));
        net.add_po(Edge::to(and_node), Some("y".into()));

        let module = export_aig(&net);
        assert_eq!(module.outputs.len(), 1);
        assert_eq!(module.cells.iter().filter(|c| matches!(c, Cell::And { .. })).count(), 1);
    }

    #[test]
    fn register_stage_becomes_reg_cell() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let mut edge = Edge::to(a);
        edge.lag = 1;
        edge.initvals.push(Trit::Zero);
        net.add_po(edge, Some("q".into()));

        let module = export_aig(&net);
        assert_eq!(module.cells.iter().filter(|c| matches!(c, Cell::Reg { .. })).count(), 1);
    }
}

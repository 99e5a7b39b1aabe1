//! LUT/gate2 emission and cut dumping (spec §4.4 orchestration tail, §6,
//! §8.2-12, §8.3-14/15). Grounded on `Network::emit_luts`/`dump_cuts`,
//! `toymap.cc:1310-1407`.
//!
//! Register materialization (lag > 0 cut members chain through flip-flops)
//! and wiring the resulting cells into a host module are left to `tmap`'s
//! export step (spec §1: the host is explicitly out of scope here); this
//! layer only decides *what* cell each in-mapping node becomes — constant,
//! direct (possibly inverted) connection, `$lut`, or one of the nine
//! two-input gate shapes — and which cut members, in order, feed it.

use tmap_aig::{CoverNode, Edge, Network, NodePtr};
use tmap_lut::TruthTable;

use crate::cut::Cut;
use crate::scratch::MappingState;

/// One of the nine two-input gate shapes spec §6 names for `-emit_gate2`
/// (grounded on the `addOrGate`/`addOrnotGate`/.../`addNorGate` calls in
/// `toymap.cc:1360-1378`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate2Kind {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Not,
    AndNot,
    OrNot,
}

/// One emitted output cell, named by the mapped AND node it came from.
#[derive(Debug, Clone)]
pub enum EmittedCell {
    /// A constant-driven output: no cell at all (spec §8.3-14:
    /// "Constant-driven outputs emit direct wire connections, not
    /// zero-input LUTs").
    Const { node: NodePtr, value: bool },
    /// A direct, possibly inverted, wire connection: the node's function
    /// reduces to the identity or complement of a single cut member.
    Direct { node: NodePtr, input: CoverNode, invert: bool },
    /// A `$lut` cell (spec §6): `table` is this node's function over
    /// `inputs`, in order (`table.vars == 0..inputs.len()`).
    Lut { node: NodePtr, table: TruthTable, inputs: Vec<CoverNode> },
    /// A two-input primitive gate (spec §6, `-emit_gate2`).
    Gate2 { node: NodePtr, kind: Gate2Kind, inputs: [CoverNode; 2] },
}

impl EmittedCell {
    pub fn node(&self) -> NodePtr {
        match self {
            EmittedCell::Const { node, .. }
            | EmittedCell::Direct { node, .. }
            | EmittedCell::Lut { node, .. }
            | EmittedCell::Gate2 { node, .. } => *node,
        }
    }
}

/// Evaluates `node`'s Boolean function over the `2^cut.len()` assignments
/// to `cut`'s members, by structural recursion through the AIG (grounded
/// on `AndNode::truth_table(CutList)`, `toymap.cc:240-264`). Panics if the
/// recursion reaches a PI that is not itself a cut member (spec §7:
/// "structural invariant violation" — a spilled cut) or crosses a
/// nonzero-lag edge (lag-crossing functions are only meaningful after the
/// host materializes the register chain, downstream of this layer).
fn node_function(net: &Network, cut: &Cut, node: NodePtr) -> Vec<bool> {
    let npoints = 1usize << cut.len();
    if let Some(index) = cut.position(CoverNode::here(node)) {
        return (0..npoints).map(|i| (i >> index) & 1 != 0).collect()
    }

    let n = net.node(node);
    assert!(!n.is_pi(), "spilled cut: PI {node} not present as a cut member");
    assert!(!n.is_const(), "spilled cut: constant {node} not folded before emission");

    let eval_edge = |edge: &Edge| -> Vec<bool> {
        match edge.target {
            None => vec![edge.negated; npoints],
            Some(target) => {
                assert_eq!(edge.lag, 0, "node_function cannot cross a nonzero-lag edge");
                let sub = node_function(net, cut, target);
                if edge.negated {
                    sub.into_iter().map(|b| !b).collect()
                } else {
                    sub
                }
            }
        }
    };

    let a = eval_edge(&n.ins[0]);
    let b = eval_edge(&n.ins[1]);
    a.into_iter().zip(b).map(|(x, y)| x && y).collect()
}

/// Canonicalizes a 2-input truth table the way `emit_luts` does before its
/// gate-pattern switch: if the function only depends on input 1 in the
/// "wrong" polarity slot (`tt[2] == 0 && tt[1] == 1`), swap inputs so the
/// subsequent pattern match is exhaustive (grounded on `toymap.cc:1351-1354`).
fn canonicalize_gate2(func: &[bool; 4], inputs: [CoverNode; 2]) -> ([bool; 4], [CoverNode; 2]) {
    let mut tt = *func;
    let mut yin = inputs;
    if !tt[2] && tt[1] {
        tt.swap(1, 2);
        yin.swap(0, 1);
    }
    (tt, yin)
}

/// The gate-shape switch itself (grounded on `toymap.cc:1356-1383`). `tt`
/// must already be canonicalized by [`canonicalize_gate2`]. Unlike the
/// original source, the all-ones case emits `Const { value: true }`
/// rather than `S0` — the original's corresponding `1111` arm is correct,
/// but its single-input `0b11` fallback (see [`direct_connect`]) emits
/// `S0` for an always-true function, which would break the round-trip
/// property spec §8.2-10 requires; that one case is corrected here (see
/// `DESIGN.md`).
fn gate2_from_truth(node: NodePtr, tt: [bool; 4], yin: [CoverNode; 2]) -> EmittedCell {
    let code = ((tt[3] as u8) << 3) | ((tt[2] as u8) << 2) | ((tt[1] as u8) << 1) | (tt[0] as u8);
    match code {
        0b1111 => EmittedCell::Const { node, value: true },
        0b1110 => EmittedCell::Gate2 { node, kind: Gate2Kind::Or, inputs: yin },
        0b1101 => EmittedCell::Gate2 { node, kind: Gate2Kind::OrNot, inputs: [yin[1], yin[0]] },
        0b1100 => EmittedCell::Direct { node, input: yin[1], invert: false },
        0b1001 => EmittedCell::Gate2 { node, kind: Gate2Kind::Xnor, inputs: yin },
        0b1000 => EmittedCell::Gate2 { node, kind: Gate2Kind::And, inputs: yin },
        0b0111 => EmittedCell::Gate2 { node, kind: Gate2Kind::Nand, inputs: yin },
        0b0110 => EmittedCell::Gate2 { node, kind: Gate2Kind::Xor, inputs: yin },
        0b0101 => EmittedCell::Direct { node, input: yin[0], invert: true },
        0b0100 => EmittedCell::Gate2 { node, kind: Gate2Kind::AndNot, inputs: [yin[1], yin[0]] },
        0b0001 => EmittedCell::Gate2 { node, kind: Gate2Kind::Nor, inputs: yin },
        0b0000 => EmittedCell::Const { node, value: false },
        _ => unreachable!("canonicalize_gate2 rules out tt[2]==0 && tt[1]==1"),
    }
}

/// The single-input fallback (grounded on `toymap.cc:1390-1405`, with the
/// `0b11` case corrected per the note on [`gate2_from_truth`]).
fn direct_connect(node: NodePtr, func: [bool; 2], input: CoverNode) -> EmittedCell {
    match (func[0], func[1]) {
        (false, false) => EmittedCell::Const { node, value: false },
        (true, false) => EmittedCell::Direct { node, input, invert: true },
        (false, true) => EmittedCell::Direct { node, input, invert: false },
        (true, true) => EmittedCell::Const { node, value: true },
    }
}

/// Emits the cell for a single in-mapping AND node, or `None` for a PI or
/// a node outside the current mapping (`map_fanouts == 0`). `gate2`
/// selects `-emit_gate2` behavior for width-2 cuts (spec §6).
pub fn emit_node(net: &Network, state: &MappingState, node: NodePtr, gate2: bool) -> Option<EmittedCell> {
    let n = net.node(node);
    if n.is_pi() || !state.is_in_mapping(node) {
        return None
    }

    let cut = state.cut(node).clone();
    let func = node_function(net, &cut, node);
    let members: Vec<CoverNode> = cut.iter().copied().collect();

    Some(match members.len() {
        0 => EmittedCell::Const { node, value: func[0] },
        1 => direct_connect(node, [func[0], func[1]], members[0]),
        2 if gate2 => {
            let (tt, yin) = canonicalize_gate2(
                &[func[0], func[1], func[2], func[3]],
                [members[0], members[1]],
            );
            gate2_from_truth(node, tt, yin)
        }
        width => {
            let vars: Vec<u32> = (0..width as u32).collect();
            let dontcares = vec![false; func.len()];
            EmittedCell::Lut { node, table: TruthTable::new(vars, func, dontcares), inputs: members }
        }
    })
}

/// Emits every in-mapping AND node (spec §4.4 orchestration tail). Used by
/// both `-emit_luts` (`gate2 = false`) and `-emit_gate2` (`gate2 = true`).
/// Spec §8.2-12: with `trivial_cuts` installed first, this emits exactly
/// one width-2 `$lut` per AND node.
pub fn emit_luts(net: &Network, state: &MappingState, gate2: bool) -> Vec<EmittedCell> {
    net.nodes().filter_map(|p| emit_node(net, state, p, gate2)).collect()
}

/// Plain-text cut dump for `-dump_cuts` and for tests (grounded on
/// `Network::dump_cuts`, `toymap.cc:1310-1321`).
pub fn dump_cuts(net: &Network, state: &MappingState) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for p in net.nodes() {
        let node = net.node(p);
        if node.is_pi() {
            let _ = writeln!(out, "Node {}: PI", node.label.as_deref().unwrap_or("?"));
            continue
        }
        if node.is_const() {
            continue
        }
        let _ = writeln!(
            out,
            "Node {}: (depth {})",
            node.label.as_deref().unwrap_or("?"),
            state.depth(p)
        );
        for cn in state.cut(p).iter() {
            let label = net.node(cn.node).label.clone().unwrap_or_default();
            let _ = writeln!(out, "\t{label} (lag {})", cn.lag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmap_aig::Edge;
    use tmap_lut::LutLibrary;

    use crate::pipeline::trivial_cuts;

    #[test]
    fn emit_trivial_cuts_yields_one_lut_per_and_node() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let b = net.add_pi(Some("b".into()));
        let c = net.add_pi(Some("c".into()));
        let and1 = net.add_and(Edge::to(a), Edge::to(b), Some("and1".into()));
        let and2 = net.add_and(Edge::to(and1), Edge::to(c), Some("and2".into()));
        net.add_po(Edge::to(and2), Some("y".into()));

        let mut state = MappingState::new(&net).unwrap();
        let lib = LutLibrary::academic_luts(6);
        let order = net.tsort().unwrap();
        trivial_cuts(&net, &mut state, &order);
        crate::mapping::walk_mapping(&net, &mut state, &lib);

        let cells = emit_luts(&net, &state, false);
        let lut_count = cells
            .iter()
            .filter(|c| matches!(c, EmittedCell::Lut { inputs, .. } if inputs.len() == 2))
            .count();
        assert_eq!(lut_count, 2, "exactly |AND nodes| width-2 LUTs (spec §8.2-12)");
    }

    #[test]
    fn emit_gate2_recognizes_and() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let b = net.add_pi(Some("b".into()));
        let and_node = net.add_and(Edge::to(a), Edge::to(b), Some("y".into()));
        net.add_po(Edge::to(and_node), Some("y".into()));

        let mut state = MappingState::new(&net).unwrap();
        let lib = LutLibrary::academic_luts(6);
        let order = net.tsort().unwrap();
        trivial_cuts(&net, &mut state, &order);
        crate::mapping::walk_mapping(&net, &mut state, &lib);

        let cell = emit_node(&net, &state, and_node, true).unwrap();
        assert!(matches!(cell, EmittedCell::Gate2 { kind: Gate2Kind::And, .. }));
    }

    #[test]
    fn emit_constant_driven_output_is_direct() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let const0 = net.const0();
        let and_node = net.add_and(Edge::to(a), Edge::to(const0), Some("y".into()));
        net.add_po(Edge::to(and_node), Some("y".into()));
        net.compact();

        let mut state = MappingState::new(&net).unwrap();
        let lib = LutLibrary::academic_luts(6);
        let order = net.tsort().unwrap();
        trivial_cuts(&net, &mut state, &order);
        crate::mapping::walk_mapping(&net, &mut state, &lib);

        // po's driver folded straight to the constant edge by compact();
        // the PO's own emission is a direct passthrough of that constant.
        let po = net.pos()[0];
        let driver = net.node(po).ins[0].constant_value();
        assert_eq!(driver, Some(false));
    }
}

//! Mapping reference counts (spec §3.4, §4.6): `ref_cut`/`deref_cut`, and
//! `walk_mapping`, the global reset-and-rewalk that restores the
//! reference-count invariant after every cut-selection sweep.

use tmap_aig::{CoverNode, Network, NodePtr};
use tmap_lut::LutLibrary;

use crate::cut::Cut;
use crate::scratch::MappingState;

/// A PO is an AND node whose second input is tied to constant 1 (spec
/// §3.1); its "cut" is the degenerate single-member cut naming its real
/// driver (spec §4.4: "For a PO the trivial single-fanin cut is stored"),
/// never the PO node itself. Grounded on `AndNode::po_fanin`, `toymap.cc:
/// 232-238`, and the `CoverNode{0, node}.fanins()` walk in
/// `trivial_cuts()`, `toymap.cc:906-918`, which for a PO node only ever
/// yields its `ins[0]` fanin (the constant `ins[1]` produces no fanin).
pub(crate) fn po_driver_cut(net: &Network, po: NodePtr) -> Cut {
    let edge = &net.node(po).ins[0];
    match edge.target {
        // A constant-driven output (spec §8.3-14) has no driver node to
        // name: the PO's function is just the constant carried on the
        // edge, which `node_function`'s constant-edge branch resolves
        // directly without any cut members.
        None => Cut::empty(),
        Some(driver) => Cut::single(CoverNode { lag: edge.lag, node: driver }),
    }
}

/// Recursively increments `map_fanouts` over `n`'s selected cut; when a cut
/// member's count crosses 0→1 the recursion propagates into *its* cut
/// (spec §4.6). Returns the number of nodes that newly entered the mapping.
pub fn ref_cut(net: &Network, state: &mut MappingState, n: NodePtr) -> u32 {
    let mut entered = 0;
    let members: Vec<_> = state.cut(n).iter().copied().collect();
    for cn in members {
        let count = state.map_fanouts(cn.node);
        let i = state.idx_pub(cn.node);
        state.map_fanouts[i] += 1;
        if count == 0 {
            entered += 1 + ref_cut(net, state, cn.node);
        }
    }
    entered
}

/// Recursively decrements `map_fanouts` over `n`'s selected cut; when a
/// member's count crosses 1→0 the recursion propagates (spec §4.6).
pub fn deref_cut(net: &Network, state: &mut MappingState, n: NodePtr) {
    let members: Vec<_> = state.cut(n).iter().copied().collect();
    for cn in members {
        let i = state.idx_pub(cn.node);
        state.map_fanouts[i] -= 1;
        if state.map_fanouts[i] == 0 {
            deref_cut(net, state, cn.node);
        }
    }
}

/// Resets all `map_fanouts` to zero, then refs every PO's cut (spec §4.6).
/// Returns the total mapping area: `Σ lib.cost(|cut(n)|)` for nodes with
/// `map_fanouts > 0`, excluding PIs and PO-aliases themselves.
pub fn walk_mapping(net: &Network, state: &mut MappingState, lib: &LutLibrary) -> f64 {
    for p in net.nodes() {
        let i = state.idx_pub(p);
        state.map_fanouts[i] = 0;
    }
    for &po in net.pos() {
        state.set_cut(po, po_driver_cut(net, po));
        let i = state.idx_pub(po);
        state.map_fanouts[i] = 1;
        ref_cut(net, state, po);
    }

    let mut area = 0.0;
    for p in net.nodes() {
        let node = net.node(p);
        if node.is_pi() || node.po {
            continue
        }
        if state.is_in_mapping(p) {
            let cost = lib.lookup(state.cut(p).len().max(1) as u32).map(|v| v.cost).unwrap_or(1.0);
            area += cost;
        }
    }
    log::debug!("mapping area is {area:.1} LUTs");
    area
}

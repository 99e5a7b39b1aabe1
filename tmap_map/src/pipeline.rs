//! Cut enumeration and the five-stage evaluator pipeline (spec §4.4, §4.5):
//! `depth_cuts`, `trivial_cuts`, `spread_depth_limit`. Grounded on
//! `toymap.cc`'s `Network::cuts<CutEvaluation>()` template and
//! `Network::depth_cuts()`.

use std::cmp::Ordering;

use tmap_aig::{Network, NodePtr};
use tmap_lut::LutLibrary;

use crate::cut::{Cut, NPRIORITY_CUTS};
use crate::eval::{AreaFlowEval, CutEval, DepthEvalInitial, DepthEvalInitial2, ExactAreaEval};
use crate::mapping::{po_driver_cut, walk_mapping};
use crate::scratch::MappingState;

/// A fanin's source of candidate cuts: its full priority-cut cache if it
/// has one (an AND node already visited this pass), or its trivial
/// self-cut (a PI, or an AND node not yet visited — cannot happen in
/// topological order, kept only as a defensive fallback).
fn fanin_candidates(net: &Network, state: &MappingState, target: NodePtr) -> Vec<Cut> {
    if net.node(target).is_pi() {
        return vec![Cut::trivial(target)]
    }
    let cached = state.leaderboard(target);
    if cached.is_empty() {
        vec![Cut::trivial(target)]
    } else {
        cached.to_vec()
    }
}

/// Spec §4.4 step 1: every pairing of the two fanins' cached cuts,
/// `inject_lag`-merged and deduplicated, with oversized and
/// root-self-referencing results dropped. A cut containing the root itself
/// (possible only via a register-closed loop short enough to fit within
/// `max_cut` hops) is not a valid combinational boundary for the root's own
/// LUT, so it is filtered here rather than threaded through `map_fanouts`
/// bookkeeping as a self-reference.
fn build_merged_candidates(net: &Network, state: &MappingState, p: NodePtr, max_cut: usize) -> Vec<Cut> {
    let node = net.node(p);
    let edge_a = &node.ins[0];
    let edge_b = &node.ins[1];
    let ta = edge_a.target.expect("compacted network: AND input must reference a node");
    let tb = edge_b.target.expect("compacted network: AND input must reference a node");

    let cas = fanin_candidates(net, state, ta);
    let cbs = fanin_candidates(net, state, tb);

    let mut out = Vec::with_capacity(cas.len() * cbs.len());
    for ca in &cas {
        for cb in &cbs {
            if let Some(m) = Cut::merge(ca, edge_a.lag, cb, edge_b.lag, max_cut) {
                if !m.iter().any(|cn| cn.node == p) {
                    out.push(m);
                }
            }
        }
    }
    out
}

/// One entry in the per-node leaderboard: a candidate cut plus its
/// evaluation and hash, ordered by `(E, hash)` (spec §4.4 step 1's
/// insertion key).
struct Entry<E> {
    eval: E,
    hash: u64,
    cut: Cut,
}

fn leaderboard_cmp<E: CutEval>(a: &Entry<E>, b: &Entry<E>) -> Ordering {
    a.eval.cmp_key(&b.eval).then_with(|| a.hash.cmp(&b.hash))
}

/// Runs one evaluator stage over every AND node in topological order,
/// rebuilding each node's priority-cut cache and committing the winning
/// cut's metrics (spec §4.4, §4.5). `consider_previous` re-admits the
/// node's current best cut into the new leaderboard with a sentinel hash of
/// `u64::MAX` (spec §4.4: "the previously-selected cut ... is included in
/// the leaderboard with a sentinel hash of INT_MAX"), so a cut that was
/// already good under an earlier metric is not lost purely because the
/// metric changed.
pub fn run_stage<E: CutEval>(
    net: &Network,
    state: &mut MappingState,
    lib: &LutLibrary,
    order: &[NodePtr],
    max_cut: usize,
    consider_previous: bool,
) {
    for &p in order {
        let node = net.node(p);
        if node.is_pi() {
            continue
        }
        if node.po {
            continue
        }

        let mut candidates = build_merged_candidates(net, state, p, max_cut);
        let prev = state.cut(p).clone();
        if consider_previous && !prev.is_empty() && !candidates.iter().any(|c| *c == prev) {
            candidates.push(prev.clone());
        }

        let mut board: Vec<Entry<E>> = Vec::with_capacity(candidates.len());
        for cand in candidates {
            let eval = E::evaluate(lib, state, &cand, p);
            if eval.reject(state, p) {
                continue
            }
            let hash = if consider_previous && !prev.is_empty() && cand == prev {
                u64::MAX
            } else {
                cand.hash()
            };
            board.push(Entry { eval, hash, cut: cand });
        }

        board.sort_by(leaderboard_cmp);
        board.truncate(NPRIORITY_CUTS);

        if let Some(best) = board.first() {
            best.eval.select_on(state, p);
        }

        let cuts: Vec<Cut> = board.into_iter().map(|e| e.cut).collect();
        state.set_leaderboard(p, cuts);
    }
}

/// The exact-area stage needs the network to run its counterfactual
/// ref/deref walk, so it cannot be expressed through the generic
/// [`CutEval`] trait the way the other four stages are (spec §4.5
/// `exact_area`).
pub fn run_exact_area_stage(
    net: &Network,
    state: &mut MappingState,
    lib: &LutLibrary,
    order: &[NodePtr],
    max_cut: usize,
) {
    for &p in order {
        let node = net.node(p);
        if node.is_pi() || node.po {
            continue
        }

        let candidates = build_merged_candidates(net, state, p, max_cut);
        let mut board: Vec<(ExactAreaEval, u64, Cut)> = Vec::with_capacity(candidates.len());
        for cand in candidates {
            let eval = ExactAreaEval::evaluate_with_net(net, lib, state, &cand, p);
            if eval.reject(state, p) {
                continue
            }
            let hash = cand.hash();
            board.push((eval, hash, cand));
        }
        board.sort_by(|a, b| a.0.cmp_key(&b.0).then_with(|| a.1.cmp(&b.1)));
        board.truncate(NPRIORITY_CUTS);

        if let Some((eval, _, _)) = board.first() {
            eval.select_on(state, p);
        }
        let cuts: Vec<Cut> = board.into_iter().map(|(_, _, c)| c).collect();
        state.set_leaderboard(p, cuts);
    }
}

/// Spec §4.5: "`spread_depth_limit(T)` sets `depth_limit = T+1` on all POs,
/// ∞ elsewhere, then sweeps reverse-topologically assigning
/// `depth_limit(m) = min(depth_limit(m), depth_limit(p) − 1)` for every
/// cut-edge (p→m)."
pub fn spread_depth_limit(net: &Network, state: &mut MappingState, order: &[NodePtr], t: u32) {
    for p in net.nodes() {
        state.set_depth_limit(p, u32::MAX);
    }
    for &po in net.pos() {
        state.set_depth_limit(po, t + 1);
    }
    for &p in order.iter().rev() {
        let node = net.node(p);
        if node.is_pi() {
            continue
        }
        let limit_p = state.depth_limit(p);
        if limit_p == u32::MAX {
            continue
        }
        let members: Vec<_> = state.cut(p).iter().map(|cn| cn.node).collect();
        for m in members {
            let candidate = limit_p.saturating_sub(1);
            if candidate < state.depth_limit(m) {
                state.set_depth_limit(m, candidate);
            }
        }
    }
}

/// Spec §8.2-12: the identity mapping, used to validate `emit_luts`
/// against `|AND nodes|` width-2 LUTs. Every AND node's cut is its two
/// direct fanins.
pub fn trivial_cuts(net: &Network, state: &mut MappingState, order: &[NodePtr]) {
    for &p in order {
        let node = net.node(p);
        if node.is_pi() {
            state.set_cut(p, Cut::trivial(p));
            state.set_depth(p, 0);
            continue
        }
        if node.po {
            state.set_cut(p, po_driver_cut(net, p));
            let depth = node.ins[0].target.map(|driver| state.depth(driver)).unwrap_or(0);
            state.set_depth(p, depth);
            continue
        }
        let edge_a = &node.ins[0];
        let edge_b = &node.ins[1];
        let ta = edge_a.target.expect("compacted network: AND input must reference a node");
        let tb = edge_b.target.expect("compacted network: AND input must reference a node");
        let ca = Cut::trivial(ta);
        let cb = Cut::trivial(tb);
        let merged = Cut::merge(&ca, edge_a.lag, &cb, edge_b.lag, crate::cut::CUT_MAXIMUM)
            .expect("two leaves never exceed CUT_MAXIMUM");
        let depth = 1 + state.depth(ta).max(state.depth(tb));
        state.set_cut(p, merged);
        state.set_depth(p, depth);
    }
}

/// The full `-depth_cuts` orchestration (spec §4.4/§4.5, toymap.cc
/// `Network::depth_cuts`): depth-minimal cuts, then an area-flow pass
/// bounded by the depth envelope, then two exact-area refinement passes,
/// restoring the reference-count invariant between sweeps.
pub fn depth_cuts(net: &Network, state: &mut MappingState, lib: &LutLibrary, max_cut: usize) -> f64 {
    let order = net.tsort().expect("depth_cuts requires an acyclic zero-lag projection");

    for &pi in net.pis() {
        state.set_cut(pi, Cut::trivial(pi));
        state.set_depth(pi, 0);
    }

    run_stage::<DepthEvalInitial>(net, state, lib, &order, max_cut, false);
    walk_mapping(net, state, lib);

    run_stage::<DepthEvalInitial2>(net, state, lib, &order, max_cut, true);

    let target_depth = net
        .pos()
        .iter()
        .map(|&po| net.node(po).ins[0].target.map(|driver| state.depth(driver)).unwrap_or(0))
        .max()
        .unwrap_or(0);
    walk_mapping(net, state, lib);

    spread_depth_limit(net, state, &order, target_depth);
    run_stage::<AreaFlowEval>(net, state, lib, &order, max_cut, true);
    walk_mapping(net, state, lib);
    spread_depth_limit(net, state, &order, target_depth);
    run_stage::<AreaFlowEval>(net, state, lib, &order, max_cut, true);
    walk_mapping(net, state, lib);

    spread_depth_limit(net, state, &order, target_depth);
    run_exact_area_stage(net, state, lib, &order, max_cut);
    walk_mapping(net, state, lib);
    spread_depth_limit(net, state, &order, target_depth);
    run_exact_area_stage(net, state, lib, &order, max_cut);

    walk_mapping(net, state, lib)
}

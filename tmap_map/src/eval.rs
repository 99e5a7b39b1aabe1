//! Cut evaluators (spec §4.5): five evaluators sharing the shape
//! `(cutlist, node) -> score`, `reject(node)`, `select_on(node)`, applied as
//! a staged pipeline. Per spec §9 ("cut evaluator polymorphism"), these are
//! monomorphized per stage rather than dynamically dispatched in the hot
//! enumeration loop: each is a plain struct implementing [`CutEval`], and
//! `crate::pipeline::run_cuts` is generic over the evaluator type.

use std::cmp::Ordering;

use tmap_aig::NodePtr;
use tmap_lut::LutLibrary;

use crate::cut::Cut;
use crate::mapping::{deref_cut, ref_cut};
use crate::scratch::MappingState;

/// Whether a cut's amortized area/edge flow divides by the node's static
/// structural fanout count or by its live mapping reference count. Stage 1
/// runs before any mapping exists, so it must fall back to the structural
/// count (spec §4.5 `DepthEvalInitial`); every later stage divides by
/// `map_fanouts`, which `walk_mapping` has by then established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutMode {
    Static,
    Mapped,
}

/// The shared `(depth, cut_width, area_flow, edge_flow)` quadruple computed
/// from a candidate cut (spec §4.5 `depth`/`area_flow`/`edge_flow`
/// definitions), before being reordered into whichever evaluator's
/// comparison key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutMetrics {
    pub depth: u32,
    pub cut_width: u32,
    pub area_flow: f64,
    pub edge_flow: f64,
}

pub fn compute_metrics(
    lib: &LutLibrary,
    state: &MappingState,
    cut: &Cut,
    node: NodePtr,
    mode: FanoutMode,
) -> CutMetrics {
    let mut depth = 0;
    for cn in cut.iter() {
        depth = depth.max(state.depth(cn.node) + 1);
    }
    let cut_width = cut.len() as u32;

    let divisor = (match mode {
        FanoutMode::Static => state.static_fanouts(node),
        FanoutMode::Mapped => state.map_fanouts(node),
    })
    .max(1) as f64;

    let mut area_flow = lib.lookup(cut_width.max(1)).map(|v| v.cost).unwrap_or(1.0);
    for cn in cut.iter() {
        area_flow += state.area_flow(cn.node);
    }
    area_flow /= divisor;

    let mut edge_flow = 100.0 * cut_width as f64;
    for cn in cut.iter() {
        edge_flow += state.edge_flow(cn.node);
    }
    edge_flow /= divisor;

    CutMetrics { depth, cut_width, area_flow, edge_flow }
}

/// Common interface every cut evaluator implements (spec §4.5, §9): a
/// total order for the priority-cut leaderboard, an optional depth-envelope
/// rejection, and a hook to commit the winning cut's metrics back onto the
/// node's scratch.
pub trait CutEval: Sized + PartialEq {
    fn evaluate(lib: &LutLibrary, state: &mut MappingState, cut: &Cut, node: NodePtr) -> Self;
    fn reject(&self, state: &MappingState, node: NodePtr) -> bool;
    fn select_on(&self, state: &mut MappingState, node: NodePtr);
    fn cmp_key(&self, other: &Self) -> Ordering;
}

fn cmp_metrics_dcae(a: &CutMetrics, b: &CutMetrics) -> Ordering {
    a.depth
        .cmp(&b.depth)
        .then_with(|| a.cut_width.cmp(&b.cut_width))
        .then_with(|| a.area_flow.total_cmp(&b.area_flow))
        .then_with(|| a.edge_flow.total_cmp(&b.edge_flow))
}

fn commit_metrics(state: &mut MappingState, node: NodePtr, m: &CutMetrics) {
    state.set_depth(node, m.depth);
    let i = state.idx_pub(node);
    state.area_flow[i] = m.area_flow;
    state.edge_flow[i] = m.edge_flow;
}

/// Stage 1 (spec §4.5 table): `(depth, cut_width, area_flow, edge_flow)`,
/// computed against static fanouts since no mapping exists yet. Never
/// rejects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthEvalInitial(pub CutMetrics);

impl CutEval for DepthEvalInitial {
    fn evaluate(lib: &LutLibrary, state: &mut MappingState, cut: &Cut, node: NodePtr) -> Self {
        DepthEvalInitial(compute_metrics(lib, state, cut, node, FanoutMode::Static))
    }
    fn reject(&self, _state: &MappingState, _node: NodePtr) -> bool {
        false
    }
    fn select_on(&self, state: &mut MappingState, node: NodePtr) {
        commit_metrics(state, node, &self.0);
    }
    fn cmp_key(&self, other: &Self) -> Ordering {
        cmp_metrics_dcae(&self.0, &other.0)
    }
}

/// Stage 2: `(depth, area_flow, edge_flow, cut_width)`, rejecting any cut
/// whose depth exceeds the node's current `depth_limit` (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthEvalInitial2(pub CutMetrics);

impl CutEval for DepthEvalInitial2 {
    fn evaluate(lib: &LutLibrary, state: &mut MappingState, cut: &Cut, node: NodePtr) -> Self {
        DepthEvalInitial2(compute_metrics(lib, state, cut, node, FanoutMode::Mapped))
    }
    fn reject(&self, state: &MappingState, node: NodePtr) -> bool {
        self.0.depth > state.depth_limit(node)
    }
    fn select_on(&self, state: &mut MappingState, node: NodePtr) {
        commit_metrics(state, node, &self.0);
    }
    fn cmp_key(&self, other: &Self) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        a.depth
            .cmp(&b.depth)
            .then_with(|| a.area_flow.total_cmp(&b.area_flow))
            .then_with(|| a.edge_flow.total_cmp(&b.edge_flow))
            .then_with(|| a.cut_width.cmp(&b.cut_width))
    }
}

/// Stage 3/4 (spec §4.5: "AreaEvalInitial" is this evaluator's first
/// invocation, "AreaFlowEval (repeat)" its second): `(area_flow, edge_flow,
/// cut_width, depth)`, rejecting past the depth limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaFlowEval(pub CutMetrics);

impl CutEval for AreaFlowEval {
    fn evaluate(lib: &LutLibrary, state: &mut MappingState, cut: &Cut, node: NodePtr) -> Self {
        AreaFlowEval(compute_metrics(lib, state, cut, node, FanoutMode::Mapped))
    }
    fn reject(&self, state: &MappingState, node: NodePtr) -> bool {
        self.0.depth > state.depth_limit(node)
    }
    fn select_on(&self, state: &mut MappingState, node: NodePtr) {
        debug_assert!(!self.reject(state, node));
        commit_metrics(state, node, &self.0);
    }
    fn cmp_key(&self, other: &Self) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        a.area_flow
            .total_cmp(&b.area_flow)
            .then_with(|| a.edge_flow.total_cmp(&b.edge_flow))
            .then_with(|| a.cut_width.cmp(&b.cut_width))
            .then_with(|| a.depth.cmp(&b.depth))
    }
}

/// Stage 5: `(exact_area, cut_width, depth)`. `exact_area` is the number of
/// new cut structures this candidate would newly reference, computed by
/// counterfactually derefing the node's current cut, refing the candidate,
/// counting, then undoing both (spec §4.5 `exact_area`, §4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactAreaEval {
    pub metrics: CutMetrics,
    pub exact_area: u32,
}

impl ExactAreaEval {
    fn calc_exact_area(net: &tmap_aig::Network, state: &mut MappingState, cut: &Cut, node: NodePtr) -> u32 {
        if net.node(node).is_pi() {
            return 0
        }
        let was_in_mapping = state.is_in_mapping(node);
        if was_in_mapping {
            deref_cut(net, state, node);
        }

        let mut ret = 1u32;
        for cn in cut.iter() {
            let count = state.map_fanouts(cn.node);
            let i = state.idx_pub(cn.node);
            state.map_fanouts[i] += 1;
            if count == 0 {
                ret += 1 + ref_cut(net, state, cn.node);
            }
        }

        for cn in cut.iter() {
            let i = state.idx_pub(cn.node);
            state.map_fanouts[i] -= 1;
            if state.map_fanouts[i] == 0 {
                deref_cut(net, state, cn.node);
            }
        }

        if was_in_mapping {
            ref_cut(net, state, node);
        }

        ret
    }

    /// `evaluate`, but with access to the network (needed for the
    /// counterfactual ref/deref walk). [`CutEval::evaluate`] delegates
    /// here via a thread-local-free wrapper in `pipeline.rs`, which always
    /// has the network in scope.
    pub fn evaluate_with_net(
        net: &tmap_aig::Network,
        lib: &LutLibrary,
        state: &mut MappingState,
        cut: &Cut,
        node: NodePtr,
    ) -> ExactAreaEval {
        let metrics = compute_metrics(lib, state, cut, node, FanoutMode::Mapped);
        let exact_area = Self::calc_exact_area(net, state, cut, node);
        ExactAreaEval { metrics, exact_area }
    }
}

impl ExactAreaEval {
    pub fn reject(&self, state: &MappingState, node: NodePtr) -> bool {
        self.metrics.depth > state.depth_limit(node)
    }
    pub fn select_on(&self, state: &mut MappingState, node: NodePtr) {
        commit_metrics(state, node, &self.metrics);
    }
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.exact_area
            .cmp(&other.exact_area)
            .then_with(|| self.metrics.cut_width.cmp(&other.metrics.cut_width))
            .then_with(|| self.metrics.depth.cmp(&other.metrics.depth))
    }
}

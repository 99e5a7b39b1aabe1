use smallvec::SmallVec;
use tmap_lut::Trit;

use crate::node::NodePtr;

/// A tagged edge: the spec's "edge attribute record" (§3.1). Inversion and
/// register lag live on the edge, not as separate nodes — modeling
/// inversions as nodes would blow up the graph and defeat the
/// `assume`/`expand` simplifiers (spec §9).
///
/// `target == None` is the canonical constant-edge shorthand: `negated ==
/// false` is constant 0, `negated == true` is constant 1. This is distinct
/// from (and a reduction of) the dedicated `Const` nodes created on import:
/// `compact` folds an edge pointing at a `Const(Zero)`/`Const(One)` node
/// into this null-target form. Edges to `Const(X)` are never folded to
/// `None`, since there is no null encoding for the don't-care constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub negated: bool,
    pub lag: u32,
    pub initvals: SmallVec<[Trit; 4]>,
    pub target: Option<NodePtr>,
}

impl Edge {
    /// An edge with no semantic meaning, used to fill the unused `ins` slots
    /// of `Pi`/`Const` nodes.
    pub fn unused() -> Edge {
        Edge { negated: false, lag: 0, initvals: SmallVec::new(), target: None }
    }

    pub fn to(target: NodePtr) -> Edge {
        Edge { negated: false, lag: 0, initvals: SmallVec::new(), target: Some(target) }
    }

    pub fn constant(value: bool) -> Edge {
        Edge { negated: value, lag: 0, initvals: SmallVec::new(), target: None }
    }

    pub fn is_constant(&self) -> bool {
        self.target.is_none()
    }

    /// The constant value this edge carries, if it is in canonical
    /// null-target form.
    pub fn constant_value(&self) -> Option<bool> {
        self.target.is_none().then_some(self.negated)
    }

    pub fn inverted(&self) -> Edge {
        Edge {
            negated: !self.negated,
            lag: self.lag,
            initvals: self.initvals.clone(),
            target: self.target,
        }
    }

    /// Spec §3.1 invariant: `lag == initvals.len()`.
    pub fn check_invariant(&self) -> bool {
        self.lag as usize == self.initvals.len()
    }

    /// §4.1.1 edge composition: when an intermediate node is eliminated,
    /// the outer (load-side) edge absorbs the inner (driver-side) edge.
    pub fn compose(outer: &Edge, inner: &Edge) -> Edge {
        let initvals = if inner.negated {
            outer.initvals.iter().map(|t| t.invert()).chain(inner.initvals.iter().copied()).collect()
        } else {
            outer.initvals.iter().copied().chain(inner.initvals.iter().copied()).collect()
        };
        Edge {
            negated: outer.negated ^ inner.negated,
            lag: outer.lag + inner.lag,
            initvals,
            target: inner.target,
        }
    }

    /// §4.1 `crop_const_lag`: if the tail of `initvals` is all `{0, x}`,
    /// drop those entries and reduce `lag` to match. A delayed value that
    /// starts at zero and is never re-driven stays zero forever, so the
    /// trailing register stages carry no information.
    pub fn crop_const_lag(&mut self) {
        while let Some(last) = self.initvals.last() {
            if matches!(last, Trit::Zero | Trit::X) {
                self.initvals.pop();
                self.lag -= 1;
            } else {
                break
            }
        }
    }
}

use crate::network::Network;
use crate::node::{NodeKind, NodePtr};

/// A `(lag, node)` pair: a node as seen `lag` register stages in the past,
/// letting register-closed cyclic graphs be traversed as if they were
/// time-shifted trees (spec §3.2, §9 "Cyclic graphs via CoverNode").
///
/// Ordering and equality are lexicographic over `(lag, node)`; `node`'s own
/// `Ord` (generation then slot index) stands in for "pointer identity" — it
/// is a stable total order, not a claim about allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoverNode {
    pub lag: u32,
    pub node: NodePtr,
}

impl CoverNode {
    pub fn here(node: NodePtr) -> CoverNode {
        CoverNode { lag: 0, node }
    }

    pub fn node_index(&self) -> usize {
        self.node.index()
    }

    /// Shifts this cover node further into the past by `extra` lag, as when
    /// injecting a cut computed at a fanin into the frame of its consumer
    /// (spec §4.4 `inject_lag`).
    pub fn inject_lag(self, extra: u32) -> CoverNode {
        CoverNode { lag: self.lag + extra, node: self.node }
    }

    /// The `i`-th fanin of this cover node, if `self.node` is an `And`
    /// (spec §3.2: "Fanins of a cover node are obtained by summing the edge
    /// lag into the parent's lag").
    pub fn fanin(self, net: &Network, i: usize) -> Option<CoverNode> {
        let node = net.node(self.node);
        if !matches!(node.kind, NodeKind::And) {
            return None
        }
        let edge = &node.ins[i];
        edge.target.map(|target| CoverNode { lag: self.lag + edge.lag, node: target })
    }
}

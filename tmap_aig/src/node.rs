use tmap_arena::{ptr_struct, Ptr};
use tmap_lut::Trit;

use crate::edge::Edge;

ptr_struct!(NodePtr);

impl NodePtr {
    /// A stable per-node integer, used as a cheap identity for hashing
    /// (spec §4.4 "cut hash"; grounded on `toymap.cc`'s use of the raw
    /// `AndNode*` as a hash key).
    pub fn index(&self) -> usize {
        Ptr::from(*self).index()
    }
}

/// What a node represents. Constants are dedicated nodes (spec §4.1: "the
/// three constants 0, 1, x each receive a dedicated node"); `Pi`/`And` are
/// as in spec §3.1. A primary output is not a distinct kind: per spec it is
/// "an AND node marked `po` whose second input is the constant 1", so it is
/// carried as a flag on [`Node`] rather than a separate variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Pi,
    Const(Trit),
    And,
}

/// A node in the AIG. `ins` is meaningful only when `kind` is `And`: for
/// `Pi`/`Const` nodes it holds two unused placeholder edges so the struct
/// stays uniform (mirrors `OpNode` in the teacher, which always carries a
/// fixed-shape scratch area regardless of which `Op` variant is live).
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub ins: [Edge; 2],
    pub po: bool,
    pub label: Option<String>,
}

impl Node {
    pub fn pi(label: Option<String>) -> Node {
        Node {
            kind: NodeKind::Pi,
            ins: [Edge::unused(), Edge::unused()],
            po: false,
            label,
        }
    }

    pub fn constant(value: Trit, label: Option<String>) -> Node {
        Node {
            kind: NodeKind::Const(value),
            ins: [Edge::unused(), Edge::unused()],
            po: false,
            label,
        }
    }

    pub fn and(ins: [Edge; 2], label: Option<String>) -> Node {
        Node { kind: NodeKind::And, ins, po: false, label }
    }

    pub fn is_and(&self) -> bool {
        matches!(self.kind, NodeKind::And)
    }

    pub fn is_pi(&self) -> bool {
        matches!(self.kind, NodeKind::Pi)
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, NodeKind::Const(_))
    }
}

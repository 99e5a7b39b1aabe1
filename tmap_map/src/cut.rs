//! Cuts: K-feasible sets of [`CoverNode`]s at an AIG node (spec §3.3).

use smallvec::SmallVec;
use tmap_aig::{CoverNode, NodePtr};

/// `K_max`: the hard ceiling on cut width the data model supports (spec
/// §3.3: "up to K_max (≤6)"). The actual per-run limit (`max_cut`, the `-lut
/// N` flag) is always `<= CUT_MAXIMUM`.
pub const CUT_MAXIMUM: usize = 6;

/// Default size of the per-node priority-cut leaderboard (spec §4.4).
pub const NPRIORITY_CUTS: usize = 8;

/// A cut: a sorted, deduplicated, inline array of up to [`CUT_MAXIMUM`]
/// cover nodes (spec §3.3 invariant: "cut members are sorted and unique on
/// `(lag, img)`").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cut(SmallVec<[CoverNode; CUT_MAXIMUM]>);

impl Cut {
    pub fn empty() -> Cut {
        Cut(SmallVec::new())
    }

    /// The trivial self-cut used for a PI (spec §4.4 step for PIs) or for
    /// the identity/`trivial_cuts` mapping (spec §8.2-12).
    pub fn trivial(node: NodePtr) -> Cut {
        let mut v = SmallVec::new();
        v.push(CoverNode::here(node));
        Cut(v)
    }

    pub fn single(cn: CoverNode) -> Cut {
        let mut v = SmallVec::new();
        v.push(cn);
        Cut(v)
    }

    pub fn from_sorted_unique(v: Vec<CoverNode>) -> Cut {
        debug_assert!(v.windows(2).all(|w| w[0] < w[1]));
        Cut(v.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoverNode> {
        self.0.iter()
    }

    pub fn position(&self, cn: CoverNode) -> Option<usize> {
        self.0.iter().position(|c| *c == cn)
    }

    pub fn contains(&self, cn: CoverNode) -> bool {
        self.0.contains(&cn)
    }

    /// Spec §4.4 step 1: `M = ca.inject_lag(la) ∪ cb.inject_lag(lb)` under
    /// cover-node set union, rejecting if the merged width exceeds
    /// `max_cut`.
    pub fn merge(a: &Cut, lag_a: u32, b: &Cut, lag_b: u32, max_cut: usize) -> Option<Cut> {
        let mut merged: Vec<CoverNode> = a
            .0
            .iter()
            .map(|c| c.inject_lag(lag_a))
            .chain(b.0.iter().map(|c| c.inject_lag(lag_b)))
            .collect();
        merged.sort_unstable();
        merged.dedup();
        if merged.len() > max_cut {
            None
        } else {
            Some(Cut(merged.into()))
        }
    }

    /// A fold of cut member identities, used only to disambiguate
    /// equal-metric cuts within the leaderboard (spec §4.4 "cut hash").
    /// Matches `toymap.cc`'s `hash += (int)(long long) pair.first.img`: a
    /// plain sum over a stable per-node identity (here, the arena index),
    /// folded with the lag so cuts differing only in lag still hash apart.
    pub fn hash(&self) -> u64 {
        let mut h: u64 = 0;
        for cn in &self.0 {
            h = h.wrapping_add((cn.node_index() as u64).wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(cn.lag as u64));
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmap_aig::{Edge, Network};

    #[test]
    fn merge_deduplicates_shared_fanins() {
        let mut net = Network::new();
        let a = net.add_pi(None);
        let cut_a = Cut::trivial(a);
        let cut_b = Cut::trivial(a);
        let merged = Cut::merge(&cut_a, 0, &cut_b, 0, CUT_MAXIMUM).unwrap();
        assert_eq!(merged.len(), 1);
        let _ = Edge::to(a);
    }

    #[test]
    fn merge_rejects_oversized_cuts() {
        let mut net = Network::new();
        let pis: Vec<_> = (0..4).map(|_| net.add_pi(None)).collect();
        let cut_a = Cut::from_sorted_unique({
            let mut v: Vec<_> = pis[0..2].iter().map(|&p| CoverNode::here(p)).collect();
            v.sort_unstable();
            v
        });
        let cut_b = Cut::from_sorted_unique({
            let mut v: Vec<_> = pis[2..4].iter().map(|&p| CoverNode::here(p)).collect();
            v.sort_unstable();
            v
        });
        assert!(Cut::merge(&cut_a, 0, &cut_b, 0, 3).is_none());
        assert!(Cut::merge(&cut_a, 0, &cut_b, 0, 4).is_some());
    }
}

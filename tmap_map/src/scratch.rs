//! Mapping scratch (spec §3.4, §9 "scratch-field union" — split here into
//! separate `Vec`s rather than overlaid in a union, since lifetimes of each
//! table are clear from the pass boundaries).
//!
//! Two different indexing schemes are in play, matching the original's own
//! split between a frontier-bounded transient cache and per-`AndNode`
//! persistent fields:
//!
//! - The priority-cut leaderboard (`leaderboards`) is the transient cache
//!   the original calls `NodeCache[frontier_size]` — it is only ever read
//!   back for a node's fanouts while that node is still live in the
//!   reverse-topological frontier, so it is sized and indexed by
//!   [`tmap_aig::Network::frontier`]'s `fid`, which recycles slots once a
//!   node's last consumer has been visited.
//! - `map_fanouts`, `depth`, `area_flow`, `edge_flow`, `fanouts`, and
//!   `depth_limit` are persistent per-node fields — in the original these
//!   live directly on `AndNode`, not in the frontier cache, and stay valid
//!   for the whole mapping regardless of frontier recycling. Reusing the
//!   frontier `fid` for these would alias two live nodes onto the same slot
//!   (the `fid` free-list recycles a slot as soon as one node's last
//!   consumer is visited, which says nothing about whether a *different*
//!   node's persistent state is still needed). These are instead indexed by
//!   [`tmap_aig::NodePtr::index`], the node's raw, never-recycled-during-a-
//!   mapping arena slot index, and sized to [`tmap_aig::Network::capacity`].

use std::collections::HashMap;

use tmap_aig::{GraphError, Network, NodePtr};

use crate::cut::Cut;

/// Scratch state for one in-progress or completed mapping.
pub struct MappingState {
    fid: HashMap<NodePtr, u32>,
    /// Each node's priority-cut cache (spec §4.4): up to
    /// [`crate::cut::NPRIORITY_CUTS`] candidates, best-first. Cut
    /// enumeration at a consumer combines pairs drawn from *both* fanins'
    /// full caches, not just their single best entry. Frontier-indexed —
    /// see the module doc comment.
    pub(crate) leaderboards: Vec<Vec<Cut>>,
    /// Persistent per-node fields, indexed by [`tmap_aig::NodePtr::index`]
    /// and sized to [`tmap_aig::Network::capacity`] (see module doc
    /// comment).
    pub(crate) map_fanouts: Vec<u32>,
    pub(crate) depth: Vec<u32>,
    pub(crate) area_flow: Vec<f64>,
    pub(crate) edge_flow: Vec<f64>,
    pub(crate) fanouts: Vec<u32>,
    pub(crate) depth_limit: Vec<u32>,
    pub(crate) visited: Vec<bool>,
}

impl MappingState {
    pub fn new(net: &Network) -> Result<MappingState, GraphError> {
        let (fid, frontier_size) = net.frontier()?;
        let nf = frontier_size as usize;
        let cap = net.capacity();

        let mut fanouts = vec![0u32; cap];
        for (n, count) in net.fanouts() {
            fanouts[n.index()] = count;
        }

        Ok(MappingState {
            fid,
            leaderboards: vec![Vec::new(); nf],
            map_fanouts: vec![0; cap],
            depth: vec![0; cap],
            area_flow: vec![0.0; cap],
            edge_flow: vec![0.0; cap],
            fanouts,
            depth_limit: vec![u32::MAX; cap],
            visited: vec![false; cap],
        })
    }

    /// Frontier-cache index (leaderboards only).
    fn fid_idx(&self, n: NodePtr) -> usize {
        *self.fid.get(&n).expect("node outside this mapping's frontier") as usize
    }

    /// Persistent-field index: the node's raw arena slot index, stable for
    /// as long as the node is live (see module doc comment).
    fn idx(&self, n: NodePtr) -> usize {
        n.index()
    }

    /// `pub(crate)` escape hatch for sibling modules (`mapping`, `eval`)
    /// that need direct indexed access into the persistent scratch vectors
    /// rather than going through one accessor at a time.
    pub(crate) fn idx_pub(&self, n: NodePtr) -> usize {
        self.idx(n)
    }

    /// The node's current best cut (the head of its priority-cut cache),
    /// used for mapping ref-counting, depth/area-flow lookups, and
    /// emission. Empty if no cut has been selected yet.
    pub fn cut(&self, n: NodePtr) -> &Cut {
        static EMPTY: std::sync::OnceLock<Cut> = std::sync::OnceLock::new();
        self.leaderboards[self.fid_idx(n)].first().unwrap_or_else(|| EMPTY.get_or_init(Cut::empty))
    }

    /// Replaces the node's priority-cut cache with `cuts`, which the caller
    /// is responsible for having sorted best-first and truncated to
    /// [`crate::cut::NPRIORITY_CUTS`].
    pub fn set_leaderboard(&mut self, n: NodePtr, cuts: Vec<Cut>) {
        let i = self.fid_idx(n);
        self.leaderboards[i] = cuts;
    }

    pub fn leaderboard(&self, n: NodePtr) -> &[Cut] {
        &self.leaderboards[self.fid_idx(n)]
    }

    /// Convenience for nodes whose cache is always a single trivial cut
    /// (PIs, POs).
    pub fn set_cut(&mut self, n: NodePtr, cut: Cut) {
        let i = self.fid_idx(n);
        self.leaderboards[i] = vec![cut];
    }

    pub fn map_fanouts(&self, n: NodePtr) -> u32 {
        self.map_fanouts[self.idx(n)]
    }

    pub fn is_in_mapping(&self, n: NodePtr) -> bool {
        self.map_fanouts(n) > 0
    }

    pub fn depth(&self, n: NodePtr) -> u32 {
        self.depth[self.idx(n)]
    }

    pub fn set_depth(&mut self, n: NodePtr, d: u32) {
        let i = self.idx(n);
        self.depth[i] = d;
    }

    pub fn area_flow(&self, n: NodePtr) -> f64 {
        self.area_flow[self.idx(n)]
    }

    pub fn edge_flow(&self, n: NodePtr) -> f64 {
        self.edge_flow[self.idx(n)]
    }

    pub fn static_fanouts(&self, n: NodePtr) -> u32 {
        self.fanouts[self.idx(n)]
    }

    pub fn depth_limit(&self, n: NodePtr) -> u32 {
        self.depth_limit[self.idx(n)]
    }

    pub fn set_depth_limit(&mut self, n: NodePtr, d: u32) {
        let i = self.idx(n);
        self.depth_limit[i] = d;
    }
}

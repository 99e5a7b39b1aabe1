use std::collections::{HashMap, HashSet};

use rand_core::RngCore;
use tmap_arena::{Arena, Ptr};
use tmap_lut::Trit;

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::{Node, NodeKind, NodePtr};

/// The And-Inverter Graph itself (spec §3.1, §4.1–§4.3). Nodes are owned by
/// the arena; edge targets are non-owning `NodePtr`s, matching the
/// teacher's arena-of-nodes-with-index-edges shape (`awint_dag::OpDag`).
pub struct Network {
    nodes: Arena<Node>,
    pis: Vec<NodePtr>,
    pos: Vec<NodePtr>,
    const0: NodePtr,
    const1: NodePtr,
    constx: NodePtr,
}

impl Network {
    pub fn new() -> Network {
        let mut nodes = Arena::new();
        let const0 = NodePtr::from(nodes.insert(Node::constant(Trit::Zero, Some("$$const0".into()))));
        let const1 = NodePtr::from(nodes.insert(Node::constant(Trit::One, Some("$$const1".into()))));
        let constx = NodePtr::from(nodes.insert(Node::constant(Trit::X, Some("$$constx".into()))));
        Network { nodes, pis: Vec::new(), pos: Vec::new(), const0, const1, constx }
    }

    pub fn const0(&self) -> NodePtr {
        self.const0
    }

    pub fn const1(&self) -> NodePtr {
        self.const1
    }

    pub fn constx(&self) -> NodePtr {
        self.constx
    }

    pub fn node(&self, p: NodePtr) -> &Node {
        &self.nodes[Ptr::from(p)]
    }

    pub fn node_mut(&mut self, p: NodePtr) -> &mut Node {
        &mut self.nodes[Ptr::from(p)]
    }

    pub fn get(&self, p: NodePtr) -> Option<&Node> {
        self.nodes.get(Ptr::from(p))
    }

    pub fn pis(&self) -> &[NodePtr] {
        &self.pis
    }

    pub fn pos(&self) -> &[NodePtr] {
        &self.pos
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodePtr> + '_ {
        self.nodes.ptrs().map(NodePtr::from)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Upper bound on any live node's [`NodePtr::index`] (the arena's slot
    /// count, not its live element count): callers that index a side table
    /// by raw node index rather than by frontier `fid` — i.e. persistent
    /// per-node scratch, not the transient priority-cut cache — size their
    /// table to this, not to `len()`, since removed slots leave gaps.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn add_pi(&mut self, label: Option<String>) -> NodePtr {
        let p = NodePtr::from(self.nodes.insert(Node::pi(label)));
        self.pis.push(p);
        p
    }

    pub fn add_and(&mut self, in0: Edge, in1: Edge, label: Option<String>) -> NodePtr {
        NodePtr::from(self.nodes.insert(Node::and([in0, in1], label)))
    }

    /// Adds a PO-alias node: an AND node marked `po` whose second input is
    /// the constant 1 and whose first input carries the signal (spec
    /// §3.1).
    pub fn add_po(&mut self, driver: Edge, label: Option<String>) -> NodePtr {
        let mut node = Node::and([driver, Edge::constant(true)], label);
        node.po = true;
        let p = NodePtr::from(self.nodes.insert(node));
        self.pos.push(p);
        p
    }

    /// Spec §4.1: from the PO/PI seed set (plus the three dedicated
    /// constants, which are always kept live), traverse backward via
    /// fanin, mark the reachable set, delete the rest. Returns the number
    /// of nodes deleted.
    pub fn clean(&mut self) -> usize {
        let mut marked: HashSet<NodePtr> = HashSet::new();
        let mut stack: Vec<NodePtr> = self.pos.clone();
        stack.extend(self.pis.iter().copied());
        stack.push(self.const0);
        stack.push(self.const1);
        stack.push(self.constx);

        while let Some(p) = stack.pop() {
            if !marked.insert(p) {
                continue
            }
            if let NodeKind::And = self.nodes[Ptr::from(p)].kind {
                for edge in &self.nodes[Ptr::from(p)].ins {
                    if let Some(t) = edge.target {
                        stack.push(t);
                    }
                }
            }
        }

        let all: Vec<NodePtr> = self.nodes().collect();
        let mut removed = 0;
        for p in all {
            if !marked.contains(&p) {
                self.nodes.remove(Ptr::from(p));
                removed += 1;
            }
        }
        self.pis.retain(|p| marked.contains(p));
        self.pos.retain(|p| marked.contains(p));
        removed
    }

    /// Spec §4.1: repeatedly apply `crop_const_lag`, constant-edge folding,
    /// constant-input expansion and `assume` across every node until
    /// fixpoint, then `clean`.
    pub fn compact(&mut self) -> usize {
        loop {
            let mut changed = false;
            let ptrs: Vec<NodePtr> = self.nodes().collect();

            for &p in &ptrs {
                if !matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And) {
                    continue
                }
                for i in 0..2 {
                    let edge = &mut self.nodes[Ptr::from(p)].ins[i];
                    let before_lag = edge.lag;
                    edge.crop_const_lag();
                    if edge.lag != before_lag {
                        changed = true;
                    }
                }
                for i in 0..2 {
                    if self.canonicalize_constant_edge(p, i) {
                        changed = true;
                    }
                }
            }

            for &p in &ptrs {
                if self.try_expand_constant(p) {
                    changed = true;
                }
            }
            for &p in &ptrs {
                if self.try_assume(p) {
                    changed = true;
                }
            }

            if !changed {
                break
            }
        }
        self.clean()
    }

    /// If edge `i` of node `p` is a zero-lag reference to a dedicated
    /// `Const(Zero)`/`Const(One)` node, rewrite it into the canonical
    /// null-target constant form (same polarity resolution as
    /// `resolve_constant`, applied destructively here since this is the
    /// step that actually folds the dedicated `Const` node away).
    fn canonicalize_constant_edge(&mut self, p: NodePtr, i: usize) -> bool {
        let edge = self.nodes[Ptr::from(p)].ins[i].clone();
        if edge.lag != 0 || edge.target.is_none() {
            return false
        }
        let target = edge.target.unwrap();
        let resolved = match self.nodes[Ptr::from(target)].kind {
            NodeKind::Const(Trit::Zero) => edge.negated,
            NodeKind::Const(Trit::One) => !edge.negated,
            _ => return false,
        };
        self.nodes[Ptr::from(p)].ins[i] = Edge::constant(resolved);
        true
    }

    /// The resolved Boolean constant this edge carries, folding through
    /// dedicated constant nodes, or `None` if it is not (yet) known
    /// constant.
    fn resolve_constant(&self, edge: &Edge) -> Option<bool> {
        if edge.lag != 0 {
            return None
        }
        match edge.target {
            None => Some(edge.negated),
            Some(t) => match self.nodes[Ptr::from(t)].kind {
                NodeKind::Const(Trit::Zero) => Some(edge.negated),
                NodeKind::Const(Trit::One) => Some(!edge.negated),
                _ => None,
            },
        }
    }

    /// Spec §4.1 "expand through constant input": if input `i` of AND node
    /// `p` is constant `c`, every edge that targets `p` is rewritten — if
    /// `c == 1`, to the composed edge through `p`'s surviving input; if `c
    /// == 0`, to the constant `negated` flag of the consuming edge.
    fn try_expand_constant(&mut self, p: NodePtr) -> bool {
        if !matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And) {
            return false
        }
        for i in 0..2 {
            let edge_i = self.nodes[Ptr::from(p)].ins[i].clone();
            let Some(c) = self.resolve_constant(&edge_i) else { continue };
            let other = self.nodes[Ptr::from(p)].ins[1 - i].clone();
            if c {
                self.redirect_with(p, move |outer| Edge::compose(outer, &other));
            } else {
                self.redirect_with(p, |outer| Edge::constant(outer.negated));
            }
            return true
        }
        false
    }

    /// Spec §4.1 `assume`: if AND node `p`'s first input `a` is itself an
    /// AND node with a sub-input tied to `p`'s second input `b` (same
    /// target, same lag), that sub-input is forced to the constant implied
    /// by the two edges' relative polarity (`a ∧ (a ∧ y) ≡ a ∧ y`).
    fn try_assume(&mut self, p: NodePtr) -> bool {
        if !matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And) {
            return false
        }
        let b = self.nodes[Ptr::from(p)].ins[1].clone();
        let Some(_b_target) = b.target else { return false };
        let a = self.nodes[Ptr::from(p)].ins[0].clone();
        let Some(a_target) = a.target else { return false };
        if !matches!(self.nodes[Ptr::from(a_target)].kind, NodeKind::And) {
            return false
        }
        for i in 0..2 {
            let x = self.nodes[Ptr::from(a_target)].ins[i].clone();
            if x.target == b.target && x.lag == b.lag {
                let value = x.negated == b.negated;
                self.nodes[Ptr::from(a_target)].ins[i] = Edge::constant(value);
                return true
            }
        }
        false
    }

    /// Rewrites every edge across the whole graph that targets `old` by
    /// applying `f` to it, in place. `old` itself is left alone; `clean`
    /// removes it once it becomes unreachable.
    fn redirect_with(&mut self, old: NodePtr, f: impl Fn(&Edge) -> Edge) {
        let ptrs: Vec<NodePtr> = self.nodes().collect();
        for p in ptrs {
            if !matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And) {
                continue
            }
            for i in 0..2 {
                if self.nodes[Ptr::from(p)].ins[i].target == Some(old) {
                    let new_edge = f(&self.nodes[Ptr::from(p)].ins[i]);
                    self.nodes[Ptr::from(p)].ins[i] = new_edge;
                }
            }
        }
    }

    /// Simple target redirection, used by `hash_cons`: every edge that
    /// pointed at `old` now points at `new`, all other edge fields
    /// unchanged.
    fn redirect_target(&mut self, old: NodePtr, new: NodePtr) {
        self.redirect_with(old, move |outer| Edge {
            negated: outer.negated,
            lag: outer.lag,
            initvals: outer.initvals.clone(),
            target: Some(new),
        });
    }

    /// Spec §4.2 `tsort`: orders nodes so every AND node follows both its
    /// fanins, ignoring `lag > 0` edges (which may close cycles). Errors if
    /// the zero-lag projection itself has a cycle.
    pub fn tsort(&self) -> Result<Vec<NodePtr>, GraphError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut mark: HashMap<NodePtr, Mark> = HashMap::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for start in self.nodes() {
            if mark.get(&start).copied().unwrap_or(Mark::Unvisited) != Mark::Unvisited {
                continue
            }
            let mut stack: Vec<(NodePtr, usize)> = vec![(start, 0)];
            mark.insert(start, Mark::InProgress);
            while let Some((p, next_in)) = stack.pop() {
                let fanins: Vec<NodePtr> = match self.nodes[Ptr::from(p)].kind {
                    NodeKind::And => self.nodes[Ptr::from(p)]
                        .ins
                        .iter()
                        .filter(|e| e.lag == 0)
                        .filter_map(|e| e.target)
                        .collect(),
                    _ => Vec::new(),
                };
                if next_in < fanins.len() {
                    stack.push((p, next_in + 1));
                    let fin = fanins[next_in];
                    match mark.get(&fin).copied().unwrap_or(Mark::Unvisited) {
                        Mark::Unvisited => {
                            mark.insert(fin, Mark::InProgress);
                            stack.push((fin, 0));
                        }
                        Mark::InProgress => return Err(GraphError::CyclicZeroLagGraph),
                        Mark::Done => {}
                    }
                } else {
                    mark.insert(p, Mark::Done);
                    order.push(p);
                }
            }
        }
        Ok(order)
    }

    /// Spec §4.2: number of edges targeting `n`, plus 1 if `n` is a PO.
    pub fn fanouts(&self) -> HashMap<NodePtr, u32> {
        let mut counts: HashMap<NodePtr, u32> = HashMap::new();
        for p in self.nodes() {
            if let NodeKind::And = self.nodes[Ptr::from(p)].kind {
                for edge in &self.nodes[Ptr::from(p)].ins {
                    if let Some(t) = edge.target {
                        *counts.entry(t).or_insert(0) += 1;
                    }
                }
            }
        }
        for &po in &self.pos {
            *counts.entry(po).or_insert(0) += 1;
        }
        counts
    }

    /// Spec §4.3 frontier indexing: a reverse-topological sweep (consumers
    /// visited before producers) that assigns each node a small integer
    /// `fid`, recycling indices once every consumer of a node has been
    /// visited. Returns the assignment plus the peak live-set size, which
    /// bounds mapping scratch memory (grounded on `Network::frontier`,
    /// `toymap.cc`, whose `frontier_size` starts at 1 to account for PO
    /// scratch).
    pub fn frontier(&self) -> Result<(HashMap<NodePtr, u32>, u32), GraphError> {
        let order = self.tsort()?;
        let mut remaining = self.fanouts();

        let mut fid: HashMap<NodePtr, u32> = HashMap::new();
        let mut free_list: Vec<u32> = Vec::new();
        let mut next_id: u32 = 0;
        let mut live: u32 = 0;
        let mut frontier_size: u32 = 1;

        let mut assign = |p: NodePtr,
                           fid: &mut HashMap<NodePtr, u32>,
                           free_list: &mut Vec<u32>,
                           next_id: &mut u32,
                           live: &mut u32,
                           frontier_size: &mut u32| {
            if fid.contains_key(&p) {
                return
            }
            let id = free_list.pop().unwrap_or_else(|| {
                let id = *next_id;
                *next_id += 1;
                id
            });
            fid.insert(p, id);
            *live += 1;
            *frontier_size = (*frontier_size).max(*live);
        };

        for &po in &self.pos {
            assign(po, &mut fid, &mut free_list, &mut next_id, &mut live, &mut frontier_size);
        }

        for &p in order.iter().rev() {
            assign(p, &mut fid, &mut free_list, &mut next_id, &mut live, &mut frontier_size);
            if let NodeKind::And = self.nodes[Ptr::from(p)].kind {
                let fanins: Vec<NodePtr> =
                    self.nodes[Ptr::from(p)].ins.iter().filter_map(|e| e.target).collect();
                for fin in fanins {
                    assign(fin, &mut fid, &mut free_list, &mut next_id, &mut live, &mut frontier_size);
                    let left = remaining.entry(fin).or_insert(0);
                    if *left > 0 {
                        *left -= 1;
                    }
                    if *left == 0 {
                        if let Some(id) = fid.get(&fin).copied() {
                            free_list.push(id);
                            live -= 1;
                        }
                    }
                }
            }
        }

        Ok((fid, frontier_size))
    }

    /// Debug/fuzz tool: redistributes register lag across each AND node's
    /// two inputs while preserving their sum, using a seeded PRNG so tests
    /// are reproducible (spec §9 "non-determinism from hashing" applies
    /// the same reasoning here; grounded on `Network::scramble_lag`,
    /// `toymap.cc:886-904`, which used C's `rand()`).
    pub fn scramble_lag(&mut self, rng: &mut impl RngCore) {
        let ptrs: Vec<NodePtr> = self.nodes().collect();
        for p in ptrs {
            if !matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And) {
                continue
            }
            let total = self.nodes[Ptr::from(p)].ins[0].lag + self.nodes[Ptr::from(p)].ins[1].lag;
            if total == 0 {
                continue
            }
            let new_lag0 = rng.next_u32() % (total + 1);
            let new_lag1 = total - new_lag0;
            for (i, new_lag) in [new_lag0, new_lag1].into_iter().enumerate() {
                let edge = &mut self.nodes[Ptr::from(p)].ins[i];
                edge.initvals.resize(new_lag as usize, Trit::X);
                edge.lag = new_lag;
            }
        }
    }

    /// `-hash`: structural hash-consing of AND nodes. Two AND nodes with
    /// the same (unordered) pair of input edges are merged, folding
    /// isomorphic subgraphs together. Run to fixpoint with `compact`. An
    /// Open Question decision (see `DESIGN.md`): the original flag is
    /// named in spec §6 but its body was not present in the retained
    /// source excerpt.
    pub fn hash_cons(&mut self) -> usize {
        let mut merged = 0;
        loop {
            let order = match self.tsort() {
                Ok(o) => o,
                Err(_) => break,
            };
            let mut seen: HashMap<EdgeKey, NodePtr> = HashMap::new();
            let mut changed = false;
            for p in order {
                if !matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And) {
                    continue
                }
                if self.nodes[Ptr::from(p)].po {
                    continue
                }
                let key = EdgeKey::of(&self.nodes[Ptr::from(p)].ins);
                match seen.get(&key) {
                    Some(&existing) if existing != p => {
                        self.redirect_target(p, existing);
                        merged += 1;
                        changed = true;
                    }
                    _ => {
                        seen.insert(key, p);
                    }
                }
            }
            self.clean();
            if !changed {
                break
            }
        }
        merged
    }

    /// `-unique`: appends a numeric suffix to any node label that collides
    /// with an earlier node's label, so exported names stay distinct. An
    /// Open Question decision (see `DESIGN.md`).
    pub fn dedup_labels(&mut self) {
        let mut seen: HashMap<String, u32> = HashMap::new();
        for p in self.nodes().collect::<Vec<_>>() {
            let Some(label) = self.nodes[Ptr::from(p)].label.clone() else { continue };
            let count = seen.entry(label.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                self.nodes[Ptr::from(p)].label = Some(format!("{label}_{count}"));
            }
        }
    }

    /// `-balance`: rebalances maximal chains of same-polarity, zero-lag,
    /// single-fanout AND nodes into a balanced binary tree, reducing depth
    /// ahead of `depth_cuts`. An Open Question decision (see
    /// `DESIGN.md`).
    pub fn balance(&mut self) {
        let fanouts = self.fanouts();
        let roots: Vec<NodePtr> = self
            .nodes()
            .filter(|&p| matches!(self.nodes[Ptr::from(p)].kind, NodeKind::And))
            .collect();
        for root in roots {
            if !self.nodes.contains(Ptr::from(root)) {
                continue
            }
            let leaves = self.collect_balance_chain(root, &fanouts);
            if leaves.len() <= 2 {
                continue
            }
            let new_root = self.build_balanced_tree(&leaves);
            self.redirect_target(root, new_root);
        }
        self.clean();
    }

    /// Walks the chain of non-inverted, zero-lag, single-fanout AND
    /// fanins, collecting the edges that feed the final balanced tree.
    fn collect_balance_chain(&self, root: NodePtr, fanouts: &HashMap<NodePtr, u32>) -> Vec<Edge> {
        let mut leaves = Vec::new();
        let mut frontier = vec![root];
        while let Some(p) = frontier.pop() {
            let node = &self.nodes[Ptr::from(p)];
            if !matches!(node.kind, NodeKind::And) {
                leaves.push(Edge::to(p));
                continue
            }
            for edge in &node.ins {
                let chainable = !edge.negated
                    && edge.lag == 0
                    && edge
                        .target
                        .map(|t| {
                            matches!(self.nodes[Ptr::from(t)].kind, NodeKind::And)
                                && fanouts.get(&t).copied().unwrap_or(0) == 1
                                && !self.nodes[Ptr::from(t)].po
                        })
                        .unwrap_or(false);
                if chainable {
                    frontier.push(edge.target.unwrap());
                } else {
                    leaves.push(edge.clone());
                }
            }
        }
        leaves
    }

    fn build_balanced_tree(&mut self, leaves: &[Edge]) -> NodePtr {
        let mut level: Vec<Edge> = leaves.to_vec();
        loop {
            if level.len() == 1 {
                // a single surviving edge cannot be a node; wrap it in a
                // trivial self-AND would change semantics, so the caller
                // guarantees len() > 1 on entry.
                break
            }
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut it = level.into_iter();
            while let Some(a) = it.next() {
                if let Some(b) = it.next() {
                    let p = self.add_and(a, b, None);
                    next.push(Edge::to(p));
                } else {
                    next.push(a);
                }
            }
            level = next;
            if level.len() == 1 {
                break
            }
        }
        level[0].target.expect("balanced tree root must be a node reference")
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey(Vec<(Option<NodePtr>, bool, u32)>);

impl EdgeKey {
    fn of(ins: &[Edge; 2]) -> EdgeKey {
        let mut v: Vec<(Option<NodePtr>, bool, u32)> =
            ins.iter().map(|e| (e.target, e.negated, e.lag)).collect();
        v.sort();
        EdgeKey(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_keeps_pis_and_reachable_pos() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let b = net.add_pi(Some("b".into()));
        let and_node = net.add_and(Edge::to(a), Edge::to(b), None);
        net.add_po(Edge::to(and_node), Some("y".into()));
        let dead = net.add_and(Edge::to(a), Edge::to(a), None);
        let _ = dead;
        let removed = net.clean();
        assert_eq!(removed, 1);
        assert_eq!(net.pis().len(), 2);
        assert_eq!(net.pos().len(), 1);
    }

    #[test]
    fn expand_through_constant_one_collapses_and() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let const1 = net.const1();
        let and_node = net.add_and(Edge::to(a), Edge::to(const1), None);
        net.add_po(Edge::to(and_node), Some("y".into()));
        net.compact();
        let po = net.pos()[0];
        assert_eq!(net.node(po).ins[0].target, Some(a));
    }

    #[test]
    fn expand_through_constant_zero_collapses_to_constant() {
        let mut net = Network::new();
        let a = net.add_pi(Some("a".into()));
        let const0 = net.const0();
        let and_node = net.add_and(Edge::to(a), Edge::to(const0), None);
        net.add_po(Edge::to(and_node), Some("y".into()));
        net.compact();
        let po = net.pos()[0];
        assert_eq!(net.node(po).ins[0].constant_value(), Some(false));
    }

    #[test]
    fn tsort_orders_fanins_before_consumers() {
        let mut net = Network::new();
        let a = net.add_pi(None);
        let b = net.add_pi(None);
        let and1 = net.add_and(Edge::to(a), Edge::to(b), None);
        let and2 = net.add_and(Edge::to(and1), Edge::to(a), None);
        let order = net.tsort().unwrap();
        let pos_of = |p: NodePtr| order.iter().position(|&x| x == p).unwrap();
        assert!(pos_of(and1) < pos_of(and2));
    }

    #[test]
    fn fanouts_counts_po_membership() {
        let mut net = Network::new();
        let a = net.add_pi(None);
        let b = net.add_pi(None);
        let and_node = net.add_and(Edge::to(a), Edge::to(b), None);
        net.add_po(Edge::to(and_node), None);
        let fo = net.fanouts();
        assert_eq!(*fo.get(&and_node).unwrap(), 1);
        assert_eq!(*fo.get(&a).unwrap(), 1);
    }

    #[test]
    fn frontier_assigns_disjoint_ids_to_overlapping_lifetimes() {
        let mut net = Network::new();
        let a = net.add_pi(None);
        let b = net.add_pi(None);
        let c = net.add_pi(None);
        let and1 = net.add_and(Edge::to(a), Edge::to(b), None);
        let and2 = net.add_and(Edge::to(and1), Edge::to(c), None);
        net.add_po(Edge::to(and2), None);
        let (fid, frontier_size) = net.frontier().unwrap();
        assert!(frontier_size >= 1);
        assert_ne!(fid[&and1], fid[&and2]);
    }
}

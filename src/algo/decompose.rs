//! Chain decomposition of the condensation DAG.
//!
//! A *chain* is a sequence of vertices in which every vertex can reach its
//! successor; the decomposition partitions the DAG's vertex set into chains.
//! Fewer chains means a smaller indexing scheme, so three greedy heuristics
//! plus a concatenation post-pass compete on chain count.
//!
//! Chains and their entries live in two append-only arenas addressed by
//! `u32` indices, mirroring the edge storage of [`crate::graph`]: the chain
//! list is doubly linked through the chain slots and each chain's entries
//! are doubly linked through the entry slots, so removing a chain and
//! splicing its entries onto another chain are O(1) pointer surgery (plus
//! the dense-id renumbering pass).

use std::fmt;

use fixedbitset::FixedBitSet;

use crate::graph::{EdgeIndex, Graph, NodeIndex, Outgoing};
use crate::metrics::Metrics;

/// Stable handle of a chain slot in the decomposition's arena.
///
/// Distinct from the chain's *dense id* (its current position in the chain
/// list), which is renumbered whenever a chain is removed.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ChainIndex(u32);

impl ChainIndex {
    #[inline]
    pub fn new(x: usize) -> Self {
        ChainIndex(x as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn end() -> Self {
        ChainIndex(u32::MAX)
    }
}

impl fmt::Debug for ChainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainIndex({:?})", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
struct EntryIndex(u32);

impl EntryIndex {
    #[inline]
    fn new(x: usize) -> Self {
        EntryIndex(x as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn end() -> Self {
        EntryIndex(u32::MAX)
    }
}

struct ChainEntry {
    vertex: NodeIndex,
    prev: EntryIndex,
    next: EntryIndex,
}

struct Chain {
    /// Dense position in the chain list; renumbered after removals so ids
    /// always cover `[0, k)` in list order.
    id: u32,
    head: EntryIndex,
    tail: EntryIndex,
    len: u32,
    prev: ChainIndex,
    next: ChainIndex,
}

/// A partition of the DAG's vertices into chains.
///
/// After every public operation the mapping invariant holds: for every
/// chain `c` and every vertex `v` at position `i` of `c`,
/// `assignment(v) == (c, i)`, every vertex is on exactly one chain, and the
/// dense chain ids equal the chains' positions in the chain list.
pub struct Decomposition {
    v_to_chain: Vec<(ChainIndex, u32)>,
    chains: Vec<Chain>,
    entries: Vec<ChainEntry>,
    first: ChainIndex,
    last: ChainIndex,
    live: usize,
}

impl Decomposition {
    fn with_capacity(n: usize) -> Self {
        Decomposition {
            v_to_chain: vec![(ChainIndex::end(), 0); n],
            chains: Vec::new(),
            entries: Vec::with_capacity(n),
            first: ChainIndex::end(),
            last: ChainIndex::end(),
            live: 0,
        }
    }

    /// Number of chains.
    #[inline]
    pub fn chain_count(&self) -> usize {
        self.live
    }

    /// The chain `v` is assigned to, if any.
    #[inline]
    pub fn chain_of(&self, v: NodeIndex) -> Option<ChainIndex> {
        let (c, _) = self.v_to_chain[v.index()];
        (c != ChainIndex::end()).then_some(c)
    }

    /// The chain and position `v` is assigned to, if any.
    #[inline]
    pub fn assignment(&self, v: NodeIndex) -> Option<(ChainIndex, u32)> {
        let (c, pos) = self.v_to_chain[v.index()];
        (c != ChainIndex::end()).then_some((c, pos))
    }

    /// The dense id of a chain: its current position in the chain list.
    #[inline]
    pub fn chain_id(&self, c: ChainIndex) -> usize {
        self.chains[c.index()].id as usize
    }

    #[inline]
    pub fn chain_len(&self, c: ChainIndex) -> usize {
        self.chains[c.index()].len as usize
    }

    #[inline]
    pub fn first_vertex(&self, c: ChainIndex) -> NodeIndex {
        self.entries[self.chains[c.index()].head.index()].vertex
    }

    #[inline]
    pub fn last_vertex(&self, c: ChainIndex) -> NodeIndex {
        self.entries[self.chains[c.index()].tail.index()].vertex
    }

    /// The chains in list order (dense-id order).
    pub fn chains(&self) -> impl Iterator<Item = ChainIndex> + '_ {
        std::iter::successors((self.first != ChainIndex::end()).then_some(self.first), |&c| {
            let next = self.chains[c.index()].next;
            (next != ChainIndex::end()).then_some(next)
        })
    }

    /// The vertices of chain `c`, front to back.
    pub fn chain_vertices(&self, c: ChainIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let head = self.chains[c.index()].head;
        std::iter::successors((head != EntryIndex::end()).then_some(head), |&e| {
            let next = self.entries[e.index()].next;
            (next != EntryIndex::end()).then_some(next)
        })
        .map(|e| self.entries[e.index()].vertex)
    }

    fn push_entry(&mut self, v: NodeIndex) -> EntryIndex {
        let e = EntryIndex::new(self.entries.len());
        self.entries.push(ChainEntry {
            vertex: v,
            prev: EntryIndex::end(),
            next: EntryIndex::end(),
        });
        e
    }

    /// Open a new singleton chain holding `v` and append it to the chain
    /// list.
    fn new_chain(&mut self, v: NodeIndex) -> ChainIndex {
        let c = ChainIndex::new(self.chains.len());
        let entry = self.push_entry(v);
        self.chains.push(Chain {
            id: self.live as u32,
            head: entry,
            tail: entry,
            len: 1,
            prev: self.last,
            next: ChainIndex::end(),
        });
        if self.last == ChainIndex::end() {
            self.first = c;
        } else {
            self.chains[self.last.index()].next = c;
        }
        self.last = c;
        self.live += 1;
        self.v_to_chain[v.index()] = (c, 0);
        c
    }

    /// Append `v` to the end of chain `c`.
    fn append(&mut self, c: ChainIndex, v: NodeIndex) {
        let entry = self.push_entry(v);
        let tail = self.chains[c.index()].tail;
        self.entries[tail.index()].next = entry;
        self.entries[entry.index()].prev = tail;
        let len = self.chains[c.index()].len;
        self.v_to_chain[v.index()] = (c, len);
        self.chains[c.index()].tail = entry;
        self.chains[c.index()].len = len + 1;
    }

    /// Splice the whole of chain `src` onto the end of chain `dst`, remove
    /// `src` from the chain list and renumber the dense ids.
    ///
    /// The mapping update assigns `dst`'s length *before* the splice plus a
    /// running offset, so the first absorbed vertex lands exactly on the old
    /// tail length.
    fn combine(&mut self, src: ChainIndex, dst: ChainIndex) {
        debug_assert_ne!(src, dst);
        let dst_len = self.chains[dst.index()].len;
        let mut offset = 0;
        let mut e = self.chains[src.index()].head;
        while e != EntryIndex::end() {
            let v = self.entries[e.index()].vertex;
            self.v_to_chain[v.index()] = (dst, dst_len + offset);
            offset += 1;
            e = self.entries[e.index()].next;
        }

        let src_head = self.chains[src.index()].head;
        let src_tail = self.chains[src.index()].tail;
        let dst_tail = self.chains[dst.index()].tail;
        self.entries[dst_tail.index()].next = src_head;
        self.entries[src_head.index()].prev = dst_tail;
        self.chains[dst.index()].len = dst_len + offset;
        self.chains[dst.index()].tail = src_tail;

        self.unlink_chain(src);

        let mut id = 0;
        let mut c = self.first;
        while c != ChainIndex::end() {
            self.chains[c.index()].id = id;
            id += 1;
            c = self.chains[c.index()].next;
        }
    }

    fn unlink_chain(&mut self, c: ChainIndex) {
        let (prev, next) = {
            let chain = &self.chains[c.index()];
            (chain.prev, chain.next)
        };
        if prev == ChainIndex::end() {
            self.first = next;
        } else {
            self.chains[prev.index()].next = next;
        }
        if next == ChainIndex::end() {
            self.last = prev;
        } else {
            self.chains[next.index()].prev = prev;
        }
        let chain = &mut self.chains[c.index()];
        chain.prev = ChainIndex::end();
        chain.next = ChainIndex::end();
        self.live -= 1;
    }

    /// Check the mapping invariants: positions consistent with `assignment`,
    /// every vertex on exactly one chain, dense ids in list order.
    pub fn is_consistent(&self) -> bool {
        let n = self.v_to_chain.len();
        let mut seen = FixedBitSet::with_capacity(n);
        let mut covered = 0usize;
        for (expected_id, c) in self.chains().enumerate() {
            if self.chain_id(c) != expected_id {
                return false;
            }
            let mut i = 0u32;
            for v in self.chain_vertices(c) {
                if seen.contains(v.index()) {
                    return false;
                }
                seen.insert(v.index());
                if self.v_to_chain[v.index()] != (c, i) {
                    return false;
                }
                i += 1;
            }
            if i != self.chains[c.index()].len {
                return false;
            }
            covered += i as usize;
        }
        covered == n
    }

    /// Node-Order heuristic.
    ///
    /// Scans vertices in topological order; the first predecessor that is
    /// currently the last vertex of its chain has `v` appended to that
    /// chain, otherwise `v` opens a new chain. O(|V| + |E|).
    pub fn node_order(g: &Graph, topo: &[NodeIndex], metrics: &mut Metrics) -> Self {
        let mut decomp = Self::with_capacity(g.node_count());
        for &v in topo {
            metrics.decomp_nodes_processed += 1;
            let mut used = false;
            for (_, e) in g.in_edges(v) {
                metrics.decomp_edges_processed += 1;
                let s = e.source();
                if let Some(sc) = decomp.chain_of(s) {
                    if decomp.last_vertex(sc) == s {
                        decomp.append(sc, v);
                        metrics.decomp_nodes_processed += 1;
                        used = true;
                        break;
                    }
                }
            }
            if !used {
                decomp.new_chain(v);
                metrics.decomp_nodes_processed += 1;
            }
        }
        decomp
    }

    /// Chain-Order heuristic.
    ///
    /// Every unassigned vertex in topological order opens a new chain that
    /// is extended greedily: follow any outgoing edge to an unassigned
    /// target and continue from there, otherwise try the next edge.
    /// O(|V| + |E|).
    pub fn chain_order(g: &Graph, topo: &[NodeIndex], metrics: &mut Metrics) -> Self {
        let mut decomp = Self::with_capacity(g.node_count());
        let mut used = FixedBitSet::with_capacity(g.node_count());
        for &v in topo {
            metrics.decomp_nodes_processed += 1;
            if used.contains(v.index()) {
                continue;
            }
            used.insert(v.index());
            let c = decomp.new_chain(v);
            metrics.decomp_nodes_processed += 1;

            let mut e = g.first_edge(v, Outgoing);
            while e != EdgeIndex::end() {
                metrics.decomp_edges_processed += 1;
                let edge = g.edge(e);
                let t = edge.target();
                if !used.contains(t.index()) {
                    used.insert(t.index());
                    decomp.append(c, t);
                    metrics.decomp_nodes_processed += 1;
                    e = g.first_edge(t, Outgoing);
                } else {
                    e = edge.next;
                }
            }
        }
        decomp
    }

    /// H3-Concat heuristic.
    ///
    /// For every unassigned vertex in topological order, pick a predecessor
    /// that is the last of its chain with minimum out-degree; failing that,
    /// search the whole in-reachable area for *any* chain ending in a vertex
    /// that can reach `v` (reversed DFS with a shared visited map). After
    /// placing `v`, a successor with in-degree one is appended immediately.
    /// Runs in O(|E| + ℓ·(kₚ − k_c)) thanks to the search-area bound of
    /// [`reversed_dfs`].
    pub fn h3_concat(g: &Graph, topo: &[NodeIndex], metrics: &mut Metrics) -> Self {
        let mut decomp = Self::with_capacity(g.node_count());
        let mut visited = FixedBitSet::with_capacity(g.node_count());
        for &v in topo {
            metrics.decomp_nodes_processed += 1;
            if decomp.chain_of(v).is_none() {
                let mut w = find_last_of_chain_min_outdeg_pre(v, g, &visited, &decomp, metrics);
                if w.is_none() {
                    w = reversed_dfs(v, g, &decomp, &mut visited, metrics);
                }
                match w {
                    Some(w) => {
                        let c = decomp
                            .chain_of(w)
                            .expect("reversed search only returns chain vertices");
                        decomp.append(c, v);
                        metrics.decomp_nodes_processed += 1;
                    }
                    None => {
                        decomp.new_chain(v);
                        metrics.decomp_nodes_processed += 1;
                    }
                }
            }
            if let Some(t) = find_single_source_succ(v, g, &visited, metrics) {
                let c = decomp
                    .chain_of(v)
                    .expect("v was assigned to a chain above");
                decomp.append(c, t);
                metrics.decomp_nodes_processed += 1;
            }
        }
        decomp
    }

    /// Concatenation post-pass: try to splice every chain onto the end of
    /// another chain whose last vertex reaches its first vertex.
    ///
    /// Shares one visited map across all reversed searches, giving the
    /// amortized bound O(|E| + ℓ·(kₚ − k_c)).
    pub fn concat(&mut self, g: &Graph, metrics: &mut Metrics) {
        let mut visited = FixedBitSet::with_capacity(g.node_count());
        let mut p = self.first;
        while p != ChainIndex::end() {
            let next = self.chains[p.index()].next;
            let front = self.first_vertex(p);
            if let Some(s) = reversed_dfs(front, g, self, &mut visited, metrics) {
                let s_chain = self
                    .chain_of(s)
                    .expect("reversed search only returns chain vertices");
                self.combine(p, s_chain);
            }
            p = next;
        }
    }
}

impl fmt::Debug for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} chains:", self.chain_count())?;
        for c in self.chains() {
            write!(f, "C{}:", self.chain_id(c))?;
            for v in self.chain_vertices(c) {
                write!(f, " {}", v.index())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Search backwards from `t` along incoming edges for a vertex that is the
/// last of a chain other than `t`'s and can reach `t`.
///
/// The visited map is shared across invocations. On success the head trail
/// of this invocation is rolled back (those bits are cleared), on failure
/// the bits are retained: the failed area cannot yield a result for later
/// searches either, so keeping it closed bounds the total work.
fn reversed_dfs(
    t: NodeIndex,
    g: &Graph,
    decomp: &Decomposition,
    visited: &mut FixedBitSet,
    metrics: &mut Metrics,
) -> Option<NodeIndex> {
    let mut stack = Vec::new();
    let mut head = Vec::new();
    let t_chain = decomp.chain_of(t);

    metrics.decomp_nodes_processed += 1;
    stack.push(t);
    while let Some(&v) = stack.last() {
        if !visited.contains(v.index()) {
            head.push(v);
            visited.insert(v.index());
            for (_, e) in g.in_edges(v) {
                metrics.decomp_edges_processed += 1;
                let s = e.source();
                if let Some(sc) = decomp.chain_of(s) {
                    if Some(sc) != t_chain && decomp.last_vertex(sc) == s {
                        // Found a chain whose last vertex has a path to t:
                        // roll back this invocation's trail and report it.
                        for w in head.drain(..) {
                            metrics.decomp_nodes_processed += 1;
                            visited.set(w.index(), false);
                        }
                        return Some(s);
                    }
                }
                if !visited.contains(s.index()) {
                    metrics.decomp_nodes_processed += 1;
                    stack.push(s);
                }
            }
        } else if head.last() == Some(&v) {
            metrics.decomp_nodes_processed += 1;
            head.pop();
            stack.pop();
        } else {
            metrics.decomp_nodes_processed += 1;
            stack.pop();
        }
    }
    None
}

/// Among `v`'s predecessors that are the last vertex of their chain and not
/// closed off by the shared visited map, pick one with minimum out-degree
/// (ties: last encountered wins). O(deg⁻(v)).
fn find_last_of_chain_min_outdeg_pre(
    v: NodeIndex,
    g: &Graph,
    visited: &FixedBitSet,
    decomp: &Decomposition,
    metrics: &mut Metrics,
) -> Option<NodeIndex> {
    let mut w = None;
    let mut min_deg = usize::MAX;
    for (_, e) in g.in_edges(v) {
        metrics.decomp_edges_processed += 1;
        let s = e.source();
        let Some(chain) = decomp.chain_of(s) else {
            continue;
        };
        let deg = g.out_degree(s);
        if !visited.contains(s.index()) && decomp.last_vertex(chain) == s && deg <= min_deg {
            min_deg = deg;
            w = Some(s);
        }
    }
    w
}

/// Find a successor of `v` whose only incoming edge is from `v`. O(deg⁺(v)).
fn find_single_source_succ(
    v: NodeIndex,
    g: &Graph,
    visited: &FixedBitSet,
    metrics: &mut Metrics,
) -> Option<NodeIndex> {
    for (_, e) in g.out_edges(v) {
        metrics.decomp_edges_processed += 1;
        let t = e.target();
        if !visited.contains(t.index()) && g.in_degree(t) == 1 {
            return Some(t);
        }
    }
    None
}

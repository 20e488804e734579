//! The graph container used by every pipeline stage.
//!
//! `Graph` stores all edge records in a single append-only arena and links
//! them into per-node adjacency lists through `u32` indices. Every arc is
//! represented by *two* records: one member of the source's outgoing list and
//! one member of the target's incoming list, tied together through a
//! symmetric `partner` index. Each record is doubly linked within its one
//! list, so removing an arc is O(1) regardless of list position.

use std::fmt;

use indexmap::IndexSet;

/// Node identifier: a dense index in `[0, n)`.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    #[inline]
    pub fn new(x: usize) -> Self {
        NodeIndex(x as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// An invalid index used as a sentinel, for example in `v_to_comp`
    /// slots that have not been assigned yet.
    #[inline]
    pub fn end() -> Self {
        NodeIndex(u32::MAX)
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({:?})", self.0)
    }
}

/// Edge identifier: a slot in the graph's edge arena.
///
/// Arena slots are never reused; an unlinked record simply stops being
/// reachable from any adjacency list.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct EdgeIndex(u32);

impl EdgeIndex {
    #[inline]
    pub fn new(x: usize) -> Self {
        EdgeIndex(x as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// An invalid `EdgeIndex` used to denote absence of an edge, for example
    /// to end an adjacency list.
    #[inline]
    pub fn end() -> Self {
        EdgeIndex(u32::MAX)
    }
}

impl fmt::Debug for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeIndex({:?})", self.0)
    }
}

/// Edge direction.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub enum Direction {
    /// An `Outgoing` edge is an outward edge *from* the current node.
    Outgoing = 0,
    /// An `Incoming` edge is an inbound edge *to* the current node.
    Incoming = 1,
}

pub use Direction::{Incoming, Outgoing};

impl Direction {
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Outgoing => Incoming,
            Incoming => Outgoing,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        (self as usize) & 0x1
    }
}

/// The graph's node type: adjacency-list heads and degree counters.
#[derive(Copy, Clone, Debug)]
pub struct Node {
    /// First edge in the outgoing and incoming edge lists.
    head: [EdgeIndex; 2],
    /// Outgoing and incoming degree.
    degree: [u32; 2],
}

impl Node {
    fn new() -> Self {
        Node {
            head: [EdgeIndex::end(); 2],
            degree: [0; 2],
        }
    }

    /// Accessor for data structure internals: the first edge in the given
    /// direction.
    #[inline]
    pub fn first_edge(&self, dir: Direction) -> EdgeIndex {
        self.head[dir.index()]
    }
}

/// One member of an edge-record pair.
///
/// The record in the source's outgoing list and the record in the target's
/// incoming list carry the same endpoints and point at each other through
/// `partner`.
#[derive(Copy, Clone, Debug)]
pub struct Edge {
    /// Start and end node index.
    node: [NodeIndex; 2],
    /// The twin record in the opposite endpoint's adjacency list.
    partner: EdgeIndex,
    pub(crate) prev: EdgeIndex,
    pub(crate) next: EdgeIndex,
}

impl Edge {
    /// Return the source node index.
    #[inline]
    pub fn source(&self) -> NodeIndex {
        self.node[0]
    }

    /// Return the target node index.
    #[inline]
    pub fn target(&self) -> NodeIndex {
        self.node[1]
    }

    /// Return the twin record representing the same arc in the opposite
    /// endpoint's adjacency list.
    #[inline]
    pub fn partner(&self) -> EdgeIndex {
        self.partner
    }
}

/// Bijection between arbitrary external integer vertex ids and the dense
/// internal indices used everywhere else.
///
/// Backed by an [`IndexSet`], whose insertion order *is* the first-seen
/// order, so the set position of an id is its internal index.
#[derive(Clone, Debug, Default)]
pub struct IdMapping {
    ids: IndexSet<i64>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an external id to its internal index, assigning the next free
    /// index on first sight.
    pub fn intern(&mut self, id: i64) -> NodeIndex {
        let (ix, _) = self.ids.insert_full(id);
        NodeIndex::new(ix)
    }

    /// Look up the internal index of an already-interned id.
    pub fn get(&self, id: i64) -> Option<NodeIndex> {
        self.ids.get_index_of(&id).map(NodeIndex::new)
    }

    /// The external id behind an internal index.
    pub fn external(&self, v: NodeIndex) -> Option<i64> {
        self.ids.get_index(v.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A directed graph over a fixed vertex set `[0, n)`.
///
/// The vertex count is fixed at creation; edges can be added and removed.
/// Removal never shifts indices: edge records live in an append-only arena
/// and are merely unlinked from their adjacency lists.
#[derive(Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Number of live arcs (arena slots of removed arcs are not reused).
    m: usize,
    /// Original-vertex index → component index; present only on a graph
    /// produced by condensation.
    pub(crate) v_to_comp: Option<Vec<NodeIndex>>,
    /// External-id mapping established by the loader; empty for graphs
    /// built programmatically.
    pub(crate) ids: IdMapping,
}

impl Graph {
    /// Create a graph with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        Self::with_capacity(n, 0)
    }

    /// Create a graph with `n` vertices and room for `m` arcs.
    pub fn with_capacity(n: usize, m: usize) -> Self {
        Graph {
            nodes: vec![Node::new(); n],
            edges: Vec::with_capacity(2 * m),
            m: 0,
            v_to_comp: None,
            ids: IdMapping::new(),
        }
    }

    /// Create a graph with `n` vertices from an iterator of `(source,
    /// target)` pairs of internal indices.
    pub fn from_edges<I>(n: usize, iterable: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut g = Self::new(n);
        for (s, t) in iterable {
            g.add_edge(NodeIndex::new(s), NodeIndex::new(t));
        }
        g
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live arcs.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.m
    }

    #[inline]
    pub fn out_degree(&self, v: NodeIndex) -> usize {
        self.degree(v, Outgoing)
    }

    #[inline]
    pub fn in_degree(&self, v: NodeIndex) -> usize {
        self.degree(v, Incoming)
    }

    #[inline]
    pub fn degree(&self, v: NodeIndex, dir: Direction) -> usize {
        self.nodes[v.index()].degree[dir.index()] as usize
    }

    /// The component mapping attached by condensation, if any.
    pub fn v_to_comp(&self) -> Option<&[NodeIndex]> {
        self.v_to_comp.as_deref()
    }

    /// The external-id mapping established during loading.
    pub fn id_mapping(&self) -> &IdMapping {
        &self.ids
    }

    /// Access an edge record.
    #[inline]
    pub fn edge(&self, e: EdgeIndex) -> &Edge {
        &self.edges[e.index()]
    }

    /// Accessor for data structure internals: the first edge of `v`'s list
    /// in the given direction.
    #[inline]
    pub fn first_edge(&self, v: NodeIndex, dir: Direction) -> EdgeIndex {
        self.nodes[v.index()].first_edge(dir)
    }

    /// Accessor for data structure internals: the successor of `e` within
    /// the one list `e` is a member of.
    #[inline]
    pub fn next_edge(&self, e: EdgeIndex) -> EdgeIndex {
        self.edges[e.index()].next
    }

    /// Add an arc `source → target`.
    ///
    /// Pushes the record pair into the arena, prepends each member to its
    /// adjacency list and bumps the arc and degree counters. Returns the
    /// index of the outgoing-list member; its partner is the incoming-list
    /// member.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex) -> EdgeIndex {
        let e = EdgeIndex::new(self.edges.len());
        let p = EdgeIndex::new(self.edges.len() + 1);
        self.edges.push(Edge {
            node: [source, target],
            partner: p,
            prev: EdgeIndex::end(),
            next: EdgeIndex::end(),
        });
        self.edges.push(Edge {
            node: [source, target],
            partner: e,
            prev: EdgeIndex::end(),
            next: EdgeIndex::end(),
        });
        self.push_edge(e, source, Outgoing);
        self.push_edge(p, target, Incoming);
        self.m += 1;
        self.nodes[source.index()].degree[Outgoing.index()] += 1;
        self.nodes[target.index()].degree[Incoming.index()] += 1;
        e
    }

    /// Prepend `e` to `v`'s list in direction `dir`.
    fn push_edge(&mut self, e: EdgeIndex, v: NodeIndex, dir: Direction) {
        let head = self.nodes[v.index()].head[dir.index()];
        self.edges[e.index()].next = head;
        if head != EdgeIndex::end() {
            self.edges[head.index()].prev = e;
        }
        self.nodes[v.index()].head[dir.index()] = e;
    }

    /// Remove the arc that `e` is a member of.
    ///
    /// `dir` names the list `e` itself lives in; either member of the pair
    /// may be passed. Both members are unlinked from their lists, all four
    /// link fields are reset, and the arc and degree counters are
    /// decremented. The partner linkage stays intact.
    pub fn remove_edge(&mut self, e: EdgeIndex, dir: Direction) {
        let e = match dir {
            Outgoing => e,
            Incoming => self.edges[e.index()].partner,
        };
        let Edge {
            node: [source, target],
            partner,
            ..
        } = self.edges[e.index()];
        self.unlink(e, source, Outgoing);
        self.unlink(partner, target, Incoming);
        self.m -= 1;
        self.nodes[source.index()].degree[Outgoing.index()] -= 1;
        self.nodes[target.index()].degree[Incoming.index()] -= 1;
    }

    /// Unlink `e` from `v`'s list in direction `dir` and reset its links.
    fn unlink(&mut self, e: EdgeIndex, v: NodeIndex, dir: Direction) {
        let Edge { prev, next, .. } = self.edges[e.index()];
        if prev == EdgeIndex::end() {
            self.nodes[v.index()].head[dir.index()] = next;
        } else {
            self.edges[prev.index()].next = next;
        }
        if next != EdgeIndex::end() {
            self.edges[next.index()].prev = prev;
        }
        let edge = &mut self.edges[e.index()];
        edge.prev = EdgeIndex::end();
        edge.next = EdgeIndex::end();
    }

    /// Iterator over `v`'s adjacency list in the given direction, in list
    /// order.
    pub fn edges_directed(&self, v: NodeIndex, dir: Direction) -> Edges<'_> {
        Edges {
            edges: &self.edges,
            next: self.first_edge(v, dir),
        }
    }

    /// Iterator over `v`'s outgoing edges.
    pub fn out_edges(&self, v: NodeIndex) -> Edges<'_> {
        self.edges_directed(v, Outgoing)
    }

    /// Iterator over `v`'s incoming edges.
    ///
    /// Yields the incoming-list members of the record pairs; their
    /// `source`/`target` fields equal the outgoing members'.
    pub fn in_edges(&self, v: NodeIndex) -> Edges<'_> {
        self.edges_directed(v, Incoming)
    }

    /// Rebuild every outgoing adjacency list so that it is sorted by the
    /// target's position in `topo`, ascending.
    ///
    /// Scans vertices in reverse topological order and prepends each
    /// incoming edge's partner onto a fresh per-source list; incoming lists
    /// and all counters are left untouched. The indexing-scheme build
    /// requires this order.
    pub fn toposort_out_edges(&mut self, topo: &[NodeIndex]) {
        let mut heads = vec![EdgeIndex::end(); self.node_count()];
        for &v in topo.iter().rev() {
            let mut e = self.first_edge(v, Incoming);
            while e != EdgeIndex::end() {
                let Edge { partner, next, .. } = self.edges[e.index()];
                let u = self.edges[e.index()].source();
                let head = heads[u.index()];
                self.edges[partner.index()].prev = EdgeIndex::end();
                self.edges[partner.index()].next = head;
                if head != EdgeIndex::end() {
                    self.edges[head.index()].prev = partner;
                }
                heads[u.index()] = partner;
                e = next;
            }
        }
        for (v, head) in heads.into_iter().enumerate() {
            self.nodes[v].head[Outgoing.index()] = head;
        }
    }
}

/// Iterator over the edges of one adjacency list.
pub struct Edges<'a> {
    edges: &'a [Edge],
    next: EdgeIndex,
}

impl<'a> Iterator for Edges<'a> {
    type Item = (EdgeIndex, &'a Edge);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == EdgeIndex::end() {
            return None;
        }
        let e = self.next;
        let edge = &self.edges[e.index()];
        self.next = edge.next;
        Some((e, edge))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph ({}, {})", self.node_count(), self.edge_count())?;
        for v in 0..self.node_count() {
            write!(f, "{} ->", v)?;
            for (_, e) in self.out_edges(NodeIndex::new(v)) {
                write!(f, " {}", e.target().index())?;
            }
            writeln!(f)?;
        }
        if let Some(map) = &self.v_to_comp {
            writeln!(
                f,
                "v -> comp: {:?}",
                map.iter().map(|c| c.index()).collect::<Vec<_>>()
            )?;
        }
        Ok(())
    }
}

//! Strongly connected components and condensation.
//!
//! The SCC pass is Tarjan's algorithm made iterative with three explicit
//! stacks: the simulated call stack, the component stack, and a bookkeeping
//! stack whose top equals the current vertex exactly when all of its
//! children have been explored (the backtrack condition).

use fixedbitset::FixedBitSet;

use crate::graph::{Graph, NodeIndex};
use crate::metrics::Metrics;

/// Result of an SCC run: both directions of the vertex ↔ component relation.
#[derive(Clone, Debug)]
pub struct Sccs {
    /// Original-vertex index → component index.
    pub v_to_comp: Vec<NodeIndex>,
    /// Component index → member vertices.
    pub components: Vec<Vec<NodeIndex>>,
}

/// A reusable state for computing the *strongly connected components* using
/// an iterative rendition of Tarjan's algorithm.
///
/// Component indices are assigned in discovery-completion order, which by
/// Tarjan's property is a reverse topological order of the condensation DAG.
pub struct TarjanScc {
    time: Vec<u32>,
    low_link: Vec<u32>,
    /// Predecessor that pushed a vertex onto the call stack; consulted on
    /// backtrack to propagate low links.
    pre: Vec<NodeIndex>,
    on_stack: FixedBitSet,
    rec_stack: Vec<NodeIndex>,
    stack: Vec<NodeIndex>,
    head: Vec<NodeIndex>,
    t: u32,
}

impl TarjanScc {
    pub fn new(n: usize) -> Self {
        TarjanScc {
            time: vec![u32::MAX; n],
            low_link: vec![u32::MAX; n],
            pre: vec![NodeIndex::end(); n],
            on_stack: FixedBitSet::with_capacity(n),
            rec_stack: Vec::with_capacity(n),
            stack: Vec::with_capacity(n),
            head: Vec::with_capacity(n),
            t: 0,
        }
    }

    /// Compute the SCCs of `g`. Starts a depth-first search from every
    /// undiscovered vertex.
    pub fn run(&mut self, g: &Graph, metrics: &mut Metrics) -> Sccs {
        let n = g.node_count();
        let mut v_to_comp = vec![NodeIndex::end(); n];
        let mut components = Vec::new();

        for v in (0..n).map(NodeIndex::new) {
            metrics.collapse_nodes_processed += 1;
            if self.time[v.index()] == u32::MAX {
                self.visit(v, g, &mut v_to_comp, &mut components, metrics);
                self.rec_stack.clear();
                self.stack.clear();
                self.head.clear();
            }
        }
        Sccs {
            v_to_comp,
            components,
        }
    }

    fn visit(
        &mut self,
        s: NodeIndex,
        g: &Graph,
        v_to_comp: &mut [NodeIndex],
        components: &mut Vec<Vec<NodeIndex>>,
        metrics: &mut Metrics,
    ) {
        self.rec_stack.push(s);
        metrics.collapse_nodes_processed += 1;

        while let Some(&v) = self.rec_stack.last() {
            if self.time[v.index()] == u32::MAX {
                // First discovery of this vertex.
                self.time[v.index()] = self.t;
                self.low_link[v.index()] = self.t;
                self.on_stack.insert(v.index());
                self.stack.push(v);
                self.head.push(v);
                metrics.collapse_nodes_processed += 1;
                self.t += 1;

                for (_, e) in g.out_edges(v) {
                    metrics.collapse_edges_processed += 1;
                    let w = e.target();
                    if self.time[w.index()] == u32::MAX {
                        self.rec_stack.push(w);
                        self.pre[w.index()] = v;
                    } else if self.on_stack.contains(w.index()) {
                        self.low_link[v.index()] =
                            self.low_link[v.index()].min(self.time[w.index()]);
                    }
                }
            } else if self.head.last() == Some(&v) {
                // Backtracking: fold the children's low links into v's.
                for (_, e) in g.out_edges(v) {
                    metrics.collapse_edges_processed += 1;
                    let w = e.target();
                    if self.pre[w.index()] == v {
                        self.low_link[v.index()] =
                            self.low_link[v.index()].min(self.low_link[w.index()]);
                    }
                }
                if self.low_link[v.index()] == self.time[v.index()] {
                    // v is a component root: pop the component stack up to
                    // and including v.
                    let comp_ix = NodeIndex::new(components.len());
                    let mut comp = Vec::new();
                    loop {
                        let w = self
                            .stack
                            .pop()
                            .expect("component stack holds the component root");
                        metrics.collapse_nodes_processed += 1;
                        self.on_stack.set(w.index(), false);
                        v_to_comp[w.index()] = comp_ix;
                        comp.push(w);
                        if self.stack.is_empty() || v == w {
                            break;
                        }
                    }
                    components.push(comp);
                }
                self.head.pop();
                self.rec_stack.pop();
                metrics.collapse_nodes_processed += 1;
            } else {
                // Duplicate entry of an already-finished vertex.
                self.rec_stack.pop();
                metrics.collapse_nodes_processed += 1;
            }
        }
    }
}

/// Compute the *strongly connected components* of `g`.
pub fn tarjan_scc(g: &Graph, metrics: &mut Metrics) -> Sccs {
    TarjanScc::new(g.node_count()).run(g, metrics)
}

/// Collapse `g` to its condensation: one vertex per SCC, one edge per
/// distinct cross-component arc.
///
/// Parallel arcs between two components are coalesced through a per-target
/// collision bit plus a `changed` index list, so resetting between source
/// components costs only the arcs actually processed. The returned DAG
/// carries the vertex → component mapping and inherits `g`'s external-id
/// mapping.
pub fn condense(g: &Graph, metrics: &mut Metrics) -> Graph {
    let Sccs {
        v_to_comp,
        components,
    } = tarjan_scc(g, metrics);
    let k = components.len();
    let mut dag = Graph::with_capacity(k, g.edge_count());
    let mut collision = FixedBitSet::with_capacity(k);
    let mut changed: Vec<usize> = Vec::new();

    for (comp_ix, members) in components.iter().enumerate() {
        for &v in members {
            metrics.collapse_nodes_processed += 1;
            for (_, e) in g.out_edges(v) {
                metrics.collapse_edges_processed += 1;
                let t_comp = v_to_comp[e.target().index()];
                if t_comp.index() != comp_ix && !collision.contains(t_comp.index()) {
                    collision.insert(t_comp.index());
                    changed.push(t_comp.index());
                    dag.add_edge(NodeIndex::new(comp_ix), t_comp);
                }
            }
        }
        for c in changed.drain(..) {
            collision.set(c, false);
        }
    }
    dag.v_to_comp = Some(v_to_comp);
    dag.ids = g.ids.clone();
    dag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(sccs: &Sccs, comp: usize) -> Vec<usize> {
        let mut m: Vec<_> = sccs.components[comp].iter().map(|v| v.index()).collect();
        m.sort_unstable();
        m
    }

    #[test]
    fn two_cycles_with_bridge() {
        let g = Graph::from_edges(4, [(0, 1), (1, 0), (2, 3), (3, 2), (1, 2)]);
        let mut metrics = Metrics::default();
        let dag = condense(&g, &mut metrics);

        assert_eq!(dag.node_count(), 2);
        assert_eq!(dag.edge_count(), 1);

        // The sink component {2, 3} completes first, so it gets index 0.
        let map = dag.v_to_comp().unwrap();
        assert_eq!(map[2], map[3]);
        assert_eq!(map[0], map[1]);
        assert_eq!(map[2], NodeIndex::new(0));
        assert_eq!(map[0], NodeIndex::new(1));

        let (_, e) = dag.out_edges(NodeIndex::new(1)).next().unwrap();
        assert_eq!(e.target(), NodeIndex::new(0));
    }

    /// Uses the graph from: <https://en.wikipedia.org/wiki/Strongly_connected_component>
    #[test]
    fn wikipedia_sccs() {
        // a=0 b=1 c=2 d=3 e=4 f=5 g=6 h=7
        let g = Graph::from_edges(
            8,
            [
                (0, 1),
                (1, 2),
                (1, 4),
                (1, 5),
                (2, 3),
                (2, 6),
                (3, 2),
                (3, 7),
                (4, 0),
                (4, 5),
                (5, 6),
                (6, 5),
                (7, 3),
                (7, 6),
            ],
        );
        let mut metrics = Metrics::default();
        let sccs = tarjan_scc(&g, &mut metrics);

        assert_eq!(sccs.components.len(), 3);
        assert_eq!(members(&sccs, 0), vec![5, 6]);
        assert_eq!(members(&sccs, 1), vec![2, 3, 7]);
        assert_eq!(members(&sccs, 2), vec![0, 1, 4]);

        let dag = condense(&g, &mut metrics);
        assert_eq!(dag.node_count(), 3);
        assert_eq!(dag.edge_count(), 3);
    }

    #[test]
    fn self_loops_and_parallel_arcs_collapse() {
        let g = Graph::from_edges(2, [(0, 0), (0, 1), (0, 1)]);
        let mut metrics = Metrics::default();
        let dag = condense(&g, &mut metrics);
        assert_eq!(dag.node_count(), 2);
        assert_eq!(dag.edge_count(), 1);
    }

    #[test]
    fn empty_graph() {
        let g = Graph::new(0);
        let mut metrics = Metrics::default();
        let dag = condense(&g, &mut metrics);
        assert_eq!(dag.node_count(), 0);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn component_order_is_reverse_topological() {
        // 0 -> 1 -> 2, all singleton components
        let g = Graph::from_edges(3, [(0, 1), (1, 2)]);
        let mut metrics = Metrics::default();
        let dag = condense(&g, &mut metrics);
        let map = dag.v_to_comp().unwrap();
        // Every edge of the condensation goes from a higher component index
        // to a lower one.
        assert!(map[0] > map[1]);
        assert!(map[1] > map[2]);
    }
}

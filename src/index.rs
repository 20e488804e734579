//! The preprocessing pipeline and the constant-time query it produces.

use std::time::{Duration, Instant};

use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::algo::decompose::Decomposition;
use crate::algo::scheme::IndexingScheme;
use crate::algo::{condense, remove_transitive_edges, toposort};
use crate::graph::{Graph, NodeIndex};
use crate::metrics::Metrics;

/// Selects the chain-decomposition heuristic the pipeline runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Heuristic {
    NodeOrder,
    ChainOrder,
    /// Node-Order followed by the concatenation post-pass.
    NodeOrderConcat,
    /// Chain-Order followed by the concatenation post-pass.
    ChainOrderConcat,
    /// The combined heuristic with inline reversed-DFS search.
    #[default]
    H3Concat,
}

/// Wall-clock durations of the pipeline stages.
///
/// `preprocess` covers collapse, topo sort, edge removal and adjacency
/// sorting; `comp` covers everything after reading; `reading` and `total`
/// are filled in by the caller that did the reading.
#[derive(Copy, Clone, Debug, Default)]
pub struct StageTimings {
    pub reading: Duration,
    pub collapse: Duration,
    pub topo: Duration,
    pub decomp: Duration,
    pub remove_edges: Duration,
    pub topo_edges: Duration,
    pub scheme: Duration,
    pub preprocess: Duration,
    pub comp: Duration,
    pub total: Duration,
}

/// A built reachability index: the condensed, reduced DAG together with its
/// topological order, chain decomposition and indexing scheme.
///
/// Queries translate original vertices through the condensation mapping, so
/// they are answered with respect to the graph the index was built from.
pub struct ReachabilityIndex {
    graph: Graph,
    topo: Vec<NodeIndex>,
    decomposition: Decomposition,
    scheme: IndexingScheme,
}

impl ReachabilityIndex {
    /// Run the five pipeline stages over `g`.
    pub fn build(g: &Graph, heuristic: Heuristic, metrics: &mut Metrics) -> Self {
        debug!("collapsing the graph to a DAG");
        let mut dag = condense(g, metrics);
        debug!(components = dag.node_count(), "collapsed graph to DAG");

        debug!("topologically sorting the DAG");
        let topo = toposort(&dag);

        debug!(?heuristic, "decomposing the DAG into chains");
        let decomposition = decompose(&dag, &topo, heuristic, metrics);
        debug!(chains = decomposition.chain_count(), "decomposed DAG");

        debug!("removing transitive edges");
        let edges_before = dag.edge_count();
        remove_transitive_edges(&mut dag, &decomposition, metrics);
        debug!(
            before = edges_before,
            after = dag.edge_count(),
            "reduced edge count"
        );

        debug!("sorting adjacency lists in topological order");
        dag.toposort_out_edges(&topo);

        debug!("creating the indexing scheme");
        let scheme = IndexingScheme::build(&dag, &topo, &decomposition, metrics);
        debug!("indexing scheme complete\n{:?}", scheme);

        ReachabilityIndex {
            graph: dag,
            topo,
            decomposition,
            scheme,
        }
    }

    /// Like [`build`](Self::build), additionally timing every stage.
    pub fn build_timed(
        g: &Graph,
        heuristic: Heuristic,
        metrics: &mut Metrics,
    ) -> (Self, StageTimings) {
        let mut timings = StageTimings::default();
        let comp_start = Instant::now();

        let preprocess_start = Instant::now();
        let mut dag = condense(g, metrics);
        timings.collapse = preprocess_start.elapsed();

        let topo_start = Instant::now();
        let topo = toposort(&dag);
        timings.topo = topo_start.elapsed();
        timings.preprocess = preprocess_start.elapsed();

        let decomp_start = Instant::now();
        let decomposition = decompose(&dag, &topo, heuristic, metrics);
        timings.decomp = decomp_start.elapsed();

        let preprocess_start = Instant::now();
        remove_transitive_edges(&mut dag, &decomposition, metrics);
        timings.remove_edges = preprocess_start.elapsed();

        let topo_edges_start = Instant::now();
        dag.toposort_out_edges(&topo);
        timings.topo_edges = topo_edges_start.elapsed();
        timings.preprocess += preprocess_start.elapsed();

        let scheme_start = Instant::now();
        let scheme = IndexingScheme::build(&dag, &topo, &decomposition, metrics);
        timings.scheme = scheme_start.elapsed();

        timings.comp = comp_start.elapsed();

        (
            ReachabilityIndex {
                graph: dag,
                topo,
                decomposition,
                scheme,
            },
            timings,
        )
    }

    /// Answer "can `s` reach `t`?" in O(1).
    ///
    /// `s` and `t` are vertices of the original graph; both are translated
    /// through the condensation mapping first.
    pub fn is_reachable(&self, s: NodeIndex, t: NodeIndex) -> bool {
        let s = self.to_component(s);
        let t = self.to_component(t);
        if s == t {
            return true;
        }
        let (chain, _) = self
            .decomposition
            .assignment(t)
            .expect("every DAG vertex is assigned to a chain");
        let j = self.decomposition.chain_id(chain);
        self.scheme.get(s, j) <= self.scheme.get(t, j)
    }

    fn to_component(&self, v: NodeIndex) -> NodeIndex {
        match self.graph.v_to_comp() {
            Some(map) => map[v.index()],
            None => v,
        }
    }

    /// Vertex count of the graph the index was built from.
    pub fn original_node_count(&self) -> usize {
        match self.graph.v_to_comp() {
            Some(map) => map.len(),
            None => self.graph.node_count(),
        }
    }

    /// Number of strongly connected components.
    pub fn component_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn chain_count(&self) -> usize {
        self.decomposition.chain_count()
    }

    /// The condensed, reduced DAG.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn topo_order(&self) -> &[NodeIndex] {
        &self.topo
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    pub fn scheme(&self) -> &IndexingScheme {
        &self.scheme
    }

    /// The full pairwise reachability relation over the original vertices,
    /// one row per source. O(|V|²).
    pub fn reachability_matrix(&self) -> Vec<FixedBitSet> {
        let n = self.original_node_count();
        let mut matrix = Vec::with_capacity(n);
        for s in (0..n).map(NodeIndex::new) {
            let mut row = FixedBitSet::with_capacity(n);
            for t in (0..n).map(NodeIndex::new) {
                if self.is_reachable(s, t) {
                    row.insert(t.index());
                }
            }
            matrix.push(row);
        }
        matrix
    }
}

fn decompose(
    dag: &Graph,
    topo: &[NodeIndex],
    heuristic: Heuristic,
    metrics: &mut Metrics,
) -> Decomposition {
    match heuristic {
        Heuristic::NodeOrder => Decomposition::node_order(dag, topo, metrics),
        Heuristic::ChainOrder => Decomposition::chain_order(dag, topo, metrics),
        Heuristic::NodeOrderConcat => {
            let mut decomp = Decomposition::node_order(dag, topo, metrics);
            decomp.concat(dag, metrics);
            decomp
        }
        Heuristic::ChainOrderConcat => {
            let mut decomp = Decomposition::chain_order(dag, topo, metrics);
            decomp.concat(dag, metrics);
            decomp
        }
        Heuristic::H3Concat => Decomposition::h3_concat(dag, topo, metrics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEURISTICS: [Heuristic; 5] = [
        Heuristic::NodeOrder,
        Heuristic::ChainOrder,
        Heuristic::NodeOrderConcat,
        Heuristic::ChainOrderConcat,
        Heuristic::H3Concat,
    ];

    #[test]
    fn chain_of_ten() {
        let g = Graph::from_edges(10, (0..9).map(|i| (i, i + 1)));
        let mut metrics = Metrics::default();
        let index = ReachabilityIndex::build(&g, Heuristic::default(), &mut metrics);

        assert_eq!(index.component_count(), 10);
        assert_eq!(index.chain_count(), 1);
        for i in 0..10 {
            for j in 0..10 {
                assert_eq!(
                    index.is_reachable(NodeIndex::new(i), NodeIndex::new(j)),
                    i <= j,
                );
            }
        }
    }

    #[test]
    fn cycles_collapse_into_mutual_reachability() {
        let g = Graph::from_edges(4, [(0, 1), (1, 0), (2, 3), (3, 2), (1, 2)]);
        for heuristic in HEURISTICS {
            let mut metrics = Metrics::default();
            let index = ReachabilityIndex::build(&g, heuristic, &mut metrics);
            assert_eq!(index.component_count(), 2);
            assert_eq!(index.chain_count(), 1);
            assert!(index.is_reachable(NodeIndex::new(0), NodeIndex::new(3)));
            assert!(index.is_reachable(NodeIndex::new(1), NodeIndex::new(0)));
            assert!(!index.is_reachable(NodeIndex::new(2), NodeIndex::new(0)));
        }
    }

    #[test]
    fn empty_graph() {
        let g = Graph::new(0);
        let mut metrics = Metrics::default();
        let index = ReachabilityIndex::build(&g, Heuristic::default(), &mut metrics);
        assert_eq!(index.original_node_count(), 0);
        assert_eq!(index.chain_count(), 0);
        assert!(index.reachability_matrix().is_empty());
    }

    #[test]
    fn single_vertex() {
        let g = Graph::new(1);
        let mut metrics = Metrics::default();
        let index = ReachabilityIndex::build(&g, Heuristic::default(), &mut metrics);
        assert_eq!(index.chain_count(), 1);
        assert_eq!(index.scheme().node_count(), 1);
        assert!(index.is_reachable(NodeIndex::new(0), NodeIndex::new(0)));
    }

    #[test]
    fn build_timed_matches_plain_build() {
        let g = Graph::from_edges(5, [(0, 1), (1, 2), (3, 2), (2, 4)]);
        let mut m1 = Metrics::default();
        let mut m2 = Metrics::default();
        let plain = ReachabilityIndex::build(&g, Heuristic::H3Concat, &mut m1);
        let (timed, timings) = ReachabilityIndex::build_timed(&g, Heuristic::H3Concat, &mut m2);

        assert_eq!(plain.chain_count(), timed.chain_count());
        for s in (0..5).map(NodeIndex::new) {
            for t in (0..5).map(NodeIndex::new) {
                assert_eq!(plain.is_reachable(s, t), timed.is_reachable(s, t));
            }
        }
        assert!(timings.comp >= timings.scheme);
    }
}

//! The per-vertex, per-chain reachability index.

use std::fmt;

use crate::algo::decompose::Decomposition;
use crate::graph::{Graph, NodeIndex};
use crate::metrics::Metrics;

/// Marker for "this chain is not reachable from here".
pub const UNREACHABLE: u32 = u32::MAX;

/// An `n × k` table where entry `(v, j)` is the smallest position on chain
/// `j` that `v` can reach, [`UNREACHABLE`] if none.
///
/// Every vertex counts as reaching its own chain position, so with
/// `j = chain(t)` the query `reachable(s, t)` is simply
/// `get(s, j) <= get(t, j)`, where `get(t, j)` *is* `t`'s position.
/// Immutable after construction.
pub struct IndexingScheme {
    chain_count: usize,
    cells: Vec<u32>,
}

impl IndexingScheme {
    /// Build the scheme for a reduced DAG whose outgoing adjacency lists
    /// have been sorted in topological order of their targets
    /// (see [`Graph::toposort_out_edges`]).
    ///
    /// Walks vertices in reverse topological order, folding each
    /// successor's row into the current vertex's row. The fold via an edge
    /// to `u` is skipped entirely when the current estimate for `u`'s chain
    /// already beats `u`'s own: by monotonicity along the sorted out-list
    /// no cell could improve. This bounds the build by
    /// O(|E_tr| + k_c·|E_red|). Own-chain positions are written after the
    /// propagation pass; they must not participate in the skip comparison.
    pub fn build(
        g: &Graph,
        topo: &[NodeIndex],
        decomp: &Decomposition,
        metrics: &mut Metrics,
    ) -> Self {
        let n = g.node_count();
        let k = decomp.chain_count();
        metrics.scheme_nodes_processed += n as u64;
        let mut cells = vec![UNREACHABLE; n * k];

        for &v in topo.iter().rev() {
            metrics.scheme_nodes_processed += 1;
            let vr = v.index() * k;
            for (_, e) in g.out_edges(v) {
                metrics.scheme_edges_processed += 1;
                let u = e.target();
                let ur = u.index() * k;
                let (chain, pos) = decomp
                    .assignment(u)
                    .expect("every DAG vertex is assigned to a chain");
                let j = decomp.chain_id(chain);

                if cells[vr + j] >= cells[ur + j] {
                    for i in 0..k {
                        cells[vr + i] = cells[vr + i].min(cells[ur + i]);
                    }
                    if cells[vr + j] > pos {
                        cells[vr + j] = pos;
                    }
                }
            }
        }

        for v in (0..n).map(NodeIndex::new) {
            let (chain, pos) = decomp
                .assignment(v)
                .expect("every DAG vertex is assigned to a chain");
            cells[v.index() * k + decomp.chain_id(chain)] = pos;
        }

        IndexingScheme {
            chain_count: k,
            cells,
        }
    }

    /// Number of chains (the row width).
    #[inline]
    pub fn chain_count(&self) -> usize {
        self.chain_count
    }

    /// Number of vertices (the row count).
    pub fn node_count(&self) -> usize {
        if self.chain_count == 0 {
            0
        } else {
            self.cells.len() / self.chain_count
        }
    }

    /// The smallest position reachable from `v` on chain `j`.
    #[inline]
    pub fn get(&self, v: NodeIndex, j: usize) -> u32 {
        self.cells[v.index() * self.chain_count + j]
    }
}

impl fmt::Debug for IndexingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in 0..self.node_count() {
            write!(f, "{v}: [")?;
            for j in 0..self.chain_count {
                if j > 0 {
                    write!(f, ", ")?;
                }
                let cell = self.get(NodeIndex::new(v), j);
                if cell == UNREACHABLE {
                    write!(f, "inf")?;
                } else {
                    write!(f, "{cell}")?;
                }
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::decompose::Decomposition;
    use crate::algo::reduce::remove_transitive_edges;
    use crate::algo::toposort::toposort;

    fn build_for(mut g: Graph) -> (Graph, Vec<NodeIndex>, Decomposition, IndexingScheme) {
        let mut metrics = Metrics::default();
        let topo = toposort(&g);
        let decomp = Decomposition::node_order(&g, &topo, &mut metrics);
        remove_transitive_edges(&mut g, &decomp, &mut metrics);
        g.toposort_out_edges(&topo);
        let scheme = IndexingScheme::build(&g, &topo, &decomp, &mut metrics);
        (g, topo, decomp, scheme)
    }

    #[test]
    fn tiny_dag_rows_are_chain_positions() {
        let g = Graph::from_edges(3, [(0, 1), (1, 2), (0, 2)]);
        let (_, _, decomp, scheme) = build_for(g);
        assert_eq!(decomp.chain_count(), 1);
        assert_eq!(scheme.chain_count(), 1);
        for v in 0..3 {
            assert_eq!(scheme.get(NodeIndex::new(v), 0), v as u32);
        }
    }

    #[test]
    fn antichain_rows_hit_only_their_own_chain() {
        let g = Graph::new(5);
        let (_, _, decomp, scheme) = build_for(g);
        assert_eq!(scheme.chain_count(), 5);
        for v in (0..5).map(NodeIndex::new) {
            let own = decomp.chain_id(decomp.chain_of(v).unwrap());
            for j in 0..5 {
                let expected = if j == own { 0 } else { UNREACHABLE };
                assert_eq!(scheme.get(v, j), expected);
            }
        }
    }

    #[test]
    fn cross_chain_positions_propagate() {
        // chains [0, 1, 3] and [2]: 0 and 1 see the head of 2's chain
        // through the surviving edge 1 -> 2, while 2 and 3 are mutually
        // unreachable.
        let g = Graph::from_edges(4, [(0, 1), (1, 2), (1, 3), (0, 2)]);
        let (_, _, decomp, scheme) = build_for(g);
        assert_eq!(decomp.chain_count(), 2);

        let c2 = decomp.chain_of(NodeIndex::new(2)).unwrap();
        let j2 = decomp.chain_id(c2);
        let j0 = 1 - j2;

        // Own-chain cells are the vertices' positions.
        assert_eq!(scheme.get(NodeIndex::new(0), j0), 0);
        assert_eq!(scheme.get(NodeIndex::new(1), j0), 1);
        assert_eq!(scheme.get(NodeIndex::new(3), j0), 2);
        // 0 and 1 reach the head of 2's chain.
        assert_eq!(scheme.get(NodeIndex::new(0), j2), 0);
        assert_eq!(scheme.get(NodeIndex::new(1), j2), 0);
        // 2 and 3 reach nothing on each other's chain.
        assert_eq!(scheme.get(NodeIndex::new(2), j0), UNREACHABLE);
        assert_eq!(scheme.get(NodeIndex::new(3), j2), UNREACHABLE);
    }

    #[test]
    fn empty_graph_builds_empty_scheme() {
        let g = Graph::new(0);
        let (_, _, _, scheme) = build_for(g);
        assert_eq!(scheme.chain_count(), 0);
        assert_eq!(scheme.node_count(), 0);
    }
}

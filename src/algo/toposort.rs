//! Topological ordering of a DAG.

use fixedbitset::FixedBitSet;

use crate::graph::{Graph, NodeIndex};

/// Perform a topological sort of a directed *acyclic* graph.
///
/// Iterative depth-first search started from every unvisited vertex with
/// in-degree zero; vertices are placed back to front in reverse finish
/// order. The input being a DAG is a precondition; no cycle detection is
/// performed, and the result is meaningless on cyclic input.
pub fn toposort(g: &Graph) -> Vec<NodeIndex> {
    let n = g.node_count();
    let mut visited = FixedBitSet::with_capacity(n);
    let mut order = vec![NodeIndex::end(); n];
    let mut stack = Vec::with_capacity(n);
    let mut head = Vec::with_capacity(n);
    let mut i = n;

    for v in (0..n).map(NodeIndex::new) {
        if g.in_degree(v) == 0 && !visited.contains(v.index()) {
            i = visit(g, v, i, &mut visited, &mut order, &mut stack, &mut head);
            stack.clear();
            head.clear();
        }
    }
    debug_assert_eq!(i, 0, "input graph has a cycle");
    order
}

fn visit(
    g: &Graph,
    s: NodeIndex,
    mut i: usize,
    visited: &mut FixedBitSet,
    order: &mut [NodeIndex],
    stack: &mut Vec<NodeIndex>,
    head: &mut Vec<NodeIndex>,
) -> usize {
    stack.push(s);

    while let Some(&v) = stack.last() {
        if !visited.contains(v.index()) {
            visited.insert(v.index());
            head.push(v);
            for (_, e) in g.out_edges(v) {
                if !visited.contains(e.target().index()) {
                    stack.push(e.target());
                }
            }
        } else if head.last() == Some(&v) {
            // Backtracking: v finishes now, place it at the next free slot
            // from the back.
            i -= 1;
            order[i] = v;
            head.pop();
            stack.pop();
        } else {
            stack.pop();
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    // An order is topological if for every edge `(u, v)`, `u` comes before
    // `v` in the ordering.
    fn assert_topologically_sorted(g: &Graph, order: &[NodeIndex]) {
        assert_eq!(g.node_count(), order.len());
        let mut rank = vec![usize::MAX; g.node_count()];
        for (r, v) in order.iter().enumerate() {
            rank[v.index()] = r;
        }
        assert!(rank.iter().all(|&r| r != usize::MAX), "order misses a vertex");
        for v in (0..g.node_count()).map(NodeIndex::new) {
            for (_, e) in g.out_edges(v) {
                assert!(
                    rank[e.source().index()] < rank[e.target().index()],
                    "edge {} -> {} violates the order",
                    e.source().index(),
                    e.target().index(),
                );
            }
        }
    }

    #[test]
    fn diamond() {
        let g = Graph::from_edges(4, [(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_topologically_sorted(&g, &toposort(&g));
    }

    #[test]
    fn disjoint_paths() {
        let g = Graph::from_edges(4, [(0, 1), (2, 3)]);
        assert_topologically_sorted(&g, &toposort(&g));
    }

    /// The example from <https://en.wikipedia.org/wiki/Topological_sorting#Examples>.
    #[test]
    fn wikipedia_example() {
        let g = Graph::from_edges(
            8,
            [
                (1, 4),
                (1, 6),
                (2, 7),
                (3, 4),
                (3, 7),
                (4, 5),
                (7, 0),
                (7, 5),
                (7, 6),
            ],
        );
        assert_topologically_sorted(&g, &toposort(&g));
    }

    #[test]
    fn antichain() {
        let g = Graph::new(5);
        let order = toposort(&g);
        assert_topologically_sorted(&g, &order);
    }

    #[test]
    fn empty() {
        assert!(toposort(&Graph::new(0)).is_empty());
    }
}

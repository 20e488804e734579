//! Plain depth-first reachability, used as the ground truth the indexing
//! scheme is validated against.

use fixedbitset::FixedBitSet;

use crate::graph::{Graph, NodeIndex};

/// Workspace for [`has_path_connecting`] and [`path_connecting`], reusable
/// across many queries to avoid reallocating the visited map and stacks.
pub struct DfsSpace {
    stack: Vec<NodeIndex>,
    head: Vec<NodeIndex>,
    discovered: FixedBitSet,
}

impl DfsSpace {
    pub fn new(g: &Graph) -> Self {
        DfsSpace {
            stack: Vec::new(),
            head: Vec::new(),
            discovered: FixedBitSet::with_capacity(g.node_count()),
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.head.clear();
        self.discovered.clear();
    }
}

/// Return whether a path exists from `s` to `t` in O(|V| + |E|).
///
/// If `space` is not `None`, it is used instead of allocating a fresh
/// workspace.
pub fn has_path_connecting(
    g: &Graph,
    s: NodeIndex,
    t: NodeIndex,
    space: Option<&mut DfsSpace>,
) -> bool {
    path_connecting(g, s, t, space).is_some()
}

/// Return a path from `s` to `t` (the DFS head trail, `s` first), or `None`
/// if `t` is unreachable.
pub fn path_connecting(
    g: &Graph,
    s: NodeIndex,
    t: NodeIndex,
    space: Option<&mut DfsSpace>,
) -> Option<Vec<NodeIndex>> {
    let mut local = None;
    let space = match space {
        Some(space) => {
            space.reset();
            space
        }
        None => local.insert(DfsSpace::new(g)),
    };

    space.stack.push(s);
    while let Some(&u) = space.stack.last() {
        if !space.discovered.contains(u.index()) {
            space.discovered.insert(u.index());
            space.head.push(u);
            if u == t {
                return Some(space.head.clone());
            }
            for (_, e) in g.out_edges(u) {
                if !space.discovered.contains(e.target().index()) {
                    space.stack.push(e.target());
                }
            }
        } else if space.head.last() == Some(&u) {
            space.head.pop();
            space.stack.pop();
        } else {
            space.stack.pop();
        }
    }
    None
}

/// Full pairwise reachability by DFS, one row per source vertex.
/// O(|V|² · (|V| + |E|)); intended as a test oracle only.
pub fn dfs_reachability_matrix(g: &Graph) -> Vec<FixedBitSet> {
    let n = g.node_count();
    let mut space = DfsSpace::new(g);
    let mut matrix = Vec::with_capacity(n);
    for s in (0..n).map(NodeIndex::new) {
        let mut row = FixedBitSet::with_capacity(n);
        for t in (0..n).map(NodeIndex::new) {
            if has_path_connecting(g, s, t, Some(&mut space)) {
                row.insert(t.index());
            }
        }
        matrix.push(row);
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_follows_edges() {
        let g = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3)]);
        let path = path_connecting(&g, NodeIndex::new(0), NodeIndex::new(3), None).unwrap();
        assert_eq!(path.first(), Some(&NodeIndex::new(0)));
        assert_eq!(path.last(), Some(&NodeIndex::new(3)));
        for pair in path.windows(2) {
            assert!(g
                .out_edges(pair[0])
                .any(|(_, e)| e.target() == pair[1]));
        }
    }

    #[test]
    fn self_reachability_needs_no_edge() {
        let g = Graph::new(1);
        assert!(has_path_connecting(&g, NodeIndex::new(0), NodeIndex::new(0), None));
    }

    #[test]
    fn unreachable_against_edge_direction() {
        let g = Graph::from_edges(2, [(0, 1)]);
        assert!(!has_path_connecting(&g, NodeIndex::new(1), NodeIndex::new(0), None));
    }

    #[test]
    fn matrix_on_a_cycle_is_full() {
        let g = Graph::from_edges(3, [(0, 1), (1, 2), (2, 0)]);
        let matrix = dfs_reachability_matrix(&g);
        for row in &matrix {
            assert_eq!(row.count_ones(..), 3);
        }
    }

    #[test]
    fn space_reuse_gives_same_answers() {
        let g = Graph::from_edges(4, [(0, 1), (1, 2), (3, 1)]);
        let mut space = DfsSpace::new(&g);
        for s in (0..4).map(NodeIndex::new) {
            for t in (0..4).map(NodeIndex::new) {
                let fresh = has_path_connecting(&g, s, t, None);
                let reused = has_path_connecting(&g, s, t, Some(&mut space));
                assert_eq!(fresh, reused);
            }
        }
    }
}

//! **chainreach** answers pairwise reachability queries on directed graphs
//! in constant time after a linear-ish preprocessing pass.
//!
//! The pipeline collapses the input graph to its condensation DAG
//! (iterative Tarjan), sorts it topologically, partitions it into chains
//! with one of three heuristics (optionally followed by a concatenation
//! post-pass), prunes transitive edges against the chains, and finally
//! fills a per-vertex vector holding the smallest reachable position on
//! every chain. A query is then one comparison of two integers.
//!
//! ```
//! use chainreach::{Graph, Heuristic, Metrics, NodeIndex, ReachabilityIndex};
//!
//! let g = Graph::from_edges(3, [(0, 1), (1, 2)]);
//! let mut metrics = Metrics::default();
//! let index = ReachabilityIndex::build(&g, Heuristic::default(), &mut metrics);
//!
//! assert!(index.is_reachable(NodeIndex::new(0), NodeIndex::new(2)));
//! assert!(!index.is_reachable(NodeIndex::new(2), NodeIndex::new(0)));
//! ```

pub mod algo;
pub mod graph;
pub mod index;
pub mod io;
pub mod metrics;

pub use crate::graph::{Direction, EdgeIndex, Graph, IdMapping, NodeIndex};
pub use crate::index::{Heuristic, ReachabilityIndex, StageTimings};
pub use crate::metrics::Metrics;

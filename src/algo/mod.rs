//! The pipeline stages: condensation, topological sorting, chain
//! decomposition, transitive-edge reduction, scheme construction, and the
//! DFS oracle used to validate them.

pub mod condense;
pub mod decompose;
pub mod reduce;
pub mod scheme;
pub mod toposort;
pub mod traversal;

pub use condense::{condense, tarjan_scc, Sccs, TarjanScc};
pub use decompose::{ChainIndex, Decomposition};
pub use reduce::remove_transitive_edges;
pub use scheme::{IndexingScheme, UNREACHABLE};
pub use toposort::toposort;
pub use traversal::{dfs_reachability_matrix, has_path_connecting, path_connecting, DfsSpace};

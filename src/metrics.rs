//! Work counters threaded through the pipeline stages.

/// Node- and edge-processing counters for the three counted stages plus the
/// transitive-edge removal tally.
///
/// A `&mut Metrics` is passed into every stage that reports work; nothing in
/// the pipeline relies on process-wide mutable state.
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// Arcs unlinked by the transitive-edge reduction.
    pub removed_transitive_edges: u64,
    pub collapse_nodes_processed: u64,
    pub collapse_edges_processed: u64,
    pub decomp_nodes_processed: u64,
    pub decomp_edges_processed: u64,
    pub scheme_nodes_processed: u64,
    pub scheme_edges_processed: u64,
}

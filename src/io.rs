//! Reading and writing the plain-text graph format.
//!
//! Line 1 is the header `n: <N>`; every following line is a `<src> <tgt>`
//! pair of external integer ids. Lines that do not parse as two integers
//! are skipped silently.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use error_stack::{Context, Report, Result, ResultExt};

use crate::graph::{Graph, NodeIndex};

#[derive(Debug)]
pub enum ReadGraphError {
    /// The file could not be opened.
    Open,
    /// The `n: <N>` header line is missing or malformed.
    Header,
    /// Reading the edge lines failed, or an edge exceeds the declared
    /// vertex count.
    Read,
}

impl Display for ReadGraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "could not open graph file"),
            Self::Header => write!(f, "could not read graph header"),
            Self::Read => write!(f, "could not read graph edges"),
        }
    }
}

impl Context for ReadGraphError {}

#[derive(Debug)]
pub enum WriteGraphError {
    Open,
    Write,
}

impl Display for WriteGraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "could not open graph file for writing"),
            Self::Write => write!(f, "could not write graph file"),
        }
    }
}

impl Context for WriteGraphError {}

/// Load a graph from the text format.
///
/// External ids are mapped to dense internal indices in first-seen order;
/// the mapping is retained on the returned graph.
pub fn read_graph(path: &Path) -> Result<Graph, ReadGraphError> {
    let file = File::open(path)
        .change_context(ReadGraphError::Open)
        .attach_printable_lazy(|| format!("path: {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let header = lines
        .next()
        .ok_or_else(|| Report::new(ReadGraphError::Header).attach_printable("file is empty"))?
        .change_context(ReadGraphError::Header)?;
    let n = parse_header(&header).ok_or_else(|| {
        Report::new(ReadGraphError::Header).attach_printable(format!("header line: {header:?}"))
    })?;

    let mut g = Graph::new(n);
    for line in lines {
        let line = line.change_context(ReadGraphError::Read)?;
        let Some((source_id, target_id)) = parse_edge(&line) else {
            continue;
        };
        let v = g.ids.intern(source_id);
        let w = g.ids.intern(target_id);
        if v.index() >= n || w.index() >= n {
            return Err(Report::new(ReadGraphError::Read).attach_printable(format!(
                "edge {source_id} {target_id} exceeds the declared vertex count {n}"
            )));
        }
        g.add_edge(v, w);
    }
    Ok(g)
}

/// Write `g` in the text format, one line per live arc, using internal
/// indices.
pub fn write_graph(g: &Graph, path: &Path) -> Result<(), WriteGraphError> {
    let file = File::create(path)
        .change_context(WriteGraphError::Open)
        .attach_printable_lazy(|| format!("path: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "n: {}", g.node_count()).change_context(WriteGraphError::Write)?;
    for v in (0..g.node_count()).map(NodeIndex::new) {
        for (_, e) in g.out_edges(v) {
            writeln!(out, "{} {}", e.source().index(), e.target().index())
                .change_context(WriteGraphError::Write)?;
        }
    }
    out.flush().change_context(WriteGraphError::Write)?;
    Ok(())
}

fn parse_header(line: &str) -> Option<usize> {
    line.strip_prefix("n:")?.trim().parse().ok()
}

/// Parse the first two whitespace-separated integers; anything after them
/// is ignored.
fn parse_edge(line: &str) -> Option<(i64, i64)> {
    let mut fields = line.split_whitespace();
    let source = fields.next()?.parse().ok()?;
    let target = fields.next()?.parse().ok()?;
    Some((source, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("chainreach-{}-{name}", std::process::id()))
    }

    #[test]
    fn parses_header_and_edges() {
        let path = temp_path("basic.gr");
        fs::write(&path, "n: 3\n10 20\n20 30\n").unwrap();
        let g = read_graph(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        // first-seen order: 10 -> 0, 20 -> 1, 30 -> 2
        assert_eq!(g.id_mapping().get(10), Some(NodeIndex::new(0)));
        assert_eq!(g.id_mapping().get(30), Some(NodeIndex::new(2)));
        assert!(g
            .out_edges(NodeIndex::new(0))
            .any(|(_, e)| e.target() == NodeIndex::new(1)));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = temp_path("malformed.gr");
        fs::write(&path, "n: 2\n# comment\n0 1\nnot an edge\n").unwrap();
        let g = read_graph(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn empty_vertex_set_loads() {
        let path = temp_path("empty.gr");
        fs::write(&path, "n: 0\n").unwrap();
        let g = read_graph(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn missing_header_is_an_error() {
        let path = temp_path("noheader.gr");
        fs::write(&path, "0 1\n").unwrap();
        let err = read_graph(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err.current_context(), ReadGraphError::Header));
    }

    #[test]
    fn too_many_vertices_is_an_error() {
        let path = temp_path("overflow.gr");
        fs::write(&path, "n: 1\n0 1\n").unwrap();
        let err = read_graph(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err.current_context(), ReadGraphError::Read));
    }

    #[test]
    fn write_then_read_round_trips() {
        let g = Graph::from_edges(3, [(0, 1), (1, 2)]);
        let path = temp_path("roundtrip.gr");
        write_graph(&g, &path).unwrap();
        let back = read_graph(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(back.node_count(), 3);
        assert_eq!(back.edge_count(), 2);
        assert!(back
            .out_edges(NodeIndex::new(0))
            .any(|(_, e)| e.target() == NodeIndex::new(1)));
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use fixedbitset::FixedBitSet;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

use chainreach::io::read_graph;
use chainreach::{Graph, Heuristic, Metrics, ReachabilityIndex, StageTimings};

#[derive(Copy, Clone, ValueEnum)]
enum HeuristicArg {
    /// Node-Order
    No,
    /// Chain-Order
    Co,
    /// Node-Order + concatenation
    Noc,
    /// Chain-Order + concatenation
    Coc,
    /// H3-Concat
    H3,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::No => Heuristic::NodeOrder,
            HeuristicArg::Co => Heuristic::ChainOrder,
            HeuristicArg::Noc => Heuristic::NodeOrderConcat,
            HeuristicArg::Coc => Heuristic::ChainOrderConcat,
            HeuristicArg::H3 => Heuristic::H3Concat,
        }
    }
}

#[derive(Parser)]
#[command(about = "Constant-time reachability queries via chain-decomposition indexing")]
struct Cli {
    /// Graph file: header `n: <N>`, then one `<src> <tgt>` pair per line
    file: PathBuf,

    /// Enable verbose stage logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the full reachability matrix after building the index
    #[arg(short, long)]
    matrix: bool,

    /// Print one line of counters and per-stage timings
    #[arg(short, long)]
    bench: bool,

    /// Chain-decomposition heuristic
    #[arg(short, long, value_enum, default_value_t = HeuristicArg::H3)]
    decomposition: HeuristicArg,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> error_stack::Result<(), chainreach::io::ReadGraphError> {
    let total_start = Instant::now();

    let reading_start = Instant::now();
    let g = read_graph(&cli.file)?;
    let reading = reading_start.elapsed();
    debug!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        "read graph"
    );

    let heuristic = Heuristic::from(cli.decomposition);
    let mut metrics = Metrics::default();

    let index = if cli.bench {
        let (index, mut timings) = ReachabilityIndex::build_timed(&g, heuristic, &mut metrics);
        timings.reading = reading;
        timings.total = total_start.elapsed();
        print_bench_line(&g, &index, &metrics, &timings);
        index
    } else {
        ReachabilityIndex::build(&g, heuristic, &mut metrics)
    };

    if cli.matrix {
        print_matrix(&index.reachability_matrix());
    }
    Ok(())
}

fn print_matrix(matrix: &[FixedBitSet]) {
    for row in matrix {
        print!("[ ");
        for t in 0..row.len() {
            if t > 0 {
                print!(", ");
            }
            print!("{}", if row.contains(t) { "T" } else { "F" });
        }
        println!(" ]");
    }
}

fn ms(d: std::time::Duration) -> String {
    format!("{:.4} ms", d.as_secs_f64() * 1e3)
}

fn print_bench_line(
    g: &Graph,
    index: &ReachabilityIndex,
    metrics: &Metrics,
    timings: &StageTimings,
) {
    println!(
        "#nodes: {}, #edges: {}, #scc: {}, #chains: {}, scheme-size: {}, \
         #removed-edges: {}, #collapse-nodes: {}, #collapse-edges: {}, \
         #decomp-nodes: {}, #decomp-edges: {}, #scheme-nodes: {}, #scheme-edges: {}, \
         time-decomp: {}, time-preprocess: {}, time-scheme: {}, time-reading: {}, \
         time-comp: {}, time-total: {}, time-collapse: {}, time-topo: {}, \
         time-remove_edges: {}, time-topo_edges: {}",
        g.node_count(),
        g.edge_count(),
        index.component_count(),
        index.chain_count(),
        index.component_count() * index.chain_count(),
        metrics.removed_transitive_edges,
        metrics.collapse_nodes_processed,
        metrics.collapse_edges_processed,
        metrics.decomp_nodes_processed,
        metrics.decomp_edges_processed,
        metrics.scheme_nodes_processed,
        metrics.scheme_edges_processed,
        ms(timings.decomp),
        ms(timings.preprocess),
        ms(timings.scheme),
        ms(timings.reading),
        ms(timings.comp),
        ms(timings.total),
        ms(timings.collapse),
        ms(timings.topo),
        ms(timings.remove_edges),
        ms(timings.topo_edges),
    );
}

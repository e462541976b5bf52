use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use wikilinkr::cache;
use wikilinkr::graph::LinkGraph;
use wikilinkr::logging;
use wikilinkr::models::PathReport;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "wikilinkr-graph")]
#[command(about = "Query a link graph written by wikilinkr")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the outbound links of one title
    Links(LinksArgs),
    /// Find the fewest-clicks path between two titles
    Path(PathArgs),
}

#[derive(Args, Debug)]
struct GraphArgs {
    /// Link-graph file produced by extraction
    graph: PathBuf,

    /// Always parse the link-graph file; don't read or write <graph>.cache
    #[arg(long)]
    no_cache: bool,
}

impl GraphArgs {
    fn load(&self) -> Result<LinkGraph> {
        cache::load_graph(&self.graph, !self.no_cache)
    }
}

#[derive(Args, Debug)]
struct LinksArgs {
    #[command(flatten)]
    graph: GraphArgs,

    /// Article title (case-insensitive)
    title: String,
}

#[derive(Args, Debug)]
struct PathArgs {
    #[command(flatten)]
    graph: GraphArgs,

    /// Starting article
    from: String,

    /// Destination article
    to: String,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn run_links(args: LinksArgs) -> Result<()> {
    let graph = args.graph.load()?;
    let Some(links) = graph.links(&args.title) else {
        bail!("Title not found in link graph: {}", args.title);
    };

    for link in &links {
        println!("{}", link);
    }
    info!(title = %args.title, links = links.len(), "Listed links");
    Ok(())
}

fn run_path(args: PathArgs) -> Result<()> {
    let graph = args.graph.load()?;

    let started = Instant::now();
    let path = graph.shortest_path(&args.from, &args.to);
    info!(
        duration_secs = started.elapsed().as_secs_f64(),
        found = path.is_some(),
        "Path search complete"
    );

    if args.json {
        let report = PathReport {
            from: &args.from,
            to: &args.to,
            hops: path.as_ref().map(|p| p.len() - 1),
            path,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize path report")?
        );
        return Ok(());
    }

    let Some(path) = path else {
        bail!("No path from {} to {}", args.from, args.to);
    };
    println!("{} click(s):", path.len() - 1);
    for (step, title) in path.iter().enumerate() {
        println!("  {}: {}", step, title);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Links(args) => run_links(args),
        Commands::Path(args) => run_path(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use wikilinkr::extract::{run_extraction, ExtractOptions};
use wikilinkr::logging;
use wikilinkr::observer::ProgressObserver;
use wikilinkr::output::next_output_path;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "wikilinkr")]
#[command(about = "Extract the link structure of a Wikipedia dump")]
#[command(after_help = "Query an extracted link graph with wikilinkr-graph.")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the dump file (plain XML or .xml.bz2)
    input: PathBuf,

    /// Output file (defaults to the first unused out_N.txt in the current directory)
    output: Option<PathBuf>,

    /// Fail if the dump ends inside a page instead of dropping it
    #[arg(long)]
    strict: bool,

    /// Extraction threads (1 = sequential, 0 = all cores)
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Stop after this many pages (for sampling)
    #[arg(long)]
    limit: Option<u64>,
}

fn run(cli: Cli) -> Result<()> {
    let output = match cli.output {
        Some(path) => path,
        None => next_output_path(Path::new(".")),
    };

    let options = ExtractOptions {
        strict: cli.strict,
        jobs: cli.jobs,
        limit: cli.limit,
    };

    let started = Instant::now();
    let observer = ProgressObserver::new();
    let stats = run_extraction(&cli.input, &output, &options, &observer)?;
    let elapsed = started.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Read from:          {}", cli.input.display());
    println!("Wrote to:           {}", output.display());
    println!("Extraction time:    {:.2}s", elapsed.as_secs_f64());
    println!();
    println!("Pages written:      {}", stats.pages());
    println!("Links written:      {}", stats.links());
    println!("Empty titles:       {}", stats.empty_titles());
    println!("Missing hashes:     {}", stats.empty_hashes());
    println!("Truncated pages:    {}", stats.truncated());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
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

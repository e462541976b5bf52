use crate::config::WRITE_BUFFER_SIZE;
use crate::content::parse_page;
use crate::models::PageRecord;
use crate::observer::ExtractionObserver;
use crate::parser::{open_dump, PageReader};
use crate::stats::ExtractionStats;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Knobs for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Fail on a page left open at end of stream instead of dropping it
    pub strict: bool,
    /// Worker threads: 1 extracts inline, 0 uses every core
    pub jobs: usize,
    /// Stop after this many records
    pub limit: Option<u64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strict: false,
            jobs: 1,
            limit: None,
        }
    }
}

/// Extracts `input` into `output`, creating or truncating the output file.
pub fn run_extraction(
    input: &Path,
    output: &Path,
    options: &ExtractOptions,
    observer: &dyn ExtractionObserver,
) -> Result<ExtractionStats> {
    let reader = open_dump(input)?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

    info!(
        input = %input.display(),
        output = %output.display(),
        jobs = options.jobs,
        "Starting extraction"
    );

    let started = Instant::now();
    let stats = extract_pages(reader, &mut writer, options, observer)?;
    observer.run_finished(&stats, started.elapsed());

    Ok(stats)
}

/// Streams pages from `reader` to `out`, one record per complete page, in input order.
///
/// The sink is flushed before returning. A write failure aborts the run; whatever was
/// already written stays in the sink.
pub fn extract_pages<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    options: &ExtractOptions,
    observer: &dyn ExtractionObserver,
) -> Result<ExtractionStats> {
    let mut pages = PageReader::new(reader).strict(options.strict);
    let stats = ExtractionStats::new();

    if options.jobs == 1 {
        extract_sequential(&mut pages, out, options.limit, &stats, observer)?;
    } else {
        extract_parallel(&mut pages, out, options, &stats, observer)?;
    }

    if pages.truncated() {
        stats.inc_truncated();
    }

    out.flush().context("Failed to flush output")?;
    debug!(
        pages_read = pages.pages_read(),
        emitted = stats.pages(),
        "Page stream drained"
    );

    Ok(stats)
}

fn extract_sequential<R: BufRead, W: Write>(
    pages: &mut PageReader<R>,
    out: &mut W,
    limit: Option<u64>,
    stats: &ExtractionStats,
    observer: &dyn ExtractionObserver,
) -> Result<()> {
    while !limit_reached(limit, stats) {
        let Some(page) = pages.next_page().context("Failed to read page")? else {
            break;
        };
        let record = parse_page(page);
        emit(&record, out, stats, observer)?;
    }
    Ok(())
}

/// Reads one page per worker, extracts the batch on the pool, writes it in input order.
fn extract_parallel<R: BufRead, W: Write>(
    pages: &mut PageReader<R>,
    out: &mut W,
    options: &ExtractOptions,
    stats: &ExtractionStats,
    observer: &dyn ExtractionObserver,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .thread_name(|i| format!("wikilinkr-extract-{}", i))
        .build()
        .context("Failed to build extraction thread pool")?;
    let workers = pool.current_num_threads();
    debug!(workers, "Extracting in parallel");

    let mut batch: Vec<String> = Vec::with_capacity(workers);
    loop {
        let want = match options.limit {
            Some(limit) => (limit.saturating_sub(stats.pages()) as usize).min(workers),
            None => workers,
        };
        if want == 0 {
            break;
        }

        // pages read before a failed read are still written
        batch.clear();
        let mut failed = None;
        for page in pages.by_ref().take(want) {
            match page {
                Ok(page) => batch.push(page),
                Err(e) => {
                    failed = Some(e);
                    break;
                }
            }
        }

        let records: Vec<PageRecord> =
            pool.install(|| batch.par_iter().map(|page| parse_page(page)).collect());
        for record in &records {
            emit(record, out, stats, observer)?;
        }

        if let Some(e) = failed {
            return Err(e).context("Failed to read page");
        }
        if batch.len() < want {
            break;
        }
    }
    Ok(())
}

fn emit<W: Write>(
    record: &PageRecord,
    out: &mut W,
    stats: &ExtractionStats,
    observer: &dyn ExtractionObserver,
) -> Result<()> {
    record.write_to(out).context("Failed to write record")?;
    stats.record(record);
    observer.page_completed(record, stats.pages());
    Ok(())
}

fn limit_reached(limit: Option<u64>, stats: &ExtractionStats) -> bool {
    limit.is_some_and(|limit| stats.pages() >= limit)
}

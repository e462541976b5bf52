//! Wikilinkr: streaming link-graph extraction from Wikipedia dumps
//!
//! This crate turns a multi-gigabyte dump into a compact link graph and answers
//! questions about it:
//!
//! 1. **Extraction Pass** -- Stream the dump line by line, cut it into pages at each
//!    `</page>`, and write one record per page: upper-cased title, SHA-1, and the distinct
//!    upper-cased link targets
//! 2. **Graph Pass** (optional) -- Load a link-graph file into memory, cache it, and find
//!    the fewest-clicks path between two articles
//!
//! # Architecture
//!
//! - **Line-oriented streaming** -- Only the page being accumulated is held in memory;
//!   fields are found by delimiter search, never by parsing the markup
//! - **Ordered parallel extraction** -- With `--jobs`, one page per rayon worker, written
//!   back in input order by a single writer
//! - **Deterministic output** -- Links are emitted sorted, so identical dumps give
//!   byte-identical link graphs
//! - **Observer hooks** -- Progress and timing are reported through
//!   [`observer::ExtractionObserver`], keeping the extraction loop free of console output
//!
//! # Key Modules
//!
//! - [`parser`] -- Dump opening (plain or BZ2) and the page-boundary accumulator
//! - [`content`] -- Field spans, the `[[...]]` link scanner, link normalization
//! - [`extract`] -- The extraction loop, sequential or parallel
//! - [`models`] -- Core data types (PageRecord, PathReport)
//! - [`records`] -- Reader for the link-graph output format
//! - [`graph`] -- Interned in-memory link graph with shortest-path search
//! - [`cache`] -- Graph persistence with bincode
//! - [`observer`] -- Progress/timing hooks
//! - [`stats`] -- Thread-safe atomic counters for extraction metrics
//! - [`output`] -- Output file auto-naming
//! - [`logging`] -- Subscriber setup shared by both binaries
//! - [`config`] -- Delimiters and tuning constants
//!
//! # Example Usage
//!
//! ```bash
//! # Extract into the first free out_N.txt
//! wikilinkr simplewiki-latest-pages-articles.xml.bz2
//!
//! # Extract with 8 workers into a named file
//! wikilinkr --jobs 8 enwiki.xml links.txt
//!
//! # Walk the graph
//! wikilinkr-graph path links.txt "Rust (programming language)" "Philosophy"
//! ```

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod graph;
pub mod logging;
pub mod models;
pub mod observer;
pub mod output;
pub mod parser;
pub mod records;
pub mod stats;

use crate::config::{CACHE_VERSION, READ_BUFFER_SIZE};
use crate::graph::LinkGraph;
use anyhow::{Context, Result};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// What a cache was built from. A cache is reused only when this matches the source now.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub version: u32,
    pub source_path: String,
    pub source_mtime: u64,
    pub source_size: u64,
}

impl CacheMetadata {
    /// Describes `source` as it is on disk right now.
    pub fn for_source(source: &Path) -> Result<Self> {
        let stat = fs::metadata(source)
            .with_context(|| format!("Failed to stat link graph: {}", source.display()))?;
        let mtime = stat
            .modified()
            .context("Link graph has no modification time")?
            .duration_since(SystemTime::UNIX_EPOCH)
            .context("Link graph modification time predates the epoch")?
            .as_secs();
        Ok(Self {
            version: CACHE_VERSION,
            source_path: source.to_string_lossy().into_owned(),
            source_mtime: mtime,
            source_size: stat.len(),
        })
    }
}

#[derive(Deserialize)]
struct StoredGraph {
    metadata: CacheMetadata,
    titles: Vec<String>,
    links: Vec<Vec<u32>>,
    is_page: Vec<bool>,
}

/// Write-side twin of [`StoredGraph`] borrowing the graph's tables.
#[derive(Serialize)]
struct StoredGraphRef<'a> {
    metadata: CacheMetadata,
    titles: &'a Vec<String>,
    links: &'a Vec<Vec<u32>>,
    is_page: &'a Vec<bool>,
}

/// `links.txt` caches to `links.txt.cache` alongside it.
pub fn cache_path(source: &Path) -> PathBuf {
    let mut name = OsString::from(source.as_os_str());
    name.push(".cache");
    PathBuf::from(name)
}

/// True when `stored` still describes `source`.
pub fn is_fresh(stored: &CacheMetadata, source: &Path) -> Result<bool> {
    let current = CacheMetadata::for_source(source)?;
    if *stored == current {
        return Ok(true);
    }
    debug!(?stored, ?current, "Link graph cache is stale");
    Ok(false)
}

/// `Ok(None)` when there is no usable cache: missing, unreadable, stale or inconsistent.
pub fn try_load_graph(cache_file: &Path, source: &Path) -> Result<Option<LinkGraph>> {
    let file = match File::open(cache_file) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to open cache file: {}", cache_file.display())
            })
        }
    };
    let limit = file.metadata().map_or(0, |m| m.len()).saturating_add(1024);

    let stored: StoredGraph = match bincode::options()
        .with_limit(limit)
        .deserialize_from(BufReader::with_capacity(READ_BUFFER_SIZE, file))
    {
        Ok(stored) => stored,
        Err(e) => {
            warn!(error = %e, path = %cache_file.display(), "Ignoring unreadable cache");
            return Ok(None);
        }
    };

    if !is_fresh(&stored.metadata, source)? {
        return Ok(None);
    }

    let Some(graph) = LinkGraph::from_parts(stored.titles, stored.links, stored.is_page) else {
        warn!(path = %cache_file.display(), "Ignoring inconsistent cache");
        return Ok(None);
    };

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Link graph restored from cache"
    );
    Ok(Some(graph))
}

/// Writes the cache for `graph`, which was built from `source`.
pub fn save_graph(graph: &LinkGraph, source: &Path) -> Result<()> {
    let (titles, links, is_page) = graph.parts();
    let stored = StoredGraphRef {
        metadata: CacheMetadata::for_source(source)?,
        titles,
        links,
        is_page,
    };

    let path = cache_path(source);
    write_atomically(&path, |writer| {
        bincode::DefaultOptions::new()
            .serialize_into(writer, &stored)
            .context("Failed to encode link graph cache")
    })?;

    debug!(path = %path.display(), nodes = graph.node_count(), "Link graph cache written");
    Ok(())
}

/// Runs `write` against a sibling temp file, then renames it over `path`.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = path.with_extension("cache.tmp");
    let file = File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move cache into place at {}", path.display()))
}

/// Loads the graph from cache when fresh, otherwise from the file (refreshing the cache).
pub fn load_graph(source: &Path, use_cache: bool) -> Result<LinkGraph> {
    if !use_cache {
        return LinkGraph::build(source);
    }

    if let Some(graph) = try_load_graph(&cache_path(source), source)? {
        return Ok(graph);
    }

    let graph = LinkGraph::build(source)?;
    if let Err(e) = save_graph(&graph, source) {
        warn!(error = %e, "Link graph cache not written");
    }
    Ok(graph)
}

use crate::config::PROGRESS_INTERVAL;
use crate::error::ParseResult;
use crate::models::PageRecord;
use crate::records::RecordReader;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

const UNVISITED: u32 = u32::MAX;

/// In-memory link graph built from an extracted link-graph file.
///
/// Every title, whether it has a record of its own or only appears as a link target, is
/// interned to a dense `u32` id. Titles are stored in their normalized (upper-case) form.
pub struct LinkGraph {
    ids: FxHashMap<String, u32>,
    titles: Vec<String>,
    links: Vec<Vec<u32>>,
    is_page: Vec<bool>,
    duplicates: u64,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            titles: Vec::new(),
            links: Vec::new(),
            is_page: Vec::new(),
            duplicates: 0,
        }
    }

    /// Loads a link-graph file written by the extractor.
    pub fn build(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open link graph at: {}", path.display()))?;
        let pb = ProgressBar::new_spinner();

        info!("Loading link graph from: {}", path.display());

        let mut loaded: u64 = 0;
        let records = RecordReader::new(BufReader::new(file)).inspect(|_| {
            loaded += 1;
            if loaded % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }
        });
        let graph = Self::from_records(records).context("Failed to read link graph record")?;

        pb.finish_and_clear();

        info!(
            pages = graph.page_count(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            duplicates = graph.duplicates,
            "Link graph loaded"
        );

        Ok(graph)
    }

    pub fn from_records<I>(records: I) -> ParseResult<Self>
    where
        I: IntoIterator<Item = ParseResult<PageRecord>>,
    {
        let mut graph = Self::new();
        for record in records {
            graph.insert(record?);
        }
        Ok(graph)
    }

    /// Rebuilds a graph from its cached parts; ids are the positions in `titles`.
    ///
    /// `None` when the tables disagree in length or a link names an id with no title.
    pub(crate) fn from_parts(
        titles: Vec<String>,
        links: Vec<Vec<u32>>,
        is_page: Vec<bool>,
    ) -> Option<Self> {
        let nodes = titles.len();
        if links.len() != nodes || is_page.len() != nodes {
            return None;
        }
        if links.iter().flatten().any(|&id| id as usize >= nodes) {
            return None;
        }

        let ids = titles
            .iter()
            .enumerate()
            .map(|(id, title)| (title.clone(), id as u32))
            .collect();
        Some(Self {
            ids,
            titles,
            links,
            is_page,
            duplicates: 0,
        })
    }

    pub(crate) fn parts(&self) -> (&Vec<String>, &Vec<Vec<u32>>, &Vec<bool>) {
        (&self.titles, &self.links, &self.is_page)
    }

    /// Adds one record. A title seen before as a page has its links replaced.
    pub fn insert(&mut self, record: PageRecord) {
        let id = self.intern(record.title);
        let targets: Vec<u32> = record
            .links
            .into_iter()
            .map(|link| self.intern(link))
            .collect();

        let slot = id as usize;
        if self.is_page[slot] {
            self.duplicates += 1;
            debug!(title = %self.titles[slot], "Duplicate page; keeping the later record");
        }
        self.is_page[slot] = true;
        self.links[slot] = targets;
    }

    fn intern(&mut self, title: String) -> u32 {
        if let Some(&id) = self.ids.get(&title) {
            return id;
        }
        let id = self.titles.len() as u32;
        self.titles.push(title.clone());
        self.links.push(Vec::new());
        self.is_page.push(false);
        self.ids.insert(title, id);
        id
    }

    /// Titles with a record of their own.
    pub fn page_count(&self) -> usize {
        self.is_page.iter().filter(|&&p| p).count()
    }

    /// All interned titles, link-only targets included.
    pub fn node_count(&self) -> usize {
        self.titles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.links.iter().map(Vec::len).sum()
    }

    /// Looks up a title the way links are normalized (upper-cased).
    pub fn resolve_id(&self, title: &str) -> Option<u32> {
        self.ids.get(&title.to_uppercase()).copied()
    }

    /// Outbound links of `title`, or `None` when the title is unknown.
    pub fn links(&self, title: &str) -> Option<Vec<&str>> {
        let id = self.resolve_id(title)?;
        Some(
            self.links[id as usize]
                .iter()
                .map(|&t| self.titles[t as usize].as_str())
                .collect(),
        )
    }

    /// Fewest-clicks path from `from` to `to`, both ends included.
    ///
    /// Breadth-first over outbound links; among equally short paths the one through
    /// earlier-sorted links wins. `None` when either title is unknown or `to` is unreachable.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<&str>> {
        let source = self.resolve_id(from)?;
        let target = self.resolve_id(to)?;

        let mut parent = vec![UNVISITED; self.titles.len()];
        parent[source as usize] = source;
        let mut queue = VecDeque::from([source]);

        while let Some(node) = queue.pop_front() {
            if node == target {
                return Some(self.walk_back(&parent, target));
            }
            for &next in &self.links[node as usize] {
                if parent[next as usize] == UNVISITED {
                    parent[next as usize] = node;
                    queue.push_back(next);
                }
            }
        }

        debug!(from, to, "No path found");
        None
    }

    fn walk_back(&self, parent: &[u32], target: u32) -> Vec<&str> {
        let mut path = vec![self.titles[target as usize].as_str()];
        let mut node = target;
        while parent[node as usize] != node {
            node = parent[node as usize];
            path.push(self.titles[node as usize].as_str());
        }
        path.reverse();
        path
    }
}

impl Default for LinkGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, links: &[&str]) -> PageRecord {
        PageRecord {
            title: title.to_string(),
            hash: String::new(),
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_graph(pages: &[(&str, &[&str])]) -> LinkGraph {
        let mut graph = LinkGraph::new();
        for (title, links) in pages {
            graph.insert(record(title, links));
        }
        graph
    }

    #[test]
    fn counts_pages_nodes_and_edges() {
        let graph = make_graph(&[("A", &["B", "C"]), ("B", &["C"])]);
        assert_eq!(graph.page_count(), 2);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let graph = make_graph(&[("RUST", &["PYTHON"])]);
        assert_eq!(graph.links("rust"), Some(vec!["PYTHON"]));
        assert_eq!(graph.links("Rust"), Some(vec!["PYTHON"]));
        assert_eq!(graph.links("Go"), None);
    }

    #[test]
    fn link_only_target_has_no_links() {
        let graph = make_graph(&[("A", &["B"])]);
        assert_eq!(graph.links("B"), Some(vec![]));
    }

    #[test]
    fn duplicate_page_keeps_later_links() {
        let graph = make_graph(&[("A", &["B"]), ("A", &["C"])]);
        assert_eq!(graph.links("A"), Some(vec!["C"]));
        assert_eq!(graph.page_count(), 1);
        assert_eq!(graph.duplicates, 1);
    }

    #[test]
    fn path_to_self() {
        let graph = make_graph(&[("A", &["B"])]);
        assert_eq!(graph.shortest_path("A", "A"), Some(vec!["A"]));
    }

    #[test]
    fn path_direct_link() {
        let graph = make_graph(&[("A", &["B"])]);
        assert_eq!(graph.shortest_path("A", "B"), Some(vec!["A", "B"]));
    }

    #[test]
    fn path_prefers_fewest_hops() {
        let graph = make_graph(&[
            ("A", &["B", "X"]),
            ("B", &["C"]),
            ("C", &["D"]),
            ("X", &["D"]),
        ]);
        assert_eq!(graph.shortest_path("A", "D"), Some(vec!["A", "X", "D"]));
    }

    #[test]
    fn path_follows_direction() {
        let graph = make_graph(&[("A", &["B"])]);
        assert_eq!(graph.shortest_path("B", "A"), None);
    }

    #[test]
    fn path_handles_cycles() {
        let graph = make_graph(&[("A", &["B"]), ("B", &["A", "C"]), ("C", &["A"])]);
        assert_eq!(graph.shortest_path("A", "C"), Some(vec!["A", "B", "C"]));
        assert_eq!(graph.shortest_path("C", "B"), Some(vec!["C", "A", "B"]));
    }

    #[test]
    fn path_unknown_title() {
        let graph = make_graph(&[("A", &["B"])]);
        assert_eq!(graph.shortest_path("A", "Nowhere"), None);
        assert_eq!(graph.shortest_path("Nowhere", "A"), None);
    }

    #[test]
    fn from_parts_restores_lookup() {
        let graph = make_graph(&[("A", &["B"]), ("B", &["C"])]);
        let (titles, links, is_page) = graph.parts();
        let restored =
            LinkGraph::from_parts(titles.clone(), links.clone(), is_page.clone()).unwrap();
        assert_eq!(restored.shortest_path("A", "C"), Some(vec!["A", "B", "C"]));
        assert_eq!(restored.page_count(), 2);
    }

    #[test]
    fn from_parts_rejects_dangling_link() {
        let titles = vec!["A".to_string(), "B".to_string()];
        let links = vec![vec![1], vec![99]];
        assert!(LinkGraph::from_parts(titles, links, vec![true, true]).is_none());
    }

    #[test]
    fn from_parts_rejects_mismatched_tables() {
        let titles = vec!["A".to_string(), "B".to_string()];
        assert!(LinkGraph::from_parts(titles.clone(), vec![vec![1]], vec![true, true]).is_none());
        assert!(LinkGraph::from_parts(titles, vec![vec![1], vec![]], vec![true]).is_none());
    }

    #[test]
    fn from_records_propagates_errors() {
        let records = vec![
            Ok(record("A", &[])),
            Err(crate::error::ParseError::Io(std::io::Error::other("boom"))),
        ];
        assert!(LinkGraph::from_records(records).is_err());
    }
}

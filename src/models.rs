use crate::config::RECORD_HEADER;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};

/// One extracted page: normalized title, content hash, and distinct normalized links.
///
/// Links live in a `BTreeSet` so a record always renders in the same (byte-wise sorted)
/// order regardless of where the links appeared in the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRecord {
    pub title: String,
    pub hash: String,
    pub links: BTreeSet<String>,
}

impl PageRecord {
    /// Writes the framed record: header, title, hash, then one link per line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(RECORD_HEADER.as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(self.title.as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(self.hash.as_bytes())?;
        out.write_all(b"\n")?;
        for link in &self.links {
            out.write_all(link.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl fmt::Display for PageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RECORD_HEADER)?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.hash)?;
        for link in &self.links {
            writeln!(f, "{}", link)?;
        }
        Ok(())
    }
}

/// Result of a shortest-path query, as printed by `wikilinkr-graph path --json`.
#[derive(Debug, Serialize)]
pub struct PathReport<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub hops: Option<usize>,
    pub path: Option<Vec<&'a str>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PageRecord {
        PageRecord {
            title: "CAT".to_string(),
            hash: "abc123".to_string(),
            links: ["FELINE", "ANIMAL"].iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn write_to_frames_record() {
        let mut out = Vec::new();
        record().write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<page>\nCAT\nabc123\nANIMAL\nFELINE\n"
        );
    }

    #[test]
    fn display_matches_write_to() {
        let mut out = Vec::new();
        record().write_to(&mut out).unwrap();
        assert_eq!(record().to_string(), String::from_utf8(out).unwrap());
    }

    #[test]
    fn empty_fields_render_as_blank_lines() {
        assert_eq!(PageRecord::default().to_string(), "<page>\n\n\n");
    }

    #[test]
    fn path_report_serializes() {
        let report = PathReport {
            from: "A",
            to: "C",
            hops: Some(2),
            path: Some(vec!["A", "B", "C"]),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hops"], 2);
        assert_eq!(json["path"][1], "B");
    }
}

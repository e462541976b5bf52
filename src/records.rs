use crate::config::RECORD_HEADER;
use crate::error::{ParseError, ParseResult};
use crate::models::PageRecord;
use std::io::BufRead;

#[derive(Clone, Copy)]
enum Field {
    Title,
    Hash,
    Links,
}

/// Reads a link-graph file (the extractor's output) back into records.
///
/// A line that is exactly `<page>` opens a record; the next two lines are the title and
/// hash and everything up to the next `<page>` is a link. Lines before the first header
/// are skipped.
pub struct RecordReader<R> {
    reader: R,
    line: String,
    current: Option<PageRecord>,
    field: Field,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            current: None,
            field: Field::Title,
            done: false,
        }
    }

    fn read_line(&mut self) -> ParseResult<bool> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(false);
        }
        if self.line.ends_with('\n') {
            self.line.pop();
        }
        Ok(true)
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = ParseResult<PageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.read_line() {
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Ok(false) => {
                    self.done = true;
                    return self.current.take().map(Ok);
                }
                Ok(true) => {}
            }

            if self.line == RECORD_HEADER {
                self.field = Field::Title;
                if let Some(finished) = self.current.replace(PageRecord::default()) {
                    return Some(Ok(finished));
                }
                continue;
            }

            let Some(record) = self.current.as_mut() else {
                continue;
            };
            let line = std::mem::take(&mut self.line);
            match self.field {
                Field::Title => {
                    record.title = line;
                    self.field = Field::Hash;
                }
                Field::Hash => {
                    record.hash = line;
                    self.field = Field::Links;
                }
                Field::Links => {
                    record.links.insert(line);
                }
            }
        }
    }
}

/// Convenience for tests and small files.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<PageRecord>, ParseError> {
    RecordReader::new(reader).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_framed_records() {
        let input = "<page>\nCAT\nabc123\nANIMAL\nFELINE\n<page>\nDOG\n\n";
        let records = read_records(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "CAT");
        assert_eq!(records[0].hash, "abc123");
        assert_eq!(
            records[0].links.iter().collect::<Vec<_>>(),
            vec!["ANIMAL", "FELINE"]
        );
        assert_eq!(records[1].title, "DOG");
        assert_eq!(records[1].hash, "");
        assert!(records[1].links.is_empty());
    }

    #[test]
    fn rendered_records_read_back_unchanged() {
        let record = PageRecord {
            title: "CAT".to_string(),
            hash: "abc".to_string(),
            links: ["A", "B"].iter().map(|s| s.to_string()).collect(),
        };
        let text = format!("{}{}", record, PageRecord::default());
        let records = read_records(Cursor::new(text)).unwrap();
        assert_eq!(records, vec![record, PageRecord::default()]);
    }

    #[test]
    fn record_cut_before_hash() {
        let records = read_records(Cursor::new("<page>\nLONELY")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "LONELY");
        assert_eq!(records[0].hash, "");
    }

    #[test]
    fn preamble_is_skipped() {
        let records = read_records(Cursor::new("junk\nmore junk\n<page>\nT\nh\n")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "T");
    }

    #[test]
    fn empty_input() {
        assert!(read_records(Cursor::new("")).unwrap().is_empty());
    }
}

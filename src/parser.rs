use crate::config::{PAGE_BUFFER_CAPACITY, PAGE_CLOSE, PAGE_OPEN, READ_BUFFER_SIZE};
use crate::error::{ParseError, ParseResult};
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Opens a dump for line-oriented reading. `.bz2` inputs are decompressed on the fly.
pub fn open_dump(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dump at: {}", path.display()))?;

    let is_bz2 = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"));

    if is_bz2 {
        debug!(path = %path.display(), "Reading bzip2-compressed dump");
        let decoder = MultiBzDecoder::new(BufReader::with_capacity(READ_BUFFER_SIZE, file));
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

/// Splits a line stream into page buffers.
///
/// Each line is appended to the current buffer (terminator included). When the line just
/// appended contains `</page>` the buffer is complete and is handed out whole; it is
/// cleared before the next line is read. Only the line is searched for the marker, so a
/// marker split across two lines never closes a page.
///
/// A buffer still open at end of stream is dropped, or reported as
/// [`ParseError::IncompleteRecord`] in strict mode when it holds an opening `<page>`.
pub struct PageReader<R> {
    reader: R,
    buf: String,
    line: Vec<u8>,
    line_no: u64,
    pages: u64,
    strict: bool,
    complete: bool,
    truncated: bool,
    done: bool,
}

impl<R: BufRead> PageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::with_capacity(PAGE_BUFFER_CAPACITY),
            line: Vec::new(),
            line_no: 0,
            pages: 0,
            strict: false,
            complete: false,
            truncated: false,
            done: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Number of complete pages handed out so far.
    pub fn pages_read(&self) -> u64 {
        self.pages
    }

    /// True once the stream ended inside a page that was dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the next complete page buffer. The slice is valid until the next call.
    pub fn next_page(&mut self) -> ParseResult<Option<&str>> {
        if self.fill()? {
            Ok(Some(&self.buf))
        } else {
            Ok(None)
        }
    }

    /// Accumulates lines until a page closes (`true`) or the stream ends (`false`).
    fn fill(&mut self) -> ParseResult<bool> {
        if self.complete {
            self.buf.clear();
            self.complete = false;
        }
        if self.done {
            return Ok(false);
        }

        loop {
            self.line.clear();
            let read = match self.reader.read_until(b'\n', &mut self.line) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Err(ParseError::Io(e));
                }
            };

            if read == 0 {
                self.done = true;
                return self.finish();
            }
            self.line_no += 1;

            let closes = memchr::memmem::find(&self.line, PAGE_CLOSE.as_bytes()).is_some();
            self.buf.push_str(&String::from_utf8_lossy(&self.line));

            if closes {
                self.complete = true;
                self.pages += 1;
                return Ok(true);
            }
        }
    }

    fn finish(&mut self) -> ParseResult<bool> {
        if self.buf.is_empty() {
            return Ok(false);
        }

        let bytes = self.buf.len();
        if self.buf.contains(PAGE_OPEN) {
            self.truncated = true;
            if self.strict {
                self.buf.clear();
                return Err(ParseError::IncompleteRecord {
                    line: self.line_no,
                    bytes,
                });
            }
            warn!(
                line = self.line_no,
                bytes, "Stream ended inside a page; dropping trailing record"
            );
        } else {
            debug!(bytes, "Dropping trailing bytes after last page");
        }

        self.buf.clear();
        Ok(false)
    }
}

/// Yields owned page buffers, for handing pages to worker threads.
impl<R: BufRead> Iterator for PageReader<R> {
    type Item = ParseResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.fill() {
            Ok(true) => {
                self.complete = false;
                Some(Ok(std::mem::take(&mut self.buf)))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pages(input: &str) -> Vec<String> {
        PageReader::new(Cursor::new(input))
            .collect::<ParseResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn splits_on_closing_marker() {
        let input = "<page>\na\n</page>\n<page>\nb\n</page>\n";
        let out = pages(input);
        assert_eq!(out, vec!["<page>\na\n</page>\n", "<page>\nb\n</page>\n"]);
    }

    #[test]
    fn marker_mid_line_closes_page() {
        let input = "<page>x</page> trailing text\nnext line\n</page>\n";
        let out = pages(input);
        assert_eq!(out, vec!["<page>x</page> trailing text\n", "next line\n</page>\n"]);
    }

    #[test]
    fn last_line_without_newline_still_closes() {
        let out = pages("<page>\n</page>");
        assert_eq!(out, vec!["<page>\n</page>"]);
    }

    #[test]
    fn trailing_page_is_dropped() {
        let mut reader = PageReader::new(Cursor::new("<page>\n</page>\n<page>\nunfinished\n"));
        assert!(reader.next_page().unwrap().is_some());
        assert!(reader.next_page().unwrap().is_none());
        assert!(reader.truncated());
        assert_eq!(reader.pages_read(), 1);
    }

    #[test]
    fn trailing_footer_is_not_truncation() {
        let mut reader = PageReader::new(Cursor::new("<page>\n</page>\n</mediawiki>\n"));
        assert!(reader.next_page().unwrap().is_some());
        assert!(reader.next_page().unwrap().is_none());
        assert!(!reader.truncated());
    }

    #[test]
    fn strict_mode_reports_incomplete_record() {
        let mut reader =
            PageReader::new(Cursor::new("<page>\n</page>\n<page>\nhalf\n")).strict(true);
        assert!(reader.next_page().unwrap().is_some());
        match reader.next_page() {
            Err(ParseError::IncompleteRecord { line, bytes }) => {
                assert_eq!(line, 4);
                assert_eq!(bytes, "<page>\nhalf\n".len());
            }
            other => panic!("expected incomplete record, got {:?}", other.map(|p| p.is_some())),
        }
        assert!(reader.next_page().unwrap().is_none());
    }

    #[test]
    fn strict_mode_accepts_clean_end() {
        let input = Cursor::new("<page>\n</page>\n</mediawiki>\n");
        let mut reader = PageReader::new(input).strict(true);
        assert!(reader.next_page().unwrap().is_some());
        assert!(reader.next_page().unwrap().is_none());
    }

    #[test]
    fn buffer_is_reset_between_pages() {
        let mut reader = PageReader::new(Cursor::new("one\n</page>\ntwo\n</page>\n"));
        assert_eq!(reader.next_page().unwrap(), Some("one\n</page>\n"));
        assert_eq!(reader.next_page().unwrap(), Some("two\n</page>\n"));
        assert_eq!(reader.next_page().unwrap(), None);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert!(pages("").is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let bytes: &[u8] = b"<title>caf\xff</title>\n</page>\n";
        let out = PageReader::new(Cursor::new(bytes))
            .collect::<ParseResult<Vec<_>>>()
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].contains('\u{FFFD}'));
    }

    #[test]
    fn open_dump_reads_plain_and_bz2() {
        use bzip2::write::BzEncoder;
        use bzip2::Compression;
        use std::io::{Read, Write};

        let dir = tempfile::TempDir::new().unwrap();
        let plain = dir.path().join("dump.xml");
        std::fs::write(&plain, "plain\n").unwrap();

        let compressed = dir.path().join("dump.xml.bz2");
        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"packed\n").unwrap();
        std::fs::write(&compressed, encoder.finish().unwrap()).unwrap();

        let mut text = String::new();
        open_dump(&plain).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "plain\n");

        text.clear();
        open_dump(&compressed).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "packed\n");
    }

    #[test]
    fn open_dump_missing_file_errors() {
        let err = open_dump(Path::new("/definitely/not/here.xml")).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to open dump"));
    }
}

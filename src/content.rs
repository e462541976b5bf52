use crate::config::{HASH_END, HASH_START, TITLE_END, TITLE_START};
use crate::models::PageRecord;
use memchr::memmem;
use std::collections::BTreeSet;

/// Returns the text between the first `start` and the first `end` that follows it.
///
/// Empty when either delimiter is missing. No nesting, no repeated pairs: first match wins.
pub fn field_span<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let bytes = text.as_bytes();
    let Some(open) = memmem::find(bytes, start.as_bytes()) else {
        return "";
    };
    let from = open + start.len();
    match memmem::find(&bytes[from..], end.as_bytes()) {
        Some(len) => &text[from..from + len],
        None => "",
    }
}

/// Finds `[[...]]` links: two opening brackets, a non-empty run of characters that are
/// neither `]` nor a newline, two closing brackets. Matches never overlap and are
/// reported left to right, brackets included.
pub struct LinkScanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LinkScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for LinkScanner<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();

        while let Some(offset) = memmem::find(&bytes[self.pos..], b"[[") {
            let open = self.pos + offset;
            let body = open + 2;
            let run_end = memchr::memchr2(b']', b'\n', &bytes[body..])
                .map_or(bytes.len(), |i| body + i);

            if run_end > body && bytes[run_end..].starts_with(b"]]") {
                self.pos = run_end + 2;
                return Some(&self.text[open..self.pos]);
            }
            // a later `[[` may still start a link, including one inside this run
            self.pos = open + 1;
        }

        self.pos = bytes.len();
        None
    }
}

/// Drops any `|display` suffix and upper-cases what remains.
pub fn normalize_target(target: &str) -> String {
    let target = match target.find('|') {
        Some(pipe) => &target[..pipe],
        None => target,
    };
    target.to_uppercase()
}

/// Normalizes a raw `[[target|display]]` match into its link-set form.
pub fn normalize_link(raw: &str) -> String {
    let inner = raw
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
        .unwrap_or(raw);
    normalize_target(inner)
}

/// All distinct normalized links on a page.
pub fn extract_links(text: &str) -> BTreeSet<String> {
    LinkScanner::new(text).map(normalize_link).collect()
}

/// Turns one complete page buffer into its output record.
///
/// Missing or unterminated `<title>`/`<sha1>` fields become empty strings; the page is
/// never rejected.
pub fn parse_page(page: &str) -> PageRecord {
    PageRecord {
        title: field_span(page, TITLE_START, TITLE_END).to_uppercase(),
        hash: field_span(page, HASH_START, HASH_END).to_string(),
        links: extract_links(page),
    }
}

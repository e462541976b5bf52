use std::io;

/// Failures surfaced by the streaming page reader.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Reading from the underlying stream failed.
    #[error("I/O error while reading dump: {0}")]
    Io(#[from] io::Error),

    /// Stream ended inside a page (strict mode only).
    #[error("incomplete record at end of stream (line {line}, {bytes} bytes buffered)")]
    IncompleteRecord { line: u64, bytes: usize },
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

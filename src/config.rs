/// Literal that closes a page record; checked per line
pub const PAGE_CLOSE: &str = "</page>";

/// Literal that opens a page record (only consulted in strict mode)
pub const PAGE_OPEN: &str = "<page>";

pub const TITLE_START: &str = "<title>";
pub const TITLE_END: &str = "</title>";
pub const HASH_START: &str = "<sha1>";
pub const HASH_END: &str = "</sha1>";

/// Framing line written at the head of every output record (without newline)
pub const RECORD_HEADER: &str = "<page>";

/// Auto-generated output names are `out_0.txt`, `out_1.txt`, ...
pub const OUTPUT_PREFIX: &str = "out_";
pub const OUTPUT_SUFFIX: &str = ".txt";

/// Reader/writer buffer sizes
pub const READ_BUFFER_SIZE: usize = 256 * 1024;
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Starting capacity for a page buffer; most articles fit without regrowth
pub const PAGE_BUFFER_CAPACITY: usize = 64 * 1024;

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Milestone log interval (one info line every N pages)
pub const MILESTONE_INTERVAL: u64 = 1_000_000;

/// Bump when the on-disk graph cache layout changes
pub const CACHE_VERSION: u32 = 1;

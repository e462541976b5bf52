use crate::config::{OUTPUT_PREFIX, OUTPUT_SUFFIX};
use std::path::{Path, PathBuf};
use tracing::debug;

/// First `out_N.txt` in `dir` that does not exist yet, counting up from zero.
pub fn next_output_path(dir: &Path) -> PathBuf {
    let mut n: u64 = 0;
    loop {
        let candidate = dir.join(format!("{}{}{}", OUTPUT_PREFIX, n, OUTPUT_SUFFIX));
        if !candidate.exists() {
            debug!(path = %candidate.display(), "Picked output path");
            return candidate;
        }
        n += 1;
    }
}

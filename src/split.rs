// src/split.rs

//! Input splitting for the word-count workflow.
//!
//! `split_evenly` cuts a text file into N parts of near-equal line counts;
//! `render_makefile` writes the Makefile that counts each part remotely and
//! sums the counts on the coordinator.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{DistmakeError, Result};
use crate::fs::FileSystem;

/// Line count of each part when `total` lines are split `parts` ways.
///
/// The first `total % parts` parts get one extra line.
pub fn part_sizes(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let extra = total % parts;
    (0..parts).map(|i| base + usize::from(i < extra)).collect()
}

/// Split `input` into `<out_dir>/<prefix>1.txt` … `<prefix>N.txt`.
///
/// Returns the paths written, in part order.
pub fn split_evenly(
    fs: &dyn FileSystem,
    input: &Path,
    parts: usize,
    prefix: &str,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if parts == 0 {
        return Err(DistmakeError::InvalidConfig(
            "number of parts must be at least 1".to_string(),
        ));
    }

    let text = fs.read_to_string(input)?;
    let lines: Vec<&str> = text.lines().collect();
    let sizes = part_sizes(lines.len(), parts);

    let mut written = Vec::with_capacity(parts);
    let mut offset = 0;
    for (idx, size) in sizes.into_iter().enumerate() {
        let path = out_dir.join(format!("{prefix}{}.txt", idx + 1));
        let mut body = String::new();
        for line in &lines[offset..offset + size] {
            body.push_str(line);
            body.push('\n');
        }
        offset += size;

        fs.write(&path, body.as_bytes())?;
        debug!(part = %path.display(), lines = size, "wrote part");
        written.push(path);
    }

    info!(
        input = %input.display(),
        lines = lines.len(),
        parts,
        "input split"
    );
    Ok(written)
}

/// Word-count Makefile over `parts` inputs named `<prefix>I.txt`.
pub fn render_makefile(parts: usize, prefix: &str) -> String {
    let counts: Vec<String> = (1..=parts).map(|i| format!("count{i}.txt")).collect();

    let mut out = String::new();
    let _ = writeln!(out, "total.txt: {}", counts.join(" "));
    let _ = writeln!(
        out,
        "\tcat {} | awk '{{s+=$1}} END {{print s}}' > total.txt",
        counts.join(" ")
    );
    for i in 1..=parts {
        let _ = writeln!(out);
        let _ = writeln!(out, "count{i}.txt: {prefix}{i}.txt");
        let _ = writeln!(out, "\twc -w < {prefix}{i}.txt > count{i}.txt");
    }
    out
}

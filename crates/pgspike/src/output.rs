use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Write `contents` to `path` through a temp file in the same directory,
/// renamed into place once fully written.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.path().display()))?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to persist report to {}", path.display()))?;
    Ok(())
}

/// First `lines` lines of the document, plus a note when the rest was cut.
pub fn preview(document: &str, lines: usize) -> Option<String> {
    if lines == 0 {
        return None;
    }
    let total = document.lines().count();
    let head: Vec<&str> = document.lines().take(lines).collect();
    let mut out = head.join("\n");
    if total > lines {
        out.push_str(&format!("\n\n... ({} more lines in full report)", total - lines));
    }
    Some(out)
}

pub fn print_preview(document: &str, lines: usize) {
    if let Some(text) = preview(document, lines) {
        println!("{text}");
    }
}

//! Per-page output file names

use std::path::{Path, PathBuf};

/// Derive the file for page `index` of `count` from a destination path
///
/// Single-page diagrams keep the destination as is. Otherwise `-page<N>`
/// (1-based) goes between the stem and the extension:
/// `out/flow.png` becomes `out/flow-page2.png` for index 1.
pub fn page_file_name(destination: &Path, index: u32, count: u32) -> PathBuf {
    if count <= 1 {
        return destination.to_path_buf();
    }

    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!("{}-page{}.{}", stem, index + 1, ext.to_string_lossy()),
        None => format!("{}-page{}", stem, index + 1),
    };
    destination.with_file_name(name)
}

/// Replace (or add) the extension of a path
pub fn with_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

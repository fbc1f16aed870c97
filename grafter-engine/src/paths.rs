//! Deterministic output naming.
//!
//! Output filenames embed a short hash of the input's absolute path so that
//! same-named inputs from different directories never collide in the shared
//! output directory, while staying stable across runs.

use std::path::Path;

/// Length of the path hash embedded in output filenames.
pub const PATH_HASH_LEN: usize = 6;

/// Marker segment in generated filenames.
pub const GENERATED_SEGMENT: &str = "generated";

/// Extension used when the input has none.
const DEFAULT_EXTENSION: &str = "toml";

/// Short, deterministic hash of an input path.
pub fn path_hash(input: &Path) -> String {
    let digest = blake3::hash(input.to_string_lossy().as_bytes());
    digest.to_hex()[..PATH_HASH_LEN].to_string()
}

/// The output filename for an input path:
/// `<input-base-name>.<path-hash>.generated.<ext>`.
pub fn output_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    let extension = input
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!(
        "{stem}.{hash}.{GENERATED_SEGMENT}.{extension}",
        hash = path_hash(input)
    )
}

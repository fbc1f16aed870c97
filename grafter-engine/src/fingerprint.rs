//! Consulted-asset fingerprinting and staleness tests.
//!
//! The fingerprint side-file records every plugin module path consulted
//! during generation, one absolute path per line, sorted case-insensitively.
//! It is human-readable and safe to delete to force full regeneration.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name of the fingerprint side-file within the output directory.
pub const FINGERPRINT_FILE_NAME: &str = "grafter.input-modules.txt";

/// The newest modification time among the assets recorded in the
/// fingerprint file. Missing files (deleted plugins, a first run) are
/// skipped; `None` means no recorded asset exists on disk.
pub fn newest_asset_mtime(list_path: &Path) -> Option<SystemTime> {
    let contents = std::fs::read_to_string(list_path).ok()?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| std::fs::metadata(line.trim()).ok())
        .filter_map(|meta| meta.modified().ok())
        .max()
}

/// Persist the union of the previously recorded assets and `consulted`.
///
/// The union matters: an incremental pass that skipped up-to-date files
/// resolves fewer modules than a full pass did, and forgetting the unused
/// ones would blind the next staleness check to their changes.
pub fn save_consulted(list_path: &Path, consulted: &[PathBuf]) -> io::Result<()> {
    let mut paths: Vec<String> = Vec::new();

    if let Ok(existing) = std::fs::read_to_string(list_path) {
        paths.extend(
            existing
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string()),
        );
    }
    paths.extend(consulted.iter().map(|p| p.to_string_lossy().into_owned()));

    paths.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    paths.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());

    let mut contents = paths.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    std::fs::write(list_path, contents)
}

/// Staleness test for one input/output pair.
///
/// The output is stale if it does not exist, if the input was modified
/// after it, or if any consulted asset was modified after it.
pub fn is_stale(input: &Path, output: &Path, assets_mtime: Option<SystemTime>) -> bool {
    let Ok(output_meta) = std::fs::metadata(output) else {
        return true;
    };
    let Ok(output_mtime) = output_meta.modified() else {
        return true;
    };

    let input_mtime = std::fs::metadata(input).and_then(|meta| meta.modified()).ok();
    if let Some(input_mtime) = input_mtime {
        if input_mtime > output_mtime {
            return true;
        }
    }

    if let Some(assets_mtime) = assets_mtime {
        if assets_mtime > output_mtime {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .expect("file should open");
        file.set_modified(time).expect("mtime should be settable");
    }

    #[test]
    fn test_missing_output_is_stale() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.toml");
        fs::write(&input, "").unwrap();

        assert!(is_stale(&input, &temp.path().join("out.toml"), None));
    }

    #[test]
    fn test_newer_input_is_stale() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.toml");
        let output = temp.path().join("out.toml");
        fs::write(&input, "").unwrap();
        fs::write(&output, "").unwrap();

        let base = SystemTime::now();
        set_mtime(&output, base);
        set_mtime(&input, base + Duration::from_secs(5));
        assert!(is_stale(&input, &output, None));

        set_mtime(&input, base - Duration::from_secs(5));
        assert!(!is_stale(&input, &output, None));
    }

    #[test]
    fn test_newer_asset_is_stale() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.toml");
        let output = temp.path().join("out.toml");
        fs::write(&input, "").unwrap();
        fs::write(&output, "").unwrap();

        let base = SystemTime::now();
        set_mtime(&input, base - Duration::from_secs(10));
        set_mtime(&output, base);

        assert!(is_stale(&input, &output, Some(base + Duration::from_secs(5))));
        assert!(!is_stale(&input, &output, Some(base - Duration::from_secs(5))));
    }

    #[test]
    fn test_save_consulted_unions_and_sorts() {
        let temp = TempDir::new().unwrap();
        let list = temp.path().join(FINGERPRINT_FILE_NAME);

        fs::write(&list, "/plugins/Zeta.so\n/plugins/alpha.so\n").unwrap();

        save_consulted(
            &list,
            &[
                PathBuf::from("/plugins/beta.so"),
                PathBuf::from("/plugins/ALPHA.so"),
            ],
        )
        .unwrap();

        let contents = fs::read_to_string(&list).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines, vec!["/plugins/alpha.so", "/plugins/beta.so", "/plugins/Zeta.so"]);
    }

    #[test]
    fn test_newest_asset_mtime_skips_missing_entries() {
        let temp = TempDir::new().unwrap();
        let list = temp.path().join(FINGERPRINT_FILE_NAME);
        let asset = temp.path().join("plugin.so");
        fs::write(&asset, "").unwrap();

        let marker = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&asset, marker);

        fs::write(
            &list,
            format!("{}\n/definitely/not/there.so\n", asset.display()),
        )
        .unwrap();

        let newest = newest_asset_mtime(&list).expect("asset should be found");
        let delta = newest
            .duration_since(marker)
            .unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(2));
    }

    #[test]
    fn test_newest_asset_mtime_missing_list() {
        let temp = TempDir::new().unwrap();
        assert!(newest_asset_mtime(&temp.path().join("absent.txt")).is_none());
    }
}

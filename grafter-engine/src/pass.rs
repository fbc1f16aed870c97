//! The incremental build orchestrator.
//!
//! A [`GenerationPass`] walks the project's input files, decides per file
//! whether regeneration is needed, transforms the stale ones, and persists
//! the consulted-asset fingerprint for the next run's staleness checks.
//! Per-file failures are collected rather than thrown, so the pass
//! completes as much work as possible.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grafter_model::{CompilationInfo, Document, SemanticModel};
use grafter_plugin::{Diagnostic, DiagnosticSink};
use indexmap::IndexMap;

use crate::cancel::CancellationToken;
use crate::error::{FileError, FileFailure, PassError, TransformError};
use crate::fingerprint::{self, FINGERPRINT_FILE_NAME};
use crate::paths;
use crate::resolver::PluginHost;
use crate::scanner::TargetKinds;
use crate::transform::{DocumentTransform, TransformOptions};

const WRITE_RETRIES: u32 = 3;
const WRITE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Configuration for one generation pass.
#[derive(Debug, Default)]
pub struct GenerationPass {
    /// Paths of the input files to transform.
    pub inputs: Vec<PathBuf>,
    /// Paths of reference assets (searched for generator modules before
    /// the search directories).
    pub reference_paths: Vec<PathBuf>,
    /// Directories to search for generator modules, in order.
    pub generator_search_paths: Vec<PathBuf>,
    /// Directory receiving generated files and the fingerprint side-file.
    pub output_dir: PathBuf,
    /// Directory containing the project file.
    pub project_dir: PathBuf,
    /// Build properties exposed to generators.
    pub properties: IndexMap<String, String>,
    /// Declaration shapes accepted as generation targets.
    pub targets: TargetKinds,
}

/// What a pass produced.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Output path of every input, whether regenerated or already up to
    /// date.
    pub generated: Vec<PathBuf>,
    /// The subset of regenerated outputs containing no type declarations.
    pub empty: Vec<PathBuf>,
    /// Collected per-file failures. Outputs of non-failing files are on
    /// disk even when this is non-empty.
    pub failures: Vec<FileFailure>,
}

impl PassReport {
    /// True if no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

struct FileOutcome {
    no_types: bool,
    failed_entries: Vec<String>,
}

enum GenerateFileError {
    Cancelled,
    File(FileError),
}

impl GenerationPass {
    /// Create a pass writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Run the pass with a host built from the configured search spaces.
    pub fn run(
        &self,
        sink: &dyn DiagnosticSink,
        cancel: &CancellationToken,
    ) -> Result<PassReport, PassError> {
        let mut host = PluginHost::new(
            self.reference_paths.iter().cloned(),
            self.generator_search_paths.iter().cloned(),
        );
        self.run_with_host(&mut host, sink, cancel)
    }

    /// Run the pass against a caller-supplied host (e.g. one with builtin
    /// modules registered).
    pub fn run_with_host(
        &self,
        host: &mut PluginHost,
        sink: &dyn DiagnosticSink,
        cancel: &CancellationToken,
    ) -> Result<PassReport, PassError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(PassError::Config("output directory must be set".to_string()));
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|source| PassError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut failures: Vec<FileFailure> = Vec::new();

        // Parse the whole compilation up front so directive bindings
        // declared in any document are visible to every document.
        let mut documents = Vec::new();
        for input in &self.inputs {
            if cancel.is_cancelled() {
                return Err(PassError::Cancelled);
            }
            match Document::open(input) {
                Ok(document) => documents.push(document),
                Err(error) => failures.push(FileFailure {
                    path: input.clone(),
                    error: FileError::FrontEnd(error),
                }),
            }
        }

        let model = SemanticModel::from_documents(&documents);
        let compilation = CompilationInfo {
            reference_paths: self.reference_paths.clone(),
            input_paths: documents.iter().map(|doc| doc.path.clone()).collect(),
        };
        let options = TransformOptions {
            project_dir: self.project_dir.clone(),
            properties: self.properties.clone(),
            targets: self.targets.clone(),
        };

        let fingerprint_path = self.output_dir.join(FINGERPRINT_FILE_NAME);
        let assets_mtime = fingerprint::newest_asset_mtime(&fingerprint_path);

        let mut generated = Vec::new();
        let mut empty = Vec::new();

        for document in &documents {
            if cancel.is_cancelled() {
                return Err(PassError::Cancelled);
            }

            sink.report(Diagnostic::info(format!(
                "file \"{}\" hashed to {}",
                document.path.display(),
                paths::path_hash(&document.path)
            )));
            let output_path = self.output_dir.join(paths::output_file_name(&document.path));

            // Generation is relatively fast, but it's not free; skip files
            // whose inputs and consulted modules haven't changed.
            if fingerprint::is_stale(&document.path, &output_path, assets_mtime) {
                let generated_one = self.generate_file(
                    document,
                    &output_path,
                    host,
                    &model,
                    &compilation,
                    &options,
                    sink,
                    cancel,
                );
                match generated_one {
                    Ok(outcome) => {
                        if outcome.no_types {
                            empty.push(output_path.clone());
                        }
                        if !outcome.failed_entries.is_empty() {
                            failures.push(FileFailure {
                                path: document.path.clone(),
                                error: FileError::Declarations {
                                    messages: outcome.failed_entries,
                                },
                            });
                        }
                    }
                    Err(GenerateFileError::Cancelled) => return Err(PassError::Cancelled),
                    Err(GenerateFileError::File(error)) => failures.push(FileFailure {
                        path: document.path.clone(),
                        error,
                    }),
                }
            }

            generated.push(output_path);
        }

        fingerprint::save_consulted(&fingerprint_path, host.consulted()).map_err(|source| {
            PassError::Io {
                path: fingerprint_path.clone(),
                source,
            }
        })?;

        Ok(PassReport {
            generated,
            empty,
            failures,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_file(
        &self,
        document: &Document,
        output_path: &Path,
        host: &mut PluginHost,
        model: &SemanticModel,
        compilation: &CompilationInfo,
        options: &TransformOptions,
        sink: &dyn DiagnosticSink,
        cancel: &CancellationToken,
    ) -> Result<FileOutcome, GenerateFileError> {
        let mut retries_left = WRITE_RETRIES;
        loop {
            let outcome = DocumentTransform::new(host, model, compilation, options)
                .transform(document, sink, cancel)
                .map_err(|err| match err {
                    TransformError::Cancelled => GenerateFileError::Cancelled,
                    err @ TransformError::Invocation { .. } => {
                        GenerateFileError::File(FileError::Transform(err))
                    }
                })?;

            match write_output(output_path, &outcome.document) {
                Ok(()) => {
                    return Ok(FileOutcome {
                        no_types: outcome.document.has_no_types(),
                        failed_entries: outcome.failed_entries,
                    });
                }
                Err(source) if is_transient(&source) && retries_left > 0 => {
                    retries_left -= 1;
                    std::thread::sleep(WRITE_RETRY_DELAY);
                }
                Err(source) => {
                    return Err(GenerateFileError::File(FileError::Write {
                        path: output_path.to_path_buf(),
                        source,
                    }));
                }
            }
        }
    }
}

fn write_output(path: &Path, document: &Document) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, document.to_toml())
}

/// Another process holding the output open shows up as one of these kinds;
/// anything else is treated as terminal immediately.
fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::SystemTime;

    use grafter_plugin::CollectingSink;
    use tempfile::TempDir;

    use super::*;
    use crate::testing::sample_host;

    const DIRECTIVES: &str = r#"
[directives]
EmptyPartial = { module = "sample_generators", generator = "empty_partial" }
DuplicateWithSuffix = { module = "sample_generators", generator = "duplicate_with_suffix" }
Failing = { module = "sample_generators", generator = "failing" }
"#;

    fn write_input(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        // Top-level keys in the body must precede the directives table.
        fs::write(&path, format!("{body}\n{DIRECTIVES}")).expect("input should write");
        path
    }

    fn suffix_body(type_name: &str) -> String {
        format!(
            r#"
[[members]]
decl = "namespace"
name = "Testing"

[[members.members]]
decl = "type"
kind = "record"
name = "{type_name}"

[[members.members.annotations]]
name = "DuplicateWithSuffix"
args = ["A"]
"#
        )
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .expect("file should open");
        file.set_modified(time).expect("mtime should be settable");
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .expect("mtime should be readable")
    }

    fn run_pass(pass: &GenerationPass) -> PassReport {
        let mut host = sample_host();
        let sink = CollectingSink::new();
        pass.run_with_host(&mut host, &sink, &CancellationToken::new())
            .expect("pass should run")
    }

    #[test]
    fn test_end_to_end_generation() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "widgets.toml", &suffix_body("Foo"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input.clone()];
        let report = run_pass(&pass);

        assert!(report.is_success());
        assert_eq!(report.generated.len(), 1);
        assert!(report.empty.is_empty());

        let output = &report.generated[0];
        let name = output.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("widgets."));
        assert!(name.ends_with(".generated.toml"));

        let generated = Document::open(output).expect("output should re-parse");
        assert_eq!(generated.members[0].name(), "Testing");
        assert_eq!(generated.members[0].members()[0].name(), "FooA");
        assert!(generated.directives.is_empty());
    }

    #[test]
    fn test_empty_generated_file_classification() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "bare.toml", "imports = [\"System\"]");
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input];
        let report = run_pass(&pass);

        assert!(report.is_success());
        assert_eq!(report.empty, report.generated);

        let generated = Document::open(&report.generated[0]).expect("output should re-parse");
        assert_eq!(generated.imports.len(), 1);
        assert!(generated.members.is_empty());
    }

    #[test]
    fn test_up_to_date_outputs_are_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "widgets.toml", &suffix_body("Foo"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input.clone()];

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&input, base);

        let report = run_pass(&pass);
        let output = report.generated[0].clone();
        let first_contents = fs::read_to_string(&output).unwrap();
        set_mtime(&output, base + Duration::from_secs(60));
        let unchanged = mtime(&output);

        // Input older than output, no consulted assets changed.
        let report = run_pass(&pass);
        assert!(report.is_success());
        assert_eq!(mtime(&output), unchanged);

        // Touching the input forces regeneration with identical bytes.
        set_mtime(&input, SystemTime::now());
        let report = run_pass(&pass);
        assert!(report.is_success());
        assert_ne!(mtime(&output), unchanged);
        assert_eq!(fs::read_to_string(&output).unwrap(), first_contents);
    }

    #[test]
    fn test_consulted_asset_change_forces_regeneration() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "widgets.toml", &suffix_body("Foo"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input.clone()];

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&input, base);

        let report = run_pass(&pass);
        let output = report.generated[0].clone();
        set_mtime(&output, base + Duration::from_secs(60));
        let stamped = mtime(&output);

        // Record a plugin asset that is newer than the output.
        let asset = temp.path().join("libfake_plugin.so");
        fs::write(&asset, "").unwrap();
        fs::write(
            out_dir.join(FINGERPRINT_FILE_NAME),
            format!("{}\n", asset.display()),
        )
        .unwrap();

        let report = run_pass(&pass);
        assert!(report.is_success());
        assert_ne!(mtime(&output), stamped);
    }

    #[test]
    fn test_partial_failure_isolation() {
        let temp = TempDir::new().unwrap();
        let good = write_input(temp.path(), "good.toml", &suffix_body("Foo"));
        let bad = write_input(
            temp.path(),
            "bad.toml",
            r#"
[[members]]
decl = "type"
kind = "record"
name = "Broken"

[[members.annotations]]
name = "Failing"
"#,
        );
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![good.clone(), bad.clone()];
        let report = run_pass(&pass);

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, bad);
        assert!(matches!(
            report.failures[0].error,
            FileError::Transform(TransformError::Invocation { .. })
        ));

        // The good file's output is on disk; the bad file's is not.
        assert!(report.generated[0].exists());
        assert!(!report.generated[1].exists());
    }

    #[test]
    fn test_unparsable_input_is_a_per_file_failure() {
        let temp = TempDir::new().unwrap();
        let good = write_input(temp.path(), "good.toml", &suffix_body("Foo"));
        let bad = temp.path().join("mangled.toml");
        fs::write(&bad, "members = 3").unwrap();
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![good, bad.clone()];
        let report = run_pass(&pass);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, bad);
        assert!(matches!(report.failures[0].error, FileError::FrontEnd(_)));
        assert!(report.generated[0].exists());
    }

    #[test]
    fn test_cancellation_is_distinct_and_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "widgets.toml", &suffix_body("Foo"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input];

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut host = sample_host();
        let sink = CollectingSink::new();
        let result = pass.run_with_host(&mut host, &sink, &cancel);
        assert!(matches!(result, Err(PassError::Cancelled)));
        assert!(!out_dir.join(FINGERPRINT_FILE_NAME).exists());
    }

    #[test]
    fn test_fingerprint_file_is_written() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "widgets.toml", &suffix_body("Foo"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input];
        run_pass(&pass);

        assert!(out_dir.join(FINGERPRINT_FILE_NAME).exists());
    }

    #[test]
    fn test_same_file_name_in_two_directories() {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        fs::create_dir_all(&dir_a).unwrap();
        fs::create_dir_all(&dir_b).unwrap();
        let first = write_input(&dir_a, "widgets.toml", &suffix_body("Foo"));
        let second = write_input(&dir_b, "widgets.toml", &suffix_body("Bar"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![first, second];
        let report = run_pass(&pass);

        assert!(report.is_success());
        assert_ne!(report.generated[0], report.generated[1]);
        assert!(report.generated[0].exists());
        assert!(report.generated[1].exists());
    }

    #[test]
    fn test_unwritable_output_is_a_write_failure() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "widgets.toml", &suffix_body("Foo"));
        let out_dir = temp.path().join("generated");

        let mut pass = GenerationPass::new(&out_dir);
        pass.inputs = vec![input.clone()];

        // Occupy the output path with a directory so the write fails with
        // a non-transient error.
        let output_name = paths::output_file_name(&input);
        fs::create_dir_all(out_dir.join(&output_name)).unwrap();

        let report = run_pass(&pass);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, FileError::Write { .. }));
    }

    #[test]
    fn test_transient_error_classification() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn test_missing_output_dir_config() {
        let pass = GenerationPass::default();
        let mut host = sample_host();
        let sink = CollectingSink::new();
        let result = pass.run_with_host(&mut host, &sink, &CancellationToken::new());
        assert!(matches!(result, Err(PassError::Config(_))));
    }
}

use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use grafter_engine::{
    CancellationToken, DocumentTransform, GenerationPass, PassError, PluginHost, TargetKinds,
    TransformOptions,
};
use grafter_model::{CompilationInfo, Document, Renderer, SemanticModel};
use grafter_plugin::{Diagnostic, DiagnosticSink, Severity};
use indexmap::IndexMap;

#[derive(Parser)]
#[command(name = "grafter")]
#[command(version)]
#[command(about = "Run generator plugins over declaration documents")]
pub(crate) struct Cli {
    /// Source documents included in the transformation
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<String>,

    /// Paths to reference assets searched for generator modules
    #[arg(short = 'r', long = "reference", value_name = "PATH")]
    references: Vec<String>,

    /// Folders that may contain generator modules
    #[arg(long = "generator-search-path", value_name = "DIR")]
    generator_search_paths: Vec<String>,

    /// The directory to write generated files to
    #[arg(long = "out", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// The absolute path of the directory where the project file is located
    #[arg(long = "project-dir", value_name = "DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Build properties exposed to generators
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Write the list of generated files to this path, one per line
    #[arg(long = "generated-files-list", value_name = "FILE")]
    generated_files_list: Option<PathBuf>,

    /// Emit diagnostics as JSON lines (for build-tool adapters)
    #[arg(long = "diagnostics-json")]
    diagnostics_json: bool,

    /// Render transformed documents to stdout without writing files
    #[arg(long = "dry-run")]
    dry_run: bool,
}

impl Cli {
    /// Run the transformation as configured on the command line.
    pub fn run(&self) -> Result<()> {
        let inputs = sanitize(&self.inputs);
        if inputs.is_empty() {
            eprintln!("no source files are specified");
            std::process::exit(1);
        }

        if self.dry_run {
            return self.run_preview(&inputs);
        }

        let Some(output_dir) = &self.output_dir else {
            eprintln!("the output directory must be specified");
            std::process::exit(2);
        };

        let pass = GenerationPass {
            inputs,
            reference_paths: sanitize(&self.references),
            generator_search_paths: sanitize(&self.generator_search_paths),
            output_dir: output_dir.clone(),
            project_dir: self.project_dir.clone(),
            properties: self.properties.iter().cloned().collect(),
            targets: TargetKinds::default(),
        };

        let sink = ConsoleSink {
            json: self.diagnostics_json,
        };
        let report = match pass.run(&sink, &CancellationToken::new()) {
            Ok(report) => report,
            Err(PassError::Cancelled) => {
                eprintln!("generation cancelled");
                std::process::exit(4);
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(list_path) = &self.generated_files_list {
            let mut lines = report
                .generated
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n");
            if !lines.is_empty() {
                lines.push('\n');
            }
            std::fs::write(list_path, lines)?;
        }

        for file in &report.generated {
            println!("{}", file.display());
        }

        if !report.is_success() {
            for failure in &report.failures {
                eprintln!("{failure}");
            }
            std::process::exit(3);
        }

        Ok(())
    }

    /// Transform in memory and print the rendered documents.
    fn run_preview(&self, inputs: &[PathBuf]) -> Result<()> {
        let mut documents = Vec::new();
        for input in inputs {
            match Document::open(input) {
                Ok(document) => documents.push(document),
                Err(err) => {
                    eprintln!("{:?}", miette::Report::new(*err));
                    std::process::exit(1);
                }
            }
        }

        let reference_paths = sanitize(&self.references);
        let model = SemanticModel::from_documents(&documents);
        let compilation = CompilationInfo {
            reference_paths: reference_paths.clone(),
            input_paths: documents.iter().map(|doc| doc.path.clone()).collect(),
        };
        let options = TransformOptions {
            project_dir: self.project_dir.clone(),
            properties: self.properties.iter().cloned().collect::<IndexMap<_, _>>(),
            targets: TargetKinds::default(),
        };
        let mut host = PluginHost::new(reference_paths, sanitize(&self.generator_search_paths));
        let sink = ConsoleSink {
            json: self.diagnostics_json,
        };
        let cancel = CancellationToken::new();
        let renderer = Renderer::new();

        for document in &documents {
            let outcome = DocumentTransform::new(&mut host, &model, &compilation, &options)
                .transform(document, &sink, &cancel)?;
            println!("── {} ──", document.path.display());
            println!("{}", renderer.render(&outcome.document));
        }

        Ok(())
    }
}

/// Trim surrounding whitespace and drop blank entries.
fn sanitize(values: &[String]) -> Vec<PathBuf> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_property(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, val)| (key.trim().to_string(), val.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))
}

/// Prints diagnostics as they arrive: progress on stdout, problems on
/// stderr, or JSON lines when requested.
struct ConsoleSink {
    json: bool,
}

impl DiagnosticSink for ConsoleSink {
    fn report(&self, diagnostic: Diagnostic) {
        if self.json {
            if let Ok(line) = serde_json::to_string(&diagnostic) {
                println!("{line}");
            }
        } else if diagnostic.severity == Severity::Info {
            println!("{diagnostic}");
        } else {
            eprintln!("{diagnostic}");
        }
    }
}

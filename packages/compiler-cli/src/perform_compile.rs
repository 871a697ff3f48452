//! Batch Compilation
//!
//! Resolves input patterns, compiles every template in parallel (one arena
//! document per input) and writes a single artifact mapping template names
//! to compiled templates.

use anyhow::Context;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use poirot_compiler::dom::ArenaDocument;
use poirot_compiler::logging::{ConsoleLogger, Logger};
use poirot_compiler::output::{emit_module, json};
use poirot_compiler::{CompiledTemplate, Compiler, CompilerConfig};

/// Artifact encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Js,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "js" => Some(OutputFormat::Js),
            _ => None,
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            OutputFormat::Json => "templates.json",
            OutputFormat::Js => "templates.js",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Paths or glob patterns.
    pub inputs: Vec<String>,
    pub out_dir: PathBuf,
    pub out_file: Option<String>,
    pub format: OutputFormat,
    /// Compile the remaining inputs after a failure and still write the
    /// artifact for the ones that succeeded.
    pub keep_going: bool,
    pub verbose: bool,
    pub config: CompilerConfig,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: PathBuf::from("."),
            out_file: None,
            format: OutputFormat::default(),
            keep_going: false,
            verbose: false,
            config: CompilerConfig::default(),
        }
    }
}

impl CompileOptions {
    pub fn output_path(&self) -> PathBuf {
        let file = self
            .out_file
            .as_deref()
            .unwrap_or_else(|| self.format.default_file_name());
        self.out_dir.join(file)
    }
}

/// A problem with one input, or with the run as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    fn new(file: Option<&Path>, message: impl Into<String>) -> Self {
        Diagnostic {
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "error: {} ({})", self.message, file.display()),
            None => write!(f, "error: {}", self.message),
        }
    }
}

#[derive(Debug, Default)]
pub struct CompilationResult {
    pub templates: IndexMap<String, CompiledTemplate>,
    pub diagnostics: Vec<Diagnostic>,
    /// Artifact written, if any.
    pub output: Option<PathBuf>,
}

/// Expand input patterns into files, in pattern order without duplicates.
pub fn discover_inputs(patterns: &[String]) -> (Vec<PathBuf>, Vec<Diagnostic>) {
    let mut files = IndexSet::new();
    let mut diagnostics = Vec::new();

    for pattern in patterns {
        let literal = Path::new(pattern);
        if literal.is_file() {
            files.insert(literal.to_path_buf());
            continue;
        }
        match glob::glob(pattern) {
            Ok(paths) => {
                let before = files.len();
                for path in paths.flatten() {
                    if path.is_file() {
                        files.insert(path);
                    }
                }
                if files.len() == before {
                    diagnostics.push(Diagnostic::new(
                        None,
                        format!("No input matches '{}'", pattern),
                    ));
                }
            }
            Err(e) => diagnostics.push(Diagnostic::new(
                None,
                format!("Invalid glob pattern '{}': {}", pattern, e),
            )),
        }
    }

    (files.into_iter().collect(), diagnostics)
}

/// Template name of an input: its file stem.
pub fn template_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn compile_file(compiler: &Compiler, path: &Path) -> anyhow::Result<CompiledTemplate> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let url = path.display().to_string();
    let mut doc = ArenaDocument::new().with_url(url.clone());
    compiler
        .compile(&mut doc, &source, &url)
        .with_context(|| format!("Failed to compile {}", path.display()))
}

pub fn render_artifact(
    format: OutputFormat,
    templates: &IndexMap<String, CompiledTemplate>,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(json::bundle_to_json(templates)?),
        OutputFormat::Js => Ok(emit_module(templates)),
    }
}

pub fn write_output(
    options: &CompileOptions,
    templates: &IndexMap<String, CompiledTemplate>,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("Failed to create {}", options.out_dir.display()))?;
    let path = options.output_path();
    let artifact = render_artifact(options.format, templates)?;
    fs::write(&path, artifact).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Compile every input and write the aggregate artifact. Without
/// `keep_going` the first failing input stops the run and nothing is written.
pub fn perform_compilation(options: &CompileOptions) -> CompilationResult {
    let config = options
        .config
        .clone()
        .with_verbose(options.verbose || options.config.verbose);
    let logger: Arc<dyn Logger> =
        Arc::new(ConsoleLogger::for_config(&config).with_source("poirotc"));
    let mut result = CompilationResult::default();

    let (files, diagnostics) = discover_inputs(&options.inputs);
    result.diagnostics = diagnostics;
    if !result.diagnostics.is_empty() && !options.keep_going {
        return result;
    }

    let compiler = Compiler::new(config).with_logger(logger.clone());

    let outcomes: Vec<(PathBuf, anyhow::Result<CompiledTemplate>)> = files
        .par_iter()
        .map(|path| (path.clone(), compile_file(&compiler, path)))
        .collect();

    for (path, outcome) in outcomes {
        match outcome {
            Ok(compiled) => {
                let name = template_name(&path);
                if result.templates.contains_key(&name) {
                    result.diagnostics.push(Diagnostic::new(
                        Some(&path),
                        format!("Duplicate template name '{}'", name),
                    ));
                    continue;
                }
                logger.debug(&format!("compiled {} as '{}'", path.display(), name));
                result.templates.insert(name, compiled);
            }
            Err(err) => {
                result
                    .diagnostics
                    .push(Diagnostic::new(Some(&path), format!("{:#}", err)));
                if !options.keep_going {
                    return result;
                }
            }
        }
    }

    if result.templates.is_empty() {
        if result.diagnostics.is_empty() {
            result
                .diagnostics
                .push(Diagnostic::new(None, "No templates to compile"));
        }
        return result;
    }

    match write_output(options, &result.templates) {
        Ok(path) => {
            logger.info(&format!(
                "Compiled {} templates into {}",
                result.templates.len(),
                path.display()
            ));
            result.output = Some(path);
        }
        Err(err) => result
            .diagnostics
            .push(Diagnostic::new(None, format!("{:#}", err))),
    }
    result
}

pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for diag in diagnostics {
        output.push_str(&diag.to_string());
        output.push('\n');
    }
    output
}

pub fn exit_code_from_result(result: &CompilationResult) -> i32 {
    if result.diagnostics.is_empty() {
        0
    } else {
        1
    }
}

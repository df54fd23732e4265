//! Markdown API documentation via `protoc-gen-doc`.
//!
//! Runs the plugin skeleton with a fixed `--doc_out`/`--doc_opt` set, using the
//! bundled template when it can be written next to the output, then strips the
//! "Scalar Value Types" reference table from the resulting `index.md`.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::plugin::{out_flag, proto_path_flag, PluginArgs, PluginGenerator, PROTOC};
use super::{ensure_output_dir, Generator};
use crate::command::{CancelSignal, CommandRunner};
use crate::discovery::find_proto_files;
use crate::error::{GeneratorError, ValidationError};
use crate::input::{GeneratorInput, GeneratorOutput};
use crate::sdk::SdkTag;
use crate::validate::validate_plugin_input;

/// Name of the generated markdown file inside the output root.
pub const INDEX_FILE: &str = "index.md";

/// File name the bundled template is materialised under, inside the output root.
pub const TEMPLATE_FILE: &str = ".doc-template.tmpl";

pub const BUNDLED_TEMPLATE: &str = include_str!("../../templates/markdown.tmpl");

/// `protoc-gen-doc` arguments, with or without a custom template.
struct DocArgs {
    template: Option<PathBuf>,
}

impl PluginArgs for DocArgs {
    fn tag(&self) -> SdkTag {
        SdkTag::Documentation
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        let format = match &self.template {
            Some(template) => template.display().to_string(),
            None => "markdown".to_string(),
        };
        let mut args = vec![
            proto_path_flag(&input.repo_path),
            out_flag("doc", &input.output_path),
            format!("--doc_opt={format},{INDEX_FILE}"),
        ];
        args.extend(
            input
                .proto_files
                .iter()
                .map(|file| file.to_string_lossy().into_owned()),
        );
        args
    }
}

fn is_heading(line: &str) -> bool {
    line.starts_with('#')
}

fn is_scalar_types_heading(line: &str) -> bool {
    is_heading(line) && line.to_lowercase().contains("scalar value type")
}

/// Removes every section whose heading mentions "scalar value type(s)", up to
/// (not including) the next heading of any level. Line endings and the
/// presence or absence of a final newline are kept as in `content`.
/// Idempotent.
pub fn strip_scalar_value_types(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut skipping = false;
    for line in content.split_inclusive('\n') {
        let text = line.trim_end_matches(['\n', '\r']);
        if is_heading(text) {
            skipping = is_scalar_types_heading(text);
        }
        if !skipping {
            out.push_str(line);
        }
    }
    if !content.ends_with('\n') && out.ends_with('\n') {
        out.pop();
        if out.ends_with('\r') {
            out.pop();
        }
    }
    out
}

pub struct DocsGenerator {
    runner: Arc<dyn CommandRunner>,
    program: String,
    template: Option<&'static str>,
}

impl DocsGenerator {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: PROTOC.to_string(),
            template: Some(BUNDLED_TEMPLATE),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Uses `protoc-gen-doc`'s built-in markdown layout instead of a template.
    pub fn without_template(mut self) -> Self {
        self.template = None;
        self
    }

    /// Writes the bundled template into `output`. Any failure means "no
    /// template"; generation proceeds with the default markdown format.
    fn materialize_template(&self, output: &Path) -> Option<PathBuf> {
        let template = self.template?;
        let path = output.join(TEMPLATE_FILE);
        match fs::write(&path, template) {
            Ok(()) => {
                debug!(path = %path.display(), "Materialised documentation template");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not write documentation template, using default markdown");
                None
            }
        }
    }

    fn clean_index(&self, output: &Path) -> Result<(), GeneratorError> {
        let index = output.join(INDEX_FILE);
        let content = fs::read_to_string(&index)
            .map_err(|e| GeneratorError::io("failed to read documentation", &index, e))?;
        let cleaned = strip_scalar_value_types(&content);
        if cleaned != content {
            fs::write(&index, cleaned)
                .map_err(|e| GeneratorError::io("failed to write documentation", &index, e))?;
            debug!(path = %index.display(), "Removed scalar value types section");
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for DocsGenerator {
    fn sdk_tag(&self) -> SdkTag {
        SdkTag::Documentation
    }

    fn is_applicable(&self, repo: &Path) -> bool {
        find_proto_files(repo).is_ok_and(|files| !files.is_empty())
    }

    fn validate(&self, input: &GeneratorInput) -> Result<(), ValidationError> {
        validate_plugin_input(input)
    }

    async fn generate(
        &self,
        input: &GeneratorInput,
        cancel: &CancelSignal,
    ) -> Result<GeneratorOutput, GeneratorError> {
        self.validate(input)?;
        ensure_output_dir(&input.output_path)?;

        let template = self.materialize_template(&input.output_path);
        info!(custom_template = template.is_some(), "Generating documentation");

        let output = PluginGenerator::new(DocArgs { template }, Arc::clone(&self.runner))
            .with_program(self.program.clone())
            .generate(input, cancel)
            .await?;

        self.clean_index(&output.output_path)?;
        Ok(output)
    }
}

//! Manifest-driven generation via `buf generate`.
//!
//! `buf` reads `buf.gen.yaml` itself and writes wherever the manifest says,
//! usually somewhere inside the repository. After it exits, the whole
//! repository is walked and everything that is not source material (schema
//! files, buf configuration, VCS metadata) is treated as generated output and
//! copied, path preserved, into the requested output root.
//!
//! Copying is not transactional: a failure halfway leaves the files copied so
//! far in place.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{ensure_output_dir, Generator};
use crate::command::{CancelSignal, CommandRunner};
use crate::discovery::{is_proto_file, is_vcs_dir, VCS_DIRS};
use crate::error::{GeneratorError, ValidationError};
use crate::input::{GeneratorInput, GeneratorOutput};
use crate::sdk::SdkTag;
use crate::validate::{clean_path, validate_manifest_input};

/// Default build tool executable.
pub const BUF: &str = "buf";

/// The generation manifest, looked up directly under the repository root.
pub const MANIFEST_FILE: &str = "buf.gen.yaml";

/// Shared prefix and extension of buf's configuration files
/// (`buf.yaml`, `buf.gen.yaml`, `buf.work.yaml`, ...).
const CONFIG_PREFIX: &str = "buf.";
const CONFIG_EXTENSION: &str = ".yaml";

/// True if `relative` (a path inside the repository) is source material rather
/// than generated output.
pub fn is_source_file(relative: &Path) -> bool {
    let in_vcs_dir = relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| VCS_DIRS.contains(&name))
    });
    if in_vcs_dir || is_proto_file(relative) {
        return true;
    }
    match relative.file_name().and_then(|name| name.to_str()) {
        Some(name) => {
            name == MANIFEST_FILE
                || (name.starts_with(CONFIG_PREFIX) && name.ends_with(CONFIG_EXTENSION))
        }
        None => false,
    }
}

fn resolve(path: &Path) -> Result<PathBuf, GeneratorError> {
    std::path::absolute(path)
        .map(|absolute| clean_path(&absolute))
        .map_err(|e| GeneratorError::io("failed to resolve path", path, e))
}

/// Each of `exclude` expressed relative to `repo`. Entries outside the
/// repository cannot contain harvested files and are dropped.
fn excluded_within(repo: &Path, exclude: &[PathBuf]) -> Result<Vec<PathBuf>, GeneratorError> {
    let root = resolve(repo)?;
    let mut within = Vec::new();
    for path in exclude {
        if let Ok(relative) = resolve(path)?.strip_prefix(&root) {
            within.push(relative.to_path_buf());
        }
    }
    Ok(within)
}

/// Walks `repo` and returns every generated file, relative to `repo` and
/// sorted. Files under any of `exclude` (output roots nested inside the
/// repository) are skipped. Relative and absolute spellings of the same
/// directory are treated alike.
pub fn collect_generated_files(
    repo: &Path,
    exclude: &[PathBuf],
) -> Result<Vec<PathBuf>, GeneratorError> {
    let excluded = excluded_within(repo, exclude)?;
    let mut files = Vec::new();
    let walker = WalkDir::new(repo)
        .into_iter()
        .filter_entry(|entry| !is_vcs_dir(entry));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(repo).to_path_buf();
            GeneratorError::io("failed to walk repository", path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(repo) else {
            continue;
        };
        let relative = clean_path(relative);
        if excluded.iter().any(|dir| relative.starts_with(dir)) {
            continue;
        }
        if !is_source_file(&relative) {
            files.push(relative);
        }
    }
    files.sort();
    Ok(files)
}

/// Copies `files` (relative to `from`) into `to`, preserving relative paths,
/// creating parent directories and overwriting existing files. Returns the
/// number of files copied.
pub fn copy_files(from: &Path, to: &Path, files: &[PathBuf]) -> Result<usize, GeneratorError> {
    for relative in files {
        let source = from.join(relative);
        let destination = to.join(relative);
        let content = fs::read(&source)
            .map_err(|e| GeneratorError::io("failed to read generated file", &source, e))?;
        if let Some(parent) = destination.parent() {
            ensure_output_dir(parent)?;
        }
        fs::write(&destination, content)
            .map_err(|e| GeneratorError::io("failed to write output file", &destination, e))?;
        debug!(file = %relative.display(), "Copied generated file");
    }
    Ok(files.len())
}

pub struct ManifestGenerator {
    runner: Arc<dyn CommandRunner>,
    program: String,
    excluded: Vec<PathBuf>,
}

impl ManifestGenerator {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: BUF.to_string(),
            excluded: Vec::new(),
        }
    }

    /// Never harvests files under `dir`, in addition to the request's own
    /// output root. Used when sibling generators write next to ours.
    pub fn with_excluded(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    /// Overrides the build tool executable (default `buf`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Generator for ManifestGenerator {
    fn sdk_tag(&self) -> SdkTag {
        SdkTag::Buf
    }

    fn is_applicable(&self, repo: &Path) -> bool {
        repo.join(MANIFEST_FILE).is_file()
    }

    fn validate(&self, input: &GeneratorInput) -> Result<(), ValidationError> {
        validate_manifest_input(input, MANIFEST_FILE)
    }

    async fn generate(
        &self,
        input: &GeneratorInput,
        cancel: &CancelSignal,
    ) -> Result<GeneratorOutput, GeneratorError> {
        self.validate(input)?;

        info!(program = %self.program, repo = %input.repo_path.display(), "Running buf generate");
        let args = vec!["generate".to_string()];
        self.runner
            .run(&self.program, &args, &input.repo_path, cancel)
            .await?;

        let repo = clean_path(&input.repo_path);
        let output_path = clean_path(&input.output_path);
        let mut excluded = self.excluded.clone();
        excluded.push(output_path.clone());
        let files = collect_generated_files(&repo, &excluded)?;
        debug!(files = files.len(), "Harvested generated files");

        ensure_output_dir(&output_path)?;
        let files_count = copy_files(&repo, &output_path, &files)?;

        info!(output = %output_path.display(), files = files_count, "Copied buf output");
        Ok(GeneratorOutput {
            output_path,
            files_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_buf_configuration_as_source() {
        for path in [
            "buf.gen.yaml",
            "buf.yaml",
            "buf.work.yaml",
            "nested/buf.yaml",
            "api/v1/user.proto",
            ".git/config",
        ] {
            assert!(is_source_file(Path::new(path)), "{path} should be source");
        }
    }

    #[test]
    fn classifies_other_files_as_generated() {
        for path in ["gen/go/user.pb.go", "buf.lock", "README.md", "mybuf.yaml"] {
            assert!(!is_source_file(Path::new(path)), "{path} should be generated");
        }
    }
}

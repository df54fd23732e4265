use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything a generator needs to know about one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorInput {
    /// Root of the schema repository. Tools run with this as working directory.
    pub repo_path: PathBuf,
    /// Where generated artifacts end up. Created if absent.
    pub output_path: PathBuf,
    /// Schema files relative to `repo_path`, in the order they are passed to the
    /// compiler. Ignored by the manifest-driven generator.
    pub proto_files: Vec<PathBuf>,
}

impl GeneratorInput {
    pub fn new(repo_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            output_path: output_path.into(),
            proto_files: Vec::new(),
        }
    }

    pub fn with_proto_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.proto_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Same request, redirected to a different output root.
    pub fn with_output_path(&self, output_path: impl AsRef<Path>) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            ..self.clone()
        }
    }
}

/// Result of a successful generation. Never produced for a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorOutput {
    pub output_path: PathBuf,
    pub files_count: usize,
}

//! # generator: one uniform interface over all generation strategies
//!
//! - [`plugin`]: `protoc` with an explicit file list and per-plugin flags. One
//!   small [`plugin::PluginArgs`] struct per target, driven by the shared
//!   [`plugin::PluginGenerator`] skeleton.
//! - [`manifest`]: `buf generate`, reading the repository's own `buf.gen.yaml`,
//!   followed by harvesting whatever it produced.
//! - [`docs`]: the plugin skeleton with `protoc-gen-doc` plus markdown cleanup.
//!
//! Generators hold no per-call state; inputs and outputs flow as values, so a
//! single instance may serve concurrent requests.

pub mod docs;
pub mod manifest;
pub mod plugin;

use async_trait::async_trait;
use std::path::Path;

use crate::command::CancelSignal;
use crate::error::{GeneratorError, ValidationError};
use crate::input::{GeneratorInput, GeneratorOutput};
use crate::sdk::SdkTag;

pub use docs::{strip_scalar_value_types, DocsGenerator};
pub use manifest::ManifestGenerator;
pub use plugin::{
    GoConnectRpc, GoGrpc, GoProtobuf, PluginArgs, PluginGenerator, TypeScriptCommonJs,
    TypeScriptConnect, TypeScriptEs,
};

#[async_trait]
pub trait Generator: Send + Sync {
    fn sdk_tag(&self) -> SdkTag;

    /// Subdirectory of the caller's output root this generator writes into.
    fn directory_name(&self) -> &'static str {
        self.sdk_tag().directory_name()
    }

    /// Whether this generator's preconditions hold for `repo`.
    fn is_applicable(&self, repo: &Path) -> bool;

    /// Rejects unsafe or incomplete requests. Has no side effects.
    fn validate(&self, input: &GeneratorInput) -> Result<(), ValidationError>;

    async fn generate(
        &self,
        input: &GeneratorInput,
        cancel: &CancelSignal,
    ) -> Result<GeneratorOutput, GeneratorError>;
}

/// Creates the output root (and parents) with `rwxr-xr-x` permissions.
pub(crate) fn ensure_output_dir(path: &Path) -> Result<(), GeneratorError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(path)
        .map_err(|e| GeneratorError::io("failed to create output directory", path, e))
}

/// Renders a path for use inside a command-line flag, always with `/`.
pub(crate) fn slash_path(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return ".".to_string();
    }
    let joined = parts.join("/");
    // A leading root component renders as "/" and must not double up.
    if joined.starts_with("//") {
        joined[1..].to_string()
    } else {
        joined
    }
}

//! `load_config` module: reads the YAML generation config and applies environment overrides.
//!
//! This is the only place user-supplied YAML is parsed into typed structs. Tool
//! locations may be overridden from the environment (`SDKGEN_PROTOC`,
//! `SDKGEN_BUF`), which `main` populates from `.env` when present.
//!
//! `repository` and `output_dir` are resolved against the current working
//! directory at load time. Tools run with the repository as their working
//! directory, so relative paths would otherwise resolve twice.
//!
//! # Errors
//! All errors use `anyhow::Error` with the offending path attached and are
//! surfaced at the CLI boundary.
//!
//! Example:
//!
//! ```yaml
//! repository: ./schemas
//! output_dir: ./gen
//! sdks: [go-grpc, ts-connect, docs]
//! timeout_secs: 300
//! ```

use anyhow::{Context, Result};
use sdkgen_core::generator::{manifest::BUF, plugin::PROTOC};
use sdkgen_core::validate::clean_path;
use sdkgen_core::SdkTag;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const PROTOC_ENV: &str = "SDKGEN_PROTOC";
pub const BUF_ENV: &str = "SDKGEN_BUF";

#[derive(Debug, Deserialize)]
pub struct GenerateConfig {
    /// Schema repository root.
    pub repository: PathBuf,
    /// Each SDK is written to `<output_dir>/<sdk directory name>`.
    pub output_dir: PathBuf,
    /// SDKs to generate. Empty means "whatever applies to the repository".
    #[serde(default)]
    pub sdks: Vec<SdkTag>,
    /// Per-tool deadline. No deadline when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_protoc")]
    pub protoc: String,
    #[serde(default = "default_buf")]
    pub buf: String,
    /// Sort discovered proto files so argument order is reproducible.
    #[serde(default = "default_sort")]
    pub sort_proto_files: bool,
}

fn default_protoc() -> String {
    PROTOC.to_string()
}

fn default_buf() -> String {
    BUF.to_string()
}

fn default_sort() -> bool {
    true
}

impl GenerateConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve path {path:?}"))?;
    Ok(clean_path(&absolute))
}

/// Loads a YAML config file, then applies environment overrides for tool paths.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GenerateConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref)
        .inspect_err(|e| error!(error = ?e, config_path = ?path_ref, "Failed to read config file"))
        .with_context(|| format!("Failed to read config file {path_ref:?}"))?;

    let mut config: GenerateConfig = serde_yaml::from_str(&config_content)
        .inspect_err(|e| error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML"))
        .context("Failed to parse config YAML")?;

    config.repository = resolve(&config.repository)?;
    config.output_dir = resolve(&config.output_dir)?;

    if let Ok(protoc) = std::env::var(PROTOC_ENV) {
        info!(protoc = %protoc, "Using compiler from environment");
        config.protoc = protoc;
    }
    if let Ok(buf) = std::env::var(BUF_ENV) {
        info!(buf = %buf, "Using buf from environment");
        config.buf = buf;
    }

    info!(
        repository = %config.repository.display(),
        output_dir = %config.output_dir.display(),
        sdks = config.sdks.len(),
        "Loaded config"
    );
    Ok(config)
}

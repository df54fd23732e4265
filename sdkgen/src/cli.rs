//! # sdkgen CLI interface
//!
//! Command parsing and orchestration only. All generation logic lives in
//! [`sdkgen_core`]; this module wires a config file to a registry and prints
//! what came out.
//!
//! ## Subcommands
//! - `generate --config <file>`: generate every configured SDK (or the one that
//!   applies to the repository) under the configured output directory.
//! - `detect --repo <dir>`: print the SDK tag that applies to a repository.
//! - `list`: print registered SDK tags with their output directory names.
//!
//! Programmatic and integration-test use goes through [`run`].

use crate::load_config::{load_config, GenerateConfig};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use futures::future::try_join_all;
use sdkgen_core::discovery::{find_proto_files, find_proto_files_sorted};
use sdkgen_core::{
    CancelSignal, CommandRunner, GeneratorInput, GeneratorRegistry, RegistryBuilder,
    SdkTag, SystemCommandRunner,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI for sdkgen: generate client SDKs and API docs from Protocol Buffer schemas.
#[derive(Parser)]
#[clap(
    name = "sdkgen",
    version,
    about = "Generate client SDKs and API documentation from Protocol Buffer schemas"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate SDKs as described by the given YAML config file
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Print the report as JSON
        #[clap(long)]
        json: bool,
    },
    /// Print the SDK that applies to a repository
    Detect {
        /// Repository root
        #[clap(long)]
        repo: PathBuf,
    },
    /// List known SDKs and their output directories
    List,
}

/// One line of the generation report.
#[derive(Debug, Serialize)]
pub struct SdkReport {
    pub sdk: String,
    pub output_path: PathBuf,
    pub files_count: usize,
}

fn build_registry(
    runner: Arc<dyn CommandRunner>,
    config: Option<&GenerateConfig>,
) -> GeneratorRegistry {
    let mut builder = RegistryBuilder::new(runner);
    if let Some(config) = config {
        // SDKs run concurrently under output_dir; buf must not pick up its siblings.
        builder = builder
            .protoc(&config.protoc)
            .buf(&config.buf)
            .exclude_from_harvest(&config.output_dir);
    }
    builder.with_defaults().build()
}

/// Cancels `cancel` on Ctrl-C so running tools are killed rather than orphaned.
fn cancel_on_ctrl_c() -> CancelSignal {
    let (handle, cancel) = CancelSignal::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling running tools");
            handle.cancel();
        }
    });
    cancel
}

async fn generate(config: GenerateConfig) -> Result<Vec<SdkReport>> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    let registry = build_registry(runner, Some(&config));

    let tags = if config.sdks.is_empty() {
        let generator = registry.find_applicable_generator(&config.repository)?;
        tracing::info!(sdk = %generator.sdk_tag(), "No SDKs configured, using detected generator");
        vec![generator.sdk_tag()]
    } else {
        config.sdks.clone()
    };

    let proto_files = if config.sort_proto_files {
        find_proto_files_sorted(&config.repository)?
    } else {
        find_proto_files(&config.repository)?
    };
    tracing::info!(files = proto_files.len(), "Discovered proto files");

    let mut cancel = cancel_on_ctrl_c();
    if let Some(timeout) = config.timeout() {
        cancel = cancel.with_timeout(timeout);
    }

    let mut jobs = Vec::with_capacity(tags.len());
    for tag in tags {
        let generator = registry
            .get(&tag)
            .ok_or_else(|| anyhow!("Unknown SDK '{tag}'"))?;
        let input = GeneratorInput {
            repo_path: config.repository.clone(),
            output_path: config.output_dir.join(generator.directory_name()),
            proto_files: proto_files.clone(),
        };
        let cancel = cancel.clone();
        jobs.push(async move {
            tracing::info!(sdk = %tag, output = %input.output_path.display(), "Generating SDK");
            let output = generator
                .generate(&input, &cancel)
                .await
                .map_err(|e| anyhow!("{tag}: {e}"))?;
            Ok::<_, anyhow::Error>(SdkReport {
                sdk: tag.to_string(),
                output_path: output.output_path,
                files_count: output.files_count,
            })
        });
    }

    try_join_all(jobs).await
}

fn detect(repo: &Path) -> Result<SdkTag> {
    let registry = build_registry(Arc::new(SystemCommandRunner::new()), None);
    Ok(registry.find_applicable_generator(repo)?.sdk_tag())
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate { config, json } => {
            let config = load_config(config)?;
            tracing::info!(command = "generate", "Starting generation");
            match generate(config).await {
                Ok(reports) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&reports)?);
                    } else {
                        for report in &reports {
                            println!(
                                "{}\t{}\t{} files",
                                report.sdk,
                                report.output_path.display(),
                                report.files_count
                            );
                        }
                    }
                    tracing::info!(command = "generate", sdks = reports.len(), "Generation complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "generate", error = %e, "Generation failed");
                    Err(e)
                }
            }
        }
        Commands::Detect { repo } => {
            let tag = detect(&repo)?;
            println!("{tag}");
            Ok(())
        }
        Commands::List => {
            let registry = build_registry(Arc::new(SystemCommandRunner::new()), None);
            for tag in registry.list() {
                println!("{tag}\t{}", registry.directory_name(&tag));
            }
            Ok(())
        }
    }
}

use anyhow::Result;
use clap::Parser;
use sdkgen::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Tool overrides (SDKGEN_PROTOC, SDKGEN_BUF) may come from .env
    dotenvy::dotenv().ok();

    // Logs go to stderr so `generate --json` output stays parseable.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}

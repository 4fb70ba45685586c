//! Standalone binary to validate model source files.
//! Used by CI to ensure model lists parse before they are deployed.
//!
//! Usage: `validate_models <path>...` (defaults to `$AIGW_MODELS_PATH`).

use ai_gateway::config::ENV_MODELS_PATH;
use ai_gateway::registry::parse_models;
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        match std::env::var(ENV_MODELS_PATH) {
            Ok(p) if !p.trim().is_empty() => paths.push(PathBuf::from(p)),
            _ => bail!("usage: validate_models <path>... (or set {})", ENV_MODELS_PATH),
        }
    }

    let mut errors = Vec::new();
    for path in &paths {
        print!("Validating {}... ", path.display());
        let result = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|source| parse_models(&source).map_err(anyhow::Error::from));
        match result {
            Ok(models) => {
                println!("✅ {} model(s)", models.len());
                for model in models {
                    println!("  - {} (weight {})", model.name, model.weight);
                }
            }
            Err(e) => {
                println!("❌");
                errors.push(format!("  {}: {:#}", path.display(), e));
            }
        }
    }

    if !errors.is_empty() {
        eprintln!("\n=== Validation Errors ===");
        for error in &errors {
            eprintln!("{}", error);
        }
        bail!("{} of {} model source(s) failed validation", errors.len(), paths.len());
    }

    println!("\nAll model sources valid.");
    Ok(())
}

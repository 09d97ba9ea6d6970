//! Batch command - run many invoice files through the pipeline.

use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;
use tracing::error;

use invex_core::BackendKind;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    pattern: String,

    /// Extraction backend ("structured" or "vision")
    #[arg(short, long, default_value = "structured")]
    backend: String,

    /// Output directory for per-file JSON records
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Continue with remaining files after a failure
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let backend = BackendKind::parse(&args.backend)?;

    let files: Vec<PathBuf> = glob(&args.pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("no files match {}", args.pattern);
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut archive_warnings = 0usize;

    // One independent pipeline run per file; documents never share a run.
    for path in &files {
        match super::process::run_pipeline(path, backend, &config).await {
            Ok(outcome) => {
                succeeded += 1;
                if outcome.archive_warning.is_some() {
                    archive_warnings += 1;
                }
                if let Some(dir) = &args.output_dir {
                    let name = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("record");
                    std::fs::write(
                        dir.join(format!("{name}.json")),
                        serde_json::to_string_pretty(&outcome.extraction.record)?,
                    )?;
                }
                println!("{} {}", style("✓").green(), path.display());
            }
            Err(e) => {
                failed += 1;
                error!("{}: {e}", path.display());
                eprintln!("{} {}: {e}", style("✗").red(), path.display());
                if !args.continue_on_error {
                    anyhow::bail!("aborted after failure (use --continue-on-error to keep going)");
                }
            }
        }
    }

    println!(
        "\n{} processed, {} failed, {} archive warnings",
        style(succeeded).green(),
        style(failed).red(),
        archive_warnings,
    );
    Ok(())
}

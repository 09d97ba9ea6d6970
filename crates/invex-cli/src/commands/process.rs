//! Process command - run one invoice through the extraction pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use invex_backends::{StructuredClient, VisionClient};
use invex_core::{
    BackendKind, Document, DocumentKind, FIRST_CLASS_FIELDS, FsArchive, InvexConfig, Pipeline,
    PipelineOutcome, archive_name,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Extraction backend ("structured" or "vision")
    #[arg(short, long, default_value = "structured")]
    backend: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Archive directory (overrides config)
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Write the backend's raw response JSON to this file
    #[arg(long)]
    debug_json: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON record
    Json,
    /// Line items as CSV
    Csv,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = super::load_config(config_path)?;

    if let Some(dir) = &args.archive_dir {
        config.archive.root = dir.clone();
    }

    // Strategy is validated before anything else happens, including the
    // input file check.
    let backend = BackendKind::parse(&args.backend)?;

    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }

    let outcome = run_pipeline(&args.input, backend, &config).await?;

    let output = format_outcome(&outcome, args.format)?;
    if let Some(path) = &args.output {
        fs::write(path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            path.display()
        );
    } else {
        println!("{output}");
    }

    if let Some(path) = &args.debug_json {
        fs::write(
            path,
            serde_json::to_string_pretty(&outcome.extraction.raw_debug)?,
        )?;
        println!(
            "{} Raw backend response written to {}",
            style("✓").green(),
            path.display()
        );
    }

    if let Some(warning) = &outcome.archive_warning {
        eprintln!(
            "{} parsed, but could not archive: {}",
            style("!").yellow(),
            warning
        );
    }

    info!("finished in {} ms", start.elapsed().as_millis());
    Ok(())
}

/// Run the extraction pipeline over one file. Shared with the batch
/// command.
pub(crate) async fn run_pipeline(
    input: &Path,
    backend: BackendKind,
    config: &InvexConfig,
) -> anyhow::Result<PipelineOutcome> {
    let bytes = fs::read(input)?;
    let mime_hint = input
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentKind::from_extension)
        .map(|k| k.mime());
    let document = Document::from_bytes(bytes, mime_hint)?;

    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let unique_name = archive_name(file_name);

    let pipeline = Pipeline::new(
        StructuredClient::new(config.structured.clone()),
        VisionClient::new(config.vision.clone()),
        FsArchive::new(config.archive.root.clone()),
    );

    info!("processing {} with the {} backend", input.display(), backend);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("extracting with {backend} backend"));
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = pipeline.run(document, backend, &unique_name).await;
    pb.finish_and_clear();
    Ok(outcome?)
}

fn format_outcome(outcome: &PipelineOutcome, format: OutputFormat) -> anyhow::Result<String> {
    let record = &outcome.extraction.record;
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for item in &record.line_items {
                writer.serialize(item)?;
            }
            let data = writer.into_inner()?;
            Ok(String::from_utf8(data)?)
        }
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

fn format_text(outcome: &PipelineOutcome) -> String {
    let record = &outcome.extraction.record;
    let mut out = String::new();

    out.push_str(&format!("{}\n", style("Invoice").bold().underlined()));
    for name in FIRST_CLASS_FIELDS {
        out.push_str(&format!(
            "  {:<16} {}\n",
            name,
            record.get(name).unwrap_or("-")
        ));
    }

    let extras: Vec<_> = record
        .fields
        .iter()
        .filter(|(name, _)| !FIRST_CLASS_FIELDS.contains(&name.as_str()))
        .collect();
    if !extras.is_empty() {
        out.push_str(&format!("\n{}\n", style("Other fields").bold()));
        for (name, value) in extras {
            out.push_str(&format!(
                "  {:<16} {}\n",
                name,
                value.as_deref().unwrap_or("-")
            ));
        }
    }

    if !record.line_items.is_empty() {
        out.push_str(&format!("\n{}\n", style("Line items").bold()));
        for (idx, item) in record.line_items.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} x{} @ {} = {}\n",
                idx + 1,
                item.description.as_deref().unwrap_or("-"),
                item.quantity.as_deref().unwrap_or("-"),
                item.unit_price.as_deref().unwrap_or("-"),
                item.amount.as_deref().unwrap_or("-"),
            ));
        }
    }

    out
}

mod display;
mod report;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use clausewise_core::{Analyzer, ContentType, ReportBuilder, SourceDocument};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clausewise", version, about = "Contract analysis and risk assessment")]
struct Cli {
    /// Directory holding the entity model (`model.onnx`, `tokenizer.json`, `config.json`).
    /// Without it, entities come from pattern fallbacks only.
    #[arg(long, env = "CLAUSEWISE_MODEL_DIR", global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one contract and print the result.
    Analyze {
        file: PathBuf,

        /// MIME type of the file, overriding extension-based detection.
        #[arg(long)]
        content_type: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Analyze many contracts and write one Parquet row per document.
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, default_value = "report.parquet")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    info!("clausewise v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let analyzer = Analyzer::new(clausewise_ai::load_recognizer(cli.model_dir.as_deref()));

    match cli.command {
        Command::Analyze {
            file,
            content_type,
            format,
        } => {
            let output = analyze_one(&analyzer, &file, content_type.as_deref(), format)?;
            println!("{output}");
        }
        Command::Batch { files, out } => {
            let rows = analyze_batch(&analyzer, &files, &out)?;
            println!("Wrote {rows} of {} documents to {}", files.len(), out.display());
        }
    }
    Ok(())
}

fn load_source(path: &Path, content_type: Option<&str>) -> anyhow::Result<SourceDocument> {
    match content_type {
        Some(mime) => {
            let content_type = ContentType::from_mime(mime)?;
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(SourceDocument::new(bytes, content_type))
        }
        None => SourceDocument::from_file(path).with_context(|| format!("loading {}", path.display())),
    }
}

fn analyze_one(
    analyzer: &Analyzer,
    path: &Path,
    content_type: Option<&str>,
    format: Format,
) -> anyhow::Result<String> {
    let source = load_source(path, content_type)?;
    let result = analyzer
        .analyze(&source)
        .with_context(|| format!("analyzing {}", path.display()))?;

    match format {
        Format::Json => Ok(serde_json::to_string_pretty(&result)?),
        Format::Text => {
            let mut builder = ReportBuilder::new();
            builder.push(&path.display().to_string(), &result);
            let batch = builder.finish()?;
            display::render_card(&batch, 0, result.text())
        }
    }
}

/// Analyze every file, skipping unreadable ones. Returns the number of rows written.
fn analyze_batch(analyzer: &Analyzer, files: &[PathBuf], out: &Path) -> anyhow::Result<usize> {
    let mut builder = ReportBuilder::new();
    for path in files {
        let analyzed = load_source(path, None).and_then(|source| {
            analyzer
                .analyze(&source)
                .with_context(|| format!("analyzing {}", path.display()))
        });
        match analyzed {
            Ok(result) => builder.push(&path.display().to_string(), &result),
            Err(e) => warn!(file = %path.display(), error = %format!("{e:#}"), "skipping document"),
        }
    }

    anyhow::ensure!(!builder.is_empty(), "no document could be analyzed");
    let rows = builder.len();
    let batch = builder.finish()?;
    report::write_parquet(out, &batch)?;
    info!(rows, skipped = files.len() - rows, out = %out.display(), "report written");
    Ok(rows)
}

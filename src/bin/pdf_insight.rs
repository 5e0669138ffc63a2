//! CLI binary for pdf-insight.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessConfig` and prints a run summary.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_insight::{process, ProcessConfig, ProcessRequest};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

/// Annotate PDF documents with AI-generated insights and highlights.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-insight",
    version,
    about = "Annotate PDF documents with AI-generated insights and highlights",
    long_about = "Select salient paragraphs of a PDF (local file or URL), generate a short \
insight per paragraph with an LLM, locate the model's verbatim phrases on the page, and write \
a copy of the PDF with non-destructive highlight overlays.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the annotated PDF to this path.
    #[arg(short, long, env = "PDF_INSIGHT_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Number of concurrent insight calls.
    #[arg(short, long, env = "PDF_INSIGHT_CONCURRENCY", default_value_t = 10)]
    concurrency: usize,

    /// LLM temperature (0.0-2.0).
    #[arg(long, env = "PDF_INSIGHT_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per insight.
    #[arg(long, env = "PDF_INSIGHT_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_INSIGHT_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Per-insight LLM call timeout in seconds.
    #[arg(long, env = "PDF_INSIGHT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output the full structured result as JSON instead of a summary.
    #[arg(long, env = "PDF_INSIGHT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_INSIGHT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_INSIGHT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ProcessConfig::builder()
        .insight_concurrency(cli.concurrency)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout)
        .llm_timeout_secs(cli.api_timeout);
    if let Some(provider) = &cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(model) = &cli.model {
        builder = builder.model_name(model);
    }
    let output_path = cli.output.clone().unwrap_or_else(|| {
        let stem = PathBuf::from(&cli.input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        PathBuf::from(format!("{stem}_annotated.pdf"))
    });
    builder = builder.output_path(&output_path);
    let config = builder.build().context("Invalid configuration")?;

    let document_id = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let request = ProcessRequest {
        document_id,
        project_id: "cli".to_string(),
        source: cli.input.clone(),
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let output = process(&request, &config)
        .await
        .context("Processing failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize output")?
        );
        return Ok(());
    }

    if !cli.quiet {
        println!(
            "{} {}",
            green("✓"),
            bold(&format!("Annotated {}", output_path.display()))
        );
        println!(
            "  {} pages, {} insights, {} highlight rectangles",
            output.page_count,
            output.stats.insights_generated,
            output.stats.highlights_resolved
        );
        if output.stats.degraded_insights > 0 {
            println!(
                "  {}",
                dim(&format!(
                    "{} insight(s) degraded to empty results",
                    output.stats.degraded_insights
                ))
            );
        }
        println!(
            "  {}",
            dim(&format!("{}ms total", output.stats.total_duration_ms))
        );
    }

    Ok(())
}

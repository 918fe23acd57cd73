//! CLI binary for edgequake-pdf2json.
//!
//! A thin shim over the library crate: `serve` maps flags and environment
//! variables to a `ServerConfig` and runs the HTTP service; `extract` runs a
//! single conversion and prints the JSON document.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2json::{convert_file, ConversionRequest, Server, ServerConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the service on the default address (127.0.0.1:9001)
  pdf2json serve

  # Listen on all interfaces
  LISTEN_ADDRESS=0.0.0.0:9001 pdf2json serve

  # Convert pages 2-5 of a local file, with images
  pdf2json extract --start-page 2 --end-page 5 --images report.pdf

  # Call the service
  curl -F file=@report.pdf 'http://127.0.0.1:9001/?startPage=2&images=1'

REQUIREMENTS:
  pdftotext and pdfimages from poppler-utils must be installed
  (apt install poppler-utils / brew install poppler).

ENVIRONMENT VARIABLES:
  LISTEN_ADDRESS            host:port the service binds; ":9001" means all
                            interfaces (default 127.0.0.1:9001)
  PDF2JSON_PDFTOTEXT        Path to pdftotext
  PDF2JSON_PDFIMAGES        Path to pdfimages
  PDF2JSON_TOOL_TIMEOUT     Per-invocation tool timeout in seconds
  PDF2JSON_WORK_DIR         Parent directory for per-request workspaces
  RUST_LOG                  Log filter (overrides --verbose / --quiet)
"#;

/// Extract per-page text and images from PDFs as JSON.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2json",
    version,
    about = "Extract per-page text and images from PDFs as JSON",
    long_about = "Extract per-page text (and optionally embedded images) from PDF documents \
using poppler's pdftotext and pdfimages, either as an HTTP service or one file at a time.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    tools: ToolArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Convert one local PDF and print the JSON document.
    Extract(ExtractArgs),
}

/// Settings shared by both subcommands.
#[derive(Args, Debug)]
struct ToolArgs {
    /// pdftotext executable.
    #[arg(long, global = true, env = "PDF2JSON_PDFTOTEXT", default_value = "pdftotext")]
    pdftotext: PathBuf,

    /// pdfimages executable.
    #[arg(long, global = true, env = "PDF2JSON_PDFIMAGES", default_value = "pdfimages")]
    pdfimages: PathBuf,

    /// Kill a tool invocation after this many seconds.
    #[arg(long, global = true, env = "PDF2JSON_TOOL_TIMEOUT", default_value_t = 300,
          value_parser = clap::value_parser!(u64).range(1..))]
    tool_timeout: u64,

    /// Parent directory for temporary workspaces (default: system temp dir).
    #[arg(long, global = true, env = "PDF2JSON_WORK_DIR")]
    work_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "LISTEN_ADDRESS", default_value = "127.0.0.1:9001")]
    listen_address: String,

    /// Maximum upload size in MiB.
    #[arg(long, env = "PDF2JSON_MAX_UPLOAD_MB", default_value_t = 128,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_upload_mb: u64,

    /// Ignore `images=1` and never run pdfimages.
    #[arg(long, env = "PDF2JSON_DISABLE_IMAGES")]
    disable_images: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Local PDF file.
    input: PathBuf,

    /// First page to extract (1-indexed).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    start_page: u32,

    /// Last page to extract; 0 means through the last page.
    #[arg(long, default_value_t = 0)]
    end_page: u32,

    /// Also extract embedded images as data URIs.
    #[arg(long)]
    images: bool,

    /// Pretty-print the JSON.
    #[arg(long)]
    pretty: bool,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Serve(args) => serve(&cli.tools, args).await,
        Command::Extract(args) => extract(&cli.tools, args).await,
    }
}

async fn serve(tools: &ToolArgs, args: &ServeArgs) -> Result<()> {
    let max_upload_bytes = args
        .max_upload_mb
        .checked_mul(1024 * 1024)
        .and_then(|b| usize::try_from(b).ok())
        .context("--max-upload-mb is too large for this platform")?;

    let config = base_config(tools)
        .listen_address(&args.listen_address)
        .max_upload_bytes(max_upload_bytes)
        .images_enabled(!args.disable_images)
        .build()
        .context("Invalid server configuration")?;

    tracing::info!("Starting pdf2json v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Tools: {} / {} (timeout {}s)",
        config.pdftotext.program.display(),
        config.pdfimages.program.display(),
        config.pdftotext.timeout.as_secs()
    );

    Server::new(config)
        .serve()
        .await
        .context("HTTP server failed")
}

async fn extract(tools: &ToolArgs, args: &ExtractArgs) -> Result<()> {
    let config = base_config(tools)
        .build()
        .context("Invalid configuration")?;
    let request = ConversionRequest {
        start_page: args.start_page,
        end_page: args.end_page,
        include_images: args.images,
    };

    let doc = convert_file(&args.input, &request, &config)
        .await
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .context("Failed to serialise output")?;

    if let Some(ref path) = args.output {
        tokio::fs::write(path, format!("{json}\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote {} pages to {}", doc.pages.len(), path.display());
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    }

    Ok(())
}

fn base_config(tools: &ToolArgs) -> edgequake_pdf2json::ServerConfigBuilder {
    let builder = ServerConfig::builder()
        .pdftotext_path(&tools.pdftotext)
        .pdfimages_path(&tools.pdfimages)
        .tool_timeout_secs(tools.tool_timeout);
    match tools.work_dir {
        Some(ref dir) => builder.work_dir(dir),
        None => builder,
    }
}

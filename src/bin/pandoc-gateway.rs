//! CLI binary for pandoc-gateway.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables to `GatewayConfig` and runs the server.

use anyhow::{Context, Result};
use clap::Parser;
use pandoc_gateway::{serve, GatewayConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  pandoc-gateway
  pandoc-gateway --listen 0.0.0.0:8080 --scratch-dir /var/tmp/pandoc
  curl -F in_file=@paper.md -F output=pdf -F standalone=on \
       http://127.0.0.1:8080/convert -o paper.pdf

Every flag can also be set through the PANDOC_GATEWAY_* variable shown
next to it. RUST_LOG overrides --verbose and --quiet.
"#;

/// Convert uploaded Markdown documents with pandoc over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pandoc-gateway",
    version,
    about = "Convert uploaded Markdown documents with pandoc over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(short, long, env = "PANDOC_GATEWAY_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// pandoc executable (name on PATH or full path).
    #[arg(long, env = "PANDOC_GATEWAY_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// Directory for request temp files. Defaults to the system temp dir.
    #[arg(long, env = "PANDOC_GATEWAY_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Timeout for downloading a remote bibliography, in seconds.
    #[arg(long, env = "PANDOC_GATEWAY_FETCH_TIMEOUT", default_value_t = 120)]
    fetch_timeout: u64,

    /// Timeout for one pandoc run, in seconds.
    #[arg(long, env = "PANDOC_GATEWAY_ENGINE_TIMEOUT", default_value_t = 300)]
    engine_timeout: u64,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "PANDOC_GATEWAY_MAX_UPLOAD", default_value_t = 50 * 1024 * 1024)]
    max_upload: usize,

    /// Run citations through the external `pandoc-citeproc` filter
    /// (pandoc older than 2.11) instead of `--citeproc`.
    #[arg(long, env = "PANDOC_GATEWAY_EXTERNAL_CITEPROC")]
    external_citeproc: bool,

    /// Debug logging.
    #[arg(short, long, env = "PANDOC_GATEWAY_VERBOSE")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, env = "PANDOC_GATEWAY_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn to_config(&self) -> Result<GatewayConfig> {
        let mut builder = GatewayConfig::builder()
            .listen_addr(self.listen)
            .pandoc_path(self.pandoc.clone())
            .fetch_timeout_secs(self.fetch_timeout)
            .engine_timeout_secs(self.engine_timeout)
            .max_upload_bytes(self.max_upload)
            .builtin_citeproc(!self.external_citeproc);
        if let Some(ref dir) = self.scratch_dir {
            builder = builder.scratch_dir(dir.clone());
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

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

    let config = cli.to_config()?;
    serve(config).await.context("Server failed")?;
    Ok(())
}

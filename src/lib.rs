//! # pandoc-gateway
//!
//! An HTTP front end for pandoc: upload a Markdown file plus a handful of
//! options, get back the converted document as a download.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /convert (multipart)
//!  │
//!  ├─ 1. Decode   multipart → FormFields (blank file parts dropped)
//!  ├─ 2. Options  FormFields → ConversionOptions (unknown output → 400)
//!  ├─ 3. Biblio   upload > URL (fetched) > server path, only with citeproc
//!  ├─ 4. Args     deterministic pandoc argument vector
//!  ├─ 5. Engine   one pandoc run in a scratch dir, with timeout
//!  └─ 6. Stream   output file streamed back, then deleted
//! ```
//!
//! Every request owns its temp files; nothing survives the response,
//! whether it succeeded or failed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pandoc_gateway::{serve, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder()
//!         .listen_addr("0.0.0.0:8080".parse()?)
//!         .build()?;
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! To embed the routes in a larger application, build a [`Gateway`] and
//! mount [`server::router`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pandoc-gateway` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pandoc-gateway = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod form;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use convert::Gateway;
pub use error::{ErrorKind, GatewayError};
pub use options::{ConversionOptions, FormFields, OutputFormat, UploadedFile};
pub use output::{ConversionOutcome, ConvertedDocument};
pub use pipeline::engine::{Engine, EngineInvocation, EngineReport, PandocEngine};
pub use pipeline::fetch::{FetchError, Fetcher, HttpFetcher};
pub use server::{router, serve};

//! CLI argument definitions for yieldline.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `div` | Fiscal-year dividend total for a ticker |
//! | `metric` | Per-share dividend metric converted to a target currency |
//! | `fx` | Historical daily FX rate |
//! | `cache` | Inspect and maintain the cache |
//! | `credentials` | Show configured properties, masked |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |
//! | `--cache` | `file` | Cache backend (memory, file, document) |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! yieldline div MC.PA 2019
//! yieldline div AAPL.US 2021 --fiscal-year-end 09-30 --pretty
//! yieldline metric IBM 2019 --currency GBP
//! yieldline cache purge --cache-dir /tmp/yieldline
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use yieldline_core::{CacheBackendKind, CacheMode, FiscalYearEnd, DEFAULT_FX_FALLBACK};

/// Fiscal-year dividends and per-share metrics from EODHD and AlphaVantage.
#[derive(Debug, Parser)]
#[command(name = "yieldline", author, version, about)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Cache backend. Falls back to YIELDLINE_CACHE_BACKEND, then `file`.
    #[arg(long, global = true, value_enum)]
    pub cache: Option<CacheSelector>,

    /// Directory for the file cache. Falls back to YIELDLINE_CACHE_DIR.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Skip cache reads but store fresh responses.
    #[arg(long, global = true, default_value_t = false, conflicts_with = "no_cache")]
    pub refresh: bool,

    /// Neither read nor write the cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn cache_mode(&self) -> CacheMode {
        if self.no_cache {
            CacheMode::Bypass
        } else if self.refresh {
            CacheMode::Refresh
        } else {
            CacheMode::Use
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object.
    Json,
    /// Aligned key/value text for terminals.
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheSelector {
    /// Process-local, discarded on exit.
    Memory,
    /// JSON files in a local directory.
    File,
    /// Hosted document store (FIREBASE_URL / FIREBASE_AUTH).
    Document,
}

impl From<CacheSelector> for CacheBackendKind {
    fn from(selector: CacheSelector) -> Self {
        match selector {
            CacheSelector::Memory => Self::Memory,
            CacheSelector::File => Self::File,
            CacheSelector::Document => Self::Document,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dividend total for one fiscal year.
    ///
    ///   yieldline div MC.PA 2019
    ///   yieldline div AAPL.US 2021 --fiscal-year-end 09-30
    Div(DivArgs),

    /// Dividend per weighted share, converted from USD.
    ///
    ///   yieldline metric IBM 2019
    ///   yieldline metric IBM 2019 --currency GBP
    Metric(MetricArgs),

    /// Historical daily FX rate.
    Fx(FxArgs),

    /// Cache inspection and maintenance.
    Cache(CacheArgs),

    /// List configured properties with secrets masked.
    Credentials,
}

#[derive(Debug, Args)]
pub struct DivArgs {
    /// Exchange ticker, e.g. MC.PA or AAPL.US.
    pub ticker: String,

    /// Fiscal year.
    pub year: i32,

    /// Fiscal-year cutoff as MM-DD.
    #[arg(long, default_value_t = FiscalYearEnd::default())]
    pub fiscal_year_end: FiscalYearEnd,

    /// Report a zero quarterly total as 0 instead of an invalid dividend.
    #[arg(long, default_value_t = false)]
    pub accept_zero: bool,
}

#[derive(Debug, Args)]
pub struct MetricArgs {
    pub ticker: String,

    pub year: i32,

    /// Target currency (ISO 4217).
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    /// Fiscal-year cutoff used for the dividend leg.
    #[arg(long, default_value_t = FiscalYearEnd::default())]
    pub fiscal_year_end: FiscalYearEnd,
}

#[derive(Debug, Args)]
pub struct FxArgs {
    /// Date as YYYY-MM-DD.
    pub date: String,

    #[arg(long, default_value = "USD")]
    pub from: String,

    #[arg(long, default_value = "EUR")]
    pub to: String,

    /// Rate returned when the lookup fails.
    #[arg(long, default_value_t = DEFAULT_FX_FALLBACK)]
    pub fallback: f64,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show the entry stored under a key, e.g. `eodhd/div/MC.PA`.
    Get(CacheKeyArgs),

    /// Remove the entry stored under a key.
    Delete(CacheKeyArgs),

    /// Remove expired entries from the file cache.
    Purge(PurgeArgs),
}

#[derive(Debug, Args)]
pub struct CacheKeyArgs {
    pub key: String,
}

#[derive(Debug, Args)]
pub struct PurgeArgs {
    /// Remove every entry, not only expired ones.
    #[arg(long, default_value_t = false)]
    pub all: bool,
}

//! Clap derive structures for the `siteline` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// siteline -- browse and license-check SharePoint tenant sites
#[derive(Debug, Parser)]
#[command(
    name = "siteline",
    version,
    about = "Browse and license-check SharePoint tenant sites",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Site URL the session runs under (e.g. https://contoso.sharepoint.com)
    #[arg(long, short = 's', env = "SITELINE_SITE_URL", global = true)]
    pub site_url: Option<String>,

    /// License service root URL
    #[arg(long, env = "SITELINE_LICENSE_ENDPOINT", global = true)]
    pub license_endpoint: Option<String>,

    /// Bearer token for the search endpoint
    #[arg(long, env = "SITELINE_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITELINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SITELINE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Command Tree ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Site directory operations
    Sites(SitesArgs),
    /// License validation operations
    License(LicenseArgs),
}

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List the sites the caller is permitted to see
    List {
        /// Maximum number of rows to request
        #[arg(long, default_value = "500")]
        limit: u32,
    },
}

#[derive(Debug, Args)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Show the tenant's license status
    Status {
        /// Skip the cache freshness fast path and call the service
        #[arg(long)]
        refresh: bool,

        /// Cache-only read; never touches the network
        #[arg(long, conflicts_with = "refresh")]
        quick: bool,
    },
    /// Remove the persisted license cache entry
    ClearCache,
}

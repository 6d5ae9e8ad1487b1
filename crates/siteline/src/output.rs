//! Output formatting: table, JSON, plain.
//!
//! Table uses `tabled`, JSON serializes the original data via serde,
//! plain emits one value per line for scripting.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use siteline_core::{LicenseCheck, SiteRecord};

use crate::cli::{ColorMode, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Site list ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&SiteRecord> for SiteRow {
    fn from(r: &SiteRecord) -> Self {
        Self {
            title: r.display_title().to_owned(),
            url: r.url.clone(),
            description: r.description.clone().unwrap_or_default(),
        }
    }
}

/// Render the site list in the chosen format.
pub fn render_sites(format: OutputFormat, records: &[SiteRecord]) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<SiteRow> = records.iter().map(SiteRow::from).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(records).unwrap_or_else(|e| format!("<serialize error: {e}>"))
        }
        OutputFormat::Plain => records
            .iter()
            .map(|r| r.url.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ── License status ───────────────────────────────────────────────────

/// Render a license check in the chosen format.
pub fn render_license(format: OutputFormat, check: &LicenseCheck, color: bool) -> String {
    match format {
        OutputFormat::Table => {
            let verdict = if check.status.valid {
                if color {
                    "VALID".green().bold().to_string()
                } else {
                    "VALID".into()
                }
            } else if color {
                "INVALID".red().bold().to_string()
            } else {
                "INVALID".into()
            };

            let mut lines = vec![format!("License: {verdict}")];
            if let Some(tier) = &check.status.tier {
                lines.push(format!("Tier:    {tier}"));
            }
            if !check.status.features.is_empty() {
                lines.push(format!("Features: {}", check.status.features.join(", ")));
            }
            if let Some(expires) = check.status.expires_at {
                lines.push(format!("Expires: {}", expires.format("%Y-%m-%d")));
            }
            if let Some(reason) = check.status.reason {
                lines.push(format!("Reason:  {reason:?}"));
            }
            if check.cached {
                lines.push("Source:  cache".into());
            }
            lines.join("\n")
        }
        OutputFormat::Json => serde_json::to_string_pretty(&check.status)
            .unwrap_or_else(|e| format!("<serialize error: {e}>")),
        OutputFormat::Plain => {
            if check.status.valid {
                "valid".into()
            } else {
                "invalid".into()
            }
        }
    }
}

/// Print rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    println!("{output}");
}

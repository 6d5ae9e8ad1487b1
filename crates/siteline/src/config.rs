//! Configuration loading and flag resolution.
//!
//! TOML file + `SITELINE_*` environment variables via figment, with
//! command-line flags taking final precedence. The resolved
//! [`Settings`] is what command handlers consume.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── TOML config ──────────────────────────────────────────────────────

/// On-disk configuration (`$XDG_CONFIG_HOME/siteline/config.toml`).
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Site URL the session runs under.
    pub site_url: Option<String>,

    /// License service root URL.
    pub license_endpoint: Option<String>,

    /// Product identifier sent with validation queries.
    #[serde(default = "default_product")]
    pub product: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Directory for the persisted license cache. Defaults to the
    /// platform cache directory.
    pub cache_dir: Option<PathBuf>,
}

fn default_product() -> String {
    "siteline".into()
}
fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load from the default config file and environment.
    pub fn load() -> Result<Self, CliError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_file() {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("SITELINE_"))
            .extract()
            .map_err(CliError::from)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "siteline", "siteline")
}

fn config_file() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

// ── Resolved settings ────────────────────────────────────────────────

/// Everything a command handler needs, after merging config and flags.
#[derive(Debug)]
pub struct Settings {
    pub site_url: Option<Url>,
    pub license_endpoint: Option<Url>,
    pub product: String,
    pub token: Option<SecretString>,
    pub timeout: Duration,
    pub cache_path: PathBuf,
}

impl Settings {
    /// Merge the loaded config with command-line overrides.
    pub fn resolve(config: Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let site_url = global
            .site_url
            .clone()
            .or(config.site_url)
            .map(|raw| parse_url("site URL", &raw))
            .transpose()?;

        let license_endpoint = global
            .license_endpoint
            .clone()
            .or(config.license_endpoint)
            .map(|raw| parse_url("license endpoint", &raw))
            .transpose()?;

        let cache_path = config
            .cache_dir
            .or_else(|| project_dirs().map(|d| d.cache_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("license-cache.json");

        Ok(Self {
            site_url,
            license_endpoint,
            product: config.product,
            token: global.token.clone().map(SecretString::from),
            timeout: Duration::from_secs(global.timeout.unwrap_or(config.timeout)),
            cache_path,
        })
    }

    pub fn require_site_url(&self) -> Result<&Url, CliError> {
        self.site_url.as_ref().ok_or(CliError::MissingSetting {
            setting: "site URL",
            flag: "--site-url",
            env: "SITELINE_SITE_URL",
        })
    }

    pub fn require_license_endpoint(&self) -> Result<&Url, CliError> {
        self.license_endpoint
            .as_ref()
            .ok_or(CliError::MissingSetting {
                setting: "license endpoint",
                flag: "--license-endpoint",
                env: "SITELINE_LICENSE_ENDPOINT",
            })
    }
}

fn parse_url(what: &'static str, raw: &str) -> Result<Url, CliError> {
    Url::parse(raw).map_err(|source| CliError::InvalidUrl {
        what,
        value: raw.to_owned(),
        source,
    })
}

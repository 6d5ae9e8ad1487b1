//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` categories into user-facing errors with actionable
//! help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use siteline_core::{CoreError, ErrorCategory};

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No {setting} configured")]
    #[diagnostic(
        code(siteline::missing_setting),
        help("Pass {flag}, set {env}, or add it to the config file.")
    )]
    MissingSetting {
        setting: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("Invalid {what}: {value}")]
    #[diagnostic(code(siteline::invalid_url))]
    InvalidUrl {
        what: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(code(siteline::config))]
    Config(Box<figment::Error>),

    // ── Remote failures ──────────────────────────────────────────────
    #[error("Access was denied by the server")]
    #[diagnostic(
        code(siteline::permission),
        help("Check that your token grants access to this tenant's search endpoint.")
    )]
    Permission { detail: String },

    #[error("The service could not be reached")]
    #[diagnostic(
        code(siteline::connection),
        help("Check your connection, or retry with a longer --timeout.")
    )]
    Connection { detail: String },

    #[error("Request failed: {message}")]
    #[diagnostic(code(siteline::api_error))]
    Api { message: String },

    // ── Client construction ──────────────────────────────────────────
    #[error("Could not build the HTTP client: {0}")]
    #[diagnostic(code(siteline::transport))]
    Transport(#[from] siteline_api::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err.category() {
            ErrorCategory::Permission => Self::Permission {
                detail: err.detail().to_owned(),
            },
            ErrorCategory::Network => Self::Connection {
                detail: err.detail().to_owned(),
            },
            ErrorCategory::Validation | ErrorCategory::Unknown => Self::Api {
                message: err.to_string(),
            },
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Permission { .. } => exit_code::PERMISSION,
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::MissingSetting { .. } | Self::InvalidUrl { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

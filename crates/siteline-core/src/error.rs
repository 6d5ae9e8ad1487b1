// ── Error classification and user-facing errors ──
//
// Every failure funnels into one of four categories, and the category
// decides the recovery path: Network may be answered from stale cache,
// Permission and Validation always surface, Unknown surfaces with the
// original text attached. Typed `siteline_api::Error` variants carry
// their category explicitly; message scanning exists only for errors
// that enter from outside the crate boundary.

use thiserror::Error;

// ── Category ────────────────────────────────────────────────────────

/// Recovery category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Timeouts, connectivity, 5xx, 408/504. Recoverable via stale cache.
    Network,
    /// 401/403. Never masked by cache.
    Permission,
    /// Malformed or structurally unexpected responses.
    Validation,
    Unknown,
}

impl ErrorCategory {
    /// Classify a typed API error. Explicit variant metadata wins;
    /// message heuristics are the last resort for transport errors that
    /// carry neither a kind flag nor a status.
    pub fn of(err: &siteline_api::Error) -> Self {
        match err {
            siteline_api::Error::Timeout { .. } => Self::Network,
            siteline_api::Error::Permission { .. } => Self::Permission,
            siteline_api::Error::Deserialization { .. }
            | siteline_api::Error::InvalidUrl(_) => Self::Validation,
            siteline_api::Error::Api { status, .. } => Self::of_status(*status),
            siteline_api::Error::Transport(e) => {
                if e.is_timeout() || e.is_connect() {
                    Self::Network
                } else if e.is_decode() {
                    Self::Validation
                } else if let Some(status) = e.status() {
                    Self::of_status(status.as_u16())
                } else {
                    Self::of_message(&e.to_string())
                }
            }
        }
    }

    /// Classify by HTTP status code.
    pub fn of_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Permission,
            // 504 sits inside the 5xx range; 408 is the lone 4xx timeout.
            408 | 500..=599 => Self::Network,
            400..=499 => Self::Validation,
            _ => Self::Unknown,
        }
    }

    /// Classify a bare error message: embedded status code first, then
    /// keyword sets, then `Unknown`. Total over any input.
    pub fn of_message(message: &str) -> Self {
        if let Some(status) = embedded_status(message) {
            return Self::of_status(status);
        }

        let lower = message.to_lowercase();
        if PERMISSION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Permission
        } else if NETWORK_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Network
        } else if VALIDATION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Validation
        } else {
            Self::Unknown
        }
    }
}

const PERMISSION_KEYWORDS: &[&str] = &[
    "permission",
    "unauthorized",
    "forbidden",
    "401",
    "403",
    "authentication",
    "access denied",
];

const NETWORK_KEYWORDS: &[&str] = &[
    "network",
    "fetch",
    "timeout",
    "timed out",
    "connection",
    "dns",
    "unreachable",
    "socket",
    "offline",
];

const VALIDATION_KEYWORDS: &[&str] = &[
    "parse",
    "invalid",
    "malformed",
    "schema",
    "deserial",
    "unexpected token",
];

/// First standalone 3-digit run in HTTP error range (4xx/5xx).
fn embedded_status(message: &str) -> Option<u16> {
    let bytes = message.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 3 {
                if let Ok(status) = message[start..i].parse::<u16>() {
                    if (400..=599).contains(&status) {
                        return Some(status);
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

// ── User-facing error type ──────────────────────────────────────────

/// Unified error type for the core services.
///
/// Permission and Network render fixed, actionable messages; the
/// original error text rides along in `detail` for logs and
/// diagnostics rather than the headline.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Access was denied -- check your permissions for this site")]
    Permission { detail: String },

    #[error("The service could not be reached -- check your connection")]
    Network { detail: String },

    #[error("The service returned an unexpected response: {detail}")]
    Validation { detail: String },

    #[error("Request failed: {detail}")]
    Unknown { detail: String },
}

impl CoreError {
    /// Build the user-facing error for an already-classified API failure.
    pub(crate) fn classified(category: ErrorCategory, err: &siteline_api::Error) -> Self {
        let detail = err.to_string();
        match category {
            ErrorCategory::Permission => Self::Permission { detail },
            ErrorCategory::Network => Self::Network { detail },
            ErrorCategory::Validation => Self::Validation { detail },
            ErrorCategory::Unknown => Self::Unknown { detail },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Permission { .. } => ErrorCategory::Permission,
            Self::Network { .. } => ErrorCategory::Network,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// The underlying error text, for logging.
    pub fn detail(&self) -> &str {
        match self {
            Self::Permission { detail }
            | Self::Network { detail }
            | Self::Validation { detail }
            | Self::Unknown { detail } => detail,
        }
    }
}

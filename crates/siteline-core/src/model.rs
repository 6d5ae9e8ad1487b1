// ── Core identity and site types ──
//
// SiteId and WebId are distinct newtypes on purpose: both are opaque
// identifier strings on the wire, and nothing stops a cell mix-up from
// putting one where the other belongs except the type system.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title used when a site record carries no usable title of its own.
pub const UNTITLED_SITE: &str = "Untitled site";

// ── SiteId / WebId ──────────────────────────────────────────────────

/// Opaque identifier of a site collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(String);

impl SiteId {
    /// Create from a raw candidate string; `None` for empty/blank input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a web within a site collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebId(String);

impl WebId {
    /// Create from a raw candidate string; `None` for empty/blank input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── SiteRecord ──────────────────────────────────────────────────────

/// One navigable site, as mapped from a search result row.
///
/// Constructed fresh on every successful fetch and never mutated; the
/// directory cache replaces records wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: SiteId,
    pub title: String,
    /// Absolute URL of the site. Always non-empty — rows without one are
    /// dropped during mapping.
    pub url: String,
    pub description: Option<String>,
    pub web_id: Option<WebId>,
    pub site_collection_url: Option<String>,
}

impl SiteRecord {
    /// The title to render, falling back to the placeholder.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_SITE
        } else {
            &self.title
        }
    }
}

//! Resilient data-access layer between `siteline-api` and UI consumers.
//!
//! Two services own everything interesting in this crate, and both solve
//! the same problem: combine a local cache, a remote call with a
//! deadline, and degraded-but-safe behavior when the call fails,
//! without blocking the caller or leaking stale state it shouldn't see.
//!
//! - **[`SiteDirectory`]** — the tenant's navigable site list, fetched
//!   through the search endpoint and cached in memory for five minutes.
//!   Stale cache substitutes for the network on connectivity failures
//!   only; permission and contract failures always surface.
//!
//! - **[`LicenseValidator`]** — the tenant's subscription verdict,
//!   persisted through a [`KeyValueStore`] with category-dependent
//!   freshness (24 h valid / 1 h invalid) and a 7-day offline grace
//!   window. Fails open on every remote failure; fails closed only when
//!   the session's tenant cannot be derived at all.
//!
//! Supporting cast: [`ErrorCategory`] (the classifier deciding which
//! recovery path a failure takes), [`TtlEntry`] (value + timestamp +
//! freshness predicate), [`TenantId`] (derived from the site host,
//! never guessed), and the swallow-and-log persistence primitive in
//! [`store`].

pub mod cache;
mod convert;
pub mod error;
pub mod license;
pub mod model;
pub mod sites;
pub mod store;
pub mod tenant;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::TtlEntry;
pub use error::{CoreError, ErrorCategory};
pub use license::{CachedLicenseStatus, LicenseCheck, LicenseConfig, LicenseValidator};
pub use model::{SiteId, SiteRecord, WebId};
pub use sites::{SiteDirectory, SiteDirectoryConfig, SiteNavigator};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use tenant::TenantId;

// Wire-level license types come straight from the api crate.
pub use siteline_api::{LicenseReason, LicenseStatus};

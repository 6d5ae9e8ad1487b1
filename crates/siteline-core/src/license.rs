// ── License validator ──
//
// Persisted, tenant-scoped TTL cache over the licensing endpoint, with
// category-dependent freshness and a long grace window. The policy here
// is fail open: an unreachable license service must never block site
// navigation. The single exception is a session whose tenant cannot be
// derived at all — that is a configuration failure, answered with a
// fixed invalid status and no I/O.
//
// Freshness asymmetry: a cached "valid" is trusted for 24 h (and up to
// 7 days offline), a cached "invalid" only for 1 h, so a tenant that
// just purchased a license is re-checked promptly.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use siteline_api::{LicenseReason, LicenseStatus, LicensingClient, deadline};
use tracing::{debug, warn};

use crate::cache::is_fresh;
use crate::error::ErrorCategory;
use crate::store::{KeyValueStore, set_json};
use crate::tenant::TenantId;

/// Store key prefix; the tenant id completes the key.
const CACHE_KEY_PREFIX: &str = "siteline.license.";

/// Tunables for the license validator.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    /// Freshness window for a cached `valid` response.
    pub valid_ttl: Duration,
    /// Freshness window for a cached `invalid` response.
    pub invalid_ttl: Duration,
    /// Offline allowance for a cached `valid` response.
    pub grace: Duration,
    /// Deadline for one validation call.
    pub timeout: Duration,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            valid_ttl: Duration::from_secs(24 * 60 * 60),
            invalid_ttl: Duration::from_secs(60 * 60),
            grace: Duration::from_secs(7 * 24 * 60 * 60),
            timeout: siteline_api::DEFAULT_TIMEOUT,
        }
    }
}

/// What the store remembers between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLicenseStatus {
    pub response: LicenseStatus,
    pub cached_at: DateTime<Utc>,
    /// The tenant the response was issued for. An entry under the right
    /// key but the wrong tenant is discarded, never partially trusted.
    pub tenant_id: String,
}

/// A license answer plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseCheck {
    pub status: LicenseStatus,
    /// `true` when the answer was served from cache rather than a live
    /// validation call.
    pub cached: bool,
}

/// Per-session license validator. Tenant extraction happens once, at
/// construction; a session on an unrecognized host stays
/// tenant-unknown for its lifetime.
pub struct LicenseValidator {
    licensing: LicensingClient,
    store: Arc<dyn KeyValueStore>,
    tenant: Option<TenantId>,
    config: LicenseConfig,
}

impl LicenseValidator {
    pub fn new(
        licensing: LicensingClient,
        store: Arc<dyn KeyValueStore>,
        site_url: &url::Url,
    ) -> Self {
        Self::with_config(licensing, store, site_url, LicenseConfig::default())
    }

    pub fn with_config(
        licensing: LicensingClient,
        store: Arc<dyn KeyValueStore>,
        site_url: &url::Url,
        config: LicenseConfig,
    ) -> Self {
        let tenant = TenantId::from_site_url(site_url);
        let validator = Self {
            licensing,
            store,
            tenant,
            config,
        };
        match &validator.tenant {
            Some(tenant) => {
                let warm = validator.read_cache(tenant).is_some();
                debug!(%tenant, warm, "license validator ready");
            }
            None => warn!(url = %site_url, "no tenant could be derived from the site URL"),
        }
        validator
    }

    /// The tenant this validator answers for, if one could be derived.
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Synchronous cache-only read, for render paths that cannot await.
    ///
    /// A cached `valid` answer is usable for the whole grace window; a
    /// cached `invalid` answer only for the short freshness window.
    /// Anything else — no tenant, no entry, wrong tenant, out of window
    /// — is `None`.
    pub fn quick_cache_status(&self) -> Option<LicenseStatus> {
        let tenant = self.tenant.as_ref()?;
        let entry = self.read_cache(tenant)?;
        let window = if entry.response.valid {
            self.config.grace
        } else {
            self.config.invalid_ttl
        };
        if is_fresh(entry.cached_at, Utc::now(), window) {
            Some(entry.response)
        } else {
            None
        }
    }

    /// The authoritative license answer.
    ///
    /// Never rejects: on any remote failure the validator falls open to
    /// the persisted entry (however old), or to a synthesized
    /// assume-valid status when nothing is persisted at all. Pass
    /// `force_refresh` to skip the freshness fast path.
    pub async fn status(&self, force_refresh: bool) -> LicenseCheck {
        let Some(tenant) = self.tenant.clone() else {
            return LicenseCheck {
                status: invalid_status(LicenseReason::InvalidTenantId),
                cached: false,
            };
        };

        if !force_refresh {
            if let Some(entry) = self.read_cache(&tenant) {
                let window = if entry.response.valid {
                    self.config.valid_ttl
                } else {
                    self.config.invalid_ttl
                };
                if is_fresh(entry.cached_at, Utc::now(), window) {
                    debug!(%tenant, valid = entry.response.valid, "serving license from cache");
                    return LicenseCheck {
                        status: entry.response,
                        cached: true,
                    };
                }
            }
        }

        let result = deadline(
            "license validation",
            self.config.timeout,
            self.licensing.validate(tenant.as_str()),
        )
        .await;

        match result {
            Ok(status) => {
                debug!(%tenant, valid = status.valid, "license validated");
                self.write_cache(&tenant, &status);
                LicenseCheck {
                    status,
                    cached: false,
                }
            }
            Err(err) => {
                let category = ErrorCategory::of(&err);
                warn!(%tenant, error = %err, ?category, "license validation failed, failing open");
                if let Some(entry) = self.read_cache(&tenant) {
                    return LicenseCheck {
                        status: entry.response,
                        cached: true,
                    };
                }
                LicenseCheck {
                    status: assume_valid_status(),
                    cached: false,
                }
            }
        }
    }

    /// Remove the persisted entry. Best-effort — storage failures are
    /// absorbed by the store.
    pub fn clear_cache(&self) {
        if let Some(tenant) = &self.tenant {
            self.store.remove(&cache_key(tenant));
            debug!(%tenant, "license cache cleared");
        }
    }

    // ── Cache access ─────────────────────────────────────────────────

    /// The persisted entry for `tenant`, with no freshness judgement.
    /// Structurally invalid or tenant-mismatched entries are removed on
    /// sight.
    fn read_cache(&self, tenant: &TenantId) -> Option<CachedLicenseStatus> {
        let key = cache_key(tenant);
        let raw = self.store.get_raw(&key)?;
        let entry: CachedLicenseStatus = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%tenant, error = %err, "license cache entry is malformed, discarding");
                self.store.remove(&key);
                return None;
            }
        };
        if entry.tenant_id != tenant.as_str() {
            warn!(
                %tenant,
                cached_tenant = %entry.tenant_id,
                "license cache entry belongs to another tenant, discarding"
            );
            self.store.remove(&key);
            return None;
        }
        Some(entry)
    }

    fn write_cache(&self, tenant: &TenantId, status: &LicenseStatus) {
        let entry = CachedLicenseStatus {
            response: status.clone(),
            cached_at: Utc::now(),
            tenant_id: tenant.as_str().to_owned(),
        };
        set_json(self.store.as_ref(), &cache_key(tenant), &entry);
    }
}

fn cache_key(tenant: &TenantId) -> String {
    format!("{CACHE_KEY_PREFIX}{tenant}")
}

/// The answer for a session whose license cannot be checked because the
/// tenant itself is unusable.
fn invalid_status(reason: LicenseReason) -> LicenseStatus {
    LicenseStatus {
        valid: false,
        tier: None,
        features: Vec::new(),
        expires_at: None,
        reason: Some(reason),
    }
}

/// The fail-open answer when nothing is known about the tenant's
/// license and the service is unreachable.
fn assume_valid_status() -> LicenseStatus {
    LicenseStatus {
        valid: true,
        tier: None,
        features: Vec::new(),
        expires_at: None,
        reason: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, get_json};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITE_URL: &str = "https://contoso.sharepoint.com/sites/home";

    async fn setup() -> (MockServer, Arc<MemoryStore>, LicenseValidator) {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let validator = validator_with(&server, Arc::clone(&store), SITE_URL);
        (server, store, validator)
    }

    fn validator_with(
        server: &MockServer,
        store: Arc<MemoryStore>,
        site_url: &str,
    ) -> LicenseValidator {
        let base_url = Url::parse(&server.uri()).unwrap();
        let licensing = LicensingClient::with_client(reqwest::Client::new(), base_url, "siteline");
        LicenseValidator::new(licensing, store, &Url::parse(site_url).unwrap())
    }

    fn seed(store: &MemoryStore, tenant: &str, valid: bool, age: chrono::Duration) {
        let entry = CachedLicenseStatus {
            response: LicenseStatus {
                valid,
                tier: valid.then(|| "enterprise".to_owned()),
                features: Vec::new(),
                expires_at: None,
                reason: (!valid).then_some(LicenseReason::SubscriptionExpired),
            },
            cached_at: Utc::now() - age,
            tenant_id: tenant.to_owned(),
        };
        set_json(store, &format!("siteline.license.{tenant}"), &entry);
    }

    fn mock_valid(valid: bool) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "valid": valid }))
    }

    // ── Quick cache reads ────────────────────────────────────────────

    #[tokio::test]
    async fn quick_read_honors_grace_for_valid() {
        let (_server, store, validator) = setup().await;
        seed(&store, "contoso", true, chrono::Duration::days(5));

        let status = validator.quick_cache_status().unwrap();
        assert!(status.valid);
    }

    #[tokio::test]
    async fn quick_read_rejects_valid_past_grace() {
        let (_server, store, validator) = setup().await;
        seed(&store, "contoso", true, chrono::Duration::days(8));

        assert!(validator.quick_cache_status().is_none());
    }

    #[tokio::test]
    async fn quick_read_limits_invalid_to_short_window() {
        let (_server, store, validator) = setup().await;
        seed(&store, "contoso", false, chrono::Duration::minutes(90));

        assert!(validator.quick_cache_status().is_none());
    }

    #[tokio::test]
    async fn quick_read_rejects_other_tenants_entry() {
        let (_server, store, validator) = setup().await;
        // Fresh, valid — but issued for someone else, stored under our key.
        let entry = CachedLicenseStatus {
            response: LicenseStatus {
                valid: true,
                tier: None,
                features: Vec::new(),
                expires_at: None,
                reason: None,
            },
            cached_at: Utc::now(),
            tenant_id: "fabrikam".into(),
        };
        set_json(store.as_ref(), "siteline.license.contoso", &entry);

        assert!(validator.quick_cache_status().is_none());
        // The poisoned entry is gone, not just skipped.
        assert!(store.get_raw("siteline.license.contoso").is_none());
    }

    #[tokio::test]
    async fn quick_read_rejects_corrupt_entry() {
        let (_server, store, validator) = setup().await;
        store.set_raw("siteline.license.contoso", "{\"response\": 41}".into());

        assert!(validator.quick_cache_status().is_none());
        assert!(store.get_raw("siteline.license.contoso").is_none());
    }

    // ── Authoritative checks ─────────────────────────────────────────

    #[tokio::test]
    async fn fresh_valid_cache_short_circuits() {
        let (server, store, validator) = setup().await;
        seed(&store, "contoso", true, chrono::Duration::minutes(90));

        Mock::given(method("GET"))
            .respond_with(mock_valid(true))
            .expect(0)
            .mount(&server)
            .await;

        let check = validator.status(false).await;
        assert!(check.status.valid);
        assert!(check.cached);
    }

    #[tokio::test]
    async fn stale_invalid_cache_triggers_refetch() {
        let (server, store, validator) = setup().await;
        // Same 90-minute age as above, but an invalid verdict: past the
        // short window, so a live call happens.
        seed(&store, "contoso", false, chrono::Duration::minutes(90));

        Mock::given(method("GET"))
            .and(path("/api/v1/validate"))
            .respond_with(mock_valid(true))
            .expect(1)
            .mount(&server)
            .await;

        let check = validator.status(false).await;
        assert!(check.status.valid);
        assert!(!check.cached);
    }

    #[tokio::test]
    async fn force_refresh_skips_fresh_cache() {
        let (server, store, validator) = setup().await;
        seed(&store, "contoso", true, chrono::Duration::minutes(5));

        Mock::given(method("GET"))
            .respond_with(mock_valid(true))
            .expect(1)
            .mount(&server)
            .await;

        let check = validator.status(true).await;
        assert!(!check.cached);
    }

    #[tokio::test]
    async fn success_persists_tenant_scoped_entry() {
        let (server, store, validator) = setup().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": true,
                "tier": "enterprise",
                "features": ["favorites"]
            })))
            .mount(&server)
            .await;

        let check = validator.status(false).await;
        assert!(!check.cached);

        let entry: CachedLicenseStatus =
            get_json(store.as_ref(), "siteline.license.contoso").unwrap();
        assert_eq!(entry.tenant_id, "contoso");
        assert_eq!(entry.response, check.status);
    }

    #[tokio::test]
    async fn failure_fails_open_to_stale_cache() {
        let (server, store, validator) = setup().await;
        // Ancient entry — far beyond even the grace window.
        seed(&store, "contoso", true, chrono::Duration::days(30));

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let check = validator.status(false).await;
        assert!(check.status.valid);
        assert!(check.cached);
        assert_eq!(check.status.tier.as_deref(), Some("enterprise"));
    }

    #[tokio::test]
    async fn failure_without_cache_assumes_valid() {
        let (server, _store, validator) = setup().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let check = validator.status(false).await;
        assert!(check.status.valid);
        assert!(!check.cached);
        assert!(check.status.tier.is_none());
        assert!(check.status.features.is_empty());
    }

    #[tokio::test]
    async fn permission_failure_also_fails_open() {
        let (server, _store, validator) = setup().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let check = validator.status(false).await;
        assert!(check.status.valid);
    }

    #[tokio::test]
    async fn unknown_tenant_is_terminal_invalid() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());

        Mock::given(method("GET"))
            .respond_with(mock_valid(true))
            .expect(0)
            .mount(&server)
            .await;

        let validator = validator_with(&server, store, "https://intranet.example.com/");
        assert!(validator.tenant().is_none());

        let check = validator.status(false).await;
        assert!(!check.status.valid);
        assert_eq!(check.status.reason, Some(LicenseReason::InvalidTenantId));
        assert!(!check.cached);
        assert!(validator.quick_cache_status().is_none());
    }

    #[tokio::test]
    async fn clear_cache_forces_next_call_to_network() {
        let (server, store, validator) = setup().await;
        seed(&store, "contoso", true, chrono::Duration::minutes(5));

        Mock::given(method("GET"))
            .respond_with(mock_valid(true))
            .expect(1)
            .mount(&server)
            .await;

        validator.clear_cache();
        assert!(store.get_raw("siteline.license.contoso").is_none());

        let check = validator.status(false).await;
        assert!(!check.cached);
    }
}

// ── Site directory service ──
//
// One in-memory TTL cache entry over the tenant's site list. The fast
// path never touches the network; the slow path runs one search query
// under the deadline guard. Stale cache substitutes for a failed fetch
// on Network failures ONLY — a permission or contract problem must
// reach the caller even when old data exists.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use siteline_api::{SearchClient, SearchRequest, deadline};
use tracing::{debug, warn};

use crate::cache::TtlEntry;
use crate::convert::{map_rows, validate_records};
use crate::error::{CoreError, ErrorCategory};
use crate::model::SiteRecord;

/// Tunables for the site directory.
#[derive(Debug, Clone)]
pub struct SiteDirectoryConfig {
    /// Freshness window for the in-memory cache.
    pub cache_ttl: Duration,
    /// Maximum rows requested per search query.
    pub row_limit: u32,
    /// Deadline for one search call.
    pub timeout: Duration,
}

impl Default for SiteDirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            row_limit: 500,
            timeout: siteline_api::DEFAULT_TIMEOUT,
        }
    }
}

/// Collaborator that actually opens a site. The directory has no
/// opinion on how navigation happens.
pub trait SiteNavigator {
    fn open(&self, url: &str, new_tab: bool);
}

/// The tenant's navigable site list, fetched through search and cached
/// in memory for the session. One instance per session.
pub struct SiteDirectory {
    search: SearchClient,
    config: SiteDirectoryConfig,
    cache: Mutex<Option<TtlEntry<Vec<SiteRecord>>>>,
}

impl SiteDirectory {
    pub fn new(search: SearchClient) -> Self {
        Self::with_config(search, SiteDirectoryConfig::default())
    }

    pub fn with_config(search: SearchClient, config: SiteDirectoryConfig) -> Self {
        Self {
            search,
            config,
            cache: Mutex::new(None),
        }
    }

    /// The sites the caller is permitted to see.
    ///
    /// Served from cache when it is younger than the freshness window;
    /// otherwise one remote query replaces the cache wholesale. An empty
    /// list is a legitimate answer. On a connectivity failure an
    /// existing cache entry of any age is substituted; every other
    /// failure propagates as a typed [`CoreError`].
    pub async fn sites(&self) -> Result<Vec<SiteRecord>, CoreError> {
        if let Some(records) = self.cached_fresh() {
            debug!(count = records.len(), "serving sites from cache");
            return Ok(records);
        }

        let request = SearchRequest::site_collections(self.config.row_limit);
        let result = deadline(
            "site search",
            self.config.timeout,
            self.search.post_query(&request),
        )
        .await;

        match result {
            Ok(rows) => {
                let records = map_rows(&rows);
                debug!(count = records.len(), "site directory refreshed");
                let mut cache = self.cache.lock().expect("site cache lock poisoned");
                *cache = Some(TtlEntry::new(records.clone()));
                Ok(records)
            }
            Err(err) => {
                let category = ErrorCategory::of(&err);
                if category == ErrorCategory::Network {
                    if let Some(stale) = self.cached_any_age() {
                        warn!(
                            error = %err,
                            count = stale.len(),
                            "search unreachable, serving stale site cache"
                        );
                        return Ok(stale);
                    }
                }
                warn!(error = %err, ?category, "site search failed");
                Err(CoreError::classified(category, &err))
            }
        }
    }

    /// Drop the cache unconditionally; the next [`sites`](Self::sites)
    /// call is guaranteed to hit the network.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().expect("site cache lock poisoned");
        if cache.take().is_some() {
            debug!("site cache cleared");
        }
    }

    /// Open a site through the navigator collaborator.
    pub fn navigate(&self, navigator: &dyn SiteNavigator, url: &str, new_tab: bool) {
        debug!(url, new_tab, "navigating to site");
        navigator.open(url, new_tab);
    }

    // ── Cache access ─────────────────────────────────────────────────

    /// The cached records, if present, fresh, and valid. An entry that
    /// fails validation is dropped on the spot and reported absent.
    fn cached_fresh(&self) -> Option<Vec<SiteRecord>> {
        let mut cache = self.cache.lock().expect("site cache lock poisoned");
        let entry = cache.as_ref()?;
        if !entry.is_fresh(Utc::now(), self.config.cache_ttl) {
            return None;
        }
        if !validate_records(entry.value()) {
            warn!("cached site list failed validation, dropping it");
            *cache = None;
            return None;
        }
        Some(entry.value().clone())
    }

    /// The cached records regardless of age — the stale-fallback read.
    /// Validation still applies; an invalid entry is dropped, not served.
    fn cached_any_age(&self) -> Option<Vec<SiteRecord>> {
        let mut cache = self.cache.lock().expect("site cache lock poisoned");
        let entry = cache.as_ref()?;
        if !validate_records(entry.value()) {
            warn!("cached site list failed validation, dropping it");
            *cache = None;
            return None;
        }
        Some(entry.value().clone())
    }

    #[cfg(test)]
    fn backdate_cache(&self, age: chrono::Duration) {
        let mut cache = self.cache.lock().expect("site cache lock poisoned");
        if let Some(entry) = cache.take() {
            let stamped = TtlEntry::at(entry.into_value(), Utc::now() - age);
            *cache = Some(stamped);
        }
    }

    #[cfg(test)]
    fn seed_cache(&self, records: Vec<SiteRecord>) {
        let mut cache = self.cache.lock().expect("site cache lock poisoned");
        *cache = Some(TtlEntry::new(records));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, SiteDirectory) {
        let server = MockServer::start().await;
        let base_url = Url::parse(&server.uri()).unwrap();
        let search = SearchClient::with_client(reqwest::Client::new(), base_url);
        (server, SiteDirectory::new(search))
    }

    fn results_body(rows: serde_json::Value) -> serde_json::Value {
        json!({
            "PrimaryQueryResult": {
                "RelevantResults": { "Table": { "Rows": rows } }
            }
        })
    }

    fn two_sites() -> serde_json::Value {
        results_body(json!([
            {
                "Cells": [
                    {"Key": "Title", "Value": "Marketing"},
                    {"Key": "Path", "Value": "https://contoso.sharepoint.com/sites/marketing"},
                    {"Key": "SiteId", "Value": "site-1"}
                ]
            },
            {
                "Cells": [
                    {"Key": "Title", "Value": "HR"},
                    {"Key": "Path", "Value": "https://contoso.sharepoint.com/sites/hr"},
                    {"Key": "SiteId", "Value": "site-2"}
                ]
            }
        ]))
    }

    #[tokio::test]
    async fn fresh_cache_short_circuits() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .and(path("/_api/search/postquery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .expect(1)
            .mount(&server)
            .await;

        let first = directory.sites().await.unwrap();
        let second = directory.sites().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        // Mock expectation (exactly one request) is verified on drop.
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .expect(2)
            .mount(&server)
            .await;

        directory.sites().await.unwrap();
        directory.backdate_cache(chrono::Duration::minutes(6));
        directory.sites().await.unwrap();
    }

    #[tokio::test]
    async fn stale_cache_substitutes_on_network_failure() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let first = directory.sites().await.unwrap();
        // Well past the freshness window, but usable as a fallback.
        directory.backdate_cache(chrono::Duration::hours(2));
        let second = directory.sites().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn permission_failure_is_never_masked_by_cache() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        directory.sites().await.unwrap();
        directory.backdate_cache(chrono::Duration::hours(2));
        let result = directory.sites().await;

        match result {
            Err(err) => assert_eq!(err.category(), ErrorCategory::Permission),
            Ok(_) => panic!("expected a permission error"),
        }
    }

    #[tokio::test]
    async fn validation_failure_propagates_without_fallback() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<gateway html>"))
            .mount(&server)
            .await;

        directory.sites().await.unwrap();
        directory.backdate_cache(chrono::Duration::hours(2));
        let result = directory.sites().await;

        match result {
            Err(err) => assert_eq!(err.category(), ErrorCategory::Validation),
            Ok(_) => panic!("expected a validation error"),
        }
    }

    #[tokio::test]
    async fn network_failure_without_cache_surfaces() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = directory.sites().await;

        match result {
            Err(err) => {
                assert_eq!(err.category(), ErrorCategory::Network);
                assert!(err.to_string().contains("check your connection"));
            }
            Ok(_) => panic!("expected a network error"),
        }
    }

    #[tokio::test]
    async fn invalid_cached_entry_is_dropped_and_refetched() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .expect(1)
            .mount(&server)
            .await;

        // Serde bypasses the newtype invariants, which is exactly how a
        // bad entry could reach the cache outside the mapping pipeline.
        let bogus: Vec<SiteRecord> = serde_json::from_value(json!([
            {
                "id": "",
                "title": "Ghost",
                "url": "",
                "description": null,
                "web_id": null,
                "site_collection_url": null
            }
        ]))
        .unwrap();
        directory.seed_cache(bogus);

        let records = directory.sites().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn clear_cache_forces_refetch() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_sites()))
            .expect(2)
            .mount(&server)
            .await;

        directory.sites().await.unwrap();
        directory.clear_cache();
        directory.sites().await.unwrap();
    }

    #[tokio::test]
    async fn empty_result_is_legitimate_and_cached() {
        let (server, directory) = setup().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(results_body(json!([]))))
            .expect(1)
            .mount(&server)
            .await;

        assert!(directory.sites().await.unwrap().is_empty());
        // Second call hits the (empty) cache, not the server.
        assert!(directory.sites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn navigate_delegates() {
        use std::sync::Mutex as StdMutex;

        struct Recorder(StdMutex<Vec<(String, bool)>>);
        impl SiteNavigator for Recorder {
            fn open(&self, url: &str, new_tab: bool) {
                self.0
                    .lock()
                    .expect("recorder lock")
                    .push((url.to_owned(), new_tab));
            }
        }

        let (_server, directory) = setup().await;
        let recorder = Recorder(StdMutex::new(Vec::new()));
        directory.navigate(&recorder, "https://contoso.sharepoint.com/sites/hr", true);

        let calls = recorder.0.lock().expect("recorder lock");
        assert_eq!(
            *calls,
            vec![("https://contoso.sharepoint.com/sites/hr".to_owned(), true)]
        );
    }
}

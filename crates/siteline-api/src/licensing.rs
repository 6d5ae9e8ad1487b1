// Licensing endpoint HTTP client
//
// A single GET against the license service:
// `{base}/api/v1/validate?tenant={tenant}&product={product}`.
// The response body is the license status itself — no envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Wire types ──────────────────────────────────────────────────────

/// Why a subscription is not (or no longer) valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseReason {
    TenantNotRegistered,
    SubscriptionExpired,
    SubscriptionCanceled,
    SubscriptionInactive,
    MissingTenantId,
    InvalidTenantId,
    RateLimitExceeded,
    ServerError,
}

/// The license service's verdict for one tenant.
///
/// Also the shape siteline synthesizes locally when it has to answer
/// without reaching the service (fail-open, unknown tenant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatus {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<LicenseReason>,
}

impl LicenseStatus {
    /// Whether a named feature is enabled on this license.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.valid && self.features.iter().any(|f| f == feature)
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the license validation endpoint.
pub struct LicensingClient {
    http: reqwest::Client,
    base_url: Url,
    product: String,
}

impl LicensingClient {
    /// Create a new licensing client from a `TransportConfig`.
    ///
    /// `base_url` is the license service root; `product` identifies this
    /// product line in validation queries.
    pub fn new(
        base_url: Url,
        product: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            product: product.into(),
        })
    }

    /// Create a licensing client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, product: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            product: product.into(),
        }
    }

    /// The product identifier sent with every validation query.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Ask the license service for the current verdict on `tenant`.
    pub async fn validate(&self, tenant: &str) -> Result<LicenseStatus, Error> {
        let mut url = self.endpoint_url()?;
        url.query_pairs_mut()
            .append_pair("tenant", tenant)
            .append_pair("product", &self.product);
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Permission {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            let p = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {p:?})"),
                body,
            }
        })
    }

    fn endpoint_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/api/v1/validate")).map_err(Error::InvalidUrl)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

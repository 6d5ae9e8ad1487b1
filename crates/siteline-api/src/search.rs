// Search endpoint HTTP client
//
// Wraps `reqwest::Client` with postquery URL construction and envelope
// unwrapping. The endpoint answers in two shapes depending on the
// OData mode negotiated by the host: either the query result directly,
// or wrapped as `{"d": {"postquery": ...}}` (verbose). Both are
// handled here — callers only ever see the flat row list.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Request types ───────────────────────────────────────────────────

/// A search query in the shape the postquery endpoint expects.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    #[serde(rename = "Querytext")]
    pub query_text: String,
    #[serde(rename = "SelectProperties")]
    pub select_properties: Vec<String>,
    #[serde(rename = "RowLimit")]
    pub row_limit: u32,
    #[serde(rename = "TrimDuplicates")]
    pub trim_duplicates: bool,
}

impl SearchRequest {
    /// Query for every site-class record the caller is permitted to see.
    pub fn site_collections(row_limit: u32) -> Self {
        Self {
            query_text: "contentclass:STS_Site OR contentclass:STS_Web".into(),
            select_properties: [
                "Title",
                "Path",
                "Description",
                "SiteId",
                "WebId",
                "SiteCollectionUrl",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
            row_limit,
            trim_duplicates: true,
        }
    }
}

#[derive(Serialize)]
struct PostQueryBody<'a> {
    request: &'a SearchRequest,
}

// ── Response types ──────────────────────────────────────────────────

/// One flat key/value cell of a search result row.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCell {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: Option<String>,
}

/// One raw result row: an unordered list of cells.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRow {
    #[serde(rename = "Cells", default)]
    pub cells: Vec<SearchCell>,
}

impl SearchRow {
    /// The value of the cell with the given key, if the cell exists and
    /// carries a value.
    pub fn cell(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.key == key)
            .and_then(|c| c.value.as_deref())
    }

    /// Whether a cell with the given key exists at all, valued or not.
    pub fn has_cell(&self, key: &str) -> bool {
        self.cells.iter().any(|c| c.key == key)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "PrimaryQueryResult")]
    primary_query_result: Option<PrimaryQueryResult>,
}

#[derive(Debug, Deserialize)]
struct PrimaryQueryResult {
    #[serde(rename = "RelevantResults")]
    relevant_results: Option<RelevantResults>,
}

#[derive(Debug, Deserialize)]
struct RelevantResults {
    #[serde(rename = "Table")]
    table: Option<ResultTable>,
}

#[derive(Debug, Deserialize)]
struct ResultTable {
    #[serde(rename = "Rows", default)]
    rows: Vec<SearchRow>,
}

/// Verbose-mode envelope: `{"d": {"postquery": <SearchResponse>}}`.
#[derive(Debug, Deserialize)]
struct VerboseEnvelope {
    d: VerboseBody,
}

#[derive(Debug, Deserialize)]
struct VerboseBody {
    postquery: SearchResponse,
}

impl SearchResponse {
    fn into_rows(self) -> Vec<SearchRow> {
        self.primary_query_result
            .and_then(|p| p.relevant_results)
            .and_then(|r| r.table)
            .map(|t| t.rows)
            .unwrap_or_default()
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the tenant search endpoint.
///
/// `POST {base}/_api/search/postquery`, bearer auth attached by the
/// transport layer.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SearchClient {
    /// Create a new search client from a `TransportConfig`.
    ///
    /// The `base_url` is the site root the session is running under,
    /// e.g. `https://contoso.sharepoint.com`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a search client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The site base URL this client queries under.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue one search query and return the raw result rows.
    ///
    /// The envelope (verbose or direct) is stripped before the caller
    /// sees it; a response with no results at any nesting level is a
    /// legitimate empty row list, not an error.
    pub async fn post_query(&self, request: &SearchRequest) -> Result<Vec<SearchRow>, Error> {
        let url = self.endpoint_url()?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&PostQueryBody { request })
            .send()
            .await
            .map_err(Error::Transport)?;

        Ok(parse_search_body(resp).await?.into_rows())
    }

    fn endpoint_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/_api/search/postquery")).map_err(Error::InvalidUrl)
    }
}

// ── Response parsing ────────────────────────────────────────────────

/// Check the HTTP status, then parse the body.
///
/// The verbose wrap is tried first: the direct shape is all-optional and
/// would swallow a verbose body as "no results" if tried the other way
/// around.
async fn parse_search_body(resp: reqwest::Response) -> Result<SearchResponse, Error> {
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

    if let Ok(envelope) = serde_json::from_str::<VerboseEnvelope>(&body) {
        return Ok(envelope.d.postquery);
    }

    serde_json::from_str::<SearchResponse>(&body).map_err(|e| {
        let p = preview(&body);
        Error::Deserialization {
            message: format!("{e} (body preview: {p:?})"),
            body,
        }
    })
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

// ── Search row → SiteRecord mapping ──
//
// Three stages, each logged by volume: filter raw rows down to those
// exposing a usable path and a title field, map the flat cell list into
// records (identifiers only from non-empty candidates), and drop
// anything that still lacks a url or id. A non-empty input mapping to
// nothing is logged loudly — that shape of silence usually means the
// search schema drifted, not that the tenant has no sites.

use siteline_api::SearchRow;
use tracing::{debug, warn};

use crate::model::{SiteId, SiteRecord, UNTITLED_SITE, WebId};

/// Stage-1 predicate: the row exposes a non-empty `Path` value and has a
/// `Title` cell (valued or not).
pub(crate) fn has_path_and_title(row: &SearchRow) -> bool {
    row.cell("Path").is_some_and(|p| !p.trim().is_empty()) && row.has_cell("Title")
}

/// Stage-2/3 map: build a record from a row's cells, or `None` if the
/// row lacks a non-empty url or site id.
pub(crate) fn record_from_row(row: &SearchRow) -> Option<SiteRecord> {
    let url = row.cell("Path").map(str::trim).filter(|p| !p.is_empty())?;
    let id = SiteId::new(row.cell("SiteId").unwrap_or_default())?;

    let title = row
        .cell("Title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_SITE);

    Some(SiteRecord {
        id,
        title: title.to_owned(),
        url: url.to_owned(),
        description: row
            .cell("Description")
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned),
        web_id: row.cell("WebId").and_then(WebId::new),
        site_collection_url: row
            .cell("SiteCollectionUrl")
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_owned),
    })
}

/// Run the full pipeline over a raw result set.
pub(crate) fn map_rows(rows: &[SearchRow]) -> Vec<SiteRecord> {
    let total = rows.len();

    let candidates: Vec<&SearchRow> = rows.iter().filter(|r| has_path_and_title(r)).collect();
    debug!(total, candidates = candidates.len(), "filtered raw search rows");

    let records: Vec<SiteRecord> = candidates
        .into_iter()
        .filter_map(record_from_row)
        .collect();
    debug!(mapped = records.len(), "mapped search rows into site records");

    if total > 0 && records.is_empty() {
        warn!(
            total,
            "every search row was dropped during mapping -- the response shape may have changed"
        );
    }

    records
}

/// Cache-read validation: every record must still carry a non-empty url
/// and id. The newtypes enforce this at construction, so a failure here
/// means the cache was populated by something other than the pipeline.
pub(crate) fn validate_records(records: &[SiteRecord]) -> bool {
    records
        .iter()
        .all(|r| !r.url.trim().is_empty() && !r.id.as_str().trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Option<&str>)]) -> SearchRow {
        let cells = cells
            .iter()
            .map(|(k, v)| {
                serde_json::json!({"Key": k, "Value": v})
            })
            .collect::<Vec<_>>();
        serde_json::from_value(serde_json::json!({ "Cells": cells })).unwrap()
    }

    #[test]
    fn row_without_path_is_excluded() {
        let rows = vec![row(&[
            ("Title", Some("Orphan")),
            ("SiteId", Some("s1")),
        ])];
        assert!(map_rows(&rows).is_empty());
    }

    #[test]
    fn row_without_title_cell_is_excluded() {
        let rows = vec![row(&[
            ("Path", Some("https://contoso.sharepoint.com/sites/x")),
            ("SiteId", Some("s1")),
        ])];
        assert!(map_rows(&rows).is_empty());
    }

    #[test]
    fn row_without_site_id_is_dropped_after_mapping() {
        let rows = vec![row(&[
            ("Title", Some("No id")),
            ("Path", Some("https://contoso.sharepoint.com/sites/x")),
            ("SiteId", Some("")),
        ])];
        assert!(map_rows(&rows).is_empty());
    }

    #[test]
    fn full_row_maps_completely() {
        let rows = vec![row(&[
            ("Title", Some("Marketing")),
            ("Path", Some("https://contoso.sharepoint.com/sites/marketing")),
            ("Description", Some("Campaigns")),
            ("SiteId", Some("site-1")),
            ("WebId", Some("web-1")),
            ("SiteCollectionUrl", Some("https://contoso.sharepoint.com")),
        ])];

        let records = map_rows(&rows);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "Marketing");
        assert_eq!(r.id.as_str(), "site-1");
        assert_eq!(r.web_id.as_ref().unwrap().as_str(), "web-1");
        assert_eq!(r.description.as_deref(), Some("Campaigns"));
    }

    #[test]
    fn empty_title_value_gets_placeholder() {
        let rows = vec![row(&[
            ("Title", Some("")),
            ("Path", Some("https://contoso.sharepoint.com/sites/x")),
            ("SiteId", Some("s1")),
        ])];

        let records = map_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, UNTITLED_SITE);
    }

    #[test]
    fn empty_optional_cells_collapse_to_none() {
        let rows = vec![row(&[
            ("Title", Some("T")),
            ("Path", Some("https://contoso.sharepoint.com/sites/x")),
            ("SiteId", Some("s1")),
            ("WebId", Some("")),
            ("Description", Some("  ")),
        ])];

        let records = map_rows(&rows);
        assert!(records[0].web_id.is_none());
        assert!(records[0].description.is_none());
    }
}

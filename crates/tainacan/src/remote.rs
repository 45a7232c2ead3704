//! Blocking client for the Tainacan REST API (`wp-json/tainacan/v2`). The
//! pagination crate drives it through `fetch_page` and `probe`; the CLI uses
//! it directly for one-shot page dumps.
//!
//! Types:
//!
//! - `CatalogConfig` holds the API base, collection id, page size, request
//!   timeout and the attachment fan-out bound.
//! - `TainacanClient` wraps a `reqwest` blocking client configured with that
//!   timeout.
//! - `CatalogError` separates transport/status failures from malformed bodies.
//!
//! Functions:
//!
//! - `TainacanClient::fetch_page` requests one page of items and settles the
//!   attachments of every item through `assemble_page`.
//! - `TainacanClient::probe` issues a `perpage=1` request at the first item
//!   offset of a page to learn whether that page has any content.
//! - `decode_items` / `decode_attachments` turn response bodies into model
//!   types, recognising WordPress error envelopes along the way.
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{Attachment, CatalogItem, CollectionPage, ItemsEnvelope};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    fn network(url: &Url, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    fn decode(url: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_base: Url,
    pub collection_id: u64,
    pub page_size: u32,
    pub timeout: Duration,
    pub attachment_concurrency: usize,
}

impl CatalogConfig {
    pub fn new(api_base: &str, collection_id: u64) -> Result<Self, CatalogError> {
        let trimmed = api_base.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidRequest(
                "catalog API base url must not be empty".into(),
            ));
        }
        let api_base = Url::parse(trimmed).map_err(|err| {
            CatalogError::InvalidRequest(format!("invalid catalog API base url '{trimmed}': {err}"))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(CatalogError::InvalidRequest(format!(
                "catalog API base url '{trimmed}' cannot carry a path"
            )));
        }
        if collection_id == 0 {
            return Err(CatalogError::InvalidRequest(
                "collection id must be greater than zero".into(),
            ));
        }
        Ok(Self {
            api_base,
            collection_id,
            page_size: 20,
            timeout: Duration::from_secs(10),
            attachment_concurrency: 8,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attachment_concurrency(mut self, concurrency: usize) -> Self {
        self.attachment_concurrency = concurrency.max(1);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TainacanClient {
    http: Client,
    config: CatalogConfig,
}

impl TainacanClient {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("acervo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CatalogError::InvalidRequest(format!("building http client: {err}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn fetch_page(&self, page: u32, page_size: u32) -> Result<CollectionPage, CatalogError> {
        if page == 0 {
            return Err(CatalogError::InvalidRequest(
                "page numbers start at 1".into(),
            ));
        }
        let envelope = self.fetch_items(page_size, u64::from(page))?;
        debug!(
            page,
            page_size,
            items = envelope.items.len(),
            reported_total = ?envelope.total_pages,
            "fetched collection page"
        );
        Ok(assemble_page(
            page,
            envelope,
            self.config.attachment_concurrency,
            |item_id| self.fetch_attachments(item_id),
        ))
    }

    pub fn fetch_attachments(&self, item_id: u64) -> Result<Vec<Attachment>, CatalogError> {
        let url = self.attachments_url(item_id)?;
        let body = self.get_text(&url)?;
        decode_attachments(url.as_str(), &body)
    }

    /// Whether `page` (at `page_size` items per page) holds at least one item.
    pub fn probe(&self, page: u32, page_size: u32) -> Result<bool, CatalogError> {
        if page == 0 {
            return Ok(false);
        }
        let url = self.probe_url(page, page_size)?;
        let body = self.get_text(&url)?;
        let present = !decode_items(url.as_str(), &body)?.items.is_empty();
        debug!(page, page_size, present, "probed collection page");
        Ok(present)
    }

    fn fetch_items(&self, per_page: u32, paged: u64) -> Result<ItemsEnvelope, CatalogError> {
        let url = self.items_url(per_page, paged)?;
        let body = self.get_text(&url)?;
        decode_items(url.as_str(), &body)
    }

    fn get_text(&self, url: &Url) -> Result<String, CatalogError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|err| CatalogError::network(url, err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| CatalogError::network(url, format!("reading body: {err}")))?;
        if !status.is_success() {
            // WordPress wraps REST failures in `{ code, message, data }`.
            let detail = serde_json::from_str::<ApiError>(&body)
                .map(|err| format!("{} ({})", err.message, err.code))
                .unwrap_or_else(|_| snippet(&body));
            return Err(CatalogError::network(url, format!("status {status}: {detail}")));
        }
        Ok(body)
    }

    fn items_url(&self, per_page: u32, paged: u64) -> Result<Url, CatalogError> {
        let collection = self.config.collection_id.to_string();
        let mut url = self.endpoint(&["collection", &collection, "items"])?;
        url.query_pairs_mut()
            .append_pair("perpage", &per_page.to_string())
            .append_pair("paged", &paged.to_string());
        Ok(url)
    }

    /// One item at the first offset of `page`, so the answer does not depend
    /// on the API's own page arithmetic.
    fn probe_url(&self, page: u32, page_size: u32) -> Result<Url, CatalogError> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size.max(1)) + 1;
        self.items_url(1, offset)
    }

    fn attachments_url(&self, item_id: u64) -> Result<Url, CatalogError> {
        let item = item_id.to_string();
        self.endpoint(&["items", &item, "attachments"])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.config.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                CatalogError::InvalidRequest("catalog API base url cannot carry a path".into())
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    message: String,
}

pub fn decode_items(url: &str, body: &str) -> Result<ItemsEnvelope, CatalogError> {
    if let Ok(envelope) = serde_json::from_str::<ItemsEnvelope>(body) {
        return Ok(envelope);
    }
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return Err(CatalogError::decode(
            url,
            format!("API error {}: {}", err.code, err.message),
        ));
    }
    Err(CatalogError::decode(
        url,
        format!("missing 'items' array; body starts with: {}", snippet(body)),
    ))
}

pub fn decode_attachments(url: &str, body: &str) -> Result<Vec<Attachment>, CatalogError> {
    if let Ok(attachments) = serde_json::from_str::<Vec<Attachment>>(body) {
        return Ok(attachments);
    }
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return Err(CatalogError::decode(
            url,
            format!("API error {}: {}", err.code, err.message),
        ));
    }
    Err(CatalogError::decode(
        url,
        format!("expected an attachment array; body starts with: {}", snippet(body)),
    ))
}

/// Settles attachments for every item of `envelope`, at most `concurrency`
/// requests at a time. A failed attachment fetch leaves that item with no
/// attachments; it never fails the page.
pub fn assemble_page<F>(
    page_number: u32,
    envelope: ItemsEnvelope,
    concurrency: usize,
    fetch_attachments: F,
) -> CollectionPage
where
    F: Fn(u64) -> Result<Vec<Attachment>, CatalogError> + Sync,
{
    let ItemsEnvelope { items, total_pages } = envelope;
    let mut settled = Vec::with_capacity(items.len());
    let fetch = &fetch_attachments;

    for chunk in items.chunks(concurrency.max(1)) {
        let batch: Vec<Vec<Attachment>> = thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|item| {
                    let item_id = item.id;
                    scope.spawn(move || fetch(item_id))
                })
                .collect();
            handles
                .into_iter()
                .zip(chunk)
                .map(|(handle, item)| match handle.join() {
                    Ok(Ok(attachments)) => attachments,
                    Ok(Err(err)) => {
                        warn!(item = item.id, error = %err, "attachment fetch failed; showing item without media");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(item = item.id, "attachment worker panicked; showing item without media");
                        Vec::new()
                    }
                })
                .collect()
        });
        settled.extend(batch);
    }

    let items = items
        .into_iter()
        .zip(settled)
        .map(|(raw, attachments)| CatalogItem::from_raw(raw, attachments))
        .collect();

    CollectionPage {
        page_number,
        items,
        reported_total_pages: total_pages,
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawItem;

    fn envelope_with(ids: impl IntoIterator<Item = u64>) -> ItemsEnvelope {
        ItemsEnvelope {
            items: ids
                .into_iter()
                .map(|id| RawItem {
                    id,
                    title: format!("Obra {id}"),
                    description: String::new(),
                    thumbnail_ref: None,
                })
                .collect(),
            total_pages: None,
        }
    }

    fn image_for(item_id: u64) -> Attachment {
        Attachment {
            id: item_id * 10,
            title: String::new(),
            description: String::new(),
            mime_type: "image/jpeg".into(),
            url: format!("https://cdn.example/{item_id}.jpg"),
            media_type: "image".into(),
            alt_text: None,
        }
    }

    fn client() -> TainacanClient {
        let config = CatalogConfig::new("https://museum.example/wp-json/tainacan/v2/", 2174)
            .unwrap()
            .with_page_size(36);
        TainacanClient::new(config).unwrap()
    }

    #[test]
    fn failed_attachment_fetch_only_empties_that_item() {
        let page = assemble_page(3, envelope_with(1..=36), 8, |item_id| {
            if item_id == 42 || item_id == 7 {
                return Err(CatalogError::Network {
                    url: format!("https://museum.example/items/{item_id}/attachments"),
                    message: "connection reset".into(),
                });
            }
            Ok(vec![image_for(item_id)])
        });

        assert_eq!(page.page_number, 3);
        assert_eq!(page.items.len(), 36);
        let seven = page.items.iter().find(|item| item.id == 7).unwrap();
        assert!(seven.attachments.is_empty());
        let with_media = page
            .items
            .iter()
            .filter(|item| item.image_attachments().count() == 1)
            .count();
        assert_eq!(with_media, 35);
    }

    #[test]
    fn item_42_failure_keeps_the_rest_of_the_page() {
        let page = assemble_page(3, envelope_with(20..56), 4, |item_id| {
            if item_id == 42 {
                Err(CatalogError::Decode {
                    url: "attachments".into(),
                    message: "not json".into(),
                })
            } else {
                Ok(vec![image_for(item_id)])
            }
        });
        assert_eq!(page.items.len(), 36);
        let failed = page.items.iter().find(|item| item.id == 42).unwrap();
        assert!(failed.attachments.is_empty());
        assert!(page
            .items
            .iter()
            .filter(|item| item.id != 42)
            .all(|item| item.attachments.len() == 1));
    }

    #[test]
    fn preserves_item_order_across_batches() {
        let page = assemble_page(1, envelope_with([5, 3, 9, 1, 7]), 2, |id| Ok(vec![image_for(id)]));
        let ids: Vec<u64> = page.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![5, 3, 9, 1, 7]);
        assert!(page
            .items
            .iter()
            .all(|item| item.attachments[0].id == item.id * 10));
    }

    #[test]
    fn decodes_items_envelope() {
        let body = r#"{ "items": [ { "id": 11, "title": "Escultura", "description": "Bronze", "_thumbnail_id": "55" } ], "total_pages": 4 }"#;
        let envelope = decode_items("items", body).unwrap();
        assert_eq!(envelope.items.len(), 1);
        assert_eq!(envelope.items[0].title, "Escultura");
        assert_eq!(envelope.total_pages, Some(4));
    }

    #[test]
    fn body_without_items_is_a_decode_error() {
        let err = decode_items("items", r#"{ "results": [] }"#).unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
        let err = decode_items("items", "<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }

    #[test]
    fn wordpress_error_body_is_reported() {
        let body = r#"{ "code": "rest_no_route", "message": "No route was found", "data": { "status": 404 } }"#;
        match decode_attachments("attachments", body).unwrap_err() {
            CatalogError::Decode { message, .. } => {
                assert!(message.contains("rest_no_route"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn builds_items_url_from_base_with_trailing_slash() {
        let url = client().items_url(36, 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://museum.example/wp-json/tainacan/v2/collection/2174/items?perpage=36&paged=3"
        );
    }

    #[test]
    fn existence_check_asks_for_the_first_item_of_the_page() {
        let base = "https://museum.example/wp-json/tainacan/v2/collection/2174/items";
        let client = client();
        assert_eq!(
            client.probe_url(3, 20).unwrap().as_str(),
            format!("{base}?perpage=1&paged=41")
        );
        assert_eq!(
            client.probe_url(1, 20).unwrap().as_str(),
            format!("{base}?perpage=1&paged=1")
        );
        assert_eq!(
            client.probe_url(54, 36).unwrap().as_str(),
            format!("{base}?perpage=1&paged=1909")
        );
        assert_eq!(
            client.probe_url(2, 0).unwrap().as_str(),
            format!("{base}?perpage=1&paged=2")
        );
    }

    #[test]
    fn builds_attachments_url() {
        let url = client().attachments_url(42).unwrap();
        assert_eq!(
            url.as_str(),
            "https://museum.example/wp-json/tainacan/v2/items/42/attachments"
        );
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(CatalogConfig::new("", 1).is_err());
        assert!(CatalogConfig::new("not a url", 1).is_err());
        assert!(CatalogConfig::new("https://museum.example/api", 0).is_err());
    }

    #[test]
    fn page_zero_is_rejected_without_a_request() {
        assert!(matches!(
            client().fetch_page(0, 20),
            Err(CatalogError::InvalidRequest(_))
        ));
        assert_eq!(client().probe(0, 20), Ok(false));
    }
}

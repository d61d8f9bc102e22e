use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::collection::CollectionError;

pub const DEFAULT_BASE_URL: &str = "https://api.si.edu/openaccess/api/v1.0";
const USER_AGENT: &str = concat!("artworks/", env!("CARGO_PKG_VERSION"));

/// One Smithsonian Open Access search hit that has a thumbnail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmithsonianRecord {
    pub record_id: String,
    pub title: String,
    pub creator_name: Option<String>,
    pub date: Option<String>,
    pub thumbnail_url: String,
}

impl SmithsonianRecord {
    pub fn display_creator(&self) -> &str {
        self.creator_name.as_deref().unwrap_or("Unknown Artist")
    }

    pub fn display_date(&self) -> &str {
        self.date.as_deref().unwrap_or("Unknown Date")
    }
}

/// Search-only client for the Smithsonian Open Access API.
///
/// Records have string identifiers and no per-item detail endpoint, so this
/// client does not implement `CollectionSource`.
pub struct SmithsonianClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl SmithsonianClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, CollectionError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| CollectionError::Unavailable(format!("invalid base URL {base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CollectionError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http,
        })
    }

    /// Search records, keeping only those with a thumbnail.
    pub async fn search(
        &self,
        query: &str,
        rows: usize,
    ) -> Result<Vec<SmithsonianRecord>, CollectionError> {
        let url = format!(
            "{}/search?q={}&rows={}&api_key={}",
            self.base_url,
            urlencoding::encode(query),
            rows,
            urlencoding::encode(&self.api_key),
        );
        debug!("Smithsonian search: q={} rows={}", query, rows);

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CollectionError::Status(status.as_u16()));
        }
        let json: serde_json::Value = resp.json().await?;

        Ok(parse_search_rows(&json))
    }
}

fn parse_search_rows(json: &serde_json::Value) -> Vec<SmithsonianRecord> {
    let Some(rows) = json
        .get("response")
        .and_then(|r| r.get("rows"))
        .and_then(|r| r.as_array())
    else {
        return Vec::new();
    };

    rows.iter().filter_map(parse_row).collect()
}

fn parse_row(row: &serde_json::Value) -> Option<SmithsonianRecord> {
    let content = row.get("content");

    let thumbnail_url = content
        .and_then(|c| c.get("descriptiveNonRepeating"))
        .and_then(|d| d.get("online_media"))
        .and_then(|m| m.get("media"))
        .and_then(|m| m.as_array())
        .and_then(|media| media.first())
        .and_then(|m| m.get("thumbnail"))
        .and_then(|t| t.as_str())
        .filter(|s| !s.is_empty())?
        .to_string();

    let record_id = row
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let title = row
        .get("title")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Untitled")
        .to_string();
    let creator_name = content
        .and_then(|c| c.get("freetext"))
        .and_then(|f| f.get("name"))
        .and_then(|n| n.as_array())
        .and_then(|names| names.first())
        .and_then(|n| n.get("content"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let date = content
        .and_then(|c| c.get("indexedStructured"))
        .and_then(|i| i.get("date"))
        .and_then(|d| d.as_array())
        .and_then(|dates| dates.first())
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Some(SmithsonianRecord {
        record_id,
        title,
        creator_name,
        date,
        thumbnail_url,
    })
}

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::collection::{
    CollectionError, CollectionItemDetail, CollectionSource, Department, ItemRef, ListFilter,
};

pub const DEFAULT_BASE_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1";
const USER_AGENT: &str = concat!("artworks/", env!("CARGO_PKG_VERSION"));

/// Client for the Metropolitan Museum of Art Collection API.
pub struct MetClient {
    base_url: String,
    http: reqwest::Client,
}

// -- Response types --

#[derive(Debug, Deserialize)]
struct DepartmentsResponse {
    #[serde(default)]
    departments: Vec<MetDepartment>,
}

#[derive(Debug, Deserialize)]
struct MetDepartment {
    #[serde(rename = "departmentId")]
    department_id: u32,
    #[serde(rename = "displayName")]
    display_name: String,
}

/// Shared shape of `/objects` and `/search`. Search returns `null` ids when
/// nothing matched.
#[derive(Debug, Deserialize)]
struct ObjectIdsResponse {
    #[serde(default)]
    #[allow(dead_code)]
    total: u64,
    #[serde(rename = "objectIDs", default)]
    object_ids: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct MetObject {
    #[serde(rename = "objectID")]
    object_id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "primaryImage", default)]
    primary_image: Option<String>,
    #[serde(rename = "primaryImageSmall", default)]
    primary_image_small: Option<String>,
    #[serde(rename = "artistDisplayName", default)]
    artist_display_name: Option<String>,
    #[serde(rename = "objectDate", default)]
    object_date: Option<String>,
    #[serde(default)]
    medium: Option<String>,
    #[serde(default)]
    dimensions: Option<String>,
    #[serde(rename = "creditLine", default)]
    credit_line: Option<String>,
    #[serde(default)]
    culture: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(rename = "objectURL", default)]
    object_url: Option<String>,
}

/// The API sends "" for every absent text field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<MetObject> for CollectionItemDetail {
    fn from(o: MetObject) -> Self {
        CollectionItemDetail {
            id: ItemRef(o.object_id),
            title: o.title.unwrap_or_default(),
            primary_image_url: non_empty(o.primary_image),
            primary_image_small_url: non_empty(o.primary_image_small),
            creator_name: non_empty(o.artist_display_name),
            date: non_empty(o.object_date),
            medium: non_empty(o.medium),
            dimensions: non_empty(o.dimensions),
            credit_line: non_empty(o.credit_line),
            culture: non_empty(o.culture),
            department: non_empty(o.department),
            object_url: non_empty(o.object_url),
        }
    }
}

impl MetClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CollectionError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| CollectionError::Unavailable(format!("invalid base URL {base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CollectionError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.base_url, endpoint);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CollectionError> {
        debug!("MET request: {}", url);
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CollectionError::Status(status.as_u16()));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CollectionSource for MetClient {
    async fn departments(&self) -> Result<Vec<Department>, CollectionError> {
        let url = self.build_url("/departments", &[]);
        let resp: DepartmentsResponse = self.get_json(&url).await?;

        Ok(resp
            .departments
            .into_iter()
            .map(|d| Department {
                id: d.department_id,
                display_name: d.display_name,
            })
            .collect())
    }

    async fn list_refs(&self, filter: &ListFilter) -> Result<Vec<ItemRef>, CollectionError> {
        let department = filter.department.map(|d| d.to_string());

        let url = match filter.effective_query() {
            Some(query) => {
                let mut params = Vec::new();
                if filter.has_images {
                    params.push(("hasImages", "true"));
                }
                if let Some(department) = &department {
                    params.push(("departmentId", department.as_str()));
                }
                params.push(("q", query));
                self.build_url("/search", &params)
            }
            None => match &department {
                Some(department) => {
                    self.build_url("/objects", &[("departmentIds", department.as_str())])
                }
                None => self.build_url("/objects", &[]),
            },
        };

        let resp: ObjectIdsResponse = self.get_json(&url).await?;
        Ok(resp
            .object_ids
            .unwrap_or_default()
            .into_iter()
            .map(ItemRef)
            .collect())
    }

    async fn fetch_detail(&self, id: ItemRef) -> Result<CollectionItemDetail, CollectionError> {
        let url = self.build_url(&format!("/objects/{}", id), &[]);
        match self.get_json::<MetObject>(&url).await {
            Ok(object) => Ok(object.into()),
            Err(CollectionError::Status(404)) => Err(CollectionError::NotFound(id)),
            Err(e) => Err(e),
        }
    }
}

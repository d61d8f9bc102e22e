//! Collection types and the remote collection seam
use artworks_common::SortFields;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one item in the remote collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(pub u64);

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemRef {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ItemRef)
    }
}

/// Read-only display record for one collection item.
///
/// Snapshots of this type are what the favorites list persists, so the field
/// names are part of the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItemDetail {
    pub id: ItemRef,
    pub title: String,
    #[serde(default)]
    pub primary_image_url: Option<String>,
    #[serde(default)]
    pub primary_image_small_url: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub credit_line: Option<String>,
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub object_url: Option<String>,
}

impl CollectionItemDetail {
    pub fn has_primary_image(&self) -> bool {
        self.primary_image_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    pub fn display_creator(&self) -> &str {
        self.creator_name.as_deref().unwrap_or("Unknown Artist")
    }

    pub fn display_date(&self) -> &str {
        self.date.as_deref().unwrap_or("Unknown Date")
    }

    pub fn display_medium(&self) -> &str {
        self.medium.as_deref().unwrap_or("Unknown Medium")
    }

    pub fn display_dimensions(&self) -> &str {
        self.dimensions.as_deref().unwrap_or("Unknown Dimensions")
    }

    pub fn display_credit_line(&self) -> &str {
        self.credit_line
            .as_deref()
            .unwrap_or("No credit information available")
    }
}

impl SortFields for CollectionItemDetail {
    fn sort_title(&self) -> &str {
        self.display_title()
    }

    fn sort_artist(&self) -> &str {
        self.display_creator()
    }

    fn sort_date(&self) -> &str {
        self.display_date()
    }
}

/// A category the collection can be filtered by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: u32,
    pub display_name: String,
}

/// Narrows a ref listing. A query switches the listing to full-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub department: Option<u32>,
    pub query: Option<String>,
    pub has_images: bool,
}

impl ListFilter {
    pub fn department(id: u32) -> Self {
        Self {
            department: Some(id),
            ..Default::default()
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// The query, if it has any non-whitespace content.
    pub fn effective_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum CollectionError {
    /// Requests cannot be issued at all.
    #[error("collection service unavailable: {0}")]
    Unavailable(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("item {0} not found")]
    NotFound(ItemRef),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CollectionError {
    /// Errors that fail a whole operation instead of dropping a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CollectionError::Unavailable(_) | CollectionError::InvalidArgument(_)
        )
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, CollectionError::Connect(_))
    }
}

impl From<reqwest::Error> for CollectionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            CollectionError::Unavailable(e.to_string())
        } else if e.is_timeout() {
            CollectionError::Timeout
        } else if e.is_connect() {
            CollectionError::Connect(e.to_string())
        } else if e.is_decode() {
            CollectionError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            CollectionError::Status(status.as_u16())
        } else {
            CollectionError::Request(e.to_string())
        }
    }
}

/// A remote collection service.
///
/// Implementations only translate requests; batching, validation and paging
/// live above this trait.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn departments(&self) -> Result<Vec<Department>, CollectionError>;

    /// Ordered refs matching `filter`.
    async fn list_refs(&self, filter: &ListFilter) -> Result<Vec<ItemRef>, CollectionError>;

    async fn fetch_detail(&self, id: ItemRef) -> Result<CollectionItemDetail, CollectionError>;
}

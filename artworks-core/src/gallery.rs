//! Gallery service: the calls the view layer makes against a collection
use std::sync::Arc;

use artworks_common::PageWindow;
use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{fetch_batch, BatchOptions, BatchOutcome};
use crate::collection::{
    CollectionError, CollectionItemDetail, CollectionSource, Department, ItemRef, ListFilter,
};
use crate::config::Config;
use crate::met::MetClient;
use crate::smithsonian::{SmithsonianClient, SmithsonianRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryLimits {
    pub page_size: usize,
    /// Refs kept from one listing
    pub max_items: usize,
    /// Refs resolved for a search or exhibition
    pub search_limit: usize,
    /// Items shown as highlights
    pub highlight_count: usize,
    pub max_concurrent: usize,
}

impl Default for GalleryLimits {
    fn default() -> Self {
        Config::default().gallery_limits()
    }
}

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Please enter a valid search term.")]
    EmptyQuery,
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Results of a search across both museums
#[derive(Debug, Default)]
pub struct ExhibitionResults {
    pub met: Vec<CollectionItemDetail>,
    pub smithsonian: Vec<SmithsonianRecord>,
}

impl ExhibitionResults {
    pub fn is_empty(&self) -> bool {
        self.met.is_empty() && self.smithsonian.is_empty()
    }

    pub fn len(&self) -> usize {
        self.met.len() + self.smithsonian.len()
    }
}

pub struct Gallery {
    source: Arc<dyn CollectionSource>,
    smithsonian: Option<SmithsonianClient>,
    limits: GalleryLimits,
}

impl Gallery {
    pub fn new(source: Arc<dyn CollectionSource>, limits: GalleryLimits) -> Self {
        Self {
            source,
            smithsonian: None,
            limits,
        }
    }

    pub fn with_smithsonian(mut self, client: SmithsonianClient) -> Self {
        self.smithsonian = Some(client);
        self
    }

    /// MET-backed gallery, plus Smithsonian search when an API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, CollectionError> {
        let met = MetClient::new(&config.met_base_url, config.request_timeout)?;
        let mut gallery = Self::new(Arc::new(met), config.gallery_limits());

        match &config.smithsonian_api_key {
            Some(key) => {
                let client = SmithsonianClient::new(
                    &config.smithsonian_base_url,
                    key,
                    config.request_timeout,
                )?;
                gallery = gallery.with_smithsonian(client);
            }
            None => info!("No Smithsonian API key configured, exhibition search is MET only"),
        }

        Ok(gallery)
    }

    pub fn limits(&self) -> GalleryLimits {
        self.limits
    }

    fn batch_options(&self) -> BatchOptions {
        BatchOptions::new(self.limits.max_concurrent)
    }

    pub async fn departments(&self) -> Result<Vec<Department>, CollectionError> {
        self.source.departments().await
    }

    /// Refs matching `filter`, capped at `max_items`.
    pub async fn list_refs(&self, filter: &ListFilter) -> Result<Vec<ItemRef>, CollectionError> {
        let mut refs = self.source.list_refs(filter).await?;
        if refs.len() > self.limits.max_items {
            info!(
                "Listing returned {} refs, keeping the first {}",
                refs.len(),
                self.limits.max_items
            );
            refs.truncate(self.limits.max_items);
        }
        Ok(refs)
    }

    /// Resolve one page of `refs`, keeping items that have an image.
    pub async fn fetch_page(
        &self,
        refs: &[ItemRef],
        window: PageWindow,
    ) -> Result<BatchOutcome, CollectionError> {
        fetch_batch(
            self.source.as_ref(),
            window.slice(refs),
            self.batch_options(),
            CollectionItemDetail::has_primary_image,
        )
        .await
    }

    pub async fn fetch_detail(&self, id: ItemRef) -> Result<CollectionItemDetail, CollectionError> {
        self.source.fetch_detail(id).await
    }

    /// Full-text search, resolving the first `search_limit` hits.
    pub async fn search(&self, query: &str) -> Result<BatchOutcome, GalleryError> {
        let filter = ListFilter::search(query);
        let query = filter.effective_query().ok_or(GalleryError::EmptyQuery)?;
        info!("Searching collection for '{}'", query);

        let refs = self.source.list_refs(&filter).await?;
        let refs = &refs[..refs.len().min(self.limits.search_limit)];
        Ok(fetch_batch(self.source.as_ref(), refs, self.batch_options(), |_| true).await?)
    }

    /// The first `highlight_count` items with an image, scanning from the start
    /// of the collection.
    pub async fn highlights(&self) -> Result<BatchOutcome, CollectionError> {
        let refs = self.source.list_refs(&ListFilter::default()).await?;
        let refs = &refs[..refs.len().min(self.limits.search_limit)];
        fetch_batch(
            self.source.as_ref(),
            refs,
            self.batch_options().with_target(self.limits.highlight_count),
            CollectionItemDetail::has_primary_image,
        )
        .await
    }

    /// Search the MET and, when configured, the Smithsonian.
    ///
    /// A Smithsonian failure only empties its half of the results.
    pub async fn exhibition(&self, query: &str) -> Result<ExhibitionResults, GalleryError> {
        let filter = ListFilter::search(query);
        let query = filter.effective_query().ok_or(GalleryError::EmptyQuery)?;

        let refs = self.source.list_refs(&filter).await?;
        let refs = &refs[..refs.len().min(self.limits.search_limit)];
        let met = fetch_batch(
            self.source.as_ref(),
            refs,
            self.batch_options(),
            CollectionItemDetail::has_primary_image,
        )
        .await?
        .items;

        let smithsonian = match &self.smithsonian {
            Some(client) => match client.search(query, self.limits.search_limit).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Smithsonian search failed: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        info!(
            "Exhibition '{}': {} MET, {} Smithsonian",
            query,
            met.len(),
            smithsonian.len()
        );
        Ok(ExhibitionResults { met, smithsonian })
    }
}

//! View state objects.
//!
//! Each state is a plain value. Transitions consume the current state and
//! return the next one; a response is applied only if it carries the token of
//! the request the state is waiting for, so a superseded fetch that resolves
//! late is discarded instead of overwriting newer content.

use artworks_common::{sort_page, total_pages, PageWindow, RequestToken, RequestTokens, SortKey};
use tracing::debug;

use crate::batch::BatchOutcome;
use crate::collection::{CollectionError, CollectionItemDetail, ItemRef, ListFilter};
use crate::favorites::FavoriteSet;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load artworks.";
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the collection. Please try again.";
pub const NOTHING_FOUND_MESSAGE: &str = "No artworks found.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Loaded, but there is nothing to show.
    Empty,
    /// Loading failed. The message never carries transport diagnostics.
    Failed(&'static str),
}

/// User-facing message for a failed load.
pub fn failure_message(error: &CollectionError) -> &'static str {
    match error {
        CollectionError::Unavailable(_) | CollectionError::Connect(_) | CollectionError::Timeout => {
            UNREACHABLE_MESSAGE
        }
        _ => LOAD_FAILED_MESSAGE,
    }
}

/// State of the paginated explore view
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreState {
    pub filter: ListFilter,
    pub sort: SortKey,
    pub page: usize,
    pub page_size: usize,
    /// Every ref of the current listing, in listing order
    pub refs: Vec<ItemRef>,
    /// Items of the loaded page, in display order
    pub items: Vec<CollectionItemDetail>,
    /// Refs of the loaded page that did not produce an item
    pub dropped: usize,
    pub status: ViewStatus,
    pending: Option<RequestToken>,
}

impl ExploreState {
    pub fn new(filter: ListFilter, sort: SortKey, page_size: usize) -> Self {
        Self {
            filter,
            sort,
            page: 1,
            page_size,
            refs: Vec::new(),
            items: Vec::new(),
            dropped: 0,
            status: ViewStatus::Idle,
            pending: None,
        }
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.refs.len(), self.page_size)
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::for_page(self.page, self.page_size)
    }

    /// Refs of the current page.
    pub fn page_refs(&self) -> &[ItemRef] {
        self.window().slice(&self.refs)
    }

    /// Whether a response carrying `token` would be discarded.
    pub fn is_stale(&self, token: RequestToken) -> bool {
        self.pending != Some(token)
    }

    /// Start listing refs for the current filter. Resets to page 1.
    pub fn begin_listing(mut self, tokens: &mut RequestTokens) -> (Self, RequestToken) {
        let token = tokens.issue();
        self.page = 1;
        self.refs.clear();
        self.items.clear();
        self.dropped = 0;
        self.status = ViewStatus::Loading;
        self.pending = Some(token);
        (self, token)
    }

    pub fn refs_loaded(
        mut self,
        token: RequestToken,
        result: Result<Vec<ItemRef>, CollectionError>,
    ) -> Self {
        if self.is_stale(token) {
            debug!("Discarding stale listing (token {})", token.value());
            return self;
        }
        self.pending = None;
        match result {
            Ok(refs) => {
                self.status = if refs.is_empty() {
                    ViewStatus::Empty
                } else {
                    ViewStatus::Idle
                };
                self.refs = refs;
            }
            Err(e) => self.status = ViewStatus::Failed(failure_message(&e)),
        }
        self
    }

    /// Start loading `page`, clamped to the available pages.
    pub fn begin_page(
        mut self,
        page: usize,
        tokens: &mut RequestTokens,
    ) -> (Self, RequestToken, PageWindow) {
        let token = tokens.issue();
        self.page = page.clamp(1, self.total_pages());
        self.status = ViewStatus::Loading;
        self.pending = Some(token);
        let window = self.window();
        (self, token, window)
    }

    pub fn page_loaded(
        mut self,
        token: RequestToken,
        result: Result<BatchOutcome, CollectionError>,
    ) -> Self {
        if self.is_stale(token) {
            debug!("Discarding stale page (token {})", token.value());
            return self;
        }
        self.pending = None;
        match result {
            Ok(outcome) => {
                self.dropped = outcome.dropped_count();
                self.items = outcome.items;
                sort_page(&mut self.items, self.sort);
                self.status = if self.items.is_empty() {
                    ViewStatus::Empty
                } else {
                    ViewStatus::Ready
                };
            }
            Err(e) => {
                self.items.clear();
                self.status = ViewStatus::Failed(failure_message(&e));
            }
        }
        self
    }

    /// Reorder the loaded page. Which refs get fetched is unaffected.
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        sort_page(&mut self.items, sort);
        self
    }
}

/// State of the single-artwork view
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailState {
    pub item: Option<CollectionItemDetail>,
    pub is_favorite: bool,
    pub status: ViewStatus,
}

impl DetailState {
    pub fn loaded(
        result: Result<CollectionItemDetail, CollectionError>,
        favorites: &FavoriteSet,
    ) -> Self {
        match result {
            Ok(item) => Self {
                is_favorite: favorites.contains(item.id),
                item: Some(item),
                status: ViewStatus::Ready,
            },
            Err(CollectionError::NotFound(_)) => Self {
                item: None,
                is_favorite: false,
                status: ViewStatus::Empty,
            },
            Err(e) => Self {
                item: None,
                is_favorite: false,
                status: ViewStatus::Failed(failure_message(&e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::test_support::detail;

    fn outcome(items: Vec<CollectionItemDetail>) -> BatchOutcome {
        BatchOutcome {
            items,
            ..Default::default()
        }
    }

    fn refs(n: u64) -> Vec<ItemRef> {
        (1..=n).map(ItemRef).collect()
    }

    fn listed(n: u64, tokens: &mut RequestTokens) -> ExploreState {
        let state = ExploreState::new(ListFilter::department(11), SortKey::Title, 12);
        let (state, token) = state.begin_listing(tokens);
        state.refs_loaded(token, Ok(refs(n)))
    }

    #[test]
    fn listing_then_first_page() {
        let mut tokens = RequestTokens::new();
        let state = listed(25, &mut tokens);
        assert_eq!(state.total_pages(), 3);
        assert_eq!(state.status, ViewStatus::Idle);

        let (state, token, window) = state.begin_page(1, &mut tokens);
        assert_eq!(window, PageWindow::for_page(1, 12));
        assert_eq!(state.page_refs().len(), 12);

        let state = state.page_loaded(token, Ok(outcome(vec![detail(1, "b", true), detail(2, "a", true)])));
        assert_eq!(state.status, ViewStatus::Ready);
        assert_eq!(state.items[0].title, "a");
    }

    #[test]
    fn stale_page_response_is_discarded() {
        let mut tokens = RequestTokens::new();
        let state = listed(25, &mut tokens);

        let (state, old_token, _) = state.begin_page(2, &mut tokens);
        let (state, new_token, _) = state.begin_page(3, &mut tokens);

        // The newer request resolves first, then the superseded one arrives.
        let state = state.page_loaded(new_token, Ok(outcome(vec![detail(25, "last", true)])));
        let state = state.page_loaded(old_token, Ok(outcome(vec![detail(13, "stale", true)])));

        assert_eq!(state.page, 3);
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id, ItemRef(25));
    }

    #[test]
    fn stale_listing_is_discarded() {
        let mut tokens = RequestTokens::new();
        let state = ExploreState::new(ListFilter::department(1), SortKey::Date, 12);
        let (state, first) = state.begin_listing(&mut tokens);
        let (state, second) = state.begin_listing(&mut tokens);

        let state = state.refs_loaded(second, Ok(refs(3)));
        let state = state.refs_loaded(first, Ok(refs(40)));
        assert_eq!(state.refs.len(), 3);
    }

    #[test]
    fn sort_only_reorders_loaded_page() {
        let mut tokens = RequestTokens::new();
        let state = listed(25, &mut tokens);
        let refs_before = state.refs.clone();

        let (state, token, _) = state.begin_page(1, &mut tokens);
        let mut a = detail(1, "Zebra", true);
        a.creator_name = Some("Albers".to_string());
        let mut b = detail(2, "Apple", true);
        b.creator_name = Some("Zurbarán".to_string());
        let state = state.page_loaded(token, Ok(outcome(vec![a, b])));
        assert_eq!(state.items[0].id, ItemRef(2));

        let state = state.with_sort(SortKey::Artist);
        assert_eq!(state.items[0].id, ItemRef(1));
        assert_eq!(state.refs, refs_before);
        assert_eq!(state.page_refs(), &refs_before[0..12]);
    }

    #[test]
    fn page_is_clamped_to_available_pages() {
        let mut tokens = RequestTokens::new();
        let state = listed(25, &mut tokens);
        let (state, _, window) = state.begin_page(9, &mut tokens);
        assert_eq!(state.page, 3);
        assert_eq!(window.start, 24);

        let (state, _, _) = state.begin_page(0, &mut tokens);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn empty_listing_is_nothing_found() {
        let mut tokens = RequestTokens::new();
        let state = listed(0, &mut tokens);
        assert_eq!(state.status, ViewStatus::Empty);
    }

    #[test]
    fn failures_hide_transport_details() {
        let mut tokens = RequestTokens::new();
        let state = listed(25, &mut tokens);
        let (state, token, _) = state.begin_page(1, &mut tokens);
        let state = state.page_loaded(
            token,
            Err(CollectionError::Unavailable("dns error: tcp 10.0.0.1".into())),
        );
        assert_eq!(state.status, ViewStatus::Failed(UNREACHABLE_MESSAGE));
        assert!(state.items.is_empty());
    }

    #[test]
    fn detail_state_marks_favorites() {
        let mut favorites = FavoriteSet::new();
        favorites.insert(detail(7, "Starry Night", true));

        let state = DetailState::loaded(Ok(detail(7, "Starry Night", true)), &favorites);
        assert!(state.is_favorite);
        assert_eq!(state.status, ViewStatus::Ready);

        let missing = DetailState::loaded(Err(CollectionError::NotFound(ItemRef(8))), &favorites);
        assert_eq!(missing.status, ViewStatus::Empty);

        let failed = DetailState::loaded(Err(CollectionError::Status(500)), &favorites);
        assert_eq!(failed.status, ViewStatus::Failed(LOAD_FAILED_MESSAGE));
    }
}

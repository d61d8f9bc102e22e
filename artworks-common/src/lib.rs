mod page;
mod sort;
mod token;

pub use page::{next_page, previous_page, total_pages, PageWindow};
pub use sort::{sort_page, ParseSortKeyError, SortFields, SortKey};
pub use token::{RequestToken, RequestTokens};

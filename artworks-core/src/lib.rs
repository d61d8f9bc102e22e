pub mod batch;
pub mod collection;
pub mod config;
pub mod favorites;
pub mod gallery;
pub mod met;
pub mod smithsonian;
pub mod view;

pub use artworks_common::{PageWindow, RequestToken, RequestTokens, SortKey};

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Display order for the items of one loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Title,
    Artist,
}

#[allow(clippy::derivable_impls)]
impl Default for SortKey {
    fn default() -> Self {
        SortKey::Date
    }
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Title => "title",
            SortKey::Artist => "artist",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortKeyError(pub String);

impl fmt::Display for ParseSortKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key '{}' (expected date, title or artist)", self.0)
    }
}

impl std::error::Error for ParseSortKeyError {}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "title" => Ok(SortKey::Title),
            "artist" => Ok(SortKey::Artist),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

/// Values an item exposes for sorting. Absent values should return the same
/// fallback text the item is displayed with.
pub trait SortFields {
    fn sort_title(&self) -> &str;
    fn sort_artist(&self) -> &str;
    fn sort_date(&self) -> &str;
}

fn field<T: SortFields>(item: &T, key: SortKey) -> &str {
    match key {
        SortKey::Date => item.sort_date(),
        SortKey::Title => item.sort_title(),
        SortKey::Artist => item.sort_artist(),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Stable, case-insensitive sort of an already-loaded page.
///
/// Only reorders `items`. The ref sequence that decides which items get
/// fetched for later pages is untouched.
pub fn sort_page<T: SortFields>(items: &mut [T], key: SortKey) {
    items.sort_by(|a, b| compare_text(field(a, key), field(b, key)));
}

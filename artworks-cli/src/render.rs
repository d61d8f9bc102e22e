//! Text rendering of view state. Pure functions from state to output.
use std::fmt::Write;

use artworks_core::collection::{CollectionItemDetail, Department};
use artworks_core::gallery::ExhibitionResults;
use artworks_core::view::{DetailState, ExploreState, ViewStatus, NOTHING_FOUND_MESSAGE};

/// Placeholder shown where an item has no image.
pub const FALLBACK_IMAGE: &str = "(no image)";

fn image_or_fallback(item: &CollectionItemDetail) -> &str {
    item.primary_image_small_url
        .as_deref()
        .or(item.primary_image_url.as_deref())
        .unwrap_or(FALLBACK_IMAGE)
}

pub fn card(item: &CollectionItemDetail) -> String {
    format!(
        "[{}] {}\n    {} · {}\n    {}\n",
        item.id,
        item.display_title(),
        item.display_creator(),
        item.display_date(),
        image_or_fallback(item)
    )
}

pub fn cards(items: &[CollectionItemDetail]) -> String {
    if items.is_empty() {
        return format!("{NOTHING_FOUND_MESSAGE}\n");
    }
    items.iter().map(card).collect()
}

fn status_line(status: &ViewStatus) -> Option<String> {
    match status {
        ViewStatus::Empty => Some(NOTHING_FOUND_MESSAGE.to_string()),
        ViewStatus::Failed(message) => Some(format!("{message} (retry with the same command)")),
        ViewStatus::Loading => Some("Loading artworks...".to_string()),
        ViewStatus::Idle | ViewStatus::Ready => None,
    }
}

pub fn explore(state: &ExploreState) -> String {
    let mut out = String::new();
    if let Some(line) = status_line(&state.status) {
        let _ = writeln!(out, "{line}");
        return out;
    }

    out.push_str(&cards(&state.items));
    let _ = writeln!(
        out,
        "\nPage {} of {} · sorted by {} · {} of {} ref(s) on this page shown",
        state.page,
        state.total_pages(),
        state.sort,
        state.items.len(),
        state.page_refs().len()
    );
    out
}

pub fn detail(state: &DetailState) -> String {
    if let Some(line) = status_line(&state.status) {
        return format!("{line}\n");
    }
    let Some(item) = &state.item else {
        return format!("{NOTHING_FOUND_MESSAGE}\n");
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", item.display_title());
    let _ = writeln!(out, "  Artist:     {}", item.display_creator());
    let _ = writeln!(out, "  Date:       {}", item.display_date());
    let _ = writeln!(out, "  Medium:     {}", item.display_medium());
    let _ = writeln!(out, "  Dimensions: {}", item.display_dimensions());
    let _ = writeln!(out, "  Credit:     {}", item.display_credit_line());
    if let Some(culture) = &item.culture {
        let _ = writeln!(out, "  Culture:    {culture}");
    }
    let _ = writeln!(
        out,
        "  Image:      {}",
        item.primary_image_url.as_deref().unwrap_or(FALLBACK_IMAGE)
    );
    if let Some(url) = &item.object_url {
        let _ = writeln!(out, "  More:       {url}");
    }
    if state.is_favorite {
        let _ = writeln!(out, "  ★ In your favorites");
    }
    out
}

pub fn departments(departments: &[Department]) -> String {
    departments
        .iter()
        .map(|d| format!("{:>4}  {}\n", d.id, d.display_name))
        .collect()
}

pub fn exhibition(results: &ExhibitionResults) -> String {
    if results.is_empty() {
        return format!("{NOTHING_FOUND_MESSAGE}\n");
    }

    let mut out = String::new();
    if !results.met.is_empty() {
        let _ = writeln!(out, "The Met ({})", results.met.len());
        out.push_str(&cards(&results.met));
    }
    if !results.smithsonian.is_empty() {
        let _ = writeln!(out, "Smithsonian ({})", results.smithsonian.len());
        for record in &results.smithsonian {
            let _ = writeln!(
                out,
                "[{}] {}\n    {} · {}\n    {}",
                record.record_id,
                record.title,
                record.display_creator(),
                record.display_date(),
                record.thumbnail_url
            );
        }
    }
    out
}

pub fn favorites(items: &[CollectionItemDetail]) -> String {
    if items.is_empty() {
        return "No favorites added yet!\n".to_string();
    }
    let mut out = format!("My Favorites ({})\n", items.len());
    out.push_str(&cards(items));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use artworks_core::collection::ItemRef;
    use artworks_core::view::LOAD_FAILED_MESSAGE;

    fn item(id: u64, title: &str) -> CollectionItemDetail {
        CollectionItemDetail {
            id: ItemRef(id),
            title: title.to_string(),
            primary_image_url: None,
            primary_image_small_url: None,
            creator_name: Some("Mary Cassatt".to_string()),
            date: None,
            medium: None,
            dimensions: None,
            credit_line: None,
            culture: None,
            department: None,
            object_url: None,
        }
    }

    #[test]
    fn card_uses_fallbacks() {
        let text = card(&item(3, ""));
        assert!(text.contains("[3] Untitled"));
        assert!(text.contains("Mary Cassatt · Unknown Date"));
        assert!(text.contains(FALLBACK_IMAGE));
    }

    #[test]
    fn empty_favorites_message() {
        assert_eq!(favorites(&[]), "No favorites added yet!\n");
        assert!(favorites(&[item(1, "The Cup of Tea")]).starts_with("My Favorites (1)"));
    }

    #[test]
    fn failed_detail_shows_generic_message() {
        let state = DetailState {
            item: None,
            is_favorite: false,
            status: ViewStatus::Failed(LOAD_FAILED_MESSAGE),
        };
        assert!(detail(&state).starts_with(LOAD_FAILED_MESSAGE));
    }

    #[test]
    fn favorite_marker_on_detail() {
        let state = DetailState {
            item: Some(item(9, "Summertime")),
            is_favorite: true,
            status: ViewStatus::Ready,
        };
        let text = detail(&state);
        assert!(text.starts_with("Summertime\n"));
        assert!(text.contains("In your favorites"));
    }
}

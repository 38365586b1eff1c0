use super::entry::VideoEntry;

/// Category sentinel matching every entry.
pub const ALL_CATEGORIES: &str = "All";

pub fn matches(entry: &VideoEntry, search: &str, category: &str) -> bool {
    let category_matches = category == ALL_CATEGORIES || entry.category == category;
    let search_matches =
        search.is_empty() || entry.title.to_lowercase().contains(&search.to_lowercase());
    category_matches && search_matches
}

/// Entries whose title contains `search` (case-insensitive) and whose
/// category equals `category`, in input order.
pub fn filter(entries: &[VideoEntry], search: &str, category: &str) -> Vec<VideoEntry> {
    entries
        .iter()
        .filter(|entry| matches(entry, search, category))
        .cloned()
        .collect()
}

/// `"All"` followed by each distinct category in order of first appearance.
pub fn categories(entries: &[VideoEntry]) -> Vec<String> {
    let mut result = vec![ALL_CATEGORIES.to_string()];
    for entry in entries {
        if !result.iter().skip(1).any(|c| c == &entry.category) {
            result.push(entry.category.clone());
        }
    }
    result
}

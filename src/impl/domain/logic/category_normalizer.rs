pub(crate) const DEFAULT_CATEGORY: &str = "Other";

/// Title-Case a freeform category (ex. "mercado  CENTRAL" -> "Mercado
/// Central"). Missing or blank input maps to "Other".
pub(crate) fn normalize_category(raw: Option<&str>) -> String {
    let words: Vec<String> = raw
        .unwrap_or_default()
        .split_whitespace()
        .map(title_case_word)
        .collect();
    if words.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        words.join(" ")
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

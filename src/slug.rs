//! Slug normalisation and validation.

/// Slugs that would shadow application routes.
pub const RESERVED_SLUGS: [&str; 16] = [
    "view",
    "edit",
    "admin",
    "api",
    "login",
    "logout",
    "register",
    "signup",
    "dashboard",
    "settings",
    "profile",
    "home",
    "index",
    "my-pages",
    "mypages",
    "pages",
];

/// Value some clients store in place of a missing page id.
pub const ABSENCE_MARKER: &str = "not-found";

/// Turn free text into a URL-friendly slug.
///
/// Lowercases, drops everything except word characters, whitespace and
/// hyphens, collapses runs of whitespace, underscores and hyphens into one
/// hyphen, and strips hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }
    slug
}

/// Only lowercase ASCII letters, digits and single inner hyphens.
pub fn is_valid(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Whether `slug` is on the reserved list (case-insensitive).
pub fn is_reserved(slug: &str) -> bool {
    let lowered = slug.to_lowercase();
    RESERVED_SLUGS.contains(&lowered.as_str())
}

/// Interpret a stored slug mapping as a page id.
///
/// Empty strings, non-strings and the absence marker all mean "no mapping".
pub fn mapped_page_id(value: Option<&serde_json::Value>) -> Option<&str> {
    match value?.as_str()? {
        "" | ABSENCE_MARKER => None,
        id => Some(id),
    }
}

//! URL-safe slug derivation and collision resolution.

use std::future::Future;

use unicode_normalization::UnicodeNormalization;

/// Derive a URL-safe slug from a title.
///
/// Decomposes Unicode (NFD) so accented letters fold to their ASCII base,
/// drops combining marks and symbols, collapses whitespace runs to single
/// hyphens, trims edge hyphens, and lowercases. Empty or whitespace-only
/// titles yield an empty string, which callers must treat as invalid
/// input.
pub fn generate_slug(title: &str) -> String {
    let mut cleaned = String::with_capacity(title.len());

    for c in title.nfd() {
        if c.is_ascii_alphanumeric() {
            cleaned.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            // separators become word boundaries, collapsed below
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Resolve a slug collision by appending `-1`, `-2`, … until the injected
/// existence check returns false.
///
/// The check runs against the persistence collaborator; the returned slug
/// is guaranteed unused at the time the check last ran.
pub async fn resolve_unique<F, Fut>(base: &str, mut exists: F) -> crate::Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = crate::Result<bool>>,
{
    let mut slug = base.to_string();
    let mut counter = 1u32;

    while exists(slug.clone()).await? {
        slug = format!("{}-{}", base, counter);
        counter += 1;
    }

    Ok(slug)
}

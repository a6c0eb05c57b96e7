/// Derive a URL-safe slug from a display name.
///
/// The name is lowercased and every run of characters outside `[a-z0-9_]`
/// becomes a single underscore: `"Mom's Apple Pie"` becomes `"mom_s_apple_pie"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            slug.push(c);
            in_run = false;
        } else if !in_run {
            slug.push('_');
            in_run = true;
        }
    }

    slug
}

/// Whether `s` is already a slug: non-empty and only `[a-z0-9_]`.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

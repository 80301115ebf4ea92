/// Lowercases, trims, turns whitespace runs into `-`, drops anything that is
/// not a letter, digit, `_` or `-`, then collapses repeated `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut in_whitespace = false;

    for ch in text.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            push_hyphen(&mut slug);
            in_whitespace = false;
        }

        if ch == '-' {
            push_hyphen(&mut slug);
        } else if ch.is_alphanumeric() || ch == '_' {
            slug.push(ch);
        }
    }

    slug
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

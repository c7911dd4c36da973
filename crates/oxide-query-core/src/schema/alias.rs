//! Table alias derivation.

/// Words that must never be emitted as a bare alias.
const RESERVED: &[&str] = &[
    "as", "by", "do", "go", "if", "in", "is", "of", "on", "or", "to", "and", "asc", "end", "for",
    "key", "not", "set", "top", "desc", "from", "join", "into", "case", "else", "then", "when",
    "with",
];

/// Derives the short alias of a table name.
///
/// The capitals of the last name segment are lower-cased and joined
/// (`UsersGroup` becomes `ug`). Names without capitals use the first letter
/// of each `_`-separated word (`user_groups` becomes `ug`).
#[must_use]
pub fn short_alias(table: &str) -> String {
    let name = table.rsplit('.').next().unwrap_or(table);
    let capitals: String = name
        .chars()
        .filter(char::is_ascii_uppercase)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if !capitals.is_empty() {
        return capitals;
    }

    let initials: String = name
        .split('_')
        .filter_map(|word| word.chars().next())
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if initials.is_empty() {
        String::from("t")
    } else {
        initials
    }
}

/// Picks an alias for `table` that is not in `taken`.
///
/// Collisions are suffixed with an occurrence count: `u`, `u2`, `u3`.
pub(crate) fn unique_alias<'a>(table: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    let base = short_alias(table);
    let is_free =
        |candidate: &str| !RESERVED.contains(&candidate) && !taken.clone().any(|t| t == candidate);

    if is_free(&base) {
        return base;
    }
    let mut occurrence = 2;
    loop {
        let candidate = format!("{base}{occurrence}");
        if is_free(&candidate) {
            return candidate;
        }
        occurrence += 1;
    }
}

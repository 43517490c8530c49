//! Station name canonicalization.

/// Canonical city names, checked in this order. A raw name containing several
/// of them resolves to the first one listed.
pub const CITY_KEYWORDS: [&str; 8] = [
    "Paris",
    "Lille",
    "Lyon",
    "Marseille",
    "Bordeaux",
    "Strasbourg",
    "Nantes",
    "Toulouse",
];

/// Maps a raw station name to its canonical short name.
///
/// The input is trimmed and title-cased first, so `"PARIS NORD"` and
/// `"Paris Nord"` both resolve to `"Paris"`. Names without a known city keyword
/// come back trimmed and title-cased.
pub fn normalize(raw: &str) -> String {
    let titled = title_case(raw.trim());

    CITY_KEYWORDS
        .iter()
        .find(|keyword| titled.contains(*keyword))
        .map(|keyword| keyword.to_string())
        .unwrap_or(titled)
}

/// Upper-cases every letter that follows a non-letter and lower-cases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

//! Grind labels and their Culto API codes.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block.
const COMBINING_DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Convert a grind label (`"En grano"`, `"Cold Brew"`) to the API code.
///
/// Accents are stripped, the result is uppercased, whitespace and `/` become
/// `_` (collapsed), and the legacy `GRAOS` label maps to `EN_GRANO`.
///
/// ```
/// use culto_portal_core::api_grinding_type;
///
/// assert_eq!(api_grinding_type("En grano"), "EN_GRANO");
/// assert_eq!(api_grinding_type("Cold Brew"), "COLD_BREW");
/// assert_eq!(api_grinding_type("Grãos"), "EN_GRANO");
/// ```
#[must_use]
pub fn api_grinding_type(label: &str) -> String {
    let upper: String = label
        .nfd()
        .filter(|c| !COMBINING_DIACRITICS.contains(c))
        .collect::<String>()
        .to_uppercase();

    let mut code = String::with_capacity(upper.len());
    for c in upper.chars() {
        let c = if c.is_whitespace() || c == '/' { '_' } else { c };
        if c == '_' && code.ends_with('_') {
            continue;
        }
        code.push(c);
    }

    if code == "GRAOS" {
        "EN_GRANO".to_owned()
    } else {
        code
    }
}

/// Inverse of [`api_grinding_type`] for the labels the portal offers.
///
/// Unknown codes are returned with underscores turned into spaces.
#[must_use]
pub fn grind_label(code: &str) -> String {
    crate::catalog::GRINDS
        .iter()
        .find(|g| api_grinding_type(g.label) == code)
        .map_or_else(|| code.replace('_', " "), |g| g.label.to_owned())
}

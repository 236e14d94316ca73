//! Text normalization
//!
//! Upstream markup mixes entities, non-breaking spaces, stray tags and
//! accented Czech text. These helpers turn it into display text and into a
//! folded form used for case/accent-insensitive comparisons.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("tag regex"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("entity regex"));

/// Decodes one HTML entity body (the part between `&` and `;`)
fn decode_entity(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match body {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "euro" => '€',
        "times" => '×',
        _ => return None,
    };
    Some(c)
}

fn decode_entities(input: &str) -> String {
    ENTITY
        .replace_all(input, |caps: &regex::Captures<'_>| match decode_entity(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Produces clean display text from a markup fragment
///
/// Entities are decoded, tags stripped, non-breaking spaces turned into
/// plain spaces and whitespace runs collapsed. Decoding and stripping repeat
/// until nothing changes, so `normalize_text(normalize_text(x)) ==
/// normalize_text(x)`.
///
/// # Examples
///
/// ```
/// use car_scout::text::normalize_text;
///
/// assert_eq!(normalize_text("<b>125&nbsp;000</b>\n Kč "), "125 000 Kč");
/// ```
pub fn normalize_text(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let decoded = decode_entities(&current);
        let stripped = TAG.replace_all(&decoded, " ").into_owned();
        if stripped == current {
            break;
        }
        current = stripped;
    }

    current
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Folds text for locale-insensitive comparison
///
/// Lowercases, strips diacritics through canonical decomposition and
/// collapses whitespace, so `"Mělník"` becomes `"melnik"`.
pub fn normalize_for_match(input: &str) -> String {
    let folded: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true if `needle` occurs in `haystack`, ignoring case and accents
///
/// An empty needle never matches.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    let needle = normalize_for_match(needle);
    !needle.is_empty() && normalize_for_match(haystack).contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_and_collapse() {
        assert_eq!(
            normalize_text("  <span class=\"x\">Škoda</span>\n\t<i>Octavia</i>  "),
            "Škoda Octavia"
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(normalize_text("Cena:&nbsp;99&#160;000 K&#269;"), "Cena: 99 000 Kč");
        assert_eq!(normalize_text("A &amp; B"), "A & B");
        assert_eq!(normalize_text("&#x41;BS"), "ABS");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(normalize_text("&bogus; text"), "&bogus; text");
    }

    #[test]
    fn test_non_breaking_space_char() {
        assert_eq!(normalize_text("125\u{a0}000\u{a0}Kč"), "125 000 Kč");
    }

    #[test]
    fn test_normalize_text_idempotent() {
        let inputs = [
            "&amp;lt;b&amp;gt;bold&amp;lt;/b&amp;gt;",
            "&lt;p&gt;x&lt;/p&gt;",
            "a < b > c",
            "  spaced\u{a0}\u{a0}out ",
            "<div><a href='/x'>link</a></div>",
            "",
        ];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_for_match_czech() {
        assert_eq!(normalize_for_match("Mělník"), "melnik");
        assert_eq!(normalize_for_match("ČESKÉ  Budějovice"), "ceske budejovice");
        assert_eq!(normalize_for_match("Ústí nad Labem"), "usti nad labem");
        assert_eq!(normalize_for_match("Příbram"), "pribram");
    }

    #[test]
    fn test_contains_normalized() {
        assert!(contains_normalized("Prodám auto, Mělník 276 01", "melnik"));
        assert!(contains_normalized("BRNO-střed", "Brno"));
        assert!(!contains_normalized("Praha", "Brno"));
        assert!(!contains_normalized("Praha", "  "));
    }
}

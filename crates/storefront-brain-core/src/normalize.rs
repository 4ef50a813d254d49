//! Text normalization and term matching.
//!
//! Two normal forms exist and must stay distinct:
//!
//! - [`normalize`] keeps word boundaries (single spaces) and is the input to
//!   every tokenizer and pattern table.
//! - [`normalize_key`] removes whitespace entirely and is used for equality
//!   lookups (alias keys, category slugs).
//!
//! Pattern tables are matched with [`contains_term`], which understands a
//! trailing `*` as "word prefix" (`"günstig*"` matches `"günstigste"`), and
//! otherwise requires whole-word (or whole-phrase) matches.

/// Letters kept in addition to `[a-z0-9]`.
fn is_locale_char(c: char) -> bool {
    matches!(c, 'ä' | 'ö' | 'ü' | 'ß' | '€')
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || is_locale_char(c)
}

/// Lower-case, replace every character outside `[a-z0-9äöüß€]` with a space,
/// collapse whitespace and trim.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for c in lowered.chars() {
        if is_kept(c) {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Same character policy as [`normalize`] with all whitespace removed.
pub fn normalize_key(text: &str) -> String {
    text.to_lowercase().chars().filter(|c| is_kept(*c)).collect()
}

/// Split normalized text into tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Surround normalized text with spaces so every word has a boundary on
/// both sides.
pub fn pad(normalized: &str) -> String {
    format!(" {} ", normalized)
}

/// Match one table entry against padded normalized text.
///
/// `"stem*"` matches any word starting with `stem`; anything else must match
/// whole words.
pub fn contains_term(padded: &str, term: &str) -> bool {
    match term.strip_suffix('*') {
        Some(stem) => padded.contains(&format!(" {}", stem)),
        None => padded.contains(&format!(" {} ", term)),
    }
}

/// True when any entry of `table` matches.
pub fn contains_any(padded: &str, table: &[&str]) -> bool {
    table.iter().any(|t| contains_term(padded, t))
}

/// All entries of `table` that match, in table order.
pub fn collect_terms<'t>(padded: &str, table: &[&'t str]) -> Vec<&'t str> {
    table
        .iter()
        .copied()
        .filter(|t| contains_term(padded, t))
        .collect()
}

/// True when every character is an ASCII digit.
pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_keeps_umlauts() {
        assert_eq!(normalize("  Günstige   Snowboards!!  "), "günstige snowboards");
        assert_eq!(normalize("Parfüm, 50ml (Eau-de-Toilette)"), "parfüm 50ml eau de toilette");
        assert_eq!(normalize("ÄÖÜ ß"), "äöü ß");
        assert_eq!(normalize("unter 20€"), "unter 20€");
    }

    #[test]
    fn test_normalize_degrades_gracefully() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!... ---"), "");
        assert!(tokenize("!!!").is_empty());
    }

    #[test]
    fn test_normalize_key_removes_whitespace() {
        assert_eq!(normalize_key("Snow Board-X 2"), "snowboardx2");
        assert_eq!(normalize("Snow Board-X 2"), "snow board x 2");
    }

    #[test]
    fn test_normalize_key_idempotent() {
        for input in ["Fress-Napf", "  Ölige HAUT ", "XR-500 €", "", "ẞtraße"] {
            let once = normalize_key(input);
            assert_eq!(normalize_key(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_contains_term_word_and_prefix() {
        let padded = pad(&normalize("Die günstigsten modernen Lampen"));
        assert!(contains_term(&padded, "günstig*"));
        assert!(!contains_term(&padded, "günstig"));
        assert!(!contains_term(&padded, "mode"));
        assert!(contains_term(&padded, "modernen lampen"));
        assert_eq!(
            collect_terms(&padded, &["lampe*", "tisch", "die"]),
            vec!["lampe*", "die"]
        );
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("2000"));
        assert!(!is_numeric("20€"));
        assert!(!is_numeric(""));
    }
}

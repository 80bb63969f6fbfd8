//! Case and phrase classification primitives.
//!
//! Case predicates follow the "cased character" model: a string is lower
//! case when it contains at least one cased character and none of them is
//! upper case. A single-letter term therefore has an empty, non-lower tail.

/// Take the single-character mapping, or `fallback` when the mapping expands
/// to several characters (e.g. `ß` → `SS`).
fn single(mut mapped: impl Iterator<Item = char>, fallback: char) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(c), None) => c,
        _ => fallback,
    }
}

fn is_cased(c: char) -> bool {
    c.is_lowercase() || c.is_uppercase()
}

/// True when `s` has at least one cased character and all of them are lower case.
pub fn is_lower(s: &str) -> bool {
    s.chars().any(is_cased) && !s.chars().any(char::is_uppercase)
}

/// True when `s` has at least one cased character and all of them are upper case.
pub fn is_upper(s: &str) -> bool {
    s.chars().any(is_cased) && !s.chars().any(char::is_lowercase)
}

/// Is the phrase in Title Case?
///
/// Every space- or dash-delimited term that starts with a letter must have an
/// upper case first letter and a lower case remainder. Empty terms and terms
/// starting with punctuation are ignored.
pub fn is_title_case(phrase: &str) -> bool {
    phrase
        .split([' ', '-'])
        .filter(|term| term.chars().next().is_some_and(char::is_alphabetic))
        .all(|term| {
            let mut chars = term.chars();
            let first_upper = chars.next().is_some_and(char::is_uppercase);
            first_upper && is_lower(chars.as_str())
        })
}

/// Switch the case of one character.
pub fn case_flip(c: char) -> char {
    if c.is_lowercase() {
        single(c.to_uppercase(), c)
    } else if c.is_uppercase() {
        single(c.to_lowercase(), c)
    } else {
        c
    }
}

/// Switch the case of the first character in a string.
pub fn case_flip_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(case_flip(first));
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Upper-case the first character, leaving the rest alone.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Lower-case the first character, leaving the rest alone.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// Normalise a phrase for plural-insensitive comparison: drop non-word
/// characters, lower-case, strip one trailing `s`.
pub fn norm(s: &str) -> String {
    let mut out: String = s
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_')
        .flat_map(char::to_lowercase)
        .collect();
    if out.ends_with('s') {
        out.pop();
    }
    out
}

/// Lower-case alphabetic characters of a string, everything else dropped.
pub fn lc_alpha(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_title_case() {
        assert!(is_title_case("Test"));
        assert!(is_title_case("Test Test"));
        assert!(!is_title_case("test"));
        assert!(!is_title_case("TEST TEST"));
        assert!(!is_title_case("test test"));
        assert!(!is_title_case("tEst Test"));
    }

    #[test]
    fn test_is_title_case_ignores_punctuation_terms() {
        assert!(is_title_case("[[London]] Congestion Charge"));
        assert!(is_title_case("London Congestion-Charge"));
        assert!(!is_title_case("[[test]] phrase"));
    }

    #[test]
    fn test_single_letter_term_is_not_title_case() {
        assert!(!is_title_case("World War I"));
    }

    #[test]
    fn test_case_flip() {
        assert_eq!(case_flip('a'), 'A');
        assert_eq!(case_flip('A'), 'a');
        assert_eq!(case_flip('1'), '1');
        assert_eq!(case_flip('ß'), 'ß');
    }

    #[test]
    fn test_case_flip_first() {
        assert_eq!(case_flip_first("test phrase"), "Test phrase");
        assert_eq!(case_flip_first("Test"), "test");
        assert_eq!(case_flip_first(""), "");
    }

    #[test]
    fn test_first_letter_helpers() {
        assert_eq!(upper_first("turnstile"), "Turnstile");
        assert_eq!(lower_first("Public speaking"), "public speaking");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm("X"), "x");
        assert_eq!(norm("Tables"), "table");
        assert_eq!(norm("Tables!!!"), "table");
        assert_eq!(norm(""), "");
    }

    #[test]
    fn test_lc_alpha() {
        assert_eq!(lc_alpha("Boilerplate_(text)#Boilerplate_code"), "boilerplatetextboilerplatecode");
        assert_eq!(lc_alpha("existence of God"), "existenceofgod");
    }

    #[test]
    fn test_case_predicates() {
        assert!(is_upper("TEST [[PHRASE]]"));
        assert!(!is_upper("123"));
        assert!(is_lower("est"));
        assert!(!is_lower(""));
    }
}

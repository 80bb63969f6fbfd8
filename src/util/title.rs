//! Article title helpers that don't touch the network.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_PARENS_RE: Regex = Regex::new(r" \(.*?\)$").expect("valid parens regex");
}

const NAMESPACES: &[&str] = &[
    "special",
    "media",
    "talk",
    "template",
    "portal",
    "portal talk",
    "book",
    "book talk",
    "template talk",
    "draft",
    "draft talk",
    "help",
    "help talk",
    "category",
    "category talk",
    "user",
    "gadget",
    "gadget talk",
    "gadget definition",
    "gadget definition talk",
    "topic",
    "user talk",
    "wikipedia",
    "education program",
    "education program talk",
    "wikipedia talk",
    "file",
    "file talk",
    "timedtext",
    "timedtext talk",
    "mediawiki",
    "module",
    "module talk",
    "mediawiki talk",
];

/// Does the title start with a namespace prefix such as `Category:`?
pub fn starts_with_namespace(title: &str) -> bool {
    title.split_once(':').is_some_and(|(ns, _)| {
        let ns = ns.to_lowercase();
        NAMESPACES.contains(&ns.as_str())
    })
}

/// The title without its namespace prefix, if it has one.
pub fn strip_namespace(title: &str) -> &str {
    match title.split_once(':') {
        Some((_, rest)) if starts_with_namespace(title) => rest,
        _ => title,
    }
}

/// Drop a parenthesised qualifier from the end of a title:
/// `Mercury (planet)` becomes `Mercury`.
pub fn strip_parens(q: &str) -> &str {
    TRAILING_PARENS_RE.find(q).map_or(q, |m| &q[..m.start()])
}

/// Whether a page using these templates is a disambiguation page. Covers
/// the `*dis` geographic variants, given-name lists and surname lists.
pub fn is_disambig<S: AsRef<str>>(templates: &[S]) -> bool {
    templates.iter().any(|t| {
        let t = t.as_ref().to_lowercase();
        t.contains("disambig")
            || t.ends_with("dis")
            || t.contains("given name")
            || t == "template:surname"
    })
}

/// Normalise an article title: underscores become spaces, outer whitespace goes.
pub fn wiki_space_norm(s: &str) -> String {
    s.replace('_', " ").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_namespace() {
        assert!(starts_with_namespace("Category:Market towns"));
        assert!(starts_with_namespace("user talk:Edward"));
        assert!(!starts_with_namespace("Star Trek: Voyager"));
        assert!(!starts_with_namespace("Market town"));
    }

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("Category:Market towns"), "Market towns");
        assert_eq!(strip_namespace("Star Trek: Voyager"), "Star Trek: Voyager");
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("Mercury (planet)"), "Mercury");
        assert_eq!(strip_parens("Mercury"), "Mercury");
        assert_eq!(strip_parens("A (b) c (d)"), "A");
        assert_eq!(strip_parens("(planet) Mercury"), "(planet) Mercury");
    }

    #[test]
    fn test_is_disambig() {
        assert!(!is_disambig::<&str>(&[]));
        assert!(is_disambig(&["disambig", "magic"]));
        assert!(is_disambig(&["geodis"]));
        assert!(is_disambig(&["Disambig"]));
        assert!(is_disambig(&["Template:Given name"]));
        assert!(is_disambig(&["Template:Surname"]));
        assert!(!is_disambig(&["Template:Surname box", "Template:Infobox planet"]));
    }

    #[test]
    fn test_wiki_space_norm() {
        assert_eq!(wiki_space_norm("_Market_town "), "Market town");
    }
}

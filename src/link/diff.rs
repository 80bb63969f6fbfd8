//! Diff generation using the `similar` crate.
//!
//! Renders a section edit as a unified diff for review when the server-side
//! diff isn't wanted or available.

use similar::{Algorithm, TextDiff};

/// Generate a unified diff between the old and new text of an article.
///
/// Uses the Patience algorithm, which keeps paragraph structure intact.
pub fn unified_diff(title: &str, old: &str, new: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Patience)
        .diff_lines(old, new);

    diff.unified_diff()
        .header(&format!("a/{title}"), &format!("b/{title}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_diff() {
        let result = unified_diff("Page", "hello\n", "hello\n");
        assert!(!result.contains("+hello"));
        assert!(!result.contains("-hello"));
    }

    #[test]
    fn test_linked_phrase_diff() {
        let old = "== A ==\nSpherical trig.\n";
        let new = "== A ==\n[[Spherical trig]].\n";
        let result = unified_diff("Page", old, new);
        assert!(result.contains("--- a/Page"));
        assert!(result.contains("-Spherical trig."));
        assert!(result.contains("+[[Spherical trig]]."));
    }
}

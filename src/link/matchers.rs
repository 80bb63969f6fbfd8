//! Phrase matchers, most specific first.
//!
//! [`LinkMatcher::new`] compiles five regular expressions from the search
//! phrase. [`LinkMatcher::search`] tries them in order and returns the first
//! acceptable hit; hits from different matchers are never combined.
//!
//! Every matcher captures the phrase's first character as group 1 so the
//! replacement can reuse the case the article used. None of them may match
//! straight after a `-`: the `regex` crate has no look-behind, so that rule
//! is enforced by [`find_not_after_dash`].

use regex::{Captures, Regex};
use tracing::debug;

/// A hit spanning this many `[[` or more crosses too many links to rewrite.
const MAX_LINK_OPENINGS: usize = 4;

const EN_DASH: char = '\u{2013}';

/// Separator used inside and around existing links: an optional trailing
/// `'s`/plural, an optional link close and an optional (piped) link open.
const LINK_SPACE: &str = r"('?s?\]\])?'?s? ?(\[\[(?:.+\|)?)?";

/// Matching strategy, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// The phrase, optionally already inside a (piped) link, with flexible
    /// separators between words.
    OptionalLink,
    /// The exact phrase as the display text of a piped link.
    PipedExact,
    /// The phrase as the display text of a piped link, flexible separators.
    PipedFlexible,
    /// The exact phrase as plain text, ignoring case.
    Plain,
    /// Plain text with optional commas and space/hyphen/newline tolerance.
    PlainFlexible,
}

impl MatcherKind {
    pub const ALL: [Self; 5] = [
        Self::OptionalLink,
        Self::PipedExact,
        Self::PipedFlexible,
        Self::Plain,
        Self::PlainFlexible,
    ];

    /// Regex source for this strategy, case-insensitive.
    fn pattern(self, q: &str) -> String {
        let mut chars = q.chars();
        let first = chars
            .next()
            .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
            .unwrap_or_default();
        let tail = chars.as_str();

        match self {
            Self::OptionalLink => format!(
                r"(?i)(?:\[\[(?:[^\]]+\|)?)?({first}){}(?:\]\])?",
                link_tolerant(tail)
            ),
            Self::PipedExact => format!(
                r"(?i)\[\[[^|]+\|({first}){}\]\]",
                regex::escape(tail)
            ),
            Self::PipedFlexible => format!(
                r"(?i)\[\[[^|]+\|({first}){}(?:\]\])?",
                link_tolerant(tail)
            ),
            Self::Plain => format!(r"(?i)({first}){}", regex::escape(tail)),
            Self::PlainFlexible => format!(r"(?i)({first}){}", space_tolerant(tail)),
        }
    }
}

/// Optional hyphen before every character, link-aware word separators.
fn link_tolerant(tail: &str) -> String {
    tail.chars()
        .map(|c| {
            let part = match c {
                ' ' | EN_DASH => LINK_SPACE.to_owned(),
                '-' => "[- ]".to_owned(),
                _ => regex::escape(c.encode_utf8(&mut [0; 4])),
            };
            format!("-?{part}")
        })
        .collect()
}

/// Optional commas, spaces that may absorb a hyphen or a line break.
fn space_tolerant(tail: &str) -> String {
    tail.chars()
        .map(|c| match c {
            ',' => ",?".to_owned(),
            ' ' | EN_DASH => " *[-\n]? *".to_owned(),
            _ => regex::escape(c.encode_utf8(&mut [0; 4])),
        })
        .collect()
}

/// Leftmost match of `re` in `text` that doesn't start right after a `-`.
pub fn find_not_after_dash<'t>(re: &Regex, text: &'t str) -> Option<Captures<'t>> {
    let mut pos = 0;
    while pos <= text.len() {
        let caps = re.captures_at(text, pos)?;
        let start = caps.get(0)?.start();
        if !text[..start].ends_with('-') {
            return Some(caps);
        }
        pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// One compiled strategy.
#[derive(Debug, Clone)]
struct Matcher {
    kind: MatcherKind,
    regex: Regex,
}

/// A successful search: the matched span and the captured first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    pub kind: MatcherKind,
    pub start: usize,
    pub end: usize,
    /// The matched text, markup included.
    pub text: String,
    /// The phrase's first character as written in the article.
    pub first: String,
}

impl PhraseMatch {
    fn from_captures(kind: MatcherKind, caps: &Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        Some(Self {
            kind,
            start: whole.start(),
            end: whole.end(),
            text: whole.as_str().to_owned(),
            first: caps.get(1)?.as_str().to_owned(),
        })
    }

    /// Replace the matched span of `text` with `[[replacement]]`.
    ///
    /// `text` must be the string the match was found in.
    pub fn add_link(&self, replacement: &str, text: &str) -> String {
        format!(
            "{}[[{replacement}]]{}",
            &text[..self.start],
            &text[self.end..]
        )
    }
}

/// The ordered matcher list built for one phrase.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    matchers: Vec<Matcher>,
}

impl LinkMatcher {
    /// Compile the matchers for `q`.
    ///
    /// # Errors
    ///
    /// Returns an error only if a generated pattern exceeds the regex size
    /// limit, which needs an absurdly long phrase.
    pub fn new(q: &str) -> Result<Self, regex::Error> {
        let matchers = MatcherKind::ALL
            .into_iter()
            .map(|kind| {
                Ok(Matcher {
                    kind,
                    regex: Regex::new(&kind.pattern(q))?,
                })
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { matchers })
    }

    /// First acceptable hit, trying the matchers in order.
    ///
    /// A matcher's hit is rejected (and the next matcher tried) when it
    /// spans [`MAX_LINK_OPENINGS`] or more `[[`.
    pub fn search(&self, text: &str) -> Option<PhraseMatch> {
        for matcher in &self.matchers {
            let Some(caps) = find_not_after_dash(&matcher.regex, text) else {
                continue;
            };
            let Some(found) = PhraseMatch::from_captures(matcher.kind, &caps) else {
                continue;
            };
            if found.text.matches("[[").count() < MAX_LINK_OPENINGS {
                debug!(matcher = ?matcher.kind, matched = found.text, "phrase match");
                return Some(found);
            }
            debug!(matcher = ?matcher.kind, "match spans too many links, skipping");
        }
        None
    }

    /// Grow `found` over trailing word characters, using the matcher that
    /// produced it. Returns the longer match if there is one.
    pub fn extend(&self, found: &PhraseMatch, text: &str) -> Option<PhraseMatch> {
        let matcher = self.matchers.iter().find(|m| m.kind == found.kind)?;
        let extended = Regex::new(&format!(r"{}\w*\b", matcher.regex.as_str())).ok()?;
        let caps = find_not_after_dash(&extended, text)?;
        let longer = PhraseMatch::from_captures(found.kind, &caps)?;
        (longer.end > found.end).then_some(longer)
    }
}

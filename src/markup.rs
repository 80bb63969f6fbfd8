//! Markup tokenizer.
//!
//! Splits raw article wikitext into the structural pieces the linker cares
//! about, without building a parse tree:
//!
//! - [`section_iter`]: `(heading, body)` pairs, split on balanced `=...=` lines
//! - [`parse_cite_or_short_description`]: text runs vs. citation/short
//!   description blocks that must never be searched
//! - [`parse_links`]: text runs vs. `[[wikilinks]]` vs. `[[File:...]]` embeds
//!
//! Every tokenizer borrows from its input and covers it exactly: joining the
//! pieces back together reproduces the original text byte for byte.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // The `=` core of a heading line; run balance is checked in `heading_level`.
    static ref HEADING_RE: Regex =
        Regex::new(r"^\s*(=+.*=)(?:<!--.*-->|\s)*$").expect("valid heading regex");
    static ref CITE_OR_SHORT_DESCRIPTION_RE: Regex = Regex::new(
        r"(?is)\{\{Short description\|.*?\}\}|<ref(?: [^>]*?)?>\s*(?:\{\{cite.*?\}\}|\[https?://[^\]]*?\])\s*</ref>"
    )
    .expect("valid citation regex");
}

/// One structural piece of article text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text, searched for the phrase.
    Text(&'a str),
    /// An existing wikilink, brackets included.
    Link(&'a str),
    /// A `[[File:...]]` or `[[Image:...]]` embed, brackets included.
    Image(&'a str),
    /// A citation or short description block, never searched.
    Cite(&'a str),
}

impl<'a> Token<'a> {
    /// The raw text this token covers.
    pub const fn as_str(&self) -> &'a str {
        match *self {
            Self::Text(s) | Self::Link(s) | Self::Image(s) | Self::Cite(s) => s,
        }
    }
}

/// A heading line (if any) and the body text that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// The full heading line including its newline; `None` for a lead section.
    pub heading: Option<&'a str>,
    pub body: &'a str,
}

/// Heading level of a line, or `None` if the line isn't a heading.
///
/// The leading and trailing `=` runs must balance, with at least one
/// character between them; the level is the length of the balanced run.
pub fn heading_level(line: &str) -> Option<usize> {
    let core = HEADING_RE.captures(line)?.get(1)?.as_str();
    let leading = core.chars().take_while(|&c| c == '=').count();
    let trailing = core.chars().rev().take_while(|&c| c == '=').count();
    let len = core.chars().count();
    let level = leading.min(trailing).min(len.saturating_sub(1) / 2);
    (level > 0).then_some(level)
}

/// Characters that end a line, as `str.splitlines` in Python counts them.
/// `\r\n` is a single break.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Lines of `text`, each keeping its line break.
fn lines_inclusive(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = match rest.find(LINE_BREAKS) {
            Some(i) => {
                let brk = rest[i..].chars().next()?;
                let end = i + brk.len_utf8();
                if brk == '\r' && rest[end..].starts_with('\n') {
                    end + 1
                } else {
                    end
                }
            }
            None => rest.len(),
        };
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}

/// Split article text into sections.
///
/// Heading-like lines inside an HTML comment (`<!-- ... -->`, possibly
/// spanning several lines) are body text. The first section has no heading
/// unless the text starts with one.
pub fn section_iter(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut heading = None;
    let mut body_start = 0;
    let mut pos = 0;
    let mut in_comment = false;

    for line in lines_inclusive(text) {
        let line_start = pos;
        pos += line.len();

        if line.contains("<!--") {
            in_comment = true;
        }
        if line.contains("-->") {
            in_comment = false;
        }
        if in_comment || heading_level(line).is_none() {
            continue;
        }

        let body = &text[body_start..line_start];
        if !body.is_empty() || heading.is_some() {
            sections.push(Section { heading, body });
        }
        heading = Some(line);
        body_start = pos;
    }

    sections.push(Section {
        heading,
        body: &text[body_start..],
    });
    sections
}

/// Text of the subsections nested below section `section_num`.
///
/// Collects every following section whose heading is deeper than the given
/// section's, stopping at the first one of the same or shallower level. The
/// lead section has level 0 and never collects anything.
pub fn get_subsections(text: &str, section_num: usize) -> String {
    let mut found = String::new();
    let mut collection_level = None;

    for (num, section) in section_iter(text).into_iter().enumerate() {
        let level = section.heading.and_then(heading_level).unwrap_or(0);
        if num == section_num {
            collection_level = Some(level).filter(|&l| l > 0);
            continue;
        }
        let Some(collect_below) = collection_level else {
            continue;
        };
        if level <= collect_below {
            break;
        }
        found.push_str(section.heading.unwrap_or_default());
        found.push_str(section.body);
    }

    found
}

/// Split a section body into text runs and citation/short description blocks.
///
/// Always yields a text token before each citation and one at the end, even
/// when empty, so text and citations alternate.
pub fn parse_cite_or_short_description(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut prev = 0;
    for m in CITE_OR_SHORT_DESCRIPTION_RE.find_iter(text) {
        tokens.push(Token::Text(&text[prev..m.start()]));
        tokens.push(Token::Cite(m.as_str()));
        prev = m.end();
    }
    tokens.push(Token::Text(&text[prev..]));
    tokens
}

/// End offset of the bracket-balanced `[[...]]` span starting at `start`.
fn balanced_link_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'[', b'[') => {
                depth += 1;
                i += 2;
            }
            (b']', b']') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Next non-empty, balanced wikilink span at or after `from`.
fn next_wikilink(text: &str, from: usize) -> Option<(usize, usize)> {
    let mut search = from;
    while let Some(rel) = text[search..].find("[[") {
        let start = search + rel;
        match balanced_link_end(text, start) {
            Some(end) if end - start > 4 => return Some((start, end)),
            _ => search = start + 2,
        }
    }
    None
}

fn is_image(link: &str) -> bool {
    let lower = link.to_lowercase();
    ["[[file:", "[[image:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Split text into plain runs, wikilinks and image embeds.
///
/// Empty text runs are not emitted.
pub fn parse_links(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut prev = 0;
    while let Some((start, end)) = next_wikilink(text, prev) {
        if prev != start {
            tokens.push(Token::Text(&text[prev..start]));
        }
        let link = &text[start..end];
        tokens.push(if is_image(link) {
            Token::Image(link)
        } else {
            Token::Link(link)
        });
        prev = end;
    }
    if prev < text.len() {
        tokens.push(Token::Text(&text[prev..]));
    }
    tokens
}

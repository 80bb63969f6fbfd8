//! Linking engine: find an unlinked mention of a phrase and wrap it in a
//! wikilink.
//!
//! # Architecture
//!
//! The content linker walks an article section by section. Headings pass
//! through untouched, each body is split so citations and short descriptions
//! are never searched, and the remaining text chunks go to the chunk linker
//! until one of them produces a replacement.
//!
//! The chunk linker tokenizes a chunk into text, links and images:
//! 1. Text marks that the phrase occurs outside links
//! 2. Image captions are linked as soon as they match
//! 3. An existing link whose label matches is rewritten, unless it already
//!    points at an unrelated article (a "bad link")
//! 4. With nothing rewritten, the whole chunk is searched and the first hit
//!    is linked, extended over trailing word characters when piping to a
//!    different target
//!
//! Matching itself lives in [`matchers`]; choosing the replacement's casing
//! lives in [`resolve`].

pub mod diff;
pub mod matchers;
pub mod resolve;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::Wiki;
use crate::error::{ApiError, LinkError, LinkResult};
use crate::markup::{Token, get_subsections, parse_cite_or_short_description, parse_links, section_iter};
use crate::util::lc_alpha;

use matchers::LinkMatcher;
use resolve::match_found;

/// Result of linking one chunk. `replacement` is `None` when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLink {
    pub content: String,
    pub replacement: Option<String>,
    pub matched: Option<String>,
}

/// A successful edit of a whole article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentLink {
    /// The article with the new link spliced in.
    pub content: String,
    /// What went between the brackets, `target|label` when piped.
    pub replacement: String,
    /// The article text the link replaced.
    pub matched: Option<String>,
}

/// An edit confined to one section, for review as a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEdit {
    pub section_num: usize,
    /// Heading and body after the edit.
    pub section_text: String,
    /// Heading and body before the edit.
    pub old_text: String,
    pub replacement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
}

/// Server-rendered diff of a section edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDiff {
    pub diff: String,
    pub replacement: String,
}

/// Split the inside of `[[...]]` into destination and label.
fn split_link(link: &str) -> (Option<&str>, &str) {
    let inner = &link[2..link.len() - 2];
    match inner.split_once('|') {
        Some((dest, text)) => (Some(dest), text),
        None => (None, inner),
    }
}

/// Whether a link whose label matches `q` points somewhere unrelated.
///
/// A destination that mentions the phrase, or redirects to exactly it, is
/// fine. An unpiped link is bad only when its text is strictly longer than
/// the phrase and contains it.
fn is_bad_link(wiki: &dyn Wiki, q: &str, dest: Option<&str>, text: &str) -> LinkResult<bool> {
    let Some(dest) = dest.filter(|d| !d.is_empty()) else {
        return Ok(text.contains(q) && text.chars().count() > q.chars().count());
    };
    let lc_q = lc_alpha(q);
    if dest.chars().count() <= q.chars().count() || lc_alpha(dest).contains(&lc_q) {
        return Ok(false);
    }

    let redirect = match wiki.redirect_target(dest) {
        Ok(redirect) => redirect,
        Err(ApiError::MissingPage { .. }) => None,
        Err(err) => return Err(err.into()),
    };
    debug!(dest, ?redirect, "checked existing link");
    Ok(!redirect.is_some_and(|r| lc_alpha(&r) == lc_q))
}

/// Link the first mention of `q` in one chunk of text.
///
/// # Errors
///
/// `LinkReplace` if the only mention is inside a link to an unrelated
/// article. Collaborator failures propagate.
pub fn find_link_in_chunk(
    wiki: &dyn Wiki,
    q: &str,
    content: &str,
    linkto: Option<&str>,
) -> LinkResult<ChunkLink> {
    if q.is_empty() {
        return Err(LinkError::NoMatch);
    }
    let matcher = LinkMatcher::new(q)?;
    let mut new_content = String::with_capacity(content.len() + 4);
    let mut replacement: Option<String> = None;
    let mut matched: Option<String> = None;
    let mut match_in_non_link = false;
    let mut bad_link_match = false;

    for token in parse_links(content) {
        match token {
            Token::Text(text) => {
                if matcher.search(text).is_some() {
                    match_in_non_link = true;
                }
                new_content.push_str(text);
            }
            Token::Image(image) => {
                let inner = &image[..image.len() - 2];
                let (before, caption) = inner
                    .rfind('|')
                    .map_or(("", inner), |i| (&inner[..=i], &inner[i + 1..]));
                if let Some(found) = matcher.search(caption) {
                    let r = match_found(wiki, &found, q, linkto)?;
                    new_content.push_str(before);
                    new_content.push_str(&found.add_link(&r, caption));
                    new_content.push_str("]]");
                    matched = Some(found.text);
                    replacement = Some(r);
                } else {
                    new_content.push_str(image);
                }
            }
            Token::Link(link) if replacement.is_none() && !match_in_non_link => {
                let (dest, text) = split_link(link);
                let found = matcher
                    .search(text)
                    .filter(|_| !dest.is_some_and(|d| d.starts_with('#')));
                let Some(found) = found else {
                    new_content.push_str(link);
                    continue;
                };
                bad_link_match = is_bad_link(wiki, q, dest, text)?;
                if bad_link_match {
                    debug!(link, "match inside link to another article");
                    new_content.push_str(link);
                    continue;
                }
                let r = match_found(wiki, &found, q, linkto)?;
                new_content.push_str(&found.add_link(&r, text));
                matched = Some(found.text);
                replacement = Some(r);
            }
            Token::Link(s) | Token::Cite(s) => new_content.push_str(s),
        }
    }

    if replacement.is_none() {
        if bad_link_match {
            return Err(LinkError::LinkReplace);
        }
        if let Some(found) = matcher.search(content) {
            let mut r = match_found(wiki, &found, q, linkto)?;
            new_content = found.add_link(&r, content);
            if linkto.is_some_and(|l| !l.is_empty()) {
                if let Some(longer) = matcher.extend(&found, content) {
                    r.push_str(&content[found.end..longer.end]);
                    new_content = longer.add_link(&r, content);
                }
            }
            matched = Some(found.text);
            replacement = Some(r);
        }
    }

    Ok(ChunkLink {
        content: new_content,
        replacement,
        matched,
    })
}

/// Link the first mention of `q` in a whole article.
///
/// With `linkto`, a mention of the target itself is linked first; only if it
/// isn't mentioned is `q` linked and piped to it.
///
/// # Errors
///
/// `NoMatch` when the phrase appears nowhere searchable, `LinkReplace` when
/// every mention is inside a link to an unrelated article.
pub fn find_link_in_content(
    wiki: &dyn Wiki,
    q: &str,
    content: &str,
    linkto: Option<&str>,
) -> LinkResult<ContentLink> {
    if let Some(target) = linkto.filter(|l| !l.is_empty()) {
        match find_link_in_content(wiki, target, content, None) {
            Err(LinkError::NoMatch) => {}
            other => return other,
        }
    }

    let mut new_content = String::with_capacity(content.len() + 4);
    let mut replacement: Option<String> = None;
    let mut matched: Option<String> = None;
    let mut link_replace = false;

    for section in section_iter(content) {
        new_content.push_str(section.heading.unwrap_or_default());
        for token in parse_cite_or_short_description(section.body) {
            let chunk = match token {
                Token::Text(chunk) if replacement.is_none() => Some(chunk),
                _ => None,
            };
            if let Some(chunk) = chunk {
                match find_link_in_chunk(wiki, q, chunk, linkto) {
                    Ok(ChunkLink {
                        content: linked,
                        replacement: Some(r),
                        matched: m,
                    }) => {
                        new_content.push_str(&linked);
                        replacement = Some(r);
                        matched = m;
                        continue;
                    }
                    Ok(_) => {}
                    Err(LinkError::LinkReplace) => link_replace = true,
                    Err(err) => return Err(err),
                }
            }
            new_content.push_str(token.as_str());
        }
    }

    match replacement {
        Some(replacement) => Ok(ContentLink {
            content: new_content,
            replacement,
            matched,
        }),
        None if link_replace => Err(LinkError::LinkReplace),
        None => Err(LinkError::NoMatch),
    }
}

/// Run the chunk linker over `content` as a single chunk, ignoring sections
/// and citations.
///
/// # Errors
///
/// `NoMatch` or `LinkReplace`, as for [`find_link_in_chunk`].
pub fn find_link_in_text(wiki: &dyn Wiki, q: &str, content: &str) -> LinkResult<ContentLink> {
    let chunk = find_link_in_chunk(wiki, q, content, None)?;
    let replacement = chunk.replacement.ok_or(LinkError::NoMatch)?;
    Ok(ContentLink {
        content: chunk.content,
        replacement,
        matched: chunk.matched,
    })
}

/// Find the section a link would go in, without the bad-link check.
///
/// Existing links whose label matches are rewritten with the phrase itself.
///
/// # Errors
///
/// `NoMatch` when no section mentions the phrase.
pub fn find_link_and_section(
    wiki: &dyn Wiki,
    q: &str,
    content: &str,
    linkto: Option<&str>,
) -> LinkResult<SectionEdit> {
    if let Some(target) = linkto.filter(|l| !l.is_empty()) {
        match find_link_and_section(wiki, target, content, None) {
            Err(LinkError::NoMatch) => {}
            other => return other,
        }
    }
    if q.is_empty() {
        return Err(LinkError::NoMatch);
    }
    let matcher = LinkMatcher::new(q)?;

    for (section_num, section) in section_iter(content).into_iter().enumerate() {
        let heading = section.heading.unwrap_or_default();
        let mut new_content = heading.to_owned();
        let mut replacement: Option<String> = None;
        let mut link_dest: Option<String> = None;
        let mut link_text: Option<String> = None;

        for token in parse_cite_or_short_description(section.body) {
            let Token::Text(text) = token else {
                new_content.push_str(token.as_str());
                continue;
            };
            if replacement.is_some() {
                new_content.push_str(text);
                continue;
            }

            let mut new_text = String::with_capacity(text.len() + 4);
            for inner in parse_links(text) {
                match inner {
                    Token::Link(link) if replacement.is_none() => {
                        let (dest, label) = split_link(link);
                        if let Some(found) = matcher.search(label) {
                            let r = match_found(wiki, &found, q, None)?;
                            new_text.push_str(&found.add_link(&r, label));
                            link_dest = dest.filter(|d| !d.is_empty()).map(str::to_owned);
                            link_text = Some(label.to_owned());
                            replacement = Some(r);
                        } else {
                            new_text.push_str(link);
                        }
                    }
                    other => new_text.push_str(other.as_str()),
                }
            }

            if replacement.is_some() {
                new_content.push_str(&new_text);
            } else if let Some(found) = matcher.search(text) {
                let r = match_found(wiki, &found, q, linkto)?;
                new_content.push_str(&found.add_link(&r, text));
                replacement = Some(r);
            } else {
                new_content.push_str(text);
            }
        }

        if let Some(replacement) = replacement {
            debug!(section_num, replacement, "section edit");
            return Ok(SectionEdit {
                section_num,
                section_text: new_content,
                old_text: format!("{heading}{}", section.body),
                replacement,
                link_dest,
                link_text,
            });
        }
    }

    Err(LinkError::NoMatch)
}

/// Link `q` in the article `title` and ask the wiki for a diff of the
/// edited section.
///
/// # Errors
///
/// `NoMatch`, or any collaborator failure.
pub fn get_diff(
    wiki: &dyn Wiki,
    q: &str,
    title: &str,
    linkto: Option<&str>,
) -> LinkResult<SectionDiff> {
    let page = wiki.content_and_timestamp(title)?;
    let edit = find_link_and_section(wiki, q, &page.content, linkto)?;
    let section_text = format!(
        "{}{}",
        edit.section_text,
        get_subsections(&page.content, edit.section_num)
    );
    let diff = wiki
        .section_diff(title, edit.section_num, &section_text)
        .inspect_err(|err| warn!(title, %err, "section diff failed"))?;
    Ok(SectionDiff {
        diff,
        replacement: edit.replacement,
    })
}

/// Unified diff of the section edit for `q`, rendered locally.
///
/// # Errors
///
/// `NoMatch`, or a collaborator failure while resolving case.
pub fn preview_diff(
    wiki: &dyn Wiki,
    q: &str,
    content: &str,
    linkto: Option<&str>,
) -> LinkResult<String> {
    let edit = find_link_and_section(wiki, q, content, linkto)?;
    let name = format!("section {}", edit.section_num);
    Ok(diff::unified_diff(&name, &edit.old_text, &edit.section_text))
}

//! Candidate articles for a phrase.
//!
//! A candidate is an article whose text mentions the phrase but which
//! isn't already connected to the phrase's own article. Pages that link to
//! the article (or to a redirect with a matching name), members of the
//! article's category, articles with longer titles containing the phrase
//! and disambiguation pages are all left out. Each remaining hit is
//! classified by how closely its snippet matches the phrase.

use std::collections::{BTreeSet, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::{ARTICLE_NAMESPACE, Backlinks, CATEGORY_NAMESPACE, SearchHit, Wiki};
use crate::error::ApiResult;
use crate::link::resolve::get_case_from_content;
use crate::util::{case_flip_first, is_disambig, lower_first, norm, strip_parens, upper_first};

/// More category title matches than this and categories are skipped.
const MAX_CATEGORY_STARTS: usize = 5;

/// Longer titles are only looked for with phrases longer than this.
const MIN_LONGER_LEN: usize = 6;

lazy_static! {
    static ref QUALIFIED_RE: Regex = Regex::new(r"^(.*) \((.*)\)$").expect("valid qualifier regex");
}

/// How a search snippet contains the phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Verbatim, or differing only in the first letter's case.
    Exact,
    /// Only when compared without regard to case.
    CaseMismatch,
}

/// One article that mentions the phrase without linking it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub title: String,
    pub snippet: String,
    pub snippet_without_markup: String,
    pub match_type: Option<MatchType>,
}

/// Result of [`do_search`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Hits the wiki reported before any filtering.
    pub totalhits: u64,
    pub results: Vec<Candidate>,
    /// Articles with longer titles containing the phrase. `None` for
    /// short phrases, where the list would be mostly noise.
    pub longer: Option<Vec<String>>,
}

/// Search expression for a phrase. `Mercury (planet)` searches for both
/// parts: `"Mercury" AND "planet"`.
pub fn search_query(q: &str) -> String {
    match QUALIFIED_RE.captures(q) {
        Some(caps) => format!("\"{}\" AND \"{}\"", &caps[1], &caps[2]),
        None => format!("\"{q}\""),
    }
}

/// Strip search highlighting and HTML escapes from a snippet. En dashes
/// become hyphens.
pub fn tidy_snippet(snippet: &str) -> String {
    let snippet = snippet
        .replace('\u{2013}', "-")
        .replace("</span>", "")
        .replace("<span class=\"searchmatch\">", "");
    html_escape::decode_html_entities(&snippet).into_owned()
}

/// Everything but the last character.
fn drop_last(s: &str) -> &str {
    s.char_indices().last().map_or("", |(i, _)| &s[..i])
}

/// Classify how `snippet` contains `q`.
///
/// A phrase ending in `y` also matches exactly on its stem, so
/// `technology` matches `technologies`. Any other phrase matches its stem
/// only as a case mismatch.
pub fn match_type(q: &str, snippet: &str) -> Option<MatchType> {
    let q = q.replace('\u{2013}', "-");
    let snippet = tidy_snippet(snippet);

    if snippet.contains(&q) || snippet.contains(&case_flip_first(&q)) {
        return Some(MatchType::Exact);
    }
    let lower = snippet.to_lowercase();
    let mut found = lower
        .contains(&q.to_lowercase())
        .then_some(MatchType::CaseMismatch);

    let stem = drop_last(&q);
    if q.ends_with('y') {
        if snippet.contains(stem) || snippet.contains(&case_flip_first(stem)) {
            return Some(MatchType::Exact);
        }
    } else if found.is_none() && lower.contains(&stem.to_lowercase()) {
        found = Some(MatchType::CaseMismatch);
    }
    found
}

/// Titles among `titles` that are disambiguation pages.
pub fn find_disambig(wiki: &dyn Wiki, titles: &[String]) -> ApiResult<HashSet<String>> {
    if titles.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(wiki
        .page_templates(titles)?
        .into_iter()
        .filter(|page| is_disambig(&page.templates))
        .map(|page| page.title)
        .collect())
}

/// Articles whose titles start with, or contain, the phrase.
///
/// Hits with such titles, and the pages linking to them, are added to
/// `articles` so they drop out of the candidates.
pub fn find_longer(
    wiki: &dyn Wiki,
    q: &str,
    hits: &[SearchHit],
    articles: &mut BTreeSet<String>,
) -> ApiResult<Vec<String>> {
    let this_title = upper_first(q);
    let mut longer = wiki.all_pages(&this_title, ARTICLE_NAMESPACE)?;
    let lq = q.to_lowercase();
    for hit in hits {
        let lt = hit.title.to_lowercase();
        if lt == lq || !lt.contains(&lq) {
            continue;
        }
        articles.insert(hit.title.clone());
        articles.extend(wiki.backlinks(&hit.title)?.articles);
        if !longer.contains(&hit.title) {
            longer.push(hit.title.clone());
        }
    }
    Ok(longer)
}

/// Members of the phrase's own category and of up to a handful of
/// categories whose names start with it.
fn category_members(wiki: &dyn Wiki, this_title: &str) -> ApiResult<HashSet<String>> {
    let mut categories: BTreeSet<String> = wiki
        .all_pages(this_title, CATEGORY_NAMESPACE)?
        .into_iter()
        .collect();
    if categories.len() > MAX_CATEGORY_STARTS {
        debug!(count = categories.len(), "too many categories, skipping");
        categories.clear();
    }
    categories.insert(format!("Category:{this_title}"));

    let mut members = HashSet::new();
    for category in &categories {
        members.extend(wiki.category_members(category)?);
    }
    Ok(members)
}

/// Find articles that mention `q` but don't link to it.
///
/// `redirect_to` is where `q` redirects, if it is a redirect; links to the
/// target count as links to the phrase.
pub fn do_search(wiki: &dyn Wiki, q: &str, redirect_to: Option<&str>) -> ApiResult<SearchOutcome> {
    let this_title = upper_first(q);
    let found = wiki.search(&search_query(q))?;
    let Backlinks {
        mut articles,
        redirects,
    } = wiki.backlinks(redirect_to.unwrap_or(q))?;
    let members = category_members(wiki, &this_title)?;

    // Redirects that are the phrase in another form, or contain it.
    let norm_q = norm(q);
    let lq = q.to_lowercase();
    let related: Vec<String> = redirects
        .into_iter()
        .filter(|r| norm(r) == norm_q || r.to_lowercase().contains(&lq))
        .collect();

    articles.insert(this_title);
    if let Some(to) = redirect_to {
        articles.insert(upper_first(to));
    }
    for redirect in related {
        articles.extend(wiki.backlinks(&redirect)?.articles);
        articles.insert(redirect);
    }

    let longer = if q.chars().count() > MIN_LONGER_LEN {
        Some(find_longer(wiki, q, &found.hits, &mut articles)?)
    } else {
        None
    };

    let hits: Vec<SearchHit> = found
        .hits
        .into_iter()
        .filter(|hit| !articles.contains(&hit.title) && !members.contains(&hit.title))
        .collect();
    let titles: Vec<String> = hits.iter().map(|hit| hit.title.clone()).collect();
    let disambig = find_disambig(wiki, &titles)?;

    let phrase = strip_parens(q);
    let results: Vec<Candidate> = hits
        .into_iter()
        .filter(|hit| !disambig.contains(&hit.title))
        .map(|hit| {
            let without_markup = hit
                .snippet
                .replace("<span class='searchmatch'>", "")
                .replace("</span>", "")
                .replace("  ", " ");
            Candidate {
                match_type: match_type(phrase, &without_markup),
                title: hit.title,
                snippet: hit.snippet,
                snippet_without_markup: without_markup,
            }
        })
        .collect();

    info!(
        q,
        totalhits = found.totalhits,
        candidates = results.len(),
        "search done"
    );
    Ok(SearchOutcome {
        totalhits: found.totalhits,
        results,
        longer,
    })
}

/// Where `q` redirects, written the way the target article writes its own
/// title. The first letter follows `q`'s. `None` if `q` isn't a redirect.
pub fn resolve_redirect(wiki: &dyn Wiki, q: &str) -> ApiResult<Option<String>> {
    let Some(target) = wiki.redirect_target(q)? else {
        return Ok(None);
    };
    let target = match q.chars().next() {
        Some(c) if c.is_uppercase() => upper_first(&target),
        Some(c) if c.is_lowercase() => lower_first(&target),
        _ => target,
    };
    let cased = get_case_from_content(wiki, &target)?;
    debug!(q, target, ?cased, "resolved redirect");
    Ok(Some(cased.unwrap_or(target)))
}

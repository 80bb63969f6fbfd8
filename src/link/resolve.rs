//! Deciding the literal replacement text for a match.

use regex::Regex;
use tracing::debug;

use crate::api::Wiki;
use crate::error::{ApiResult, LinkResult};
use crate::link::matchers::PhraseMatch;
use crate::util::{is_title_case, lower_first, upper_first};

/// Everything after the first character.
fn tail(s: &str) -> &str {
    s.chars().next().map_or("", |c| &s[c.len_utf8()..])
}

/// Look up how an article writes its own title.
///
/// An all-lower-case title that appears verbatim in the article is returned
/// as is. Otherwise the first bold (`'''Title'''`) occurrence, compared
/// without regard to case, supplies the casing. `None` if there is none.
pub fn get_case_from_content(wiki: &dyn Wiki, title: &str) -> ApiResult<Option<String>> {
    let page = wiki.content_and_timestamp(title)?;
    if title == title.to_lowercase() && page.content.contains(title) {
        return Ok(Some(title.to_owned()));
    }

    let bold = format!("(?i)'''({})'''", regex::escape(&title.replace('_', " ")));
    let Ok(re) = Regex::new(&bold) else {
        return Ok(None);
    };
    Ok(re
        .captures(&page.content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned()))
}

/// Pick the replacement for `found`, given the phrase `q` and an optional
/// different link target.
///
/// - Same tail as the phrase: keep the article's first letter.
/// - Phrase with inner capitals, or an all-caps match: use the phrase.
/// - Title Case match: ask the phrase's own article for the real casing,
///   falling back to all lower case.
/// - Otherwise keep the article's first letter.
///
/// With `linkto`, the target's first letter follows the replacement's and the
/// result is piped: `linkto|replacement`.
pub fn match_found(
    wiki: &dyn Wiki,
    found: &PhraseMatch,
    q: &str,
    linkto: Option<&str>,
) -> LinkResult<String> {
    let q_tail = tail(q);
    let mut replacement = if q_tail == tail(&found.text) {
        format!("{}{q_tail}", found.first)
    } else if q_tail.chars().any(char::is_uppercase) || found.text.to_uppercase() == found.text {
        q.to_owned()
    } else if is_title_case(&found.text) {
        debug!(matched = found.text, "title case match, looking up real case");
        get_case_from_content(wiki, q)?.unwrap_or_else(|| q.to_lowercase())
    } else {
        format!("{}{q_tail}", found.first)
    };
    assert!(!replacement.is_empty(), "empty replacement for {q:?}");

    if let Some(linkto) = linkto.filter(|l| !l.is_empty()) {
        let linkto_upper = linkto.chars().next().is_some_and(char::is_uppercase);
        let replacement_first = replacement.chars().next();
        let target = if linkto_upper && replacement_first.is_some_and(char::is_lowercase) {
            lower_first(linkto)
        } else if replacement_first.is_some_and(char::is_uppercase) {
            upper_first(linkto)
        } else {
            linkto.to_owned()
        };
        replacement = format!("{target}|{replacement}");
    }

    Ok(replacement)
}

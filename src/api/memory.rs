//! A [`Wiki`] backed by maps, for tests and offline use.
//!
//! Queries are answered from the stored wikitext: search scans page text
//! for the quoted phrases, backlinks and category members come from the
//! pages' `[[links]]` and templates from their `{{transclusions}}`.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::api::{
    ARTICLE_NAMESPACE, Backlinks, CATEGORY_NAMESPACE, PageContent, PageTemplates, SearchHit,
    SearchResults, Wiki,
};
use crate::error::{ApiError, ApiResult};
use crate::link::diff::unified_diff;
use crate::markup::{Token, get_subsections, parse_links, section_iter};
use crate::util::{starts_with_namespace, strip_namespace, upper_first, wiki_space_norm};

const DEFAULT_TIMESTAMP: &str = "2015-08-07T15:37:03Z";

lazy_static! {
    static ref QUOTED_RE: Regex = Regex::new(r#""([^"]+)""#).expect("valid quoted regex");
    static ref TEMPLATE_RE: Regex =
        Regex::new(r"\{\{\s*([^|{}\n]+?)\s*(?:\||\}\})").expect("valid template regex");
}

/// Titles are stored the way MediaWiki normalises them: spaces, not
/// underscores, and an upper case first letter.
fn title_key(title: &str) -> String {
    upper_first(&wiki_space_norm(title))
}

/// Fixed pages and redirects. Anything not added is a missing page.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWiki {
    pages: HashMap<String, PageContent>,
    redirects: HashMap<String, String>,
}

impl InMemoryWiki {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(self, title: &str, content: &str) -> Self {
        self.with_page_at(title, content, DEFAULT_TIMESTAMP)
    }

    #[must_use]
    pub fn with_page_at(mut self, title: &str, content: &str, timestamp: &str) -> Self {
        self.pages.insert(
            title_key(title),
            PageContent {
                content: content.to_owned(),
                timestamp: timestamp.to_owned(),
            },
        );
        self
    }

    /// Add a redirect. The redirect page itself counts as existing.
    #[must_use]
    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(title_key(from), to.to_owned());
        self
    }

    fn missing(title: &str) -> ApiError {
        ApiError::MissingPage {
            title: title.to_owned(),
        }
    }

    /// Page titles in a stable order.
    fn titles(&self) -> Vec<&String> {
        let mut titles: Vec<_> = self.pages.keys().collect();
        titles.sort();
        titles
    }

    /// Destinations of every `[[link]]` in a page, normalised as titles.
    fn link_targets(content: &str) -> impl Iterator<Item = String> + '_ {
        parse_links(content).into_iter().filter_map(|token| match token {
            Token::Link(link) => {
                let inner = &link[2..link.len() - 2];
                let dest = inner.split_once('|').map_or(inner, |(dest, _)| dest);
                Some(title_key(dest))
            }
            _ => None,
        })
    }
}

/// Wrap the first case-insensitive occurrence of `phrase` the way the
/// search API highlights matches.
fn highlight(content: &str, phrase: &str) -> String {
    let pattern = format!("(?i){}", regex::escape(phrase));
    match Regex::new(&pattern).ok().and_then(|re| re.find(content)) {
        Some(m) => format!(
            "{}<span class=\"searchmatch\">{}</span>{}",
            &content[..m.start()],
            m.as_str(),
            &content[m.end()..]
        ),
        None => content.to_owned(),
    }
}

impl Wiki for InMemoryWiki {
    fn content_and_timestamp(&self, title: &str) -> ApiResult<PageContent> {
        self.pages
            .get(&title_key(title))
            .cloned()
            .ok_or_else(|| Self::missing(title))
    }

    fn redirect_target(&self, title: &str) -> ApiResult<Option<String>> {
        let key = title_key(title);
        if let Some(to) = self.redirects.get(&key) {
            return Ok(Some(to.clone()));
        }
        if self.pages.contains_key(&key) {
            return Ok(None);
        }
        Err(Self::missing(title))
    }

    fn section_diff(
        &self,
        title: &str,
        section_num: usize,
        section_text: &str,
    ) -> ApiResult<String> {
        let page = self.content_and_timestamp(title)?;
        let sections = section_iter(&page.content);
        let old = sections
            .get(section_num)
            .map(|s| {
                format!(
                    "{}{}{}",
                    s.heading.unwrap_or_default(),
                    s.body,
                    get_subsections(&page.content, section_num)
                )
            })
            .ok_or_else(|| ApiError::Mediawiki(format!("no section {section_num} in {title}")))?;
        Ok(unified_diff(title, old.trim(), section_text.trim()))
    }

    fn search(&self, query: &str) -> ApiResult<SearchResults> {
        let phrases: Vec<String> = QUOTED_RE
            .captures_iter(query)
            .map(|c| c[1].to_lowercase())
            .collect();
        if phrases.is_empty() {
            return Err(ApiError::Mediawiki(format!("unsupported search: {query}")));
        }
        let hits: Vec<SearchHit> = self
            .titles()
            .into_iter()
            .filter(|title| !starts_with_namespace(title))
            .filter_map(|title| {
                let content = &self.pages[title].content;
                let lower = content.to_lowercase();
                phrases
                    .iter()
                    .all(|p| lower.contains(p.as_str()))
                    .then(|| SearchHit {
                        title: title.clone(),
                        snippet: highlight(content, &phrases[0]),
                    })
            })
            .collect();
        Ok(SearchResults {
            totalhits: hits.len() as u64,
            hits,
        })
    }

    fn backlinks(&self, title: &str) -> ApiResult<Backlinks> {
        let key = title_key(title);
        let mut found = Backlinks::default();
        for (from, content) in &self.pages {
            if !starts_with_namespace(from)
                && Self::link_targets(&content.content).any(|dest| dest == key)
            {
                found.articles.insert(from.clone());
            }
        }
        for (from, to) in &self.redirects {
            if !starts_with_namespace(from) && title_key(to) == key {
                found.redirects.insert(from.clone());
            }
        }
        Ok(found)
    }

    fn all_pages(&self, prefix: &str, namespace: u32) -> ApiResult<Vec<String>> {
        Ok(self
            .titles()
            .into_iter()
            .filter(|title| match namespace {
                ARTICLE_NAMESPACE => !starts_with_namespace(title),
                CATEGORY_NAMESPACE => title.starts_with("Category:"),
                _ => false,
            })
            .filter(|title| {
                let name = strip_namespace(title);
                name.starts_with(prefix) && name != prefix
            })
            .cloned()
            .collect())
    }

    fn category_members(&self, category: &str) -> ApiResult<Vec<String>> {
        let key = title_key(category);
        Ok(self
            .titles()
            .into_iter()
            .filter(|title| !starts_with_namespace(title))
            .filter(|title| Self::link_targets(&self.pages[*title].content).any(|d| d == key))
            .cloned()
            .collect())
    }

    fn page_templates(&self, titles: &[String]) -> ApiResult<Vec<PageTemplates>> {
        Ok(titles
            .iter()
            .filter_map(|title| {
                let key = title_key(title);
                let page = self.pages.get(&key)?;
                let mut templates: Vec<String> = TEMPLATE_RE
                    .captures_iter(&page.content)
                    .map(|c| format!("Template:{}", title_key(&c[1])))
                    .collect();
                templates.sort();
                templates.dedup();
                Some(PageTemplates {
                    title: key,
                    templates,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_are_normalised() {
        let wiki = InMemoryWiki::new().with_page("london_congestion charge", "text");
        let page = wiki
            .content_and_timestamp("London congestion charge")
            .expect("page exists");
        assert_eq!(page.content, "text");
        assert_eq!(page.timestamp, DEFAULT_TIMESTAMP);
    }

    #[test]
    fn test_missing_page() {
        let wiki = InMemoryWiki::new();
        assert!(matches!(
            wiki.content_and_timestamp("Nowhere"),
            Err(ApiError::MissingPage { .. })
        ));
        assert!(matches!(
            wiki.redirect_target("Nowhere"),
            Err(ApiError::MissingPage { .. })
        ));
    }

    #[test]
    fn test_redirect_target() {
        let wiki = InMemoryWiki::new()
            .with_page("Government budget deficit", "text")
            .with_redirect("Budget deficit", "Government budget deficit");
        assert_eq!(
            wiki.redirect_target("budget deficit").expect("exists"),
            Some("Government budget deficit".to_owned())
        );
        assert_eq!(
            wiki.redirect_target("Government budget deficit").expect("exists"),
            None
        );
    }

    #[test]
    fn test_section_diff() {
        let wiki = InMemoryWiki::new().with_page("Page", "Lead.\n== A ==\nOne two.\n");
        let diff = wiki
            .section_diff("Page", 1, "== A ==\nOne [[two]].\n")
            .expect("diff");
        assert!(diff.contains("-One two."));
        assert!(diff.contains("+One [[two]]."));
        assert!(wiki.section_diff("Page", 5, "x").is_err());
    }

    #[test]
    fn test_search_quoted_phrases() {
        let wiki = InMemoryWiki::new()
            .with_page("Trent", "A river running past Stoke-on-Trent.")
            .with_page("Thames", "The Thames runs through London.")
            .with_page("Category:Rivers", "Rivers running through London.");
        let results = wiki.search(r#""running""#).expect("search");
        assert_eq!(results.totalhits, 1);
        assert_eq!(results.hits[0].title, "Trent");
        assert_eq!(
            results.hits[0].snippet,
            r#"A river <span class="searchmatch">running</span> past Stoke-on-Trent."#
        );

        let results = wiki.search(r#""thames" AND "london""#).expect("search");
        assert_eq!(results.hits.len(), 1);
        assert!(wiki.search("bare words").is_err());
    }

    #[test]
    fn test_backlinks_split_articles_and_redirects() {
        let wiki = InMemoryWiki::new()
            .with_page("Tea", "A drink.")
            .with_page("Milk", "Often added to [[tea|a cup of tea]].")
            .with_page("Category:Drinks", "See [[Tea]].")
            .with_redirect("Cha", "Tea");
        let links = wiki.backlinks("Tea").expect("backlinks");
        assert_eq!(links.articles.into_iter().collect::<Vec<_>>(), ["Milk"]);
        assert_eq!(links.redirects.into_iter().collect::<Vec<_>>(), ["Cha"]);
    }

    #[test]
    fn test_all_pages_by_namespace() {
        let wiki = InMemoryWiki::new()
            .with_page("Market town", "x")
            .with_page("Market towns of Suffolk", "x")
            .with_page("Category:Market towns", "x")
            .with_page("Category:Market towns in Kent", "x");
        assert_eq!(
            wiki.all_pages("Market town", ARTICLE_NAMESPACE).expect("pages"),
            ["Market towns of Suffolk"]
        );
        assert_eq!(
            wiki.all_pages("Market towns", CATEGORY_NAMESPACE)
                .expect("pages"),
            ["Category:Market towns in Kent"]
        );
    }

    #[test]
    fn test_category_members() {
        let wiki = InMemoryWiki::new()
            .with_page("Bungay", "A town.\n[[Category:Market towns|Bungay]]")
            .with_page("Beccles", "A town.\n[[Category:Towns]]");
        assert_eq!(
            wiki.category_members("Category:Market towns").expect("members"),
            ["Bungay"]
        );
    }

    #[test]
    fn test_page_templates() {
        let wiki = InMemoryWiki::new()
            .with_page("Mercury", "{{disambiguation}}\n{{Wiktionary | mercury}}\n{{disambiguation}}")
            .with_page("Venus", "A planet.");
        let titles = ["Mercury", "Venus", "Missing"].map(String::from);
        let templates = wiki.page_templates(&titles).expect("templates");
        assert_eq!(templates.len(), 2);
        assert_eq!(
            templates[0].templates,
            ["Template:Disambiguation", "Template:Wiktionary"]
        );
        assert!(templates[1].templates.is_empty());
    }
}

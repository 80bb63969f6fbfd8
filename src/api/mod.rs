//! The MediaWiki collaborator.
//!
//! The linker needs three things from the wiki: an article's content (to
//! recover the true casing of a title), where a title redirects to (to tell
//! a stale-but-correct link from an unrelated one) and a server-rendered diff
//! of a section edit. Candidate search adds full-text search, backlinks,
//! title prefixes, category members and page templates. [`Wiki`] is that
//! interface; [`MediaWikiClient`] talks to the real API and [`InMemoryWiki`]
//! serves fixed pages.

#[cfg(feature = "http")]
pub mod client;
pub mod memory;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

#[cfg(feature = "http")]
pub use client::MediaWikiClient;
pub use memory::InMemoryWiki;

/// User agent sent with every API request.
pub const USER_AGENT: &str = concat!(
    "find-link/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/EdwardBetts/find_link)"
);

/// Article text and the timestamp of its latest revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub content: String,
    pub timestamp: String,
}

/// Namespace number of ordinary articles.
pub const ARTICLE_NAMESPACE: u32 = 0;
/// Namespace number of categories.
pub const CATEGORY_NAMESPACE: u32 = 14;

/// One full-text search hit. `snippet` is HTML with the matched words
/// wrapped in `<span class="searchmatch">`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Search hits and the total the wiki reported, which may exceed the hits
/// actually fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub totalhits: u64,
    pub hits: Vec<SearchHit>,
}

/// Article pages linking to a title, and redirects to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backlinks {
    pub articles: BTreeSet<String>,
    pub redirects: BTreeSet<String>,
}

/// Templates used by one page, as full titles (`Template:Disambiguation`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplates {
    pub title: String,
    pub templates: Vec<String>,
}

/// Per-request settings for talking to one language edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    /// Language code, e.g. `en`.
    pub language: String,
    pub user_agent: String,
}

impl ApiContext {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            user_agent: USER_AGENT.to_owned(),
        }
    }

    /// The `api.php` endpoint for this language.
    pub fn query_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.language)
    }
}

impl Default for ApiContext {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Lookups the linker performs against the wiki.
pub trait Wiki {
    /// Content and last revision timestamp of an article.
    ///
    /// Fails with `MissingPage` if the title doesn't exist.
    fn content_and_timestamp(&self, title: &str) -> ApiResult<PageContent>;

    /// Where `title` redirects to, or `None` if it isn't a redirect.
    ///
    /// Fails with `MissingPage`, or `MultipleRedirects` for a redirect chain.
    fn redirect_target(&self, title: &str) -> ApiResult<Option<String>>;

    /// Rendered diff between section `section_num` of `title` and `section_text`.
    fn section_diff(&self, title: &str, section_num: usize, section_text: &str)
    -> ApiResult<String>;

    /// Full-text search of article text with a raw search expression.
    fn search(&self, query: &str) -> ApiResult<SearchResults>;

    /// Pages in the article namespace that link to `title`.
    fn backlinks(&self, title: &str) -> ApiResult<Backlinks>;

    /// Non-redirect pages in `namespace` whose name (the title after any
    /// namespace prefix) starts with `prefix` and isn't equal to it.
    /// Returns full titles.
    fn all_pages(&self, prefix: &str, namespace: u32) -> ApiResult<Vec<String>>;

    /// Articles in a category, given as `Category:Name`.
    fn category_members(&self, category: &str) -> ApiResult<Vec<String>>;

    /// Templates used by each of `titles`. Missing pages are left out.
    fn page_templates(&self, titles: &[String]) -> ApiResult<Vec<PageTemplates>>;
}

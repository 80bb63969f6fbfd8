//! MediaWiki API client over HTTPS.
//!
//! Every request carries `format=json`, `action=query` and
//! `formatversion=2`. Replies are decoded into small records per call
//! instead of walking untyped JSON.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{
    ApiContext, Backlinks, PageContent, PageTemplates, SearchHit, SearchResults, Wiki,
};
use crate::error::{ApiError, ApiResult};
use crate::util::{strip_namespace, upper_first};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body text served instead of JSON while the servers are down.
const WEBPAGE_ERROR: &str =
    "Our servers are currently under maintenance or experiencing a technical problem.";

/// Most follow-up requests made for one search or template lookup.
const MAX_CONTINUE: usize = 10;

/// Titles per `prop=templates` request.
const TITLE_BATCH: usize = 50;

const BASE_PARAMS: [(&str, &str); 3] = [
    ("format", "json"),
    ("action", "query"),
    ("formatversion", "2"),
];

#[derive(Debug, Deserialize)]
struct Reply<Q> {
    query: Option<Q>,
    error: Option<ErrorBody>,
    #[serde(rename = "continue")]
    cont: Option<Continue>,
}

/// Continuation values; only the one for the running list is present.
#[derive(Debug, Default, Deserialize)]
struct Continue {
    sroffset: Option<u64>,
    blcontinue: Option<String>,
    tlcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    info: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery<P> {
    pages: Vec<P>,
}

#[derive(Debug, Deserialize)]
struct RevisionPage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    invalidreason: Option<String>,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    content: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct InfoQuery {
    #[serde(default)]
    interwiki: Vec<serde_json::Value>,
    #[serde(default)]
    redirects: Vec<Redirect>,
    #[serde(default)]
    pages: Vec<InfoPage>,
}

#[derive(Debug, Deserialize)]
struct Redirect {
    to: String,
}

#[derive(Debug, Deserialize)]
struct InfoPage {
    #[serde(default)]
    missing: bool,
}

#[derive(Debug, Deserialize)]
struct Titled {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    searchinfo: SearchInfo,
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    totalhits: u64,
}

#[derive(Debug, Deserialize)]
struct BacklinksQuery {
    backlinks: Vec<Backlink>,
}

#[derive(Debug, Deserialize)]
struct Backlink {
    title: String,
    #[serde(default)]
    redirect: bool,
}

#[derive(Debug, Deserialize)]
struct AllPagesQuery {
    allpages: Vec<Titled>,
}

#[derive(Debug, Deserialize)]
struct CategoryMembersQuery {
    categorymembers: Vec<Titled>,
}

#[derive(Debug, Deserialize)]
struct TemplatePage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    templates: Vec<Titled>,
}

#[derive(Debug, Deserialize)]
struct DiffPage {
    #[serde(default)]
    revisions: Vec<DiffRevision>,
}

#[derive(Debug, Deserialize)]
struct DiffRevision {
    diff: DiffBody,
}

#[derive(Debug, Deserialize)]
struct DiffBody {
    body: String,
}

/// Decode an API reply, surfacing API errors and non-JSON bodies.
fn decode<Q: DeserializeOwned>(body: &str) -> ApiResult<Q> {
    decode_continued(body).map(|(query, _)| query)
}

/// Decode an API reply along with its continuation, if any.
fn decode_continued<Q: DeserializeOwned>(body: &str) -> ApiResult<(Q, Continue)> {
    let reply: Reply<Q> = serde_json::from_str(body).map_err(|_| {
        if body.contains(WEBPAGE_ERROR) {
            ApiError::Mediawiki(WEBPAGE_ERROR.to_owned())
        } else {
            ApiError::Mediawiki("unknown error".to_owned())
        }
    })?;
    if let Some(error) = reply.error {
        return Err(ApiError::Mediawiki(error.info));
    }
    let query = reply
        .query
        .ok_or_else(|| ApiError::Mediawiki("reply has no query".to_owned()))?;
    Ok((query, reply.cont.unwrap_or_default()))
}

fn first_page<P>(query: PagesQuery<P>) -> ApiResult<P> {
    query
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Mediawiki("reply has no pages".to_owned()))
}

/// Blocking client for one language edition.
#[derive(Debug, Clone)]
pub struct MediaWikiClient {
    http: reqwest::blocking::Client,
    query_url: String,
}

impl MediaWikiClient {
    /// Build a client for the given context.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend can't be initialised.
    pub fn new(context: &ApiContext) -> ApiResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(context.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            query_url: context.query_url(),
        })
    }

    fn get<Q: DeserializeOwned>(&self, params: &[(&str, &str)]) -> ApiResult<Q> {
        self.get_continued(params).map(|(query, _)| query)
    }

    fn get_continued<Q: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> ApiResult<(Q, Continue)> {
        debug!(url = self.query_url, ?params, "api get");
        let body = self
            .http
            .get(&self.query_url)
            .query(&BASE_PARAMS)
            .query(params)
            .send()?
            .text()?;
        decode_continued(&body)
    }

    /// Templates of one batch of titles, following `tlcontinue`.
    fn templates_batch(
        &self,
        titles: &str,
        found: &mut BTreeMap<String, Vec<String>>,
    ) -> ApiResult<()> {
        let params = [
            ("prop", "templates"),
            ("tllimit", "500"),
            ("tlnamespace", "10"),
            ("titles", titles),
            ("continue", ""),
        ];
        let mut tlcontinue: Option<String> = None;
        for _ in 0..=MAX_CONTINUE {
            let mut request = params.to_vec();
            if let Some(tl) = &tlcontinue {
                request.push(("tlcontinue", tl));
            }
            let (query, cont): (PagesQuery<TemplatePage>, _) = self.get_continued(&request)?;
            for page in query.pages.into_iter().filter(|p| !p.missing) {
                found
                    .entry(page.title)
                    .or_default()
                    .extend(page.templates.into_iter().map(|t| t.title));
            }
            match cont.tlcontinue {
                Some(next) => tlcontinue = Some(next),
                None => break,
            }
        }
        Ok(())
    }

    fn post<Q: DeserializeOwned>(&self, params: &[(&str, &str)]) -> ApiResult<Q> {
        debug!(url = self.query_url, "api post");
        let form: Vec<(&str, &str)> = BASE_PARAMS.iter().chain(params).copied().collect();
        let body = self.http.post(&self.query_url).form(&form).send()?.text()?;
        decode(&body)
    }
}

impl Wiki for MediaWikiClient {
    fn content_and_timestamp(&self, title: &str) -> ApiResult<PageContent> {
        let query: PagesQuery<RevisionPage> = self.get(&[
            ("prop", "revisions|info"),
            ("rvprop", "content|timestamp"),
            ("titles", title),
        ])?;
        let page = first_page(query)?;
        if page.missing {
            return Err(ApiError::MissingPage {
                title: title.to_owned(),
            });
        }
        if page.invalid {
            return Err(ApiError::Mediawiki(
                page.invalidreason.unwrap_or_else(|| "invalid title".to_owned()),
            ));
        }
        let revision = page
            .revisions
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Mediawiki(format!("no revisions for {title}")))?;
        Ok(PageContent {
            content: revision.content,
            timestamp: revision.timestamp,
        })
    }

    fn redirect_target(&self, title: &str) -> ApiResult<Option<String>> {
        let query: InfoQuery =
            self.get(&[("prop", "info"), ("redirects", ""), ("titles", title)])?;
        if !query.interwiki.is_empty() {
            return Ok(None);
        }
        if query.redirects.len() > 1 {
            return Err(ApiError::MultipleRedirects {
                title: title.to_owned(),
            });
        }
        if query.pages.first().is_some_and(|p| p.missing) {
            return Err(ApiError::MissingPage {
                title: title.to_owned(),
            });
        }
        Ok(query.redirects.into_iter().next().map(|r| r.to))
    }

    fn section_diff(
        &self,
        title: &str,
        section_num: usize,
        section_text: &str,
    ) -> ApiResult<String> {
        let section = section_num.to_string();
        let query: PagesQuery<DiffPage> = self.post(&[
            ("prop", "revisions"),
            ("rvprop", "timestamp"),
            ("titles", title),
            ("rvsection", &section),
            ("rvdifftotext", section_text.trim()),
        ])?;
        first_page(query)?
            .revisions
            .into_iter()
            .next()
            .map(|r| r.diff.body)
            .ok_or_else(|| ApiError::Mediawiki(format!("no diff for {title}")))
    }

    fn search(&self, query: &str) -> ApiResult<SearchResults> {
        let params = [
            ("list", "search"),
            ("srwhat", "text"),
            ("srlimit", "50"),
            ("srsearch", query),
            ("continue", ""),
        ];
        let (first, mut cont): (SearchQuery, _) = self.get_continued(&params)?;
        let mut results = SearchResults {
            totalhits: first.searchinfo.totalhits,
            hits: first.search,
        };
        for _ in 0..MAX_CONTINUE {
            let Some(offset) = cont.sroffset else { break };
            let offset = offset.to_string();
            let mut request = params.to_vec();
            request.push(("sroffset", &offset));
            let (more, next): (SearchQuery, _) = self.get_continued(&request)?;
            results.hits.extend(more.search);
            cont = next;
        }
        debug!(query, hits = results.hits.len(), "search done");
        Ok(results)
    }

    fn backlinks(&self, title: &str) -> ApiResult<Backlinks> {
        let params = [
            ("list", "backlinks"),
            ("bllimit", "500"),
            ("blnamespace", "0"),
            ("bltitle", title),
            ("continue", ""),
        ];
        let mut found = Backlinks::default();
        let mut blcontinue: Option<String> = None;
        loop {
            let mut request = params.to_vec();
            if let Some(bl) = &blcontinue {
                request.push(("blcontinue", bl));
            }
            let (query, cont): (BacklinksQuery, _) = self.get_continued(&request)?;
            for link in query.backlinks {
                if link.redirect {
                    found.redirects.insert(link.title);
                } else {
                    found.articles.insert(link.title);
                }
            }
            match cont.blcontinue {
                Some(next) => blcontinue = Some(next),
                None => return Ok(found),
            }
        }
    }

    fn all_pages(&self, prefix: &str, namespace: u32) -> ApiResult<Vec<String>> {
        let namespace = namespace.to_string();
        let query: AllPagesQuery = self.get(&[
            ("list", "allpages"),
            ("apnamespace", &namespace),
            ("apfilterredir", "nonredirects"),
            ("aplimit", "500"),
            ("apprefix", prefix),
        ])?;
        Ok(query
            .allpages
            .into_iter()
            .map(|p| p.title)
            .filter(|title| strip_namespace(title) != prefix)
            .collect())
    }

    fn category_members(&self, category: &str) -> ApiResult<Vec<String>> {
        let cmtitle = upper_first(category);
        let query: CategoryMembersQuery = self.get(&[
            ("list", "categorymembers"),
            ("cmnamespace", "0"),
            ("cmlimit", "500"),
            ("cmtitle", &cmtitle),
        ])?;
        Ok(query.categorymembers.into_iter().map(|p| p.title).collect())
    }

    fn page_templates(&self, titles: &[String]) -> ApiResult<Vec<PageTemplates>> {
        let mut found = BTreeMap::new();
        for batch in titles.chunks(TITLE_BATCH) {
            self.templates_batch(&batch.join("|"), &mut found)?;
        }
        Ok(found
            .into_iter()
            .map(|(title, templates)| PageTemplates { title, templates })
            .collect())
    }
}

//! Article tool: fetch an article from the wiki and link a phrase in it.
//!
//! Produces everything an edit form needs: the new wikitext, the base
//! revision timestamp (digits only, as edit forms want it) and an edit
//! summary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::Wiki;
use crate::error::{ApiError, LinkError};
use crate::link::find_link_in_content;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::starts_with_namespace;

use super::{NOT_FOUND, norm_linkto, norm_phrase};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleParams {
    pub q: String,
    /// Article to edit.
    pub title: String,
    #[serde(default)]
    pub linkto: Option<String>,
}

/// A prepared edit of one article.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleEdit {
    pub title: String,
    pub content: String,
    pub timestamp: String,
    pub replacement: String,
    pub summary: String,
}

/// Edit summary for linking `replacement`.
pub fn edit_summary(replacement: &str) -> String {
    format!("link [[{replacement}]] using [[:en:User:Edward/Find link|Find link]]")
}

/// Return the tool definition for `link_article`.
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "link_article".to_owned(),
        description: "Fetch an article and link the first unlinked mention of a phrase. \
            Returns the new wikitext, base timestamp and an edit summary."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "q": { "type": "string", "description": "Phrase to link" },
                "title": { "type": "string", "description": "Article to edit" },
                "linkto": {
                    "type": "string",
                    "description": "Article to link to, if different from the phrase"
                }
            },
            "required": ["q", "title"]
        }),
    }
}

/// Execute the link_article tool.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or a wiki lookup fails.
pub fn execute(wiki: &dyn Wiki, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: ArticleParams =
        serde_json::from_value(arguments).context("invalid link_article parameters")?;
    let q = norm_phrase(&params.q);
    let title = norm_phrase(&params.title);
    let linkto = norm_linkto(params.linkto.as_deref());

    if starts_with_namespace(&title) {
        return Ok(ToolCallResult::error(format!("{title} is not an article")));
    }

    let page = match wiki.content_and_timestamp(&title) {
        Ok(page) => page,
        Err(ApiError::MissingPage { .. }) => {
            return Ok(ToolCallResult::error(format!("article not found: {title}")));
        }
        Err(e) => return Err(e).with_context(|| format!("failed to fetch {title}")),
    };

    let found = match find_link_in_content(wiki, &q, &page.content, linkto.as_deref()) {
        Ok(found) => found,
        Err(LinkError::NoMatch) => return Ok(ToolCallResult::error(NOT_FOUND)),
        Err(LinkError::LinkReplace) => {
            return Ok(ToolCallResult::error(LinkError::LinkReplace.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    info!(title, replacement = found.replacement, "article linked");

    let edit = ArticleEdit {
        summary: edit_summary(&found.replacement),
        timestamp: page.timestamp.chars().filter(char::is_ascii_digit).collect(),
        title,
        content: found.content,
        replacement: found.replacement,
    };
    Ok(ToolCallResult::text(serde_json::to_string_pretty(&edit)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryWiki;

    #[test]
    fn test_link_article() {
        let wiki = InMemoryWiki::new().with_page_at(
            "Central London",
            "Drivers pay the London congestion charge here.",
            "2015-08-07T15:37:03Z",
        );
        let args = serde_json::json!({"q": "London_congestion_charge", "title": "Central_London"});
        let result = execute(&wiki, args).expect("runs");
        assert!(!result.is_error);
        let value: serde_json::Value =
            serde_json::from_str(&result.content[0].text).expect("json");
        assert_eq!(value["timestamp"], "20150807153703");
        assert_eq!(value["content"], "Drivers pay the [[London congestion charge]] here.");
        assert_eq!(
            value["summary"],
            "link [[London congestion charge]] using [[:en:User:Edward/Find link|Find link]]"
        );
    }

    #[test]
    fn test_namespaced_title_refused() {
        let wiki = InMemoryWiki::new();
        let args = serde_json::json!({"q": "x", "title": "Category:Market towns"});
        let result = execute(&wiki, args).expect("runs");
        assert!(result.is_error);
    }

    #[test]
    fn test_missing_article() {
        let wiki = InMemoryWiki::new();
        let args = serde_json::json!({"q": "x", "title": "Nowhere"});
        let result = execute(&wiki, args).expect("runs");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("Nowhere"));
    }
}

//! Diff tool: the wiki's own rendering of the section edit.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::Wiki;
use crate::error::LinkError;
use crate::link::get_diff;
use crate::server::{ToolCallResult, ToolDefinition};

use super::{NOT_FOUND, norm_linkto, norm_phrase};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffParams {
    pub q: String,
    pub title: String,
    #[serde(default)]
    pub linkto: Option<String>,
}

/// Return the tool definition for `diff`.
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "diff".to_owned(),
        description: "Show the wiki-rendered diff of linking a phrase in an article, \
            limited to the section that changes."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "q": { "type": "string", "description": "Phrase to link" },
                "title": { "type": "string", "description": "Article to diff" },
                "linkto": {
                    "type": "string",
                    "description": "Article to link to, if different from the phrase"
                }
            },
            "required": ["q", "title"]
        }),
    }
}

/// Execute the diff tool.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or a wiki lookup fails.
pub fn execute(wiki: &dyn Wiki, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: DiffParams =
        serde_json::from_value(arguments).context("invalid diff parameters")?;
    let q = norm_phrase(&params.q);
    let title = norm_phrase(&params.title);
    let linkto = norm_linkto(params.linkto.as_deref());

    match get_diff(wiki, &q, &title, linkto.as_deref()) {
        Ok(diff) => Ok(ToolCallResult::text(serde_json::to_string_pretty(&diff)?)),
        Err(LinkError::NoMatch) => Ok(ToolCallResult::error(NOT_FOUND)),
        Err(e) => Err(e).with_context(|| format!("failed to diff {title}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryWiki;

    #[test]
    fn test_diff_tool() {
        let wiki = InMemoryWiki::new().with_page("Page", "Lead.\n== A ==\nA test phrase.\n");
        let args = serde_json::json!({"q": "test phrase", "title": "Page"});
        let result = execute(&wiki, args).expect("runs");
        let value: serde_json::Value =
            serde_json::from_str(&result.content[0].text).expect("json");
        assert_eq!(value["replacement"], "test phrase");
        assert!(value["diff"].as_str().expect("string").contains("+A [[test phrase]]."));
    }

    #[test]
    fn test_diff_missing_article_is_error() {
        let wiki = InMemoryWiki::new();
        assert!(execute(&wiki, serde_json::json!({"q": "x", "title": "Nowhere"})).is_err());
    }
}

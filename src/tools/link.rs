//! Link tool: link a phrase in supplied wikitext.
//!
//! Returns the new content, the replacement and the text it replaced as
//! JSON. When the only mention sits inside a link to another article,
//! nothing is changed and a diff of the proposed section edit is returned
//! instead, for a human to judge.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::api::Wiki;
use crate::error::LinkError;
use crate::link::{find_link_in_content, preview_diff};
use crate::server::{ToolCallResult, ToolDefinition};

use super::{NOT_FOUND, norm_linkto, norm_phrase};

/// Parameters for the link tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkParams {
    /// The phrase to link, usually an article title.
    pub q: String,
    /// Article wikitext.
    pub content: String,
    /// Link target when it differs from the phrase.
    #[serde(default)]
    pub linkto: Option<String>,
}

/// Return the tool definition for `link`.
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "link".to_owned(),
        description: "Link the first unlinked mention of a phrase in article wikitext. \
            Headings, citations and the short description are never linked."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "q": {
                    "type": "string",
                    "description": "Phrase to link"
                },
                "content": {
                    "type": "string",
                    "description": "Article wikitext"
                },
                "linkto": {
                    "type": "string",
                    "description": "Article to link to, if different from the phrase"
                }
            },
            "required": ["q", "content"]
        }),
    }
}

/// Execute the link tool.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or a wiki lookup fails.
pub fn execute(wiki: &dyn Wiki, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: LinkParams =
        serde_json::from_value(arguments).context("invalid link parameters")?;
    let q = norm_phrase(&params.q);
    let linkto = norm_linkto(params.linkto.as_deref());

    match find_link_in_content(wiki, &q, &params.content, linkto.as_deref()) {
        Ok(found) => {
            info!(q, replacement = found.replacement, "linked");
            let text = serde_json::to_string_pretty(&found)?;
            Ok(ToolCallResult::text(text))
        }
        Err(LinkError::NoMatch) => Ok(ToolCallResult::error(NOT_FOUND)),
        Err(LinkError::LinkReplace) => {
            let diff = preview_diff(wiki, &q, &params.content, linkto.as_deref())
                .context("failed to preview link replacement")?;
            Ok(ToolCallResult::text(format!("{}\n\n{diff}", LinkError::LinkReplace)))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryWiki;

    #[test]
    fn test_link_reports_replacement() {
        let wiki = InMemoryWiki::new();
        let args = serde_json::json!({
            "q": "test_phrase",
            "content": "Able to find this test phrase in an article."
        });
        let result = execute(&wiki, args).expect("runs");
        assert!(!result.is_error);
        let value: serde_json::Value =
            serde_json::from_str(&result.content[0].text).expect("json");
        assert_eq!(value["content"], "Able to find this [[test phrase]] in an article.");
        assert_eq!(value["replacement"], "test phrase");
    }

    #[test]
    fn test_link_not_found() {
        let wiki = InMemoryWiki::new();
        let args = serde_json::json!({"q": "standing desk", "content": "Nothing here."});
        let result = execute(&wiki, args).expect("runs");
        assert!(result.is_error);
        assert_eq!(result.content[0].text, NOT_FOUND);
    }

    #[test]
    fn test_link_replace_previews_diff() {
        let wiki = InMemoryWiki::new().with_page("Teleological argument", "text");
        let args = serde_json::json!({
            "q": "existence of God",
            "content": "the [[Teleological argument|existence of God]] is argued\n"
        });
        let result = execute(&wiki, args).expect("runs");
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("manual review"));
        assert!(result.content[0].text.contains("+the [[existence of God]] is argued"));
    }

    #[test]
    fn test_link_rejects_missing_content() {
        let wiki = InMemoryWiki::new();
        assert!(execute(&wiki, serde_json::json!({"q": "x"})).is_err());
    }
}

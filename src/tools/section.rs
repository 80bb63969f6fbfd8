//! Section tool: report the section-level edit without applying it.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::api::Wiki;
use crate::error::LinkError;
use crate::link::find_link_and_section;
use crate::server::{ToolCallResult, ToolDefinition};

use super::{NOT_FOUND, norm_linkto, norm_phrase};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionParams {
    pub q: String,
    pub content: String,
    #[serde(default)]
    pub linkto: Option<String>,
}

/// Return the tool definition for `link_section`.
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "link_section".to_owned(),
        description: "Find the section where a phrase would be linked. Returns the section number, \
            its text before and after the edit, and the link it rewrote, if any."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "q": { "type": "string", "description": "Phrase to link" },
                "content": { "type": "string", "description": "Article wikitext" },
                "linkto": {
                    "type": "string",
                    "description": "Article to link to, if different from the phrase"
                }
            },
            "required": ["q", "content"]
        }),
    }
}

/// Execute the link_section tool.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or a wiki lookup fails.
pub fn execute(wiki: &dyn Wiki, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: SectionParams =
        serde_json::from_value(arguments).context("invalid link_section parameters")?;
    let q = norm_phrase(&params.q);
    let linkto = norm_linkto(params.linkto.as_deref());

    match find_link_and_section(wiki, &q, &params.content, linkto.as_deref()) {
        Ok(edit) => Ok(ToolCallResult::text(serde_json::to_string_pretty(&edit)?)),
        Err(LinkError::NoMatch) => Ok(ToolCallResult::error(NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryWiki;

    #[test]
    fn test_section_edit_json() {
        let wiki = InMemoryWiki::new();
        let args = serde_json::json!({
            "q": "existence of God",
            "content": "Lead.\n== Arguments ==\nThe [[Teleological argument|existence of God]].\n"
        });
        let result = execute(&wiki, args).expect("runs");
        let value: serde_json::Value =
            serde_json::from_str(&result.content[0].text).expect("json");
        assert_eq!(value["sectionNum"], 1);
        assert_eq!(value["linkDest"], "Teleological argument");
        assert_eq!(value["sectionText"], "== Arguments ==\nThe [[existence of God]].\n");
    }
}

//! Tool router: registers and dispatches tool calls.
//!
//! Each tool takes JSON arguments and returns a [`ToolCallResult`]. The
//! router owns the [`Wiki`] the tools consult and provides `list_tools()` /
//! `call_tool()` for the server.

pub mod article;
pub mod diff;
pub mod link;
pub mod search;
pub mod section;

use anyhow::Result;
use tracing::debug;

use crate::api::Wiki;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::wiki_space_norm;

/// Text returned when the phrase doesn't occur in the article.
pub const NOT_FOUND: &str = "phrase not found in article";

/// Normalise a phrase argument the way titles are written in URLs.
pub fn norm_phrase(q: &str) -> String {
    wiki_space_norm(q)
}

/// Normalise an optional link target; blank means none.
pub fn norm_linkto(linkto: Option<&str>) -> Option<String> {
    linkto.map(wiki_space_norm).filter(|l| !l.is_empty())
}

/// Tool router that dispatches tool calls to implementations.
pub struct ToolRouter {
    wiki: Box<dyn Wiki>,
}

impl ToolRouter {
    /// Create a new tool router over `wiki`.
    pub fn new(wiki: Box<dyn Wiki>) -> Self {
        Self { wiki }
    }

    /// List all available tools with their JSON Schema definitions.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        vec![
            link::tool_definition(),
            section::tool_definition(),
            article::tool_definition(),
            diff::tool_definition(),
            search::tool_definition(),
        ]
    }

    /// Call a tool by name with the given JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are malformed or the wiki fails.
    pub fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolCallResult> {
        debug!(tool = name, "dispatching tool call");

        let wiki = self.wiki.as_ref();
        match name {
            "link" => link::execute(wiki, arguments),
            "link_section" => section::execute(wiki, arguments),
            "link_article" => article::execute(wiki, arguments),
            "diff" => diff::execute(wiki, arguments),
            "search" => search::execute(wiki, arguments),
            _ => Ok(ToolCallResult::error(format!("Unknown tool: {name}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_linkto() {
        assert_eq!(norm_linkto(Some("Public_speaking ")), Some("Public speaking".to_owned()));
        assert_eq!(norm_linkto(Some(" ")), None);
        assert_eq!(norm_linkto(None), None);
    }
}

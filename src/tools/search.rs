//! Search tool: list articles that mention a phrase without linking it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::Wiki;
use crate::error::ApiError;
use crate::search::{SearchOutcome, do_search, resolve_redirect};
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::starts_with_namespace;

use super::norm_phrase;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: String,
    /// Treat the phrase as an article even if it is a redirect.
    #[serde(default)]
    pub ignore_redirect: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchReport {
    q: String,
    redirect_to: Option<String>,
    #[serde(flatten)]
    outcome: SearchOutcome,
}

/// Return the tool definition for `search`.
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "search".to_owned(),
        description: "Find articles that mention a phrase but don't link to its article. \
            Pages already linking to it (or to its redirects), category members, \
            longer titles and disambiguation pages are left out."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "q": { "type": "string", "description": "Article title to find mentions of" },
                "ignoreRedirect": {
                    "type": "boolean",
                    "description": "Don't follow the phrase if it is a redirect"
                }
            },
            "required": ["q"]
        }),
    }
}

/// Execute the search tool.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or the wiki fails.
pub fn execute(wiki: &dyn Wiki, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: SearchParams =
        serde_json::from_value(arguments).context("invalid search parameters")?;
    let q = norm_phrase(&params.q);
    if q.is_empty() {
        return Ok(ToolCallResult::error("empty phrase"));
    }
    if starts_with_namespace(&q) {
        return Ok(ToolCallResult::error(format!(
            "'{q}' isn't in the article namespace"
        )));
    }

    let redirect_to = if params.ignore_redirect {
        None
    } else {
        match resolve_redirect(wiki, &q) {
            Ok(redirect_to) => redirect_to,
            Err(ApiError::MissingPage { .. }) => {
                return Ok(ToolCallResult::error(format!("{q} isn't an article")));
            }
            Err(e @ ApiError::MultipleRedirects { .. }) => {
                return Ok(ToolCallResult::error(e.to_string()));
            }
            Err(e) => return Err(e).with_context(|| format!("failed to look up {q}")),
        }
    };

    let outcome = do_search(wiki, &q, redirect_to.as_deref())
        .with_context(|| format!("search for {q} failed"))?;
    let report = SearchReport {
        q,
        redirect_to,
        outcome,
    };
    Ok(ToolCallResult::text(serde_json::to_string_pretty(&report)?))
}

//! `find-link`: find unlinked mentions of a phrase in Wikipedia articles
//! and link them.
//!
//! Given a phrase (usually an article title) and an article's wikitext, the
//! linker locates the first mention outside headings, citations and links to
//! unrelated articles, and splices in a `[[wikilink]]` whose casing follows
//! both the article text and the target article's own title.
//!
//! The engine is exposed over stdio as JSON-RPC 2.0 (newline-delimited) with
//! a small set of tools.
//!
//! # Tools
//!
//! - `link`: link a phrase in supplied wikitext
//! - `link_section`: the section-level edit for review
//! - `link_article`: fetch an article and link it
//! - `diff`: server-rendered diff of the section edit
//! - `search`: articles that mention a phrase without linking it
//!
//! # Architecture
//!
//! ```text
//! stdin (JSON-RPC) → server → ToolRouter → link (matchers, resolve) → markup
//!                                   │          ↓
//!                                   └─ search → api::Wiki (MediaWiki / in-memory)
//! stdout (JSON-RPC) ←─────────────────────────┘
//! ```

pub mod api;
pub mod error;
pub mod link;
pub mod markup;
pub mod search;
pub mod server;
pub mod tools;
pub mod util;

pub use error::{ApiError, ApiResult, LinkError, LinkResult};
pub use link::{
    ContentLink, SectionDiff, SectionEdit, find_link_and_section, find_link_in_content,
    find_link_in_text, get_diff, preview_diff,
};
pub use search::{MatchType, SearchOutcome, do_search, match_type, resolve_redirect};
pub use server::run_server;

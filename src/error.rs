//! Error types for the find-link crate.

/// Failures reported by the MediaWiki collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested title does not exist.
    #[error("missing page: {title}")]
    MissingPage { title: String },

    /// The title redirects through more than one hop.
    #[error("{title} is a redirect to a redirect, this isn't supported")]
    MultipleRedirects { title: String },

    /// The API replied with an error, or with something that isn't JSON.
    #[error("Mediawiki error: {0}")]
    Mediawiki(String),

    /// Transport failure.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcomes of a linking attempt that produce no edit.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The phrase does not occur anywhere searchable in the content.
    #[error("no match found for phrase")]
    NoMatch,

    /// The only candidate sits inside an existing link that points somewhere
    /// else; a human has to review the diff before anything is changed.
    #[error("existing link would be replaced, manual review required")]
    LinkReplace,

    /// The phrase produced a matcher the regex engine refused to compile.
    #[error("invalid phrase pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The collaborator failed while resolving case or redirects.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Convenience result type for linker operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Convenience result type for collaborator calls.
pub type ApiResult<T> = Result<T, ApiError>;

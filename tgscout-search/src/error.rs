//! Error types for the tgscout-search crate.
//!
//! Only [`SearchError::InvalidQuery`], [`SearchError::Config`] and
//! [`SearchError::Closed`] ever reach a caller of
//! [`GroupSearch::search`](crate::GroupSearch::search). The transport
//! variants describe why a single source produced nothing and stay inside
//! [`SourceOutcome`](crate::fetch::SourceOutcome).

/// Errors that can occur while searching for groups.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The query was rejected before any source was contacted.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An HTTP request to a source failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A source answered with a non-success status code.
    #[error("HTTP status {status} from {source_id}")]
    Status {
        /// Id of the source that answered.
        source_id: String,
        /// The status code it answered with.
        status: u16,
    },

    /// A source (or the whole request) ran out of time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The HTTP pool has been shut down.
    #[error("search engine is shut down")]
    Closed,
}

/// Convenience type alias for tgscout-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

//! Aggregation: merge, deduplicate, score, rank, broaden, truncate.
//!
//! The fetch executor hands over one outcome per source. This module turns
//! them into a single ordered, duplicate-free, size-bounded record list and
//! decides whether a second, broadened pass is worth running.

pub mod broaden;
pub mod dedup;
pub mod scoring;
pub mod search;

pub use broaden::broaden_terms;
pub use dedup::{deduplicate, identity_key};
pub use scoring::{rank, tokenize};
pub use search::run_search;

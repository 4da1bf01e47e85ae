//! Torrent search abstraction.
//!
//! This module provides a `Searcher` trait for querying a torrent indexing
//! backend, a GraphQL implementation, and the query builder that derives
//! search strings from a media identifier.

mod graphql;
mod query;
mod types;

pub use graphql::GraphqlSearcher;
pub use query::{CandidateSet, QueryBuilder, QueryPlan};
pub use types::*;

//! Hyperparameter search module
//!
//! Exhaustive cross-validated search over the number of features kept by
//! the selector. Every (candidate, fold) pair is fitted independently on a
//! rayon pool; the best candidate is refit on the whole training set.

mod config;
mod grid_search;

pub use config::{Scoring, SearchConfig};
pub use grid_search::{CandidateOutcome, CandidateResult, GridSearchCV, SearchResult, SearchState};

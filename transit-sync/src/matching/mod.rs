//! Name matching against registry keywords and aliases.

mod names;
mod suggest;

pub use names::{KeywordSet, candidate_names, line_candidate_names, normalize};
pub use suggest::{DEFAULT_MIN_SUGGESTION_SCORE, Suggestion, suggest_line, token_score};

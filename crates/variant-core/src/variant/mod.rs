//! Candidate parsing and variant selection

pub mod candidate;
pub mod select;

pub use candidate::{Candidate, CandidateSet};
pub use select::{select, Selection, SelectionReason, MAX_FALLBACK_STEPS};

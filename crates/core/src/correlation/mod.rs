//! Disc-to-episode correlation.
//!
//! Given one disc's extracted episode count, its label hints and the series
//! catalog, infer which season the disc belongs to. The result always carries
//! a confidence and a human-readable reason; ambiguity is pushed into the data
//! rather than into control flow.

mod engine;
mod types;

pub use engine::{correlate, FLOOR_CONFIDENCE, H1_THRESHOLD, H2_THRESHOLD};
pub use types::{
    CorrelationResult, DiscSeasonMatch, EpisodeCountMatch, FallbackBasis, Heuristic,
    HeuristicKind,
};

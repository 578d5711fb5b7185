//! Types for disc-to-episode correlation.

use serde::{Deserialize, Serialize};

/// How the disc-number-equals-season heuristic matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum DiscSeasonMatch {
    /// Episode count equals the cataloged count.
    Exact,
    /// Episode count within two of the cataloged count.
    Close { expected: u32 },
}

/// How the episode-count heuristic picked a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum EpisodeCountMatch {
    /// Exactly one cataloged season has this episode count.
    Unique,
    /// Several seasons tie; the label's season hint chose one.
    MultipleWithHint { candidates: Vec<u32> },
    /// Several seasons tie; the lowest-numbered one was taken.
    MultipleLowestSeason { candidates: Vec<u32> },
}

/// What the terminal fallback heuristic based its choice on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum FallbackBasis {
    /// A cataloged season hint from the label.
    SeasonHint { expected: u32 },
    /// The disc number, inside the catalog's season range.
    DiscNumberAsSeason,
    /// Nothing usable; season 1.
    DefaultSeason,
}

/// The heuristic that produced a correlation, with its own evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "heuristic", rename_all = "snake_case")]
pub enum Heuristic {
    /// H1: disc number equals a cataloged season number.
    DiscEqualsSeason(DiscSeasonMatch),
    /// H2: the extracted episode count identifies the season.
    EpisodeCount(EpisodeCountMatch),
    /// H3: terminal fallback, always produces a result.
    Fallback(FallbackBasis),
    /// No catalog was available; heuristics were skipped.
    NoCatalog,
}

/// Coarse heuristic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeuristicKind {
    H1,
    H2,
    H3,
    Fallback,
}

impl Heuristic {
    pub fn kind(&self) -> HeuristicKind {
        match self {
            Self::DiscEqualsSeason(_) => HeuristicKind::H1,
            Self::EpisodeCount(_) => HeuristicKind::H2,
            Self::Fallback(_) => HeuristicKind::H3,
            Self::NoCatalog => HeuristicKind::Fallback,
        }
    }

    /// Stable label, e.g. `H1-DiscEqualsSeasonWithMatch`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DiscEqualsSeason(DiscSeasonMatch::Exact) => "H1-DiscEqualsSeasonWithMatch",
            Self::DiscEqualsSeason(DiscSeasonMatch::Close { .. }) => {
                "H1-DiscEqualsSeasonCloseMatch"
            }
            Self::EpisodeCount(EpisodeCountMatch::Unique) => "H2-UniqueEpisodeCountMatch",
            Self::EpisodeCount(EpisodeCountMatch::MultipleWithHint { .. }) => {
                "H2-MultipleMatchesWithHint"
            }
            Self::EpisodeCount(EpisodeCountMatch::MultipleLowestSeason { .. }) => {
                "H2-MultipleMatchesLowestSeason"
            }
            Self::Fallback(FallbackBasis::SeasonHint { .. }) => "H3-SeasonHint",
            Self::Fallback(FallbackBasis::DiscNumberAsSeason) => "H3-DiscNumberAsSeason",
            Self::Fallback(FallbackBasis::DefaultSeason) => "H3-DefaultSeason",
            Self::NoCatalog => "Fallback-NoCatalog",
        }
    }
}

/// Season and (provisional) episode range inferred for one disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub season: u32,
    /// Always 1 here; absolute numbering is resolved against the tracker later.
    pub start_episode: u32,
    pub end_episode: u32,
    pub episode_count: u32,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Human-readable explanation.
    pub correlation_reason: String,
    pub heuristic: Heuristic,
}

impl CorrelationResult {
    pub fn heuristic_used(&self) -> &'static str {
        self.heuristic.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_kinds() {
        let h = Heuristic::DiscEqualsSeason(DiscSeasonMatch::Exact);
        assert_eq!(h.label(), "H1-DiscEqualsSeasonWithMatch");
        assert_eq!(h.kind(), HeuristicKind::H1);

        let h = Heuristic::EpisodeCount(EpisodeCountMatch::MultipleWithHint {
            candidates: vec![1, 2],
        });
        assert_eq!(h.label(), "H2-MultipleMatchesWithHint");
        assert_eq!(h.kind(), HeuristicKind::H2);

        assert_eq!(Heuristic::NoCatalog.kind(), HeuristicKind::Fallback);
    }

    #[test]
    fn test_heuristic_serialization() {
        let h = Heuristic::Fallback(FallbackBasis::SeasonHint { expected: 22 });
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"heuristic\":\"fallback\""));
        assert!(json.contains("\"basis\":\"season_hint\""));
    }
}

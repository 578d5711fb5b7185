//! Three-heuristic correlation of a disc against a series catalog.

use tracing::debug;

use super::types::{
    CorrelationResult, DiscSeasonMatch, EpisodeCountMatch, FallbackBasis, Heuristic,
};
use crate::catalog::SeriesEpisodeCatalog;

/// Minimum confidence for H1 to be accepted.
pub const H1_THRESHOLD: f32 = 0.85;
/// Minimum confidence for H2 to be accepted.
pub const H2_THRESHOLD: f32 = 0.75;

const H1_EXACT: f32 = 0.95;
const H1_CLOSE: f32 = 0.85;
const H1_CLOSE_TOLERANCE: u32 = 2;

const H2_UNIQUE: f32 = 0.90;
const H2_WITH_HINT: f32 = 0.85;
const H2_LOWEST: f32 = 0.75;

const H3_HINT_EXACT: f32 = 0.80;
const H3_HINT_PENALTY_PER_EPISODE: f32 = 0.05;
const H3_DISC_AS_SEASON: f32 = 0.70;
/// Lowest confidence any correlation can produce.
pub const FLOOR_CONFIDENCE: f32 = 0.65;

/// A heuristic's candidate answer before threshold gating.
struct Candidate {
    season: u32,
    confidence: f32,
    reason: String,
    heuristic: Heuristic,
}

/// Correlate one disc with a season.
///
/// Heuristics run in strict priority order and the first whose confidence
/// clears its threshold wins. H3 always answers, so this never fails; an
/// absent or empty catalog yields the fixed no-catalog fallback.
pub fn correlate(
    disc_number: Option<u32>,
    extracted_episode_count: u32,
    season_hint: Option<u32>,
    catalog: Option<&SeriesEpisodeCatalog>,
) -> CorrelationResult {
    let Some(catalog) = catalog.filter(|c| !c.is_empty()) else {
        let season = season_hint.unwrap_or(1);
        return build(
            Candidate {
                season,
                confidence: FLOOR_CONFIDENCE,
                reason: "no catalog available".to_string(),
                heuristic: Heuristic::NoCatalog,
            },
            extracted_episode_count,
        );
    };

    let candidate = disc_equals_season(disc_number, extracted_episode_count, catalog)
        .filter(|c| c.confidence >= H1_THRESHOLD)
        .or_else(|| {
            unique_episode_count(extracted_episode_count, season_hint, catalog)
                .filter(|c| c.confidence >= H2_THRESHOLD)
        })
        .unwrap_or_else(|| fallback(disc_number, extracted_episode_count, season_hint, catalog));

    debug!(
        "Correlated disc {:?} ({} episodes) to season {} via {} ({:.2})",
        disc_number,
        extracted_episode_count,
        candidate.season,
        candidate.heuristic.label(),
        candidate.confidence
    );

    build(candidate, extracted_episode_count)
}

fn build(candidate: Candidate, episode_count: u32) -> CorrelationResult {
    CorrelationResult {
        season: candidate.season,
        start_episode: 1,
        end_episode: episode_count.max(1),
        episode_count,
        confidence: candidate.confidence.clamp(0.0, 1.0),
        correlation_reason: candidate.reason,
        heuristic: candidate.heuristic,
    }
}

/// H1: the disc number names a cataloged season.
fn disc_equals_season(
    disc_number: Option<u32>,
    count: u32,
    catalog: &SeriesEpisodeCatalog,
) -> Option<Candidate> {
    let disc = disc_number?;
    let expected = catalog.episode_count(disc)?;

    if count == expected {
        Some(Candidate {
            season: disc,
            confidence: H1_EXACT,
            reason: format!(
                "disc {} matches season {} with exactly {} episodes",
                disc, disc, count
            ),
            heuristic: Heuristic::DiscEqualsSeason(DiscSeasonMatch::Exact),
        })
    } else if count.abs_diff(expected) <= H1_CLOSE_TOLERANCE {
        Some(Candidate {
            season: disc,
            confidence: H1_CLOSE,
            reason: format!(
                "disc {} close match to season {} ({} episodes, expected {})",
                disc, disc, count, expected
            ),
            heuristic: Heuristic::DiscEqualsSeason(DiscSeasonMatch::Close { expected }),
        })
    } else {
        None
    }
}

/// H2: the extracted episode count identifies the season.
fn unique_episode_count(
    count: u32,
    season_hint: Option<u32>,
    catalog: &SeriesEpisodeCatalog,
) -> Option<Candidate> {
    let matches = catalog.seasons_with_episode_count(count);

    match matches.as_slice() {
        [] => None,
        [season] => Some(Candidate {
            season: *season,
            confidence: H2_UNIQUE,
            reason: format!(
                "season {} is the only season with {} episodes",
                season, count
            ),
            heuristic: Heuristic::EpisodeCount(EpisodeCountMatch::Unique),
        }),
        [lowest, ..] => match season_hint.filter(|h| matches.contains(h)) {
            Some(hint) => Some(Candidate {
                season: hint,
                confidence: H2_WITH_HINT,
                reason: format!(
                    "seasons {:?} all have {} episodes; label hint selects season {}",
                    matches, count, hint
                ),
                heuristic: Heuristic::EpisodeCount(EpisodeCountMatch::MultipleWithHint {
                    candidates: matches.clone(),
                }),
            }),
            None => Some(Candidate {
                season: *lowest,
                confidence: H2_LOWEST,
                reason: format!(
                    "seasons {:?} all have {} episodes; taking lowest season {}",
                    matches, count, lowest
                ),
                heuristic: Heuristic::EpisodeCount(EpisodeCountMatch::MultipleLowestSeason {
                    candidates: matches.clone(),
                }),
            }),
        },
    }
}

/// H3: terminal fallback.
fn fallback(
    disc_number: Option<u32>,
    count: u32,
    season_hint: Option<u32>,
    catalog: &SeriesEpisodeCatalog,
) -> Candidate {
    if let Some((hint, expected)) =
        season_hint.and_then(|h| catalog.episode_count(h).map(|e| (h, e)))
    {
        let difference = count.abs_diff(expected);
        let confidence = if difference == 0 {
            H3_HINT_EXACT
        } else {
            (H3_HINT_EXACT - H3_HINT_PENALTY_PER_EPISODE * difference as f32)
                .max(FLOOR_CONFIDENCE)
        };
        return Candidate {
            season: hint,
            confidence,
            reason: format!(
                "label hints season {} ({} episodes found, {} expected)",
                hint, count, expected
            ),
            heuristic: Heuristic::Fallback(FallbackBasis::SeasonHint { expected }),
        };
    }

    if let Some(disc) = disc_number.filter(|d| catalog.season_in_range(*d)) {
        return Candidate {
            season: disc,
            confidence: H3_DISC_AS_SEASON,
            reason: format!("disc number {} used as season number", disc),
            heuristic: Heuristic::Fallback(FallbackBasis::DiscNumberAsSeason),
        };
    }

    Candidate {
        season: 1,
        confidence: FLOOR_CONFIDENCE,
        reason: "no heuristic matched; defaulting to season 1".to_string(),
        heuristic: Heuristic::Fallback(FallbackBasis::DefaultSeason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::types::HeuristicKind;

    fn catalog(counts: &[(u32, u32)]) -> SeriesEpisodeCatalog {
        SeriesEpisodeCatalog::from_counts("Test Show", counts)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_h1_exact_match() {
        let cat = catalog(&[(1, 22), (2, 23), (6, 24)]);
        let result = correlate(Some(6), 24, None, Some(&cat));
        assert_eq!(result.season, 6);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.heuristic_used(), "H1-DiscEqualsSeasonWithMatch");
        assert_eq!(result.start_episode, 1);
        assert_eq!(result.end_episode, 24);
    }

    #[test]
    fn test_h1_close_match() {
        let cat = catalog(&[(1, 22), (2, 23)]);
        let result = correlate(Some(2), 21, None, Some(&cat));
        assert_eq!(result.season, 2);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.heuristic_used(), "H1-DiscEqualsSeasonCloseMatch");
    }

    #[test]
    fn test_h1_too_far_falls_through_to_h2() {
        let cat = catalog(&[(1, 4), (2, 23)]);
        // Disc 2 of a season-1 set: 4 episodes, nowhere near season 2's 23.
        let result = correlate(Some(2), 4, None, Some(&cat));
        assert_eq!(result.season, 1);
        assert_eq!(result.heuristic_used(), "H2-UniqueEpisodeCountMatch");
    }

    #[test]
    fn test_h2_unique_match() {
        let cat = catalog(&[(1, 22), (2, 23), (6, 24)]);
        let result = correlate(None, 24, None, Some(&cat));
        assert_eq!(result.season, 6);
        assert_eq!(result.confidence, 0.90);
        assert_eq!(result.heuristic_used(), "H2-UniqueEpisodeCountMatch");
    }

    #[test]
    fn test_h2_tie_broken_by_hint() {
        let cat = catalog(&[(1, 22), (2, 22)]);
        let result = correlate(None, 22, Some(2), Some(&cat));
        assert_eq!(result.season, 2);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.heuristic_used(), "H2-MultipleMatchesWithHint");
    }

    #[test]
    fn test_h2_tie_without_hint_takes_lowest() {
        let cat = catalog(&[(1, 22), (2, 22)]);
        let result = correlate(None, 22, Some(5), Some(&cat));
        assert_eq!(result.season, 1);
        assert_eq!(result.confidence, 0.75);
        assert_eq!(result.heuristic_used(), "H2-MultipleMatchesLowestSeason");
    }

    #[test]
    fn test_h3_season_hint_penalty() {
        let cat = catalog(&[(1, 22), (2, 23)]);
        let result = correlate(None, 6, Some(2), Some(&cat));
        assert_eq!(result.season, 2);
        assert!(approx(result.confidence, 0.65));
        assert_eq!(result.heuristic_used(), "H3-SeasonHint");

        let result = correlate(None, 21, Some(2), Some(&cat));
        assert!(approx(result.confidence, 0.70));
    }

    #[test]
    fn test_h3_disc_number_as_season() {
        let cat = catalog(&[(1, 22), (3, 23)]);
        let result = correlate(Some(2), 8, None, Some(&cat));
        assert_eq!(result.season, 2);
        assert_eq!(result.confidence, 0.70);
        assert_eq!(result.heuristic_used(), "H3-DiscNumberAsSeason");
    }

    #[test]
    fn test_h3_default_season() {
        let cat = catalog(&[(1, 22), (2, 23)]);
        let result = correlate(Some(9), 5, None, Some(&cat));
        assert_eq!(result.season, 1);
        assert_eq!(result.confidence, 0.65);
        assert_eq!(result.heuristic_used(), "H3-DefaultSeason");
    }

    #[test]
    fn test_no_catalog() {
        let result = correlate(Some(3), 4, Some(2), None);
        assert_eq!(result.season, 2);
        assert_eq!(result.confidence, 0.65);
        assert_eq!(result.correlation_reason, "no catalog available");
        assert_eq!(result.heuristic.kind(), HeuristicKind::Fallback);

        let empty = catalog(&[]);
        let result = correlate(Some(3), 4, None, Some(&empty));
        assert_eq!(result.season, 1);
        assert_eq!(result.heuristic, Heuristic::NoCatalog);
    }

    #[test]
    fn test_confidence_floors_hold_for_all_inputs() {
        let cat = catalog(&[(1, 10), (2, 12), (3, 12), (4, 8)]);
        for disc in [None, Some(1), Some(2), Some(3), Some(4), Some(7)] {
            for hint in [None, Some(1), Some(3), Some(9)] {
                for count in 0..30 {
                    let result = correlate(disc, count, hint, Some(&cat));
                    let floor = match result.heuristic.kind() {
                        HeuristicKind::H1 => H1_THRESHOLD,
                        HeuristicKind::H2 => H2_THRESHOLD,
                        HeuristicKind::H3 | HeuristicKind::Fallback => FLOOR_CONFIDENCE,
                    };
                    assert!(
                        result.confidence >= floor,
                        "{:?} below floor for disc {:?} hint {:?} count {}",
                        result.heuristic,
                        disc,
                        hint,
                        count
                    );
                    assert!(result.confidence <= 1.0);
                }
            }
        }
    }
}

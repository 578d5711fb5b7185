//! Processable/waiting classification.

use std::collections::BTreeMap;
use tracing::debug;

use super::types::{BatchAnalysis, DiscJob, WaitingDisc};
use crate::tracker::{season_record, SeriesTracker};

/// Reason given to an unnumbered disc that shares its season with others.
pub const REASON_NO_DISC_NUMBER: &str = "cannot determine disc number";
/// Reason given to a disc without any episode-length title.
pub const REASON_NO_EPISODES: &str = "no episode-length titles found";
/// Reason given to a second disc claiming an already-taken disc number.
pub const REASON_DUPLICATE: &str = "duplicate disc number";

/// Split one series' discs into processable and waiting.
///
/// Within a season discs are taken strictly in increasing disc-number order
/// starting after the highest processed disc; anything past a hole waits.
/// Pure and deterministic: the same discs and tracker give the same result.
pub fn analyze(discs: &[DiscJob], tracker: &SeriesTracker) -> BatchAnalysis {
    let mut by_season: BTreeMap<u32, Vec<&DiscJob>> = BTreeMap::new();
    for disc in discs {
        by_season.entry(disc.season).or_default().push(disc);
    }

    let mut analysis = BatchAnalysis::default();

    for (season, season_discs) in by_season {
        let record = season_record(tracker, season);

        let mut pending: Vec<&DiscJob> = season_discs
            .into_iter()
            .filter(|d| !record.is_processed(d.disc_number, &d.name))
            .collect();
        pending.sort_by(|a, b| {
            a.disc_number
                .cmp(&b.disc_number)
                .then_with(|| a.name.cmp(&b.name))
        });

        let sole_disc = pending.len() == 1;
        let mut next_expected = record.next_expected_disc();

        for disc in pending {
            if disc.episode_count() == 0 {
                analysis.waiting.push(wait(disc, REASON_NO_EPISODES, Vec::new()));
                continue;
            }

            let Some(number) = disc.disc_number else {
                if sole_disc {
                    analysis.processable.push(disc.clone());
                } else {
                    analysis
                        .waiting
                        .push(wait(disc, REASON_NO_DISC_NUMBER, Vec::new()));
                }
                continue;
            };

            if number == next_expected {
                analysis.processable.push(disc.clone());
                next_expected += 1;
            } else if number < next_expected {
                analysis.waiting.push(wait(disc, REASON_DUPLICATE, Vec::new()));
            } else {
                let missing: Vec<u32> = (next_expected..number)
                    .filter(|n| !record.processed_discs.contains(n))
                    .collect();
                analysis
                    .gaps
                    .entry(season)
                    .or_default()
                    .extend(missing.iter().copied());
                let reason = format!(
                    "waiting for disc(s) {} of season {}",
                    join_numbers(&missing),
                    season
                );
                analysis.waiting.push(wait(disc, &reason, missing));
            }
        }
    }

    debug!(
        "Batch analysis: {} processable, {} waiting",
        analysis.processable.len(),
        analysis.waiting.len()
    );
    analysis
}

fn wait(disc: &DiscJob, reason: &str, missing_discs: Vec<u32>) -> WaitingDisc {
    WaitingDisc {
        disc: disc.clone(),
        reason: reason.to_string(),
        missing_discs,
    }
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{disc_job, tracker_with};

    #[test]
    fn test_gap_holds_back_later_disc() {
        let discs = vec![disc_job("S1D1", Some(1), 1, 4), disc_job("S1D3", Some(3), 1, 4)];

        let analysis = analyze(&discs, &SeriesTracker::new());

        assert_eq!(analysis.processable.len(), 1);
        assert_eq!(analysis.processable[0].name, "S1D1");
        assert_eq!(analysis.waiting.len(), 1);
        assert_eq!(analysis.waiting[0].disc.name, "S1D3");
        assert_eq!(analysis.waiting[0].missing_discs, vec![2]);
        assert_eq!(analysis.gaps.get(&1).unwrap().iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_consecutive_discs_all_processable() {
        let discs = vec![
            disc_job("S1D3", Some(3), 1, 4),
            disc_job("S1D2", Some(2), 1, 4),
        ];
        let tracker = tracker_with(1, 4, &[1]);

        let analysis = analyze(&discs, &tracker);

        let names: Vec<_> = analysis.processable.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["S1D2", "S1D3"]);
        assert!(analysis.waiting.is_empty());
        assert!(analysis.gaps.is_empty());
    }

    #[test]
    fn test_processed_discs_dropped() {
        let discs = vec![disc_job("S1D1", Some(1), 1, 4), disc_job("S1D2", Some(2), 1, 4)];
        let tracker = tracker_with(1, 4, &[1]);

        let analysis = analyze(&discs, &tracker);

        assert_eq!(analysis.processable.len(), 1);
        assert_eq!(analysis.processable[0].name, "S1D2");
        assert!(analysis.waiting.is_empty());
    }

    #[test]
    fn test_gap_invariant_ignores_confidence() {
        let mut disc = disc_job("S1D4", Some(4), 1, 4);
        disc.correlation.confidence = 0.95;

        let analysis = analyze(&[disc], &tracker_with(1, 4, &[1]));

        assert!(analysis.processable.is_empty());
        assert_eq!(analysis.waiting[0].missing_discs, vec![2, 3]);
    }

    #[test]
    fn test_unnumbered_disc_sole_vs_shared() {
        let sole = vec![disc_job("BONUS", None, 2, 3)];
        let analysis = analyze(&sole, &SeriesTracker::new());
        assert_eq!(analysis.processable.len(), 1);

        let shared = vec![disc_job("BONUS", None, 2, 3), disc_job("S2D1", Some(1), 2, 4)];
        let analysis = analyze(&shared, &SeriesTracker::new());
        assert_eq!(analysis.processable.len(), 1);
        assert_eq!(analysis.processable[0].name, "S2D1");
        assert_eq!(analysis.waiting[0].reason, REASON_NO_DISC_NUMBER);
    }

    #[test]
    fn test_seasons_are_independent() {
        let discs = vec![
            disc_job("S1D2", Some(2), 1, 4),
            disc_job("S2D1", Some(1), 2, 4),
        ];

        let analysis = analyze(&discs, &SeriesTracker::new());

        assert_eq!(analysis.processable.len(), 1);
        assert_eq!(analysis.processable[0].season, 2);
        assert_eq!(analysis.waiting[0].disc.season, 1);
        assert_eq!(analysis.waiting[0].missing_discs, vec![1]);
    }

    #[test]
    fn test_empty_disc_waits_and_blocks() {
        let discs = vec![disc_job("S1D1", Some(1), 1, 0), disc_job("S1D2", Some(2), 1, 4)];

        let analysis = analyze(&discs, &SeriesTracker::new());

        assert!(analysis.processable.is_empty());
        assert_eq!(analysis.waiting[0].reason, REASON_NO_EPISODES);
        assert_eq!(analysis.waiting[1].missing_discs, vec![1]);
    }

    #[test]
    fn test_duplicate_disc_number_waits() {
        let discs = vec![disc_job("S1D1", Some(1), 1, 4), disc_job("S1D1_COPY", Some(1), 1, 4)];

        let analysis = analyze(&discs, &SeriesTracker::new());

        assert_eq!(analysis.processable.len(), 1);
        assert_eq!(analysis.processable[0].name, "S1D1");
        assert_eq!(analysis.waiting[0].reason, REASON_DUPLICATE);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let discs = vec![
            disc_job("S1D5", Some(5), 1, 4),
            disc_job("S1D2", Some(2), 1, 4),
            disc_job("EXTRA", None, 1, 2),
            disc_job("S2D1", Some(1), 2, 6),
            disc_job("S1D3", Some(3), 1, 4),
        ];
        let tracker = tracker_with(1, 4, &[1]);

        let first = analyze(&discs, &tracker);
        let second = analyze(&discs, &tracker);
        assert_eq!(first, second);

        let mut reversed = discs.clone();
        reversed.reverse();
        assert_eq!(analyze(&reversed, &tracker), first);
    }
}

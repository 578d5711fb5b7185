//! Batch planning integration tests.
//!
//! Label parsing -> correlation -> batch analysis -> episode assignment,
//! without any I/O.

use std::collections::BTreeSet;
use std::path::PathBuf;

use discsync_core::{
    analyze, assign, correlate,
    disc::{series_key, TitleSummary},
    testing::fixtures::tracker_with,
    volume_label, DiscEpisodeExtraction, DiscJob, DiscoveredDisc, HeuristicKind,
    SeriesEpisodeCatalog, SeriesTracker,
};

fn discovered(series: &str, label: &str) -> DiscoveredDisc {
    DiscoveredDisc {
        series_key: series_key(series),
        series_name: series.to_string(),
        name: label.to_string(),
        path: PathBuf::from(format!("/watch/{}/{}", series, label)),
        hint: volume_label::parse(label),
    }
}

fn extraction(episodes: u32) -> DiscEpisodeExtraction {
    DiscEpisodeExtraction {
        episode_count: episodes,
        titles: (0..episodes)
            .map(|i| TitleSummary {
                title_index: i,
                duration_secs: 47 * 60,
                chapter_count: 5,
            })
            .collect(),
    }
}

fn plan(
    series: &str,
    discs: &[(&str, u32)],
    catalog: Option<&SeriesEpisodeCatalog>,
) -> Vec<DiscJob> {
    discs
        .iter()
        .map(|(label, episodes)| {
            let disc = discovered(series, label);
            let result = correlate(
                disc.hint.disc_number,
                *episodes,
                disc.hint.season_number,
                catalog,
            );
            DiscJob::new(&disc, extraction(*episodes), result)
        })
        .collect()
}

#[test]
fn test_full_season_box_set() {
    // Season 1 of 13 episodes across discs of 4, 4, 5
    let catalog = SeriesEpisodeCatalog::from_counts("Breaking Bad", &[(1, 7), (2, 13), (3, 13)]);
    let jobs = plan(
        "Breaking Bad",
        &[
            ("BREAKING_BAD_S2D1", 4),
            ("BREAKING_BAD_S2D2", 4),
            ("BREAKING_BAD_S2D3", 5),
        ],
        Some(&catalog),
    );

    assert!(jobs.iter().all(|j| j.season == 2));

    let analysis = analyze(&jobs, &SeriesTracker::new());
    assert_eq!(analysis.processable.len(), 3);
    assert!(analysis.waiting.is_empty());

    let assignments = assign(&analysis.processable, &SeriesTracker::new(), Some(&catalog));
    let ranges: Vec<(u32, u32)> = ["BREAKING_BAD_S2D1", "BREAKING_BAD_S2D2", "BREAKING_BAD_S2D3"]
        .iter()
        .map(|name| {
            let a = &assignments[*name];
            (a.start_episode, a.end_episode)
        })
        .collect();
    assert_eq!(ranges, vec![(1, 4), (5, 8), (9, 13)]);

    let last = &assignments["BREAKING_BAD_S2D3"].episodes[4];
    assert_eq!(
        last.relative_path,
        PathBuf::from("Breaking Bad/Season 02/Breaking Bad - S02E13.mkv")
    );
}

#[test]
fn test_disc_equals_season_when_counts_match() {
    // Single-disc seasons where the disc number doubles as the season
    let catalog = SeriesEpisodeCatalog::from_counts("Shorts", &[(1, 6), (2, 8)]);
    let jobs = plan("Shorts", &[("SHORTS_DISC_2", 8)], Some(&catalog));

    assert_eq!(jobs[0].season, 2);
    assert_eq!(jobs[0].correlation.heuristic.kind(), HeuristicKind::H1);
    assert!(jobs[0].confidence() >= 0.95);
}

#[test]
fn test_resume_after_previous_batch() {
    let catalog = SeriesEpisodeCatalog::from_counts("Friends", &[(1, 24), (2, 24)]);
    let tracker = tracker_with(1, 8, &[1, 2]);
    let jobs = plan(
        "Friends",
        &[("FRIENDS_S1D3", 4), ("FRIENDS_S1D5", 4)],
        Some(&catalog),
    );

    let analysis = analyze(&jobs, &tracker);
    assert_eq!(analysis.processable.len(), 1);
    assert_eq!(analysis.processable[0].name, "FRIENDS_S1D3");
    assert_eq!(analysis.waiting[0].missing_discs, vec![4]);
    assert_eq!(analysis.gaps[&1], BTreeSet::from([4]));

    let assignments = assign(&analysis.processable, &tracker, Some(&catalog));
    let a = &assignments["FRIENDS_S1D3"];
    assert_eq!((a.start_episode, a.end_episode), (9, 12));
}

#[test]
fn test_unlabeled_disc_without_catalog() {
    let jobs = plan("Mystery Show", &[("BACKUP_2019", 6)], None);

    assert_eq!(jobs[0].season, 1);
    assert_eq!(jobs[0].disc_number, None);
    assert_eq!(jobs[0].correlation.heuristic.kind(), HeuristicKind::Fallback);

    // A lone unnumbered disc is still exportable
    let analysis = analyze(&jobs, &SeriesTracker::new());
    assert_eq!(analysis.processable.len(), 1);
}

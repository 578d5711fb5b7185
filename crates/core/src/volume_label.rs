//! Volume label parsing.
//!
//! Disc images usually carry a free-text volume label such as `BREAKING_BAD_S1D6`
//! or `FRIENDS SEASON 2 DISC 3`. This module pulls season and disc hints out of
//! that text. A label with no recognizable pattern is a normal outcome and
//! yields an empty hint.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Season/disc hints derived from a disc label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLabelHint {
    pub season_number: Option<u32>,
    pub disc_number: Option<u32>,
}

impl VolumeLabelHint {
    /// True when the label carried neither a season nor a disc number.
    pub fn is_empty(&self) -> bool {
        self.season_number.is_none() && self.disc_number.is_none()
    }
}

// Patterns run against the normalized label (uppercase, separators collapsed to `_`).

/// `S1D6`, `S01_D02`
static COMPACT_SEASON_DISC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|_)S(\d{1,2})_?D(\d{1,2})(?:_|$)").expect("valid compact pattern")
});

/// `SEASON_1_DISC_6`, `SEASON2DISK1`, `S01_DISC_2`
static VERBOSE_SEASON_DISC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|_)(?:SEASON|SERIES|S)_?(\d{1,2})_?(?:DISC|DISK)_?(\d{1,2})(?:_|$)")
        .expect("valid verbose pattern")
});

/// `S2`, `SEASON_2`, `SEASON2`
static SEASON_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|_)(?:SEASON|SERIES|S)_?(\d{1,2})(?:_|$)").expect("valid season pattern")
});

/// `D3`, `DISC_3`, `DISK3`
static DISC_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|_)(?:DISC|DISK|D)_?(\d{1,2})(?:_|$)").expect("valid disc pattern")
});

/// Parse a volume label into season/disc hints.
///
/// Pattern families are tried in order (compact season+disc, verbose
/// season+disc, season only, disc only); the first match wins.
pub fn parse(label: &str) -> VolumeLabelHint {
    let normalized = normalize(label);

    for re in [&*COMPACT_SEASON_DISC, &*VERBOSE_SEASON_DISC] {
        if let Some(caps) = re.captures(&normalized) {
            return VolumeLabelHint {
                season_number: caps.get(1).and_then(|m| parse_number(m.as_str())),
                disc_number: caps.get(2).and_then(|m| parse_number(m.as_str())),
            };
        }
    }

    if let Some(caps) = SEASON_ONLY.captures(&normalized) {
        return VolumeLabelHint {
            season_number: caps.get(1).and_then(|m| parse_number(m.as_str())),
            disc_number: None,
        };
    }

    if let Some(caps) = DISC_ONLY.captures(&normalized) {
        return VolumeLabelHint {
            season_number: None,
            disc_number: caps.get(1).and_then(|m| parse_number(m.as_str())),
        };
    }

    VolumeLabelHint::default()
}

fn normalize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_sep = true;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

/// Zero is not a usable season or disc number.
fn parse_number(s: &str) -> Option<u32> {
    s.parse::<u32>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(season: Option<u32>, disc: Option<u32>) -> VolumeLabelHint {
        VolumeLabelHint {
            season_number: season,
            disc_number: disc,
        }
    }

    #[test]
    fn test_compact_season_disc() {
        assert_eq!(parse("S1D6"), hint(Some(1), Some(6)));
        assert_eq!(parse("BREAKING_BAD_S01D02"), hint(Some(1), Some(2)));
        assert_eq!(parse("the.office.s3_d4"), hint(Some(3), Some(4)));
    }

    #[test]
    fn test_verbose_season_disc() {
        assert_eq!(parse("SEASON_1_DISC_6"), hint(Some(1), Some(6)));
        assert_eq!(parse("Friends Season 2 Disc 3"), hint(Some(2), Some(3)));
        assert_eq!(parse("LOST_SEASON4DISK1"), hint(Some(4), Some(1)));
    }

    #[test]
    fn test_season_only() {
        assert_eq!(parse("SOPRANOS_SEASON_5"), hint(Some(5), None));
        assert_eq!(parse("WIRE_S2"), hint(Some(2), None));
    }

    #[test]
    fn test_disc_only() {
        assert_eq!(parse("SEINFELD_DISC_3"), hint(None, Some(3)));
        assert_eq!(parse("MY_SHOW_D7"), hint(None, Some(7)));
    }

    #[test]
    fn test_unrecognized_label() {
        assert!(parse("MOVIE_2019").is_empty());
        assert!(parse("").is_empty());
        assert!(parse("STAR_WARS").is_empty());
    }

    #[test]
    fn test_zero_is_not_a_number() {
        assert_eq!(parse("S0D1"), hint(None, Some(1)));
        assert!(parse("DISC_0").is_empty());
    }
}

use std::path::Path;

use chrono::NaiveTime;

use crate::error::InsightsError;
use crate::options::TimeMode;

pub const DEFAULT_TIME: &str = "00:00";

/// Result of reading the time segment out of a markup filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSegment {
    Parsed(String),
    Defaulted,
}

impl TimeSegment {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parsed(time) => time,
            Self::Defaulted => DEFAULT_TIME,
        }
    }
}

/// Splits a four-character segment into its hour and minute halves.
fn split_hhmm(segment: &str) -> Option<(&str, &str)> {
    if segment.chars().count() != 4 {
        return None;
    }
    let (middle, _) = segment.char_indices().nth(2)?;
    Some(segment.split_at(middle))
}

/// Reads the observation time from names like `plan-site-1430-rev2.pdf`.
///
/// Lenient mode takes any four-character third segment of the file stem as
/// `HH:MM`; strict mode also requires a valid clock time.
pub fn time_from_filename(filename: &str, mode: TimeMode) -> Result<TimeSegment, InsightsError> {
    let stem = Path::new(filename)
        .file_stem()
        .map_or_else(|| filename.into(), |stem| stem.to_string_lossy());

    let segment = stem.split('-').nth(2).unwrap_or_default();

    match mode {
        TimeMode::Lenient => Ok(split_hhmm(segment)
            .map_or(TimeSegment::Defaulted, |(hours, minutes)| {
                TimeSegment::Parsed(format!("{hours}:{minutes}"))
            })),
        TimeMode::Strict => NaiveTime::parse_from_str(segment, "%H%M")
            .ok()
            .filter(|_| segment.len() == 4 && segment.bytes().all(|byte| byte.is_ascii_digit()))
            .map(|time| TimeSegment::Parsed(time.format("%H:%M").to_string()))
            .ok_or_else(|| InsightsError::InvalidTimeSegment {
                filename: filename.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::{TimeSegment, time_from_filename};
    use crate::error::InsightsError;
    use crate::options::TimeMode;

    fn lenient(filename: &str) -> String {
        time_from_filename(filename, TimeMode::Lenient)
            .expect("lenient mode never fails")
            .as_str()
            .to_string()
    }

    #[test]
    fn formats_four_digit_segment() {
        assert_eq!(lenient("plan-site-1430-rev2.pdf"), "14:30");
        assert_eq!(lenient("uploads/lobby-west-0905.pdf"), "09:05");
    }

    #[test]
    fn defaults_when_segment_is_not_four_characters() {
        assert_eq!(lenient("plan-site-AB.pdf"), "00:00");
        assert_eq!(lenient("plan-site-14300.pdf"), "00:00");
        assert_eq!(lenient("plan.pdf"), "00:00");
        assert_eq!(
            time_from_filename("plan-site.pdf", TimeMode::Lenient).expect("lenient"),
            TimeSegment::Defaulted
        );
    }

    #[test]
    fn lenient_mode_does_not_check_clock_range() {
        assert_eq!(lenient("plan-site-9999.pdf"), "99:99");
    }

    #[test]
    fn lenient_mode_splits_any_four_characters() {
        assert_eq!(lenient("plan-site-AB12.pdf"), "AB:12");
        assert_eq!(lenient("plan-site-14h3.pdf"), "14:h3");
        assert_eq!(lenient("plan-site-éé12.pdf"), "éé:12");
    }

    #[test]
    fn strict_mode_rejects_bad_segments() {
        let ok = time_from_filename("plan-site-1430.pdf", TimeMode::Strict).expect("valid time");
        assert_eq!(ok.as_str(), "14:30");

        for name in ["plan-site-AB.pdf", "plan-site-AB12.pdf", "plan-site-2561.pdf", "plan.pdf"] {
            let err = time_from_filename(name, TimeMode::Strict).expect_err("should fail");
            assert!(matches!(err, InsightsError::InvalidTimeSegment { .. }), "{name}");
        }
    }
}

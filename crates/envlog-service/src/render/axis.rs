//! Time axis for the charts.
//!
//! Values are Unix seconds. Bold key points fall on every second local
//! hour, light ones on every local half hour, both aligned to the local UTC
//! offset at the start of the window.

use std::ops::Range;

use chrono::{Local, Offset, TimeZone};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};

/// Seconds between labelled ticks.
pub const MAJOR_STEP: i64 = 2 * 3600;
/// Seconds between minor gridlines.
pub const MINOR_STEP: i64 = 30 * 60;

/// A plotters coordinate over `[start, end]` in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    start: i64,
    end: i64,
    utc_offset: i64,
}

impl TimeAxis {
    /// Axis for the trailing window ending at `now`.
    pub fn trailing(now: i64, window_seconds: i64) -> Self {
        let start = now.saturating_sub(window_seconds);
        Self {
            start,
            end: now.max(start + 1),
            utc_offset: local_offset(start),
        }
    }

    /// Use an explicit UTC offset (in seconds) instead of the local zone.
    #[must_use]
    pub fn with_utc_offset(mut self, offset_seconds: i64) -> Self {
        self.utc_offset = offset_seconds;
        self
    }

    /// Multiples of `step` in local time that fall inside the axis.
    ///
    /// The step is doubled until at most `max_points` remain.
    pub fn ticks(&self, mut step: i64, max_points: usize) -> Vec<i64> {
        if max_points == 0 {
            return Vec::new();
        }
        while (self.end - self.start) / step >= max_points as i64 {
            step *= 2;
        }

        let local_start = self.start + self.utc_offset;
        let first = local_start.div_euclid(step) * step
            + if local_start.rem_euclid(step) == 0 { 0 } else { step }
            - self.utc_offset;

        (0..)
            .map(|i| first + i * step)
            .take_while(|t| *t <= self.end)
            .collect()
    }
}

impl Ranged for TimeAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = i64;

    fn map(&self, value: &i64, limit: (i32, i32)) -> i32 {
        let span = (self.end - self.start) as f64;
        let fraction = (*value - self.start) as f64 / span;
        limit.0 + (fraction * f64::from(limit.1 - limit.0)).round() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<i64> {
        let step = if hint.weight().allow_light_points() {
            MINOR_STEP
        } else {
            MAJOR_STEP
        };
        self.ticks(step, hint.max_num_points())
    }

    fn range(&self) -> Range<i64> {
        self.start..self.end
    }
}

/// Local wall-clock `HH:MM` for a Unix timestamp.
pub fn clock_label(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => String::new(),
    }
}

fn local_offset(timestamp: i64) -> i64 {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| i64::from(dt.offset().fix().local_minus_utc()))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14 22:13:20 UTC
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_major_ticks_every_two_hours() {
        let axis = TimeAxis::trailing(NOW, 86_400).with_utc_offset(0);
        let ticks = axis.ticks(MAJOR_STEP, 100);

        assert_eq!(ticks.len(), 12);
        assert!(ticks.iter().all(|t| t % MAJOR_STEP == 0));
        assert!(ticks.windows(2).all(|w| w[1] - w[0] == MAJOR_STEP));
        assert!(ticks[0] > NOW - 86_400);
        assert!(*ticks.last().unwrap() <= NOW);
    }

    #[test]
    fn test_minor_ticks_every_half_hour() {
        let axis = TimeAxis::trailing(NOW, 86_400).with_utc_offset(0);
        let ticks = axis.ticks(MINOR_STEP, 100);

        assert_eq!(ticks.len(), 48);
        assert!(ticks.iter().all(|t| t % MINOR_STEP == 0));
    }

    #[test]
    fn test_ticks_follow_offset() {
        // UTC+1: local even hours are odd UTC hours
        let axis = TimeAxis::trailing(NOW, 86_400).with_utc_offset(3600);
        let ticks = axis.ticks(MAJOR_STEP, 100);
        assert!(ticks.iter().all(|t| (t + 3600) % MAJOR_STEP == 0));
    }

    #[test]
    fn test_ticks_thin_out_for_long_windows() {
        let axis = TimeAxis::trailing(NOW, 7 * 86_400).with_utc_offset(0);
        let ticks = axis.ticks(MAJOR_STEP, 12);
        assert!(ticks.len() <= 12);
        assert!(!ticks.is_empty());
    }

    #[test]
    fn test_map_endpoints() {
        let axis = TimeAxis::trailing(1000, 100);
        assert_eq!(axis.map(&900, (0, 1000)), 0);
        assert_eq!(axis.map(&1000, (0, 1000)), 1000);
        assert_eq!(axis.map(&950, (0, 1000)), 500);
    }

    #[test]
    fn test_range_is_window() {
        let axis = TimeAxis::trailing(NOW, 3600);
        assert_eq!(axis.range(), NOW - 3600..NOW);
    }

    #[test]
    fn test_clock_label_format() {
        let label = clock_label(NOW);
        assert_eq!(label.len(), 5);
        assert_eq!(&label[2..3], ":");
    }
}

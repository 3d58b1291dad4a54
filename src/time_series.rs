use hifitime::{Duration, Epoch, Unit};
use log::debug;

use crate::planner_errors::PlannerError;
use crate::time::parse_instant;

/// A half-open observing window `[start, end)` cut into whole-minute steps.
///
/// The step is the window length divided by `steps`, rounded to the nearest whole
/// minute (ties to even). Because of that rounding the number of emitted samples can
/// differ from `steps`.
///
/// `start` and `end` are used exactly as given, seconds included; they are not truncated to
/// the minute. A window `00:00:00 → 00:30:30` with 2 steps therefore yields three samples
/// (`00:00`, `00:15`, `00:30`), where minute-truncated bounds would stop at two.
///
/// # Fields
///
/// * `start` - first sample, always emitted
/// * `end` - exclusive upper bound
/// * `step` - spacing between consecutive samples, at least one minute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: Epoch,
    end: Epoch,
    step: Duration,
}

impl TimeWindow {
    /// Create a window and compute its step.
    ///
    /// Arguments
    /// ---------
    /// * `start`: first instant of the window (inclusive)
    /// * `end`: end of the window (exclusive)
    /// * `steps`: requested number of subdivisions
    ///
    /// Return
    /// ------
    /// * the window, or [`PlannerError::InvalidTimeWindow`] if `steps` is zero, if
    ///   `end <= start`, or if the rounded step collapses to zero minutes
    pub fn new(start: Epoch, end: Epoch, steps: u32) -> Result<Self, PlannerError> {
        if steps == 0 {
            return Err(PlannerError::InvalidTimeWindow(
                "the number of steps must be positive".into(),
            ));
        }
        if end <= start {
            return Err(PlannerError::InvalidTimeWindow(format!(
                "window end {end} is not after its start {start}"
            )));
        }

        let total_minutes = (end - start).to_seconds() / 60.0;
        let step_minutes = (total_minutes / f64::from(steps)).round_ties_even();
        if step_minutes < 1.0 {
            return Err(PlannerError::InvalidTimeWindow(format!(
                "{total_minutes:.3} min split in {steps} steps rounds to a zero-minute step"
            )));
        }

        let step = step_minutes * Unit::Minute;
        debug!("Window {start} → {end}: {steps} steps of {step_minutes} min");

        Ok(TimeWindow { start, end, step })
    }

    /// Same as [`TimeWindow::new`] with ISO-8601 bounds.
    pub fn parse(start: &str, end: &str, steps: u32) -> Result<Self, PlannerError> {
        TimeWindow::new(parse_instant(start)?, parse_instant(end)?, steps)
    }

    pub fn start(&self) -> Epoch {
        self.start
    }

    pub fn end(&self) -> Epoch {
        self.end
    }

    /// Spacing between consecutive samples.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Iterate the samples from `start` while strictly before `end`.
    ///
    /// Each call starts over from `start`.
    pub fn samples(&self) -> TimeSamples {
        TimeSamples {
            next: self.start,
            end: self.end,
            step: self.step,
        }
    }
}

impl IntoIterator for &TimeWindow {
    type Item = Epoch;
    type IntoIter = TimeSamples;

    fn into_iter(self) -> Self::IntoIter {
        self.samples()
    }
}

/// Iterator over the sample instants of a [`TimeWindow`].
#[derive(Debug, Clone)]
pub struct TimeSamples {
    next: Epoch,
    end: Epoch,
    step: Duration,
}

impl Iterator for TimeSamples {
    type Item = Epoch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current + self.step;
        Some(current)
    }
}

/// Discretize `[start, end)` into sample instants.
///
/// See [`TimeWindow`] for the rounding rule and the failure cases.
pub fn sample_times(start: Epoch, end: Epoch, steps: u32) -> Result<Vec<Epoch>, PlannerError> {
    Ok(TimeWindow::new(start, end, steps)?.samples().collect())
}

#[cfg(test)]
mod time_series_test {
    use super::*;

    fn utc(h: u8, m: u8) -> Epoch {
        Epoch::from_gregorian_utc_hms(2020, 1, 1, h, m, 0)
    }

    #[test]
    fn test_half_open_quarter_hours() {
        let samples = sample_times(utc(0, 0), utc(1, 0), 4).unwrap();
        assert_eq!(samples, vec![utc(0, 0), utc(0, 15), utc(0, 30), utc(0, 45)]);
    }

    #[test]
    fn test_parse_window() {
        let window = TimeWindow::parse("2020-01-01T00:00", "2020-01-01T01:00", 4).unwrap();
        assert_eq!(window.step(), 15.0 * Unit::Minute);
        assert_eq!(window.samples().count(), 4);
    }

    #[test]
    fn test_rounding_changes_sample_count() {
        // 50 min / 3 = 16.67 → 17 min: 0, 17, 34 (51 >= 50)
        let samples = sample_times(utc(0, 0), utc(0, 50), 3).unwrap();
        assert_eq!(samples, vec![utc(0, 0), utc(0, 17), utc(0, 34)]);

        // 50 min / 4 = 12.5 → 12 min (ties to even): 0, 12, 24, 36, 48
        let samples = sample_times(utc(0, 0), utc(0, 50), 4).unwrap();
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[4], utc(0, 48));
    }

    #[test]
    fn test_sub_minute_start_is_kept() {
        let start = Epoch::from_gregorian_utc_hms(2018, 4, 30, 10, 39, 5);
        let end = Epoch::from_gregorian_utc_hms(2018, 4, 30, 10, 49, 52);
        let samples = sample_times(start, end, 1).unwrap();
        assert_eq!(samples, vec![start]);
    }

    #[test]
    fn test_end_seconds_are_kept() {
        let end = Epoch::from_gregorian_utc_hms(2020, 1, 1, 0, 30, 30);
        let samples = sample_times(utc(0, 0), end, 2).unwrap();
        assert_eq!(samples, vec![utc(0, 0), utc(0, 15), utc(0, 30)]);
    }

    #[test]
    fn test_samples_are_restartable() {
        let window = TimeWindow::new(utc(0, 0), utc(2, 0), 5).unwrap();
        let first: Vec<Epoch> = window.samples().collect();
        let second: Vec<Epoch> = (&window).into_iter().collect();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|t| *t < window.end()));
    }

    #[test]
    fn test_invalid_windows() {
        assert!(matches!(
            TimeWindow::new(utc(0, 0), utc(1, 0), 0),
            Err(PlannerError::InvalidTimeWindow(_))
        ));
        assert!(matches!(
            TimeWindow::new(utc(1, 0), utc(1, 0), 3),
            Err(PlannerError::InvalidTimeWindow(_))
        ));
        assert!(matches!(
            TimeWindow::new(utc(1, 0), utc(0, 0), 3),
            Err(PlannerError::InvalidTimeWindow(_))
        ));
        // 2 minutes in 5 steps: 0.4 min rounds to zero
        assert!(matches!(
            TimeWindow::new(utc(0, 0), utc(0, 2), 5),
            Err(PlannerError::InvalidTimeWindow(_))
        ));
    }
}

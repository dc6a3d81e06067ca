/*!
 * Overview metrics: trailing-window terminations and turnover ratio
 */

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::TRAILING_WINDOW_DAYS;
use crate::data_types::EnrichedRecord;

/// Headline numbers shown above the charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewMetrics {
    /// Evaluation date
    pub as_of: NaiveDate,
    /// First date inside the window (inclusive)
    pub window_start: NaiveDate,
    pub terminations_in_window: usize,
    /// Injected headcount the ratio is measured against
    pub headcount_baseline: u32,
    /// `terminations_in_window / headcount_baseline * 100`; `None` for a zero baseline
    pub turnover_percent: Option<f64>,
}

impl OverviewMetrics {
    /// Compute over the standard 365-day window
    pub fn compute(records: &[&EnrichedRecord], headcount_baseline: u32, as_of: NaiveDate) -> Self {
        Self::compute_with_window(records, headcount_baseline, as_of, TRAILING_WINDOW_DAYS)
    }

    /// Compute over a custom window length.
    ///
    /// A record counts when its termination date is on or after
    /// `as_of - window_days`. Records without a termination date never count.
    /// A window reaching past the calendar's first date has no lower bound.
    pub fn compute_with_window(
        records: &[&EnrichedRecord],
        headcount_baseline: u32,
        as_of: NaiveDate,
        window_days: i64,
    ) -> Self {
        let window_start = Duration::try_days(window_days)
            .and_then(|window| as_of.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN);
        let terminations_in_window = records
            .iter()
            .filter_map(|r| r.termination_date)
            .filter(|date| *date >= window_start)
            .count();

        let turnover_percent = (headcount_baseline > 0)
            .then(|| terminations_in_window as f64 / f64::from(headcount_baseline) * 100.0);

        Self {
            as_of,
            window_start,
            terminations_in_window,
            headcount_baseline,
            turnover_percent,
        }
    }

    /// Ratio rounded to one decimal place
    pub fn turnover_percent_rounded(&self) -> Option<f64> {
        self.turnover_percent.map(|p| (p * 10.0).round() / 10.0)
    }

    /// `"12.3%"`, or `"n/a"` without a baseline
    pub fn turnover_display(&self) -> String {
        match self.turnover_percent {
            Some(p) => format!("{:.1}%", p),
            None => "n/a".to_string(),
        }
    }

    /// Print formatted metrics
    pub fn print_summary(&self) {
        println!("=== Overview ({} to {}) ===", self.window_start, self.as_of);
        println!("Terminations (12 months): {}", self.terminations_in_window);
        println!("Headcount baseline: {}", self.headcount_baseline);
        println!("Turnover: {}", self.turnover_display());
    }
}

/*!
 * Dashboard report: every table the dashboard shows for one filter selection
 */

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::{AgeGroupCount, InitiativeMonthlyBars, RiskMatrix, TimelinePoint};
use crate::config::TurnoverConfig;
use crate::dataset::TerminationDataset;
use crate::filter::FilterSet;
use crate::metrics::OverviewMetrics;

/// Overview metrics plus every aggregation, computed over one filtered view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub filters: FilterSet,
    pub total_records: usize,
    pub filtered_records: usize,
    pub overview: OverviewMetrics,
    pub timeline: Vec<TimelinePoint>,
    pub initiative_bars: InitiativeMonthlyBars,
    pub risk_matrix: RiskMatrix,
    pub age_groups: Vec<AgeGroupCount>,
}

impl DashboardReport {
    /// Build the report over the standard trailing window
    pub fn build(
        dataset: &TerminationDataset,
        filters: &FilterSet,
        headcount_baseline: u32,
        as_of: NaiveDate,
    ) -> Self {
        let view = dataset.filter(filters);
        Self::assemble(dataset, filters, view.overview(headcount_baseline, as_of), &view)
    }

    /// Build the report with the baseline and window length from configuration
    pub fn with_config(
        dataset: &TerminationDataset,
        filters: &FilterSet,
        config: &TurnoverConfig,
        as_of: NaiveDate,
    ) -> Self {
        let view = dataset.filter(filters);
        let overview = OverviewMetrics::compute_with_window(
            view.records(),
            config.headcount_baseline,
            as_of,
            config.trailing_window_days,
        );
        Self::assemble(dataset, filters, overview, &view)
    }

    fn assemble(
        dataset: &TerminationDataset,
        filters: &FilterSet,
        overview: OverviewMetrics,
        view: &crate::dataset::FilteredView<'_>,
    ) -> Self {
        let analytics = view.analytics();
        let report = Self {
            filters: filters.clone(),
            total_records: dataset.len(),
            filtered_records: view.len(),
            overview,
            timeline: analytics.monthly_timeline(),
            initiative_bars: analytics.initiative_monthly_bars(),
            risk_matrix: analytics.risk_matrix(),
            age_groups: analytics.age_breakdown(),
        };
        debug!(
            filtered = report.filtered_records,
            timeline_points = report.timeline.len(),
            reasons = report.risk_matrix.columns.len(),
            "built dashboard report"
        );
        report
    }

    /// Whether the filter selection left nothing to show
    pub fn is_empty(&self) -> bool {
        self.filtered_records == 0
    }
}

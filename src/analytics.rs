/*!
 * Aggregations over a filtered view of termination records
 *
 * Every aggregation is a single grouped pass: a map keyed by the composite
 * group key accumulates counts and sums, then the map is turned into a tidy,
 * ordered table. Bucket axes always follow the classifier's canonical order.
 */

use std::collections::{BTreeMap, BTreeSet, HashMap};
use serde::{Deserialize, Serialize};

use crate::cohort::{AgeBucket, TenureBucket};
use crate::data_types::{EnrichedRecord, InitiativeKind, YearMonth};

/// Aggregation engine over a borrowed set of records
pub struct TurnoverAnalytics<'a> {
    records: &'a [&'a EnrichedRecord],
}

impl<'a> TurnoverAnalytics<'a> {
    pub fn new(records: &'a [&'a EnrichedRecord]) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Terminations per (month, initiative), months ascending.
    ///
    /// Pairs with no records are absent rather than zero-filled. Records
    /// without a termination date or an initiative have no key and are skipped.
    pub fn monthly_timeline(&self) -> Vec<TimelinePoint> {
        let mut counts: BTreeMap<(YearMonth, &str), usize> = BTreeMap::new();

        for record in self.records {
            if let (Some(month), Some(initiative)) = (record.termination_month(), record.initiative()) {
                *counts.entry((month, initiative)).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .map(|((month, initiative), count)| TimelinePoint {
                month,
                label: month.to_string(),
                initiative: initiative.to_string(),
                count,
            })
            .collect()
    }

    /// Month-by-month bars for the two known initiatives, labelled `MM/YYYY`
    pub fn initiative_monthly_bars(&self) -> InitiativeMonthlyBars {
        let series = |kind: InitiativeKind| {
            let mut counts: BTreeMap<YearMonth, usize> = BTreeMap::new();
            for record in self.records.iter().filter(|r| r.initiative_kind() == Some(kind)) {
                if let Some(month) = record.termination_month() {
                    *counts.entry(month).or_insert(0) += 1;
                }
            }
            counts
                .into_iter()
                .map(|(month, count)| MonthlyBar {
                    month,
                    label: month.slash_label(),
                    count,
                })
                .collect()
        };

        InitiativeMonthlyBars {
            employee_initiated: series(InitiativeKind::Employee),
            company_initiated: series(InitiativeKind::Company),
        }
    }

    /// Tenure bucket × reason cross-tab of counts, mean tenure, and mean age
    pub fn risk_matrix(&self) -> RiskMatrix {
        build_risk_matrix(self.records.iter().copied())
    }

    /// Risk matrix restricted to one initiative label
    pub fn risk_matrix_for_initiative(&self, initiative: &str) -> RiskMatrix {
        build_risk_matrix(
            self.records
                .iter()
                .copied()
                .filter(|r| r.initiative() == Some(initiative)),
        )
    }

    /// Terminations per (age bucket, initiative) in canonical age order.
    ///
    /// Records whose age is undefined are grouped under `AgeBucket::Undefined`,
    /// which sorts last; the renderer decides whether to show it.
    pub fn age_breakdown(&self) -> Vec<AgeGroupCount> {
        let mut counts: BTreeMap<(AgeBucket, &str), usize> = BTreeMap::new();

        for record in self.records {
            if let Some(initiative) = record.initiative() {
                *counts.entry((record.age_bucket, initiative)).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .map(|((age_bucket, initiative), count)| AgeGroupCount {
                age_bucket,
                label: age_bucket.label().to_string(),
                initiative: initiative.to_string(),
                count,
            })
            .collect()
    }

    /// Terminations per reason, most frequent first
    pub fn reason_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for reason in self.records.iter().filter_map(|r| r.reason()) {
            *counts.entry(reason).or_insert(0) += 1;
        }
        let mut sorted: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(reason, count)| (reason.to_string(), count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

/// One (month, initiative) point of the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub month: YearMonth,
    /// `YYYY-MM`
    pub label: String,
    pub initiative: String,
    pub count: usize,
}

/// One bar of a per-initiative monthly series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBar {
    pub month: YearMonth,
    /// `MM/YYYY`
    pub label: String,
    pub count: usize,
}

/// Grouped bar series for resignations and dismissals
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InitiativeMonthlyBars {
    pub employee_initiated: Vec<MonthlyBar>,
    pub company_initiated: Vec<MonthlyBar>,
}

impl InitiativeMonthlyBars {
    pub fn is_empty(&self) -> bool {
        self.employee_initiated.is_empty() && self.company_initiated.is_empty()
    }
}

/// One (age bucket, initiative) group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupCount {
    pub age_bucket: AgeBucket,
    pub label: String,
    pub initiative: String,
    pub count: usize,
}

/// Running totals for one risk-matrix cell
#[derive(Debug, Clone, Copy, Default)]
struct CellAccumulator {
    count: usize,
    tenure_sum: f64,
    tenure_n: usize,
    age_sum: f64,
    age_n: usize,
}

impl CellAccumulator {
    fn add(&mut self, record: &EnrichedRecord) {
        self.count += 1;
        if let Some(years) = record.tenure_years {
            self.tenure_sum += years;
            self.tenure_n += 1;
        }
        if let Some(age) = record.age_at_termination {
            self.age_sum += f64::from(age);
            self.age_n += 1;
        }
    }

    fn mean_tenure(&self) -> Option<f64> {
        (self.tenure_n > 0).then(|| self.tenure_sum / self.tenure_n as f64)
    }

    fn mean_age(&self) -> Option<f64> {
        (self.age_n > 0).then(|| self.age_sum / self.age_n as f64)
    }
}

fn build_risk_matrix<'r, I>(records: I) -> RiskMatrix
where
    I: Iterator<Item = &'r EnrichedRecord>,
{
    let mut cells: HashMap<(TenureBucket, &str), CellAccumulator> = HashMap::new();
    let mut reasons: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        let Some(reason) = record.reason() else { continue };
        if !record.tenure_bucket.is_defined() {
            continue;
        }
        reasons.insert(reason);
        cells.entry((record.tenure_bucket, reason)).or_default().add(record);
    }

    if cells.is_empty() {
        return RiskMatrix::default();
    }

    let rows: Vec<TenureBucket> = TenureBucket::DEFINED.to_vec();
    let columns: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();

    let mut counts = vec![vec![0usize; columns.len()]; rows.len()];
    let mut mean_tenure_years = vec![vec![None; columns.len()]; rows.len()];
    let mut mean_age = vec![vec![None; columns.len()]; rows.len()];

    for (i, bucket) in rows.iter().enumerate() {
        for (j, reason) in reasons.iter().enumerate() {
            if let Some(cell) = cells.get(&(*bucket, *reason)) {
                counts[i][j] = cell.count;
                mean_tenure_years[i][j] = cell.mean_tenure();
                mean_age[i][j] = cell.mean_age();
            }
        }
    }

    RiskMatrix {
        rows,
        columns,
        counts,
        mean_tenure_years,
        mean_age,
    }
}

/// Pivoted risk matrix: tenure buckets down, termination reasons across.
///
/// `counts`, `mean_tenure_years` and `mean_age` share the same shape,
/// indexed `[row][column]`. A mean is `None` when no record in the cell has
/// the value defined.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub rows: Vec<TenureBucket>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<usize>>,
    pub mean_tenure_years: Vec<Vec<Option<f64>>>,
    pub mean_age: Vec<Vec<Option<f64>>>,
}

impl RiskMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row_labels(&self) -> Vec<&'static str> {
        self.rows.iter().map(|b| b.label()).collect()
    }

    /// Sum of every cell count
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn position(&self, bucket: TenureBucket, reason: &str) -> Option<(usize, usize)> {
        let row = self.rows.iter().position(|b| *b == bucket)?;
        let column = self.columns.iter().position(|c| c == reason)?;
        Some((row, column))
    }

    pub fn count(&self, bucket: TenureBucket, reason: &str) -> usize {
        self.position(bucket, reason)
            .map(|(i, j)| self.counts[i][j])
            .unwrap_or(0)
    }

    pub fn cell(&self, bucket: TenureBucket, reason: &str) -> Option<RiskCell> {
        let (i, j) = self.position(bucket, reason)?;
        Some(RiskCell {
            count: self.counts[i][j],
            mean_tenure_years: self.mean_tenure_years[i][j],
            mean_age: self.mean_age[i][j],
        })
    }

    /// Detail text for a cell by index, reporting all three values
    pub fn cell_text(&self, row: usize, column: usize) -> Option<String> {
        let cell = RiskCell {
            count: *self.counts.get(row)?.get(column)?,
            mean_tenure_years: self.mean_tenure_years[row][column],
            mean_age: self.mean_age[row][column],
        };
        Some(cell.to_string())
    }

    /// Detail text for every cell, same shape as `counts`
    pub fn text_grid(&self) -> Vec<Vec<String>> {
        (0..self.rows.len())
            .map(|i| {
                (0..self.columns.len())
                    .filter_map(|j| self.cell_text(i, j))
                    .collect()
            })
            .collect()
    }
}

/// The three values reported for one (bucket, reason) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCell {
    pub count: usize,
    pub mean_tenure_years: Option<f64>,
    pub mean_age: Option<f64>,
}

impl std::fmt::Display for RiskCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Count: {}", self.count)?;
        match self.mean_tenure_years {
            Some(t) => write!(f, " | Mean tenure: {:.1} years", t)?,
            None => write!(f, " | Mean tenure: -")?,
        }
        match self.mean_age {
            Some(a) => write!(f, " | Mean age: {:.0} years", a),
            None => write!(f, " | Mean age: -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::TerminationRecord;
    use crate::enrich::enrich;

    fn record(
        birth: &str,
        admission: &str,
        termination: &str,
        initiative: &str,
        reason: &str,
    ) -> EnrichedRecord {
        let field = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
        enrich(TerminationRecord {
            birth_date: field(birth),
            admission_date: field(admission),
            termination_date: field(termination),
            initiative: field(initiative),
            reason: field(reason),
            ..Default::default()
        })
    }

    fn sample() -> Vec<EnrichedRecord> {
        vec![
            record("15/05/1985", "15/01/2020", "15/01/2021", "Inic. Empresa", "X"),
            record("16/05/1986", "15/01/2021", "15/01/2022", "Inic. Empregado", "Y"),
            record("01/01/1990", "01/03/2015", "20/01/2021", "Inic. Empregado", "X"),
            record("bad", "01/03/2018", "10/02/2021", "Inic. Empregado", "X"),
            record("01/01/1970", "01/03/2018", "", "Inic. Empresa", "Z"),
            record("01/01/1999", "01/03/2019", "05/01/2021", "", ""),
        ]
    }

    #[test]
    fn test_monthly_timeline_orders_and_skips_missing_keys() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let timeline = TurnoverAnalytics::new(&refs).monthly_timeline();
        let rows: Vec<(String, &str, usize)> = timeline
            .iter()
            .map(|p| (p.label.clone(), p.initiative.as_str(), p.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("2021-01".to_string(), "Inic. Empregado", 1),
                ("2021-01".to_string(), "Inic. Empresa", 1),
                ("2021-02".to_string(), "Inic. Empregado", 1),
                ("2022-01".to_string(), "Inic. Empregado", 1),
            ]
        );
    }

    #[test]
    fn test_initiative_bars() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let bars = TurnoverAnalytics::new(&refs).initiative_monthly_bars();
        let employee: Vec<_> = bars.employee_initiated.iter().map(|b| (b.label.as_str(), b.count)).collect();
        assert_eq!(employee, vec![("01/2021", 1), ("02/2021", 1), ("01/2022", 1)]);
        assert_eq!(bars.company_initiated.len(), 1);
        assert!(!bars.is_empty());
    }

    #[test]
    fn test_risk_matrix_shape_and_conservation() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let matrix = TurnoverAnalytics::new(&refs).risk_matrix();

        assert_eq!(matrix.row_labels(), vec!["<1y", "1-2y", "2-5y", "5-10y", ">10y"]);
        assert_eq!(matrix.columns, vec!["X".to_string(), "Y".to_string()]);
        let contributing = data
            .iter()
            .filter(|r| r.tenure_bucket.is_defined() && r.reason().is_some())
            .count();
        assert_eq!(matrix.total(), contributing);
        assert_eq!(matrix.count(TenureBucket::OneToTwoYears, "X"), 1);
        assert_eq!(matrix.count(TenureBucket::UnderOneYear, "Y"), 1);
        assert_eq!(matrix.count(TenureBucket::FiveToTenYears, "X"), 1);
        assert_eq!(matrix.count(TenureBucket::TwoToFiveYears, "X"), 1);
        assert_eq!(matrix.count(TenureBucket::OverTenYears, "Y"), 0);
    }

    #[test]
    fn test_risk_matrix_means_skip_undefined_age() {
        let data = vec![
            record("01/01/1980", "01/01/2018", "01/01/2021", "Inic. Empresa", "X"),
            record("garbage", "01/01/2017", "01/01/2021", "Inic. Empresa", "X"),
        ];
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let matrix = TurnoverAnalytics::new(&refs).risk_matrix();
        let cell = matrix.cell(TenureBucket::TwoToFiveYears, "X").unwrap();
        assert_eq!(cell.count, 2);
        // only the first record has an age (41)
        assert_eq!(cell.mean_age, Some(41.0));
        let expected_tenure = (1096.0 / 365.25 + 1461.0 / 365.25) / 2.0;
        assert!((cell.mean_tenure_years.unwrap() - expected_tenure).abs() < 1e-9);

        let empty_cell = matrix.cell(TenureBucket::UnderOneYear, "X").unwrap();
        assert_eq!(empty_cell.count, 0);
        assert_eq!(empty_cell.mean_age, None);
    }

    #[test]
    fn test_cell_text_reports_all_values() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let matrix = TurnoverAnalytics::new(&refs).risk_matrix();
        let text = matrix.cell_text(1, 0).unwrap();
        assert_eq!(text, "Count: 1 | Mean tenure: 1.0 years | Mean age: 36 years");
        let grid = matrix.text_grid();
        assert_eq!(grid.len(), 5);
        assert!(grid.iter().all(|row| row.len() == 2));
        assert!(matrix.cell_text(9, 0).is_none());
    }

    #[test]
    fn test_risk_matrix_for_initiative() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let matrix = TurnoverAnalytics::new(&refs).risk_matrix_for_initiative("Inic. Empresa");
        assert_eq!(matrix.columns, vec!["X".to_string()]);
        assert_eq!(matrix.total(), 1);
    }

    #[test]
    fn test_age_breakdown_canonical_order() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let groups = TurnoverAnalytics::new(&refs).age_breakdown();
        let labels: Vec<(&str, &str, usize)> = groups
            .iter()
            .map(|g| (g.label.as_str(), g.initiative.as_str(), g.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("25-34", "Inic. Empregado", 1),
                ("35-44", "Inic. Empregado", 1),
                ("35-44", "Inic. Empresa", 1),
                ("undefined", "Inic. Empregado", 1),
                ("undefined", "Inic. Empresa", 1),
            ]
        );
    }

    #[test]
    fn test_empty_input_gives_empty_tables() {
        let refs: Vec<&EnrichedRecord> = Vec::new();
        let analytics = TurnoverAnalytics::new(&refs);
        assert!(analytics.is_empty());
        assert!(analytics.monthly_timeline().is_empty());
        assert!(analytics.initiative_monthly_bars().is_empty());
        assert!(analytics.risk_matrix().is_empty());
        assert!(analytics.risk_matrix().rows.is_empty());
        assert!(analytics.age_breakdown().is_empty());
        assert!(analytics.reason_counts().is_empty());
    }

    #[test]
    fn test_reason_counts() {
        let data = sample();
        let refs: Vec<&EnrichedRecord> = data.iter().collect();
        let counts = TurnoverAnalytics::new(&refs).reason_counts();
        assert_eq!(counts[0], ("X".to_string(), 3));
        assert_eq!(counts.len(), 3);
    }
}

/*!
 * Dataset API for termination records
 *
 * Provides a builder for loading a file and an immutable, cheaply cloneable
 * dataset that filters, queries and summarizes the enriched records.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Result, TurnoverError};
use crate::analytics::TurnoverAnalytics;
use crate::cohort::{AgeBucket, TenureBucket};
use crate::config::TurnoverConfig;
use crate::data_types::{EnrichedRecord, InitiativeKind, TerminationRecord};
use crate::enrich::enrich_all;
use crate::filter::{FilterDimension, FilterSet};
use crate::metrics::OverviewMetrics;
use crate::reader::TerminationReader;

/// Builder for loading a termination dataset
///
/// # Example
/// ```no_run
/// # use turnover::dataset::TerminationDatasetBuilder;
/// let dataset = TerminationDatasetBuilder::new()
///     .path("data/desligamentos.xlsx")
///     .sheet_name("Base")
///     .build()?;
/// # Ok::<(), turnover::TurnoverError>(())
/// ```
pub struct TerminationDatasetBuilder {
    path: Option<PathBuf>,
    config: TurnoverConfig,
}

impl Default for TerminationDatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationDatasetBuilder {
    /// Create a new dataset builder with default settings
    pub fn new() -> Self {
        Self {
            path: None,
            config: TurnoverConfig::default(),
        }
    }

    /// Take reader settings from a configuration
    pub fn config(mut self, config: &TurnoverConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Set the file to load
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Fix the delimiter for text files
    pub fn delimiter(mut self, delimiter: Option<char>) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Set the sheet read from workbooks
    pub fn sheet_name<S: Into<String>>(mut self, sheet: S) -> Self {
        self.config.sheet_name = sheet.into();
        self
    }

    /// Enable or disable header validation
    pub fn validate_headers(mut self, validate: bool) -> Self {
        self.config.validate_headers = validate;
        self
    }

    /// Enable or disable the loading spinner
    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.enable_progress_bar = show;
        self
    }

    /// Load and enrich the file
    pub fn build(self) -> Result<TerminationDataset> {
        let path = self.path.ok_or_else(|| TurnoverError::Custom {
            message: "Input file path not specified".to_string(),
            suggestion: Some("Use .path() to specify the termination spreadsheet".to_string()),
        })?;
        self.config.validate()?;

        let records = TerminationReader::from_config(&self.config).load(&path)?;
        Ok(TerminationDataset::from_records(records))
    }
}

/// Enriched termination records, shared read-only
#[derive(Debug, Clone)]
pub struct TerminationDataset {
    records: Arc<[EnrichedRecord]>,
}

impl Default for TerminationDataset {
    fn default() -> Self {
        Self::from_enriched(Vec::new())
    }
}

impl TerminationDataset {
    /// Enrich raw records into a dataset
    pub fn from_records(records: Vec<TerminationRecord>) -> Self {
        let enriched = enrich_all(records);
        info!(records = enriched.len(), "dataset ready");
        Self::from_enriched(enriched)
    }

    /// Wrap records that are already enriched
    pub fn from_enriched(records: Vec<EnrichedRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Load a file with default reader settings
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        TerminationDatasetBuilder::new().path(path).build()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    /// Records matching every active selection, in input order
    pub fn filter(&self, filters: &FilterSet) -> FilteredView<'_> {
        FilteredView {
            records: filters.apply(&self.records),
        }
    }

    /// Every record, unfiltered
    pub fn all(&self) -> FilteredView<'_> {
        FilteredView {
            records: self.records.iter().collect(),
        }
    }

    /// Create a query builder
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Get dataset statistics
    pub fn statistics(&self) -> DatasetStatistics {
        DatasetStatistics::from_dataset(self)
    }

    /// Sorted distinct non-missing values for each filter dimension
    pub fn filter_options(&self) -> FilterOptions {
        let mut values: BTreeMap<FilterDimension, BTreeSet<&str>> = BTreeMap::new();
        for dimension in FilterDimension::ALL {
            let entry = values.entry(dimension).or_default();
            for record in self.records.iter() {
                if let Some(value) = dimension.value_of(record) {
                    entry.insert(value);
                }
            }
        }

        FilterOptions {
            options: values
                .into_iter()
                .map(|(dimension, set)| (dimension, set.into_iter().map(str::to_string).collect()))
                .collect(),
        }
    }
}

/// A filtered subset of a dataset, borrowed from it
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a EnrichedRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[&'a EnrichedRecord] {
        &self.records
    }

    /// Aggregations over this view
    pub fn analytics(&self) -> TurnoverAnalytics<'_> {
        TurnoverAnalytics::new(&self.records)
    }

    /// Trailing-window count and turnover ratio for this view
    pub fn overview(&self, headcount_baseline: u32, as_of: NaiveDate) -> OverviewMetrics {
        OverviewMetrics::compute(&self.records, headcount_baseline, as_of)
    }
}

/// Distinct values offered for each filter dimension
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub options: BTreeMap<FilterDimension, Vec<String>>,
}

impl FilterOptions {
    pub fn values(&self, dimension: FilterDimension) -> &[String] {
        self.options.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Option list as a selector shows it: the "all" sentinel first
    pub fn with_all_sentinel(&self, dimension: FilterDimension) -> Vec<String> {
        std::iter::once(crate::constants::ALL_SENTINEL.to_string())
            .chain(self.values(dimension).iter().cloned())
            .collect()
    }
}

/// Query builder for termination datasets
pub struct QueryBuilder<'a> {
    dataset: &'a TerminationDataset,
    filters: Vec<Box<dyn Fn(&EnrichedRecord) -> bool + Send + Sync + 'a>>,
}

impl<'a> QueryBuilder<'a> {
    /// Create a new query builder
    pub fn new(dataset: &'a TerminationDataset) -> Self {
        Self {
            dataset,
            filters: Vec::new(),
        }
    }

    /// Apply a dashboard filter set
    pub fn matching(mut self, filters: FilterSet) -> Self {
        self.filters.push(Box::new(move |r| filters.matches(r)));
        self
    }

    /// Terminated within `[from, to]`, both inclusive
    pub fn terminated_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.filters.push(Box::new(move |r| {
            r.termination_date
                .map(|d| d >= from && d <= to)
                .unwrap_or(false)
        }));
        self
    }

    /// Filter by tenure bucket
    pub fn tenure_bucket(mut self, bucket: TenureBucket) -> Self {
        self.filters.push(Box::new(move |r| r.tenure_bucket == bucket));
        self
    }

    /// Filter by age bucket
    pub fn age_bucket(mut self, bucket: AgeBucket) -> Self {
        self.filters.push(Box::new(move |r| r.age_bucket == bucket));
        self
    }

    /// Filter by who started the termination
    pub fn initiative_kind(mut self, kind: InitiativeKind) -> Self {
        self.filters.push(Box::new(move |r| r.initiative_kind() == Some(kind)));
        self
    }

    /// Name or registration id contains the text (case-insensitive)
    pub fn employee(mut self, text: &'a str) -> Self {
        let needle = text.to_lowercase();
        self.filters.push(Box::new(move |r| {
            [r.record.employee_name.as_deref(), r.record.registration_id.as_deref()]
                .into_iter()
                .flatten()
                .any(|v| v.to_lowercase().contains(&needle))
        }));
        self
    }

    /// Execute the query and return matching records
    pub fn execute(self) -> Vec<&'a EnrichedRecord> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.dataset.records.par_iter()
                .filter(|record| {
                    self.filters.iter().all(|filter| filter(record))
                })
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.dataset.records.iter()
                .filter(|record| {
                    self.filters.iter().all(|filter| filter(record))
                })
                .collect()
        }
    }

    /// Execute the query and return count only
    pub fn count(self) -> usize {
        self.execute().len()
    }

    /// Execute the query with a limit
    pub fn limit(self, limit: usize) -> Vec<&'a EnrichedRecord> {
        let mut results = Vec::new();
        for record in self.dataset.records.iter() {
            if self.filters.iter().all(|filter| filter(record)) {
                results.push(record);
                if results.len() >= limit {
                    break;
                }
            }
        }
        results
    }
}

/// Dataset statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub missing_termination_date: usize,
    pub undefined_tenure: usize,
    pub undefined_age: usize,
    pub missing_initiative: usize,
    pub missing_reason: usize,
    pub employee_initiated: usize,
    pub company_initiated: usize,
    pub regionals: usize,
    pub supervisors: usize,
    pub brands: usize,
    pub reasons: usize,
    pub first_termination: Option<NaiveDate>,
    pub last_termination: Option<NaiveDate>,
}

impl DatasetStatistics {
    /// Calculate statistics from a dataset
    pub fn from_dataset(dataset: &TerminationDataset) -> Self {
        let records = dataset.records();
        let distinct = |dimension: FilterDimension| {
            records
                .iter()
                .filter_map(|r| dimension.value_of(r))
                .collect::<BTreeSet<_>>()
                .len()
        };
        let dates = records.iter().filter_map(|r| r.termination_date);

        Self {
            total_records: records.len(),
            missing_termination_date: count_where(records, |r| r.termination_date.is_none()),
            undefined_tenure: count_where(records, |r| !r.tenure_bucket.is_defined()),
            undefined_age: count_where(records, |r| !r.age_bucket.is_defined()),
            missing_initiative: count_where(records, |r| r.initiative().is_none()),
            missing_reason: count_where(records, |r| r.reason().is_none()),
            employee_initiated: count_where(records, |r| r.initiative_kind() == Some(InitiativeKind::Employee)),
            company_initiated: count_where(records, |r| r.initiative_kind() == Some(InitiativeKind::Company)),
            regionals: distinct(FilterDimension::Regional),
            supervisors: distinct(FilterDimension::Supervisor),
            brands: distinct(FilterDimension::Brand),
            reasons: distinct(FilterDimension::Reason),
            first_termination: dates.clone().min(),
            last_termination: dates.max(),
        }
    }

    /// Print a formatted summary of the statistics
    pub fn print_summary(&self) {
        let share = |n: usize| {
            if self.total_records == 0 {
                0.0
            } else {
                n as f64 / self.total_records as f64 * 100.0
            }
        };

        println!("=== Termination Dataset Statistics ===");
        println!("Total Records: {}", self.total_records);
        println!("  Employee-initiated: {} ({:.1}%)", self.employee_initiated, share(self.employee_initiated));
        println!("  Company-initiated: {} ({:.1}%)", self.company_initiated, share(self.company_initiated));
        if let (Some(first), Some(last)) = (self.first_termination, self.last_termination) {
            println!("Terminations from {} to {}", first, last);
        }
        println!("Regionals: {}", self.regionals);
        println!("Supervisors: {}", self.supervisors);
        println!("Brands: {}", self.brands);
        println!("Reasons: {}", self.reasons);

        if self.undefined_tenure > 0 {
            println!("Records with undefined tenure: {}", self.undefined_tenure);
        }
        if self.undefined_age > 0 {
            println!("Records with undefined age: {}", self.undefined_age);
        }
        if self.missing_termination_date > 0 {
            println!("Records without termination date: {}", self.missing_termination_date);
        }
    }
}

fn count_where<F>(records: &[EnrichedRecord], predicate: F) -> usize
where
    F: Fn(&EnrichedRecord) -> bool,
{
    records.iter().filter(|r| predicate(r)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(regional: &str, supervisor: &str, termination: Option<&str>, initiative: &str) -> TerminationRecord {
        TerminationRecord {
            regional: Some(regional.to_string()),
            supervisor: Some(supervisor.to_string()),
            employee_name: Some(format!("Colaborador {}", supervisor)),
            birth_date: Some("01/01/1990".to_string()),
            admission_date: Some("01/01/2020".to_string()),
            termination_date: termination.map(|t| t.to_string()),
            initiative: Some(initiative.to_string()),
            reason: Some("Pedido".to_string()),
            ..Default::default()
        }
    }

    fn dataset() -> TerminationDataset {
        TerminationDataset::from_records(vec![
            raw("Sul", "Bia", Some("10/03/2021"), "Inic. Empregado"),
            raw("Norte", "Ana", Some("10/02/2022"), "Inic. Empresa"),
            raw("Sul", "Caio", None, "Inic. Empregado"),
        ])
    }

    #[test]
    fn test_filter_view_and_analytics() {
        let data = dataset();
        let view = data.filter(&FilterSet::new().regional("Sul"));
        assert_eq!(view.len(), 2);
        assert_eq!(view.analytics().monthly_timeline().len(), 1);
        assert_eq!(data.all().len(), 3);
    }

    #[test]
    fn test_filter_options_sorted_distinct() {
        let options = dataset().filter_options();
        assert_eq!(options.values(FilterDimension::Regional), &["Norte".to_string(), "Sul".to_string()]);
        assert_eq!(
            options.values(FilterDimension::Supervisor),
            &["Ana".to_string(), "Bia".to_string(), "Caio".to_string()]
        );
        assert_eq!(options.with_all_sentinel(FilterDimension::Reason), vec!["Todos", "Pedido"]);
        assert!(options.values(FilterDimension::Brand).is_empty());
    }

    #[test]
    fn test_statistics() {
        let stats = dataset().statistics();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.missing_termination_date, 1);
        assert_eq!(stats.undefined_tenure, 1);
        assert_eq!(stats.employee_initiated, 2);
        assert_eq!(stats.regionals, 2);
        assert_eq!(stats.first_termination, NaiveDate::from_ymd_opt(2021, 3, 10));
        assert_eq!(stats.last_termination, NaiveDate::from_ymd_opt(2022, 2, 10));
    }

    #[test]
    fn test_query_builder() {
        let data = dataset();
        let from = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();
        assert_eq!(data.query().terminated_between(from, to).count(), 1);
        assert_eq!(data.query().initiative_kind(InitiativeKind::Employee).count(), 2);
        assert_eq!(data.query().employee("caio").count(), 1);
        assert_eq!(
            data.query().matching(FilterSet::new().regional("Sul")).limit(1).len(),
            1
        );
        assert_eq!(data.query().tenure_bucket(TenureBucket::Undefined).count(), 1);
    }

    #[test]
    fn test_builder_requires_path() {
        assert!(matches!(
            TerminationDatasetBuilder::new().build(),
            Err(TurnoverError::Custom { .. })
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let data = TerminationDataset::default();
        assert!(data.is_empty());
        assert!(data.filter(&FilterSet::new()).is_empty());
        assert_eq!(data.statistics().first_termination, None);
    }
}

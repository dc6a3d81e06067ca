/*!
 * # Turnover: employee termination analytics
 *
 * A Rust library for turning an HR termination spreadsheet into the numbers a
 * turnover dashboard shows.
 *
 * ## Features
 *
 * - **Typed ingestion**: CSV/TSV exports with delimiter sniffing, or the "Base"
 *   sheet of an Excel workbook (`spreadsheet` feature)
 * - **Cohorts**: tenure and age buckets derived per record, with missing or
 *   unparseable dates kept as an explicit undefined bucket
 * - **Filters**: exact-match selections on regional, supervisor, brand,
 *   initiative and reason, combined with AND
 * - **Aggregations**: monthly timeline, tenure × reason risk matrix, age-group
 *   breakdown, per-initiative monthly bars
 * - **Overview**: trailing twelve-month terminations and turnover ratio
 *   against a configurable headcount baseline
 * - **Export**: JSON, JSON Lines and CSV for filtered rows and full reports
 *
 * ## Quick Start
 *
 * ```no_run
 * use turnover::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let dataset = TerminationDataset::load("data/desligamentos.csv")?;
 *
 * let filters = FilterSet::new()
 *     .regional("Sul")
 *     .initiative("Inic. Empregado");
 * let view = dataset.filter(&filters);
 *
 * let matrix = view.analytics().risk_matrix();
 * for (row, label) in matrix.row_labels().iter().enumerate() {
 *     println!("{}: {:?}", label, matrix.counts[row]);
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Loading Data
 *
 * ```no_run
 * # use turnover::prelude::*;
 * # fn main() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .sheet_name("Base")
 *     .delimiter(Some(';'))
 *     .build();
 *
 * let dataset = TerminationDatasetBuilder::new()
 *     .config(&config)
 *     .path("data/desligamentos.xlsx")
 *     .build()?;
 * dataset.statistics().print_summary();
 * # Ok(())
 * # }
 * ```
 *
 * ## Reports
 *
 * ```no_run
 * # use turnover::prelude::*;
 * # fn main() -> Result<()> {
 * # let dataset = TerminationDataset::load("data/desligamentos.csv")?;
 * let as_of = chrono::Local::now().date_naive();
 * let report = DashboardReport::build(&dataset, &FilterSet::new(), 640, as_of);
 * println!("Turnover: {}", report.overview.turnover_display());
 *
 * JsonExporter::new().export_report(&report, std::path::Path::new("report.json"))?;
 * dataset.all().export_csv("rows.csv")?;
 * # Ok(())
 * # }
 * ```
 */

// Re-export error types from root
pub use error::{TurnoverError, Result, ErrorContext, ExportFormat};

// Public modules
pub mod data_types;
pub mod cohort;
pub mod schema;
pub mod reader;
pub mod enrich;
pub mod filter;
pub mod analytics;
pub mod metrics;
pub mod dataset;
pub mod report;
pub mod session;
pub mod export;
pub mod config;
pub mod error;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use turnover::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::cohort::{AgeBucket, TenureBucket};
    pub use crate::reader::TerminationReader;
    pub use crate::schema::{TerminationSchema, columns};
    pub use crate::enrich::{enrich, enrich_all, parse_date};
    pub use crate::filter::{FilterDimension, FilterSet, Selection};
    pub use crate::analytics::{TurnoverAnalytics, RiskMatrix, RiskCell, TimelinePoint, AgeGroupCount};
    pub use crate::metrics::OverviewMetrics;
    pub use crate::dataset::{TerminationDataset, TerminationDatasetBuilder, FilteredView, DatasetStatistics};
    pub use crate::report::DashboardReport;
    pub use crate::session::{Credentials, SessionContext};
    pub use crate::export::{TurnoverExporter, JsonExporter, CsvExporter};
    pub use crate::config::{ConfigBuilder, TurnoverConfig};
    pub use crate::error::{TurnoverError, Result};
    pub use crate::ExportFormat;
}

/// Domain constants
pub mod constants {
    /// Days per year used for tenure and age
    pub const DAYS_PER_YEAR: f64 = 365.25;

    /// Length of the overview's trailing window
    pub const TRAILING_WINDOW_DAYS: i64 = 365;

    /// Longest window a configuration may ask for (a century)
    pub const MAX_TRAILING_WINDOW_DAYS: i64 = 36_525;

    /// Active headcount the turnover ratio is measured against
    pub const DEFAULT_HEADCOUNT_BASELINE: u32 = 640;

    /// Sheet read from workbooks
    pub const DEFAULT_SHEET_NAME: &str = "Base";

    /// Initiative label for resignations
    pub const INITIATIVE_EMPLOYEE: &str = "Inic. Empregado";

    /// Initiative label for dismissals
    pub const INITIATIVE_COMPANY: &str = "Inic. Empresa";

    /// Selector entry meaning "no restriction"
    pub const ALL_SENTINEL: &str = "Todos";
}

/// Common recipes and utility functions
pub mod cookbook {
    use crate::prelude::*;

    /// Resignations that happened within the first year
    ///
    /// # Example
    /// ```no_run
    /// # use turnover::prelude::*;
    /// # use turnover::cookbook::early_resignations;
    /// # fn main() -> Result<()> {
    /// # let dataset = TerminationDataset::load("data/desligamentos.csv")?;
    /// let early = early_resignations(&dataset);
    /// println!("{} people resigned before completing a year", early.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn early_resignations(dataset: &TerminationDataset) -> Vec<&EnrichedRecord> {
        dataset.query()
            .initiative_kind(InitiativeKind::Employee)
            .tenure_bucket(TenureBucket::UnderOneYear)
            .execute()
    }

    /// Terminations per supervisor, most first
    pub fn terminations_by_supervisor(dataset: &TerminationDataset) -> Vec<(String, usize)> {
        let mut counts = std::collections::HashMap::new();

        for record in dataset.records() {
            if let Some(supervisor) = record.supervisor() {
                *counts.entry(supervisor.to_string()).or_insert(0) += 1;
            }
        }

        let mut result: Vec<_> = counts.into_iter().collect();
        result.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        result
    }

    /// The reason with the most terminations in a tenure bucket
    pub fn top_reason_in_bucket(dataset: &TerminationDataset, bucket: TenureBucket) -> Option<(String, usize)> {
        let matrix = dataset.all().analytics().risk_matrix();
        matrix
            .columns
            .iter()
            .map(|reason| (reason.clone(), matrix.count(bucket, reason)))
            .filter(|(_, count)| *count > 0)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }
}

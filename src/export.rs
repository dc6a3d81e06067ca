/*!
 * Export functionality for termination data
 *
 * Writes filtered records (source columns plus derived columns) and dashboard
 * reports as JSON, JSON Lines or CSV.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{Result, TurnoverError, ExportFormat};
use crate::data_types::EnrichedRecord;
use crate::dataset::FilteredView;
use crate::report::DashboardReport;
use crate::schema::TerminationSchema;

/// Trait for implementing termination data exporters
pub trait TurnoverExporter {
    /// Export records to a single file
    fn export_records(&self, records: &[&EnrichedRecord], path: &Path) -> Result<()>;

    /// Export a report, returning every file written
    fn export_report(&self, report: &DashboardReport, path: &Path) -> Result<Vec<PathBuf>>;

    /// Get the export format
    fn format(&self) -> ExportFormat;
}

/// Pick the exporter for a format
pub fn exporter_for(format: ExportFormat) -> Box<dyn TurnoverExporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter::new()),
        ExportFormat::JsonLines => Box::new(JsonExporter::new().as_json_lines()),
        ExportFormat::Csv => Box::new(CsvExporter::new()),
    }
}

/// JSON exporter
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to export as JSON Lines (one record per line)
    pub json_lines: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            json_lines: false,
        }
    }
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set JSON Lines format
    pub fn as_json_lines(mut self) -> Self {
        self.json_lines = true;
        self.pretty_print = false;
        self
    }
}

impl TurnoverExporter for JsonExporter {
    fn export_records(&self, records: &[&EnrichedRecord], path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);

        if self.json_lines {
            for record in records {
                let json = serde_json::to_string(record)?;
                writeln!(writer, "{}", json)?;
            }
        } else if self.pretty_print {
            serde_json::to_writer_pretty(&mut writer, records)?;
        } else {
            serde_json::to_writer(&mut writer, records)?;
        }
        writer.flush()?;

        info!(path = %path.display(), records = records.len(), format = %self.format(), "exported records");
        Ok(())
    }

    fn export_report(&self, report: &DashboardReport, path: &Path) -> Result<Vec<PathBuf>> {
        let mut writer = BufWriter::new(File::create(path)?);

        if self.pretty_print {
            serde_json::to_writer_pretty(&mut writer, report)?;
        } else {
            serde_json::to_writer(&mut writer, report)?;
        }
        if self.json_lines {
            writeln!(writer)?;
        }
        writer.flush()?;

        info!(path = %path.display(), "exported report");
        Ok(vec![path.to_path_buf()])
    }

    fn format(&self) -> ExportFormat {
        if self.json_lines {
            ExportFormat::JsonLines
        } else {
            ExportFormat::Json
        }
    }
}

/// CSV exporter
///
/// Records go to one file. A report is split into one file per table, named
/// after the target path's stem.
pub struct CsvExporter {
    /// Whether to include headers
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
        }
    }
}

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to write header rows
    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }

    fn writer(&self, path: &Path) -> Result<csv::Writer<File>> {
        // Header rows are written by hand, so the builder never adds its own
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_path(path)
            .map_err(|e| TurnoverError::Export {
                message: format!("cannot create {}: {}", path.display(), e),
                format: ExportFormat::Csv,
                suggestion: Some("Check that the output directory exists and is writable".to_string()),
            })
    }

    fn write_headers<W: Write>(&self, writer: &mut csv::Writer<W>, headers: &[&str]) -> Result<()> {
        if self.include_headers {
            writer.write_record(headers)?;
        }
        Ok(())
    }

    fn write_timeline(&self, report: &DashboardReport, path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;
        self.write_headers(&mut writer, &["month", "initiative", "count"])?;
        for point in &report.timeline {
            writer.write_record([point.label.clone(), point.initiative.clone(), point.count.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_risk_matrix(&self, report: &DashboardReport, path: &Path) -> Result<()> {
        let matrix = &report.risk_matrix;
        let mut writer = self.writer(path)?;
        self.write_headers(&mut writer, &["tenure_bucket", "reason", "count", "mean_tenure_years", "mean_age"])?;
        for (i, bucket) in matrix.rows.iter().enumerate() {
            for (j, reason) in matrix.columns.iter().enumerate() {
                writer.write_record([
                    bucket.label().to_string(),
                    reason.clone(),
                    matrix.counts[i][j].to_string(),
                    optional_number(matrix.mean_tenure_years[i][j], 2),
                    optional_number(matrix.mean_age[i][j], 1),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_age_groups(&self, report: &DashboardReport, path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;
        self.write_headers(&mut writer, &["age_bucket", "initiative", "count"])?;
        for group in &report.age_groups {
            writer.write_record([group.label.clone(), group.initiative.clone(), group.count.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_overview(&self, report: &DashboardReport, path: &Path) -> Result<()> {
        let overview = &report.overview;
        let mut writer = self.writer(path)?;
        self.write_headers(
            &mut writer,
            &["as_of", "window_start", "terminations_in_window", "headcount_baseline", "turnover_percent"],
        )?;
        writer.write_record([
            overview.as_of.to_string(),
            overview.window_start.to_string(),
            overview.terminations_in_window.to_string(),
            overview.headcount_baseline.to_string(),
            optional_number(overview.turnover_percent, 1),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

impl TurnoverExporter for CsvExporter {
    fn export_records(&self, records: &[&EnrichedRecord], path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;

        let mut headers = TerminationSchema::required_columns();
        headers.extend(TerminationSchema::derived_columns());
        self.write_headers(&mut writer, &headers)?;

        for record in records {
            writer.write_record(record_row(record))?;
        }
        writer.flush()?;

        info!(path = %path.display(), records = records.len(), format = %self.format(), "exported records");
        Ok(())
    }

    fn export_report(&self, report: &DashboardReport, path: &Path) -> Result<Vec<PathBuf>> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("turnover_report");
        let table = |suffix: &str| dir.join(format!("{}_{}.csv", base_name, suffix));

        let written = vec![
            table("overview"),
            table("timeline"),
            table("risk_matrix"),
            table("age_groups"),
        ];
        self.write_overview(report, &written[0])?;
        self.write_timeline(report, &written[1])?;
        self.write_risk_matrix(report, &written[2])?;
        self.write_age_groups(report, &written[3])?;

        info!(dir = %dir.display(), files = written.len(), "exported report tables");
        Ok(written)
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

/// Source columns in schema order, then the derived columns
fn record_row(record: &EnrichedRecord) -> Vec<String> {
    let raw = &record.record;
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    vec![
        text(&raw.regional),
        text(&raw.supervisor),
        text(&raw.brand),
        text(&raw.registration_id),
        text(&raw.employee_name),
        text(&raw.birth_date),
        text(&raw.role),
        text(&raw.admission_date),
        text(&raw.termination_date),
        text(&raw.initiative),
        text(&raw.reason),
        record.tenure_days.map(|d| d.to_string()).unwrap_or_default(),
        record.tenure_bucket.label().to_string(),
        record.age_at_termination.map(|a| a.to_string()).unwrap_or_default(),
        record.age_bucket.label().to_string(),
        optional_number(record.tenure_years, 2),
    ]
}

fn optional_number(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}

// Export convenience functions for filtered views
impl FilteredView<'_> {
    /// Export to pretty JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        JsonExporter::default().export_records(self.records(), path.as_ref())
    }

    /// Export to JSON Lines format
    pub fn export_json_lines<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        JsonExporter::new()
            .as_json_lines()
            .export_records(self.records(), path.as_ref())
    }

    /// Export to CSV with source and derived columns
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        CsvExporter::default().export_records(self.records(), path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::data_types::TerminationRecord;
    use crate::dataset::TerminationDataset;
    use crate::filter::FilterSet;

    fn dataset() -> TerminationDataset {
        TerminationDataset::from_records(vec![TerminationRecord {
            regional: Some("Sul".to_string()),
            employee_name: Some("Ana, Silva".to_string()),
            birth_date: Some("15/05/1985".to_string()),
            admission_date: Some("15/01/2020".to_string()),
            termination_date: Some("15/01/2021".to_string()),
            initiative: Some("Inic. Empresa".to_string()),
            reason: Some("X".to_string()),
            ..Default::default()
        }])
    }

    #[test]
    fn test_csv_records_have_derived_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let data = dataset();
        data.all().export_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 16);
        assert_eq!(&headers[15], "Tempo Empresa (anos)");
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[4], "Ana, Silva");
        assert_eq!(&row[11], "366");
        assert_eq!(&row[12], "1-2y");
        assert_eq!(&row[13], "36");
        assert_eq!(&row[14], "35-44");
    }

    #[test]
    fn test_json_lines_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        let data = dataset();
        data.all().export_json_lines(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(value["tenure_days"], 366);
    }

    #[test]
    fn test_report_csv_splits_tables() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset();
        let as_of = NaiveDate::from_ymd_opt(2021, 6, 30).unwrap();
        let report = DashboardReport::build(&data, &FilterSet::new(), 640, as_of);
        let written = CsvExporter::new()
            .export_report(&report, &dir.path().join("dashboard.csv"))
            .unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|p| p.exists()));

        let matrix = std::fs::read_to_string(dir.path().join("dashboard_risk_matrix.csv")).unwrap();
        assert!(matrix.contains("1-2y,X,1,1.00,36.0"));
        let overview = std::fs::read_to_string(dir.path().join("dashboard_overview.csv")).unwrap();
        assert!(overview.contains("2021-06-30,2020-06-30,1,640,0.2"));
    }

    #[test]
    fn test_report_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        let data = dataset();
        let as_of = NaiveDate::from_ymd_opt(2021, 6, 30).unwrap();
        let report = DashboardReport::build(&data, &FilterSet::new(), 640, as_of);
        exporter_for(ExportFormat::Json).export_report(&report, &path).unwrap();
        let loaded: DashboardReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.filtered_records, 1);
        assert_eq!(loaded.risk_matrix.columns, vec!["X".to_string()]);
    }
}

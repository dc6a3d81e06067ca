/*!
 * Reader for termination spreadsheets
 *
 * Accepts delimited text exports (`.csv`, `.txt`, `.tsv`) and, with the
 * `spreadsheet` feature, the "Base" sheet of an Excel/ODS workbook. Loading
 * is all-or-nothing: any structural failure returns an error and no records.
 */

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use csv::ReaderBuilder;
use tracing::{debug, info};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Result, TurnoverError, ErrorContext,
    config::TurnoverConfig,
    constants::DEFAULT_SHEET_NAME,
    data_types::TerminationRecord,
    schema::TerminationSchema,
};

/// Extensions read as delimited text
pub const TEXT_EXTENSIONS: &[&str] = &["csv", "txt", "tsv"];

/// Extensions read as workbooks
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Delimiters considered when sniffing a header line
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Where each required column sits in a row, if anywhere
type FieldPositions = [Option<usize>; 11];

/// Termination file reader
pub struct TerminationReader {
    /// Whether a missing required column is an error
    validate_headers: bool,
    /// Fixed delimiter; `None` sniffs it from the header line
    delimiter: Option<u8>,
    /// Sheet read from workbooks
    sheet_name: String,
    /// Whether to show a spinner while reading
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl Default for TerminationReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationReader {
    /// Create a reader with default settings
    pub fn new() -> Self {
        Self {
            validate_headers: true,
            delimiter: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            #[cfg(feature = "progress")]
            show_progress_bar: false,
        }
    }

    /// Create a reader from configuration
    pub fn from_config(config: &TurnoverConfig) -> Self {
        let reader = Self::new()
            .with_header_validation(config.validate_headers)
            .with_delimiter(config.delimiter_byte())
            .with_sheet_name(config.sheet_name.clone());
        #[cfg(feature = "progress")]
        let reader = reader.with_progress_bar(config.enable_progress_bar);
        reader
    }

    /// Enable or disable header validation.
    ///
    /// With validation off, absent columns read as missing values.
    pub fn with_header_validation(mut self, validate: bool) -> Self {
        self.validate_headers = validate;
        self
    }

    /// Fix the delimiter instead of sniffing it
    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a sheet other than "Base" from workbooks
    pub fn with_sheet_name<S: Into<String>>(mut self, sheet: S) -> Self {
        self.sheet_name = sheet.into();
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the spinner
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Load records from a file, choosing the parser from the extension
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<TerminationRecord>> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(TurnoverError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if TEXT_EXTENSIONS.contains(&extension.as_str()) {
            self.load_delimited(path)
        } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            self.load_spreadsheet(path)
        } else {
            Err(TurnoverError::unsupported_format(&extension))
        }
    }

    /// Load a delimited text file
    pub fn load_delimited<P: AsRef<Path>>(&self, path: P) -> Result<Vec<TerminationRecord>> {
        let path = path.as_ref();
        let start_time = Instant::now();

        #[cfg(feature = "progress")]
        let spinner = self.spinner(path);

        let mut file = File::open(path).map_err(|e| TurnoverError::Io {
            message: format!("cannot open {}: {}", path.display(), e),
            source: e,
            context: ErrorContext::for_file(path),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let records = self.parse_delimited(&bytes, ErrorContext::for_file(path))?;

        #[cfg(feature = "progress")]
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        info!(
            path = %path.display(),
            records = records.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "loaded termination records"
        );
        Ok(records)
    }

    /// Load delimited text from any reader
    pub fn from_reader<R: Read>(&self, mut reader: R) -> Result<Vec<TerminationRecord>> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.parse_delimited(&bytes, ErrorContext::default())
    }

    fn parse_delimited(&self, bytes: &[u8], context: ErrorContext) -> Result<Vec<TerminationRecord>> {
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(bytes));
        debug!(delimiter = %(delimiter as char).escape_default(), "reading delimited text");

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(e, &context))?
            .iter()
            .map(|s| s.to_string())
            .collect();
        let positions = self.resolve(&headers, context.clone())?;

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| csv_error(e, &context))?;
            let cells: Vec<&str> = row.iter().collect();
            if let Some(record) = build_record(&positions, &cells) {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Load the configured sheet of a workbook
    #[cfg(feature = "spreadsheet")]
    pub fn load_spreadsheet<P: AsRef<Path>>(&self, path: P) -> Result<Vec<TerminationRecord>> {
        use calamine::{open_workbook_auto, Reader};

        let path = path.as_ref();
        let start_time = Instant::now();
        let context = ErrorContext::for_file(path);

        #[cfg(feature = "progress")]
        let spinner = self.spinner(path);

        let mut workbook = open_workbook_auto(path).map_err(|e| TurnoverError::Spreadsheet {
            message: e.to_string(),
            sheet: None,
            context: context.clone(),
        })?;

        let range = workbook
            .worksheet_range(&self.sheet_name)
            .map_err(|e| TurnoverError::Spreadsheet {
                message: format!("cannot read sheet '{}': {}", self.sheet_name, e),
                sheet: Some(self.sheet_name.clone()),
                context: context.clone(),
            })?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(row) => row.iter().map(cell_text).map(|c| c.unwrap_or_default()).collect(),
            None => Vec::new(),
        };
        let positions = self.resolve(&headers, context)?;

        let mut records = Vec::new();
        for row in rows {
            let cells: Vec<String> = row.iter().map(|c| cell_text(c).unwrap_or_default()).collect();
            let cells: Vec<&str> = cells.iter().map(|s| s.as_str()).collect();
            if let Some(record) = build_record(&positions, &cells) {
                records.push(record);
            }
        }

        #[cfg(feature = "progress")]
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        info!(
            path = %path.display(),
            sheet = %self.sheet_name,
            records = records.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "loaded termination records"
        );
        Ok(records)
    }

    /// Load the configured sheet of a workbook
    #[cfg(not(feature = "spreadsheet"))]
    pub fn load_spreadsheet<P: AsRef<Path>>(&self, _path: P) -> Result<Vec<TerminationRecord>> {
        Err(TurnoverError::feature_required("spreadsheet"))
    }

    fn resolve(&self, headers: &[String], context: ErrorContext) -> Result<FieldPositions> {
        match TerminationSchema::resolve_headers_with_context(headers, context) {
            Ok(index) => Ok([
                Some(index.regional),
                Some(index.supervisor),
                Some(index.brand),
                Some(index.registration_id),
                Some(index.employee_name),
                Some(index.birth_date),
                Some(index.role),
                Some(index.admission_date),
                Some(index.termination_date),
                Some(index.initiative),
                Some(index.reason),
            ]),
            Err(e) if self.validate_headers => Err(e),
            Err(e) => {
                debug!("header validation disabled, continuing: {}", e);
                let mut positions: FieldPositions = [None; 11];
                for (slot, name) in TerminationSchema::required_columns().into_iter().enumerate() {
                    positions[slot] = headers
                        .iter()
                        .position(|h| h.trim().trim_start_matches('\u{feff}') == name);
                }
                Ok(positions)
            }
        }
    }

    #[cfg(feature = "progress")]
    fn spinner(&self, path: &Path) -> Option<ProgressBar> {
        if !self.show_progress_bar {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(format!("Reading {}", path.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    }
}

/// Pick the candidate delimiter that occurs most often in the header line,
/// ignoring quoted text. Falls back to a comma.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in header {
        if *byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(slot) = CANDIDATE_DELIMITERS.iter().position(|d| d == byte) {
            counts[slot] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(slot, _)| CANDIDATE_DELIMITERS[slot])
        .unwrap_or(b',')
}

/// Turn one row into a record. Rows with every cell blank yield `None`.
fn build_record(positions: &FieldPositions, cells: &[&str]) -> Option<TerminationRecord> {
    if cells.iter().all(|c| c.trim().is_empty()) {
        return None;
    }

    let field = |slot: usize| -> Option<String> {
        positions[slot]
            .and_then(|idx| cells.get(idx))
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.to_string())
    };

    Some(TerminationRecord {
        regional: field(0),
        supervisor: field(1),
        brand: field(2),
        registration_id: field(3),
        employee_name: field(4),
        birth_date: field(5),
        role: field(6),
        admission_date: field(7),
        termination_date: field(8),
        initiative: field(9),
        reason: field(10),
    })
}

fn csv_error(err: csv::Error, context: &ErrorContext) -> TurnoverError {
    let line = err.position().map(|pos| pos.line() as usize);
    TurnoverError::CsvParse {
        message: err.to_string(),
        line,
        context: ErrorContext {
            line_number: line,
            ..context.clone()
        },
    }
}

/// Render a workbook cell as text. Dates become `dd/mm/YYYY` and whole
/// numbers lose their fractional part, so ids and dates read like the
/// delimited export.
#[cfg(feature = "spreadsheet")]
fn cell_text(cell: &calamine::Data) -> Option<String> {
    use calamine::Data;

    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%d/%m/%Y").to_string())
            .or_else(|| Some(dt.as_f64().to_string())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::columns;

    fn header_line(delimiter: &str) -> String {
        TerminationSchema::required_columns().join(delimiter)
    }

    fn row(delimiter: &str, regional: &str, reason: &str) -> String {
        [
            regional, "Sup 1", "FPP", "12345", "Ana", "15/05/1985", "Gerente",
            "15/01/2020", "15/01/2021", "Inic. Empresa", reason,
        ]
        .join(delimiter)
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"a;b;c\n1,5;2;3"), b';');
        assert_eq!(sniff_delimiter(b"a,b,c\n"), b',');
        assert_eq!(sniff_delimiter(b"a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter(b"\"x;y\",b,c"), b',');
        assert_eq!(sniff_delimiter(b"single"), b',');
    }

    #[test]
    fn test_read_semicolon_text() {
        let data = format!("{}\n{}\n", header_line(";"), row(";", "Sul", "Pedido"));
        let records = TerminationReader::new().from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].regional.as_deref(), Some("Sul"));
        assert_eq!(records[0].reason.as_deref(), Some("Pedido"));
        assert_eq!(records[0].admission_date.as_deref(), Some("15/01/2020"));
    }

    #[test]
    fn test_blank_cells_are_missing_and_blank_rows_skipped() {
        let data = format!(
            "{}\n{}\n,,,,,,,,,,\n",
            header_line(","),
            row(",", "Sul", "  ")
        );
        let records = TerminationReader::new().from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason, None);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let data = format!("Nome Filial,{}\nFilial X,{}\n", header_line(","), row(",", "Norte", "X"));
        let records = TerminationReader::new().from_reader(data.as_bytes()).unwrap();
        assert_eq!(records[0].regional.as_deref(), Some("Norte"));
    }

    #[test]
    fn test_missing_column_fails() {
        let headers: Vec<&str> = TerminationSchema::required_columns()
            .into_iter()
            .filter(|c| *c != columns::TERMINATION_DATE)
            .collect();
        let data = format!("{}\n", headers.join(","));
        let err = TerminationReader::new().from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TurnoverError::MissingColumns { .. }));
    }

    #[test]
    fn test_lenient_headers_read_missing_as_none() {
        let data = "Regional,Motivo Desligamento\nSul,X\n";
        let records = TerminationReader::new()
            .with_header_validation(false)
            .from_reader(data.as_bytes())
            .unwrap();
        assert_eq!(records[0].regional.as_deref(), Some("Sul"));
        assert_eq!(records[0].termination_date, None);
    }

    #[test]
    fn test_ragged_row_fails_whole_load() {
        let data = format!("{}\n{}\nSul,only-two\n", header_line(","), row(",", "Sul", "X"));
        let err = TerminationReader::new().from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TurnoverError::CsvParse { .. }));
    }

    #[test]
    fn test_unsupported_extension_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("data.json");
        std::fs::write(&json, "{}").unwrap();
        assert!(matches!(
            TerminationReader::new().load(&json),
            Err(TurnoverError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            TerminationReader::new().load(dir.path().join("absent.csv")),
            Err(TurnoverError::FileNotFound { .. })
        ));
    }
}

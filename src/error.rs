/*!
 * Error handling for turnover analytics operations
 *
 * Ingestion failures carry the list of required columns so the caller can
 * tell the user what the file is expected to contain.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

use crate::schema::TerminationSchema;

/// Turnover library result type
pub type Result<T> = std::result::Result<T, TurnoverError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum TurnoverError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        context: ErrorContext,
    },

    /// One or more required columns are absent from the header row
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
        context: ErrorContext,
    },

    /// Spreadsheet could not be opened or the sheet is missing
    #[error("Spreadsheet error: {message}")]
    Spreadsheet {
        message: String,
        sheet: Option<String>,
        context: ErrorContext,
    },

    /// File extension not recognised as delimited text or spreadsheet
    #[error("Unsupported input format '{extension}'")]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Date parsing errors with format hints
    #[error("Date parsing error: {message}")]
    DateParse {
        message: String,
        value: String,
        expected_format: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Login rejected or an operation attempted without a session
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
        suggestion: Option<String>,
    },

    /// Feature not enabled error
    #[error("Feature '{feature}' is not enabled")]
    FeatureNotEnabled {
        feature: String,
        enable_instruction: String,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
}

impl ErrorContext {
    /// Context pointing at a file
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Export format for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    JsonLines,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl TurnoverError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = format!(
            "Check if the file exists at '{}'. Expected a .csv export or a spreadsheet with a 'Base' sheet.",
            path.display()
        );

        Self::FileNotFound { path, suggestion }
    }

    /// Create a missing-columns error listing every required column
    pub fn missing_columns(missing: Vec<String>, context: ErrorContext) -> Self {
        Self::MissingColumns {
            missing,
            required: TerminationSchema::required_columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            context,
        }
    }

    /// Create an unsupported format error for a file extension
    pub fn unsupported_format(extension: &str) -> Self {
        Self::UnsupportedFormat {
            extension: extension.to_string(),
            supported: ["csv", "txt", "tsv", "xlsx", "xlsm", "xls", "ods"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Create a date parsing error with format information
    pub fn date_parse_with_format(value: &str, expected_format: &str) -> Self {
        Self::DateParse {
            message: format!("Cannot parse '{}' as date", value),
            value: value.to_string(),
            expected_format: expected_format.to_string(),
        }
    }

    /// Create a feature not enabled error
    pub fn feature_required(feature: &str) -> Self {
        let enable_instruction = match feature {
            "spreadsheet" => "Add 'turnover = { version = \"0.1\", features = [\"spreadsheet\"] }' to your Cargo.toml",
            _ => "Enable the required feature in your Cargo.toml",
        };

        Self::FeatureNotEnabled {
            feature: feature.to_string(),
            enable_instruction: enable_instruction.to_string(),
        }
    }

    /// Whether this error happened while reading the input file
    pub fn is_ingestion_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::CsvParse { .. }
                | Self::MissingColumns { .. }
                | Self::Spreadsheet { .. }
                | Self::UnsupportedFormat { .. }
                | Self::FileNotFound { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        let base = match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::UnsupportedFormat { supported, .. } => {
                format!("{}\n\nSupported formats: {}", self, supported.join(", "))
            }
            Self::DateParse { expected_format, .. } => {
                format!("{}\n\nExpected format: {}", self, expected_format)
            }
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            Self::FeatureNotEnabled { enable_instruction, .. } => {
                format!("{}\n\nTo enable: {}", self, enable_instruction)
            }
            Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        };

        if self.is_ingestion_error() {
            format!(
                "{}\n\nCheck that the file contains the required columns: {}",
                base,
                TerminationSchema::required_columns().join(", ")
            )
        } else {
            base
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for TurnoverError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for TurnoverError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line() as usize);

        Self::CsvParse {
            message: err.to_string(),
            line,
            context: ErrorContext {
                line_number: line,
                ..Default::default()
            },
        }
    }
}

impl From<serde_json::Error> for TurnoverError {
    fn from(err: serde_json::Error) -> Self {
        TurnoverError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
            suggestion: Some("Check if the data is serializable to JSON.".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_required() {
        let err = TurnoverError::missing_columns(
            vec!["Regional".to_string()],
            ErrorContext::default(),
        );
        let message = err.user_message();
        assert!(message.contains("Missing required columns: Regional"));
        assert!(message.contains("Motivo Desligamento"));
        assert!(err.is_ingestion_error());
    }

    #[test]
    fn test_non_ingestion_message_has_no_column_hint() {
        let err = TurnoverError::Authentication {
            message: "invalid username or password".to_string(),
        };
        assert!(!err.is_ingestion_error());
        assert!(!err.user_message().contains("required columns"));
    }
}

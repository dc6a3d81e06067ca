/*!
 * Data type definitions for termination records
 *
 * A `TerminationRecord` is one row exactly as read from the source file. An
 * `EnrichedRecord` wraps it together with the parsed dates and the derived
 * tenure/age fields. Every field that can be missing is an `Option`.
 */

use serde::{Deserialize, Serialize};
use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::cohort::{AgeBucket, TenureBucket};
use crate::constants::{INITIATIVE_COMPANY, INITIATIVE_EMPLOYEE};

/// One termination event as read from the spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminationRecord {
    pub regional: Option<String>,
    pub supervisor: Option<String>,
    /// Store flag ("Bandeira")
    pub brand: Option<String>,
    /// Registration id ("Matrícula"), not necessarily unique
    pub registration_id: Option<String>,
    pub employee_name: Option<String>,
    pub birth_date: Option<String>,
    pub role: Option<String>,
    pub admission_date: Option<String>,
    pub termination_date: Option<String>,
    pub initiative: Option<String>,
    pub reason: Option<String>,
}

/// Who started the termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InitiativeKind {
    /// Resignation ("Inic. Empregado")
    Employee,
    /// Dismissal ("Inic. Empresa")
    Company,
}

impl InitiativeKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            INITIATIVE_EMPLOYEE => Some(InitiativeKind::Employee),
            INITIATIVE_COMPANY => Some(InitiativeKind::Company),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InitiativeKind::Employee => INITIATIVE_EMPLOYEE,
            InitiativeKind::Company => INITIATIVE_COMPANY,
        }
    }
}

impl fmt::Display for InitiativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitiativeKind::Employee => write!(f, "Employee-initiated"),
            InitiativeKind::Company => write!(f, "Company-initiated"),
        }
    }
}

/// Calendar month used as a timeline key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `MM/YYYY`, the axis label used by the per-initiative bar chart
    pub fn slash_label(&self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }
}

/// `YYYY-MM`
impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// A termination record with its derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub record: TerminationRecord,
    pub birth_date: Option<NaiveDate>,
    pub admission_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    /// Termination minus admission, in whole days
    pub tenure_days: Option<i64>,
    /// `tenure_days / 365.25`
    pub tenure_years: Option<f64>,
    pub tenure_bucket: TenureBucket,
    /// Whole years at termination
    pub age_at_termination: Option<i32>,
    pub age_bucket: AgeBucket,
}

impl EnrichedRecord {
    pub fn regional(&self) -> Option<&str> {
        self.record.regional.as_deref()
    }

    pub fn supervisor(&self) -> Option<&str> {
        self.record.supervisor.as_deref()
    }

    pub fn brand(&self) -> Option<&str> {
        self.record.brand.as_deref()
    }

    pub fn initiative(&self) -> Option<&str> {
        self.record.initiative.as_deref()
    }

    pub fn initiative_kind(&self) -> Option<InitiativeKind> {
        self.initiative().and_then(InitiativeKind::from_label)
    }

    pub fn reason(&self) -> Option<&str> {
        self.record.reason.as_deref()
    }

    pub fn termination_month(&self) -> Option<YearMonth> {
        self.termination_date.map(YearMonth::of)
    }

    /// Name shown in tables; falls back to the registration id
    pub fn display_name(&self) -> String {
        self.record
            .employee_name
            .as_deref()
            .or(self.record.registration_id.as_deref())
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiative_labels() {
        assert_eq!(InitiativeKind::from_label("Inic. Empregado"), Some(InitiativeKind::Employee));
        assert_eq!(InitiativeKind::from_label(" Inic. Empresa "), Some(InitiativeKind::Company));
        assert_eq!(InitiativeKind::from_label("Outro"), None);
        assert_eq!(InitiativeKind::Company.label(), "Inic. Empresa");
    }

    #[test]
    fn test_year_month_labels_and_order() {
        let jan = YearMonth::of(NaiveDate::from_ymd_opt(2021, 1, 15).unwrap());
        assert_eq!(jan.to_string(), "2021-01");
        assert_eq!(jan.slash_label(), "01/2021");
        assert!(YearMonth::new(2020, 12) < jan);
        assert!(jan < YearMonth::new(2021, 2));
    }
}

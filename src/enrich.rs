/*!
 * Record enrichment
 *
 * Parses the three date columns and derives tenure and age fields. A date
 * that cannot be parsed never fails the batch: the dependent fields become
 * `None` and the bucket becomes `Undefined`.
 */

use chrono::NaiveDate;
use tracing::debug;

use crate::cohort::{AgeBucket, TenureBucket};
use crate::constants::DAYS_PER_YEAR;
use crate::data_types::{EnrichedRecord, TerminationRecord};
use crate::schema::columns;
use crate::{Result, TurnoverError};

/// Date-only layouts accepted in the source sheet, day first
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Parse a date cell leniently.
///
/// Accepts `dd/mm/yyyy` and the other layouts in `DATE_FORMATS`, optionally
/// followed by a time part (spreadsheet exports append `00:00:00`).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Drop a trailing time component, separated by a space or ISO 'T'
    let date_part = value
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(value);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a date and report a descriptive error on failure
pub fn parse_date_strict(value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| TurnoverError::date_parse_with_format(value, "DD/MM/YYYY or YYYY-MM-DD"))
}

/// Parse one date column of a record; blank cells are `None` without a log line
pub fn parse_date_column(value: Option<&str>, column: &str) -> Option<NaiveDate> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    match parse_date_strict(value) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(column, "{}", e);
            None
        }
    }
}

/// Whole years between two dates, `days / 365.25` rounded half to even
pub fn age_in_whole_years(days: i64) -> i32 {
    (days as f64 / DAYS_PER_YEAR).round_ties_even() as i32
}

/// Derive the enriched fields for a single record, taking ownership of it
pub fn enrich(record: TerminationRecord) -> EnrichedRecord {
    let birth_date = parse_date_column(record.birth_date.as_deref(), columns::BIRTH_DATE);
    let admission_date = parse_date_column(record.admission_date.as_deref(), columns::ADMISSION_DATE);
    let termination_date = parse_date_column(record.termination_date.as_deref(), columns::TERMINATION_DATE);

    let tenure_days = match (admission_date, termination_date) {
        (Some(admitted), Some(terminated)) => Some((terminated - admitted).num_days()),
        _ => None,
    };
    let tenure_years = tenure_days.map(|days| days as f64 / DAYS_PER_YEAR);

    let age_at_termination = match (birth_date, termination_date) {
        (Some(born), Some(terminated)) => Some(age_in_whole_years((terminated - born).num_days())),
        _ => None,
    };

    EnrichedRecord {
        record,
        birth_date,
        admission_date,
        termination_date,
        tenure_days,
        tenure_years,
        tenure_bucket: TenureBucket::from_years(tenure_years),
        age_at_termination,
        age_bucket: AgeBucket::from_years(age_at_termination.map(f64::from)),
    }
}

/// Derive the enriched fields for a borrowed record
pub fn enrich_record(record: &TerminationRecord) -> EnrichedRecord {
    enrich(record.clone())
}

/// Enrich a whole batch, preserving row order
pub fn enrich_all(records: Vec<TerminationRecord>) -> Vec<EnrichedRecord> {
    #[cfg(feature = "parallel")]
    let enriched: Vec<EnrichedRecord> = {
        use rayon::prelude::*;
        records.into_par_iter().map(enrich).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let enriched: Vec<EnrichedRecord> = records.into_iter().map(enrich).collect();

    let undefined_tenure = enriched.iter().filter(|r| r.tenure_days.is_none()).count();
    let undefined_age = enriched.iter().filter(|r| r.age_at_termination.is_none()).count();
    if undefined_tenure > 0 || undefined_age > 0 {
        debug!(
            records = enriched.len(),
            undefined_tenure,
            undefined_age,
            "enriched batch with unparseable or missing dates"
        );
    }

    enriched
}

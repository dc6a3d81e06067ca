/*!
 * Schema definitions for termination spreadsheets
 *
 * This module contains the column names expected in the "Base" sheet (or an
 * equivalent delimited export) and the logic that maps a header row onto
 * record fields.
 */

use crate::{Result, TurnoverError, ErrorContext};

/// Column headers as they appear in the source spreadsheet
pub mod columns {
    pub const REGIONAL: &str = "Regional";
    pub const SUPERVISOR: &str = "Supervisor";
    pub const BRAND: &str = "Bandeira";
    pub const REGISTRATION_ID: &str = "Matrícula";
    pub const EMPLOYEE_NAME: &str = "Nome do Colaborador";
    pub const BIRTH_DATE: &str = "Nascimento";
    pub const ROLE: &str = "Cargo do Colaborador";
    pub const ADMISSION_DATE: &str = "Data Admissão";
    pub const TERMINATION_DATE: &str = "Data Desligamento";
    pub const INITIATIVE: &str = "Iniciativa Desligamento";
    pub const REASON: &str = "Motivo Desligamento";
}

/// Derived column headers appended on export
pub mod derived_columns {
    pub const TENURE_DAYS: &str = "Tempo Permanencia (dias)";
    pub const TENURE_BUCKET: &str = "Grupo Tempo Permanencia";
    pub const AGE_AT_TERMINATION: &str = "Idade Desligamento";
    pub const AGE_BUCKET: &str = "Grupo Etario";
    pub const TENURE_YEARS: &str = "Tempo Empresa (anos)";
}

/// Termination file schema
pub struct TerminationSchema;

impl TerminationSchema {
    /// Required columns in the order they are usually laid out
    pub fn required_columns() -> Vec<&'static str> {
        vec![
            columns::REGIONAL,
            columns::SUPERVISOR,
            columns::BRAND,
            columns::REGISTRATION_ID,
            columns::EMPLOYEE_NAME,
            columns::BIRTH_DATE,
            columns::ROLE,
            columns::ADMISSION_DATE,
            columns::TERMINATION_DATE,
            columns::INITIATIVE,
            columns::REASON,
        ]
    }

    /// Derived columns appended after the required ones on export
    pub fn derived_columns() -> Vec<&'static str> {
        vec![
            derived_columns::TENURE_DAYS,
            derived_columns::TENURE_BUCKET,
            derived_columns::AGE_AT_TERMINATION,
            derived_columns::AGE_BUCKET,
            derived_columns::TENURE_YEARS,
        ]
    }

    pub fn column_count() -> usize {
        11
    }

    /// Map a header row onto field positions.
    ///
    /// Headers are compared after trimming surrounding whitespace. Extra
    /// columns are ignored; if any required column is absent the error lists
    /// every missing one.
    pub fn resolve_headers(headers: &[String]) -> Result<ColumnIndex> {
        Self::resolve_headers_with_context(headers, ErrorContext::default())
    }

    pub(crate) fn resolve_headers_with_context(
        headers: &[String],
        context: ErrorContext,
    ) -> Result<ColumnIndex> {
        let position = |name: &str| {
            headers.iter().position(|h| h.trim().trim_start_matches('\u{feff}') == name)
        };

        let mut missing = Vec::new();
        let mut positions = [0usize; 11];
        for (slot, name) in Self::required_columns().into_iter().enumerate() {
            match position(name) {
                Some(idx) => positions[slot] = idx,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(TurnoverError::missing_columns(missing, context));
        }

        Ok(ColumnIndex {
            regional: positions[0],
            supervisor: positions[1],
            brand: positions[2],
            registration_id: positions[3],
            employee_name: positions[4],
            birth_date: positions[5],
            role: positions[6],
            admission_date: positions[7],
            termination_date: positions[8],
            initiative: positions[9],
            reason: positions[10],
        })
    }

    /// Example layout of the expected sheet, including the optional columns
    /// the source spreadsheet usually carries.
    pub fn sample_rows() -> (Vec<&'static str>, Vec<Vec<&'static str>>) {
        let headers = vec![
            columns::REGIONAL,
            columns::SUPERVISOR,
            "Cód. Rubi",
            "Cód. Fil",
            "Nome Filial",
            columns::BRAND,
            "Local",
            columns::REGISTRATION_ID,
            columns::EMPLOYEE_NAME,
            columns::BIRTH_DATE,
            columns::ROLE,
            columns::ADMISSION_DATE,
            columns::TERMINATION_DATE,
            columns::INITIATIVE,
            columns::REASON,
        ];
        let rows = vec![
            vec![
                "Nome Regional 1", "Nome Supervisor 1", "001", "100", "Filial X", "FPP",
                "Local X", "12345", "Nome do Colaborador 1", "15/05/1985", "Gerente",
                "15/01/2020", "15/01/2021", "Inic. Empresa", "Motivo Desligamento X",
            ],
            vec![
                "Nome Regional 2", "Nome Supervisor 2", "215", "534", "Filial Y", "DC",
                "Local Y", "67890", "Nome do Colaborador 2", "16/05/1986", "Supervisor",
                "15/01/2021", "15/01/2022", "Inic. Empregado", "Motivo Desligamento Y",
            ],
        ];
        (headers, rows)
    }
}

/// Positions of the required columns within a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub regional: usize,
    pub supervisor: usize,
    pub brand: usize,
    pub registration_id: usize,
    pub employee_name: usize,
    pub birth_date: usize,
    pub role: usize,
    pub admission_date: usize,
    pub termination_date: usize,
    pub initiative: usize,
    pub reason: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_reordered_headers_with_extras() {
        let mut names = TerminationSchema::required_columns();
        names.reverse();
        names.insert(3, "Nome Filial");
        let index = TerminationSchema::resolve_headers(&headers(&names)).unwrap();
        assert_eq!(index.reason, 0);
        assert_eq!(index.regional, 11);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let mut names: Vec<String> = TerminationSchema::required_columns()
            .iter()
            .map(|c| format!(" {} ", c))
            .collect();
        names[0] = format!("\u{feff}{}", columns::REGIONAL);
        assert!(TerminationSchema::resolve_headers(&names).is_ok());
    }

    #[test]
    fn test_missing_columns_reported() {
        let names: Vec<&str> = TerminationSchema::required_columns()
            .into_iter()
            .filter(|c| *c != columns::BIRTH_DATE && *c != columns::REASON)
            .collect();
        match TerminationSchema::resolve_headers(&headers(&names)) {
            Err(TurnoverError::MissingColumns { missing, required, .. }) => {
                assert_eq!(missing, vec![columns::BIRTH_DATE.to_string(), columns::REASON.to_string()]);
                assert_eq!(required.len(), TerminationSchema::column_count());
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_rows_satisfy_schema() {
        let (names, rows) = TerminationSchema::sample_rows();
        assert!(TerminationSchema::resolve_headers(&headers(&names)).is_ok());
        assert!(rows.iter().all(|r| r.len() == names.len()));
    }
}

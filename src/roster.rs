// src/roster.rs
//! Participant rosters uploaded as `.csv` or `.xlsx`.
//!
//! The first row holds the column names (`Name`, `Email`, `Mobile`, `Company`,
//! `AccessFlag`); every later row becomes one [`ImportRow`]. Only the first
//! worksheet of a workbook is read.

use calamine::{Data, Reader, Xlsx};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Cursor;

use crate::errors::{QuizError, Result};

/// One roster row. Cells may arrive as strings, numbers or booleans.
#[derive(Debug, Default, Deserialize)]
pub struct ImportRow {
    #[serde(rename = "Name", default)]
    pub name: Option<Value>,
    #[serde(rename = "Email", default)]
    pub email: Option<Value>,
    #[serde(rename = "Mobile", default)]
    pub mobile: Option<Value>,
    #[serde(rename = "Company", default)]
    pub company: Option<Value>,
    #[serde(rename = "AccessFlag", default)]
    pub access_flag: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Xlsx,
}

impl RosterFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Some(RosterFormat::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(RosterFormat::Xlsx)
        } else {
            None
        }
    }
}

pub fn parse_roster(format: RosterFormat, bytes: &[u8]) -> Result<Vec<ImportRow>> {
    match format {
        RosterFormat::Csv => parse_csv(bytes),
        RosterFormat::Xlsx => parse_xlsx(bytes),
    }
}

fn import_error(e: impl std::fmt::Display) -> QuizError {
    QuizError::Import(e.to_string())
}

fn to_row(headers: &[String], cells: impl Iterator<Item = Value>) -> Result<ImportRow> {
    let map: Map<String, Value> = headers
        .iter()
        .cloned()
        .zip(cells)
        .filter(|(header, _)| !header.is_empty())
        .collect();
    Ok(serde_json::from_value(Value::Object(map))?)
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(import_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(import_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let cells = record.iter().map(|c| Value::String(c.to_string()));
        rows.push(to_row(&headers, cells)?);
    }
    Ok(rows)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        // Mobile numbers typed into a sheet come back as whole floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Value::from(*f as i64),
        Data::Float(f) => Value::from(*f),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

pub fn parse_xlsx(bytes: &[u8]) -> Result<Vec<ImportRow>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(import_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| QuizError::Import("Workbook has no worksheets".to_string()))?
        .map_err(import_error)?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for cells in sheet_rows {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        rows.push(to_row(&headers, cells.iter().map(cell_value))?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(RosterFormat::from_filename("staff.CSV"), Some(RosterFormat::Csv));
        assert_eq!(RosterFormat::from_filename("staff.xlsx"), Some(RosterFormat::Xlsx));
        assert_eq!(RosterFormat::from_filename("staff.xls"), None);
        assert_eq!(RosterFormat::from_filename("staff"), None);
    }

    #[test]
    fn test_parse_csv_uses_header_row() {
        let text = "\u{feff}Name,Email,Mobile,Company,AccessFlag\n\
                    Asha Rao, asha@example.com ,9876543210,Acme,\n\
                    ,,,,\n\
                    Ravi,ravi@example.com,9123456789,,false\n";
        let rows = parse_csv(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, Some(Value::from("Asha Rao")));
        assert_eq!(rows[0].email, Some(Value::from("asha@example.com")));
        assert_eq!(rows[1].access_flag, Some(Value::from("false")));
    }

    #[test]
    fn test_parse_csv_ignores_unknown_columns() {
        let rows = parse_csv(b"Email,Department\nx@example.com,Ops\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, Some(Value::from("x@example.com")));
        assert_eq!(rows[0].name, None);
    }

    #[test]
    fn test_parse_xlsx_first_sheet() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let headers = ["Name", "Email", "Mobile", "Company", "AccessFlag"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Asha Rao").unwrap();
        sheet.write_string(1, 1, "asha@example.com").unwrap();
        sheet.write_number(1, 2, 9876543210.0).unwrap();
        sheet.write_string(2, 0, "Ravi").unwrap();
        sheet.write_string(2, 1, "ravi@example.com").unwrap();
        sheet.write_string(2, 2, "9123456789").unwrap();
        sheet.write_boolean(2, 4, false).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = parse_xlsx(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mobile, Some(Value::from(9876543210i64)));
        assert_eq!(rows[0].company, None);
        assert_eq!(rows[1].access_flag, Some(Value::Bool(false)));
    }

    #[test]
    fn test_parse_xlsx_rejects_garbage() {
        let err = parse_xlsx(b"Name,Email\n").unwrap_err();
        assert!(matches!(err, QuizError::Import(_)));
    }
}

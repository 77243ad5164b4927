//! Cell conversion
//!
//! Production sheets are filled in by hand, so the same column can hold typed
//! Excel cells in one row and text in the next. These helpers accept every form
//! the sheets are known to contain and report anything else back to the caller
//! as the raw cell text.

use calamine::Data;
use chrono::{Days, NaiveDate};

/// Largest serial Excel can display (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Text formats accepted in the date column, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Convert a date cell. `Ok(None)` means the cell is blank.
pub(crate) fn date_cell(cell: &Data) -> Result<Option<NaiveDate>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|datetime| Some(datetime.date()))
            .ok_or_else(|| describe(cell)),
        Data::Float(serial) => from_serial(*serial).map(Some).ok_or_else(|| describe(cell)),
        Data::Int(serial) => from_serial(*serial as f64)
            .map(Some)
            .ok_or_else(|| describe(cell)),
        Data::DateTimeIso(text) | Data::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_date_text(trimmed).map(Some).ok_or_else(|| describe(cell))
        }
        _ => Err(describe(cell)),
    }
}

/// Convert a measurement cell. Blank cells and Excel error values are `Ok(None)`.
pub(crate) fn number_cell(cell: &Data) -> Result<Option<f64>, String> {
    match cell {
        Data::Empty | Data::Error(_) => Ok(None),
        Data::Float(value) if value.is_finite() => Ok(Some(*value)),
        Data::Int(value) => Ok(Some(*value as f64)),
        Data::String(text) => parse_number_text(text).ok_or_else(|| describe(cell)),
        _ => Err(describe(cell)),
    }
}

/// Text of a header cell, if it is text
pub(crate) fn header_text(cell: &Data) -> Option<&str> {
    match cell {
        Data::String(text) => Some(text.trim()),
        _ => None,
    }
}

/// Raw cell content for error messages
pub(crate) fn describe(cell: &Data) -> String {
    match cell {
        Data::String(v) | Data::DateTimeIso(v) | Data::DurationIso(v) => v.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Day number in the 1900 date system to a calendar date (fraction = time of day, dropped)
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    // "2024-03-04T00:00:00" and "2024-03-04 00:00:00" keep only the date part
    let head = text.split(['T', ' ']).next().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(head, format).ok())
}

/// `Some(None)` for blank text, `Some(Some(v))` for a number, `None` for anything else.
///
/// A comma is the decimal separator when present; dots are then thousands
/// separators ("1.234,5" is 1234.5).
fn parse_number_text(text: &str) -> Option<Option<f64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Some)
}

use crate::error::TabError;
use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use std::fmt::Display;

/// Types of cell data in workbook files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 1/0
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Index into the shared string table, resolved before a cell is stored
    SharedString,
    /// Error literals such as #DIV/0!
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Literals, escapes and bracketed sections (colors, conditions) are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// Converts Excel error codes to their literal.
pub(crate) fn to_error_value(value: u8) -> &'static str {
    match value {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#ERROR!",
    }
}

/// A single decoded cell with its 0-based position.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value as stored in the workbook
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Renders date and time serials as ISO text, anything else verbatim.
    fn render(&self) -> Result<String, TabError> {
        Ok(match self.kind {
            CellType::Boolean => if self.value == "1" { "true" } else { "false" }.to_owned(),
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false)?,
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true)?,
            CellType::NumberDate1900 => to_date_string(&self.value, false)?,
            CellType::NumberDate1904 => to_date_string(&self.value, true)?,
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value)?,
            CellType::IsoDateTime => self.value.replace('T', " "),
            _ => self.value.to_owned(),
        })
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Ok(value) => write!(f, "{}", value),
            Err(error) => {
                tracing::debug!(cell = %self.reference(), %error, "keep raw cell value");
                write!(f, "{}", self.value)
            }
        }
    }
}

/// Converts an Excel date serial to an ISO date string.
/// Serials below 60 are shifted by one day for the Lotus 1-2-3 leap year bug of the 1900 system.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, TabError> {
    let days = value.parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    let date = epoch + Duration::days(days + offset);
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional day of an Excel serial to an ISO time string.
fn to_time_string(value: &str) -> Result<String, TabError> {
    let fraction = value.parse::<f64>()?.fract();
    let mut remainder = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = remainder % 1_000;
    remainder /= 1_000;
    let seconds = remainder % 60;
    remainder /= 60;
    let minutes = remainder % 60;
    let hours = remainder / 60;
    Ok(if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    })
}

/// Converts an Excel date/time serial to an ISO date-time string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, TabError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell { row: 0, col: 0, kind, value: value.to_owned() }
    }

    #[test]
    fn render_dates_and_times() {
        assert_eq!(cell(CellType::NumberDate1900, "45000").to_string(), "2023-03-15");
        assert_eq!(cell(CellType::NumberDate1900, "1").to_string(), "1900-01-01");
        assert_eq!(cell(CellType::NumberDate1904, "0").to_string(), "1904-01-01");
        assert_eq!(cell(CellType::NumberTime1900, "0.5").to_string(), "12:00:00");
        assert_eq!(cell(CellType::NumberDateTime1900, "45000.75").to_string(), "2023-03-15 18:00:00");
        assert_eq!(cell(CellType::IsoDateTime, "2023-03-15T08:00:00").to_string(), "2023-03-15 08:00:00");
    }

    #[test]
    fn render_plain_values() {
        assert_eq!(cell(CellType::Boolean, "1").to_string(), "true");
        assert_eq!(cell(CellType::Number, "3.25").to_string(), "3.25");
        assert_eq!(cell(CellType::InlineString, "text").to_string(), "text");
        assert_eq!(cell(CellType::NumberDate1900, "not a number").to_string(), "not a number");
    }

    #[test]
    fn detect_custom_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", true), CellType::NumberTime1904);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", false), CellType::NumberDateTime1900);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("0.0\"days\"", false), CellType::Number);
        assert_eq!(CellType::parse_builtin_number_format_id("14", false), Some(CellType::NumberDate1900));
        assert_eq!(CellType::parse_builtin_number_format_id("2", false), None);
    }
}

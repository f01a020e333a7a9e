use crate::spreadsheet::reference::index_to_reference;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
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
    /// Shared string table references
    SharedString,
    /// Error values such as #N/A
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
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

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

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// Represents a single cell in a spreadsheet with position, type, and value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value as stored in the sheet
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw cell content to a table value.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<Value, String> {
        match self.kind {
            CellType::Empty => Ok(Value::Null),
            CellType::Boolean => Ok(Value::Bool(self.value.trim() == "1" || self.value.trim().eq_ignore_ascii_case("true"))),
            CellType::Number => self.to_number(),
            CellType::InlineString | CellType::Error => Ok(Value::Text(self.value.to_owned())),
            CellType::SharedString => {
                let index = self.value.trim().parse::<usize>()
                    .map_err(|_| format!("parse '{}' to shared string index failed", self.value))?;
                shared_strings
                    .get(index)
                    .map(|string| Value::Text(string.to_owned()))
                    .ok_or_else(|| format!("shared string '{}' not found", index))
            }
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                let datetime = serial_to_datetime(self.to_double()?, self.kind.is_1904())
                    .ok_or_else(|| format!("parse '{}' to date failed", self.value))?;
                Ok(Value::Date(datetime.date()))
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                serial_to_datetime(self.to_double()?, self.kind.is_1904())
                    .map(Value::DateTime)
                    .ok_or_else(|| format!("parse '{}' to datetime failed", self.value))
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                let serial = self.to_double()?;
                if serial < 1.0 {
                    Ok(Value::Time(fraction_to_time(serial)))
                } else {
                    // Durations over a day keep their date part
                    serial_to_datetime(serial, self.kind.is_1904())
                        .map(Value::DateTime)
                        .ok_or_else(|| format!("parse '{}' to time failed", self.value))
                }
            }
            CellType::IsoDateTime => {
                if self.value.contains('T') {
                    NaiveDateTime::parse_from_str(&self.value, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(Value::DateTime)
                        .map_err(|_| format!("parse '{}' to NaiveDateTime failed", self.value))
                } else {
                    NaiveDate::parse_from_str(&self.value, "%Y-%m-%d")
                        .map(Value::Date)
                        .map_err(|_| format!("parse '{}' to NaiveDate failed", self.value))
                }
            }
        }
    }

    /// Numbers without a decimal point or exponent become integers.
    fn to_number(&self) -> Result<Value, String> {
        let value = self.value.trim();
        if !value.contains(['.', 'e', 'E']) {
            if let Ok(integer) = value.parse::<i64>() {
                return Ok(Value::Int(integer));
            }
        }
        self.to_double().map(Value::Float)
    }

    /// Converts cell value to double-precision floating point.
    fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }
}

/// First day of both Excel epochs, before the Lotus 1-2-3 leap year correction.
fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("NaiveDate Literal")
}

fn midnight() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).expect("NaiveTime Literal")
}

/// Converts an Excel serial number to a datetime.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 epoch.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    epoch().checked_add_signed(Duration::days(days + offset) + Duration::milliseconds(milliseconds))
}

/// Converts a datetime to an Excel serial number in the 1900 epoch.
pub(crate) fn datetime_to_serial(datetime: &NaiveDateTime) -> f64 {
    let elapsed = datetime.signed_duration_since(epoch());
    let mut days = elapsed.num_days();
    if days < 61 {
        days -= 1;
    }
    let milliseconds = (elapsed - Duration::days(elapsed.num_days())).num_milliseconds();
    days as f64 + milliseconds as f64 / 86_400_000f64
}

/// Converts the fractional day part of a serial number to a time of day.
pub(crate) fn fraction_to_time(serial: f64) -> NaiveTime {
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    midnight() + Duration::milliseconds(milliseconds.rem_euclid(86_400_000))
}

/// Converts a time of day to the fractional day used by Excel.
pub(crate) fn time_to_fraction(time: &NaiveTime) -> f64 {
    let milliseconds = time.signed_duration_since(midnight()).num_milliseconds();
    milliseconds as f64 / 86_400_000f64
}

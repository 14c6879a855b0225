use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use thiserror::Error;

use super::model::{Channel, ChannelConfig, RawExport, SeriesPoint};

// ---------------------------------------------------------------------------
// Series extractor – raw export bytes → (temperature, pressure) series
// ---------------------------------------------------------------------------

/// SCADA export timestamp layout (day first, with seconds).
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const TIME_COLUMN: &str = "TimeString";
const VAR_NAME_COLUMN: &str = "VarName";
const VAR_VALUE_COLUMN: &str = "VarValue";

/// Structural problems with one export. Row-level issues (bad timestamp,
/// non-numeric value, unknown variable) are not errors: those rows are
/// dropped and the series just come out sparser.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file extension in '{0}' (expected .csv or .xlsx)")]
    UnsupportedExtension(String),
    #[error("export has no header row")]
    EmptyTable,
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("could not read delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),
    #[error("workbook has no worksheets")]
    NoWorksheet,
}

/// The extractor's durable output for one batch. Both series are sorted
/// ascending by timestamp; either may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub temperature: Vec<SeriesPoint>,
    pub pressure: Vec<SeriesPoint>,
}

/// One parsed table row before channel filtering. Never leaves this module.
struct SensorReading {
    timestamp: NaiveDateTime,
    var_name: String,
    raw_value: RawValue,
}

/// Cell payload of the value column. XLSX cells can already be numeric;
/// delimited text always arrives as a string.
enum RawValue {
    Text(String),
    Number(f64),
}

impl RawValue {
    fn to_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) => Some(*v).filter(|v| v.is_finite()),
            RawValue::Text(s) => parse_value(s),
        }
    }
}

/// Extract the two channel series from one raw export.
///
/// Pure function of (bytes, config): re-extracting the same input always
/// yields identical output. Dispatches on the filename extension:
/// `.csv` is semicolon-delimited text (UTF-8 with Latin-1 fallback),
/// `.xlsx` is read from the first worksheet.
pub fn extract(raw: &RawExport, config: &ChannelConfig) -> Result<Extraction, ExtractError> {
    let ext = raw
        .filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut readings = match ext.as_str() {
        "csv" => read_csv(&raw.bytes)?,
        "xlsx" => read_xlsx(&raw.bytes)?,
        _ => return Err(ExtractError::UnsupportedExtension(raw.filename.clone())),
    };

    // Stable sort: source rows with equal timestamps keep their file order.
    readings.sort_by_key(|r| r.timestamp);

    let mut out = Extraction::default();
    for reading in readings {
        let Some(channel) = config.classify(&reading.var_name) else {
            continue;
        };
        let Some(value) = reading.raw_value.to_f64() else {
            continue;
        };
        let point = SeriesPoint {
            timestamp: reading.timestamp,
            value,
        };
        match channel {
            Channel::Temperature => out.temperature.push(point),
            Channel::Pressure => out.pressure.push(point),
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Delimited text (.csv)
// ---------------------------------------------------------------------------

fn read_csv(bytes: &[u8]) -> Result<Vec<SensorReading>, ExtractError> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true) // tolerate ragged rows
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(ExtractError::EmptyTable);
    }

    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .unwrap_or(0);
    let name_idx = headers
        .iter()
        .position(|h| h == VAR_NAME_COLUMN)
        .ok_or(ExtractError::MissingColumn(VAR_NAME_COLUMN))?;
    let value_idx = headers
        .iter()
        .position(|h| h == VAR_VALUE_COLUMN)
        .ok_or(ExtractError::MissingColumn(VAR_VALUE_COLUMN))?;

    let mut readings = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(timestamp) = record.get(time_idx).and_then(parse_timestamp) else {
            continue;
        };
        readings.push(SensorReading {
            timestamp,
            var_name: record.get(name_idx).unwrap_or("").to_string(),
            raw_value: RawValue::Text(record.get(value_idx).unwrap_or("").to_string()),
        });
    }
    Ok(readings)
}

/// SCADA panels export as Latin-1; newer firmware writes UTF-8. Try UTF-8
/// first, fall back to the byte-per-codepoint Latin-1 mapping.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ---------------------------------------------------------------------------
// Workbook (.xlsx)
// ---------------------------------------------------------------------------

fn read_xlsx(bytes: &[u8]) -> Result<Vec<SensorReading>, ExtractError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExtractError::NoWorksheet)??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(ExtractError::EmptyTable)?
        .iter()
        .map(cell_text)
        .collect();

    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .unwrap_or(0);
    let name_idx = headers
        .iter()
        .position(|h| h == VAR_NAME_COLUMN)
        .ok_or(ExtractError::MissingColumn(VAR_NAME_COLUMN))?;
    let value_idx = headers
        .iter()
        .position(|h| h == VAR_VALUE_COLUMN)
        .ok_or(ExtractError::MissingColumn(VAR_VALUE_COLUMN))?;

    let mut readings = Vec::new();
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let Some(timestamp) = row.get(time_idx).and_then(cell_timestamp) else {
            continue;
        };
        readings.push(SensorReading {
            timestamp,
            var_name: row.get(name_idx).map(cell_text).unwrap_or_default(),
            raw_value: row.get(value_idx).map(cell_value).unwrap_or(RawValue::Text(String::new())),
        });
    }
    Ok(readings)
}

pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Float(v) => RawValue::Number(*v),
        Data::Int(v) => RawValue::Number(*v as f64),
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Empty => RawValue::Text(String::new()),
        other => RawValue::Text(other.to_string()),
    }
}

/// Excel stores timestamps either as typed datetime cells or as the plain
/// text the panel exported. Accept both.
fn cell_timestamp(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::String(s) => parse_timestamp(s),
        Data::Empty => None,
        other => parse_timestamp(&other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

/// Tolerant numeric parse: trims, accepts a single decimal comma when no
/// dot is present (locale-formatted exports), rejects non-finite results.
fn parse_value(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(v) = t.parse::<f64>() {
        return Some(v).filter(|v| v.is_finite());
    }
    if t.matches(',').count() == 1 && !t.contains('.') {
        return t.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(body: &str) -> RawExport {
        let mut text = String::from("VarName;TimeString;VarValue\n");
        text.push_str(body);
        RawExport::new("GPF-12-26.csv", text.into_bytes())
    }

    #[test]
    fn partitions_rows_by_channel_marker() {
        let raw = export(
            "T1.Output_registro;01/03/2025 10:00:00;20.5\n\
             P1.Output_registro;01/03/2025 10:00:00;1.2\n\
             T1.Output_registro;01/03/2025 11:00:00;21.0\n",
        );
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        assert_eq!(ex.temperature.len(), 2);
        assert_eq!(ex.pressure.len(), 1);
        assert_eq!(ex.temperature[0].value, 20.5);
        assert_eq!(ex.pressure[0].value, 1.2);
    }

    #[test]
    fn sorts_out_of_order_rows_by_timestamp() {
        let raw = export(
            "T1.Output_registro;01/03/2025 12:00:00;25.0\n\
             T1.Output_registro;01/03/2025 10:00:00;20.0\n\
             T1.Output_registro;01/03/2025 11:00:00;22.0\n",
        );
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        let values: Vec<f64> = ex.temperature.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![20.0, 22.0, 25.0]);
        assert!(ex
            .temperature
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn drops_non_numeric_values_and_bad_timestamps() {
        let raw = export(
            "T1.Output_registro;01/03/2025 10:00:00;abc\n\
             T1.Output_registro;not a time;20.0\n\
             T1.Output_registro;01/03/2025 11:00:00;21.0\n",
        );
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        assert_eq!(ex.temperature.len(), 1);
        assert_eq!(ex.temperature[0].value, 21.0);
    }

    #[test]
    fn rows_matching_no_marker_are_filtered_silently() {
        let raw = export("pH.Output_registro;01/03/2025 10:00:00;6.5\n");
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        assert!(ex.temperature.is_empty());
        assert!(ex.pressure.is_empty());
    }

    #[test]
    fn accepts_decimal_comma_values() {
        let raw = export("P1.Output_registro;01/03/2025 10:00:00;1,75\n");
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        assert_eq!(ex.pressure[0].value, 1.75);
    }

    #[test]
    fn extraction_is_deterministic() {
        let raw = export(
            "T1.Output_registro;02/03/2025 09:30:00;19.8\n\
             P1.Output_registro;02/03/2025 09:30:00;0.9\n",
        );
        let cfg = ChannelConfig::default();
        assert_eq!(extract(&raw, &cfg).unwrap(), extract(&raw, &cfg).unwrap());
    }

    #[test]
    fn decodes_latin1_bytes() {
        let mut bytes = b"VarName;TimeString;VarValue\n".to_vec();
        // 0xF1 is 'ñ' in Latin-1 and invalid UTF-8 on its own.
        bytes.extend_from_slice(b"Ca\xF1o_T1.Output_registro;01/03/2025 10:00:00;20.0\n");
        let raw = RawExport::new("lote.csv", bytes);
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        assert_eq!(ex.temperature.len(), 1);
    }

    #[test]
    fn missing_var_name_column_is_an_error() {
        let raw = RawExport::new(
            "bad.csv",
            b"TimeString;Other\n01/03/2025 10:00:00;x\n".to_vec(),
        );
        assert!(matches!(
            extract(&raw, &ChannelConfig::default()),
            Err(ExtractError::MissingColumn("VarName"))
        ));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let raw = RawExport::new("notes.txt", b"whatever".to_vec());
        assert!(matches!(
            extract(&raw, &ChannelConfig::default()),
            Err(ExtractError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn falls_back_to_first_column_without_timestring_header() {
        let raw = RawExport::new(
            "lote.csv",
            b"Fecha;VarName;VarValue\n01/03/2025 10:00:00;T1.Output_registro;20.0\n".to_vec(),
        );
        let ex = extract(&raw, &ChannelConfig::default()).unwrap();
        assert_eq!(ex.temperature.len(), 1);
    }
}

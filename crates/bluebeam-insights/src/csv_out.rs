use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::InsightsError;
use crate::model::{AnnotationRecord, COLUMNS};

/// Formats a float the way the exported sheets always have: whole numbers
/// keep one decimal place, and magnitudes below `1e-4` or from `1e16` up use
/// an exponent with at least two digits (`1e-05`, `1.5e+16`).
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if !value.is_finite() {
        return format!("{value}");
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format_exponent(value);
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn format_exponent(value: f64) -> String {
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

fn format_list(values: &[f64]) -> String {
    let items = values
        .iter()
        .map(|value| format_float(*value))
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

fn to_row(record: &AnnotationRecord) -> [String; 8] {
    [
        record.subject.clone(),
        format_list(&record.rect),
        record.contents.clone(),
        format_list(&record.color),
        record.relationship_type.clone(),
        format_optional(record.x_coor),
        format_optional(record.y_coor),
        record.time.clone(),
    ]
}

fn write_records<W: Write>(
    writer: W,
    records: &[AnnotationRecord],
    delimiter: u8,
) -> Result<W, InsightsError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(to_row(record))?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|error| InsightsError::Csv(error.into_error().into()))
}

/// Serializes the whole table, header included, in the fixed column order.
pub fn to_csv(records: &[AnnotationRecord], delimiter: u8) -> Result<Vec<u8>, InsightsError> {
    write_records(Vec::new(), records, delimiter)
}

pub fn write_csv(
    path: &Path,
    records: &[AnnotationRecord],
    delimiter: u8,
) -> Result<(), InsightsError> {
    let file = std::fs::File::create(path)?;
    write_records(file, records, delimiter)?;
    Ok(())
}

fn parse_list(raw: &str, row: usize) -> Result<Vec<f64>, InsightsError> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| InsightsError::MalformedRow {
            row,
            message: format!("expected a bracketed list, got '{raw}'"),
        })?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_float(item, row))
        .collect()
}

fn parse_float(raw: &str, row: usize) -> Result<f64, InsightsError> {
    raw.parse::<f64>().map_err(|_| InsightsError::MalformedRow {
        row,
        message: format!("invalid number '{raw}'"),
    })
}

fn parse_optional(raw: &str, row: usize) -> Result<Option<f64>, InsightsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_float(raw, row).map(Some)
}

/// Reads a previously exported table back into records.
pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<Vec<AnnotationRecord>, InsightsError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?;
    if !headers.iter().eq(COLUMNS) {
        return Err(InsightsError::MalformedRow {
            row: 0,
            message: format!(
                "expected header {}, got {}",
                COLUMNS.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row_number = index + 1;
        let row = row?;
        let field = |column: usize| row.get(column).unwrap_or_default();

        records.push(AnnotationRecord {
            subject: field(0).to_string(),
            rect: parse_list(field(1), row_number)?,
            contents: field(2).to_string(),
            color: parse_list(field(3), row_number)?,
            relationship_type: field(4).to_string(),
            x_coor: parse_optional(field(5), row_number)?,
            y_coor: parse_optional(field(6), row_number)?,
            time: field(7).to_string(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::{format_float, read_csv, to_csv};
    use crate::error::InsightsError;
    use crate::model::AnnotationRecord;

    fn seating() -> AnnotationRecord {
        AnnotationRecord {
            subject: "Ellipse".to_string(),
            rect: vec![0.0, 0.0, 10.0, 10.0],
            contents: "Seating, bench".to_string(),
            color: vec![1.0, 0.5, 0.0],
            relationship_type: String::new(),
            x_coor: Some(5.0),
            y_coor: Some(5.0),
            time: "14:30".to_string(),
        }
    }

    #[test]
    fn writes_header_and_bracketed_lists() {
        let mut no_center = seating();
        no_center.rect.clear();
        no_center.x_coor = None;
        no_center.y_coor = None;

        let bytes = to_csv(&[seating(), no_center], b',').expect("csv should serialize");
        let csv = String::from_utf8(bytes).expect("csv is utf-8");
        let lines = csv.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "Subj,Rect,Contents,Color,RT,x_coor,y_coor,time");
        assert_eq!(
            lines[1],
            r#"Ellipse,"[0.0, 0.0, 10.0, 10.0]","Seating, bench","[1.0, 0.5, 0.0]",,5.0,5.0,14:30"#
        );
        assert_eq!(lines[2], r#"Ellipse,[],"Seating, bench","[1.0, 0.5, 0.0]",,,,14:30"#);
    }

    #[test]
    fn reads_back_what_it_wrote() {
        let records = vec![seating(), seating()];
        let bytes = to_csv(&records, b';').expect("csv should serialize");
        let parsed = read_csv(bytes.as_slice(), b';').expect("csv should parse");
        assert_eq!(parsed, records);
    }

    #[test]
    fn rejects_foreign_headers() {
        let err = read_csv("a,b\n1,2\n".as_bytes(), b',').expect_err("header mismatch");
        assert!(matches!(err, InsightsError::MalformedRow { row: 0, .. }));
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(105.25), "105.25");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(0.0001), "0.0001");
    }

    #[test]
    fn tiny_and_huge_floats_use_exponents() {
        assert_eq!(format_float(1e-05), "1e-05");
        assert_eq!(format_float(-2.5e-7), "-2.5e-07");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e300), "1.5e+300");
        assert_eq!(format_float(1e15), "1000000000000000.0");
    }

    #[test]
    fn exponent_floats_read_back() {
        let mut record = seating();
        record.color = vec![1e-05, 2.5e20];
        let bytes = to_csv(std::slice::from_ref(&record), b',').expect("csv should serialize");
        assert!(String::from_utf8_lossy(&bytes).contains("[1e-05, 2.5e+20]"));

        let records = read_csv(bytes.as_slice(), b',').expect("csv should parse");
        assert_eq!(records, vec![record]);
    }
}

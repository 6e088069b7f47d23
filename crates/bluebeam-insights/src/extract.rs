use std::sync::LazyLock;

use encoding_rs::{DecoderResult, UTF_8};
use regex::Regex;

use crate::ExtractionReport;
use crate::error::InsightsError;
use crate::model::AnnotationRecord;
use crate::options::ExtractOptions;
use crate::time_segment::{TimeSegment, time_from_filename};
use crate::warning::{ExtractWarning, WarningCode};

const CANDIDATE_MARKERS: [&str; 2] = ["PolyLine", "Ellipse"];

struct MarkupPatterns {
    subject: Regex,
    rect: Regex,
    contents: Regex,
    color: Regex,
    relationship: Regex,
    tags: Regex,
}

static PATTERNS: LazyLock<MarkupPatterns> = LazyLock::new(|| MarkupPatterns {
    subject: Regex::new(r"/Subj\((.*?)\)").expect("hardcoded subject regex is valid"),
    rect: Regex::new(r"/Rect\[(.*?)\]").expect("hardcoded rect regex is valid"),
    contents: Regex::new(r"(?s)<p>(.*?)</p>").expect("hardcoded contents regex is valid"),
    color: Regex::new(r"/C\[(.*?)\]").expect("hardcoded color regex is valid"),
    relationship: Regex::new(r"/RT/(.*?)/").expect("hardcoded RT regex is valid"),
    tags: Regex::new(r"<[^>]+>").expect("hardcoded HTML tags regex is valid"),
});

/// Decodes one raw line as UTF-8, dropping invalid bytes instead of failing.
fn decode_line(bytes: &[u8]) -> String {
    let mut decoder = UTF_8.new_decoder_without_bom_handling();
    let mut decoded = String::new();
    let mut input = bytes;
    loop {
        decoded.reserve(
            decoder
                .max_utf8_buffer_length_without_replacement(input.len())
                .unwrap_or(input.len()),
        );
        let (result, read) =
            decoder.decode_to_string_without_replacement(input, &mut decoded, true);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => return decoded,
            DecoderResult::Malformed(..) | DecoderResult::OutputFull => {}
        }
    }
}

fn is_candidate(line: &str) -> bool {
    CANDIDATE_MARKERS.iter().any(|marker| line.contains(marker))
}

fn capture<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
    pattern
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
}

fn parse_floats(field: &str, raw: &str) -> Result<Vec<f64>, String> {
    raw.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{token}' in {field}"))
        })
        .collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Parses a candidate line into a record.
///
/// A missing field yields its empty value; a non-numeric token inside
/// `/Rect[...]` or `/C[...]` rejects the whole line.
pub(crate) fn parse_markup_line(line: &str, time: &str) -> Result<AnnotationRecord, String> {
    let patterns = &*PATTERNS;

    let subject = capture(&patterns.subject, line).unwrap_or_default();
    let rect = capture(&patterns.rect, line)
        .map(|raw| parse_floats("Rect", raw))
        .transpose()?
        .unwrap_or_default();
    let contents = capture(&patterns.contents, line)
        .map(|raw| patterns.tags.replace_all(raw, "").into_owned())
        .unwrap_or_default();
    let color = capture(&patterns.color, line)
        .map(|raw| parse_floats("C", raw))
        .transpose()?
        .unwrap_or_default();
    let relationship_type = capture(&patterns.relationship, line).unwrap_or_default();

    let (rect, x_coor, y_coor) = match rect.as_slice() {
        [x0, y0, x1, y1] => (
            rect.clone(),
            Some(round4((x0 + x1) / 2.0)),
            Some(round4((y0 + y1) / 2.0)),
        ),
        _ => (Vec::new(), None, None),
    };

    Ok(AnnotationRecord {
        subject: subject.to_string(),
        rect,
        contents,
        color,
        relationship_type: relationship_type.to_string(),
        x_coor,
        y_coor,
        time: time.to_string(),
    })
}

/// Extracts every PolyLine and Ellipse markup from one file.
///
/// Lines that fail to parse are skipped and reported; grouped polylines
/// that duplicate a primary annotation are dropped.
pub fn extract(
    bytes: &[u8],
    filename: &str,
    options: &ExtractOptions,
) -> Result<(Vec<AnnotationRecord>, ExtractionReport), InsightsError> {
    let mut report = ExtractionReport {
        file_count: 1,
        ..ExtractionReport::default()
    };

    let time = time_from_filename(filename, options.time_mode)?;
    if time == TimeSegment::Defaulted {
        tracing::warn!(filename, "no 4-character time segment in filename; using 00:00");
        report.warnings.push(
            ExtractWarning::new(
                WarningCode::DefaultedTime,
                "filename has no 4-character time segment; time defaulted to 00:00",
            )
            .with_file(filename),
        );
    }

    let mut candidates = 0_usize;
    let mut records = Vec::new();
    for (index, raw_line) in bytes.split(|byte| *byte == b'\n').enumerate() {
        let line = decode_line(raw_line);
        if !is_candidate(&line) {
            continue;
        }
        candidates += 1;

        match parse_markup_line(&line, time.as_str()) {
            Ok(record) if record.is_grouped_polyline() => report.dropped_duplicates += 1,
            Ok(record) => records.push(record),
            Err(message) => {
                tracing::warn!(filename, line = index + 1, "skipping markup line: {message}");
                report.skipped_lines += 1;
                report.warnings.push(
                    ExtractWarning::new(WarningCode::SkippedLine, message)
                        .with_file(filename)
                        .with_line(index + 1),
                );
            }
        }
    }

    if candidates == 0 {
        report.warnings.push(
            ExtractWarning::new(
                WarningCode::NoAnnotations,
                "no PolyLine or Ellipse markup found",
            )
            .with_file(filename),
        );
    }

    tracing::debug!(
        filename,
        candidates,
        rows = records.len(),
        dropped = report.dropped_duplicates,
        "markup extraction finished"
    );

    report.row_count = records.len();
    Ok((records, report))
}

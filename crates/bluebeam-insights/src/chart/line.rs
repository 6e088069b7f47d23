use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::chart::{centered_text, escape, svg_document};
use crate::color::Rgb;
use crate::model::AnnotationRecord;
use crate::options::Filters;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const LEFT: f64 = 80.0;
const RIGHT: f64 = 30.0;
const TOP: f64 = 60.0;
const BOTTOM: f64 = 110.0;
const LINE_COLOR: Rgb = Rgb::BLUE;

/// Occurrences per selected time, in ascending time order.
#[must_use]
pub fn time_counts(records: &[AnnotationRecord], filters: &Filters) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|record| filters.selects_time(&record.time))
    {
        *counts.entry(record.time.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(time, count)| (time.to_string(), count))
        .collect()
}

fn tick_step(max_count: usize) -> usize {
    max_count.div_ceil(5).max(1)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: usize) -> f64 {
    value as f64
}

fn axes(body: &mut String, y_max: f64, step: usize) {
    let plot_bottom = f64::from(HEIGHT) - BOTTOM;
    let plot_right = f64::from(WIDTH) - RIGHT;
    let plot_height = plot_bottom - TOP;

    let _ = writeln!(
        body,
        r##"  <line x1="{LEFT}" y1="{plot_bottom}" x2="{plot_right}" y2="{plot_bottom}" stroke="#374151" stroke-width="1"/>"##
    );
    let _ = writeln!(
        body,
        r##"  <line x1="{LEFT}" y1="{TOP}" x2="{LEFT}" y2="{plot_bottom}" stroke="#374151" stroke-width="1"/>"##
    );

    let mut tick = 0_usize;
    while as_f64(tick) <= y_max {
        let y = plot_bottom - as_f64(tick) / y_max * plot_height;
        let _ = writeln!(
            body,
            r##"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12" fill="#374151">{tick}</text>"##,
            LEFT - 8.0,
            y + 4.0
        );
        tick += step;
    }

    body.push_str(&centered_text(
        f64::from(WIDTH) / 2.0,
        30.0,
        18,
        "Count of Occurrences Over Time",
    ));
    body.push_str(&centered_text(
        f64::from(WIDTH) / 2.0,
        f64::from(HEIGHT) - 15.0,
        14,
        "Time",
    ));
    let label_y = TOP + plot_height / 2.0;
    let _ = writeln!(
        body,
        r##"  <text x="25" y="{label_y:.1}" text-anchor="middle" font-size="14" fill="#374151" transform="rotate(-90 25 {label_y:.1})">Count</text>"##
    );
}

/// Draws the count of selected rows per time as a connected marker line.
#[must_use]
pub fn render_line(records: &[AnnotationRecord], filters: &Filters) -> String {
    let counts = time_counts(records, filters);
    let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let step = tick_step(max_count);
    let y_max = (as_f64(max_count) * 1.1).max(1.0);

    let mut body = String::new();
    axes(&mut body, y_max, step);

    if counts.is_empty() {
        body.push_str(&centered_text(
            f64::from(WIDTH) / 2.0,
            f64::from(HEIGHT) / 2.0,
            16,
            "No times selected",
        ));
        return svg_document(WIDTH, HEIGHT, &body);
    }

    let plot_bottom = f64::from(HEIGHT) - BOTTOM;
    let plot_width = f64::from(WIDTH) - RIGHT - LEFT;
    let plot_height = plot_bottom - TOP;
    let padding = plot_width * 0.05;
    let spacing = if counts.len() > 1 {
        (plot_width - 2.0 * padding) / as_f64(counts.len() - 1)
    } else {
        0.0
    };

    let positions = counts
        .iter()
        .enumerate()
        .map(|(index, (_, count))| {
            let x = if counts.len() > 1 {
                LEFT + padding + spacing * as_f64(index)
            } else {
                LEFT + plot_width / 2.0
            };
            let y = plot_bottom - as_f64(*count) / y_max * plot_height;
            (x, y)
        })
        .collect::<Vec<_>>();

    let points = positions
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(
        body,
        r#"  <polyline points="{points}" fill="none" stroke="{LINE_COLOR}" stroke-width="2"/>"#
    );

    for ((time, count), (x, y)) in counts.iter().zip(&positions) {
        let _ = writeln!(
            body,
            r#"  <circle cx="{x:.1}" cy="{y:.1}" r="5" fill="{LINE_COLOR}" data-time="{}" data-count="{count}"/>"#,
            escape(time)
        );
        let label_y = plot_bottom + 20.0;
        let _ = writeln!(
            body,
            r##"  <text x="{x:.1}" y="{label_y:.1}" text-anchor="end" font-size="12" fill="#374151" transform="rotate(-45 {x:.1} {label_y:.1})">{}</text>"##,
            escape(time)
        );
    }

    svg_document(WIDTH, HEIGHT, &body)
}

#[cfg(test)]
mod tests {
    use super::{render_line, tick_step, time_counts};
    use crate::model::AnnotationRecord;
    use crate::options::Filters;

    fn at(time: &str) -> AnnotationRecord {
        AnnotationRecord {
            subject: "Ellipse".to_string(),
            rect: Vec::new(),
            contents: "Seating".to_string(),
            color: Vec::new(),
            relationship_type: String::new(),
            x_coor: None,
            y_coor: None,
            time: time.to_string(),
        }
    }

    #[test]
    fn counts_selected_times_in_ascending_order() {
        let records = ["14:30", "09:15", "14:30", "17:00", "09:15", "14:30"]
            .into_iter()
            .map(at)
            .collect::<Vec<_>>();
        let filters = Filters::new(["14:30", "09:15"], Vec::<String>::new());

        assert_eq!(
            time_counts(&records, &filters),
            vec![("09:15".to_string(), 2), ("14:30".to_string(), 3)]
        );
    }

    #[test]
    fn draws_one_marker_per_time() {
        let records = ["10:00", "11:00", "11:00"].into_iter().map(at).collect::<Vec<_>>();
        let filters = Filters::new(["10:00", "11:00"], Vec::<String>::new());
        let svg = render_line(&records, &filters);

        assert!(svg.contains("Count of Occurrences Over Time"));
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains(r#"data-time="11:00" data-count="2""#));
    }

    #[test]
    fn empty_selection_keeps_axes() {
        let svg = render_line(&[at("10:00")], &Filters::default());
        assert!(svg.contains("No times selected"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn tick_step_grows_with_counts() {
        assert_eq!(tick_step(0), 1);
        assert_eq!(tick_step(4), 1);
        assert_eq!(tick_step(23), 5);
    }
}

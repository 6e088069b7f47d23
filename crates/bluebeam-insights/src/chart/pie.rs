use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;

use crate::chart::{centered_text, escape, svg_document};
use crate::color::{ColorMap, Rgb};
use crate::model::AnnotationRecord;
use crate::options::Filters;

const SIZE: u32 = 1000;
const RADIUS: f64 = 380.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
    pub color: Rgb,
}

/// Counts the rows of each selected category, largest first.
///
/// Ties keep the order in which categories first appear in the table.
#[must_use]
pub fn pie_slices(
    records: &[AnnotationRecord],
    filters: &Filters,
    color_map: &ColorMap,
) -> Vec<PieSlice> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for record in records
        .iter()
        .filter(|record| filters.selects_content(&record.contents))
    {
        match counts
            .iter_mut()
            .find(|(label, _)| *label == record.contents)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((record.contents.as_str(), 1)),
        }
    }
    counts.sort_by(|left, right| right.1.cmp(&left.1));

    let total: usize = counts.iter().map(|(_, count)| count).sum();
    counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label: label.to_string(),
            count,
            percent: percent(count, total),
            color: color_map.color_for(label),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}

fn point_at(angle: f64, radius: f64) -> (f64, f64) {
    let center = f64::from(SIZE) / 2.0;
    (center + radius * angle.cos(), center - radius * angle.sin())
}

fn wedge(start: f64, end: f64, color: Rgb) -> String {
    let center = f64::from(SIZE) / 2.0;
    if end - start >= TAU - 1e-9 {
        return format!(
            r##"  <circle cx="{center}" cy="{center}" r="{RADIUS}" fill="{color}" stroke="#fff" stroke-width="1"/>
"##
        );
    }

    let (x1, y1) = point_at(start, RADIUS);
    let (x2, y2) = point_at(end, RADIUS);
    let large_arc = u8::from(end - start > std::f64::consts::PI);
    format!(
        r##"  <path d="M{center},{center} L{x1:.3},{y1:.3} A{RADIUS},{RADIUS} 0 {large_arc},0 {x2:.3},{y2:.3} Z" fill="{color}" stroke="#fff" stroke-width="1"/>
"##
    )
}

/// Draws the category share of the selected contents across all times.
///
/// Slices start at twelve o'clock and run counter-clockwise.
#[must_use]
pub fn render_pie(records: &[AnnotationRecord], filters: &Filters, color_map: &ColorMap) -> String {
    let slices = pie_slices(records, filters, color_map);
    if slices.is_empty() {
        let center = f64::from(SIZE) / 2.0;
        return svg_document(
            SIZE,
            SIZE,
            &centered_text(center, center, 20, "No content categories selected"),
        );
    }

    let mut body = String::new();
    let mut start = FRAC_PI_2;
    for slice in &slices {
        let sweep = slice.percent / 100.0 * TAU;
        let end = start + sweep;
        body.push_str(&wedge(start, end, slice.color));

        let middle = start + sweep / 2.0;
        let (label_x, label_y) = point_at(middle, RADIUS * 1.1);
        let anchor = if middle.cos() < 0.0 { "end" } else { "start" };
        let _ = writeln!(
            body,
            r##"  <text x="{label_x:.1}" y="{label_y:.1}" text-anchor="{anchor}" font-size="18" fill="#374151">{}</text>"##,
            escape(&slice.label)
        );
        let (pct_x, pct_y) = point_at(middle, RADIUS * 0.6);
        body.push_str(&centered_text(
            pct_x,
            pct_y,
            16,
            &format!("{:.1}%", slice.percent),
        ));

        start = end;
    }

    svg_document(SIZE, SIZE, &body)
}

#[cfg(test)]
mod tests {
    use super::{pie_slices, render_pie};
    use crate::color::ColorMap;
    use crate::model::AnnotationRecord;
    use crate::options::Filters;

    fn record(contents: &str) -> AnnotationRecord {
        AnnotationRecord {
            subject: "Ellipse".to_string(),
            rect: Vec::new(),
            contents: contents.to_string(),
            color: Vec::new(),
            relationship_type: String::new(),
            x_coor: None,
            y_coor: None,
            time: "00:00".to_string(),
        }
    }

    fn records() -> Vec<AnnotationRecord> {
        ["Walking", "Seating", "Seating", "Standing", "Seating", "Walking", "Phone"]
            .into_iter()
            .map(record)
            .collect()
    }

    #[test]
    fn slices_are_sorted_by_count_with_stable_ties() {
        let records = records();
        let filters = Filters::new(Vec::<String>::new(), ["Standing", "Walking", "Seating"]);
        let slices = pie_slices(&records, &filters, &ColorMap::default());

        let labels = slices.iter().map(|slice| slice.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Seating", "Walking", "Standing"]);
        assert_eq!(slices[0].count, 3);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let records = records();
        let filters = Filters::new(
            Vec::<String>::new(),
            ["Walking", "Seating", "Standing", "Phone"],
        );
        let slices = pie_slices(&records, &filters, &ColorMap::default());

        let sum: f64 = slices.iter().map(|slice| slice.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9, "sum was {sum}");
    }

    #[test]
    fn renders_labels_and_percentages() {
        let records = records();
        let filters = Filters::new(Vec::<String>::new(), ["Seating", "Phone"]);
        let color_map = ColorMap::from_categories(["Seating", "Phone"]);
        let svg = render_pie(&records, &filters, &color_map);

        assert!(svg.contains(">75.0%<"));
        assert!(svg.contains(">25.0%<"));
        assert!(svg.contains("#1f77b4"));
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn single_category_draws_a_full_disc() {
        let records = records();
        let filters = Filters::new(Vec::<String>::new(), ["Phone"]);
        let svg = render_pie(&records, &filters, &ColorMap::default());

        assert!(svg.contains("<circle"));
        assert!(svg.contains(">100.0%<"));
    }

    #[test]
    fn empty_selection_renders_placeholder() {
        let svg = render_pie(&records(), &Filters::default(), &ColorMap::default());
        assert!(svg.contains("No content categories selected"));
    }
}

use std::fmt::Write as _;

use crate::binning::{Binner, Scale, rescale_points};
use crate::chart::{escape, svg_document};
use crate::color::{ColorMap, Rgb};
use crate::floorplan::Floorplan;
use crate::model::AnnotationRecord;
use crate::options::Filters;

const FIGURE_WIDTH: f64 = 1700.0;
const PLOT_HEIGHT: f64 = 1000.0;
const LEGEND_HEIGHT: f64 = 100.0;
const LEGEND_COLUMNS: usize = 7;
/// Marker sizes are areas in typographic points; the figure is 100 dpi.
const PIXELS_PER_POINT: f64 = 100.0 / 72.0;

/// One circle on the density map, in floorplan pixel space (y up).
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMarker {
    pub category: String,
    pub x: f64,
    pub y: f64,
    pub count: usize,
    pub size: f64,
    pub color: Rgb,
}

impl DensityMarker {
    fn radius(&self) -> f64 {
        self.size.sqrt() / 2.0 * PIXELS_PER_POINT
    }
}

/// Bins the rows matching both filters over a `width` x `height` floorplan.
///
/// Centers are scaled from page points to floorplan pixels first; markers
/// come out grouped by category in filter order.
#[must_use]
pub fn density_markers(
    records: &[AnnotationRecord],
    filters: &Filters,
    color_map: &ColorMap,
    width: u32,
    height: u32,
) -> Vec<DensityMarker> {
    let selected = records
        .iter()
        .filter(|record| filters.selects_time(&record.time) && filters.selects_content(&record.contents));
    let placed = rescale_points(selected, Scale::for_extent(width, height));

    Binner::new(width, height)
        .bin_categories(&placed, filters.contents())
        .into_iter()
        .flat_map(|binned| {
            let color = color_map.color_for(&binned.category);
            binned
                .bins
                .iter()
                .zip(&binned.sizes)
                .map(|(bin, size)| {
                    let (x, y) = bin.center();
                    DensityMarker {
                        category: binned.category.clone(),
                        x,
                        y,
                        count: bin.count,
                        size: *size,
                        color,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn legend(markers: &[DensityMarker]) -> String {
    let mut entries: Vec<(&str, Rgb)> = Vec::new();
    for marker in markers {
        if !entries.iter().any(|(category, _)| *category == marker.category) {
            entries.push((marker.category.as_str(), marker.color));
        }
    }

    let column_width = FIGURE_WIDTH / LEGEND_COLUMNS as f64;
    let used_columns = entries.len().min(LEGEND_COLUMNS);
    let left = (FIGURE_WIDTH - column_width * used_columns as f64) / 2.0;

    let mut out = String::new();
    for (index, (category, color)) in entries.iter().enumerate() {
        let x = left + column_width * (index % LEGEND_COLUMNS) as f64 + 16.0;
        let y = PLOT_HEIGHT + 30.0 + 28.0 * (index / LEGEND_COLUMNS) as f64;
        let _ = writeln!(
            out,
            r##"  <g class="legend-entry"><circle cx="{x:.1}" cy="{y:.1}" r="7" fill="{color}"/><text x="{:.1}" y="{:.1}" font-size="16" fill="#374151">{}</text></g>"##,
            x + 14.0,
            y + 5.0,
            escape(category)
        );
    }
    out
}

/// Draws the density map over the floorplan as an SVG document.
///
/// The floorplan fills the plot area at a fixed extent; one legend entry is
/// drawn per category that produced at least one marker.
#[must_use]
pub fn render_density(
    records: &[AnnotationRecord],
    filters: &Filters,
    color_map: &ColorMap,
    floorplan: &Floorplan,
) -> String {
    let width = f64::from(floorplan.width());
    let height = f64::from(floorplan.height());
    let markers = density_markers(
        records,
        filters,
        color_map,
        floorplan.width(),
        floorplan.height(),
    );

    let scale_x = FIGURE_WIDTH / width.max(1.0);
    let scale_y = PLOT_HEIGHT / height.max(1.0);

    let mut body = String::new();
    let _ = writeln!(
        body,
        r#"  <image x="0" y="0" width="{FIGURE_WIDTH}" height="{PLOT_HEIGHT}" preserveAspectRatio="none" href="{}"/>"#,
        floorplan.data_uri()
    );
    for marker in &markers {
        let _ = writeln!(
            body,
            r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" data-category="{}" data-count="{}"/>"#,
            marker.x * scale_x,
            (height - marker.y) * scale_y,
            marker.radius(),
            marker.color,
            escape(&marker.category),
            marker.count
        );
    }
    body.push_str(&legend(&markers));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let figure_height = (PLOT_HEIGHT + LEGEND_HEIGHT) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let figure_width = FIGURE_WIDTH as u32;
    svg_document(figure_width, figure_height, &body)
}

#[cfg(test)]
mod tests {
    use super::{density_markers, render_density};
    use crate::color::ColorMap;
    use crate::floorplan::{Floorplan, png_fixture};
    use crate::model::AnnotationRecord;
    use crate::options::Filters;

    fn at(contents: &str, time: &str, x: f64, y: f64) -> AnnotationRecord {
        AnnotationRecord {
            subject: "Ellipse".to_string(),
            rect: vec![x, y, x, y],
            contents: contents.to_string(),
            color: Vec::new(),
            relationship_type: String::new(),
            x_coor: Some(x),
            y_coor: Some(y),
            time: time.to_string(),
        }
    }

    fn records() -> Vec<AnnotationRecord> {
        vec![
            at("Seating", "14:30", 100.0, 100.0),
            at("Seating", "14:30", 101.0, 101.0),
            at("Seating", "09:00", 101.0, 101.0),
            at("Standing", "14:30", 300.0, 200.0),
            at("Walking", "14:30", 50.0, 50.0),
        ]
    }

    #[test]
    fn markers_respect_both_filters() {
        let records = records();
        let color_map = ColorMap::from_categories(["Seating", "Standing", "Walking"]);
        let filters = Filters::new(["14:30"], ["Seating", "Standing"]);

        let markers = density_markers(&records, &filters, &color_map, 792, 612);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].category, "Seating");
        assert_eq!(markers[0].count, 2);
        assert_eq!(markers[0].size, 80.0);
        assert_eq!((markers[0].x, markers[0].y), (100.0, 100.0));
        assert_eq!(markers[1].category, "Standing");
        assert_eq!(markers[1].size, 40.0);
        assert_eq!(markers[1].color, color_map.color_for("Standing"));
    }

    #[test]
    fn markers_follow_floorplan_scale() {
        let records = vec![at("Seating", "14:30", 396.0, 306.0)];
        let filters = Filters::new(["14:30"], ["Seating"]);
        let markers = density_markers(&records, &filters, &ColorMap::default(), 1584, 1224);

        // (792, 612) lands in cell (99, 76).
        assert_eq!((markers[0].x, markers[0].y), (796.0, 612.0));
    }

    #[test]
    fn svg_has_one_legend_entry_per_drawn_category() {
        let records = records();
        let floorplan = Floorplan::decode(png_fixture(792, 612)).expect("PNG should decode");
        let filters = Filters::new(["14:30", "09:00"], ["Seating", "Standing", "Missing"]);
        let svg = render_density(
            &records,
            &filters,
            &ColorMap::from_categories(["Seating", "Standing"]),
            &floorplan,
        );

        assert!(svg.contains("data:image/png;base64,"));
        assert_eq!(svg.matches("class=\"legend-entry\"").count(), 2);
        assert!(!svg.contains("Missing"));
    }
}

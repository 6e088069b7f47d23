//! SVG renderers for the three behavior-mapping views.
//!
//! Each renderer is a pure function of the combined table, the current
//! filters and the batch color map. The data steps behind each chart
//! (`density_markers`, `pie_slices`, `time_counts`) are public so other
//! front ends can draw the same numbers their own way.

mod density;
mod line;
mod pie;

pub use density::{DensityMarker, density_markers, render_density};
pub use line::{render_line, time_counts};
pub use pie::{PieSlice, pie_slices, render_pie};

use crate::color::ColorMap;
use crate::floorplan::Floorplan;
use crate::model::CombinedTable;
use crate::options::Filters;
use crate::warning::{ExtractWarning, WarningCode};

pub const MISSING_FLOORPLAN_MESSAGE: &str =
    "Please upload a floorplan to generate the visualization.";

/// The three rendered views of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSet {
    pub density: Option<String>,
    pub pie: String,
    pub line: String,
    pub warnings: Vec<ExtractWarning>,
}

/// Renders every view; the density map is skipped without a floorplan.
#[must_use]
pub fn render_all(
    table: &CombinedTable,
    filters: &Filters,
    color_map: &ColorMap,
    floorplan: Option<&Floorplan>,
) -> ChartSet {
    let records = table.records();
    let mut warnings = Vec::new();

    let density = match floorplan {
        Some(floorplan) => Some(render_density(records, filters, color_map, floorplan)),
        None => {
            tracing::warn!("no floorplan supplied; skipping density map");
            warnings.push(ExtractWarning::new(
                WarningCode::MissingFloorplan,
                MISSING_FLOORPLAN_MESSAGE,
            ));
            None
        }
    };

    ChartSet {
        density,
        pie: render_pie(records, filters, color_map),
        line: render_line(records, filters),
        warnings,
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn svg_document(width: u32, height: u32, body: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" style="background:white">
{body}</svg>
"##
    )
}

pub(crate) fn centered_text(x: f64, y: f64, size: u32, text: &str) -> String {
    format!(
        r##"  <text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="{size}" fill="#374151">{}</text>
"##,
        escape(text)
    )
}

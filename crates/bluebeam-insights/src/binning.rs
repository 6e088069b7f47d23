use std::collections::BTreeMap;

use crate::model::AnnotationRecord;

pub const BIN_SIZE: u32 = 8;
pub const MAX_MARKER_SIZE: f64 = 80.0;

/// Page size, in points, that markup coordinates are assumed to use.
pub const REFERENCE_WIDTH: u32 = 792;
pub const REFERENCE_HEIGHT: u32 = 612;

/// Multipliers from page points to floorplan pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    #[must_use]
    pub fn for_extent(width: u32, height: u32) -> Self {
        Self {
            x: f64::from(width) / f64::from(REFERENCE_WIDTH),
            y: f64::from(height) / f64::from(REFERENCE_HEIGHT),
        }
    }
}

/// A record together with its position in chart space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRecord<'a> {
    pub record: &'a AnnotationRecord,
    pub x: f64,
    pub y: f64,
}

/// Scales record centers into chart space, leaving the records untouched.
///
/// Records without a center are left out.
pub fn rescale_points<'a, I>(records: I, scale: Scale) -> Vec<PlacedRecord<'a>>
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    records
        .into_iter()
        .filter_map(|record| {
            let (x, y) = record.center()?;
            Some(PlacedRecord {
                record,
                x: x * scale.x,
                y: y * scale.y,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinCount {
    pub x_bin: usize,
    pub y_bin: usize,
    pub count: usize,
}

impl BinCount {
    /// Center of the cell in chart space.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        let size = f64::from(BIN_SIZE);
        (
            bin_start(self.x_bin) + size / 2.0,
            bin_start(self.y_bin) + size / 2.0,
        )
    }
}

fn bin_start(index: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let index = index as f64;
    index * f64::from(BIN_SIZE)
}

/// Non-empty bins of one category with their marker sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedCategory {
    pub category: String,
    pub bins: Vec<BinCount>,
    pub sizes: Vec<f64>,
}

impl BinnedCategory {
    #[must_use]
    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }
}

/// Fixed 8-unit grid over `[0, width) x [0, height)`.
///
/// Edges run `0, 8, 16, ...` up to the extent; cells are closed on the left
/// and open on the right, so points on an edge land in the higher cell and
/// points past the last edge land nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binner {
    x_bins: usize,
    y_bins: usize,
}

impl Binner {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x_bins: (width / BIN_SIZE) as usize,
            y_bins: (height / BIN_SIZE) as usize,
        }
    }

    #[must_use]
    pub fn for_page() -> Self {
        Self::new(REFERENCE_WIDTH, REFERENCE_HEIGHT)
    }

    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.x_bins, self.y_bins)
    }

    fn index(value: f64, bins: usize) -> Option<usize> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (value / f64::from(BIN_SIZE)).floor() as usize;
        (index < bins).then_some(index)
    }

    fn cell(&self, point: &PlacedRecord<'_>) -> Option<(usize, usize)> {
        Some((
            Self::index(point.x, self.x_bins)?,
            Self::index(point.y, self.y_bins)?,
        ))
    }

    /// Largest `(category, x_bin, y_bin)` count across all points.
    #[must_use]
    pub fn max_count(&self, points: &[PlacedRecord<'_>]) -> usize {
        let mut counts: BTreeMap<(&str, usize, usize), usize> = BTreeMap::new();
        for point in points {
            if let Some((x_bin, y_bin)) = self.cell(point) {
                *counts
                    .entry((point.record.contents.as_str(), x_bin, y_bin))
                    .or_insert(0) += 1;
            }
        }
        counts.into_values().max().unwrap_or(0)
    }

    /// Bins one category's points; sizes are `count / max_count * 80`.
    #[must_use]
    pub fn bin_points(
        &self,
        points: &[PlacedRecord<'_>],
        category: &str,
        max_count: usize,
    ) -> BinnedCategory {
        let mut counts = BTreeMap::new();
        for point in points.iter().filter(|point| point.record.contents == category) {
            if let Some(cell) = self.cell(point) {
                *counts.entry(cell).or_insert(0_usize) += 1;
            }
        }

        let bins = counts
            .into_iter()
            .map(|((x_bin, y_bin), count)| BinCount {
                x_bin,
                y_bin,
                count,
            })
            .collect::<Vec<_>>();
        let sizes = bins
            .iter()
            .map(|bin| marker_size(bin.count, max_count))
            .collect();

        BinnedCategory {
            category: category.to_string(),
            bins,
            sizes,
        }
    }

    /// Bins each category against one shared maximum so that marker sizes
    /// compare across categories.
    #[must_use]
    pub fn bin_categories(
        &self,
        points: &[PlacedRecord<'_>],
        categories: &[String],
    ) -> Vec<BinnedCategory> {
        let max_count = self.max_count(points);
        categories
            .iter()
            .map(|category| self.bin_points(points, category, max_count))
            .collect()
    }
}

#[allow(clippy::cast_precision_loss)]
fn marker_size(count: usize, max_count: usize) -> f64 {
    if max_count == 0 {
        return 0.0;
    }
    count as f64 / max_count as f64 * MAX_MARKER_SIZE
}

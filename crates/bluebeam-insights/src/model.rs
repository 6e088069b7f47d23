use serde::Serialize;

/// Output column order shared by the CSV writer and reader.
pub const COLUMNS: [&str; 8] = [
    "Subj", "Rect", "Contents", "Color", "RT", "x_coor", "y_coor", "time",
];

/// One markup line that matched a PolyLine or Ellipse annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    pub subject: String,
    /// `[x0, y0, x1, y1]` in PDF points, or empty when the rectangle did not
    /// hold exactly four numbers.
    pub rect: Vec<f64>,
    pub contents: String,
    pub color: Vec<f64>,
    pub relationship_type: String,
    pub x_coor: Option<f64>,
    pub y_coor: Option<f64>,
    pub time: String,
}

impl AnnotationRecord {
    #[must_use]
    pub fn center(&self) -> Option<(f64, f64)> {
        self.x_coor.zip(self.y_coor)
    }

    pub(crate) fn is_grouped_polyline(&self) -> bool {
        self.subject.contains("PolyLine") && self.relationship_type == "Group"
    }
}

/// Every record of one upload batch, in file order then line order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CombinedTable {
    records: Vec<AnnotationRecord>,
}

impl CombinedTable {
    #[must_use]
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Vec<AnnotationRecord>>,
    {
        Self {
            records: tables.into_iter().flatten().collect(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<AnnotationRecord> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct time values in order of first appearance.
    #[must_use]
    pub fn time_options(&self) -> Vec<String> {
        distinct(self.records.iter().map(|record| record.time.as_str()))
    }

    /// Distinct content categories in order of first appearance.
    #[must_use]
    pub fn content_options(&self) -> Vec<String> {
        distinct(self.records.iter().map(|record| record.contents.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{AnnotationRecord, CombinedTable};

    fn record(contents: &str, time: &str) -> AnnotationRecord {
        AnnotationRecord {
            subject: "Ellipse".to_string(),
            rect: Vec::new(),
            contents: contents.to_string(),
            color: Vec::new(),
            relationship_type: String::new(),
            x_coor: None,
            y_coor: None,
            time: time.to_string(),
        }
    }

    #[test]
    fn options_keep_first_appearance_order() {
        let table = CombinedTable::concat([
            vec![record("Standing", "14:30"), record("Seating", "14:30")],
            vec![record("Standing", "09:15")],
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.content_options(), vec!["Standing", "Seating"]);
        assert_eq!(table.time_options(), vec!["14:30", "09:15"]);
    }

    #[test]
    fn grouped_polyline_detection_needs_both_fields() {
        let mut grouped = record("Seating", "00:00");
        grouped.subject = "PolyLine Measurement".to_string();
        grouped.relationship_type = "Group".to_string();
        assert!(grouped.is_grouped_polyline());

        grouped.relationship_type = "R".to_string();
        assert!(!grouped.is_grouped_polyline());
    }
}

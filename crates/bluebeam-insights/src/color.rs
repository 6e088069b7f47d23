use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};

use crate::model::{AnnotationRecord, CombinedTable};

/// The 20-color `tab20` qualitative palette.
const TAB20: [Rgb; 20] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xae, 0xc7, 0xe8),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0xff, 0xbb, 0x78),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0x98, 0xdf, 0x8a),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0xff, 0x98, 0x96),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0xc5, 0xb0, 0xd5),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xc4, 0x9c, 0x94),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0xf7, 0xb6, 0xd2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xc7, 0xc7, 0xc7),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0xdb, 0xdb, 0x8d),
    Rgb(0x17, 0xbe, 0xcf),
    Rgb(0x9e, 0xda, 0xe5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GRAY: Self = Self(0x80, 0x80, 0x80);
    pub const BLUE: Self = Self(0x00, 0x00, 0xff);
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Category to color assignment for one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMap {
    order: Vec<String>,
    colors: HashMap<String, Rgb>,
}

impl ColorMap {
    /// Assigns palette colors to categories in order of first appearance,
    /// cycling once the palette runs out.
    #[must_use]
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::default();
        for category in categories {
            let category = category.into();
            if map.colors.contains_key(&category) {
                continue;
            }
            let color = TAB20[map.order.len() % TAB20.len()];
            map.colors.insert(category.clone(), color);
            map.order.push(category);
        }
        map
    }

    #[must_use]
    pub fn from_records(records: &[AnnotationRecord]) -> Self {
        Self::from_categories(records.iter().map(|record| record.contents.as_str()))
    }

    #[must_use]
    pub fn from_table(table: &CombinedTable) -> Self {
        Self::from_records(table.records())
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<Rgb> {
        self.colors.get(category).copied()
    }

    /// Color for a category, gray when it was never assigned.
    #[must_use]
    pub fn color_for(&self, category: &str) -> Rgb {
        self.get(category).unwrap_or(Rgb::GRAY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.order
            .iter()
            .map(|category| (category.as_str(), self.color_for(category)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

use std::str::FromStr;

use crate::error::InsightsError;
use crate::model::CombinedTable;

/// How a filename without a usable time segment is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeMode {
    /// Fall back to `00:00` and record a warning.
    #[default]
    Lenient,
    /// Reject the file.
    Strict,
}

impl FromStr for TimeMode {
    type Err = InsightsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" | "" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(InsightsError::InvalidOption(format!(
                "unknown time mode '{other}', expected 'lenient' or 'strict'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub time_mode: TimeMode,
    pub delimiter: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            time_mode: TimeMode::Lenient,
            delimiter: b',',
        }
    }
}

/// The time and content selections applied before charting.
///
/// Both lists keep the caller's order; the density legend follows the
/// content order. An empty list selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    times: Vec<String>,
    contents: Vec<String>,
}

impl Filters {
    #[must_use]
    pub fn new<T, C>(times: T, contents: C) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            times: dedup(times.into_iter().map(Into::into)),
            contents: dedup(contents.into_iter().map(Into::into)),
        }
    }

    /// Selects every time and category present in the table.
    #[must_use]
    pub fn all(table: &CombinedTable) -> Self {
        Self {
            times: table.time_options(),
            contents: table.content_options(),
        }
    }

    /// Replaces an empty selection with every value from the table.
    #[must_use]
    pub fn or_all(self, table: &CombinedTable) -> Self {
        Self {
            times: if self.times.is_empty() {
                table.time_options()
            } else {
                self.times
            },
            contents: if self.contents.is_empty() {
                table.content_options()
            } else {
                self.contents
            },
        }
    }

    #[must_use]
    pub fn times(&self) -> &[String] {
        &self.times
    }

    #[must_use]
    pub fn contents(&self) -> &[String] {
        &self.contents
    }

    #[must_use]
    pub fn selects_time(&self, time: &str) -> bool {
        self.times.iter().any(|selected| selected == time)
    }

    #[must_use]
    pub fn selects_content(&self, contents: &str) -> bool {
        self.contents.iter().any(|selected| selected == contents)
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

//! Types for external catalog API responses.

use serde::{Deserialize, Serialize};

/// Title and release year of a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleInfo {
    /// Display title (movie title or series name).
    pub title: String,
    /// Release year (first air year for series).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

impl TitleInfo {
    /// Build from a TMDB style date (YYYY-MM-DD or partial).
    pub fn from_date(title: String, date: Option<&str>) -> Self {
        let year = date
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok());
        Self { title, year }
    }

    /// "{title} {year}", year omitted when unknown.
    pub fn base_query(&self) -> String {
        match self.year {
            Some(year) => format!("{} {}", self.title, year),
            None => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_date() {
        let info = TitleInfo::from_date("The Matrix".to_string(), Some("1999-03-30"));
        assert_eq!(info.year, Some(1999));

        let info = TitleInfo::from_date("Unknown".to_string(), Some(""));
        assert_eq!(info.year, None);

        let info = TitleInfo::from_date("Unknown".to_string(), None);
        assert_eq!(info.year, None);
    }

    #[test]
    fn test_base_query() {
        let with_year = TitleInfo {
            title: "X".to_string(),
            year: Some(2020),
        };
        assert_eq!(with_year.base_query(), "X 2020");

        let without_year = TitleInfo {
            title: "X".to_string(),
            year: None,
        };
        assert_eq!(without_year.base_query(), "X");
    }
}

//! The shop and day the operator is looking at.

use crate::errors::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format used in documents and on the command line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [`Error::InvalidDate`] if the text is not a valid calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate {
        value: raw.to_string(),
    })
}

/// Current shop and day filter.
///
/// Transitions return a new selection; the caller decides when to swap it in
/// and recompute the rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Selected shop
    pub shop: String,
    /// Selected business day
    pub date: NaiveDate,
}

impl Selection {
    /// Builds a selection.
    pub fn new(shop: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            shop: shop.into(),
            date,
        }
    }

    /// Same day, another shop
    #[must_use]
    pub fn with_shop(&self, shop: impl Into<String>) -> Self {
        Self::new(shop, self.date)
    }

    /// Same shop, another day
    #[must_use]
    pub fn with_date(&self, date: NaiveDate) -> Self {
        Self::new(self.shop.clone(), date)
    }

    /// Moves the day by `days`, negative for earlier. Stays put if the
    /// result would leave the calendar.
    #[must_use]
    pub fn shifted(&self, days: i64) -> Self {
        let magnitude = Days::new(days.unsigned_abs());
        let date = if days < 0 {
            self.date.checked_sub_days(magnitude)
        } else {
            self.date.checked_add_days(magnitude)
        };
        self.with_date(date.unwrap_or(self.date))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-03-10").unwrap(), date(2025, 3, 10));
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), date(2024, 2, 29));
        assert!(matches!(
            parse_date("2025-02-30"),
            Err(Error::InvalidDate { .. })
        ));
        assert!(parse_date("10/03/2025").is_err());
    }

    #[test]
    fn test_selection_transitions() {
        let selection = Selection::new("Koswatta", date(2025, 3, 1));
        assert_eq!(selection.shifted(-1).date, date(2025, 2, 28));
        assert_eq!(selection.shifted(31).date, date(2025, 4, 1));
        assert_eq!(selection.shifted(0), selection);

        let moved = selection.with_shop("Arawwala");
        assert_eq!(moved.shop, "Arawwala");
        assert_eq!(moved.date, selection.date);
        assert_eq!(selection.with_date(date(2025, 3, 5)).shop, "Koswatta");
    }
}

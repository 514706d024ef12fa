//! Flow fields and the derived stock arithmetic.
//!
//! Staff enter six quantities per item per day. Everything else about the
//! day (starting stock, sold quantity) is derived from them and from the
//! previous day's remaining stock:
//!
//! ```text
//! starting = previous_day_remaining + morning + evening + extra_in
//! selling  = max(0, starting - remaining - transfer_out - discard)
//! ```

use crate::entities::inventory_entry;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the quantities entered by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowField {
    /// Received in the morning delivery
    MorningTime,
    /// Received in the evening delivery
    EveningTime,
    /// Received outside the scheduled deliveries
    ExtraIn,
    /// Sent to another shop
    TransferOut,
    /// Thrown away
    Discard,
    /// Left at the end of the day
    RemainingInventory,
}

impl FlowField {
    /// Every flow field, in entry-form order
    pub const ALL: [Self; 6] = [
        Self::MorningTime,
        Self::EveningTime,
        Self::ExtraIn,
        Self::RemainingInventory,
        Self::TransferOut,
        Self::Discard,
    ];

    /// Field name as stored in exported documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MorningTime => "morningTime",
            Self::EveningTime => "eveningTime",
            Self::ExtraIn => "extraIn",
            Self::TransferOut => "transferOut",
            Self::Discard => "discard",
            Self::RemainingInventory => "remainingInventory",
        }
    }
}

impl fmt::Display for FlowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "morningTime" | "morning_time" => Ok(Self::MorningTime),
            "eveningTime" | "evening_time" => Ok(Self::EveningTime),
            "extraIn" | "extra_in" => Ok(Self::ExtraIn),
            "transferOut" | "transfer_out" => Ok(Self::TransferOut),
            "discard" => Ok(Self::Discard),
            "remainingInventory" | "remaining_inventory" => Ok(Self::RemainingInventory),
            other => Err(Error::Validation {
                message: format!("Unknown flow field '{other}'"),
            }),
        }
    }
}

/// The six staff-entered quantities of one item on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowFields {
    /// Received in the morning delivery
    pub morning_time: i64,
    /// Received in the evening delivery
    pub evening_time: i64,
    /// Received outside the scheduled deliveries
    pub extra_in: i64,
    /// Sent to another shop
    pub transfer_out: i64,
    /// Thrown away
    pub discard: i64,
    /// Left at the end of the day
    pub remaining_inventory: i64,
}

impl FlowFields {
    /// Value of one field
    #[must_use]
    pub const fn get(&self, field: FlowField) -> i64 {
        match field {
            FlowField::MorningTime => self.morning_time,
            FlowField::EveningTime => self.evening_time,
            FlowField::ExtraIn => self.extra_in,
            FlowField::TransferOut => self.transfer_out,
            FlowField::Discard => self.discard,
            FlowField::RemainingInventory => self.remaining_inventory,
        }
    }

    /// Copy with one field replaced
    #[must_use]
    pub const fn with(mut self, field: FlowField, value: i64) -> Self {
        match field {
            FlowField::MorningTime => self.morning_time = value,
            FlowField::EveningTime => self.evening_time = value,
            FlowField::ExtraIn => self.extra_in = value,
            FlowField::TransferOut => self.transfer_out = value,
            FlowField::Discard => self.discard = value,
            FlowField::RemainingInventory => self.remaining_inventory = value,
        }
        self
    }

    /// True when any field is greater than zero
    #[must_use]
    pub fn has_activity(&self) -> bool {
        FlowField::ALL.iter().any(|field| self.get(*field) > 0)
    }

    /// Total received during the day, excluding carried-over stock
    #[must_use]
    pub const fn received(&self) -> i64 {
        self.morning_time
            .saturating_add(self.evening_time)
            .saturating_add(self.extra_in)
    }

    /// Total leaving the shelf for reasons other than a sale
    #[must_use]
    pub const fn withheld(&self) -> i64 {
        self.remaining_inventory
            .saturating_add(self.transfer_out)
            .saturating_add(self.discard)
    }
}

impl From<&inventory_entry::Model> for FlowFields {
    fn from(entry: &inventory_entry::Model) -> Self {
        Self {
            morning_time: entry.morning_time,
            evening_time: entry.evening_time,
            extra_in: entry.extra_in,
            transfer_out: entry.transfer_out,
            discard: entry.discard,
            remaining_inventory: entry.remaining_inventory,
        }
    }
}

/// Quantities derived from the flows and the previous day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figures {
    /// Remaining stock carried over from the previous day
    pub previous_day_remaining: i64,
    /// Stock available during the day
    pub starting_inventory: i64,
    /// Quantity sold, never negative
    pub selling: i64,
}

/// `previous_day_remaining + morning + evening + extra_in`, never clamped.
#[must_use]
pub const fn starting_inventory(previous_day_remaining: i64, flows: &FlowFields) -> i64 {
    previous_day_remaining.saturating_add(flows.received())
}

/// `max(0, starting - remaining - transfer_out - discard)`.
///
/// Overselling relative to the recorded inputs is absorbed as zero sales.
#[must_use]
pub const fn selling(starting_inventory: i64, flows: &FlowFields) -> i64 {
    let sold = starting_inventory.saturating_sub(flows.withheld());
    if sold > 0 { sold } else { 0 }
}

/// Derives all figures for one item-day.
#[must_use]
pub const fn compute_figures(previous_day_remaining: i64, flows: &FlowFields) -> Figures {
    let starting = starting_inventory(previous_day_remaining, flows);
    Figures {
        previous_day_remaining,
        starting_inventory: starting,
        selling: selling(starting, flows),
    }
}

/// Largest quantity a single field accepts.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Parses a typed quantity.
///
/// Leading whitespace is ignored and the leading run of digits is used, so
/// `"12"`, `" 12 "` and `"12.7"` all give 12. Empty, non-numeric or negative
/// input gives 0; bad input is never an error. Larger values are capped at
/// [`MAX_QUANTITY`].
#[must_use]
pub fn parse_quantity(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];
    if digits.is_empty() {
        return 0;
    }
    // A run of digits only fails to parse when it overflows
    digits
        .parse::<i64>()
        .map_or(MAX_QUANTITY, |value| value.min(MAX_QUANTITY))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn flows(morning: i64, remaining: i64) -> FlowFields {
        FlowFields {
            morning_time: morning,
            remaining_inventory: remaining,
            ..FlowFields::default()
        }
    }

    #[test]
    fn test_parse_quantity_valid() {
        assert_eq!(parse_quantity("50"), 50);
        assert_eq!(parse_quantity("  7 "), 7);
        assert_eq!(parse_quantity("+3"), 3);
        assert_eq!(parse_quantity("12.7"), 12);
        assert_eq!(parse_quantity("0"), 0);
    }

    #[test]
    fn test_parse_quantity_invalid_is_zero() {
        assert_eq!(parse_quantity("abc"), 0);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("   "), 0);
        assert_eq!(parse_quantity("-5"), 0);
    }

    #[test]
    fn test_parse_quantity_is_capped() {
        assert_eq!(parse_quantity("1000000000"), MAX_QUANTITY);
        assert_eq!(parse_quantity("1000000001"), MAX_QUANTITY);
        assert_eq!(parse_quantity("9223372036854775807"), MAX_QUANTITY);
        assert_eq!(parse_quantity("99999999999999999999999"), MAX_QUANTITY);
    }

    #[test]
    fn test_starting_inventory_is_never_clamped() {
        let f = FlowFields {
            morning_time: 50,
            evening_time: 10,
            extra_in: 5,
            ..FlowFields::default()
        };
        assert_eq!(starting_inventory(20, &f), 85);
        assert_eq!(starting_inventory(0, &FlowFields::default()), 0);
    }

    #[test]
    fn test_selling_example_scenario() {
        let figures = compute_figures(20, &flows(50, 10));
        assert_eq!(figures.starting_inventory, 70);
        assert_eq!(figures.selling, 60);
        assert_eq!(figures.previous_day_remaining, 20);
    }

    #[test]
    fn test_selling_is_clamped_at_zero() {
        let f = FlowFields {
            morning_time: 10,
            remaining_inventory: 8,
            transfer_out: 5,
            discard: 2,
            ..FlowFields::default()
        };
        let figures = compute_figures(0, &f);
        assert_eq!(figures.starting_inventory, 10);
        assert_eq!(figures.selling, 0);
    }

    #[test]
    fn test_selling_subtracts_transfer_and_discard() {
        let f = FlowFields {
            morning_time: 40,
            evening_time: 20,
            remaining_inventory: 10,
            transfer_out: 5,
            discard: 3,
            ..FlowFields::default()
        };
        assert_eq!(compute_figures(0, &f).selling, 42);
    }

    #[test]
    fn test_has_activity() {
        assert!(!FlowFields::default().has_activity());
        assert!(FlowFields::default().with(FlowField::Discard, 1).has_activity());
    }

    #[test]
    fn test_flow_field_from_str() {
        assert_eq!(
            "morningTime".parse::<FlowField>().unwrap(),
            FlowField::MorningTime
        );
        assert_eq!(
            "remaining_inventory".parse::<FlowField>().unwrap(),
            FlowField::RemainingInventory
        );
        assert!("selling".parse::<FlowField>().is_err());
    }

    #[test]
    fn test_with_and_get_agree() {
        for (i, field) in FlowField::ALL.iter().enumerate() {
            let value = i64::try_from(i).unwrap() + 1;
            let f = FlowFields::default().with(*field, value);
            assert_eq!(f.get(*field), value);
        }
    }
}

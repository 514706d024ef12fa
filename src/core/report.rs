//! Daily summary report generation.
//!
//! A summary covers one shop on one day: bakery totals, beverage totals,
//! their combined sales and the cash-balance reconciliation. The figures are
//! taken from the derived rows unchanged, so the report always agrees with
//! the inventory sheet.

use crate::core::{
    beverage::{BeverageRow, BeverageSheet},
    derive::{DerivedRow, DerivedSheet},
};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt::Write as _;

/// Totals over the bakery rows of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BakeryTotals {
    /// Rows counted in the totals
    pub item_types: usize,
    /// Stock carried over from the previous day
    pub previous_day_remaining: i64,
    /// Morning deliveries
    pub morning_time: i64,
    /// Evening deliveries
    pub evening_time: i64,
    /// Extra stock received
    pub extra_in: i64,
    /// Stock available during the day
    pub starting_inventory: i64,
    /// Quantity sold
    pub sold: i64,
    /// Stock sent to other shops
    pub transfer_out: i64,
    /// Stock thrown away
    pub discard: i64,
    /// Stock left at the end of the day
    pub remaining: i64,
    /// Sales value of the priced rows
    pub sales_value: Decimal,
}

/// Totals over the beverage rows of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BeverageTotals {
    /// Beverages in the report
    pub beverage_types: usize,
    /// Sum of the previous day's counters
    pub previous_day_count: i64,
    /// Sum of today's counters
    pub today_count: i64,
    /// Quantity sold
    pub sold: i64,
    /// Sales value of the priced beverages
    pub sales_value: Decimal,
}

/// Opening balance plus the day's sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CashBalance {
    /// Cash at the start of the day, entered by the operator
    pub opening: Decimal,
    /// Bakery and beverage sales value
    pub sales: Decimal,
    /// `opening + sales`
    pub closing: Decimal,
}

/// The complete summary of one shop on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    /// Shop the report covers
    pub shop: String,
    /// Day the report covers
    pub date: NaiveDate,
    /// Bakery totals
    pub bakery: BakeryTotals,
    /// Beverage totals
    pub beverages: BeverageTotals,
    /// Bakery plus beverage quantity sold
    pub grand_total_sold: i64,
    /// Bakery plus beverage sales value
    pub grand_total_sales_value: Decimal,
    /// Bakery sold over starting inventory, as a percentage with one decimal
    pub sold_percentage: Decimal,
    /// Cash reconciliation
    pub cash: CashBalance,
    /// Bakery rows with a stored entry or any activity, in catalog order
    pub rows: Vec<DerivedRow>,
    /// Beverage rows
    pub beverage_rows: Vec<BeverageRow>,
    /// Priceless bakery items and beverages with activity
    pub missing_prices: Vec<String>,
}

/// Percentage of `part` in `whole`, rounded to one decimal. 0 when `whole` is 0.
#[must_use]
pub fn percentage(part: i64, whole: i64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn bakery_totals(rows: &[DerivedRow]) -> BakeryTotals {
    rows.iter().fold(
        BakeryTotals {
            item_types: rows.len(),
            ..BakeryTotals::default()
        },
        |mut totals, row| {
            let flows = &row.flows;
            totals.previous_day_remaining = totals
                .previous_day_remaining
                .saturating_add(row.previous_day_remaining);
            totals.morning_time = totals.morning_time.saturating_add(flows.morning_time);
            totals.evening_time = totals.evening_time.saturating_add(flows.evening_time);
            totals.extra_in = totals.extra_in.saturating_add(flows.extra_in);
            totals.starting_inventory = totals
                .starting_inventory
                .saturating_add(row.starting_inventory);
            totals.sold = totals.sold.saturating_add(row.selling);
            totals.transfer_out = totals.transfer_out.saturating_add(flows.transfer_out);
            totals.discard = totals.discard.saturating_add(flows.discard);
            totals.remaining = totals.remaining.saturating_add(flows.remaining_inventory);
            totals.sales_value = totals
                .sales_value
                .saturating_add(row.total_value.unwrap_or_default());
            totals
        },
    )
}

fn beverage_totals(rows: &[BeverageRow]) -> BeverageTotals {
    rows.iter().fold(
        BeverageTotals {
            beverage_types: rows.len(),
            ..BeverageTotals::default()
        },
        |mut totals, row| {
            totals.previous_day_count = totals
                .previous_day_count
                .saturating_add(row.previous_day_count);
            totals.today_count = totals.today_count.saturating_add(row.today_count);
            totals.sold = totals.sold.saturating_add(row.selling);
            totals.sales_value = totals
                .sales_value
                .saturating_add(row.total_value.unwrap_or_default());
            totals
        },
    )
}

/// Builds the summary of a derived sheet and its beverage readings.
#[must_use]
pub fn build_summary(
    sheet: &DerivedSheet,
    beverages: &BeverageSheet,
    opening_balance: Decimal,
) -> SummaryReport {
    let rows: Vec<DerivedRow> = sheet
        .rows
        .iter()
        .filter(|row| row.is_existing || row.has_activity())
        .cloned()
        .collect();

    let bakery = bakery_totals(&rows);
    let beverage = beverage_totals(&beverages.rows);
    let grand_total_sales_value = bakery.sales_value.saturating_add(beverage.sales_value);

    let mut missing_prices = sheet.missing_prices.clone();
    missing_prices.extend(beverages.missing_prices.iter().cloned());

    SummaryReport {
        shop: sheet.shop.clone(),
        date: sheet.date,
        sold_percentage: percentage(bakery.sold, bakery.starting_inventory),
        grand_total_sold: bakery.sold.saturating_add(beverage.sold),
        grand_total_sales_value,
        cash: CashBalance {
            opening: opening_balance,
            sales: grand_total_sales_value,
            closing: opening_balance.saturating_add(grand_total_sales_value),
        },
        bakery,
        beverages: beverage,
        rows,
        beverage_rows: beverages.rows.clone(),
        missing_prices,
    }
}

/// Formats an amount with two decimals, e.g. `Rs. 2700.00`.
#[must_use]
pub fn format_money(currency_label: &str, value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{currency_label} {rounded:.2}")
}

/// Renders the report as plain text.
#[must_use]
pub fn render_summary_text(report: &SummaryReport, currency_label: &str) -> String {
    let money = |value: Decimal| format_money(currency_label, value);
    let bakery = &report.bakery;
    let beverages = &report.beverages;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Daily Summary Report");
    let _ = writeln!(out, "Shop: {}    Date: {}", report.shop, report.date);
    let _ = writeln!(out);

    let _ = writeln!(out, "Cash Balance");
    let _ = writeln!(out, "  Opening Balance: {}", money(report.cash.opening));
    let _ = writeln!(out, "  Bakery Sales Value: {}", money(bakery.sales_value));
    let _ = writeln!(out, "  Beverage Sales Value: {}", money(beverages.sales_value));
    let _ = writeln!(out, "  Total Sales Value: {}", money(report.cash.sales));
    let _ = writeln!(out, "  Closing Balance: {}", money(report.cash.closing));
    let _ = writeln!(out);

    let _ = writeln!(out, "Bakery ({} items)", bakery.item_types);
    let _ = writeln!(out, "  Previous Day Remaining: {}", bakery.previous_day_remaining);
    let _ = writeln!(out, "  Morning Time Added: {}", bakery.morning_time);
    let _ = writeln!(out, "  Evening Time Added: {}", bakery.evening_time);
    let _ = writeln!(out, "  Extra Items In: {}", bakery.extra_in);
    let _ = writeln!(out, "  Total Starting Inventory: {}", bakery.starting_inventory);
    let _ = writeln!(out, "  Total Items Sold: {}", bakery.sold);
    let _ = writeln!(out, "  Total Transfer Out: {}", bakery.transfer_out);
    let _ = writeln!(out, "  Total Discard: {}", bakery.discard);
    let _ = writeln!(out, "  Total Remaining: {}", bakery.remaining);
    let _ = writeln!(out, "  Sales Percentage: {}%", report.sold_percentage);
    let _ = writeln!(out);

    let _ = writeln!(out, "Beverages ({} types)", beverages.beverage_types);
    let _ = writeln!(out, "  Total Previous Day Count: {}", beverages.previous_day_count);
    let _ = writeln!(out, "  Total Today Count: {}", beverages.today_count);
    let _ = writeln!(out, "  Total Beverages Sold: {}", beverages.sold);
    let _ = writeln!(out);

    let _ = writeln!(out, "Grand Total Sold: {}", report.grand_total_sold);
    let _ = writeln!(out, "Grand Total Sales Value: {}", money(report.grand_total_sales_value));

    if !report.rows.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Items");
        for row in &report.rows {
            let value = row
                .total_value
                .map_or_else(|| "no price".to_string(), &money);
            let _ = writeln!(
                out,
                "  {}: start {} sold {} left {} value {}",
                row.item_name(),
                row.starting_inventory,
                row.selling,
                row.flows.remaining_inventory,
                value
            );
        }
    }

    if !report.missing_prices.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Missing prices: {}", report.missing_prices.join(", "));
    }
    out
}

//! Derivation stage: date parts and sales totals.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::analysis::columns;
use crate::config::PipelineConfig;
use crate::table::{Cell, Table};

// %y before %Y: %y consumes exactly two digits, so a four-digit year falls
// through to %Y, while %Y would happily read "19" as year 0019.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%y %H:%M", "%m/%d/%Y %H:%M"];

/// Parse a date in any of the formats the source data uses.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Some(d);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Add derived columns where their prerequisites exist:
///
/// - `Order Date` present: parse each value as a date and add `Month`,
///   `Year` and `Day` (weekday name). Rows whose date fails to parse are
///   dropped, matching the upstream policy of treating them as invalid data.
/// - `Quantity Ordered` and `Price Each` present: add `Total Sales`. Rows
///   where either cell is non-numeric are dropped under the same
///   invalid-data policy; a zero total would silently dilute every
///   downstream KPI and view.
/// - Currency conversion configured: add the converted column.
///
/// Every added column is guarded on absence, so a second pass is a no-op:
/// `derive(derive(t)) == derive(t)`.
pub fn derive(table: &Table, config: &PipelineConfig) -> Table {
    let mut out = table.clone();

    if let Some(date_idx) = out.column_index(columns::ORDER_DATE) {
        let add_month = !out.has_column(columns::MONTH);
        let add_year = !out.has_column(columns::YEAR);
        let add_day = !out.has_column(columns::DAY);

        let mut rows = Vec::with_capacity(out.rows.len());
        for mut row in out.rows {
            let date = match &row[date_idx] {
                Cell::Date(d) => Some(*d),
                Cell::Str(s) => parse_date(s),
                _ => None,
            };
            let Some(date) = date else {
                // Unparseable date: the row is invalid data, not zero-fill
                continue;
            };
            row[date_idx] = Cell::Date(date);
            if add_month {
                row.push(Cell::Int(date.month() as i64));
            }
            if add_year {
                row.push(Cell::Int(date.year() as i64));
            }
            if add_day {
                row.push(Cell::Str(date.format("%A").to_string()));
            }
            rows.push(row);
        }
        out.rows = rows;

        if add_month {
            out.columns.push(columns::MONTH.to_string());
        }
        if add_year {
            out.columns.push(columns::YEAR.to_string());
        }
        if add_day {
            out.columns.push(columns::DAY.to_string());
        }
    }

    let quantity = out.column_index(columns::QUANTITY_ORDERED);
    let price = out.column_index(columns::PRICE_EACH);
    if let (Some(quantity), Some(price)) = (quantity, price) {
        if !out.has_column(columns::TOTAL_SALES) {
            let mut rows = Vec::with_capacity(out.rows.len());
            for mut row in out.rows {
                let (Some(q), Some(p)) = (row[quantity].as_f64(), row[price].as_f64()) else {
                    // Non-numeric quantity or price: invalid data, like an
                    // unparseable date
                    continue;
                };
                row.push(Cell::Float(q * p));
                rows.push(row);
            }
            out.rows = rows;
            out.columns.push(columns::TOTAL_SALES.to_string());
        }
    }

    if let Some(currency) = &config.currency {
        if let Some(total_idx) = out.column_index(columns::TOTAL_SALES) {
            if !out.has_column(&currency.column) {
                for row in &mut out.rows {
                    let converted = row[total_idx].as_f64().unwrap_or(0.0) * currency.rate;
                    row.push(Cell::Float(converted));
                }
                out.columns.push(currency.column.clone());
            }
        }
    }

    out
}

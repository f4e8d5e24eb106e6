//! Filtering stage: user-selected criteria applied as a pure conjunction.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::columns;
use crate::analysis::derive::parse_date;
use crate::table::{Cell, Table};

/// User-selected filter values, passed into the pipeline explicitly.
///
/// Unset options are no-ops, as is any option whose column is absent from
/// the table. The original dashboards kept this state in session-global
/// widgets; here it is a plain value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Retain rows with this `Year` value.
    pub year: Option<i64>,
    /// Retain rows whose `Product` is in this set.
    pub products: Option<BTreeSet<String>>,
    /// Retain rows whose `City` is in this set.
    pub cities: Option<BTreeSet<String>>,
    /// Retain rows with `start <= Order Date <= end`, inclusive.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.products.is_none()
            && self.cities.is_none()
            && self.date_range.is_none()
    }
}

/// Retain the rows matching every set criterion.
///
/// The predicate is a conjunction of independent column tests, so the order
/// filters are applied in cannot affect the result. The date range accepts
/// both derived `Date` cells and raw date strings, so it works on tables
/// that never went through derivation; rows whose `Order Date` is neither
/// are excluded.
pub fn filter(table: &Table, criteria: &FilterCriteria) -> Table {
    let year = criteria
        .year
        .and_then(|y| table.column_index(columns::YEAR).map(|i| (i, y)));
    let products = criteria
        .products
        .as_ref()
        .and_then(|set| table.column_index(columns::PRODUCT).map(|i| (i, set)));
    let cities = criteria
        .cities
        .as_ref()
        .and_then(|set| table.column_index(columns::CITY).map(|i| (i, set)));
    let date_range = criteria
        .date_range
        .and_then(|range| table.column_index(columns::ORDER_DATE).map(|i| (i, range)));

    let mut out = Table::new(table.columns.clone());
    out.rows = table
        .rows
        .iter()
        .filter(|row| {
            if let Some((i, y)) = year {
                if row[i].as_i64() != Some(y) {
                    return false;
                }
            }
            if let Some((i, set)) = products {
                if !in_set(&row[i], set) {
                    return false;
                }
            }
            if let Some((i, set)) = cities {
                if !in_set(&row[i], set) {
                    return false;
                }
            }
            if let Some((i, (start, end))) = date_range {
                // Str cells occur when the table skipped derivation
                let date = match &row[i] {
                    Cell::Date(d) => Some(*d),
                    Cell::Str(s) => parse_date(s),
                    _ => None,
                };
                match date {
                    Some(d) => {
                        if d < start || d > end {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        })
        .cloned()
        .collect();

    out
}

fn in_set(cell: &Cell, set: &BTreeSet<String>) -> bool {
    match cell.as_str() {
        Some(s) => set.contains(s),
        None => set.contains(&cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{clean, derive};
    use crate::config::PipelineConfig;
    use crate::parser::parse_str;

    fn sample() -> Table {
        let raw = parse_str(
            "Order Date,Product,City,Quantity Ordered,Price Each\n\
             2023-06-01,iPhone,Boston,1,699.00\n\
             2024-01-10,USB-C Cable,Austin,2,11.95\n\
             2024-03-05,iPhone,Boston,1,699.00\n\
             2024-07-20,Monitor,Dallas,3,149.99",
            ',',
        )
        .unwrap();
        derive(&clean(&raw), &PipelineConfig::default())
    }

    fn products(names: &[&str]) -> Option<BTreeSet<String>> {
        Some(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_year_filter() {
        let criteria = FilterCriteria {
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(filter(&sample(), &criteria).row_count(), 3);
    }

    #[test]
    fn test_product_filter() {
        let criteria = FilterCriteria {
            products: products(&["iPhone"]),
            ..Default::default()
        };
        assert_eq!(filter(&sample(), &criteria).row_count(), 2);
    }

    #[test]
    fn test_date_range_inclusive() {
        let criteria = FilterCriteria {
            date_range: Some((
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            )),
            ..Default::default()
        };
        // Both boundary rows retained
        assert_eq!(filter(&sample(), &criteria).row_count(), 2);
    }

    #[test]
    fn test_date_range_on_underived_table() {
        // Raw string dates, no derivation pass
        let table = parse_str(
            "Order Date,Product\n2024-01-10,iPhone\n2024-06-01,Monitor\nnot a date,Cable",
            ',',
        )
        .unwrap();
        let criteria = FilterCriteria {
            date_range: Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            )),
            ..Default::default()
        };
        let filtered = filter(&table, &criteria);
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(filtered.rows[0][1], Cell::Str("iPhone".into()));
    }

    #[test]
    fn test_missing_column_is_noop() {
        let table = parse_str("Product\niPhone\nMonitor", ',').unwrap();
        let criteria = FilterCriteria {
            year: Some(2024),
            cities: products(&["Boston"]),
            ..Default::default()
        };
        // Neither Year nor City exists: both filters are no-ops
        assert_eq!(filter(&table, &criteria).row_count(), 2);
    }

    #[test]
    fn test_conjunction() {
        let criteria = FilterCriteria {
            year: Some(2024),
            products: products(&["iPhone"]),
            cities: products(&["Boston"]),
            ..Default::default()
        };
        let filtered = filter(&sample(), &criteria);
        assert_eq!(filtered.row_count(), 1);
        let date = filtered.rows[0][0].as_date().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_commutativity() {
        // Applying the filters one at a time, in any order, matches the
        // single conjunctive application.
        let year_only = FilterCriteria {
            year: Some(2024),
            ..Default::default()
        };
        let product_only = FilterCriteria {
            products: products(&["iPhone"]),
            ..Default::default()
        };
        let both = FilterCriteria {
            year: Some(2024),
            products: products(&["iPhone"]),
            ..Default::default()
        };

        let t = sample();
        let a = filter(&filter(&t, &year_only), &product_only);
        let b = filter(&filter(&t, &product_only), &year_only);
        let c = filter(&t, &both);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let t = sample();
        assert_eq!(filter(&t, &FilterCriteria::default()), t);
        assert!(FilterCriteria::default().is_empty());
    }
}

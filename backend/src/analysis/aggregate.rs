//! Aggregate views, pivot tables and KPI computation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ColumnError, ColumnResult};
use crate::table::{Cell, Table};

/// Cap applied to categorical aggregate views ("top products" style charts).
pub const TOP_N: usize = 10;

/// One entry of an aggregate or pivot view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub key: Cell,
    pub value: f64,
}

/// An ordered aggregate view: grouping key to numeric summary.
pub type AggregateView = Vec<AggregateEntry>;

/// Ordering of an aggregate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOrder {
    /// Ascending by group key; used for temporal dimensions (Month, dates).
    KeyAscending,
    /// Descending by summed value, optionally truncated; used for
    /// categorical dimensions (Product, City).
    ValueDescending { top: Option<usize> },
}

/// Group rows by `group_column` and sum `metric_column` within each group.
///
/// Non-numeric metric cells contribute nothing to the sum. Fails when
/// either column is absent.
pub fn aggregate(
    table: &Table,
    group_column: &str,
    metric_column: &str,
    order: ViewOrder,
) -> ColumnResult<AggregateView> {
    let group_idx = table
        .column_index(group_column)
        .ok_or_else(|| ColumnError::Missing(group_column.to_string()))?;
    let metric_idx = table
        .column_index(metric_column)
        .ok_or_else(|| ColumnError::Missing(metric_column.to_string()))?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: AggregateView = Vec::new();

    for row in &table.rows {
        let value = row[metric_idx].as_f64().unwrap_or(0.0);
        match index.get(&row[group_idx].to_string()) {
            Some(&i) => entries[i].value += value,
            None => {
                index.insert(row[group_idx].to_string(), entries.len());
                entries.push(AggregateEntry {
                    key: row[group_idx].clone(),
                    value,
                });
            }
        }
    }

    match order {
        ViewOrder::KeyAscending => entries.sort_by(|a, b| a.key.compare(&b.key)),
        ViewOrder::ValueDescending { top } => {
            entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
            if let Some(top) = top {
                entries.truncate(top);
            }
        }
    }

    Ok(entries)
}

/// "Sales Over Time": `Total Sales` summed per `Order Date`, ascending.
///
/// Unlike the automatic views, this is part of the explicit-selection API
/// surface and fails when either column is absent.
pub fn daily_sales(table: &Table) -> ColumnResult<AggregateView> {
    aggregate(
        table,
        crate::analysis::columns::ORDER_DATE,
        crate::analysis::columns::TOTAL_SALES,
        ViewOrder::KeyAscending,
    )
}

// =============================================================================
// Pivot
// =============================================================================

/// Aggregation functions available to pivot tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Mean,
    Count,
    Max,
    Min,
}

impl FromStr for AggFunc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(AggFunc::Sum),
            "mean" | "avg" => Ok(AggFunc::Mean),
            "count" => Ok(AggFunc::Count),
            "max" => Ok(AggFunc::Max),
            "min" => Ok(AggFunc::Min),
            other => Err(format!("Unknown aggregation function: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, value: Option<f64>) {
        self.count += 1;
        if let Some(v) = value {
            self.sum += v;
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    fn finish(&self, func: AggFunc) -> f64 {
        match func {
            AggFunc::Sum => self.sum,
            AggFunc::Mean => self.sum / self.count as f64,
            AggFunc::Count => self.count as f64,
            AggFunc::Max => self.max,
            AggFunc::Min => self.min,
        }
    }
}

/// Pivot: group by any column, aggregate any numeric column.
///
/// Groups come out in first-seen order of the group column's distinct
/// values. `Count` ignores `agg_column` and only requires the group column;
/// every other function requires `agg_column` to be numeric throughout.
pub fn pivot(
    table: &Table,
    group_column: &str,
    agg_column: &str,
    func: AggFunc,
) -> ColumnResult<AggregateView> {
    let group_idx = table
        .column_index(group_column)
        .ok_or_else(|| ColumnError::Missing(group_column.to_string()))?;

    let value_idx = if func == AggFunc::Count {
        None
    } else {
        let idx = table
            .column_index(agg_column)
            .ok_or_else(|| ColumnError::Missing(agg_column.to_string()))?;
        if table.numeric_column(idx).is_none() {
            return Err(ColumnError::NotNumeric(agg_column.to_string()));
        }
        Some(idx)
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Cell, Accumulator)> = Vec::new();

    for row in &table.rows {
        let key = row[group_idx].to_string();
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key, groups.len());
                groups.push((row[group_idx].clone(), Accumulator::new()));
                groups.len() - 1
            }
        };
        groups[slot].1.push(value_idx.map(|i| row[i].as_f64().unwrap_or(0.0)));
    }

    Ok(groups
        .into_iter()
        .map(|(key, acc)| AggregateEntry {
            key,
            value: acc.finish(func),
        })
        .collect())
}

// =============================================================================
// KPIs
// =============================================================================

/// The KPI triple shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub total_orders: usize,
    pub avg_order_value: f64,
}

/// Compute KPIs over `sales_column`.
///
/// A missing sales column yields 0 total sales; an empty table yields an
/// average of 0 rather than a division error.
pub fn kpis(table: &Table, sales_column: &str) -> Kpis {
    let total_sales = table
        .column_index(sales_column)
        .map(|i| {
            table
                .rows
                .iter()
                .map(|row| row[i].as_f64().unwrap_or(0.0))
                .sum()
        })
        .unwrap_or(0.0);
    let total_orders = table.row_count();
    let avg_order_value = if total_orders == 0 {
        0.0
    } else {
        total_sales / total_orders as f64
    };

    Kpis {
        total_sales,
        total_orders,
        avg_order_value,
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
             2024-03-01,iPhone,Boston,1,699.00\n\
             2024-01-10,USB-C Cable,Austin,2,11.95\n\
             2024-01-15,iPhone,Boston,1,699.00\n\
             2024-07-20,Monitor,Dallas,3,149.99",
            ',',
        )
        .unwrap();
        derive(&clean(&raw), &PipelineConfig::default())
    }

    #[test]
    fn test_monthly_sales_key_ascending() {
        let view = aggregate(&sample(), "Month", "Total Sales", ViewOrder::KeyAscending).unwrap();
        let months: Vec<i64> = view.iter().map(|e| e.key.as_i64().unwrap()).collect();
        assert_eq!(months, vec![1, 3, 7]);
        assert!((view[0].value - (23.90 + 699.0)).abs() < 1e-9);
    }

    #[test]
    fn test_top_products_value_descending() {
        let view = aggregate(
            &sample(),
            "Product",
            "Quantity Ordered",
            ViewOrder::ValueDescending { top: Some(TOP_N) },
        )
        .unwrap();
        let values: Vec<f64> = view.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![3.0, 2.0, 2.0]);
        for pair in values.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_top_n_cap() {
        let mut csv = String::from("Product,Quantity Ordered\n");
        for i in 0..15 {
            csv.push_str(&format!("P{},{}\n", i, i + 1));
        }
        let table = parse_str(&csv, ',').unwrap();
        let view = aggregate(
            &table,
            "Product",
            "Quantity Ordered",
            ViewOrder::ValueDescending { top: Some(TOP_N) },
        )
        .unwrap();
        assert_eq!(view.len(), TOP_N);
        assert_eq!(view[0].value, 15.0);
    }

    #[test]
    fn test_aggregate_missing_column() {
        let err = aggregate(&sample(), "Region", "Total Sales", ViewOrder::KeyAscending)
            .unwrap_err();
        assert!(matches!(err, ColumnError::Missing(name) if name == "Region"));
    }

    #[test]
    fn test_daily_sales_date_ascending() {
        let view = daily_sales(&sample()).unwrap();
        let dates: Vec<_> = view.iter().map(|e| e.key.as_date().unwrap()).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_daily_sales_missing_column() {
        let table = parse_str("Product\niPhone", ',').unwrap();
        assert!(matches!(
            daily_sales(&table),
            Err(ColumnError::Missing(_))
        ));
    }

    #[test]
    fn test_pivot_first_seen_order() {
        let view = pivot(&sample(), "City", "Total Sales", AggFunc::Sum).unwrap();
        let keys: Vec<String> = view.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["Boston", "Austin", "Dallas"]);
    }

    #[test]
    fn test_pivot_functions() {
        let t = sample();
        let sum = pivot(&t, "Product", "Total Sales", AggFunc::Sum).unwrap();
        let iphone = sum.iter().find(|e| e.key.to_string() == "iPhone").unwrap();
        assert!((iphone.value - 1398.0).abs() < 1e-9);

        let mean = pivot(&t, "Product", "Total Sales", AggFunc::Mean).unwrap();
        let iphone = mean.iter().find(|e| e.key.to_string() == "iPhone").unwrap();
        assert!((iphone.value - 699.0).abs() < 1e-9);

        let count = pivot(&t, "Product", "Total Sales", AggFunc::Count).unwrap();
        let iphone = count.iter().find(|e| e.key.to_string() == "iPhone").unwrap();
        assert_eq!(iphone.value, 2.0);

        let max = pivot(&t, "Month", "Total Sales", AggFunc::Max).unwrap();
        let january = max.iter().find(|e| e.key.as_i64() == Some(1)).unwrap();
        assert!((january.value - 699.0).abs() < 1e-9);

        let min = pivot(&t, "Month", "Total Sales", AggFunc::Min).unwrap();
        let january = min.iter().find(|e| e.key.as_i64() == Some(1)).unwrap();
        assert!((january.value - 23.90).abs() < 1e-9);
    }

    #[test]
    fn test_pivot_count_ignores_agg_column() {
        // Count works even when the agg column does not exist
        let view = pivot(&sample(), "City", "Nonexistent", AggFunc::Count).unwrap();
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_pivot_non_numeric_rejected() {
        let err = pivot(&sample(), "City", "Product", AggFunc::Sum).unwrap_err();
        assert!(matches!(err, ColumnError::NotNumeric(name) if name == "Product"));
    }

    #[test]
    fn test_agg_func_from_str() {
        assert_eq!("mean".parse::<AggFunc>().unwrap(), AggFunc::Mean);
        assert_eq!("SUM".parse::<AggFunc>().unwrap(), AggFunc::Sum);
        assert!("median".parse::<AggFunc>().is_err());
    }

    #[test]
    fn test_kpis_concrete_scenario() {
        let raw = parse_str(
            "Order Date,Product,Quantity Ordered,Price Each,City\n\
             2024-01-10,USB-C Cable,2,11.95,San Francisco\n\
             2024-01-15,iPhone,1,699.00,New York",
            ',',
        )
        .unwrap();
        let table = derive(&clean(&raw), &PipelineConfig::default());

        let k = kpis(&table, "Total Sales");
        assert!((k.total_sales - 722.90).abs() < 1e-9);
        assert_eq!(k.total_orders, 2);
        assert!((k.avg_order_value - 361.45).abs() < 1e-9);
    }

    #[test]
    fn test_kpis_empty_table() {
        let table = Table::new(vec!["Total Sales".into()]);
        let k = kpis(&table, "Total Sales");
        assert_eq!(k.total_sales, 0.0);
        assert_eq!(k.total_orders, 0);
        assert_eq!(k.avg_order_value, 0.0);
    }

    #[test]
    fn test_kpis_missing_column() {
        let table = parse_str("Product\niPhone", ',').unwrap();
        let k = kpis(&table, "Total Sales");
        assert_eq!(k.total_sales, 0.0);
        assert_eq!(k.total_orders, 1);
        assert_eq!(k.avg_order_value, 0.0);
    }
}

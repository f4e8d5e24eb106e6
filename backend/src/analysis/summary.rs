//! Per-column summary statistics and correlations.
//!
//! These back the "Summary Statistics" and "Correlation Heatmap" panels of
//! the dashboard. Both operate on the columns whose every cell is numeric
//! and silently skip the rest.

use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; 0 when fewer than two values.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Pearson correlation matrix over the numeric columns.
///
/// `values[i][j]` correlates `columns[i]` with `columns[j]`; the diagonal is
/// 1.0. Pairs involving a zero-variance column report 0.0 so the matrix
/// stays serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Summarize every numeric column of the table.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .numeric_columns()
        .into_iter()
        .filter_map(|(idx, name)| {
            let values = table.numeric_column(idx)?;
            if values.is_empty() {
                return None;
            }
            let count = values.len();
            let mean = values.iter().sum::<f64>() / count as f64;
            let std = if count < 2 {
                0.0
            } else {
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (count as f64 - 1.0);
                var.sqrt()
            };
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            Some(ColumnSummary {
                column: name.to_string(),
                count,
                mean,
                std,
                min,
                max,
            })
        })
        .collect()
}

/// Pearson correlation over every pair of numeric columns.
pub fn correlation(table: &Table) -> CorrelationMatrix {
    // Without rows every column is vacuously numeric; report nothing
    // rather than a matrix naming text columns
    if table.is_empty() {
        return CorrelationMatrix {
            columns: Vec::new(),
            values: Vec::new(),
        };
    }

    let numeric: Vec<(String, Vec<f64>)> = table
        .numeric_columns()
        .into_iter()
        .filter_map(|(idx, name)| Some((name.to_string(), table.numeric_column(idx)?)))
        .collect();

    let n = numeric.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            values[i][j] = if i == j {
                1.0
            } else {
                pearson(&numeric[i].1, &numeric[j].1)
            };
        }
    }

    CorrelationMatrix {
        columns: numeric.into_iter().map(|(name, _)| name).collect(),
        values,
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        // Zero-variance column
        0.0
    } else {
        cov / denom
    }
}

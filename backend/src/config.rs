//! Pipeline configuration.
//!
//! The upstream dashboards existed in three near-identical variants that
//! differed only in currency handling and copy. Those collapse here into one
//! pipeline parameterized by [`PipelineConfig`]: currency conversion is
//! either off (the default) or a fixed multiplicative rate supplied at
//! startup, never user input.

use serde::{Deserialize, Serialize};

/// Column name used for the converted sales figure unless overridden.
pub const DEFAULT_CURRENCY_COLUMN: &str = "Total Sales (EUR)";

/// Environment variable holding the fixed conversion rate.
pub const FX_RATE_ENV: &str = "SALESBOARD_FX_RATE";

/// Environment variable overriding the converted column name.
pub const FX_COLUMN_ENV: &str = "SALESBOARD_FX_COLUMN";

/// A fixed multiplicative currency conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConversion {
    /// Name of the derived column.
    pub column: String,
    /// Fixed rate applied to `Total Sales`.
    pub rate: f64,
}

/// Configuration for the derivation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Currency conversion, if enabled.
    pub currency: Option<CurrencyConversion>,
}

impl PipelineConfig {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Conversion is enabled only when [`FX_RATE_ENV`] holds a valid number.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let rate = std::env::var(FX_RATE_ENV)
            .ok()
            .and_then(|v| v.parse::<f64>().ok());

        Self {
            currency: rate.map(|rate| CurrencyConversion {
                column: std::env::var(FX_COLUMN_ENV)
                    .unwrap_or_else(|_| DEFAULT_CURRENCY_COLUMN.to_string()),
                rate,
            }),
        }
    }

    /// Configuration with conversion at the given rate into the default
    /// column. Used by the CLI `--rate` flag.
    pub fn with_rate(rate: f64) -> Self {
        Self {
            currency: Some(CurrencyConversion {
                column: DEFAULT_CURRENCY_COLUMN.to_string(),
                rate,
            }),
        }
    }
}

//! Salesboard CLI - exploratory analysis for sales CSV files
//!
//! # Main Commands
//!
//! ```bash
//! salesboard serve                   # Start HTTP server (port 3000)
//! salesboard analyze sales.csv      # Full analysis to JSON
//! salesboard pivot sales.csv --group City --value "Total Sales" --func sum
//! salesboard export sales.csv --year 2024 -o filtered.csv
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! salesboard parse sales.csv        # Just parse CSV to JSON rows
//! ```

use clap::{Parser, Subcommand};
use salesboard::{
    analyze_file, clean, derive, parse_bytes_auto, parse_str, pivot, table_to_csv, view_to_csv,
    AggFunc, FilterCriteria, PipelineConfig,
};
use salesboard::analysis::derive::parse_date;
use salesboard::analysis::filter::filter;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "salesboard")]
#[command(about = "Automatic exploratory analysis for sales CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Retain rows from this year only
    #[arg(long)]
    year: Option<i64>,

    /// Retain these products only (repeatable)
    #[arg(long = "product")]
    products: Vec<String>,

    /// Retain these cities only (repeatable)
    #[arg(long = "city")]
    cities: Vec<String>,

    /// Start of the order date range (inclusive)
    #[arg(long)]
    from: Option<String>,

    /// End of the order date range (inclusive)
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn into_criteria(self) -> Result<FilterCriteria, String> {
        let date_range = match (self.from, self.to) {
            (Some(from), Some(to)) => {
                let from = parse_date(&from).ok_or_else(|| format!("Invalid date: {}", from))?;
                let to = parse_date(&to).ok_or_else(|| format!("Invalid date: {}", to))?;
                Some((from, to))
            }
            (None, None) => None,
            _ => return Err("Date range needs both --from and --to".to_string()),
        };

        Ok(FilterCriteria {
            year: self.year,
            products: non_empty_set(self.products),
            cities: non_empty_set(self.cities),
            date_range,
        })
    }
}

fn non_empty_set(values: Vec<String>) -> Option<BTreeSet<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.into_iter().collect())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full analysis pipeline: clean, derive, filter, views, KPIs
    Analyze {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Currency conversion rate (adds a converted sales column)
        #[arg(long)]
        rate: Option<f64>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pivot table over the cleaned and derived table
    Pivot {
        /// Input CSV file
        input: PathBuf,

        /// Column to group by
        #[arg(long)]
        group: String,

        /// Numeric column to aggregate (ignored by count)
        #[arg(long, default_value = "Total Sales")]
        value: String,

        /// Aggregation function
        #[arg(long, value_enum, default_value = "sum")]
        func: AggFunc,

        /// Write the view as CSV instead of JSON
        #[arg(long)]
        csv: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the cleaned, derived, filtered table as CSV
    Export {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Analyze {
            input,
            filters,
            rate,
            output,
        } => cmd_analyze(&input, filters, rate, output.as_deref()),

        Commands::Pivot {
            input,
            group,
            value,
            func,
            csv,
            output,
        } => cmd_pivot(&input, &group, &value, func, csv, output.as_deref()),

        Commands::Export {
            input,
            filters,
            output,
        } => cmd_export(&input, filters, output.as_deref()),

        Commands::Serve { port } => salesboard::server::start_server(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let bytes = fs::read(input)?;
    let (table, encoding, used_delimiter) = match delimiter {
        Some(d) => {
            let encoding = salesboard::detect_encoding(&bytes);
            let content = salesboard::decode_content(&bytes, &encoding);
            (parse_str(&content, d)?, encoding, d)
        }
        None => {
            let parsed = parse_bytes_auto(&bytes)?;
            (parsed.table, parsed.encoding, parsed.delimiter)
        }
    };

    eprintln!("   Encoding: {}", encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        match used_delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        },
        if delimiter.is_none() {
            " (auto-detected)"
        } else {
            ""
        }
    );
    eprintln!("   Columns: {}", table.columns.join(", "));
    eprintln!("✅ Parsed {} rows", table.row_count());

    let json = serde_json::to_string_pretty(&table.to_objects())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_analyze(
    input: &Path,
    filters: FilterArgs,
    rate: Option<f64>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Analyzing: {}", input.display());

    let criteria = filters.into_criteria()?;
    let config = match rate {
        Some(rate) => PipelineConfig::with_rate(rate),
        None => PipelineConfig::from_env(),
    };

    let result = analyze_file(input, &criteria, &config)?;

    eprintln!("\n📊 KPIs:");
    eprintln!("   Total sales: {:.2}", result.kpis.total_sales);
    eprintln!("   Orders:      {}", result.kpis.total_orders);
    eprintln!("   Avg order:   {:.2}", result.kpis.avg_order_value);

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_pivot(
    input: &Path,
    group: &str,
    value: &str,
    func: AggFunc,
    csv: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Pivoting: {}", input.display());

    let parsed = salesboard::parse_file_auto(input)?;
    let table = derive(&clean(&parsed.table), &PipelineConfig::from_env());
    let view = pivot(&table, group, value, func)?;

    eprintln!("✅ {} groups", view.len());

    if csv {
        let bytes = view_to_csv(&view, group, value)?;
        write_bytes(&bytes, output)?;
    } else {
        let json = serde_json::to_string_pretty(&view)?;
        write_output(&json, output)?;
    }

    Ok(())
}

fn cmd_export(
    input: &Path,
    filters: FilterArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Exporting: {}", input.display());

    let criteria = filters.into_criteria()?;
    let parsed = salesboard::parse_file_auto(input)?;
    let table = filter(
        &derive(&clean(&parsed.table), &PipelineConfig::from_env()),
        &criteria,
    );

    eprintln!("✅ {} rows after filtering", table.row_count());

    let bytes = table_to_csv(&table)?;
    write_bytes(&bytes, output)?;

    Ok(())
}

/// Write text to a file, or stdout when no path is given.
fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("💾 Saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Write raw bytes to a file, or stdout when no path is given.
fn write_bytes(bytes: &[u8], output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, bytes)?;
            eprintln!("💾 Saved to: {}", path.display());
        }
        None => print!("{}", String::from_utf8_lossy(bytes)),
    }
    Ok(())
}

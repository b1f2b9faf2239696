//! Command-line interface definitions and argument parsing

use chrono::NaiveDate;
use clap::Parser;

use crate::aggregate::DEFAULT_TOP_N;
use crate::data::parse_date;

/// E-commerce sales dashboard: top-N breakdowns and RFM customer segmentation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "dashboard/main_data.csv")]
    pub input: String,

    /// First purchase date to include (YYYY-MM-DD); defaults to the earliest in the data
    #[arg(long)]
    pub from: Option<String>,

    /// Last purchase date to include (YYYY-MM-DD); defaults to the latest in the data
    #[arg(long)]
    pub to: Option<String>,

    /// Number of rows kept by each top-N breakdown
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    /// Directory where PNG charts are written
    #[arg(short, long, default_value = "charts")]
    pub output_dir: String,

    /// Rows shown in the sample data preview (0 to skip)
    #[arg(long, default_value = "10")]
    pub sample_rows: usize,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the optional `--from` / `--to` dates
    pub fn parse_date_range(&self) -> crate::Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let from = self.from.as_deref().map(parse_date).transpose()?;
        let to = self.to.as_deref().map(parse_date).transpose()?;

        if let (Some(start), Some(end)) = (from, to) {
            if start > end {
                anyhow::bail!("--from ({}) must not be after --to ({})", start, end);
            }
        }

        Ok((from, to))
    }
}

//! olist-rfm: E-commerce dashboard CLI
//!
//! Loads the dataset, applies the purchase-date range, prints every
//! breakdown and the RFM segmentation, then renders the charts.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use olist_rfm::{viz, Args, DashboardReport, Dataset, DateRange};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        println!("olist-rfm - E-Commerce Sales Dashboard");
        println!("======================================\n");
    }

    let start_time = Instant::now();
    let (from, to) = args.parse_date_range()?;

    // Step 1: Load data
    let dataset = Dataset::load(&args.input)?;
    println!("✓ Data loaded: {} records from {}", dataset.len(), args.input);

    // Step 2: Resolve and apply the date range
    let Some(bounds) = dataset.date_bounds()? else {
        println!("No valid dates found in order_purchase_timestamp column.");
        return Ok(());
    };
    let range = DateRange::resolve(from, to, bounds)?;
    if args.verbose {
        println!("  Available dates: {} to {}", bounds.0, bounds.1);
        println!("  Selected range:  {}", range);
    }

    let filtered = dataset.filter_by_date(&range)?;
    println!("Filtered data: {} records", filtered.len());

    if filtered.is_empty() {
        warn!("Date range {} matched no records", range);
        println!("No data available for the selected date range. Please adjust your filters.");
        return Ok(());
    }

    // Step 3: Aggregate
    let report_start = Instant::now();
    let report = DashboardReport::build(&filtered, args.top)?;
    info!(
        "Aggregation finished in {:.2}s",
        report_start.elapsed().as_secs_f64()
    );

    println!();
    report.print_summary();

    // Step 4: Charts
    if !args.no_charts {
        let written = viz::generate_dashboard_charts(&report, Path::new(&args.output_dir))?;
        println!("\n✓ {} charts written to {}", written.len(), args.output_dir);
        if args.verbose {
            for path in &written {
                println!("  {}", path.display());
            }
        }
    }

    // Step 5: Sample rows
    if args.sample_rows > 0 {
        println!("\n=== Sample Data ===");
        println!("{}", filtered.sample(args.sample_rows)?);
    }

    println!(
        "\nTotal processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// `RUST_LOG` wins; otherwise warn, or debug with `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

//! olist-rfm: sales analytics over the Olist e-commerce public dataset
//!
//! Loads order/customer/product/payment rows from CSV, filters them by
//! purchase date, and produces top-N breakdowns plus an RFM (Recency,
//! Frequency, Monetary) customer segmentation rendered as charts.

pub mod aggregate;
pub mod cli;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod labels;
pub mod rfm;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{Breakdown, Ranking, RankedRow};
pub use cli::Args;
pub use dashboard::DashboardReport;
pub use data::{DateRange, Dataset};
pub use error::DataError;
pub use rfm::{calculate_rfm, score_metric, CustomerSegment, OrderRecord, RfmProfile, RfmTable};
pub use viz::generate_dashboard_charts;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;

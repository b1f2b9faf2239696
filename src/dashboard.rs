//! Dashboard report: every breakdown plus the RFM table for one date range

use log::debug;

use crate::aggregate::{
    self, Ranking, PAYMENT_COUNTS, PAYMENT_REVENUE, TOP_CATEGORIES_BY_ORDERS,
    TOP_CATEGORIES_BY_REVENUE, TOP_CITIES, TOP_STATES,
};
use crate::data::Dataset;
use crate::error::DataResult;
use crate::rfm::{calculate_rfm, RfmTable};

/// Bar direction of a ranking chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarOrientation {
    /// Labels on the y axis
    Horizontal,
    /// Labels on the x axis, rotated
    Vertical,
}

/// A ranking together with how it is presented
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    pub section: &'static str,
    pub title: &'static str,
    pub ranking: &'a Ranking,
    pub file_name: &'static str,
    pub orientation: BarOrientation,
    pub empty_notice: &'static str,
}

/// All aggregates computed from one filtered dataset
#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub record_count: usize,
    pub top_n: usize,
    pub top_cities: Ranking,
    pub top_states: Ranking,
    pub top_categories_by_orders: Ranking,
    pub top_categories_by_revenue: Ranking,
    pub payment_counts: Ranking,
    pub payment_revenue: Ranking,
    pub rfm: RfmTable,
}

impl DashboardReport {
    /// Recompute every breakdown and the RFM table from `dataset`
    pub fn build(dataset: &Dataset, top_n: usize) -> DataResult<Self> {
        let report = Self {
            record_count: dataset.len(),
            top_n,
            top_cities: TOP_CITIES.top_n(dataset, top_n)?,
            top_states: TOP_STATES.top_n(dataset, top_n)?,
            top_categories_by_orders: TOP_CATEGORIES_BY_ORDERS.top_n(dataset, top_n)?,
            top_categories_by_revenue: TOP_CATEGORIES_BY_REVENUE.top_n(dataset, top_n)?,
            payment_counts: PAYMENT_COUNTS.top_n(dataset, top_n)?,
            payment_revenue: PAYMENT_REVENUE.top_n(dataset, top_n)?,
            rfm: calculate_rfm(&dataset.order_records()?),
        };
        debug!(
            "Built report over {} records ({} RFM customers)",
            report.record_count,
            report.rfm.len()
        );
        Ok(report)
    }

    /// The six rankings in dashboard order
    pub fn panels(&self) -> [Panel<'_>; 6] {
        [
            Panel {
                section: "Top Locations by Customer Count",
                title: "Top Cities by Customer Count",
                ranking: &self.top_cities,
                file_name: "top_cities.png",
                orientation: BarOrientation::Horizontal,
                empty_notice: "No city data available for the selected period.",
            },
            Panel {
                section: "Top Locations by Customer Count",
                title: "Top States by Customer Count",
                ranking: &self.top_states,
                file_name: "top_states.png",
                orientation: BarOrientation::Horizontal,
                empty_notice: "No state data available for the selected period.",
            },
            Panel {
                section: "Top Products by Orders and Revenue",
                title: "Top Product Categories by Orders",
                ranking: &self.top_categories_by_orders,
                file_name: "top_categories_orders.png",
                orientation: BarOrientation::Horizontal,
                empty_notice: "No product order data available for the selected period.",
            },
            Panel {
                section: "Top Products by Orders and Revenue",
                title: "Top Product Categories by Revenue",
                ranking: &self.top_categories_by_revenue,
                file_name: "top_categories_revenue.png",
                orientation: BarOrientation::Horizontal,
                empty_notice: "No product revenue data available for the selected period.",
            },
            Panel {
                section: "Payment Methods Analysis",
                title: "Top Payment Methods by Usage",
                ranking: &self.payment_counts,
                file_name: "payment_counts.png",
                orientation: BarOrientation::Vertical,
                empty_notice: "No payment usage data available for the selected period.",
            },
            Panel {
                section: "Payment Methods Analysis",
                title: "Top Payment Methods by Revenue",
                ranking: &self.payment_revenue,
                file_name: "payment_revenue.png",
                orientation: BarOrientation::Vertical,
                empty_notice: "No payment revenue data available for the selected period.",
            },
        ]
    }

    /// Print every section to stdout
    pub fn print_summary(&self) {
        println!("=== E-Commerce Public Dataset ===");
        println!("Records in range: {}", self.record_count);

        let mut current_section = "";
        for panel in self.panels() {
            if panel.section != current_section {
                println!("\n=== {} ===", panel.section);
                current_section = panel.section;
            }
            print_ranking(&panel);
        }

        self.print_rfm();
    }

    fn print_rfm(&self) {
        let (Some(reference_date), Some(scoring)) = (self.rfm.reference_date, self.rfm.scoring) else {
            println!("\nInsufficient data to perform RFM analysis for the selected period.");
            return;
        };

        println!("\n=== RFM Analysis ===");
        println!("Customers: {}", self.rfm.len());
        println!("Reference date: {}", reference_date);
        println!("Recency scoring:   {}", scoring.recency);
        println!("Frequency scoring: {}", scoring.frequency);
        println!("Monetary scoring:  {}", scoring.monetary);

        let n = self.rfm.len() as f64;
        println!(
            "Averages: Recency {:.1} days, Frequency {:.2} orders, Monetary R$ {:.2}",
            self.rfm.recency_values().iter().sum::<f64>() / n,
            self.rfm.frequency_values().iter().sum::<f64>() / n,
            self.rfm.monetary_values().iter().sum::<f64>() / n,
        );

        println!("\n=== Customer Segments by RFM Score ===");
        for (segment, count) in self.rfm.segment_counts() {
            let percentage = (count as f64 / n) * 100.0;
            println!("  {:<20} {:>8} ({:.1}%)", segment.label(), count, percentage);
        }
    }
}

fn print_ranking(panel: &Panel<'_>) {
    let ranking = panel.ranking;
    println!("\n{}", panel.title);
    if ranking.is_empty() {
        println!("  {}", panel.empty_notice);
        return;
    }

    println!("  {:<36} | {:>20}", ranking.label_header, ranking.measure_header);
    println!("  {:-<36}-|-{:->20}", "", "");
    for row in &ranking.rows {
        println!("  {:<36} | {:>20}", row.label, format_measure(ranking, row.value));
    }
}

/// Revenue with two decimals, counts as whole numbers
pub fn format_measure(ranking: &Ranking, value: f64) -> String {
    if ranking.measure_header == aggregate::TOP_CATEGORIES_BY_REVENUE.measure_header {
        format!("{:.2}", value)
    } else {
        format!("{:.0}", value)
    }
}

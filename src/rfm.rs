//! RFM (Recency, Frequency, Monetary) customer segmentation
//!
//! Orders are rolled up per customer, each metric is quantile-binned into a
//! 1-5 score, and the summed score places the customer in one of four tiers.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use log::{debug, warn};

/// Column names of the RFM table, in display order
pub const RFM_COLUMNS: [&str; 9] = [
    "Recency",
    "Frequency",
    "Monetary",
    "R_Score",
    "F_Score",
    "M_Score",
    "RFM_Segment",
    "RFM_Score",
    "Customer_Segment",
];

/// Score given to every customer when a metric cannot be binned
pub const NEUTRAL_SCORE: u8 = 3;

const PERCENTILES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// One order line as seen by the segmentation engine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderRecord {
    pub customer_id: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub order_id: Option<String>,
    pub payment: Option<f64>,
}

impl OrderRecord {
    pub fn new(customer_id: &str, purchase_date: NaiveDate, order_id: &str, payment: f64) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            purchase_date: Some(purchase_date),
            order_id: Some(order_id.to_string()),
            payment: Some(payment),
        }
    }
}

/// Loyalty tier derived from the summed RFM score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CustomerSegment {
    LostCustomer,
    AtRisk,
    PotentialLoyalist,
    LoyalCustomer,
}

impl CustomerSegment {
    /// Most valuable tier first
    pub const DISPLAY_ORDER: [CustomerSegment; 4] = [
        CustomerSegment::LoyalCustomer,
        CustomerSegment::PotentialLoyalist,
        CustomerSegment::AtRisk,
        CustomerSegment::LostCustomer,
    ];

    /// Thresholds are inclusive upper bounds: 5, 8, 11, then everything above.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=5 => CustomerSegment::LostCustomer,
            6..=8 => CustomerSegment::AtRisk,
            9..=11 => CustomerSegment::PotentialLoyalist,
            _ => CustomerSegment::LoyalCustomer,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerSegment::LostCustomer => "Lost Customer",
            CustomerSegment::AtRisk => "At Risk",
            CustomerSegment::PotentialLoyalist => "Potential Loyalist",
            CustomerSegment::LoyalCustomer => "Loyal Customer",
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three scored metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl Metric {
    /// Labels assigned to the bins in ascending value order
    pub fn labels(self) -> [u8; 5] {
        match self {
            // Recent buyers score best
            Metric::Recency => [5, 4, 3, 2, 1],
            Metric::Frequency | Metric::Monetary => [1, 2, 3, 4, 5],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Recency => "Recency",
            Metric::Frequency => "Frequency",
            Metric::Monetary => "Monetary",
        }
    }
}

/// Why a metric fell back to the neutral score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeutralReason {
    /// Every customer has the same value
    ConstantMetric,
    /// Fallback edges still collapse onto each other
    DegenerateEdges,
    /// Quintile edges collapsed, leaving fewer bins than labels
    DuplicateEdges,
    /// NaN or infinite input
    NonFinite,
}

impl fmt::Display for NeutralReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NeutralReason::ConstantMetric => "constant metric",
            NeutralReason::DegenerateEdges => "degenerate bin edges",
            NeutralReason::DuplicateEdges => "duplicate quintile edges",
            NeutralReason::NonFinite => "non-finite values",
        };
        f.write_str(text)
    }
}

/// Result of scoring one metric across all customers
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// Five equal-population bins
    Quantile(Vec<u8>),
    /// Percentile bins over fewer than five distinct values
    Fallback(Vec<u8>),
    /// Binning was not possible; every customer gets [`NEUTRAL_SCORE`]
    Neutral(NeutralReason),
}

impl ScoreOutcome {
    /// Per-customer scores, expanding the neutral case to `len` entries
    pub fn into_scores(self, len: usize) -> Vec<u8> {
        match self {
            ScoreOutcome::Quantile(scores) | ScoreOutcome::Fallback(scores) => scores,
            ScoreOutcome::Neutral(_) => vec![NEUTRAL_SCORE; len],
        }
    }

    pub fn path(&self) -> ScoringPath {
        match self {
            ScoreOutcome::Quantile(_) => ScoringPath::Quantile,
            ScoreOutcome::Fallback(_) => ScoringPath::Fallback,
            ScoreOutcome::Neutral(reason) => ScoringPath::Neutral(*reason),
        }
    }
}

/// Which branch of the scoring policy a metric went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPath {
    Quantile,
    Fallback,
    Neutral(NeutralReason),
}

impl fmt::Display for ScoringPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringPath::Quantile => f.write_str("quintile bins"),
            ScoringPath::Fallback => f.write_str("percentile fallback bins"),
            ScoringPath::Neutral(reason) => write!(f, "neutral score ({})", reason),
        }
    }
}

/// Scoring path taken by each metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringSummary {
    pub recency: ScoringPath,
    pub frequency: ScoringPath,
    pub monetary: ScoringPath,
}

/// Per-customer RFM metrics, scores and tier
#[derive(Debug, Clone, PartialEq)]
pub struct RfmProfile {
    pub customer_id: String,
    /// Days between the reference date and the latest purchase
    pub recency: i64,
    /// Distinct orders
    pub frequency: usize,
    /// Total payments
    pub monetary: f64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    /// Score digits concatenated in R, F, M order, e.g. "543"
    pub rfm_segment: String,
    pub rfm_score: u8,
    pub customer_segment: CustomerSegment,
}

/// RFM profiles for every valid customer, ordered by customer id
#[derive(Debug, Clone, PartialEq)]
pub struct RfmTable {
    pub profiles: Vec<RfmProfile>,
    /// Latest purchase date among valid records
    pub reference_date: Option<NaiveDate>,
    /// `None` when there were no valid records to score
    pub scoring: Option<ScoringSummary>,
}

impl RfmTable {
    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
            reference_date: None,
            scoring: None,
        }
    }

    /// Column schema, present regardless of row count
    pub fn columns(&self) -> &'static [&'static str] {
        &RFM_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn recency_values(&self) -> Vec<f64> {
        self.profiles.iter().map(|p| p.recency as f64).collect()
    }

    pub fn frequency_values(&self) -> Vec<f64> {
        self.profiles.iter().map(|p| p.frequency as f64).collect()
    }

    pub fn monetary_values(&self) -> Vec<f64> {
        self.profiles.iter().map(|p| p.monetary).collect()
    }

    /// Customer count per tier in [`CustomerSegment::DISPLAY_ORDER`], zeros included
    pub fn segment_counts(&self) -> Vec<(CustomerSegment, usize)> {
        CustomerSegment::DISPLAY_ORDER
            .iter()
            .map(|&segment| {
                let count = self
                    .profiles
                    .iter()
                    .filter(|p| p.customer_segment == segment)
                    .count();
                (segment, count)
            })
            .collect()
    }

    pub fn profile(&self, customer_id: &str) -> Option<&RfmProfile> {
        self.profiles.iter().find(|p| p.customer_id == customer_id)
    }
}

#[derive(Debug)]
struct CustomerOrders<'a> {
    last_purchase: NaiveDate,
    orders: HashSet<&'a str>,
    monetary: f64,
}

/// Compute RFM profiles from order records
///
/// Records without a parseable purchase date, a customer id or an order id are
/// ignored. Missing or non-finite payments add nothing to Monetary. The reference date is the latest purchase date among the
/// remaining records.
///
/// # Returns
/// * `RfmTable` with one profile per distinct customer; empty (schema intact)
///   when no record is valid
pub fn calculate_rfm(records: &[OrderRecord]) -> RfmTable {
    let mut customers: BTreeMap<&str, CustomerOrders<'_>> = BTreeMap::new();

    for record in records {
        let (Some(customer_id), Some(date), Some(order_id)) = (
            record.customer_id.as_deref(),
            record.purchase_date,
            record.order_id.as_deref(),
        ) else {
            continue;
        };
        let payment = record.payment.filter(|v| v.is_finite()).unwrap_or(0.0);

        let entry = customers.entry(customer_id).or_insert_with(|| CustomerOrders {
            last_purchase: date,
            orders: HashSet::new(),
            monetary: 0.0,
        });
        entry.last_purchase = entry.last_purchase.max(date);
        entry.orders.insert(order_id);
        entry.monetary += payment;
    }

    let Some(reference_date) = customers.values().map(|c| c.last_purchase).max() else {
        debug!("No valid records for RFM analysis");
        return RfmTable::empty();
    };

    let recency: Vec<f64> = customers
        .values()
        .map(|c| (reference_date - c.last_purchase).num_days() as f64)
        .collect();
    let frequency: Vec<f64> = customers.values().map(|c| c.orders.len() as f64).collect();
    let monetary: Vec<f64> = customers.values().map(|c| c.monetary).collect();

    let n_customers = customers.len();
    let r_outcome = score_metric(Metric::Recency, &recency);
    let f_outcome = score_metric(Metric::Frequency, &frequency);
    let m_outcome = score_metric(Metric::Monetary, &monetary);

    let scoring = ScoringSummary {
        recency: r_outcome.path(),
        frequency: f_outcome.path(),
        monetary: m_outcome.path(),
    };
    debug!(
        "Scored {} customers (reference date {}): R={}, F={}, M={}",
        n_customers, reference_date, scoring.recency, scoring.frequency, scoring.monetary
    );

    let r_scores = r_outcome.into_scores(n_customers);
    let f_scores = f_outcome.into_scores(n_customers);
    let m_scores = m_outcome.into_scores(n_customers);

    let profiles = customers
        .iter()
        .enumerate()
        .map(|(i, (customer_id, orders))| {
            let (r, f, m) = (r_scores[i], f_scores[i], m_scores[i]);
            let rfm_score = r + f + m;
            RfmProfile {
                customer_id: (*customer_id).to_string(),
                recency: (reference_date - orders.last_purchase).num_days(),
                frequency: orders.orders.len(),
                monetary: orders.monetary,
                r_score: r,
                f_score: f,
                m_score: m,
                rfm_segment: format!("{}{}{}", r, f, m),
                rfm_score,
                customer_segment: CustomerSegment::from_score(rfm_score),
            }
        })
        .collect();

    RfmTable {
        profiles,
        reference_date: Some(reference_date),
        scoring: Some(scoring),
    }
}

/// Score one metric into 1-5 bins
///
/// Frequency is replaced by its first-occurrence rank before binning so that
/// heavily tied counts still spread over the bins. Metrics with at least five
/// distinct values use quintile edges; fewer distinct values use percentile
/// edges with duplicates removed (or min/median/max when too few remain).
/// Anything that cannot be binned gets [`NEUTRAL_SCORE`].
pub fn score_metric(metric: Metric, values: &[f64]) -> ScoreOutcome {
    if values.iter().any(|v| !v.is_finite()) {
        warn!("{} contains non-finite values, assigning neutral scores", metric.name());
        return ScoreOutcome::Neutral(NeutralReason::NonFinite);
    }

    let binned = match metric {
        Metric::Frequency => first_rank(values),
        _ => values.to_vec(),
    };

    let mut sorted = binned.clone();
    sorted.sort_by(f64::total_cmp);
    let mut distinct = sorted.clone();
    distinct.dedup();

    if distinct.len() < 2 {
        return ScoreOutcome::Neutral(NeutralReason::ConstantMetric);
    }

    let labels = metric.labels();
    let mut edges: Vec<f64> = PERCENTILES.iter().map(|&p| quantile(&sorted, p)).collect();
    edges.dedup();

    if distinct.len() < labels.len() {
        if edges.len() < 3 {
            edges = vec![sorted[0], quantile(&sorted, 0.5), sorted[sorted.len() - 1]];
        }
        if !edges.windows(2).all(|w| w[0] < w[1]) {
            warn!(
                "{} edges {:?} cannot form bins, assigning neutral scores",
                metric.name(),
                edges
            );
            return ScoreOutcome::Neutral(NeutralReason::DegenerateEdges);
        }
        let scores = assign_bins(&binned, &edges, &labels[..edges.len() - 1]);
        return ScoreOutcome::Fallback(scores);
    }

    if edges.len() != labels.len() + 1 {
        warn!(
            "{} quintile edges collapsed to {}, assigning neutral scores",
            metric.name(),
            edges.len()
        );
        return ScoreOutcome::Neutral(NeutralReason::DuplicateEdges);
    }

    ScoreOutcome::Quantile(assign_bins(&binned, &edges, &labels))
}

/// Linear-interpolated quantile of an ascending, non-empty slice
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// 1-based ranks in ascending order, ties broken by position
fn first_rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (rank, &index) in order.iter().enumerate() {
        ranks[index] = (rank + 1) as f64;
    }
    ranks
}

/// Bins are right-closed `(a, b]`; the first bin also includes its lower edge.
fn assign_bins(values: &[f64], edges: &[f64], labels: &[u8]) -> Vec<u8> {
    let last = labels.len() - 1;
    values
        .iter()
        .map(|&value| {
            let bin = edges.partition_point(|&edge| edge < value).saturating_sub(1);
            labels[bin.min(last)]
        })
        .collect()
}

//! Top-N breakdowns by location, product category and payment type

use log::debug;
use polars::prelude::*;

use crate::data::{
    Dataset, CUSTOMER_CITY, CUSTOMER_ID, CUSTOMER_STATE, ORDER_ID, PAYMENT_TYPE, PAYMENT_VALUE,
    PRICE, PRODUCT_CATEGORY,
};
use crate::error::DataResult;
use crate::labels::LabelTable;

/// Default number of rows kept by each breakdown
pub const DEFAULT_TOP_N: usize = 5;

const MEASURE: &str = "__measure";
const ROW_INDEX: &str = "__row";
const FIRST_SEEN: &str = "__first_seen";

/// How each group is reduced to a single number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Distinct non-null values of a column
    Distinct(&'static str),
    /// Sum of a numeric column
    Sum(&'static str),
    /// Rows in the group
    Rows,
}

impl Measure {
    fn expr(self, key: &str) -> Expr {
        let reduced = match self {
            Measure::Distinct(column) => col(column).drop_nulls().n_unique(),
            Measure::Sum(column) => col(column).sum(),
            Measure::Rows => col(key).count(),
        };
        reduced.cast(DataType::Float64).alias(MEASURE)
    }

    /// Secondary sort key for groups with equal measures
    ///
    /// Row counts keep the order in which each key first appears; every other
    /// measure falls back to the ascending key.
    fn tie_break(self, key: &str) -> Expr {
        match self {
            Measure::Rows => col(FIRST_SEEN),
            Measure::Distinct(_) | Measure::Sum(_) => col(key),
        }
    }
}

/// One row of a ranking: display label and its measure
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub label: String,
    pub value: f64,
}

/// Largest-N groups for one breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub label_header: &'static str,
    pub measure_header: &'static str,
    pub rows: Vec<RankedRow>,
}

impl Ranking {
    pub fn empty(label_header: &'static str, measure_header: &'static str) -> Self {
        Self {
            label_header,
            measure_header,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.value).collect()
    }
}

/// Definition of a top-N breakdown
#[derive(Debug, Clone, Copy)]
pub struct Breakdown {
    pub key: &'static str,
    pub measure: Measure,
    pub labels: LabelTable,
    pub label_header: &'static str,
    pub measure_header: &'static str,
}

pub const TOP_CITIES: Breakdown = Breakdown {
    key: CUSTOMER_CITY,
    measure: Measure::Distinct(CUSTOMER_ID),
    labels: LabelTable::City,
    label_header: "City",
    measure_header: "Number of Customers",
};

pub const TOP_STATES: Breakdown = Breakdown {
    key: CUSTOMER_STATE,
    measure: Measure::Distinct(CUSTOMER_ID),
    labels: LabelTable::State,
    label_header: "State",
    measure_header: "Number of Customers",
};

pub const TOP_CATEGORIES_BY_ORDERS: Breakdown = Breakdown {
    key: PRODUCT_CATEGORY,
    measure: Measure::Distinct(ORDER_ID),
    labels: LabelTable::Category,
    label_header: "Category",
    measure_header: "Number of Orders",
};

pub const TOP_CATEGORIES_BY_REVENUE: Breakdown = Breakdown {
    key: PRODUCT_CATEGORY,
    measure: Measure::Sum(PRICE),
    labels: LabelTable::Category,
    label_header: "Category",
    measure_header: "Total Revenue",
};

pub const PAYMENT_COUNTS: Breakdown = Breakdown {
    key: PAYMENT_TYPE,
    measure: Measure::Rows,
    labels: LabelTable::Payment,
    label_header: "Payment",
    measure_header: "Count",
};

pub const PAYMENT_REVENUE: Breakdown = Breakdown {
    key: PAYMENT_TYPE,
    measure: Measure::Sum(PAYMENT_VALUE),
    labels: LabelTable::Payment,
    label_header: "Payment",
    measure_header: "Total Revenue",
};

impl Breakdown {
    /// Group, reduce, keep the `n` largest and relabel
    ///
    /// Ties keep ascending key order, except row counts, which keep
    /// first-appearance order. Rows with a null key are ignored.
    pub fn top_n(&self, dataset: &Dataset, n: usize) -> DataResult<Ranking> {
        if dataset.is_empty() || n == 0 {
            return Ok(Ranking::empty(self.label_header, self.measure_header));
        }

        let ranked = dataset
            .frame()
            .clone()
            .lazy()
            .with_row_index(ROW_INDEX, None)
            .filter(col(self.key).is_not_null())
            .group_by([col(self.key)])
            .agg([
                self.measure.expr(self.key),
                col(ROW_INDEX).min().alias(FIRST_SEEN),
            ])
            .sort_by_exprs(
                [col(MEASURE), self.measure.tie_break(self.key)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .limit(n as IdxSize)
            .collect()?;

        let keys = ranked.column(self.key)?.cast(&DataType::String)?;
        let values = ranked.column(MEASURE)?.f64()?;

        let rows: Vec<RankedRow> = keys
            .str()?
            .into_iter()
            .zip(values.into_iter())
            .filter_map(|(key, value)| {
                Some(RankedRow {
                    label: self.labels.display_name(key?),
                    value: value.unwrap_or(0.0),
                })
            })
            .collect();

        debug!("Top {} by {}: {} rows", self.label_header, self.measure_header, rows.len());
        Ok(Ranking {
            label_header: self.label_header,
            measure_header: self.measure_header,
            rows,
        })
    }
}

pub fn top_cities(dataset: &Dataset, n: usize) -> DataResult<Ranking> {
    TOP_CITIES.top_n(dataset, n)
}

pub fn top_states(dataset: &Dataset, n: usize) -> DataResult<Ranking> {
    TOP_STATES.top_n(dataset, n)
}

pub fn top_categories_by_orders(dataset: &Dataset, n: usize) -> DataResult<Ranking> {
    TOP_CATEGORIES_BY_ORDERS.top_n(dataset, n)
}

pub fn top_categories_by_revenue(dataset: &Dataset, n: usize) -> DataResult<Ranking> {
    TOP_CATEGORIES_BY_REVENUE.top_n(dataset, n)
}

pub fn payment_counts(dataset: &Dataset, n: usize) -> DataResult<Ranking> {
    PAYMENT_COUNTS.top_n(dataset, n)
}

pub fn payment_revenue(dataset: &Dataset, n: usize) -> DataResult<Ranking> {
    PAYMENT_REVENUE.top_n(dataset, n)
}

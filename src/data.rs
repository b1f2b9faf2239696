//! Dataset loading, date filtering and record extraction using Polars

use std::path::Path;

use chrono::{Duration, NaiveDate};
use log::{debug, warn};
use polars::prelude::*;

use crate::error::{DataError, DataResult};
use crate::rfm::OrderRecord;

pub const CUSTOMER_ID: &str = "customer_unique_id";
pub const CUSTOMER_CITY: &str = "customer_city";
pub const CUSTOMER_STATE: &str = "customer_state";
pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const ORDER_ID: &str = "order_id";
pub const PRODUCT_CATEGORY: &str = "product_category_name_english";
pub const PRICE: &str = "price";
pub const PAYMENT_TYPE: &str = "payment_type";
pub const PAYMENT_VALUE: &str = "payment_value";

/// Columns every dataset must provide
pub const REQUIRED_COLUMNS: [&str; 9] = [
    CUSTOMER_ID,
    CUSTOMER_CITY,
    CUSTOMER_STATE,
    PURCHASE_TIMESTAMP,
    ORDER_ID,
    PRODUCT_CATEGORY,
    PRICE,
    PAYMENT_TYPE,
    PAYMENT_VALUE,
];

// Parsed purchase date as days since 1970-01-01; null when unparseable
const PURCHASE_DAY: &str = "__purchase_day";

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Order/customer/product/payment rows held in memory
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Load the CSV at `path`
    ///
    /// All columns are read as text; `price` and `payment_value` are then
    /// cast to floats, with unparseable or non-finite numbers becoming null.
    pub fn load(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NotFound(path.to_path_buf()));
        }

        let frame = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        debug!("Read {} rows from {}", frame.height(), path.display());
        Self::from_frame(frame)
    }

    /// Validate columns and derive the purchase-date column
    pub fn from_frame(frame: DataFrame) -> DataResult<Self> {
        for required in REQUIRED_COLUMNS {
            let present = frame
                .get_column_names()
                .iter()
                .any(|name| name.as_str() == required);
            if !present {
                return Err(DataError::MissingColumn(required.to_string()));
            }
        }

        let frame = frame
            .lazy()
            .with_columns([
                finite_or_null(PRICE),
                finite_or_null(PAYMENT_VALUE),
                purchase_day(),
            ])
            .collect()?;

        let unparsed = frame.column(PURCHASE_DAY)?.null_count();
        if unparsed > 0 {
            debug!("{} rows have a missing or unparseable purchase timestamp", unparsed);
        }

        Ok(Self { frame })
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub(crate) fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Earliest and latest purchase dates, `None` when no timestamp parsed
    pub fn date_bounds(&self) -> DataResult<Option<(NaiveDate, NaiveDate)>> {
        let days = self.frame.column(PURCHASE_DAY)?.i32()?;
        let bounds = match (days.min(), days.max()) {
            (Some(lo), Some(hi)) => day_to_date(lo).zip(day_to_date(hi)),
            _ => None,
        };
        if bounds.is_none() {
            warn!("No valid dates found in {} column", PURCHASE_TIMESTAMP);
        }
        Ok(bounds)
    }

    /// Rows purchased within `range` (inclusive); rows without a date are dropped
    pub fn filter_by_date(&self, range: &DateRange) -> DataResult<Dataset> {
        let start = date_to_day(range.start);
        let end = date_to_day(range.end);

        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(
                col(PURCHASE_DAY)
                    .gt_eq(lit(start))
                    .and(col(PURCHASE_DAY).lt_eq(lit(end))),
            )
            .collect()?;

        debug!(
            "Date filter {} kept {} of {} rows",
            range,
            frame.height(),
            self.frame.height()
        );
        Ok(Dataset { frame })
    }

    /// Per-row inputs for the RFM engine
    pub fn order_records(&self) -> DataResult<Vec<OrderRecord>> {
        let customers = self.frame.column(CUSTOMER_ID)?.cast(&DataType::String)?;
        let orders = self.frame.column(ORDER_ID)?.cast(&DataType::String)?;
        let days = self.frame.column(PURCHASE_DAY)?.i32()?;
        let payments = self.frame.column(PAYMENT_VALUE)?.f64()?;

        let records = customers
            .str()?
            .into_iter()
            .zip(orders.str()?.into_iter())
            .zip(days.into_iter())
            .zip(payments.into_iter())
            .map(|(((customer, order), day), payment)| OrderRecord {
                customer_id: customer.map(str::to_string),
                purchase_date: day.and_then(day_to_date),
                order_id: order.map(str::to_string),
                payment,
            })
            .collect();
        Ok(records)
    }

    /// First `n` rows for preview, without derived columns
    pub fn sample(&self, n: usize) -> DataResult<DataFrame> {
        Ok(self.frame.head(Some(n)).drop(PURCHASE_DAY)?)
    }
}

/// Inclusive purchase-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DataResult<Self> {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from optional endpoints, defaulting to and clamped by `bounds`
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        bounds: (NaiveDate, NaiveDate),
    ) -> DataResult<Self> {
        let (lo, hi) = bounds;
        let start = start.unwrap_or(lo).clamp(lo, hi);
        let end = end.unwrap_or(hi).clamp(lo, hi);
        Self::new(start, end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parse a `YYYY-MM-DD` date given on the command line
pub fn parse_date(raw: &str) -> DataResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DataError::InvalidDate(raw.to_string()))
}

/// Float column with NaN and infinities replaced by null
fn finite_or_null(name: &str) -> Expr {
    let value = col(name).cast(DataType::Float64);
    when(value.clone().is_finite())
        .then(value)
        .otherwise(lit(NULL))
        .alias(name)
}

/// Purchase day from the first timestamp format that parses, else null
fn purchase_day() -> Expr {
    let timestamp = || col(PURCHASE_TIMESTAMP).cast(DataType::String).str();
    let options = |format: &str| StrptimeOptions {
        format: Some(format.into()),
        strict: false,
        exact: true,
        ..Default::default()
    };

    let mut attempts: Vec<Expr> = TIMESTAMP_FORMATS
        .into_iter()
        .map(|format| {
            timestamp()
                .strptime(
                    DataType::Datetime(TimeUnit::Microseconds, None),
                    options(format),
                    lit("raise"),
                )
                .cast(DataType::Date)
        })
        .collect();
    attempts.push(timestamp().strptime(DataType::Date, options(DATE_FORMAT), lit("raise")));

    coalesce(&attempts)
        .cast(DataType::Int32)
        .alias(PURCHASE_DAY)
}

fn date_to_day(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn day_to_date(day: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(Duration::days(i64::from(day)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "order_id,customer_unique_id,customer_city,customer_state,order_purchase_timestamp,product_category_name_english,price,payment_type,payment_value";

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "o1,c1,sao paulo,SP,2017-10-02 10:56:33,housewares,29.99,credit_card,38.71").unwrap();
        writeln!(file, "o2,c2,curitiba,PR,2018-07-24 20:41:37,perfumery,118.70,boleto,141.46").unwrap();
        writeln!(file, "o3,c1,sao paulo,SP,not a date,auto,159.90,credit_card,179.12").unwrap();
        writeln!(file, "o4,c3,campinas,SP,2018-08-08 08:38:49,toys,45.00,voucher,").unwrap();
        file
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_timestamp_formats() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for timestamp in [
            "2017-10-02 10:56:33",
            "2017-10-03T10:56:33",
            "2017-10-04 10:56",
            "2017-10-05",
            "02/10/2017",
            "",
        ] {
            writeln!(file, "o1,c1,sao paulo,SP,{},toys,1.0,boleto,1.0", timestamp).unwrap();
        }

        let records = Dataset::load(file.path()).unwrap().order_records().unwrap();
        let dates: Vec<Option<NaiveDate>> = records.iter().map(|r| r.purchase_date).collect();
        assert_eq!(
            dates,
            vec![
                Some(date(2017, 10, 2)),
                Some(date(2017, 10, 3)),
                Some(date(2017, 10, 4)),
                Some(date(2017, 10, 5)),
                None,
                None,
            ]
        );
    }

    #[test]
    fn test_day_encoding() {
        assert_eq!(date_to_day(date(1970, 1, 1)), 0);
        assert_eq!(date_to_day(date(1969, 12, 31)), -1);
        assert_eq!(day_to_date(date_to_day(date(2018, 8, 8))), Some(date(2018, 8, 8)));
    }

    #[test]
    fn test_non_finite_amounts_become_null() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "o1,c1,sao paulo,SP,2018-01-01 10:00:00,toys,NaN,boleto,NaN").unwrap();
        writeln!(file, "o2,c2,sao paulo,SP,2018-01-02 10:00:00,toys,inf,boleto,12.5").unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        let records = dataset.order_records().unwrap();
        assert_eq!(records[0].payment, None);
        assert_eq!(records[1].payment, Some(12.5));

        let prices = dataset.frame().column(PRICE).unwrap().f64().unwrap().clone();
        assert_eq!(prices.null_count(), 2);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2018-01-31").unwrap(), date(2018, 1, 31));
        assert!(matches!(parse_date("31-01-2018"), Err(DataError::InvalidDate(_))));
    }

    #[test]
    fn test_date_range_resolve_clamps() {
        let bounds = (date(2017, 1, 1), date(2018, 12, 31));

        let range = DateRange::resolve(None, None, bounds).unwrap();
        assert_eq!(range, DateRange { start: bounds.0, end: bounds.1 });

        let range = DateRange::resolve(Some(date(2016, 5, 1)), Some(date(2019, 1, 1)), bounds).unwrap();
        assert_eq!(range.start, bounds.0);
        assert_eq!(range.end, bounds.1);

        let result = DateRange::resolve(Some(date(2018, 6, 1)), Some(date(2018, 1, 1)), bounds);
        assert!(matches!(result, Err(DataError::InvalidRange { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Dataset::load("definitely/not/here.csv");
        assert!(matches!(result, Err(DataError::NotFound(_))));
    }

    #[test]
    fn test_load_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "order_id,customer_unique_id").unwrap();
        writeln!(file, "o1,c1").unwrap();

        let result = Dataset::load(file.path());
        assert!(matches!(result, Err(DataError::MissingColumn(_))));
    }

    #[test]
    fn test_load_and_bounds() {
        let file = create_test_csv();
        let dataset = Dataset::load(file.path()).unwrap();

        assert_eq!(dataset.len(), 4);
        let bounds = dataset.date_bounds().unwrap();
        assert_eq!(bounds, Some((date(2017, 10, 2), date(2018, 8, 8))));
    }

    #[test]
    fn test_filter_by_date_is_inclusive() {
        let file = create_test_csv();
        let dataset = Dataset::load(file.path()).unwrap();

        let range = DateRange::new(date(2018, 7, 24), date(2018, 8, 8)).unwrap();
        let filtered = dataset.filter_by_date(&range).unwrap();
        assert_eq!(filtered.len(), 2);

        // The unparseable row never survives a date filter
        let everything = DateRange::new(date(2000, 1, 1), date(2030, 1, 1)).unwrap();
        assert_eq!(dataset.filter_by_date(&everything).unwrap().len(), 3);
    }

    #[test]
    fn test_order_records() {
        let file = create_test_csv();
        let dataset = Dataset::load(file.path()).unwrap();
        let records = dataset.order_records().unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].customer_id.as_deref(), Some("c1"));
        assert_eq!(records[0].purchase_date, Some(date(2017, 10, 2)));
        assert_eq!(records[0].payment, Some(38.71));
        assert_eq!(records[2].purchase_date, None);
        assert_eq!(records[3].payment, None);
    }

    #[test]
    fn test_sample_hides_derived_column() {
        let file = create_test_csv();
        let dataset = Dataset::load(file.path()).unwrap();
        let sample = dataset.sample(2).unwrap();

        assert_eq!(sample.height(), 2);
        assert_eq!(sample.width(), REQUIRED_COLUMNS.len());
    }
}

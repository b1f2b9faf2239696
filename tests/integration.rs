//! Integration tests for olist-rfm

use chrono::NaiveDate;
use olist_rfm::aggregate::{top_categories_by_orders, top_cities};
use olist_rfm::rfm::{ScoringPath, RFM_COLUMNS};
use olist_rfm::{calculate_rfm, CustomerSegment, DashboardReport, DataError, Dataset, DateRange};
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "order_id,customer_id,customer_unique_id,customer_city,customer_state,order_purchase_timestamp,product_category_name_english,price,payment_type,payment_value";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a test CSV file with sample data
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();

    // u1 - repeat customer, one multi-item order and one multi-installment order
    writeln!(file, "o1,k1,u1,sao paulo,SP,2018-01-10 09:00:00,bed_bath_table,80.0,credit_card,90.0").unwrap();
    writeln!(file, "o1,k1,u1,sao paulo,SP,2018-01-10 09:00:00,housewares,20.0,credit_card,25.0").unwrap();
    writeln!(file, "o2,k2,u1,sao paulo,SP,2018-03-01 12:30:00,toys,60.0,credit_card,40.0").unwrap();
    writeln!(file, "o2,k2,u1,sao paulo,SP,2018-03-01 12:30:00,toys,60.0,voucher,30.0").unwrap();

    // u2 - single recent order
    writeln!(file, "o3,k3,u2,rio de janeiro,RJ,2018-03-05 18:00:00,health_beauty,150.0,boleto,165.5").unwrap();

    // u3 - old order and one row whose timestamp cannot be parsed
    writeln!(file, "o4,k4,u3,belo horizonte,MG,2017-11-20 08:15:00,quantum_gadgets,300.0,credit_card,320.0").unwrap();
    writeln!(file, "o5,k5,u3,belo horizonte,MG,garbage,toys,10.0,debit_card,10.0").unwrap();

    // u4 - mid-range customer
    writeln!(file, "o6,k6,u4,Campinas,SP,2018-02-14 14:00:00,watches_gifts,99.9,credit_card,109.9").unwrap();

    file
}

fn create_three_customer_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "a1,k1,c1,curitiba,PR,2018-08-19 10:00:00,toys,90.0,credit_card,100.0").unwrap();
    writeln!(file, "a2,k2,c2,curitiba,PR,2018-08-24 10:00:00,toys,190.0,credit_card,200.0").unwrap();
    writeln!(file, "a3,k3,c3,curitiba,PR,2018-08-29 10:00:00,toys,290.0,credit_card,300.0").unwrap();
    file
}

fn load_all(file: &NamedTempFile) -> Dataset {
    let dataset = Dataset::load(file.path()).unwrap();
    let bounds = dataset.date_bounds().unwrap().unwrap();
    let range = DateRange::resolve(None, None, bounds).unwrap();
    dataset.filter_by_date(&range).unwrap()
}

#[test]
fn test_end_to_end_report() {
    let file = create_test_csv();
    let dataset = Dataset::load(file.path()).unwrap();
    assert_eq!(dataset.len(), 8);

    let bounds = dataset.date_bounds().unwrap().unwrap();
    assert_eq!(bounds, (date(2017, 11, 20), date(2018, 3, 5)));

    let range = DateRange::resolve(None, None, bounds).unwrap();
    let filtered = dataset.filter_by_date(&range).unwrap();
    // The row with an unparseable timestamp is outside every range
    assert_eq!(filtered.len(), 7);

    let report = DashboardReport::build(&filtered, 5).unwrap();
    assert_eq!(report.record_count, 7);
    assert_eq!(report.rfm.len(), 4);
    assert_eq!(report.top_states.labels()[0], "São Paulo");
    assert_eq!(report.top_states.values()[0], 2.0);
    assert_eq!(report.payment_counts.labels()[0], "Credit Card");
    assert_eq!(report.payment_counts.values()[0], 5.0);
}

#[test]
fn test_rfm_metrics_match_records() {
    let file = create_test_csv();
    let records = Dataset::load(file.path()).unwrap().order_records().unwrap();
    let table = calculate_rfm(&records);

    assert_eq!(table.reference_date, Some(date(2018, 3, 5)));

    // Each valid customer appears exactly once, ordered by id
    let ids: Vec<&str> = table.profiles.iter().map(|p| p.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3", "u4"]);

    let u1 = table.profile("u1").unwrap();
    assert_eq!(u1.recency, 4);
    assert_eq!(u1.frequency, 2);
    assert!((u1.monetary - 185.0).abs() < 1e-9);

    let u2 = table.profile("u2").unwrap();
    assert_eq!(u2.recency, 0);
    assert_eq!(u2.frequency, 1);

    // The garbage-timestamp row contributes nothing
    let u3 = table.profile("u3").unwrap();
    assert_eq!(u3.recency, 105);
    assert_eq!(u3.frequency, 1);
    assert!((u3.monetary - 320.0).abs() < 1e-9);

    for profile in &table.profiles {
        assert!(profile.recency >= 0);
        assert!(profile.frequency >= 1);
        for score in [profile.r_score, profile.f_score, profile.m_score] {
            assert!((1..=5).contains(&score));
        }
        assert_eq!(
            profile.rfm_score,
            profile.r_score + profile.f_score + profile.m_score
        );
        assert_eq!(
            profile.customer_segment,
            CustomerSegment::from_score(profile.rfm_score)
        );
    }
}

#[test]
fn test_three_customer_fallback_scenario() {
    let file = create_three_customer_csv();
    let filtered = load_all(&file);
    let report = DashboardReport::build(&filtered, 5).unwrap();
    let rfm = &report.rfm;

    let recency: Vec<i64> = rfm.profiles.iter().map(|p| p.recency).collect();
    assert_eq!(recency, vec![10, 5, 0]);

    let scoring = rfm.scoring.unwrap();
    assert_eq!(scoring.recency, ScoringPath::Fallback);
    assert_eq!(scoring.monetary, ScoringPath::Fallback);

    // Scores follow the metric ordering even on the fallback path
    let r: Vec<u8> = rfm.profiles.iter().map(|p| p.r_score).collect();
    let f: Vec<u8> = rfm.profiles.iter().map(|p| p.f_score).collect();
    let m: Vec<u8> = rfm.profiles.iter().map(|p| p.m_score).collect();
    assert!(r.windows(2).all(|w| w[0] <= w[1]));
    assert!(f.windows(2).all(|w| w[0] <= w[1]));
    assert!(m.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(rfm.profile("c3").unwrap().customer_segment, CustomerSegment::LoyalCustomer);
    assert_eq!(rfm.profile("c1").unwrap().customer_segment, CustomerSegment::LostCustomer);
}

#[test]
fn test_empty_range_yields_empty_schema() {
    let file = create_test_csv();
    let dataset = Dataset::load(file.path()).unwrap();

    let range = DateRange::new(date(2016, 1, 1), date(2016, 12, 31)).unwrap();
    let filtered = dataset.filter_by_date(&range).unwrap();
    assert!(filtered.is_empty());

    let report = DashboardReport::build(&filtered, 5).unwrap();
    assert!(report.rfm.is_empty());
    assert_eq!(report.rfm.columns(), &RFM_COLUMNS);
    assert!(report.top_cities.is_empty());
    assert_eq!(report.top_cities.label_header, "City");
    assert_eq!(report.top_cities.measure_header, "Number of Customers");
}

#[test]
fn test_unmapped_category_passes_through() {
    let file = create_test_csv();
    let filtered = load_all(&file);

    let ranking = top_categories_by_orders(&filtered, 10).unwrap();
    assert!(ranking.labels().contains(&"quantum_gadgets"));
    assert!(ranking.labels().contains(&"Bed, Bath & Table"));

    let cities = top_cities(&filtered, 10).unwrap();
    assert!(cities.labels().contains(&"Campinas"));
}

#[test]
fn test_missing_file_is_reported() {
    let result = Dataset::load("no/such/main_data.csv");
    match result {
        Err(DataError::NotFound(path)) => assert!(path.ends_with("main_data.csv")),
        other => panic!("expected NotFound, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn test_all_timestamps_invalid() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "o1,k1,u1,curitiba,PR,not-a-date,toys,10.0,boleto,10.0").unwrap();

    let dataset = Dataset::load(file.path()).unwrap();
    assert_eq!(dataset.date_bounds().unwrap(), None);

    let table = calculate_rfm(&dataset.order_records().unwrap());
    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 9);
}

#[test]
fn test_nan_payment_row_keeps_monetary_scoring() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for i in 0..10 {
        let amount = 10.0 * (i + 1) as f64;
        writeln!(file, "o{i},k{i},c{i},curitiba,PR,2018-05-01 10:00:00,toys,{amount},boleto,{amount}").unwrap();
    }
    writeln!(file, "o99,k99,c0,curitiba,PR,2018-05-01 11:00:00,toys,NaN,boleto,NaN").unwrap();

    let report = DashboardReport::build(&load_all(&file), 5).unwrap();
    let rfm = &report.rfm;

    assert_eq!(rfm.scoring.unwrap().monetary, ScoringPath::Quantile);
    assert!((rfm.profile("c0").unwrap().monetary - 10.0).abs() < 1e-9);
    assert_eq!(rfm.profile("c0").unwrap().m_score, 1);
    assert_eq!(rfm.profile("c9").unwrap().m_score, 5);

    assert_eq!(report.payment_revenue.values(), vec![550.0]);
}

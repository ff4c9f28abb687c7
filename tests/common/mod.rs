//! Shared test utilities and fixture generators

#![allow(dead_code)]

use credscore::pipeline::{
    train_bundle, FieldValue, MultiValueEncoder, RawRecord, ScoringBundle, TrainerConfig,
};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

const LOANS: [&str; 8] = [
    "auto loan",
    "credit-builder loan",
    "debt consolidation loan",
    "home equity loan",
    "mortgage loan",
    "payday loan",
    "personal loan",
    "student loan",
];

const OCCUPATIONS: [&str; 5] = ["Doctor", "Engineer", "Lawyer", "Teacher", "Writer"];

const BEHAVIOURS: [&str; 6] = [
    "High_spent_Large_value_payments",
    "High_spent_Medium_value_payments",
    "High_spent_Small_value_payments",
    "Low_spent_Large_value_payments",
    "Low_spent_Medium_value_payments",
    "Low_spent_Small_value_payments",
];

/// The two-row loan scenario: `auto loan,home equity loan` and `mortgage loan`
pub fn create_loan_dataframe() -> DataFrame {
    df! {
        "Age" => [30i64, 45],
        "Type_of_Loan" => ["auto loan,home equity loan", "mortgage loan"],
        "Occupation" => ["Lawyer", "Doctor"],
    }
    .unwrap()
}

/// Synthetic credit dataset with every input field plus `Credit_Score`.
///
/// Rows cycle Good/Poor/Standard. `Outstanding_Debt` and `Credit_Mix` track
/// the class closely so a linear model can learn it; every tenth row has a
/// null `Type_of_Loan`.
pub fn create_credit_dataframe(rows: usize) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(42);

    let mut age = Vec::with_capacity(rows);
    let mut occupation = Vec::with_capacity(rows);
    let mut annual_income = Vec::with_capacity(rows);
    let mut salary = Vec::with_capacity(rows);
    let mut bank_accounts = Vec::with_capacity(rows);
    let mut credit_cards = Vec::with_capacity(rows);
    let mut interest_rate = Vec::with_capacity(rows);
    let mut num_loans = Vec::with_capacity(rows);
    let mut loan_types: Vec<Option<String>> = Vec::with_capacity(rows);
    let mut delay = Vec::with_capacity(rows);
    let mut delayed_payments = Vec::with_capacity(rows);
    let mut limit_change = Vec::with_capacity(rows);
    let mut inquiries = Vec::with_capacity(rows);
    let mut credit_mix = Vec::with_capacity(rows);
    let mut debt = Vec::with_capacity(rows);
    let mut utilization = Vec::with_capacity(rows);
    let mut history_age = Vec::with_capacity(rows);
    let mut min_amount = Vec::with_capacity(rows);
    let mut emi = Vec::with_capacity(rows);
    let mut invested = Vec::with_capacity(rows);
    let mut behaviour = Vec::with_capacity(rows);
    let mut balance = Vec::with_capacity(rows);
    let mut score = Vec::with_capacity(rows);

    for i in 0..rows {
        let class = i % 3;
        let (label, mix, debt_range) = match class {
            0 => ("Good", "Good", 100.0..1000.0),
            1 => ("Poor", "Bad", 3000.0..5000.0),
            _ => ("Standard", "Standard", 1500.0..2500.0),
        };

        age.push(rng.gen_range(18i64..60));
        occupation.push(*OCCUPATIONS.choose(&mut rng).unwrap());
        annual_income.push(rng.gen_range(10_000.0f64..150_000.0));
        salary.push(rng.gen_range(800.0f64..12_000.0));
        bank_accounts.push(rng.gen_range(0i64..10));
        credit_cards.push(rng.gen_range(0i64..10));
        interest_rate.push(rng.gen_range(1i64..30));
        num_loans.push(rng.gen_range(0i64..9));
        loan_types.push(if i % 10 == 9 {
            None
        } else {
            let count = rng.gen_range(1..=3);
            let tokens: Vec<&str> = LOANS.choose_multiple(&mut rng, count).copied().collect();
            Some(tokens.join(","))
        });
        delay.push(rng.gen_range(0i64..60));
        delayed_payments.push(rng.gen_range(0i64..25));
        limit_change.push(rng.gen_range(0.0f64..30.0));
        inquiries.push(rng.gen_range(0i64..15));
        credit_mix.push(mix);
        debt.push(rng.gen_range(debt_range));
        utilization.push(rng.gen_range(20.0f64..50.0));
        history_age.push(rng.gen_range(0i64..400));
        min_amount.push(*["NM", "No", "Yes"].choose(&mut rng).unwrap());
        emi.push(rng.gen_range(0.0f64..500.0));
        invested.push(rng.gen_range(0.0f64..1000.0));
        behaviour.push(*BEHAVIOURS.choose(&mut rng).unwrap());
        balance.push(rng.gen_range(0.0f64..1500.0));
        score.push(label);
    }

    DataFrame::new(vec![
        Column::new("Age".into(), age),
        Column::new("Occupation".into(), occupation),
        Column::new("Annual_Income".into(), annual_income),
        Column::new("Monthly_Inhand_Salary".into(), salary),
        Column::new("Num_Bank_Accounts".into(), bank_accounts),
        Column::new("Num_Credit_Card".into(), credit_cards),
        Column::new("Interest_Rate".into(), interest_rate),
        Column::new("Num_of_Loan".into(), num_loans),
        Column::new("Type_of_Loan".into(), loan_types),
        Column::new("Delay_from_due_date".into(), delay),
        Column::new("Num_of_Delayed_Payment".into(), delayed_payments),
        Column::new("Changed_Credit_Limit".into(), limit_change),
        Column::new("Num_Credit_Inquiries".into(), inquiries),
        Column::new("Credit_Mix".into(), credit_mix),
        Column::new("Outstanding_Debt".into(), debt),
        Column::new("Credit_Utilization_Ratio".into(), utilization),
        Column::new("Credit_History_Age".into(), history_age),
        Column::new("Payment_of_Min_Amount".into(), min_amount),
        Column::new("Total_EMI_per_month".into(), emi),
        Column::new("Amount_invested_monthly".into(), invested),
        Column::new("Payment_Behaviour".into(), behaviour),
        Column::new("Monthly_Balance".into(), balance),
        Column::new("Credit_Score".into(), score),
    ])
    .unwrap()
}

/// A valid raw record with every credit field, shaped like a low-risk applicant
pub fn create_credit_record() -> RawRecord {
    let num = FieldValue::Number;
    let text = |s: &str| FieldValue::Text(s.to_string());

    RawRecord::new()
        .with("Age", num(35.0))
        .with("Occupation", text("Lawyer"))
        .with("Annual_Income", num(85_000.0))
        .with("Monthly_Inhand_Salary", num(6_500.0))
        .with("Num_Bank_Accounts", num(3.0))
        .with("Num_Credit_Card", num(4.0))
        .with("Interest_Rate", num(7.0))
        .with("Num_of_Loan", num(2.0))
        .with("Type_of_Loan", text("auto loan,mortgage loan"))
        .with("Delay_from_due_date", num(3.0))
        .with("Num_of_Delayed_Payment", num(1.0))
        .with("Changed_Credit_Limit", num(5.5))
        .with("Num_Credit_Inquiries", num(2.0))
        .with("Credit_Mix", text("Good"))
        .with("Outstanding_Debt", num(400.0))
        .with("Credit_Utilization_Ratio", num(30.0))
        .with("Credit_History_Age", num(240.0))
        .with("Payment_of_Min_Amount", text("No"))
        .with("Total_EMI_per_month", num(120.0))
        .with("Amount_invested_monthly", num(300.0))
        .with("Payment_Behaviour", text("Low_spent_Small_value_payments"))
        .with("Monthly_Balance", num(700.0))
}

/// Train a bundle on the synthetic credit dataset
pub fn create_trained_bundle() -> ScoringBundle {
    let df = create_credit_dataframe(150);
    let (bundle, _) = train_bundle(
        &df,
        "Credit_Score",
        &MultiValueEncoder::default(),
        &TrainerConfig::default(),
    )
    .unwrap();
    bundle
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Column names of a DataFrame as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols = column_names(df);
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols = column_names(df);
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// Read an Int32 dummy column as plain values
pub fn dummy_values(df: &DataFrame, column: &str) -> Vec<i32> {
    df.column(column)
        .unwrap()
        .i32()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect()
}

//! Prediction output: terminal table and batch result frame

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use polars::prelude::*;

use crate::pipeline::{Prediction, RiskTier, ScoringError};

fn risk_color(risk: RiskTier) -> Color {
    match risk {
        RiskTier::Low => Color::Green,
        RiskTier::Medium => Color::Yellow,
        RiskTier::High => Color::Red,
        RiskTier::Unknown => Color::White,
    }
}

/// Print a single prediction with its probability table and risk message
pub fn display_prediction(prediction: &Prediction) {
    println!();
    println!(
        "    {} {}",
        style("🎯").cyan(),
        style("PREDICTION").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Code").add_attribute(Attribute::Bold),
        Cell::new("Label").add_attribute(Attribute::Bold),
        Cell::new("Probability").add_attribute(Attribute::Bold),
    ]);

    for p in &prediction.probabilities {
        let mut label = Cell::new(&p.label);
        let mut probability = Cell::new(format!("{:.4}", p.probability));
        if p.class_code == prediction.class_code {
            let color = risk_color(prediction.risk);
            label = label.fg(color).add_attribute(Attribute::Bold);
            probability = probability.fg(color).add_attribute(Attribute::Bold);
        }
        table.add_row(vec![Cell::new(p.class_code), label, probability]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }

    println!();
    let message = match prediction.risk {
        RiskTier::Low => style(prediction.risk.message()).green().bold(),
        RiskTier::Medium => style(prediction.risk.message()).yellow().bold(),
        RiskTier::High => style(prediction.risk.message()).red().bold(),
        RiskTier::Unknown => style(prediction.risk.message()).dim(),
    };
    println!(
        "    Credit score: {}  {}",
        style(&prediction.label).bold(),
        message
    );
    println!();
}

/// Build the output frame for batch scoring.
///
/// Columns: `class_code`, `label`, `risk`, one `prob_<label>` column per
/// class, and `error` holding the message for rows that failed.
pub fn predictions_frame(
    results: &[Result<Prediction, ScoringError>],
    class_labels: &[String],
) -> PolarsResult<DataFrame> {
    let mut codes: Vec<Option<u32>> = Vec::with_capacity(results.len());
    let mut labels: Vec<Option<String>> = Vec::with_capacity(results.len());
    let mut risks: Vec<Option<String>> = Vec::with_capacity(results.len());
    let mut errors: Vec<Option<String>> = Vec::with_capacity(results.len());
    let mut probabilities: Vec<Vec<Option<f64>>> =
        vec![Vec::with_capacity(results.len()); class_labels.len()];

    for result in results {
        match result {
            Ok(prediction) => {
                codes.push(Some(prediction.class_code as u32));
                labels.push(Some(prediction.label.clone()));
                risks.push(Some(prediction.risk.to_string()));
                errors.push(None);
                for (column, p) in probabilities.iter_mut().enumerate() {
                    p.push(prediction.probabilities.get(column).map(|c| c.probability));
                }
            }
            Err(e) => {
                codes.push(None);
                labels.push(None);
                risks.push(None);
                errors.push(Some(e.to_string()));
                for p in probabilities.iter_mut() {
                    p.push(None);
                }
            }
        }
    }

    let mut columns = vec![
        Column::new("class_code".into(), codes),
        Column::new("label".into(), labels),
        Column::new("risk".into(), risks),
    ];
    for (label, values) in class_labels.iter().zip(probabilities) {
        columns.push(Column::new(format!("prob_{}", label).into(), values));
    }
    columns.push(Column::new("error".into(), errors));

    DataFrame::new(columns)
}

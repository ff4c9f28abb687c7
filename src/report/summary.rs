//! Encoding, training and bundle summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{short_fingerprint, FittedEncoder, ScoringBundle, TrainingReport};

fn section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn metric_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

/// One row per multi-valued source column
fn dummy_block_table(encoder: &FittedEncoder) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Source Column").add_attribute(Attribute::Bold),
        Cell::new("Prefix").add_attribute(Attribute::Bold),
        Cell::new("Dummies").add_attribute(Attribute::Bold),
    ]);
    for (column, prefix) in encoder.dummy_cols().iter().zip(encoder.dummy_prefix()) {
        table.add_row(vec![
            Cell::new(column),
            Cell::new(prefix).fg(Color::Cyan),
            Cell::new(encoder.dummy_columns_for(column).len()),
        ]);
    }
    table
}

/// Summary of a fitted encoder against the dataset it was fit on
#[derive(Debug)]
pub struct EncodingSummary<'a> {
    pub encoder: &'a FittedEncoder,
    pub rows: usize,
    pub input_columns: usize,
}

impl<'a> EncodingSummary<'a> {
    pub fn new(encoder: &'a FittedEncoder, rows: usize, input_columns: usize) -> Self {
        Self {
            encoder,
            rows,
            input_columns,
        }
    }

    pub fn dummy_count(&self) -> usize {
        self.encoder
            .dummy_cols()
            .iter()
            .map(|c| self.encoder.dummy_columns_for(c).len())
            .sum()
    }

    pub fn display(&self) {
        section_header("📋", "ENCODING SUMMARY");

        let mut table = metric_table();
        table.add_row(vec![Cell::new("📁 Rows"), Cell::new(self.rows)]);
        table.add_row(vec![
            Cell::new("📥 Input Columns"),
            Cell::new(self.input_columns),
        ]);
        table.add_row(vec![
            Cell::new("🔀 Multi-valued Columns"),
            Cell::new(self.encoder.dummy_cols().len()).fg(if self.encoder.is_identity() {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("➕ Dummy Columns"),
            Cell::new(self.dummy_count()),
        ]);
        table.add_row(vec![
            Cell::new("✅ Output Columns"),
            Cell::new(self.encoder.columns().len())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🔒 Schema Fingerprint"),
            Cell::new(short_fingerprint(&self.encoder.fingerprint())).fg(Color::Cyan),
        ]);
        print_indented(&table);

        if !self.encoder.is_identity() {
            println!();
            print_indented(&dummy_block_table(self.encoder));
        }
    }
}

/// Summary of a training run
#[derive(Debug)]
pub struct TrainingSummary<'a> {
    pub report: &'a TrainingReport,
}

impl<'a> TrainingSummary<'a> {
    pub fn new(report: &'a TrainingReport) -> Self {
        Self { report }
    }

    pub fn display(&self) {
        let report = self.report;
        section_header("🧠", "TRAINING SUMMARY");

        let mut table = metric_table();
        table.add_row(vec![Cell::new("📁 Training Rows"), Cell::new(report.rows)]);
        if report.dropped_null_targets > 0 {
            table.add_row(vec![
                Cell::new("🗑️  Dropped (Null Target)"),
                Cell::new(report.dropped_null_targets).fg(Color::Red),
            ]);
        }
        table.add_row(vec![
            Cell::new("📥 Input Columns"),
            Cell::new(report.input_columns),
        ]);
        table.add_row(vec![
            Cell::new("🔀 Encoded Columns"),
            Cell::new(report.encoded_columns),
        ]);
        table.add_row(vec![
            Cell::new("🔢 Dense Features"),
            Cell::new(report.dense_features),
        ]);
        table.add_row(vec![
            Cell::new("🔁 Epochs"),
            Cell::new(format!(
                "{}{}",
                report.stats.epochs_run,
                if report.stats.converged { " (converged)" } else { "" }
            )),
        ]);
        table.add_row(vec![
            Cell::new("📉 Final Loss"),
            Cell::new(format!("{:.4}", report.stats.final_loss)),
        ]);

        let accuracy_color = if report.training_accuracy > 0.8 {
            Color::Green
        } else if report.training_accuracy > 0.6 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("🎯 Training Accuracy"),
            Cell::new(format!("{:.1}%", report.training_accuracy * 100.0))
                .fg(accuracy_color)
                .add_attribute(Attribute::Bold),
        ]);
        print_indented(&table);

        println!();
        let mut classes = Table::new();
        classes.load_preset(UTF8_FULL_CONDENSED);
        classes.set_header(vec![
            Cell::new("Code").add_attribute(Attribute::Bold),
            Cell::new("Label").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
        ]);
        for (code, (label, count)) in report
            .class_labels
            .iter()
            .zip(&report.class_counts)
            .enumerate()
        {
            classes.add_row(vec![Cell::new(code), Cell::new(label), Cell::new(count)]);
        }
        print_indented(&classes);
    }
}

/// Print the contents of a loaded bundle
pub fn display_bundle(bundle: &ScoringBundle) {
    section_header("📦", "SCORING BUNDLE");

    let mut table = metric_table();
    table.add_row(vec![
        Cell::new("Format Version"),
        Cell::new(bundle.format_version),
    ]);
    table.add_row(vec![Cell::new("Created"), Cell::new(&bundle.created_at)]);
    table.add_row(vec![
        Cell::new("Built With"),
        Cell::new(format!("credscore {}", bundle.crate_version)),
    ]);
    table.add_row(vec![
        Cell::new("Schema Fingerprint"),
        Cell::new(short_fingerprint(&bundle.schema_fingerprint)).fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Output Columns"),
        Cell::new(bundle.encoder.columns().len()),
    ]);
    table.add_row(vec![
        Cell::new("Dense Features"),
        Cell::new(bundle.classifier.layout().width()),
    ]);
    table.add_row(vec![
        Cell::new("Classes"),
        Cell::new(bundle.class_labels.join(", ")),
    ]);
    let stats = bundle.classifier.training_stats();
    table.add_row(vec![
        Cell::new("Training Rows"),
        Cell::new(stats.rows),
    ]);
    print_indented(&table);

    if !bundle.encoder.is_identity() {
        println!();
        print_indented(&dummy_block_table(&bundle.encoder));
    }
}

//! credscore: Multi-value Encoding and Credit Scoring CLI
//!
//! Encodes delimiter-separated categorical columns, trains a scoring bundle
//! and scores raw records against it.

use anyhow::Result;
use clap::Parser;

use credscore::cli::encode::{run_encode, EncodeParams};
use credscore::cli::inspect::run_inspect;
use credscore::cli::score::{run_score, run_score_batch, ScoreBatchParams};
use credscore::cli::train::{run_train, TrainParams};
use credscore::cli::{Cli, Commands};
use credscore::utils::init_tracing;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match &cli.command {
        Commands::Encode {
            input,
            output,
            encoder_out,
            drop_columns,
            infer_schema_length,
            encoder,
        } => run_encode(&EncodeParams {
            input,
            output: output.as_deref(),
            encoder_out: encoder_out.as_deref(),
            drop_columns,
            infer_schema_length: *infer_schema_length,
            encoder,
        }),
        Commands::Train {
            input,
            target,
            bundle,
            drop_columns,
            infer_schema_length,
            encoder,
            ..
        } => {
            let trainer = cli.command.trainer_config().unwrap_or_default();
            run_train(&TrainParams {
                input,
                target,
                bundle: bundle.as_deref(),
                drop_columns,
                infer_schema_length: *infer_schema_length,
                trainer,
                encoder,
            })
        }
        Commands::Score {
            bundle,
            record,
            set,
            strict,
            json,
        } => run_score(bundle, record.as_deref(), set, *strict, *json),
        Commands::ScoreBatch {
            input,
            bundle,
            output,
            strict,
            infer_schema_length,
        } => run_score_batch(&ScoreBatchParams {
            input,
            bundle,
            output: output.as_deref(),
            strict: *strict,
            infer_schema_length: *infer_schema_length,
        }),
        Commands::Inspect { bundle, json } => run_inspect(bundle, *json),
    }
}

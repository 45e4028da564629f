use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "batchportd", version, about = "Batched predict processor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one batch of length-delimited requests through the model
    Batch {
        /// Model entry handed to the backend (echo: signature JSON file)
        #[arg(long, default_value = "")]
        model_entry: PathBuf,

        /// Model config as JSON
        #[arg(long, default_value = "")]
        model_config: String,

        /// File of length-delimited PredictRequest messages
        #[arg(long)]
        input: PathBuf,

        /// File to write length-delimited PredictResponse messages to
        #[arg(long)]
        output: PathBuf,

        /// Log level (RUST_LOG)
        #[arg(long, default_value = "info")]
        log: String,
    },

    /// Print the model signature as JSON
    Signature {
        #[arg(long, default_value = "")]
        model_entry: PathBuf,

        /// Log level (RUST_LOG)
        #[arg(long, default_value = "info")]
        log: String,
    },
}

mod cli;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use batchport_backend_echo::EchoBackend;
use batchport_proto::{encode_frames, split_frames};
use batchport_runtime::{Processor, ProcessorConfig, Worker, STATUS_OK};
use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Batch {
            model_entry,
            model_config,
            input,
            output,
            log,
        } => {
            init_tracing(&log);
            run_batch(model_entry, model_config, input, output).await
        }
        Command::Signature { model_entry, log } => {
            init_tracing(&log);
            print_signature(&model_entry)
        }
    }
}

fn init_tracing(log: &str) {
    std::env::set_var("RUST_LOG", log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

async fn run_batch(
    model_entry: PathBuf,
    model_config: String,
    input: PathBuf,
    output: PathBuf,
) -> Result<()> {
    let config = ProcessorConfig::from_json(&model_config)?;
    let processor = Processor::initialize(&EchoBackend::new(), &model_entry, &config)?;

    // ---- Channel: caller -> worker
    let (worker, handle) = Worker::channel(0, processor, 16);
    let running = tokio::spawn(async move {
        if let Err(e) = worker.run().await {
            tracing::error!(error = ?e, "worker exited");
        }
    });

    let raw =
        std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let requests = split_frames(Bytes::from(raw))
        .context("input is not a sequence of length-delimited requests")?;
    tracing::info!(requests = requests.len(), input = %input.display(), "submitting batch");

    let batch = handle.submit(requests).await?.context("batch failed")?;
    for (index, slot) in batch.responses.iter().enumerate() {
        if let Err(err) = slot {
            tracing::warn!(index, error = %err, "request failed; writing empty response");
        }
    }

    let frames: Vec<Bytes> = batch
        .responses
        .into_iter()
        .map(|slot| slot.unwrap_or_default())
        .collect();
    std::fs::write(&output, encode_frames(&frames)?)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        status = batch.status,
        responses = frames.len(),
        merge_us = batch.timings.merge_us,
        predict_us = batch.timings.predict_us,
        split_us = batch.timings.split_us,
        output = %output.display(),
        "batch finished"
    );

    drop(handle);
    running.await?;
    Ok(())
}

fn print_signature(model_entry: &Path) -> Result<()> {
    let mut processor =
        Processor::initialize(&EchoBackend::new(), model_entry, &ProcessorConfig::default())?;
    let out = processor.process(&[]);
    if out.status != STATUS_OK {
        bail!(
            "model has no signature: {}",
            String::from_utf8_lossy(&out.body)
        );
    }
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&out.body)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

//! ri-indexer CLI
//!
//! Generates browsable release indexes for an S3 bucket.

use std::time::Duration;

use clap::Parser;
use ri_cli_common::{format_bytes, format_count, format_duration, init_logging};
use ri_error::RiError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod args;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_logging(args.log_level)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });

    let summary = match run::execute(args, cancel).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("err: {e:#}");
            let partial = matches!(
                e.downcast_ref::<RiError>(),
                Some(RiError::Enrichment { .. } | RiError::Render { .. })
            );
            std::process::exit(if partial { 4 } else { 1 });
        }
    };

    eprintln!();
    eprintln!("Indexing completed:");
    eprintln!("  Objects listed:   {}", format_count(summary.objects_listed as u64));
    eprintln!("  Objects indexed:  {}", format_count(summary.objects_indexed as u64));
    if summary.assets_copied > 0 {
        eprintln!("  Static assets:    {}", format_count(summary.assets_copied as u64));
    }
    eprintln!("  Directories:      {}", format_count(summary.render.directories));
    eprintln!("  Files written:    {}", format_count(summary.render.files_written));
    eprintln!("  Bytes written:    {}", format_bytes(summary.render.bytes_written));
    eprintln!(
        "  Duration:         {}",
        format_duration(Duration::from_secs_f64(summary.render.duration_secs().max(0.0)))
    );

    Ok(())
}

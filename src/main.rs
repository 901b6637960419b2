use clap::Parser;
use imprint_reader::ImprintReader;
use tokio::sync::watch;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = ImprintReader::new();
    if let Some(path) = &args.config {
        reader = reader.with_config_file(path)?;
    }

    match args.command {
        Command::Extract { url } => {
            let (result, path) = reader.extract(&url).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            ::log::info!("Result saved to {}", path.display());
        }
        Command::Batch {
            csv,
            max,
            start,
            workers,
        } => {
            if let Some(workers) = workers {
                reader = reader.with_workers(workers);
            }

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    println!("\nInterrupt received, finishing in-flight URLs...");
                    let _ = shutdown_tx.send(true);
                }
            });

            let started = chrono::Local::now();
            println!("Starting batch imprint processing");
            println!("Source file: {}", csv.display());
            println!("Started at: {}", started.format("%Y-%m-%d %H:%M:%S"));

            reader.run_batch(&csv, start, max, shutdown_rx).await?;
            println!("\nBatch processing completed!");
        }
        Command::Consolidate { results_dir } => {
            if let Some(dir) = results_dir {
                let mut config = reader.config().clone();
                config.output.results_dir = dir;
                reader = reader.with_config(config);
            }

            let summary = reader.consolidate()?;
            println!(
                "Consolidated {} files into {}",
                summary.total,
                summary.output.display()
            );
            println!("   - Successful: {}", summary.successful);
            println!("   - Failed: {}", summary.failed);
            println!("   - Success rate: {}%", summary.success_rate);
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imprint-reader")]
#[command(about = "Finds imprint/legal notice pages and extracts company details from them")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process a single URL and print the result as JSON
    Extract {
        /// Website to process (https:// is assumed if no scheme is given)
        url: String,
    },

    /// Process URLs from a CSV file (column "URL", or the first column)
    Batch {
        /// Input CSV file
        csv: PathBuf,

        /// Maximum number of rows to process
        #[arg(short, long)]
        max: Option<usize>,

        /// Number of rows to skip before processing
        #[arg(short, long, default_value_t = 0)]
        start: usize,

        /// Number of concurrent workers (default: a tenth of the batch, 2 to 8)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Merge per-result JSON documents into one consolidated file
    Consolidate {
        /// Results directory (defaults to the configured one)
        #[arg(long)]
        results_dir: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_arguments() {
        let args = Args::parse_from([
            "imprint-reader",
            "--config",
            "reader.json",
            "batch",
            "urls.csv",
            "--max",
            "50",
            "--workers",
            "4",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("reader.json")));
        match args.command {
            Command::Batch {
                csv,
                max,
                start,
                workers,
            } => {
                assert_eq!(csv, PathBuf::from("urls.csv"));
                assert_eq!(max, Some(50));
                assert_eq!(start, 0);
                assert_eq!(workers, Some(4));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_extract_requires_url() {
        assert!(Args::try_parse_from(["imprint-reader", "extract"]).is_err());
    }
}

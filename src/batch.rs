//! Batch runs over a CSV of URLs with a bounded worker pool.

use crate::error::BatchError;
use crate::imprint::ImprintPipeline;
use crate::record;
use crate::results::ImprintResult;
use crate::sinks::ResultStore;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc, watch};

/// Completions between progress reports
const PROGRESS_EVERY: usize = 10;

/// Builds one pipeline per worker
pub type PipelineFactory = dyn Fn() -> Result<ImprintPipeline, BatchError> + Send + Sync;

/// One URL queued for processing, with its 1-based position in the input
#[derive(Debug, Clone)]
struct Job {
    position: usize,
    url: String,
}

/// Running totals for a batch
#[derive(Debug, Clone)]
pub struct BatchStats {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Processed URLs whose result could not be written to disk
    pub unsaved: usize,
    pub started: Instant,
}

impl BatchStats {
    fn new() -> Self {
        Self {
            total_processed: 0,
            successful: 0,
            failed: 0,
            unsaved: 0,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Percentage of processed URLs that yielded a record
    pub fn success_rate(&self) -> f64 {
        self.successful as f64 / self.total_processed.max(1) as f64 * 100.0
    }

    pub fn average_secs(&self) -> f64 {
        self.elapsed().as_secs_f64() / self.total_processed.max(1) as f64
    }
}

/// Worker count when none is configured: a tenth of the batch, within 2..=8
pub fn default_workers(batch_len: usize) -> usize {
    (batch_len / 10).clamp(2, 8)
}

/// Read URLs from a CSV file with a header row
///
/// The column named `URL` (any case) is used, or the first column if there
/// is none. `start`/`max` select rows before blank values are dropped.
pub fn load_urls(path: &Path, start: usize, max: Option<usize>) -> Result<Vec<String>, BatchError> {
    let file = File::open(path).map_err(|source| BatchError::Input {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(BatchError::NoColumns);
    }
    let column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("url"))
        .unwrap_or(0);

    let mut urls = Vec::new();
    for record in reader
        .records()
        .skip(start)
        .take(max.unwrap_or(usize::MAX))
    {
        let record = record?;
        if let Some(url) = record.get(column).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }

    ::log::info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Process `urls` with `workers` concurrent pipelines
///
/// Every URL that is dispatched produces exactly one stored result. Once
/// `shutdown` turns true no new URLs are dispatched; in-flight ones finish.
pub async fn run_batch(
    urls: Vec<String>,
    workers: usize,
    factory: &PipelineFactory,
    store: Arc<ResultStore>,
    shutdown: watch::Receiver<bool>,
) -> Result<BatchStats, BatchError> {
    let total = urls.len();
    let workers = workers.clamp(1, total.max(1));

    // Build every pipeline first so a setup error aborts before any work starts
    let pipelines = (0..workers)
        .map(|_| factory().map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;

    let (job_tx, job_rx) = mpsc::unbounded_channel();
    for (i, url) in urls.into_iter().enumerate() {
        // The receiver is alive until the workers finish
        let _ = job_tx.send(Job {
            position: i + 1,
            url,
        });
    }
    drop(job_tx);

    let job_rx = Arc::new(Mutex::new(job_rx));
    let stats = Arc::new(Mutex::new(BatchStats::new()));

    println!("Processing {} URLs with {} workers", total, workers);

    let handles: Vec<_> = pipelines
        .into_iter()
        .enumerate()
        .map(|(worker_id, pipeline)| {
            tokio::spawn(worker_loop(
                worker_id,
                pipeline,
                Arc::clone(&job_rx),
                Arc::clone(&store),
                Arc::clone(&stats),
                shutdown.clone(),
                total,
            ))
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await {
            ::log::error!("Worker task failed: {}", e);
        }
    }

    if *shutdown.borrow() {
        println!("\nProcessing interrupted by user");
    }

    let stats = stats.lock().await.clone();
    print_final_statistics(&stats, workers);
    Ok(stats)
}

async fn worker_loop(
    worker_id: usize,
    pipeline: Arc<ImprintPipeline>,
    job_rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    store: Arc<ResultStore>,
    stats: Arc<Mutex<BatchStats>>,
    shutdown: watch::Receiver<bool>,
    total: usize,
) {
    ::log::debug!("Worker {} started", worker_id);

    loop {
        if *shutdown.borrow() {
            ::log::info!("Worker {} stopping: shutdown requested", worker_id);
            break;
        }

        let Some(job) = job_rx.lock().await.recv().await else {
            break;
        };

        println!("[{}/{}] Processing: {}", job.position, total, job.url);
        let result = process_isolated(&pipeline, &job.url).await;

        let saved = match store.record(&result).await {
            Ok(_) => true,
            Err(e) => {
                ::log::error!("Failed to save result for {}: {}", job.url, e);
                false
            }
        };

        report(&result);

        let mut totals = stats.lock().await;
        totals.total_processed += 1;
        if !saved {
            totals.unsaved += 1;
        }
        if result.is_success() {
            totals.successful += 1;
        } else {
            totals.failed += 1;
        }
        if totals.total_processed % PROGRESS_EVERY == 0 {
            print_progress(&totals, total);
        }
    }

    pipeline.close().await;
    ::log::debug!("Worker {} finished", worker_id);
}

/// Run one URL in its own task so a panic becomes an error result
async fn process_isolated(pipeline: &Arc<ImprintPipeline>, url: &str) -> ImprintResult {
    let task = {
        let pipeline = Arc::clone(pipeline);
        let url = url.to_string();
        tokio::spawn(async move { pipeline.process_input(&url).await })
    };

    match task.await {
        Ok(result) => result,
        Err(e) => {
            let reason = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            ::log::error!("Processing {} failed: {}", url, reason);
            ImprintResult::failure(url, format!("Processing error: {}", reason))
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

fn report(result: &ImprintResult) {
    match result.extracted_fields.data() {
        Some(data) => {
            println!("SUCCESS: Found imprint data");
            println!("   - Company: {}", record::company_name(data).unwrap_or("N/A"));
            if let Some(url) = &result.imprint_url {
                println!("   - Imprint URL: {}", url);
            }
        }
        None => println!(
            "FAILED: {} ({})",
            result.original_url,
            result.extracted_fields.error_message().unwrap_or("unknown error")
        ),
    }
}

fn print_progress(stats: &BatchStats, total: usize) {
    println!("\nProgress Update:");
    println!("   - Completed: {}/{}", stats.total_processed, total);
    println!("   - Successful: {}", stats.successful);
    println!("   - Failed: {}", stats.failed);
    println!("   - Elapsed: {:.1}s", stats.elapsed().as_secs_f64());
    println!("   - Avg time per URL: {:.1}s", stats.average_secs());
}

fn print_final_statistics(stats: &BatchStats, workers: usize) {
    println!("\n{}", "=".repeat(80));
    println!("FINAL STATISTICS");
    println!("{}", "=".repeat(80));
    println!("Total URLs processed: {}", stats.total_processed);
    println!("Successful extractions: {}", stats.successful);
    println!("Failed attempts: {}", stats.failed);
    if stats.unsaved > 0 {
        println!("Results not saved: {}", stats.unsaved);
    }
    println!("Success rate: {:.1}%", stats.success_rate());
    println!("Total time: {:.1}s", stats.elapsed().as_secs_f64());
    println!("Average time per URL: {:.1}s", stats.average_secs());
    println!("Workers: {}", workers);
}

//! Rate-limited batch driver for remote creation calls.
//!
//! Items are processed in fixed-size batches, concurrently within a batch,
//! with a sleep between batches. A failed item is tallied and logged, never
//! fatal: one bad record must not sink the rest of the run.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;

#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
	pub batch_size: usize,
	pub sleep: Duration,
}

impl Default for BatchOptions {
	fn default() -> Self {
		Self {
			batch_size: 20,
			sleep: Duration::from_millis(2000),
		}
	}
}

#[derive(Debug, Default)]
pub struct BatchSummary {
	pub successful: usize,
	pub failed: usize,
	pub elapsed: Duration,
}

/// Run `processor` over every item, `batch_size` at a time. The second
/// argument to the processor is the item's index in the original order.
pub async fn process_batches<T, F, Fut, R>(items: Vec<T>, options: BatchOptions, processor: F) -> BatchSummary
where
	F: Fn(T, usize) -> Fut,
	Fut: Future<Output = Result<R>>,
{
	let started = Instant::now();
	let total = items.len();
	let batch_size = options.batch_size.max(1);
	let mut summary = BatchSummary::default();

	let mut remaining = items.into_iter().enumerate().peekable();
	let mut batch_index = 0usize;
	while remaining.peek().is_some() {
		let batch: Vec<(usize, T)> = remaining.by_ref().take(batch_size).collect();
		tracing::debug!(batch = batch_index, size = batch.len(), total, "processing batch");

		let results = futures::future::join_all(batch.into_iter().map(|(i, item)| processor(item, i))).await;
		for result in results {
			match result {
				Ok(_) => summary.successful += 1,
				Err(e) => {
					summary.failed += 1;
					tracing::warn!("batch item failed: {e:#}");
				}
			}
		}

		batch_index += 1;
		if remaining.peek().is_some() {
			tokio::time::sleep(options.sleep).await;
		}
	}

	summary.elapsed = started.elapsed();
	tracing::info!(successful = summary.successful, failed = summary.failed, elapsed = ?summary.elapsed, "batch run finished");
	summary
}

//! Bounded task submission
//!
//! Independent assemblies (one per package) overlap their network latency
//! through [`run_bounded`]. The assemblies themselves stay sequential.

use std::future::Future;
use std::time::Instant;

use futures::StreamExt;
use tracing::debug;

/// Output of one named job
#[derive(Debug)]
pub struct JobOutput<T> {
    pub name: String,
    pub output: T,
    pub elapsed_ms: u64,
}

/// Run named jobs with at most `max_workers` in flight.
///
/// Outputs come back in submission order. `max_workers` of zero is treated
/// as one.
pub async fn run_bounded<F, T>(jobs: Vec<(String, F)>, max_workers: usize) -> Vec<JobOutput<T>>
where
    F: Future<Output = T>,
{
    let workers = max_workers.max(1);
    let mut results = Vec::with_capacity(jobs.len());
    debug!(jobs = jobs.len(), workers, "Submitting jobs");

    let mut stream = futures::stream::iter(jobs)
        .map(|(name, job)| async move {
            let start = Instant::now();
            let output = job.await;
            JobOutput {
                name,
                output,
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        })
        .buffered(workers);

    while let Some(done) = stream.next().await {
        debug!(job = %done.name, elapsed_ms = done.elapsed_ms, "Job finished");
        results.push(done);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn tracked(
        delay_ms: u64,
        value: u32,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    ) -> impl Future<Output = u32> {
        async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            value
        }
    }

    fn jobs(
        running: &Arc<AtomicUsize>,
        peak: &Arc<AtomicUsize>,
    ) -> Vec<(String, impl Future<Output = u32>)> {
        [(30, 1), (5, 2), (10, 3)]
            .into_iter()
            .map(|(delay, value)| {
                (
                    format!("job-{value}"),
                    tracked(delay, value, running.clone(), peak.clone()),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_preserves_submission_order() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(jobs(&running, &peak), 2).await;

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["job-1", "job-2", "job-3"]);
        let values: Vec<_> = results.iter().map(|r| r.output).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_worker_runs_one_at_a_time() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(jobs(&running, &peak), 0).await;

        assert_eq!(results.len(), 3);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_job_list() {
        let results = run_bounded(Vec::<(String, std::future::Ready<()>)>::new(), 2).await;
        assert!(results.is_empty());
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use image::RgbaImage;
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, info_span, warn};

use super::plan::BatchJob;
use crate::compare::{self, ComparisonResult};
use crate::config::ComparisonConfig;
use crate::decode;

/// Per-pair outcome.
pub enum PairOutcome {
    Scored {
        result: ComparisonResult,
        /// Present only when the run asked for diff images.
        diff_image: Option<RgbaImage>,
        elapsed: Duration,
    },
    Failed(String),
    Cancelled,
}

/// Shared stop flag, checked by workers before each pair.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Decode both images and score them. Runs on the blocking pool.
fn score_pair(
    job: &BatchJob,
    config: &ComparisonConfig,
    save_diff: bool,
) -> Result<(ComparisonResult, Option<RgbaImage>)> {
    let rendered = decode::open(&job.rendered)?;
    let reference = decode::open(&job.reference)?;
    if save_diff {
        let (result, diff) = compare::compare_with_diff(&rendered, &reference, config)?;
        Ok((result, Some(diff)))
    } else {
        Ok((compare::compare(&rendered, &reference, config)?, None))
    }
}

async fn drain_cancelled(
    queue: &Mutex<Vec<BatchJob>>,
    tx: &mpsc::Sender<(BatchJob, PairOutcome)>,
) {
    while let Some(job) = queue.lock().await.pop() {
        let _ = tx.send((job, PairOutcome::Cancelled)).await;
    }
}

/// Score `jobs` on up to `parallel` workers sharing one queue.
///
/// Returns a `Receiver` immediately; outcomes stream in as pairs finish and
/// the channel closes once every job has been reported.
pub fn run(
    jobs: Vec<BatchJob>,
    config: ComparisonConfig,
    parallel: usize,
    save_diff: bool,
    cancel: CancelToken,
) -> mpsc::Receiver<(BatchJob, PairOutcome)> {
    let job_count = jobs.len();
    let worker_count = job_count.min(parallel.max(1));
    debug!(jobs = job_count, workers = worker_count, parallel, "starting batch");

    let (tx, rx) = mpsc::channel(parallel.max(1) * 2);
    if jobs.is_empty() {
        return rx;
    }

    // Workers pop from the back.
    let mut jobs = jobs;
    jobs.reverse();
    let queue = Arc::new(Mutex::new(jobs));
    let config = Arc::new(config);

    let mut set = tokio::task::JoinSet::new();
    for idx in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        let span = info_span!("worker", id = idx);
        set.spawn(
            async move {
                debug!("started");
                loop {
                    if cancel.is_cancelled() {
                        debug!("cancelled, draining remaining jobs");
                        drain_cancelled(&queue, &tx).await;
                        break;
                    }

                    let (job, remaining) = {
                        let mut q = queue.lock().await;
                        match q.pop() {
                            Some(j) => {
                                let remaining = q.len();
                                (j, remaining)
                            }
                            None => {
                                debug!("queue empty, exiting");
                                break;
                            }
                        }
                    };
                    debug!(camera = %job.camera, remaining, "picked job");

                    let started = Instant::now();
                    let task_job = job.clone();
                    let task_config = config.clone();
                    let outcome = match tokio::task::spawn_blocking(move || {
                        score_pair(&task_job, &task_config, save_diff)
                    })
                    .await
                    {
                        Ok(Ok((result, diff_image))) => {
                            debug!(
                                psnr = result.psnr,
                                ssim = result.ssim,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "scored"
                            );
                            PairOutcome::Scored {
                                result,
                                diff_image,
                                elapsed: started.elapsed(),
                            }
                        }
                        Ok(Err(e)) => {
                            warn!(
                                camera = %job.camera,
                                error = %format!("{e:#}"),
                                "comparison failed"
                            );
                            PairOutcome::Failed(format!("{e:#}"))
                        }
                        Err(e) => {
                            warn!(camera = %job.camera, error = %e, "comparison task panicked");
                            PairOutcome::Failed(format!("Comparison task panicked: {e}"))
                        }
                    };

                    if tx.send((job, outcome)).await.is_err() {
                        warn!("channel send failed (receiver dropped), stopping");
                        break;
                    }
                }
                debug!("exiting");
            }
            .instrument(span),
        );
    }

    // Channel closes once every worker's sender is gone.
    drop(tx);

    tokio::spawn(async move {
        while let Some(result) = set.join_next().await {
            match result {
                Ok(()) => debug!("worker task joined"),
                Err(e) => warn!(error = %e, "worker task panicked"),
            }
        }
        debug!("all workers done");
    });

    rx
}

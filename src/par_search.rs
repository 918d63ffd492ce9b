use crate::digest::Digester;
use crate::keygen::KeyGenerator;
use crate::search::{self, SearchConfig, SearchOutcome};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time;

/// A worker's contiguous slice `[start, end)` of the global key-index space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub rank: usize,
    pub start: usize,
    pub end: usize,
}

impl Shard {
    /// Shards are `total_keys / workers` long. When that division truncates, the tail of the
    /// index space belongs to no worker.
    pub fn for_rank(rank: usize, workers: usize, total_keys: usize) -> Self {
        let shard_size = total_keys / workers;
        Shard {
            rank,
            start: rank * shard_size,
            end: (rank + 1) * shard_size,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

pub fn partition(workers: usize, total_keys: usize) -> Vec<Shard> {
    (0..workers)
        .map(|rank| Shard::for_rank(rank, workers, total_keys))
        .collect()
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub workers: usize,
    /// Base seed; each worker seeds its generator with `seed + rank`
    pub seed: u64,
    /// Give up waiting for reports after this long, reporting whatever arrived
    pub barrier_timeout: Option<time::Duration>,
    pub search: SearchConfig,
}

impl RunConfig {
    pub fn new(workers: usize, search: SearchConfig) -> Self {
        RunConfig {
            workers,
            seed: wall_clock_seed(),
            barrier_timeout: None,
            search,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.workers == 0 {
            return Err("At least one worker is required");
        }
        if self.search.total_keys == 0 {
            return Err("The key-index space must not be empty");
        }
        if self.search.key_length == 0 {
            return Err("Keys must be at least one symbol long");
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig::new(num_cpus::get(), SearchConfig::default())
    }
}

fn wall_clock_seed() -> u64 {
    time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub rank: usize,
    pub elapsed: time::Duration,
    pub outcome: Result<SearchOutcome, &'static str>,
}

/// Result of the elapsed-time reduction across all workers
#[derive(Debug)]
pub struct Summary {
    pub workers: usize,
    /// Reports in rank order, only for the ranks that reported
    pub reports: Vec<WorkerReport>,
    /// Ranks that never reported before the channel closed or the deadline passed
    pub missing: Vec<usize>,
}

impl Summary {
    /// Sum of every received elapsed-time sample, in seconds
    pub fn total_time(&self) -> f64 {
        self.reports.iter().map(|r| r.elapsed.as_secs_f64()).sum()
    }

    pub fn collisions(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Ok(SearchOutcome::Collision(_))))
            .count()
    }

    pub fn failed(&self) -> Vec<(usize, &'static str)> {
        self.reports
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|&e| (r.rank, e)))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.reports.iter().all(|r| r.outcome.is_ok())
    }
}

#[derive(Clone)]
struct WorkerInit<F> {
    tx: mpsc::Sender<WorkerReport>,
    stop: Arc<AtomicBool>,
    config: RunConfig,
    make_digester: F,
}

/// Runs one independent search per rank and reduces their elapsed times
///
/// Workers share nothing but the report channel. Each builds its own digester through
/// `make_digester(rank)`, so a fault stays local to that worker and shows up in the summary as a
/// failed rank rather than stalling the reduction. When the reduction gives up at the deadline,
/// the remaining workers are told to stop and `run` returns only once none of them is hashing.
pub fn run<F, D>(config: &RunConfig, make_digester: F) -> Result<Summary, &'static str>
where
    F: Fn(usize) -> D + Clone + Send + 'static,
    D: Digester,
{
    config.validate()?;

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
    {
        Ok(pool) => pool,
        Err(_) => return Err("Could not start the worker pool"),
    };

    let (worker_tx, worker_rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let init = WorkerInit {
        tx: worker_tx,
        stop: stop.clone(),
        config: config.clone(),
        make_digester,
    };
    let shards = partition(config.workers, config.search.total_keys);

    // The launcher blocks until every worker is done, so it gets its own thread and the reduction
    // below can stop waiting at the deadline.
    let launcher = thread::spawn(move || {
        pool.install(|| {
            shards
                .into_par_iter()
                .for_each_with(init, |init, shard| hash_worker(init, shard))
        })
    });

    let summary = reduce(worker_rx, config.workers, config.barrier_timeout);

    stop.store(true, Ordering::Relaxed);
    if launcher.join().is_err() {
        eprintln!("A worker panicked before reporting");
    }

    Ok(summary)
}

fn hash_worker<F, D>(init: &mut WorkerInit<F>, shard: Shard)
where
    F: Fn(usize) -> D,
    D: Digester,
{
    let start = time::Instant::now();
    let config = &init.config;
    let rank = shard.rank;

    println!(
        "Process {}: Searching keys {} to {}",
        rank, shard.start, shard.end
    );

    let mut keys = KeyGenerator::new(config.seed, rank);
    let mut digester = (init.make_digester)(rank);
    let outcome = search::find_collision(
        &shard,
        &config.search,
        &mut keys,
        &mut digester,
        &init.stop,
    );

    let report = WorkerReport {
        rank,
        elapsed: start.elapsed(),
        outcome,
    };
    // Nobody listens any more once the reduction has given up
    if let Err(e) = init.tx.send(report) {
        if !init.stop.load(Ordering::Relaxed) {
            eprintln!("Process {}: could not report result: {}", rank, e);
        }
    }
}

fn reduce(
    worker_rx: mpsc::Receiver<WorkerReport>,
    workers: usize,
    timeout: Option<time::Duration>,
) -> Summary {
    let deadline = timeout.map(|t| time::Instant::now() + t);
    let mut slots: Vec<Option<WorkerReport>> = vec![None; workers];
    let mut received = 0;

    while received < workers {
        let report = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(time::Instant::now());
                match worker_rx.recv_timeout(remaining) {
                    Ok(report) => report,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        eprintln!("Reduction timed out after {:?}", timeout.unwrap_or_default());
                        break;
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match worker_rx.recv() {
                Ok(report) => report,
                Err(_) => break,
            },
        };

        let rank = report.rank;
        if slots[rank].replace(report).is_none() {
            received += 1;
        }
    }

    let missing = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(rank, _)| rank)
        .collect();

    Summary {
        workers,
        reports: slots.into_iter().flatten().collect(),
        missing,
    }
}

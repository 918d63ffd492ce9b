mod digest;
mod keygen;
mod par_search;
mod search;
mod sweep;
mod table;

use std::process;
use std::time;
use structopt::StructOpt;

use par_search::RunConfig;
use search::SearchConfig;

/// Searches for MD5 collisions among random keys
///
/// The key-index space is split evenly across workers. Each worker repeatedly walks its shard,
/// digesting a fresh random key per index and comparing it with the digest it stored at that
/// index on the previous pass. Workers never exchange digests; the only shared step is summing
/// their elapsed times at the end.
#[derive(Debug, StructOpt)]
struct Cli {
    /// Number of workers, defaults to the number of CPUs
    #[structopt(short, long)]
    workers: Option<usize>,
    /// Size of the key-index space shared out between workers [default: 1000000]
    #[structopt(short, long)]
    keys: Option<usize>,
    /// Passes over each shard before giving up [default: 250]
    #[structopt(short, long)]
    retries: Option<u32>,
    /// Symbols per generated key [default: 31]
    #[structopt(short = "l", long)]
    key_length: Option<usize>,
    /// Base seed for the key generators, defaults to the current time
    #[structopt(long)]
    seed: Option<u64>,
    /// Seconds to wait for all workers to report before printing partial results
    #[structopt(long)]
    barrier_timeout: Option<u64>,
    /// Log per-attempt throughput
    #[structopt(short, long)]
    verbose: bool,
    /// Run once per listed worker count and print a timing table
    #[structopt(long, use_delimiter = true)]
    sweep: Vec<usize>,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let defaults = SearchConfig::default();
        let search = SearchConfig {
            total_keys: self.keys.unwrap_or(defaults.total_keys),
            key_length: self.key_length.unwrap_or(defaults.key_length),
            max_retries: self.retries.unwrap_or(defaults.max_retries),
            verbose: self.verbose,
        };
        let mut config = RunConfig::new(self.workers.unwrap_or_else(num_cpus::get), search);
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.barrier_timeout = self.barrier_timeout.map(time::Duration::from_secs);
        config
    }
}

fn main() {
    let args = Cli::from_args();
    let config = args.run_config();

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        process::exit(2);
    }

    if !args.sweep.is_empty() {
        match sweep::run_sweep(&config, &args.sweep) {
            Ok(points) => {
                print!("{}", sweep::format_table(&points));
                if sweep::any_failed(&points) {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                process::exit(2);
            }
        }
        return;
    }

    let summary = match par_search::run(&config, |_| digest::Md5) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    println!("Total execution time: {:.6} seconds", summary.total_time());

    for (rank, e) in summary.failed() {
        eprintln!("Process {}: failed: {}", rank, e);
    }
    for rank in &summary.missing {
        eprintln!("Process {}: did not report", rank);
    }
    if !summary.is_complete() {
        process::exit(1);
    }
}

use crate::digest::Md5;
use crate::par_search::{self, RunConfig};

/// Totals of one full run at a given worker count
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub workers: usize,
    pub total_time: f64,
    pub collisions: usize,
    /// Ranks that faulted or never reported
    pub failed: usize,
}

/// Repeats the whole search once per worker count, keeping everything else in `base` fixed.
///
/// Every count is validated before the first run, so a bad list fails without partial results.
pub fn run_sweep(base: &RunConfig, worker_counts: &[usize]) -> Result<Vec<SweepPoint>, &'static str> {
    let configs = worker_counts
        .iter()
        .map(|&workers| {
            let config = RunConfig {
                workers,
                ..base.clone()
            };
            config.validate().map(|_| config)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut points = Vec::with_capacity(configs.len());
    for config in &configs {
        eprintln!("Sweep: running with {} workers", config.workers);
        let summary = par_search::run(config, |_| Md5)?;

        points.push(SweepPoint {
            workers: summary.workers,
            total_time: summary.total_time(),
            collisions: summary.collisions(),
            failed: summary.failed().len() + summary.missing.len(),
        });
    }

    Ok(points)
}

pub fn any_failed(points: &[SweepPoint]) -> bool {
    points.iter().any(|p| p.failed > 0)
}

pub fn format_table(points: &[SweepPoint]) -> String {
    let mut table = format!(
        "{:>8} {:>16} {:>11} {:>7}\n",
        "workers", "total time (s)", "collisions", "failed"
    );
    for point in points {
        table.push_str(&format!(
            "{:>8} {:>16.6} {:>11} {:>7}\n",
            point.workers, point.total_time, point.collisions, point.failed
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchConfig;

    #[test]
    fn one_point_per_worker_count() {
        let base = RunConfig {
            seed: 99,
            ..RunConfig::new(
                1,
                SearchConfig {
                    total_keys: 240,
                    max_retries: 2,
                    ..SearchConfig::default()
                },
            )
        };

        let points = run_sweep(&base, &[1, 2, 4, 8]).unwrap();

        assert_eq!(
            points.iter().map(|p| p.workers).collect::<Vec<_>>(),
            vec![1, 2, 4, 8]
        );
        assert!(points.iter().all(|p| p.failed == 0 && p.total_time >= 0.0));
    }

    #[test]
    fn zero_workers_aborts_the_sweep_before_any_run() {
        let base = RunConfig::new(
            1,
            SearchConfig {
                total_keys: 100,
                max_retries: 1,
                ..SearchConfig::default()
            },
        );
        let started = std::time::Instant::now();
        assert_eq!(
            run_sweep(&base, &[2, 0]),
            Err("At least one worker is required")
        );
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn sweep_counts_failed_ranks() {
        let points = vec![SweepPoint {
            workers: 2,
            total_time: 0.5,
            collisions: 0,
            failed: 1,
        }];
        assert!(any_failed(&points));
        assert!(!any_failed(&[]));
    }

    #[test]
    fn table_has_a_row_per_point() {
        let points = vec![
            SweepPoint {
                workers: 1,
                total_time: 15.34,
                collisions: 1,
                failed: 0,
            },
            SweepPoint {
                workers: 8,
                total_time: 3.45,
                collisions: 0,
                failed: 1,
            },
        ];
        let table = format_table(&points);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("workers"));
        assert!(lines[1].trim_start().starts_with("1 "));
        assert!(lines[1].contains("15.340000"));
        assert!(lines[2].ends_with(" 1"));
    }
}

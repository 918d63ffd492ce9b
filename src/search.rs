use crate::digest::{Digester, HexDigest};
use crate::keygen::{Key, KeyGenerator};
use crate::par_search::Shard;
use crate::table::{CollisionTable, Lookup};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time;

pub const KEY_COUNT: usize = 1_000_000;
pub const MAX_KEY_LENGTH: usize = 32;
pub const MAX_RETRIES: u32 = 250;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Size of the global key-index space
    pub total_keys: usize,
    /// Symbols per generated key
    pub key_length: usize,
    /// Passes over the shard before giving up
    pub max_retries: u32,
    /// Log per-attempt throughput to stderr
    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            total_keys: KEY_COUNT,
            key_length: MAX_KEY_LENGTH - 1,
            max_retries: MAX_RETRIES,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub index: usize,
    /// Zero-based attempt in which the slot was revisited
    pub attempt: u32,
    pub hash: HexDigest,
    pub key: Key,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Collision(Collision),
    Exhausted { attempts: u32 },
    /// Abandoned through the stop flag after `attempts` complete passes
    Stopped { attempts: u32 },
}

/// Searches one worker's shard for a repeated digest
///
/// Every attempt walks the shard in increasing index order, generating a fresh key for each index
/// and comparing its digest with whatever the table holds for that slot. The table is kept between
/// attempts, so a collision is reported as soon as a slot sees the same digest again. Gives up
/// after `config.max_retries` attempts without one.
///
/// `stop` is checked before every key; once it is set no further digest is computed.
///
/// The only error is a digester fault, which ends the search immediately.
pub fn find_collision<D: Digester>(
    shard: &Shard,
    config: &SearchConfig,
    keys: &mut KeyGenerator,
    digester: &mut D,
    stop: &AtomicBool,
) -> Result<SearchOutcome, &'static str> {
    let mut table = CollisionTable::new(shard, config.total_keys);
    let mut key = keys.generate(config.key_length);
    let mut attempts = 0;

    while attempts < config.max_retries {
        let attempt = attempts;
        let loop_start = time::Instant::now();

        for index in shard.start..shard.end {
            if stop.load(Ordering::Relaxed) {
                return Ok(SearchOutcome::Stopped { attempts });
            }
            keys.fill(&mut key);
            let digest = match digester.digest(key.as_bytes()) {
                Ok(digest) => digest,
                Err(e) => {
                    eprintln!("Process {}: digest failed: {}", shard.rank, e);
                    return Err(e);
                }
            };
            let hash = HexDigest::encode(&digest);

            if table.lookup(index, &hash) == Lookup::Equal {
                println!(
                    "Process {}: Collision found for hash {} (key: {})",
                    shard.rank, hash, key
                );
                return Ok(SearchOutcome::Collision(Collision {
                    index,
                    attempt,
                    hash,
                    key,
                }));
            }
            table.store(index, hash);
        }
        attempts += 1;

        if config.verbose {
            let iter_rate = (table.len() as f32) / loop_start.elapsed().as_secs_f32();
            eprintln!(
                "Process {}: attempt {} hashed {} keys, running {} keys / s",
                shard.rank,
                attempts,
                table.len(),
                iter_rate
            );
        }

        println!(
            "Process {}: No collision found, retrying ({}/{})",
            shard.rank,
            attempts,
            config.max_retries
        );
    }

    Ok(SearchOutcome::Exhausted { attempts })
}

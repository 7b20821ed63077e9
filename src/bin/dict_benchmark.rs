use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use hdrhistogram::Histogram;
use redis_dict::config::DictConfig;
use redis_dict::dict::lib::random_ulong;
use redis_dict::dict::{Dict, DictType};
use redis_dict::Result;
use tracing::info;

#[derive(Parser, Clone, Debug)]
struct BenchmarkConfig {
    #[arg(short, long, default_value_t = 100000)]
    pub keys: u64,
    #[arg(short, long, num_args = 1..)]
    pub tests: Vec<String>,
    /// dict config file (toml or json)
    #[arg(short, long)]
    pub config: Option<String>,
}

type BenchDict = Dict<String, u64>;

fn test_is_selected(tests: &[String], name: &str) -> bool {
    tests.is_empty() || tests.iter().any(|t| t == name)
}

fn report(name: &str, count: u64, hist: &Histogram<u64>, total_ms: f64) {
    println!("======{}======", name.to_uppercase());
    println!(" {} operations completed in {:.3} ms", count, total_ms);
    println!(
        " Throughput: {:.2} ops per second",
        count as f64 / (total_ms / 1000f64).max(f64::EPSILON)
    );
    println!(" Latency summary (ns):");
    println!("     {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}", "avg", "min", "p50", "p95", "p99", "max");
    println!(
        "     {:>8.0} {:>8} {:>8} {:>8} {:>8} {:>8}",
        hist.mean(),
        hist.min(),
        hist.value_at_quantile(0.5),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.max()
    );
}

/// Times `op` once per iteration and prints the latency distribution.
fn run<F>(name: &str, count: u64, d: &mut BenchDict, mut op: F) -> Result<()>
where
    F: FnMut(&mut BenchDict, u64),
{
    let mut hist = Histogram::<u64>::new_with_bounds(1, 3_600_000, 3)?;
    let st = Instant::now();
    for j in 0..count {
        let start = Instant::now();
        op(d, j);
        hist.saturating_record(start.elapsed().as_nanos() as u64);
    }
    let total_ms = st.elapsed().as_secs_f64() * 1000f64;
    report(name, count, &hist, total_ms);
    Ok(())
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let config = BenchmarkConfig::parse();
    let dict_config = DictConfig::new(config.config.as_deref());
    dict_config.apply_hash_seed();
    info!(?dict_config, keys = config.keys, "dict benchmark");

    let dict_type = Arc::new(DictType::heap_string_copy_key());
    let mut d: BenchDict = Dict::with_config(dict_type, (), dict_config);
    let count = config.keys;
    let tests = &config.tests;

    if test_is_selected(tests, "insert") {
        run("insert", count, &mut d, |d, j| {
            let _ = d.add(j.to_string(), j);
        })?;
        assert_eq!(d.dict_size() as u64, count);
    }

    if test_is_selected(tests, "rehash") {
        let st = Instant::now();
        let mut batches = 0;
        while d.is_rehashing() {
            d.rehash_milliseconds(100);
            batches += 1;
        }
        println!("======REHASH======");
        println!(
            " drained in {} batches, {:.3} ms",
            batches,
            st.elapsed().as_secs_f64() * 1000f64
        );
    }

    if test_is_selected(tests, "find") {
        run("find", count, &mut d, |d, j| {
            let _ = d.find(&j.to_string());
        })?;
    }

    if test_is_selected(tests, "random_find") {
        run("random_find", count, &mut d, |d, _| {
            let key = (random_ulong() % count.max(1)).to_string();
            let _ = d.find(&key);
        })?;
    }

    if test_is_selected(tests, "missing") {
        run("missing", count, &mut d, |d, _| {
            let key = format!("miss{}", random_ulong());
            let _ = d.find(&key);
        })?;
    }

    if test_is_selected(tests, "random_key") {
        run("random_key", count, &mut d, |d, _| {
            let _ = d.get_random_key();
        })?;
    }

    if test_is_selected(tests, "fair_random_key") {
        run("fair_random_key", count, &mut d, |d, _| {
            let _ = d.get_fair_random_key();
        })?;
    }

    if test_is_selected(tests, "delete_add") {
        run("delete_add", count, &mut d, |d, j| {
            let key = j.to_string();
            let _ = d.delete(&key);
            let _ = d.add(format!("{}!", key), j);
        })?;
    }

    print!("{}", d.get_stats());
    Ok(())
}

// Thread-pool setup for the per-file instrumentation fan-out.

use anyhow::{Context, Result};

/// Initialize the global rayon thread pool. `jobs` of `None` uses every
/// available core; instrumentation is CPU-bound and runs to completion, so
/// nothing is held back.
pub fn init_thread_pool(jobs: Option<usize>) -> Result<usize> {
    let workers = match jobs {
        Some(n) => std::cmp::max(1, n),
        None => num_cpus::get(),
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .context("initializing thread pool")?;

    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_thread_pool() {
        // The global pool can only be built once per process; a second
        // initialization (from another test binary run order) reports an
        // error, which is acceptable here.
        match init_thread_pool(Some(2)) {
            Ok(workers) => assert_eq!(workers, 2),
            Err(_) => {}
        }
    }
}

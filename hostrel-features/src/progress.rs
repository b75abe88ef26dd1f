//! Progress reporting for the feature pass

use std::time::Instant;
use tracing::info;

/// Receives progress of a batch over a known number of hosts
pub trait ProgressSink {
    fn start(&mut self, total: u64);

    fn inc(&mut self);
}

/// Logs `processed/total` every `update_every` hosts and on the last one
#[derive(Debug)]
pub struct LogProgress {
    update_every: u64,
    total: u64,
    done: u64,
    started: Option<Instant>,
}

impl LogProgress {
    pub fn new(update_every: u64) -> Self {
        Self {
            update_every: update_every.max(1),
            total: 0,
            done: 0,
            started: None,
        }
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    /// True when the current count is due for a log line
    fn should_report(&self) -> bool {
        self.done % self.update_every == 0 || self.done == self.total
    }
}

impl ProgressSink for LogProgress {
    fn start(&mut self, total: u64) {
        self.total = total;
        self.done = 0;
        self.started = Some(Instant::now());
        info!("Computing features for {} hosts", total);
    }

    fn inc(&mut self) {
        self.done += 1;
        if self.should_report() {
            let pct = if self.total == 0 {
                100.0
            } else {
                self.done as f64 * 100.0 / self.total as f64
            };
            let elapsed = self.started.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
            info!("{}/{} hosts ({:.1}%) in {:.1}s", self.done, self.total, pct, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_on_interval_and_last() {
        let mut progress = LogProgress::new(3);
        progress.start(7);

        let mut reported = Vec::new();
        for _ in 0..7 {
            progress.inc();
            if progress.should_report() {
                reported.push(progress.done());
            }
        }
        assert_eq!(reported, vec![3, 6, 7]);
    }

    #[test]
    fn test_zero_interval_clamped() {
        let mut progress = LogProgress::new(0);
        progress.start(2);
        progress.inc();
        assert!(progress.should_report());
    }
}

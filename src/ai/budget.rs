//! Soft Usage Budget
//!
//! Advisory call/seconds counters for optional polish passes. Shared by
//! every package assembled in a session; the counter pair is updated under
//! one mutex so concurrent increments are never lost.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::BudgetConfig;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    calls: u32,
    secs: f64,
}

#[derive(Debug)]
pub struct SoftBudget {
    max_calls: u32,
    max_secs: f64,
    counters: Mutex<Counters>,
}

impl SoftBudget {
    pub fn new(max_calls: u32, max_secs: f64) -> Self {
        Self {
            max_calls,
            max_secs,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.humanize_max_calls, config.humanize_max_secs)
    }

    /// Budget that never allows a call
    pub fn exhausted() -> Self {
        Self::new(0, 0.0)
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // Counters stay meaningful after a panic elsewhere
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether another call fits, without reserving it
    pub fn allows(&self) -> bool {
        let counters = self.lock();
        counters.calls < self.max_calls && counters.secs < self.max_secs
    }

    /// Reserve one call if the budget still has room
    pub fn try_begin(&self) -> bool {
        let mut counters = self.lock();
        if counters.calls < self.max_calls && counters.secs < self.max_secs {
            counters.calls += 1;
            true
        } else {
            false
        }
    }

    /// Add the wall time of a finished call
    pub fn record(&self, elapsed: Duration) {
        let mut counters = self.lock();
        counters.secs += elapsed.as_secs_f64();
    }

    pub fn stats(&self) -> BudgetStats {
        let counters = *self.lock();
        BudgetStats {
            calls: counters.calls,
            max_calls: self.max_calls,
            secs: counters.secs,
            max_secs: self.max_secs,
        }
    }
}

pub type SharedBudget = Arc<SoftBudget>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetStats {
    pub calls: u32,
    pub max_calls: u32,
    pub secs: f64,
    pub max_secs: f64,
}

impl BudgetStats {
    pub fn summary(&self) -> String {
        format!(
            "Humanize budget: {}/{} calls, {:.1}/{:.1}s",
            self.calls, self.max_calls, self.secs, self.max_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_limit() {
        let budget = SoftBudget::new(2, 100.0);
        assert!(budget.try_begin());
        assert!(budget.try_begin());
        assert!(!budget.try_begin());
        assert!(!budget.allows());
        assert_eq!(budget.stats().calls, 2);
    }

    #[test]
    fn test_seconds_limit() {
        let budget = SoftBudget::new(10, 1.0);
        assert!(budget.try_begin());
        budget.record(Duration::from_millis(1500));
        assert!(!budget.allows());
        assert!(!budget.try_begin());
    }

    #[test]
    fn test_exhausted_budget() {
        let budget = SoftBudget::exhausted();
        assert!(!budget.allows());
        assert!(!budget.try_begin());
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let budget = Arc::new(SoftBudget::new(1000, 1_000.0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        budget.try_begin();
                        budget.record(Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = budget.stats();
        assert_eq!(stats.calls, 400);
        assert!((stats.secs - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_summary() {
        let budget = SoftBudget::new(8, 20.0);
        budget.try_begin();
        assert_eq!(budget.stats().summary(), "Humanize budget: 1/8 calls, 0.0/20.0s");
    }
}

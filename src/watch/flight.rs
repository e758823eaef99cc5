// src/watch/flight.rs

//! Per-task single-flight guard for watch-triggered runs.
//!
//! ```text
//! Idle --request--> Running --request--> RunningPending
//!   ^                 |  ^                     |
//!   +-----finish------+  +-------finish--------+  (rerun)
//! ```
//!
//! Any number of triggers arriving while a run is in progress collapse into
//! exactly one rerun.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const RUNNING_PENDING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Caller owns the run and must call [`Flight::finish`] when it ends.
    Start,
    /// Folded into the in-flight run's follow-up.
    Coalesced,
}

#[derive(Debug, Default)]
pub struct Flight {
    state: AtomicU8,
    reload: AtomicBool,
}

impl Flight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, reload: bool) -> Admission {
        if reload {
            self.reload.store(true, Ordering::SeqCst);
        }

        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            let (next, admission) = match current {
                IDLE => (RUNNING, Admission::Start),
                _ => (RUNNING_PENDING, Admission::Coalesced),
            };
            match self
                .state
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return admission,
                Err(actual) => current = actual,
            }
        }
    }

    /// Take the reload request collected so far. Called when a run starts so
    /// that requests arriving during the run carry over to the rerun.
    pub fn take_reload(&self) -> bool {
        self.reload.swap(false, Ordering::SeqCst)
    }

    /// End the current run. Returns `true` if a trigger was coalesced and the
    /// caller must run again.
    pub fn finish(&self) -> bool {
        match self.state.compare_exchange(
            RUNNING_PENDING,
            RUNNING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => true,
            Err(_) => {
                self.state.store(IDLE, Ordering::SeqCst);
                false
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::SeqCst) == IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_during_run_yields_one_rerun() {
        let flight = Flight::new();
        assert_eq!(flight.request(false), Admission::Start);
        for _ in 0..5 {
            assert_eq!(flight.request(false), Admission::Coalesced);
        }

        assert!(flight.finish(), "one rerun owed");
        assert!(!flight.finish(), "nothing owed after the rerun");
        assert!(flight.is_idle());
    }

    #[test]
    fn reload_request_survives_into_rerun() {
        let flight = Flight::new();
        assert_eq!(flight.request(false), Admission::Start);
        assert!(!flight.take_reload());

        assert_eq!(flight.request(true), Admission::Coalesced);
        assert!(flight.finish());
        assert!(flight.take_reload());
    }
}

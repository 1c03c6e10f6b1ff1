//! Trace replay driver.
//!
//! Owns the policy instances for one run and streams a trace through
//! them. The trace is read once; every event is broadcast to every
//! policy, so a single pass can compare policy families and rank
//! exponents side by side.

use crate::config::Config;
use crate::error::SimError;
use crate::event::AccessEvent;
use crate::parser::TraceReader;
use crate::policy::{build_policies, Policy};
use crate::stats::PolicyStats;

/// One simulation run: a set of policies replaying a shared trace.
pub struct Simulation {
    policies: Vec<Box<dyn Policy>>,
}

impl Simulation {
    /// Builds the policies a configuration asks for.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        let policies = build_policies(config)?;
        log::info!("simulating {} policy instance(s)", policies.len());
        Ok(Self { policies })
    }

    /// Replays a trace file to completion.
    ///
    /// Events are delivered in trace order; each policy processes one
    /// event fully before the next arrives. Terminal consistency checks
    /// run on every policy once the trace is exhausted.
    pub fn run(&mut self, reader: &TraceReader) -> Result<(), SimError> {
        log::info!("replaying {}", reader.path().display());
        let mut count: u64 = 0;
        for event in reader.events()? {
            let event = event?;
            self.broadcast(event);
            count += 1;
        }
        self.finish();
        log::info!("replayed {count} events");
        Ok(())
    }

    /// Replays an in-memory event sequence to completion.
    pub fn run_events(&mut self, events: impl IntoIterator<Item = AccessEvent>) {
        for event in events {
            self.broadcast(event);
        }
        self.finish();
    }

    /// Delivers one event to every policy.
    fn broadcast(&mut self, event: AccessEvent) {
        for policy in &mut self.policies {
            policy.record(event.clone());
        }
    }

    /// Runs the terminal checks on every policy.
    fn finish(&mut self) {
        for policy in &mut self.policies {
            policy.finished();
        }
    }

    /// Statistics of every policy instance, in construction order.
    pub fn stats(&self) -> impl Iterator<Item = &PolicyStats> {
        self.policies.iter().map(|policy| policy.stats())
    }
}

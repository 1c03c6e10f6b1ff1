//! Trace-driven cache simulator with cost and latency aware replacement.
//!
//! This crate replays access traces against a family of eviction policies
//! that weigh how much time caching each object actually saves. It
//! provides:
//! 1. **Events:** Trace records carrying per-request hit and miss
//!    penalties.
//! 2. **Policies:** A benefit-bucketed eviction block and the segmented
//!    TinyLFU policies built from it, including an online window climber.
//! 3. **Admission:** Frequency sketches and the latency-aware TinyLFU
//!    filter.
//! 4. **Parsing:** Lazy readers for the dns, latency, and
//!    address-penalties trace formats.
//! 5. **Simulation:** A driver that broadcasts one trace across every
//!    configured policy and reports hit rates and service latencies.
//!
//! # Examples
//!
//! ```
//! use casim_core::config::Config;
//! use casim_core::event::AccessEvent;
//! use casim_core::sim::Simulation;
//!
//! let mut config = Config::default();
//! config.maximum_size = 64;
//!
//! let mut simulation = Simulation::new(&config).unwrap();
//! simulation.run_events((0..256).map(|i| AccessEvent::new(i % 96, 1.0, 8.0)));
//!
//! let stats = simulation.stats().next().unwrap();
//! assert_eq!(stats.request_count(), 256);
//! ```

/// Admission sketches and the latency-aware TinyLFU filter.
pub mod admission;
/// Run configuration (defaults, enums, hierarchical structures).
pub mod config;
/// Simulator error definitions.
pub mod error;
/// Trace access events.
pub mod event;
/// Trace file parsing.
pub mod parser;
/// Replacement policies and their building blocks.
pub mod policy;
/// Trace replay driver.
pub mod sim;
/// Policy statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from
/// JSON.
pub use crate::config::Config;
/// Simulator error type.
pub use crate::error::SimError;
/// One trace record.
pub use crate::event::AccessEvent;
/// Trace file access.
pub use crate::parser::{TraceFormat, TraceReader};
/// Per-policy replay statistics.
pub use crate::stats::PolicyStats;
/// The replay driver.
pub use crate::sim::Simulation;

//! Unit tests for the replacement policies.

/// The adaptive window policy and its online resizing.
pub mod adaptive_ca;


/// The hill climbers.
pub mod climb;

/// The single-block CRA policy.
pub mod cra;

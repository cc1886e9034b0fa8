//! Integration Tests for the Ember Cache Service
//!
//! This crate contains the cross-module test suites:
//!
//! - `poller_tests`: Cursor lifecycle, ordering, and failure handling of the event poller
//! - `invalidation_tests`: Event-to-namespace routing and invalidation scopes
//! - `scenario_tests`: End-to-end game scenarios from raw log to cache state
//! - `mock_infrastructure`: Reusable scripted chain and cursor mocks
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```
//!
//! All suites run against in-process mocks; no node or network access is
//! required. Time-sensitive tests use tokio's paused clock, so the suite
//! is deterministic and fast.

#[cfg(test)]
mod poller_tests;

#[cfg(test)]
mod invalidation_tests;

#[cfg(test)]
mod scenario_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;

//! Ember admin API server library.
//!
//! The binary in `main.rs` wires an [`ember_core::EmberRuntime`] to the
//! admin router defined in [`admin`].

pub mod admin;
pub mod logging;

//! Admin API request handlers.

pub mod cache;
pub mod poller;
pub mod system;

//! Mock Infrastructure for Testing the Ember Cache Service
//!
//! This module provides reusable mock types for driving the poller and
//! router without a real node.
//!
//! ## Components
//!
//! - `ScriptedChainClient`: An in-memory `ChainClient` with programmable
//!   head, logs, and failure injection
//! - `FlakyCursorStore`: A cursor store whose loads and saves can be made
//!   to fail on demand
//! - Log builders that produce decodable `RawLog` values for each event
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{ScriptedChainClient, log_for};
//!
//! let chain = ScriptedChainClient::new(100);
//! chain.push_log(log_for(descriptor, vec![topic_word_u64(7)], "0x", 101, 0));
//! ```

pub mod cursor_mock;

pub use chain_mock::{
    data_word_u64, log_for, topic_address, topic_word_u64, ScriptedChainClient,
};
pub use cursor_mock::FlakyCursorStore;

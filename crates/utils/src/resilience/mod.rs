//! Resilience patterns for waiting on external state.
//!
//! ## Key Components
//!
//! - **`poll`**: a bounded, fixed-cadence poller. Used where another process
//!   publishes state asynchronously and there is no push channel to learn
//!   about it.

pub mod poll;

pub use poll::{poll_until, PollConfig, Probe};

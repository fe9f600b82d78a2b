//! Shared runtime pieces: errors, configuration, logging, the operation
//! trace, output envelopes, and the tool dispatcher.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod rpc;
pub mod time;
pub mod trace;

//! The spec tools themselves. Each module is usable on its own; `core::rpc`
//! wires them into the dispatcher.

pub mod compliance;
pub mod constitution;
pub mod openapi;
pub mod persist;

//! Lull core library — conversation buffering, debounce scheduling, burst
//! settlement, and the gateway/bridge plumbing around them.
//! Used by the `lull` CLI daemon.

pub mod channels;
pub mod config;
pub mod forward;
pub mod gateway;
pub mod responder;

//! HTTP surface: health probes and the inbound message webhook.

mod server;

pub use server::{run_gateway, GatewayState};

// ABOUTME: Transport module - the abstract "send completion request" seam.
// ABOUTME: Defines wire types, the Transport trait and the reqwest-backed HTTP transport.

mod client;
mod http;
mod types;

pub use client::*;
pub use http::*;
pub use types::*;

//! Destination block stores for the mirror pipeline
//!
//! - [`IpfsClient`]: blocking client for a kubo node's HTTP RPC API
//! - [`MemoryBlockStore`]: in-process store for tests and benchmarks

pub mod api;
pub mod client;
pub mod memory;

pub use api::{discover_api_url, DEFAULT_API_URL};
pub use client::{IpfsClient, DEFAULT_TIMEOUT};
pub use memory::MemoryBlockStore;

//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the subscribe endpoint.
//! The core SSE infrastructure (Manager, registries, Broadcaster) lives in
//! the `sse` crate so that queue handlers can use it without the web layer.

pub mod handler;

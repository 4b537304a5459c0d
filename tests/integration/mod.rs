//! Integration tests for observability_demo
//!
//! Each test starts the service it needs in-process on an ephemeral port and
//! talks to it over real HTTP.
//! Run with: cargo test --test integration

mod helpers;

mod shutdown;
mod span_export;
mod todo_routes;
mod trace_propagation;
mod user_routes;

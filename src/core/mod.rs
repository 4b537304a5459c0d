//! Core types for HTTP request/response handling.
//!
//! This module provides the fundamental types used throughout the middleware
//! pipeline and request handlers:
//!
//! - [`Request`] - HTTP request abstraction with route parameters
//! - [`Response`] - HTTP response abstraction with builder pattern
//! - [`Context`] - Request context for middleware communication
//! - [`Params`] - Path parameters captured by the router
//! - [`Error`] - Core error types
//!
//! # Example
//!
//! ```rust,ignore
//! use observability_demo::core::{Request, Response};
//!
//! async fn get_todo(req: Request) -> Response {
//!     let _id = req.param("id");
//!     Response::message("Get Todo by Id")
//! }
//! ```

mod context;
mod error;
mod params;
mod request;
mod response;

pub use context::{generate_span_id, generate_trace_id, Context, ContextBuilder, HttpVersion};
pub use error::{Error, Result};
pub use params::Params;
pub use request::Request;
pub use response::{Response, ResponseBuilder};

//! Panic recovery around handler futures.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::core::Response;

/// How a recovered panic is reported to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// `500` with an empty body.
    #[default]
    Plain,
    /// `500` with `error: <panic message>` when the payload is a string.
    Detailed,
}

impl RecoveryMode {
    /// Response for a recovered panic.
    pub fn response(self, message: Option<&str>) -> Response {
        match (self, message) {
            (RecoveryMode::Detailed, Some(msg)) => {
                Response::internal_error(&format!("error: {}", msg))
            }
            _ => Response::internal_error(""),
        }
    }
}

/// Extract the message from a panic payload.
///
/// `panic!("literal")` carries a `&'static str`, formatted panics a `String`.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

/// Run a handler future, turning a panic into a `500` response.
///
/// The panic is logged at error level in the current span.
pub async fn catch_panic<F>(fut: F, mode: RecoveryMode) -> Response
where
    F: Future<Output = Response>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                panic = message.unwrap_or("<non-string payload>"),
                "handler panicked, recovered"
            );
            mode.response(message)
        }
    }
}

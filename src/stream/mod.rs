//! Daemon response stream decoding
//!
//! Container daemons report build/pull/push progress as consecutive
//! JSON objects with no delimiter. The decoder splits that stream into
//! discrete values; the handlers interpret them.

mod decoder;
mod handlers;

pub use decoder::{decode_stream, StreamHandler};
pub use handlers::{BuildResponseHandler, PullPushResponseHandler};

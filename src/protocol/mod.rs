//! Peer wire protocol
//!
//! Request paths exchanged between nodes and the binary envelope carrying
//! the value in responses. Independent from the routing and storage modules.

mod envelope;
mod path;

pub use envelope::{CacheResponse, EnvelopeError, CONTENT_TYPE};
pub use path::{parse_request_path, request_path, PathError, DEFAULT_BASE_PATH};

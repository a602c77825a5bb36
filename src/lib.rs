//! gRPC-Web response framing and a mock ML Metadata store built on it.

pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod frame;
pub mod mlmd;
pub mod server;
pub mod status;

pub use error::{FrameError, Result};
pub use frame::{Envelope, decode_envelope, encode_envelope};

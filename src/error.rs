use thiserror::Error;

/// Errors raised while building or parsing a gRPC-Web envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A frame body does not fit the 32-bit length prefix.
    #[error("frame body of {len} bytes exceeds the 32-bit length field")]
    Encoding { len: usize },

    /// Wrong tag byte, malformed trailers, or other non-conforming bytes.
    #[error("malformed frame: {0}")]
    FrameFormat(String),

    /// A declared length runs past the end of the buffer.
    #[error("truncated frame: need {needed} bytes, {available} available")]
    TruncatedFrame { needed: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

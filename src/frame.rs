//! gRPC-Web envelope framing.
//!
//! A unary response body is two frames back to back:
//! ```text
//! ┌──────┬──────────┬──────────────┐┌──────┬──────────┬────────────────────────┐
//! │ 0x00 │ len (BE) │ message      ││ 0x80 │ len (BE) │ trailers text          │
//! │ 1B   │ 4B       │ len bytes    ││ 1B   │ 4B       │ len bytes              │
//! └──────┴──────────┴──────────────┘└──────┴──────────┴────────────────────────┘
//! ```
//! The trailers text is `grpc-status: {status}\r\ngrpc-message: {message}`
//! with no trailing CRLF.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::BufMut;

use crate::error::{FrameError, Result};

/// Tag byte plus 32-bit length.
pub const FRAME_HEADER_SIZE: usize = 5;

pub const CONTENT_TYPE: &str = "application/grpc-web+proto";
pub const CONTENT_TYPE_TEXT: &str = "application/grpc-web-text";

const STATUS_KEY: &str = "grpc-status: ";
const MESSAGE_KEY: &str = "grpc-message: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Trailers,
}

impl FrameKind {
    pub fn tag(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::Trailers => 0x80,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::Data),
            0x80 => Some(Self::Trailers),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Trailers => "TRAILERS",
        }
    }
}

/// A decoded unary response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub status: u32,
    pub message: String,
}

impl Envelope {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_envelope(&self.payload, self.status, &self.message)
    }
}

/// The trailers block carried by the final frame.
pub fn trailers_text(status: u32, message: &str) -> String {
    format!("{STATUS_KEY}{status}\r\n{MESSAGE_KEY}{message}")
}

fn frame_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FrameError::Encoding { len })
}

/// Append one frame (`tag || len || body`) to `buf`.
pub fn encode_frame(kind: FrameKind, body: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    let len = frame_len(body.len())?;
    buf.reserve(FRAME_HEADER_SIZE + body.len());
    buf.put_u8(kind.tag());
    buf.put_u32(len);
    buf.put_slice(body);
    Ok(())
}

/// Wrap a serialized message in a DATA frame followed by a TRAILERS frame.
pub fn encode_envelope(payload: &[u8], status: u32, message: &str) -> Result<Vec<u8>> {
    let trailers = trailers_text(status, message);
    let mut buf = Vec::with_capacity(2 * FRAME_HEADER_SIZE + payload.len() + trailers.len());
    encode_frame(FrameKind::Data, payload, &mut buf)?;
    encode_frame(FrameKind::Trailers, trailers.as_bytes(), &mut buf)?;
    Ok(buf)
}

/// Envelope with `grpc-status: 0` and an empty message.
pub fn encode_ok(payload: &[u8]) -> Result<Vec<u8>> {
    encode_envelope(payload, 0, "")
}

/// `application/grpc-web-text` form: base64 of the binary envelope.
pub fn encode_envelope_text(payload: &[u8], status: u32, message: &str) -> Result<String> {
    Ok(STANDARD.encode(encode_envelope(payload, status, message)?))
}

struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Read the next frame, which must be of kind `expected`.
    fn next_frame(&mut self, expected: FrameKind) -> Result<&'a [u8]> {
        let rest = &self.buf[self.pos..];
        let Some(&tag) = rest.first() else {
            return Err(FrameError::TruncatedFrame {
                needed: FRAME_HEADER_SIZE,
                available: 0,
            });
        };
        if tag != expected.tag() {
            return Err(FrameError::FrameFormat(format!(
                "expected {} tag {:#04x} at offset {}, found {:#04x} ({})",
                expected.name(),
                expected.tag(),
                self.pos,
                tag,
                FrameKind::from_tag(tag).map_or("unknown", FrameKind::name)
            )));
        }
        if rest.len() < FRAME_HEADER_SIZE {
            return Err(FrameError::TruncatedFrame {
                needed: FRAME_HEADER_SIZE,
                available: rest.len(),
            });
        }

        let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
        let body = &rest[FRAME_HEADER_SIZE..];
        if body.len() < len {
            return Err(FrameError::TruncatedFrame {
                needed: len,
                available: body.len(),
            });
        }

        self.pos += FRAME_HEADER_SIZE + len;
        Ok(&body[..len])
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

fn parse_trailers(raw: &[u8]) -> Result<(u32, String)> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| FrameError::FrameFormat(format!("trailers are not UTF-8: {e}")))?;

    // Only the first CRLF separates the two lines; the message keeps any that follow.
    let (status_line, message_line) = text
        .split_once("\r\n")
        .ok_or_else(|| FrameError::FrameFormat("trailers missing grpc-message line".into()))?;

    let status = status_line
        .strip_prefix(STATUS_KEY)
        .ok_or_else(|| {
            FrameError::FrameFormat(format!("expected grpc-status line, got {status_line:?}"))
        })?
        .parse::<u32>()
        .map_err(|e| FrameError::FrameFormat(format!("invalid grpc-status: {e}")))?;

    let message = message_line.strip_prefix(MESSAGE_KEY).ok_or_else(|| {
        FrameError::FrameFormat(format!("expected grpc-message line, got {message_line:?}"))
    })?;

    Ok((status, message.to_string()))
}

/// Parse a body produced by [`encode_envelope`].
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    let mut reader = FrameReader::new(bytes);
    let payload = reader.next_frame(FrameKind::Data)?;
    let trailers = reader.next_frame(FrameKind::Trailers)?;

    if reader.remaining() != 0 {
        return Err(FrameError::FrameFormat(format!(
            "{} unexpected bytes after trailers frame",
            reader.remaining()
        )));
    }

    let (status, message) = parse_trailers(trailers)?;
    Ok(Envelope {
        payload: payload.to_vec(),
        status,
        message,
    })
}

/// Parse an `application/grpc-web-text` body.
pub fn decode_envelope_text(text: &[u8]) -> Result<Envelope> {
    let raw = STANDARD
        .decode(text.trim_ascii())
        .map_err(|e| FrameError::FrameFormat(format!("invalid base64 body: {e}")))?;
    decode_envelope(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_TRAILERS: &[u8] = b"grpc-status: 0\r\ngrpc-message: ";

    #[test]
    fn test_concrete_scenario_bytes() {
        let out = encode_envelope(&[0x0A, 0x02, 0x68, 0x69], 0, "").unwrap();

        let mut expected = vec![
            0x00, 0x00, 0x00, 0x00, 0x04, 0x0A, 0x02, 0x68, 0x69, 0x80, 0x00, 0x00, 0x00, 0x1E,
        ];
        expected.extend_from_slice(OK_TRAILERS);

        // 13 + 1 + 2 + 14 bytes of trailers text.
        assert_eq!(OK_TRAILERS.len(), 30);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_payload() {
        let out = encode_ok(&[]).unwrap();
        assert_eq!(&out[..5], &[0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&out[5..10], &[0x80, 0x00, 0x00, 0x00, 0x1E]);
        assert_eq!(&out[10..], OK_TRAILERS);
    }

    #[test]
    fn test_non_zero_status() {
        let out = encode_envelope(&[0x01], 5, "not found").unwrap();
        let text = b"grpc-status: 5\r\ngrpc-message: not found";

        assert_eq!(out[6], 0x80);
        assert_eq!(u32::from_be_bytes([out[7], out[8], out[9], out[10]]) as usize, text.len());
        assert_eq!(&out[11..], text);
    }

    #[test]
    fn test_tag_and_length_fields() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let out = encode_envelope(&payload, 3, "bad").unwrap();

        assert_eq!(out[0], FrameKind::Data.tag());
        assert_eq!(u32::from_be_bytes([out[1], out[2], out[3], out[4]]), 1000);
        assert_eq!(out[5 + payload.len()], FrameKind::Trailers.tag());
    }

    #[test]
    fn test_total_length() {
        let payload = b"some protobuf bytes";
        let out = encode_envelope(payload, 13, "internal error").unwrap();
        let text = trailers_text(13, "internal error");
        assert_eq!(out.len(), 5 + payload.len() + 5 + text.len());
    }

    #[test]
    fn test_deterministic() {
        let a = encode_envelope(b"\x08\x01", 0, "").unwrap();
        let b = encode_envelope(b"\x08\x01", 0, "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip() {
        let cases: Vec<(Vec<u8>, u32, &str)> = vec![
            (vec![], 0, ""),
            (vec![0x0A, 0x02, 0x68, 0x69], 0, ""),
            (vec![0x00, 0x80, 0xFF], 5, "not found"),
            (vec![0x80; 70_000], 16, "token expired"),
            (b"x".to_vec(), u32::MAX, "multi\r\nline: message"),
            (b"y".to_vec(), 2, "ünïcödé ✓"),
        ];

        for (payload, status, message) in cases {
            let out = encode_envelope(&payload, status, message).unwrap();
            let env = decode_envelope(&out).unwrap();
            assert_eq!(env.payload, payload);
            assert_eq!(env.status, status);
            assert_eq!(env.message, message);
            assert_eq!(env.encode().unwrap(), out);
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_length_overflow() {
        let too_big = u32::MAX as usize + 1;
        assert_eq!(frame_len(too_big), Err(FrameError::Encoding { len: too_big }));
        assert_eq!(frame_len(u32::MAX as usize), Ok(u32::MAX));
    }

    #[test]
    fn test_decode_wrong_data_tag() {
        let mut out = encode_ok(b"abc").unwrap();
        out[0] = 0x01;
        assert!(matches!(decode_envelope(&out), Err(FrameError::FrameFormat(_))));
    }

    #[test]
    fn test_decode_wrong_trailers_tag() {
        let mut out = encode_ok(b"abc").unwrap();
        out[8] = 0x00;
        assert!(matches!(decode_envelope(&out), Err(FrameError::FrameFormat(_))));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            decode_envelope(&[]),
            Err(FrameError::TruncatedFrame { needed: 5, available: 0 })
        );
        assert_eq!(
            decode_envelope(&[0x00, 0x00, 0x00]),
            Err(FrameError::TruncatedFrame { needed: 5, available: 3 })
        );
        assert_eq!(
            decode_envelope(&[0x00, 0x00, 0x00, 0x00, 0x04, 0x0A]),
            Err(FrameError::TruncatedFrame { needed: 4, available: 1 })
        );

        // DATA frame only, trailers missing entirely.
        let out = encode_ok(b"abc").unwrap();
        assert_eq!(
            decode_envelope(&out[..8]),
            Err(FrameError::TruncatedFrame { needed: 5, available: 0 })
        );

        // Trailers body cut short.
        assert_eq!(
            decode_envelope(&out[..out.len() - 1]),
            Err(FrameError::TruncatedFrame { needed: 30, available: 29 })
        );
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut out = encode_ok(b"abc").unwrap();
        out.push(0x00);
        assert!(matches!(decode_envelope(&out), Err(FrameError::FrameFormat(_))));
    }

    #[test]
    fn test_decode_malformed_trailers() {
        let bad: [&[u8]; 5] = [
            b"grpc-status: 0",
            b"grpc-message: \r\ngrpc-status: 0",
            b"grpc-status: ok\r\ngrpc-message: ",
            b"grpc-status: 0\r\nmessage: x",
            b"grpc-status: 0\r\ngrpc-message: \xFF",
        ];
        for trailers in bad {
            let mut buf = Vec::new();
            encode_frame(FrameKind::Data, b"", &mut buf).unwrap();
            encode_frame(FrameKind::Trailers, trailers, &mut buf).unwrap();
            assert!(
                matches!(decode_envelope(&buf), Err(FrameError::FrameFormat(_))),
                "trailers {trailers:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_frame_kind_tags() {
        assert_eq!(FrameKind::from_tag(0x00), Some(FrameKind::Data));
        assert_eq!(FrameKind::from_tag(0x80), Some(FrameKind::Trailers));
        assert_eq!(FrameKind::from_tag(0x01), None);
    }

    #[test]
    fn test_text_mode() {
        let text = encode_envelope_text(&[0x0A, 0x02, 0x68, 0x69], 0, "").unwrap();
        let binary = encode_ok(&[0x0A, 0x02, 0x68, 0x69]).unwrap();
        assert_eq!(text, STANDARD.encode(&binary));

        let env = decode_envelope_text(format!("{text}\n").as_bytes()).unwrap();
        assert_eq!(env.payload, vec![0x0A, 0x02, 0x68, 0x69]);
        assert_eq!(env.status, 0);

        assert!(matches!(
            decode_envelope_text(b"not base64!"),
            Err(FrameError::FrameFormat(_))
        ));
    }
}

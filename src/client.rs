use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE as CONTENT_TYPE_HEADER;
use tracing::debug;

use crate::frame::{
    CONTENT_TYPE, CONTENT_TYPE_TEXT, Envelope, FrameKind, decode_envelope, decode_envelope_text,
    encode_frame,
};

/// POST an empty unary request to a gRPC-Web endpoint and decode the reply.
pub async fn call(url: &str, text: bool) -> Result<Envelope> {
    let mut request = Vec::new();
    encode_frame(FrameKind::Data, &[], &mut request)?;

    let (content_type, body) = if text {
        (CONTENT_TYPE_TEXT, STANDARD.encode(&request).into_bytes())
    } else {
        (CONTENT_TYPE, request)
    };

    let resp = reqwest::Client::new()
        .post(url)
        .header(CONTENT_TYPE_HEADER, content_type)
        .header("x-grpc-web", "1")
        .body(body)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;

    let http_status = resp.status();
    if !http_status.is_success() {
        bail!("{url} returned HTTP {http_status}");
    }

    let response_type = resp
        .headers()
        .get(CONTENT_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = resp.bytes().await?;
    debug!("Received {} bytes ({response_type})", bytes.len());

    let envelope = if response_type.starts_with(CONTENT_TYPE_TEXT) {
        decode_envelope_text(&bytes)?
    } else {
        decode_envelope(&bytes)?
    };
    Ok(envelope)
}

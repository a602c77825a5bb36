use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use mlmd_mock::fixtures::Fixture;
use mlmd_mock::frame::{
    Envelope, decode_envelope, decode_envelope_text, encode_envelope, encode_envelope_text,
};
use mlmd_mock::status;
use tracing::debug;

/// Where the message payload comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PayloadSource {
    /// Canned MLMD response
    #[arg(long, value_enum)]
    pub fixture: Option<Fixture>,
    /// File holding serialized protobuf bytes
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Payload as hex (whitespace ignored)
    #[arg(long)]
    pub hex: Option<String>,
}

/// Where an encoded envelope comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct EnvelopeSource {
    /// File holding the response body
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Response body as hex (whitespace ignored)
    #[arg(long)]
    pub hex: Option<String>,
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&cleaned).context("Invalid hex input")
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

impl PayloadSource {
    pub fn load(&self) -> Result<Vec<u8>> {
        match (&self.fixture, &self.input, &self.hex) {
            (Some(fixture), _, _) => Ok(fixture.payload()),
            (_, Some(path), _) => read_file(path),
            (_, _, Some(hex)) => parse_hex(hex),
            _ => bail!("One of --fixture, --input or --hex is required"),
        }
    }
}

impl EnvelopeSource {
    pub fn load(&self) -> Result<Vec<u8>> {
        match (&self.input, &self.hex) {
            (Some(path), _) => read_file(path),
            (_, Some(hex)) => parse_hex(hex),
            _ => bail!("One of --input or --hex is required"),
        }
    }
}

pub fn run_encode(
    source: &PayloadSource,
    status: u32,
    message: &str,
    text: bool,
    output: Option<&Path>,
) -> Result<()> {
    let payload = source.load()?;
    debug!("Encoding {} byte payload with grpc-status {status}", payload.len());

    let body = if text {
        encode_envelope_text(&payload, status, message)?.into_bytes()
    } else {
        encode_envelope(&payload, status, message)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, &body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", body.len(), path.display());
        }
        None if text => println!("{}", String::from_utf8_lossy(&body)),
        None => println!("{}", hex::encode(&body)),
    }
    Ok(())
}

pub fn run_decode(source: &EnvelopeSource, text: bool) -> Result<()> {
    let raw = source.load()?;
    let envelope = if text {
        decode_envelope_text(&raw)?
    } else {
        decode_envelope(&raw)?
    };
    print!("{}", render(&envelope));
    Ok(())
}

/// Human-readable dump of a decoded envelope.
pub fn render(envelope: &Envelope) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "payload: {} bytes", envelope.payload.len());
    if !envelope.payload.is_empty() {
        let _ = writeln!(out, "  {}", hex::encode(&envelope.payload));
    }
    let _ = writeln!(out, "grpc-status: {}", status::describe(envelope.status));
    let _ = writeln!(out, "grpc-message: {}", envelope.message);
    out
}

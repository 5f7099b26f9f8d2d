//! Compact, text-safe encoding of agent messages.
//!
//! Messages are zlib-compressed and then base64 (URL-safe, no padding)
//! encoded so they can travel through any string field.

use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{AgentError, Result};

/// Compress a message into an opaque string.
pub fn compress_message(message: &str) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    // Writing into a Vec cannot fail.
    let compressed = encoder
        .write_all(message.as_bytes())
        .and_then(|_| encoder.finish())
        .unwrap_or_default();
    URL_SAFE_NO_PAD.encode(compressed)
}

/// Recover a message produced by [`compress_message`].
pub fn decompress_message(encoded: &str) -> Result<String> {
    let compressed = URL_SAFE_NO_PAD
        .decode(encoded.trim())
        .map_err(|e| AgentError::Compression(format!("invalid base64: {}", e)))?;

    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut message = String::new();
    decoder
        .read_to_string(&mut message)
        .map_err(|e| AgentError::Compression(format!("invalid zlib stream: {}", e)))?;

    Ok(message)
}

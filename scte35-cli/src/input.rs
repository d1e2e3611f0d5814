use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    cli::InputFormat,
    error::{AppError, Result},
};

/// Turn a textual cue into section bytes.
pub fn decode_cue(cue: &str, format: InputFormat) -> Result<Vec<u8>> {
    let cue = cue.trim();
    if cue.is_empty() {
        return Err(AppError::InvalidInput("empty cue".to_string()));
    }

    match format {
        InputFormat::Base64 => Ok(STANDARD.decode(cue)?),
        InputFormat::Hex => decode_hex(cue),
        InputFormat::Auto if looks_like_hex(cue) => decode_hex(cue),
        InputFormat::Auto => Ok(STANDARD.decode(cue)?),
    }
}

fn strip_hex_prefix(cue: &str) -> &str {
    cue.strip_prefix("0x")
        .or_else(|| cue.strip_prefix("0X"))
        .unwrap_or(cue)
}

fn looks_like_hex(cue: &str) -> bool {
    if cue.starts_with("0x") || cue.starts_with("0X") {
        return true;
    }
    cue.len() % 2 == 0 && cue.bytes().all(|b| b.is_ascii_hexdigit())
}

fn decode_hex(cue: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(strip_hex_prefix(cue))?)
}

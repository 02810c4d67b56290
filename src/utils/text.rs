// src/utils/text.rs
//! Boundary codec for the fixed-capacity, null-padded ASCII fields of the
//! engine's records.
//!
//! The engine exchanges text as fixed-size byte arrays (64, 16 or 256 bytes
//! depending on the field), padded with trailing NULs. Conversion happens
//! only at the call boundary; everything else in the crate works on decoded
//! `String`s.

use std::ffi::CString;

use crate::error::{Pl2Error, Result};

/// Decode a null-padded ASCII field, trimming trailing NULs.
///
/// Bytes outside the ASCII range are replaced rather than rejected; the
/// engine promises ASCII but the file on disk is not under our control.
pub fn decode_padded(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Encode text into a fixed-capacity null-padded field.
///
/// The text must be ASCII and leave room for at least one trailing NUL,
/// matching what the engine writes into these fields.
pub fn encode_padded<const N: usize>(text: &str) -> Result<[u8; N]> {
    if !text.is_ascii() {
        return Err(Pl2Error::NonAsciiText(text.to_string()));
    }
    if text.len() >= N {
        return Err(Pl2Error::TextTooLong {
            text: text.to_string(),
            capacity: N,
        });
    }
    let mut field = [0u8; N];
    field[..text.len()].copy_from_slice(text.as_bytes());
    Ok(field)
}

/// Convert a channel name into the null-terminated C string passed to the
/// engine's by-name entry points.
pub fn name_to_cstring(name: &str) -> Result<CString> {
    if !name.is_ascii() {
        return Err(Pl2Error::NonAsciiText(name.to_string()));
    }
    CString::new(name).map_err(|_| Pl2Error::EmbeddedNul(name.to_string()))
}

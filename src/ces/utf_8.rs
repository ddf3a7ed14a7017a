//! UTF-8 in its original 1 to 6 byte form.

use crate::cursor::{ByteSink, InputCursor};
use crate::error::CesError;

use super::is_excluded;

/// Longest sequence.
pub const MAX_CHAR_LEN: usize = 6;

/// `(lead byte marker, lead value bits, smallest code)` indexed by
/// sequence length.
const SEQUENCES: [(u8, u8, u32); 7] = [
    (0, 0, 0),
    (0x00, 0x7F, 0),
    (0xC0, 0x1F, 0x80),
    (0xE0, 0x0F, 0x800),
    (0xF0, 0x07, 0x1_0000),
    (0xF8, 0x03, 0x20_0000),
    (0xFC, 0x01, 0x400_0000),
];

fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0x80..=0xBF => None,
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        0xF8..=0xFB => Some(5),
        0xFC..=0xFD => Some(6),
        0xFE..=0xFF => None,
    }
}

/// Decode one character.
pub fn decode(input: &mut InputCursor<'_>) -> Result<u32, CesError> {
    let bytes = input.remaining();
    let &lead = bytes.first().ok_or(CesError::BadSequence)?;
    let len = sequence_len(lead).ok_or(CesError::InvalidCharacter)?;
    if bytes.len() < len {
        return Err(CesError::BadSequence);
    }

    let (_, value_bits, min) = SEQUENCES[len];
    let mut code = (lead & value_bits) as u32;
    for &byte in &bytes[1..len] {
        if byte & 0xC0 != 0x80 {
            return Err(CesError::InvalidCharacter);
        }
        code = (code << 6) | (byte & 0x3F) as u32;
    }

    // overlong
    if code < min {
        return Err(CesError::InvalidCharacter);
    }
    if is_excluded(code) || code > 0x7FFF_FFFF {
        return Err(CesError::InvalidCharacter);
    }
    input.advance(len);
    Ok(code)
}

/// Number of bytes `code` takes.
pub fn encoded_len(code: u32) -> usize {
    match code {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        _ => 6,
    }
}

/// Encode one character.
pub fn encode<S: ByteSink>(code: u32, out: &mut S) -> Result<usize, CesError> {
    if is_excluded(code) || code > 0x7FFF_FFFF {
        return Err(CesError::InvalidCharacter);
    }
    let len = encoded_len(code);
    let mut buf = [0u8; MAX_CHAR_LEN];
    if len == 1 {
        buf[0] = code as u8;
    } else {
        let mut rest = code;
        for slot in buf[1..len].iter_mut().rev() {
            *slot = 0x80 | (rest & 0x3F) as u8;
            rest >>= 6;
        }
        let (marker, _, _) = SEQUENCES[len];
        buf[0] = marker | rest as u8;
    }
    out.put(&buf[..len])?;
    Ok(len)
}

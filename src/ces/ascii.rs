//! US-ASCII.

use crate::cursor::{ByteSink, InputCursor};
use crate::error::CesError;

/// Reported character length. One byte suffices, the extra byte is slack
/// kept for callers sizing buffers from it.
pub const MAX_CHAR_LEN: usize = 2;

/// Decode one 7-bit byte.
#[inline]
pub fn decode(input: &mut InputCursor<'_>) -> Result<u32, CesError> {
    let &byte = input.remaining().first().ok_or(CesError::BadSequence)?;
    if byte > 0x7F {
        return Err(CesError::InvalidCharacter);
    }
    input.advance(1);
    Ok(byte as u32)
}

/// Encode `code` as one 7-bit byte.
#[inline]
pub fn encode<S: ByteSink>(code: u32, out: &mut S) -> Result<usize, CesError> {
    if code > 0x7F {
        return Err(CesError::InvalidCharacter);
    }
    out.put(&[code as u8])?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::OutputCursor;

    #[test]
    fn test_decode() {
        let data = [0x48, 0x80];
        let mut input = InputCursor::new(&data);
        assert_eq!(decode(&mut input), Ok(0x48));
        assert_eq!(decode(&mut input), Err(CesError::InvalidCharacter));
        assert_eq!(input.consumed(), 1);
    }

    #[test]
    fn test_encode() {
        let mut buf = [0u8; 1];
        let mut out = OutputCursor::new(&mut buf);
        assert_eq!(encode(0x20AC, &mut out), Err(CesError::InvalidCharacter));
        assert_eq!(encode(0x7F, &mut out), Ok(1));
        assert_eq!(encode(0x41, &mut out), Err(CesError::NoSpace));
        assert_eq!(buf, [0x7F]);
    }
}

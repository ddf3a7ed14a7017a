//! Fixed-width UCS-2 and UCS-4.
//!
//! `ucs_2` and `ucs_4` are big-endian, the `be`/`le` variants fix the order
//! explicitly. The `_internal` variants use host order and accept any value
//! their width can hold.

use crate::ccs::Endian;
use crate::cursor::{ByteSink, InputCursor};
use crate::error::CesError;

use super::{is_excluded, read_u16, read_u32, write_u16, write_u32};

/// Two bytes per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ucs2 {
    order: Endian,
    internal: bool,
}

impl Ucs2 {
    /// Converter for a canonical `ucs_2*` name.
    pub fn for_name(name: &str) -> Option<Self> {
        let (order, internal) = match name {
            "ucs_2" | "ucs_2be" => (Endian::Big, false),
            "ucs_2le" => (Endian::Little, false),
            "ucs_2_internal" => (Endian::host(), true),
            _ => return None,
        };
        Some(Self { order, internal })
    }

    /// Byte order of the code units.
    pub fn order(&self) -> Endian {
        self.order
    }

    /// Always 2.
    pub fn max_char_len(&self) -> usize {
        2
    }

    /// Decode one code unit.
    pub fn decode(&self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        let bytes = input.remaining();
        if bytes.len() < 2 {
            return Err(CesError::BadSequence);
        }
        let code = read_u16(self.order, bytes) as u32;
        if !self.internal && is_excluded(code) {
            return Err(CesError::InvalidCharacter);
        }
        input.advance(2);
        Ok(code)
    }

    /// Encode `code` as one code unit.
    pub fn encode<S: ByteSink>(&self, code: u32, out: &mut S) -> Result<usize, CesError> {
        if code > 0xFFFF || (!self.internal && is_excluded(code)) {
            return Err(CesError::InvalidCharacter);
        }
        out.put(&write_u16(self.order, code as u16))?;
        Ok(2)
    }
}

/// Four bytes per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ucs4 {
    order: Endian,
    internal: bool,
}

impl Ucs4 {
    /// Converter for a canonical `ucs_4*` name.
    pub fn for_name(name: &str) -> Option<Self> {
        let (order, internal) = match name {
            "ucs_4" | "ucs_4be" => (Endian::Big, false),
            "ucs_4le" => (Endian::Little, false),
            "ucs_4_internal" => (Endian::host(), true),
            _ => return None,
        };
        Some(Self { order, internal })
    }

    /// Byte order of the code units.
    pub fn order(&self) -> Endian {
        self.order
    }

    /// Always 4.
    pub fn max_char_len(&self) -> usize {
        4
    }

    fn rejects(&self, code: u32) -> bool {
        !self.internal && (code > 0x7FFF_FFFF || is_excluded(code))
    }

    /// Decode one code unit.
    pub fn decode(&self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        let bytes = input.remaining();
        if bytes.len() < 4 {
            return Err(CesError::BadSequence);
        }
        let code = read_u32(self.order, bytes);
        if self.rejects(code) {
            return Err(CesError::InvalidCharacter);
        }
        input.advance(4);
        Ok(code)
    }

    /// Encode `code` as one code unit.
    pub fn encode<S: ByteSink>(&self, code: u32, out: &mut S) -> Result<usize, CesError> {
        if self.rejects(code) {
            return Err(CesError::InvalidCharacter);
        }
        out.put(&write_u32(self.order, code))?;
        Ok(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::DiscardSink;

    fn encode_vec<F: FnOnce(&mut Vec<u8>) -> Result<usize, CesError>>(f: F) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        out
    }

    #[test]
    fn test_ucs2_byte_orders() {
        let be = Ucs2::for_name("ucs_2").unwrap();
        let le = Ucs2::for_name("ucs_2le").unwrap();
        assert_eq!(encode_vec(|o| be.encode(0x20AC, o)), vec![0x20, 0xAC]);
        assert_eq!(encode_vec(|o| le.encode(0x20AC, o)), vec![0xAC, 0x20]);

        let data = [0x04, 0x10];
        assert_eq!(be.decode(&mut InputCursor::new(&data)), Ok(0x0410));
        assert_eq!(le.decode(&mut InputCursor::new(&data)), Ok(0x1004));
    }

    #[test]
    fn test_ucs2_rejects() {
        let ucs2 = Ucs2::for_name("ucs_2be").unwrap();
        let mut sink = DiscardSink::unbounded();
        for code in [0xD800, 0xDFFF, 0xFFFE, 0xFFFF, 0x10000] {
            assert_eq!(ucs2.encode(code, &mut sink), Err(CesError::InvalidCharacter));
        }
        let mut input = InputCursor::new(&[0xD8, 0x00]);
        assert_eq!(ucs2.decode(&mut input), Err(CesError::InvalidCharacter));
        assert_eq!(input.consumed(), 0);
        let mut short = InputCursor::new(&[0x00]);
        assert_eq!(ucs2.decode(&mut short), Err(CesError::BadSequence));
    }

    #[test]
    fn test_internal_is_unrestricted() {
        let ucs2 = Ucs2::for_name("ucs_2_internal").unwrap();
        assert_eq!(ucs2.order(), Endian::host());
        let mut sink = DiscardSink::unbounded();
        assert_eq!(ucs2.encode(0xD800, &mut sink), Ok(2));
        assert_eq!(ucs2.encode(0x10000, &mut sink), Err(CesError::InvalidCharacter));

        let ucs4 = Ucs4::for_name("ucs_4_internal").unwrap();
        assert_eq!(ucs4.encode(0xFFFF_FFFF, &mut sink), Ok(4));
    }

    #[test]
    fn test_ucs4() {
        let ucs4 = Ucs4::for_name("ucs_4").unwrap();
        assert_eq!(
            encode_vec(|o| ucs4.encode(0x1F600, o)),
            vec![0x00, 0x01, 0xF6, 0x00]
        );
        let mut sink = DiscardSink::unbounded();
        assert_eq!(ucs4.encode(0x8000_0000, &mut sink), Err(CesError::InvalidCharacter));

        let le = Ucs4::for_name("ucs_4le").unwrap();
        let mut input = InputCursor::new(&[0x00, 0xF6, 0x01, 0x00, 0xFF]);
        assert_eq!(le.decode(&mut input), Ok(0x1F600));
        assert_eq!(le.decode(&mut input), Err(CesError::BadSequence));
        assert_eq!(input.consumed(), 4);
    }
}

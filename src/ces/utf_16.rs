//! UTF-16 with surrogate pairs.
//!
//! `utf_16` detects the byte order from a leading BOM when decoding and
//! writes a host-order BOM once before the first character when encoding.
//! `utf_16be` and `utf_16le` never read or write a BOM.

use crate::ccs::Endian;
use crate::cursor::{ByteSink, InputCursor};
use crate::error::CesError;

use super::{ShiftState, read_u16, write_u16};

/// Byte order mark.
pub const BOM: u16 = 0xFEFF;

/// A BOM plus a surrogate pair.
pub const MAX_CHAR_LEN: usize = 6;

const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

/// UTF-16 codec state for one direction of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf16 {
    pinned: Option<Endian>,
    order: Option<Endian>,
    bom_written: bool,
}

impl Utf16 {
    /// Converter for a canonical `utf_16*` name.
    pub fn for_name(name: &str) -> Option<Self> {
        let pinned = match name {
            "utf_16" => None,
            "utf_16be" => Some(Endian::Big),
            "utf_16le" => Some(Endian::Little),
            _ => return None,
        };
        Some(Self {
            pinned,
            order: None,
            bom_written: false,
        })
    }

    /// True for the BOM detecting variant.
    pub fn is_stateful(&self) -> bool {
        self.pinned.is_none()
    }

    /// Current shift state.
    pub fn state(&self) -> ShiftState {
        ShiftState::Utf16 {
            order: self.order,
            bom_written: self.bom_written,
        }
    }

    /// Restore a state captured by [`Utf16::state`]. Other states reset.
    pub fn set_state(&mut self, state: ShiftState) {
        match state {
            ShiftState::Utf16 { order, bom_written } if self.is_stateful() => {
                self.order = order;
                self.bom_written = bom_written;
            }
            _ => {
                self.order = None;
                self.bom_written = false;
            }
        }
    }

    /// Decode one character, consuming a leading BOM together with it.
    pub fn decode(&mut self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        let bytes = input.remaining();
        if bytes.len() < 2 {
            return Err(CesError::BadSequence);
        }

        let (order, skip) = match self.pinned.or(self.order) {
            Some(order) => (order, 0),
            None => match [bytes[0], bytes[1]] {
                [0xFF, 0xFE] => (Endian::Little, 2),
                [0xFE, 0xFF] => (Endian::Big, 2),
                _ => (Endian::Big, 0),
            },
        };

        let unit = &bytes[skip..];
        if unit.len() < 2 {
            return Err(CesError::BadSequence);
        }

        let w1 = read_u16(order, unit);
        let (code, len) = if HIGH_SURROGATES.contains(&w1) {
            if unit.len() < 4 {
                return Err(CesError::BadSequence);
            }
            let w2 = read_u16(order, &unit[2..]);
            if !LOW_SURROGATES.contains(&w2) {
                return Err(CesError::InvalidCharacter);
            }
            let code = 0x1_0000 + (((w1 & 0x3FF) as u32) << 10 | (w2 & 0x3FF) as u32);
            (code, 4)
        } else if LOW_SURROGATES.contains(&w1) || w1 == 0xFFFE || w1 == 0xFFFF {
            return Err(CesError::InvalidCharacter);
        } else {
            (w1 as u32, 2)
        };

        if self.pinned.is_none() {
            self.order = Some(order);
        }
        input.advance(skip + len);
        Ok(code)
    }

    /// Encode one character, preceded by a BOM on the first call.
    pub fn encode<S: ByteSink>(&mut self, code: u32, out: &mut S) -> Result<usize, CesError> {
        if code > 0x10_FFFF || (0xD800..=0xDFFF).contains(&code) || code == 0xFFFE || code == 0xFFFF
        {
            return Err(CesError::InvalidCharacter);
        }

        let order = self.pinned.unwrap_or_else(Endian::host);
        let with_bom = self.pinned.is_none() && !self.bom_written;

        let mut buf = [0u8; MAX_CHAR_LEN];
        let mut len = 0;
        let mut push = |unit: u16| {
            buf[len..len + 2].copy_from_slice(&write_u16(order, unit));
            len += 2;
        };
        if with_bom {
            push(BOM);
        }
        if code < 0x1_0000 {
            push(code as u16);
        } else {
            let rest = code - 0x1_0000;
            push(0xD800 | (rest >> 10) as u16);
            push(0xDC00 | (rest & 0x3FF) as u16);
        }

        out.put(&buf[..len])?;
        if with_bom {
            self.bom_written = true;
        }
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::DiscardSink;

    fn dec(name: &str, bytes: &[u8]) -> Result<u32, CesError> {
        Utf16::for_name(name).unwrap().decode(&mut InputCursor::new(bytes))
    }

    #[test]
    fn test_surrogate_pair() {
        let mut be = Utf16::for_name("utf_16be").unwrap();
        let mut out = Vec::new();
        assert_eq!(be.encode(0x10000, &mut out), Ok(4));
        assert_eq!(out, vec![0xD8, 0x00, 0xDC, 0x00]);

        let mut le = Utf16::for_name("utf_16le").unwrap();
        let mut out = Vec::new();
        le.encode(0x10000, &mut out).unwrap();
        assert_eq!(out, vec![0x00, 0xD8, 0x00, 0xDC]);

        assert_eq!(dec("utf_16be", &[0xD8, 0x00, 0xDC, 0x00]), Ok(0x10000));
        assert_eq!(dec("utf_16le", &[0x3D, 0xD8, 0x00, 0xDE]), Ok(0x1F600));
    }

    #[test]
    fn test_broken_surrogates() {
        assert_eq!(dec("utf_16be", &[0xD8, 0x00]), Err(CesError::BadSequence));
        assert_eq!(dec("utf_16be", &[0xDC, 0x00]), Err(CesError::InvalidCharacter));
        assert_eq!(
            dec("utf_16be", &[0xD8, 0x00, 0x00, 0x41]),
            Err(CesError::InvalidCharacter)
        );
        assert_eq!(dec("utf_16be", &[0xFF, 0xFE]), Err(CesError::InvalidCharacter));
    }

    #[test]
    fn test_bom_detection() {
        let data = [0xFF, 0xFE, 0x41, 0x00, 0x42, 0x00];
        let mut utf16 = Utf16::for_name("utf_16").unwrap();
        let mut input = InputCursor::new(&data);
        assert_eq!(utf16.decode(&mut input), Ok(0x41));
        assert_eq!(input.consumed(), 4);
        assert_eq!(utf16.decode(&mut input), Ok(0x42));

        // no BOM: big-endian, nothing extra consumed
        assert_eq!(dec("utf_16", &[0x00, 0x41]), Ok(0x41));
        // a BOM needs a character after it
        assert_eq!(dec("utf_16", &[0xFE, 0xFF]), Err(CesError::BadSequence));
    }

    #[test]
    fn test_order_committed_only_on_success() {
        let mut utf16 = Utf16::for_name("utf_16").unwrap();
        let mut input = InputCursor::new(&[0xFF, 0xFE, 0x00, 0xDC]);
        assert_eq!(utf16.decode(&mut input), Err(CesError::InvalidCharacter));
        assert_eq!(
            utf16.state(),
            ShiftState::Utf16 {
                order: None,
                bom_written: false
            }
        );
    }

    #[test]
    fn test_bom_written_once() {
        let mut utf16 = Utf16::for_name("utf_16").unwrap();
        let mut out = Vec::new();
        assert_eq!(utf16.encode(0x41, &mut out), Ok(4));
        assert_eq!(utf16.encode(0x42, &mut out), Ok(2));
        let mut expected = Vec::new();
        for unit in [BOM, 0x41, 0x42] {
            expected.extend_from_slice(&write_u16(Endian::host(), unit));
        }
        assert_eq!(out, expected);

        utf16.set_state(ShiftState::Initial);
        assert_eq!(utf16.encode(0x43, &mut out), Ok(4));
    }

    #[test]
    fn test_no_partial_write() {
        let mut utf16 = Utf16::for_name("utf_16").unwrap();
        let mut sink = DiscardSink::with_capacity(2);
        assert_eq!(utf16.encode(0x41, &mut sink), Err(CesError::NoSpace));
        assert_eq!(sink.written(), 0);
        assert!(!matches!(
            utf16.state(),
            ShiftState::Utf16 {
                bom_written: true,
                ..
            }
        ));
    }

    #[test]
    fn test_encode_rejects() {
        let mut utf16 = Utf16::for_name("utf_16be").unwrap();
        let mut sink = DiscardSink::unbounded();
        for code in [0x11_0000, 0xD800, 0xFFFE] {
            assert_eq!(utf16.encode(code, &mut sink), Err(CesError::InvalidCharacter));
        }
    }
}

//! Extended Unix Code: ASCII plus up to three prefixed character sets.

use log::debug;

use crate::ccs::Direction;
use crate::config::Config;
use crate::cursor::{ByteSink, InputCursor};
use crate::error::{CesError, Result};

use super::ascii;
use super::table::TableCodec;

/// One character set of an EUC scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EucCharset {
    /// CCS table name
    pub name: &'static str,
    /// Lead bytes selecting this set, empty for the default set
    pub prefix: &'static [u8],
    /// Code bytes following the prefix
    pub bytes: usize,
    /// Whether the code bytes carry a forced high bit
    pub touch_msb: bool,
}

/// An EUC encoding: its character sets in lookup order, default set first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EucScheme {
    /// Canonical encoding name
    pub name: &'static str,
    /// Character sets, default first
    pub charsets: &'static [EucCharset],
    /// Longest encoded character
    pub max_char_len: usize,
}

/// `euc_jp`
pub const EUC_JP: EucScheme = EucScheme {
    name: "euc_jp",
    charsets: &[
        EucCharset {
            name: "jis_x0208_1990",
            prefix: b"",
            bytes: 2,
            touch_msb: true,
        },
        EucCharset {
            name: "jis_x0201_1976",
            prefix: b"\x8e",
            bytes: 1,
            touch_msb: false,
        },
        EucCharset {
            name: "jis_x0212_1990",
            prefix: b"\x8f",
            bytes: 2,
            touch_msb: true,
        },
    ],
    max_char_len: 3,
};

/// `euc_kr`
pub const EUC_KR: EucScheme = EucScheme {
    name: "euc_kr",
    charsets: &[EucCharset {
        name: "ksx1001",
        prefix: b"",
        bytes: 2,
        touch_msb: true,
    }],
    max_char_len: 2,
};

/// `euc_tw`
pub const EUC_TW: EucScheme = EucScheme {
    name: "euc_tw",
    charsets: &[
        EucCharset {
            name: "cns11643_plane1",
            prefix: b"",
            bytes: 2,
            touch_msb: true,
        },
        EucCharset {
            name: "cns11643_plane2",
            prefix: b"\x8e\xa2",
            bytes: 2,
            touch_msb: true,
        },
        EucCharset {
            name: "cns11643_plane14",
            prefix: b"\x8e\xae",
            bytes: 2,
            touch_msb: true,
        },
    ],
    max_char_len: 4,
};

/// Every supported EUC scheme.
pub const SCHEMES: [&EucScheme; 3] = [&EUC_JP, &EUC_KR, &EUC_TW];

/// The scheme with canonical name `name`.
pub fn scheme(name: &str) -> Option<&'static EucScheme> {
    SCHEMES.iter().copied().find(|s| s.name == name)
}

/// An EUC codec with the tables of every character set loaded.
#[derive(Debug, Clone)]
pub struct Euc {
    scheme: &'static EucScheme,
    tables: Vec<TableCodec>,
}

impl Euc {
    /// Load the tables of `scheme` for `direction`.
    ///
    /// Fails if any of them cannot be loaded; tables already loaded are
    /// released.
    pub fn open(scheme: &'static EucScheme, direction: Direction, config: &Config) -> Result<Self> {
        let tables = scheme
            .charsets
            .iter()
            .map(|cs| TableCodec::open(cs.name, direction, config))
            .collect::<Result<Vec<_>>>()?;
        debug!("opened {} with {} character sets", scheme.name, tables.len());
        Ok(Self { scheme, tables })
    }

    /// The scheme this codec implements.
    pub fn scheme(&self) -> &'static EucScheme {
        self.scheme
    }

    /// Longest encoded character.
    pub fn max_char_len(&self) -> usize {
        self.scheme.max_char_len
    }

    fn decode_set(
        &self,
        index: usize,
        input: &mut InputCursor<'_>,
    ) -> Result<u32, CesError> {
        let cs = &self.scheme.charsets[index];
        let bytes = input.remaining();
        let total = cs.prefix.len() + cs.bytes;
        if bytes.len() < total {
            return Err(CesError::BadSequence);
        }

        let mut payload = [0u8; 4];
        for (dst, &src) in payload.iter_mut().zip(&bytes[cs.prefix.len()..total]) {
            if cs.touch_msb {
                if src & 0x80 == 0 {
                    return Err(CesError::InvalidCharacter);
                }
                *dst = src & 0x7F;
            } else {
                *dst = src;
            }
        }

        let table = &self.tables[index];
        if table.max_char_len() != cs.bytes {
            return Err(CesError::InvalidCharacter);
        }
        let code = table.decode(&mut InputCursor::new(&payload[..cs.bytes]))?;
        input.advance(total);
        Ok(code)
    }

    /// Decode one character.
    pub fn decode(&self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        let bytes = input.remaining();
        let &lead = bytes.first().ok_or(CesError::BadSequence)?;
        if lead < 0x80 {
            return ascii::decode(input);
        }

        for (index, cs) in self.scheme.charsets.iter().enumerate().skip(1) {
            if bytes.starts_with(cs.prefix) {
                return self.decode_set(index, input);
            }
            if bytes.len() < cs.prefix.len() && cs.prefix.starts_with(bytes) {
                return Err(CesError::BadSequence);
            }
        }
        self.decode_set(0, input)
    }

    /// Encode one character using the first character set that has it.
    pub fn encode<S: ByteSink>(&self, code: u32, out: &mut S) -> Result<usize, CesError> {
        if code < 0x80 {
            return ascii::encode(code, out);
        }

        for (cs, table) in self.scheme.charsets.iter().zip(&self.tables) {
            if table.max_char_len() != cs.bytes {
                continue;
            }
            let Some(mapped) = table.map_from_ucs(code) else {
                continue;
            };

            let mut buf = [0u8; 4];
            let total = cs.prefix.len() + cs.bytes;
            buf[..cs.prefix.len()].copy_from_slice(cs.prefix);
            let payload = &mut buf[cs.prefix.len()..total];
            match cs.bytes {
                1 => payload[0] = mapped as u8,
                _ => payload.copy_from_slice(&mapped.to_be_bytes()),
            }
            if cs.touch_msb {
                for byte in payload.iter_mut() {
                    if *byte & 0x80 != 0 {
                        return Err(CesError::InvalidCharacter);
                    }
                    *byte |= 0x80;
                }
            }

            out.put(&buf[..total])?;
            return Ok(total);
        }
        Err(CesError::InvalidCharacter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccs::{Bits, Optimization, TableBuilder};
    use crate::cursor::OutputCursor;
    use crate::tables;

    fn jis_x0208() -> TableBuilder {
        let mut builder = TableBuilder::new("jis_x0208_1990", Bits::Sixteen);
        builder.map(0x2121, 0x3000).map(0x2422, 0x3042).map(0x3441, 0x6F22);
        builder
    }

    fn jis_x0212() -> TableBuilder {
        let mut builder = TableBuilder::new("jis_x0212_1990", Bits::Sixteen);
        builder.map(0x2A21, 0x00C1);
        builder
    }

    fn euc_jp(direction: Direction) -> Euc {
        let table = |builder: TableBuilder| {
            TableCodec::new(builder.build(direction, Optimization::Speed).unwrap())
        };
        Euc {
            scheme: &EUC_JP,
            tables: vec![
                table(jis_x0208()),
                TableCodec::new(tables::builtin("jis_x0201_1976", direction).unwrap()),
                table(jis_x0212()),
            ],
        }
    }

    fn decode_all(euc: &Euc, bytes: &[u8]) -> Result<Vec<u32>, CesError> {
        let mut input = InputCursor::new(bytes);
        let mut codes = Vec::new();
        while !input.is_empty() {
            codes.push(euc.decode(&mut input)?);
        }
        Ok(codes)
    }

    #[test]
    fn test_scheme_lookup() {
        assert_eq!(scheme("euc_kr").unwrap().max_char_len, 2);
        assert_eq!(scheme("euc_tw").unwrap().charsets.len(), 3);
        assert!(scheme("euc_cn").is_none());
    }

    #[test]
    fn test_decode_dispatch() {
        let euc = euc_jp(Direction::ToUcs);
        // ASCII, default set, 8E prefixed half-width kana, 8F prefixed JIS X 0212
        let bytes = [0x41, 0xA4, 0xA2, 0x8E, 0xB1, 0x8F, 0xAA, 0xA1];
        assert_eq!(
            decode_all(&euc, &bytes),
            Ok(vec![0x41, 0x3042, 0xFF71, 0x00C1])
        );
    }

    #[test]
    fn test_decode_consumes_prefix_and_payload() {
        let euc = euc_jp(Direction::ToUcs);
        let bytes = [0x8F, 0xAA, 0xA1, 0x42];
        let mut input = InputCursor::new(&bytes);
        euc.decode(&mut input).unwrap();
        assert_eq!(input.consumed(), 3);
    }

    #[test]
    fn test_decode_errors() {
        let euc = euc_jp(Direction::ToUcs);
        assert_eq!(decode_all(&euc, &[0xA4]), Err(CesError::BadSequence));
        assert_eq!(decode_all(&euc, &[0x8F, 0xAA]), Err(CesError::BadSequence));
        assert_eq!(decode_all(&euc, &[0x8F, 0x2A, 0xA1]), Err(CesError::InvalidCharacter));
        assert_eq!(decode_all(&euc, &[0xA4, 0x22]), Err(CesError::InvalidCharacter));
        assert_eq!(decode_all(&euc, &[0xB0, 0xA1]), Err(CesError::InvalidCharacter));
    }

    #[test]
    fn test_partial_prefix() {
        let tw = Euc {
            scheme: &EUC_TW,
            tables: vec![
                TableCodec::new(jis_x0208().build(Direction::ToUcs, Optimization::Size).unwrap()),
                TableCodec::new(jis_x0208().build(Direction::ToUcs, Optimization::Size).unwrap()),
                TableCodec::new(jis_x0212().build(Direction::ToUcs, Optimization::Size).unwrap()),
            ],
        };
        assert_eq!(decode_all(&tw, &[0x8E]), Err(CesError::BadSequence));
        assert_eq!(
            decode_all(&tw, &[0x8E, 0xAE, 0xAA, 0xA1]),
            Ok(vec![0x00C1])
        );
    }

    #[test]
    fn test_encode_picks_first_set() {
        let euc = euc_jp(Direction::FromUcs);
        let mut out = Vec::new();
        assert_eq!(euc.encode(0x41, &mut out), Ok(1));
        assert_eq!(euc.encode(0x3042, &mut out), Ok(2));
        assert_eq!(euc.encode(0xFF71, &mut out), Ok(2));
        assert_eq!(euc.encode(0x00C1, &mut out), Ok(3));
        assert_eq!(out, vec![0x41, 0xA4, 0xA2, 0x8E, 0xB1, 0x8F, 0xAA, 0xA1]);
        assert_eq!(euc.encode(0x00E9, &mut out), Err(CesError::InvalidCharacter));
    }

    #[test]
    fn test_encode_no_partial_write() {
        let euc = euc_jp(Direction::FromUcs);
        let mut buf = [0u8; 2];
        let mut out = OutputCursor::new(&mut buf);
        assert_eq!(euc.encode(0x00C1, &mut out), Err(CesError::NoSpace));
        assert_eq!(out.written(), 0);
        assert_eq!(euc.encode(0x6F22, &mut out), Ok(2));
        assert_eq!(buf, [0xB4, 0xC1]);
    }
}

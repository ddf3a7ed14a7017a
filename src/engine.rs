//! Conversion through UCS code points.
//!
//! Every character is decoded from the source encoding into a UCS code point
//! and encoded into the target encoding. Characters the target cannot
//! represent are replaced by [`DEFAULT_CHARACTER`] unless the caller asks
//! for [`Unmappable::Fail`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ccs::Direction;
use crate::ces::{Decoder, Encoder, ShiftState};
use crate::config::Config;
use crate::cursor::{ByteSink, InputCursor};
use crate::error::{CesError, Error, Result};

/// Substitute for characters missing from the target encoding
pub const DEFAULT_CHARACTER: u32 = 0x3F;

/// What to do with a valid character the target encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unmappable {
    /// Write [`DEFAULT_CHARACTER`] and count a non-reversible conversion
    #[default]
    Substitute,
    /// Stop with [`Error::InvalidCharacter`]
    Fail,
}

/// A source decoder paired with a target encoder.
#[derive(Debug, Clone)]
pub struct UcsEngine {
    decoder: Decoder,
    encoder: Encoder,
}

impl UcsEngine {
    /// Open converters for canonical names `to` and `from`.
    pub fn open(to: &str, from: &str, config: &Config) -> Result<Self> {
        let decoder = Decoder::open(from, config)?;
        let encoder = Encoder::open(to, config)?;
        debug!(
            "UCS conversion {} ({:?}) -> {} ({:?})",
            from,
            decoder.kind(),
            to,
            encoder.kind()
        );
        Ok(Self { decoder, encoder })
    }

    /// The source side.
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// The target side.
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Longest character on the `direction` side.
    pub fn max_char_len(&self, direction: Direction) -> usize {
        match direction {
            Direction::ToUcs => self.decoder.max_char_len(),
            Direction::FromUcs => self.encoder.max_char_len(),
        }
    }

    /// Whether the `direction` side keeps a shift state.
    pub fn is_stateful(&self, direction: Direction) -> bool {
        match direction {
            Direction::ToUcs => self.decoder.is_stateful(),
            Direction::FromUcs => self.encoder.is_stateful(),
        }
    }

    /// Shift state of the `direction` side.
    pub fn state(&self, direction: Direction) -> ShiftState {
        match direction {
            Direction::ToUcs => self.decoder.state(),
            Direction::FromUcs => self.encoder.state(),
        }
    }

    /// Replace the shift state of the `direction` side.
    pub fn set_state(&mut self, direction: Direction, state: ShiftState) {
        match direction {
            Direction::ToUcs => self.decoder.set_state(state),
            Direction::FromUcs => self.encoder.set_state(state),
        }
    }

    /// Bytes returning the target to its initial shift state.
    pub fn initial_sequence(&self) -> &'static [u8] {
        self.encoder.initial_sequence()
    }

    /// Convert as much of `input` as possible into `out`.
    ///
    /// Returns the number of non-reversible conversions. On error `input`
    /// stops at the start of the character that could not be converted and
    /// `out` holds everything converted before it.
    pub fn convert<S: ByteSink>(
        &mut self,
        input: &mut InputCursor<'_>,
        out: &mut S,
        unmappable: Unmappable,
    ) -> Result<usize> {
        let mut irreversible = 0;

        while !input.is_empty() {
            if out.space() == 0 {
                return Err(Error::OutputFull);
            }

            let mark = input.mark();
            let state = self.decoder.state();
            let code = self.decoder.decode(input)?;

            let encoded = match self.encoder.encode(code, out) {
                Err(CesError::InvalidCharacter) if unmappable == Unmappable::Substitute => {
                    irreversible += 1;
                    self.encoder.encode(DEFAULT_CHARACTER, out)
                }
                other => other,
            };
            if let Err(err) = encoded {
                // a BOM consumed with this character must be read again
                input.reset(mark);
                self.decoder.set_state(state);
                return Err(err.into());
            }
        }

        Ok(irreversible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{DiscardSink, OutputCursor};

    fn engine(to: &str, from: &str) -> UcsEngine {
        UcsEngine::open(to, from, &Config::default()).unwrap()
    }

    #[test]
    fn test_substitution_counts() {
        let mut engine = engine("us_ascii", "utf_8");
        let input = "a\u{20AC}b\u{00E9}".as_bytes();
        let mut out = Vec::new();
        let n = engine
            .convert(&mut InputCursor::new(input), &mut out, Unmappable::Substitute)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, b"a?b?");
    }

    #[test]
    fn test_strict_rolls_back_character() {
        let mut engine = engine("us_ascii", "utf_8");
        let input = "ab\u{20AC}".as_bytes();
        let mut cursor = InputCursor::new(input);
        let mut out = Vec::new();
        let err = engine
            .convert(&mut cursor, &mut out, Unmappable::Fail)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCharacter));
        assert_eq!(cursor.consumed(), 2);
        assert_eq!(out, b"ab");
    }

    #[test]
    fn test_output_full_rolls_back() {
        let mut engine = engine("utf_8", "iso_8859_1");
        let input = [0x41, 0xE9, 0x42];
        let mut cursor = InputCursor::new(&input);
        let mut buf = [0u8; 2];
        let mut out = OutputCursor::new(&mut buf);
        let err = engine
            .convert(&mut cursor, &mut out, Unmappable::Substitute)
            .unwrap_err();
        assert!(matches!(err, Error::OutputFull));
        assert_eq!(cursor.consumed(), 1);
        assert_eq!(out.filled(), b"A");
    }

    #[test]
    fn test_bad_sequence_stops_before_tail() {
        let mut engine = engine("utf_16be", "utf_8");
        let input = [0x41, 0xE2, 0x82];
        let mut cursor = InputCursor::new(&input);
        let mut out = Vec::new();
        let err = engine
            .convert(&mut cursor, &mut out, Unmappable::Substitute)
            .unwrap_err();
        assert!(matches!(err, Error::BadSequence));
        assert_eq!(cursor.consumed(), 1);
        assert_eq!(out, vec![0x00, 0x41]);
    }

    #[test]
    fn test_dry_run_sink() {
        let mut engine = engine("utf_16le", "koi8_r");
        let input = [0xF0, 0xD2, 0xC9, 0xD7, 0xC5, 0xD4];
        let mut sink = DiscardSink::unbounded();
        let n = engine
            .convert(&mut InputCursor::new(&input), &mut sink, Unmappable::Fail)
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(sink.written(), 12);
    }

    #[test]
    fn test_shift_state_access() {
        let mut engine = engine("utf_16", "utf_8");
        assert!(engine.is_stateful(Direction::FromUcs));
        assert!(!engine.is_stateful(Direction::ToUcs));
        let mut out = Vec::new();
        engine
            .convert(&mut InputCursor::new(b"x"), &mut out, Unmappable::Fail)
            .unwrap();
        assert_eq!(out.len(), 4);
        engine.set_state(Direction::FromUcs, ShiftState::Initial);
        out.clear();
        engine
            .convert(&mut InputCursor::new(b"x"), &mut out, Unmappable::Fail)
            .unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(engine.state(Direction::ToUcs), ShiftState::Initial);
    }

    #[test]
    fn test_resume_after_output_full_keeps_bom() {
        let mut engine = engine("utf_16be", "utf_16");
        let input = [0xFF, 0xFE, 0x41, 0x00];
        let mut cursor = InputCursor::new(&input);
        let fresh = engine.state(Direction::ToUcs);

        let mut small = [0u8; 1];
        let err = engine
            .convert(&mut cursor, &mut OutputCursor::new(&mut small), Unmappable::Fail)
            .unwrap_err();
        assert!(matches!(err, Error::OutputFull));
        assert_eq!(cursor.consumed(), 0);
        assert_eq!(engine.state(Direction::ToUcs), fresh);

        let mut out = Vec::new();
        let n = engine
            .convert(&mut cursor, &mut out, Unmappable::Fail)
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(out, [0x00, 0x41]);
    }

    #[test]
    fn test_strict_failure_keeps_bom() {
        let mut engine = engine("us_ascii", "utf_16");
        let input = [0xFF, 0xFE, 0xAC, 0x20, 0x41, 0x00];
        let mut cursor = InputCursor::new(&input);
        let mut out = Vec::new();
        let err = engine
            .convert(&mut cursor, &mut out, Unmappable::Fail)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCharacter));
        assert_eq!(cursor.consumed(), 0);

        let n = engine
            .convert(&mut cursor, &mut out, Unmappable::Substitute)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(out, b"?A");
    }
}

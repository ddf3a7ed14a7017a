//! Conversion sessions.
//!
//! An [`Iconv`] owns everything one conversion needs: the resolved encoding
//! names and either a plain byte copy (when both names resolve to the same
//! encoding) or a [`UcsEngine`].

use log::debug;

use crate::aliases;
use crate::ccs::Direction;
use crate::ces::ShiftState;
use crate::config::Config;
use crate::cursor::{ByteSink, InputCursor, OutputCursor};
use crate::engine::{UcsEngine, Unmappable};
use crate::error::{Error, Result};

/// Longest character reported for an identity conversion.
pub const NULL_MAX_CHAR_LEN: usize = 6;

#[derive(Debug, Clone)]
enum Conversion {
    Null,
    Ucs(UcsEngine),
}

/// An open conversion from one encoding to another.
///
/// ```
/// use ucsconv::{Iconv, InputCursor, OutputCursor};
///
/// let mut cd = Iconv::open("US-ASCII", "UTF-8")?;
/// let mut input = InputCursor::new(b"Hello");
/// let mut buf = [0u8; 16];
/// let mut out = OutputCursor::new(&mut buf);
/// assert_eq!(cd.convert(&mut input, &mut out)?, 0);
/// assert_eq!(out.filled(), b"Hello");
/// cd.close()?;
/// # Ok::<(), ucsconv::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Iconv {
    from: String,
    to: String,
    conversion: Conversion,
    unmappable: Unmappable,
}

impl Iconv {
    /// Open a conversion from `from` to `to`, configured from the environment.
    pub fn open(to: &str, from: &str) -> Result<Self> {
        Self::open_with(to, from, &Config::from_env())
    }

    /// Open a conversion from `from` to `to` using `config`.
    pub fn open_with(to: &str, from: &str, config: &Config) -> Result<Self> {
        let to = aliases::resolve(to)?;
        let from = aliases::resolve(from)?;

        let conversion = if to == from {
            Conversion::Null
        } else {
            Conversion::Ucs(UcsEngine::open(&to, &from, config)?)
        };
        debug!(
            "opened {} conversion {} -> {}",
            match conversion {
                Conversion::Null => "null",
                Conversion::Ucs(_) => "UCS",
            },
            from,
            to
        );

        Ok(Self {
            from,
            to,
            conversion,
            unmappable: Unmappable::default(),
        })
    }

    /// Canonical source encoding name.
    pub fn from_name(&self) -> &str {
        &self.from
    }

    /// Canonical target encoding name.
    pub fn to_name(&self) -> &str {
        &self.to
    }

    /// True when both names resolved to the same encoding and bytes are copied as is.
    pub fn is_identity(&self) -> bool {
        matches!(self.conversion, Conversion::Null)
    }

    /// Mode used by [`Iconv::convert`] and [`Iconv::convert_to_vec`].
    pub fn unmappable(&self) -> Unmappable {
        self.unmappable
    }

    /// Change how characters missing from the target are handled.
    pub fn set_unmappable(&mut self, unmappable: Unmappable) {
        self.unmappable = unmappable;
    }

    /// Convert from `input` into `out`, returning the number of
    /// non-reversible conversions.
    ///
    /// Both cursors are left just past the last character converted, also
    /// when an error is returned.
    pub fn convert(
        &mut self,
        input: &mut InputCursor<'_>,
        out: &mut OutputCursor<'_>,
    ) -> Result<usize> {
        self.convert_with(input, out, self.unmappable)
    }

    /// Like [`Iconv::convert`], into any sink and with an explicit mode.
    ///
    /// Passing a [`crate::DiscardSink`] validates and counts without writing.
    pub fn convert_with<S: ByteSink>(
        &mut self,
        input: &mut InputCursor<'_>,
        out: &mut S,
        unmappable: Unmappable,
    ) -> Result<usize> {
        match &mut self.conversion {
            Conversion::Null => {
                let n = input.len().min(out.space());
                out.put(&input.remaining()[..n])?;
                input.advance(n);
                if input.is_empty() {
                    Ok(0)
                } else {
                    Err(Error::OutputFull)
                }
            }
            Conversion::Ucs(engine) => engine.convert(input, out, unmappable),
        }
    }

    /// Convert all of `input` into a new vector.
    ///
    /// Returns the output and the number of non-reversible conversions.
    pub fn convert_to_vec(&mut self, input: &[u8]) -> Result<(Vec<u8>, usize)> {
        let mut out = Vec::new();
        out.try_reserve(input.len())?;

        let mut cursor = InputCursor::new(input);
        let count = self.convert_with(&mut cursor, &mut out, self.unmappable)?;
        Ok((out, count))
    }

    /// Return the target side to its initial shift state.
    ///
    /// This is the shift state query made with no input. Stateless targets
    /// are left alone. With `out`, the initial shift sequence is written to
    /// it; if it does not fit, the state is kept and
    /// [`Error::OutputFull`] is returned.
    pub fn reset(&mut self, out: Option<&mut dyn ByteSink>) -> Result<()> {
        let Conversion::Ucs(engine) = &mut self.conversion else {
            return Ok(());
        };
        if !engine.is_stateful(Direction::FromUcs) {
            return Ok(());
        }

        let saved = engine.state(Direction::FromUcs);
        engine.set_state(Direction::FromUcs, ShiftState::Initial);
        if let Some(out) = out {
            if let Err(err) = out.put(engine.initial_sequence()) {
                engine.set_state(Direction::FromUcs, saved);
                return Err(err.into());
            }
        }
        debug!("reset shift state of {}", self.to);
        Ok(())
    }

    /// Longest character of the source (`ToUcs`) or target (`FromUcs`) encoding.
    pub fn max_char_len(&self, direction: Direction) -> usize {
        match &self.conversion {
            Conversion::Null => NULL_MAX_CHAR_LEN,
            Conversion::Ucs(engine) => engine.max_char_len(direction),
        }
    }

    /// Whether the source or target encoding keeps a shift state.
    pub fn is_stateful(&self, direction: Direction) -> bool {
        match &self.conversion {
            Conversion::Null => false,
            Conversion::Ucs(engine) => engine.is_stateful(direction),
        }
    }

    /// Shift state of the source or target encoding.
    pub fn shift_state(&self, direction: Direction) -> ShiftState {
        match &self.conversion {
            Conversion::Null => ShiftState::Initial,
            Conversion::Ucs(engine) => engine.state(direction),
        }
    }

    /// Restore a state obtained from [`Iconv::shift_state`].
    pub fn set_shift_state(&mut self, direction: Direction, state: ShiftState) {
        if let Conversion::Ucs(engine) = &mut self.conversion {
            engine.set_state(direction, state);
        }
    }

    /// End the session, releasing its converters and any loaded tables.
    ///
    /// Dropping the session frees everything, so this currently always
    /// returns `Ok`. The `Result` keeps the `iconv_close` shape for callers
    /// that check it.
    pub fn close(self) -> Result<()> {
        debug!("closed conversion {} -> {}", self.from, self.to);
        Ok(())
    }
}

/// Convert `input` from `from` to `to` in one call, substituting
/// characters the target cannot represent.
pub fn convert(to: &str, from: &str, input: &[u8]) -> Result<Vec<u8>> {
    let mut cd = Iconv::open(to, from)?;
    let (out, _) = cd.convert_to_vec(input)?;
    cd.close()?;
    Ok(out)
}

//! Flat, versioned text encoding for board states.
//!
//! Every encoded board has the shape `<tag>/<version>|field|field|...`.
//! Fields never contain `|`. Grids are fixed-width digit strings and move
//! logs are space separated, so a decoder can check every length up front.

use crate::{CodecError, Seat};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, instrument};

const FIELD_SEP: char = '|';
const VERSION_SEP: char = '/';

/// Builds an encoded board one field at a time.
#[derive(Debug, Clone)]
pub struct StateWriter {
    out: String,
}

impl StateWriter {
    /// Starts a new encoding with the given game tag and codec version.
    pub fn new(tag: &str, version: u32) -> Self {
        Self {
            out: format!("{}{}{}", tag, VERSION_SEP, version),
        }
    }

    /// Appends a field.
    pub fn field(mut self, value: impl Display) -> Self {
        self.out.push(FIELD_SEP);
        self.out.push_str(&value.to_string());
        self
    }

    /// Appends a boolean as `0` or `1`.
    pub fn flag(self, value: bool) -> Self {
        self.field(if value { '1' } else { '0' })
    }

    /// Appends a seat as `1` or `2`.
    pub fn seat(self, seat: Seat) -> Self {
        self.field(seat.code())
    }

    /// Returns the encoded string.
    pub fn finish(self) -> String {
        self.out
    }
}

/// Reads fields back out of an encoded board, checking the header first.
#[derive(Debug)]
pub struct StateReader<'a> {
    fields: std::str::Split<'a, char>,
}

impl<'a> StateReader<'a> {
    /// Validates the header and positions the reader on the first field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ForeignTag`] when the input belongs to another
    /// game and [`CodecError::UnsupportedVersion`] for any other version.
    #[instrument(skip(input), fields(len = input.len()))]
    pub fn open(input: &'a str, tag: &'static str, version: u32) -> Result<Self, CodecError> {
        let mut fields = input.split(FIELD_SEP);
        let header = fields
            .next()
            .ok_or_else(|| CodecError::malformed("empty input"))?;
        let (found, found_version) = header
            .split_once(VERSION_SEP)
            .ok_or_else(|| CodecError::malformed(format!("missing version in header '{}'", header)))?;

        if found != tag {
            return Err(CodecError::ForeignTag {
                expected: tag,
                found: found.to_string(),
            });
        }

        let found_version: u32 = found_version
            .parse()
            .map_err(|_| CodecError::malformed(format!("bad version '{}'", found_version)))?;
        if found_version != version {
            return Err(CodecError::UnsupportedVersion(found_version));
        }

        debug!(tag, version, "Board state header accepted");
        Ok(Self { fields })
    }

    /// Returns the next raw field.
    pub fn field(&mut self, name: &str) -> Result<&'a str, CodecError> {
        self.fields
            .next()
            .ok_or_else(|| CodecError::malformed(format!("missing field '{}'", name)))
    }

    /// Parses the next field.
    pub fn parse<T: FromStr>(&mut self, name: &str) -> Result<T, CodecError> {
        let raw = self.field(name)?;
        raw.parse()
            .map_err(|_| CodecError::malformed(format!("bad value '{}' for field '{}'", raw, name)))
    }

    /// Reads a `0`/`1` flag.
    pub fn flag(&mut self, name: &str) -> Result<bool, CodecError> {
        match self.field(name)? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(CodecError::malformed(format!(
                "bad flag '{}' for field '{}'",
                other, name
            ))),
        }
    }

    /// Reads a seat written with [`StateWriter::seat`].
    pub fn seat(&mut self, name: &str) -> Result<Seat, CodecError> {
        let raw = self.field(name)?;
        let mut chars = raw.chars();
        match (chars.next().and_then(Seat::from_code), chars.next()) {
            (Some(seat), None) => Ok(seat),
            _ => Err(CodecError::malformed(format!("bad seat '{}' for field '{}'", raw, name))),
        }
    }

    /// Reads a fixed-width string of decimal digits, each at most `max`.
    pub fn digits(&mut self, name: &str, len: usize, max: u8) -> Result<Vec<u8>, CodecError> {
        let raw = self.field(name)?;
        digits(raw, len, max).map_err(|e| match e {
            CodecError::Malformed(reason) => {
                CodecError::malformed(format!("field '{}': {}", name, reason))
            }
            other => other,
        })
    }

    /// Fails if any field is left unread.
    pub fn finish(mut self) -> Result<(), CodecError> {
        match self.fields.next() {
            None => Ok(()),
            Some(extra) => Err(CodecError::malformed(format!(
                "unexpected trailing field '{}'",
                extra
            ))),
        }
    }
}

/// Decodes a fixed-width digit string.
pub fn digits(raw: &str, len: usize, max: u8) -> Result<Vec<u8>, CodecError> {
    if raw.len() != len {
        return Err(CodecError::malformed(format!(
            "expected {} digits, found {}",
            len,
            raw.len()
        )));
    }
    raw.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if d <= u32::from(max) => Ok(d as u8),
            _ => Err(CodecError::malformed(format!("unexpected cell value '{}'", c))),
        })
        .collect()
}

/// Encodes a digit slice as a string.
pub fn encode_digits(cells: &[u8]) -> String {
    cells
        .iter()
        .map(|&d| char::from_digit(u32::from(d), 10).unwrap_or('0'))
        .collect()
}

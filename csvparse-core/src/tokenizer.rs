use core::cmp;

use alloc::string::String;
use alloc::vec::Vec;

use memchr::memchr2_iter;

use crate::error::Error;

/// The number of bytes reserved the first time a `TokenBuffer` grows.
///
/// Every subsequent growth doubles the capacity.
pub const INITIAL_TOKEN_CAPACITY: usize = 128;

/// Count the fields on a line.
///
/// This is the number of `,` bytes that are not inside a quoted region, plus
/// one. Every `"` toggles the quoted region. Quote state always starts off
/// at the beginning of the line, so an empty line has exactly one (empty)
/// field.
///
/// The line given should already be stripped of its terminator.
pub fn count_fields(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut in_quote = false;
    let mut commas = 0;
    for i in memchr2_iter(b',', b'"', bytes) {
        match bytes[i] {
            b'"' => in_quote = !in_quote,
            _ if !in_quote => commas += 1,
            _ => {}
        }
    }
    commas + 1
}

/// Split a single line into exactly `expected` fields.
///
/// Fields are separated by `,` outside of quotes. Quote characters are
/// retained in the field values. The trailing field is always emitted, even
/// when it is empty, so a line with `n` unquoted commas always yields `n + 1`
/// fields.
///
/// If the number of fields found differs from `expected`, then
/// `Error::FieldCount` is returned and nothing produced for this line
/// survives. If memory cannot be reserved at any point, then
/// `Error::OutOfMemory` is returned.
pub fn tokenize(line: &str, expected: usize) -> Result<Vec<String>, Error> {
    let mut fields = Vec::new();
    fields.try_reserve_exact(expected)?;

    let mut tok = TokenBuffer::new();
    let mut in_quote = false;
    for ch in line.chars() {
        if ch == '"' {
            in_quote = !in_quote;
        }
        if ch == ',' && !in_quote {
            let field = tok.take()?;
            fields.try_reserve(1)?;
            fields.push(field);
        } else {
            tok.push(ch)?;
        }
    }
    let field = tok.take()?;
    fields.try_reserve(1)?;
    fields.push(field);

    if fields.len() != expected {
        return Err(Error::FieldCount { expected, found: fields.len() });
    }
    Ok(fields)
}

/// A growable scratch buffer for the field currently being accumulated.
///
/// The buffer starts without any allocation. The first growth reserves
/// `INITIAL_TOKEN_CAPACITY` bytes and each growth after that doubles the
/// capacity, so the number of reallocations is logarithmic in the length of
/// the longest field. All growth is fallible.
///
/// A token buffer is meant to live for the duration of tokenizing one line.
#[derive(Clone, Debug, Default)]
pub struct TokenBuffer {
    buf: String,
}

impl TokenBuffer {
    /// Create a new empty token buffer. This does not allocate.
    pub fn new() -> TokenBuffer {
        TokenBuffer::default()
    }

    /// Append a character to the current token, growing if necessary.
    pub fn push(&mut self, ch: char) -> Result<(), Error> {
        let need = self.buf.len() + ch.len_utf8();
        if need > self.buf.capacity() {
            self.grow(need)?;
        }
        self.buf.push(ch);
        Ok(())
    }

    /// Copy the current token out as an owned field and clear the buffer.
    ///
    /// The returned string is sized to fit the token exactly. The buffer
    /// keeps its capacity for the next token.
    pub fn take(&mut self) -> Result<String, Error> {
        let mut field = String::new();
        field.try_reserve_exact(self.buf.len())?;
        field.push_str(&self.buf);
        self.buf.clear();
        Ok(field)
    }

    /// The token accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// The length, in bytes, of the token accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if and only if no bytes have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The number of bytes this buffer can hold before it must grow.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Discard the current token without producing a field.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn grow(&mut self, need: usize) -> Result<(), Error> {
        let mut cap = match self.buf.capacity() {
            0 => INITIAL_TOKEN_CAPACITY,
            cap => cap.checked_mul(2).ok_or(Error::OutOfMemory)?,
        };
        while cap < need {
            cap = cap.checked_mul(2).ok_or(Error::OutOfMemory)?;
        }
        let additional = cmp::max(cap, need) - self.buf.len();
        self.buf.try_reserve_exact(additional)?;
        Ok(())
    }
}

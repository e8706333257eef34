//! Strings as the coprocessor's built-in fonts expect them.
//!
//! The ROM fonts are ASCII-only, but they reuse the otherwise-unprintable
//! code points 0x18 through 0x1f for a handful of Latin-1 characters. The
//! encoder rewrites the UTF-8 forms of those characters into their single
//! byte code points and leaves every other byte alone.

/// The fixed table of UTF-8 sequences rewritten into the built-in fonts'
/// single-byte code points. The `eve_text!` macro applies the same table.
pub const REMAP_TABLE: [([u8; 2], u8); 8] = [
    ([0xc2, 0xb0], 0x18), // °
    ([0xc3, 0x9f], 0x19), // ß
    ([0xc3, 0x84], 0x1a), // Ä
    ([0xc3, 0x96], 0x1b), // Ö
    ([0xc3, 0x9c], 0x1c), // Ü
    ([0xc3, 0xa4], 0x1d), // ä
    ([0xc3, 0xb6], 0x1e), // ö
    ([0xc3, 0xbc], 0x1f), // ü
];

/// Returns the font code point for the given two-byte sequence, if it's one
/// of the sequences in [`REMAP_TABLE`](REMAP_TABLE).
pub fn remap_pair(lead: u8, follow: u8) -> Option<u8> {
    REMAP_TABLE
        .iter()
        .find(|(seq, _)| seq[0] == lead && seq[1] == follow)
        .map(|(_, code)| *code)
}

/// A string to be sent to the coprocessor as the argument of a command such
/// as `CMD_TEXT`.
///
/// A message made from an ordinary `&str` is remapped while it's being
/// encoded. The `eve_text!` macro produces messages that were already
/// remapped at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message<'a> {
    bytes: &'a [u8],
    remapped: bool,
}

impl<'a> Message<'a> {
    pub const fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            remapped: false,
        }
    }

    /// Makes a message from raw bytes, which will be remapped while encoding
    /// like a `&str` would.
    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            bytes: bytes,
            remapped: false,
        }
    }

    /// Makes a message from bytes that are already in the form the chip
    /// expects. This is the expansion of `eve_text!` and is not intended to
    /// be called directly.
    #[doc(hidden)]
    pub const fn new_remapped(bytes: &'a [u8]) -> Self {
        Self {
            bytes: bytes,
            remapped: true,
        }
    }

    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub const fn is_remapped(&self) -> bool {
        self.remapped
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bytes to put on the wire, not including the null terminator.
    pub fn encoded(&self) -> Encoded<'a> {
        Encoded {
            bytes: self.bytes,
            pos: 0,
            remap: !self.remapped,
        }
    }

    /// The number of line breaks in the message.
    pub fn newline_count(&self) -> usize {
        self.bytes.iter().filter(|b| **b == b'\n').count()
    }

    /// Splits the message at each line break.
    pub fn lines(&self) -> impl Iterator<Item = Message<'a>> + 'a {
        let remapped = self.remapped;
        self.bytes
            .split(|b| *b == b'\n')
            .map(move |line| Message {
                bytes: line,
                remapped: remapped,
            })
    }
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s)
    }
}

/// Iterator over the wire bytes of a [`Message`](Message).
#[derive(Clone, Debug)]
pub struct Encoded<'a> {
    bytes: &'a [u8],
    pos: usize,
    remap: bool,
}

impl<'a> Iterator for Encoded<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if self.remap && (b == 0xc2 || b == 0xc3) {
            if let Some(follow) = self.bytes.get(self.pos) {
                if let Some(code) = remap_pair(b, *follow) {
                    self.pos += 1;
                    return Some(code);
                }
            }
        }
        Some(b)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.bytes.len() - self.pos;
        (left / 2, Some(left))
    }
}

impl<'a> core::iter::FusedIterator for Encoded<'a> {}

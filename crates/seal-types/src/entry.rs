use std::fmt;

use bytes::Bytes;

/// Opaque, immutable byte sequence supplied by a producer.
///
/// The core never interprets the contents. Cloning is cheap: the bytes are
/// reference-counted.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Entry(Bytes);

impl Entry {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the entry contains a `\n` byte and therefore cannot
    /// be stored as a single ledger line.
    pub fn has_line_break(&self) -> bool {
        self.0.contains(&b'\n')
    }

    /// Lossy UTF-8 rendering for logs and CLI output.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl AsRef<[u8]> for Entry {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&'static str> for Entry {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Entry {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Entry {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<Bytes> for Entry {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({:?})", self.to_string_lossy())
    }
}

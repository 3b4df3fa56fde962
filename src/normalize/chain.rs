//! `X-Forwarded-For` chain parsing.
//!
//! Each hop appends the address it received the request from, so the chain
//! reads left to right from the original client towards this server.

/// Separator written between chain entries.
pub const SEPARATOR: &str = ", ";

/// Borrowed view over a non-empty forwarded-for value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardedChain<'a> {
    raw: &'a str,
}

impl<'a> ForwardedChain<'a> {
    /// Returns `None` for an empty value.
    pub fn parse(raw: &'a str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self { raw })
        }
    }

    /// Split off the entry appended by the nearest hop.
    ///
    /// Returns the remaining chain (if any entries are left) and the nearest entry.
    /// Segments are not trimmed or validated, so `"a, "` yields `(Some("a"), "")`.
    pub fn split_last(&self) -> (Option<&'a str>, &'a str) {
        match self.raw.rfind(SEPARATOR) {
            Some(index) => (Some(&self.raw[..index]), &self.raw[index + SEPARATOR.len()..]),
            None => (None, self.raw),
        }
    }

    /// Entries from the original client to the nearest hop.
    pub fn addresses(&self) -> impl Iterator<Item = &'a str> {
        self.raw.split(SEPARATOR)
    }
}

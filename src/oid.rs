//! OBJECT IDENTIFIER values.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::fmt;
use bytes::Bytes;
use crate::decode::{ContentError, ErrorKind};


//------------ Oid -----------------------------------------------------------

/// An object identifier.
///
/// Object identifiers are globally unique, hierarchical values used to
/// identify objects or their type. When written out, they are presented as
/// a sequence of integers separated by dots such as `1.3.6.1.5.5.7.1`.
///
/// A value of this type keeps the identifier in its encoded form: each
/// component as a base-128 big-endian integer with the top bit of every
/// octet except the last set, and the first two components combined into a
/// single one as `x * 40 + y`. The encoding is validated on construction,
/// so values can be compared and hashed directly on their octets.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Oid(Bytes);

impl Oid {
    /// Creates an object identifier from the content octets of a value.
    ///
    /// Returns an invalid-argument error if the content is empty, ends in
    /// the middle of a component, or contains a component with leading zero
    /// padding.
    pub fn from_content(content: Bytes) -> Result<Self, ContentError> {
        if content.is_empty() {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "empty object identifier"
            ))
        }
        let mut start = true;
        for &octet in content.iter() {
            if start && octet == 0x80 {
                return Err(ContentError::new(
                    ErrorKind::InvalidArgument,
                    "leading zeros in object identifier component"
                ))
            }
            start = octet & 0x80 == 0;
        }
        if !start {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "truncated object identifier"
            ))
        }
        Ok(Oid(content))
    }

    /// Creates an object identifier from a static octet slice.
    pub fn from_static(slice: &'static [u8]) -> Result<Self, ContentError> {
        Self::from_content(Bytes::from_static(slice))
    }

    /// Returns the content octets of the identifier.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns a reference to the underlying bytes value.
    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    /// Returns an iterator over the components of the identifier.
    pub fn iter(&self) -> Iter {
        Iter {
            data: self.0.as_ref(),
            first: true,
            second: None,
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for arc in self.iter() {
            if first {
                write!(f, "{arc}")?;
                first = false;
            }
            else {
                write!(f, ".{arc}")?;
            }
        }
        Ok(())
    }
}


//------------ Iter ----------------------------------------------------------

/// An iterator over the components of an object identifier.
///
/// The iterator is returned by [`Oid::iter`]. Components larger than a
/// `u64` are truncated silently, which in practice does not happen.
pub struct Iter<'a> {
    /// The remaining encoded components.
    data: &'a [u8],

    /// Are we still before the first component?
    first: bool,

    /// The second component if the first has been split off already.
    second: Option<u64>,
}

impl<'a> Iter<'a> {
    /// Takes the next encoded component from the data.
    fn take_encoded(&mut self) -> Option<u64> {
        if self.data.is_empty() {
            return None
        }
        let mut res = 0u64;
        loop {
            let octet = self.data[0];
            self.data = &self.data[1..];
            res = res << 7 | u64::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                return Some(res)
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if let Some(second) = self.second.take() {
            return Some(second)
        }
        if self.first {
            self.first = false;
            // The first encoded component combines the first two: the
            // root arc can only be 0, 1, or 2, and the second arc is
            // limited to 39 under roots 0 and 1.
            let combined = self.take_encoded()?;
            let (first, second) = match combined {
                0..=39 => (0, combined),
                40..=79 => (1, combined - 40),
                _ => (2, combined - 80),
            };
            self.second = Some(second);
            return Some(first)
        }
        self.take_encoded()
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_content() {
        assert!(Oid::from_static(b"\x2a\x03").is_ok());
        assert_eq!(
            Oid::from_static(b"").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Oid::from_static(b"\x2a\x83").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Oid::from_static(b"\x2a\x80\x03").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn iter() {
        // 1.2.3
        let oid = Oid::from_static(b"\x2a\x03").unwrap();
        assert_eq!(oid.iter().collect::<Vec<_>>(), [1, 2, 3]);

        // 2.100.3
        let oid = Oid::from_static(b"\x81\x34\x03").unwrap();
        assert_eq!(oid.iter().collect::<Vec<_>>(), [2, 100, 3]);

        // 1.3.6.1.5.5.7.1
        let oid = Oid::from_static(b"\x2b\x06\x01\x05\x05\x07\x01").unwrap();
        assert_eq!(
            oid.iter().collect::<Vec<_>>(), [1, 3, 6, 1, 5, 5, 7, 1]
        );
    }

    #[test]
    fn display() {
        assert_eq!(
            Oid::from_static(b"\x2a\x03").unwrap().to_string(), "1.2.3"
        );
        assert_eq!(
            Oid::from_static(
                b"\x2b\x06\x01\x05\x05\x07\x01"
            ).unwrap().to_string(),
            "1.3.6.1.5.5.7.1"
        );
    }
}

//! INTEGER values.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::fmt;
use bytes::Bytes;
use crate::decode::{ContentError, ErrorKind};


//------------ Integer -------------------------------------------------------

/// An INTEGER value of arbitrary size.
///
/// The type wraps the content octets of an encoded integer: a variable
/// length, big-endian, two's complement byte sequence. The most significant
/// bit of the first octet serves as the sign bit.
///
/// X.690 requires the content to use the smallest possible number of
/// octets, i.e., the first nine bits must not all be equal. We insist on
/// this rule in every mode. It means the content octets of two equal
/// integers are themselves equal, so comparison and hashing can work on the
/// raw octets.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Integer(Bytes);

impl Integer {
    /// Creates an integer from the content octets of an encoded value.
    ///
    /// Returns an invalid-argument error if the content is empty or not in
    /// minimal form.
    pub fn from_content(content: Bytes) -> Result<Self, ContentError> {
        match (content.first(), content.get(1).map(|x| x & 0x80 != 0)) {
            (None, _) => {
                Err(ContentError::new(
                    ErrorKind::InvalidArgument, "empty integer"
                ))
            }
            (Some(0), Some(false)) | (Some(0xFF), Some(true)) => {
                Err(ContentError::new(
                    ErrorKind::InvalidArgument, "non-minimal integer"
                ))
            }
            _ => Ok(Integer(content))
        }
    }

    /// Returns the content octets of the integer.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns a reference to the underlying bytes value.
    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    /// Returns whether the integer is zero.
    pub fn is_zero(&self) -> bool {
        self.0.as_ref() == [0]
    }

    /// Returns whether the integer is negative.
    pub fn is_negative(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    /// Returns the value as an `i128` if it fits.
    pub fn to_i128(&self) -> Option<i128> {
        if self.0.len() > 16 {
            return None
        }
        let mut res = if self.is_negative() { -1i128 } else { 0 };
        for &octet in self.0.iter() {
            res = res << 8 | i128::from(octet);
        }
        Some(res)
    }
}


//--- From

impl From<i128> for Integer {
    fn from(val: i128) -> Self {
        let bytes = val.to_be_bytes();
        let mut start = 0;
        while start < 15 {
            match (bytes[start], bytes[start + 1] & 0x80 != 0) {
                (0, false) | (0xFF, true) => start += 1,
                _ => break
            }
        }
        Integer(Bytes::copy_from_slice(&bytes[start..]))
    }
}

macro_rules! from_impl {
    ( $( $type:ident ),* ) => {
        $(
            impl From<$type> for Integer {
                fn from(val: $type) -> Self {
                    Self::from(i128::from(val))
                }
            }
        )*
    }
}

from_impl!(i8, i16, i32, i64, u8, u16, u32, u64);


//--- Display

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_i128() {
            Some(val) => val.fmt(f),
            None => {
                // Too big for a built-in type. Fall back to hex.
                write!(f, "0x")?;
                for octet in self.0.iter() {
                    write!(f, "{octet:02x}")?;
                }
                Ok(())
            }
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn content(slice: &'static [u8]) -> Result<Integer, ErrorKind> {
        Integer::from_content(Bytes::from_static(slice)).map_err(|err| {
            err.kind()
        })
    }

    #[test]
    fn from_content() {
        assert_eq!(content(b"\x00").unwrap().to_i128(), Some(0));
        assert_eq!(content(b"\x7f").unwrap().to_i128(), Some(127));
        assert_eq!(content(b"\x80").unwrap().to_i128(), Some(-128));
        assert_eq!(content(b"\x00\x80").unwrap().to_i128(), Some(128));
        assert_eq!(content(b"\xff\x7f").unwrap().to_i128(), Some(-129));

        assert_eq!(content(b""), Err(ErrorKind::InvalidArgument));
        assert_eq!(content(b"\x00\x05"), Err(ErrorKind::InvalidArgument));
        assert_eq!(content(b"\xff\x80"), Err(ErrorKind::InvalidArgument));
    }

    #[test]
    fn from_builtin() {
        assert_eq!(Integer::from(0i8).as_slice(), b"\x00");
        assert_eq!(Integer::from(1u8).as_slice(), b"\x01");
        assert_eq!(Integer::from(127i64).as_slice(), b"\x7f");
        assert_eq!(Integer::from(128u32).as_slice(), b"\x00\x80");
        assert_eq!(Integer::from(256u16).as_slice(), b"\x01\x00");
        assert_eq!(Integer::from(-1i32).as_slice(), b"\xff");
        assert_eq!(Integer::from(-128i16).as_slice(), b"\x80");
        assert_eq!(Integer::from(-129i64).as_slice(), b"\xff\x7f");
        assert_eq!(
            Integer::from(i128::MIN).as_slice(),
            [
                0x80, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0
            ].as_slice()
        );
    }

    #[test]
    fn to_i128() {
        for val in [0i128, 1, -1, 127, 128, -128, -129, i128::MAX, i128::MIN] {
            assert_eq!(Integer::from(val).to_i128(), Some(val));
        }
    }

    #[test]
    fn display() {
        assert_eq!(Integer::from(-129i64).to_string(), "-129");
        assert_eq!(Integer::from(42u8).to_string(), "42");
    }
}

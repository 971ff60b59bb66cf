//! BIT STRING values.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::{fmt, io};
use bytes::Bytes;
use crate::decode::{ContentError, ErrorKind};
use crate::mode::Mode;


//------------ BitString -----------------------------------------------------

/// A BIT STRING value.
///
/// A bit string is a sequence of bits of arbitrary length. In the encoding,
/// the bits are packed into octets with the final octet padded with zero
/// to seven unused bits. The number of unused bits travels in an extra
/// octet prefixed to the content.
///
/// The unused bits of the final octet carry no information. DER requires
/// them to be zero; in the other modes we keep them as they arrived but
/// mask them when encoding canonically, comparing, or hashing.
#[derive(Clone, Debug)]
pub struct BitString {
    /// The number of unused bits in the last octet.
    unused: u8,

    /// The octets of the string.
    bits: Bytes,
}

impl BitString {
    /// Creates a bit string from the number of unused bits and the octets.
    ///
    /// Returns an invalid-argument error if `unused` is larger than 7 or
    /// if it is non-zero for an empty string.
    pub fn new(
        unused: u8, bits: impl Into<Bytes>,
    ) -> Result<Self, ContentError> {
        let bits = bits.into();
        if unused > 7 {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "invalid number of unused bits"
            ))
        }
        if bits.is_empty() && unused != 0 {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "unused bits in empty bit string"
            ))
        }
        Ok(BitString { unused, bits })
    }

    /// Creates a bit string from the content octets of an encoded value.
    ///
    /// In DER mode, the unused bits of the final octet must be zero.
    pub fn from_content(
        content: Bytes, mode: Mode,
    ) -> Result<Self, ContentError> {
        let Some(unused) = content.first().copied() else {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "empty bit string content"
            ))
        };
        let res = Self::new(unused, content.slice(1..))?;
        if mode.is_canonical() && res.last_octet() != res.last_octet_masked()
        {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "unused bits set in DER"
            ))
        }
        Ok(res)
    }

    /// Returns the number of unused bits in the last octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the octets of the string, including any unused bits.
    pub fn octets(&self) -> &Bytes {
        &self.bits
    }

    /// Returns the number of bits in the string.
    pub fn bit_len(&self) -> usize {
        self.bits.len() * 8 - usize::from(self.unused)
    }

    /// Returns the bit at the given index.
    ///
    /// Bit 0 is the most significant bit of the first octet. Indexes past
    /// the end of the string return `false`.
    pub fn bit(&self, idx: usize) -> bool {
        if idx >= self.bit_len() {
            return false
        }
        self.bits[idx / 8] & (0x80 >> (idx % 8)) != 0
    }

    /// Returns the string with the unused bits of the last octet zeroed.
    pub fn to_canonical(&self) -> Self {
        if self.last_octet() == self.last_octet_masked() {
            return self.clone()
        }
        let mut bits = self.bits.to_vec();
        if let Some(last) = bits.last_mut() {
            *last = self.last_octet_masked()
        }
        BitString { unused: self.unused, bits: bits.into() }
    }

    /// Returns the last octet or zero for an empty string.
    fn last_octet(&self) -> u8 {
        self.bits.last().copied().unwrap_or(0)
    }

    /// Returns the last octet with the unused bits masked off.
    fn last_octet_masked(&self) -> u8 {
        // unused is at most 7, so the shift is fine.
        self.last_octet() & !((1u8 << self.unused) - 1)
    }

    /// Returns the length of the encoded content.
    pub(crate) fn content_len(&self) -> usize {
        self.bits.len() + 1
    }

    /// Writes the encoded content to a target in the given mode.
    pub(crate) fn write_content<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        target.write_all(&[self.unused])?;
        if self.bits.is_empty() {
            return Ok(())
        }
        if mode.is_canonical() {
            target.write_all(&self.bits[..self.bits.len() - 1])?;
            target.write_all(&[self.last_octet_masked()])
        }
        else {
            target.write_all(&self.bits)
        }
    }

    /// Returns a stable hash over the canonical content.
    pub(crate) fn stable_hash(&self) -> u64 {
        let mut res = u64::from(self.unused);
        if !self.bits.is_empty() {
            for &octet in &self.bits[..self.bits.len() - 1] {
                res = res.wrapping_mul(257) ^ u64::from(octet);
            }
            res = res.wrapping_mul(257)
                ^ u64::from(self.last_octet_masked());
        }
        res
    }
}


//--- PartialEq and Eq

impl PartialEq for BitString {
    fn eq(&self, other: &Self) -> bool {
        self.unused == other.unused
            && self.bits.len() == other.bits.len()
            && (self.bits.is_empty()
                || (self.bits[..self.bits.len() - 1]
                        == other.bits[..other.bits.len() - 1]
                    && self.last_octet_masked()
                        == other.last_octet_masked()))
    }
}

impl Eq for BitString { }


//--- Display

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#")?;
        for octet in self.bits.iter() {
            write!(f, "{octet:02x}")?;
        }
        write!(f, "/{}", self.bit_len())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new() {
        assert!(BitString::new(0, Bytes::new()).is_ok());
        assert!(BitString::new(7, Bytes::from_static(b"\x80")).is_ok());
        assert_eq!(
            BitString::new(8, Bytes::from_static(b"\x80"))
                .unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            BitString::new(1, Bytes::new()).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn from_content() {
        let bits = BitString::from_content(
            Bytes::from_static(b"\x06\x6e\x5d\xc0"), Mode::Ber
        ).unwrap();
        assert_eq!(bits.unused(), 6);
        assert_eq!(bits.bit_len(), 18);
        assert!(bits.bit(1));
        assert!(!bits.bit(0));
        assert!(!bits.bit(20));

        // Unused bits set: fine in BER, not in DER.
        assert!(BitString::from_content(
            Bytes::from_static(b"\x06\x6e\x5d\xc1"), Mode::Ber
        ).is_ok());
        assert_eq!(
            BitString::from_content(
                Bytes::from_static(b"\x06\x6e\x5d\xc1"), Mode::Der
            ).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        assert_eq!(
            BitString::from_content(Bytes::new(), Mode::Ber)
                .unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn eq_masks_unused() {
        let left = BitString::new(
            6, Bytes::from_static(b"\x6e\x5d\xc1")
        ).unwrap();
        let right = BitString::new(
            6, Bytes::from_static(b"\x6e\x5d\xc0")
        ).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.stable_hash(), right.stable_hash());
        assert_eq!(left.to_canonical().octets().as_ref(), b"\x6e\x5d\xc0");
        assert_ne!(
            left,
            BitString::new(5, Bytes::from_static(b"\x6e\x5d\xc0")).unwrap()
        );
    }

    #[test]
    fn write_content() {
        let bits = BitString::new(
            6, Bytes::from_static(b"\x6e\x5d\xc1")
        ).unwrap();
        let mut target = Vec::new();
        bits.write_content(Mode::Ber, &mut target).unwrap();
        assert_eq!(target, b"\x06\x6e\x5d\xc1");
        let mut target = Vec::new();
        bits.write_content(Mode::Der, &mut target).unwrap();
        assert_eq!(target, b"\x06\x6e\x5d\xc0");
        assert_eq!(bits.content_len(), 4);
    }
}

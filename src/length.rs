//! The length octets of an encoded value.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::io;
use crate::decode::{DecodeError, ErrorKind, Source};
use crate::mode::Mode;


//------------ Length --------------------------------------------------------

/// The length of the content octets of an encoded value.
///
/// A length is either _definite,_ meaning it provides the actual number of
/// content octets, or _indefinite,_ in which case the content is delimited
/// by a special end-of-contents marker and the value must use constructed
/// encoding.
///
/// # Encoding
///
/// The first length octet determines the form. If its most significant bit
/// is clear, the remaining seven bits are the definite length already
/// (the short form). Otherwise the remaining seven bits give the number of
/// subsequent octets holding the big-endian definite length (the long
/// form), with two exceptions: `0x80` marks the indefinite form and `0xFF`
/// is reserved.
///
/// In DL and DER modes a definite length must be encoded in the minimum
/// number of octets and the indefinite form is not allowed at all.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Length {
    /// A length value in definite form providing the number of octets.
    Definite(usize),

    /// A length value in indefinite form.
    Indefinite,
}

impl Length {
    /// Takes a length from the beginning of a source.
    ///
    /// The `mode` determines which forms of length are acceptable.
    pub fn take_from<S: Source>(
        source: &mut S, mode: Mode,
    ) -> Result<Self, DecodeError<S::Error>> {
        let first = match source.take_opt_u8()? {
            Some(first) => first,
            None => {
                return Err(source.content_err(
                    ErrorKind::MalformedLength, "unexpected end of data"
                ))
            }
        };

        // Short form.
        if first & 0x80 == 0 {
            return Ok(Length::Definite(first.into()))
        }

        // Indefinite form.
        if first == 0x80 {
            if !mode.allows_indefinite() {
                xerr!(return Err(source.content_err(
                    ErrorKind::MalformedLength,
                    "indefinite length not allowed in this mode"
                )))
            }
            return Ok(Length::Indefinite)
        }

        // Reserved.
        if first == 0xFF {
            xerr!(return Err(source.content_err(
                ErrorKind::MalformedLength, "reserved length octets"
            )))
        }

        // Long form with `count` subsequent octets.
        let count = usize::from(first & 0x7F);
        let mut res: usize = 0;
        for i in 0..count {
            let octet = match source.take_opt_u8()? {
                Some(octet) => octet,
                None => {
                    return Err(source.content_err(
                        ErrorKind::MalformedLength, "unexpected end of data"
                    ))
                }
            };
            if mode.is_restricted() && i == 0 && octet == 0 {
                xerr!(return Err(source.content_err(
                    ErrorKind::MalformedLength,
                    "non-minimal length octets"
                )))
            }
            if res > usize::MAX >> 8 {
                xerr!(return Err(source.content_err(
                    ErrorKind::MalformedLength, "excessive length"
                )))
            }
            res = res << 8 | usize::from(octet);
        }
        if mode.is_restricted() && res < 0x80 {
            xerr!(return Err(source.content_err(
                ErrorKind::MalformedLength, "non-minimal length octets"
            )))
        }
        Ok(Length::Definite(res))
    }

    /// Returns the length if it is definite.
    pub fn definite(self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(len),
            Length::Indefinite => None,
        }
    }

    /// Returns whether the length is definite and zero.
    pub fn is_zero(self) -> bool {
        self.definite() == Some(0)
    }

    /// Returns the number of octets of the encoded form of the length.
    pub fn encoded_len(self) -> usize {
        match self {
            Length::Definite(len) => {
                if len < 0x80 {
                    1
                }
                else {
                    (usize::BITS as usize / 8)
                        - (len.leading_zeros() as usize / 8) + 1
                }
            }
            Length::Indefinite => 1,
        }
    }

    /// Writes the encoded length to the given target.
    ///
    /// Definite lengths are always written in their minimal form.
    pub fn write_encoded<W: io::Write>(
        self, target: &mut W,
    ) -> Result<(), io::Error> {
        match self {
            Length::Definite(len) => {
                if len < 0x80 {
                    target.write_all(&[len as u8])
                }
                else {
                    let count = self.encoded_len() - 1;
                    target.write_all(&[0x80 | count as u8])?;
                    target.write_all(
                        &len.to_be_bytes()[
                            usize::BITS as usize / 8 - count..
                        ]
                    )
                }
            }
            Length::Indefinite => target.write_all(&[0x80]),
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::SliceSource;

    fn take(
        data: &[u8], mode: Mode
    ) -> Result<Option<usize>, ErrorKind> {
        let mut source = SliceSource::new(data);
        let res = Length::take_from(&mut source, mode).map_err(|err| {
            err.kind().unwrap()
        })?;
        assert!(source.remaining().is_empty(), "trailing data");
        Ok(res.definite())
    }

    #[test]
    fn ber_take_from() {
        assert_eq!(take(b"\x00", Mode::Ber).unwrap(), Some(0));
        assert_eq!(take(b"\x12", Mode::Ber).unwrap(), Some(0x12));
        assert_eq!(take(b"\x7f", Mode::Ber).unwrap(), Some(0x7f));
        assert_eq!(take(b"\x80", Mode::Ber).unwrap(), None);
        assert_eq!(take(b"\x81\x00", Mode::Ber).unwrap(), Some(0));
        assert_eq!(take(b"\x81\xf0", Mode::Ber).unwrap(), Some(0xf0));
        assert_eq!(take(b"\x82\x00\x0e", Mode::Ber).unwrap(), Some(0x0e));
        assert_eq!(take(b"\x82\xf0\x0e", Mode::Ber).unwrap(), Some(0xf00e));
        assert_eq!(
            take(b"\xff", Mode::Ber), Err(ErrorKind::MalformedLength)
        );
        assert_eq!(
            take(b"\x82\xf0", Mode::Ber), Err(ErrorKind::MalformedLength)
        );
    }

    #[test]
    fn dl_take_from() {
        assert_eq!(take(b"\x00", Mode::Dl).unwrap(), Some(0));
        assert_eq!(take(b"\x81\x80", Mode::Dl).unwrap(), Some(0x80));
        // DL forbids the indefinite form but is not canonical, so
        // non-minimal length octets pass.
        assert_eq!(take(b"\x80", Mode::Dl), Err(ErrorKind::MalformedLength));
        assert_eq!(take(b"\x82\x00\x0e", Mode::Dl).unwrap(), Some(0x0e));
    }

    #[test]
    fn der_take_from() {
        assert_eq!(take(b"\x00", Mode::Der).unwrap(), Some(0));
        assert_eq!(take(b"\x7f", Mode::Der).unwrap(), Some(0x7f));
        assert_eq!(take(b"\x81\x80", Mode::Der).unwrap(), Some(0x80));
        assert_eq!(take(b"\x82\xf0\x0e", Mode::Der).unwrap(), Some(0xf00e));

        // The indefinite form is BER only.
        assert_eq!(take(b"\x80", Mode::Der), Err(ErrorKind::MalformedLength));
        // Leading zero octet.
        assert_eq!(
            take(b"\x82\x00\x0e", Mode::Der),
            Err(ErrorKind::MalformedLength)
        );
        // Fits the short form.
        assert_eq!(
            take(b"\x81\x7f", Mode::Der), Err(ErrorKind::MalformedLength)
        );
    }

    #[test]
    fn encode() {
        fn step(length: Length, expected: &[u8]) {
            let mut vec = Vec::new();
            length.write_encoded(&mut vec).unwrap();
            assert_eq!(vec, expected, "encode failed for {length:?}");
            assert_eq!(vec.len(), length.encoded_len());
        }

        step(Length::Indefinite, b"\x80");
        step(Length::Definite(0), b"\x00");
        step(Length::Definite(0x12), b"\x12");
        step(Length::Definite(0x7f), b"\x7f");
        step(Length::Definite(0x80), b"\x81\x80");
        step(Length::Definite(0xdead), b"\x82\xde\xad");
        step(Length::Definite(0x01_0000), b"\x83\x01\x00\x00");
    }
}

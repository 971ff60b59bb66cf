//! The identifier octets of an encoded value.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::{fmt, io};
use crate::decode::{DecodeError, ErrorKind, Source};


//------------ Class ---------------------------------------------------------

/// The class of a tag.
///
/// Every tag belongs to one of four classes, encoded in the top two bits of
/// the first identifier octet.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    /// The universal class of the types defined by X.680 itself.
    Universal,

    /// The application class, assigned by a particular specification.
    Application,

    /// The context-specific class, local to the enclosing type.
    Context,

    /// The private class, assigned by private agreement.
    Private,
}

impl Class {
    /// Returns the class encoded in the first identifier octet.
    pub const fn from_u8(octet: u8) -> Self {
        match octet >> 6 {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::Context,
            _ => Class::Private,
        }
    }

    /// Returns the class as its bits in the first identifier octet.
    pub const fn into_u8(self) -> u8 {
        match self {
            Class::Universal => 0x00,
            Class::Application => 0x40,
            Class::Context => 0x80,
            Class::Private => 0xC0,
        }
    }
}


//------------ Tag -----------------------------------------------------------

/// The tag of an encoded value.
///
/// In ASN.1, tags identify the type of a value. They consist of one of four
/// classes, represented by [`Class`], and a number within that class.
///
/// In the encoding, the tag becomes part of the identifier octets together
/// with a bit indicating whether the value uses primitive or constructed
/// encoding. The `Tag` type represents only the class and number; the
/// constructed bit travels alongside it in decoding and encoding.
///
/// # Limitations
///
/// We only support tag numbers that fit into a `u32`. This should be more
/// than enough in practice.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag {
    /// The class of the tag.
    class: Class,

    /// The number of the tag.
    number: u32,
}

/// # Constants for universal tags.
///
/// See clause 8.4 of ITU Recommendation X.690.
///
impl Tag {
    /// The tag marking the end-of-contents in an indefinite length value.
    pub const END_OF_CONTENTS: Self = Self::new(Class::Universal, 0);

    /// The tag for the BOOLEAN type, UNIVERSAL 1.
    pub const BOOLEAN: Self = Self::new(Class::Universal, 1);

    /// The tag for the INTEGER type, UNIVERSAL 2.
    pub const INTEGER: Self = Self::new(Class::Universal, 2);

    /// The tag for the BIT STRING type, UNIVERSAL 3.
    pub const BIT_STRING: Self = Self::new(Class::Universal, 3);

    /// The tag for the OCTET STRING type, UNIVERSAL 4.
    pub const OCTET_STRING: Self = Self::new(Class::Universal, 4);

    /// The tag for the NULL type, UNIVERSAL 5.
    pub const NULL: Self = Self::new(Class::Universal, 5);

    /// The tag for the OBJECT IDENTIFIER type, UNIVERSAL 6.
    pub const OID: Self = Self::new(Class::Universal, 6);

    /// The tag for the ObjectDescriptor type, UNIVERSAL 7.
    pub const OBJECT_DESCRIPTOR: Self = Self::new(Class::Universal, 7);

    /// The tag for the EXTERNAL and Instance-of types, UNIVERSAL 8.
    pub const EXTERNAL: Self = Self::new(Class::Universal, 8);

    /// The tag for the REAL type, UNIVERSAL 9.
    pub const REAL: Self = Self::new(Class::Universal, 9);

    /// The tag for the ENUMERATED type, UNIVERSAL 10.
    pub const ENUMERATED: Self = Self::new(Class::Universal, 10);

    /// The tag for the EMBEDDED PDV type, UNIVERSAL 11.
    pub const EMBEDDED_PDV: Self = Self::new(Class::Universal, 11);

    /// The tag for the UTF8String type, UNIVERSAL 12.
    pub const UTF8_STRING: Self = Self::new(Class::Universal, 12);

    /// The tag for the RELATIVE-OID type, UNIVERSAL 13.
    pub const RELATIVE_OID: Self = Self::new(Class::Universal, 13);

    /// The tag for the SEQUENCE and SEQUENCE OF types, UNIVERSAL 16.
    pub const SEQUENCE: Self = Self::new(Class::Universal, 16);

    /// The tag for the SET and SET OF types, UNIVERSAL 17.
    pub const SET: Self = Self::new(Class::Universal, 17);

    /// The tag for the NumericString type, UNIVERSAL 18.
    pub const NUMERIC_STRING: Self = Self::new(Class::Universal, 18);

    /// The tag for the PrintableString type, UNIVERSAL 19.
    pub const PRINTABLE_STRING: Self = Self::new(Class::Universal, 19);

    /// The tag for the TeletexString type, UNIVERSAL 20.
    pub const TELETEX_STRING: Self = Self::new(Class::Universal, 20);

    /// The tag for the VideotexString type, UNIVERSAL 21.
    pub const VIDEOTEX_STRING: Self = Self::new(Class::Universal, 21);

    /// The tag for the IA5String type, UNIVERSAL 22.
    pub const IA5_STRING: Self = Self::new(Class::Universal, 22);

    /// The tag for the UTCTime type, UNIVERSAL 23.
    pub const UTC_TIME: Self = Self::new(Class::Universal, 23);

    /// The tag for the GeneralizedTime type, UNIVERSAL 24.
    pub const GENERALIZED_TIME: Self = Self::new(Class::Universal, 24);

    /// The tag for the GraphicString type, UNIVERSAL 25.
    pub const GRAPHIC_STRING: Self = Self::new(Class::Universal, 25);

    /// The tag for the VisibleString type, UNIVERSAL 26.
    pub const VISIBLE_STRING: Self = Self::new(Class::Universal, 26);

    /// The tag for the GeneralString type, UNIVERSAL 27.
    pub const GENERAL_STRING: Self = Self::new(Class::Universal, 27);

    /// The tag for the UniversalString type, UNIVERSAL 28.
    pub const UNIVERSAL_STRING: Self = Self::new(Class::Universal, 28);

    /// The tag for the BMPString type, UNIVERSAL 30.
    pub const BMP_STRING: Self = Self::new(Class::Universal, 30);
}

impl Tag {
    /// Creates a tag from a class and number.
    pub const fn new(class: Class, number: u32) -> Self {
        Tag { class, number }
    }

    /// Creates a tag in the universal class with the given number.
    pub const fn universal(number: u32) -> Self {
        Self::new(Class::Universal, number)
    }

    /// Creates a tag in the application class with the given number.
    pub const fn application(number: u32) -> Self {
        Self::new(Class::Application, number)
    }

    /// Creates a tag in the context-specific class with the given number.
    pub const fn ctx(number: u32) -> Self {
        Self::new(Class::Context, number)
    }

    /// Creates a tag in the private class with the given number.
    pub const fn private(number: u32) -> Self {
        Self::new(Class::Private, number)
    }

    /// Returns the class of the tag.
    pub const fn class(self) -> Class {
        self.class
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Returns whether the tag is of the universal class.
    pub const fn is_universal(self) -> bool {
        matches!(self.class, Class::Universal)
    }

    /// Takes a tag from the beginning of a source.
    ///
    /// Upon success, returns both the tag and whether the value uses
    /// constructed encoding. If there are no more octets available in the
    /// source, an error is returned.
    pub fn take_from<S: Source>(
        source: &mut S,
    ) -> Result<(Self, bool), DecodeError<S::Error>> {
        match Self::take_opt_from(source)? {
            Some(res) => Ok(res),
            None => {
                Err(source.content_err(
                    ErrorKind::MalformedHeader, "unexpected end of data"
                ))
            }
        }
    }

    /// Takes a tag from the beginning of a source if there is one.
    ///
    /// Returns `Ok(None)` if the source has reached its end before the
    /// first identifier octet.
    pub fn take_opt_from<S: Source>(
        source: &mut S,
    ) -> Result<Option<(Self, bool)>, DecodeError<S::Error>> {
        let first = match source.take_opt_u8()? {
            Some(first) => first,
            None => return Ok(None)
        };
        let class = Class::from_u8(first);
        let constructed = first & 0x20 != 0;

        // Low tag numbers live in the five low bits of the first octet.
        // All five bits set signals the long form.
        if first & 0x1F != 0x1F {
            return Ok(Some((
                Tag::new(class, (first & 0x1F).into()), constructed
            )))
        }

        // Long form: each subsequent octet contributes seven bits, big
        // endian, with the top bit marking continuation.
        let mut number = 0u32;
        let mut start = true;
        loop {
            let octet = source.take_u8()?;
            if start && octet == 0x80 {
                xerr!(return Err(source.content_err(
                    ErrorKind::MalformedHeader,
                    "leading zeros in long form tag number"
                )))
            }
            start = false;
            if number > u32::MAX >> 7 {
                xerr!(return Err(source.content_err(
                    ErrorKind::MalformedHeader, "tag number too large"
                )))
            }
            number = number << 7 | u32::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                return Ok(Some((Tag::new(class, number), constructed)))
            }
        }
    }

    /// Returns the number of octets of the encoded form of the tag.
    pub fn encoded_len(self) -> usize {
        if self.number < 0x1F {
            return 1
        }
        let mut number = self.number;
        let mut res = 2;
        while number > 0x7F {
            number >>= 7;
            res += 1;
        }
        res
    }

    /// Writes the identifier octets to a target.
    ///
    /// If `constructed` is `true`, the encoded tag will signal a value in
    /// constructed encoding and primitive encoding otherwise.
    pub fn write_encoded<W: io::Write>(
        self, constructed: bool, target: &mut W,
    ) -> Result<(), io::Error> {
        let first = self.class.into_u8()
            | if constructed { 0x20 } else { 0 };
        if self.number < 0x1F {
            return target.write_all(&[first | self.number as u8])
        }
        let mut buf = [0u8; 6];
        buf[0] = first | 0x1F;
        let mut idx = self.encoded_len() - 1;
        let mut number = self.number;
        buf[idx] = number as u8 & 0x7F;
        while number > 0x7F {
            number >>= 7;
            idx -= 1;
            buf[idx] = number as u8 & 0x7F | 0x80;
        }
        target.write_all(&buf[..self.encoded_len()])
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Tag::BOOLEAN => write!(f, "BOOLEAN"),
            Tag::INTEGER => write!(f, "INTEGER"),
            Tag::BIT_STRING => write!(f, "BIT STRING"),
            Tag::OCTET_STRING => write!(f, "OCTET STRING"),
            Tag::NULL => write!(f, "NULL"),
            Tag::OID => write!(f, "OBJECT IDENTIFIER"),
            Tag::OBJECT_DESCRIPTOR => write!(f, "ObjectDescriptor"),
            Tag::EXTERNAL => write!(f, "EXTERNAL"),
            Tag::REAL => write!(f, "REAL"),
            Tag::ENUMERATED => write!(f, "ENUMERATED"),
            Tag::EMBEDDED_PDV => write!(f, "EMBEDDED PDV"),
            Tag::UTF8_STRING => write!(f, "UTF8String"),
            Tag::RELATIVE_OID => write!(f, "RELATIVE-OID"),
            Tag::SEQUENCE => write!(f, "SEQUENCE"),
            Tag::SET => write!(f, "SET"),
            Tag::NUMERIC_STRING => write!(f, "NumericString"),
            Tag::PRINTABLE_STRING => write!(f, "PrintableString"),
            Tag::TELETEX_STRING => write!(f, "TeletexString"),
            Tag::VIDEOTEX_STRING => write!(f, "VideotexString"),
            Tag::IA5_STRING => write!(f, "IA5String"),
            Tag::UTC_TIME => write!(f, "UTCTime"),
            Tag::GENERALIZED_TIME => write!(f, "GeneralizedTime"),
            Tag::GRAPHIC_STRING => write!(f, "GraphicString"),
            Tag::VISIBLE_STRING => write!(f, "VisibleString"),
            Tag::GENERAL_STRING => write!(f, "GeneralString"),
            Tag::UNIVERSAL_STRING => write!(f, "UniversalString"),
            Tag::BMP_STRING => write!(f, "BMPString"),
            tag => {
                match tag.class {
                    Class::Universal => write!(f, "[UNIVERSAL ")?,
                    Class::Application => write!(f, "[APPLICATION ")?,
                    Class::Context => write!(f, "[")?,
                    Class::Private => write!(f, "[PRIVATE ")?,
                }
                write!(f, "{}]", tag.number)
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::SliceSource;

    const CLASSES: &[Class] = &[
        Class::Universal, Class::Application, Class::Context, Class::Private
    ];

    fn take(data: &[u8]) -> Result<(Tag, bool), ErrorKind> {
        let mut source = SliceSource::new(data);
        Tag::take_from(&mut source).map_err(|err| err.kind().unwrap())
    }

    fn encode(tag: Tag, constructed: bool) -> Vec<u8> {
        let mut res = Vec::new();
        tag.write_encoded(constructed, &mut res).unwrap();
        res
    }

    #[test]
    fn short_form() {
        for &class in CLASSES {
            for number in (0..5).chain(26..31) {
                let tag = Tag::new(class, number);
                let data = encode(tag, false);
                assert_eq!(data.len(), 1);
                assert_eq!(tag.encoded_len(), 1);
                assert_eq!(take(&data).unwrap(), (tag, false));
                assert_eq!(
                    take(&encode(tag, true)).unwrap(), (tag, true)
                );
                assert_eq!(tag.number(), number);
                assert_eq!(tag.class(), class);
            }
        }
    }

    #[test]
    fn long_form() {
        for &class in CLASSES {
            for number in [
                31, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000,
                u32::MAX
            ] {
                let tag = Tag::new(class, number);
                let data = encode(tag, false);
                assert_eq!(data.len(), tag.encoded_len());
                assert_eq!(take(&data).unwrap(), (tag, false));
                assert_eq!(
                    take(&encode(tag, true)).unwrap(), (tag, true)
                );
            }
        }
    }

    #[test]
    fn long_form_examples() {
        // 31 is the smallest number needing the long form.
        assert_eq!(encode(Tag::universal(31), false), b"\x1f\x1f");
        // [CONTEXT 201], constructed.
        assert_eq!(take(b"\xbf\x81\x49").unwrap(), (Tag::ctx(201), true));
    }

    #[test]
    fn failures() {
        // Truncated long form.
        assert_eq!(take(b"\x1f\x81"), Err(ErrorKind::MalformedHeader));
        // Leading zero padding octet.
        assert_eq!(
            take(b"\x1f\x80\x01"), Err(ErrorKind::MalformedHeader)
        );
        // Number too large for a u32.
        assert_eq!(
            take(b"\x1f\x90\x80\x80\x80\x80\x00"),
            Err(ErrorKind::MalformedHeader)
        );
        // Empty source.
        assert_eq!(take(b""), Err(ErrorKind::MalformedHeader));
    }

    #[test]
    fn take_opt_from() {
        let mut source = SliceSource::new(b"");
        assert!(Tag::take_opt_from(&mut source).unwrap().is_none());
    }

    #[test]
    fn display() {
        assert_eq!(Tag::SEQUENCE.to_string(), "SEQUENCE");
        assert_eq!(Tag::ctx(3).to_string(), "[3]");
        assert_eq!(Tag::application(7).to_string(), "[APPLICATION 7]");
        assert_eq!(Tag::private(1).to_string(), "[PRIVATE 1]");
    }
}

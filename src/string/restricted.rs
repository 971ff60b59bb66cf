//! The family of restricted character strings.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::{fmt, str};
use bytes::Bytes;
use crate::decode::{ContentError, ErrorKind};
use crate::tag::Tag;


//------------ StringKind ----------------------------------------------------

/// The kind of a restricted character string.
///
/// ASN.1 defines a whole family of character string types that differ only
/// in the character set they allow and the universal tag they carry. This
/// enum names the members of the family handled by [`RestrictedString`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StringKind {
    /// UTF8String, UNIVERSAL 12.
    Utf8,

    /// NumericString, UNIVERSAL 18: digits and space.
    Numeric,

    /// PrintableString, UNIVERSAL 19: a conservative ASCII subset.
    Printable,

    /// TeletexString, UNIVERSAL 20.
    Teletex,

    /// VideotexString, UNIVERSAL 21.
    Videotex,

    /// IA5String, UNIVERSAL 22: seven-bit ASCII.
    Ia5,

    /// GraphicString, UNIVERSAL 25.
    Graphic,

    /// VisibleString, UNIVERSAL 26: printable ASCII.
    Visible,

    /// GeneralString, UNIVERSAL 27.
    General,

    /// UniversalString, UNIVERSAL 28: UCS-4.
    Universal,

    /// BMPString, UNIVERSAL 30: UCS-2.
    Bmp,
}

impl StringKind {
    /// Returns the universal tag of this kind of string.
    pub fn tag(self) -> Tag {
        match self {
            StringKind::Utf8 => Tag::UTF8_STRING,
            StringKind::Numeric => Tag::NUMERIC_STRING,
            StringKind::Printable => Tag::PRINTABLE_STRING,
            StringKind::Teletex => Tag::TELETEX_STRING,
            StringKind::Videotex => Tag::VIDEOTEX_STRING,
            StringKind::Ia5 => Tag::IA5_STRING,
            StringKind::Graphic => Tag::GRAPHIC_STRING,
            StringKind::Visible => Tag::VISIBLE_STRING,
            StringKind::General => Tag::GENERAL_STRING,
            StringKind::Universal => Tag::UNIVERSAL_STRING,
            StringKind::Bmp => Tag::BMP_STRING,
        }
    }

    /// Returns the kind for the given tag if it names a string type.
    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::UTF8_STRING => Some(StringKind::Utf8),
            Tag::NUMERIC_STRING => Some(StringKind::Numeric),
            Tag::PRINTABLE_STRING => Some(StringKind::Printable),
            Tag::TELETEX_STRING => Some(StringKind::Teletex),
            Tag::VIDEOTEX_STRING => Some(StringKind::Videotex),
            Tag::IA5_STRING => Some(StringKind::Ia5),
            Tag::GRAPHIC_STRING => Some(StringKind::Graphic),
            Tag::VISIBLE_STRING => Some(StringKind::Visible),
            Tag::GENERAL_STRING => Some(StringKind::General),
            Tag::UNIVERSAL_STRING => Some(StringKind::Universal),
            Tag::BMP_STRING => Some(StringKind::Bmp),
            _ => None
        }
    }

    /// Checks that the content conforms to the character set of the kind.
    ///
    /// The kinds with character sets beyond ASCII and UTF-8 are carried
    /// uninterpreted.
    fn check(self, content: &[u8]) -> Result<(), ContentError> {
        let ok = match self {
            StringKind::Utf8 => str::from_utf8(content).is_ok(),
            StringKind::Numeric => {
                content.iter().all(|&ch| {
                    ch == b' ' || ch.is_ascii_digit()
                })
            }
            StringKind::Printable => {
                content.iter().all(|&ch| {
                    ch.is_ascii_alphanumeric()
                    || b" '()+,-./:=?".contains(&ch)
                })
            }
            StringKind::Ia5 => content.iter().all(|&ch| ch < 0x80),
            StringKind::Visible => {
                content.iter().all(|&ch| (0x20..0x7F).contains(&ch))
            }
            _ => true
        };
        if ok {
            Ok(())
        }
        else {
            Err(ContentError::new(
                ErrorKind::InvalidArgument,
                "character outside of string type's character set"
            ))
        }
    }
}


//------------ RestrictedString ----------------------------------------------

/// A character string of one of the restricted kinds.
///
/// The content is kept in its encoded form. Where the kind pins down a
/// character set we can check cheaply, construction validates it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RestrictedString {
    /// The kind of string.
    kind: StringKind,

    /// The encoded content.
    content: Bytes,
}

impl RestrictedString {
    /// Creates a string from a kind and the content octets.
    pub fn new(
        kind: StringKind, content: impl Into<Bytes>,
    ) -> Result<Self, ContentError> {
        let content = content.into();
        kind.check(content.as_ref())?;
        Ok(RestrictedString { kind, content })
    }

    /// Creates a UTF8String from a Rust string.
    pub fn utf8(content: impl Into<String>) -> Self {
        RestrictedString {
            kind: StringKind::Utf8,
            content: content.into().into(),
        }
    }

    /// Returns the kind of the string.
    pub fn kind(&self) -> StringKind {
        self.kind
    }

    /// Returns the content octets.
    pub fn as_slice(&self) -> &[u8] {
        self.content.as_ref()
    }

    /// Returns a reference to the underlying bytes value.
    pub fn bytes(&self) -> &Bytes {
        &self.content
    }

    /// Returns the content as a `str` if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(self.content.as_ref()).ok()
    }
}

impl fmt::Display for RestrictedString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "\"{s}\""),
            None => {
                write!(f, "#")?;
                for octet in self.content.iter() {
                    write!(f, "{octet:02x}")?;
                }
                Ok(())
            }
        }
    }
}


//============ Tests =========================================================

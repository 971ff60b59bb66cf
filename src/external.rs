//! The EXTERNAL type.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::{fmt, io};
use crate::decode::{ContentError, ErrorKind};
use crate::int::Integer;
use crate::length::Length;
use crate::mode::Mode;
use crate::oid::Oid;
use crate::tag::Tag;
use crate::value::{fnv, seeded, write_header, Value};


//------------ External ------------------------------------------------------

/// An EXTERNAL value.
///
/// EXTERNAL carries a value whose abstract syntax is identified by
/// reference rather than by the enclosing module: an optional object
/// identifier, an optional integer reference, an optional descriptor, and
/// the content itself, wrapped in a context tag whose number states how
/// the content is encoded.
#[derive(Clone, Debug)]
pub struct External {
    /// The direct reference identifying the content's syntax.
    direct_reference: Option<Oid>,

    /// The indirect reference identifying the content's syntax.
    indirect_reference: Option<Integer>,

    /// A human-readable description of the content.
    data_value_descriptor: Option<Box<Value>>,

    /// How the content is encoded.
    ///
    /// 0 is single-ASN1-type, 1 is OCTET STRING, 2 is BIT STRING.
    encoding: u8,

    /// The content of the value.
    content: Box<Value>,
}

impl External {
    /// Creates an EXTERNAL value from its fields.
    ///
    /// Returns an invalid-argument error if `encoding` is not 0, 1, or 2.
    pub fn new(
        direct_reference: Option<Oid>,
        indirect_reference: Option<Integer>,
        data_value_descriptor: Option<Value>,
        encoding: u8,
        content: Value,
    ) -> Result<Self, ContentError> {
        if encoding > 2 {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "invalid encoding value"
            ))
        }
        Ok(External {
            direct_reference,
            indirect_reference,
            data_value_descriptor: data_value_descriptor.map(Box::new),
            encoding,
            content: Box::new(content),
        })
    }

    /// Creates an EXTERNAL value from a sequence of decoded values.
    ///
    /// The sequence must consist of an optional OBJECT IDENTIFIER, an
    /// optional INTEGER, an optional descriptor of any other untagged
    /// type, and a mandatory final tagged value whose number is the
    /// content encoding. Anything else is a structure error.
    pub fn from_values(values: Vec<Value>) -> Result<Self, ContentError> {
        let mut iter = values.into_iter().peekable();

        let mut direct_reference = None;
        if let Some(Value::Oid(_)) = iter.peek() {
            if let Some(Value::Oid(oid)) = iter.next() {
                direct_reference = Some(oid)
            }
        }
        let mut indirect_reference = None;
        if let Some(Value::Integer(_)) = iter.peek() {
            if let Some(Value::Integer(int)) = iter.next() {
                indirect_reference = Some(int)
            }
        }
        let mut data_value_descriptor = None;
        match iter.peek() {
            Some(Value::Tagged(_)) | None => { }
            Some(_) => {
                data_value_descriptor = iter.next().map(Box::new)
            }
        }

        let tagged = match iter.next() {
            Some(Value::Tagged(tagged)) => tagged,
            _ => {
                return Err(ContentError::new(
                    ErrorKind::Structure,
                    "EXTERNAL without tagged content"
                ))
            }
        };
        if iter.next().is_some() {
            return Err(ContentError::new(
                ErrorKind::Structure,
                "trailing elements in EXTERNAL"
            ))
        }
        if tagged.number() > 2 {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "invalid encoding value"
            ))
        }

        Ok(External {
            direct_reference,
            indirect_reference,
            data_value_descriptor,
            encoding: tagged.number() as u8,
            content: Box::new(tagged.into_inner()),
        })
    }

    /// Returns the direct reference if present.
    pub fn direct_reference(&self) -> Option<&Oid> {
        self.direct_reference.as_ref()
    }

    /// Returns the indirect reference if present.
    pub fn indirect_reference(&self) -> Option<&Integer> {
        self.indirect_reference.as_ref()
    }

    /// Returns the data value descriptor if present.
    pub fn data_value_descriptor(&self) -> Option<&Value> {
        self.data_value_descriptor.as_deref()
    }

    /// Returns the content encoding.
    ///
    /// The value is 0 for single-ASN1-type, 1 for OCTET STRING, and 2 for
    /// BIT STRING.
    pub fn encoding(&self) -> u8 {
        self.encoding
    }

    /// Returns the content of the value.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Returns the length of the encoded content octets in `mode`.
    pub(crate) fn content_len(&self, mode: Mode) -> usize {
        let mut res = 0;
        if let Some(oid) = &self.direct_reference {
            res += field_len(Tag::OID, oid.as_slice().len());
        }
        if let Some(int) = &self.indirect_reference {
            res += field_len(Tag::INTEGER, int.as_slice().len());
        }
        if let Some(descriptor) = &self.data_value_descriptor {
            res += descriptor.encoded_len(mode);
        }
        let content_len = self.content.encoded_len(mode);
        res + field_len(Tag::ctx(self.encoding.into()), content_len)
    }

    /// Writes the encoded content octets to a target in `mode`.
    pub(crate) fn write_content<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        if let Some(oid) = &self.direct_reference {
            write_header(
                target, Tag::OID, false, oid.as_slice().len()
            )?;
            target.write_all(oid.as_slice())?;
        }
        if let Some(int) = &self.indirect_reference {
            write_header(
                target, Tag::INTEGER, false, int.as_slice().len()
            )?;
            target.write_all(int.as_slice())?;
        }
        if let Some(descriptor) = &self.data_value_descriptor {
            descriptor.write_encoded(mode, target)?;
        }
        // The content is always explicitly tagged with the encoding as
        // the tag number.
        write_header(
            target, Tag::ctx(self.encoding.into()), true,
            self.content.encoded_len(mode)
        )?;
        self.content.write_encoded(mode, target)
    }

    /// Converts the nested values for `Value::to_dl` and `Value::to_der`.
    pub(crate) fn convert(&self, canonical: bool) -> Self {
        let convert = |value: &Value| {
            if canonical { value.to_der() } else { value.to_dl() }
        };
        External {
            direct_reference: self.direct_reference.clone(),
            indirect_reference: self.indirect_reference.clone(),
            data_value_descriptor: self.data_value_descriptor.as_ref().map(
                |descriptor| Box::new(convert(descriptor))
            ),
            encoding: self.encoding,
            content: Box::new(convert(&self.content)),
        }
    }

    /// Returns a stable hash of the value.
    pub(crate) fn stable_hash(&self) -> u64 {
        let mut res = 0;
        if let Some(oid) = &self.direct_reference {
            res = fnv(oid.as_slice());
        }
        if let Some(int) = &self.indirect_reference {
            res ^= fnv(int.as_slice());
        }
        if let Some(descriptor) = &self.data_value_descriptor {
            res ^= descriptor.stable_hash();
        }
        res ^= u64::from(self.encoding) << 32;
        seeded(8, res ^ self.content.stable_hash())
    }
}


//--- PartialEq and Eq

impl PartialEq for External {
    fn eq(&self, other: &Self) -> bool {
        self.direct_reference == other.direct_reference
            && self.indirect_reference == other.indirect_reference
            && self.data_value_descriptor == other.data_value_descriptor
            && self.encoding == other.encoding
            && self.content == other.content
    }
}

impl Eq for External { }


//--- Display

impl fmt::Display for External {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("EXTERNAL {")?;
        if let Some(oid) = &self.direct_reference {
            write!(f, "{oid}, ")?;
        }
        if let Some(int) = &self.indirect_reference {
            write!(f, "{int}, ")?;
        }
        if let Some(descriptor) = &self.data_value_descriptor {
            write!(f, "{descriptor}, ")?;
        }
        write!(f, "[{}]{}}}", self.encoding, self.content)
    }
}


//============ Helper Functions ==============================================

/// Returns the encoded length of a field with the given content length.
fn field_len(tag: Tag, content_len: usize) -> usize {
    tag.encoded_len()
        + Length::Definite(content_len).encoded_len()
        + content_len
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use crate::tag::Class;
    use crate::tagged::TaggedValue;
    use super::*;

    fn sample() -> External {
        External::new(
            Some(Oid::from_static(b"\x2a\x03").unwrap()),
            None,
            None,
            0,
            Value::Integer(7.into()),
        ).unwrap()
    }

    #[test]
    fn new_validates_encoding() {
        assert_eq!(
            External::new(
                None, None, None, 3, Value::Null
            ).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(External::new(None, None, None, 2, Value::Null).is_ok());
    }

    #[test]
    fn from_values() {
        let external = External::from_values(vec![
            Value::Oid(Oid::from_static(b"\x2a\x03").unwrap()),
            Value::Integer(9.into()),
            Value::String(crate::string::RestrictedString::utf8("desc")),
            Value::Tagged(
                TaggedValue::explicit(
                    Class::Context, 0, Value::Integer(7.into())
                ).unwrap()
            ),
        ]).unwrap();
        assert!(external.direct_reference().is_some());
        assert!(external.indirect_reference().is_some());
        assert!(external.data_value_descriptor().is_some());
        assert_eq!(external.encoding(), 0);
        assert_eq!(external.content(), &Value::Integer(7.into()));

        // The tagged value must come last.
        assert_eq!(
            External::from_values(vec![
                Value::Tagged(
                    TaggedValue::explicit(
                        Class::Context, 0, Value::Null
                    ).unwrap()
                ),
                Value::Null,
            ]).unwrap_err().kind(),
            ErrorKind::Structure
        );

        // A tagged value is required.
        assert_eq!(
            External::from_values(vec![Value::Null]).unwrap_err().kind(),
            ErrorKind::Structure
        );
        assert_eq!(
            External::from_values(Vec::new()).unwrap_err().kind(),
            ErrorKind::Structure
        );

        // Tag numbers above 2 are not legal encodings.
        assert_eq!(
            External::from_values(vec![
                Value::Tagged(
                    TaggedValue::explicit(
                        Class::Context, 3, Value::Null
                    ).unwrap()
                ),
            ]).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn encode() {
        let encoded = Value::External(
            Box::new(sample())
        ).to_vec(Mode::Der);
        assert_eq!(
            encoded,
            b"\x28\x09\
              \x06\x02\x2a\x03\
              \xa0\x03\x02\x01\x07"
        );
    }

    #[test]
    fn roundtrip() {
        let value = Value::External(Box::new(sample()));
        let encoded = value.to_vec(Mode::Der);
        let decoded = Value::decode(encoded.as_slice(), Mode::Der).unwrap();
        assert_eq!(decoded, value);
        match decoded {
            Value::External(external) => {
                assert!(external.indirect_reference().is_none());
                assert!(external.data_value_descriptor().is_none());
            }
            _ => panic!("expected EXTERNAL")
        }
    }

    #[test]
    fn octets_content() {
        // Encoding 1 marks OCTET STRING content.
        let external = External::new(
            None, None, None, 1,
            Value::octets(Bytes::from_static(b"\x01\x02")),
        ).unwrap();
        let value = Value::External(Box::new(external));
        let encoded = value.to_vec(Mode::Ber);
        assert_eq!(encoded, b"\x28\x06\xa1\x04\x04\x02\x01\x02");
        assert_eq!(
            Value::decode(encoded.as_slice(), Mode::Ber).unwrap(), value
        );
    }
}

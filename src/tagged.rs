//! Tagged values.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.
//!
//! A tagged value wraps another value under a tag of the application,
//! context-specific, or private class. ASN.1 knows two styles of tagging:
//! with _explicit_ tagging the content of the wrapper is the complete
//! encoding of the inner value, while with _implicit_ tagging the wrapper
//! replaces the inner value's identifier octets with its own.
//!
//! Which style was used cannot be determined from the bytes alone – an
//! implicitly tagged constructed value looks exactly like an explicitly
//! tagged one. Since this crate is schema-free, [`TaggedValue`] records
//! whether its style was declared by the caller or merely observed while
//! parsing, and parsed values preserve their wire shape when re-encoded.

use std::{fmt, io};
use bytes::Bytes;
use crate::decode::{ContentError, ErrorKind};
use crate::mode::Mode;
use crate::string::OctetString;
use crate::tag::{Class, Tag};
use crate::value::{fnv, Sequence, Set, Value};


//------------ Explicitness --------------------------------------------------

/// How the tagging style of a [`TaggedValue`] is known.
///
/// The `Declared` states are set by the constructors. The `Parsed` states
/// are produced by schema-free decoding, which can only observe the shape
/// of the bytes: a parsed value re-encodes in the shape it was parsed
/// from, whatever the schema's actual intent was.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Explicitness {
    /// The value was constructed as explicitly tagged.
    DeclaredExplicit,

    /// The value was constructed as implicitly tagged.
    DeclaredImplicit,

    /// The value was parsed and looks explicitly tagged.
    ParsedExplicit,

    /// The value was parsed and asserted to be implicitly tagged, but its
    /// content carries a complete nested encoding.
    ParsedImplicit,
}


//------------ TaggedValue ---------------------------------------------------

/// A value wrapped under a non-universal tag.
///
/// # Equality
///
/// Two tagged values are equal if their class and number match, their
/// content takes the same shape – a nested complete encoding versus the
/// rewritten-identifier form – and their inner values are equal. The shape
/// rather than the declared style is compared so that equality remains
/// exactly equality of DER encodings.
#[derive(Clone, Debug)]
pub struct TaggedValue {
    /// The class of the tag. Never `Class::Universal`.
    class: Class,

    /// The number of the tag.
    number: u32,

    /// How the tagging style is known.
    explicitness: Explicitness,

    /// Did the value use the indefinite length form?
    indefinite: bool,

    /// The wrapped value.
    inner: Box<Value>,
}

impl TaggedValue {
    /// Creates an explicitly tagged value.
    ///
    /// Returns an invalid-argument error for a universal tag class.
    pub fn explicit(
        class: Class, number: u32, inner: Value,
    ) -> Result<Self, ContentError> {
        Self::check_class(class)?;
        Ok(Self::parsed(
            class, number, Explicitness::DeclaredExplicit, false, inner
        ))
    }

    /// Creates an implicitly tagged value.
    ///
    /// Returns an invalid-argument error for a universal tag class. If the
    /// inner value has the choice capability, the created value is
    /// explicitly tagged instead: ASN.1 forbids implicit tagging of a
    /// CHOICE.
    pub fn implicit(
        class: Class, number: u32, inner: Value,
    ) -> Result<Self, ContentError> {
        Self::check_class(class)?;
        let explicitness = if inner.is_choice() {
            Explicitness::DeclaredExplicit
        }
        else {
            Explicitness::DeclaredImplicit
        };
        Ok(Self::parsed(class, number, explicitness, false, inner))
    }

    /// Creates a tagged value from its parts.
    pub(crate) fn parsed(
        class: Class, number: u32, explicitness: Explicitness,
        indefinite: bool, inner: Value,
    ) -> Self {
        TaggedValue {
            class, number, explicitness, indefinite,
            inner: Box::new(inner)
        }
    }

    /// Checks that a class is acceptable for a tagged value.
    fn check_class(class: Class) -> Result<(), ContentError> {
        if matches!(class, Class::Universal) {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument,
                "universal class on a tagged value"
            ))
        }
        Ok(())
    }

    /// Returns the class of the tag.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the number of the tag.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns the tag of the value.
    pub fn tag(&self) -> Tag {
        Tag::new(self.class, self.number)
    }

    /// Returns how the tagging style of the value is known.
    pub fn explicitness(&self) -> Explicitness {
        self.explicitness
    }

    /// Returns whether the value is explicitly tagged.
    ///
    /// For a value decoded schema-free this reflects the parsed shape: it
    /// can only be relied upon when it returns `false`.
    pub fn is_explicit(&self) -> bool {
        matches!(
            self.explicitness,
            Explicitness::DeclaredExplicit | Explicitness::ParsedExplicit
        )
    }

    /// Returns a reference to the wrapped value.
    pub fn inner(&self) -> &Value {
        &self.inner
    }

    /// Converts the value into the wrapped value.
    pub fn into_inner(self) -> Value {
        *self.inner
    }

    /// Returns whether the value uses the indefinite length form.
    pub(crate) fn is_indefinite(&self) -> bool {
        self.indefinite
    }

    /// Returns whether the content carries a complete nested encoding.
    fn nested(&self) -> bool {
        !matches!(self.explicitness, Explicitness::DeclaredImplicit)
    }

    /// Returns whether the value's encoding has the constructed bit set.
    pub(crate) fn is_constructed_encoding(&self, mode: Mode) -> bool {
        self.nested() || self.inner.is_constructed(mode)
    }

    /// Returns the length of the encoded content in the given mode.
    pub(crate) fn content_len(&self, mode: Mode) -> usize {
        if self.nested() {
            self.inner.encoded_len(mode)
        }
        else {
            self.inner.content_len(mode)
        }
    }

    /// Writes the encoded content to a target in the given mode.
    pub(crate) fn write_content<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        if self.nested() {
            self.inner.write_encoded(mode, target)
        }
        else {
            self.inner.write_content(mode, target)
        }
    }

    /// Converts the inner value for `Value::to_dl` and `Value::to_der`.
    pub(crate) fn convert(&self, canonical: bool) -> Self {
        TaggedValue {
            class: self.class,
            number: self.number,
            explicitness: self.explicitness,
            indefinite: false,
            inner: Box::new(
                if canonical { self.inner.to_der() }
                else { self.inner.to_dl() }
            ),
        }
    }

    /// Returns a stable hash of the value.
    pub(crate) fn stable_hash(&self) -> u64 {
        u64::from(self.class.into_u8()).wrapping_mul(7919)
            ^ u64::from(self.number)
            ^ if self.nested() { 0x0F } else { 0xF0 }
            ^ self.inner.stable_hash()
    }
}

/// # Schema-free reinterpretation
///
/// A value decoded without schema knowledge records only the shape of its
/// bytes. A caller that knows the schema can reinterpret it with these
/// methods, mirroring the operations offered on a
/// [sub-parser][crate::decode::Constructed].
impl TaggedValue {
    /// Returns the inner value asserting explicit tagging.
    ///
    /// Fails with a structure error if the wrapper does not carry a
    /// complete nested encoding, which for explicit tagging it must
    /// (X.690 8.14.2 requires the constructed bit).
    pub fn load_explicit(&self) -> Result<&Value, ContentError> {
        if self.nested() {
            Ok(&self.inner)
        }
        else {
            Err(ContentError::new(
                ErrorKind::Structure,
                "explicitly tagged value must be constructed"
            ))
        }
    }

    /// Reinterprets the value asserting implicit tagging of `base`.
    ///
    /// The caller states whether the wrapper uses constructed encoding;
    /// a mismatch with the actual shape is a structure error, except that
    /// asserting primitive encoding against an indefinite length wrapper
    /// is a malformed-length error since the indefinite form requires
    /// constructed encoding.
    ///
    /// A constructed wrapper can be reinterpreted as SEQUENCE, SET, or
    /// OCTET STRING; for any other base tag, content consisting of exactly
    /// one value whose tag matches `base` is accepted as the parsed form.
    /// Everything else fails as unimplemented.
    pub fn load_implicit(
        &self, base: Tag, constructed: bool,
    ) -> Result<TaggedValue, ContentError> {
        let actual = self.is_constructed_encoding(Mode::Ber);
        if !constructed && self.indefinite {
            return Err(ContentError::new(
                ErrorKind::MalformedLength,
                "indefinite length on primitive encoding"
            ))
        }
        if constructed != actual {
            return Err(ContentError::new(
                ErrorKind::Structure,
                "constructed bit does not match asserted form"
            ))
        }

        if !constructed {
            // The wrapper holds raw content octets. Reinterpret them as
            // the content of the base type.
            let mut content = Vec::new();
            self.inner.write_content(Mode::Ber, &mut content).expect(
                "writing to a vec failed"
            );
            let inner = Value::from_primitive_content(
                base, content.into(), Mode::Ber
            )?;
            return Ok(Self::parsed(
                self.class, self.number, Explicitness::DeclaredImplicit,
                false, inner
            ))
        }

        let values = match self.content_values() {
            Some(values) => values,
            None => {
                return Err(ContentError::new(
                    ErrorKind::Unimplemented,
                    "cannot reinterpret wrapper content"
                ))
            }
        };
        match base {
            Tag::SEQUENCE => {
                Ok(Self::parsed(
                    self.class, self.number,
                    Explicitness::DeclaredImplicit, self.indefinite,
                    Value::Sequence(
                        Sequence::with_form(values, self.indefinite)
                    )
                ))
            }
            Tag::SET => {
                Ok(Self::parsed(
                    self.class, self.number,
                    Explicitness::DeclaredImplicit, self.indefinite,
                    Value::Set(Set::with_form(values, self.indefinite))
                ))
            }
            Tag::OCTET_STRING => {
                let mut segments = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Value::OctetString(segment) => {
                            segments.push(segment)
                        }
                        _ => {
                            return Err(ContentError::new(
                                ErrorKind::Structure,
                                "expected OCTET STRING segment"
                            ))
                        }
                    }
                }
                Ok(Self::parsed(
                    self.class, self.number,
                    Explicitness::DeclaredImplicit, self.indefinite,
                    Value::OctetString(OctetString::from_segments(
                        segments, self.indefinite
                    ))
                ))
            }
            base => {
                let mut values = values;
                if values.len() == 1
                    && values[0].tag() == base
                {
                    // A primitive base under a constructed wrapper: the
                    // single nested value is the base value and the
                    // wrapper keeps its parsed shape.
                    Ok(Self::parsed(
                        self.class, self.number,
                        Explicitness::ParsedImplicit, self.indefinite,
                        values.pop().expect("checked length")
                    ))
                }
                else {
                    Err(ContentError::new(
                        ErrorKind::Unimplemented,
                        "implicit reinterpretation not supported for \
                         this base tag"
                    ))
                }
            }
        }
    }

    /// Returns the values making up the wrapper's content if possible.
    fn content_values(&self) -> Option<Vec<Value>> {
        if self.nested() {
            return Some(vec![(*self.inner).clone()])
        }
        match &*self.inner {
            Value::Sequence(seq) => Some(seq.items().to_vec()),
            Value::Set(set) => Some(set.items().to_vec()),
            _ => None,
        }
    }
}


//--- PartialEq and Eq

impl PartialEq for TaggedValue {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.number == other.number
            && self.nested() == other.nested()
            && self.inner == other.inner
    }
}

impl Eq for TaggedValue { }


//--- Display

impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.class {
            Class::Application => write!(f, "[APPLICATION {}]", self.number)?,
            Class::Context => write!(f, "[CONTEXT {}]", self.number)?,
            Class::Private => write!(f, "[PRIVATE {}]", self.number)?,
            Class::Universal => write!(f, "[{}]", self.number)?,
        }
        self.inner.fmt(f)
    }
}


//------------ ApplicationSpecific -------------------------------------------

/// An application-class value kept as a raw octet container.
///
/// Schema-free decoding routes every application-class value here, keeping
/// its content octets as they arrived so the value round-trips exactly.
/// For a constructed value the content is the concatenation of the
/// encodings of the nested values.
#[derive(Clone, Debug)]
pub struct ApplicationSpecific {
    /// The tag number.
    number: u32,

    /// Does the value use constructed encoding?
    constructed: bool,

    /// The raw content octets.
    content: Bytes,

    /// Did the value use the indefinite length form?
    indefinite: bool,
}

impl ApplicationSpecific {
    /// Creates a primitive application-class value.
    pub fn primitive(number: u32, content: impl Into<Bytes>) -> Self {
        ApplicationSpecific {
            number,
            constructed: false,
            content: content.into(),
            indefinite: false,
        }
    }

    /// Creates a constructed application-class value from nested values.
    pub fn constructed(number: u32, values: &[Value]) -> Self {
        let mut content = Vec::new();
        for value in values {
            value.write_encoded(Mode::Dl, &mut content).expect(
                "writing to a vec failed"
            );
        }
        ApplicationSpecific {
            number,
            constructed: true,
            content: content.into(),
            indefinite: false,
        }
    }

    /// Creates a value from decoded parts.
    pub(crate) fn new_parsed(
        number: u32, constructed: bool, content: Bytes, indefinite: bool,
    ) -> Self {
        ApplicationSpecific { number, constructed, content, indefinite }
    }

    /// Returns the tag number of the value.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns whether the value uses constructed encoding.
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Returns the raw content octets.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Returns whether the value uses the indefinite length form.
    pub(crate) fn is_indefinite(&self) -> bool {
        self.indefinite
    }

    /// Returns the value with the definite length form.
    pub(crate) fn to_definite(&self) -> Self {
        ApplicationSpecific {
            number: self.number,
            constructed: self.constructed,
            content: self.content.clone(),
            indefinite: false,
        }
    }

    /// Returns a stable hash of the value.
    pub(crate) fn stable_hash(&self) -> u64 {
        u64::from(self.number).wrapping_mul(7919)
            ^ if self.constructed { 0x0F } else { 0xF0 }
            ^ fnv(self.content.as_ref())
    }
}


//--- PartialEq and Eq

impl PartialEq for ApplicationSpecific {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.constructed == other.constructed
            && self.content == other.content
    }
}

impl Eq for ApplicationSpecific { }


//--- Display

impl fmt::Display for ApplicationSpecific {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[APPLICATION {}]#", self.number)?;
        for octet in self.content.iter() {
            write!(f, "{octet:02x}")?;
        }
        Ok(())
    }
}


//============ Factory Functions =============================================

/// Creates a value for a constructed tagged encoding from its children.
///
/// A single child may be an explicitly tagged value, so it is kept as the
/// inner value with the parsed-explicit shape. Several children can only
/// occur with implicit tagging and are wrapped into a SEQUENCE. The
/// application class always routes to the raw container.
pub(crate) fn create_constructed(
    class: Class, number: u32, indefinite: bool, mut children: Vec<Value>,
) -> Value {
    if matches!(class, Class::Application) {
        let mode = if indefinite { Mode::Ber } else { Mode::Dl };
        let mut content = Vec::new();
        for child in &children {
            child.write_encoded(mode, &mut content).expect(
                "writing to a vec failed"
            );
        }
        return Value::Application(ApplicationSpecific::new_parsed(
            number, true, content.into(), indefinite
        ))
    }
    if children.len() == 1 {
        Value::Tagged(TaggedValue::parsed(
            class, number, Explicitness::ParsedExplicit, indefinite,
            children.pop().expect("checked length")
        ))
    }
    else {
        Value::Tagged(TaggedValue::parsed(
            class, number, Explicitness::DeclaredImplicit, indefinite,
            Value::Sequence(Sequence::with_form(children, indefinite))
        ))
    }
}

/// Creates a value for a primitive tagged encoding from its content.
///
/// A primitive encoding is necessarily implicit. The content is kept as an
/// OCTET STRING, or raw in the application-class container.
pub(crate) fn create_primitive(
    class: Class, number: u32, content: Bytes,
) -> Value {
    if matches!(class, Class::Application) {
        Value::Application(ApplicationSpecific::primitive(number, content))
    }
    else {
        Value::Tagged(TaggedValue::parsed(
            class, number, Explicitness::DeclaredImplicit, false,
            Value::OctetString(OctetString::new(content))
        ))
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn int(val: i64) -> Value {
        Value::Integer(val.into())
    }

    #[test]
    fn universal_class_rejected() {
        assert_eq!(
            TaggedValue::explicit(Class::Universal, 0, int(1))
                .unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            TaggedValue::implicit(Class::Universal, 0, int(1))
                .unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn explicit_encoding() {
        // The content octets of an explicit wrapper are the complete
        // encoding of the inner value.
        let tagged = TaggedValue::explicit(Class::Context, 3, int(5))
            .unwrap();
        assert_eq!(
            Value::Tagged(tagged).to_vec(Mode::Der), b"\xa3\x03\x02\x01\x05"
        );
    }

    #[test]
    fn implicit_encoding() {
        // The implicit wrapper replaces the identifier of the inner value.
        let tagged = TaggedValue::implicit(Class::Context, 3, int(5))
            .unwrap();
        assert_eq!(
            Value::Tagged(tagged).to_vec(Mode::Der), b"\x83\x01\x05"
        );

        // An implicitly tagged SEQUENCE stays constructed.
        let tagged = TaggedValue::implicit(
            Class::Private, 0, Value::sequence(vec![int(5)])
        ).unwrap();
        assert_eq!(
            Value::Tagged(tagged).to_vec(Mode::Der),
            b"\xe0\x03\x02\x01\x05"
        );
    }

    #[test]
    fn choice_forces_explicit() {
        let tagged = TaggedValue::implicit(
            Class::Context, 1, Value::Choice(Box::new(int(5)))
        ).unwrap();
        assert!(tagged.is_explicit());
        assert_eq!(
            tagged.explicitness(), Explicitness::DeclaredExplicit
        );
        assert_eq!(
            Value::Tagged(tagged).to_vec(Mode::Der),
            b"\xa1\x03\x02\x01\x05"
        );
    }

    #[test]
    fn load_explicit() {
        let tagged = TaggedValue::explicit(Class::Context, 3, int(5))
            .unwrap();
        assert_eq!(tagged.load_explicit().unwrap(), &int(5));

        let tagged = TaggedValue::implicit(Class::Context, 3, int(5))
            .unwrap();
        assert_eq!(
            tagged.load_explicit().unwrap_err().kind(),
            ErrorKind::Structure
        );
    }

    #[test]
    fn load_implicit_primitive() {
        // A primitive wrapper holds raw content that can be
        // reinterpreted as any primitive base type.
        let tagged = match create_primitive(
            Class::Context, 3, Bytes::from_static(b"\x05")
        ) {
            Value::Tagged(tagged) => tagged,
            _ => unreachable!()
        };
        let reread = tagged.load_implicit(Tag::INTEGER, false).unwrap();
        assert!(!reread.is_explicit());
        assert_eq!(reread.inner(), &int(5));
        assert_eq!(
            Value::Tagged(reread).to_vec(Mode::Ber), b"\x83\x01\x05"
        );

        // Asserting constructed against a primitive wrapper fails.
        assert_eq!(
            tagged.load_implicit(Tag::INTEGER, true).unwrap_err().kind(),
            ErrorKind::Structure
        );
    }

    #[test]
    fn load_implicit_constructed() {
        // [CONTEXT 0] wrapping two integers, asserted to be an implicit
        // SEQUENCE.
        let tagged = match create_constructed(
            Class::Context, 0, false, vec![int(1), int(2)]
        ) {
            Value::Tagged(tagged) => tagged,
            _ => unreachable!()
        };
        let reread = tagged.load_implicit(Tag::SEQUENCE, true).unwrap();
        assert_eq!(
            reread.inner(),
            &Value::sequence(vec![int(1), int(2)])
        );

        // Unsupported base tags are unimplemented.
        assert_eq!(
            tagged.load_implicit(Tag::OID, true).unwrap_err().kind(),
            ErrorKind::Unimplemented
        );
    }

    #[test]
    fn factories() {
        // One child: maybe explicit.
        let value = create_constructed(
            Class::Context, 3, false, vec![int(5)]
        );
        match &value {
            Value::Tagged(tagged) => {
                assert_eq!(
                    tagged.explicitness(), Explicitness::ParsedExplicit
                );
                assert!(tagged.is_explicit());
            }
            _ => panic!("expected tagged value")
        }
        assert_eq!(value.to_vec(Mode::Ber), b"\xa3\x03\x02\x01\x05");

        // Several children: implicit SEQUENCE.
        let value = create_constructed(
            Class::Context, 1, false, vec![int(1), int(2)]
        );
        assert_eq!(
            value.to_vec(Mode::Ber), b"\xa1\x06\x02\x01\x01\x02\x01\x02"
        );

        // Application class: raw container.
        let value = create_constructed(
            Class::Application, 2, false, vec![int(5)]
        );
        match &value {
            Value::Application(app) => {
                assert!(app.is_constructed());
                assert_eq!(app.content().as_ref(), b"\x02\x01\x05");
            }
            _ => panic!("expected application-specific value")
        }
        assert_eq!(value.to_vec(Mode::Ber), b"\x62\x03\x02\x01\x05");

        let value = create_primitive(
            Class::Application, 2, Bytes::from_static(b"\x99")
        );
        assert_eq!(value.to_vec(Mode::Ber), b"\x42\x01\x99");
    }

    #[test]
    fn parsed_shape_is_preserved() {
        // A parsed wrapper asserted implicit for a primitive base keeps
        // its constructed wire shape.
        let tagged = match create_constructed(
            Class::Context, 3, false, vec![int(5)]
        ) {
            Value::Tagged(tagged) => tagged,
            _ => unreachable!()
        };
        let reread = tagged.load_implicit(Tag::INTEGER, true).unwrap();
        assert!(!reread.is_explicit());
        assert_eq!(reread.inner(), &int(5));
        assert_eq!(
            Value::Tagged(reread.clone()).to_vec(Mode::Ber),
            b"\xa3\x03\x02\x01\x05"
        );

        // The shape, not the declared style, decides equality: the
        // parsed-implicit value and an explicit one encode identically.
        let explicit = TaggedValue::explicit(Class::Context, 3, int(5))
            .unwrap();
        assert_eq!(reread, explicit);
        assert_eq!(reread.stable_hash(), explicit.stable_hash());
    }

    #[test]
    fn eq_and_hash() {
        let explicit = TaggedValue::explicit(Class::Context, 3, int(5))
            .unwrap();
        let implicit = TaggedValue::implicit(Class::Context, 3, int(5))
            .unwrap();
        assert_ne!(explicit, implicit);
        assert_ne!(
            explicit,
            TaggedValue::explicit(Class::Private, 3, int(5)).unwrap()
        );
        assert_ne!(
            explicit,
            TaggedValue::explicit(Class::Context, 4, int(5)).unwrap()
        );
        assert_ne!(
            explicit,
            TaggedValue::explicit(Class::Context, 3, int(6)).unwrap()
        );
        assert_eq!(
            explicit,
            TaggedValue::explicit(Class::Context, 3, int(5)).unwrap()
        );
    }

    #[test]
    fn display() {
        let tagged = TaggedValue::explicit(Class::Context, 3, int(5))
            .unwrap();
        assert_eq!(tagged.to_string(), "[CONTEXT 3]5");
        let tagged = TaggedValue::explicit(
            Class::Application, 1, Value::Boolean(true)
        ).unwrap();
        assert_eq!(tagged.to_string(), "[APPLICATION 1]TRUE");
    }
}

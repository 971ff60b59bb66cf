//! The tree of ASN.1 values.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.
//!
//! The central type of this crate is [`Value`], a tree of ASN.1 values of
//! the built-in types. A value can be decoded from any of the three
//! [modes][crate::Mode] and encoded into any of them; the mode is a
//! parameter of the serialisation pass rather than part of the tree.
//!
//! Two properties of the wire form are remembered so that data decoded
//! from BER re-encodes in BER the way it arrived: whether a constructed
//! value used the indefinite length form, and the segmentation of octet
//! strings. Both are invisible to comparison and hashing, which are
//! defined on the canonical DER form.

use std::{fmt, io};
use std::fmt::Display as _;
use bytes::Bytes;
use smallvec::SmallVec;
use crate::decode::{
    ContentError, DecodeError, ErrorKind, IntoSource, Source, StreamParser
};
use crate::external::External;
use crate::int::Integer;
use crate::length::Length;
use crate::mode::Mode;
use crate::oid::Oid;
use crate::string::{BitString, OctetString, RestrictedString, StringKind};
use crate::tag::Tag;
use crate::tagged::{ApplicationSpecific, TaggedValue};
use crate::time::{GeneralizedTime, UtcTime};


//------------ Value ---------------------------------------------------------

/// A single ASN.1 value of any of the built-in types.
///
/// Values are immutable once constructed. Since all octet payloads are
/// [`Bytes`], cloning is cheap.
///
/// # Equality and hashing
///
/// Two values are equal if and only if their DER encodings are equal.
/// Comparison short-circuits on the structure of the tree and only falls
/// back to encoding where the structure cannot decide, which happens for
/// SET values whose elements are ordered differently. Hashing is
/// consistent with this equality.
#[derive(Clone, Debug)]
pub enum Value {
    /// A BOOLEAN value.
    Boolean(bool),

    /// An INTEGER value.
    Integer(Integer),

    /// A BIT STRING value.
    BitString(BitString),

    /// An OCTET STRING value.
    OctetString(OctetString),

    /// A NULL value.
    Null,

    /// An OBJECT IDENTIFIER value.
    Oid(Oid),

    /// An ENUMERATED value.
    Enumerated(Integer),

    /// A character string value of one of the restricted kinds.
    String(RestrictedString),

    /// A UTCTime value.
    UtcTime(UtcTime),

    /// A GeneralizedTime value.
    GeneralizedTime(GeneralizedTime),

    /// A SEQUENCE value.
    Sequence(Sequence),

    /// A SET value.
    Set(Set),

    /// An explicitly or implicitly tagged value.
    Tagged(TaggedValue),

    /// An EXTERNAL value.
    External(Box<External>),

    /// An application-class value, kept as a raw container.
    Application(ApplicationSpecific),

    /// A value selected from a CHOICE at encode time.
    ///
    /// This variant carries no encoding of its own. It encodes exactly as
    /// its inner value and compares equal to it. Its single purpose is to
    /// mark the choice capability: ASN.1 forbids implicit tagging of a
    /// CHOICE, so wrapping a choice in a tag always tags explicitly.
    Choice(Box<Value>),

    /// A value of an unrecognised universal type, kept as raw content.
    Other(OtherValue),
}

/// # Convenience constructors
///
impl Value {
    /// Creates a SEQUENCE value from the given items.
    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Sequence(Sequence::new(items))
    }

    /// Creates a SET value from the given items.
    pub fn set(items: Vec<Value>) -> Self {
        Value::Set(Set::new(items))
    }

    /// Creates an OCTET STRING value from the given content.
    pub fn octets(content: impl Into<Bytes>) -> Self {
        Value::OctetString(OctetString::new(content))
    }
}

/// # Properties
///
impl Value {
    /// Returns the tag of the value's encoding.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Boolean(_) => Tag::BOOLEAN,
            Value::Integer(_) => Tag::INTEGER,
            Value::BitString(_) => Tag::BIT_STRING,
            Value::OctetString(_) => Tag::OCTET_STRING,
            Value::Null => Tag::NULL,
            Value::Oid(_) => Tag::OID,
            Value::Enumerated(_) => Tag::ENUMERATED,
            Value::String(inner) => inner.kind().tag(),
            Value::UtcTime(_) => Tag::UTC_TIME,
            Value::GeneralizedTime(_) => Tag::GENERALIZED_TIME,
            Value::Sequence(_) => Tag::SEQUENCE,
            Value::Set(_) => Tag::SET,
            Value::Tagged(inner) => inner.tag(),
            Value::External(_) => Tag::EXTERNAL,
            Value::Application(inner) => Tag::application(inner.number()),
            Value::Choice(inner) => inner.tag(),
            Value::Other(inner) => inner.tag(),
        }
    }

    /// Returns whether the value has the choice capability.
    ///
    /// Such a value may select one of several alternatives at encode time
    /// and therefore cannot be implicitly tagged.
    pub fn is_choice(&self) -> bool {
        matches!(self, Value::Choice(_))
    }

    /// Peels off any choice markers.
    pub(crate) fn unwrap_choice(&self) -> &Value {
        let mut res = self;
        while let Value::Choice(inner) = res {
            res = inner
        }
        res
    }

    /// Returns whether the value uses constructed encoding in `mode`.
    pub fn is_constructed(&self, mode: Mode) -> bool {
        match self {
            Value::Sequence(_) | Value::Set(_) | Value::External(_) => true,
            Value::OctetString(inner) => inner.is_constructed_form(mode),
            Value::Tagged(inner) => inner.is_constructed_encoding(mode),
            Value::Application(inner) => inner.is_constructed(),
            Value::Choice(inner) => inner.is_constructed(mode),
            _ => false,
        }
    }

    /// Returns whether the value encodes with indefinite length in `mode`.
    pub(crate) fn is_indefinite_form(&self, mode: Mode) -> bool {
        if mode != Mode::Ber {
            return false
        }
        match self {
            Value::OctetString(inner) => inner.is_indefinite_form(mode),
            Value::Sequence(inner) => inner.indefinite,
            Value::Set(inner) => inner.indefinite,
            Value::Tagged(inner) => inner.is_indefinite(),
            Value::Application(inner) => inner.is_indefinite(),
            Value::Choice(inner) => inner.is_indefinite_form(mode),
            _ => false,
        }
    }
}

/// # Encoding
///
impl Value {
    /// Returns the length of the content octets in the given mode.
    pub(crate) fn content_len(&self, mode: Mode) -> usize {
        match self {
            Value::Boolean(_) => 1,
            Value::Integer(inner) => inner.as_slice().len(),
            Value::BitString(inner) => inner.content_len(),
            Value::OctetString(inner) => inner.content_len(mode),
            Value::Null => 0,
            Value::Oid(inner) => inner.as_slice().len(),
            Value::Enumerated(inner) => inner.as_slice().len(),
            Value::String(inner) => inner.as_slice().len(),
            Value::UtcTime(inner) => inner.as_slice().len(),
            Value::GeneralizedTime(inner) => inner.as_slice().len(),
            Value::Sequence(inner) => {
                inner.items.iter().map(|item| item.encoded_len(mode)).sum()
            }
            Value::Set(inner) => {
                inner.items.iter().map(|item| item.encoded_len(mode)).sum()
            }
            Value::Tagged(inner) => inner.content_len(mode),
            Value::External(inner) => inner.content_len(mode),
            Value::Application(inner) => inner.content().len(),
            Value::Choice(inner) => inner.content_len(mode),
            Value::Other(inner) => inner.content().len(),
        }
    }

    /// Writes the content octets to a target in the given mode.
    pub(crate) fn write_content<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        match self {
            Value::Boolean(true) => target.write_all(&[0xFF]),
            Value::Boolean(false) => target.write_all(&[0x00]),
            Value::Integer(inner) => target.write_all(inner.as_slice()),
            Value::BitString(inner) => inner.write_content(mode, target),
            Value::OctetString(inner) => inner.write_content(mode, target),
            Value::Null => Ok(()),
            Value::Oid(inner) => target.write_all(inner.as_slice()),
            Value::Enumerated(inner) => target.write_all(inner.as_slice()),
            Value::String(inner) => target.write_all(inner.as_slice()),
            Value::UtcTime(inner) => target.write_all(inner.as_slice()),
            Value::GeneralizedTime(inner) => {
                target.write_all(inner.as_slice())
            }
            Value::Sequence(inner) => {
                for item in &inner.items {
                    item.write_encoded(mode, target)?;
                }
                Ok(())
            }
            Value::Set(inner) => inner.write_items(mode, target),
            Value::Tagged(inner) => inner.write_content(mode, target),
            Value::External(inner) => inner.write_content(mode, target),
            Value::Application(inner) => target.write_all(inner.content()),
            Value::Choice(inner) => inner.write_content(mode, target),
            Value::Other(inner) => target.write_all(inner.content()),
        }
    }

    /// Returns the length of the complete encoded value in the given mode.
    pub fn encoded_len(&self, mode: Mode) -> usize {
        let content = self.content_len(mode);
        if self.is_indefinite_form(mode) {
            self.tag().encoded_len() + 1 + content + 2
        }
        else {
            self.tag().encoded_len()
                + Length::Definite(content).encoded_len()
                + content
        }
    }

    /// Writes the complete encoded value to a target in the given mode.
    pub fn write_encoded<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        let constructed = self.is_constructed(mode);
        if self.is_indefinite_form(mode) {
            self.tag().write_encoded(constructed, target)?;
            Length::Indefinite.write_encoded(target)?;
            self.write_content(mode, target)?;
            target.write_all(&[0, 0])
        }
        else {
            write_header(
                target, self.tag(), constructed, self.content_len(mode)
            )?;
            self.write_content(mode, target)
        }
    }

    /// Encodes the value into a vec in the given mode.
    pub fn to_vec(&self, mode: Mode) -> Vec<u8> {
        let mut res = Vec::with_capacity(self.encoded_len(mode));
        self.write_encoded(mode, &mut res).expect(
            "writing to a vec failed"
        );
        res
    }
}

/// # Decoding
///
impl Value {
    /// Decodes a single value from the beginning of `source`.
    ///
    /// The source must not contain any further data after the value.
    pub fn decode<S: IntoSource>(
        source: S, mode: Mode,
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        let mut parser = StreamParser::new(source, mode);
        let res = parser.value()?;
        parser.exhausted()?;
        Ok(res)
    }

    /// Creates a universal value from the content octets of a primitive.
    ///
    /// The tag must be of the universal class. Tags of types that only
    /// exist in constructed encoding produce a malformed-header error;
    /// unrecognised universal tags produce a [`Value::Other`] keeping the
    /// raw content.
    pub fn from_primitive_content(
        tag: Tag, content: Bytes, mode: Mode,
    ) -> Result<Self, ContentError> {
        if !tag.is_universal() {
            return Err(ContentError::new(
                ErrorKind::InvalidArgument, "expected a universal tag"
            ))
        }
        match tag {
            Tag::BOOLEAN => {
                if content.len() != 1 {
                    return Err(ContentError::new(
                        ErrorKind::InvalidArgument, "invalid boolean"
                    ))
                }
                let octet = content[0];
                if mode.is_canonical() && octet != 0 && octet != 0xFF {
                    return Err(ContentError::new(
                        ErrorKind::InvalidArgument, "invalid DER boolean"
                    ))
                }
                Ok(Value::Boolean(octet != 0))
            }
            Tag::INTEGER => {
                Integer::from_content(content).map(Value::Integer)
            }
            Tag::BIT_STRING => {
                BitString::from_content(content, mode).map(Value::BitString)
            }
            Tag::OCTET_STRING => {
                Ok(Value::OctetString(OctetString::new(content)))
            }
            Tag::NULL => {
                if !content.is_empty() {
                    return Err(ContentError::new(
                        ErrorKind::InvalidArgument, "invalid NULL value"
                    ))
                }
                Ok(Value::Null)
            }
            Tag::OID => Oid::from_content(content).map(Value::Oid),
            Tag::ENUMERATED => {
                Integer::from_content(content).map(Value::Enumerated)
            }
            Tag::UTC_TIME => {
                UtcTime::from_content(content).map(Value::UtcTime)
            }
            Tag::GENERALIZED_TIME => {
                GeneralizedTime::from_content(content).map(
                    Value::GeneralizedTime
                )
            }
            Tag::SEQUENCE | Tag::SET | Tag::EXTERNAL => {
                Err(ContentError::new(
                    ErrorKind::MalformedHeader,
                    "primitive encoding of a constructed-only type"
                ))
            }
            Tag::END_OF_CONTENTS => {
                Err(ContentError::new(
                    ErrorKind::MalformedHeader, "unexpected end-of-contents"
                ))
            }
            tag => {
                match StringKind::from_tag(tag) {
                    Some(kind) => {
                        RestrictedString::new(kind, content).map(
                            Value::String
                        )
                    }
                    None => Ok(Value::Other(OtherValue::new(tag, content)))
                }
            }
        }
    }
}

/// # Conversion between the variants
///
impl Value {
    /// Converts the value into its definite-length form.
    ///
    /// The returned value re-encodes with definite lengths everywhere and
    /// with string segments collapsed. If the value already is in this
    /// form, an unchanged copy is returned.
    pub fn to_dl(&self) -> Value {
        self.convert(false)
    }

    /// Converts the value into its canonical form.
    ///
    /// On top of what [`to_dl`][Self::to_dl] does, the returned value has
    /// SET elements sorted into the order of their encodings and the
    /// unused bits of BIT STRING values zeroed. Converting the result
    /// again returns an identical value.
    pub fn to_der(&self) -> Value {
        self.convert(true)
    }

    /// Performs the actual conversion for `to_dl` and `to_der`.
    fn convert(&self, canonical: bool) -> Value {
        match self {
            Value::BitString(inner) if canonical => {
                Value::BitString(inner.to_canonical())
            }
            Value::OctetString(inner) => {
                Value::OctetString(inner.collapse())
            }
            Value::Sequence(inner) => {
                Value::Sequence(Sequence {
                    items: inner.items.iter().map(|item| {
                        item.convert(canonical)
                    }).collect(),
                    indefinite: false,
                })
            }
            Value::Set(inner) => {
                let mut items: Vec<_> = inner.items.iter().map(|item| {
                    item.convert(canonical)
                }).collect();
                if canonical {
                    items.sort_by_cached_key(|item| item.to_vec(Mode::Der));
                }
                Value::Set(Set { items, indefinite: false })
            }
            Value::Tagged(inner) => Value::Tagged(inner.convert(canonical)),
            Value::External(inner) => {
                Value::External(Box::new(inner.convert(canonical)))
            }
            Value::Application(inner) => {
                Value::Application(inner.to_definite())
            }
            Value::Choice(inner) => {
                Value::Choice(Box::new(inner.convert(canonical)))
            }
            _ => self.clone()
        }
    }
}

/// # Hashing
///
impl Value {
    /// Returns a stable hash of the value.
    ///
    /// The hash is computed over the canonical form, so equal values hash
    /// equally regardless of the wire form they were decoded from. It is
    /// stable across processes and versions of the standard library; it
    /// is not a cryptographic digest.
    pub fn stable_hash(&self) -> u64 {
        match self.unwrap_choice() {
            Value::Boolean(true) => !0,
            Value::Boolean(false) => 0,
            Value::Integer(inner) => seeded(2, fnv(inner.as_slice())),
            Value::BitString(inner) => seeded(3, inner.stable_hash()),
            Value::OctetString(inner) => seeded(4, inner.stable_hash()),
            Value::Null => seeded(5, 0),
            Value::Oid(inner) => seeded(6, fnv(inner.as_slice())),
            Value::Enumerated(inner) => seeded(10, fnv(inner.as_slice())),
            Value::String(inner) => {
                seeded(
                    inner.kind().tag().number(), fnv(inner.as_slice())
                )
            }
            Value::UtcTime(inner) => seeded(23, fnv(inner.as_slice())),
            Value::GeneralizedTime(inner) => {
                seeded(24, fnv(inner.as_slice()))
            }
            Value::Sequence(inner) => {
                seeded(
                    16,
                    inner.items.iter().fold(0u64, |hash, item| {
                        hash.wrapping_mul(257) ^ item.stable_hash()
                    })
                )
            }
            Value::Set(inner) => {
                // XOR keeps the hash independent of element order, which
                // equality ignores as well.
                seeded(
                    17,
                    inner.items.iter().fold(0u64, |hash, item| {
                        hash ^ item.stable_hash()
                    })
                )
            }
            Value::Tagged(inner) => inner.stable_hash(),
            Value::External(inner) => inner.stable_hash(),
            Value::Application(inner) => inner.stable_hash(),
            Value::Other(inner) => {
                seeded(inner.tag().number(), fnv(inner.content()))
            }
            Value::Choice(_) => unreachable!(),
        }
    }
}


//--- From

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Boolean(val)
    }
}

impl From<Integer> for Value {
    fn from(val: Integer) -> Self {
        Value::Integer(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::Integer(val.into())
    }
}

impl From<Oid> for Value {
    fn from(val: Oid) -> Self {
        Value::Oid(val)
    }
}

impl From<BitString> for Value {
    fn from(val: BitString) -> Self {
        Value::BitString(val)
    }
}

impl From<OctetString> for Value {
    fn from(val: OctetString) -> Self {
        Value::OctetString(val)
    }
}

impl From<RestrictedString> for Value {
    fn from(val: RestrictedString) -> Self {
        Value::String(val)
    }
}

impl From<TaggedValue> for Value {
    fn from(val: TaggedValue) -> Self {
        Value::Tagged(val)
    }
}

impl From<External> for Value {
    fn from(val: External) -> Self {
        Value::External(Box::new(val))
    }
}


//--- PartialEq, Eq, and Hash

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.unwrap_choice(), other.unwrap_choice()) {
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::Integer(left), Value::Integer(right)) => left == right,
            (Value::BitString(left), Value::BitString(right)) => {
                left == right
            }
            (Value::OctetString(left), Value::OctetString(right)) => {
                left == right
            }
            (Value::Null, Value::Null) => true,
            (Value::Oid(left), Value::Oid(right)) => left == right,
            (Value::Enumerated(left), Value::Enumerated(right)) => {
                left == right
            }
            (Value::String(left), Value::String(right)) => left == right,
            (Value::UtcTime(left), Value::UtcTime(right)) => left == right,
            (Value::GeneralizedTime(left), Value::GeneralizedTime(right)) => {
                left == right
            }
            (Value::Sequence(left), Value::Sequence(right)) => {
                left.items == right.items
            }
            (Value::Set(left), Value::Set(right)) => left.item_eq(right),
            (Value::Tagged(left), Value::Tagged(right)) => left == right,
            (Value::External(left), Value::External(right)) => left == right,
            (Value::Application(left), Value::Application(right)) => {
                left == right
            }
            (Value::Other(left), Value::Other(right)) => left == right,
            _ => false,
        }
    }
}

impl Eq for Value { }

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.stable_hash())
    }
}


//--- Display

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Integer(inner) => inner.fmt(f),
            Value::BitString(inner) => inner.fmt(f),
            Value::OctetString(inner) => inner.fmt(f),
            Value::Null => f.write_str("NULL"),
            Value::Oid(inner) => inner.fmt(f),
            Value::Enumerated(inner) => inner.fmt(f),
            Value::String(inner) => inner.fmt(f),
            Value::UtcTime(inner) => inner.fmt(f),
            Value::GeneralizedTime(inner) => inner.fmt(f),
            Value::Sequence(inner) => fmt_items(&inner.items, f),
            Value::Set(inner) => fmt_items(&inner.items, f),
            Value::Tagged(inner) => inner.fmt(f),
            Value::External(inner) => inner.fmt(f),
            Value::Application(inner) => inner.fmt(f),
            Value::Choice(inner) => inner.fmt(f),
            Value::Other(inner) => {
                write!(f, "{} ", inner.tag())?;
                for octet in inner.content().iter() {
                    write!(f, "{octet:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Formats the items of a container value.
fn fmt_items(items: &[Value], f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("[")?;
    let mut first = true;
    for item in items {
        if first {
            first = false;
        }
        else {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    f.write_str("]")
}


//------------ Sequence ------------------------------------------------------

/// An ordered sequence of values.
#[derive(Clone, Debug)]
pub struct Sequence {
    /// The items of the sequence.
    items: Vec<Value>,

    /// Did the value use the indefinite length form?
    indefinite: bool,
}

impl Sequence {
    /// Creates a sequence from the given items.
    pub fn new(items: Vec<Value>) -> Self {
        Sequence { items, indefinite: false }
    }

    /// Creates a sequence that re-encodes with indefinite length in BER.
    pub(crate) fn with_form(items: Vec<Value>, indefinite: bool) -> Self {
        Sequence { items, indefinite }
    }

    /// Returns the items of the sequence.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts the sequence into its items.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for Sequence { }


//------------ Set -----------------------------------------------------------

/// An unordered collection of values.
///
/// The items are kept in the order they were provided or decoded in. BER
/// and DL encoding preserve that order; DER encoding sorts the items by
/// their encodings as canonicality requires. Consequently, two sets with
/// the same items in different orders are equal.
#[derive(Clone, Debug)]
pub struct Set {
    /// The items of the set.
    items: Vec<Value>,

    /// Did the value use the indefinite length form?
    indefinite: bool,
}

impl Set {
    /// Creates a set from the given items.
    pub fn new(items: Vec<Value>) -> Self {
        Set { items, indefinite: false }
    }

    /// Creates a set that re-encodes with indefinite length in BER.
    pub(crate) fn with_form(items: Vec<Value>, indefinite: bool) -> Self {
        Set { items, indefinite }
    }

    /// Returns the items of the set in their stored order.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts the set into its items.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// Writes the encoded items, sorted if the mode demands it.
    fn write_items<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        if !mode.is_canonical() {
            for item in &self.items {
                item.write_encoded(mode, target)?;
            }
            return Ok(())
        }
        let mut encoded: SmallVec<[Vec<u8>; 8]> = self.items.iter().map(
            |item| item.to_vec(Mode::Der)
        ).collect();
        encoded.sort();
        for item in encoded {
            target.write_all(&item)?;
        }
        Ok(())
    }

    /// Compares the items of two sets disregarding their order.
    fn item_eq(&self, other: &Self) -> bool {
        if self.items == other.items {
            return true
        }
        if self.items.len() != other.items.len() {
            return false
        }
        // Same length, different order: compare the sorted encodings.
        let mut left: Vec<_> = self.items.iter().map(|item| {
            item.to_vec(Mode::Der)
        }).collect();
        let mut right: Vec<_> = other.items.iter().map(|item| {
            item.to_vec(Mode::Der)
        }).collect();
        left.sort();
        right.sort();
        left == right
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.item_eq(other)
    }
}

impl Eq for Set { }


//------------ OtherValue ----------------------------------------------------

/// A primitive value of an unrecognised universal type.
///
/// Keeping the raw content around makes such values round-trip safely
/// even though this crate cannot interpret them.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OtherValue {
    /// The tag of the value.
    tag: Tag,

    /// The raw content octets.
    content: Bytes,
}

impl OtherValue {
    /// Creates a value from a tag and the raw content octets.
    pub(crate) fn new(tag: Tag, content: Bytes) -> Self {
        OtherValue { tag, content }
    }

    /// Returns the tag of the value.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the raw content octets.
    pub fn content(&self) -> &Bytes {
        &self.content
    }
}


//============ Helper Functions ==============================================

/// Writes the identifier and length octets for a definite length value.
pub(crate) fn write_header<W: io::Write>(
    target: &mut W, tag: Tag, constructed: bool, content_len: usize,
) -> Result<(), io::Error> {
    tag.write_encoded(constructed, target)?;
    Length::Definite(content_len).write_encoded(target)
}

/// Returns the FNV-1a hash of the given octets.
pub(crate) fn fnv(octets: &[u8]) -> u64 {
    let mut res = 0xcbf2_9ce4_8422_2325;
    for &octet in octets {
        res = (res ^ u64::from(octet)).wrapping_mul(0x0000_0100_0000_01B3);
    }
    res
}

/// Folds a type discriminator into a content hash.
pub(crate) fn seeded(tag_number: u32, hash: u64) -> u64 {
    hash ^ u64::from(tag_number).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn int(val: i64) -> Value {
        Value::Integer(val.into())
    }

    #[test]
    fn encode_primitives() {
        assert_eq!(Value::Boolean(true).to_vec(Mode::Der), b"\x01\x01\xff");
        assert_eq!(Value::Boolean(false).to_vec(Mode::Ber), b"\x01\x01\x00");
        assert_eq!(int(5).to_vec(Mode::Der), b"\x02\x01\x05");
        assert_eq!(Value::Null.to_vec(Mode::Der), b"\x05\x00");
        assert_eq!(
            Value::octets(Bytes::from_static(b"\x01\x02"))
                .to_vec(Mode::Der),
            b"\x04\x02\x01\x02"
        );
    }

    #[test]
    fn boolean_roundtrip() {
        // 01 01 FF is TRUE and re-encodes identically.
        let value = Value::decode(b"\x01\x01\xff", Mode::Der).unwrap();
        assert_eq!(value, Value::Boolean(true));
        assert_eq!(value.to_vec(Mode::Der), b"\x01\x01\xff");

        // BER accepts any non-zero octet as TRUE, DER re-encodes as FF.
        let value = Value::decode(b"\x01\x01\x01", Mode::Ber).unwrap();
        assert_eq!(value, Value::Boolean(true));
        assert_eq!(value.to_vec(Mode::Der), b"\x01\x01\xff");

        // DER does not accept the sloppy form.
        assert!(Value::decode(b"\x01\x01\x01", Mode::Der).is_err());
    }

    #[test]
    fn indefinite_sequence() {
        // An indefinite SEQUENCE of the INTEGERs 1 and 2.
        let data = b"\x30\x80\x02\x01\x01\x02\x01\x02\x00\x00";
        let value = Value::decode(data, Mode::Ber).unwrap();
        assert_eq!(value, Value::sequence(vec![int(1), int(2)]));

        // It remembers its wire form in BER ...
        assert_eq!(value.to_vec(Mode::Ber), data);

        // ... and converts to the definite forms.
        assert_eq!(
            value.to_der().to_vec(Mode::Ber),
            b"\x30\x06\x02\x01\x01\x02\x01\x02"
        );
        assert_eq!(
            value.to_vec(Mode::Der), b"\x30\x06\x02\x01\x01\x02\x01\x02"
        );
        assert_eq!(
            value.to_vec(Mode::Dl), b"\x30\x06\x02\x01\x01\x02\x01\x02"
        );
    }

    #[test]
    fn set_ordering() {
        // DER sorts SET elements by their encoding; BER and DL keep the
        // order of the items.
        let set = Value::set(vec![
            Value::octets(Bytes::from_static(b"\x02")),
            Value::octets(Bytes::from_static(b"\x01")),
        ]);
        assert_eq!(
            set.to_vec(Mode::Der), b"\x31\x06\x04\x01\x01\x04\x01\x02"
        );
        assert_eq!(
            set.to_vec(Mode::Ber), b"\x31\x06\x04\x01\x02\x04\x01\x01"
        );
        assert_eq!(
            set.to_vec(Mode::Dl), b"\x31\x06\x04\x01\x02\x04\x01\x01"
        );

        // Reordering the items changes neither the DER encoding nor
        // equality or hash.
        let other = Value::set(vec![
            Value::octets(Bytes::from_static(b"\x01")),
            Value::octets(Bytes::from_static(b"\x02")),
        ]);
        assert_eq!(set.to_vec(Mode::Der), other.to_vec(Mode::Der));
        assert_eq!(set, other);
        assert_eq!(set.stable_hash(), other.stable_hash());

        let third = Value::set(vec![
            Value::octets(Bytes::from_static(b"\x01")),
            Value::octets(Bytes::from_static(b"\x03")),
        ]);
        assert_ne!(set, third);
    }

    #[test]
    fn der_idempotent() {
        let value = Value::decode(
            b"\x30\x80\x31\x80\x02\x01\x02\x02\x01\x01\x00\x00\x04\x01\xaa\
              \x00\x00".as_slice(),
            Mode::Ber
        ).unwrap();
        let once = value.to_der();
        let twice = once.to_der();
        assert_eq!(once.to_vec(Mode::Ber), twice.to_vec(Mode::Ber));
        assert_eq!(once.to_vec(Mode::Ber), value.to_vec(Mode::Der));
    }

    #[test]
    fn equality_is_der_equality() {
        let values = [
            Value::Boolean(true),
            int(1),
            int(2),
            Value::Null,
            Value::octets(Bytes::from_static(b"\x01")),
            Value::sequence(vec![int(1), int(2)]),
            Value::set(vec![int(1), int(2)]),
        ];
        for left in &values {
            for right in &values {
                assert_eq!(
                    left == right,
                    left.to_vec(Mode::Der) == right.to_vec(Mode::Der),
                    "equality mismatch for {left} and {right}"
                );
                if left == right {
                    assert_eq!(left.stable_hash(), right.stable_hash());
                }
            }
        }
    }

    #[test]
    fn roundtrip_all_modes() {
        let value = Value::sequence(vec![
            Value::Boolean(false),
            int(-129),
            Value::set(vec![int(3), int(1)]),
            Value::octets(Bytes::from_static(b"ab")),
            Value::Null,
        ]);
        for mode in [Mode::Ber, Mode::Dl, Mode::Der] {
            let encoded = value.to_vec(mode);
            let decoded = Value::decode(encoded.as_slice(), mode).unwrap();
            assert_eq!(decoded, value, "round-trip failed in {mode:?}");
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            Value::sequence(
                vec![Value::Boolean(true), int(5)]
            ).to_string(),
            "[TRUE, 5]"
        );
    }
}

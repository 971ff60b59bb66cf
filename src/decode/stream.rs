//! The pull parser for encoded data.
//!
//! This is a private module. Its public content is re-exported by the
//! parent module.
//!
//! [`StreamParser`] reads a sequence of encoded values from a
//! [`Source`]. Reading the next value either produces a fully
//! materialised [`Value`] for primitive encodings or a sub-parser, the
//! [`Constructed`] type, for constructed encodings. The sub-parser
//! borrows the parser it came from, so the parent cannot be advanced
//! while the child is alive. A child that is dropped before its content
//! has been read leaves the parent unusable: the next read on the parent
//! fails with a child-active error.

use bytes::Bytes;
use crate::length::Length;
use crate::mode::Mode;
use crate::string::{BitString, OctetString, RestrictedString, StringKind};
use crate::tag::{Class, Tag};
use crate::tagged::{create_constructed, create_primitive};
use crate::time::{GeneralizedTime, UtcTime};
use crate::value::{Sequence, Set, Value};
use crate::external::External;
use super::error::{ContentError, DecodeError, ErrorKind};
use super::source::{IntoSource, Pos, Source};


//------------ StreamParser --------------------------------------------------

/// A parser pulling a sequence of encoded values off an octet source.
///
/// The parser owns the source. Use [`next_value`][Self::next_value] to
/// enter the values one by one, or [`value`][Self::value] to materialise
/// the next value completely. To guard against denial of service through
/// oversized length headers, wrap the source into a
/// [`LimitedSource`][super::LimitedSource] or lower the nesting limit
/// via [`with_max_depth`][Self::with_max_depth].
pub struct StreamParser<S> {
    /// The source of the data.
    source: S,

    /// The mode the data is decoded in.
    mode: Mode,

    /// How deeply values may nest.
    max_depth: usize,

    /// The completion flag of an outstanding child, if any.
    nested: Option<bool>,
}

impl<S: Source> StreamParser<S> {
    /// The default limit on the nesting depth of values.
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// Creates a new parser reading from the given source.
    pub fn new(source: impl IntoSource<Source = S>, mode: Mode) -> Self {
        StreamParser {
            source: source.into_source(),
            mode,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            nested: None,
        }
    }

    /// Changes the limit on the nesting depth of values.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the mode the parser decodes in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the current position in the source.
    pub fn pos(&self) -> Pos {
        self.source.pos()
    }

    /// Reads the next value from the source.
    ///
    /// Returns `Ok(None)` when the source has reached its end. A
    /// primitive value is materialised right away; a constructed value is
    /// returned as a sub-parser for its content.
    pub fn next_value(
        &mut self
    ) -> Result<Option<Entry<'_, S>>, DecodeError<S::Error>> {
        check_child(&mut self.nested, &self.source)?;
        let start = self.source.pos();
        let (tag, constructed) = match Tag::take_opt_from(
            &mut self.source
        )? {
            Some(some) => some,
            None => return Ok(None)
        };
        if tag == Tag::END_OF_CONTENTS {
            return Err(DecodeError::content(
                ContentError::new(
                    ErrorKind::MalformedHeader, "unexpected end-of-contents"
                ),
                start
            ))
        }
        let length = Length::take_from(&mut self.source, self.mode)?;
        match length {
            Length::Definite(len) => {
                if constructed {
                    let end = self.source.pos().to_u64() + len as u64;
                    let done = self.nested.insert(false);
                    Ok(Some(Entry::Constructed(Constructed {
                        source: &mut self.source,
                        done,
                        mode: self.mode,
                        tag,
                        state: State::Definite { end },
                        nested: None,
                        depth: self.max_depth,
                    })))
                }
                else {
                    let content = self.source.take_bytes(len)?;
                    primitive_value(tag, content, self.mode, start)
                        .map(|value| Some(Entry::Primitive(value)))
                }
            }
            Length::Indefinite => {
                if !constructed {
                    return Err(DecodeError::content(
                        ContentError::new(
                            ErrorKind::MalformedLength,
                            "indefinite length on primitive value"
                        ),
                        start
                    ))
                }
                let done = self.nested.insert(false);
                Ok(Some(Entry::Constructed(Constructed {
                    source: &mut self.source,
                    done,
                    mode: self.mode,
                    tag,
                    state: State::Indefinite,
                    nested: None,
                    depth: self.max_depth,
                })))
            }
        }
    }

    /// Materialises the next value completely.
    ///
    /// Returns a stream-exhausted error if the source has reached its
    /// end.
    pub fn value(&mut self) -> Result<Value, DecodeError<S::Error>> {
        match self.next_value()? {
            Some(entry) => entry.into_value(),
            None => {
                Err(self.source.content_err(
                    ErrorKind::StreamExhausted, "expected a value"
                ))
            }
        }
    }

    /// Checks that the source has been read to its end.
    pub fn exhausted(&mut self) -> Result<(), DecodeError<S::Error>> {
        check_child(&mut self.nested, &self.source)?;
        if self.source.request(1)? > 0 {
            return Err(self.source.content_err(
                ErrorKind::Structure, "trailing data"
            ))
        }
        Ok(())
    }
}


//------------ Entry ---------------------------------------------------------

/// A single value read off a parser.
#[derive(Debug)]
pub enum Entry<'a, S> {
    /// The value uses primitive encoding and is fully materialised.
    Primitive(Value),

    /// The value uses constructed encoding.
    ///
    /// The content can be read through the enclosed sub-parser.
    Constructed(Constructed<'a, S>),
}

impl<'a, S: Source> Entry<'a, S> {
    /// Returns the tag of the value.
    pub fn tag(&self) -> Tag {
        match self {
            Entry::Primitive(value) => value.tag(),
            Entry::Constructed(cons) => cons.tag(),
        }
    }

    /// Returns whether the value uses constructed encoding.
    pub fn is_constructed(&self) -> bool {
        matches!(self, Entry::Constructed(_))
    }

    /// Materialises the value completely.
    pub fn into_value(self) -> Result<Value, DecodeError<S::Error>> {
        match self {
            Entry::Primitive(value) => Ok(value),
            Entry::Constructed(mut cons) => cons.load(),
        }
    }
}


//------------ Constructed ---------------------------------------------------

/// The content of a constructed value being parsed.
///
/// A value of this type is handed out by [`StreamParser::next_value`] or
/// by the `next_value` method of an outer constructed value. It gives
/// access to the nested values via the same interface and additionally
/// offers the schema-free interpretation helpers
/// [`load`][Self::load], [`load_explicit`][Self::load_explicit],
/// [`read_implicit`][Self::read_implicit], and
/// [`load_tagged`][Self::load_tagged].
///
/// The content must be read completely before the parent can continue.
/// Reading past the last nested value exhausts the parser; any read
/// after that fails with a stream-exhausted error.
#[derive(Debug)]
pub struct Constructed<'a, S> {
    /// The underlying source, shared with the parent.
    source: &'a mut S,

    /// The parent's completion flag for this value.
    done: &'a mut bool,

    /// The mode the data is decoded in.
    mode: Mode,

    /// The tag of the value being parsed.
    tag: Tag,

    /// Where the content ends.
    state: State,

    /// The completion flag of an outstanding child, if any.
    nested: Option<bool>,

    /// The remaining nesting allowance.
    depth: usize,
}

/// The way the end of the content is determined.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// The content ends at the given position in the source.
    Definite {
        /// The absolute end position.
        end: u64,
    },

    /// The content ends at the end-of-contents marker.
    Indefinite,

    /// The content has been read completely.
    Done,
}

impl<'a, S: Source> Constructed<'a, S> {
    /// Returns the tag of the value.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the class of the value's tag.
    pub fn class(&self) -> Class {
        self.tag.class()
    }

    /// Returns the number of the value's tag.
    pub fn number(&self) -> u32 {
        self.tag.number()
    }

    /// Returns the mode the parser decodes in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns whether the value uses the indefinite length form.
    pub fn is_indefinite(&self) -> bool {
        matches!(self.state, State::Indefinite)
    }

    /// Returns the current position in the source.
    pub fn pos(&self) -> Pos {
        self.source.pos()
    }

    /// Reads the next nested value.
    ///
    /// Returns `Ok(None)` when the end of the content has been reached,
    /// after which any further read fails with a stream-exhausted error.
    pub fn next_value(
        &mut self
    ) -> Result<Option<Entry<'_, S>>, DecodeError<S::Error>> {
        if matches!(self.state, State::Done) {
            return Err(self.source.content_err(
                ErrorKind::StreamExhausted, "value already exhausted"
            ))
        }
        check_child(&mut self.nested, &*self.source)?;

        // A definite value ends by position, before any further header.
        if let State::Definite { end } = self.state {
            let pos = self.source.pos().to_u64();
            if pos == end {
                self.state = State::Done;
                *self.done = true;
                return Ok(None)
            }
            if pos > end {
                // A nested value overran us.
                return Err(self.source.content_err(
                    ErrorKind::MalformedLength, "nested value too long"
                ))
            }
        }

        let start = self.source.pos();
        let (tag, constructed) = Tag::take_from(self.source)?;
        if tag == Tag::END_OF_CONTENTS {
            if matches!(self.state, State::Definite { .. }) {
                return Err(DecodeError::content(
                    ContentError::new(
                        ErrorKind::MalformedHeader,
                        "end-of-contents in definite length value"
                    ),
                    start
                ))
            }
            if constructed {
                return Err(DecodeError::content(
                    ContentError::new(
                        ErrorKind::MalformedHeader,
                        "invalid end-of-contents"
                    ),
                    start
                ))
            }
            let length = Length::take_from(self.source, self.mode)?;
            if !length.is_zero() {
                return Err(DecodeError::content(
                    ContentError::new(
                        ErrorKind::MalformedLength,
                        "invalid end-of-contents"
                    ),
                    start
                ))
            }
            self.state = State::Done;
            *self.done = true;
            return Ok(None)
        }

        let length = Length::take_from(self.source, self.mode)?;
        match length {
            Length::Definite(len) => {
                let child_end = self.source.pos().to_u64() + len as u64;
                if let State::Definite { end } = self.state {
                    if child_end > end {
                        return Err(DecodeError::content(
                            ContentError::new(
                                ErrorKind::MalformedLength,
                                "nested value too long"
                            ),
                            start
                        ))
                    }
                }
                if constructed {
                    self.constructed_child(
                        tag, State::Definite { end: child_end }, start
                    ).map(|cons| Some(Entry::Constructed(cons)))
                }
                else {
                    let content = self.source.take_bytes(len)?;
                    primitive_value(tag, content, self.mode, start)
                        .map(|value| Some(Entry::Primitive(value)))
                }
            }
            Length::Indefinite => {
                if !constructed {
                    return Err(DecodeError::content(
                        ContentError::new(
                            ErrorKind::MalformedLength,
                            "indefinite length on primitive value"
                        ),
                        start
                    ))
                }
                self.constructed_child(tag, State::Indefinite, start)
                    .map(|cons| Some(Entry::Constructed(cons)))
            }
        }
    }

    /// Creates the sub-parser for a nested constructed value.
    fn constructed_child(
        &mut self, tag: Tag, state: State, start: Pos,
    ) -> Result<Constructed<'_, S>, DecodeError<S::Error>> {
        if self.depth == 0 {
            return Err(DecodeError::content(
                ContentError::new(
                    ErrorKind::LimitExceeded, "nesting too deep"
                ),
                start
            ))
        }
        let done = self.nested.insert(false);
        Ok(Constructed {
            source: &mut *self.source,
            done,
            mode: self.mode,
            tag,
            state,
            nested: None,
            depth: self.depth - 1,
        })
    }

    /// Materialises the next nested value completely.
    ///
    /// Returns a structure error if the end of the content has been
    /// reached.
    pub fn value(&mut self) -> Result<Value, DecodeError<S::Error>> {
        let pos = self.source.pos();
        match self.next_value()? {
            Some(entry) => entry.into_value(),
            None => {
                Err(DecodeError::content(
                    ContentError::new(
                        ErrorKind::Structure, "expected further values"
                    ),
                    pos
                ))
            }
        }
    }

    /// Materialises the next nested value if there is one.
    pub fn opt_value(
        &mut self
    ) -> Result<Option<Value>, DecodeError<S::Error>> {
        match self.next_value()? {
            Some(entry) => entry.into_value().map(Some),
            None => Ok(None)
        }
    }

    /// Materialises all remaining nested values.
    fn collect(&mut self) -> Result<Vec<Value>, DecodeError<S::Error>> {
        let mut res = Vec::new();
        while let Some(value) = self.opt_value()? {
            res.push(value)
        }
        Ok(res)
    }

    /// Skips over the remaining content.
    pub fn skip_rest(&mut self) -> Result<(), DecodeError<S::Error>> {
        while let Some(entry) = self.next_value()? {
            if let Entry::Constructed(mut child) = entry {
                child.skip_rest()?;
            }
        }
        Ok(())
    }
}

/// # Materialising the whole value
///
impl<'a, S: Source> Constructed<'a, S> {
    /// Materialises the entered value according to its tag.
    ///
    /// Universal tags produce their concrete types; anything else goes
    /// through the tagged-value rules of [`load_tagged`][Self::load_tagged].
    pub fn load(&mut self) -> Result<Value, DecodeError<S::Error>> {
        if !self.tag.is_universal() {
            return self.load_tagged()
        }
        // DER only ever constructs SEQUENCE, SET, and EXTERNAL; strings
        // must use the primitive form there.
        if self.mode.is_canonical() && !matches!(
            self.tag, Tag::SEQUENCE | Tag::SET | Tag::EXTERNAL
        ) {
            return Err(self.source.content_err(
                ErrorKind::MalformedHeader,
                "constructed encoding not allowed in DER"
            ))
        }
        let indefinite = self.is_indefinite();
        let pos = self.source.pos();
        match self.tag {
            Tag::SEQUENCE => {
                let items = self.collect()?;
                Ok(Value::Sequence(Sequence::with_form(items, indefinite)))
            }
            Tag::SET => {
                let items = self.collect()?;
                Ok(Value::Set(Set::with_form(items, indefinite)))
            }
            Tag::OCTET_STRING => {
                let segments = self.octet_segments()?;
                Ok(Value::OctetString(
                    OctetString::from_segments(segments, indefinite)
                ))
            }
            Tag::BIT_STRING => {
                let items = self.collect()?;
                combine_bit_segments(items).map(Value::BitString)
                    .map_err(|err| DecodeError::content(err, pos))
            }
            Tag::EXTERNAL => {
                let items = self.collect()?;
                External::from_values(items)
                    .map(|ext| Value::External(Box::new(ext)))
                    .map_err(|err| DecodeError::content(err, pos))
            }
            Tag::UTC_TIME => {
                let content = self.string_content(None)?;
                UtcTime::from_content(content).map(Value::UtcTime)
                    .map_err(|err| DecodeError::content(err, pos))
            }
            Tag::GENERALIZED_TIME => {
                let content = self.string_content(None)?;
                GeneralizedTime::from_content(content)
                    .map(Value::GeneralizedTime)
                    .map_err(|err| DecodeError::content(err, pos))
            }
            tag => {
                let Some(kind) = StringKind::from_tag(tag) else {
                    return Err(DecodeError::content(
                        ContentError::new(
                            ErrorKind::Unimplemented,
                            "unsupported constructed universal type"
                        ),
                        pos
                    ))
                };
                let content = self.string_content(Some(kind))?;
                RestrictedString::new(kind, content).map(Value::String)
                    .map_err(|err| DecodeError::content(err, pos))
            }
        }
    }

    /// Collects the remaining values as octet string segments.
    fn octet_segments(
        &mut self
    ) -> Result<Vec<OctetString>, DecodeError<S::Error>> {
        let mut res = Vec::new();
        loop {
            let pos = self.source.pos();
            match self.opt_value()? {
                Some(Value::OctetString(segment)) => res.push(segment),
                Some(_) => {
                    return Err(DecodeError::content(
                        ContentError::new(
                            ErrorKind::Structure,
                            "expected OCTET STRING segment"
                        ),
                        pos
                    ))
                }
                None => return Ok(res)
            }
        }
    }

    /// Collects the remaining values as the content of a string.
    ///
    /// Segments of a constructed character string may arrive under the
    /// string's own tag or as plain octet strings.
    fn string_content(
        &mut self, kind: Option<StringKind>,
    ) -> Result<Bytes, DecodeError<S::Error>> {
        let mut res = Vec::new();
        loop {
            let pos = self.source.pos();
            match self.opt_value()? {
                Some(Value::OctetString(segment)) => {
                    for chunk in segment.chunks() {
                        res.extend_from_slice(chunk)
                    }
                }
                Some(Value::String(segment))
                    if Some(segment.kind()) == kind =>
                {
                    res.extend_from_slice(segment.as_slice())
                }
                Some(_) => {
                    return Err(DecodeError::content(
                        ContentError::new(
                            ErrorKind::Structure, "expected string segment"
                        ),
                        pos
                    ))
                }
                None => return Ok(res.into())
            }
        }
    }

    /// Materialises the entered value as a tagged value.
    ///
    /// This collects the content and applies the tagged-value rules: a
    /// single nested value may be an explicitly tagged value; several
    /// can only be an implicit SEQUENCE; the application class becomes a
    /// raw container.
    pub fn load_tagged(&mut self) -> Result<Value, DecodeError<S::Error>> {
        if self.tag.is_universal() {
            return Err(self.source.content_err(
                ErrorKind::InvalidArgument, "not a tagged value"
            ))
        }
        let indefinite = self.is_indefinite();
        let items = self.collect()?;
        Ok(create_constructed(
            self.tag.class(), self.tag.number(), indefinite, items
        ))
    }

    /// Reads the content asserting an explicitly tagged value.
    ///
    /// The content must consist of exactly one complete value which is
    /// returned. Anything else is a structure error.
    pub fn load_explicit(&mut self) -> Result<Value, DecodeError<S::Error>> {
        let res = self.value()?;
        let pos = self.source.pos();
        if self.next_value()?.is_some() {
            return Err(DecodeError::content(
                ContentError::new(
                    ErrorKind::Structure,
                    "trailing data in explicitly tagged value"
                ),
                pos
            ))
        }
        Ok(res)
    }

    /// Reads the content reinterpreted as universal tag `base`.
    ///
    /// The caller asserts whether the value is supposed to use
    /// constructed encoding; since sub-parsers only exist for constructed
    /// values, asserting primitive encoding fails – with a
    /// malformed-length error for an indefinite value, where the
    /// primitive form is impossible, and a structure error otherwise.
    ///
    /// Without a schema, only the structural base tags SEQUENCE, SET,
    /// and OCTET STRING can be reinterpreted; everything else fails as
    /// unimplemented. Callers that know the schema can collect the raw
    /// content and decode it themselves.
    pub fn read_implicit(
        &mut self, constructed: bool, base: Tag,
    ) -> Result<Value, DecodeError<S::Error>> {
        if !constructed {
            if self.is_indefinite() {
                return Err(self.source.content_err(
                    ErrorKind::MalformedLength,
                    "indefinite length on primitive encoding"
                ))
            }
            return Err(self.source.content_err(
                ErrorKind::Structure,
                "constructed bit does not match asserted form"
            ))
        }
        let indefinite = self.is_indefinite();
        match base {
            Tag::SEQUENCE => {
                let items = self.collect()?;
                Ok(Value::Sequence(Sequence::with_form(items, indefinite)))
            }
            Tag::SET => {
                let items = self.collect()?;
                Ok(Value::Set(Set::with_form(items, indefinite)))
            }
            Tag::OCTET_STRING => {
                let segments = self.octet_segments()?;
                Ok(Value::OctetString(
                    OctetString::from_segments(segments, indefinite)
                ))
            }
            _ => {
                Err(self.source.content_err(
                    ErrorKind::Unimplemented,
                    "implicit reinterpretation not supported for this \
                     base tag"
                ))
            }
        }
    }
}


//============ Helper Functions ==============================================

/// Checks and resets the completion flag of an outstanding child.
fn check_child<S: Source>(
    nested: &mut Option<bool>, source: &S,
) -> Result<(), DecodeError<S::Error>> {
    match nested.take() {
        Some(false) => {
            Err(source.content_err(
                ErrorKind::ChildActive, "nested value not exhausted"
            ))
        }
        _ => Ok(())
    }
}

/// Materialises a primitive value from its tag and content octets.
fn primitive_value<E>(
    tag: Tag, content: Bytes, mode: Mode, start: Pos,
) -> Result<Value, DecodeError<E>> {
    let res = if tag.is_universal() {
        Value::from_primitive_content(tag, content, mode)
    }
    else {
        Ok(create_primitive(tag.class(), tag.number(), content))
    };
    res.map_err(|err| DecodeError::content(err, start))
}

/// Combines the segments of a constructed BIT STRING.
///
/// All segments but the last must not have unused bits.
fn combine_bit_segments(
    items: Vec<Value>,
) -> Result<BitString, ContentError> {
    let mut octets = Vec::new();
    let mut unused = 0;
    let last = items.len().saturating_sub(1);
    for (idx, item) in items.into_iter().enumerate() {
        let segment = match item {
            Value::BitString(segment) => segment,
            _ => {
                return Err(ContentError::new(
                    ErrorKind::Structure, "expected BIT STRING segment"
                ))
            }
        };
        if idx != last && segment.unused() != 0 {
            return Err(ContentError::new(
                ErrorKind::Structure,
                "unused bits in intermediate BIT STRING segment"
            ))
        }
        octets.extend_from_slice(segment.octets());
        unused = segment.unused();
    }
    BitString::new(unused, octets)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use crate::tagged::TaggedValue;
    use super::*;

    fn int(val: i64) -> Value {
        Value::Integer(val.into())
    }

    fn parser(data: &[u8], mode: Mode) -> StreamParser<
        crate::decode::SliceSource
    > {
        StreamParser::new(data, mode)
    }

    #[test]
    fn primitive_entries() {
        let mut parser = parser(b"\x02\x01\x2a\x01\x01\x00", Mode::Ber);
        assert_eq!(parser.value().unwrap(), int(42));
        assert_eq!(parser.value().unwrap(), Value::Boolean(false));
        assert!(parser.next_value().unwrap().is_none());
        assert!(parser.exhausted().is_ok());
    }

    #[test]
    fn value_at_end() {
        let mut parser = parser(b"", Mode::Ber);
        assert_eq!(
            parser.value().unwrap_err().kind(),
            Some(ErrorKind::StreamExhausted)
        );
    }

    #[test]
    fn nested_constructed() {
        let mut parser = parser(
            b"\x30\x08\x02\x01\x01\x30\x03\x02\x01\x02", Mode::Ber
        );
        let entry = parser.next_value().unwrap().unwrap();
        let mut outer = match entry {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(outer.tag(), Tag::SEQUENCE);
        assert_eq!(outer.value().unwrap(), int(1));
        let mut inner = match outer.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(inner.value().unwrap(), int(2));
        assert!(inner.next_value().unwrap().is_none());
        // The inner parser is exhausted now.
        assert_eq!(
            inner.next_value().unwrap_err().kind(),
            Some(ErrorKind::StreamExhausted)
        );
        assert!(outer.next_value().unwrap().is_none());
        assert!(parser.exhausted().is_ok());
    }

    #[test]
    fn child_active() {
        let mut parser = parser(
            b"\x30\x03\x02\x01\x01\x02\x01\x02", Mode::Ber
        );
        {
            // Enter the sequence but drop the sub-parser unread.
            let entry = parser.next_value().unwrap().unwrap();
            assert!(entry.is_constructed());
        }
        assert_eq!(
            parser.next_value().unwrap_err().kind(),
            Some(ErrorKind::ChildActive)
        );
    }

    #[test]
    fn indefinite_value() {
        let mut parser = parser(
            b"\x30\x80\x02\x01\x01\x00\x00", Mode::Ber
        );
        let mut cons = match parser.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert!(cons.is_indefinite());
        assert_eq!(cons.value().unwrap(), int(1));
        assert!(cons.next_value().unwrap().is_none());
        assert!(parser.exhausted().is_ok());
    }

    #[test]
    fn indefinite_needs_ber() {
        for mode in [Mode::Dl, Mode::Der] {
            let mut parser = parser(b"\x30\x80\x02\x01\x01\x00\x00", mode);
            assert_eq!(
                parser.next_value().unwrap_err().kind(),
                Some(ErrorKind::MalformedLength)
            );
        }
    }

    #[test]
    fn indefinite_primitive_rejected() {
        let mut parser = parser(b"\x02\x80\x01\x00\x00", Mode::Ber);
        assert_eq!(
            parser.next_value().unwrap_err().kind(),
            Some(ErrorKind::MalformedLength)
        );
    }

    #[test]
    fn missing_end_of_contents() {
        let mut parser = parser(b"\x30\x80\x02\x01\x01", Mode::Ber);
        let mut cons = match parser.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(cons.value().unwrap(), int(1));
        assert_eq!(
            cons.next_value().unwrap_err().kind(),
            Some(ErrorKind::MalformedHeader)
        );
    }

    #[test]
    fn nested_value_too_long() {
        // The inner value claims more content than the outer has.
        let mut parser = parser(b"\x30\x03\x02\x05\x01", Mode::Ber);
        let mut cons = match parser.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.next_value().unwrap_err().kind(),
            Some(ErrorKind::MalformedLength)
        );
    }

    #[test]
    fn length_past_end_of_stream() {
        let mut parser = parser(b"\x02\x05\x01", Mode::Ber);
        assert_eq!(
            parser.next_value().unwrap_err().kind(),
            Some(ErrorKind::MalformedLength)
        );
    }

    #[test]
    fn load_explicit() {
        let mut parser1 = parser(b"\xa3\x03\x02\x01\x05", Mode::Ber);
        let mut cons = match parser1.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(cons.tag(), Tag::ctx(3));
        assert_eq!(cons.load_explicit().unwrap(), int(5));
        assert!(parser1.exhausted().is_ok());

        // Two nested values are not an explicitly tagged value.
        let mut parser2 = parser(
            b"\xa3\x06\x02\x01\x05\x02\x01\x06", Mode::Ber
        );
        let mut cons = match parser2.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.load_explicit().unwrap_err().kind(),
            Some(ErrorKind::Structure)
        );
    }

    #[test]
    fn read_implicit() {
        // Reinterpret [CONTEXT 3] as an implicit SEQUENCE.
        let mut parser1 = parser(
            b"\xa3\x06\x02\x01\x01\x02\x01\x02", Mode::Ber
        );
        let mut cons = match parser1.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.read_implicit(true, Tag::SEQUENCE).unwrap(),
            Value::sequence(vec![int(1), int(2)])
        );

        // Segmented octet string under a context tag.
        let mut parser2 = parser(
            b"\xa0\x06\x04\x01\xaa\x04\x01\xbb", Mode::Ber
        );
        let mut cons = match parser2.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.read_implicit(true, Tag::OCTET_STRING).unwrap(),
            Value::octets(Bytes::from_static(b"\xaa\xbb"))
        );

        // Other base tags are unimplemented without a schema.
        let mut parser3 = parser(b"\xa3\x03\x02\x01\x05", Mode::Ber);
        let mut cons = match parser3.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.read_implicit(true, Tag::INTEGER).unwrap_err().kind(),
            Some(ErrorKind::Unimplemented)
        );
    }

    #[test]
    fn read_implicit_primitive_assertion() {
        // Asserting primitive form against an indefinite wrapper is a
        // length problem: the indefinite form requires construction.
        let mut parser1 = parser(
            b"\xa3\x80\x02\x01\x05\x00\x00", Mode::Ber
        );
        let mut cons = match parser1.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.read_implicit(false, Tag::INTEGER).unwrap_err().kind(),
            Some(ErrorKind::MalformedLength)
        );

        // Against a definite wrapper it is a structural mismatch.
        let mut parser2 = parser(b"\xa3\x03\x02\x01\x05", Mode::Ber);
        let mut cons = match parser2.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        assert_eq!(
            cons.read_implicit(false, Tag::INTEGER).unwrap_err().kind(),
            Some(ErrorKind::Structure)
        );
    }

    #[test]
    fn load_tagged() {
        let mut parser = parser(b"\xa3\x03\x02\x01\x05", Mode::Ber);
        let mut cons = match parser.next_value().unwrap().unwrap() {
            Entry::Constructed(cons) => cons,
            _ => panic!("expected constructed value")
        };
        let value = cons.load_tagged().unwrap();
        match &value {
            Value::Tagged(tagged) => {
                assert_eq!(tagged.class(), Class::Context);
                assert_eq!(tagged.number(), 3);
                assert!(tagged.is_explicit());
                assert_eq!(tagged.inner(), &int(5));
            }
            _ => panic!("expected tagged value")
        }
        assert_eq!(value.to_vec(Mode::Ber), b"\xa3\x03\x02\x01\x05");
    }

    #[test]
    fn materialised_implicit_reinterpretation() {
        // The full path of asserting implicit INTEGER on a parsed
        // wrapper: the declared style flips to implicit but the wire
        // shape is preserved.
        let value = Value::decode(b"\xa3\x03\x02\x01\x05", Mode::Ber)
            .unwrap();
        let tagged = match value {
            Value::Tagged(tagged) => tagged,
            _ => panic!("expected tagged value")
        };
        let reread = tagged.load_implicit(Tag::INTEGER, true).unwrap();
        assert!(!reread.is_explicit());
        assert_eq!(reread.inner(), &int(5));
        assert_eq!(
            Value::Tagged(reread).to_vec(Mode::Ber),
            b"\xa3\x03\x02\x01\x05"
        );
    }

    #[test]
    fn primitive_context_value() {
        // A primitive context value materialises as an implicit tagged
        // octet string.
        let value = Value::decode(b"\x83\x01\x05", Mode::Ber).unwrap();
        let tagged = match &value {
            Value::Tagged(tagged) => tagged,
            _ => panic!("expected tagged value")
        };
        assert!(!tagged.is_explicit());
        assert_eq!(
            tagged.inner(),
            &Value::octets(Bytes::from_static(b"\x05"))
        );
        assert_eq!(value.to_vec(Mode::Ber), b"\x83\x01\x05");

        let reread = tagged.load_implicit(Tag::INTEGER, false).unwrap();
        assert_eq!(reread.inner(), &int(5));
    }

    #[test]
    fn segmented_octet_string() {
        // A constructed octet string flattens for comparison but
        // remembers its segments for BER.
        let data = b"\x24\x80\x04\x01\xaa\x04\x01\xbb\x00\x00";
        let value = Value::decode(data, Mode::Ber).unwrap();
        assert_eq!(value, Value::octets(Bytes::from_static(b"\xaa\xbb")));
        assert_eq!(value.to_vec(Mode::Ber), data);
        assert_eq!(value.to_vec(Mode::Der), b"\x04\x02\xaa\xbb");

        // DER does not allow the constructed form.
        assert!(Value::decode(b"\x24\x04\x04\x02\xaa\xbb", Mode::Der)
            .is_err());
    }

    #[test]
    fn segmented_bit_string() {
        let value = Value::decode(
            b"\x23\x08\x03\x02\x00\xaa\x03\x02\x04\xb0", Mode::Ber
        ).unwrap();
        match &value {
            Value::BitString(bits) => {
                assert_eq!(bits.unused(), 4);
                assert_eq!(bits.octets().as_ref(), b"\xaa\xb0");
            }
            _ => panic!("expected bit string")
        }

        // Unused bits in an intermediate segment are not allowed.
        assert_eq!(
            Value::decode(
                b"\x23\x08\x03\x02\x04\xaa\x03\x02\x00\xb0", Mode::Ber
            ).unwrap_err().kind(),
            Some(ErrorKind::Structure)
        );
    }

    #[test]
    fn nesting_limit() {
        // Build deeply nested sequences: 70 levels of 30 80 ... 00 00.
        let mut data = Vec::new();
        for _ in 0..70 {
            data.extend_from_slice(b"\x30\x80");
        }
        for _ in 0..70 {
            data.extend_from_slice(b"\x00\x00");
        }
        assert_eq!(
            Value::decode(data.as_slice(), Mode::Ber).unwrap_err().kind(),
            Some(ErrorKind::LimitExceeded)
        );

        // A parser with a larger allowance is fine with it.
        let mut parser = StreamParser::new(
            data.as_slice(), Mode::Ber
        ).with_max_depth(100);
        assert!(parser.value().is_ok());
    }

    #[test]
    fn read_limit() {
        use crate::decode::{LimitedSource, SliceSource};

        let mut source = LimitedSource::with_limit(
            SliceSource::new(b"\x04\x10\x01\x02\x03\x04"), 4
        );
        let mut parser = StreamParser::new(source.clone(), Mode::Ber);
        assert_eq!(
            parser.value().unwrap_err().kind(),
            Some(ErrorKind::LimitExceeded)
        );

        source.set_limit(None);
        let mut parser = StreamParser::new(source, Mode::Ber);
        assert_eq!(
            parser.value().unwrap_err().kind(),
            Some(ErrorKind::MalformedLength)
        );
    }

    #[test]
    fn trailing_data() {
        assert_eq!(
            Value::decode(b"\x05\x00\x05\x00", Mode::Ber)
                .unwrap_err().kind(),
            Some(ErrorKind::Structure)
        );
    }

    #[test]
    fn reject_primitive_sequence() {
        // A primitive encoding of SEQUENCE is illegal.
        assert_eq!(
            Value::decode(b"\x10\x03\x02\x01\x01", Mode::Ber)
                .unwrap_err().kind(),
            Some(ErrorKind::MalformedHeader)
        );
    }

    #[test]
    fn unknown_universal_roundtrip() {
        // REAL is not modelled; its raw content survives.
        let value = Value::decode(b"\x09\x03\x80\xfb\x05", Mode::Ber)
            .unwrap();
        assert!(matches!(value, Value::Other(_)));
        assert_eq!(value.to_vec(Mode::Ber), b"\x09\x03\x80\xfb\x05");
    }

    #[test]
    fn explicit_tagging_content_law() {
        // The content octets of an explicit wrapper are the complete
        // encoding of the inner value; those of an implicit wrapper are
        // the inner value's content octets under a rewritten identifier.
        let inner = Value::sequence(vec![int(1)]);
        let inner_encoded = inner.to_vec(Mode::Der);
        let explicit = Value::Tagged(
            TaggedValue::explicit(Class::Context, 7, inner.clone()).unwrap()
        ).to_vec(Mode::Der);
        assert_eq!(&explicit[2..], inner_encoded.as_slice());
        let implicit = Value::Tagged(
            TaggedValue::implicit(Class::Context, 7, inner).unwrap()
        ).to_vec(Mode::Der);
        assert_eq!(&implicit[2..], &inner_encoded[2..]);
        assert_eq!(implicit[0], 0xa7);
    }
}

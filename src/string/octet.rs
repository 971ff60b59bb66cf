//! OCTET STRING values.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::{cmp, fmt, io};
use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;
use crate::length::Length;
use crate::mode::Mode;
use crate::tag::Tag;
use crate::value::write_header;


//------------ OctetString ---------------------------------------------------

/// An OCTET STRING value.
///
/// An octet string is a sequence of octets. The Basic Encoding Rules allow
/// this sequence to be broken up into segments that are encoded separately,
/// either to deal with very large strings or because the length of the
/// string isn't known up front. Each segment is itself an octet string and
/// may in turn be segmented.
///
/// This type keeps the segmentation of a decoded value, so a value decoded
/// from BER re-encodes in BER the way it arrived. The segmentation is
/// invisible to comparison and hashing: only the assembled content counts.
/// Encoding in DL or DER mode collapses the segments.
#[derive(Clone, Debug)]
pub struct OctetString(Inner);

/// The two encoding forms of an octet string.
#[derive(Clone, Debug)]
enum Inner {
    /// The string is a single sequence of octets.
    Primitive(Bytes),

    /// The string is a sequence of segments.
    Constructed {
        /// The segments of the string.
        segments: Vec<OctetString>,

        /// Did the value use the indefinite length form?
        indefinite: bool,
    }
}

impl OctetString {
    /// Creates an octet string from the given content.
    pub fn new(content: impl Into<Bytes>) -> Self {
        OctetString(Inner::Primitive(content.into()))
    }

    /// Creates a segmented octet string from the given segments.
    ///
    /// If `indefinite` is `true`, the string will use the indefinite
    /// length form when encoded in BER mode.
    pub fn from_segments(
        segments: Vec<OctetString>, indefinite: bool,
    ) -> Self {
        OctetString(Inner::Constructed { segments, indefinite })
    }

    /// Returns whether the string is segmented.
    pub fn is_segmented(&self) -> bool {
        matches!(self.0, Inner::Constructed { .. })
    }

    /// Returns the number of content octets.
    pub fn len(&self) -> usize {
        match self.0 {
            Inner::Primitive(ref bytes) => bytes.len(),
            Inner::Constructed { ref segments, .. } => {
                segments.iter().map(Self::len).sum()
            }
        }
    }

    /// Returns whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the chunks of content octets.
    ///
    /// For an unsegmented string, the iterator yields the content as a
    /// single chunk. Otherwise it yields the content of each primitive
    /// segment in order.
    pub fn chunks(&self) -> Chunks {
        Chunks { stack: smallvec::smallvec![self] }
    }

    /// Assembles the content into a single bytes value.
    ///
    /// For an unsegmented string this is cheap since the underlying buffer
    /// is shared.
    pub fn to_bytes(&self) -> Bytes {
        match self.0 {
            Inner::Primitive(ref bytes) => bytes.clone(),
            Inner::Constructed { .. } => {
                let mut res = BytesMut::with_capacity(self.len());
                for chunk in self.chunks() {
                    res.extend_from_slice(chunk);
                }
                res.freeze()
            }
        }
    }

    /// Returns the string with its segments collapsed.
    pub fn collapse(&self) -> Self {
        match self.0 {
            Inner::Primitive(_) => self.clone(),
            Inner::Constructed { .. } => Self::new(self.to_bytes()),
        }
    }

    /// Returns whether the string encodes in constructed form.
    pub(crate) fn is_constructed_form(&self, mode: Mode) -> bool {
        mode == Mode::Ber && self.is_segmented()
    }

    /// Returns whether the string encodes in the indefinite length form.
    pub(crate) fn is_indefinite_form(&self, mode: Mode) -> bool {
        match self.0 {
            Inner::Primitive(_) => false,
            Inner::Constructed { indefinite, .. } => {
                indefinite && mode == Mode::Ber
            }
        }
    }

    /// Returns the length of the encoded content in the given mode.
    pub(crate) fn content_len(&self, mode: Mode) -> usize {
        if self.is_constructed_form(mode) {
            match self.0 {
                Inner::Constructed { ref segments, .. } => {
                    segments.iter().map(|s| s.encoded_len(mode)).sum()
                }
                Inner::Primitive(_) => unreachable!()
            }
        }
        else {
            self.len()
        }
    }

    /// Writes the encoded content to a target in the given mode.
    pub(crate) fn write_content<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        if self.is_constructed_form(mode) {
            match self.0 {
                Inner::Constructed { ref segments, .. } => {
                    for segment in segments {
                        segment.write_encoded(mode, target)?;
                    }
                    Ok(())
                }
                Inner::Primitive(_) => unreachable!()
            }
        }
        else {
            for chunk in self.chunks() {
                target.write_all(chunk)?;
            }
            Ok(())
        }
    }

    /// Returns the length of the complete encoded value in the given mode.
    pub(crate) fn encoded_len(&self, mode: Mode) -> usize {
        let content = self.content_len(mode);
        if self.is_indefinite_form(mode) {
            Tag::OCTET_STRING.encoded_len() + 1 + content + 2
        }
        else {
            Tag::OCTET_STRING.encoded_len()
                + Length::Definite(content).encoded_len() + content
        }
    }

    /// Writes the complete encoded value to a target in the given mode.
    pub(crate) fn write_encoded<W: io::Write>(
        &self, mode: Mode, target: &mut W,
    ) -> Result<(), io::Error> {
        if self.is_indefinite_form(mode) {
            Tag::OCTET_STRING.write_encoded(true, target)?;
            Length::Indefinite.write_encoded(target)?;
            self.write_content(mode, target)?;
            target.write_all(&[0, 0])
        }
        else {
            write_header(
                target, Tag::OCTET_STRING,
                self.is_constructed_form(mode),
                self.content_len(mode)
            )?;
            self.write_content(mode, target)
        }
    }

    /// Returns a stable hash over the content.
    pub(crate) fn stable_hash(&self) -> u64 {
        let mut res = 0xcbf2_9ce4_8422_2325;
        for chunk in self.chunks() {
            for &octet in chunk {
                res = (res ^ u64::from(octet))
                    .wrapping_mul(0x0000_0100_0000_01B3);
            }
        }
        res
    }
}


//--- From

impl From<Bytes> for OctetString {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes)
    }
}

impl From<&'_ [u8]> for OctetString {
    fn from(slice: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(slice))
    }
}


//--- PartialEq and Eq

impl PartialEq for OctetString {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false
        }
        let mut left_chunks = self.chunks();
        let mut right_chunks = other.chunks();
        let mut left: &[u8] = &[];
        let mut right: &[u8] = &[];
        loop {
            if left.is_empty() {
                left = match left_chunks.next() {
                    Some(chunk) => chunk,
                    None => return true, // same length, so right is done too
                };
                continue;
            }
            if right.is_empty() {
                match right_chunks.next() {
                    Some(chunk) => right = chunk,
                    None => return true,
                }
                continue;
            }
            let len = cmp::min(left.len(), right.len());
            if left[..len] != right[..len] {
                return false
            }
            left = &left[len..];
            right = &right[len..];
        }
    }
}

impl Eq for OctetString { }


//--- Display

impl fmt::Display for OctetString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#")?;
        for chunk in self.chunks() {
            for octet in chunk {
                write!(f, "{octet:02x}")?;
            }
        }
        Ok(())
    }
}


//------------ Chunks --------------------------------------------------------

/// An iterator over the chunks of content of an octet string.
///
/// The iterator is returned by [`OctetString::chunks`]. Empty chunks are
/// skipped.
pub struct Chunks<'a> {
    /// The segments still to be visited, in reverse order.
    stack: SmallVec<[&'a OctetString; 4]>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        loop {
            let string = self.stack.pop()?;
            match string.0 {
                Inner::Primitive(ref bytes) => {
                    if !bytes.is_empty() {
                        return Some(bytes.as_ref())
                    }
                }
                Inner::Constructed { ref segments, .. } => {
                    self.stack.extend(segments.iter().rev());
                }
            }
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn segmented() -> OctetString {
        OctetString::from_segments(
            vec![
                OctetString::from(b"foo".as_slice()),
                OctetString::from_segments(
                    vec![
                        OctetString::from(b"".as_slice()),
                        OctetString::from(b"b".as_slice()),
                    ],
                    false
                ),
                OctetString::from(b"ar".as_slice()),
            ],
            true
        )
    }

    #[test]
    fn content() {
        let string = segmented();
        assert_eq!(string.len(), 6);
        assert_eq!(string.to_bytes().as_ref(), b"foobar");
        assert_eq!(
            string.chunks().collect::<Vec<_>>(),
            [b"foo".as_slice(), b"b", b"ar"]
        );
    }

    #[test]
    fn eq() {
        assert_eq!(segmented(), OctetString::from(b"foobar".as_slice()));
        assert_ne!(segmented(), OctetString::from(b"foobaz".as_slice()));
        assert_ne!(segmented(), OctetString::from(b"foob".as_slice()));
        assert_eq!(
            segmented().stable_hash(),
            OctetString::from(b"foobar".as_slice()).stable_hash()
        );
    }

    #[test]
    fn collapse() {
        let collapsed = segmented().collapse();
        assert!(!collapsed.is_segmented());
        assert_eq!(collapsed, segmented());
    }

    #[test]
    fn encode() {
        let simple = OctetString::from(b"\x01\x02".as_slice());
        let mut target = Vec::new();
        simple.write_encoded(Mode::Ber, &mut target).unwrap();
        assert_eq!(target, b"\x04\x02\x01\x02");
        assert_eq!(simple.encoded_len(Mode::Ber), 4);

        // A segmented string encodes constructed in BER ...
        let string = OctetString::from_segments(
            vec![
                OctetString::from(b"\x01".as_slice()),
                OctetString::from(b"\x02".as_slice()),
            ],
            false
        );
        let mut target = Vec::new();
        string.write_encoded(Mode::Ber, &mut target).unwrap();
        assert_eq!(target, b"\x24\x06\x04\x01\x01\x04\x01\x02");
        assert_eq!(string.encoded_len(Mode::Ber), 8);

        // ... indefinite if it says so ...
        let string = OctetString::from_segments(
            vec![
                OctetString::from(b"\x01".as_slice()),
                OctetString::from(b"\x02".as_slice()),
            ],
            true
        );
        let mut target = Vec::new();
        string.write_encoded(Mode::Ber, &mut target).unwrap();
        assert_eq!(target, b"\x24\x80\x04\x01\x01\x04\x01\x02\x00\x00");
        assert_eq!(string.encoded_len(Mode::Ber), 10);

        // ... and collapses in DL and DER.
        for mode in [Mode::Dl, Mode::Der] {
            let mut target = Vec::new();
            string.write_encoded(mode, &mut target).unwrap();
            assert_eq!(target, b"\x04\x02\x01\x02");
            assert_eq!(string.encoded_len(mode), 4);
        }
    }
}

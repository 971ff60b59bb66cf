//! The source of data for decoding.
//!
//! This is a private module. Its public content is re-exported by the
//! parent module.

use std::{cmp, fmt, ops};
use std::convert::Infallible;
use bytes::Bytes;
use super::error::{ContentError, DecodeError, ErrorKind};


//------------ Source --------------------------------------------------------

/// A view into a sequence of octets.
///
/// Sources form that foundation of decoding. They provide the raw octets to
/// the decoder through a sliding window: [`request`][Self::request] asks for
/// a number of octets to become available, [`slice`][Self::slice] provides
/// access to those octets, and [`advance`][Self::advance] moves the window
/// forward once octets have been processed.
///
/// A source can fail to provide data, e.g., when reading from a file. The
/// associated `Error` type describes such failures. The sources provided by
/// this crate all read from memory and use `Infallible` as their error.
pub trait Source {
    /// The error produced when the source failed to read data.
    type Error;

    /// Returns the current read position in the source.
    fn pos(&self) -> Pos;

    /// Requests at least `len` octets to be available.
    ///
    /// The method returns the number of octets that are actually available.
    /// This may be less than `len` if the source ends early. It may also be
    /// more than `len`.
    fn request(
        &mut self, len: usize
    ) -> Result<usize, DecodeError<Self::Error>>;

    /// Returns the available octets.
    ///
    /// The slice is at least as long as the value returned by the last
    /// successful [`request`][Self::request].
    fn slice(&self) -> &[u8];

    /// Advances the read position by `len` octets.
    ///
    /// # Panics
    ///
    /// The method panics if `len` is larger than the number of octets
    /// most recently reported available by [`request`][Self::request].
    fn advance(&mut self, len: usize);


    //--- Provided methods

    /// Produces a content error at the current read position.
    fn content_err(
        &self, kind: ErrorKind, msg: &'static str,
    ) -> DecodeError<Self::Error> {
        DecodeError::content(ContentError::new(kind, msg), self.pos())
    }

    /// Takes a single octet from the source.
    ///
    /// Returns a malformed header error if the source has reached its end.
    fn take_u8(&mut self) -> Result<u8, DecodeError<Self::Error>> {
        if self.request(1)? < 1 {
            return Err(self.content_err(
                ErrorKind::MalformedHeader, "unexpected end of data"
            ))
        }
        let res = self.slice()[0];
        self.advance(1);
        Ok(res)
    }

    /// Takes a single octet if the source has not reached its end.
    fn take_opt_u8(
        &mut self
    ) -> Result<Option<u8>, DecodeError<Self::Error>> {
        if self.request(1)? < 1 {
            return Ok(None)
        }
        let res = self.slice()[0];
        self.advance(1);
        Ok(Some(res))
    }

    /// Takes exactly `len` octets from the source.
    ///
    /// Returns a malformed length error if fewer octets are available: the
    /// only reason to take an exact number of octets is that a length
    /// header promised them.
    fn take_bytes(
        &mut self, len: usize
    ) -> Result<Bytes, DecodeError<Self::Error>> {
        if self.request(len)? < len {
            return Err(self.content_err(
                ErrorKind::MalformedLength, "value length past end of data"
            ))
        }
        let res = Bytes::copy_from_slice(&self.slice()[..len]);
        self.advance(len);
        Ok(res)
    }
}


//------------ IntoSource ----------------------------------------------------

/// A type that can be converted into a source.
pub trait IntoSource {
    /// The type of the source the value converts into.
    type Source: Source;

    /// Converts the value into a source.
    fn into_source(self) -> Self::Source;
}

impl<'a> IntoSource for &'a [u8] {
    type Source = SliceSource<'a>;

    fn into_source(self) -> Self::Source {
        SliceSource::new(self)
    }
}

impl<'a, const N: usize> IntoSource for &'a [u8; N] {
    type Source = SliceSource<'a>;

    fn into_source(self) -> Self::Source {
        SliceSource::new(self.as_slice())
    }
}

impl IntoSource for Bytes {
    type Source = BytesSource;

    fn into_source(self) -> Self::Source {
        BytesSource::new(self)
    }
}

impl<'a> IntoSource for SliceSource<'a> {
    type Source = Self;

    fn into_source(self) -> Self::Source {
        self
    }
}

impl IntoSource for BytesSource {
    type Source = Self;

    fn into_source(self) -> Self::Source {
        self
    }
}

impl<S: Source> IntoSource for LimitedSource<S> {
    type Source = Self;

    fn into_source(self) -> Self::Source {
        self
    }
}


//------------ SliceSource ---------------------------------------------------

/// A source for a slice of octets.
///
/// Since all data is available from the start, the source never fails and
/// uses `Infallible` as its error type.
#[derive(Clone, Copy, Debug)]
pub struct SliceSource<'a> {
    /// The remaining octets.
    data: &'a [u8],

    /// The current read position.
    pos: u64,
}

impl<'a> SliceSource<'a> {
    /// Creates a new source for the given slice.
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }

    /// Returns the remaining octets.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> Source for SliceSource<'a> {
    type Error = Infallible;

    fn pos(&self) -> Pos {
        Pos(self.pos)
    }

    fn request(
        &mut self, _len: usize
    ) -> Result<usize, DecodeError<Self::Error>> {
        Ok(self.data.len())
    }

    fn slice(&self) -> &[u8] {
        self.data
    }

    fn advance(&mut self, len: usize) {
        assert!(len <= self.data.len());
        self.data = &self.data[len..];
        self.pos += len as u64;
    }
}


//------------ BytesSource ---------------------------------------------------

/// A source for a [`Bytes`] value.
///
/// Taking octets from this source is cheap: the returned values share the
/// underlying buffer.
#[derive(Clone, Debug)]
pub struct BytesSource {
    /// The remaining octets.
    data: Bytes,

    /// The current read position.
    pos: u64,
}

impl BytesSource {
    /// Creates a new source for the given bytes value.
    pub fn new(data: Bytes) -> Self {
        BytesSource { data, pos: 0 }
    }

    /// Returns the remaining octets.
    pub fn remaining(&self) -> &Bytes {
        &self.data
    }
}

impl Source for BytesSource {
    type Error = Infallible;

    fn pos(&self) -> Pos {
        Pos(self.pos)
    }

    fn request(
        &mut self, _len: usize
    ) -> Result<usize, DecodeError<Self::Error>> {
        Ok(self.data.len())
    }

    fn slice(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn advance(&mut self, len: usize) {
        assert!(len <= self.data.len());
        let _ = self.data.split_to(len);
        self.pos += len as u64;
    }

    fn take_bytes(
        &mut self, len: usize
    ) -> Result<Bytes, DecodeError<Self::Error>> {
        if len > self.data.len() {
            return Err(self.content_err(
                ErrorKind::MalformedLength, "value length past end of data"
            ))
        }
        let res = self.data.split_to(len);
        self.pos += len as u64;
        Ok(res)
    }
}


//------------ LimitedSource -------------------------------------------------

/// A source that limits the total number of octets read.
///
/// The limit guards against denial of service through oversized length
/// headers: decoding through a limited source will never gather more than
/// the configured number of octets, failing with a limit-exceeded error
/// instead.
#[derive(Clone, Debug)]
pub struct LimitedSource<S> {
    /// The wrapped source.
    source: S,

    /// The number of octets that may still be read.
    ///
    /// If this is `None`, there is no limit.
    limit: Option<usize>,
}

impl<S> LimitedSource<S> {
    /// Creates a new limited source without a limit.
    pub fn new(source: S) -> Self {
        LimitedSource { source, limit: None }
    }

    /// Creates a new limited source with the given limit.
    pub fn with_limit(source: S, limit: usize) -> Self {
        LimitedSource { source, limit: Some(limit) }
    }

    /// Returns the current limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Changes the limit.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit
    }

    /// Returns the wrapped source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: Source> Source for LimitedSource<S> {
    type Error = S::Error;

    fn pos(&self) -> Pos {
        self.source.pos()
    }

    fn request(
        &mut self, len: usize
    ) -> Result<usize, DecodeError<Self::Error>> {
        let limit = match self.limit {
            Some(limit) => limit,
            None => return self.source.request(len)
        };
        if len > limit {
            xerr!(return Err(self.source.content_err(
                ErrorKind::LimitExceeded, "read limit exceeded"
            )))
        }
        Ok(cmp::min(self.source.request(len)?, limit))
    }

    fn slice(&self) -> &[u8] {
        let res = self.source.slice();
        match self.limit {
            Some(limit) => &res[..cmp::min(res.len(), limit)],
            None => res
        }
    }

    fn advance(&mut self, len: usize) {
        if let Some(limit) = self.limit {
            assert!(len <= limit);
            self.limit = Some(limit - len);
        }
        self.source.advance(len)
    }
}


//------------ Pos -----------------------------------------------------------

/// The position of an octet within a source.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pos(u64);

impl Pos {
    /// Returns the position as a plain integer.
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Pos {
    fn from(pos: u64) -> Self {
        Pos(pos)
    }
}

impl ops::Add<usize> for Pos {
    type Output = Self;

    fn add(self, rhs: usize) -> Self {
        Pos(self.0 + rhs as u64)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}


//============ Tests =========================================================

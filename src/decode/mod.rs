//! Parsing of encoded data.
//!
//! This module provides the machinery for pulling values off an encoded
//! octet stream.
//!
//! Data is provided by a type implementing the [`Source`] trait – or
//! convertible into one via [`IntoSource`], which both `&[u8]` and
//! [`bytes::Bytes`] are. The [`StreamParser`] reads values off a source
//! one at a time: primitive values arrive fully materialised while
//! constructed values arrive as [`Constructed`] sub-parsers that give
//! access to their content through the same interface.
//!
//! Two kinds of errors can happen while decoding. The source can fail to
//! provide data; such source errors use the error type of the source in
//! question. And the data itself can be unusable, which is reported as a
//! [`ContentError`] carrying an [`ErrorKind`] for dispatch. The
//! [`DecodeError`] type combines the two.

pub use self::error::{ContentError, DecodeError, ErrorKind, ErrorMessage};
pub use self::source::{
    BytesSource, IntoSource, LimitedSource, Pos, SliceSource, Source
};
pub use self::stream::{Constructed, Entry, StreamParser};

mod error;
mod source;
mod stream;

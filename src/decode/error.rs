//! Error handling during decoding.
//!
//! This is a private module. Its public content is re-exported by the
//! parent module.
//!
//! Two kinds of errors can happen while decoding: the source the data is
//! read from can fail to provide more data, or the data itself can turn out
//! to violate the encoding rules. The former are _source errors_ and their
//! type is chosen by the source. The latter are _content errors,_
//! represented by [`ContentError`], which carries a classification of the
//! error as an [`ErrorKind`] so callers can dispatch on what went wrong.
//!
//! [`DecodeError`] combines the two and annotates content errors with the
//! position in the source they were discovered at. It is the error type
//! you will encounter most when decoding.

use std::{error, fmt};
use super::source::Pos;


//------------ ErrorKind -----------------------------------------------------

/// The classification of a content error.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The identifier octets are illegal.
    ///
    /// This includes long-form tag numbers with leading-zero padding,
    /// truncated long forms, tag numbers beyond the supported limit, and a
    /// constructed bit that is impossible for the type in question.
    MalformedHeader,

    /// The length octets are illegal.
    ///
    /// This includes the reserved first octet `0xFF`, indefinite length on
    /// a primitive encoding, a length that extends past the end of the
    /// data, and length forms forbidden by the encoding rules in use.
    MalformedLength,

    /// The sequence of encoded values violates the rules of the type.
    Structure,

    /// A value was constructed from invalid parts.
    InvalidArgument,

    /// The data is correctly encoded but uses an unsupported form.
    Unimplemented,

    /// An attempt was made to read from an exhausted parser.
    StreamExhausted,

    /// A parent parser was advanced while a child was left unexhausted.
    ChildActive,

    /// A configured size or depth limit was exceeded.
    LimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::MalformedHeader => "malformed identifier octets",
            ErrorKind::MalformedLength => "malformed length octets",
            ErrorKind::Structure => "invalid structure",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Unimplemented => "format not implemented",
            ErrorKind::StreamExhausted => "value already exhausted",
            ErrorKind::ChildActive => "nested value not exhausted",
            ErrorKind::LimitExceeded => "limit exceeded",
        })
    }
}


//------------ ErrorMessage --------------------------------------------------

/// An error message for use with [`ContentError`].
///
/// This type is an intermediary that makes it possible to pass various
/// things as an error message without explicit conversion: static strings
/// end up here without allocating while formatted strings can be boxed.
pub struct ErrorMessage {
    /// The actual yet hidden message.
    inner: ErrorMessageKind,
}

/// The actual error message as a hidden enum.
enum ErrorMessageKind {
    /// The error message is a static str.
    Static(&'static str),

    /// The error message is a boxed trait object.
    Boxed(Box<dyn fmt::Display + Send + Sync + 'static>),
}

impl ErrorMessage {
    /// Creates an error message from a static str.
    pub fn from_static(msg: &'static str) -> Self {
        ErrorMessage {
            inner: ErrorMessageKind::Static(msg)
        }
    }

    /// Creates an error message from a boxed trait object.
    pub fn from_boxed(
        msg: Box<dyn fmt::Display + Send + Sync + 'static>
    ) -> Self {
        ErrorMessage {
            inner: ErrorMessageKind::Boxed(msg)
        }
    }
}

impl From<&'static str> for ErrorMessage {
    fn from(msg: &'static str) -> Self {
        Self::from_static(msg)
    }
}

impl From<String> for ErrorMessage {
    fn from(msg: String) -> Self {
        Self::from_boxed(Box::new(msg))
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            ErrorMessageKind::Static(msg) => f.write_str(msg),
            ErrorMessageKind::Boxed(ref msg) => msg.fmt(f),
        }
    }
}


//------------ ContentError --------------------------------------------------

/// An error for data that does not conform with the encoding rules.
///
/// The error consists of a [kind][ErrorKind] for dispatching and a
/// human-readable message with the detail.
pub struct ContentError {
    /// The classification of the error.
    kind: ErrorKind,

    /// The detailed error message.
    msg: ErrorMessage,
}

impl ContentError {
    /// Creates a content error from a kind and a message.
    pub fn new(kind: ErrorKind, msg: impl Into<ErrorMessage>) -> Self {
        ContentError {
            kind,
            msg: msg.into(),
        }
    }

    /// Returns the classification of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Debug for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ContentError")
            .field("kind", &self.kind)
            .field("msg", &format_args!("{}", &self.msg))
            .finish()
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}

impl error::Error for ContentError { }


//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding data.
///
/// The error is either a content error annotated with the position in the
/// source it was encountered at or an error of the source itself. Sources
/// that cannot fail, such as [`SliceSource`][super::source::SliceSource],
/// use `std::convert::Infallible` as their error type, in which case a
/// decode error is always a content error.
pub struct DecodeError<E> {
    /// The actual error.
    inner: DecodeErrorKind<E>,
}

/// The actual error as a hidden enum.
enum DecodeErrorKind<E> {
    /// The source failed.
    Source(E),

    /// The data did not conform with the encoding rules.
    Content {
        /// The actual error.
        error: ContentError,

        /// The position in the source the error was encountered at.
        pos: Pos,
    }
}

impl<E> DecodeError<E> {
    /// Creates a decode error from a content error and a position.
    pub fn content(error: impl Into<ContentError>, pos: Pos) -> Self {
        DecodeError {
            inner: DecodeErrorKind::Content { error: error.into(), pos }
        }
    }

    /// Creates a decode error from a source error.
    pub fn source(error: impl Into<E>) -> Self {
        DecodeError {
            inner: DecodeErrorKind::Source(error.into())
        }
    }

    /// Returns the kind of the content error if this is a content error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self.inner {
            DecodeErrorKind::Source(_) => None,
            DecodeErrorKind::Content { ref error, .. } => Some(error.kind()),
        }
    }

    /// Returns the position of the error if this is a content error.
    pub fn pos(&self) -> Option<Pos> {
        match self.inner {
            DecodeErrorKind::Source(_) => None,
            DecodeErrorKind::Content { pos, .. } => Some(pos),
        }
    }

    /// Converts the error into one for a different source error type.
    pub fn convert<F: From<E>>(self) -> DecodeError<F> {
        DecodeError {
            inner: match self.inner {
                DecodeErrorKind::Source(err) => {
                    DecodeErrorKind::Source(err.into())
                }
                DecodeErrorKind::Content { error, pos } => {
                    DecodeErrorKind::Content { error, pos }
                }
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for DecodeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            DecodeErrorKind::Source(ref err) => {
                f.debug_tuple("DecodeError").field(err).finish()
            }
            DecodeErrorKind::Content { ref error, pos } => {
                f.debug_struct("DecodeError")
                    .field("error", error)
                    .field("pos", &pos)
                    .finish()
            }
        }
    }
}

impl<E: fmt::Display> fmt::Display for DecodeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            DecodeErrorKind::Source(ref err) => err.fmt(f),
            DecodeErrorKind::Content { ref error, pos } => {
                write!(f, "{} (at position {})", error, pos)
            }
        }
    }
}

impl<E: error::Error> error::Error for DecodeError<E> { }

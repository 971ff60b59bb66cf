//! Tree-based handling of data in Basic Encoding Rules.
//!
//! This crate decodes and encodes data in ASN.1's _Basic Encoding Rules_
//! as defined in ITU recommendation X.690, together with their stricter
//! companions, the definite-length-only variant and the _Distinguished
//! Encoding Rules._ It is schema-free: it operates purely on the
//! tag-length-value structure of the data and materialises it into a tree
//! of [`Value`]s.
//!
//! Decoding starts from anything that can act as a [`decode::Source`],
//! such as a byte slice or a [`bytes::Bytes`] value. For data that fits
//! into memory, [`Value::decode`] parses a complete value in one go. For
//! large or indefinite-length data, [`decode::StreamParser`] pulls values
//! off the source one at a time and defers the content of constructed
//! values to sub-parsers.
//!
//! Encoding goes the other way: a [`Value`] writes itself out in any of
//! the three [`Mode`]s. The Distinguished Encoding Rules produce the
//! canonical form used for signing; equality and hashing of values are
//! defined on that form.
//!
//! Since the crate is schema-free, tagged values deserve a closer look:
//! whether a tag was meant explicitly or implicitly cannot be determined
//! from the bytes, so decoded [`TaggedValue`]s record the shape they were
//! parsed from and offer reinterpretation methods for callers that know
//! the schema. See the [`tagged`][TaggedValue] documentation for the
//! details.

//--- Re-exports

pub use self::external::External;
pub use self::int::Integer;
pub use self::mode::Mode;
pub use self::oid::Oid;
pub use self::string::{
    BitString, Chunks, OctetString, RestrictedString, StringKind
};
pub use self::tag::{Class, Tag};
pub use self::tagged::{ApplicationSpecific, Explicitness, TaggedValue};
pub use self::time::{GeneralizedTime, UtcTime};
pub use self::value::{OtherValue, Sequence, Set, Value};


//--- Public modules

#[macro_use] pub mod debug;

pub mod decode;


//--- Private modules

mod external;
mod int;
mod length;
mod mode;
mod oid;
mod string;
mod tag;
mod tagged;
mod time;
mod value;

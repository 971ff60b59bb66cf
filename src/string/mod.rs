//! String-like types.
//!
//! This module collects the types for the various kinds of strings defined
//! in ASN.1: [`OctetString`] for plain byte sequences, [`BitString`] for
//! sequences of bits, and [`RestrictedString`] for the family of character
//! strings limited to certain character sets.

pub use self::bit::BitString;
pub use self::octet::{Chunks, OctetString};
pub use self::restricted::{RestrictedString, StringKind};

mod bit;
mod octet;
mod restricted;

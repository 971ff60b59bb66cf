//! The encoding variants of X.690.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use crate::decode::{DecodeError, IntoSource, Source};
use crate::value::Value;


//------------ Mode ----------------------------------------------------------

/// The three encoding variants handled by this crate.
///
/// The variants share the tag-length-value structure but differ in which
/// forms of it they admit. The mode is a parameter of both decoding and
/// encoding: a value decoded in one mode can be re-encoded in any other.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Basic Encoding Rules.
    ///
    /// These are the most flexible rules. Constructed values may use the
    /// indefinite length form and strings may be split into segments.
    Ber,

    /// Definite-length encoding.
    ///
    /// Like BER but all lengths must be definite and segmented strings are
    /// collapsed. The order of SET elements is preserved.
    Dl,

    /// Distinguished Encoding Rules.
    ///
    /// The canonical form: definite lengths, minimal length octets, SET
    /// elements sorted by their encoding, canonical primitive values. Two
    /// values are equal if and only if their DER encodings are identical,
    /// which is why DER is the form used for signing.
    Der,
}

impl Mode {
    /// Returns whether the mode allows the indefinite length form.
    pub fn allows_indefinite(self) -> bool {
        matches!(self, Mode::Ber)
    }

    /// Returns whether the mode requires canonical encodings.
    pub fn is_canonical(self) -> bool {
        matches!(self, Mode::Der)
    }

    /// Returns whether the mode restricts the permissible length forms.
    ///
    /// In a restricted mode, definite lengths must use the minimal number
    /// of octets.
    pub fn is_restricted(self) -> bool {
        matches!(self, Mode::Der)
    }

    /// Decodes a single value from the beginning of `source`.
    ///
    /// The source must not contain any further data after the value.
    /// This is shorthand for [`Value::decode`].
    pub fn decode<S: IntoSource>(
        self, source: S,
    ) -> Result<Value, DecodeError<<S::Source as Source>::Error>> {
        Value::decode(source, self)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Ber
    }
}

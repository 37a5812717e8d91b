//! Newtype domain identifiers.
//!
//! Strings that carry meaning (an error signature, the program being
//! supervised) get their own type so one cannot be passed where the other is
//! expected, and so the non-empty invariant is checked once at construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// A substring that identifies a known, recoverable failure in raw stderr.
    ///
    /// Keys of the signature table document (e.g. `"SkuNotAvailable"`).
    ErrorSignature
}

string_id! {
    /// Executable launched for every attempt (e.g. `"terraform"`).
    ProgramName
}

impl ErrorSignature {
    /// Returns `true` if this signature occurs anywhere in `stderr`.
    pub fn matches(&self, stderr: &str) -> bool {
        stderr.contains(self.0.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one supervisor invocation.
///
/// Generated fresh for every CLI invocation and recorded on the root span so
/// all attempts of a single run can be correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_signature_is_rejected() {
        assert!(ErrorSignature::new("").is_none());
        assert!(ProgramName::new("").is_none());
    }

    #[test]
    fn signature_matches_substring() {
        let sig = ErrorSignature::new("disk full").unwrap();
        assert!(sig.matches("Error: disk full on /dev/sda1"));
        assert!(!sig.matches("Error: Disk Full"));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new_random(), RunId::new_random());
    }

    #[test]
    fn run_id_displays_as_its_uuid() {
        let id = RunId::new_random();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }
}

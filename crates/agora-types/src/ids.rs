//! Type-safe identifier wrappers around a 128-bit value.
//!
//! Posts and comments carry engine-generated identifiers. Each kind gets its
//! own newtype so a comment ID can never be passed where a post ID is
//! expected. The raw value comes from whatever identifier provider the
//! engine was built with; this module only fixes the representation.
//!
//! The canonical text form is exactly 32 lowercase hex digits. IDs serialize
//! to JSON as that string so dashboards never lose precision on 128-bit
//! integers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of hex digits in the canonical text form of an identifier.
pub const ID_HEX_LEN: usize = 32;

/// Error returned when an identifier string is not in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier {input:?}: expected {ID_HEX_LEN} hex digits")]
pub struct IdParseError {
    /// The rejected input.
    pub input: String,
}

fn parse_hex_id(input: &str) -> Result<u128, IdParseError> {
    if input.len() != ID_HEX_LEN || !input.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(IdParseError {
            input: input.to_owned(),
        });
    }
    u128::from_str_radix(input, 16).map_err(|_e| IdParseError {
        input: input.to_owned(),
    })
}

/// Generates a newtype wrapper around `u128` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(u128);

        impl $name {
            /// Wrap a raw identifier value.
            pub const fn from_raw(raw: u128) -> Self {
                Self(raw)
            }

            /// Return the inner raw value.
            pub const fn into_inner(self) -> u128 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:032x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex_id(s).map(Self)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

define_id! {
    /// Unique identifier for a post.
    PostId
}

define_id! {
    /// Unique identifier for a comment.
    CommentId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_fixed_width_hex() {
        let id = PostId::from_raw(0xff);
        let text = id.to_string();
        assert_eq!(text.len(), ID_HEX_LEN);
        assert!(text.ends_with("ff"));
        assert!(text.starts_with("000"));
    }

    #[test]
    fn parse_accepts_canonical_form() {
        let id = CommentId::from_raw(u128::MAX - 7);
        let parsed: Result<CommentId, _> = id.to_string().parse();
        assert_eq!(parsed, Ok(id));
    }

    #[test]
    fn parse_rejects_short_and_non_hex_input() {
        assert!("abc".parse::<PostId>().is_err());
        let bad = "z".repeat(ID_HEX_LEN);
        assert!(bad.parse::<PostId>().is_err());
        assert!("+0000000000000000000000000000001".parse::<PostId>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let id = PostId::from_raw(42);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{id}\""));
        let restored: Result<PostId, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(id));
    }
}

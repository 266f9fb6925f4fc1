//! Newtype identifiers for type-safe entity references.
//!
//! Catalog identities are opaque strings handed to us by the backend, so the
//! only rule enforced here is that they are not blank. Use the
//! `define_string_id!` macro to create a wrapper that cannot be mixed up with
//! identifiers of another entity type.

use rand::Rng;

/// Errors that can occur when parsing a string identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or only whitespace.
    #[error("{kind} cannot be empty")]
    Empty {
        /// Name of the identifier type that rejected the input.
        kind: &'static str,
    },
}

/// Macro to define a type-safe string identifier.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` that rejects blank values
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()`, `as_str()`, `into_inner()`
/// - `Display`, `FromStr`, `AsRef<str>` and `TryFrom<String>`
///
/// # Example
///
/// ```rust
/// # use sleek_shop_core::define_string_id;
/// define_string_id!(SkuId);
///
/// assert!(SkuId::parse("sku-1").is_ok());
/// assert!(SkuId::parse("   ").is_err());
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting blank input.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if the input is empty or whitespace.
            pub fn parse(value: impl Into<String>) -> Result<Self, $crate::types::id::IdError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err($crate::types::id::IdError::Empty {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(value))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::types::id::IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(ProductId);
define_string_id!(OrderNumber);

/// Number of characters in a generated order number.
pub const ORDER_NUMBER_LENGTH: usize = 9;

impl OrderNumber {
    /// Generate a fresh order number of uppercase base-36 characters.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let token = (0..ORDER_NUMBER_LENGTH)
            .map(|_| {
                char::from_digit(rng.random_range(0..36), 36)
                    .unwrap_or('0')
                    .to_ascii_uppercase()
            })
            .collect();
        Self(token)
    }
}

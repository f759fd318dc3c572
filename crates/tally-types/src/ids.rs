//! Type-safe identifier wrappers.
//!
//! Sites are identified by an opaque, caller-chosen string (a hostname or
//! a short slug). Wrapping it keeps site identifiers from being mixed up
//! with paths, referrers, and the other free-form string attributes an
//! event carries.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_str_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty after trimming whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_str_id! {
    /// Identifier of the site (tenant) an event belongs to.
    SiteId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn site_id_serializes_as_plain_string() {
        let id = SiteId::new("example.com");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"example.com\"");
    }

    #[test]
    fn blank_site_ids_are_detected() {
        assert!(SiteId::new("").is_blank());
        assert!(SiteId::new("   ").is_blank());
        assert!(!SiteId::new("blog").is_blank());
    }
}

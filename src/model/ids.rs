//! Client-generated identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! string_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, time-sortable identifier.
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, Ulid::new().to_string().to_lowercase()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(PageId, "page_");
string_id!(ComponentId, "comp_");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_prefixed_and_distinct() {
        let a = PageId::generate();
        let b = PageId::generate();
        assert!(a.as_str().starts_with("page_"));
        assert_eq!(a.as_str().len(), "page_".len() + 26);
        assert_ne!(a, b);
        assert!(ComponentId::generate().as_str().starts_with("comp_"));
    }

    #[test]
    fn test_legacy_ids_are_accepted_verbatim() {
        let id = PageId::from("page_k3j2h1g0f9e8d7");
        assert_eq!(id.to_string(), "page_k3j2h1g0f9e8d7");
    }
}

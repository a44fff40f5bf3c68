//! # Event and action identifiers.
//!
//! [`EventKey`] names a class of events, [`ActionKey`] names a bound action.
//! Both are cheap-to-clone wrappers over `Arc<str>` so they can be copied into
//! spawned tasks and operation records without reallocating.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Creates a key from any string-like value.
            pub fn new(key: impl Into<Arc<str>>) -> Self {
                Self(key.into())
            }

            /// Returns the key as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` for the empty key, which registration rejects.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self(Arc::from(s.as_str()))
            }
        }

        impl From<Arc<str>> for $name {
            fn from(s: Arc<str>) -> Self {
                Self(s)
            }
        }
    };
}

string_key!(
    /// Opaque identifier for an event class.
    EventKey
);

string_key!(
    /// Opaque identifier for a registered action; owns exactly one action and one admission set.
    ActionKey
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn keys_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(EventKey::from("user.created"), 1);
        assert_eq!(map.get("user.created"), Some(&1));
        assert!(EventKey::from("").is_empty());
        assert_eq!(ActionKey::new("send-mail").to_string(), "send-mail");
    }
}

//! Asset identity: stable ids and type tags.
//!
//! Both are a 64-bit FNV-1a hash of the authored string plus the string
//! itself for diagnostics and collision detection. Equality prefers the
//! strings when both sides carry one; hashing and ordering always use the
//! hash value. A zero hash denotes invalid.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::hash::{fnv1a64_str, Hash64};

macro_rules! hashed_name_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            value: Hash64,
            name: Option<Arc<str>>,
        }

        impl $name {
            /// Hash the authored string and keep it for diagnostics.
            pub fn from_name(s: &str) -> Self {
                Self {
                    value: fnv1a64_str(s),
                    name: Some(Arc::from(s)),
                }
            }

            /// Wrap a raw hash (no diagnostic string).
            pub const fn from_raw(value: Hash64) -> Self {
                Self { value, name: None }
            }

            pub fn value(&self) -> Hash64 {
                self.value
            }

            pub fn name(&self) -> Option<&str> {
                self.name.as_deref()
            }

            pub fn is_valid(&self) -> bool {
                self.value != 0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                // Both strings present: compare them, which also surfaces
                // hash collisions.
                match (&self.name, &other.name) {
                    (Some(a), Some(b)) => a == b,
                    _ => self.value == other.value,
                }
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.value.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.value.cmp(&other.value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.name {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{:#018x}", self.value),
                }
            }
        }
    };
}

hashed_name_type!(
    AssetId,
    "Stable identifier for one catalog asset, e.g. `ui.title`."
);
hashed_name_type!(AssetType, "Asset kind tag, e.g. `texture` or `font`.");

impl AssetType {
    pub fn texture() -> Self {
        Self::from_name("texture")
    }

    pub fn sound() -> Self {
        Self::from_name("sound")
    }

    pub fn font() -> Self {
        Self::from_name("font")
    }

    pub fn text() -> Self {
        Self::from_name("text")
    }

    pub fn binary() -> Self {
        Self::from_name("binary")
    }

    pub fn data() -> Self {
        Self::from_name("data")
    }

    pub fn invalid() -> Self {
        Self::from_raw(0)
    }
}

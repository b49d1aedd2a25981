//! Type identity for registrable types.
//!
//! Every type that can be registered in or resolved from an
//! [`Injector`](crate::Injector) implements [`Registrable`]. The tag is
//! normally filled in at build time by `#[derive(Registrable)]` (or
//! `#[registrable]` on a trait). Types without a tag fall back to their
//! intrinsic name, which is short and therefore not unique across a crate
//! graph.

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::warn;

/// A type that can be used as a registration key.
///
/// ```rust
/// use rinject::{Registrable, TypeKey};
///
/// struct Clock;
/// impl Registrable for Clock {
///     const TYPE_TAG: Option<&'static str> = Some("app::Clock");
/// }
///
/// assert_eq!(TypeKey::of::<Clock>().name(), "app::Clock");
/// ```
pub trait Registrable: 'static {
    /// Stable identifier assigned at build time. `None` means untagged.
    const TYPE_TAG: Option<&'static str> = None;
}

/// Identifier under which an implementation is registered.
///
/// Equality and hashing only look at the name: two types that map to the
/// same name are the same key.
#[derive(Clone)]
pub struct TypeKey {
    name: &'static str,
    tagged: bool,
}

impl TypeKey {
    /// Key of `T`, without any diagnostics.
    pub fn of<T: Registrable + ?Sized>() -> Self {
        match T::TYPE_TAG {
            Some(tag) => TypeKey { name: tag, tagged: true },
            None => TypeKey {
                name: intrinsic_name(type_name::<T>()),
                tagged: false,
            },
        }
    }

    /// Key built straight from a tag.
    pub const fn tagged(name: &'static str) -> Self {
        TypeKey { name, tagged: true }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the name came from a build-time tag rather than the fallback.
    pub fn is_tagged(&self) -> bool {
        self.tagged
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tagged {
            write!(f, "TypeKey({})", self.name)
        } else {
            write!(f, "TypeKey({}, untagged)", self.name)
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Computes keys for an injector and reports untagged types.
#[derive(Debug, Clone, Copy)]
pub struct TypeIdentity {
    warn_untagged: bool,
}

impl TypeIdentity {
    pub fn new(warn_untagged: bool) -> Self {
        TypeIdentity { warn_untagged }
    }

    /// Key of `T`, warning when it falls back to the intrinsic name.
    pub fn key_of<T: Registrable + ?Sized>(&self) -> TypeKey {
        let key = TypeKey::of::<T>();
        if !key.is_tagged() && self.warn_untagged {
            warn!(
                type_name = type_name::<T>(),
                fallback = key.name(),
                "cannot find type tag, make sure Registrable is derived; falling back to intrinsic name"
            );
        }
        key
    }
}

impl Default for TypeIdentity {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Last path segment of a type name, without generics or `dyn`.
pub(crate) fn intrinsic_name(full: &'static str) -> &'static str {
    let name = full.strip_prefix("dyn ").unwrap_or(full);
    let name = name.split(['<', ' ']).next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

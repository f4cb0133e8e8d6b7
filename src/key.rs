//! Type tokens and service keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a type as seen by the container.
///
/// Tokens are what the registration store is keyed by. A token names either
/// a concrete Rust type (including `dyn Trait` objects and closed generic
/// instantiations such as `Wrapper<i32>`), an unbound generic definition, or
/// the "all of" collection marker.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::TypeToken;
///
/// trait Plugin: Send + Sync {}
///
/// let concrete = TypeToken::of::<String>();
/// let plugin = TypeToken::of::<dyn Plugin>();
/// let all_plugins = TypeToken::all_of(plugin.clone());
/// let wrapper_def = TypeToken::open("Wrapper", 1);
///
/// assert_eq!(concrete, TypeToken::of::<String>());
/// assert_eq!(all_plugins.element(), Some(&plugin));
/// assert!(wrapper_def.is_open());
/// ```
#[derive(Debug, Clone)]
pub enum TypeToken {
    /// A `'static` Rust type with its `TypeId` and name for diagnostics.
    ///
    /// Equality and hashing use the `TypeId` only.
    Type(TypeId, &'static str),
    /// An unbound generic definition identified by name and arity.
    Open(&'static str, usize),
    /// Every registered implementation of the inner identity.
    AllOf(Arc<TypeToken>),
}

impl TypeToken {
    /// Token of a Rust type. Works for unsized trait objects too.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeToken::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Token of an unbound generic definition such as `Wrapper<>`.
    pub const fn open(name: &'static str, arity: usize) -> Self {
        TypeToken::Open(name, arity)
    }

    /// Collection marker for every registered implementation of `element`.
    pub fn all_of(element: TypeToken) -> Self {
        TypeToken::AllOf(Arc::new(element))
    }

    /// Collection marker for every registered implementation of `T`.
    pub fn all_of_type<T: ?Sized + 'static>() -> Self {
        Self::all_of(Self::of::<T>())
    }

    /// Whether this token is an unbound generic definition.
    pub fn is_open(&self) -> bool {
        matches!(self, TypeToken::Open(_, _))
    }

    /// Whether this token is the collection marker.
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeToken::AllOf(_))
    }

    /// Element identity of a collection marker.
    pub fn element(&self) -> Option<&TypeToken> {
        match self {
            TypeToken::AllOf(element) => Some(element),
            _ => None,
        }
    }

    /// Full human-readable name.
    pub fn display_name(&self) -> String {
        self.to_string()
    }

    /// Name without module path or generic arguments.
    ///
    /// ```rust
    /// use ferrous_ioc::TypeToken;
    ///
    /// struct Wrapper<T>(T);
    ///
    /// assert_eq!(TypeToken::of::<String>().short_name(), "String");
    /// assert_eq!(TypeToken::of::<Wrapper<u8>>().short_name(), "Wrapper");
    /// ```
    pub fn short_name(&self) -> String {
        match self {
            TypeToken::Type(_, name) => {
                let base = name.split('<').next().unwrap_or(name);
                let base = base.trim_start_matches("dyn ");
                base.rsplit("::").next().unwrap_or(base).to_string()
            }
            TypeToken::Open(name, _) => name.rsplit("::").next().unwrap_or(name).to_string(),
            TypeToken::AllOf(element) => format!("AllOf{}", element.short_name()),
        }
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::Type(_, name) => f.write_str(name),
            TypeToken::Open(name, arity) => {
                write!(f, "{}<{}>", name, ",".repeat(arity.saturating_sub(1)))
            }
            TypeToken::AllOf(element) => write!(f, "AllOf<{}>", element),
        }
    }
}

impl PartialEq for TypeToken {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeToken::Type(a, _), TypeToken::Type(b, _)) => a == b,
            (TypeToken::Open(a, arity_a), TypeToken::Open(b, arity_b)) => a == b && arity_a == arity_b,
            (TypeToken::AllOf(a), TypeToken::AllOf(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            TypeToken::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            TypeToken::Open(name, arity) => {
                1u8.hash(state);
                name.hash(state);
                arity.hash(state);
            }
            TypeToken::AllOf(element) => {
                2u8.hash(state);
                element.hash(state);
            }
        }
    }
}

/// Registration store key: the identity callers resolve by plus an optional
/// key that disambiguates several registrations of the same identity.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ServiceKey, TypeToken};
///
/// let plain = ServiceKey::of::<u32>();
/// let keyed = ServiceKey::keyed(TypeToken::of::<u32>(), "port");
///
/// assert_ne!(plain, keyed);
/// assert_eq!(keyed.key(), Some("port"));
/// assert_eq!(keyed.to_string(), "u32 with key 'port'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    identity: TypeToken,
    key: Option<String>,
}

impl ServiceKey {
    /// Creates a key from an identity and an optional disambiguating key.
    pub fn new(identity: TypeToken, key: Option<&str>) -> Self {
        Self {
            identity,
            key: key.map(str::to_owned),
        }
    }

    /// Unkeyed service key for `identity`.
    pub fn unkeyed(identity: TypeToken) -> Self {
        Self { identity, key: None }
    }

    /// Keyed service key for `identity`.
    pub fn keyed(identity: TypeToken, key: impl Into<String>) -> Self {
        Self {
            identity,
            key: Some(key.into()),
        }
    }

    /// Unkeyed service key for the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::unkeyed(TypeToken::of::<T>())
    }

    pub fn identity(&self) -> &TypeToken {
        &self.identity
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} with key '{}'", self.identity, key),
            None => write!(f, "{}", self.identity),
        }
    }
}

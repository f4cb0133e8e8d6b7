//! Error types for the dependency injection container.

use thiserror::Error;

/// Boxed error used for user-supplied failures such as disposal.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors.
///
/// Variants fall in three families: registration errors, resolution errors
/// (with container lookups reported as "not found"), and fatal errors raised
/// while tearing registrations down.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, ContainerOptions, DiError, Resolver};
///
/// struct Unknown;
///
/// let container = Container::builder()
///     .options(ContainerOptions::default().with_try_resolve_unregistered(false))
///     .build()
///     .unwrap();
///
/// match container.resolve::<Unknown>() {
///     Err(err @ DiError::NotRegistered(_)) => assert!(err.is_resolve_error()),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// The service key is already present in the store.
    #[error("{0} is already registered")]
    DuplicateRegistration(String),
    /// The concrete type offers no public constructor.
    #[error("{0} won't be resolved as it has no public constructors")]
    NoConstructor(String),
    /// No constructor matches an explicitly requested parameter list.
    #[error("could not register {service} with specified constructor ({params})")]
    ConstructorMismatch { service: String, params: String },
    /// An interface or abstract identity was registered without an implementation.
    #[error("{0} is an interface or abstract type; register a concrete type, factory or instance for it")]
    AbstractRegistration(String),
    /// `register_all_implementations_of` was called with a concrete type.
    #[error("{0} should be an interface or abstract type")]
    NotAbstract(String),
    /// The concrete type cannot stand in for the resolved identity.
    #[error("{concrete} is not assignable to {service}")]
    NotAssignable { concrete: String, service: String },
    /// The type catalog has no descriptor for the type.
    #[error("{0} is not described in the type catalog")]
    UnknownType(String),
    /// A container with this name already exists.
    #[error("a container named '{0}' already exists")]
    DuplicateContainerName(String),

    /// Nothing is registered and the unregistered fallback does not apply.
    #[error("the type {0} has not been registered; register it or enable unregistered resolution")]
    NotRegistered(String),
    /// The unregistered fallback found no implementation.
    #[error("could not resolve {0}: it is not registered and no implementations were found")]
    NoImplementation(String),
    /// The unregistered fallback found several implementations.
    #[error("could not resolve {service}: too many implementations were found: {}", .candidates.join("; "))]
    AmbiguousImplementation { service: String, candidates: Vec<String> },
    /// More than one constructor carries the preferred marker.
    #[error("{0} may only have one preferred constructor")]
    AmbiguousConstructor(String),
    /// A collection was requested but nothing is registered for its element.
    #[error("could not resolve {0}: there is nothing to collect")]
    EmptyCollection(String),
    /// An unbound generic definition was requested directly.
    #[error("{0} is an open generic definition and cannot be resolved directly")]
    OpenGeneric(String),
    /// The catalog has no closed instantiation for the requested arguments.
    #[error("could not close {definition} over [{arguments}]")]
    GenericClosure { definition: String, arguments: String },
    /// Circular dependency detected (includes path).
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum recursion depth exceeded.
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Type downcast failed.
    #[error("Type mismatch for: {0}")]
    TypeMismatch(String),
    /// A user factory or constructor reported a failure.
    #[error("factory for {service} failed: {message}")]
    Factory { service: String, message: String },

    /// Unregistering a key that is not in the store.
    #[error("can't find {0}")]
    NotFound(String),
    /// Named container lookup miss.
    #[error("couldn't retrieve container '{0}'; is the name correct?")]
    ContainerNotFound(String),

    /// Disposing a cached instance failed; the registration was still removed.
    #[error("error while disposing registered object of type {service}")]
    Disposal {
        service: String,
        #[source]
        source: BoxError,
    },
    /// Invalid container options document.
    #[error("invalid container options: {0}")]
    Config(String),
    /// Engine inconsistency; never caused by user input.
    #[error("internal resolution error: {0}")]
    Internal(String),
}

impl DiError {
    /// Convenience constructor for factories that want to report a failure.
    pub fn factory(service: impl Into<String>, message: impl Into<String>) -> Self {
        DiError::Factory {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Errors raised while registering.
    pub fn is_register_error(&self) -> bool {
        matches!(
            self,
            DiError::DuplicateRegistration(_)
                | DiError::NoConstructor(_)
                | DiError::ConstructorMismatch { .. }
                | DiError::AbstractRegistration(_)
                | DiError::NotAbstract(_)
                | DiError::NotAssignable { .. }
                | DiError::UnknownType(_)
                | DiError::DuplicateContainerName(_)
        )
    }

    /// Errors raised while resolving.
    pub fn is_resolve_error(&self) -> bool {
        matches!(
            self,
            DiError::NotRegistered(_)
                | DiError::NoImplementation(_)
                | DiError::AmbiguousImplementation { .. }
                | DiError::AmbiguousConstructor(_)
                | DiError::EmptyCollection(_)
                | DiError::OpenGeneric(_)
                | DiError::GenericClosure { .. }
                | DiError::Circular(_)
                | DiError::DepthExceeded(_)
                | DiError::TypeMismatch(_)
                | DiError::Factory { .. }
        )
    }

    /// Lookup misses for registrations and named containers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_) | DiError::ContainerNotFound(_))
    }

    /// Errors that indicate a failed teardown or an engine inconsistency.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DiError::Disposal { .. } | DiError::Internal(_))
    }
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;

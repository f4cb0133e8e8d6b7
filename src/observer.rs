//! Diagnostic observers for container traceability.
//!
//! Observers receive registration, synthesis and resolution events. The
//! container skips all bookkeeping when none are installed.

use std::sync::Arc;
use std::time::Duration;

use crate::{DiError, Lifecycle, ServiceKey};

/// How the engine came to create a registration on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisKind {
    /// A closed generic was built from an open generic registration.
    GenericClosure,
    /// An unregistered type was auto-registered.
    Unregistered,
    /// An "all of" collection record was created on demand.
    Collection,
}

/// Observer trait for container events.
///
/// All methods have empty default bodies so implementations only override
/// what they care about.
///
/// # Performance
///
/// Observer calls are made synchronously during registration and
/// resolution. Keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, DiObserver, Resolver, ServiceKey};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     resolved: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn resolved(&self, _service: &ServiceKey, _duration: Duration) {
///         self.resolved.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let container = Container::builder().observer(observer.clone()).build().unwrap();
/// container.register_instance(42u32, None).unwrap();
///
/// container.resolve::<u32>().unwrap();
/// assert_eq!(observer.resolved.load(Ordering::SeqCst), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a resolution starts.
    fn resolving(&self, _service: &ServiceKey) {}

    /// Called after a resolution succeeded.
    fn resolved(&self, _service: &ServiceKey, _duration: Duration) {}

    /// Called when a resolution failed.
    fn failed(&self, _service: &ServiceKey, _error: &DiError) {}

    /// Called after an explicit registration was stored.
    fn registered(&self, _service: &ServiceKey, _lifecycle: Lifecycle) {}

    /// Called after the engine stored a registration it created itself.
    fn synthesized(&self, _service: &ServiceKey, _kind: SynthesisKind) {}

    /// Called after a registration was removed.
    fn unregistered(&self, _service: &ServiceKey) {}
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    /// Returns true if any observers are registered.
    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, service: &ServiceKey) {
        for observer in &self.observers {
            observer.resolving(service);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, service: &ServiceKey, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(service, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, service: &ServiceKey, error: &DiError) {
        for observer in &self.observers {
            observer.failed(service, error);
        }
    }

    #[inline]
    pub(crate) fn registered(&self, service: &ServiceKey, lifecycle: Lifecycle) {
        for observer in &self.observers {
            observer.registered(service, lifecycle);
        }
    }

    #[inline]
    pub(crate) fn synthesized(&self, service: &ServiceKey, kind: SynthesisKind) {
        for observer in &self.observers {
            observer.synthesized(service, kind);
        }
    }

    #[inline]
    pub(crate) fn unregistered(&self, service: &ServiceKey) {
        for observer in &self.observers {
            observer.unregistered(service);
        }
    }
}

/// Built-in observer that forwards every event to `tracing`.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, TracingObserver};
/// use std::sync::Arc;
///
/// let container = Container::builder()
///     .observer(Arc::new(TracingObserver::new()))
///     .build()
///     .unwrap();
/// # drop(container);
/// ```
pub struct TracingObserver {
    prefix: String,
}

impl TracingObserver {
    /// Creates a new tracing observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-ioc".to_string(),
        }
    }

    /// Creates a new tracing observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, service: &ServiceKey) {
        tracing::trace!(prefix = %self.prefix, %service, "resolving");
    }

    fn resolved(&self, service: &ServiceKey, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, %service, ?duration, "resolved");
    }

    fn failed(&self, service: &ServiceKey, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, %service, %error, "resolution failed");
    }

    fn registered(&self, service: &ServiceKey, lifecycle: Lifecycle) {
        tracing::debug!(prefix = %self.prefix, %service, ?lifecycle, "registered");
    }

    fn synthesized(&self, service: &ServiceKey, kind: SynthesisKind) {
        tracing::debug!(prefix = %self.prefix, %service, ?kind, "synthesized registration");
    }

    fn unregistered(&self, service: &ServiceKey) {
        tracing::debug!(prefix = %self.prefix, %service, "unregistered");
    }
}

//! Disposal trait for resource cleanup.

use crate::error::BoxError;

/// Result of a disposal hook.
pub type DisposeResult = Result<(), BoxError>;

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (flushing
/// caches, closing connections). The hook runs when the registration holding
/// the cached instance is unregistered or its container is disposed. Hooks
/// are attached either through the type catalog
/// ([`TypeBuilder::disposable`](crate::TypeBuilder::disposable)) or through
/// [`RegistrationHandle::dispose_with`](crate::RegistrationHandle::dispose_with).
///
/// A failing hook does not keep the registration alive: it is removed and the
/// failure is reported as [`DiError::Disposal`](crate::DiError::Disposal).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Dispose, DisposeResult, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Cache {
///     flushed: AtomicBool,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) -> DisposeResult {
///         self.flushed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_instance(Cache { flushed: AtomicBool::new(false) }, None)
///     .unwrap()
///     .dispose_with::<Cache>();
///
/// let cache = container.resolve::<Cache>().unwrap();
/// container.unregister::<Cache>().unwrap();
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> DisposeResult;
}

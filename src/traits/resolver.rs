//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::DiResult;
use crate::registration::{downcast_collection, downcast_concrete, downcast_trait, AnyArc};
use crate::{ServiceKey, TypeToken};

/// Core resolver trait for object-safe service resolution.
///
/// Handles lookup, synthesis, activation and circular dependency detection.
/// Most users should use the [`Resolver`] trait instead, which provides typed
/// helpers built on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves a service by key and returns its type-erased representation.
    ///
    /// Concrete identities come back as `Arc<T>`, trait-object identities as
    /// `Arc<Arc<dyn Trait>>` and collections as an internal ordered sequence;
    /// the [`Resolver`] helpers unwrap each form.
    fn resolve_service(&self, service: &ServiceKey) -> DiResult<AnyArc>;
}

/// Typed resolution helpers.
///
/// Implemented for every [`ResolverCore`], so factories receiving a
/// [`Container`](crate::Container) can resolve their own dependencies.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Resolver};
/// use std::sync::Arc;
///
/// trait Database: Send + Sync {
///     fn connect(&self) -> &str;
/// }
///
/// struct PostgresDb;
/// impl Database for PostgresDb {
///     fn connect(&self) -> &str { "postgres://..." }
/// }
///
/// let container = Container::new();
/// container
///     .register_trait_instance::<dyn Database>(Arc::new(PostgresDb), None)
///     .unwrap();
///
/// let db = container.resolve_trait::<dyn Database>().unwrap();
/// assert_eq!(db.connect(), "postgres://...");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_concrete::<T>(self.resolve_service(&ServiceKey::of::<T>())?)
    }

    /// Resolves a keyed registration of a concrete service type.
    fn resolve_keyed<T: Send + Sync + 'static>(&self, key: &str) -> DiResult<Arc<T>> {
        downcast_concrete::<T>(self.resolve_service(&ServiceKey::keyed(TypeToken::of::<T>(), key))?)
    }

    /// Resolves a trait-object identity such as `dyn Service`.
    fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_service(&ServiceKey::of::<T>())?)
    }

    /// Resolves a keyed registration of a trait-object identity.
    fn resolve_trait_keyed<T: ?Sized + Send + Sync + 'static>(&self, key: &str) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_service(&ServiceKey::keyed(TypeToken::of::<T>(), key))?)
    }

    /// Resolves every registration of the trait `T`, in registration order.
    ///
    /// Registrations under any key count. When nothing is registered and
    /// unregistered resolution is enabled, every catalog implementation of
    /// `T` is registered first.
    fn resolve_all<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        let any = self.resolve_service(&ServiceKey::unkeyed(TypeToken::all_of_type::<T>()))?;
        let collection = downcast_collection(any)?;
        collection
            .iter()
            .cloned()
            .map(downcast_trait::<T>)
            .collect()
    }

    /// Resolves every registration of the concrete type `T`, in registration
    /// order.
    fn resolve_all_concrete<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        let any = self.resolve_service(&ServiceKey::unkeyed(TypeToken::all_of_type::<T>()))?;
        let collection = downcast_collection(any)?;
        collection
            .iter()
            .cloned()
            .map(downcast_concrete::<T>)
            .collect()
    }

    /// Resolves a concrete service, turning any failure into `None`.
    fn try_resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// Resolves a trait-object identity, turning any failure into `None`.
    fn try_resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve_trait::<T>().ok()
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// Use this inside factories when a missing dependency is a configuration
    /// bug rather than a recoverable condition.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    fn resolve_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.resolve::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait-object identity, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    fn resolve_trait_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.resolve_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

//! Registration and unregistration API.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{keep_first, Container};
use crate::engine::SynthesisEvents;
use crate::error::{DiError, DiResult};
use crate::registration::{AnyArc, ConstructionPlan, ConstructionRecord, RegistrationHandle};
use crate::{Lifecycle, ServiceKey, TypeKind, TypeToken};

impl Container {
    /// Registers `concrete` to be constructed when `resolved` (defaults to
    /// `concrete`) is requested under `key`.
    ///
    /// `constructor` selects a constructor by its exact parameter tokens; an
    /// empty slice selects the parameterless one. Without it the default
    /// selection rules apply. Passing an [`TypeToken::AllOf`] marker registers
    /// a collection; passing [`TypeToken::Open`] tokens registers an open
    /// generic (see [`register_open_generic`](Self::register_open_generic)).
    ///
    /// The registration starts out transient.
    pub fn register_type(
        &self,
        concrete: TypeToken,
        resolved: Option<TypeToken>,
        key: Option<&str>,
        constructor: Option<&[TypeToken]>,
    ) -> DiResult<RegistrationHandle> {
        let identity = resolved.unwrap_or_else(|| concrete.clone());
        let service = ServiceKey::new(identity, key);

        let record = match &concrete {
            TypeToken::AllOf(_) => {
                ensure_same_shape(&concrete, service.identity())?;
                self.collection_record(service, Lifecycle::Transient)
            }
            TypeToken::Open(_, _) => {
                ensure_same_shape(&concrete, service.identity())?;
                ConstructionRecord::new(
                    service,
                    concrete,
                    Lifecycle::Transient,
                    ConstructionPlan::OpenGeneric,
                    None,
                    self.inner.store.next_sequence(),
                )
            }
            TypeToken::Type(_, _) => {
                if !matches!(service.identity(), TypeToken::Type(_, _)) {
                    return Err(not_assignable(&concrete, service.identity()));
                }
                self.build_type_record(&concrete, service, Lifecycle::Transient, constructor)?
            }
        };
        self.store_registered(record)
    }

    /// Registers `T` as itself.
    pub fn register<T: Send + Sync + 'static>(&self) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::of::<T>(), None, None, None)
    }

    pub fn register_keyed<T: Send + Sync + 'static>(&self, key: &str) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::of::<T>(), None, Some(key), None)
    }

    /// Registers `T` to be served when `I` is requested.
    pub fn register_as<I: ?Sized + 'static, T: Send + Sync + 'static>(&self) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::of::<T>(), Some(TypeToken::of::<I>()), None, None)
    }

    pub fn register_as_keyed<I: ?Sized + 'static, T: Send + Sync + 'static>(
        &self,
        key: &str,
    ) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::of::<T>(), Some(TypeToken::of::<I>()), Some(key), None)
    }

    /// Registers `T` with the constructor whose parameters are exactly `params`.
    pub fn register_with_constructor<T: Send + Sync + 'static>(
        &self,
        params: &[TypeToken],
    ) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::of::<T>(), None, None, Some(params))
    }

    pub fn register_as_with_constructor<I: ?Sized + 'static, T: Send + Sync + 'static>(
        &self,
        key: Option<&str>,
        params: &[TypeToken],
    ) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::of::<T>(), Some(TypeToken::of::<I>()), key, Some(params))
    }

    /// Registers an open generic pairing such as `IRepository<> -> Repository<>`.
    ///
    /// Closed requests like `dyn IRepository<User>` are then served by the
    /// catalog's matching instantiation of `concrete`, with this
    /// registration's lifecycle.
    pub fn register_open_generic(
        &self,
        resolved: TypeToken,
        concrete: TypeToken,
        key: Option<&str>,
    ) -> DiResult<RegistrationHandle> {
        self.register_type(concrete, Some(resolved), key, None)
    }

    /// Registers a factory producing `T`. The factory receives the container
    /// that owns the registration.
    pub fn register_factory<T, F>(&self, key: Option<&str>, factory: F) -> DiResult<RegistrationHandle>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        let record = self.factory_record(
            ServiceKey::new(TypeToken::of::<T>(), key),
            Arc::new(move |container: &Container| factory(container).map(|value| Arc::new(value) as AnyArc)),
        );
        self.store_registered(record)
    }

    /// Registers a factory producing the trait object `I`.
    pub fn register_trait_factory<I, F>(&self, key: Option<&str>, factory: F) -> DiResult<RegistrationHandle>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<I>> + Send + Sync + 'static,
    {
        let record = self.factory_record(
            ServiceKey::new(TypeToken::of::<I>(), key),
            Arc::new(move |container: &Container| factory(container).map(|value| Arc::new(value) as AnyArc)),
        );
        self.store_registered(record)
    }

    /// Registers a factory returning an already type-erased instance.
    ///
    /// The instance must use the representation callers expect for
    /// `identity`: `Arc<T>` for concrete types, `Arc<Arc<dyn Trait>>` for
    /// trait objects.
    pub fn register_factory_token<F>(
        &self,
        identity: TypeToken,
        key: Option<&str>,
        factory: F,
    ) -> DiResult<RegistrationHandle>
    where
        F: Fn(&Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let record = self.factory_record(ServiceKey::new(identity, key), Arc::new(factory));
        self.store_registered(record)
    }

    /// Registers a pre-built instance; it is always served as a singleton.
    pub fn register_instance<T: Send + Sync + 'static>(
        &self,
        value: T,
        key: Option<&str>,
    ) -> DiResult<RegistrationHandle> {
        self.register_shared_instance(Arc::new(value), key)
    }

    /// Registers an instance the caller keeps a handle to.
    pub fn register_shared_instance<T: Send + Sync + 'static>(
        &self,
        value: Arc<T>,
        key: Option<&str>,
    ) -> DiResult<RegistrationHandle> {
        let record = self.instance_record(ServiceKey::new(TypeToken::of::<T>(), key), value);
        self.store_registered(record)
    }

    /// Registers a trait-object instance served for `I`.
    pub fn register_trait_instance<I: ?Sized + Send + Sync + 'static>(
        &self,
        value: Arc<I>,
        key: Option<&str>,
    ) -> DiResult<RegistrationHandle> {
        let record = self.instance_record(ServiceKey::new(TypeToken::of::<I>(), key), Arc::new(value));
        self.store_registered(record)
    }

    /// Registers the "all of `I`" collection explicitly.
    pub fn register_collection<I: ?Sized + 'static>(&self) -> DiResult<RegistrationHandle> {
        self.register_collection_token(TypeToken::of::<I>())
    }

    pub fn register_collection_token(&self, element: TypeToken) -> DiResult<RegistrationHandle> {
        self.register_type(TypeToken::all_of(element), None, None, None)
    }

    /// Registers every catalog implementation of the interface or abstract
    /// `identity`, each keyed by its short type name, plus the collection of
    /// all of them. Implementations sharing a short name are keyed by their
    /// full type name instead.
    ///
    /// Returns the handles in catalog order, collection last.
    pub fn register_all_implementations_of(
        &self,
        identity: TypeToken,
        lifecycle: Lifecycle,
    ) -> DiResult<Vec<RegistrationHandle>> {
        let info = self
            .catalog()
            .get(&identity)
            .ok_or_else(|| DiError::UnknownType(identity.to_string()))?;
        if info.kind() == TypeKind::Concrete {
            return Err(DiError::NotAbstract(identity.to_string()));
        }
        self.register_implementations(&identity, lifecycle, None)
    }

    pub fn register_all_implementations_of_trait<I: ?Sized + 'static>(
        &self,
        lifecycle: Lifecycle,
    ) -> DiResult<Vec<RegistrationHandle>> {
        self.register_all_implementations_of(TypeToken::of::<I>(), lifecycle)
    }

    /// Shared by the explicit API and the unregistered fallback. With `deferred`
    /// set, records another thread stored first are adopted instead of failing
    /// and observer notifications are queued there.
    pub(crate) fn register_implementations(
        &self,
        element: &TypeToken,
        lifecycle: Lifecycle,
        mut deferred: Option<&mut SynthesisEvents>,
    ) -> DiResult<Vec<RegistrationHandle>> {
        let implementations = self.catalog().implementations_of(element);
        let mut handles = Vec::with_capacity(implementations.len() + 1);

        // Short names shared by several implementations fall back to the full type name
        let mut short_names: HashMap<String, usize, ahash::RandomState> = HashMap::default();
        for implementation in implementations.iter() {
            *short_names.entry(implementation.token().short_name()).or_default() += 1;
        }

        for implementation in implementations.iter() {
            let short = implementation.token().short_name();
            let key = match short_names.get(&short) {
                Some(&count) if count > 1 => implementation.token().to_string(),
                _ => short,
            };
            let service = ServiceKey::keyed(element.clone(), key);
            let record = self.build_type_record(implementation.token(), service, lifecycle, None)?;
            handles.push(self.store(record, deferred.as_deref_mut())?);
        }

        let collection = self.collection_record(ServiceKey::unkeyed(TypeToken::all_of(element.clone())), lifecycle);
        handles.push(self.store(collection, deferred)?);
        Ok(handles)
    }

    fn store(&self, record: ConstructionRecord, deferred: Option<&mut SynthesisEvents>) -> DiResult<RegistrationHandle> {
        match deferred {
            Some(events) => Ok(RegistrationHandle::new(self.insert_synthesized(
                record,
                crate::SynthesisKind::Unregistered,
                events,
            ))),
            None => self.store_registered(record),
        }
    }

    fn factory_record(&self, service: ServiceKey, factory: crate::registration::Activator) -> ConstructionRecord {
        let concrete = service.identity().clone();
        let disposer = self.catalog().get(&concrete).and_then(|info| info.disposer());
        ConstructionRecord::new(
            service,
            concrete,
            Lifecycle::Transient,
            ConstructionPlan::Factory(factory),
            None,
            self.inner.store.next_sequence(),
        )
        .with_disposer(disposer)
    }

    fn instance_record(&self, service: ServiceKey, value: AnyArc) -> ConstructionRecord {
        let concrete = service.identity().clone();
        let disposer = self.catalog().get(&concrete).and_then(|info| info.disposer());
        ConstructionRecord::new(
            service,
            concrete,
            Lifecycle::Singleton,
            ConstructionPlan::Instance(value),
            None,
            self.inner.store.next_sequence(),
        )
        .with_disposer(disposer)
    }

    pub(crate) fn store_registered(&self, record: ConstructionRecord) -> DiResult<RegistrationHandle> {
        let record = self.inner.store.insert(Arc::new(record))?;
        debug!(
            container = %self.name(),
            service = %record.service,
            concrete = %record.concrete,
            lifecycle = ?record.lifecycle(),
            "registered"
        );
        self.observers().registered(&record.service, record.lifecycle());
        Ok(RegistrationHandle::new(record))
    }

    /// Removes the registration of `T` stored without a key.
    pub fn unregister<T: ?Sized + 'static>(&self) -> DiResult<()> {
        self.unregister_token(TypeToken::of::<T>(), None)
    }

    pub fn unregister_keyed<T: ?Sized + 'static>(&self, key: &str) -> DiResult<()> {
        self.unregister_token(TypeToken::of::<T>(), Some(key))
    }

    /// Removes `(identity, key)` from this container's store and disposes its
    /// cached instance.
    ///
    /// Fails with [`DiError::NotFound`] when nothing is stored under the key.
    /// A failing disposal is reported as [`DiError::Disposal`]; the
    /// registration is gone either way.
    pub fn unregister_token(&self, identity: TypeToken, key: Option<&str>) -> DiResult<()> {
        let service = ServiceKey::new(identity, key);
        let record = self.inner.store.remove(&service)?;
        record.retire();
        debug!(container = %self.name(), %service, "unregistered");
        self.observers().unregistered(&service);
        record.dispose().map(|_| ())
    }

    /// Removes every registration of this container, disposing each cached
    /// instance in registration order.
    pub fn unregister_all(&self) -> DiResult<()> {
        let mut first_error = None;
        for record in self.inner.store.remove_all() {
            record.retire();
            self.observers().unregistered(&record.service);
            if let Err(err) = record.dispose() {
                keep_first(&mut first_error, err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn ensure_same_shape(concrete: &TypeToken, identity: &TypeToken) -> DiResult<()> {
    let same = match (concrete, identity) {
        (TypeToken::AllOf(_), TypeToken::AllOf(_)) => concrete == identity,
        (TypeToken::Open(_, a), TypeToken::Open(_, b)) => a == b,
        _ => false,
    };
    if same {
        Ok(())
    } else {
        Err(not_assignable(concrete, identity))
    }
}

fn not_assignable(concrete: &TypeToken, identity: &TypeToken) -> DiError {
    DiError::NotAssignable {
        concrete: concrete.to_string(),
        service: identity.to_string(),
    }
}

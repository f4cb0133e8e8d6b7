//! Resolution engine: record lookup and synthesis, activator composition and
//! lifecycle handling.

use std::sync::{Arc, Weak};
use std::time::Instant;

use tracing::{debug, trace};

use crate::catalog::Arguments;
use crate::container::{Container, ContainerInner};
use crate::error::{DiError, DiResult};
use crate::internal::StackGuard;
use crate::registration::{Activator, AnyArc, Collection, ConstructionPlan, ConstructionRecord};
use crate::selector::select_constructor;
use crate::traits::ResolverCore;
use crate::{Lifecycle, ServiceKey, SynthesisKind, TypeKind, TypeToken};

/// Synthesis notifications queued while the synthesis lock is held.
pub(crate) type SynthesisEvents = Vec<(ServiceKey, SynthesisKind)>;

/// A dependency captured at compile time together with the container that
/// owns its record (`None` when that is the activating container itself).
struct Dependency {
    service: ServiceKey,
    record: Arc<ConstructionRecord>,
    owner: Option<Weak<ContainerInner>>,
}

impl Dependency {
    fn produce(&self, current: &Container) -> DiResult<AnyArc> {
        if self.record.is_retired() {
            return current.resolve_instrumented(&self.service);
        }
        match &self.owner {
            None => current.produce(&self.record),
            Some(owner) => match owner.upgrade() {
                Some(inner) => Container { inner }.produce(&self.record),
                None => current.resolve_instrumented(&self.service),
            },
        }
    }
}

impl Container {
    /// Builds a constructor-plan record for a described concrete type.
    pub(crate) fn build_type_record(
        &self,
        concrete: &TypeToken,
        service: ServiceKey,
        lifecycle: Lifecycle,
        constructor: Option<&[TypeToken]>,
    ) -> DiResult<ConstructionRecord> {
        let info = self
            .catalog()
            .get(concrete)
            .ok_or_else(|| DiError::UnknownType(concrete.to_string()))?;
        if info.kind() != TypeKind::Concrete {
            return Err(DiError::AbstractRegistration(concrete.to_string()));
        }

        let cast = if service.identity() == concrete {
            None
        } else {
            Some(info.upcast_to(service.identity()).ok_or_else(|| DiError::NotAssignable {
                concrete: concrete.to_string(),
                service: service.identity().to_string(),
            })?)
        };

        let ctor = select_constructor(&info, constructor, self.options().prefer_greediest_constructor)?;
        let dependencies = ctor.params().iter().map(|param| param.service_key()).collect();

        Ok(ConstructionRecord::new(
            service,
            concrete.clone(),
            lifecycle,
            ConstructionPlan::Constructor { ctor, dependencies },
            cast,
            self.inner.store.next_sequence(),
        )
        .with_disposer(info.disposer()))
    }

    pub(crate) fn collection_record(&self, service: ServiceKey, lifecycle: Lifecycle) -> ConstructionRecord {
        let identity = service.identity().clone();
        let element = identity.element().cloned().unwrap_or_else(|| identity.clone());
        ConstructionRecord::new(
            service,
            identity,
            lifecycle,
            ConstructionPlan::Collection { element },
            None,
            self.inner.store.next_sequence(),
        )
    }

    /// Stores a record the engine created itself; losing a race adopts the
    /// record that won.
    pub(crate) fn store_synthesized(&self, record: ConstructionRecord, kind: SynthesisKind) -> Arc<ConstructionRecord> {
        let mut events = Vec::new();
        let record = self.insert_synthesized(record, kind, &mut events);
        self.notify_synthesized(events);
        record
    }

    /// Like [`store_synthesized`](Self::store_synthesized), but queues the
    /// observer notification in `events` instead of firing it.
    pub(crate) fn insert_synthesized(
        &self,
        record: ConstructionRecord,
        kind: SynthesisKind,
        events: &mut SynthesisEvents,
    ) -> Arc<ConstructionRecord> {
        let (record, inserted) = self.inner.store.insert_or_get(Arc::new(record));
        if inserted {
            debug!(
                container = %self.name(),
                service = %record.service,
                concrete = %record.concrete,
                lifecycle = ?record.lifecycle(),
                ?kind,
                "synthesized registration"
            );
            events.push((record.service.clone(), kind));
        }
        record
    }

    pub(crate) fn notify_synthesized(&self, events: SynthesisEvents) {
        if events.is_empty() {
            return;
        }
        let observers = self.observers();
        for (service, kind) in &events {
            observers.synthesized(service, *kind);
        }
    }

    /// Finds or synthesizes the record for `service` and the container that
    /// owns it.
    pub(crate) fn find_record(&self, service: &ServiceKey) -> DiResult<(Arc<ConstructionRecord>, Container)> {
        if service.identity().is_open() {
            return Err(DiError::OpenGeneric(service.identity().to_string()));
        }

        if let Some(record) = self.inner.store.get(service) {
            return Ok((record, self.clone()));
        }

        if let Some(record) = self.close_generic(service)? {
            return Ok((record, self.clone()));
        }

        let options = self.options();
        if options.resolve_should_bubble_up {
            if let Some(parent) = self.parent() {
                trace!(container = %self.name(), parent = %parent.name(), %service, "bubbling up");
                return parent.find_record(service);
            }
        }

        if !options.try_resolve_unregistered {
            return Err(DiError::NotRegistered(service.to_string()));
        }
        let record = self.resolve_unregistered(service)?;
        Ok((record, self.clone()))
    }

    /// Closes an open generic registration over the arguments of `service`.
    fn close_generic(&self, service: &ServiceKey) -> DiResult<Option<Arc<ConstructionRecord>>> {
        let Some((definition, arguments)) = self.catalog().generic_shape(service.identity()) else {
            return Ok(None);
        };
        let template_key = ServiceKey::new(definition, service.key());
        let Some(template) = self.inner.store.get(&template_key) else {
            return Ok(None);
        };
        if !template.is_open_generic() {
            return Ok(None);
        }

        let closed = self.catalog().close(&template.concrete, &arguments).ok_or_else(|| {
            DiError::GenericClosure {
                definition: template.concrete.to_string(),
                arguments: arguments.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            }
        })?;
        let record = self.build_type_record(closed.token(), service.clone(), template.lifecycle(), None)?;
        Ok(Some(self.store_synthesized(record, SynthesisKind::GenericClosure)))
    }

    fn resolve_unregistered(&self, service: &ServiceKey) -> DiResult<Arc<ConstructionRecord>> {
        let identity = service.identity();

        if let TypeToken::AllOf(element) = identity {
            // Observers may resolve, so they run after the lock is released
            let mut events = Vec::new();
            let outcome = self.synthesize_collection(service, element, &mut events);
            self.notify_synthesized(events);
            return outcome;
        }

        let info = self
            .catalog()
            .get(identity)
            .ok_or_else(|| DiError::NotRegistered(service.to_string()))?;

        let record = match info.kind() {
            TypeKind::Interface | TypeKind::Abstract => {
                let implementations = self.catalog().implementations_of(identity);
                match implementations.len() {
                    0 => return Err(DiError::NoImplementation(identity.to_string())),
                    1 => self.build_type_record(
                        implementations[0].token(),
                        service.clone(),
                        Lifecycle::Singleton,
                        None,
                    )?,
                    _ => {
                        return Err(DiError::AmbiguousImplementation {
                            service: identity.to_string(),
                            candidates: implementations.iter().map(|i| i.token().to_string()).collect(),
                        })
                    }
                }
            }
            TypeKind::Concrete => self.build_type_record(identity, service.clone(), Lifecycle::Transient, None)?,
        };
        Ok(self.store_synthesized(record, SynthesisKind::Unregistered))
    }

    fn synthesize_collection(
        &self,
        service: &ServiceKey,
        element: &TypeToken,
        events: &mut SynthesisEvents,
    ) -> DiResult<Arc<ConstructionRecord>> {
        // Members must all be stored before any thread can store the collection
        let _synthesis = self.inner.synthesis.lock();
        if let Some(record) = self.inner.store.get(service) {
            return Ok(record);
        }
        if self.inner.store.records_for(element).is_empty() {
            self.register_implementations(element, Lifecycle::Singleton, Some(&mut *events))?;
        }
        let record = self.collection_record(service.clone(), Lifecycle::Singleton);
        Ok(self.insert_synthesized(record, SynthesisKind::Collection, events))
    }

    /// Composes the activator for `record`. Dependencies are looked up (and
    /// synthesized) now, so missing ones fail here rather than on first use.
    pub(crate) fn compile_record(&self, record: &ConstructionRecord) -> DiResult<Activator> {
        match &record.plan {
            ConstructionPlan::Constructor { ctor, dependencies } => {
                let mut captured = Vec::with_capacity(dependencies.len());
                for dependency in dependencies {
                    let (dependency_record, owner) = self.find_record(dependency)?;
                    captured.push(Dependency {
                        service: dependency.clone(),
                        record: dependency_record,
                        owner: (!owner.ptr_eq(self)).then(|| Arc::downgrade(&owner.inner)),
                    });
                }
                let ctor = ctor.clone();
                Ok(Arc::new(move |container: &Container| {
                    let mut values = Vec::with_capacity(captured.len());
                    for dependency in &captured {
                        values.push(dependency.produce(container)?);
                    }
                    ctor.invoke(&mut Arguments::new(values))
                }))
            }
            ConstructionPlan::Factory(factory) => Ok(factory.clone()),
            ConstructionPlan::Instance(value) => {
                let value = value.clone();
                Ok(Arc::new(move |_: &Container| Ok(value.clone())))
            }
            ConstructionPlan::Collection { element } => {
                let members: Vec<Dependency> = self
                    .inner
                    .store
                    .records_for(element)
                    .into_iter()
                    .map(|member| Dependency {
                        service: member.service.clone(),
                        record: member,
                        owner: None,
                    })
                    .collect();
                if members.is_empty() {
                    return Err(DiError::EmptyCollection(record.service.identity().to_string()));
                }
                Ok(Arc::new(move |container: &Container| {
                    let mut items = Vec::with_capacity(members.len());
                    for member in &members {
                        items.push(member.produce(container)?);
                    }
                    Ok(Arc::new(Collection::new(items)) as AnyArc)
                }))
            }
            ConstructionPlan::OpenGeneric => Err(DiError::Internal(format!(
                "{} is an open generic template and has no activator",
                record.service
            ))),
        }
    }

    /// Raw instance of `record`, honouring its lifecycle. Must be called on
    /// the container that owns the record.
    pub(crate) fn activate(&self, record: &ConstructionRecord) -> DiResult<AnyArc> {
        if let Some(instance) = record.cached() {
            return Ok(instance);
        }

        let _guard = StackGuard::enter(record as *const ConstructionRecord as usize, &record.service)?;
        let activator = match record.activator() {
            Some(activator) => activator,
            None => record.install_activator(self.compile_record(record)?),
        };

        trace!(container = %self.name(), service = %record.service, "activating");
        let value = activator(self)?;
        match record.lifecycle() {
            Lifecycle::Singleton => Ok(record.publish(value)),
            Lifecycle::Transient => Ok(value),
        }
    }

    /// Instance of `record` in the representation of its resolved identity.
    pub(crate) fn produce(&self, record: &ConstructionRecord) -> DiResult<AnyArc> {
        let raw = self.activate(record)?;
        record.present(raw)
    }

    pub(crate) fn resolve_instrumented(&self, service: &ServiceKey) -> DiResult<AnyArc> {
        let observers = self.observers();
        if !observers.has_observers() {
            return self.resolve_uninstrumented(service);
        }

        let started = Instant::now();
        observers.resolving(service);
        let result = self.resolve_uninstrumented(service);
        match &result {
            Ok(_) => observers.resolved(service, started.elapsed()),
            Err(err) => observers.failed(service, err),
        }
        result
    }

    fn resolve_uninstrumented(&self, service: &ServiceKey) -> DiResult<AnyArc> {
        let (record, owner) = self.find_record(service)?;
        owner.produce(&record)
    }

    /// Resolves `(identity, key)` to its type-erased representation.
    pub fn resolve_token(&self, identity: TypeToken, key: Option<&str>) -> DiResult<AnyArc> {
        self.resolve_instrumented(&ServiceKey::new(identity, key))
    }

    /// Builds activators for every local registration that has none yet.
    ///
    /// Open generic templates are skipped. Missing dependencies surface here
    /// instead of on first resolution.
    pub fn compile(&self) -> DiResult<()> {
        let records = self.inner.store.snapshot();
        let mut compiled = 0usize;
        for record in records {
            if record.is_open_generic() || record.is_compiled() {
                continue;
            }
            record.install_activator(self.compile_record(&record)?);
            compiled += 1;
        }
        debug!(container = %self.name(), compiled, "compiled registrations");
        Ok(())
    }
}

impl ResolverCore for Container {
    fn resolve_service(&self, service: &ServiceKey) -> DiResult<AnyArc> {
        self.resolve_instrumented(service)
    }
}

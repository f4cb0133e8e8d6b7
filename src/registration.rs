//! Construction records and registration handles.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::catalog::ConstructorInfo;
use crate::error::{DiError, DiResult};
use crate::traits::{Dispose, DisposeResult};
use crate::{Container, Lifecycle, ServiceKey, TypeToken};

/// Type-erased instance as stored and passed around by the engine.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Upcast = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type Disposer = Arc<dyn Fn(&AnyArc) -> DisposeResult + Send + Sync>;
pub(crate) type Activator = Arc<dyn Fn(&Container) -> DiResult<AnyArc> + Send + Sync>;

/// Ordered instances produced by an "all of" record.
pub(crate) struct Collection(Vec<AnyArc>);

impl Collection {
    pub(crate) fn new(items: Vec<AnyArc>) -> Self {
        Self(items)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, AnyArc> {
        self.0.iter()
    }
}

pub(crate) fn downcast_concrete<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(type_name::<T>().to_string()))
}

// Trait objects are stored as Arc<Arc<dyn Trait>>
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(type_name::<T>().to_string()))
}

pub(crate) fn downcast_collection(any: AnyArc) -> DiResult<Arc<Collection>> {
    any.downcast::<Collection>()
        .map_err(|_| DiError::TypeMismatch("collection".to_string()))
}

pub(crate) fn disposer_for<T: Dispose>() -> Disposer {
    Arc::new(|any: &AnyArc| match any.clone().downcast::<T>() {
        Ok(value) => value.dispose(),
        Err(_) => Ok(()),
    })
}

/// How a record produces its instance.
pub(crate) enum ConstructionPlan {
    Constructor {
        ctor: ConstructorInfo,
        dependencies: Vec<ServiceKey>,
    },
    Factory(Activator),
    Instance(AnyArc),
    Collection {
        element: TypeToken,
    },
    OpenGeneric,
}

impl ConstructionPlan {
    pub(crate) fn kind(&self) -> PlanKind {
        match self {
            ConstructionPlan::Constructor { .. } => PlanKind::Constructor,
            ConstructionPlan::Factory(_) => PlanKind::Factory,
            ConstructionPlan::Instance(_) => PlanKind::Instance,
            ConstructionPlan::Collection { .. } => PlanKind::Collection,
            ConstructionPlan::OpenGeneric => PlanKind::OpenGeneric,
        }
    }
}

/// Public view of a record's construction plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Constructor,
    Factory,
    Instance,
    Collection,
    OpenGeneric,
}

/// Everything the engine knows about producing one service.
pub(crate) struct ConstructionRecord {
    pub(crate) service: ServiceKey,
    pub(crate) concrete: TypeToken,
    pub(crate) plan: ConstructionPlan,
    pub(crate) cast: Option<Upcast>,
    pub(crate) sequence: u64,
    lifecycle: AtomicU8,
    disposer: RwLock<Option<Disposer>>,
    activator: OnceCell<Activator>,
    instance: RwLock<Option<AnyArc>>,
    retired: AtomicBool,
}

impl ConstructionRecord {
    pub(crate) fn new(
        service: ServiceKey,
        concrete: TypeToken,
        lifecycle: Lifecycle,
        plan: ConstructionPlan,
        cast: Option<Upcast>,
        sequence: u64,
    ) -> Self {
        // Pre-supplied instances always behave as singletons
        let (lifecycle, instance) = match &plan {
            ConstructionPlan::Instance(value) => (Lifecycle::Singleton, Some(value.clone())),
            _ => (lifecycle, None),
        };

        Self {
            service,
            concrete,
            plan,
            cast,
            sequence,
            lifecycle: AtomicU8::new(lifecycle.to_u8()),
            disposer: RwLock::new(None),
            activator: OnceCell::new(),
            instance: RwLock::new(instance),
            retired: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_disposer(self, disposer: Option<Disposer>) -> Self {
        *self.disposer.write() = disposer;
        self
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub(crate) fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle.to_u8(), Ordering::Release);
    }

    pub(crate) fn set_disposer(&self, disposer: Disposer) {
        *self.disposer.write() = Some(disposer);
    }

    pub(crate) fn is_open_generic(&self) -> bool {
        matches!(self.plan, ConstructionPlan::OpenGeneric)
    }

    pub(crate) fn activator(&self) -> Option<Activator> {
        self.activator.get().cloned()
    }

    /// Installs `built` unless another thread got there first; returns the
    /// activator that is now in place.
    pub(crate) fn install_activator(&self, built: Activator) -> Activator {
        self.activator.get_or_init(|| built).clone()
    }

    pub(crate) fn is_compiled(&self) -> bool {
        self.activator.get().is_some()
    }

    pub(crate) fn cached(&self) -> Option<AnyArc> {
        self.instance.read().clone()
    }

    /// Stores `value` as the singleton unless one is already stored; every
    /// caller gets the stored value back.
    pub(crate) fn publish(&self, value: AnyArc) -> AnyArc {
        if self.is_retired() {
            return value;
        }
        let mut slot = self.instance.write();
        match &*slot {
            Some(existing) => existing.clone(),
            None => {
                *slot = Some(value.clone());
                value
            }
        }
    }

    /// Converts a raw instance to the resolved identity's representation.
    pub(crate) fn present(&self, raw: AnyArc) -> DiResult<AnyArc> {
        match &self.cast {
            Some(cast) => cast(raw),
            None => Ok(raw),
        }
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Releases the cached instance, running the disposer if both exist.
    ///
    /// Returns whether a disposer ran.
    pub(crate) fn dispose(&self) -> DiResult<bool> {
        let Some(instance) = self.instance.write().take() else {
            return Ok(false);
        };
        let Some(disposer) = self.disposer.read().clone() else {
            return Ok(false);
        };
        disposer(&instance)
            .map(|_| true)
            .map_err(|source| DiError::Disposal {
                service: self.concrete.to_string(),
                source,
            })
    }

    pub(crate) fn holds_disposable(&self) -> bool {
        self.instance.read().is_some() && self.disposer.read().is_some()
    }

    pub(crate) fn info(&self) -> RegistrationInfo {
        RegistrationInfo {
            service: self.service.clone(),
            concrete: self.concrete.clone(),
            lifecycle: self.lifecycle(),
            plan: self.plan.kind(),
            compiled: self.is_compiled(),
            has_instance: self.instance.read().is_some(),
        }
    }
}

impl fmt::Debug for ConstructionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionRecord")
            .field("service", &self.service)
            .field("concrete", &self.concrete)
            .field("lifecycle", &self.lifecycle())
            .field("plan", &self.plan.kind())
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Diagnostic snapshot of one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub service: ServiceKey,
    pub concrete: TypeToken,
    pub lifecycle: Lifecycle,
    pub plan: PlanKind,
    /// Whether the activator has been built.
    pub compiled: bool,
    /// Whether a singleton or pre-supplied instance is cached.
    pub has_instance: bool,
}

/// Handle to a freshly stored registration.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Lifecycle};
///
/// struct Settings;
///
/// let container = Container::new();
/// let handle = container.register_factory::<Settings, _>(None, |_| Ok(Settings)).unwrap();
/// handle.single_instance();
/// assert_eq!(handle.lifecycle(), Lifecycle::Singleton);
/// ```
#[derive(Clone)]
pub struct RegistrationHandle {
    record: Arc<ConstructionRecord>,
}

impl RegistrationHandle {
    pub(crate) fn new(record: Arc<ConstructionRecord>) -> Self {
        Self { record }
    }

    /// Switches the registration to the singleton lifecycle.
    ///
    /// Instances already handed out as transients stay distinct; caching
    /// starts with the next resolution.
    pub fn single_instance(&self) -> &Self {
        self.record.set_lifecycle(Lifecycle::Singleton);
        self
    }

    /// Disposes the cached instance through `T`'s [`Dispose`] impl when the
    /// registration is removed. Instances that are not a `T` are ignored.
    pub fn dispose_with<T: Dispose>(&self) -> &Self {
        self.record.set_disposer(disposer_for::<T>());
        self
    }

    pub fn service_key(&self) -> &ServiceKey {
        &self.record.service
    }

    pub fn concrete(&self) -> &TypeToken {
        &self.record.concrete
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.record.lifecycle()
    }
}

impl fmt::Debug for RegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegistrationHandle").field(&self.record).finish()
    }
}

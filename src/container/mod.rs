//! Containers: named registration stores arranged in parent/child trees.
//!
//! A [`Container`] owns a registration store, a process-wide unique name,
//! a weak link to its parent and strong links to its children. Options, the
//! type catalog and observers are shared by the whole tree.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::TypeCatalog;
use crate::config::ContainerOptions;
use crate::error::{DiError, DiResult};
use crate::observer::Observers;
use crate::registration::RegistrationInfo;
use crate::store::RegistrationStore;
use crate::{ServiceKey, TypeToken};

mod builder;
mod directory;
mod register;

pub use builder::ContainerBuilder;

/// State shared by every container of one tree.
pub(crate) struct Shared {
    pub(crate) options: RwLock<ContainerOptions>,
    pub(crate) catalog: Arc<TypeCatalog>,
    pub(crate) observers: Observers,
}

impl Shared {
    pub(crate) fn new(options: ContainerOptions, catalog: Arc<TypeCatalog>, observers: Observers) -> Arc<Self> {
        Arc::new(Self {
            options: RwLock::new(options),
            catalog,
            observers,
        })
    }
}

pub(crate) struct ContainerInner {
    name: RwLock<String>,
    pub(crate) store: RegistrationStore,
    parent: Option<Weak<ContainerInner>>,
    children: Mutex<Vec<Container>>,
    /// Held while the unregistered fallback synthesizes a collection.
    pub(crate) synthesis: Mutex<()>,
    pub(crate) shared: Arc<Shared>,
}

/// Dependency injection container.
///
/// `Container` is a cheap handle: clones share the same store. It is
/// `Send + Sync` and every operation takes `&self`.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, ParamInfo, Resolver, TypeCatalog, TypeInfo};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// struct Scheduler {
///     clock: Arc<dyn Clock>,
/// }
///
/// let catalog = TypeCatalog::new();
/// catalog
///     .describe(TypeInfo::interface::<dyn Clock>())
///     .describe(
///         TypeInfo::concrete::<FixedClock>()
///             .constructor([], |_| Ok(FixedClock))
///             .implements::<dyn Clock, _>(|c| c as Arc<dyn Clock>),
///     )
///     .describe(
///         TypeInfo::concrete::<Scheduler>()
///             .constructor([ParamInfo::of::<dyn Clock>()], |args| {
///                 Ok(Scheduler { clock: args.take_trait::<dyn Clock>()? })
///             }),
///     );
///
/// let container = Container::with_catalog(Arc::new(catalog));
/// container.register_as::<dyn Clock, FixedClock>().unwrap().single_instance();
/// container.register::<Scheduler>().unwrap();
///
/// let scheduler = container.resolve::<Scheduler>().unwrap();
/// assert_eq!(scheduler.clock.now(), 42);
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates a root container with default options, an empty catalog and
    /// a generated name.
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(TypeCatalog::new()))
    }

    /// Creates a root container with default options over `catalog`.
    pub fn with_catalog(catalog: Arc<TypeCatalog>) -> Self {
        let shared = Shared::new(ContainerOptions::default(), catalog, Observers::new());
        let container = Self::allocate(Uuid::new_v4().to_string(), None, shared);
        directory::insert(&container);
        container
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn allocate(name: String, parent: Option<&Container>, shared: Arc<Shared>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                name: RwLock::new(name),
                store: RegistrationStore::new(),
                parent: parent.map(|p| Arc::downgrade(&p.inner)),
                children: Mutex::new(Vec::new()),
                synthesis: Mutex::new(()),
                shared,
            }),
        }
    }

    /// Allocates a container and claims `name` (or a generated one).
    pub(crate) fn create(name: Option<String>, parent: Option<&Container>, shared: Arc<Shared>) -> DiResult<Self> {
        let name = name.unwrap_or_else(|| Uuid::new_v4().to_string());
        let container = Self::allocate(name, parent, shared);
        directory::claim(&container.name(), &container)?;
        debug!(container = %container.name(), child = parent.is_some(), "container created");
        Ok(container)
    }

    /// Looks up a live container by name anywhere in the process.
    pub fn named(name: &str) -> DiResult<Container> {
        directory::lookup(name)
    }

    /// Same as [`Container::named`].
    pub fn get_container(&self, name: &str) -> DiResult<Container> {
        directory::lookup(name)
    }

    pub fn name(&self) -> String {
        self.inner.name.read().clone()
    }

    /// Renames the container. Fails if another live container owns `name`.
    pub fn set_name(&self, name: impl Into<String>) -> DiResult<()> {
        let name = name.into();
        directory::claim(&name, self)?;
        let old = std::mem::replace(&mut *self.inner.name.write(), name);
        if old != *self.inner.name.read() {
            directory::release(&old, Arc::as_ptr(&self.inner));
        }
        Ok(())
    }

    /// Live parent, if this is a child container.
    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    /// Children created through [`new_child_container`](Self::new_child_container)
    /// and not disposed yet.
    pub fn children(&self) -> Vec<Container> {
        self.inner.children.lock().clone()
    }

    /// Creates a child that shares options, catalog and observers and falls
    /// back to this container for lookups it can't satisfy.
    pub fn new_child_container(&self, name: Option<&str>) -> DiResult<Container> {
        let child = Self::create(name.map(str::to_owned), Some(self), self.inner.shared.clone())?;
        self.inner.children.lock().push(child.clone());
        Ok(child)
    }

    /// Snapshot of the tree's options.
    pub fn options(&self) -> ContainerOptions {
        *self.inner.shared.options.read()
    }

    /// Replaces the options for the whole tree.
    pub fn set_options(&self, options: ContainerOptions) {
        *self.inner.shared.options.write() = options;
    }

    /// Edits the options for the whole tree in place.
    pub fn configure(&self, edit: impl FnOnce(&mut ContainerOptions)) {
        edit(&mut self.inner.shared.options.write());
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.inner.shared.catalog
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.shared.observers
    }

    /// Whether `(identity, key)` is registered in this container's own store.
    pub fn is_registered_token(&self, identity: &TypeToken, key: Option<&str>) -> bool {
        self.inner.store.contains(&ServiceKey::new(identity.clone(), key))
    }

    /// Whether `T` is registered without a key in this container's own store.
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered_token(&TypeToken::of::<T>(), None)
    }

    /// Diagnostic snapshot of the local registrations in registration order.
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.inner.store.snapshot().iter().map(|record| record.info()).collect()
    }

    pub fn registration_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Human-readable listing of this container's registrations and, indented
    /// below them, those of its children.
    #[cfg(feature = "diagnostics")]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    #[cfg(feature = "diagnostics")]
    fn dump_into(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;

        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{}container '{}'", indent, self.name());
        for info in self.registrations() {
            let _ = writeln!(
                out,
                "{}  {} -> {} [{:?}, {:?}{}{}]",
                indent,
                info.service,
                info.concrete,
                info.lifecycle,
                info.plan,
                if info.compiled { ", compiled" } else { "" },
                if info.has_instance { ", cached" } else { "" },
            );
        }
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }

    /// Whether both handles point at the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Disposes children depth-first, then unregisters everything here and
    /// releases the name.
    ///
    /// Every registration is removed even when disposal hooks fail; the
    /// first failure is returned.
    pub fn dispose(&self) -> DiResult<()> {
        let children = std::mem::take(&mut *self.inner.children.lock());
        let mut first_error: Option<DiError> = None;

        for child in children {
            if let Err(err) = child.dispose() {
                keep_first(&mut first_error, err);
            }
        }
        if let Err(err) = self.unregister_all() {
            keep_first(&mut first_error, err);
        }

        if let Some(parent) = self.parent() {
            parent.inner.children.lock().retain(|c| !c.ptr_eq(self));
        }
        let name = self.name();
        directory::release(&name, Arc::as_ptr(&self.inner));
        debug!(container = %name, "container disposed");

        first_error.map_or(Ok(()), Err)
    }
}

pub(crate) fn keep_first(slot: &mut Option<DiError>, err: DiError) {
    if slot.is_none() {
        *slot = Some(err);
    } else {
        warn!(error = %err, "additional disposal failure");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("registrations", &self.inner.store.len())
            .field("children", &self.inner.children.lock().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let name = self.name.get_mut().clone();
        directory::release(&name, self as *const ContainerInner);

        let undisposed = self
            .store
            .snapshot()
            .iter()
            .filter(|record| record.holds_disposable())
            .count();
        if undisposed > 0 {
            warn!(
                container = %name,
                undisposed,
                "container dropped with undisposed instances; call dispose() before dropping"
            );
        }
    }
}

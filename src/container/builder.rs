//! Container builder.

use std::sync::Arc;

use super::{Container, Shared};
use crate::catalog::TypeCatalog;
use crate::config::ContainerOptions;
use crate::error::DiResult;
use crate::observer::{DiObserver, Observers};

/// Assembles a root container.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, ContainerOptions, TracingObserver, TypeCatalog};
/// use std::sync::Arc;
///
/// let container = Container::builder()
///     .name("builder-doc-example")
///     .configure(|options| options.prefer_greediest_constructor = false)
///     .catalog(Arc::new(TypeCatalog::new()))
///     .observer(Arc::new(TracingObserver::new()))
///     .build()
///     .unwrap();
///
/// assert_eq!(container.name(), "builder-doc-example");
/// assert!(!container.options().prefer_greediest_constructor);
/// container.dispose().unwrap();
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    name: Option<String>,
    options: ContainerOptions,
    catalog: Option<Arc<TypeCatalog>>,
    observers: Observers,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique name; a UUID is generated when omitted.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn configure(mut self, edit: impl FnOnce(&mut ContainerOptions)) -> Self {
        edit(&mut self.options);
        self
    }

    /// Type catalog shared with every child; an empty one is used otherwise.
    pub fn catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Fails with [`DiError::DuplicateContainerName`](crate::DiError::DuplicateContainerName)
    /// when the requested name is taken.
    pub fn build(self) -> DiResult<Container> {
        let catalog = self.catalog.unwrap_or_else(|| Arc::new(TypeCatalog::new()));
        let shared = Shared::new(self.options, catalog, self.observers);
        Container::create(self.name, None, shared)
    }
}

//! Process-wide default container.
//!
//! Nothing in the crate reaches for this container implicitly; it exists for
//! applications that want one well-known container without threading a
//! handle everywhere. Initialise it once at startup and tear it down at
//! shutdown.
//!
//! ```
//! use ferrous_ioc::{global, Container, Resolver};
//!
//! global::init(Container::builder()).unwrap();
//! global::get().unwrap().register_instance(String::from("ready"), None).unwrap();
//!
//! let status = global::get().unwrap().resolve::<String>().unwrap();
//! assert_eq!(status.as_str(), "ready");
//!
//! global::teardown().unwrap();
//! assert!(global::get().is_err());
//! ```

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::container::{Container, ContainerBuilder};
use crate::error::{DiError, DiResult};

/// Name the default container is registered under.
pub const DEFAULT_CONTAINER_NAME: &str = "ferrous-ioc.default";

static DEFAULT: Lazy<RwLock<Option<Container>>> = Lazy::new(|| RwLock::new(None));

/// Builds the default container from `builder`, disposing any previous one.
///
/// The builder's name is replaced with [`DEFAULT_CONTAINER_NAME`].
pub fn init(builder: ContainerBuilder) -> DiResult<Container> {
    let previous = DEFAULT.write().take();
    if let Some(previous) = previous {
        previous.dispose()?;
    }

    let container = builder.name(DEFAULT_CONTAINER_NAME).build()?;
    *DEFAULT.write() = Some(container.clone());
    debug!(container = DEFAULT_CONTAINER_NAME, "default container initialised");
    Ok(container)
}

/// Handle to the default container.
pub fn get() -> DiResult<Container> {
    DEFAULT
        .read()
        .clone()
        .ok_or_else(|| DiError::ContainerNotFound(DEFAULT_CONTAINER_NAME.to_string()))
}

pub fn is_initialized() -> bool {
    DEFAULT.read().is_some()
}

/// Disposes and forgets the default container. A no-op when none exists.
pub fn teardown() -> DiResult<()> {
    let current = DEFAULT.write().take();
    match current {
        Some(container) => {
            debug!(container = DEFAULT_CONTAINER_NAME, "default container torn down");
            container.dispose()
        }
        None => Ok(()),
    }
}

//! Service lifecycle definitions.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Lifecycle controlling whether a registration's instance is shared.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Lifecycle, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let container = Container::new();
/// let handle = container.register_factory::<Clock, _>(None, |_| Ok(Clock)).unwrap();
/// assert_eq!(handle.lifecycle(), Lifecycle::Transient);
///
/// handle.single_instance();
/// let a = container.resolve::<Clock>().unwrap();
/// let b = container.resolve::<Clock>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub enum Lifecycle {
    /// New instance per resolution, never cached.
    #[default]
    Transient,
    /// Created on first resolution, then cached on the registration until it
    /// is unregistered.
    Singleton,
}

impl Lifecycle {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Lifecycle::Transient => 0,
            Lifecycle::Singleton => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Lifecycle::Singleton,
            _ => Lifecycle::Transient,
        }
    }
}

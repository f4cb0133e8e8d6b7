//! Process-wide directory of live containers by name.

use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::{Container, ContainerInner};
use crate::error::{DiError, DiResult};

// Weak entries so naming a container never keeps it alive. Entries are only
// inspected through `strong_count`/`as_ptr` while a shard is locked; upgrading
// there could run `ContainerInner::drop`, which re-enters the map.
static DIRECTORY: Lazy<DashMap<String, Weak<ContainerInner>, ahash::RandomState>> =
    Lazy::new(|| DashMap::with_hasher(ahash::RandomState::new()));

/// Records `container` under `name` unless another live container owns it.
pub(super) fn claim(name: &str, container: &Container) -> DiResult<()> {
    let ptr = Arc::as_ptr(&container.inner);
    match DIRECTORY.entry(name.to_string()) {
        Entry::Occupied(mut occupied) => {
            let current = occupied.get();
            if current.strong_count() > 0 && current.as_ptr() != ptr {
                return Err(DiError::DuplicateContainerName(name.to_string()));
            }
            occupied.insert(Arc::downgrade(&container.inner));
            Ok(())
        }
        Entry::Vacant(vacant) => {
            vacant.insert(Arc::downgrade(&container.inner));
            Ok(())
        }
    }
}

/// Records a container whose name is freshly generated.
pub(super) fn insert(container: &Container) {
    DIRECTORY.insert(container.name(), Arc::downgrade(&container.inner));
}

/// Forgets `name` if it still belongs to the container at `ptr`.
pub(super) fn release(name: &str, ptr: *const ContainerInner) {
    DIRECTORY.remove_if(name, |_, weak| std::ptr::eq(weak.as_ptr(), ptr));
}

pub(super) fn lookup(name: &str) -> DiResult<Container> {
    let weak = DIRECTORY.get(name).map(|entry| entry.value().clone());
    weak.and_then(|weak| weak.upgrade())
        .map(|inner| Container { inner })
        .ok_or_else(|| DiError::ContainerNotFound(name.to_string()))
}

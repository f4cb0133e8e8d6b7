//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::ServiceKey;

pub(crate) const MAX_DEPTH: usize = 1024;

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

// Entries are keyed by record address: a child record wrapping the parent's
// record of the same service is not a cycle.
#[derive(Default)]
struct ResolutionTls {
    stack: Vec<(usize, ServiceKey)>,
}

/// Marks a service as being activated on this thread until dropped.
pub(crate) struct StackGuard {
    _private: (),
}

impl StackGuard {
    /// Pushes the record identified by `record` on the resolution stack.
    ///
    /// Fails with the full path (first occurrence through the repeat) when
    /// that record is already being activated further up the stack.
    pub(crate) fn enter(record: usize, service: &ServiceKey) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();

            // Circular detection BEFORE pushing the new record
            if let Some(start) = tls.stack.iter().position(|(id, _)| *id == record) {
                let mut path: Vec<String> = tls.stack[start..].iter().map(|(_, s)| s.to_string()).collect();
                path.push(service.to_string());
                return Err(DiError::Circular(path));
            }

            if tls.stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(MAX_DEPTH));
            }

            tls.stack.push((record, service.clone()));
            Ok(StackGuard { _private: () })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().stack.pop();
        });
    }
}

use alloc::{collections::vec_deque::VecDeque, sync::Arc};
use core::mem;

use crate::any::{self, RcAny, TypeInfo};

/// Resolved instances owned by a scope or by the container's singleton store
#[derive(Default)]
pub(crate) struct Cache {
    pub(crate) map: any::Map,
    pub(crate) resolved: ResolvedSet,
}

impl Cache {
    #[inline]
    pub(crate) fn insert_rc<T: Send + Sync + 'static>(&mut self, type_info: TypeInfo, value: Arc<T>) -> Option<Arc<T>> {
        self.map.insert(type_info, value).and_then(|boxed| boxed.downcast().ok())
    }

    #[must_use]
    pub(crate) fn get<T: Send + Sync + 'static>(&self, type_info: &TypeInfo) -> Option<Arc<T>> {
        self.map.get(type_info).and_then(|boxed| boxed.clone().downcast().ok())
    }

    #[inline]
    pub(crate) fn push_resolved(&mut self, resolved: Resolved) {
        self.resolved.push(resolved);
    }

    #[inline]
    #[must_use]
    pub(crate) fn take_resolved_set(&mut self) -> ResolvedSet {
        mem::take(&mut self.resolved)
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.resolved.0.clear();
    }
}

/// Instance that has a finalizer and must be released when its scope is closed
#[derive(Clone)]
pub(crate) struct Resolved {
    pub(crate) type_info: TypeInfo,
    pub(crate) dependency: RcAny,
}

/// Tracked instances in order of creation
#[derive(Default, Clone)]
pub(crate) struct ResolvedSet(pub(crate) VecDeque<Resolved>);

impl ResolvedSet {
    pub(crate) fn push(&mut self, resolved: Resolved) {
        self.0.push_back(resolved);
    }

    /// Last created, first released
    pub(crate) fn pop_last(&mut self) -> Option<Resolved> {
        self.0.pop_back()
    }
}

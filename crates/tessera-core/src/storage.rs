use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::{Arc, Weak};

/// How a [`Storage`] sizes its capacity when it is allocated or grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Capacity equals length.
    #[default]
    Exact,
    /// Capacity is `factor` times the requested length, leaving spare room
    /// that structural operations reuse as scratch space.
    Amortized { factor: usize },
}

impl GrowthPolicy {
    /// Capacity to allocate for `len` elements.
    pub fn capacity_for(&self, len: usize) -> usize {
        match *self {
            GrowthPolicy::Exact => len,
            GrowthPolicy::Amortized { factor } => len.saturating_mul(factor.max(1)),
        }
    }
}

/// Shared, reference-counted flat element buffer.
///
/// Cloning a `Storage` shares the buffer. Arrays and their views hold clones
/// of the same `Storage`; the buffer is released with the last of them.
pub struct Storage<T> {
    inner: Arc<RwLock<Vec<T>>>,
    policy: GrowthPolicy,
}

impl<T> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            policy: self.policy,
        }
    }
}

impl<T> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.read();
        f.debug_struct("Storage")
            .field("len", &guard.len())
            .field("capacity", &guard.capacity())
            .field("refs", &Arc::strong_count(&self.inner))
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> Storage<T> {
    pub fn from_vec(mut data: Vec<T>, policy: GrowthPolicy) -> Self {
        let capacity = policy.capacity_for(data.len());
        data.reserve_exact(capacity.saturating_sub(data.len()));
        Self {
            inner: Arc::new(RwLock::new(data)),
            policy,
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.inner.write()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// No other array or view shares this buffer.
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    pub fn ptr_eq(&self, other: &Storage<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakStorage<T> {
        WeakStorage {
            inner: Arc::downgrade(&self.inner),
            policy: self.policy,
        }
    }

    /// Replaces the buffer contents, keeping every sharer attached.
    pub fn replace(&self, mut data: Vec<T>) {
        let capacity = self.policy.capacity_for(data.len());
        data.reserve_exact(capacity.saturating_sub(data.len()));
        *self.inner.write() = data;
    }

    /// Reserves room for `additional` more elements according to the policy.
    pub(crate) fn reserve(&self, guard: &mut Vec<T>, additional: usize) {
        let wanted = guard.len().saturating_add(additional);
        if wanted > guard.capacity() {
            let capacity = self.policy.capacity_for(wanted);
            guard.reserve_exact(capacity - guard.len());
        }
    }
}

impl<T: Clone> Storage<T> {
    /// Copies the buffer into a new, unshared storage.
    pub fn deep_clone(&self) -> Self {
        Self::from_vec(self.inner.read().clone(), self.policy)
    }
}

/// Non-owning handle to a [`Storage`].
pub struct WeakStorage<T> {
    inner: Weak<RwLock<Vec<T>>>,
    policy: GrowthPolicy,
}

impl<T> Clone for WeakStorage<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            policy: self.policy,
        }
    }
}

impl<T> WeakStorage<T> {
    pub fn upgrade(&self) -> Option<Storage<T>> {
        self.inner.upgrade().map(|inner| Storage {
            inner,
            policy: self.policy,
        })
    }
}

use crate::{
    ArrayError, Descriptor, GrowthPolicy, Indexer, Interval, Shape, Squeeze, Storage,
    WeakStorage,
};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::{Arc, Weak};

#[cfg(feature = "rand")]
use {
    rand::distributions::{Distribution, Standard},
    rand_distr::StandardNormal,
};

/// Layout and buffer an array had when a view was last taken from it.
struct Snapshot<T> {
    info: Descriptor,
    storage: Option<WeakStorage<T>>,
}

type Anchor<T> = Arc<RwLock<Snapshot<T>>>;

fn new_anchor<T>() -> Anchor<T> {
    Arc::new(RwLock::new(Snapshot {
        info: Descriptor::default(),
        storage: None,
    }))
}

/// Back-reference from a view to the array it was taken from.
///
/// `parent` is the array the view was taken from, `root` the first array of
/// the chain. Neither keeps anything alive.
pub(crate) struct Creator<T> {
    parent: Weak<RwLock<Snapshot<T>>>,
    root: Weak<RwLock<Snapshot<T>>>,
}

impl<T> Clone for Creator<T> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            root: self.root.clone(),
        }
    }
}

impl<T> Default for Creator<T> {
    fn default() -> Self {
        Self {
            parent: Weak::new(),
            root: Weak::new(),
        }
    }
}

impl<T> Creator<T> {
    fn resolve(&self) -> Option<Anchor<T>> {
        self.parent.upgrade().or_else(|| self.root.upgrade())
    }

    pub(crate) fn same(&self, other: &Creator<T>) -> bool {
        match (self.resolve(), other.resolve()) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            _ => false,
        }
    }
}

/// # Array
///
/// An N-dimensional array: a [`Descriptor`] over a shared [`Storage`].
///
/// Views (slices, transpositions, pages) share the storage of the array they
/// are taken from, so element writes through one are observed through the
/// other. Views also remember the array they were taken from, see
/// [`Array::creator`].
///
/// Element writes take `&self` and go through the storage lock. Operations
/// that change the layout of `self` take `&mut self` and never affect the
/// layout of other arrays sharing the storage.
pub struct Array<T> {
    info: Descriptor,
    storage: Option<Storage<T>>,
    anchor: Anchor<T>,
    creator: Creator<T>,
}

impl<T> Array<T> {
    /// An array with no dims and no storage.
    pub fn empty() -> Self {
        Self::from_parts(Descriptor::default(), None)
    }

    /// Wraps an existing descriptor and storage. Zero-element layouts collapse
    /// to the empty array.
    pub(crate) fn from_parts(info: Descriptor, storage: Option<Storage<T>>) -> Self {
        let (info, storage) = if info.total() == 0 {
            (Descriptor::default(), None)
        } else {
            (info, storage)
        };
        Self {
            info,
            storage,
            anchor: new_anchor(),
            creator: Creator::default(),
        }
    }

    /// Creates a new array from a chunk of data laid out row-major.
    ///
    /// Fails if the data length does not match the element count of `shape`.
    pub fn from_data(shape: impl Into<Shape>, data: impl Into<Vec<T>>) -> Result<Self, ArrayError> {
        Self::from_data_with_policy(shape, data, GrowthPolicy::default())
    }

    pub fn from_data_with_policy(
        shape: impl Into<Shape>,
        data: impl Into<Vec<T>>,
        policy: GrowthPolicy,
    ) -> Result<Self, ArrayError> {
        let shape = shape.into();
        let data = data.into();
        let info = Descriptor::new(shape)?;
        if info.total() != data.len() {
            return Err(ArrayError::invalid(format!(
                "{} elements supplied for dims {:?} ({} elements)",
                data.len(),
                info.shape(),
                info.total()
            )));
        }
        if data.is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self::from_parts(info, Some(Storage::from_vec(data, policy))))
    }

    /// Each element is produced by `f` from its logical index.
    pub fn from_fn(shape: impl Into<Shape>, f: impl FnMut(usize) -> T) -> Result<Self, ArrayError> {
        let shape = shape.into();
        let total = shape.checked_numel()?;
        Self::from_data(shape, (0..total).map(f).collect::<Vec<_>>())
    }

    pub fn info(&self) -> &Descriptor {
        &self.info
    }

    pub fn shape(&self) -> &Shape {
        self.info.shape()
    }

    pub fn dims(&self) -> &[usize] {
        self.info.dims()
    }

    pub fn rank(&self) -> usize {
        self.info.rank()
    }

    pub fn total(&self) -> usize {
        self.info.total()
    }

    /// No dims, no elements.
    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    pub fn storage(&self) -> Option<&Storage<T>> {
        self.storage.as_ref()
    }

    pub fn policy(&self) -> GrowthPolicy {
        self.storage
            .as_ref()
            .map(Storage::policy)
            .unwrap_or_default()
    }

    /// Both arrays address the same storage.
    pub fn shares_storage(&self, other: &Array<T>) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub(crate) fn buffer(&self) -> Result<&Storage<T>, ArrayError> {
        self.storage
            .as_ref()
            .ok_or_else(|| ArrayError::invalid("array has no storage"))
    }

    fn sync_anchor(&self) {
        let mut snapshot = self.anchor.write();
        snapshot.info = self.info.clone();
        snapshot.storage = self.storage.as_ref().map(Storage::downgrade);
    }

    /// Back-reference handed to views of `self`.
    pub(crate) fn derive_creator(&self) -> Creator<T> {
        self.sync_anchor();
        let parent = Arc::downgrade(&self.anchor);
        let root = if self.creator.root.strong_count() > 0 {
            self.creator.root.clone()
        } else if self.creator.parent.strong_count() > 0 {
            self.creator.parent.clone()
        } else {
            parent.clone()
        };
        Creator { parent, root }
    }

    pub(crate) fn creator_link(&self) -> &Creator<T> {
        &self.creator
    }

    /// A view of `self` through `info`.
    pub(crate) fn view(&self, info: Descriptor) -> Self {
        let mut view = Self::from_parts(info, self.storage.clone());
        view.creator = self.derive_creator();
        view
    }

    /// Replaces the layout of `self`, keeping its identity for views taken from it.
    pub(crate) fn relayout(&mut self, info: Descriptor, storage: Option<Storage<T>>) {
        let (info, storage) = if info.total() == 0 {
            (Descriptor::default(), None)
        } else {
            (info, storage)
        };
        self.info = info;
        self.storage = storage;
        if Arc::weak_count(&self.anchor) > 0 {
            self.sync_anchor();
        }
    }

    /// Whether the array this one was taken from is still alive.
    pub fn has_creator(&self) -> bool {
        self.creator.resolve().is_some()
    }

    /// The array this one was taken from, if it is still alive.
    ///
    /// When the direct creator is gone the first array of the chain is tried.
    /// The returned array shares storage with the creator.
    pub fn creator(&self) -> Option<Array<T>> {
        let anchor = self.creator.resolve()?;
        let snapshot = anchor.read();
        let storage = match &snapshot.storage {
            Some(weak) => Some(weak.upgrade()?),
            None => None,
        };
        Some(Self::from_parts(snapshot.info.clone(), storage))
    }

    /// Storage offsets of the elements in logical order.
    pub fn indices(&self) -> Indexer {
        Indexer::begin(&self.info)
    }

    /// Clone of the element at logical `index` without bounds checks.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the array. Only debug builds check it
    /// against the descriptor.
    #[inline]
    pub fn at_unchecked(&self, index: usize) -> T
    where
        T: Clone,
    {
        debug_assert!(index < self.total(), "index {} out of {}", index, self.total());
        let offset = if self.info.is_standard() {
            self.info.offset() + index
        } else {
            self.info.offset_of(&self.info.index_to_subs(index))
        };
        match &self.storage {
            Some(storage) => storage.read()[offset].clone(),
            None => panic!("index {} of an empty array", index),
        }
    }

    /// Element at logical (row-major) `index`.
    pub fn at(&self, index: usize) -> Result<T, ArrayError>
    where
        T: Clone,
    {
        let offset = self.info.ind2ind(index)?;
        self.read_offset(offset)
    }

    /// Element at subscripts `subs`.
    pub fn at_subs(&self, subs: &[usize]) -> Result<T, ArrayError>
    where
        T: Clone,
    {
        let offset = self.info.sub2ind(subs)?;
        self.read_offset(offset)
    }

    pub fn set(&self, index: usize, value: T) -> Result<(), ArrayError> {
        let offset = self.info.ind2ind(index)?;
        self.modify_offset(offset, |slot| *slot = value)
    }

    pub fn set_subs(&self, subs: &[usize], value: T) -> Result<(), ArrayError> {
        let offset = self.info.sub2ind(subs)?;
        self.modify_offset(offset, |slot| *slot = value)
    }

    /// Runs `f` on the element at logical `index` in place.
    pub fn modify<R>(&self, index: usize, f: impl FnOnce(&mut T) -> R) -> Result<R, ArrayError> {
        let offset = self.info.ind2ind(index)?;
        self.modify_offset(offset, f)
    }

    fn read_offset(&self, offset: usize) -> Result<T, ArrayError>
    where
        T: Clone,
    {
        self.buffer()?
            .read()
            .get(offset)
            .cloned()
            .ok_or_else(|| ArrayError::range(format!("storage offset {}", offset)))
    }

    fn modify_offset<R>(&self, offset: usize, f: impl FnOnce(&mut T) -> R) -> Result<R, ArrayError> {
        let mut guard = self.buffer()?.write();
        let slot = guard
            .get_mut(offset)
            .ok_or_else(|| ArrayError::range(format!("storage offset {}", offset)))?;
        Ok(f(slot))
    }

    /// View restricted to `boundaries`, one per leading axis.
    pub fn slice(&self, boundaries: &[Interval]) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.slice(boundaries)?))
    }

    pub fn slice_axis(&self, boundary: Interval, axis: usize) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.slice_axis(boundary, axis)?))
    }

    pub fn transpose(&self, perm: &[usize]) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.transpose(perm)?))
    }

    /// Reverses the axes.
    pub fn t(&self) -> Result<Self, ArrayError> {
        let perm = (0..self.rank()).rev().collect::<Vec<_>>();
        self.transpose(&perm)
    }

    pub fn swap_axes(&self, a: usize, b: usize) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.swap(a, b)?))
    }

    pub fn move_axis(&self, src: usize, dst: usize) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.move_axis(src, dst)?))
    }

    pub fn roll_axes(&self, offset: isize) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.roll(offset)?))
    }

    pub fn squeeze(&self, kind: Squeeze, max_count: Option<usize>) -> Result<Self, ArrayError> {
        Ok(self.view(self.info.squeeze(kind, max_count)?))
    }

    /// Reinterprets the elements under new dims without moving data.
    ///
    /// Only standard layouts can be reshaped; call [`Array::refresh`] first
    /// on sliced or transposed arrays.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Self, ArrayError> {
        let shape = shape.into();
        let total = shape.checked_numel()?;
        if total != self.total() {
            return Err(ArrayError::invalid(format!(
                "cannot reshape {} elements into {:?}",
                self.total(),
                shape
            )));
        }
        if self.is_empty() {
            return Ok(Self::empty());
        }
        if !self.info.is_standard() {
            return Err(ArrayError::invalid(format!(
                "reshape of a non-standard layout {:?}, refresh it first",
                self.info.hints()
            )));
        }
        Ok(self.view(Descriptor::with_offset(shape, self.info.offset())?))
    }

    /// Iterates over clones of the elements in logical order.
    ///
    /// Holds a read lock on the storage until dropped.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            guard: self.storage.as_ref().map(Storage::read),
            indexer: self.indices(),
        }
    }
}

impl<T: Clone> Array<T> {
    /// Every element set to `value`.
    pub fn full(shape: impl Into<Shape>, value: T) -> Result<Self, ArrayError> {
        let shape = shape.into();
        let total = shape.checked_numel()?;
        Self::from_data(shape, vec![value; total])
    }

    /// Single element array of dims `[1]`.
    pub fn scalar(value: T) -> Self {
        Self::from_parts(
            Descriptor::new(crate::dims![1]).unwrap_or_default(),
            Some(Storage::from_vec(vec![value], GrowthPolicy::default())),
        )
    }

    /// Elements in logical order.
    pub fn to_vec(&self) -> Vec<T> {
        let Some(storage) = &self.storage else {
            return vec![];
        };
        let guard = storage.read();
        if self.info.is_standard() {
            let start = self.info.offset();
            return guard[start..start + self.total()].to_vec();
        }
        self.indices().map(|offset| guard[offset].clone()).collect()
    }

    /// Copies the elements into a fresh storage of the given policy.
    pub fn with_policy(&self, policy: GrowthPolicy) -> Result<Self, ArrayError> {
        if self.is_empty() {
            return Ok(Self::empty());
        }
        Self::from_data_with_policy(self.shape().clone(), self.to_vec(), policy)
    }

    /// Shallow copy in a fresh standard layout. Nested arrays are shared, see
    /// [`crate::Nested::deep_clone`] for a recursive copy.
    pub fn copy(&self) -> Self {
        match &self.storage {
            Some(storage) => Self::from_parts(
                Descriptor::new(self.shape().clone()).unwrap_or_default(),
                Some(Storage::from_vec(self.to_vec(), storage.policy())),
            ),
            None => Self::empty(),
        }
    }

    /// Overwrites the elements of `self` with those of `other` in logical order.
    pub fn assign(&self, other: &Array<T>) -> Result<(), ArrayError> {
        if self.total() != other.total() {
            return Err(ArrayError::invalid(format!(
                "cannot assign {} elements to {}",
                other.total(),
                self.total()
            )));
        }
        if self.is_empty() {
            return Ok(());
        }
        let values = other.to_vec();
        let mut guard = self.buffer()?.write();
        for (offset, value) in self.indices().zip(values) {
            guard[offset] = value;
        }
        Ok(())
    }

    /// Sets every element to `value`.
    pub fn fill(&self, value: T) {
        if let Some(storage) = &self.storage {
            let mut guard = storage.write();
            for offset in self.indices() {
                guard[offset] = value.clone();
            }
        }
    }
}

impl<T: Clone + Default> Array<T> {
    /// Default-initialized array.
    pub fn new(shape: impl Into<Shape>) -> Result<Self, ArrayError> {
        Self::full(shape, T::default())
    }
}

#[cfg(feature = "rand")]
impl<T> Array<T>
where
    Standard: Distribution<T>,
{
    /// Uniformly distributed elements as produced by [`rand::Rng::gen`].
    pub fn random(shape: impl Into<Shape>) -> Result<Self, ArrayError> {
        let mut rng = rand::thread_rng();
        Self::from_fn(shape, |_| Standard.sample(&mut rng))
    }
}

#[cfg(feature = "rand")]
impl<T: num_traits::Float> Array<T> {
    /// Standard normally distributed elements.
    pub fn randn(shape: impl Into<Shape>) -> Result<Self, ArrayError> {
        let mut rng = rand::thread_rng();
        let shape = shape.into();
        let data = (0..shape.checked_numel()?)
            .map(|_| {
                let sample: f64 = StandardNormal.sample(&mut rng);
                T::from(sample).ok_or_else(|| ArrayError::invalid("failed to convert sample"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_data(shape, data)
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Shallow: the clone shares storage and provenance with `self`.
impl<T> Clone for Array<T> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            storage: self.storage.clone(),
            anchor: new_anchor(),
            creator: self.creator.clone(),
        }
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(data: Vec<T>) -> Self {
        let len = data.len();
        match Descriptor::new(crate::dims![len]) {
            Ok(info) => Self::from_parts(info, Some(Storage::from_vec(data, GrowthPolicy::default()))),
            Err(_) => Self::empty(),
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.to_vec() == other.to_vec()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("info", &self.info)
            .field("data", &self.to_vec())
            .finish()
    }
}

/// Element iterator, see [`Array::iter`].
pub struct Iter<'a, T> {
    guard: Option<RwLockReadGuard<'a, Vec<T>>>,
    indexer: Indexer,
}

impl<T: Clone> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.indexer.next()?;
        self.guard.as_ref().map(|guard| guard[offset].clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indexer.size_hint()
    }
}

impl<T: Clone> ExactSizeIterator for Iter<'_, T> {}

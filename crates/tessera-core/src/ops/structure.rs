use crate::{Array, ArrayError, Descriptor, Enforcer, Interval, Shape, Storage};

/// Where an element of a spliced layout comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    /// Logical index into the array being spliced.
    Old(usize),
    /// Index into the inserted elements.
    New(usize),
}

/// Row-major element order after replacing `erase` slabs at `index` along
/// `axis` with `insert` new slabs.
fn splice(dims: &[usize], axis: usize, index: usize, erase: usize, insert: usize) -> Vec<Piece> {
    let outer: usize = dims[..axis].iter().product();
    let inner: usize = dims[axis + 1..].iter().product();
    let extent = dims[axis];
    let mut pieces = Vec::with_capacity(outer * (extent - erase + insert) * inner);
    for o in 0..outer {
        let base = o * extent * inner;
        pieces.extend((base..base + index * inner).map(Piece::Old));
        let added = o * insert * inner;
        pieces.extend((added..added + insert * inner).map(Piece::New));
        pieces.extend((base + (index + erase) * inner..base + extent * inner).map(Piece::Old));
    }
    pieces
}

impl<T: Clone> Array<T> {
    /// Rewrites the elements of `self` in `pieces` order under `shape`.
    ///
    /// A uniquely owned buffer with enough spare capacity is used as its own
    /// scratch space. Otherwise the result is assembled in a temporary buffer,
    /// which replaces the contents of a uniquely owned storage or becomes a
    /// new storage when the old one is shared.
    fn respliced(&mut self, shape: Shape, pieces: &[Piece], inserted: &[T]) -> Result<(), ArrayError> {
        let info = Descriptor::new(shape)?;
        let storage = self.buffer()?;
        let unique = storage.is_unique();
        if unique {
            let mut guard = storage.write();
            if guard.capacity() - guard.len() >= pieces.len() {
                let offsets = self.indices().collect::<Vec<_>>();
                let len = guard.len();
                for piece in pieces {
                    let value = match *piece {
                        Piece::Old(index) => guard[offsets[index]].clone(),
                        Piece::New(index) => inserted[index].clone(),
                    };
                    guard.push(value);
                }
                guard.drain(..len);
                log::debug!(
                    "spliced {} elements using spare capacity of {}",
                    pieces.len(),
                    guard.capacity()
                );
                drop(guard);
                let storage = self.storage().cloned();
                self.relayout(info, storage);
                return Ok(());
            }
        }

        let old = self.to_vec();
        let data = pieces
            .iter()
            .map(|piece| match *piece {
                Piece::Old(index) => old[index].clone(),
                Piece::New(index) => inserted[index].clone(),
            })
            .collect::<Vec<_>>();
        log::debug!(
            "spliced {} elements through a temporary buffer (shared storage: {})",
            data.len(),
            !unique
        );
        let storage = if unique {
            let storage = self.buffer()?.clone();
            storage.replace(data);
            storage
        } else {
            Storage::from_vec(data, self.policy())
        };
        self.relayout(info, Some(storage));
        Ok(())
    }

    /// Inserts `other` before position `index` along `axis`.
    ///
    /// `other` must match `self` on every other axis. Inserting into an empty
    /// array copies `other`.
    pub fn insert(&mut self, other: &Array<T>, index: usize, axis: usize) -> Result<(), ArrayError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            if index != 0 {
                return Err(ArrayError::range(format!(
                    "insert at {} into an empty array",
                    index
                )));
            }
            Enforcer::check_axis(axis, other.rank())?;
            let info = Descriptor::new(other.shape().clone())?;
            let storage = Storage::from_vec(other.to_vec(), other.policy());
            self.relayout(info, Some(storage));
            return Ok(());
        }
        Enforcer::match_shapes_except(self.shape(), other.shape(), axis)?;
        let extent = self.dims()[axis];
        if index > extent {
            return Err(ArrayError::range(format!(
                "insert at {} along axis {} of extent {}",
                index, axis, extent
            )));
        }
        let mut shape = self.shape().clone();
        shape[axis] = Enforcer::checked_add(extent, other.dims()[axis])?;
        shape.checked_numel()?;
        let inserted = other.to_vec();

        if axis == 0 && index == extent && self.info().is_standard() {
            let offset = self.info().offset();
            let appended = Descriptor::with_offset(shape.clone(), offset)?;
            let storage = self.buffer()?;
            let mut guard = storage.write();
            if offset + self.total() == guard.len() {
                storage.reserve(&mut guard, inserted.len());
                guard.extend(inserted);
                log::debug!(
                    "appended {} slabs at the end of the buffer",
                    other.dims()[0]
                );
                drop(guard);
                let storage = self.storage().cloned();
                self.relayout(appended, storage);
                return Ok(());
            }
        }

        let pieces = splice(self.dims(), axis, index, 0, other.dims()[axis]);
        self.respliced(shape, &pieces, &inserted)
    }

    /// Removes `count` slabs starting at `index` along `axis`.
    ///
    /// Leading or trailing slabs of axis 0 are dropped without copying.
    pub fn erase(&mut self, count: usize, index: usize, axis: usize) -> Result<(), ArrayError> {
        if count == 0 {
            return Ok(());
        }
        Enforcer::check_axis(axis, self.rank())?;
        let extent = self.dims()[axis];
        let end = Enforcer::checked_add(index, count)?;
        if end > extent {
            return Err(ArrayError::range(format!(
                "erase [{}, {}) along axis {} of extent {}",
                index, end, axis, extent
            )));
        }
        if count == extent {
            self.relayout(Descriptor::default(), None);
            return Ok(());
        }
        if axis == 0 && (index == 0 || end == extent) {
            let kept = if index == 0 {
                Interval::span(end, extent)
            } else {
                Interval::span(0, index)
            };
            let info = self.info().slice_axis(kept, 0)?;
            log::debug!("erased {} slabs at the boundary of axis 0", count);
            let storage = self.storage().cloned();
            self.relayout(info, storage);
            return Ok(());
        }
        let mut shape = self.shape().clone();
        shape[axis] = extent - count;
        let pieces = splice(self.dims(), axis, index, count, 0);
        self.respliced(shape, &pieces, &[])
    }

    pub fn push_back(&mut self, other: &Array<T>, axis: usize) -> Result<(), ArrayError> {
        let index = if self.is_empty() { 0 } else { self.extent(axis)? };
        self.insert(other, index, axis)
    }

    pub fn push_front(&mut self, other: &Array<T>, axis: usize) -> Result<(), ArrayError> {
        self.insert(other, 0, axis)
    }

    pub fn pop_back(&mut self, count: usize, axis: usize) -> Result<(), ArrayError> {
        let extent = self.extent(axis)?;
        let index = extent.checked_sub(count).ok_or_else(|| {
            ArrayError::range(format!("pop {} of extent {}", count, extent))
        })?;
        self.erase(count, index, axis)
    }

    pub fn pop_front(&mut self, count: usize, axis: usize) -> Result<(), ArrayError> {
        self.erase(count, 0, axis)
    }

    fn extent(&self, axis: usize) -> Result<usize, ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        Ok(self.dims()[axis])
    }

    /// Compacts a sliced or transposed layout into a standard one.
    ///
    /// A uniquely owned buffer is rewritten from its front; a shared buffer is
    /// left to its other users and `self` moves to a new storage.
    pub fn refresh(&mut self) -> Result<(), ArrayError> {
        if self.is_empty() || self.info().is_standard() {
            return Ok(());
        }
        let info = Descriptor::new(self.shape().clone())?;
        let values = self.to_vec();
        let storage = self.buffer()?;
        let storage = if storage.is_unique() {
            let mut guard = storage.write();
            for (slot, value) in guard.iter_mut().zip(values) {
                *slot = value;
            }
            log::debug!("compacted {:?} in place", info.shape());
            drop(guard);
            storage.clone()
        } else {
            log::debug!("compacted {:?} into a new buffer", info.shape());
            Storage::from_vec(values, storage.policy())
        };
        self.relayout(info, Some(storage));
        Ok(())
    }

    /// Joins `arrays` along `axis`.
    pub fn concat(arrays: &[Array<T>], axis: usize) -> Result<Array<T>, ArrayError> {
        let mut out = Array::empty();
        for array in arrays {
            out.push_back(array, axis)?;
        }
        Ok(out)
    }
}

impl<T: Clone + Default> Array<T> {
    /// Changes the dims of `self`, keeping the elements in logical order.
    ///
    /// The first `min(old, new)` elements survive; new positions hold
    /// `T::default()`. A standard layout at the end of its buffer grows in
    /// place, and shrinking never copies.
    pub fn resize(&mut self, shape: impl Into<Shape>) -> Result<(), ArrayError> {
        let shape = shape.into();
        let total = shape.checked_numel()?;
        if total == 0 {
            self.relayout(Descriptor::default(), None);
            return Ok(());
        }
        if shape == *self.shape() {
            return Ok(());
        }
        if self.is_empty() {
            let fresh = Array::new(shape)?;
            self.relayout(fresh.info().clone(), fresh.storage().cloned());
            return Ok(());
        }
        if self.info().is_standard() {
            let offset = self.info().offset();
            let info = Descriptor::with_offset(shape.clone(), offset)?;
            if total <= self.total() {
                let storage = self.storage().cloned();
                self.relayout(info, storage);
                return Ok(());
            }
            let storage = self.buffer()?;
            let mut guard = storage.write();
            if offset + self.total() == guard.len() {
                let grow = total - self.total();
                storage.reserve(&mut guard, grow);
                let len = guard.len();
                guard.resize_with(len + grow, T::default);
                log::debug!("grew buffer by {} elements in place", grow);
                drop(guard);
                let storage = self.storage().cloned();
                self.relayout(info, storage);
                return Ok(());
            }
        }
        let data = self
            .to_vec()
            .into_iter()
            .chain(std::iter::repeat_with(T::default))
            .take(total)
            .collect::<Vec<_>>();
        log::debug!("resized {:?} into a new buffer", shape);
        let storage = Storage::from_vec(data, self.policy());
        self.relayout(Descriptor::new(shape)?, Some(storage));
        Ok(())
    }
}

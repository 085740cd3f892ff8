use crate::{rvec, Descriptor, RVec};
use std::cmp::Ordering;

/// Where an [`Indexer`] starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Position {
    Begin,
    End,
    RBegin,
    REnd,
}

/// # Indexer
///
/// Cursor mapping a traversal index to an absolute storage offset.
///
/// Traversal is row-major over the descriptor's dims: the last axis moves
/// fastest and carries into the axes to its left. Beyond the elements there
/// are two sentinel positions, `end` (index `total`) and `rend` (index `-1`).
/// Incrementing `end` or decrementing `rend` has no effect; incrementing
/// `rend` yields `begin` and decrementing `end` yields `rbegin`.
#[derive(Debug, Clone)]
pub struct Indexer {
    info: Descriptor,
    subs: RVec<usize>,
    offset: usize,
    index: isize,
    total: isize,
}

impl Indexer {
    pub fn new(info: &Descriptor, position: Position) -> Self {
        let total = info.total() as isize;
        let mut indexer = Self {
            info: info.clone(),
            subs: rvec![0; info.rank()],
            offset: info.offset(),
            index: 0,
            total,
        };
        match position {
            Position::Begin => {}
            Position::End => indexer.set_end(),
            Position::RBegin => indexer.seek(total - 1),
            Position::REnd => indexer.set_rend(),
        }
        indexer
    }

    pub fn begin(info: &Descriptor) -> Self {
        Self::new(info, Position::Begin)
    }

    pub fn info(&self) -> &Descriptor {
        &self.info
    }

    /// Storage offset of the current element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Traversal index, `-1` at `rend` and `total` at `end`.
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn subs(&self) -> &[usize] {
        &self.subs
    }

    pub fn is_valid(&self) -> bool {
        self.index >= 0 && self.index < self.total
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.total
    }

    pub fn is_rend(&self) -> bool {
        self.index < 0
    }

    pub fn inc(&mut self) {
        if self.is_end() {
            return;
        }
        if self.is_rend() {
            self.seek(0);
            return;
        }
        let dims = self.info.dims();
        let strides = self.info.strides();
        for axis in (0..dims.len()).rev() {
            if self.subs[axis] + 1 < dims[axis] {
                self.subs[axis] += 1;
                self.offset += strides[axis];
                self.index += 1;
                return;
            }
            self.offset -= self.subs[axis] * strides[axis];
            self.subs[axis] = 0;
        }
        self.set_end();
    }

    pub fn dec(&mut self) {
        if self.is_rend() {
            return;
        }
        if self.is_end() || self.index == 0 {
            self.seek(self.index - 1);
            return;
        }
        let dims = self.info.dims();
        let strides = self.info.strides();
        for axis in (0..dims.len()).rev() {
            if self.subs[axis] > 0 {
                self.subs[axis] -= 1;
                self.offset -= strides[axis];
                self.index -= 1;
                return;
            }
            self.subs[axis] = dims[axis] - 1;
            self.offset += (dims[axis] - 1) * strides[axis];
        }
    }

    /// Moves `count` steps forward, saturating at `end`.
    pub fn advance(&mut self, count: usize) {
        if self.is_end() {
            return;
        }
        let target = isize::try_from(count)
            .ok()
            .and_then(|c| self.index.checked_add(c))
            .unwrap_or(isize::MAX);
        self.seek(target);
    }

    /// Moves `count` steps backward, saturating at `rend`.
    pub fn retreat(&mut self, count: usize) {
        if self.is_rend() {
            return;
        }
        let target = isize::try_from(count)
            .ok()
            .and_then(|c| self.index.checked_sub(c))
            .unwrap_or(-1);
        self.seek(target);
    }

    /// Storage offset `n` steps away from the cursor, if that is an element.
    pub fn at(&self, n: isize) -> Option<usize> {
        let target = self.index.checked_add(n)?;
        if target < 0 || target >= self.total {
            return None;
        }
        Some(self.info.offset_of(&self.info.index_to_subs(target as usize)))
    }

    fn seek(&mut self, target: isize) {
        if target >= self.total {
            self.set_end();
        } else if target < 0 {
            self.set_rend();
        } else {
            self.subs = self.info.index_to_subs(target as usize);
            self.offset = self.info.offset_of(&self.subs);
            self.index = target;
        }
    }

    fn set_end(&mut self) {
        if self.total > 0 {
            self.seek(self.total - 1);
        }
        self.index = self.total;
    }

    fn set_rend(&mut self) {
        self.subs.iter_mut().for_each(|s| *s = 0);
        self.offset = self.info.offset();
        self.index = -1;
    }

    /// Offsets from the cursor back to the first element.
    pub fn backward(self) -> Backward {
        Backward(self)
    }
}

impl PartialEq for Indexer {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl PartialOrd for Indexer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.index + 1).partial_cmp(&(other.index + 1))
    }
}

impl Iterator for Indexer {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_rend() {
            self.inc();
        }
        if self.is_end() {
            return None;
        }
        let offset = self.offset;
        self.inc();
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.index.max(0)).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Indexer {}

/// Reverse traversal, see [`Indexer::backward`].
#[derive(Debug, Clone)]
pub struct Backward(Indexer);

impl Iterator for Backward {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_end() {
            self.0.dec();
        }
        if self.0.is_rend() {
            return None;
        }
        let offset = self.0.offset;
        self.0.dec();
        Some(offset)
    }
}

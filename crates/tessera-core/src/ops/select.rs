use crate::{dims, Array, ArrayError};

/// Elements picked from an array by a mask, an index list or a predicate.
///
/// A selection borrows its array. Reading copies the picked elements out,
/// writing scatters values back into the picked positions of the array and
/// of every view sharing its storage.
pub struct Selection<'a, T> {
    array: &'a Array<T>,
    offsets: Vec<usize>,
}

impl<'a, T> Selection<'a, T> {
    fn new(array: &'a Array<T>, offsets: Vec<usize>) -> Self {
        Self { array, offsets }
    }
}

impl<T> std::fmt::Debug for Selection<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("shape", self.array.shape())
            .field("offsets", &self.offsets)
            .finish()
    }
}

impl<T> Array<T> {
    /// Positions where `mask`, shaped like `self`, is true.
    pub fn select(&self, mask: &Array<bool>) -> Result<Selection<'_, T>, ArrayError> {
        if mask.dims() != self.dims() {
            return Err(ArrayError::invalid(format!(
                "mask {:?} for array {:?}",
                mask.shape(),
                self.shape()
            )));
        }
        let offsets = self
            .indices()
            .zip(mask.to_vec())
            .filter_map(|(offset, keep)| keep.then_some(offset))
            .collect();
        Ok(Selection::new(self, offsets))
    }

    /// Positions at the given logical indices, in the given order.
    pub fn select_indices(&self, indices: &[usize]) -> Result<Selection<'_, T>, ArrayError> {
        let offsets = indices
            .iter()
            .map(|&index| self.info().ind2ind(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Selection::new(self, offsets))
    }

    /// Positions whose element satisfies `pred`.
    pub fn select_where(&self, pred: impl Fn(&T) -> bool) -> Selection<'_, T> {
        let offsets = match self.storage() {
            Some(storage) => {
                let guard = storage.read();
                self.indices().filter(|&offset| pred(&guard[offset])).collect()
            }
            None => vec![],
        };
        Selection::new(self, offsets)
    }
}

impl<T> Selection<'_, T> {
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Storage offsets of the picked elements.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Updates every picked element with `op` and the matching value of
    /// `values`, which holds one value per pick or a single shared value.
    pub fn apply<U: Clone>(&self, values: &Array<U>, op: impl Fn(&mut T, &U)) -> Result<(), ArrayError> {
        if self.is_empty() {
            return Ok(());
        }
        let values = values.to_vec();
        if values.len() != 1 && values.len() != self.len() {
            return Err(ArrayError::invalid(format!(
                "{} values for {} selected elements",
                values.len(),
                self.len()
            )));
        }
        let mut guard = self.array.buffer()?.write();
        for (i, &offset) in self.offsets.iter().enumerate() {
            let value = if values.len() == 1 { &values[0] } else { &values[i] };
            op(&mut guard[offset], value);
        }
        Ok(())
    }
}

impl<T: Clone> Selection<'_, T> {
    /// The picked elements as a new vector array.
    pub fn materialize(&self) -> Result<Array<T>, ArrayError> {
        if self.is_empty() {
            return Ok(Array::empty());
        }
        let data = {
            let guard = self.array.buffer()?.read();
            self.offsets
                .iter()
                .map(|&offset| guard[offset].clone())
                .collect::<Vec<_>>()
        };
        Array::from_data_with_policy(dims![data.len()], data, self.array.policy())
    }

    /// Writes `values` into the picked positions.
    pub fn scatter(&self, values: &Array<T>) -> Result<(), ArrayError> {
        self.apply(values, |slot, value| *slot = value.clone())
    }

    pub fn fill(&self, value: T) -> Result<(), ArrayError> {
        self.scatter(&Array::scalar(value))
    }
}

impl<T: Clone> Array<T> {
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Result<Array<T>, ArrayError> {
        self.select_where(pred).materialize()
    }

    pub fn filter_mask(&self, mask: &Array<bool>) -> Result<Array<T>, ArrayError> {
        self.select(mask)?.materialize()
    }

    pub fn filter_indices(&self, indices: &[usize]) -> Result<Array<T>, ArrayError> {
        self.select_indices(indices)?.materialize()
    }

    /// Logical indices of the elements satisfying `pred`.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Result<Array<usize>, ArrayError> {
        let found = self
            .iter()
            .enumerate()
            .filter_map(|(index, value)| pred(&value).then_some(index))
            .collect::<Vec<_>>();
        Ok(Array::from(found))
    }

    /// Logical indices where `mask` is true.
    pub fn find_mask(&self, mask: &Array<bool>) -> Result<Array<usize>, ArrayError> {
        if mask.dims() != self.dims() {
            return Err(ArrayError::invalid(format!(
                "mask {:?} for array {:?}",
                mask.shape(),
                self.shape()
            )));
        }
        mask.find(|&keep| keep)
    }
}

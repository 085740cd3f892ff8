use crate::{Array, ArrayError, Enforcer};
use std::cmp::Ordering;

impl<T: Clone> Array<T> {
    /// Elements sorted in logical order by `compare`, in a new array with the
    /// dims of `self`. The sort is stable.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) -> Result<Array<T>, ArrayError> {
        if self.is_empty() {
            return Ok(Array::empty());
        }
        let mut data = self.to_vec();
        data.sort_by(compare);
        Array::from_data_with_policy(self.shape().clone(), data, self.policy())
    }

    /// Vector whose element `i` is element `perm[i]` of `self`.
    pub fn reorder(&self, perm: &[usize]) -> Result<Array<T>, ArrayError> {
        if self.rank() != 1 {
            return Err(ArrayError::invalid(format!(
                "reorder of array {:?}, expected a vector",
                self.shape()
            )));
        }
        Enforcer::check_permutation(perm, self.total())?;
        let values = self.to_vec();
        let data = perm.iter().map(|&i| values[i].clone()).collect::<Vec<_>>();
        Array::from_data_with_policy(self.shape().clone(), data, self.policy())
    }
}

impl<T: Clone + Ord> Array<T> {
    pub fn sort(&self) -> Result<Array<T>, ArrayError> {
        self.sort_by(T::cmp)
    }
}

use crate::{Array, ArrayError, Descriptor, Enforcer, Indexer};
use num_traits::{One, Zero};

impl<T: Clone> Array<T> {
    /// Folds every element in logical order, starting from `init`.
    pub fn fold<R>(&self, init: R, mut op: impl FnMut(R, &T) -> R) -> R {
        let Some(storage) = self.storage() else {
            return init;
        };
        let guard = storage.read();
        self.indices().fold(init, |acc, offset| op(acc, &guard[offset]))
    }

    /// Folds every element into the first one. Fails on an empty array.
    pub fn reduce(&self, mut op: impl FnMut(T, &T) -> T) -> Result<T, ArrayError> {
        let storage = self
            .storage()
            .ok_or_else(|| ArrayError::invalid("reduction of an empty array"))?;
        let guard = storage.read();
        let mut offsets = self.indices();
        let first = offsets
            .next()
            .map(|offset| guard[offset].clone())
            .ok_or_else(|| ArrayError::invalid("reduction of an empty array"))?;
        Ok(offsets.fold(first, |acc, offset| op(acc, &guard[offset])))
    }

    /// Elements in lanes along `axis`; lanes follow the row-major order of the
    /// remaining axes.
    fn lanes(&self, axis: usize) -> Result<(Descriptor, usize, Vec<T>), ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        let out = self.info().reduce(axis)?;
        let moved = self.info().move_axis(axis, self.rank() - 1)?;
        let guard = self.buffer()?.read();
        let values = Indexer::begin(&moved)
            .map(|offset| guard[offset].clone())
            .collect();
        Ok((out, self.dims()[axis], values))
    }

    /// Folds each lane along `axis` into its first element.
    ///
    /// The result drops `axis`; reducing a vector yields dims `[1]`.
    pub fn reduce_axis(
        &self,
        axis: usize,
        mut op: impl FnMut(T, &T) -> T,
    ) -> Result<Array<T>, ArrayError> {
        let (out, lane, values) = self.lanes(axis)?;
        let data = values
            .chunks(lane)
            .map(|chunk| chunk[1..].iter().fold(chunk[0].clone(), &mut op))
            .collect::<Vec<_>>();
        Array::from_data_with_policy(out.shape().clone(), data, self.policy())
    }

    /// Folds each lane along `axis` starting from a seed.
    ///
    /// `init` is either a single seed shared by every lane or one seed per
    /// lane, shaped like the result.
    pub fn fold_axis<R: Clone>(
        &self,
        axis: usize,
        init: &Array<R>,
        mut op: impl FnMut(R, &T) -> R,
    ) -> Result<Array<R>, ArrayError> {
        let (out, lane, values) = self.lanes(axis)?;
        let seeds = init.to_vec();
        if seeds.len() != 1 && init.dims() != out.dims() {
            return Err(ArrayError::invalid(format!(
                "fold seeds {:?} for result {:?}",
                init.shape(),
                out.shape()
            )));
        }
        let data = values
            .chunks(lane)
            .enumerate()
            .map(|(i, chunk)| {
                let seed = seeds[if seeds.len() == 1 { 0 } else { i }].clone();
                chunk.iter().fold(seed, &mut op)
            })
            .collect::<Vec<_>>();
        Array::from_data_with_policy(out.shape().clone(), data, self.policy())
    }

    /// Running fold along `axis`. The result keeps the dims of `self`.
    pub fn accumulate_axis(
        &self,
        axis: usize,
        mut op: impl FnMut(&T, &T) -> T,
    ) -> Result<Array<T>, ArrayError> {
        let (_, lane, values) = self.lanes(axis)?;
        let positions = Descriptor::new(self.shape().clone())?.move_axis(axis, self.rank() - 1)?;
        let mut out: Vec<Option<T>> = (0..self.total()).map(|_| None).collect();
        let mut positions = Indexer::begin(&positions);
        for chunk in values.chunks(lane) {
            let mut running: Option<T> = None;
            for (value, pos) in chunk.iter().zip(positions.by_ref()) {
                let next = match &running {
                    Some(acc) => op(acc, value),
                    None => value.clone(),
                };
                out[pos] = Some(next.clone());
                running = Some(next);
            }
        }
        let data = out.into_iter().flatten().collect::<Vec<_>>();
        Array::from_data_with_policy(self.shape().clone(), data, self.policy())
    }
}

impl<T: Clone + Zero> Array<T> {
    pub fn sum(&self) -> T {
        self.fold(T::zero(), |acc, v| acc + v.clone())
    }

    pub fn sum_axis(&self, axis: usize) -> Result<Array<T>, ArrayError> {
        self.reduce_axis(axis, |acc, v| acc + v.clone())
    }
}

impl<T: Clone + One> Array<T> {
    pub fn product(&self) -> T {
        self.fold(T::one(), |acc, v| acc * v.clone())
    }
}

impl<T: Clone + PartialOrd> Array<T> {
    pub fn min(&self) -> Result<T, ArrayError> {
        self.reduce(|acc, v| if *v < acc { v.clone() } else { acc })
    }

    pub fn max(&self) -> Result<T, ArrayError> {
        self.reduce(|acc, v| if *v > acc { v.clone() } else { acc })
    }
}

impl Array<bool> {
    /// True for an empty array.
    pub fn all(&self) -> bool {
        self.fold(true, |acc, v| acc && *v)
    }

    pub fn any(&self) -> bool {
        self.fold(false, |acc, v| acc || *v)
    }
}

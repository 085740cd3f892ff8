use crate::{Array, ArrayError, Shape};
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;

/// Conversion to and from ndarray arrays
impl<T: Clone> Array<T> {
    /// Owned ndarray copy in logical order. An empty array becomes a
    /// zero-length vector.
    pub fn to_ndarray(&self) -> Result<ArrayD<T>, ArrayError> {
        let dims = if self.is_empty() {
            vec![0]
        } else {
            self.shape().to_vec()
        };
        let data = self.to_vec();
        ArrayD::from_shape_vec(IxDyn(&dims), data).map_err(|e| ArrayError::invalid(e.to_string()))
    }
}

impl<T: Clone> From<ArrayD<T>> for Array<T> {
    /// Copies `it` in logical order, whatever its memory layout. A
    /// zero-dimensional array becomes dims `[1]`.
    fn from(it: ArrayD<T>) -> Self {
        if it.is_empty() {
            return Array::empty();
        }
        let shape = match it.ndim() {
            0 => crate::dims![1],
            _ => it.shape().iter().copied().collect::<Shape>(),
        };
        let data = it.iter().cloned().collect::<Vec<_>>();
        Array::from_data(shape, data).unwrap_or_default()
    }
}

struct CloseStats<T> {
    total_error: T,
    max_abs_error: T,
    max_abs_error_idx: Option<usize>,
    element_count: usize,
    fail_count: usize,
    atol: T,
    rtol: T,
}

impl<T: Float> CloseStats<T> {
    fn new(atol: T, rtol: T) -> Self {
        Self {
            total_error: T::zero(),
            max_abs_error: T::zero(),
            max_abs_error_idx: None,
            element_count: 0,
            fail_count: 0,
            atol,
            rtol,
        }
    }

    fn update(&mut self, a: T, b: T, index: usize) {
        let abs_diff = (a - b).abs();
        self.total_error = self.total_error + abs_diff;
        self.element_count += 1;

        if abs_diff > self.max_abs_error {
            self.max_abs_error = abs_diff;
            self.max_abs_error_idx = Some(index);
        }

        if !self.is_close(a, b, abs_diff) {
            self.fail_count += 1;
        }
    }

    fn avg_error(&self) -> T {
        <T as num_traits::NumCast>::from(self.element_count)
            .filter(|n| !n.is_zero())
            .map(|n| self.total_error / n)
            .unwrap_or_else(T::zero)
    }

    fn is_close(&self, a: T, b: T, abs_diff: T) -> bool {
        (a.is_nan() && b.is_nan())
            || (a.is_infinite() && b.is_infinite() && a.signum() == b.signum())
            || abs_diff <= self.atol + self.rtol * b.abs()
    }
}

impl<T: Float + std::fmt::Debug> Array<T> {
    /// Elementwise closeness in logical order, reporting the worst element.
    pub fn all_close(&self, other: &Self, atol: T, rtol: T) -> anyhow::Result<()> {
        if self.dims() != other.dims() {
            anyhow::bail!("Shape mismatch {:?} != {:?}", self.shape(), other.shape())
        }
        let mut stats = CloseStats::new(atol, rtol);
        self.iter()
            .zip(other.iter())
            .enumerate()
            .for_each(|(index, (a, b))| stats.update(a, b, index));

        if stats.fail_count > 0 {
            anyhow::bail!(
                "{} samples not close - AVGE={:?} MAE={:?} at {:?}",
                stats.fail_count,
                stats.avg_error(),
                stats.max_abs_error,
                stats.max_abs_error_idx,
            );
        }
        log::debug!(
            "All close - AVGE={:?} MAE={:?} at {:?}",
            stats.avg_error(),
            stats.max_abs_error,
            stats.max_abs_error_idx
        );
        Ok(())
    }
}

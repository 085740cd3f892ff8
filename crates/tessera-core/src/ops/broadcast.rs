use crate::{
    Array, ArrayError, Descriptor, Indexer, Interval, RVec, Shape, Window, WindowSlider,
};

/// How the operands of an elementwise operation line up.
///
/// Arrays combine when their dims match, when either holds a single element,
/// or when they have the same rank and every dim of one is an integer
/// multiple of the corresponding dim of the other. The smaller operand is
/// then repeated in tiles over the larger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Broadcast {
    Exact,
    LhsScalar,
    RhsScalar,
    /// The right operand tiles the left one.
    TileRhs,
    /// The left operand tiles the right one.
    TileLhs,
}

impl Broadcast {
    pub fn of(lhs: &Shape, rhs: &Shape) -> Result<Self, ArrayError> {
        if lhs == rhs {
            return Ok(Broadcast::Exact);
        }
        if rhs.numel() == 1 {
            return Ok(Broadcast::RhsScalar);
        }
        if lhs.numel() == 1 {
            return Ok(Broadcast::LhsScalar);
        }
        let divides = |big: &Shape, small: &Shape| {
            big.iter()
                .zip(small.iter())
                .all(|(&b, &s)| s > 0 && b % s == 0)
        };
        if lhs.rank() == rhs.rank() {
            if divides(lhs, rhs) {
                return Ok(Broadcast::TileRhs);
            }
            if divides(rhs, lhs) {
                return Ok(Broadcast::TileLhs);
            }
        }
        Err(ArrayError::invalid(format!(
            "cannot broadcast {:?} with {:?}",
            lhs, rhs
        )))
    }

    /// Dims of the result.
    pub fn output<'a>(&self, lhs: &'a Shape, rhs: &'a Shape) -> &'a Shape {
        match self {
            Broadcast::Exact | Broadcast::RhsScalar | Broadcast::TileRhs => lhs,
            Broadcast::LhsScalar | Broadcast::TileLhs => rhs,
        }
    }
}

/// Complete windows of `small` dims stepping by their own width over `info`.
fn tiles(info: &Descriptor, small: &Shape) -> Result<Vec<Descriptor>, ArrayError> {
    let windows = small
        .iter()
        .map(|&n| Window::complete(Interval::span(0, n)).with_stride(n))
        .collect::<Result<RVec<_>, _>>()?;
    let slider = WindowSlider::new(info, &windows)?;
    log::trace!(
        "tiling {:?} over {:?} in {} windows",
        small,
        info.shape(),
        slider.len()
    );
    slider.map(|window| info.slice(&window)).collect()
}

/// Pairs every logical position of `big` with the position of the element of
/// `small` covering it.
fn tiled<R>(
    big: &Shape,
    small: &Shape,
    mut f: impl FnMut(usize, usize) -> R,
) -> Result<Vec<R>, ArrayError> {
    let info = Descriptor::new(big.clone())?;
    let mut out: Vec<Option<R>> = (0..info.total()).map(|_| None).collect();
    for tile in tiles(&info, small)? {
        for (k, pos) in Indexer::begin(&tile).enumerate() {
            out[pos] = Some(f(pos, k));
        }
    }
    Ok(out.into_iter().flatten().collect())
}

impl<T> Array<T> {
    /// Elementwise `op` over `self` and `other`, broadcasting as described by
    /// [`Broadcast`]. Returns a new array.
    pub fn transform<U: Clone, R>(
        &self,
        other: &Array<U>,
        op: impl Fn(&T, &U) -> R,
    ) -> Result<Array<R>, ArrayError>
    where
        T: Clone,
    {
        if self.is_empty() || other.is_empty() {
            return Ok(Array::empty());
        }
        let kind = Broadcast::of(self.shape(), other.shape())?;
        let lhs = self.to_vec();
        let rhs = other.to_vec();
        let data: Vec<R> = match kind {
            Broadcast::Exact => lhs.iter().zip(&rhs).map(|(l, r)| op(l, r)).collect(),
            Broadcast::RhsScalar => lhs.iter().map(|l| op(l, &rhs[0])).collect(),
            Broadcast::LhsScalar => rhs.iter().map(|r| op(&lhs[0], r)).collect(),
            Broadcast::TileRhs => tiled(self.shape(), other.shape(), |p, k| op(&lhs[p], &rhs[k]))?,
            Broadcast::TileLhs => tiled(other.shape(), self.shape(), |p, k| op(&lhs[k], &rhs[p]))?,
        };
        let shape = kind.output(self.shape(), other.shape()).clone();
        Array::from_data_with_policy(shape, data, self.policy())
    }

    /// In-place counterpart of [`Array::transform`]: `op` updates each
    /// element of `self` with the matching element of `other`.
    ///
    /// `other` must not be larger than `self`.
    pub fn apply<U: Clone>(
        &self,
        other: &Array<U>,
        op: impl Fn(&mut T, &U),
    ) -> Result<(), ArrayError> {
        if self.is_empty() || other.is_empty() {
            return Ok(());
        }
        let kind = Broadcast::of(self.shape(), other.shape())?;
        let blocks = match kind {
            Broadcast::Exact | Broadcast::RhsScalar => vec![self.info().clone()],
            Broadcast::TileRhs => tiles(self.info(), other.shape())?,
            Broadcast::LhsScalar | Broadcast::TileLhs => {
                return Err(ArrayError::invalid(format!(
                    "in-place broadcast of {:?} into {:?}",
                    other.shape(),
                    self.shape()
                )))
            }
        };
        let rhs = other.to_vec();
        let mut guard = self.buffer()?.write();
        for tile in blocks {
            for (k, offset) in Indexer::begin(&tile).enumerate() {
                let r = if kind == Broadcast::RhsScalar { &rhs[0] } else { &rhs[k] };
                op(&mut guard[offset], r);
            }
        }
        Ok(())
    }

    /// Unary `op` over every element, in logical order.
    pub fn map<R>(&self, mut op: impl FnMut(&T) -> R) -> Result<Array<R>, ArrayError> {
        let Some(storage) = self.storage() else {
            return Ok(Array::empty());
        };
        let data = {
            let guard = storage.read();
            self.indices().map(|offset| op(&guard[offset])).collect::<Vec<_>>()
        };
        Array::from_data_with_policy(self.shape().clone(), data, self.policy())
    }

    pub fn map_inplace(&self, mut op: impl FnMut(&mut T)) {
        if let Some(storage) = self.storage() {
            let mut guard = storage.write();
            for offset in self.indices() {
                op(&mut guard[offset]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dims, ErrorKind};

    #[test]
    fn classification() {
        let b = |l: Shape, r: Shape| Broadcast::of(&l, &r);
        assert_eq!(b(dims![2, 3], dims![2, 3]).unwrap(), Broadcast::Exact);
        assert_eq!(b(dims![2, 3], dims![1]).unwrap(), Broadcast::RhsScalar);
        assert_eq!(b(dims![1, 1], dims![4]).unwrap(), Broadcast::LhsScalar);
        assert_eq!(b(dims![4, 6], dims![2, 3]).unwrap(), Broadcast::TileRhs);
        assert_eq!(b(dims![2, 1], dims![4, 3]).unwrap(), Broadcast::TileLhs);
        assert_eq!(
            b(dims![4, 3], dims![2, 6]).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            b(dims![6], dims![4]).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(b(dims![6], dims![2, 3]).is_err());
    }

    #[test]
    fn tiled_transform_repeats_smaller_operand() {
        let a = Array::from_data(dims![2, 4], (0..8).collect::<Vec<i32>>()).unwrap();
        let b = Array::from_data(dims![1, 2], vec![100, 200]).unwrap();
        let sum = a.transform(&b, |l, r| l + r).unwrap();
        assert_eq!(sum.dims(), &[2, 4]);
        assert_eq!(
            sum.to_vec(),
            vec![100, 201, 102, 203, 104, 205, 106, 207]
        );
        let flipped = b.transform(&a, |l, r| l - r).unwrap();
        assert_eq!(flipped.dims(), &[2, 4]);
        assert_eq!(flipped.at(3).unwrap(), 197);
    }

    #[test]
    fn apply_in_place_through_view() {
        let a = Array::from_data(dims![3, 3], vec![1; 9]).unwrap();
        let corner = a
            .slice(&[
                Interval::between(1, 3, 1).unwrap(),
                Interval::between(1, 3, 1).unwrap(),
            ])
            .unwrap();
        corner.apply(&Array::scalar(10), |l, r| *l *= r).unwrap();
        assert_eq!(a.to_vec(), vec![1, 1, 1, 1, 10, 10, 1, 10, 10]);
        let row = Array::from_data(dims![1, 2], vec![1, 2]).unwrap();
        corner.apply(&row, |l, r| *l += r).unwrap();
        assert_eq!(corner.to_vec(), vec![11, 12, 11, 12]);
        let err = row.apply(&corner, |l, r| *l += r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn apply_with_aliasing_operand() {
        let a = Array::from_data(dims![4], vec![1, 2, 3, 4]).unwrap();
        let head = a.slice(&[Interval::between(0, 2, 1).unwrap()]).unwrap();
        a.apply(&head, |l, r| *l += r).unwrap();
        assert_eq!(a.to_vec(), vec![2, 4, 4, 6]);
    }

    #[test]
    fn map_changes_element_type() {
        let a = Array::from_data(dims![2, 2], vec![1.5f32, -2.0, 0.0, 3.25]).unwrap();
        let t = a.t().unwrap();
        let signs = t.map(|v| *v > 0.0).unwrap();
        assert_eq!(signs.to_vec(), vec![true, false, false, true]);
        t.map_inplace(|v| *v *= 2.0);
        assert_eq!(a.to_vec(), vec![3.0, -4.0, 0.0, 6.5]);
        assert!(Array::<u8>::empty().map(|v| *v).unwrap().is_empty());
    }
}

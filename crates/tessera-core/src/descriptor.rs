use crate::{rvec, ArrayError, Enforcer, Interval, RVec, Shape, Strides};

/// Layout hints carried by a [`Descriptor`].
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Hints(u8);

impl Hints {
    pub const NONE: Hints = Hints(0);
    /// Addressed offsets cover exactly `total` positions.
    pub const CONTINUOUS: Hints = Hints(1);
    /// Addressed offsets leave gaps.
    pub const SLICED: Hints = Hints(1 << 1);
    /// Axes were permuted away from their storage order.
    pub const TRANSPOSED: Hints = Hints(1 << 2);

    pub fn contains(&self, other: Hints) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn without(self, other: Hints) -> Hints {
        Hints(self.0 & !other.0)
    }
}

impl std::ops::BitOr for Hints {
    type Output = Hints;

    fn bitor(self, rhs: Self) -> Self::Output {
        Hints(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for Hints {
    type Output = Hints;

    fn bitand(self, rhs: Self) -> Self::Output {
        Hints(self.0 & rhs.0)
    }
}

impl std::ops::BitOrAssign for Hints {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Debug for Hints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (Hints::CONTINUOUS, "continuous"),
            (Hints::SLICED, "sliced"),
            (Hints::TRANSPOSED, "transposed"),
        ];
        let set = names
            .iter()
            .filter(|(h, _)| self.contains(*h))
            .map(|(_, n)| *n)
            .collect::<Vec<_>>();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

/// Which unit-extent axes [`Descriptor::squeeze`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumIter)]
pub enum Squeeze {
    Left,
    Right,
    Trim,
    Full,
}

/// # Descriptor
///
/// Interprets a flat buffer as an N-dimensional array: extents, strides, the
/// interval of addressable storage offsets and layout hints.
///
/// Descriptors are values. Every operation below derives a new descriptor and
/// leaves `self` untouched.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    shape: Shape,
    strides: Strides,
    boundary: Interval,
    hints: Hints,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            strides: Strides::default(),
            boundary: Interval::span(0, 0),
            hints: Hints::NONE,
        }
    }
}

impl Descriptor {
    /// Row-major, continuous layout over `shape` starting at offset zero.
    pub fn new(shape: Shape) -> Result<Self, ArrayError> {
        Self::with_offset(shape, 0)
    }

    /// Row-major, continuous layout over `shape` starting at `offset`.
    pub fn with_offset(shape: Shape, offset: usize) -> Result<Self, ArrayError> {
        if shape.is_empty() {
            return Ok(Self::default());
        }
        let total = shape.checked_numel()?;
        let strides = Strides::row_major(&shape)?;
        let stop = Enforcer::checked_add(offset, total)?;
        if stop > Interval::POSINF as usize - 1 {
            return Err(ArrayError::overflow(format!(
                "offsets up to {} exceed the index type",
                stop
            )));
        }
        Ok(Self {
            shape,
            strides,
            boundary: Interval::span(offset, stop),
            hints: Hints::CONTINUOUS,
        })
    }

    /// Assembles a descriptor from explicit parts, detecting whether the
    /// addressed range is continuous or sliced.
    ///
    /// Fails if `hints` asserts continuity the offsets do not have.
    pub fn from_parts(
        shape: Shape,
        strides: Strides,
        boundary: Interval,
        hints: Hints,
    ) -> Result<Self, ArrayError> {
        if shape.rank() != strides.rank() {
            return Err(ArrayError::invalid(format!(
                "{} dims with {} strides",
                shape.rank(),
                strides.rank()
            )));
        }
        if !boundary.isbound() || boundary.start() < 0 {
            return Err(ArrayError::invalid(format!(
                "offset boundary {} is not a storage range",
                boundary
            )));
        }
        if shape.is_empty() {
            return Ok(Self::default());
        }
        let total = shape.checked_numel()?;
        let width = boundary.absdiff() as usize;
        if hints.contains(Hints::CONTINUOUS) && width != total {
            return Err(ArrayError::invalid(format!(
                "continuous hint with {} addressed offsets for {} elements",
                width, total
            )));
        }
        let layout = if width == total {
            Hints::CONTINUOUS
        } else {
            Hints::SLICED
        };
        let hints = hints.without(Hints::CONTINUOUS | Hints::SLICED) | layout;
        Ok(Self {
            shape,
            strides,
            boundary,
            hints,
        })
    }

    /// Derives the offset boundary of a layout from its first offset.
    fn derive(shape: Shape, strides: Strides, base: usize, hints: Hints) -> Result<Self, ArrayError> {
        let total = shape.checked_numel()?;
        let mut last = base;
        if total > 0 {
            for (&d, &s) in shape.iter().zip(strides.iter()) {
                last = Enforcer::checked_add(last, Enforcer::checked_mul(d - 1, s)?)?;
            }
        }
        let stop = if total > 0 {
            Enforcer::checked_add(last, 1)?
        } else {
            base
        };
        Self::from_parts(shape, strides, Interval::span(base, stop), hints)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.inner()
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn boundary(&self) -> Interval {
        self.boundary
    }

    pub fn hints(&self) -> Hints {
        self.hints
    }

    /// First addressed storage offset.
    pub fn offset(&self) -> usize {
        self.boundary.start() as usize
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn total(&self) -> usize {
        self.shape.numel()
    }

    /// A no-value descriptor, one without dims.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn is_continuous(&self) -> bool {
        self.hints.contains(Hints::CONTINUOUS)
    }

    pub fn is_sliced(&self) -> bool {
        self.hints.contains(Hints::SLICED)
    }

    pub fn is_transposed(&self) -> bool {
        self.hints.contains(Hints::TRANSPOSED)
    }

    /// Continuous and in storage order, so logical index `i` lives at `offset() + i`.
    pub fn is_standard(&self) -> bool {
        self.is_continuous() && !self.is_transposed()
    }

    pub fn is_scalar(&self) -> bool {
        self.total() == 1
    }

    pub fn is_vector(&self) -> bool {
        self.rank() == 1
    }

    pub fn is_matrix(&self) -> bool {
        self.rank() == 2
    }

    /// Restricts every axis to a boundary. Missing trailing boundaries select
    /// the whole axis; each boundary is clamped into `[0, dim)`.
    pub fn slice(&self, boundaries: &[Interval]) -> Result<Self, ArrayError> {
        if self.is_empty() {
            return Ok(self.clone());
        }
        if boundaries.len() > self.rank() {
            return Err(ArrayError::invalid(format!(
                "{} boundaries for array of rank {}",
                boundaries.len(),
                self.rank()
            )));
        }
        let mut shape: RVec<usize> = RVec::with_capacity(self.rank());
        let mut strides: RVec<usize> = RVec::with_capacity(self.rank());
        let mut base = self.offset();
        for axis in 0..self.rank() {
            let boundary = boundaries
                .get(axis)
                .copied()
                .unwrap_or_else(Interval::full)
                .clamp(self.shape[axis]);
            let stride = self.strides[axis];
            shape.push(boundary.absdiff() as usize);
            strides.push(Enforcer::checked_mul(stride, boundary.step() as usize)?);
            base = Enforcer::checked_add(
                base,
                Enforcer::checked_mul(boundary.start() as usize, stride)?,
            )?;
        }
        let hints = self.hints & Hints::TRANSPOSED;
        Self::derive(Shape::new(shape), Strides::new(strides), base, hints)
    }

    /// Restricts a single axis, see [`Descriptor::slice`].
    pub fn slice_axis(&self, boundary: Interval, axis: usize) -> Result<Self, ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        let mut boundaries: RVec<Interval> = rvec![Interval::full(); self.rank()];
        boundaries[axis] = boundary;
        self.slice(&boundaries)
    }

    /// Drops unit-extent axes. `max_count` limits the axes dropped at each end
    /// and is ignored by [`Squeeze::Full`]. At least one axis always remains.
    pub fn squeeze(&self, kind: Squeeze, max_count: Option<usize>) -> Result<Self, ArrayError> {
        if self.rank() <= 1 {
            return Ok(self.clone());
        }
        let limit = max_count.unwrap_or(usize::MAX);
        let rank = self.rank();
        let leading = self.shape.iter().take_while(|&&d| d == 1).count();
        let trailing = self.shape.iter().rev().take_while(|&&d| d == 1).count();
        let (left, right) = match kind {
            Squeeze::Left => (leading.min(limit), 0),
            Squeeze::Right => (0, trailing.min(limit)),
            Squeeze::Trim => (leading.min(limit), trailing.min(limit)),
            Squeeze::Full => (0, 0),
        };
        let mut keep: RVec<bool> = (0..rank)
            .map(|a| a >= left && a < rank - right.min(rank))
            .collect();
        if kind == Squeeze::Full {
            for (axis, k) in keep.iter_mut().enumerate() {
                *k = self.shape[axis] != 1;
            }
        }
        if keep.iter().all(|k| !k) {
            keep[rank - 1] = true;
        }
        let shape = (0..rank)
            .filter(|&a| keep[a])
            .map(|a| self.shape[a])
            .collect::<Shape>();
        let strides = (0..rank)
            .filter(|&a| keep[a])
            .map(|a| self.strides[a])
            .collect::<Strides>();
        Self::from_parts(shape, strides, self.boundary, self.hints)
    }

    /// Reorders axes by `perm`, a permutation of `[0, rank)`. No data moves.
    pub fn transpose(&self, perm: &[usize]) -> Result<Self, ArrayError> {
        Enforcer::check_permutation(perm, self.rank())?;
        let shape = perm.iter().map(|&a| self.shape[a]).collect::<Shape>();
        let strides = perm.iter().map(|&a| self.strides[a]).collect::<Strides>();
        let identity = perm.iter().enumerate().all(|(i, &a)| i == a);
        let hints = if identity {
            self.hints
        } else {
            self.hints | Hints::TRANSPOSED
        };
        Self::from_parts(shape, strides, self.boundary, hints)
    }

    pub fn swap(&self, a: usize, b: usize) -> Result<Self, ArrayError> {
        Enforcer::check_axis(a, self.rank())?;
        Enforcer::check_axis(b, self.rank())?;
        let mut perm = (0..self.rank()).collect::<RVec<_>>();
        perm.swap(a, b);
        self.transpose(&perm)
    }

    /// Moves axis `src` to position `dst`, shifting the axes between them.
    pub fn move_axis(&self, src: usize, dst: usize) -> Result<Self, ArrayError> {
        Enforcer::check_axis(src, self.rank())?;
        Enforcer::check_axis(dst, self.rank())?;
        let mut perm = (0..self.rank()).collect::<RVec<_>>();
        let axis = perm.remove(src);
        perm.insert(dst, axis);
        self.transpose(&perm)
    }

    /// Cyclically rotates the axes; axis `i` moves to `(i + offset) mod rank`.
    pub fn roll(&self, offset: isize) -> Result<Self, ArrayError> {
        let rank = self.rank();
        if rank == 0 {
            return Ok(self.clone());
        }
        let shift = offset.rem_euclid(rank as isize) as usize;
        let perm = (0..rank)
            .map(|i| (i + rank - shift) % rank)
            .collect::<RVec<_>>();
        self.transpose(&perm)
    }

    /// Fresh descriptor with `axis` removed, the output layout of a reduction.
    ///
    /// Reducing a vector yields shape `[1]`.
    pub fn reduce(&self, axis: usize) -> Result<Self, ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        if self.rank() == 1 {
            return Self::new(crate::dims![1]);
        }
        let mut shape = self.shape.clone();
        shape.remove(axis);
        Self::new(shape)
    }

    /// Drops strides, offset and hints, keeping only the dims.
    pub fn simplify(&self) -> Result<Self, ArrayError> {
        Self::new(self.shape.clone())
    }

    /// Storage offset of the element at `subs`.
    pub fn sub2ind(&self, subs: &[usize]) -> Result<usize, ArrayError> {
        Enforcer::check_subs(subs, &self.shape)?;
        subs.iter()
            .zip(self.strides.iter())
            .try_fold(self.offset(), |acc, (&s, &st)| {
                Enforcer::checked_add(acc, Enforcer::checked_mul(s, st)?)
            })
    }

    /// Subscripts of the element stored at `offset`.
    pub fn ind2sub(&self, offset: usize) -> Result<RVec<usize>, ArrayError> {
        if offset < self.offset() || offset as isize >= self.boundary.stop() {
            return Err(ArrayError::range(format!(
                "offset {} outside {}",
                offset, self.boundary
            )));
        }
        let mut rel = offset - self.offset();
        if self.is_standard() {
            return Ok(self.index_to_subs(rel));
        }
        let mut subs: RVec<usize> = rvec![0; self.rank()];
        let mut axes = (0..self.rank())
            .filter(|&a| self.shape[a] > 1)
            .collect::<RVec<_>>();
        axes.sort_by(|&a, &b| self.strides[b].cmp(&self.strides[a]));
        for axis in axes {
            let sub = rel / self.strides[axis];
            if sub >= self.shape[axis] {
                return Err(ArrayError::range(format!(
                    "offset {} is not addressed by {:?}",
                    offset, self.shape
                )));
            }
            subs[axis] = sub;
            rel -= sub * self.strides[axis];
        }
        if rel != 0 {
            return Err(ArrayError::invalid(format!(
                "offset {} falls between addressed elements",
                offset
            )));
        }
        Ok(subs)
    }

    /// Storage offset of the element at logical (row-major) `index`.
    pub fn ind2ind(&self, index: usize) -> Result<usize, ArrayError> {
        if index >= self.total() {
            return Err(ArrayError::range(format!(
                "index {} for {} elements",
                index,
                self.total()
            )));
        }
        if self.is_standard() {
            return Ok(self.offset() + index);
        }
        Ok(self.offset_of(&self.index_to_subs(index)))
    }

    /// Row-major subscripts of logical `index`; `index` must be below `total()`.
    pub fn index_to_subs(&self, mut index: usize) -> RVec<usize> {
        let mut subs: RVec<usize> = rvec![0; self.rank()];
        for axis in (0..self.rank()).rev() {
            let d = self.shape[axis];
            subs[axis] = index % d;
            index /= d;
        }
        subs
    }

    /// Unchecked [`Descriptor::sub2ind`]. Subscripts must be in range.
    #[inline]
    pub(crate) fn offset_of(&self, subs: &[usize]) -> usize {
        debug_assert_eq!(subs.len(), self.rank());
        subs.iter()
            .zip(self.strides.iter())
            .fold(self.offset(), |acc, (&s, &st)| acc + s * st)
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("dims", &self.shape)
            .field("strides", &self.strides)
            .field("boundary", &self.boundary)
            .field("hints", &self.hints)
            .finish()
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total: {}\ndims: {}\nstrides: {:?}\nindices_boundary: {}\nhints: {:?}",
            self.total(),
            self.shape,
            self.strides.inner(),
            self.boundary,
            self.hints
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dims, ErrorKind};
    use proptest::prelude::*;
    use test_strategy::proptest;

    fn iv(start: isize, stop: isize) -> Interval {
        Interval::between(start, stop, 1).unwrap()
    }

    #[proptest(cases = 64)]
    fn from_dims_is_continuous(#[any(vec![1..=5usize, 1..=5, 1..=5])] shape: Shape) {
        let info = Descriptor::new(shape.clone()).unwrap();
        prop_assert_eq!(info.total(), shape.iter().product::<usize>());
        prop_assert!(info.is_continuous());
        prop_assert_eq!(info.boundary().absdiff() as usize, info.total());
    }

    #[proptest(cases = 32)]
    fn sub2ind_round_trip(#[any(vec![1..=4usize, 1..=4, 1..=4])] shape: Shape) {
        let info = Descriptor::new(shape)
            .unwrap()
            .slice(&[Interval::between(0, 4, 2).unwrap()])
            .unwrap()
            .transpose(&[2, 0, 1])
            .unwrap();
        for index in 0..info.total() {
            let subs = info.index_to_subs(index);
            let offset = info.sub2ind(&subs).unwrap();
            prop_assert_eq!(info.ind2sub(offset).unwrap(), subs);
        }
    }

    #[test]
    fn slice_rows_and_cols() {
        let info = Descriptor::new(dims![2, 3]).unwrap();
        let sliced = info.slice(&[iv(0, 2), iv(1, 3)]).unwrap();
        assert_eq!(sliced.dims(), &[2, 2]);
        assert_eq!(sliced.strides().to_vec(), vec![3, 1]);
        assert_eq!(sliced.offset(), 1);
        assert!(sliced.is_sliced());
        assert_eq!(sliced.ind2ind(2).unwrap(), 4);

        let row = info.slice(&[iv(1, 2)]).unwrap();
        assert!(row.is_continuous());
        assert_eq!(row.offset(), 3);
    }

    #[test]
    fn slice_with_step_and_clamp() {
        let info = Descriptor::new(dims![10]).unwrap();
        let b = Interval::between(1, 20, 3).unwrap();
        let sliced = info.slice(&[b]).unwrap();
        assert_eq!(sliced.dims(), &[b.clamp(10).absdiff() as usize]);
        assert_eq!(sliced.dims(), &[3]);
        assert_eq!(sliced.strides().to_vec(), vec![3]);
        assert_eq!(
            (0..3).map(|i| sliced.ind2ind(i).unwrap()).collect::<Vec<_>>(),
            vec![1, 4, 7]
        );
    }

    #[test]
    fn too_many_boundaries() {
        let info = Descriptor::new(dims![2]).unwrap();
        let err = info.slice(&[iv(0, 1), iv(0, 1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn transpose_marks_hint() {
        let info = Descriptor::new(dims![2, 3]).unwrap();
        let t = info.transpose(&[1, 0]).unwrap();
        assert_eq!(t.dims(), &[3, 2]);
        assert_eq!(t.strides().to_vec(), vec![1, 3]);
        assert!(t.is_transposed() && t.is_continuous() && !t.is_standard());
        assert_eq!(
            (0..6).map(|i| t.ind2ind(i).unwrap()).collect::<Vec<_>>(),
            vec![0, 3, 1, 4, 2, 5]
        );
        assert!(!info.transpose(&[0, 1]).unwrap().is_transposed());
    }

    #[test]
    fn convenience_permutations() {
        let info = Descriptor::new(dims![2, 3, 4]).unwrap();
        assert_eq!(info.swap(0, 2).unwrap().dims(), &[4, 3, 2]);
        assert_eq!(info.move_axis(0, 2).unwrap().dims(), &[3, 4, 2]);
        assert_eq!(info.roll(1).unwrap().dims(), &[4, 2, 3]);
        assert_eq!(info.roll(-1).unwrap().dims(), &[3, 4, 2]);
        assert_eq!(info.roll(3).unwrap().dims(), &[2, 3, 4]);
    }

    #[test]
    fn squeeze_kinds() {
        let info = Descriptor::new(dims![1, 1, 3, 1, 2, 1]).unwrap();
        assert_eq!(info.squeeze(Squeeze::Left, None).unwrap().dims(), &[3, 1, 2, 1]);
        assert_eq!(info.squeeze(Squeeze::Right, None).unwrap().dims(), &[1, 1, 3, 1, 2]);
        assert_eq!(info.squeeze(Squeeze::Trim, None).unwrap().dims(), &[3, 1, 2]);
        assert_eq!(info.squeeze(Squeeze::Full, Some(1)).unwrap().dims(), &[3, 2]);
        assert_eq!(info.squeeze(Squeeze::Left, Some(1)).unwrap().dims(), &[1, 3, 1, 2, 1]);
        let ones = Descriptor::new(dims![1, 1]).unwrap();
        assert_eq!(ones.squeeze(Squeeze::Full, None).unwrap().dims(), &[1]);
    }

    #[test]
    fn reduce_and_simplify() {
        let info = Descriptor::new(dims![2, 3, 4]).unwrap();
        assert_eq!(info.reduce(1).unwrap().dims(), &[2, 4]);
        assert_eq!(info.reduce(3).unwrap_err().kind(), ErrorKind::OutOfRange);
        let v = Descriptor::new(dims![5]).unwrap();
        assert_eq!(v.reduce(0).unwrap().dims(), &[1]);
        assert!(v.is_vector() && !v.is_matrix());
        assert!(info.reduce(0).unwrap().is_matrix());

        let t = info.transpose(&[2, 1, 0]).unwrap().simplify().unwrap();
        assert!(t.is_standard());
        assert_eq!(t.dims(), &[4, 3, 2]);
    }

    #[test]
    fn from_parts_rejects_false_continuity() {
        let err = Descriptor::from_parts(
            dims![2, 2],
            Strides::new(rvec![3, 1]),
            iv(0, 5),
            Hints::CONTINUOUS,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let ok = Descriptor::from_parts(dims![2, 2], Strides::new(rvec![3, 1]), iv(0, 5), Hints::NONE)
            .unwrap();
        assert!(ok.is_sliced());
    }

    #[test]
    fn sub2ind_checks() {
        let info = Descriptor::new(dims![2, 3]).unwrap();
        assert_eq!(info.sub2ind(&[1, 2]).unwrap(), 5);
        assert_eq!(info.sub2ind(&[2, 0]).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(info.sub2ind(&[1]).unwrap_err().kind(), ErrorKind::InvalidArgument);
        let sliced = info.slice(&[Interval::full(), Interval::between(0, 3, 2).unwrap()]).unwrap();
        assert_eq!(sliced.ind2sub(1).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn overflowing_dims() {
        let err = Descriptor::new(dims![usize::MAX / 2, 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }
}

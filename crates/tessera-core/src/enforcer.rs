use crate::Shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    #[strum(serialize = "invalid argument")]
    InvalidArgument,
    #[strum(serialize = "out of range")]
    OutOfRange,
    #[strum(serialize = "overflow")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("overflow: {0}")]
    Overflow(String),
}

impl ArrayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArrayError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ArrayError::OutOfRange(_) => ErrorKind::OutOfRange,
            ArrayError::Overflow(_) => ErrorKind::Overflow,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ArrayError::InvalidArgument(msg.into())
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        ArrayError::OutOfRange(msg.into())
    }

    pub(crate) fn overflow(msg: impl Into<String>) -> Self {
        ArrayError::Overflow(msg.into())
    }
}

/// # Enforcer
///
/// Enforcer enforces common invariants on shapes, axes and offsets.
pub struct Enforcer;

impl Enforcer {
    pub fn check_axis(axis: usize, rank: usize) -> Result<(), ArrayError> {
        if axis >= rank {
            return Err(ArrayError::range(format!(
                "axis {} for array of rank {}",
                axis, rank
            )));
        }
        Ok(())
    }

    /// Checks that `perm` is a permutation of `[0, rank)`.
    pub fn check_permutation(perm: &[usize], rank: usize) -> Result<(), ArrayError> {
        if perm.len() != rank {
            return Err(ArrayError::invalid(format!(
                "permutation of length {} for array of rank {}",
                perm.len(),
                rank
            )));
        }
        let mut seen = crate::rvec![false; rank];
        for &axis in perm {
            Self::check_axis(axis, rank)?;
            if seen[axis] {
                return Err(ArrayError::invalid("duplicate dims in permutation"));
            }
            seen[axis] = true;
        }
        Ok(())
    }

    pub fn check_subs(subs: &[usize], shape: &Shape) -> Result<(), ArrayError> {
        if subs.len() != shape.rank() {
            return Err(ArrayError::invalid(format!(
                "{} subscripts for array of rank {}",
                subs.len(),
                shape.rank()
            )));
        }
        for (axis, (&s, &d)) in subs.iter().zip(shape.iter()).enumerate() {
            if s >= d {
                return Err(ArrayError::range(format!(
                    "subscript {} at axis {} exceeds dim {}",
                    s, axis, d
                )));
            }
        }
        Ok(())
    }

    pub fn assert_equal_ranks(a: &Shape, b: &Shape) -> Result<usize, ArrayError> {
        if a.rank() != b.rank() {
            return Err(ArrayError::invalid(format!(
                "rank mismatch. {} != {}",
                a.rank(),
                b.rank()
            )));
        }
        Ok(a.rank())
    }

    /// Shapes must agree on every axis but `axis`.
    pub fn match_shapes_except(a: &Shape, b: &Shape, axis: usize) -> Result<(), ArrayError> {
        let rank = Self::assert_equal_ranks(a, b)?;
        Self::check_axis(axis, rank)?;
        for i in (0..rank).filter(|&i| i != axis) {
            if a[i] != b[i] {
                return Err(ArrayError::invalid(format!(
                    "shape mismatch at {}, {} != {}",
                    i, a[i], b[i]
                )));
            }
        }
        Ok(())
    }

    pub fn checked_mul(a: usize, b: usize) -> Result<usize, ArrayError> {
        a.checked_mul(b)
            .ok_or_else(|| ArrayError::overflow(format!("{} * {}", a, b)))
    }

    pub fn checked_add(a: usize, b: usize) -> Result<usize, ArrayError> {
        a.checked_add(b)
            .ok_or_else(|| ArrayError::overflow(format!("{} + {}", a, b)))
    }

    pub fn checked_numel(dims: &[usize]) -> Result<usize, ArrayError> {
        dims.iter().try_fold(1, |acc, &d| Self::checked_mul(acc, d))
    }
}

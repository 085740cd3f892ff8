use crate::{ArrayError, Enforcer, RVec, Shape};

/// Per-axis distance, in elements, between neighbouring storage offsets.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Strides(RVec<usize>);

impl Strides {
    pub fn new(strides: RVec<usize>) -> Self {
        Self(strides)
    }

    pub fn inner(&self) -> &RVec<usize> {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    /// Row-major strides, a right-to-left exclusive product scan of `shape`.
    pub fn row_major(shape: &Shape) -> Result<Self, ArrayError> {
        let mut strides: RVec<usize> = RVec::with_capacity(shape.rank());
        let mut stride = 1usize;
        for &size in shape.iter().rev() {
            strides.push(stride);
            stride = Enforcer::checked_mul(stride, size)?;
        }
        strides.reverse();
        Ok(Self(strides))
    }
}

impl std::fmt::Debug for Strides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shape = format!("[{}", self.0.first().unwrap_or(&0));
        for dim in self.0.iter().skip(1) {
            shape.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", shape)
    }
}

impl std::ops::Index<usize> for Strides {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Strides {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl FromIterator<usize> for Strides {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Strides(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::dims;

    #[test]
    fn test_strides() {
        use super::*;
        let shape = dims![2, 3, 4];
        let strides = Strides::row_major(&shape).unwrap();
        assert_eq!(strides.to_vec(), vec![12, 4, 1]);
        assert_eq!(Strides::row_major(&dims![5]).unwrap().to_vec(), vec![1]);
    }

    #[test]
    fn overflowing_strides() {
        use super::*;
        let shape = dims![usize::MAX, 2, 2];
        assert!(Strides::row_major(&shape).is_err());
    }
}

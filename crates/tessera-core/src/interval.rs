use crate::ArrayError;

/// # Interval
///
/// Right-open axis range `[start, stop)` walked with a positive `step`.
///
/// Either end may be unbounded, denoted by the [`Interval::NEGINF`] and
/// [`Interval::POSINF`] sentinels. Unbounded ends are resolved against a
/// concrete axis with [`Interval::bound`].
#[derive(Clone, Copy)]
pub struct Interval {
    start: isize,
    stop: isize,
    step: isize,
}

impl Interval {
    pub const NEGINF: isize = isize::MIN;
    pub const POSINF: isize = isize::MAX;

    pub fn new(start: isize, stop: isize, step: isize) -> Result<Self, ArrayError> {
        if start > stop {
            return Err(ArrayError::invalid(format!(
                "interval start {} exceeds stop {}",
                start, stop
            )));
        }
        if step <= 0 {
            return Err(ArrayError::invalid(format!(
                "interval step {} is not positive",
                step
            )));
        }
        let interval = Self { start, stop, step };
        if interval.isbound() && stop.checked_sub(start).is_none() {
            return Err(ArrayError::overflow(format!(
                "interval [{}, {}) span",
                start, stop
            )));
        }
        Ok(interval)
    }

    /// The single position `pos`, i.e. `[pos, pos + 1)`.
    pub fn at(pos: isize) -> Result<Self, ArrayError> {
        let stop = pos
            .checked_add(1)
            .filter(|&stop| stop != Self::POSINF)
            .ok_or_else(|| ArrayError::overflow(format!("interval at {}", pos)))?;
        Self::new(pos, stop, 1)
    }

    pub fn from(start: isize) -> Result<Self, ArrayError> {
        Self::new(start, Self::POSINF, 1)
    }

    pub fn to(stop: isize) -> Result<Self, ArrayError> {
        Self::new(Self::NEGINF, stop, 1)
    }

    pub fn between(start: isize, stop: isize, step: isize) -> Result<Self, ArrayError> {
        Self::new(start, stop, step)
    }

    pub fn full() -> Self {
        Self {
            start: Self::NEGINF,
            stop: Self::POSINF,
            step: 1,
        }
    }

    /// Bounded range over `[0, len)` with unit step, cannot fail for `usize` lengths
    /// that fit the index type.
    pub(crate) fn span(start: usize, stop: usize) -> Self {
        debug_assert!(start <= stop);
        Self {
            start: start as isize,
            stop: stop as isize,
            step: 1,
        }
    }

    pub fn start(&self) -> isize {
        self.start
    }

    pub fn stop(&self) -> isize {
        self.stop
    }

    pub fn step(&self) -> isize {
        self.step
    }

    pub fn isleftbound(&self) -> bool {
        self.start != Self::NEGINF && self.stop == Self::POSINF
    }

    pub fn isrightbound(&self) -> bool {
        self.start == Self::NEGINF && self.stop != Self::POSINF
    }

    pub fn isbound(&self) -> bool {
        self.start != Self::NEGINF && self.stop != Self::POSINF
    }

    pub fn isunbound(&self) -> bool {
        self.start == Self::NEGINF && self.stop == Self::POSINF
    }

    /// Bounded and contained in `[lo, hi)`.
    pub fn isbetween(&self, lo: isize, hi: isize) -> bool {
        self.isbound() && lo <= self.start && self.stop <= hi
    }

    pub fn empty(&self) -> bool {
        self.start == self.stop
    }

    /// Number of positions visited, [`Interval::POSINF`] when either end is unbounded.
    pub fn absdiff(&self) -> isize {
        if !self.isbound() {
            return Self::POSINF;
        }
        let width = self.stop - self.start;
        width / self.step + isize::from(width % self.step != 0)
    }

    /// Replaces unbounded ends with `lo` and `hi`.
    pub fn bound(&self, lo: isize, hi: isize) -> Self {
        Self {
            start: if self.start == Self::NEGINF { lo } else { self.start },
            stop: if self.stop == Self::POSINF { hi } else { self.stop },
            step: self.step,
        }
    }

    /// Bounds unbounded ends to `[0, len)` and clamps the result into the same range.
    pub fn clamp(&self, len: usize) -> Self {
        let len = len as isize;
        let bounded = self.bound(0, len);
        let start = bounded.start.clamp(0, len);
        let stop = bounded.stop.clamp(start, len);
        Self {
            start,
            stop,
            step: self.step,
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::full()
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        (self.empty() && other.empty())
            || (self.start == other.start && self.stop == other.stop && self.step == other.step)
    }
}

impl Eq for Interval {}

impl std::hash::Hash for Interval {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.empty() {
            0isize.hash(state);
        } else {
            (self.start, self.stop, self.step).hash(state);
        }
    }
}

impl std::fmt::Debug for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_end = |v: isize| match v {
            Self::NEGINF => "-inf".to_string(),
            Self::POSINF => "+inf".to_string(),
            v => v.to_string(),
        };
        write!(f, "[{}, {})", fmt_end(self.start), fmt_end(self.stop))?;
        if self.step != 1 {
            write!(f, ":{}", self.step)?;
        }
        Ok(())
    }
}

impl TryFrom<std::ops::Range<usize>> for Interval {
    type Error = ArrayError;

    fn try_from(range: std::ops::Range<usize>) -> Result<Self, Self::Error> {
        let start = isize::try_from(range.start)
            .map_err(|_| ArrayError::overflow(format!("interval start {}", range.start)))?;
        let stop = isize::try_from(range.end)
            .map_err(|_| ArrayError::overflow(format!("interval stop {}", range.end)))?;
        Self::new(start, stop, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn absdiff_counts_steps() {
        assert_eq!(Interval::between(1, 5, 2).unwrap().absdiff(), 2);
        assert_eq!(Interval::between(1, 6, 2).unwrap().absdiff(), 3);
        assert_eq!(Interval::between(3, 3, 1).unwrap().absdiff(), 0);
        assert_eq!(Interval::from(2).unwrap().absdiff(), Interval::POSINF);
        assert_eq!(Interval::full().absdiff(), Interval::POSINF);
    }

    #[test]
    fn at_is_unit_interval() {
        assert_eq!(Interval::at(3).unwrap(), Interval::new(3, 4, 1).unwrap());
        assert_eq!(Interval::at(isize::MAX - 1).unwrap_err().kind(), ErrorKind::Overflow);
    }

    #[test]
    fn empty_intervals_are_equal() {
        let a = Interval::between(2, 2, 1).unwrap();
        let b = Interval::between(7, 7, 3).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Interval::at(2).unwrap());
    }

    #[test]
    fn invalid_construction() {
        assert_eq!(
            Interval::new(4, 2, 1).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Interval::new(0, 2, 0).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Interval::new(-(isize::MAX - 1), isize::MAX - 1, 1)
                .unwrap_err()
                .kind(),
            ErrorKind::Overflow
        );
    }

    #[test]
    fn predicates() {
        let from = Interval::from(1).unwrap();
        let to = Interval::to(4).unwrap();
        assert!(from.isleftbound() && !from.isbound());
        assert!(to.isrightbound() && !to.isunbound());
        assert!(Interval::full().isunbound());
        assert!(Interval::between(1, 3, 1).unwrap().isbetween(0, 3));
        assert!(!Interval::between(1, 4, 1).unwrap().isbetween(0, 3));
    }

    #[test]
    fn bound_and_clamp() {
        let b = Interval::from(2).unwrap().bound(0, 10);
        assert_eq!(b, Interval::between(2, 10, 1).unwrap());
        let c = Interval::between(3, 20, 2).unwrap().clamp(6);
        assert_eq!((c.start(), c.stop(), c.step()), (3, 6, 2));
        assert_eq!(Interval::full().clamp(4).absdiff(), 4);
    }
}

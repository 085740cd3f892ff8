use crate::{ArrayError, Descriptor, Indexer, Interval, Position, RVec, Shape};
use derive_new::new;

/// How a window behaves at the edges of its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum WindowPolicy {
    /// The window must fit inside the axis, so the centers it visits shrink
    /// by the window width.
    Complete,
    /// The window is clipped at the axis edges and visits every center.
    Partial,
}

/// A window around a center position on one axis.
///
/// `range` is relative to the center: `[-1, 2)` covers the center and its
/// two neighbours. The range step becomes the step of the produced boundary.
/// An unbounded range covers the whole axis and visits a single center.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    range: Interval,
    policy: WindowPolicy,
    #[new(value = "1")]
    stride: usize,
}

impl Window {
    pub fn complete(range: Interval) -> Self {
        Self::new(range, WindowPolicy::Complete)
    }

    pub fn partial(range: Interval) -> Self {
        Self::new(range, WindowPolicy::Partial)
    }

    /// Whole-axis window.
    pub fn full() -> Self {
        Self::new(Interval::full(), WindowPolicy::Complete)
    }

    /// Distance between consecutive centers, one by default.
    pub fn with_stride(mut self, stride: usize) -> Result<Self, ArrayError> {
        if stride == 0 {
            return Err(ArrayError::invalid("window stride must be positive"));
        }
        self.stride = stride;
        Ok(self)
    }

    pub fn range(&self) -> Interval {
        self.range
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

#[derive(Debug, Clone)]
struct AxisWindow {
    window: Window,
    dim: usize,
    first: isize,
}

/// # WindowSlider
///
/// Cursor producing one boundary per axis at each step: the window around
/// the current center.
///
/// Centers are walked row-major by an [`Indexer`] over a descriptor whose dims
/// are the number of centers on each axis.
#[derive(Debug, Clone)]
pub struct WindowSlider {
    axes: RVec<AxisWindow>,
    indexer: Indexer,
}

impl WindowSlider {
    /// Slides `windows` over `info`. Axes without a window get [`Window::full`].
    pub fn new(info: &Descriptor, windows: &[Window]) -> Result<Self, ArrayError> {
        if windows.len() > info.rank() {
            return Err(ArrayError::invalid(format!(
                "{} windows for array of rank {}",
                windows.len(),
                info.rank()
            )));
        }
        let mut axes = RVec::with_capacity(info.rank());
        let mut counts = Shape::default();
        for (axis, &dim) in info.dims().iter().enumerate() {
            let window = windows.get(axis).copied().unwrap_or_else(Window::full);
            let range = window.range;
            if range.isleftbound() || range.isrightbound() {
                return Err(ArrayError::invalid(format!(
                    "half-open window {} at axis {} is not supported",
                    range, axis
                )));
            }
            let (first, count) = if range.isunbound() {
                (0, 1)
            } else {
                let stride = window.stride as isize;
                let (lo, hi) = match window.policy {
                    WindowPolicy::Complete => ((-range.start()).max(0), dim as isize - range.stop()),
                    WindowPolicy::Partial => (0, dim as isize - 1),
                };
                let count = if hi >= lo { (hi - lo) / stride + 1 } else { 0 };
                (lo, count as usize)
            };
            counts.push(count);
            axes.push(AxisWindow { window, dim, first });
        }
        let info = Descriptor::new(counts)?;
        Ok(Self {
            axes,
            indexer: Indexer::new(&info, Position::Begin),
        })
    }

    /// Number of centers along each axis.
    pub fn counts(&self) -> &Shape {
        self.indexer.info().shape()
    }

    /// Number of windows visited by a full traversal.
    pub fn len(&self) -> usize {
        self.indexer.info().total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> isize {
        self.indexer.index()
    }

    pub fn is_end(&self) -> bool {
        self.indexer.is_end()
    }

    pub fn is_rend(&self) -> bool {
        self.indexer.is_rend()
    }

    pub fn inc(&mut self) {
        self.indexer.inc();
    }

    pub fn dec(&mut self) {
        self.indexer.dec();
    }

    pub fn advance(&mut self, count: usize) {
        self.indexer.advance(count);
    }

    pub fn retreat(&mut self, count: usize) {
        self.indexer.retreat(count);
    }

    /// Center position on each axis at the current step.
    pub fn centers(&self) -> RVec<usize> {
        self.axes
            .iter()
            .zip(self.indexer.subs())
            .map(|(a, &sub)| (a.first + (sub * a.window.stride) as isize) as usize)
            .collect()
    }

    /// Per-axis boundaries of the window at the current step.
    pub fn window(&self) -> RVec<Interval> {
        self.axes
            .iter()
            .zip(self.centers())
            .map(|(a, center)| {
                let range = a.window.range;
                if range.isunbound() {
                    return range.clamp(a.dim);
                }
                let center = center as isize;
                let boundary = Interval::between(
                    center + range.start(),
                    center + range.stop(),
                    range.step(),
                );
                match boundary {
                    Ok(b) if a.window.policy == WindowPolicy::Complete => b,
                    Ok(b) => b.clamp(a.dim),
                    Err(_) => Interval::span(0, 0),
                }
            })
            .collect()
    }
}

impl Iterator for WindowSlider {
    type Item = RVec<Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.indexer.is_rend() {
            self.indexer.inc();
        }
        if self.indexer.is_end() {
            return None;
        }
        let window = self.window();
        self.indexer.inc();
        Some(window)
    }
}

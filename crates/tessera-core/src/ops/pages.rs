use crate::{Array, ArrayError, Enforcer, Interval, RVec, Squeeze, Window, WindowSlider};
use itertools::Itertools;

impl<T> Array<T> {
    /// Views over the trailing `page_rank` axes, one per position of the
    /// leading axes, arranged in an array shaped like the leading axes.
    ///
    /// An array with at most `page_rank` axes is its own single page.
    pub fn pages(&self, page_rank: usize) -> Result<Array<Array<T>>, ArrayError> {
        if page_rank == 0 {
            return Err(ArrayError::invalid("pages must have at least one axis"));
        }
        if self.is_empty() {
            return Ok(Array::empty());
        }
        if self.rank() <= page_rank {
            return Ok(Array::from(vec![self.view(self.info().clone())]));
        }
        let lead = self.rank() - page_rank;
        let windows = (0..lead)
            .map(|_| Window::complete(Interval::span(0, 1)))
            .collect::<RVec<_>>();
        let slider = WindowSlider::new(self.info(), &windows)?;
        let outer = WindowSlider::counts(&slider).slice(0..lead);
        let pages = slider
            .map(|window| {
                let info = self
                    .info()
                    .slice(&window)?
                    .squeeze(Squeeze::Left, Some(lead))?;
                Ok(self.view(info))
            })
            .collect::<Result<Vec<_>, ArrayError>>()?;
        Array::from_data(outer, pages)
    }

    /// The views left after removing position `index` along `axis`: the part
    /// before it and the part after it, skipping empty parts.
    pub fn exclude(&self, axis: usize, index: usize) -> Result<Array<Array<T>>, ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        let extent = self.dims()[axis];
        if index >= extent {
            return Err(ArrayError::range(format!(
                "exclude {} along axis {} of extent {}",
                index, axis, extent
            )));
        }
        let parts = [Interval::span(0, index), Interval::span(index + 1, extent)]
            .into_iter()
            .filter(|part| !part.empty())
            .map(|part| self.slice_axis(part, axis))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Array::from(parts))
    }

    /// Consecutive views of `chunk` positions along `axis`; the last one may
    /// be shorter.
    pub fn expand(&self, axis: usize, chunk: usize) -> Result<Array<Array<T>>, ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        let mut windows = (0..axis).map(|_| Window::full()).collect::<RVec<_>>();
        windows.push(Window::partial(Interval::span(0, chunk.max(1))).with_stride(chunk)?);
        let parts = WindowSlider::new(self.info(), &windows)?
            .map(|window| Ok(self.view(self.info().slice(&window)?)))
            .collect::<Result<Vec<_>, ArrayError>>()?;
        Ok(Array::from(parts))
    }

    /// Views between consecutive `positions` along `axis`, skipping empty ones.
    ///
    /// `positions` must be ascending and within the axis.
    pub fn split(&self, axis: usize, positions: &[usize]) -> Result<Array<Array<T>>, ArrayError> {
        Enforcer::check_axis(axis, self.rank())?;
        let extent = self.dims()[axis];
        if let Some((a, b)) = positions.iter().tuple_windows().find(|(a, b)| a > b) {
            return Err(ArrayError::invalid(format!(
                "split positions {} and {} are not ascending",
                a, b
            )));
        }
        if let Some(&last) = positions.last().filter(|&&p| p > extent) {
            return Err(ArrayError::range(format!(
                "split at {} along axis {} of extent {}",
                last, axis, extent
            )));
        }
        let parts = std::iter::once(0)
            .chain(positions.iter().copied())
            .chain(std::iter::once(extent))
            .tuple_windows()
            .filter(|(start, stop)| start < stop)
            .map(|(start, stop)| self.slice_axis(Interval::span(start, stop), axis))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Array::from(parts))
    }
}

impl<T: Clone> Array<T> {
    /// Applies `f` to every page and assembles the results along the leading
    /// axes. Every result must have the same dims.
    pub fn browse<R: Clone>(
        &self,
        page_rank: usize,
        mut f: impl FnMut(&Array<T>) -> Result<Array<R>, ArrayError>,
    ) -> Result<Array<R>, ArrayError> {
        if self.rank() <= page_rank {
            return f(self);
        }
        let pages = self.pages(page_rank)?;
        let results = pages
            .to_vec()
            .iter()
            .map(&mut f)
            .collect::<Result<Vec<_>, _>>()?;
        Array::from_data(pages.shape().clone(), results)?.book()
    }
}

/// The only axis along which `arrays` differ, if there is exactly one.
fn differing_axis<T>(arrays: &[Array<T>]) -> Option<usize> {
    let rank = arrays.first()?.rank();
    if !arrays.iter().all(|a| a.rank() == rank) {
        return None;
    }
    let axes = (0..rank)
        .filter(|&axis| !arrays.iter().map(|a| a.dims()[axis]).all_equal())
        .collect::<Vec<_>>();
    match axes[..] {
        [axis] => Some(axis),
        _ => None,
    }
}

impl<T: Clone> Array<Array<T>> {
    /// The array every element was taken from, if they share one that is
    /// still alive and the elements, in logical order, address each of its
    /// offsets once and in its own order.
    fn common_creator(&self) -> Option<Array<T>> {
        let inner = self.to_vec();
        let first = inner.first()?;
        if !inner
            .iter()
            .all(|a| a.creator_link().same(first.creator_link()))
        {
            return None;
        }
        let creator = first.creator()?;
        let tiled = inner.iter().all(|a| a.shares_storage(&creator))
            && inner.iter().flat_map(Array::indices).eq(creator.indices());
        if !tiled {
            log::trace!("elements do not tile their creator {:?}", creator.shape());
            return None;
        }
        Some(creator)
    }

    /// Stacks equally shaped elements: the result dims are the outer dims
    /// followed by the inner dims. A single element is copied as is.
    fn stack(&self, inner: &[Array<T>]) -> Result<Array<T>, ArrayError> {
        if let [single] = inner {
            return Ok(single.copy());
        }
        let mut shape = self.shape().clone();
        for &d in inner.first().map(Array::dims).unwrap_or_default() {
            shape.push(d);
        }
        let data = inner.iter().flat_map(Array::to_vec).collect::<Vec<_>>();
        log::debug!("stacked {} arrays into {:?}", inner.len(), shape);
        Array::from_data(shape, data)
    }

    /// Reassembles an array of arrays into one array.
    ///
    /// Elements taken from the same live array give back that array, sharing
    /// its storage. Otherwise equally shaped elements are stacked, and
    /// elements along a single outer axis that differ in a single axis are
    /// concatenated along it.
    pub fn collapse(&self) -> Result<Array<T>, ArrayError> {
        if self.is_empty() {
            return Ok(Array::empty());
        }
        if let Some(creator) = self.common_creator() {
            log::debug!("collapsed {} arrays into their creator", self.total());
            return Ok(creator);
        }
        let inner = self.to_vec();
        if inner.iter().map(Array::dims).all_equal() {
            return self.stack(&inner);
        }
        let filled = inner
            .into_iter()
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>();
        if self.shape().non_unit_count() <= 1 {
            if let Some(axis) = differing_axis(&filled) {
                log::debug!("concatenated {} arrays along axis {}", filled.len(), axis);
                return Array::concat(&filled, axis);
            }
        }
        Err(ArrayError::invalid(format!(
            "cannot infer how to collapse {:?} arrays",
            self.shape()
        )))
    }

    /// As [`Array::collapse`], but only ever stacks.
    pub fn book(&self) -> Result<Array<T>, ArrayError> {
        if self.is_empty() {
            return Ok(Array::empty());
        }
        if let Some(creator) = self.common_creator() {
            log::debug!("booked {} arrays into their creator", self.total());
            return Ok(creator);
        }
        let inner = self.to_vec();
        if !inner.iter().map(Array::dims).all_equal() {
            return Err(ArrayError::invalid(format!(
                "cannot book arrays of different dims into {:?}",
                self.shape()
            )));
        }
        self.stack(&inner)
    }

    /// Concatenates the elements along `axis`, the inverse of [`Array::exclude`]
    /// once the excluded part is put back.
    pub fn merge(&self, axis: usize) -> Result<Array<T>, ArrayError> {
        Array::concat(&self.to_vec(), axis)
    }
}

#[cfg(test)]
mod tests {
    use crate::{dims, Array, ErrorKind};

    fn cube() -> Array<i32> {
        Array::from_fn(dims![2, 3, 4], |i| i as i32).unwrap()
    }

    #[test]
    fn pages_of_a_cube() -> anyhow::Result<()> {
        let a = cube();
        let pages = a.pages(2)?;
        assert_eq!(pages.dims(), &[2]);
        let second = pages.at(1)?;
        assert_eq!(second.dims(), &[3, 4]);
        assert_eq!(second.at(0)?, 12);
        second.set(0, -1)?;
        assert_eq!(a.at(12)?, -1);
        let rows = a.pages(1)?;
        assert_eq!(rows.dims(), &[2, 3]);
        assert_eq!(rows.at(4)?.to_vec(), vec![16, 17, 18, 19]);
        assert_eq!(a.pages(3)?.total(), 1);
        assert_eq!(a.pages(0).unwrap_err().kind(), ErrorKind::InvalidArgument);
        Ok(())
    }

    #[test]
    fn collapse_recovers_live_creator() -> anyhow::Result<()> {
        let a = cube();
        let pages = a.pages(2)?;
        let whole = pages.collapse()?;
        assert!(whole.shares_storage(&a));
        assert_eq!(whole, a);
        let booked = pages.book()?;
        assert_eq!(booked.dims(), &[2, 3, 4]);
        Ok(())
    }

    #[test]
    fn collapse_without_creator_stacks() -> anyhow::Result<()> {
        let pages = cube().pages(2)?;
        let whole = pages.collapse()?;
        assert_eq!(whole.dims(), &[2, 3, 4]);
        assert_eq!(whole, cube());
        Ok(())
    }

    #[test]
    fn collapse_without_creator_concatenates() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![5, 3], |i| i as i32)?;
        let chunks = a.copy().expand(0, 2)?;
        assert_eq!(chunks.total(), 3);
        assert_eq!(chunks.at(2)?.dims(), &[1, 3]);
        let whole = chunks.collapse()?;
        assert_eq!(whole, a);
        assert!(chunks.book().is_err());
        Ok(())
    }

    #[test]
    fn mixed_creators_fall_back() -> anyhow::Result<()> {
        let a = cube();
        let b = cube();
        let mixed = Array::from(vec![a.pages(2)?.at(0)?, b.pages(2)?.at(1)?]);
        let whole = mixed.collapse()?;
        assert!(!whole.shares_storage(&a));
        assert_eq!(whole, cube());
        let ragged = Array::from_data(
            dims![2, 2],
            vec![
                Array::from(vec![1]),
                Array::from(vec![1, 2]),
                Array::from(vec![1]),
                Array::from(vec![1]),
            ],
        )?;
        assert_eq!(ragged.collapse().unwrap_err().kind(), ErrorKind::InvalidArgument);
        Ok(())
    }

    #[test]
    fn exclude_then_merge() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![3, 3], |i| i as i32)?;
        let parts = a.exclude(0, 1)?;
        assert_eq!(parts.total(), 2);
        let minor = parts.merge(0)?.exclude(1, 0)?.merge(1)?;
        assert_eq!(minor.dims(), &[2, 2]);
        assert_eq!(minor.to_vec(), vec![1, 2, 7, 8]);
        assert_eq!(a.exclude(0, 0)?.total(), 1);
        assert_eq!(a.exclude(1, 3).unwrap_err().kind(), ErrorKind::OutOfRange);
        Ok(())
    }

    #[test]
    fn split_positions() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![2, 6], |i| i as i32)?;
        let parts = a.split(1, &[1, 1, 4])?;
        assert_eq!(parts.total(), 3);
        assert_eq!(parts.at(1)?.to_vec(), vec![1, 2, 3, 7, 8, 9]);
        assert_eq!(parts.collapse()?, a);
        assert_eq!(a.split(1, &[3, 2]).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(a.split(1, &[7]).unwrap_err().kind(), ErrorKind::OutOfRange);
        Ok(())
    }

    #[test]
    fn browse_pages() -> anyhow::Result<()> {
        let a = cube();
        let sums = a.browse(2, |page| Ok(Array::from(vec![page.sum()])))?;
        assert_eq!(sums.dims(), &[2, 1]);
        assert_eq!(sums.to_vec(), vec![66, 210]);
        let transposed = a.browse(2, |page| page.t()?.with_policy(Default::default()))?;
        assert_eq!(transposed.dims(), &[2, 4, 3]);
        assert_eq!(transposed.at_subs(&[1, 0, 1])?, 16);
        Ok(())
    }

    #[test]
    fn browse_with_views() -> anyhow::Result<()> {
        let a = cube();
        let transposed = a.browse(2, |page| page.t())?;
        assert_eq!(transposed.dims(), &[2, 4, 3]);
        assert_eq!(transposed.at_subs(&[1, 0, 1])?, 16);
        assert!(!transposed.shares_storage(&a));
        let same = a.browse(2, |page| Ok(page.clone()))?;
        assert!(same.shares_storage(&a));
        assert_eq!(same, a);
        Ok(())
    }

    #[test]
    fn single_page_collapses_to_itself() -> anyhow::Result<()> {
        let a = cube();
        let page = a.pages(2)?.at(1)?;
        let whole = Array::from(vec![page.clone()]).collapse()?;
        assert_eq!(whole.dims(), &[3, 4]);
        assert_eq!(whole, page);
        assert!(!whole.shares_storage(&a));
        Ok(())
    }

    #[test]
    fn partial_split_stacks() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![6], |i| i as i32)?;
        let parts = a.split(0, &[2, 4])?;
        assert_eq!(parts.total(), 3);
        let ends = Array::from(vec![parts.at(0)?, parts.at(2)?]);
        let whole = ends.collapse()?;
        assert_eq!(whole.dims(), &[2, 2]);
        assert_eq!(whole.to_vec(), vec![0, 1, 4, 5]);
        assert!(!whole.shares_storage(&a));
        assert_eq!(parts.collapse()?.to_vec(), a.to_vec());
        Ok(())
    }

    #[test]
    fn reordered_rows_keep_their_order() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![2, 2], |i| i as i32)?;
        let rows = a.pages(1)?;
        let swapped = Array::from(vec![rows.at(1)?, rows.at(0)?]);
        let booked = swapped.book()?;
        assert_eq!(booked.dims(), &[2, 2]);
        assert_eq!(booked.to_vec(), vec![2, 3, 0, 1]);
        assert!(!booked.shares_storage(&a));
        assert!(rows.book()?.shares_storage(&a));
        Ok(())
    }
}

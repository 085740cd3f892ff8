use crate::{Array, Descriptor};
use std::collections::VecDeque;

/// Element types of arrays that may themselves hold arrays.
///
/// Leaves are plain values with `DEPTH == 0`; `Array<T>` is one level deeper
/// than `T`.
pub trait Nested: Clone + 'static {
    /// The innermost element type.
    type Leaf: Clone;

    /// Number of array levels above the leaves.
    const DEPTH: usize;

    /// Copy of `self` sharing no storage with it, at any level.
    fn deep_clone(&self) -> Self;

    fn leaf_count(&self) -> usize;

    /// Appends every leaf in depth-first logical order.
    fn collect_leaves(&self, out: &mut Vec<Self::Leaf>);

    /// `self` as a traversable level, `None` for leaves.
    fn into_level(self) -> Option<Box<dyn Level>>;
}

macro_rules! impl_nested_leaf {
    ($($t:ty),*) => {
        $(
            impl Nested for $t {
                type Leaf = $t;
                const DEPTH: usize = 0;

                fn deep_clone(&self) -> Self {
                    self.clone()
                }

                fn leaf_count(&self) -> usize {
                    1
                }

                fn collect_leaves(&self, out: &mut Vec<Self::Leaf>) {
                    out.push(self.clone());
                }

                fn into_level(self) -> Option<Box<dyn Level>> {
                    None
                }
            }
        )*
    };
}

impl_nested_leaf!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String
);

impl<T: Nested> Nested for Array<T> {
    type Leaf = T::Leaf;
    const DEPTH: usize = T::DEPTH + 1;

    fn deep_clone(&self) -> Self {
        let out = self.copy();
        if T::DEPTH > 0 {
            out.map_inplace(|element| *element = element.deep_clone());
        }
        out
    }

    fn leaf_count(&self) -> usize {
        if T::DEPTH == 0 {
            return self.total();
        }
        self.fold(0, |count, element| count + element.leaf_count())
    }

    fn collect_leaves(&self, out: &mut Vec<Self::Leaf>) {
        for element in self.iter() {
            element.collect_leaves(out);
        }
    }

    fn into_level(self) -> Option<Box<dyn Level>> {
        Some(Box::new(self))
    }
}

/// One level of a nested array, seen without its element type.
pub trait Level {
    fn level_info(&self) -> &Descriptor;

    /// The arrays held by this level, empty when it holds leaves.
    fn sublevels(&self) -> Vec<Box<dyn Level>>;
}

impl<T: Nested> Level for Array<T> {
    fn level_info(&self) -> &Descriptor {
        self.info()
    }

    fn sublevels(&self) -> Vec<Box<dyn Level>> {
        if T::DEPTH == 0 {
            return vec![];
        }
        self.iter().filter_map(Nested::into_level).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumIter)]
pub enum Traversal {
    #[default]
    DepthFirst,
    BreadthFirst,
}

fn walk(level: &dyn Level, depth: usize, max_depth: usize, f: &mut dyn FnMut(usize, &Descriptor)) {
    f(depth, level.level_info());
    if depth < max_depth {
        for sub in level.sublevels() {
            walk(sub.as_ref(), depth + 1, max_depth, f);
        }
    }
}

impl<T: Nested> Array<T> {
    /// Calls `f` with the depth and descriptor of every array level, down to
    /// `max_depth` below `self`.
    pub fn visit(&self, order: Traversal, max_depth: usize, mut f: impl FnMut(usize, &Descriptor)) {
        match order {
            Traversal::DepthFirst => walk(self, 0, max_depth, &mut f),
            Traversal::BreadthFirst => {
                f(0, self.info());
                let mut queue = VecDeque::new();
                if max_depth > 0 {
                    queue.extend(self.sublevels().into_iter().map(|sub| (1, sub)));
                }
                while let Some((depth, level)) = queue.pop_front() {
                    f(depth, level.level_info());
                    if depth < max_depth {
                        queue.extend(level.sublevels().into_iter().map(|sub| (depth + 1, sub)));
                    }
                }
            }
        }
    }

    /// Every leaf in depth-first logical order, as a vector array.
    pub fn flatten_leaves(&self) -> Array<T::Leaf> {
        let mut leaves = Vec::with_capacity(self.leaf_count());
        self.collect_leaves(&mut leaves);
        Array::from(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims;
    use strum::IntoEnumIterator;

    fn ragged() -> Array<Array<i32>> {
        Array::from(vec![
            Array::from(vec![1, 2, 3]),
            Array::empty(),
            Array::from_data(dims![2, 1], vec![4, 5]).unwrap(),
        ])
    }

    #[test]
    fn depth_and_leaves() {
        assert_eq!(<Array<i32> as Nested>::DEPTH, 1);
        assert_eq!(<Array<Array<Array<f32>>> as Nested>::DEPTH, 3);
        let nested = ragged();
        assert_eq!(nested.leaf_count(), 5);
        assert_eq!(nested.flatten_leaves().to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn deep_clone_detaches_every_level() {
        let nested = ragged();
        let shallow = nested.clone();
        let deep = nested.deep_clone();
        nested.at(0).unwrap().set(0, 100).unwrap();
        assert_eq!(shallow.at(0).unwrap().at(0).unwrap(), 100);
        assert_eq!(deep.at(0).unwrap().at(0).unwrap(), 1);
        assert_eq!(deep.at(2).unwrap().dims(), &[2, 1]);
        assert!(!deep.shares_storage(&nested));
    }

    #[test]
    fn traversal_orders() {
        let outer = Array::from(vec![ragged(), ragged()]);
        let mut depth_first = vec![];
        outer.visit(Traversal::DepthFirst, usize::MAX, |depth, info| {
            depth_first.push((depth, info.total()))
        });
        assert_eq!(
            depth_first,
            vec![(0, 2), (1, 3), (2, 3), (2, 0), (2, 2), (1, 3), (2, 3), (2, 0), (2, 2)]
        );
        let mut breadth_first = vec![];
        outer.visit(Traversal::BreadthFirst, usize::MAX, |depth, _| breadth_first.push(depth));
        assert_eq!(breadth_first, vec![0, 1, 1, 2, 2, 2, 2, 2, 2]);
        for order in Traversal::iter() {
            let mut shallow = 0;
            outer.visit(order, 1, |_, _| shallow += 1);
            assert_eq!(shallow, 3, "{}", order);
        }
    }
}

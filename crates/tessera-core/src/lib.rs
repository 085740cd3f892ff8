mod array;
mod descriptor;
mod enforcer;
mod indexer;
mod interval;
#[cfg(feature = "testing")]
mod ndarray_ext;
mod nested;
mod ops;
mod shape;
mod slider;
mod storage;
mod strides;

pub use array::*;
pub use descriptor::*;
pub use enforcer::*;
pub use indexer::*;
pub use interval::*;
pub use nested::*;
pub use ops::*;
pub use shape::*;
pub use slider::*;
pub use storage::*;
pub use strides::*;

use smallvec::SmallVec;
pub type RVec<T> = SmallVec<[T; 4]>;

//https://github.com/sonos/tract/blob/main/data/src/macros.rs#L2
#[macro_export]
macro_rules! rvec {
    (@one $x:expr) => (1usize);
    ($elem:expr; $n:expr) => ({
        $crate::RVec::from_elem($elem, $n)
    });
    ($($x:expr),*$(,)*) => ({
        let count = 0usize $(+ rvec![@one $x])*;
        #[allow(unused_mut)]
        let mut vec = $crate::RVec::new();
        if count <= vec.inline_size() {
            $(vec.push($x);)*
            vec
        } else {
            $crate::RVec::from_vec(vec![$($x,)*])
        }
    });
}

#[macro_export]
macro_rules! dims {
    ($($x:expr),*$(,)*) => ({
        use $crate::rvec;
        $crate::Shape::new(rvec![$($x,)*])
    });
}

pub mod prelude {
    pub use crate::{
        dims, rvec, Array, ArrayError, Descriptor, GrowthPolicy, Interval, Nested, Selection,
        Shape, Squeeze, Traversal, Window, WindowSlider,
    };
}

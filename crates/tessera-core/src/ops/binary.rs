use crate::{Array, ArrayError};
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

macro_rules! impl_array_binary_op {
    ($trait:ident, $method_name:ident, $scalar_name:ident, $op:tt) => {
        impl<T: Clone + $trait<Output = T>> Array<T> {
            pub fn $method_name(&self, other: &Array<T>) -> Result<Array<T>, ArrayError> {
                self.transform(other, |lhs, rhs| lhs.clone() $op rhs.clone())
            }

            pub fn $scalar_name(&self, value: T) -> Result<Array<T>, ArrayError> {
                self.map(|lhs| lhs.clone() $op value.clone())
            }
        }
    };
}

impl_array_binary_op!(Add, add, add_scalar, +);
impl_array_binary_op!(Sub, sub, sub_scalar, -);
impl_array_binary_op!(Mul, mul, mul_scalar, *);
impl_array_binary_op!(Div, div, div_scalar, /);
impl_array_binary_op!(Rem, rem, rem_scalar, %);

macro_rules! impl_array_cmp_op {
    ($method_name:ident, $scalar_name:ident, $op:tt) => {
        pub fn $method_name(&self, other: &Array<T>) -> Result<Array<bool>, ArrayError> {
            self.transform(other, |lhs, rhs| lhs $op rhs)
        }

        pub fn $scalar_name(&self, value: &T) -> Result<Array<bool>, ArrayError> {
            self.map(|lhs| lhs $op value)
        }
    };
}

impl<T: Clone + PartialOrd> Array<T> {
    impl_array_cmp_op!(eq_elem, eq_scalar, ==);
    impl_array_cmp_op!(ne_elem, ne_scalar, !=);
    impl_array_cmp_op!(lt, lt_scalar, <);
    impl_array_cmp_op!(le, le_scalar, <=);
    impl_array_cmp_op!(gt, gt_scalar, >);
    impl_array_cmp_op!(ge, ge_scalar, >=);
}

impl<T: Clone + Neg<Output = T>> Array<T> {
    pub fn neg(&self) -> Result<Array<T>, ArrayError> {
        self.map(|v| -v.clone())
    }
}

impl Array<bool> {
    pub fn and(&self, other: &Array<bool>) -> Result<Array<bool>, ArrayError> {
        self.transform(other, |lhs, rhs| *lhs && *rhs)
    }

    pub fn or(&self, other: &Array<bool>) -> Result<Array<bool>, ArrayError> {
        self.transform(other, |lhs, rhs| *lhs || *rhs)
    }

    pub fn not(&self) -> Result<Array<bool>, ArrayError> {
        self.map(|v| !*v)
    }
}

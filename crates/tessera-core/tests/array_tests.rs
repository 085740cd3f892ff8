#[cfg(test)]
mod tests {
    use ndarray::{s, ArrayD, Axis, IxDyn};
    use proptest::prelude::*;
    use tessera::{dims, Array, Descriptor, ErrorKind, Interval, Shape};
    use test_strategy::{proptest, Arbitrary};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ground(dims: &[usize]) -> anyhow::Result<ArrayD<i64>> {
        let total = dims.iter().product::<usize>() as i64;
        Ok(ArrayD::from_shape_vec(
            IxDyn(dims),
            (0..total).collect::<Vec<_>>(),
        )?)
    }

    #[derive(Arbitrary, Debug)]
    struct CubeProblem {
        #[strategy(1..=4usize)]
        a: usize,
        #[strategy(1..=4usize)]
        b: usize,
        #[strategy(1..=4usize)]
        c: usize,
    }

    impl CubeProblem {
        fn dims(&self) -> Vec<usize> {
            vec![self.a, self.b, self.c]
        }
    }

    #[proptest(cases = 64)]
    fn fresh_descriptor_is_continuous(prob: CubeProblem) {
        let shape = Shape::from(prob.dims());
        let info = Descriptor::new(shape.clone()).unwrap();
        prop_assert_eq!(info.total(), prob.a * prob.b * prob.c);
        prop_assert!(info.is_continuous());
        for index in 0..info.total() {
            let subs = info.index_to_subs(index);
            let offset = info.sub2ind(&subs).unwrap();
            prop_assert_eq!(info.ind2sub(offset).unwrap(), subs);
        }
    }

    #[derive(Arbitrary, Debug)]
    struct SliceProblem {
        #[strategy(1..=6usize)]
        rows: usize,
        #[strategy(1..=6usize)]
        cols: usize,
        #[strategy(0..#rows)]
        row_start: usize,
        #[strategy(#row_start + 1..=#rows)]
        row_stop: usize,
        #[strategy(0..#cols)]
        col_start: usize,
        #[strategy(#col_start + 1..=#cols)]
        col_stop: usize,
        #[strategy(1..=3isize)]
        step: isize,
    }

    #[proptest(cases = 64)]
    fn slicing_matches_ndarray(prob: SliceProblem) {
        let nd = ground(&[prob.rows, prob.cols]).unwrap();
        let a = Array::from(nd.clone());
        let boundaries = [
            Interval::between(prob.row_start as isize, prob.row_stop as isize, prob.step).unwrap(),
            Interval::between(prob.col_start as isize, prob.col_stop as isize, 1).unwrap(),
        ];
        let view = a.slice(&boundaries).unwrap();
        for (axis, boundary) in boundaries.iter().enumerate() {
            let extent = a.dims()[axis] as isize;
            prop_assert_eq!(view.dims()[axis] as isize, boundary.bound(0, extent).absdiff());
        }
        let expected = nd.slice(s![
            prob.row_start..prob.row_stop;prob.step,
            prob.col_start..prob.col_stop
        ]);
        prop_assert_eq!(view.dims(), expected.shape());
        prop_assert_eq!(view.to_vec(), expected.iter().copied().collect::<Vec<_>>());
    }

    #[derive(Arbitrary, Debug)]
    struct TransposeProblem {
        cube: CubeProblem,
        #[strategy(Just(vec![0usize, 1, 2]).prop_shuffle())]
        perm: Vec<usize>,
    }

    #[proptest(cases = 32)]
    fn transposition_matches_ndarray(prob: TransposeProblem) {
        let nd = ground(&prob.cube.dims()).unwrap();
        let a = Array::from(nd.clone());
        let t = a.transpose(&prob.perm).unwrap();
        let expected = nd.permuted_axes(IxDyn(&prob.perm));
        prop_assert_eq!(t.dims(), expected.shape());
        prop_assert_eq!(t.to_vec(), expected.iter().copied().collect::<Vec<_>>());
        prop_assert_eq!(Array::from(t.to_ndarray().unwrap()), t);
    }

    #[derive(Arbitrary, Debug)]
    struct ReduceProblem {
        cube: CubeProblem,
        #[strategy(0..3usize)]
        axis: usize,
    }

    #[proptest(cases = 32)]
    fn axis_reduction_matches_ndarray(prob: ReduceProblem) {
        let dims = prob.cube.dims();
        let nd = ground(&dims).unwrap();
        let a = Array::from(nd.clone());
        let reduced = a.sum_axis(prob.axis).unwrap();
        prop_assert_eq!(reduced.rank(), a.rank() - 1);
        prop_assert_eq!(reduced.total(), a.total() / dims[prob.axis]);
        let expected = nd.sum_axis(Axis(prob.axis));
        prop_assert_eq!(reduced.dims(), expected.shape());
        prop_assert_eq!(reduced.to_vec(), expected.iter().copied().collect::<Vec<_>>());
    }

    #[proptest(cases = 16)]
    fn float_reduction_matches_ndarray(prob: ReduceProblem) {
        init();
        let a = Array::<f32>::randn(Shape::from(prob.cube.dims())).unwrap();
        let nd = a.to_ndarray().unwrap();
        let reduced = a.sum_axis(prob.axis).unwrap();
        let expected = Array::from(nd.sum_axis(Axis(prob.axis)));
        reduced.all_close(&expected, 1e-4, 1e-4).unwrap();
        let total = Array::from(vec![a.sum()]);
        total.all_close(&Array::from(vec![nd.sum()]), 1e-3, 1e-4).unwrap();
    }

    #[derive(Arbitrary, Debug)]
    struct BroadcastProblem {
        #[strategy(1..=5usize)]
        small: usize,
        #[strategy(1..=4usize)]
        times: usize,
        swap: bool,
    }

    #[proptest(cases = 32)]
    fn vector_broadcast_tiles(prob: BroadcastProblem) {
        let big = Array::from((0..(prob.small * prob.times) as i64).collect::<Vec<_>>());
        let small = Array::from((0..prob.small as i64).map(|v| v * 100).collect::<Vec<_>>());
        let (lhs, rhs) = if prob.swap { (&small, &big) } else { (&big, &small) };
        let out = lhs.add(rhs).unwrap();
        let expected = (0..prob.small * prob.times)
            .map(|i| i as i64 + (i % prob.small) as i64 * 100)
            .collect::<Vec<_>>();
        prop_assert_eq!(out.to_vec(), expected);
    }

    #[test]
    fn non_dividing_broadcast_fails() {
        let a = Array::from(vec![1, 2, 3, 4, 5]);
        let b = Array::from(vec![1, 2]);
        assert_eq!(a.add(&b).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(b.add(&a).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[derive(Arbitrary, Debug)]
    struct SpliceProblem {
        cube: CubeProblem,
        #[strategy(0..3usize)]
        axis: usize,
        #[strategy(1..=3usize)]
        width: usize,
        #[strategy(0..=4usize)]
        index: usize,
    }

    #[proptest(cases = 64)]
    fn insert_then_erase_restores(prob: SpliceProblem) {
        init();
        let dims = prob.cube.dims();
        let index = prob.index.min(dims[prob.axis]);
        let a = Array::from(ground(&dims).unwrap());
        let mut piece_dims = dims.clone();
        piece_dims[prob.axis] = prob.width;
        let piece = Array::full(Shape::from(piece_dims), -1i64).unwrap();
        let mut b = a.copy();
        b.insert(&piece, index, prob.axis).unwrap();
        prop_assert_eq!(b.dims()[prob.axis], dims[prob.axis] + prob.width);
        b.erase(prob.width, index, prob.axis).unwrap();
        prop_assert_eq!(b, a);
    }

    #[test]
    fn views_alias_both_ways() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![3, 4], |i| i as i32)?;
        let view = a.slice(&[Interval::between(1, 3, 1)?, Interval::from(2)?])?;
        view.set_subs(&[0, 0], -6)?;
        assert_eq!(a.at_subs(&[1, 2])?, -6);
        a.set_subs(&[2, 3], -11)?;
        assert_eq!(view.at_subs(&[1, 1])?, -11);
        Ok(())
    }

    #[test]
    fn copy_is_independent() -> anyhow::Result<()> {
        let a = Array::from_fn(dims![2, 2], |i| i as i32)?;
        let b = a.copy();
        assert_eq!(a, b);
        b.set(0, 9)?;
        assert_eq!(a.at(0)?, 0);
        Ok(())
    }

    #[test]
    fn concrete_slices_and_transpose() -> anyhow::Result<()> {
        let a = Array::from_data(dims![2, 3], vec![1, 2, 3, 4, 5, 6])?;
        let block = a.slice(&[Interval::between(0, 2, 1)?, Interval::between(1, 3, 1)?])?;
        assert_eq!(block, Array::from_data(dims![2, 2], vec![2, 3, 5, 6])?);
        let t = a.t()?;
        assert_eq!(t, Array::from_data(dims![3, 2], vec![1, 4, 2, 5, 3, 6])?);
        Ok(())
    }

    #[test]
    fn concrete_intervals() -> anyhow::Result<()> {
        assert_eq!(Interval::between(1, 5, 2)?.absdiff(), 2);
        assert_eq!(Interval::at(3)?, Interval::new(3, 4, 1)?);
        Ok(())
    }

    #[test]
    fn resize_round_trip() -> anyhow::Result<()> {
        init();
        let original = (1..=6).collect::<Vec<i32>>();
        let mut a = Array::from_data(dims![6], original.clone())?;
        a.resize(dims![3, 1, 2])?;
        a.resize(dims![6])?;
        assert_eq!(a.to_vec(), original);
        Ok(())
    }

    #[test]
    fn pages_round_trip_through_collapse() -> anyhow::Result<()> {
        init();
        let a = Array::from(ground(&[2, 3, 4])?);
        let doubled = a.browse(2, |page| page.mul_scalar(2))?;
        assert_eq!(doubled.dims(), a.dims());
        assert_eq!(doubled.to_vec(), a.to_vec().iter().map(|v| v * 2).collect::<Vec<_>>());
        let pages = a.pages(2)?;
        let whole = pages.collapse()?;
        assert!(whole.shares_storage(&a));
        let flipped = a.browse(2, |page| page.t())?;
        assert_eq!(flipped.dims(), &[2, 4, 3]);
        assert!(!flipped.shares_storage(&a));
        let nd = ground(&[2, 3, 4])?.permuted_axes(IxDyn(&[0, 2, 1]));
        assert_eq!(flipped.to_vec(), nd.iter().copied().collect::<Vec<_>>());
        let last = Array::from(vec![pages.at(1)?]).collapse()?;
        assert_eq!(last.dims(), &[3, 4]);
        assert_eq!(last.to_vec(), (12..24).collect::<Vec<i64>>());
        Ok(())
    }
}

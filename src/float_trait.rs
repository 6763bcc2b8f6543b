use ndarray::NdFloat;
use num_traits::FloatConst;
use std::iter::Sum;

/// Floating point type the residual engine and likelihood aggregator work with
///
/// Implemented for [f32] and [f64].
pub trait Float: NdFloat + FloatConst + Sum + 'static {
    #[inline]
    fn half() -> Self {
        Self::from(0.5).unwrap()
    }

    /// Shortest signed angle from `b` to `a`, in (-pi, pi]
    #[inline]
    fn circular_diff(a: Self, b: Self) -> Self {
        let diff = a - b;
        diff.sin().atan2(diff.cos())
    }
}

impl Float for f32 {}

impl Float for f64 {}

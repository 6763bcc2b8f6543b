//! Simple array statistics used by the samplers

use crate::float_trait::Float;
use ndarray::ArrayView1;

/// Maximum over finite elements, `None` if there are none
pub fn finite_max<T>(arr: ArrayView1<T>) -> Option<T>
where
    T: Float,
{
    arr.iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(None, |max, x| match max {
            Some(max) if max >= x => Some(max),
            _ => Some(x),
        })
}

/// Index of the maximum finite element, the first one in case of a tie
pub fn argmax<T>(arr: ArrayView1<T>) -> Option<usize>
where
    T: Float,
{
    arr.iter()
        .enumerate()
        .filter(|(_, x)| x.is_finite())
        .fold(None, |max: Option<(usize, T)>, (idx, &val)| match max {
            Some((_, max_val)) if max_val >= val => max,
            _ => Some((idx, val)),
        })
        .map(|(idx, _)| idx)
}

/// Mean and unbiased variance, `None` for less than two elements
pub fn mean_variance<T>(arr: ArrayView1<T>) -> Option<(T, T)>
where
    T: Float,
{
    let n = arr.len();
    if n < 2 {
        return None;
    }
    let n = T::from(n).unwrap();
    let mean = arr.sum() / n;
    let variance = arr.iter().map(|&x| (x - mean).powi(2)).sum::<T>() / (n - T::one());
    Some((mean, variance))
}

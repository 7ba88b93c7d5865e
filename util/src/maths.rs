//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Piecewise linear interpolation of `ys` (sampled at the non-decreasing
/// `xs`) at `x`.
///
/// Values outside the sampled range are held at the first/last sample. If a
/// run of equal `xs` is hit the first matching sample is used. Returns `None`
/// if the inputs are empty or of different lengths.
pub fn interp<T>(xs: &[T], ys: &[T], x: T) -> Option<T>
where
    T: Float
{
    if xs.is_empty() || xs.len() != ys.len() {
        return None;
    }

    if x <= xs[0] {
        return Some(ys[0]);
    }

    for i in 1..xs.len() {
        if x <= xs[i] {
            // Zero length interval, nothing to interpolate
            if xs[i] - xs[i - 1] <= T::zero() {
                return Some(ys[i - 1]);
            }
            return Some(lin_map((xs[i - 1], xs[i]), (ys[i - 1], ys[i]), x));
        }
    }

    ys.last().copied()
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interp() {
        let xs = [0.0, 2.0, 4.0, 4.0, 6.0];
        let ys = [1.0, 3.0, 5.0, 9.0, 9.0];

        assert_eq!(interp(&xs, &ys, -1.0), Some(1.0));
        assert_eq!(interp(&xs, &ys, 1.0), Some(2.0));
        assert_eq!(interp(&xs, &ys, 3.0), Some(4.0));
        assert_eq!(interp(&xs, &ys, 5.0), Some(9.0));
        assert_eq!(interp(&xs, &ys, 10.0), Some(9.0));
        assert_eq!(interp::<f64>(&[], &[], 1.0), None);
        assert_eq!(interp(&xs, &ys[..2], 1.0), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&5.0, &0.0, &2.0), 2.0);
        assert_eq!(clamp(&-5.0, &0.0, &2.0), 0.0);
        assert_eq!(clamp(&1.0, &0.0, &2.0), 1.0);
    }
}

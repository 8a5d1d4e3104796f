use num_traits::Float;

/// Find the insertion point for `q` in a sorted slice, the index of the
/// first element that is not less than `q`.
pub fn binsearch<T: Float>(array: &[T], q: T) -> usize {
    match array.binary_search_by(|x| x.partial_cmp(&q).unwrap()) {
        Ok(i) => i,
        Err(i) => i,
    }
}

/// Find the half-open index range covering every element of a sorted slice
/// that lies in the closed interval `[lo, hi]`.
///
/// The returned range is empty when no element qualifies.
pub fn indices_between<T: Float>(array: &[T], lo: T, hi: T) -> (usize, usize) {
    let mut start = binsearch(array, lo);
    while start > 0 && array[start - 1] >= lo {
        start -= 1;
    }
    let mut end = binsearch(array, hi);
    while end < array.len() && array[end] <= hi {
        end += 1;
    }
    if start > end {
        end = start;
    }
    (start, end)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_binsearch() {
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(binsearch(&axis, -1.0), 0);
        assert_eq!(binsearch(&axis, 2.0), 2);
        assert_eq!(binsearch(&axis, 2.5), 3);
        assert_eq!(binsearch(&axis, 9.0), 5);
    }

    #[test]
    fn test_indices_between_closed() {
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0];
        let (lo, hi) = indices_between(&axis, 1.0, 3.0);
        assert_eq!(&axis[lo..hi], &[1.0, 2.0, 3.0]);

        let (lo, hi) = indices_between(&axis, 0.5, 0.75);
        assert_eq!(hi - lo, 0);

        let (lo, hi) = indices_between(&axis, -10.0, 10.0);
        assert_eq!(&axis[lo..hi], &axis);
    }

    #[test]
    fn test_indices_between_duplicates() {
        let axis = [0.0, 1.0, 1.0, 1.0, 2.0];
        let (lo, hi) = indices_between(&axis, 1.0, 1.0);
        assert_eq!((lo, hi), (1, 4));
    }
}

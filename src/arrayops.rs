use num_traits::{Float, ToPrimitive};

/// Generate an evenly spaced grid of values `start + i * step` covering the
/// closed interval `[start, end]`. The last grid point may overshoot `end`
/// by less than one `step` so that the whole interval is covered.
pub fn gridspace<T: Float + ToPrimitive>(start: T, end: T, step: T) -> Vec<T> {
    let distance = end - start;
    let steps = (distance / step).floor().to_usize().unwrap_or(0) + 1;
    let mut result = Vec::with_capacity(steps);
    for i in 0..steps {
        result.push(start + T::from(i).unwrap() * step);
    }
    result
}

/// Integrate `y` over `x` with the trapezoid rule.
pub fn trapz(x: &[f64], y: &[f32]) -> f32 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    (0..n - 1)
        .map(|i| {
            let delta = (x[i + 1] - x[i]) as f32;
            delta * 0.5 * (y[i + 1] + y[i])
        })
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gridspace_covers_extent() {
        let grid = gridspace(100.0, 101.0, 0.25);
        assert_eq!(grid.len(), 5);
        assert!((grid[0] - 100.0).abs() < 1e-9);
        assert!((grid[4] - 101.0).abs() < 1e-9);

        // A partial final bin still gets a grid point
        let grid = gridspace(100.0, 100.9, 0.25);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_trapz_triangle() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0f32, 10.0, 0.0];
        assert!((trapz(&x, &y) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_trapz_degenerate() {
        assert_eq!(trapz(&[1.0], &[5.0f32]), 0.0);
        assert_eq!(trapz(&[], &[]), 0.0);
    }
}

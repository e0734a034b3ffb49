use std::ops::{Add, Mul, Sub};

/// Row-major flat grid with i-major/j-minor flattening. No per-cell objects.
/// Shape is fixed at construction; index bounds are the caller's problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T> {
    pub data: Vec<T>,
    pub nx: usize,
    pub ny: usize,
}

impl<T: Copy + Default> Tensor<T> {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            data: vec![T::default(); nx * ny],
            nx,
            ny,
        }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny);
        i * self.ny + j
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[self.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: T) {
        let k = self.idx(i, j);
        self.data[k] = v;
    }

    /// The four axis neighbors `(x_pre, x_next, y_pre, y_next)`, clamped to
    /// the cell itself at grid edges. Finite differences built on this
    /// stencil degrade to one-sided at the boundary; kept as-is.
    #[inline]
    pub fn nearby(&self, i: usize, j: usize) -> (T, T, T, T) {
        let x_pre = if i != 0 { self.get(i - 1, j) } else { self.get(i, j) };
        let x_next = if i != self.nx - 1 { self.get(i + 1, j) } else { self.get(i, j) };
        let y_pre = if j != 0 { self.get(i, j - 1) } else { self.get(i, j) };
        let y_next = if j != self.ny - 1 { self.get(i, j + 1) } else { self.get(i, j) };
        (x_pre, x_next, y_pre, y_next)
    }
}

/// 1-D linear interpolation through (x1,y1)-(x2,y2) evaluated at xm.
/// Caller guarantees x1 != x2.
#[inline]
pub fn lerp<V>(x1: f64, x2: f64, y1: V, y2: V, xm: f64) -> V
where
    V: Copy + Add<Output = V> + Sub<Output = V> + Mul<f64, Output = V>,
{
    debug_assert!(x1 != x2);
    y1 + (y2 - y1) * ((xm - x1) / (x2 - x1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip() {
        let mut t: Tensor<f64> = Tensor::new(4, 3);
        for i in 0..4 {
            for j in 0..3 {
                t.set(i, j, (i * 10 + j) as f64);
            }
        }
        for i in 0..4 {
            for j in 0..3 {
                assert_eq!(t.get(i, j), (i * 10 + j) as f64);
            }
        }
    }

    #[test]
    fn nearby_clamps_at_edges() {
        let mut t: Tensor<f64> = Tensor::new(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                t.set(i, j, (i * 3 + j) as f64);
            }
        }
        // interior: true four-neighbor stencil
        let (xp, xn, yp, yn) = t.nearby(1, 1);
        assert_eq!((xp, xn, yp, yn), (1.0, 7.0, 3.0, 5.0));
        // corner: missing neighbors clamp to the cell itself
        let (xp, xn, yp, yn) = t.nearby(0, 0);
        assert_eq!(xp, t.get(0, 0));
        assert_eq!(xn, t.get(1, 0));
        assert_eq!(yp, t.get(0, 0));
        assert_eq!(yn, t.get(0, 1));
    }

    #[test]
    fn lerp_midpoint_and_flat() {
        assert_eq!(lerp(0.0, 1.0, 2.0, 4.0, 0.5), 3.0);
        // degenerate flat interpolation: y1 == y2 gives y1 everywhere
        for xm in [-1.0, 0.0, 0.3, 2.5] {
            assert_eq!(lerp(0.0, 1.0, 7.0, 7.0, xm), 7.0);
        }
    }
}

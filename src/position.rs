use glam::DVec2;
use rayon::prelude::*;

use crate::field::Field;
use crate::tensor::Tensor;
use crate::velocity::Velocity;
use crate::{Error, Result};

/// Rectangular validity bound for particle coordinates.
#[derive(Clone, Copy, Debug)]
struct Bound {
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
}

/// Particle coordinates on a grid, plus the per-axis coordinate ranges the
/// grid was built from (valid for axis-aligned rectilinear grids only) and an
/// opt-in out-of-bound mask used by data-driven flows to stop interpolating
/// past the supplied velocity-data domain.
#[derive(Clone, Debug)]
pub struct Position {
    pub field: Field<DVec2>,
    xrange: Vec<f64>,
    yrange: Vec<f64>,
    out_of_bound: Option<Tensor<bool>>,
    bound: Option<Bound>,
}

impl Position {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            field: Field::new(nx, ny),
            xrange: Vec::new(),
            yrange: Vec::new(),
            out_of_bound: None,
            bound: None,
        }
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.field.nx()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.field.ny()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> DVec2 {
        self.field.data.get(i, j)
    }

    /// Fill the grid with the Cartesian product of the two coordinate ranges
    /// and remember the ranges for later interpolation lookups.
    pub fn set_ranges(&mut self, xrange: Vec<f64>, yrange: Vec<f64>) -> Result<()> {
        let (nx, ny) = (self.nx(), self.ny());
        if xrange.len() != nx || yrange.len() != ny {
            return Err(Error::RangeMismatch {
                nx,
                ny,
                xlen: xrange.len(),
                ylen: yrange.len(),
            });
        }
        for i in 0..nx {
            for j in 0..ny {
                self.field.data.set(i, j, DVec2::new(xrange[i], yrange[j]));
            }
        }
        self.xrange = xrange;
        self.yrange = yrange;
        Ok(())
    }

    /// Uniform-step ranges covering the given bounds (step = (max-min)/(n-1)).
    pub fn set_uniform(&mut self, xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<()> {
        let (nx, ny) = (self.nx(), self.ny());
        if nx < 2 || ny < 2 {
            return Err(Error::DegenerateAxis { nx, ny });
        }
        let xrange: Vec<f64> = (0..nx)
            .map(|i| xmin + i as f64 * (xmax - xmin) / (nx - 1) as f64)
            .collect();
        let yrange: Vec<f64> = (0..ny)
            .map(|j| ymin + j as f64 * (ymax - ymin) / (ny - 1) as f64)
            .collect();
        self.set_ranges(xrange, yrange)
    }

    /// Stored coordinate range for axis 0 (x) or 1 (y). Empty until
    /// [`Position::set_ranges`] has been called.
    #[inline]
    pub fn range(&self, axis: usize) -> &[f64] {
        if axis == 0 { &self.xrange } else { &self.yrange }
    }

    /// Advance every particle by `v * delta` (explicit Euler). With a bound
    /// set and the mask initialized, cells landing outside the bound are
    /// marked out-of-bound; the mark is monotonic and never reset. Marked
    /// cells keep being advected, they are only skipped by interpolation.
    pub fn update(&mut self, vel: &Velocity, delta: f64) {
        debug_assert!(self.nx() == vel.nx() && self.ny() == vel.ny());
        let ny = self.ny();
        match (&mut self.out_of_bound, self.bound) {
            (Some(mask), Some(b)) => {
                self.field
                    .data
                    .data
                    .par_chunks_mut(ny)
                    .zip(mask.data.par_chunks_mut(ny))
                    .zip(vel.field.data.data.par_chunks(ny))
                    .for_each(|((prow, mrow), vrow)| {
                        for j in 0..ny {
                            prow[j] += vrow[j] * delta;
                            let p = prow[j];
                            if p.x < b.xmin || p.x > b.xmax || p.y < b.ymin || p.y > b.ymax {
                                mrow[j] = true;
                            }
                        }
                    });
            }
            _ => {
                self.field
                    .data
                    .data
                    .par_chunks_mut(ny)
                    .zip(vel.field.data.data.par_chunks(ny))
                    .for_each(|(prow, vrow)| {
                        for j in 0..ny {
                            prow[j] += vrow[j] * delta;
                        }
                    });
            }
        }
    }

    /// Initialize the out-of-bound mask (all cells in-bound).
    pub fn init_out_of_bound(&mut self) {
        self.out_of_bound = Some(Tensor::new(self.nx(), self.ny()));
    }

    /// False when the mask has not been initialized.
    #[inline]
    pub fn is_out_of_bound(&self, i: usize, j: usize) -> bool {
        match &self.out_of_bound {
            Some(mask) => mask.get(i, j),
            None => false,
        }
    }

    pub fn set_bound(&mut self, xmin: f64, xmax: f64, ymin: f64, ymax: f64) {
        self.bound = Some(Bound {
            xmin,
            xmax,
            ymin,
            ymax,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ranges_builds_cartesian_product() {
        let mut pos = Position::new(3, 2);
        pos.set_ranges(vec![0.0, 1.0, 2.0], vec![10.0, 20.0]).unwrap();
        assert_eq!(pos.get(2, 1), DVec2::new(2.0, 20.0));
        assert_eq!(pos.get(0, 0), DVec2::new(0.0, 10.0));
        assert_eq!(pos.range(0), &[0.0, 1.0, 2.0]);
        assert_eq!(pos.range(1), &[10.0, 20.0]);
    }

    #[test]
    fn set_ranges_rejects_wrong_lengths() {
        let mut pos = Position::new(3, 2);
        let err = pos.set_ranges(vec![0.0, 1.0], vec![10.0, 20.0]);
        assert!(matches!(err, Err(Error::RangeMismatch { .. })));
    }

    #[test]
    fn set_uniform_matches_endpoints() {
        let mut pos = Position::new(5, 3);
        pos.set_uniform(0.0, 2.0, -1.0, 1.0).unwrap();
        assert_eq!(pos.range(0), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(pos.range(1), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn set_uniform_needs_two_points_per_axis() {
        let mut pos = Position::new(1, 3);
        assert!(matches!(
            pos.set_uniform(0.0, 1.0, 0.0, 1.0),
            Err(Error::DegenerateAxis { .. })
        ));
    }

    #[test]
    fn out_of_bound_marking_is_monotonic() {
        let mut pos = Position::new(2, 2);
        pos.set_uniform(0.0, 1.0, 0.0, 1.0).unwrap();
        pos.set_bound(0.0, 1.0, 0.0, 1.0);
        pos.init_out_of_bound();

        // push the x = 1 column out of the bound...
        let mut vel = Velocity::new(2, 2);
        for i in 0..2 {
            for j in 0..2 {
                vel.field.data.set(i, j, DVec2::new(1.0, 0.0));
            }
        }
        pos.update(&vel, 1.0);
        assert!(pos.is_out_of_bound(1, 0));
        assert!(pos.is_out_of_bound(1, 1));
        assert!(!pos.is_out_of_bound(0, 0));

        // ...then pull everything back in: marks must stay set
        pos.update(&vel, -1.0);
        assert!(pos.is_out_of_bound(1, 0));
        assert!(pos.is_out_of_bound(1, 1));
    }
}

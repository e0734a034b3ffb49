use glam::DVec2;
use rayon::prelude::*;

use crate::field::Field;
use crate::model::VelocityModel;
use crate::position::Position;
use crate::tensor::lerp;

/// Velocity samples at a set of particle coordinates. The coordinates are
/// not stored here; operations that need them take the position field
/// explicitly.
#[derive(Clone, Debug)]
pub struct Velocity {
    pub field: Field<DVec2>,
}

impl Velocity {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            field: Field::new(nx, ny),
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

    pub fn update_time(&mut self, time: f64) {
        self.field.time = time;
    }

    /// Evaluate a closed-form model at every particle coordinate.
    pub fn eval_model(&mut self, model: &dyn VelocityModel, pos: &Position, time: f64) {
        debug_assert!(self.nx() == pos.nx() && self.ny() == pos.ny());
        let ny = self.ny();
        self.field
            .data
            .data
            .par_chunks_mut(ny)
            .zip(pos.field.data.data.par_chunks(ny))
            .for_each(|(vrow, prow)| {
                for j in 0..ny {
                    let p = prow[j];
                    vrow[j] = model.velocity(p.x, p.y, time);
                }
            });
        self.field.time = time;
    }

    /// Bilinearly interpolate a reference velocity field onto this field's
    /// own particle coordinates `pos`. Cells flagged out-of-bound in `pos`
    /// keep their previous value. The reference grid must be axis-aligned
    /// rectilinear with sorted coordinate ranges (`ref_pos`) of at least two
    /// nodes per axis; a degenerate axis has no bracket and panics.
    pub fn interpolate_from(&mut self, pos: &Position, ref_vel: &Velocity, ref_pos: &Position) {
        let ref_x = ref_pos.range(0);
        let ref_y = ref_pos.range(1);
        assert!(
            ref_x.len() >= 2 && ref_y.len() >= 2,
            "reference grid needs at least two nodes per axis to bracket"
        );

        let ny = self.ny();
        self.field
            .data
            .data
            .par_chunks_mut(ny)
            .enumerate()
            .for_each(|(i, vrow)| {
                for (j, out) in vrow.iter_mut().enumerate() {
                    if pos.is_out_of_bound(i, j) {
                        continue;
                    }
                    let p = pos.get(i, j);

                    // enclosing bracket via upper_bound, nudged inward so the
                    // bracket always has two distinct endpoints at the edges
                    let (i_pre, i_next) = bracket(ref_x, p.x);
                    let (j_pre, j_next) = bracket(ref_y, p.y);

                    let v00 = ref_vel.get(i_pre, j_pre);
                    let v01 = ref_vel.get(i_pre, j_next);
                    let v10 = ref_vel.get(i_next, j_pre);
                    let v11 = ref_vel.get(i_next, j_next);

                    // lerp in x at both bracketing rows, then in y
                    let (x1, x2) = (ref_x[i_pre], ref_x[i_next]);
                    let (y1, y2) = (ref_y[j_pre], ref_y[j_next]);
                    let lo = lerp(x1, x2, v00, v10, p.x);
                    let hi = lerp(x1, x2, v01, v11, p.x);
                    *out = lerp(y1, y2, lo, hi, p.y);
                }
            });
    }

    /// Temporal linear interpolation between two whole snapshots, written
    /// into this field. Coincident snapshot times degenerate to `prev`.
    pub fn lerp_in_time(&mut self, prev: &Velocity, next: &Velocity, time: f64) {
        let (t1, t2) = (prev.field.time, next.field.time);
        if t1 == t2 {
            self.field.data.data.copy_from_slice(&prev.field.data.data);
        } else {
            let s = (time - t1) / (t2 - t1);
            for ((out, a), b) in self
                .field
                .data
                .data
                .iter_mut()
                .zip(&prev.field.data.data)
                .zip(&next.field.data.data)
            {
                *out = *a + (*b - *a) * s;
            }
        }
        self.field.time = time;
    }
}

/// Bracket indices `(pre, next)` around `x` in a sorted range, clamped so
/// both endpoints are valid and distinct even outside the domain.
#[inline]
fn bracket(range: &[f64], x: f64) -> (usize, usize) {
    let mut next = range.partition_point(|v| *v <= x);
    if next == range.len() {
        next -= 1;
    }
    if next == 0 {
        next = 1;
    }
    (next - 1, next)
}

use std::path::Path;
use std::time::Instant;

use log::info;
use rayon::prelude::*;

use crate::field::Field;
use crate::flow::FlowField;
use crate::Result;

/// Finite-time Lyapunov exponent field of a completed advection.
///
/// Recomputable: `calculate` snapshots the flow's current and initial times
/// on every call, so the same value can be recomputed after a forward run
/// and again after a re-anchored backward run on the same flow field.
pub struct Ftle {
    pub field: Field<f64>,
}

impl Ftle {
    /// Shape and time stamp taken from the flow's particle grid.
    pub fn new(flow: &FlowField) -> Self {
        let mut field = Field::new(flow.nx(), flow.ny());
        field.update_time(flow.time());
        Self { field }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.field.data.get(i, j)
    }

    /// Per cell: centered-difference deformation gradient of the flow map,
    /// right Cauchy-Green tensor, largest eigenvalue, then
    /// `0.5 ln(lambda_max) / dt` with `dt = current - initial` time (negative
    /// for a re-anchored backward run). Edge cells use the clamped neighbor
    /// stencil, a known accuracy limitation at the grid perimeter.
    pub fn calculate(&mut self, flow: &FlowField) {
        let start = Instant::now();
        info!("{:?} FTLE calculation begins", flow.direction());

        let initial = &flow.initial_position().field.data;
        let current = &flow.current_position().field.data;
        let dt = flow.time() - flow.initial_time();
        debug_assert!(dt != 0.0);
        self.field.update_time(flow.time());

        let ny = self.field.ny();
        self.field
            .data
            .data
            .par_chunks_mut(ny)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, out) in row.iter_mut().enumerate() {
                    let (x0_pre, x0_next, y0_pre, y0_next) = initial.nearby(i, j);
                    let (x_pre, x_next, y_pre, y_next) = current.nearby(i, j);

                    // deformation gradient of the flow map
                    let dx0 = x0_next.x - x0_pre.x;
                    let dy0 = y0_next.y - y0_pre.y;
                    let f00 = (x_next.x - x_pre.x) / dx0;
                    let f01 = (y_next.x - y_pre.x) / dy0;
                    let f10 = (x_next.y - x_pre.y) / dx0;
                    let f11 = (y_next.y - y_pre.y) / dy0;

                    // right Cauchy-Green tensor C = F^T F = [[a, b], [b, d]]
                    let a = f00 * f00 + f10 * f10;
                    let b = f00 * f01 + f10 * f11;
                    let d = f01 * f01 + f11 * f11;

                    // largest eigenvalue of a symmetric 2x2, closed form
                    let mean = 0.5 * (a + d);
                    let disc = (0.5 * (a - d)).powi(2) + b * b;
                    let lambda_max = mean + disc.sqrt();

                    *out = 0.5 * lambda_max.ln() / dt;
                }
            });

        info!(
            "{:?} FTLE calculation ends ({:.1} ms)",
            flow.direction(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.field.write_to_file(path)
    }
}

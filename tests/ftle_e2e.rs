use glam::DVec2;

use lcs::flow::{Direction, FlowField};
use lcs::ftle::Ftle;
use lcs::model::VelocityModel;

/// Rigid translation: deformation gradient stays the identity.
struct Translation;

impl VelocityModel for Translation {
    fn velocity(&self, _x: f64, _y: f64, _t: f64) -> DVec2 {
        DVec2::new(0.4, 0.1)
    }
}

/// Isotropic linear stretch about the origin: v = c * (x, y).
struct Stretch {
    c: f64,
}

impl VelocityModel for Stretch {
    fn velocity(&self, x: f64, y: f64, _t: f64) -> DVec2 {
        DVec2::new(self.c * x, self.c * y)
    }
}

#[test]
fn rigid_translation_has_zero_ftle_everywhere() {
    let (steps, delta) = (10, 0.1);
    let mut flow = FlowField::analytic(6, 5, Box::new(Translation));
    flow.initial_position_mut()
        .set_uniform(0.0, 1.0, 0.0, 1.0)
        .unwrap();
    flow.set_delta(delta).unwrap();
    flow.set_step(steps);
    flow.run().unwrap();

    let mut ftle = Ftle::new(&flow);
    ftle.calculate(&flow);

    for i in 0..6 {
        for j in 0..5 {
            assert!(
                ftle.get(i, j).abs() < 1e-12,
                "cell ({i},{j}): {}",
                ftle.get(i, j)
            );
        }
    }
}

#[test]
fn isotropic_stretch_matches_closed_form() {
    let (steps, delta, c) = (8, 0.05, 0.5);
    let mut flow = FlowField::analytic(5, 5, Box::new(Stretch { c }));
    flow.initial_position_mut()
        .set_uniform(0.5, 1.5, 0.5, 1.5)
        .unwrap();
    flow.set_delta(delta).unwrap();
    flow.set_step(steps);
    flow.run().unwrap();

    let mut ftle = Ftle::new(&flow);
    ftle.calculate(&flow);

    // Euler: every coordinate is scaled by (1 + c dt) per step, so the flow
    // map is a uniform scaling by g and lambda_max = g^2.
    let g: f64 = (1.0 + c * delta).powi(steps as i32);
    let dt = steps as f64 * delta;
    let expect = 0.5 * (g * g).ln() / dt;

    for i in 0..5 {
        for j in 0..5 {
            assert!(
                (ftle.get(i, j) - expect).abs() < 1e-9,
                "cell ({i},{j}): got {}, want {expect}",
                ftle.get(i, j)
            );
        }
    }
}

/// After re-anchoring a backward run, dt is negative; a contraction under
/// backward time therefore still yields a positive exponent.
#[test]
fn backward_run_uses_negative_dt() {
    let (steps, delta, c) = (8, 0.05, 0.5);
    let mut flow = FlowField::analytic(5, 5, Box::new(Stretch { c }));
    flow.initial_position_mut()
        .set_uniform(0.5, 1.5, 0.5, 1.5)
        .unwrap();
    flow.set_delta(delta).unwrap();
    flow.set_step(steps);
    flow.run().unwrap();

    let end_time = flow.time();
    flow.set_direction(Direction::Backward);
    flow.set_initial_time(end_time);
    flow.run().unwrap();
    assert!((flow.time() - flow.initial_time() + steps as f64 * delta).abs() < 1e-12);

    let mut ftle = Ftle::new(&flow);
    ftle.calculate(&flow);

    // backward Euler-advected scaling: h = (1 - c dt)^steps, dt = -steps*delta
    let h: f64 = (1.0 - c * delta).powi(steps as i32);
    let dt = -(steps as f64) * delta;
    let expect = 0.5 * (h * h).ln() / dt;
    assert!(expect > 0.0);

    for i in 0..5 {
        for j in 0..5 {
            assert!(
                (ftle.get(i, j) - expect).abs() < 1e-9,
                "cell ({i},{j}): got {}, want {expect}",
                ftle.get(i, j)
            );
        }
    }
}

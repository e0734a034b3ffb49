use std::path::{Path, PathBuf};

use lcs::flow::{Direction, FlowField};
use lcs::ftle::Ftle;
use lcs::model::DoubleGyre;
use lcs::{Position, Velocity};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let nx: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1000);
    let ny: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(500);
    let steps: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(200);
    let delta: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let out_dir: PathBuf = args
        .get(5)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    std::fs::create_dir_all(&out_dir).expect("failed to create output directory");

    if args.get(6).map(String::as_str) == Some("discrete") {
        run_discrete(nx, ny, steps, delta, &out_dir);
        return;
    }

    eprintln!(
        "Double-gyre FTLE: {}x{} grid, {} steps of dt={}",
        nx, ny, steps, delta
    );

    let mut flow = FlowField::analytic(nx, ny, Box::new(DoubleGyre::default()));
    flow.initial_position_mut()
        .set_uniform(0.0, 2.0, 0.0, 1.0)
        .expect("initial particle grid");
    flow.set_delta(delta).expect("time step");
    flow.set_step(steps);

    // forward run -> positive (repelling) FTLE
    flow.run().expect("forward advection");
    let mut ftle = Ftle::new(&flow);
    ftle.calculate(&flow);
    let pos_path = out_dir.join("double_gyre_ftle_pos.txt");
    ftle.write_to_file(&pos_path).expect("write forward FTLE");
    eprintln!("Wrote {}", pos_path.display());

    // backward run from the forward end time -> negative (attracting) FTLE
    let end_time = flow.time();
    flow.set_direction(Direction::Backward);
    flow.set_initial_time(end_time);
    flow.run().expect("backward advection");
    ftle.calculate(&flow);
    let neg_path = out_dir.join("double_gyre_ftle_neg.txt");
    ftle.write_to_file(&neg_path).expect("write backward FTLE");
    eprintln!("Wrote {}", neg_path.display());
}

/// Dump double-gyre snapshots at unit spacing, then rerun the forward FTLE
/// through the file-backed source instead of the closed-form model.
fn run_discrete(nx: usize, ny: usize, steps: usize, delta: f64, out_dir: &Path) {
    let end_time = steps as f64 * delta;
    let t_max = end_time.ceil().max(1.0) as i64;

    eprintln!(
        "Double-gyre FTLE (discrete replay): {}x{} grid, {} steps of dt={}, {} snapshots",
        nx,
        ny,
        steps,
        delta,
        t_max + 1
    );

    let model = DoubleGyre::default();
    let mut data_pos = Position::new(nx, ny);
    data_pos.set_uniform(0.0, 2.0, 0.0, 1.0).expect("data grid");
    let mut data_vel = Velocity::new(nx, ny);
    for t in 0..=t_max {
        data_vel.eval_model(&model, &data_pos, t as f64);
        data_vel
            .field
            .write_to_file(out_dir.join(format!("double_gyre_{t}.txt")))
            .expect("write snapshot");
    }

    let mut flow = FlowField::discrete(nx, ny, nx, ny);
    flow.data_position_mut()
        .expect("discrete source")
        .set_uniform(0.0, 2.0, 0.0, 1.0)
        .expect("data grid");
    flow.initial_position_mut()
        .set_uniform(0.0, 2.0, 0.0, 1.0)
        .expect("initial particle grid");
    flow.set_file_prefix(&format!("{}/double_gyre_", out_dir.display()));
    flow.set_data_delta(1.0);
    flow.set_data_time_range(0.0, t_max as f64);
    flow.set_delta(delta).expect("time step");
    flow.set_step(steps);
    flow.run().expect("discrete advection");

    let mut ftle = Ftle::new(&flow);
    ftle.calculate(&flow);
    let path = out_dir.join("double_gyre_ftle_discrete.txt");
    ftle.write_to_file(&path).expect("write discrete FTLE");
    eprintln!("Wrote {}", path.display());
}

use std::time::Instant;

use log::{debug, info};

use crate::model::VelocityModel;
use crate::position::Position;
use crate::velocity::Velocity;
use crate::{Error, Result};

/// Advection direction. Forward accumulates time, backward decrements it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Where step velocities come from.
enum Source {
    /// Evaluate a closed-form model at the current particle positions.
    Analytic(Box<dyn VelocityModel>),
    /// Interpolate a window of file-sampled velocity snapshots.
    Discrete(DiscreteSource),
}

/// Time-stepped particle advection over a rectilinear grid.
///
/// Owns the initial and current particle positions and the velocity source.
/// Configure shape/delta/steps, set the initial position grid, then [`FlowField::run`].
pub struct FlowField {
    nx: usize,
    ny: usize,
    delta: f64,
    step: usize,
    initial_time: f64,
    current_time: f64,
    direction: Direction,
    initial_pos: Position,
    current_pos: Position,
    current_vel: Option<Velocity>,
    source: Source,
}

impl FlowField {
    /// Flow driven by a closed-form velocity model.
    pub fn analytic(nx: usize, ny: usize, model: Box<dyn VelocityModel>) -> Self {
        Self::with_source(nx, ny, Source::Analytic(model))
    }

    /// Flow driven by file-sampled velocity data on a `data_nx` x `data_ny`
    /// grid (which may differ from the simulation grid).
    pub fn discrete(nx: usize, ny: usize, data_nx: usize, data_ny: usize) -> Self {
        Self::with_source(nx, ny, Source::Discrete(DiscreteSource::new(data_nx, data_ny)))
    }

    fn with_source(nx: usize, ny: usize, source: Source) -> Self {
        Self {
            nx,
            ny,
            delta: 0.0,
            step: 0,
            initial_time: 0.0,
            current_time: 0.0,
            direction: Direction::Forward,
            initial_pos: Position::new(nx, ny),
            current_pos: Position::new(nx, ny),
            current_vel: None,
            source,
        }
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn initial_position(&self) -> &Position {
        &self.initial_pos
    }

    pub fn initial_position_mut(&mut self) -> &mut Position {
        &mut self.initial_pos
    }

    pub fn current_position(&self) -> &Position {
        &self.current_pos
    }

    /// The velocity used by the most recent step. Errors until the first
    /// step of a run has evaluated it.
    pub fn current_velocity(&self) -> Result<&Velocity> {
        self.current_vel.as_ref().ok_or(Error::VelocityNotSet)
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.current_time
    }

    #[inline]
    pub fn initial_time(&self) -> f64 {
        self.initial_time
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Integration time step; must be strictly positive.
    pub fn set_delta(&mut self, delta: f64) -> Result<()> {
        if delta <= 0.0 {
            return Err(Error::InvalidDelta(delta));
        }
        self.delta = delta;
        Ok(())
    }

    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        // the data window is traversed in flow order, so its begin/end
        // swap when the direction flips
        if let Source::Discrete(src) = &mut self.source {
            src.orient(direction);
        }
    }

    /// Re-anchor the flow at a new initial time. This resets the flow's and
    /// the initial position's time stamps and the current time, which is how
    /// a backward run is set up from a completed forward run's end time.
    pub fn set_initial_time(&mut self, time: f64) {
        self.initial_time = time;
        self.initial_pos.field.update_time(time);
        self.current_time = time;
        self.current_pos.field.update_time(time);
        if let Some(vel) = self.current_vel.as_mut() {
            vel.update_time(time);
        }
    }

    /// Data grid positions (discrete flows only).
    pub fn data_position_mut(&mut self) -> Option<&mut Position> {
        match &mut self.source {
            Source::Discrete(src) => Some(&mut src.data_pos),
            Source::Analytic(_) => None,
        }
    }

    /// Time difference between two adjacent data files (discrete flows only).
    pub fn set_data_delta(&mut self, delta: f64) {
        if let Source::Discrete(src) = &mut self.source {
            src.data_delta = delta;
        }
    }

    /// Raw time bounds of the data files (discrete flows only). Orientation
    /// follows the current direction.
    pub fn set_data_time_range(&mut self, t1: f64, t2: f64) {
        let direction = self.direction;
        if let Source::Discrete(src) = &mut self.source {
            src.raw_time_range = (t1, t2);
            src.orient(direction);
        }
    }

    /// Data file name prefix (discrete flows only).
    pub fn set_file_prefix(&mut self, prefix: &str) {
        if let Source::Discrete(src) = &mut self.source {
            src.prefix = prefix.to_string();
        }
    }

    /// Data file name suffix (discrete flows only, default `.txt`).
    pub fn set_file_suffix(&mut self, suffix: &str) {
        if let Source::Discrete(src) = &mut self.source {
            src.suffix = suffix.to_string();
        }
    }

    #[inline]
    fn signed_delta(&self) -> f64 {
        match self.direction {
            Direction::Forward => self.delta,
            Direction::Backward => -self.delta,
        }
    }

    /// Advect the particle grid for the configured number of steps.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "particle advection begins ({} steps of {} {:?} from t = {})",
            self.step, self.delta, self.direction, self.initial_time
        );
        let total = Instant::now();
        self.copy_initial_to_current();

        let signed = self.signed_delta();
        for i in 0..self.step {
            let t0 = Instant::now();
            self.set_current_velocity()?;

            let vel = self.current_vel.as_ref().ok_or(Error::VelocityNotSet)?;
            self.current_pos.update(vel, signed);

            self.current_time += signed;
            self.current_pos.field.update_time(self.current_time);
            if let Some(vel) = self.current_vel.as_mut() {
                vel.update_time(self.current_time);
            }

            debug!(
                "step {} done (time = {:.6}, {:.2} ms)",
                i,
                self.current_time,
                t0.elapsed().as_secs_f64() * 1000.0
            );
        }

        info!(
            "particle advection ends at t = {} ({:.1} ms)",
            self.current_time,
            total.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Copy the initial particle grid (data, ranges, time stamp) into the
    /// current one. Discrete flows additionally derive the validity bound
    /// from the data grid's corner coordinates and arm the out-of-bound mask
    /// so particles never extrapolate past the data domain.
    fn copy_initial_to_current(&mut self) {
        self.current_pos = self.initial_pos.clone();
        if let Source::Discrete(src) = &self.source {
            let lo = src.data_pos.get(0, 0);
            let hi = src
                .data_pos
                .get(src.data_pos.nx() - 1, src.data_pos.ny() - 1);
            self.current_pos.set_bound(lo.x, hi.x, lo.y, hi.y);
            self.current_pos.init_out_of_bound();
        }
        self.current_vel = None;
    }

    /// Produce the velocity field for the current positions and time.
    fn set_current_velocity(&mut self) -> Result<()> {
        let (nx, ny) = (self.nx, self.ny);
        let vel = self.current_vel.get_or_insert_with(|| Velocity::new(nx, ny));
        match &mut self.source {
            Source::Analytic(model) => {
                vel.eval_model(model.as_ref(), &self.current_pos, self.current_time);
            }
            Source::Discrete(src) => {
                src.advance_window(self.current_time, self.initial_time, self.direction)?;
                src.current
                    .lerp_in_time(&src.previous, &src.next, self.current_time);
                vel.interpolate_from(&self.current_pos, &src.current, &src.data_pos);
                vel.update_time(self.current_time);
            }
        }
        Ok(())
    }
}

/// A two-snapshot window of data velocities read from files named
/// `<prefix><integer-truncated-time><suffix>`.
struct DiscreteSource {
    data_delta: f64,
    current_data_time: f64,
    begin_data_time: f64,
    end_data_time: f64,
    raw_time_range: (f64, f64),
    prefix: String,
    suffix: String,
    data_pos: Position,
    previous: Velocity,
    next: Velocity,
    /// Temporal interpolation of `previous` and `next` at the flow time.
    current: Velocity,
}

impl DiscreteSource {
    fn new(data_nx: usize, data_ny: usize) -> Self {
        Self {
            data_delta: 0.0,
            current_data_time: 0.0,
            begin_data_time: 0.0,
            end_data_time: 0.0,
            raw_time_range: (0.0, 0.0),
            prefix: String::new(),
            suffix: ".txt".to_string(),
            data_pos: Position::new(data_nx, data_ny),
            previous: Velocity::new(data_nx, data_ny),
            next: Velocity::new(data_nx, data_ny),
            current: Velocity::new(data_nx, data_ny),
        }
    }

    /// Orient the stored raw time bounds for the traversal direction.
    fn orient(&mut self, direction: Direction) {
        let (t1, t2) = self.raw_time_range;
        let (lo, hi) = (t1.min(t2), t1.max(t2));
        match direction {
            Direction::Forward => {
                self.begin_data_time = lo;
                self.end_data_time = hi;
            }
            Direction::Backward => {
                self.begin_data_time = hi;
                self.end_data_time = lo;
            }
        }
    }

    fn data_file_name(&self, time: f64) -> String {
        format!("{}{}{}", self.prefix, time as i64, self.suffix)
    }

    /// Keep the snapshot window around the flow's current time, reloading
    /// both snapshots whenever the window moves.
    fn advance_window(
        &mut self,
        current_time: f64,
        initial_time: f64,
        direction: Direction,
    ) -> Result<()> {
        let signed = match direction {
            Direction::Forward => self.data_delta,
            Direction::Backward => -self.data_delta,
        };

        if current_time == initial_time {
            // first step of a run: seek the window start from the data
            // begin time up to the flow's initial time
            self.current_data_time = self.begin_data_time;
            match direction {
                Direction::Forward => {
                    while self.current_data_time < initial_time {
                        self.current_data_time += self.data_delta;
                    }
                }
                Direction::Backward => {
                    while self.current_data_time > initial_time {
                        self.current_data_time -= self.data_delta;
                    }
                }
            }
            self.load_window(signed)?;
        } else {
            let window_end = self.current_data_time + signed;
            let crossed = match direction {
                Direction::Forward => current_time >= window_end && self.end_data_time > window_end,
                Direction::Backward => current_time <= window_end && self.end_data_time < window_end,
            };
            if crossed {
                self.current_data_time = window_end;
                self.load_window(signed)?;
            }
        }
        Ok(())
    }

    /// Load both window snapshots. The two reads are independent and run
    /// concurrently; both complete before temporal interpolation.
    fn load_window(&mut self, signed_data_delta: f64) -> Result<()> {
        self.previous.update_time(self.current_data_time);
        self.next
            .update_time(self.current_data_time + signed_data_delta);
        let prev_name = self.data_file_name(self.previous.field.time);
        let next_name = self.data_file_name(self.next.field.time);

        let Self { previous, next, .. } = self;
        let (ra, rb) = rayon::join(
            || previous.field.read_from_file(&prev_name),
            || next.field.read_from_file(&next_name),
        );
        ra?;
        rb?;

        debug!(
            "loaded velocity data window [{}, {}] from {} and {}",
            self.previous.field.time, self.next.field.time, prev_name, next_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DoubleGyre;

    #[test]
    fn delta_must_be_positive() {
        let mut flow = FlowField::analytic(4, 4, Box::new(DoubleGyre::default()));
        assert!(matches!(flow.set_delta(0.0), Err(Error::InvalidDelta(_))));
        assert!(matches!(flow.set_delta(-0.1), Err(Error::InvalidDelta(_))));
        assert!(flow.set_delta(0.1).is_ok());
    }

    #[test]
    fn velocity_unset_before_first_step() {
        let flow = FlowField::analytic(4, 4, Box::new(DoubleGyre::default()));
        assert!(matches!(flow.current_velocity(), Err(Error::VelocityNotSet)));
    }

    #[test]
    fn data_window_orientation_follows_direction() {
        let mut flow = FlowField::discrete(4, 4, 4, 4);
        flow.set_data_time_range(0.0, 20.0);
        flow.set_direction(Direction::Backward);
        match &flow.source {
            Source::Discrete(src) => {
                assert_eq!(src.begin_data_time, 20.0);
                assert_eq!(src.end_data_time, 0.0);
            }
            Source::Analytic(_) => unreachable!(),
        }
        flow.set_direction(Direction::Forward);
        match &flow.source {
            Source::Discrete(src) => {
                assert_eq!(src.begin_data_time, 0.0);
                assert_eq!(src.end_data_time, 20.0);
            }
            Source::Analytic(_) => unreachable!(),
        }
    }
}

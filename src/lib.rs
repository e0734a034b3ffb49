//! Lagrangian coherent structure (LCS) extraction from 2-D flows.
//!
//! A grid of tracer particles is advected through a time-dependent velocity
//! field (closed-form model or file-sampled data) and the finite-time
//! Lyapunov exponent is computed from the resulting flow-map deformation.

pub mod field;
pub mod flow;
pub mod ftle;
pub mod model;
pub mod position;
pub mod tensor;
pub mod velocity;

use thiserror::Error;

pub use field::Field;
pub use flow::{Direction, FlowField};
pub use ftle::Ftle;
pub use position::Position;
pub use tensor::Tensor;
pub use velocity::Velocity;

#[derive(Debug, Error)]
pub enum Error {
    /// Asked for the flow's velocity before the first advection step.
    #[error("current velocity not set")]
    VelocityNotSet,

    /// Stored grid shape differs from the target field's shape.
    #[error("field shape mismatch: expected {expected_nx}x{expected_ny}, found {found_nx}x{found_ny}")]
    ShapeMismatch {
        expected_nx: usize,
        expected_ny: usize,
        found_nx: usize,
        found_ny: usize,
    },

    /// Coordinate range lengths do not cover the grid.
    #[error("range length mismatch: grid is {nx}x{ny}, ranges have {xlen}/{ylen} points")]
    RangeMismatch {
        nx: usize,
        ny: usize,
        xlen: usize,
        ylen: usize,
    },

    /// A uniform axis range needs at least two sample points.
    #[error("uniform range needs at least 2 points per axis, grid is {nx}x{ny}")]
    DegenerateAxis { nx: usize, ny: usize },

    #[error("time step must be positive, got {0}")]
    InvalidDelta(f64),

    #[error("expected {expected} model parameters, got {found}")]
    ParameterCount { expected: usize, found: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A field file opened fine but its contents did not parse.
    #[error("malformed field file {path}: {reason}")]
    Malformed { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

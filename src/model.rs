use std::f64::consts::PI;

use glam::DVec2;

use crate::{Error, Result};

/// A closed-form velocity model: pure function of (x, y, t). This is the
/// plug-in point for analytic flows.
pub trait VelocityModel: Send + Sync {
    fn velocity(&self, x: f64, y: f64, t: f64) -> DVec2;
}

/// Double-gyre model (Shadden et al. 2005): a pair of counter-rotating gyres
/// on [0,2]x[0,1] with a time-periodic dividing line.
///
/// `f(x,t) = a(t) x^2 + b(t) x` with `a(t) = eps sin(wt)`,
/// `b(t) = 1 - 2 eps sin(wt)`;
/// `u = -pi A sin(pi f) cos(pi y)`, `v = pi A cos(pi f) sin(pi y) df/dx`.
#[derive(Clone, Copy, Debug)]
pub struct DoubleGyre {
    pub epsilon: f64,
    pub a: f64,
    pub omega: f64,
}

impl Default for DoubleGyre {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            a: 0.1,
            omega: PI / 5.0,
        }
    }
}

impl DoubleGyre {
    /// Build from a parameter vector `[epsilon, a, omega]`.
    pub fn from_params(p: &[f64]) -> Result<Self> {
        if p.len() != 3 {
            return Err(Error::ParameterCount {
                expected: 3,
                found: p.len(),
            });
        }
        Ok(Self {
            epsilon: p[0],
            a: p[1],
            omega: p[2],
        })
    }
}

impl VelocityModel for DoubleGyre {
    fn velocity(&self, x: f64, y: f64, t: f64) -> DVec2 {
        let at = self.epsilon * (self.omega * t).sin();
        let bt = 1.0 - 2.0 * self.epsilon * (self.omega * t).sin();
        let f = at * x * x + bt * x;
        let dfdx = 2.0 * at * x + bt;

        let u = -PI * self.a * (PI * f).sin() * (PI * y).cos();
        let v = PI * self.a * (PI * f).cos() * (PI * y).sin() * dfdx;
        DVec2::new(u, v)
    }
}

/// Bower model for a meandering jet (Bower 1991), implemented in the moving
/// frame where the stream function is steady; velocities are its partial
/// derivatives. Lengths in km, speeds in km/day; `t` is unused.
#[derive(Clone, Copy, Debug)]
pub struct BowerJet {
    /// Downstream speed at the jet center (km/day).
    pub sc: f64,
    /// Wave amplitude (km).
    pub a: f64,
    /// Wave length (km).
    pub l: f64,
    /// Jet phase speed (km/day).
    pub cx: f64,
    /// Scale width of the jet (km).
    pub lambda: f64,
}

impl Default for BowerJet {
    fn default() -> Self {
        Self {
            sc: 50.0,
            a: 50.0,
            l: 400.0,
            cx: 10.0,
            lambda: 40.0,
        }
    }
}

impl BowerJet {
    /// Build from a parameter vector `[sc, a, l, cx, lambda]`.
    pub fn from_params(p: &[f64]) -> Result<Self> {
        if p.len() != 5 {
            return Err(Error::ParameterCount {
                expected: 5,
                found: p.len(),
            });
        }
        Ok(Self {
            sc: p[0],
            a: p[1],
            l: p[2],
            cx: p[3],
            lambda: p[4],
        })
    }
}

impl VelocityModel for BowerJet {
    fn velocity(&self, x: f64, y: f64, _t: f64) -> DVec2 {
        let phi0 = self.sc * self.lambda; // scale factor
        let k = 2.0 * PI / self.l; // wave number

        let yc = self.a * (k * x).sin(); // center streamline
        let dyc = self.a * k * (k * x).cos();
        let alpha0 = self.lambda * (dyc * dyc + 1.0).sqrt();
        let sech2 = ((y - yc) / alpha0).cosh().powi(-2);

        let u = -self.cx + phi0 * sech2 / alpha0;
        let v = -phi0
            * ((yc * dyc * k * k * (y - yc)) / (self.lambda * (dyc * dyc + 1.0).powf(1.5))
                - dyc / alpha0)
            * sech2;
        DVec2::new(u, v)
    }
}

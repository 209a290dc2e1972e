//! # Shear Critical Loads
//!
//! Global and local shear buckling loads.
//!
//! ## Closed Form
//!
//! ```text
//! N12crit = pi^2 (D11 D22^3)^(1/4) / b^2
//!           * (1 + l1^4 + 6 l1^2 l2^2 + l2^4 + 2 xi) / (2 l1^2 l2)
//! ```
//!
//! where the mode-shape parameters `(l1, l2)` solve the stationarity
//! condition of the buckling load. With `s = l2^2` and
//! `T = 1 + 2 s xi + s^2 + gamma`, `l1 = T^(1/4)` and `s` is the root of
//!
//! ```text
//! R(s) = s + sqrt(T) + xi/3 - sqrt((3 + xi)/9 + 4/3 sqrt(T) xi + 4/3 T)
//! ```
//!
//! found by a bracketed Newton iteration. When `R` has two positive roots
//! (large `xi`, small `gamma`) the largest one is taken; it continues the
//! single root of smaller `xi`. The mode shape is continuous, so no sum over
//! discrete modes is needed.
//!
//! ## Surrogate
//!
//! ```text
//! N12crit = pi^2 (D11 D22^3)^(1/4) / b^2 * exp(GP([ln xi, ln rho0, ln(1 + gamma), ln zeta]))
//! ```

use std::f64::consts::PI;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{BucklingModel, GlobalBucklingInputs, LocalBucklingInputs, NewtonSettings};
use crate::errors::{ensure_finite, ensure_non_negative, ensure_positive, PanelError, PanelResult};

/// Doublings or halvings tried while bracketing the mode parameter
const MAX_BRACKET_STEPS: usize = 64;

/// Shear buckling mode-shape parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShearModeShape {
    pub lam1: f64,
    pub lam2: f64,
}

/// Derivatives of the mode shape, `[d/dxi, d/dgamma]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeShapePartials {
    pub lam1: [f64; 2],
    pub lam2: [f64; 2],
}

/// Residual terms at one iterate
struct Residual {
    value: f64,
    t: f64,
    /// dR/ds
    ds: f64,
    /// dR/dxi at fixed s
    dxi: f64,
    /// dR/dgamma at fixed s
    dgamma: f64,
}

fn residual(s: f64, xi: f64, gamma: f64) -> Option<Residual> {
    let t = 1.0 + 2.0 * s * xi + s * s + gamma;
    if !(t > 0.0) {
        return None;
    }
    let root_t = t.sqrt();
    let q = (3.0 + xi) / 9.0 + 4.0 / 3.0 * root_t * xi + 4.0 / 3.0 * t;
    if !(q > 0.0) {
        return None;
    }
    let root_q = q.sqrt();
    let dq_dt = 2.0 / 3.0 * xi / root_t + 4.0 / 3.0;

    let t_s = 2.0 * xi + 2.0 * s;
    let t_xi = 2.0 * s;

    Some(Residual {
        value: s + root_t + xi / 3.0 - root_q,
        t,
        ds: 1.0 + t_s / (2.0 * root_t) - dq_dt * t_s / (2.0 * root_q),
        dxi: t_xi / (2.0 * root_t) + 1.0 / 3.0
            - (dq_dt * t_xi + 1.0 / 9.0 + 4.0 / 3.0 * root_t) / (2.0 * root_q),
        dgamma: 1.0 / (2.0 * root_t) - dq_dt / (2.0 * root_q),
    })
}

/// Bracket `[lo, hi]` of the largest root, `R(lo) < 0 <= R(hi)`.
///
/// `R` is negative at small `s` and grows like `(2 - 2/sqrt(3)) s`, so the
/// search doubles or halves from `s = 1` until the sign changes. For large
/// `xi` and small `gamma` a second root sits close to zero; the bracket
/// never reaches it.
fn bracket_mode_parameter(xi: f64, gamma: f64) -> Option<(f64, f64)> {
    let value = |s: f64| residual(s, xi, gamma).map(|r| r.value);
    let mut hi = 1.0;
    if value(hi)? >= 0.0 {
        let mut lo = 0.5 * hi;
        for _ in 0..MAX_BRACKET_STEPS {
            if value(lo)? < 0.0 {
                return Some((lo, hi));
            }
            hi = lo;
            lo *= 0.5;
        }
        return None;
    }
    for _ in 0..MAX_BRACKET_STEPS {
        let lo = hi;
        hi *= 2.0;
        if value(hi)? >= 0.0 {
            return Some((lo, hi));
        }
    }
    None
}

/// One more Newton step once inside the tolerance, kept only if it helps
fn polish(s: f64, r: Residual, xi: f64, gamma: f64) -> (f64, Residual) {
    let next = s - r.value / r.ds;
    match residual(next, xi, gamma) {
        Some(polished) if next > 0.0 && polished.value.abs() < r.value.abs() => (next, polished),
        _ => (s, r),
    }
}

/// Safeguarded Newton solve for `s = l2^2`; returns `s` and the residual
/// terms at the root. Steps leaving the bracket fall back to bisection.
fn solve_mode_parameter(xi: f64, gamma: f64, settings: &NewtonSettings) -> PanelResult<(f64, Residual)> {
    ensure_positive("xi", xi)?;
    ensure_non_negative("gamma", gamma)?;

    let Some((mut lo, mut hi)) = bracket_mode_parameter(xi, gamma) else {
        warn!("no sign change of the shear mode residual for xi = {xi}, gamma = {gamma}");
        return Err(PanelError::convergence_failure("shear mode shape", 0, f64::NAN));
    };

    let mut s = 0.5 * (lo + hi);
    let mut last = f64::NAN;
    for iteration in 0..=settings.max_iterations {
        let Some(r) = residual(s, xi, gamma) else {
            break;
        };
        last = r.value;
        if r.value.abs() <= settings.tolerance {
            debug!("shear mode shape converged in {iteration} iterations (xi = {xi}, gamma = {gamma})");
            return Ok(polish(s, r, xi, gamma));
        }
        if iteration == settings.max_iterations {
            break;
        }
        if r.value < 0.0 {
            lo = s;
        } else {
            hi = s;
        }
        let step = s - r.value / r.ds;
        s = if step > lo && step < hi { step } else { 0.5 * (lo + hi) };
    }

    warn!("shear mode shape did not converge for xi = {xi}, gamma = {gamma}");
    Err(PanelError::convergence_failure(
        "shear mode shape",
        settings.max_iterations,
        last,
    ))
}

/// Solve the shear mode-shape parameters for given `xi` and `gamma`.
pub fn shear_mode_shape(xi: f64, gamma: f64, settings: &NewtonSettings) -> PanelResult<ShearModeShape> {
    let (s, r) = solve_mode_parameter(xi, gamma, settings)?;
    Ok(ShearModeShape {
        lam1: r.t.powf(0.25),
        lam2: s.sqrt(),
    })
}

/// Mode shape and its derivatives by implicit differentiation of the residual.
pub fn shear_mode_shape_sens(
    xi: f64,
    gamma: f64,
    settings: &NewtonSettings,
) -> PanelResult<(ShearModeShape, ModeShapePartials)> {
    let (s, r) = solve_mode_parameter(xi, gamma, settings)?;
    let ds = [-r.dxi / r.ds, -r.dgamma / r.ds];
    let t_s = 2.0 * xi + 2.0 * s;
    let t_direct = [2.0 * s, 1.0];
    let lam1 = r.t.powf(0.25);
    let lam2 = s.sqrt();
    let dlam1_dt = 0.25 * lam1 / r.t;

    let mut partials = ModeShapePartials {
        lam1: [0.0; 2],
        lam2: [0.0; 2],
    };
    for i in 0..2 {
        partials.lam1[i] = dlam1_dt * (t_s * ds[i] + t_direct[i]);
        partials.lam2[i] = ds[i] / (2.0 * lam2);
    }
    Ok((ShearModeShape { lam1, lam2 }, partials))
}

/// Nondimensional closed-form factor in terms of `s = l2^2`
fn closed_form_factor(s: f64, xi: f64, gamma: f64) -> f64 {
    let t = 1.0 + 2.0 * s * xi + s * s + gamma;
    let root_t = t.sqrt();
    (1.0 + t + 6.0 * root_t * s + s * s + 2.0 * xi) / (2.0 * root_t * s.sqrt())
}

impl BucklingModel {
    fn closed_form_shear(&self, xi: f64, gamma: f64) -> PanelResult<f64> {
        let (s, _) = solve_mode_parameter(xi, gamma, &self.newton)?;
        Ok(closed_form_factor(s, xi, gamma))
    }

    /// Closed-form factor with `[d/dxi, d/dgamma]`
    fn closed_form_shear_sens(&self, xi: f64, gamma: f64) -> PanelResult<(f64, [f64; 2])> {
        let (s, r) = solve_mode_parameter(xi, gamma, &self.newton)?;
        let t = r.t;
        let root_t = t.sqrt();
        let den = 2.0 * root_t * s.sqrt();
        let factor = closed_form_factor(s, xi, gamma);

        // partials holding the other arguments of (s, T, xi) fixed
        let f_t = (1.0 + 3.0 * s / root_t) / den - factor / (2.0 * t);
        let f_s = (6.0 * root_t + 2.0 * s) / den - factor / (2.0 * s);
        let f_xi = 2.0 / den;

        let t_s = 2.0 * xi + 2.0 * s;
        let df_ds = f_s + f_t * t_s;
        let ds_dxi = -r.dxi / r.ds;
        let ds_dgamma = -r.dgamma / r.ds;

        Ok((
            factor,
            [
                df_ds * ds_dxi + f_t * 2.0 * s + f_xi,
                df_ds * ds_dgamma + f_t,
            ],
        ))
    }

    /// Global shear critical load of the stiffened panel.
    pub fn critical_global_shear_load(&self, inputs: &GlobalBucklingInputs) -> PanelResult<f64> {
        inputs.validate()?;
        let GlobalBucklingInputs {
            d11,
            d22,
            b,
            rho0,
            xi,
            gamma,
            zeta,
            ..
        } = *inputs;
        let dim = PI * PI * (d11 * d22 * d22 * d22).powf(0.25) / (b * b);
        let load = match &self.surrogates.shear {
            Some(gp) => {
                debug!("global shear load from GP surrogate");
                let features = [xi.ln(), rho0.ln(), gamma.ln_1p(), zeta.ln()];
                dim * gp.predict_mean(&features).exp()
            }
            None => dim * self.closed_form_shear(xi, gamma)?,
        };
        ensure_finite("global shear critical load", load)
    }

    /// Global shear load and the partials of `seed * N12crit`.
    ///
    /// The load does not depend on `delta`, its partial is always zero.
    pub fn critical_global_shear_load_sens(
        &self,
        seed: f64,
        inputs: &GlobalBucklingInputs,
    ) -> PanelResult<(f64, GlobalBucklingInputs)> {
        inputs.validate()?;
        let GlobalBucklingInputs {
            d11,
            d22,
            b,
            rho0,
            xi,
            gamma,
            zeta,
            ..
        } = *inputs;
        let dim = PI * PI * (d11 * d22 * d22 * d22).powf(0.25) / (b * b);

        let (load, mut sens) = match &self.surrogates.shear {
            Some(gp) => {
                let features = [xi.ln(), rho0.ln(), gamma.ln_1p(), zeta.ln()];
                let load = dim * gp.predict_mean(&features).exp();
                let (_, xsens) = gp.predict_mean_sens(seed * load, &features);
                let sens = GlobalBucklingInputs {
                    xi: xsens[0] / xi,
                    rho0: xsens[1] / rho0,
                    gamma: xsens[2] / (1.0 + gamma),
                    zeta: xsens[3] / zeta,
                    ..GlobalBucklingInputs::default()
                };
                (load, sens)
            }
            None => {
                let (factor, dfactor) = self.closed_form_shear_sens(xi, gamma)?;
                let sens = GlobalBucklingInputs {
                    xi: seed * dim * dfactor[0],
                    gamma: seed * dim * dfactor[1],
                    ..GlobalBucklingInputs::default()
                };
                (dim * factor, sens)
            }
        };

        let ydim = seed * load;
        sens.d11 += 0.25 * ydim / d11;
        sens.d22 += 0.75 * ydim / d22;
        sens.b += -2.0 * ydim / b;

        Ok((ensure_finite("global shear critical load", load)?, sens))
    }

    /// Local shear critical load of the skin between two stiffeners.
    pub fn critical_local_shear_load(&self, inputs: &LocalBucklingInputs) -> PanelResult<f64> {
        inputs.validate()?;
        let LocalBucklingInputs {
            d11,
            d22,
            pitch,
            rho0,
            xi,
            zeta,
        } = *inputs;
        let dim = PI * PI * (d11 * d22 * d22 * d22).powf(0.25) / (pitch * pitch);
        let load = match &self.surrogates.shear {
            Some(gp) => {
                debug!("local shear load from GP surrogate");
                let features = [xi.ln(), rho0.ln(), 0.0, zeta.ln()];
                dim * gp.predict_mean(&features).exp()
            }
            None => dim * self.closed_form_shear(xi, 0.0)?,
        };
        ensure_finite("local shear critical load", load)
    }

    /// Local shear load and the partials of `seed * N12crit`.
    pub fn critical_local_shear_load_sens(
        &self,
        seed: f64,
        inputs: &LocalBucklingInputs,
    ) -> PanelResult<(f64, LocalBucklingInputs)> {
        inputs.validate()?;
        let LocalBucklingInputs {
            d11,
            d22,
            pitch,
            rho0,
            xi,
            zeta,
        } = *inputs;
        let dim = PI * PI * (d11 * d22 * d22 * d22).powf(0.25) / (pitch * pitch);

        let (load, mut sens) = match &self.surrogates.shear {
            Some(gp) => {
                let features = [xi.ln(), rho0.ln(), 0.0, zeta.ln()];
                let load = dim * gp.predict_mean(&features).exp();
                let (_, xsens) = gp.predict_mean_sens(seed * load, &features);
                let sens = LocalBucklingInputs {
                    xi: xsens[0] / xi,
                    rho0: xsens[1] / rho0,
                    zeta: xsens[3] / zeta,
                    ..LocalBucklingInputs::default()
                };
                (load, sens)
            }
            None => {
                let (factor, dfactor) = self.closed_form_shear_sens(xi, 0.0)?;
                let sens = LocalBucklingInputs {
                    xi: seed * dim * dfactor[0],
                    ..LocalBucklingInputs::default()
                };
                (dim * factor, sens)
            }
        };

        let ydim = seed * load;
        sens.d11 += 0.25 * ydim / d11;
        sens.d22 += 0.75 * ydim / d22;
        sens.pitch += -2.0 * ydim / pitch;

        Ok((ensure_finite("local shear critical load", load)?, sens))
    }
}

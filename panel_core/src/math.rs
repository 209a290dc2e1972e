//! # Smooth Scalar Kernels
//!
//! Differentiable stand-ins for `max(x, 0)`, `|x|` and `max(v_i)` used by the
//! GP kernels, the closed-form mode sums and the failure aggregate.
//!
//! All functions are written in an overflow-safe form: large smoothing
//! constants (or large arguments) never evaluate `exp` of a large positive
//! number.
//!
//! ## Example
//!
//! ```rust
//! use panel_core::math::{ks_aggregation, soft_relu};
//!
//! let fails = [0.2, 0.9, 0.4];
//! assert!(ks_aggregation(&fails, 100.0) >= 0.9);
//! assert!((soft_relu(3.0, 50.0) - 3.0).abs() < 1e-12);
//! ```

/// Smooth ReLU: `ln(1 + exp(rho*x)) / rho`.
pub fn soft_relu(x: f64, rho: f64) -> f64 {
    let z = rho * x;
    if z > 0.0 {
        x + (-z).exp().ln_1p() / rho
    } else {
        z.exp().ln_1p() / rho
    }
}

/// Derivative of [`soft_relu`] w.r.t. `x` (the logistic sigmoid of `rho*x`).
pub fn soft_relu_sens(x: f64, rho: f64) -> f64 {
    let z = rho * x;
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

/// Smooth absolute value: `ln(exp(rho*x) + exp(-rho*x)) / rho`.
pub fn soft_abs(x: f64, rho: f64) -> f64 {
    let ax = x.abs();
    ax + (-2.0 * rho * ax).exp().ln_1p() / rho
}

/// Derivative of [`soft_abs`] w.r.t. `x`.
pub fn soft_abs_sens(x: f64, rho: f64) -> f64 {
    (rho * x).tanh()
}

/// Kreisselmeier-Steinhauser smooth maximum.
///
/// Always bounded below by `max(values)` and above by
/// `max(values) + ln(n) / weight`.
pub fn ks_aggregation(values: &[f64], weight: f64) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = values.iter().map(|v| (weight * (v - max)).exp()).sum();
    max + sum.ln() / weight
}

/// KS aggregate plus `dKS/dv_i` written into `dks_dvalues` (overwritten).
///
/// The partials are the softmax weights of the inputs and sum to one.
pub fn ks_aggregation_sens(values: &[f64], weight: f64, dks_dvalues: &mut [f64]) -> f64 {
    debug_assert_eq!(values.len(), dks_dvalues.len());
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for (v, d) in values.iter().zip(dks_dvalues.iter_mut()) {
        *d = (weight * (v - max)).exp();
        sum += *d;
    }
    for d in dks_dvalues.iter_mut() {
        *d /= sum;
    }
    max + sum.ln() / weight
}

/// Smooth minimum by negation: `-KS(-values)`.
pub fn ks_min(values: &[f64], weight: f64) -> f64 {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    -ks_aggregation(&negated, weight)
}

/// Smooth minimum with its partials (same weights as the negated KS max).
pub fn ks_min_sens(values: &[f64], weight: f64, dmin_dvalues: &mut [f64]) -> f64 {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    // d(-KS(-v))/dv_i = dKS/du_i evaluated at u = -v
    -ks_aggregation_sens(&negated, weight, dmin_dvalues)
}

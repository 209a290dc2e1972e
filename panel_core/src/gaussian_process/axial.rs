//! # Axial Buckling Kernel
//!
//! Covariance over `[ln xi, ln rho0, ln(1 + gamma), ln zeta]`:
//!
//! ```text
//! k = k11 * (k0 + k2 + k3) + k12 * k0 * k2 * k3
//!
//! k0  = 1 + x0*y0
//! k11 = c + relu(-x1) * relu(-y1)
//! k12 = 1 + a1 * SE(x1 - y1; l1) * g(x1) * g(y1),  g(x) = relu(1 - |x|)
//! k2  = 1 + b2*x2*y2 + a2 * SE(x2 - y2; l2)
//! k3  = (1 + b3*x3*y3)^2 + a3 * SE(x3 - y3; l3)
//! ```
//!
//! `relu` and `|.|` are the smooth approximations from [`crate::math`]. The
//! `k11` gate only correlates short plates (`rho0 < 1`), where the
//! knock-down is dominated by the mode count; `k12` bumps up the correlation
//! of plates near `rho0 = 1`.

use serde::{Deserialize, Serialize};

use super::{squared_exponential, squared_exponential_sens, Features, Kernel};
use crate::math::{soft_abs, soft_abs_sens, soft_relu, soft_relu_sens};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxialKernel {
    /// Smoothing constant of the soft ReLU/abs gates
    pub smoothing: f64,
    /// Constant floor `c` of the aspect-ratio gate
    pub aspect_floor: f64,
    pub aspect_bump_amplitude: f64,
    pub aspect_bump_length: f64,
    pub stiffener_linear: f64,
    pub stiffener_amplitude: f64,
    pub stiffener_length: f64,
    pub shear_linear: f64,
    pub shear_amplitude: f64,
    pub shear_length: f64,
}

impl Default for AxialKernel {
    fn default() -> Self {
        AxialKernel {
            smoothing: 10.0,
            aspect_floor: 0.1,
            aspect_bump_amplitude: 0.02,
            aspect_bump_length: 0.2,
            stiffener_linear: 0.5,
            stiffener_amplitude: 0.1,
            stiffener_length: 3.0,
            shear_linear: 0.2,
            shear_amplitude: 0.1,
            shear_length: 3.0,
        }
    }
}

/// Factor values at one (xtest, xtrain) pair
struct Factors {
    k0: f64,
    k11: f64,
    k12: f64,
    k2: f64,
    k3: f64,
}

impl AxialKernel {
    fn gate(&self, x: f64) -> f64 {
        soft_relu(1.0 - soft_abs(x, self.smoothing), self.smoothing)
    }

    fn gate_sens(&self, x: f64) -> f64 {
        let rho = self.smoothing;
        -soft_relu_sens(1.0 - soft_abs(x, rho), rho) * soft_abs_sens(x, rho)
    }

    fn factors(&self, x: &Features, y: &Features) -> Factors {
        let rho = self.smoothing;
        let k0 = 1.0 + x[0] * y[0];
        let k11 = self.aspect_floor + soft_relu(-x[1], rho) * soft_relu(-y[1], rho);
        let k12 = 1.0
            + self.aspect_bump_amplitude
                * squared_exponential(x[1] - y[1], self.aspect_bump_length)
                * self.gate(x[1])
                * self.gate(y[1]);
        let k2 = 1.0
            + self.stiffener_linear * x[2] * y[2]
            + self.stiffener_amplitude * squared_exponential(x[2] - y[2], self.stiffener_length);
        let linear = 1.0 + self.shear_linear * x[3] * y[3];
        let k3 = linear * linear
            + self.shear_amplitude * squared_exponential(x[3] - y[3], self.shear_length);
        Factors { k0, k11, k12, k2, k3 }
    }
}

impl Kernel for AxialKernel {
    fn kernel(&self, xtest: &Features, xtrain: &Features) -> f64 {
        let Factors { k0, k11, k12, k2, k3 } = self.factors(xtest, xtrain);
        k11 * (k0 + k2 + k3) + k12 * k0 * k2 * k3
    }

    fn kernel_sens(&self, ksens: f64, xtest: &Features, xtrain: &Features, xtest_sens: &mut Features) {
        let (x, y) = (xtest, xtrain);
        let rho = self.smoothing;
        let Factors { k0, k11, k12, k2, k3 } = self.factors(x, y);

        let dk0 = y[0];
        let dk11 = -soft_relu_sens(-x[1], rho) * soft_relu(-y[1], rho);
        let d1 = x[1] - y[1];
        let dk12 = self.aspect_bump_amplitude
            * self.gate(y[1])
            * (squared_exponential_sens(d1, self.aspect_bump_length) * self.gate(x[1])
                + squared_exponential(d1, self.aspect_bump_length) * self.gate_sens(x[1]));
        let dk2 = self.stiffener_linear * y[2]
            + self.stiffener_amplitude * squared_exponential_sens(x[2] - y[2], self.stiffener_length);
        let linear = 1.0 + self.shear_linear * x[3] * y[3];
        let dk3 = 2.0 * linear * self.shear_linear * y[3]
            + self.shear_amplitude * squared_exponential_sens(x[3] - y[3], self.shear_length);

        xtest_sens[0] += ksens * dk0 * (k11 + k12 * k2 * k3);
        xtest_sens[1] += ksens * (dk11 * (k0 + k2 + k3) + dk12 * k0 * k2 * k3);
        xtest_sens[2] += ksens * dk2 * (k11 + k12 * k0 * k3);
        xtest_sens[3] += ksens * dk3 * (k11 + k12 * k0 * k2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaussian_process::test_support::{assert_kernel_gradient, sample_pairs};

    #[test]
    fn test_kernel_gradient_consistency() {
        let kernel = AxialKernel::default();
        for (x, y) in sample_pairs() {
            assert_kernel_gradient(&kernel, &x, &y);
        }
    }

    #[test]
    fn test_kernel_is_symmetric() {
        let kernel = AxialKernel::default();
        for (x, y) in sample_pairs() {
            let kxy = kernel.kernel(&x, &y);
            let kyx = kernel.kernel(&y, &x);
            assert!((kxy - kyx).abs() < 1e-14 * kxy.abs().max(1.0));
        }
    }

    #[test]
    fn test_kernel_at_origin() {
        let kernel = AxialKernel::default();
        let origin = [0.0; 4];
        let relu0 = 2f64.ln() / 10.0;
        let gate0 = soft_relu(1.0 - relu0, 10.0);
        let k11 = 0.1 + relu0 * relu0;
        let k12 = 1.0 + 0.02 * gate0 * gate0;
        let expected = k11 * (1.0 + 1.1 + 1.1) + k12 * 1.1 * 1.1;
        assert!((kernel.kernel(&origin, &origin) - expected).abs() < 1e-14);
    }

    #[test]
    fn test_short_plate_gate() {
        // the relu gate only correlates points with ln(rho0) < 0
        let kernel = AxialKernel::default();
        let long = kernel.kernel(&[0.0, 1.5, 0.0, 0.0], &[0.0, 1.5, 0.0, 0.0]);
        let short = kernel.kernel(&[0.0, -1.5, 0.0, 0.0], &[0.0, -1.5, 0.0, 0.0]);
        assert!(short > long + 2.0);
    }

    #[test]
    fn test_kernel_sens_accumulates() {
        let kernel = AxialKernel::default();
        let (x, y) = sample_pairs()[0];
        let mut once = [0.0; 4];
        kernel.kernel_sens(1.0, &x, &y, &mut once);
        let mut twice = once;
        kernel.kernel_sens(1.0, &x, &y, &mut twice);
        for i in 0..4 {
            assert!((twice[i] - 2.0 * once[i]).abs() < 1e-14);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let kernel: AxialKernel = serde_json::from_str(r#"{"smoothing": 25.0}"#).unwrap();
        assert_eq!(kernel.smoothing, 25.0);
        assert_eq!(kernel.aspect_bump_length, 0.2);
    }
}

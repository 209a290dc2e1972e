//! # Stiffener Crippling Kernel
//!
//! Covariance over `[ln xi, ln rho0, ln nu_gen, ln zeta]` of the stiffener
//! web treated as a plate:
//!
//! ```text
//! k = k0 * k2 * (k1 + k3)
//!
//! k0 = 1 + b0*x0*y0
//! k1 = c + relu(-x1)*relu(-y1) + a1 * SE(x1 - y1; l1)
//! k2 = 1 + a2 * SE(x2 - y2; l2)
//! k3 = (1 + b3*x3*y3)^2
//! ```

use serde::{Deserialize, Serialize};

use super::{squared_exponential, squared_exponential_sens, Features, Kernel};
use crate::math::{soft_relu, soft_relu_sens};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CripplingKernel {
    pub smoothing: f64,
    pub rigidity_linear: f64,
    pub aspect_floor: f64,
    pub aspect_amplitude: f64,
    pub aspect_length: f64,
    pub poisson_amplitude: f64,
    pub poisson_length: f64,
    pub shear_linear: f64,
}

impl Default for CripplingKernel {
    fn default() -> Self {
        CripplingKernel {
            smoothing: 10.0,
            rigidity_linear: 1.0,
            aspect_floor: 0.1,
            aspect_amplitude: 0.1,
            aspect_length: 1.0,
            poisson_amplitude: 0.3,
            poisson_length: 0.5,
            shear_linear: 0.2,
        }
    }
}

impl CripplingKernel {
    fn factors(&self, x: &Features, y: &Features) -> [f64; 4] {
        let rho = self.smoothing;
        let k0 = 1.0 + self.rigidity_linear * x[0] * y[0];
        let k1 = self.aspect_floor
            + soft_relu(-x[1], rho) * soft_relu(-y[1], rho)
            + self.aspect_amplitude * squared_exponential(x[1] - y[1], self.aspect_length);
        let k2 = 1.0 + self.poisson_amplitude * squared_exponential(x[2] - y[2], self.poisson_length);
        let linear = 1.0 + self.shear_linear * x[3] * y[3];
        [k0, k1, k2, linear * linear]
    }
}

impl Kernel for CripplingKernel {
    fn kernel(&self, xtest: &Features, xtrain: &Features) -> f64 {
        let [k0, k1, k2, k3] = self.factors(xtest, xtrain);
        k0 * k2 * (k1 + k3)
    }

    fn kernel_sens(&self, ksens: f64, xtest: &Features, xtrain: &Features, xtest_sens: &mut Features) {
        let (x, y) = (xtest, xtrain);
        let rho = self.smoothing;
        let [k0, k1, k2, k3] = self.factors(x, y);

        let dk0 = self.rigidity_linear * y[0];
        let dk1 = -soft_relu_sens(-x[1], rho) * soft_relu(-y[1], rho)
            + self.aspect_amplitude * squared_exponential_sens(x[1] - y[1], self.aspect_length);
        let dk2 = self.poisson_amplitude * squared_exponential_sens(x[2] - y[2], self.poisson_length);
        let dk3 = 2.0 * (1.0 + self.shear_linear * x[3] * y[3]) * self.shear_linear * y[3];

        xtest_sens[0] += ksens * dk0 * k2 * (k1 + k3);
        xtest_sens[1] += ksens * k0 * k2 * dk1;
        xtest_sens[2] += ksens * k0 * dk2 * (k1 + k3);
        xtest_sens[3] += ksens * k0 * k2 * dk3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaussian_process::test_support::{assert_kernel_gradient, sample_pairs};

    #[test]
    fn test_kernel_gradient_consistency() {
        let kernel = CripplingKernel::default();
        for (x, y) in sample_pairs() {
            assert_kernel_gradient(&kernel, &x, &y);
        }
    }

    #[test]
    fn test_kernel_positive_on_diagonal() {
        let kernel = CripplingKernel::default();
        for (x, _) in sample_pairs() {
            assert!(kernel.kernel(&x, &x) > 0.0);
        }
    }

    #[test]
    fn test_poisson_term_decays() {
        let kernel = CripplingKernel::default();
        let near = kernel.kernel(&[0.0, 0.0, 0.1, 0.0], &[0.0, 0.0, 0.15, 0.0]);
        let far = kernel.kernel(&[0.0, 0.0, 0.1, 0.0], &[0.0, 0.0, 2.0, 0.0]);
        assert!(near > far);
    }
}

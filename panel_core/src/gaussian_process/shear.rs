//! # Shear Buckling Kernel
//!
//! Covariance over `[ln xi, ln rho0, ln(1 + gamma), ln zeta]`:
//!
//! ```text
//! k = k1 * (k0 + k2 + k3) + m * k0 * k2 * k3
//!
//! k0 = 1 + x0*y0
//! k1 = c + relu(-x1)*relu(-y1) + p * relu(x1)*relu(y1) + a1 * SE(x1 - y1; l1)
//! k2 = 1 + b2*x2*y2 + a2 * SE(x2 - y2; l2)
//! k3 = (1 + b3*x3*y3)^2 + a3 * SE(x3 - y3; l3)
//! ```
//!
//! Unlike the axial kernel the aspect-ratio factor is gated on both sides:
//! the shear knock-down keeps varying for short plates and saturates slowly
//! for long ones.

use serde::{Deserialize, Serialize};

use super::{squared_exponential, squared_exponential_sens, Features, Kernel};
use crate::math::{soft_relu, soft_relu_sens};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShearKernel {
    pub smoothing: f64,
    pub aspect_floor: f64,
    /// Weight `p` of the long-plate gate
    pub long_plate_weight: f64,
    pub aspect_amplitude: f64,
    pub aspect_length: f64,
    /// Weight `m` of the product term
    pub product_weight: f64,
    pub stiffener_linear: f64,
    pub stiffener_amplitude: f64,
    pub stiffener_length: f64,
    pub shear_linear: f64,
    pub shear_amplitude: f64,
    pub shear_length: f64,
}

impl Default for ShearKernel {
    fn default() -> Self {
        ShearKernel {
            smoothing: 10.0,
            aspect_floor: 0.1,
            long_plate_weight: 0.1,
            aspect_amplitude: 0.05,
            aspect_length: 0.5,
            product_weight: 0.05,
            stiffener_linear: 0.5,
            stiffener_amplitude: 0.1,
            stiffener_length: 3.0,
            shear_linear: 0.2,
            shear_amplitude: 0.1,
            shear_length: 3.0,
        }
    }
}

impl ShearKernel {
    fn factors(&self, x: &Features, y: &Features) -> [f64; 4] {
        let rho = self.smoothing;
        let k0 = 1.0 + x[0] * y[0];
        let k1 = self.aspect_floor
            + soft_relu(-x[1], rho) * soft_relu(-y[1], rho)
            + self.long_plate_weight * soft_relu(x[1], rho) * soft_relu(y[1], rho)
            + self.aspect_amplitude * squared_exponential(x[1] - y[1], self.aspect_length);
        let k2 = 1.0
            + self.stiffener_linear * x[2] * y[2]
            + self.stiffener_amplitude * squared_exponential(x[2] - y[2], self.stiffener_length);
        let linear = 1.0 + self.shear_linear * x[3] * y[3];
        let k3 = linear * linear
            + self.shear_amplitude * squared_exponential(x[3] - y[3], self.shear_length);
        [k0, k1, k2, k3]
    }
}

impl Kernel for ShearKernel {
    fn kernel(&self, xtest: &Features, xtrain: &Features) -> f64 {
        let [k0, k1, k2, k3] = self.factors(xtest, xtrain);
        k1 * (k0 + k2 + k3) + self.product_weight * k0 * k2 * k3
    }

    fn kernel_sens(&self, ksens: f64, xtest: &Features, xtrain: &Features, xtest_sens: &mut Features) {
        let (x, y) = (xtest, xtrain);
        let rho = self.smoothing;
        let m = self.product_weight;
        let [k0, k1, k2, k3] = self.factors(x, y);

        let dk0 = y[0];
        let dk1 = -soft_relu_sens(-x[1], rho) * soft_relu(-y[1], rho)
            + self.long_plate_weight * soft_relu_sens(x[1], rho) * soft_relu(y[1], rho)
            + self.aspect_amplitude * squared_exponential_sens(x[1] - y[1], self.aspect_length);
        let dk2 = self.stiffener_linear * y[2]
            + self.stiffener_amplitude * squared_exponential_sens(x[2] - y[2], self.stiffener_length);
        let linear = 1.0 + self.shear_linear * x[3] * y[3];
        let dk3 = 2.0 * linear * self.shear_linear * y[3]
            + self.shear_amplitude * squared_exponential_sens(x[3] - y[3], self.shear_length);

        xtest_sens[0] += ksens * dk0 * (k1 + m * k2 * k3);
        xtest_sens[1] += ksens * dk1 * (k0 + k2 + k3);
        xtest_sens[2] += ksens * dk2 * (k1 + m * k0 * k3);
        xtest_sens[3] += ksens * dk3 * (k1 + m * k0 * k2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaussian_process::test_support::{assert_kernel_gradient, sample_pairs};
    use crate::gaussian_process::{GaussianProcess, TrainingSet};

    #[test]
    fn test_kernel_gradient_consistency() {
        let kernel = ShearKernel::default();
        for (x, y) in sample_pairs() {
            assert_kernel_gradient(&kernel, &x, &y);
        }
    }

    #[test]
    fn test_long_plates_correlate() {
        // both gates are live, so long plates see more than the floor
        let kernel = ShearKernel::default();
        let long = [0.0, 1.5, 0.0, 0.0];
        let short = [0.0, -1.5, 0.0, 0.0];
        let mixed = kernel.kernel(&long, &short);
        assert!(kernel.kernel(&long, &long) > mixed);
        assert!(kernel.kernel(&short, &short) > kernel.kernel(&long, &long));
    }

    #[test]
    fn test_single_point_mean() {
        let kernel = ShearKernel::default();
        let model = GaussianProcess::new(TrainingSet::new(vec![[0.0; 4]], vec![1.0]).unwrap(), kernel.clone()).unwrap();
        let origin = [0.0; 4];
        assert_eq!(model.predict_mean(&origin), kernel.kernel(&origin, &origin));
    }
}

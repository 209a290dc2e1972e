//! # Gaussian Process Surrogates
//!
//! Kernel-ridge predictive mean over a fixed, offline-trained table.
//!
//! A [`GaussianProcess`] owns one [`TrainingSet`] (sample points plus the
//! regression weights `alpha`) and one covariance kernel implementing
//! [`Kernel`]. Only the predictive mean and its gradient w.r.t. the test
//! point are needed; there is no variance output and no training.
//!
//! Every kernel works on a 4-feature log-space of nondimensional buckling
//! groups, see [`axial`], [`shear`] and [`crippling`].
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "training": {
//!     "xtrain": [[0.0, 0.0, 0.0, 0.0], [0.2, -0.4, 0.1, 3.5]],
//!     "alpha": [0.31, -0.07]
//!   },
//!   "kernel": { "smoothing": 10.0 }
//! }
//! ```

pub mod axial;
pub mod crippling;
pub mod shear;

pub use axial::AxialKernel;
pub use crippling::CripplingKernel;
pub use shear::ShearKernel;

use serde::{Deserialize, Serialize};

use crate::errors::{PanelError, PanelResult};

/// Number of log-space features every buckling surrogate takes
pub const NUM_FEATURES: usize = 4;

/// One feature vector
pub type Features = [f64; NUM_FEATURES];

/// Covariance function with a hand-coded gradient.
///
/// `kernel_sens` must be the exact derivative of `kernel` w.r.t. `xtest`.
pub trait Kernel: Send + Sync {
    /// Covariance between a test point and one training point
    fn kernel(&self, xtest: &Features, xtrain: &Features) -> f64;

    /// Add `ksens * dk/dxtest` into `xtest_sens`.
    fn kernel_sens(&self, ksens: f64, xtest: &Features, xtrain: &Features, xtest_sens: &mut Features);
}

/// Training inputs and regression weights, one weight per sample point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub xtrain: Vec<Features>,
    pub alpha: Vec<f64>,
}

impl TrainingSet {
    /// Create a validated training set
    pub fn new(xtrain: Vec<Features>, alpha: Vec<f64>) -> PanelResult<Self> {
        let set = TrainingSet { xtrain, alpha };
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> PanelResult<()> {
        if self.xtrain.is_empty() {
            return Err(PanelError::invalid_input(
                "xtrain",
                "[]",
                "Training set must contain at least one sample",
            ));
        }
        if self.xtrain.len() != self.alpha.len() {
            return Err(PanelError::dimension_mismatch(
                "alpha",
                self.xtrain.len(),
                self.alpha.len(),
            ));
        }
        if let Some(bad) = self.xtrain.iter().flatten().chain(self.alpha.iter()).find(|v| !v.is_finite()) {
            return Err(PanelError::invalid_input(
                "training",
                bad.to_string(),
                "Training data must be finite",
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }
}

/// A trained surrogate: training table plus covariance kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianProcess<K> {
    pub training: TrainingSet,
    pub kernel: K,
}

impl<K: Kernel> GaussianProcess<K> {
    pub fn new(training: TrainingSet, kernel: K) -> PanelResult<Self> {
        training.validate()?;
        Ok(GaussianProcess { training, kernel })
    }

    pub fn num_training_points(&self) -> usize {
        self.training.len()
    }

    /// Predictive mean `sum_i k(x, X_i) * alpha_i`.
    pub fn predict_mean(&self, xtest: &Features) -> f64 {
        self.training
            .xtrain
            .iter()
            .zip(&self.training.alpha)
            .map(|(xtrain, alpha)| self.kernel.kernel(xtest, xtrain) * alpha)
            .sum()
    }

    /// Predictive mean and the gradient of `seed * mean` w.r.t. `xtest`.
    pub fn predict_mean_sens(&self, seed: f64, xtest: &Features) -> (f64, Features) {
        let mut mean = 0.0;
        let mut xtest_sens = [0.0; NUM_FEATURES];
        for (xtrain, alpha) in self.training.xtrain.iter().zip(&self.training.alpha) {
            mean += self.kernel.kernel(xtest, xtrain) * alpha;
            self.kernel
                .kernel_sens(seed * alpha, xtest, xtrain, &mut xtest_sens);
        }
        (mean, xtest_sens)
    }
}

/// `exp(-0.5 * d^2 / length^2)`
pub(crate) fn squared_exponential(d: f64, length: f64) -> f64 {
    (-0.5 * d * d / (length * length)).exp()
}

/// Derivative of [`squared_exponential`] w.r.t. the test coordinate.
pub(crate) fn squared_exponential_sens(d: f64, length: f64) -> f64 {
    -d / (length * length) * squared_exponential(d, length)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Central-difference check of `kernel_sens` along each feature.
    pub fn assert_kernel_gradient<K: Kernel>(kernel: &K, xtest: &Features, xtrain: &Features) {
        let h = 1e-6;
        let mut analytic = [0.0; NUM_FEATURES];
        kernel.kernel_sens(1.0, xtest, xtrain, &mut analytic);
        for i in 0..NUM_FEATURES {
            let mut forward = *xtest;
            let mut backward = *xtest;
            forward[i] += h;
            backward[i] -= h;
            let fd = (kernel.kernel(&forward, xtrain) - kernel.kernel(&backward, xtrain)) / (2.0 * h);
            let scale = fd.abs().max(1.0);
            assert!(
                (analytic[i] - fd).abs() / scale < 1e-6,
                "feature {i}: analytic {} vs fd {fd} at {:?}/{:?}",
                analytic[i],
                xtest,
                xtrain
            );
        }
    }

    /// Symmetric pairs of points spread across both signs of ln(rho0).
    pub fn sample_pairs() -> Vec<(Features, Features)> {
        vec![
            ([0.1, -0.5, 0.2, 2.0], [0.3, -0.2, 0.0, 1.5]),
            ([-0.2, 0.4, 0.7, 3.1], [0.0, -0.6, 0.1, 2.2]),
            ([0.5, 0.02, 0.05, -1.0], [0.4, 0.05, 0.3, 0.5]),
            ([0.0, 1.3, 1.1, 4.0], [0.2, 0.9, 0.4, 3.7]),
            ([-0.4, -1.2, 0.3, 0.7], [0.1, -1.5, 0.2, 0.1]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_model() -> GaussianProcess<AxialKernel> {
        let training = TrainingSet::new(
            vec![[0.0, 0.0, 0.0, 0.0], [0.2, -0.4, 0.1, 3.5]],
            vec![0.31, -0.07],
        )
        .unwrap();
        GaussianProcess::new(training, AxialKernel::default()).unwrap()
    }

    #[test]
    fn test_training_set_validation() {
        assert!(TrainingSet::new(vec![], vec![]).is_err());
        assert!(matches!(
            TrainingSet::new(vec![[0.0; 4]], vec![1.0, 2.0]),
            Err(PanelError::DimensionMismatch { .. })
        ));
        assert!(TrainingSet::new(vec![[f64::NAN, 0.0, 0.0, 0.0]], vec![1.0]).is_err());
    }

    #[test]
    fn test_single_point_mean_equals_kernel() {
        let training = TrainingSet::new(vec![[0.0; 4]], vec![1.0]).unwrap();
        let kernel = AxialKernel::default();
        let model = GaussianProcess::new(training, kernel.clone()).unwrap();
        let origin = [0.0; 4];
        assert_eq!(model.predict_mean(&origin), kernel.kernel(&origin, &origin) * 1.0);
    }

    #[test]
    fn test_mean_sens_matches_mean() {
        let model = two_point_model();
        let x = [0.15, -0.3, 0.05, 2.9];
        let (mean, _) = model.predict_mean_sens(1.0, &x);
        assert_eq!(mean, model.predict_mean(&x));
    }

    #[test]
    fn test_mean_sens_is_seeded_gradient() {
        let model = two_point_model();
        let x = [0.15, -0.3, 0.05, 2.9];
        let seed = -2.5;
        let (_, grad) = model.predict_mean_sens(seed, &x);
        let h = 1e-6;
        for i in 0..NUM_FEATURES {
            let mut xp = x;
            let mut xm = x;
            xp[i] += h;
            xm[i] -= h;
            let fd = seed * (model.predict_mean(&xp) - model.predict_mean(&xm)) / (2.0 * h);
            assert!((grad[i] - fd).abs() < 1e-7 * fd.abs().max(1.0), "feature {i}");
        }
    }

    #[test]
    fn test_model_json_roundtrip() {
        let model = two_point_model();
        let json = serde_json::to_string(&model).unwrap();
        let back: GaussianProcess<AxialKernel> = serde_json::from_str(&json).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn test_models_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GaussianProcess<AxialKernel>>();
        assert_send_sync::<GaussianProcess<ShearKernel>>();
        assert_send_sync::<GaussianProcess<CripplingKernel>>();
    }
}

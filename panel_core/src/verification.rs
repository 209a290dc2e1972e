//! # Derivative Self-Tests
//!
//! Directional finite-difference checks of every hand-written sensitivity:
//! the nondimensional groups, the five critical loads, the GP kernels and
//! means, and the aggregate failure w.r.t. strain and design variables.
//!
//! A check perturbs the inputs along a direction `p` and compares the
//! adjoint projection `grad . p` with the central difference
//!
//! ```text
//! (f(x0 + eps p) - f(x0 - eps p)) / (2 eps)
//! ```
//!
//! Directions are drawn from a caller-supplied RNG and scaled to the
//! magnitude of each input, so one `epsilon` suits stiffnesses and lengths
//! alike.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buckling::{CripplingInputs, GlobalBucklingInputs, LocalBucklingInputs};
use crate::errors::PanelResult;
use crate::gaussian_process::{Features, GaussianProcess, Kernel};
use crate::nondim::{
    affine_aspect_ratio, affine_aspect_ratio_sens, generalized_poissons_ratio,
    generalized_poissons_ratio_sens, generalized_rigidity, generalized_rigidity_sens,
    stiffener_area_ratio, stiffener_area_ratio_sens, stiffener_stiffness_ratio,
    stiffener_stiffness_ratio_sens, transverse_shear_parameter, transverse_shear_parameter_sens,
};
use crate::panel::StiffenedPanel;

/// Outcome of one directional check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativeCheck {
    /// `grad . p`
    pub adjoint: f64,
    /// Central difference along `p`
    pub finite_difference: f64,
    pub relative_error: f64,
}

impl DerivativeCheck {
    pub fn passed(&self, tolerance: f64) -> bool {
        self.relative_error <= tolerance
    }
}

/// Compare `gradient . direction` with a central difference of `f`.
pub fn directional_check(
    f: impl Fn(&[f64]) -> f64,
    gradient: &[f64],
    x0: &[f64],
    direction: &[f64],
    epsilon: f64,
) -> DerivativeCheck {
    let plus: Vec<f64> = x0.iter().zip(direction).map(|(x, p)| x + epsilon * p).collect();
    let minus: Vec<f64> = x0.iter().zip(direction).map(|(x, p)| x - epsilon * p).collect();
    let finite_difference = (f(&plus) - f(&minus)) / (2.0 * epsilon);
    let adjoint: f64 = gradient.iter().zip(direction).map(|(g, p)| g * p).sum();

    let scale = finite_difference.abs().max(adjoint.abs());
    let relative_error = if scale > 0.0 {
        (adjoint - finite_difference).abs() / scale
    } else {
        0.0
    };
    DerivativeCheck {
        adjoint,
        finite_difference,
        relative_error,
    }
}

/// Random direction with entries scaled to `|x0|` (unit scale for zeros)
pub fn random_direction<R: Rng>(rng: &mut R, x0: &[f64]) -> Vec<f64> {
    x0.iter()
        .map(|x| {
            let scale = if *x == 0.0 { 1.0 } else { x.abs() };
            rng.gen_range(-1.0..1.0) * scale
        })
        .collect()
}

fn to_fixed<const N: usize>(x: &[f64]) -> [f64; N] {
    let mut out = [0.0; N];
    for (o, v) in out.iter_mut().zip(x) {
        *o = *v;
    }
    out
}

/// A named check inside a [`SelfTestReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCheck {
    pub name: String,
    pub check: DerivativeCheck,
}

/// All checks of one [`StiffenedPanel::self_test`] run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfTestReport {
    pub checks: Vec<NamedCheck>,
}

impl SelfTestReport {
    fn record(&mut self, name: impl Into<String>, check: DerivativeCheck) {
        let name = name.into();
        debug!(
            "{name}: adjoint {:.10e}, fd {:.10e}, rel err {:.3e}",
            check.adjoint, check.finite_difference, check.relative_error
        );
        self.checks.push(NamedCheck { name, check });
    }

    /// Largest relative error; NaN if any check produced NaN
    pub fn max_relative_error(&self) -> f64 {
        self.checks
            .iter()
            .map(|c| c.check.relative_error)
            .fold(0.0, |acc, e| if e.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(e) })
    }

    pub fn worst(&self) -> Option<&NamedCheck> {
        self.checks.iter().max_by(|a, b| {
            a.check
                .relative_error
                .partial_cmp(&b.check.relative_error)
                .unwrap_or(std::cmp::Ordering::Greater)
        })
    }

    pub fn passed(&self, tolerance: f64) -> bool {
        self.checks.iter().all(|c| c.check.passed(tolerance))
    }
}

/// Check a fixed-size function at `x0` along a random scaled direction
fn check_fixed<const N: usize, R: Rng>(
    f: impl Fn(&[f64; N]) -> f64,
    gradient: &[f64; N],
    x0: &[f64; N],
    rng: &mut R,
    epsilon: f64,
) -> DerivativeCheck {
    let direction = random_direction(rng, x0);
    directional_check(|x| f(&to_fixed(x)), gradient, x0, &direction, epsilon)
}

fn check_surrogate<K: Kernel, R: Rng>(
    report: &mut SelfTestReport,
    name: &str,
    gp: &GaussianProcess<K>,
    features: &Features,
    rng: &mut R,
    epsilon: f64,
) {
    // unscaled: log-space features may sit at zero
    let direction: Vec<f64> = (0..features.len()).map(|_| rng.gen_range(-1.0..1.0)).collect();

    if let Some(xtrain) = gp.training.xtrain.first() {
        let mut gradient = [0.0; 4];
        gp.kernel.kernel_sens(1.0, features, xtrain, &mut gradient);
        let check = directional_check(
            |x| gp.kernel.kernel(&to_fixed(x), xtrain),
            &gradient,
            features,
            &direction,
            epsilon,
        );
        report.record(format!("{name} kernel"), check);
    }

    let (_, gradient) = gp.predict_mean_sens(1.0, features);
    let check = directional_check(
        |x| gp.predict_mean(&to_fixed(x)),
        &gradient,
        features,
        &direction,
        epsilon,
    );
    report.record(format!("{name} GP mean"), check);
}

impl StiffenedPanel {
    /// Run every derivative check at the current design and `strain`.
    ///
    /// Returns an error only when the panel itself cannot be evaluated;
    /// inaccurate derivatives show up as large relative errors in the report.
    pub fn self_test<R: Rng>(
        &self,
        strain: &[f64; 6],
        epsilon: f64,
        rng: &mut R,
    ) -> PanelResult<SelfTestReport> {
        self.validate()?;
        let mut report = SelfTestReport::default();
        let inputs = self.buckling_inputs()?;
        let panel = self.panel_stiffness();
        let stiffener = self.stiffener_stiffness();
        let section = self.stiffener_section();
        let e1p = self.panel_layup.effective_modulus();
        let e1s = self.stiffener_layup.effective_modulus();

        // nondimensional groups
        let x = [panel.d11(), panel.d22(), self.panel_length.value, self.panel_width.value];
        let (_, g) = affine_aspect_ratio_sens(1.0, x[0], x[1], x[2], x[3]);
        let check = check_fixed(|x| affine_aspect_ratio(x[0], x[1], x[2], x[3]), &g, &x, rng, epsilon);
        report.record("affine aspect ratio", check);

        let x = [panel.d11(), panel.d22(), panel.d12(), panel.d66()];
        let (_, g) = generalized_rigidity_sens(1.0, x[0], x[1], x[2], x[3]);
        let check = check_fixed(|x| generalized_rigidity(x[0], x[1], x[2], x[3]), &g, &x, rng, epsilon);
        report.record("generalized rigidity", check);

        let x = [stiffener.d12(), stiffener.d66()];
        let (_, g) = generalized_poissons_ratio_sens(1.0, x[0], x[1]);
        let check = check_fixed(|x| generalized_poissons_ratio(x[0], x[1]), &g, &x, rng, epsilon);
        report.record("generalized Poisson's ratio", check);

        let x = [
            e1s,
            section.area,
            e1p,
            self.stiffener_pitch.value,
            self.panel_thickness.value,
        ];
        let (_, g) = stiffener_area_ratio_sens(1.0, x[0], x[1], x[2], x[3], x[4]);
        let check = check_fixed(
            |x| stiffener_area_ratio(x[0], x[1], x[2], x[3], x[4]),
            &g,
            &x,
            rng,
            epsilon,
        );
        report.record("stiffener area ratio", check);

        let x = [e1s, section.inertia, panel.d11(), self.stiffener_thickness.value];
        let (_, g) = stiffener_stiffness_ratio_sens(1.0, x[0], x[1], x[2], x[3]);
        let check = check_fixed(
            |x| stiffener_stiffness_ratio(x[0], x[1], x[2], x[3]),
            &g,
            &x,
            rng,
            epsilon,
        );
        report.record("stiffener stiffness ratio", check);

        let x = [panel.a66(), panel.a11(), self.panel_width.value, self.panel_thickness.value];
        let (_, g) = transverse_shear_parameter_sens(1.0, x[0], x[1], x[2], x[3]);
        let check = check_fixed(
            |x| transverse_shear_parameter(x[0], x[1], x[2], x[3]),
            &g,
            &x,
            rng,
            epsilon,
        );
        report.record("transverse shear parameter", check);

        // critical loads
        let model = &self.buckling;
        let x = inputs.global.to_array();
        let (_, g) = model.critical_global_axial_load_sens(1.0, &inputs.global)?;
        let check = check_fixed(
            |x| {
                model
                    .critical_global_axial_load(&GlobalBucklingInputs::from_array(x))
                    .unwrap_or(f64::NAN)
            },
            &g.to_array(),
            &x,
            rng,
            epsilon,
        );
        report.record("global axial load", check);

        let (_, g) = model.critical_global_shear_load_sens(1.0, &inputs.global)?;
        let check = check_fixed(
            |x| {
                model
                    .critical_global_shear_load(&GlobalBucklingInputs::from_array(x))
                    .unwrap_or(f64::NAN)
            },
            &g.to_array(),
            &x,
            rng,
            epsilon,
        );
        report.record("global shear load", check);

        let x = inputs.local.to_array();
        let (_, g) = model.critical_local_axial_load_sens(1.0, &inputs.local)?;
        let check = check_fixed(
            |x| {
                model
                    .critical_local_axial_load(&LocalBucklingInputs::from_array(x))
                    .unwrap_or(f64::NAN)
            },
            &g.to_array(),
            &x,
            rng,
            epsilon,
        );
        report.record("local axial load", check);

        let (_, g) = model.critical_local_shear_load_sens(1.0, &inputs.local)?;
        let check = check_fixed(
            |x| {
                model
                    .critical_local_shear_load(&LocalBucklingInputs::from_array(x))
                    .unwrap_or(f64::NAN)
            },
            &g.to_array(),
            &x,
            rng,
            epsilon,
        );
        report.record("local shear load", check);

        let x = inputs.crippling.to_array();
        let (_, g) = model.stiffener_crippling_load_sens(1.0, &inputs.crippling)?;
        let check = check_fixed(
            |x| {
                model
                    .stiffener_crippling_load(&CripplingInputs::from_array(x))
                    .unwrap_or(f64::NAN)
            },
            &g.to_array(),
            &x,
            rng,
            epsilon,
        );
        report.record("crippling load", check);

        // surrogates, at the features this panel feeds them
        let global = &inputs.global;
        let global_features = [global.xi.ln(), global.rho0.ln(), global.gamma.ln_1p(), global.zeta.ln()];
        if let Some(gp) = &model.surrogates.axial {
            check_surrogate(&mut report, "axial", gp, &global_features, rng, epsilon);
        }
        if let Some(gp) = &model.surrogates.shear {
            check_surrogate(&mut report, "shear", gp, &global_features, rng, epsilon);
        }
        if let Some(gp) = &model.surrogates.crippling {
            let c = &inputs.crippling;
            let features = [c.xi.ln(), c.rho0.ln(), c.gen_poisson.ln(), c.zeta.ln()];
            check_surrogate(&mut report, "crippling", gp, &features, rng, epsilon);
        }

        // aggregate failure w.r.t. strain
        let (_, g) = self.eval_failure_strain_sens(strain)?;
        let check = check_fixed(
            |x| {
                self.compute_failure_values(x)
                    .map_or(f64::NAN, |v| v.aggregate)
            },
            &g,
            strain,
            rng,
            epsilon,
        );
        report.record("failure strain sensitivity", check);

        // aggregate failure w.r.t. the design variables
        let num_dvs = self.num_design_vars();
        if num_dvs > 0 {
            let mut gradient = vec![0.0; num_dvs];
            self.add_failure_dv_sens(strain, 1.0, &mut gradient)?;
            let x0 = self.design_vars();
            let direction = random_direction(rng, &x0);
            let check = directional_check(
                |x| {
                    let mut perturbed = self.clone();
                    perturbed
                        .set_design_vars(x)
                        .and_then(|_| perturbed.compute_failure_values(strain))
                        .map_or(f64::NAN, |v| v.aggregate)
                },
                &gradient,
                &x0,
                &direction,
                epsilon,
            );
            report.record("failure design sensitivity", check);
        }

        info!(
            "self test: {} checks, max relative error {:.3e}",
            report.checks.len(),
            report.max_relative_error()
        );
        Ok(report)
    }
}

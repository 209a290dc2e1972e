//! # Stiffener Crippling Load
//!
//! The stiffener web is treated as a long plate with one free edge, loaded
//! along its length. The length scale is the stiffener height `h`.
//!
//! ```text
//! closed form: N11crit = pi^2 sqrt(D11 D22) / h^2 * (0.476 - 0.56 (nu - 0.2)) * xi
//! surrogate:   N11crit = pi^2 sqrt(D11 D22) / h^2 * exp(GP([ln xi, ln rho0, ln nu_gen, ln zeta]))
//! ```
//!
//! with `nu = 1 / nu_gen = D12 / (D12 + 2 D66)`. For an isotropic web
//! (`xi = 1`, `nu = 0.3`) the closed form gives the classical 0.42 plate
//! buckling coefficient of a simply supported/free flange.

use std::f64::consts::PI;

use log::debug;

use super::{BucklingModel, CripplingInputs};
use crate::errors::{ensure_finite, PanelResult};

fn closed_form_factor(xi: f64, gen_poisson: f64) -> f64 {
    (0.476 - 0.56 * (1.0 / gen_poisson - 0.2)) * xi
}

impl BucklingModel {
    /// Critical crippling load of the stiffener web.
    pub fn stiffener_crippling_load(&self, inputs: &CripplingInputs) -> PanelResult<f64> {
        inputs.validate()?;
        let CripplingInputs {
            d11,
            d22,
            height,
            xi,
            rho0,
            gen_poisson,
            zeta,
        } = *inputs;
        let dim = PI * PI * (d11 * d22).sqrt() / (height * height);
        let load = match &self.surrogates.crippling {
            Some(gp) => {
                debug!("crippling load from GP surrogate");
                let features = [xi.ln(), rho0.ln(), gen_poisson.ln(), zeta.ln()];
                dim * gp.predict_mean(&features).exp()
            }
            None => dim * closed_form_factor(xi, gen_poisson),
        };
        ensure_finite("stiffener crippling load", load)
    }

    /// Crippling load and the partials of `seed * N11crit`.
    pub fn stiffener_crippling_load_sens(
        &self,
        seed: f64,
        inputs: &CripplingInputs,
    ) -> PanelResult<(f64, CripplingInputs)> {
        inputs.validate()?;
        let CripplingInputs {
            d11,
            d22,
            height,
            xi,
            rho0,
            gen_poisson,
            zeta,
        } = *inputs;
        let dim = PI * PI * (d11 * d22).sqrt() / (height * height);

        let (load, mut sens) = match &self.surrogates.crippling {
            Some(gp) => {
                let features = [xi.ln(), rho0.ln(), gen_poisson.ln(), zeta.ln()];
                let load = dim * gp.predict_mean(&features).exp();
                let (_, xsens) = gp.predict_mean_sens(seed * load, &features);
                let sens = CripplingInputs {
                    xi: xsens[0] / xi,
                    rho0: xsens[1] / rho0,
                    gen_poisson: xsens[2] / gen_poisson,
                    zeta: xsens[3] / zeta,
                    ..CripplingInputs::default()
                };
                (load, sens)
            }
            None => {
                let factor = closed_form_factor(xi, gen_poisson);
                let load = dim * factor;
                let sens = CripplingInputs {
                    xi: seed * load / xi,
                    gen_poisson: seed * dim * 0.56 * xi / (gen_poisson * gen_poisson),
                    ..CripplingInputs::default()
                };
                (load, sens)
            }
        };

        let ydim = seed * load;
        sens.d11 += 0.5 * ydim / d11;
        sens.d22 += 0.5 * ydim / d22;
        sens.height += -2.0 * ydim / height;

        Ok((ensure_finite("stiffener crippling load", load)?, sens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buckling::test_support::{assert_directional, crippling_inputs, scaled_direction, surrogates};

    #[test]
    fn test_isotropic_flange_coefficient() {
        let nu: f64 = 0.3;
        let d = 2.0;
        let d12 = nu * d;
        let d66 = (1.0 - nu) * d / 2.0;
        let inputs = CripplingInputs {
            d11: d,
            d22: d,
            height: 1.0,
            xi: 1.0,
            rho0: 10.0,
            gen_poisson: (d12 + 2.0 * d66) / d12,
            zeta: 1.0,
        };
        let load = BucklingModel::closed_form().stiffener_crippling_load(&inputs).unwrap();
        let coefficient = load / (PI * PI * d);
        assert!((coefficient - 0.42).abs() < 1e-12);
    }

    #[test]
    fn test_closed_form_positive_for_valid_laminates() {
        let model = BucklingModel::closed_form();
        for &gen_poisson in &[1.01, 2.0, 5.0, 50.0] {
            let inputs = CripplingInputs {
                gen_poisson,
                ..crippling_inputs()
            };
            assert!(model.stiffener_crippling_load(&inputs).unwrap() > 0.0);
        }
    }

    #[test]
    fn test_crippling_sens_both_paths() {
        for model in [
            BucklingModel::closed_form(),
            BucklingModel::with_surrogates(surrogates()),
        ] {
            let x0 = crippling_inputs().to_array();
            let (load, sens) = model
                .stiffener_crippling_load_sens(1.0, &crippling_inputs())
                .unwrap();
            assert_eq!(load, model.stiffener_crippling_load(&crippling_inputs()).unwrap());
            assert_directional(
                |x| model.stiffener_crippling_load(&CripplingInputs::from_array(x)).unwrap(),
                &sens.to_array(),
                &x0,
                &scaled_direction(&x0),
            );
        }
    }

    #[test]
    fn test_closed_form_ignores_aspect_ratio() {
        let model = BucklingModel::closed_form();
        let (_, sens) = model
            .stiffener_crippling_load_sens(1.0, &crippling_inputs())
            .unwrap();
        assert_eq!(sens.rho0, 0.0);
        assert_eq!(sens.zeta, 0.0);
    }
}

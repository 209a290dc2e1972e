//! # Failure Evaluation and Adjoint
//!
//! Forward evaluation of the five failure ratios for a shell strain state
//! and the reverse pass that differentiates the KS aggregate w.r.t. the
//! strain and the geometric design variables.
//!
//! The reverse pass replays the forward pass and pulls seeds back through
//! each stage in turn:
//!
//! ```text
//! KS weights -> envelope partials -> load / critical-load seeds
//!            -> critical-load partials -> nondimensional seeds
//!            -> stiffness entries + geometry -> thicknesses -> DV slots
//! ```
//!
//! The laminate moduli `E1p`, `E1s` depend on the ply fractions only and
//! carry no geometric sensitivity.

use log::debug;
use logging_timer::time;
use serde::{Deserialize, Serialize};

use super::design_vars::GeometrySens;
use super::geometry::{blade_area_sens, blade_centroid_sens, blade_inertia_sens, BladeSection};
use super::StiffenedPanel;
use crate::buckling::{
    buckling_envelope, buckling_envelope_sens, CripplingInputs, GlobalBucklingInputs,
    LocalBucklingInputs,
};
use crate::errors::{ensure_finite, PanelResult};
use crate::materials::{PlateStiffness, PlateStiffnessSens};
use crate::math::{ks_aggregation, ks_aggregation_sens};
use crate::nondim::{
    affine_aspect_ratio, affine_aspect_ratio_sens, generalized_poissons_ratio,
    generalized_poissons_ratio_sens, generalized_rigidity, generalized_rigidity_sens,
    stiffener_area_ratio, stiffener_area_ratio_sens, stiffener_stiffness_ratio,
    stiffener_stiffness_ratio_sens, transverse_shear_parameter, transverse_shear_parameter_sens,
    NondimensionalParameters,
};

pub const NUM_FAILURES: usize = 5;

/// Failure modes in the order of [`FailureValues::fails`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureMode {
    PanelMaterial,
    StiffenerMaterial,
    GlobalBuckling,
    LocalBuckling,
    StiffenerCrippling,
}

impl FailureMode {
    pub const ALL: [FailureMode; NUM_FAILURES] = [
        FailureMode::PanelMaterial,
        FailureMode::StiffenerMaterial,
        FailureMode::GlobalBuckling,
        FailureMode::LocalBuckling,
        FailureMode::StiffenerCrippling,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            FailureMode::PanelMaterial => "panel material",
            FailureMode::StiffenerMaterial => "stiffener material",
            FailureMode::GlobalBuckling => "global buckling",
            FailureMode::LocalBuckling => "local buckling",
            FailureMode::StiffenerCrippling => "stiffener crippling",
        }
    }
}

/// The five failure ratios and their KS aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureValues {
    pub aggregate: f64,
    pub fails: [f64; NUM_FAILURES],
}

impl FailureValues {
    pub fn get(&self, mode: FailureMode) -> f64 {
        self.fails[mode.index()]
    }

    /// Mode with the largest failure ratio
    pub fn governing_mode(&self) -> FailureMode {
        let mut governing = FailureMode::PanelMaterial;
        for mode in FailureMode::ALL {
            if self.get(mode) > self.get(governing) {
                governing = mode;
            }
        }
        governing
    }
}

/// Buckling inputs of the three length scales at the current design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelBucklingInputs {
    pub global: GlobalBucklingInputs,
    pub local: LocalBucklingInputs,
    pub crippling: CripplingInputs,
}

/// Strain-independent quantities of one evaluation
struct PanelState {
    panel: PlateStiffness,
    stiffener: PlateStiffness,
    panel_modulus: f64,
    stiffener_modulus: f64,
    section: BladeSection,
    offset: f64,
    inputs: PanelBucklingInputs,
    global_axial: f64,
    global_shear: f64,
    local_axial: f64,
    local_shear: f64,
    crippling: f64,
}

/// Strain-dependent quantities of one evaluation
struct StrainResponse {
    /// Skin strains at `z = +tp/2` and `z = -tp/2`
    surfaces: [[f64; 3]; 2],
    stiffener_strain: f64,
    /// Axial panel load, compression positive
    n1: f64,
    n12: f64,
    /// Axial stiffener load, compression positive
    stiffener_load: f64,
    fails: [f64; NUM_FAILURES],
}

fn validate_strain(strain: &[f64; 6]) -> PanelResult<()> {
    for value in strain {
        ensure_finite("strain component", *value)?;
    }
    Ok(())
}

/// Pull a seed on `xi` back to the D entries of one plate
fn add_rigidity_sens(seed: f64, stiffness: &PlateStiffness, sens: &mut PlateStiffnessSens) {
    let (_, partials) = generalized_rigidity_sens(
        seed,
        stiffness.d11(),
        stiffness.d22(),
        stiffness.d12(),
        stiffness.d66(),
    );
    sens.d[0] += partials[0];
    sens.d[3] += partials[1];
    sens.d[1] += partials[2];
    sens.d[5] += partials[3];
}

impl StiffenedPanel {
    /// Global, local and crippling buckling inputs at the current design.
    pub fn buckling_inputs(&self) -> PanelResult<PanelBucklingInputs> {
        self.validate()?;
        let panel = self.panel_stiffness();
        let stiffener = self.stiffener_stiffness();
        let section = self.stiffener_section();
        Ok(self.assemble_inputs(
            &panel,
            &stiffener,
            self.panel_layup.effective_modulus(),
            self.stiffener_layup.effective_modulus(),
            &section,
        ))
    }

    /// Nondimensional groups of the global (panel-width) scale
    pub fn nondimensional_parameters(&self) -> PanelResult<NondimensionalParameters> {
        let inputs = self.buckling_inputs()?;
        let panel = self.panel_stiffness();
        let parameters = NondimensionalParameters {
            xi: inputs.global.xi,
            rho0: inputs.global.rho0,
            delta: inputs.global.delta,
            gamma: inputs.global.gamma,
            zeta: inputs.global.zeta,
            gen_poisson: generalized_poissons_ratio(panel.d12(), panel.d66()),
        };
        parameters.validate()?;
        Ok(parameters)
    }

    fn assemble_inputs(
        &self,
        panel: &PlateStiffness,
        stiffener: &PlateStiffness,
        panel_modulus: f64,
        stiffener_modulus: f64,
        section: &BladeSection,
    ) -> PanelBucklingInputs {
        let a = self.panel_length.value;
        let b = self.panel_width.value;
        let sp = self.stiffener_pitch.value;
        let tp = self.panel_thickness.value;
        let h = self.stiffener_height.value;
        let ts = self.stiffener_thickness.value;

        let xi = generalized_rigidity(panel.d11(), panel.d22(), panel.d12(), panel.d66());
        let global = GlobalBucklingInputs {
            d11: panel.d11(),
            d22: panel.d22(),
            b,
            delta: stiffener_area_ratio(stiffener_modulus, section.area, panel_modulus, sp, tp),
            rho0: affine_aspect_ratio(panel.d11(), panel.d22(), a, b),
            xi,
            gamma: stiffener_stiffness_ratio(stiffener_modulus, section.inertia, panel.d11(), ts),
            zeta: transverse_shear_parameter(panel.a66(), panel.a11(), b, tp),
        };
        let local = LocalBucklingInputs {
            d11: panel.d11(),
            d22: panel.d22(),
            pitch: sp,
            rho0: affine_aspect_ratio(panel.d11(), panel.d22(), a, sp),
            xi,
            zeta: transverse_shear_parameter(panel.a66(), panel.a11(), sp, tp),
        };
        let crippling = CripplingInputs {
            d11: stiffener.d11(),
            d22: stiffener.d22(),
            height: h,
            xi: generalized_rigidity(stiffener.d11(), stiffener.d22(), stiffener.d12(), stiffener.d66()),
            rho0: affine_aspect_ratio(stiffener.d11(), stiffener.d22(), a, h),
            gen_poisson: generalized_poissons_ratio(stiffener.d12(), stiffener.d66()),
            zeta: transverse_shear_parameter(stiffener.a66(), stiffener.a11(), h, ts),
        };
        PanelBucklingInputs {
            global,
            local,
            crippling,
        }
    }

    fn analyze(&self) -> PanelResult<PanelState> {
        self.validate()?;
        let panel = self.panel_stiffness();
        let stiffener = self.stiffener_stiffness();
        let panel_modulus = self.panel_layup.effective_modulus();
        let stiffener_modulus = self.stiffener_layup.effective_modulus();
        let section = self.stiffener_section();
        let inputs = self.assemble_inputs(&panel, &stiffener, panel_modulus, stiffener_modulus, &section);

        let model = &self.buckling;
        let state = PanelState {
            global_axial: model.critical_global_axial_load(&inputs.global)?,
            global_shear: model.critical_global_shear_load(&inputs.global)?,
            local_axial: model.critical_local_axial_load(&inputs.local)?,
            local_shear: model.critical_local_shear_load(&inputs.local)?,
            crippling: model.stiffener_crippling_load(&inputs.crippling)?,
            panel,
            stiffener,
            panel_modulus,
            stiffener_modulus,
            offset: self.stiffener_offset(),
            section,
            inputs,
        };
        debug!(
            "critical loads: global ({:.4e}, {:.4e}), local ({:.4e}, {:.4e}), crippling {:.4e}",
            state.global_axial, state.global_shear, state.local_axial, state.local_shear, state.crippling
        );
        Ok(state)
    }

    fn respond(&self, state: &PanelState, strain: &[f64; 6]) -> StrainResponse {
        let [e11, e22, g12, k11, k22, k12] = *strain;
        let half = 0.5 * self.panel_thickness.value;
        let surfaces = [
            [e11 + half * k11, e22 + half * k22, g12 + half * k12],
            [e11 - half * k11, e22 - half * k22, g12 - half * k12],
        ];
        let stiffener_strain = e11 + state.offset * k11;
        let loads = state.panel.in_plane_loads(&[e11, e22, g12]);
        let n1 = -loads[0];
        let n12 = loads[2];
        let stiffener_load = -state.stiffener.a11() * stiffener_strain;
        let ks_weight = self.buckling.ks_weight;

        let fails = [
            self.panel_layup.material_failure(&surfaces, ks_weight),
            self.stiffener_layup
                .material_failure(&[[stiffener_strain, 0.0, 0.0]], ks_weight),
            buckling_envelope(n1, state.global_axial, n12, state.global_shear),
            buckling_envelope(n1, state.local_axial, n12, state.local_shear),
            stiffener_load / state.crippling,
        ];
        StrainResponse {
            surfaces,
            stiffener_strain,
            n1,
            n12,
            stiffener_load,
            fails,
        }
    }

    /// The five failure ratios and their KS aggregate for a strain state.
    #[time]
    pub fn compute_failure_values(&self, strain: &[f64; 6]) -> PanelResult<FailureValues> {
        validate_strain(strain)?;
        let state = self.analyze()?;
        let response = self.respond(&state, strain);
        let aggregate = ks_aggregation(&response.fails, self.buckling.ks_weight);
        Ok(FailureValues {
            aggregate: ensure_finite("aggregate failure", aggregate)?,
            fails: response.fails,
        })
    }

    /// Aggregate failure and its gradient w.r.t. the six strain components.
    #[time]
    pub fn eval_failure_strain_sens(&self, strain: &[f64; 6]) -> PanelResult<(f64, [f64; 6])> {
        validate_strain(strain)?;
        let state = self.analyze()?;
        let response = self.respond(&state, strain);
        let ks_weight = self.buckling.ks_weight;
        let mut weights = [0.0; NUM_FAILURES];
        let aggregate = ks_aggregation_sens(&response.fails, ks_weight, &mut weights);

        let mut sens = [0.0; 6];
        let half = 0.5 * self.panel_thickness.value;

        let (_, surface_grads) = self.panel_layup.material_failure_sens(&response.surfaces, ks_weight);
        for c in 0..3 {
            sens[c] += weights[0] * (surface_grads[0][c] + surface_grads[1][c]);
            sens[3 + c] += weights[0] * half * (surface_grads[0][c] - surface_grads[1][c]);
        }

        let stiffener_seed = self.stiffener_strain_seed(&state, &response, &weights);
        sens[0] += stiffener_seed;
        sens[3] += stiffener_seed * state.offset;

        let (n1_seed, n12_seed) = self.panel_load_seeds(&state, &response, &weights);
        let a = &state.panel.a;
        let n1_row = [a[0], a[1], a[2]];
        let n12_row = [a[2], a[4], a[5]];
        for c in 0..3 {
            sens[c] += -n1_seed * n1_row[c] + n12_seed * n12_row[c];
        }

        Ok((ensure_finite("aggregate failure", aggregate)?, sens))
    }

    /// Add `scale * d(aggregate)/dx` into `dfdx`, indexed by local DV number.
    #[time]
    pub fn add_failure_dv_sens(&self, strain: &[f64; 6], scale: f64, dfdx: &mut [f64]) -> PanelResult<()> {
        validate_strain(strain)?;
        let state = self.analyze()?;
        let response = self.respond(&state, strain);
        let ks_weight = self.buckling.ks_weight;
        let mut weights = [0.0; NUM_FAILURES];
        let aggregate = ks_aggregation_sens(&response.fails, ks_weight, &mut weights);
        ensure_finite("aggregate failure", aggregate)?;

        let tp = self.panel_thickness.value;
        let ts = self.stiffener_thickness.value;
        let ff = self.flange_fraction;
        let curvature = [strain[3], strain[4], strain[5]];

        let mut geometry = GeometrySens::default();
        let mut panel_sens = PlateStiffnessSens::default();
        let mut stiffener_sens = PlateStiffnessSens::default();

        // skin surfaces sit at +-tp/2
        let (_, surface_grads) = self.panel_layup.material_failure_sens(&response.surfaces, ks_weight);
        for c in 0..3 {
            geometry.panel_thickness +=
                weights[0] * 0.5 * curvature[c] * (surface_grads[0][c] - surface_grads[1][c]);
        }

        // stiffener strain through the centroid offset
        let strain_seed = self.stiffener_strain_seed(&state, &response, &weights) * curvature[0];
        let centroid = blade_centroid_sens(ff);
        geometry.panel_thickness -= 0.5 * strain_seed;
        geometry.stiffener_height -= centroid[0] * strain_seed;
        geometry.stiffener_thickness -= centroid[1] * strain_seed;

        // crippling ratio
        let crippling_weight = weights[FailureMode::StiffenerCrippling.index()];
        stiffener_sens.a[0] -= crippling_weight * response.stiffener_strain / state.crippling;
        let crippling_seed =
            -crippling_weight * response.stiffener_load / (state.crippling * state.crippling);
        let (_, partials) = self
            .buckling
            .stiffener_crippling_load_sens(crippling_seed, &state.inputs.crippling)?;
        self.add_crippling_partials(&state, &partials, &mut geometry, &mut stiffener_sens);

        // panel loads N = A eps
        let (n1_seed, n12_seed) = self.panel_load_seeds(&state, &response, &weights);
        let membrane = [strain[0], strain[1], strain[2]];
        for (c, entry) in [0, 1, 2].into_iter().enumerate() {
            panel_sens.a[entry] -= n1_seed * membrane[c];
        }
        for (c, entry) in [2, 4, 5].into_iter().enumerate() {
            panel_sens.a[entry] += n12_seed * membrane[c];
        }

        // critical loads
        let model = &self.buckling;
        let global_weight = weights[FailureMode::GlobalBuckling.index()];
        let (_, global_env) =
            buckling_envelope_sens(response.n1, state.global_axial, response.n12, state.global_shear);
        let (_, partials) = model.critical_global_axial_load_sens(global_weight * global_env[1], &state.inputs.global)?;
        self.add_global_partials(&state, &partials, &mut geometry, &mut panel_sens);
        let (_, partials) = model.critical_global_shear_load_sens(global_weight * global_env[3], &state.inputs.global)?;
        self.add_global_partials(&state, &partials, &mut geometry, &mut panel_sens);

        let local_weight = weights[FailureMode::LocalBuckling.index()];
        let (_, local_env) =
            buckling_envelope_sens(response.n1, state.local_axial, response.n12, state.local_shear);
        let (_, partials) = model.critical_local_axial_load_sens(local_weight * local_env[1], &state.inputs.local)?;
        self.add_local_partials(&state, &partials, &mut geometry, &mut panel_sens);
        let (_, partials) = model.critical_local_shear_load_sens(local_weight * local_env[3], &state.inputs.local)?;
        self.add_local_partials(&state, &partials, &mut geometry, &mut panel_sens);

        // stiffness entries back to the laminate thicknesses
        geometry.panel_thickness += self.panel_layup.plate_stiffness_thickness_sens(tp, &panel_sens);
        geometry.stiffener_thickness += self
            .stiffener_layup
            .plate_stiffness_thickness_sens(ts, &stiffener_sens);

        debug!("geometric failure sensitivity: {:?}", geometry.to_array());
        self.scatter_geometry_sens(scale, &geometry, dfdx)
    }

    /// Seed on the stiffener axial strain from both stiffener modes
    fn stiffener_strain_seed(&self, state: &PanelState, response: &StrainResponse, weights: &[f64; NUM_FAILURES]) -> f64 {
        let (_, grads) = self
            .stiffener_layup
            .material_failure_sens(&[[response.stiffener_strain, 0.0, 0.0]], self.buckling.ks_weight);
        let material = grads.first().map_or(0.0, |g| g[0]);
        weights[1] * material - weights[4] * state.stiffener.a11() / state.crippling
    }

    /// Seeds on the panel loads `(N1, N12)` from both envelopes
    fn panel_load_seeds(&self, state: &PanelState, response: &StrainResponse, weights: &[f64; NUM_FAILURES]) -> (f64, f64) {
        let (_, global) =
            buckling_envelope_sens(response.n1, state.global_axial, response.n12, state.global_shear);
        let (_, local) =
            buckling_envelope_sens(response.n1, state.local_axial, response.n12, state.local_shear);
        (
            weights[2] * global[0] + weights[3] * local[0],
            weights[2] * global[2] + weights[3] * local[2],
        )
    }

    fn add_global_partials(
        &self,
        state: &PanelState,
        partials: &GlobalBucklingInputs,
        geometry: &mut GeometrySens,
        panel_sens: &mut PlateStiffnessSens,
    ) {
        let panel = &state.panel;
        let a = self.panel_length.value;
        let b = self.panel_width.value;
        let sp = self.stiffener_pitch.value;
        let tp = self.panel_thickness.value;
        let h = self.stiffener_height.value;
        let ts = self.stiffener_thickness.value;
        let ff = self.flange_fraction;

        panel_sens.d[0] += partials.d11;
        panel_sens.d[3] += partials.d22;
        geometry.panel_width += partials.b;

        let (_, delta) = stiffener_area_ratio_sens(
            partials.delta,
            state.stiffener_modulus,
            state.section.area,
            state.panel_modulus,
            sp,
            tp,
        );
        let area = blade_area_sens(h, ts, ff);
        geometry.stiffener_height += delta[1] * area[0];
        geometry.stiffener_thickness += delta[1] * area[1];
        geometry.stiffener_pitch += delta[3];
        geometry.panel_thickness += delta[4];

        let (_, rho0) = affine_aspect_ratio_sens(partials.rho0, panel.d11(), panel.d22(), a, b);
        panel_sens.d[0] += rho0[0];
        panel_sens.d[3] += rho0[1];
        geometry.panel_length += rho0[2];
        geometry.panel_width += rho0[3];

        add_rigidity_sens(partials.xi, panel, panel_sens);

        let (_, gamma) = stiffener_stiffness_ratio_sens(
            partials.gamma,
            state.stiffener_modulus,
            state.section.inertia,
            panel.d11(),
            ts,
        );
        let inertia = blade_inertia_sens(h, ts, ff);
        geometry.stiffener_height += gamma[1] * inertia[0];
        geometry.stiffener_thickness += gamma[1] * inertia[1];
        panel_sens.d[0] += gamma[2];
        geometry.stiffener_thickness += gamma[3];

        let (_, zeta) = transverse_shear_parameter_sens(partials.zeta, panel.a66(), panel.a11(), b, tp);
        panel_sens.a[5] += zeta[0];
        panel_sens.a[0] += zeta[1];
        geometry.panel_width += zeta[2];
        geometry.panel_thickness += zeta[3];
    }

    fn add_local_partials(
        &self,
        state: &PanelState,
        partials: &LocalBucklingInputs,
        geometry: &mut GeometrySens,
        panel_sens: &mut PlateStiffnessSens,
    ) {
        let panel = &state.panel;
        let a = self.panel_length.value;
        let sp = self.stiffener_pitch.value;
        let tp = self.panel_thickness.value;

        panel_sens.d[0] += partials.d11;
        panel_sens.d[3] += partials.d22;
        geometry.stiffener_pitch += partials.pitch;

        let (_, rho0) = affine_aspect_ratio_sens(partials.rho0, panel.d11(), panel.d22(), a, sp);
        panel_sens.d[0] += rho0[0];
        panel_sens.d[3] += rho0[1];
        geometry.panel_length += rho0[2];
        geometry.stiffener_pitch += rho0[3];

        add_rigidity_sens(partials.xi, panel, panel_sens);

        let (_, zeta) = transverse_shear_parameter_sens(partials.zeta, panel.a66(), panel.a11(), sp, tp);
        panel_sens.a[5] += zeta[0];
        panel_sens.a[0] += zeta[1];
        geometry.stiffener_pitch += zeta[2];
        geometry.panel_thickness += zeta[3];
    }

    fn add_crippling_partials(
        &self,
        state: &PanelState,
        partials: &CripplingInputs,
        geometry: &mut GeometrySens,
        stiffener_sens: &mut PlateStiffnessSens,
    ) {
        let stiffener = &state.stiffener;
        let a = self.panel_length.value;
        let h = self.stiffener_height.value;
        let ts = self.stiffener_thickness.value;

        stiffener_sens.d[0] += partials.d11;
        stiffener_sens.d[3] += partials.d22;
        geometry.stiffener_height += partials.height;

        add_rigidity_sens(partials.xi, stiffener, stiffener_sens);

        let (_, rho0) = affine_aspect_ratio_sens(partials.rho0, stiffener.d11(), stiffener.d22(), a, h);
        stiffener_sens.d[0] += rho0[0];
        stiffener_sens.d[3] += rho0[1];
        geometry.panel_length += rho0[2];
        geometry.stiffener_height += rho0[3];

        let (_, poisson) = generalized_poissons_ratio_sens(partials.gen_poisson, stiffener.d12(), stiffener.d66());
        stiffener_sens.d[1] += poisson[0];
        stiffener_sens.d[5] += poisson[1];

        let (_, zeta) = transverse_shear_parameter_sens(partials.zeta, stiffener.a66(), stiffener.a11(), h, ts);
        stiffener_sens.a[5] += zeta[0];
        stiffener_sens.a[0] += zeta[1];
        geometry.stiffener_height += zeta[2];
        geometry.stiffener_thickness += zeta[3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PanelError;
    use crate::panel::test_support::{all_active_panel, gp_panel, sample_panel, sample_strain};

    fn strain_fd(panel: &StiffenedPanel, strain: &[f64; 6], direction: &[f64; 6]) -> f64 {
        let h = 1e-6;
        let mut plus = *strain;
        let mut minus = *strain;
        for i in 0..6 {
            plus[i] += h * direction[i];
            minus[i] -= h * direction[i];
        }
        let fp = panel.compute_failure_values(&plus).unwrap().aggregate;
        let fm = panel.compute_failure_values(&minus).unwrap().aggregate;
        (fp - fm) / (2.0 * h)
    }

    #[test]
    fn test_failure_values_sample_panel() {
        let panel = sample_panel();
        let values = panel.compute_failure_values(&sample_strain()).unwrap();
        for fail in values.fails {
            assert!(fail.is_finite());
            assert!(fail > 0.0);
        }
        let max = values.fails.iter().cloned().fold(f64::MIN, f64::max);
        assert!(values.aggregate >= max);
        assert!(values.aggregate <= max + (NUM_FAILURES as f64).ln() / panel.buckling.ks_weight);
        assert_eq!(values.governing_mode(), FailureMode::StiffenerCrippling);
    }

    #[test]
    fn test_unloaded_panel() {
        let panel = sample_panel();
        let values = panel.compute_failure_values(&[0.0; 6]).unwrap();
        // 2 surfaces x 4 plies x 6 ratios, all zero
        assert!((values.get(FailureMode::PanelMaterial) - 48f64.ln() / 100.0).abs() < 1e-12);
        assert!((values.get(FailureMode::StiffenerMaterial) - 24f64.ln() / 100.0).abs() < 1e-12);
        assert_eq!(values.get(FailureMode::GlobalBuckling), 0.0);
        assert_eq!(values.get(FailureMode::LocalBuckling), 0.0);
        assert!(values.get(FailureMode::StiffenerCrippling).abs() < 1e-15);
    }

    #[test]
    fn test_deterministic() {
        let panel = gp_panel();
        let first = panel.compute_failure_values(&sample_strain()).unwrap();
        let second = panel.compute_failure_values(&sample_strain()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strain_sens_matches_aggregate() {
        let panel = sample_panel();
        let strain = sample_strain();
        let (aggregate, _) = panel.eval_failure_strain_sens(&strain).unwrap();
        let values = panel.compute_failure_values(&strain).unwrap();
        assert_eq!(aggregate, values.aggregate);
    }

    #[test]
    fn test_strain_sens_directional() {
        let direction = [0.3e-3, -0.2e-3, 0.5e-3, 1.0e-3, 0.4e-3, -0.6e-3];
        for panel in [sample_panel(), gp_panel()] {
            let strain = sample_strain();
            let (_, sens) = panel.eval_failure_strain_sens(&strain).unwrap();
            let adjoint: f64 = sens.iter().zip(&direction).map(|(s, d)| s * d).sum();
            let fd = strain_fd(&panel, &strain, &direction);
            assert!(
                (adjoint - fd).abs() < 1e-5 * fd.abs().max(1e-8),
                "adjoint {adjoint} vs fd {fd}"
            );
        }
    }

    #[test]
    fn test_dv_sens_per_variable() {
        let panel = all_active_panel();
        let strain = sample_strain();
        let mut dfdx = vec![0.0; panel.num_design_vars()];
        panel.add_failure_dv_sens(&strain, 1.0, &mut dfdx).unwrap();

        let x0 = panel.design_vars();
        for i in 0..x0.len() {
            let step = 1e-6 * x0[i];
            let mut plus = panel.clone();
            let mut xp = x0.clone();
            xp[i] += step;
            plus.set_design_vars(&xp).unwrap();
            let mut minus = panel.clone();
            let mut xm = x0.clone();
            xm[i] -= step;
            minus.set_design_vars(&xm).unwrap();
            let fd = (plus.compute_failure_values(&strain).unwrap().aggregate
                - minus.compute_failure_values(&strain).unwrap().aggregate)
                / (2.0 * step);
            // scale by the variable so tiny partials of large variables compare fairly
            let scale = x0[i];
            assert!(
                (dfdx[i] - fd).abs() * scale < 1e-5,
                "variable {i}: adjoint {} vs fd {fd}",
                dfdx[i]
            );
        }
    }

    #[test]
    fn test_dv_sens_accumulates() {
        let panel = sample_panel();
        let strain = sample_strain();
        let mut once = vec![0.0; 4];
        panel.add_failure_dv_sens(&strain, 1.0, &mut once).unwrap();

        let mut dfdx = vec![1.0, 2.0, 3.0, 4.0];
        panel.add_failure_dv_sens(&strain, 2.5, &mut dfdx).unwrap();
        for i in 0..4 {
            let expected = (i + 1) as f64 + 2.5 * once[i];
            assert!((dfdx[i] - expected).abs() < 1e-9 * expected.abs().max(1.0));
        }
    }

    #[test]
    fn test_dv_sens_short_buffer() {
        let panel = sample_panel();
        let mut dfdx = vec![0.0; 2];
        assert!(matches!(
            panel.add_failure_dv_sens(&sample_strain(), 1.0, &mut dfdx),
            Err(PanelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_non_finite_strain_rejected() {
        let panel = sample_panel();
        let mut strain = sample_strain();
        strain[2] = f64::NAN;
        assert!(matches!(
            panel.compute_failure_values(&strain),
            Err(PanelError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_nondimensional_parameters() {
        let panel = sample_panel();
        let parameters = panel.nondimensional_parameters().unwrap();
        assert!((parameters.delta - 0.32).abs() < 1e-12);
        assert!(parameters.xi > 0.7 && parameters.xi < 0.8);
        let inputs = panel.buckling_inputs().unwrap();
        assert_eq!(inputs.local.xi, inputs.global.xi);
        assert_eq!(inputs.local.pitch, 0.15);
    }

    #[test]
    fn test_buckling_inputs_reject_invalid_panel() {
        let mut panel = sample_panel();
        panel.stiffener_pitch.value = 1.2;
        assert!(panel.buckling_inputs().is_err());
        assert!(panel.nondimensional_parameters().is_err());

        let mut panel = sample_panel();
        panel.panel_thickness.value = 0.0;
        assert!(panel.buckling_inputs().is_err());
    }
}

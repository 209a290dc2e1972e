//! Linear ply-stacking sums and plate stiffness blocks.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::max_strain::{rotate_strain, rotate_strain_sens, PlyStrainAllowables};
use crate::errors::{ensure_positive, PanelError, PanelResult};
use crate::math::{ks_aggregation, ks_aggregation_sens};

/// Entries of a packed symmetric 3x3 block
pub const STIFFNESS_ENTRIES: usize = 6;

/// Tolerance on the sum of the ply fractions
const FRACTION_TOLERANCE: f64 = 1e-6;

/// One ply family of a smeared layup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayupPly {
    /// Rotated reduced stiffness `[Q11, Q12, Q16, Q22, Q26, Q66]`
    pub q: [f64; STIFFNESS_ENTRIES],
    /// Volume fraction of the laminate
    pub fraction: f64,
    /// Orientation w.r.t. the panel x axis (degrees)
    pub angle_deg: f64,
}

/// Smeared laminate: ply families plus ply strain allowables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layup {
    pub plies: Vec<LayupPly>,
    pub allowables: PlyStrainAllowables,
}

impl Layup {
    pub fn validate(&self) -> PanelResult<()> {
        if self.plies.is_empty() {
            return Err(PanelError::invalid_input(
                "plies",
                "[]",
                "Layup must contain at least one ply",
            ));
        }
        for ply in &self.plies {
            ensure_positive("ply fraction", ply.fraction)?;
            if ply.q.iter().any(|q| !q.is_finite()) || !ply.angle_deg.is_finite() {
                return Err(PanelError::invalid_input(
                    "ply",
                    format!("{:?}", ply.q),
                    "Ply stiffness and angle must be finite",
                ));
            }
        }
        let total: f64 = self.plies.iter().map(|p| p.fraction).sum();
        if (total - 1.0).abs() > FRACTION_TOLERANCE {
            return Err(PanelError::invalid_input(
                "ply fractions",
                total.to_string(),
                "Ply fractions must sum to 1",
            ));
        }
        let q = self.smeared_stiffness();
        ensure_positive("Q11", q[0])?;
        ensure_positive("Q22", q[3])?;
        ensure_positive("Q66", q[5])?;
        self.allowables.validate()
    }

    /// Fraction-weighted ply stiffness `sum_i f_i Q_i`
    pub fn smeared_stiffness(&self) -> [f64; STIFFNESS_ENTRIES] {
        let mut q = [0.0; STIFFNESS_ENTRIES];
        for ply in &self.plies {
            for (qi, pi) in q.iter_mut().zip(&ply.q) {
                *qi += ply.fraction * pi;
            }
        }
        q
    }

    /// A and D blocks of a laminate of thickness `t`
    pub fn plate_stiffness(&self, thickness: f64) -> PlateStiffness {
        let q = self.smeared_stiffness();
        let bending = thickness.powi(3) / 12.0;
        PlateStiffness {
            a: q.map(|v| thickness * v),
            d: q.map(|v| bending * v),
        }
    }

    /// Chain plate-stiffness partials back to the laminate thickness.
    pub fn plate_stiffness_thickness_sens(&self, thickness: f64, sens: &PlateStiffnessSens) -> f64 {
        let q = self.smeared_stiffness();
        let dd_dt = thickness * thickness / 4.0;
        q.iter()
            .zip(sens.a.iter().zip(&sens.d))
            .map(|(qi, (sa, sd))| sa * qi + sd * dd_dt * qi)
            .sum()
    }

    /// Effective axial modulus `E1 = (Q11 Q22 - Q12^2) / Q22` of the smeared laminate
    pub fn effective_modulus(&self) -> f64 {
        let q = self.smeared_stiffness();
        (q[0] * q[3] - q[1] * q[1]) / q[3]
    }

    /// Max-strain ratios of every ply at every strain point (laminate axes).
    pub fn strain_ratios(&self, points: &[[f64; 3]]) -> Vec<f64> {
        let mut ratios = Vec::with_capacity(points.len() * self.plies.len() * 6);
        for point in points {
            for ply in &self.plies {
                let ply_strain = rotate_strain(point, ply.angle_deg);
                ratios.extend_from_slice(&self.allowables.strain_ratios(&ply_strain));
            }
        }
        ratios
    }

    /// KS-aggregated max-strain failure over all plies and points
    pub fn material_failure(&self, points: &[[f64; 3]], ks_weight: f64) -> f64 {
        ks_aggregation(&self.strain_ratios(points), ks_weight)
    }

    /// Failure value and its gradient w.r.t. each strain point.
    pub fn material_failure_sens(&self, points: &[[f64; 3]], ks_weight: f64) -> (f64, Vec<[f64; 3]>) {
        let ratios = self.strain_ratios(points);
        let mut weights = vec![0.0; ratios.len()];
        let fail = ks_aggregation_sens(&ratios, ks_weight, &mut weights);

        let mut grads = vec![[0.0; 3]; points.len()];
        let mut chunks = weights.chunks_exact(6);
        for grad in grads.iter_mut() {
            for ply in &self.plies {
                let Some(chunk) = chunks.next() else {
                    break;
                };
                let ply_sens = self.allowables.strain_ratios_sens(chunk);
                let laminate_sens = rotate_strain_sens(&ply_sens, ply.angle_deg);
                for (g, s) in grad.iter_mut().zip(&laminate_sens) {
                    *g += s;
                }
            }
        }
        (fail, grads)
    }
}

/// In-plane (A) and bending (D) stiffness blocks of a plate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateStiffness {
    pub a: [f64; STIFFNESS_ENTRIES],
    pub d: [f64; STIFFNESS_ENTRIES],
}

impl PlateStiffness {
    pub fn a11(&self) -> f64 {
        self.a[0]
    }

    pub fn a66(&self) -> f64 {
        self.a[5]
    }

    pub fn d11(&self) -> f64 {
        self.d[0]
    }

    pub fn d12(&self) -> f64 {
        self.d[1]
    }

    pub fn d22(&self) -> f64 {
        self.d[3]
    }

    pub fn d66(&self) -> f64 {
        self.d[5]
    }

    /// In-plane loads `[N11, N22, N12] = A * [e11, e22, g12]`
    pub fn in_plane_loads(&self, membrane: &[f64; 3]) -> [f64; 3] {
        let a = &self.a;
        [
            a[0] * membrane[0] + a[1] * membrane[1] + a[2] * membrane[2],
            a[1] * membrane[0] + a[3] * membrane[1] + a[4] * membrane[2],
            a[2] * membrane[0] + a[4] * membrane[1] + a[5] * membrane[2],
        ]
    }
}

/// Partials w.r.t. the packed A and D entries; accumulates with `+=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateStiffnessSens {
    pub a: [f64; STIFFNESS_ENTRIES],
    pub d: [f64; STIFFNESS_ENTRIES],
}

impl AddAssign for PlateStiffnessSens {
    fn add_assign(&mut self, rhs: Self) {
        for (x, y) in self.a.iter_mut().zip(&rhs.a) {
            *x += y;
        }
        for (x, y) in self.d.iter_mut().zip(&rhs.d) {
            *x += y;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn allowables() -> PlyStrainAllowables {
        PlyStrainAllowables {
            tension_1: 0.011,
            compression_1: 0.009,
            tension_2: 0.006,
            compression_2: 0.02,
            shear: 0.015,
        }
    }

    /// Quasi-isotropic carbon/epoxy, plies already rotated
    pub fn quasi_isotropic() -> Layup {
        let q0 = [1.30e11, 3.2e9, 0.0, 9.7e9, 0.0, 5.0e9];
        let q45 = [3.8e10, 2.8e10, 3.0e10, 3.8e10, 3.0e10, 3.0e10];
        let qm45 = [3.8e10, 2.8e10, -3.0e10, 3.8e10, -3.0e10, 3.0e10];
        let q90 = [9.7e9, 3.2e9, 0.0, 1.30e11, 0.0, 5.0e9];
        Layup {
            plies: vec![
                LayupPly { q: q0, fraction: 0.4, angle_deg: 0.0 },
                LayupPly { q: q45, fraction: 0.2, angle_deg: 45.0 },
                LayupPly { q: qm45, fraction: 0.2, angle_deg: -45.0 },
                LayupPly { q: q90, fraction: 0.2, angle_deg: 90.0 },
            ],
            allowables: allowables(),
        }
    }

    pub fn isotropic(e: f64, nu: f64) -> Layup {
        let c = e / (1.0 - nu * nu);
        Layup {
            plies: vec![LayupPly {
                q: [c, nu * c, 0.0, c, 0.0, 0.5 * (1.0 - nu) * c],
                fraction: 1.0,
                angle_deg: 0.0,
            }],
            allowables: allowables(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_isotropic_plate_stiffness() {
        let (e, nu, t) = (70e9, 0.3, 0.004);
        let stiffness = isotropic(e, nu).plate_stiffness(t);
        let d = e * t.powi(3) / (12.0 * (1.0 - nu * nu));
        assert!((stiffness.d11() - d).abs() / d < 1e-12);
        assert!((stiffness.d12() - nu * d).abs() / d < 1e-12);
        assert!((stiffness.a66() - e * t / (2.0 * (1.0 + nu))).abs() / (e * t) < 1e-12);
    }

    #[test]
    fn test_isotropic_effective_modulus() {
        let modulus = isotropic(70e9, 0.3).effective_modulus();
        assert!((modulus - 70e9).abs() / 70e9 < 1e-12);
    }

    #[test]
    fn test_layup_validation() {
        assert!(quasi_isotropic().validate().is_ok());
        let mut layup = quasi_isotropic();
        layup.plies[0].fraction = 0.5;
        assert!(layup.validate().is_err());
        let mut layup = quasi_isotropic();
        layup.plies.clear();
        assert!(layup.validate().is_err());
    }

    #[test]
    fn test_thickness_sens() {
        let layup = quasi_isotropic();
        let t = 0.005;
        // seed every entry with a different weight
        let sens = PlateStiffnessSens {
            a: [1.0, -0.3, 0.2, 0.7, 0.1, 0.4],
            d: [2.0e3, 0.5e3, -0.1e3, 1.1e3, 0.3e3, 0.9e3],
        };
        let objective = |t: f64| {
            let s = layup.plate_stiffness(t);
            s.a.iter().zip(&sens.a).map(|(x, w)| x * w).sum::<f64>()
                + s.d.iter().zip(&sens.d).map(|(x, w)| x * w).sum::<f64>()
        };
        let h = 1e-9;
        let fd = (objective(t + h) - objective(t - h)) / (2.0 * h);
        let analytic = layup.plate_stiffness_thickness_sens(t, &sens);
        assert!((analytic - fd).abs() / fd.abs() < 1e-6);
    }

    #[test]
    fn test_in_plane_loads_symmetric() {
        let stiffness = quasi_isotropic().plate_stiffness(0.004);
        let loads = stiffness.in_plane_loads(&[1e-3, 0.0, 0.0]);
        assert_eq!(loads[0], stiffness.a[0] * 1e-3);
        assert_eq!(loads[2], stiffness.a[2] * 1e-3);
    }

    #[test]
    fn test_material_failure_sens() {
        let layup = quasi_isotropic();
        let points = [[-2.0e-3, 4.0e-4, 1.5e-3], [-1.2e-3, 2.0e-4, 0.9e-3]];
        let (fail, grads) = layup.material_failure_sens(&points, 100.0);
        assert_eq!(fail, layup.material_failure(&points, 100.0));
        let h = 1e-9;
        for p in 0..2 {
            for c in 0..3 {
                let mut plus = points;
                let mut minus = points;
                plus[p][c] += h;
                minus[p][c] -= h;
                let fd = (layup.material_failure(&plus, 100.0) - layup.material_failure(&minus, 100.0))
                    / (2.0 * h);
                assert!((grads[p][c] - fd).abs() < 1e-4 * fd.abs().max(1.0), "point {p}, component {c}");
            }
        }
    }

    #[test]
    fn test_sens_accumulates() {
        let mut total = PlateStiffnessSens::default();
        let step = PlateStiffnessSens {
            a: [1.0; 6],
            d: [2.0; 6],
        };
        total += step;
        total += step;
        assert_eq!(total.a, [2.0; 6]);
        assert_eq!(total.d, [4.0; 6]);
    }
}

//! Maximum-strain ply failure.
//!
//! Laminate strains are rotated into each ply's material axes and compared
//! with the ply strain allowables. Each ply contributes six ratios:
//!
//! ```text
//! e1/Xt, -e1/Xc, e2/Yt, -e2/Yc, g12/S, -g12/S
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_positive, PanelResult};

/// Ply strain allowables (all positive magnitudes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlyStrainAllowables {
    pub tension_1: f64,
    pub compression_1: f64,
    pub tension_2: f64,
    pub compression_2: f64,
    pub shear: f64,
}

impl PlyStrainAllowables {
    pub fn validate(&self) -> PanelResult<()> {
        ensure_positive("tension_1", self.tension_1)?;
        ensure_positive("compression_1", self.compression_1)?;
        ensure_positive("tension_2", self.tension_2)?;
        ensure_positive("compression_2", self.compression_2)?;
        ensure_positive("shear", self.shear)?;
        Ok(())
    }

    /// Failure ratios of one ply strain state `[e1, e2, g12]`
    pub fn strain_ratios(&self, ply_strain: &[f64; 3]) -> [f64; 6] {
        let [e1, e2, g12] = *ply_strain;
        [
            e1 / self.tension_1,
            -e1 / self.compression_1,
            e2 / self.tension_2,
            -e2 / self.compression_2,
            g12 / self.shear,
            -g12 / self.shear,
        ]
    }

    /// Pull ratio seeds back to ply strain seeds
    pub fn strain_ratios_sens(&self, ratio_sens: &[f64]) -> [f64; 3] {
        [
            ratio_sens[0] / self.tension_1 - ratio_sens[1] / self.compression_1,
            ratio_sens[2] / self.tension_2 - ratio_sens[3] / self.compression_2,
            (ratio_sens[4] - ratio_sens[5]) / self.shear,
        ]
    }
}

/// Rotate laminate strains `[ex, ey, gxy]` into ply axes `[e1, e2, g12]`.
pub fn rotate_strain(strain: &[f64; 3], angle_deg: f64) -> [f64; 3] {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let [ex, ey, gxy] = *strain;
    [
        c * c * ex + s * s * ey + c * s * gxy,
        s * s * ex + c * c * ey - c * s * gxy,
        -2.0 * c * s * ex + 2.0 * c * s * ey + (c * c - s * s) * gxy,
    ]
}

/// Transpose of [`rotate_strain`]: ply-axis seeds back to laminate axes.
pub fn rotate_strain_sens(ply_sens: &[f64; 3], angle_deg: f64) -> [f64; 3] {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let [s1, s2, s12] = *ply_sens;
    [
        c * c * s1 + s * s * s2 - 2.0 * c * s * s12,
        s * s * s1 + c * c * s2 + 2.0 * c * s * s12,
        c * s * s1 - c * s * s2 + (c * c - s * s) * s12,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_identity() {
        let strain = [1e-3, -2e-4, 5e-4];
        let rotated = rotate_strain(&strain, 0.0);
        for i in 0..3 {
            assert!((rotated[i] - strain[i]).abs() < 1e-18);
        }
    }

    #[test]
    fn test_rotation_90_swaps_axes() {
        let rotated = rotate_strain(&[1e-3, -2e-4, 5e-4], 90.0);
        assert!((rotated[0] + 2e-4).abs() < 1e-15);
        assert!((rotated[1] - 1e-3).abs() < 1e-15);
        assert!((rotated[2] + 5e-4).abs() < 1e-15);
    }

    #[test]
    fn test_pure_shear_at_45() {
        // gxy at 45 degrees becomes tension/compression along the fibres
        let rotated = rotate_strain(&[0.0, 0.0, 2e-3], 45.0);
        assert!((rotated[0] - 1e-3).abs() < 1e-15);
        assert!((rotated[1] + 1e-3).abs() < 1e-15);
        assert!(rotated[2].abs() < 1e-15);
    }

    #[test]
    fn test_rotation_sens_is_transpose() {
        let angle = 30.0;
        let x = [1e-3, -2e-4, 5e-4];
        let y = [0.3, -1.2, 0.7];
        let forward: f64 = rotate_strain(&x, angle).iter().zip(&y).map(|(a, b)| a * b).sum();
        let adjoint: f64 = rotate_strain_sens(&y, angle).iter().zip(&x).map(|(a, b)| a * b).sum();
        assert!((forward - adjoint).abs() < 1e-18);
    }

    #[test]
    fn test_ratios() {
        let allowables = PlyStrainAllowables {
            tension_1: 0.01,
            compression_1: 0.008,
            tension_2: 0.005,
            compression_2: 0.02,
            shear: 0.015,
        };
        let ratios = allowables.strain_ratios(&[-0.004, 0.001, 0.003]);
        assert!((ratios[1] - 0.5).abs() < 1e-12);
        assert!((ratios[2] - 0.2).abs() < 1e-12);
        assert!((ratios[4] - 0.2).abs() < 1e-12);
        assert!(ratios[0] < 0.0);
    }
}

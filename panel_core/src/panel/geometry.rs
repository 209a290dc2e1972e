//! Blade stiffener section properties.
//!
//! The blade is a web of height `h` and thickness `t` standing on a flange
//! of width `f h` and the same thickness, bonded to the skin. Heights are
//! measured from the skin surface: the flange occupies `[0, t]`, the web
//! `[t, t + h]`.

use serde::{Deserialize, Serialize};

/// Section properties of the blade, per stiffener
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BladeSection {
    pub area: f64,
    /// Centroid height above the skin surface
    pub centroid: f64,
    /// Second moment of area about the centroid
    pub inertia: f64,
}

/// Partials of a blade property w.r.t. `(height, thickness)`
pub type SectionPartials = [f64; 2];

pub fn blade_area(height: f64, thickness: f64, flange_fraction: f64) -> f64 {
    (1.0 + flange_fraction) * height * thickness
}

pub fn blade_area_sens(height: f64, thickness: f64, flange_fraction: f64) -> SectionPartials {
    [
        (1.0 + flange_fraction) * thickness,
        (1.0 + flange_fraction) * height,
    ]
}

pub fn blade_centroid(height: f64, thickness: f64, flange_fraction: f64) -> f64 {
    (thickness * (1.0 + 0.5 * flange_fraction) + 0.5 * height) / (1.0 + flange_fraction)
}

pub fn blade_centroid_sens(flange_fraction: f64) -> SectionPartials {
    [
        0.5 / (1.0 + flange_fraction),
        (1.0 + 0.5 * flange_fraction) / (1.0 + flange_fraction),
    ]
}

pub fn blade_inertia(height: f64, thickness: f64, flange_fraction: f64) -> f64 {
    let (h, t, f) = (height, thickness, flange_fraction);
    let zc = blade_centroid(h, t, f);
    let web_offset = t + 0.5 * h - zc;
    let flange_offset = 0.5 * t - zc;
    t * h.powi(3) / 12.0
        + h * t * web_offset * web_offset
        + f * h * t.powi(3) / 12.0
        + f * h * t * flange_offset * flange_offset
}

/// The centroid terms drop out: the first moment about the centroid is zero.
pub fn blade_inertia_sens(height: f64, thickness: f64, flange_fraction: f64) -> SectionPartials {
    let (h, t, f) = (height, thickness, flange_fraction);
    let zc = blade_centroid(h, t, f);
    let ew = t + 0.5 * h - zc;
    let ef = 0.5 * t - zc;
    [
        t * h * h / 4.0 + t * ew * ew + h * t * ew + f * t.powi(3) / 12.0 + f * t * ef * ef,
        h.powi(3) / 12.0
            + h * ew * ew
            + 2.0 * h * t * ew
            + f * h * t * t / 4.0
            + f * h * ef * ef
            + f * h * t * ef,
    ]
}

pub fn blade_section(height: f64, thickness: f64, flange_fraction: f64) -> BladeSection {
    BladeSection {
        area: blade_area(height, thickness, flange_fraction),
        centroid: blade_centroid(height, thickness, flange_fraction),
        inertia: blade_inertia(height, thickness, flange_fraction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn central(f: impl Fn(f64, f64) -> f64, h: f64, t: f64) -> SectionPartials {
        let eps = 1e-8;
        [
            (f(h + eps, t) - f(h - eps, t)) / (2.0 * eps),
            (f(h, t + eps) - f(h, t - eps)) / (2.0 * eps),
        ]
    }

    #[test]
    fn test_web_only_section() {
        let section = blade_section(0.06, 0.004, 0.0);
        assert!((section.area - 2.4e-4).abs() < 1e-18);
        assert!((section.centroid - (0.004 + 0.03)).abs() < 1e-15);
        assert!((section.inertia - 0.004 * 0.06f64.powi(3) / 12.0).abs() < 1e-18);
    }

    #[test]
    fn test_flange_lowers_centroid() {
        let bare = blade_centroid(0.06, 0.004, 0.0);
        let flanged = blade_centroid(0.06, 0.004, 0.5);
        assert!(flanged < bare);
    }

    #[test]
    fn test_section_sens() {
        let (h, t, f) = (0.055, 0.0045, 0.6);
        let checks: [(SectionPartials, SectionPartials); 3] = [
            (blade_area_sens(h, t, f), central(|h, t| blade_area(h, t, f), h, t)),
            (blade_centroid_sens(f), central(|h, t| blade_centroid(h, t, f), h, t)),
            (blade_inertia_sens(h, t, f), central(|h, t| blade_inertia(h, t, f), h, t)),
        ];
        for (analytic, fd) in checks {
            for i in 0..2 {
                assert!(
                    (analytic[i] - fd[i]).abs() < 1e-6 * fd[i].abs().max(1e-12),
                    "{analytic:?} vs {fd:?}"
                );
            }
        }
    }
}

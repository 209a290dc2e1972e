//! # Nondimensional Buckling Parameters
//!
//! Classical plate-buckling groups computed from laminate stiffness entries
//! and panel geometry. Every function has a `*_sens` twin that takes an
//! output seed and returns the value together with the seeded partials
//! w.r.t. every input, in argument order.
//!
//! | Symbol  | Function                        | Definition                               |
//! |---------|---------------------------------|------------------------------------------|
//! | rho0    | [`affine_aspect_ratio`]         | (a/b)·(D22/D11)^¼                        |
//! | xi      | [`generalized_rigidity`]        | (D12 + 2·D66)/√(D11·D22)                 |
//! | nu_gen  | [`generalized_poissons_ratio`]  | (D12 + 2·D66)/D12                        |
//! | delta   | [`stiffener_area_ratio`]        | E1s·As/(E1p·sp·tp)                       |
//! | gamma   | [`stiffener_stiffness_ratio`]   | E1s·Is/(D11p·ts)                         |
//! | zeta    | [`transverse_shear_parameter`]  | (A66/A11)·(b/h)²                         |
//!
//! The partials are pure functions of the same inputs as the forward value,
//! so the adjoint pass can replay them without a tape.

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_non_negative, ensure_positive, PanelResult};

/// Affine aspect ratio `rho0 = (a/b)(D22/D11)^(1/4)`
pub fn affine_aspect_ratio(d11: f64, d22: f64, a: f64, b: f64) -> f64 {
    a / b * (d22 / d11).powf(0.25)
}

/// Partials ordered `(d11, d22, a, b)`
pub fn affine_aspect_ratio_sens(seed: f64, d11: f64, d22: f64, a: f64, b: f64) -> (f64, [f64; 4]) {
    let rho0 = affine_aspect_ratio(d11, d22, a, b);
    let s = seed * rho0;
    (rho0, [-0.25 * s / d11, 0.25 * s / d22, s / a, -s / b])
}

/// Generalized rigidity `xi = (D12 + 2 D66) / sqrt(D11 D22)`
pub fn generalized_rigidity(d11: f64, d22: f64, d12: f64, d66: f64) -> f64 {
    (d12 + 2.0 * d66) / (d11 * d22).sqrt()
}

/// Partials ordered `(d11, d22, d12, d66)`
pub fn generalized_rigidity_sens(seed: f64, d11: f64, d22: f64, d12: f64, d66: f64) -> (f64, [f64; 4]) {
    let den = (d11 * d22).sqrt();
    let xi = (d12 + 2.0 * d66) / den;
    (
        xi,
        [
            -0.5 * seed * xi / d11,
            -0.5 * seed * xi / d22,
            seed / den,
            2.0 * seed / den,
        ],
    )
}

/// Generalized Poisson's ratio `(D12 + 2 D66) / D12`
pub fn generalized_poissons_ratio(d12: f64, d66: f64) -> f64 {
    (d12 + 2.0 * d66) / d12
}

/// Partials ordered `(d12, d66)`
pub fn generalized_poissons_ratio_sens(seed: f64, d12: f64, d66: f64) -> (f64, [f64; 2]) {
    let value = generalized_poissons_ratio(d12, d66);
    (value, [-2.0 * seed * d66 / (d12 * d12), 2.0 * seed / d12])
}

/// Stiffener-to-panel axial stiffness ratio
/// `delta = E1s As / (E1p sp tp)`
pub fn stiffener_area_ratio(
    stiffener_modulus: f64,
    stiffener_area: f64,
    panel_modulus: f64,
    pitch: f64,
    panel_thickness: f64,
) -> f64 {
    stiffener_modulus * stiffener_area / (panel_modulus * pitch * panel_thickness)
}

/// Partials ordered like the arguments of [`stiffener_area_ratio`]
pub fn stiffener_area_ratio_sens(
    seed: f64,
    stiffener_modulus: f64,
    stiffener_area: f64,
    panel_modulus: f64,
    pitch: f64,
    panel_thickness: f64,
) -> (f64, [f64; 5]) {
    let delta = stiffener_area_ratio(
        stiffener_modulus,
        stiffener_area,
        panel_modulus,
        pitch,
        panel_thickness,
    );
    let s = seed * delta;
    (
        delta,
        [
            s / stiffener_modulus,
            s / stiffener_area,
            -s / panel_modulus,
            -s / pitch,
            -s / panel_thickness,
        ],
    )
}

/// Stiffener-to-panel bending stiffness ratio
/// `gamma = E1s Is / (D11p ts)`
pub fn stiffener_stiffness_ratio(
    stiffener_modulus: f64,
    stiffener_inertia: f64,
    panel_d11: f64,
    stiffener_thickness: f64,
) -> f64 {
    stiffener_modulus * stiffener_inertia / (panel_d11 * stiffener_thickness)
}

/// Partials ordered like the arguments of [`stiffener_stiffness_ratio`]
pub fn stiffener_stiffness_ratio_sens(
    seed: f64,
    stiffener_modulus: f64,
    stiffener_inertia: f64,
    panel_d11: f64,
    stiffener_thickness: f64,
) -> (f64, [f64; 4]) {
    let gamma = stiffener_stiffness_ratio(
        stiffener_modulus,
        stiffener_inertia,
        panel_d11,
        stiffener_thickness,
    );
    let s = seed * gamma;
    (
        gamma,
        [
            s / stiffener_modulus,
            s / stiffener_inertia,
            -s / panel_d11,
            -s / stiffener_thickness,
        ],
    )
}

/// Transverse shear parameter `zeta = (A66/A11)(b/h)^2`
pub fn transverse_shear_parameter(a66: f64, a11: f64, b: f64, h: f64) -> f64 {
    a66 / a11 * (b / h) * (b / h)
}

/// Partials ordered `(a66, a11, b, h)`
pub fn transverse_shear_parameter_sens(seed: f64, a66: f64, a11: f64, b: f64, h: f64) -> (f64, [f64; 4]) {
    let zeta = transverse_shear_parameter(a66, a11, b, h);
    let s = seed * zeta;
    (zeta, [s / a66, -s / a11, 2.0 * s / b, -2.0 * s / h])
}

/// The full set of groups for one buckling scale.
///
/// Entries that feed a logarithm must be strictly positive. `delta` and
/// `gamma` may be zero, the unstiffened limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NondimensionalParameters {
    pub xi: f64,
    pub rho0: f64,
    pub delta: f64,
    pub gamma: f64,
    pub zeta: f64,
    pub gen_poisson: f64,
}

impl NondimensionalParameters {
    pub fn validate(&self) -> PanelResult<()> {
        ensure_positive("xi", self.xi)?;
        ensure_positive("rho0", self.rho0)?;
        ensure_non_negative("delta", self.delta)?;
        ensure_non_negative("gamma", self.gamma)?;
        ensure_positive("zeta", self.zeta)?;
        ensure_positive("gen_poisson", self.gen_poisson)?;
        Ok(())
    }
}
